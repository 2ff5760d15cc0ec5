//! Line-oriented console input shared by the demo programs.

use std::io::{self, BufRead, Write};

/// What a line of user input means.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Non-empty input text, trimmed.
    Text(String),
    /// Blank line — ignored and re-prompted.
    Blank,
    /// One of the quit sentinels ("quit", "exit", "q").
    Quit,
}

/// Classify a raw input line.
pub fn interpret(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Blank;
    }
    match trimmed.to_lowercase().as_str() {
        "quit" | "exit" | "q" => Input::Quit,
        _ => Input::Text(trimmed.to_string()),
    }
}

/// Prompt until the user enters text; `None` on quit or end of input.
pub fn read_user_input(prompt: &str) -> io::Result<Option<String>> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("{prompt}");
        io::stdout().flush()?;
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match interpret(&line) {
            Input::Blank => continue,
            Input::Quit => return Ok(None),
            Input::Text(text) => return Ok(Some(text)),
        }
    }
}
