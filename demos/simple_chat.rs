//! Streaming chat with a rolling conversation transcript.
//!
//! Run with a local Ollama server:
//! `cargo run --example simple_chat`

use stageflow::{console, OllamaClient, TextGenerator};
use std::io::Write;

const SYSTEM: &str = "You are a helpful assistant. The following is a friendly conversation \
between a human and an AI assistant. The assistant is helpful, creative, and concise.";

#[tokio::main]
async fn main() {
    let llm = OllamaClient::from_env();

    println!("Ollama Streaming Chat ({})", llm.model());
    println!("Responses stream in real time and the transcript is remembered.");
    println!("Type 'memory' to see the transcript, 'quit' to exit.\n");

    let mut transcript: Vec<(String, String)> = Vec::new();

    loop {
        let user_input = match console::read_user_input("You: ") {
            Ok(Some(text)) => text,
            Ok(None) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("input error: {e}");
                break;
            }
        };

        if user_input.eq_ignore_ascii_case("memory") {
            println!("\nConversation so far:");
            for (role, content) in &transcript {
                println!("{role}: {content}");
            }
            println!("{}", "-".repeat(50));
            continue;
        }

        let mut history = String::new();
        for (role, content) in &transcript {
            history.push_str(&format!("{role}: {content}\n"));
        }
        let prompt = format!(
            "Current conversation:\n{history}Human: {user_input}\nAI Assistant:"
        );

        print!("Assistant: ");
        std::io::stdout().flush().ok();

        let mut on_token = |token: &str| {
            print!("{token}");
            std::io::stdout().flush().ok();
        };

        match llm.generate_streaming(&format!("{SYSTEM}\n\n{prompt}"), &mut on_token).await {
            Ok(response) => {
                println!("\n{}", "-".repeat(50));
                transcript.push(("Human".to_string(), user_input));
                transcript.push(("AI Assistant".to_string(), response));
            }
            Err(e) => {
                eprintln!("\nError: {e}");
            }
        }
    }
}
