//! Multi-category code review loop.
//!
//! Language detection seeds a fixed list of review categories; the loop
//! body reviews one category per iteration and parses a clamped score,
//! then a summary stage averages the scores and writes the final verdict.
//!
//! `cargo run --example code_reviewer` — paste code, then an empty line
//! followed by `done` to review it.

use async_trait::async_trait;
use stageflow::{
    console, parse, FnStage, OllamaClient, Result, RoutingTable, StageHandler, TextGenerator,
    Workflow, WorkflowState,
};
use std::io::BufRead;

const CATEGORIES: &[&str] = &["syntax", "style", "logic", "security", "optimization"];
const DEFAULT_SCORE: i64 = 7;

struct DetectLanguage;

#[async_trait]
impl StageHandler for DetectLanguage {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let request = format!(
            "Analyze this code and determine the programming language:\n\n{}\n\n\
             Respond with just the language name (e.g. python, javascript, rust).",
            state.str_or("code", "")
        );
        let language = llm.generate(&request).await?.trim().to_lowercase();

        println!("Detected language: {language}");
        println!("Review stages: {}", CATEGORIES.join(" -> "));

        state.set("language", language);
        for category in CATEGORIES {
            state.push("categories", *category);
        }
        state.set("current_category", 0);
        Ok(())
    }
}

struct ReviewCategory;

#[async_trait]
impl StageHandler for ReviewCategory {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let categories = state.strings("categories");
        let idx = state.cursor("current_category") as usize;
        let Some(category) = categories.get(idx) else {
            return Ok(());
        };

        let request = format!(
            "Review this {} code for {} issues:\n\n{}\n\n\
             Provide:\n\
             ISSUES: [list issues or \"None found\"]\n\
             SUGGESTIONS: [improvement suggestions]\n\
             SCORE: [number out of 10]",
            state.str_or("language", "unknown"),
            category,
            state.str_or("code", "")
        );
        let review = llm.generate(&request).await?;
        let score = parse::clamped_score(&review, "SCORE", 0, 10, DEFAULT_SCORE);

        println!("{category} review complete - score: {score}/10");
        state.push("scores", score);
        state.push("reviews", format!("{category} (score {score}/10):\n{review}"));
        Ok(())
    }
}

struct Summarize;

#[async_trait]
impl StageHandler for Summarize {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let scores: Vec<i64> = state
            .get_list("scores")
            .map(|l| l.iter().filter_map(|v| v.as_i64()).collect())
            .unwrap_or_default();
        let overall = if scores.is_empty() {
            0
        } else {
            scores.iter().sum::<i64>() / scores.len() as i64
        };

        let reviews = state.strings("reviews").join("\n\n");
        let request = format!(
            "Here are the detailed reviews of a {} code submission \
             (overall score {}/10):\n\n{}\n\n\
             Write a short final summary: key strengths, the most important \
             issues to fix, and a verdict.",
            state.str_or("language", "unknown"),
            overall,
            reviews
        );
        let summary = llm.generate(&request).await?;

        state.set("overall_score", overall);
        state.set("final_summary", summary);
        Ok(())
    }
}

fn build_workflow() -> Result<Workflow> {
    let loop_predicate = |state: &WorkflowState| {
        if (state.cursor("current_category") as usize) < state.list_len("categories") {
            "continue".to_string()
        } else {
            "done".to_string()
        }
    };

    Workflow::builder()
        .stage("detect_language", DetectLanguage)
        .edge("detect_language", "review_category")
        .stage("review_category", ReviewCategory)
        .then(
            "advance",
            FnStage::new(|state: &mut WorkflowState| {
                state.advance("current_category");
                Ok(())
            }),
        )
        .branch(
            "advance",
            loop_predicate,
            RoutingTable::new("summarize").case("continue", "review_category"),
        )
        .stage("summarize", Summarize)
        .entry("detect_language")
        .build()
}

fn read_code_block() -> Option<String> {
    println!("Paste code to review, then a line containing only 'done':");
    let stdin = std::io::stdin();
    let mut code = String::new();
    for line in stdin.lock().lines() {
        let line = line.ok()?;
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("done") {
            break;
        }
        if matches!(console::interpret(&line), console::Input::Quit) && code.is_empty() {
            return None;
        }
        code.push_str(&line);
        code.push('\n');
    }
    if code.trim().is_empty() {
        None
    } else {
        Some(code)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("Automated Code Reviewer");
    println!("Reviews code across {} categories. Type 'quit' to exit.\n", CATEGORIES.len());

    let workflow = build_workflow()?;
    let llm = OllamaClient::from_env();

    while let Some(code) = read_code_block() {
        let state = WorkflowState::new().with("code", code);

        match workflow.run(&llm, state).await {
            Ok(result) => {
                println!("\nOverall score: {}/10", result.get_i64("overall_score").unwrap_or(0));
                println!("\n{}", result.str_or("final_summary", ""));
                println!("{}", "-".repeat(60));
            }
            Err(e) => {
                eprintln!("Error: {e}");
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
