//! Content-aware conditional routing.
//!
//! One analysis stage classifies the input's type, sentiment, and
//! complexity; a routing table then dispatches to a type-specific handler,
//! and every path ends in a shared sentiment filter.
//!
//! `cargo run --example conditional_workflow`

use async_trait::async_trait;
use stageflow::{
    console, parse, prompt, FnStage, OllamaClient, Result, RoutingTable, StageHandler,
    TextGenerator, Workflow, WorkflowState,
};

const CONTENT_TYPES: &[&str] = &[
    "question",
    "request",
    "complaint",
    "compliment",
    "information",
    "other",
];
const SENTIMENTS: &[&str] = &["positive", "negative", "neutral"];
const COMPLEXITIES: &[&str] = &["simple", "moderate", "complex"];

struct AnalyzeContent;

#[async_trait]
impl StageHandler for AnalyzeContent {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let request = prompt::render(
            "Analyze the following text and provide:\n\
             1. Content Type: (question, request, complaint, compliment, information, other)\n\
             2. Sentiment: (positive, negative, neutral)\n\
             3. Complexity: (simple, moderate, complex)\n\n\
             Text: {input_text}\n\n\
             Respond in this exact format:\n\
             Content Type: [type]\n\
             Sentiment: [sentiment]\n\
             Complexity: [complexity]",
            state,
        );
        let analysis = llm.generate(&request).await?;

        let content_type = parse::classification(&analysis, "Content Type", CONTENT_TYPES, "other");
        let sentiment = parse::classification(&analysis, "Sentiment", SENTIMENTS, "neutral");
        let complexity = parse::classification(&analysis, "Complexity", COMPLEXITIES, "moderate");

        println!("Analysis: {content_type} | {sentiment} | {complexity}");

        state.set("content_type", content_type);
        state.set("sentiment", sentiment);
        state.set("complexity", complexity);
        Ok(())
    }
}

/// Type-specific handler; only the framing text differs between branches.
struct Respond {
    label: &'static str,
    template: &'static str,
}

#[async_trait]
impl StageHandler for Respond {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        println!("Processing as {}...", self.label);
        let request = prompt::render(self.template, state);
        let response = llm.generate(&request).await?;
        state.set("response", response);
        Ok(())
    }
}

fn apply_sentiment_filter(state: &mut WorkflowState) -> Result<()> {
    let response = state.str_or("response", "");
    let final_output = match state.str_or("sentiment", "neutral").as_str() {
        "negative" => format!("I understand this might be frustrating. {response}"),
        "positive" => format!("I'm glad to help with this! {response}"),
        _ => response,
    };
    state.set("final_output", final_output);
    Ok(())
}

fn build_workflow() -> Result<Workflow> {
    let routing = RoutingTable::new("handle_other")
        .case("question", "handle_question")
        .case("request", "handle_request")
        .case("complaint", "handle_complaint")
        .case("compliment", "handle_compliment")
        .case("information", "handle_information");

    let handlers = [
        (
            "handle_question",
            "question",
            "Provide a well-structured answer to this question: {input_text}",
        ),
        (
            "handle_request",
            "request",
            "This is a request. Provide actionable steps or information to fulfill it:\n\n{input_text}",
        ),
        (
            "handle_complaint",
            "complaint",
            "This is a complaint. Show understanding, acknowledge the issue, and suggest \
             solutions:\n\n{input_text}",
        ),
        (
            "handle_compliment",
            "compliment",
            "This is positive feedback. Respond graciously and engage positively:\n\n{input_text}",
        ),
        (
            "handle_information",
            "information",
            "This is information sharing. Acknowledge it and add relevant insights or \
             questions:\n\n{input_text}",
        ),
        (
            "handle_other",
            "general content",
            "Respond appropriately and helpfully to this content:\n\n{input_text}",
        ),
    ];

    let mut builder = Workflow::builder()
        .stage("analyze", AnalyzeContent)
        .route("analyze", "content_type", routing);

    for (name, label, template) in handlers {
        builder = builder
            .stage(name, Respond { label, template })
            .edge(name, "apply_sentiment");
    }

    builder
        .stage("apply_sentiment", FnStage::new(apply_sentiment_filter))
        .entry("analyze")
        .build()
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("Conditional Workflow");
    println!("Content is analyzed and routed through type-specific handlers.");
    println!("Type 'quit' to exit.\n");

    let workflow = build_workflow()?;
    let llm = OllamaClient::from_env();

    while let Ok(Some(user_input)) = console::read_user_input("Input: ") {
        let state = WorkflowState::new().with("input_text", user_input);

        match workflow.run(&llm, state).await {
            Ok(result) => {
                println!("\nFinal output: {}", result.str_or("final_output", ""));
                println!("Processing path: {}", result.path().join(" -> "));
                println!("{}", "-".repeat(50));
            }
            Err(e) => {
                eprintln!("Error: {e}");
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
