//! Conversational agent with tool dispatch.
//!
//! An analysis stage decides whether the user's message needs a tool and
//! which one; a predicate branch either executes the tool or goes straight
//! to response generation, which folds tool output and recent conversation
//! context into the reply.
//!
//! `cargo run --example chat_with_tools`

use async_trait::async_trait;
use stageflow::{
    console, parse, OllamaClient, Result, RoutingTable, StageHandler, TextGenerator, ToolRegistry,
    Workflow, WorkflowState,
};

/// How many transcript entries are folded into the response prompt.
const CONTEXT_WINDOW: usize = 5;

struct AnalyzeInput {
    registry: ToolRegistry,
}

#[async_trait]
impl StageHandler for AnalyzeInput {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let request = format!(
            "Analyze this user message to determine if any tools should be used:\n\n\
             User message: {}\n\n\
             Available tools:\n\
             - calculator: math calculations (e.g. \"calculate 5+3\")\n\
             - random_number: random numbers, optionally in a range\n\
             - datetime: current date and time\n\
             - word_count: count words in text\n\
             - reverse_text: reverse text\n\n\
             Respond with:\n\
             NEEDS_TOOL: yes/no\n\
             TOOL_NAME: [tool name or \"none\"]",
            state.str_or("user_input", "")
        );
        let analysis = llm.generate(&request).await?;

        let mut needs_tool = parse::yes_no(&analysis, "NEEDS_TOOL", false);
        let tool_name = parse::line_value(&analysis, "TOOL_NAME")
            .map(|v| v.to_lowercase())
            .unwrap_or_else(|| "none".to_string());
        if !self.registry.contains(&tool_name) {
            needs_tool = false;
        }

        println!("Analysis: tool needed: {needs_tool}, selected: {tool_name}");
        state.set("needs_tool", needs_tool);
        state.set("selected_tool", tool_name);
        Ok(())
    }
}

struct ExecuteTool {
    registry: ToolRegistry,
}

#[async_trait]
impl StageHandler for ExecuteTool {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let tool = state.str_or("selected_tool", "none");
        let user_input = state.str_or("user_input", "");

        // Calculator and the text tools want just their operand, so ask the
        // model to extract it; the others take the raw message.
        let tool_input = match tool.as_str() {
            "calculator" => {
                let request = format!(
                    "Extract the mathematical expression from this message: {user_input}\n\n\
                     Respond with just the expression."
                );
                llm.generate(&request).await?
            }
            "word_count" | "reverse_text" => {
                let request = format!(
                    "Extract the text the user wants processed from this message: \
                     {user_input}\n\nRespond with just that text."
                );
                llm.generate(&request).await?
            }
            _ => user_input,
        };

        // Tool failures abort the turn, not the process; the console loop
        // reports them and moves on.
        let result = self.registry.dispatch(&tool, tool_input.trim())?;
        println!("Tool '{tool}' executed");
        state.set("tool_result", result);
        Ok(())
    }
}

struct GenerateResponse;

#[async_trait]
impl StageHandler for GenerateResponse {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let user_input = state.str_or("user_input", "");
        let transcript = state.strings("transcript");
        let context = transcript
            .iter()
            .rev()
            .take(CONTEXT_WINDOW)
            .rev()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        let request = if let Some(tool_result) = state.get_str("tool_result") {
            format!(
                "The user asked: {user_input}\n\nTool results:\n{tool_result}\n\n\
                 Previous conversation context:\n{context}\n\n\
                 Generate a natural, conversational response that incorporates the tool \
                 results. Be friendly and helpful."
            )
        } else {
            format!(
                "The user said: {user_input}\n\n\
                 Previous conversation context:\n{context}\n\n\
                 Generate a natural, helpful conversational response."
            )
        };

        let response = llm.generate(&request).await?;
        state.push("transcript", format!("user: {user_input}"));
        state.push("transcript", format!("assistant: {response}"));
        state.set("response", response);
        Ok(())
    }
}

fn build_workflow(registry: ToolRegistry) -> Result<Workflow> {
    Workflow::builder()
        .stage(
            "analyze",
            AnalyzeInput {
                registry: registry.clone(),
            },
        )
        .branch(
            "analyze",
            |state| {
                if state.get_bool("needs_tool").unwrap_or(false) {
                    "tool".to_string()
                } else {
                    "chat".to_string()
                }
            },
            RoutingTable::new("generate_response").case("tool", "execute_tool"),
        )
        .stage("execute_tool", ExecuteTool { registry })
        .edge("execute_tool", "generate_response")
        .stage("generate_response", GenerateResponse)
        .entry("analyze")
        .build()
}

fn reset_turn(state: &mut WorkflowState) -> Result<()> {
    state.set("needs_tool", false);
    state.set("selected_tool", "none");
    state.set("tool_result", serde_json::Value::Null);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("Chat Agent with Tools");
    println!("Available tools: calculator, random_number, datetime, word_count, reverse_text");
    println!("Type 'quit' to exit.\n");

    let workflow = build_workflow(ToolRegistry::builtin())?;
    let llm = OllamaClient::from_env();

    // The transcript survives across turns; per-turn fields are reset.
    let mut carried = WorkflowState::new();

    while let Ok(Some(user_input)) = console::read_user_input("You: ") {
        let mut state = carried.clone();
        state.set("user_input", user_input);
        reset_turn(&mut state)?;

        match workflow.run(&llm, state).await {
            Ok(result) => {
                println!("Assistant: {}", result.str_or("response", ""));
                println!("{}", "-".repeat(60));
                carried = result;
            }
            Err(e) => {
                eprintln!("Error: {e}");
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
