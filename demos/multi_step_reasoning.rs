//! Plan-and-execute reasoning loop.
//!
//! A planning stage breaks the problem into numbered steps; the loop body
//! executes one step per iteration, an advance stage bumps the cursor, and
//! a predicate branch exits to synthesis exactly when the cursor reaches
//! the plan length.
//!
//! `cargo run --example multi_step_reasoning`

use async_trait::async_trait;
use stageflow::{
    console, parse, prompt, FnStage, OllamaClient, Result, RoutingTable, StageHandler,
    TextGenerator, Workflow, WorkflowState,
};

struct PlanSteps;

#[async_trait]
impl StageHandler for PlanSteps {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let request = prompt::render(
            "Analyze this complex problem and break it down into logical reasoning steps:\n\n\
             Problem: {problem}\n\n\
             List 3-5 key steps as a numbered list, one clear action per step.",
            state,
        );
        let plan = llm.generate(&request).await?;
        let steps = parse::numbered_items(&plan);

        println!("Problem analyzed into {} steps:", steps.len());
        for (i, step) in steps.iter().enumerate() {
            println!("  {}. {step}", i + 1);
        }

        for step in steps {
            state.push("steps", step);
        }
        state.set("current_step", 0);
        Ok(())
    }
}

struct ExecuteStep;

#[async_trait]
impl StageHandler for ExecuteStep {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let steps = state.strings("steps");
        let idx = state.cursor("current_step") as usize;
        let Some(step) = steps.get(idx) else {
            return Ok(());
        };

        let mut previous = String::new();
        for (i, result) in state.strings("step_results").iter().enumerate() {
            previous.push_str(&format!("Step {} result: {}\n", i + 1, result));
        }

        let request = format!(
            "Original Problem: {}\n\nPrevious reasoning:\n{}\n\
             Current step to execute: {}\n\n\
             Execute this reasoning step. Be specific and detailed.",
            state.str_or("problem", ""),
            previous,
            step
        );
        let result = llm.generate(&request).await?;

        println!("Step {} completed: {step}", idx + 1);
        state.push("step_results", result);
        Ok(())
    }
}

struct Synthesize;

#[async_trait]
impl StageHandler for Synthesize {
    async fn run(&self, llm: &dyn TextGenerator, state: &mut WorkflowState) -> Result<()> {
        let steps = state.strings("steps");
        let results = state.strings("step_results");
        let mut chain = String::new();
        for (i, step) in steps.iter().enumerate() {
            chain.push_str(&format!("Step {}: {}\n", i + 1, step));
            if let Some(result) = results.get(i) {
                chain.push_str(&format!("Result: {result}\n\n"));
            }
        }

        let request = format!(
            "Original Problem: {}\n\n{}\n\
             Based on the reasoning above, respond in this format:\n\
             FINAL ANSWER: [your answer]\n\
             CONFIDENCE: [1-10]",
            state.str_or("problem", ""),
            prompt::section("Complete reasoning chain", &chain),
        );
        let synthesis = llm.generate(&request).await?;

        let answer = parse::line_value(&synthesis, "FINAL ANSWER").unwrap_or(synthesis.clone());
        let confidence = parse::clamped_score(&synthesis, "CONFIDENCE", 1, 10, 5);

        state.set("final_answer", answer);
        state.set("confidence", confidence);
        Ok(())
    }
}

fn build_workflow() -> Result<Workflow> {
    // Loop shape: plan -> [execute -> advance]* while cursor < steps -> synthesize.
    // The cursor only ever increments and the plan is fixed after planning,
    // so the predicate is guaranteed to reach the exit branch.
    let loop_predicate = |state: &WorkflowState| {
        if (state.cursor("current_step") as usize) < state.list_len("steps") {
            "continue".to_string()
        } else {
            "done".to_string()
        }
    };

    Workflow::builder()
        .stage("plan", PlanSteps)
        .branch(
            "plan",
            loop_predicate,
            RoutingTable::new("synthesize").case("continue", "execute_step"),
        )
        .stage("execute_step", ExecuteStep)
        .then(
            "advance",
            FnStage::new(|state: &mut WorkflowState| {
                state.advance("current_step");
                Ok(())
            }),
        )
        .branch(
            "advance",
            loop_predicate,
            RoutingTable::new("synthesize").case("continue", "execute_step"),
        )
        .stage("synthesize", Synthesize)
        .entry("plan")
        .build()
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("Multi-Step Reasoning");
    println!("Enter complex problems that benefit from step-by-step reasoning.");
    println!("Type 'quit' to exit.\n");

    let workflow = build_workflow()?;
    let llm = OllamaClient::from_env();

    while let Ok(Some(problem)) = console::read_user_input("Problem: ") {
        let state = WorkflowState::new().with("problem", problem);

        match workflow.run(&llm, state).await {
            Ok(result) => {
                println!("\nFinal answer: {}", result.str_or("final_answer", ""));
                println!("Confidence: {}/10", result.get_i64("confidence").unwrap_or(5));
                println!("Steps completed: {}", result.list_len("step_results"));
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
