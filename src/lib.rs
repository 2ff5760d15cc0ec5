//! # stageflow
//!
//! Branching multi-stage LLM workflow runner for Ollama.
//!
//! A workflow is a set of named stages over one shared, mutable state
//! record. Each stage reads fields written by earlier stages, usually
//! makes one text-generation call, parses the free-text result into typed
//! fields, and writes them back. Routing between stages is an explicit
//! state-machine table: unconditional edges, routing tables keyed on a
//! classification field (with a mandatory fallback), and predicate
//! branches for cursor-driven loops.
//!
//! ## Features
//!
//! - **Named stages over shared state** — append-only field map threaded
//!   through the taken path, with the visited path recorded
//! - **Conditional routing** — table lookups that always resolve, with a
//!   declared default for unrecognized classification values
//! - **Iterative loops** — monotonic cursors against fixed-length plans,
//!   plus a step limit guarding against mis-declared cycles
//! - **Injected generation client** — one `TextGenerator` per run, with an
//!   Ollama implementation (`/api/generate`, `/api/chat`, streaming)
//! - **Defensive output parsing** — line-prefix fields, clamped scores,
//!   and numbered-list plans that default instead of failing
//! - **Tool dispatch** — calculator, random numbers, datetime, word
//!   counts, and text reversal behind a by-name registry
//!
//! ## Quick Start
//!
//! ```no_run
//! use stageflow::{
//!     FnStage, OllamaClient, RoutingTable, StageHandler, TextGenerator, Workflow,
//!     WorkflowState, parse,
//! };
//! use async_trait::async_trait;
//!
//! struct Classify;
//!
//! #[async_trait]
//! impl StageHandler for Classify {
//!     async fn run(
//!         &self,
//!         llm: &dyn TextGenerator,
//!         state: &mut WorkflowState,
//!     ) -> stageflow::Result<()> {
//!         let prompt = format!(
//!             "Classify as question or request:\n{}\n\nCategory: [category]",
//!             state.str_or("input_text", "")
//!         );
//!         let reply = llm.generate(&prompt).await?;
//!         let kind = parse::classification(&reply, "Category", &["question", "request"], "other");
//!         state.set("category", kind);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let workflow = Workflow::builder()
//!         .stage("classify", Classify)
//!         .route(
//!             "classify",
//!             "category",
//!             RoutingTable::new("fallback").case("question", "answer"),
//!         )
//!         .stage("answer", FnStage::new(|s| Ok(s.set("response", "..."))))
//!         .stage("fallback", FnStage::new(|s| Ok(s.set("response", "?"))))
//!         .build()?;
//!
//!     let llm = OllamaClient::from_env();
//!     let state = WorkflowState::new().with("input_text", "How do I bake bread?");
//!     let result = workflow.run(&llm, state).await?;
//!     println!("{}", result.str_or("response", ""));
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod console;
pub mod document;
pub mod error;
pub mod parse;
pub mod prompt;
pub mod route;
pub mod stage;
pub mod state;
pub mod tools;
pub mod workflow;

pub use client::{FixedGenerator, LlmConfig, OllamaClient, TextGenerator};
pub use error::{FlowError, Result};
pub use route::RoutingTable;
pub use stage::{FnStage, StageHandler};
pub use state::WorkflowState;
pub use tools::{ToolError, ToolRegistry};
pub use workflow::{Transition, Workflow, WorkflowBuilder};
