//! Question answering over a local document.
//!
//! The document is read from `sample_document.txt`; if the file is
//! missing it is created with a built-in fallback document, which is then
//! used for this run. Each question is answered against the document via
//! a system prompt — answers must come from the document or be a plain
//! "I don't know".
//!
//! `cargo run --example document_qa`

use stageflow::{console, document, OllamaClient, TextGenerator};

const DOCUMENT_PATH: &str = "sample_document.txt";

const SAMPLE_DOCUMENT: &str = "\
Ollama is a tool that allows you to run large language models locally on
your machine. It supports various models including Llama, Mistral, and
others, and makes it easy to get up and running with LLMs without cloud
services or API keys.

Benefits of running models locally:
1. Privacy: your data stays on your machine
2. Speed: no network latency for inference
3. Cost: no per-token charges
4. Offline: works without an internet connection
5. Customization: fine-tune models for specific use cases

Workflow libraries let you chain multiple model calls into pipelines:
each stage formats a prompt, invokes the model, and parses the result
into fields the next stage can read.
";

#[tokio::main]
async fn main() {
    let llm = OllamaClient::from_env();

    let content = match document::load_or_create(DOCUMENT_PATH, SAMPLE_DOCUMENT) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("failed to load document: {e}");
            return;
        }
    };

    println!("Document Q&A ({})", llm.model());
    println!("Loaded document: {DOCUMENT_PATH}");
    println!("Type 'quit' to exit.\n");

    let system = format!(
        "Use the following document to answer the question. If the answer is \
         not in the document, say that you don't know — do not make one up.\n\n\
         Document:\n{content}"
    );

    while let Ok(Some(question)) = console::read_user_input("Question: ") {
        match llm.chat(&system, &question).await {
            Ok(answer) => {
                println!("\nAnswer: {answer}");
                println!("{}", "-".repeat(50));
            }
            Err(e) => {
                eprintln!("Error: {e}");
            }
        }
    }

    println!("Goodbye!");
}
