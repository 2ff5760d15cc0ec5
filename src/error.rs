use crate::tools::ToolError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("text generation failed: {0}")]
    Llm(String),

    #[error("Stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    #[error("No stage named '{0}' is registered")]
    UnknownStage(String),

    #[error("Invalid workflow: {0}")]
    InvalidGraph(String),

    #[error("Workflow exceeded the step limit of {0} (routing cycle?)")]
    StepLimit(usize),

    #[error("Tool failed: {0}")]
    Tool(#[from] ToolError),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for FlowError {
    fn from(err: anyhow::Error) -> Self {
        FlowError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
