use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FormBindError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid geometric element: {0}")]
    InvalidElement(String),

    #[error("invalid text block '{text}': {reason}")]
    InvalidTextBlock { text: String, reason: String },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("{engine} failed: {reason}")]
    Collaborator { engine: String, reason: String },

    #[error("could not fill field '{label}': {reason}")]
    FieldApply { label: String, reason: String },

    #[error("job error: {0}")]
    Job(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
