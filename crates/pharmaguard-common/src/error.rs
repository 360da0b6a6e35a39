use thiserror::Error;

#[derive(Debug, Error)]
pub enum PharmaGuardError {
    /// The input is not recognisable as a variant-call file at all.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Drug name not registered, even after alias resolution.
    #[error("Unsupported drug: {0}")]
    UnsupportedDrug(String),

    #[error("Input too large: {size} bytes (limit {limit})")]
    InputTooLarge { size: usize, limit: usize },

    #[error("No drugs specified")]
    EmptyDrugList,

    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PharmaGuardError>;
