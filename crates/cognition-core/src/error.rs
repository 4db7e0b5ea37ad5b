use thiserror::Error;

/// Errors from the fallible boundaries of the cognition core: configuration
/// loading, catalog construction and ensemble setup. The per-tick path never
/// returns one of these.
#[derive(Debug, Error)]
pub enum CognitionError {
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("invalid config: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("empty {0} catalog")]
    EmptyCatalog(&'static str),
    #[error("ensemble thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl CognitionError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = CognitionError> = std::result::Result<T, E>;
