/// Errors raised around the normalizer: reading trees, wiring pipelines, I/O.
///
/// Rewrite rules themselves never return errors; a malformed node shape
/// reaching a rule is a bug upstream and panics.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("parse error at byte {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("transform pipeline has a dependency cycle involving '{id}'")]
    Cycle { id: String },

    #[error("transform '{id}' depends on unknown transform '{dependency}'")]
    UnknownDependency { id: String, dependency: String },

    #[error("duplicate transform id '{0}'")]
    DuplicateTransform(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NormalizeError {
    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        NormalizeError::Parse { offset, message: message.into() }
    }
}
