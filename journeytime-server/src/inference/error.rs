//! Model artifact error types.

use std::path::PathBuf;

/// Errors raised while loading or invoking a regression artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The artifact file could not be read
    #[error("failed to read model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact is not valid JSON for the expected schema
    #[error("failed to parse model {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The artifact parsed but is internally inconsistent
    #[error("invalid model: {0}")]
    Invalid(String),

    /// The feature vector's columns differ from the artifact's
    #[error("feature mismatch: model expects [{}], got [{}]", expected.join(", "), actual.join(", "))]
    FeatureMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// The model produced a NaN or infinite value
    #[error("model produced a non-finite prediction")]
    NonFinite,

    /// A blocking load task panicked or was cancelled
    #[error("model loading task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_lists_both_sides() {
        let err = ModelError::FeatureMismatch {
            expected: vec!["a".into(), "b".into()],
            actual: vec!["a".into()],
        };
        assert_eq!(
            err.to_string(),
            "feature mismatch: model expects [a, b], got [a]"
        );
    }
}
