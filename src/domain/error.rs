//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the navigation data contract.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("malformed source at {path}: {reason}")]
    MalformedSource { path: String, reason: String },

    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("node not found")]
    NodeNotFound,

    #[error("cycle detected in fragment references: {0}")]
    CycleDetected(String),

    #[error("unresolved fragment reference: {0}")]
    UnresolvedReference(String),

    #[error("binding not found: var {0}")]
    MissingBinding(String),

    #[error("fragment {name} unavailable: {reason}")]
    FragmentUnavailable { name: String, reason: String },

    #[error("in fragment {name}: {source}")]
    InFragment {
        name: String,
        source: Box<DomainError>,
    },
}

impl DomainError {
    pub fn malformed(path: &[usize], reason: impl Into<String>) -> Self {
        Self::MalformedSource {
            path: format_path(path),
            reason: reason.into(),
        }
    }

    pub fn in_fragment(name: &str, source: DomainError) -> Self {
        Self::InFragment {
            name: name.to_string(),
            source: Box::new(source),
        }
    }

    /// The innermost error, past any fragment wrapping.
    pub fn root_cause(&self) -> &DomainError {
        match self {
            Self::InFragment { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Render an element path as `[0][2][1]`; the empty path is the source itself.
pub fn format_path(path: &[usize]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter().map(|i| format!("[{i}]")).collect()
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_nested_fragment_error_when_asking_root_cause_then_unwraps() {
        let err = DomainError::in_fragment(
            "outer",
            DomainError::in_fragment("inner", DomainError::NodeNotFound),
        );
        assert_eq!(err.root_cause(), &DomainError::NodeNotFound);
        assert_eq!(
            err.to_string(),
            "in fragment outer: in fragment inner: node not found"
        );
    }

    #[test]
    fn given_nested_path_when_formatting_then_uses_bracket_indices() {
        assert_eq!(format_path(&[0, 2, 1]), "[0][2][1]");
        assert_eq!(format_path(&[]), "<root>");
    }

    #[test]
    fn given_malformed_error_when_displayed_then_names_path_and_reason() {
        let err = DomainError::malformed(&[3], "label must be a string");
        assert_eq!(
            err.to_string(),
            "malformed source at [3]: label must be a string"
        );
    }
}
