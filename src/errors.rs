use thiserror::Error;

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, RegexError>;

/// The error type produced by the compilation pipeline.
#[derive(Error, Debug)]
pub struct RegexError {
    /// The source of the error.
    pub source: Box<RegexErrorKind>,
}

impl RegexError {
    /// Creates a new `RegexError` from a `RegexErrorKind`.
    pub fn new(kind: RegexErrorKind) -> Self {
        RegexError {
            source: Box::new(kind),
        }
    }

    /// Shorthand for the common case: a pattern feature is outside the
    /// supported subset, or the pattern failed to parse.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::new(RegexErrorKind::Unsupported {
            reason: reason.into(),
            source: None,
        })
    }

    /// Returns the reason string if this is an `Unsupported` error.
    pub fn as_unsupported_reason(&self) -> Option<&str> {
        match &*self.source {
            RegexErrorKind::Unsupported { reason, .. } => Some(reason.as_str()),
            _ => None,
        }
    }

    /// Re-raises this error with the `TRegex: ` prefix and the original
    /// source pattern attached, the way a top-level `compile()` does when it
    /// surfaces an `Unsupported` signal to the caller.
    pub fn with_source_context(self, pattern: &str) -> Self {
        match *self.source {
            RegexErrorKind::Unsupported { reason, .. } => {
                RegexError::new(RegexErrorKind::Unsupported {
                    reason: format!("TRegex: {reason}"),
                    source: Some(pattern.to_string()),
                })
            }
            other => RegexError::new(other),
        }
    }
}

impl std::fmt::Display for RegexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// The error kind.
#[derive(Error, Debug)]
pub enum RegexErrorKind {
    /// The pattern uses a feature outside the supported subset, exceeded an
    /// internal construction limit, or failed to parse.
    #[error("{reason}{}", .source.as_ref().map(|s| format!(" (in '{s}')")).unwrap_or_default())]
    Unsupported {
        /// Human-readable reason.
        reason: String,
        /// The source pattern, attached when re-raised from a top-level
        /// `compile()` call.
        source: Option<String>,
    },

    /// A std::io error occurred while writing a dump file.
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// An error occurred during JSON serialization of an observability
    /// record or a dump.
    #[cfg(feature = "serde")]
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

impl From<std::io::Error> for RegexError {
    fn from(error: std::io::Error) -> Self {
        RegexError::new(RegexErrorKind::IoError(error))
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for RegexError {
    fn from(error: serde_json::Error) -> Self {
        RegexError::new(RegexErrorKind::JsonError(error))
    }
}
