use std::path::PathBuf;

use crate::value::ValueKind;

/// Result alias that carries the custom [`PoolError`] type.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// A value was appended under a key that already holds another kind.
    #[error("key `{key}` holds {expected} values, cannot add {found}")]
    TypeMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },
    /// Exact-key lookup failed.
    #[error("key `{0}` not found in pool")]
    KeyNotFound(String),
    /// The key is syntactically unusable.
    #[error("invalid key `{key}`: {reason}")]
    InvalidKey { key: String, reason: &'static str },
    /// The key would be both a leaf and a branch of the key hierarchy, or is
    /// already used by the other storage flavour (series vs. single).
    #[error("key `{key}` conflicts with existing key `{existing}`")]
    KeyConflict { key: String, existing: String },
    /// A value that cannot be stored or rendered.
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
    /// Producer input rejected before any analysis took place.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The export destination was an empty string.
    #[error("export destination is empty")]
    EmptyDestination,
    /// The export destination could not be opened or committed.
    #[error("cannot write to `{}`: {source}", path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("spectrum computation failed: {0}")]
    Fft(String),
    /// Free-form message for the front-end.
    #[error("{0}")]
    Message(String),
}

impl PoolError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<realfft::FftError> for PoolError {
    fn from(value: realfft::FftError) -> Self {
        Self::Fft(value.to_string())
    }
}

impl From<toml::de::Error> for PoolError {
    fn from(value: toml::de::Error) -> Self {
        Self::Config(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_names_both_kinds() {
        let err = PoolError::TypeMismatch {
            key: "foo".to_string(),
            expected: ValueKind::Real,
            found: ValueKind::String,
        };

        let text = err.to_string();
        assert!(text.contains("`foo`"));
        assert!(text.contains("real"));
        assert!(text.contains("string"));
    }

    #[test]
    fn destination_error_keeps_source() {
        let err = PoolError::Destination {
            path: PathBuf::from("/nope/out.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };

        assert!(err.to_string().contains("/nope/out.yaml"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
