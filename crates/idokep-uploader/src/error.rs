//! Error types for the uploader.
//!
//! Uses `thiserror` for typed errors. [`ConfigError`] is a startup-only
//! condition: the worker is never constructed when it occurs.
//! [`UploadError`] is per-record and never escapes the worker loop.

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required option is absent, empty, or still holds the installer
    /// placeholder value.
    #[error("missing option {0}")]
    MissingOption(&'static str),

    /// An option is present but its value is unusable.
    #[error("invalid option {name}: {reason}")]
    Invalid {
        /// The option name as it appears in the configuration file.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The configuration sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors that can occur while uploading a single record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    /// The request never produced a response (timeout, refused connection,
    /// unreadable body).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered, but with an error status or without the
    /// success marker.
    #[error("server rejected upload: {0}")]
    Rejected(String),

    /// The record could not be turned into a request.
    #[error("cannot format record: {0}")]
    Format(String),
}

impl UploadError {
    /// Whether another attempt may succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Rejected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(UploadError::Transport("refused".to_owned()).is_retryable());
        assert!(UploadError::Rejected("500".to_owned()).is_retryable());
        assert!(!UploadError::Format("no timestamp".to_owned()).is_retryable());
    }

    #[test]
    fn messages_name_the_option() {
        let err = ConfigError::MissingOption("password");
        assert_eq!(err.to_string(), "missing option password");
    }
}
