use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Custom result type for vswitch operations
pub type SwitchResult<T> = Result<T, SwitchError>;

/// Custom error type for vswitch operations
#[derive(Debug, Error)]
pub enum SwitchError {
    #[error("Virtualenv '{}' does not exist.", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),
}

impl SwitchError {
    /// Create a new not-found error
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        SwitchError::NotFound(path.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SwitchError::Config(msg.into())
    }

    /// Create a new notification error
    pub fn notification<S: Into<String>>(msg: S) -> Self {
        SwitchError::Notification(msg.into())
    }

    /// Create a new environment error
    pub fn environment<S: Into<String>>(msg: S) -> Self {
        SwitchError::Environment(msg.into())
    }

    /// Create a new selection error
    pub fn invalid_selection<S: Into<String>>(msg: S) -> Self {
        SwitchError::InvalidSelection(msg.into())
    }
}

impl From<serde_json::Error> for SwitchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SwitchError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<io::Error> for SwitchError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SwitchError::config("bad entry");
        assert!(matches!(err, SwitchError::Config(_)));

        let err = SwitchError::not_found("/envs/gone");
        assert!(matches!(err, SwitchError::NotFound(_)));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: SwitchError = io_err.into();
        assert!(matches!(err, SwitchError::Io(_)));

        let toml_err = toml::from_str::<toml::Value>("key = [").unwrap_err();
        let err: SwitchError = toml_err.into();
        assert!(matches!(err, SwitchError::Config(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SwitchError::not_found("/envs/myenv");
        assert_eq!(err.to_string(), "Virtualenv '/envs/myenv' does not exist.");

        let err = SwitchError::config("test error");
        assert_eq!(err.to_string(), "Configuration error: test error");
    }
}
