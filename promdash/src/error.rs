use thiserror::Error;

/// Errors that can occur while building a dashboard
#[derive(Error, Debug)]
pub enum PromdashError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Input entry that cannot be attributed to a metric
    #[error("Malformed entry: {message}")]
    MalformedEntry { message: String },

    /// Exposition text that could not be tokenized
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Dashboard generation error
    #[error("Dashboard generation error: {message}")]
    Dashboard { message: String },

    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PromdashError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new malformed entry error
    pub fn malformed_entry(message: impl Into<String>) -> Self {
        Self::MalformedEntry {
            message: message.into(),
        }
    }

    /// Create a new parse error for the given 1-based line number
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create a new dashboard error
    pub fn dashboard(message: impl Into<String>) -> Self {
        Self::Dashboard {
            message: message.into(),
        }
    }
}

/// Result type for promdash operations
pub type PromdashResult<T> = Result<T, PromdashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PromdashError::parse(12, "unterminated label value");
        assert_eq!(
            err.to_string(),
            "Parse error on line 12: unterminated label value"
        );

        let err = PromdashError::malformed_entry("sample without __name__");
        assert_eq!(err.to_string(), "Malformed entry: sample without __name__");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PromdashError = io.into();
        assert!(matches!(err, PromdashError::Io(_)));
    }
}
