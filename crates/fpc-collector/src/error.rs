//! Error types for the FPC collector
//!
//! # NIST 800-53 Rev 5 Control Mappings
//! - SI-11: Error Handling - Structured error types with contextual information
//! - SI-10: Information Input Validation - Malformed device replies are rejected

use std::io;
use thiserror::Error;

/// Result type alias for collector operations
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Errors that abort a poll
///
/// None of these are recovered inside the collector. The first one raised
/// ends the poll and is returned to the caller.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The command-execution collaborator failed; surfaced as-is
    #[error(transparent)]
    Transport(#[from] ClientError),

    /// The reply to a query could not be normalized
    #[error("Failed to parse reply to '{command}': {source}")]
    Parse {
        /// Device query the reply belongs to
        command: String,
        #[source]
        source: ParseError,
    },

    /// The metric sink stopped accepting samples
    #[error("Metric sink rejected sample '{metric}': {message}")]
    Sink { metric: String, message: String },

    /// Building the Prometheus exposition failed
    #[error("Prometheus error: {0}")]
    Export(#[from] prometheus::Error),

    /// Configuration error
    /// NIST: CM-6 (Configuration Settings) - Configuration validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be decoded
    #[error("Invalid configuration file: {0}")]
    ConfigFormat(#[from] serde_yaml::Error),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CollectorError {
    /// Creates a parse error for the given query
    pub fn parse(command: impl Into<String>, source: ParseError) -> Self {
        Self::Parse {
            command: command.into(),
            source,
        }
    }

    /// Creates a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Reasons a raw reply does not normalize
#[derive(Debug, Error)]
pub enum ParseError {
    /// Not well-formed XML
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Well-formed, but the elements do not fit the expected layout
    #[error("unexpected reply layout: {0}")]
    Layout(#[from] quick_xml::DeError),

    /// Reply root (or, under `rpc-reply`, the first child) is neither known shape
    #[error("unrecognized reply element <{0}>")]
    UnknownShape(String),

    /// Reply contains no element at all
    #[error("reply contains no XML elements")]
    Empty,

    /// Reply ended with elements still open
    #[error("reply ended inside <{0}>")]
    Truncated(String),

    /// Multi-RE envelope without a single RE entry
    #[error("multi-routing-engine-results contains no routing engine")]
    EmptyEnvelope,

    /// Reply bytes are not UTF-8
    #[error("reply is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Failures of the command-execution collaborator
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport program could not be started
    #[error("Failed to execute '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The transport program ran but reported failure
    #[error("Command '{command}' failed (exit code {exit_code}): {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    /// No captured reply exists for a replayed command
    #[error("No captured reply for '{command}' at {path}: {source}")]
    MissingReply {
        command: String,
        path: String,
        #[source]
        source: io::Error,
    },

    /// Any other transport failure
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_is_verbatim() {
        let err: CollectorError = ClientError::Other("connection reset by peer".into()).into();
        assert_eq!(err.to_string(), "connection reset by peer");
    }

    #[test]
    fn test_parse_error_display() {
        let err = CollectorError::parse(
            "show chassis fpc",
            ParseError::UnknownShape("route-information".into()),
        );
        assert_eq!(
            err.to_string(),
            "Failed to parse reply to 'show chassis fpc': unrecognized reply element <route-information>"
        );
    }

    #[test]
    fn test_command_failed_display() {
        let err = ClientError::CommandFailed {
            command: "show chassis fpc detail".to_string(),
            exit_code: 255,
            stderr: "Permission denied".to_string(),
        };
        assert!(err.to_string().contains("exit code 255"));
        assert!(err.to_string().contains("Permission denied"));
    }
}
