//! Mailbox error types.

use thiserror::Error;

/// Errors that can occur while talking to the mailbox.
///
/// Connection-level variants (`ConnectionFailed`, `TlsError`,
/// `AuthenticationFailed`, `Timeout`) and `ProtocolError` abort a sync run.
#[derive(Error, Debug)]
pub enum EmailError {
    /// Failed to connect to the IMAP server.
    #[error("IMAP connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS/SSL error during connection.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Login rejected.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// No usable password source.
    #[error("Credentials not found: {0}")]
    CredentialsNotFound(String),

    /// Unexpected server response, e.g. to `ID` or `EXAMINE`.
    #[error("IMAP protocol error: {0}")]
    ProtocolError(String),

    /// Failed to parse an email message.
    #[error("Failed to parse email: {0}")]
    ParseError(String),

    /// A mailbox operation was attempted without a session.
    #[error("Not connected to the IMAP server")]
    NotConnected,

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// IO error on the underlying socket.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<async_native_tls::Error> for EmailError {
    fn from(err: async_native_tls::Error) -> Self {
        EmailError::TlsError(err.to_string())
    }
}

impl From<async_imap::error::Error> for EmailError {
    fn from(err: async_imap::error::Error) -> Self {
        EmailError::ProtocolError(err.to_string())
    }
}

impl From<crate::secrets::SecretError> for EmailError {
    fn from(err: crate::secrets::SecretError) -> Self {
        EmailError::CredentialsNotFound(err.to_string())
    }
}

/// Result type for mailbox operations.
pub type Result<T> = std::result::Result<T, EmailError>;
