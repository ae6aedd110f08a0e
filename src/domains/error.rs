use std::io::ErrorKind;

/// Operation-level failures surfaced to the session caller.
///
/// Every variant names the operation that failed; callers treat them as
/// fatal, there is no retry policy at this layer.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("could not connect to the store: {0}")]
    Connection(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("key not found")]
    NotFound,

    #[error("read failed: {0}")]
    Read(String),
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum IoError {
    #[error("ConnectionRefused")]
    ConnectionRefused,
    #[error("ConnectionReset")]
    ConnectionReset,
    #[error("ConnectionAborted")]
    ConnectionAborted,
    #[error("NotConnected")]
    NotConnected,
    #[error("BrokenPipe")]
    BrokenPipe,
    #[error("TimedOut")]
    TimedOut,
    #[error("Unknown")]
    Unknown,
}

impl From<ErrorKind> for IoError {
    fn from(value: ErrorKind) -> Self {
        match value {
            ErrorKind::ConnectionRefused => IoError::ConnectionRefused,
            ErrorKind::ConnectionReset => IoError::ConnectionReset,
            ErrorKind::ConnectionAborted => IoError::ConnectionAborted,
            ErrorKind::NotConnected => IoError::NotConnected,
            ErrorKind::BrokenPipe => IoError::BrokenPipe,
            ErrorKind::TimedOut => IoError::TimedOut,
            _ => IoError::Unknown,
        }
    }
}
