//! Error type shared by the client, parser, and scheduler entry points.

use std::io;

/// Errors produced by the HTTP client and its collaborators.
///
/// Would-block conditions are never represented here; they are reported through the
/// [`crate::ReceiveOutcome`] / [`crate::PublishOutcome`] / [`crate::DriveOutcome`] values of
/// the session traits and cause the same operation to be retried later.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The URL could not be split into scheme, host, port, and path.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The response violated HTTP framing: malformed status line, header line without a
    /// colon, bad chunk-size line, or an oversized preamble.
    #[error("malformed response: {0}")]
    Parse(String),

    /// Transport-level I/O failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The peer closed the connection before the response was complete.
    #[error("connection closed before response was complete")]
    ConnectionClosed,

    /// A blocking call exceeded its deadline.
    #[error("timeout")]
    Timeout,

    /// The scheduler task table is full.
    #[error("scheduler at capacity")]
    Busy,

    /// The send retry budget was exhausted without the request going out.
    #[error("send retries exhausted")]
    Exhausted,
}

impl From<HttpError> for io::Error {
    fn from(err: HttpError) -> io::Error {
        let kind = match &err {
            HttpError::Io(inner) => inner.kind(),
            HttpError::InvalidUrl(_) => io::ErrorKind::InvalidInput,
            HttpError::Parse(_) => io::ErrorKind::InvalidData,
            HttpError::ConnectionClosed => io::ErrorKind::UnexpectedEof,
            HttpError::Timeout => io::ErrorKind::TimedOut,
            HttpError::Busy => io::ErrorKind::WouldBlock,
            HttpError::Exhausted => io::ErrorKind::TimedOut,
        };
        io::Error::new(kind, err)
    }
}
