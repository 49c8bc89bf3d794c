use std::io;
use std::time::Duration;

/// Failures of a single call to the recommendation service
///
/// Every variant is final for the call that produced it; the client never
/// retries internally.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("Failed to connect to recommendation service at {endpoint}: {source}")]
    ConnectFailed {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write request: {0}")]
    WriteFailed(#[source] io::Error),

    #[error("I/O error while reading response: {0}")]
    IOError(#[source] io::Error),

    #[error("Recommendation service closed the connection without responding")]
    EmptyResponse,

    #[error("Connection closed after {received} bytes before the response was complete")]
    PrematureClose { received: usize },

    #[error("Response exceeded {limit} bytes before it was complete")]
    ResponseTooLarge { limit: usize },

    #[error("No complete response within {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}
