//! Response framing policies
//!
//! The recommendation service never announces a response length, so the
//! caller must pick how it recognises a complete response. The two policies
//! are not interchangeable: a peer that keeps its side open after answering
//! will only ever satisfy `NewlineTerminated`, and a peer that streams
//! several lines before closing will only be read in full under
//! `CloseTerminated`.

use serde::Deserialize;
use std::fmt::Display;

use super::{codec::DELIMITER, error::TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    /// Complete only once the peer closes its side of the connection
    #[serde(alias = "close")]
    CloseTerminated,
    /// Complete as soon as the buffer ends with `\n`; the client then closes
    #[serde(alias = "newline")]
    NewlineTerminated,
}

impl Framing {
    /// Whether the bytes received so far form a complete response while the
    /// stream is still open
    pub fn is_complete(&self, buf: &[u8]) -> bool {
        match self {
            Framing::CloseTerminated => false,
            Framing::NewlineTerminated => buf.last() == Some(&DELIMITER),
        }
    }

    /// Decides what end-of-stream means for the bytes received so far
    pub fn on_end_of_stream(&self, buf: &[u8]) -> Result<(), TransportError> {
        if buf.is_empty() {
            return Err(TransportError::EmptyResponse);
        }

        match self {
            Framing::CloseTerminated => Ok(()),
            // A complete buffer would have finished the read loop already
            Framing::NewlineTerminated => Err(TransportError::PrematureClose {
                received: buf.len(),
            }),
        }
    }
}

impl Display for Framing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Framing::CloseTerminated => write!(f, "close_terminated"),
            Framing::NewlineTerminated => write!(f, "newline_terminated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_terminated_never_completes_early() {
        assert!(!Framing::CloseTerminated.is_complete(b"status:success\n"));
    }

    #[test]
    fn test_newline_terminated_waits_for_delimiter() {
        let framing = Framing::NewlineTerminated;
        assert!(!framing.is_complete(b""));
        assert!(!framing.is_complete(b"status:suc"));
        assert!(framing.is_complete(b"status:success\n"));
    }

    #[test]
    fn test_end_of_stream_with_nothing_received() {
        for framing in [Framing::CloseTerminated, Framing::NewlineTerminated] {
            assert!(matches!(
                framing.on_end_of_stream(b""),
                Err(TransportError::EmptyResponse)
            ));
        }
    }

    #[test]
    fn test_end_of_stream_completes_close_terminated() {
        assert!(Framing::CloseTerminated
            .on_end_of_stream(b"status:success")
            .is_ok());
    }

    #[test]
    fn test_end_of_stream_is_premature_for_newline_terminated() {
        assert!(matches!(
            Framing::NewlineTerminated.on_end_of_stream(b"status:suc"),
            Err(TransportError::PrematureClose { received: 10 })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Framing::CloseTerminated.to_string(), "close_terminated");
        assert_eq!(Framing::NewlineTerminated.to_string(), "newline_terminated");
    }
}
