//! TCP client for the recommendation service
//!
//! One call owns one connection: connect, write the encoded request once,
//! read into a buffer until the chosen framing policy says the response is
//! complete, decode, and drop the socket. The whole call races a single
//! timer; when the timer wins, the in-flight future (and with it the socket)
//! is dropped, which closes the connection and unblocks any pending read.

use std::{fmt::Display, time::Duration};

use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    time::Instant,
};
use tracing::instrument;
use uuid::Uuid;

use super::{codec::Message, error::TransportError, framing::Framing};

/// Default cap on buffered response bytes (1 MiB)
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

const READ_CHUNK_SIZE: usize = 4096;

/// Address of the recommendation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Per-call settings chosen by each call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    pub timeout: Duration,
    pub framing: Framing,
}

impl CallOptions {
    pub fn new(timeout: Duration, framing: Framing) -> Self {
        Self { timeout, framing }
    }
}

/// Seam between the call sites and the wire
///
/// Implemented by [`TransportClient`]; call-site tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationTransport: Send + Sync {
    /// Performs one request/response round trip
    async fn call(
        &self,
        request: Message,
        options: CallOptions,
    ) -> Result<Message, TransportError>;
}

/// Connection-per-call client bound to a fixed endpoint
///
/// Holds no mutable state, so one instance can serve any number of
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct TransportClient {
    endpoint: Endpoint,
    max_response_bytes: usize,
}

impl TransportClient {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    /// Overrides the response buffer cap
    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Sends `request` and waits for a framed response, bounded by
    /// `options.timeout` from the moment the call starts (connect included)
    #[instrument(
        skip_all,
        fields(
            call_id = %Uuid::new_v4(),
            endpoint = %self.endpoint,
            framing = %options.framing,
        )
    )]
    pub async fn round_trip(
        &self,
        request: &Message,
        options: CallOptions,
    ) -> Result<Message, TransportError> {
        let started = Instant::now();

        let result = match tokio::time::timeout(
            options.timeout,
            self.connect_and_exchange(request, options.framing),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(options.timeout)),
        };

        let elapsed = started.elapsed();
        match &result {
            Ok(response) => tracing::debug!(
                ?elapsed,
                request = %request,
                response = %response,
                "Recommendation service call completed"
            ),
            Err(e) => tracing::debug!(
                ?elapsed,
                request = %request,
                error = %e,
                "Recommendation service call failed"
            ),
        }

        result
    }

    async fn connect_and_exchange(
        &self,
        request: &Message,
        framing: Framing,
    ) -> Result<Message, TransportError> {
        let mut stream = TcpStream::connect((self.endpoint.host.as_str(), self.endpoint.port))
            .await
            .map_err(|source| TransportError::ConnectFailed {
                endpoint: self.endpoint.to_string(),
                source,
            })?;

        // `stream` is dropped on every return path, closing the socket
        exchange(&mut stream, request, framing, self.max_response_bytes).await
    }
}

#[async_trait::async_trait]
impl RecommendationTransport for TransportClient {
    async fn call(
        &self,
        request: Message,
        options: CallOptions,
    ) -> Result<Message, TransportError> {
        self.round_trip(&request, options).await
    }
}

/// Writes one request and reads until `framing` reports a complete response
pub(crate) async fn exchange<S>(
    stream: &mut S,
    request: &Message,
    framing: Framing,
    max_response_bytes: usize,
) -> Result<Message, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream
        .write_all(&request.encode())
        .await
        .map_err(TransportError::WriteFailed)?;
    stream.flush().await.map_err(TransportError::WriteFailed)?;

    let mut buf = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(TransportError::IOError)?;

        if n == 0 {
            framing.on_end_of_stream(&buf)?;
            break;
        }

        buf.extend_from_slice(&chunk[..n]);
        tracing::trace!(received = n, buffered = buf.len(), "Read response chunk");

        if framing.is_complete(&buf) {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!(error = %e, "Shutdown after framed response failed");
            }
            break;
        }

        if buf.len() > max_response_bytes {
            return Err(TransportError::ResponseTooLarge {
                limit: max_response_bytes,
            });
        }
    }

    Ok(Message::decode(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tokio_test::io::Builder;

    const VIEW_REQUEST: &[u8] = b"action:view\nuser_id:u1\nvideo_id:v1\n";

    fn view_request() -> Message {
        Message::new()
            .with("action", "view")
            .with("user_id", "u1")
            .with("video_id", "v1")
    }

    #[tokio::test]
    async fn test_close_terminated_without_trailing_newline() {
        let mut stream = Builder::new()
            .write(VIEW_REQUEST)
            .read(b"status:success")
            .build();

        let response = exchange(
            &mut stream,
            &view_request(),
            Framing::CloseTerminated,
            DEFAULT_MAX_RESPONSE_BYTES,
        )
        .await
        .unwrap();

        assert_eq!(response, Message::new().with("status", "success"));
    }

    #[tokio::test]
    async fn test_close_terminated_reads_every_chunk_until_close() {
        let mut stream = Builder::new()
            .write(VIEW_REQUEST)
            .read(b"status:success\n")
            .read(b"message:Test successful\n")
            .build();

        let response = exchange(
            &mut stream,
            &view_request(),
            Framing::CloseTerminated,
            DEFAULT_MAX_RESPONSE_BYTES,
        )
        .await
        .unwrap();

        assert_eq!(response.get("message"), Some("Test successful"));
        assert_eq!(response.len(), 2);
    }

    #[tokio::test]
    async fn test_newline_terminated_across_chunks() {
        let mut stream = Builder::new()
            .write(VIEW_REQUEST)
            .read(b"status:suc")
            .read(b"cess\n")
            .build();

        let response = exchange(
            &mut stream,
            &view_request(),
            Framing::NewlineTerminated,
            DEFAULT_MAX_RESPONSE_BYTES,
        )
        .await
        .unwrap();

        assert_eq!(response, Message::new().with("status", "success"));
    }

    #[tokio::test]
    async fn test_close_with_nothing_received_is_empty_response() {
        let mut stream = Builder::new().write(VIEW_REQUEST).build();

        let result = exchange(
            &mut stream,
            &view_request(),
            Framing::CloseTerminated,
            DEFAULT_MAX_RESPONSE_BYTES,
        )
        .await;

        assert!(matches!(result, Err(TransportError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_newline_terminated_premature_close() {
        let mut stream = Builder::new()
            .write(VIEW_REQUEST)
            .read(b"status:suc")
            .build();

        let result = exchange(
            &mut stream,
            &view_request(),
            Framing::NewlineTerminated,
            DEFAULT_MAX_RESPONSE_BYTES,
        )
        .await;

        assert!(matches!(
            result,
            Err(TransportError::PrematureClose { received: 10 })
        ));
    }

    #[tokio::test]
    async fn test_write_failure() {
        let mut stream = Builder::new()
            .write_error(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"))
            .build();

        let result = exchange(
            &mut stream,
            &view_request(),
            Framing::NewlineTerminated,
            DEFAULT_MAX_RESPONSE_BYTES,
        )
        .await;

        assert!(matches!(result, Err(TransportError::WriteFailed(_))));
    }

    #[tokio::test]
    async fn test_read_failure() {
        let mut stream = Builder::new()
            .write(VIEW_REQUEST)
            .read(b"status:")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();

        let result = exchange(
            &mut stream,
            &view_request(),
            Framing::NewlineTerminated,
            DEFAULT_MAX_RESPONSE_BYTES,
        )
        .await;

        match result {
            Err(TransportError::IOError(e)) => {
                assert_eq!(e.kind(), io::ErrorKind::ConnectionReset)
            }
            other => panic!("expected IOError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_response_too_large() {
        let mut stream = Builder::new()
            .write(VIEW_REQUEST)
            .read(b"recommendations:a,b,c,d,e,f")
            .build();

        let result = exchange(&mut stream, &view_request(), Framing::NewlineTerminated, 8).await;

        assert!(matches!(
            result,
            Err(TransportError::ResponseTooLarge { limit: 8 })
        ));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port nothing is listening on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = TransportClient::new(Endpoint::new("127.0.0.1", port));
        let result = client
            .round_trip(
                &view_request(),
                CallOptions::new(Duration::from_secs(2), Framing::NewlineTerminated),
            )
            .await;

        assert!(matches!(result, Err(TransportError::ConnectFailed { .. })));
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::new("127.0.0.1", 5566).to_string(), "127.0.0.1:5566");
    }
}
