//! Connection lifecycle tracking and request reading.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Track active connections so shutdown can drain them
//! - Read one request message from a connection, bounded in size
//!
//! # Design Decisions
//! - A message is complete once the header block and the declared
//!   Content-Length have arrived, the peer stops sending, or the read
//!   deadline passes after the header block
//! - Without a Content-Length, whatever arrived with the header block is the body
//! - Oversized messages fail explicitly instead of being truncated

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::Instant;

use crate::http::error::HttpError;
use crate::http::headers::parse_content_length;
use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

const READ_CHUNK: usize = 1024;
const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Tracks active connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        let active = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_active_connections(active);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until all tracked connections are closed.
    pub async fn wait_for_drain(&self) {
        while self.active_count.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let active = self.active_count.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        metrics::record_active_connections(active);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// Read a single request message of at most `limit` bytes within `timeout`.
///
/// When the deadline passes after the header block arrived, the partial
/// message is returned so the parser can report the body it actually got.
pub async fn read_request<R>(
    reader: &mut R,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<u8>, HttpError>
where
    R: AsyncRead + Unpin,
{
    let deadline = Instant::now() + timeout;
    let mut buf = Vec::with_capacity(READ_CHUNK.min(limit));
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let expected = expected_length(&buf);
        if let Some(expected) = expected {
            if expected > limit {
                return Err(HttpError::RequestTooLarge { limit });
            }
            if buf.len() >= expected {
                return Ok(buf);
            }
        }

        let n = match tokio::time::timeout_at(deadline, reader.read(&mut chunk)).await {
            Ok(read) => read?,
            Err(_) if expected.is_some() => {
                tracing::debug!(received = buf.len(), "Read deadline passed mid-body");
                return Ok(buf);
            }
            Err(_) => return Err(HttpError::RequestTimeout),
        };
        if n == 0 {
            return Ok(buf);
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > limit {
            return Err(HttpError::RequestTooLarge { limit });
        }
    }
}

/// Total message length once the header block is complete.
///
/// An unparseable Content-Length counts as zero; the parser reports it.
fn expected_length(buf: &[u8]) -> Option<usize> {
    let header_end = buf
        .windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)?
        + HEADER_TERMINATOR.len();

    let head = String::from_utf8_lossy(&buf[..header_end]);
    let declared = head
        .split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| parse_content_length(value.trim()))
        .unwrap_or(0);

    Some(header_end.saturating_add(declared))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::ErrorKind;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn connection_tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn reads_until_declared_length() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            client
                .write_all(b"POST /x HTTP/1.1\r\nContent-Length: 7\r\n\r\n")
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            client.write_all(b"{\"a\":1}").await.unwrap();
            client
        });

        let raw = read_request(&mut server, 1024, WAIT).await.unwrap();
        assert!(raw.ends_with(b"{\"a\":1}"));
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn header_block_without_length_completes_message() {
        let mut input: &[u8] = b"GET /x HTTP/1.1\r\nAccept: */*\r\n\r\n";
        let raw = read_request(&mut input, 1024, WAIT).await.unwrap();
        assert_eq!(raw, b"GET /x HTTP/1.1\r\nAccept: */*\r\n\r\n");
    }

    #[tokio::test]
    async fn oversized_declared_body_fails_early() {
        let mut input: &[u8] = b"POST /x HTTP/1.1\r\nContent-Length: 5000\r\n\r\n";
        let err = read_request(&mut input, 256, WAIT).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestTooLarge);
    }

    #[tokio::test]
    async fn oversized_header_block_fails() {
        let big = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(300));
        let mut input = big.as_bytes();
        let err = read_request(&mut input, 128, WAIT).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestTooLarge);
    }

    #[tokio::test]
    async fn eof_returns_what_arrived() {
        let mut input: &[u8] = b"GET /x HTTP/1.1";
        let raw = read_request(&mut input, 1024, WAIT).await.unwrap();
        assert_eq!(raw, b"GET /x HTTP/1.1");
    }

    #[tokio::test]
    async fn short_body_is_returned_when_deadline_passes() {
        let (mut client, mut server) = tokio::io::duplex(256);
        {
            use tokio::io::AsyncWriteExt;
            client
                .write_all(b"POST /x HTTP/1.1\r\nContent-Length: 20\r\n\r\n{\"a\":1}")
                .await
                .unwrap();
        }

        let raw = read_request(&mut server, 1024, Duration::from_millis(100))
            .await
            .unwrap();
        assert!(raw.ends_with(b"{\"a\":1}"));
        drop(client);
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let (client, mut server) = tokio::io::duplex(64);
        let err = read_request(&mut server, 1024, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestTimeout);
        drop(client);
    }

    #[tokio::test]
    async fn partial_header_block_times_out() {
        let (mut client, mut server) = tokio::io::duplex(64);
        {
            use tokio::io::AsyncWriteExt;
            client.write_all(b"GET /x HTTP/1.1\r\nAcc").await.unwrap();
        }
        let err = read_request(&mut server, 1024, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestTimeout);
        drop(client);
    }
}
