//! Exact-length stream primitives for the worker protocol.
//!
//! The codec layer describes packets in terms of "read exactly N bytes" and
//! "write this buffer"; this module provides those two operations plus the
//! orderly close used on the shutdown path. All three suspend the single
//! worker task instead of blocking a thread: an exact read parks until the
//! stream produces enough bytes, a write parks while the stream's outgoing
//! buffer drains, and the finalizer parks until the close completes.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::proto::ProtocolError;

/// Read exactly `n` bytes from the stream.
///
/// Tolerates arbitrarily small chunk deliveries: the underlying `read_exact`
/// re-arms on readiness until the full count has accumulated.
///
/// A request for zero bytes completes immediately without consulting the
/// stream, since a stream never signals readiness for an empty read.
///
/// # Errors
///
/// Returns `ProtocolError::Stream` if the stream ends or errors before `n`
/// bytes arrive, and `ProtocolError::ShortRead` if the stream layer reports
/// success with fewer bytes than requested (an internal invariant failure).
pub async fn read_chunk<R>(reader: &mut R, n: usize) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut buf = vec![0u8; n];
    let got = reader.read_exact(&mut buf).await?;

    // Safety net only: read_exact resolves with the full count or an error.
    if got != n {
        return Err(ProtocolError::ShortRead { wanted: n, got });
    }

    Ok(buf)
}

/// Write the whole buffer to the stream and flush it.
///
/// Suspends while the stream's outgoing buffer is saturated, so a completed
/// call means every byte has been handed to the operating system. The stream
/// is never closed here; the primitive is invoked once per response cycle for
/// the life of the worker.
///
/// # Errors
///
/// Propagates stream-level write and flush failures as `ProtocolError::Stream`.
pub async fn write_chunk<W>(writer: &mut W, buf: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(buf).await?;
    writer.flush().await?;
    Ok(())
}

/// Orderly end-of-output: flush pending writes and close the stream.
///
/// Suspends until the underlying close completes, so every previously
/// enqueued byte is delivered before the stream is marked closed. Called
/// exactly once, on the shutdown path.
pub async fn finish<W>(writer: &mut W) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    writer.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::io::duplex;
    use tokio::time::timeout;

    /// Test timeout to prevent hanging tests.
    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_read_chunk_all_at_once() {
        let (mut tx, mut rx) = duplex(64);

        tx.write_all(b"abcdefgh").await.expect("Write failed");

        let got = timeout(TEST_TIMEOUT, read_chunk(&mut rx, 8))
            .await
            .expect("Test timed out")
            .expect("Read failed");

        assert_eq!(got, b"abcdefgh");
    }

    #[tokio::test]
    async fn test_read_chunk_one_byte_at_a_time() {
        let (mut tx, mut rx) = duplex(4);

        let payload: Vec<u8> = (0u8..32).collect();
        let expected = payload.clone();

        // Dribble the payload in one-byte writes from a concurrent task.
        let writer = tokio::spawn(async move {
            for byte in payload {
                tx.write_all(&[byte]).await.expect("Write failed");
                tokio::task::yield_now().await;
            }
        });

        let got = timeout(TEST_TIMEOUT, read_chunk(&mut rx, 32))
            .await
            .expect("Test timed out")
            .expect("Read failed");

        writer.await.expect("Writer task panicked");
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn test_read_chunk_zero_bytes_ignores_stream() {
        // No data is ever written; a zero-length request must still complete.
        let (_tx, mut rx) = duplex(4);

        let got = timeout(TEST_TIMEOUT, read_chunk(&mut rx, 0))
            .await
            .expect("Zero-length read should not touch the stream")
            .expect("Read failed");

        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn test_read_chunk_eof_before_count_is_error() {
        let (mut tx, mut rx) = duplex(16);

        tx.write_all(b"abc").await.expect("Write failed");
        drop(tx);

        let result = timeout(TEST_TIMEOUT, read_chunk(&mut rx, 5))
            .await
            .expect("Test timed out");

        assert!(matches!(result, Err(ProtocolError::Stream(_))));
    }

    #[tokio::test]
    async fn test_write_chunk_completes_under_backpressure() {
        // Buffer far smaller than the payload forces the writer to suspend
        // until the reader drains.
        let (mut tx, mut rx) = duplex(8);

        let payload: Vec<u8> = (0..256).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();

        let reader = tokio::spawn(async move {
            let mut collected = Vec::new();
            rx.read_to_end(&mut collected).await.expect("Read failed");
            collected
        });

        timeout(TEST_TIMEOUT, write_chunk(&mut tx, &payload))
            .await
            .expect("Test timed out")
            .expect("Write failed");
        drop(tx);

        let collected = reader.await.expect("Reader task panicked");
        assert_eq!(collected, expected);
    }

    #[tokio::test]
    async fn test_write_chunk_leaves_stream_usable() {
        let (mut tx, mut rx) = duplex(64);

        write_chunk(&mut tx, b"first").await.expect("Write failed");
        write_chunk(&mut tx, b"second").await.expect("Write failed");
        drop(tx);

        let mut collected = Vec::new();
        timeout(TEST_TIMEOUT, rx.read_to_end(&mut collected))
            .await
            .expect("Test timed out")
            .expect("Read failed");

        assert_eq!(collected, b"firstsecond");
    }

    #[tokio::test]
    async fn test_finish_delivers_pending_bytes_then_eof() {
        let (mut tx, mut rx) = duplex(64);

        tx.write_all(b"tail").await.expect("Write failed");
        finish(&mut tx).await.expect("Finish failed");

        let mut collected = Vec::new();
        timeout(TEST_TIMEOUT, rx.read_to_end(&mut collected))
            .await
            .expect("Test timed out")
            .expect("Read failed");

        assert_eq!(collected, b"tail");
    }
}
