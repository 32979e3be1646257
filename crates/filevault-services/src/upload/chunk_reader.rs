//! Splits an async byte stream into ordered, bounded chunks.

use std::io;

use bytes::Bytes;
use filevault_core::Chunk;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum ChunkReadError {
    #[error("upload stream failed after {bytes_read} bytes: {source}")]
    Stream {
        bytes_read: u64,
        #[source]
        source: io::Error,
    },

    #[error("upload exceeds the maximum size of {max_bytes} bytes")]
    TooLarge { max_bytes: u64 },

    #[error("upload queue closed before chunk {index} was queued")]
    QueueClosed { index: u64 },
}

/// Totals of a fully consumed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSummary {
    pub chunks: u64,
    pub bytes: u64,
}

/// Lazy, finite chunk sequence over a reader.
///
/// Every chunk except the last holds exactly `chunk_size` bytes; no chunk is
/// empty. Once the stream ends or fails the reader yields nothing further.
pub struct ChunkReader<R> {
    reader: R,
    chunk_size: usize,
    max_bytes: Option<u64>,
    next_index: u64,
    bytes_read: u64,
    finished: bool,
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            max_bytes: None,
            next_index: 0,
            bytes_read: 0,
            finished: false,
        }
    }

    /// Fail the stream once more than `max_bytes` have been read.
    pub fn with_limit(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Pull the next chunk.
    ///
    /// Partial data buffered when the stream fails is discarded, never emitted.
    pub async fn next_chunk(&mut self) -> Result<Option<Chunk>, ChunkReadError> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        let mut eof = false;

        while filled < self.chunk_size {
            match self.reader.read(&mut buf[filled..]).await {
                Ok(0) => {
                    eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    self.finished = true;
                    return Err(ChunkReadError::Stream {
                        bytes_read: self.bytes_read + filled as u64,
                        source,
                    });
                }
            }
        }

        if eof {
            self.finished = true;
        }
        if filled == 0 {
            return Ok(None);
        }

        self.bytes_read += filled as u64;
        if let Some(max_bytes) = self.max_bytes {
            if self.bytes_read > max_bytes {
                self.finished = true;
                return Err(ChunkReadError::TooLarge { max_bytes });
            }
        }

        buf.truncate(filled);
        let chunk = Chunk::new(self.next_index, Bytes::from(buf));
        self.next_index += 1;

        Ok(Some(chunk))
    }

    /// Drive the reader into a bounded queue.
    ///
    /// `send` suspends while the queue is full, which throttles the reader to
    /// the pace of the workers. Dropping `tx` on return signals end-of-stream.
    pub async fn pump(mut self, tx: mpsc::Sender<Chunk>) -> Result<ReadSummary, ChunkReadError> {
        while let Some(chunk) = self.next_chunk().await? {
            let index = chunk.index;
            if tx.send(chunk).await.is_err() {
                tracing::debug!(chunk_index = index, "Upload queue closed, reader stopping");
                return Err(ChunkReadError::QueueClosed { index });
            }
        }

        Ok(ReadSummary {
            chunks: self.next_index,
            bytes: self.bytes_read,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    /// Yields `data` in small slices, then fails.
    struct FailingReader {
        data: Vec<u8>,
        pos: usize,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.pos >= self.data.len() {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "client went away",
                )));
            }
            let end = (self.pos + 3).min(self.data.len()).min(self.pos + buf.remaining());
            let slice = self.data[self.pos..end].to_vec();
            buf.put_slice(&slice);
            self.pos = end;
            Poll::Ready(Ok(()))
        }
    }

    async fn collect(data: &[u8], chunk_size: usize) -> Vec<Chunk> {
        let mut reader = ChunkReader::new(data, chunk_size);
        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk().await.unwrap() {
            chunks.push(chunk);
        }
        chunks
    }

    #[tokio::test]
    async fn concatenation_reproduces_source() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        for chunk_size in [1, 7, 64, 999, 1000, 1001, 4096] {
            let chunks = collect(&data, chunk_size).await;
            assert_eq!(chunks.len(), data.len().div_ceil(chunk_size));
            let mut joined = Vec::new();
            for (i, chunk) in chunks.iter().enumerate() {
                assert_eq!(chunk.index, i as u64);
                assert!(!chunk.is_empty());
                assert!(chunk.len() <= chunk_size);
                joined.extend_from_slice(&chunk.data);
            }
            assert_eq!(joined, data);
        }
    }

    #[tokio::test]
    async fn empty_stream_yields_no_chunks() {
        let chunks = collect(&[], 16).await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn exact_multiple_has_no_trailing_empty_chunk() {
        let data = vec![7u8; 48];
        let chunks = collect(&data, 16).await;
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 16));
    }

    #[tokio::test]
    async fn short_reads_still_fill_whole_chunks() {
        let reader = FailingReader {
            data: vec![1u8; 10],
            pos: 0,
        };
        let mut chunks = ChunkReader::new(reader, 4);
        assert_eq!(chunks.next_chunk().await.unwrap().unwrap().len(), 4);
        assert_eq!(chunks.next_chunk().await.unwrap().unwrap().len(), 4);
        // Two bytes are buffered when the stream fails; they are dropped.
        let err = chunks.next_chunk().await.unwrap_err();
        assert!(matches!(err, ChunkReadError::Stream { bytes_read: 10, .. }));
        assert!(chunks.next_chunk().await.unwrap().is_none());
        assert_eq!(chunks.bytes_read(), 8);
    }

    #[tokio::test]
    async fn limit_is_enforced() {
        let data = vec![0u8; 100];
        let mut reader = ChunkReader::new(&data[..], 30).with_limit(50);
        assert!(reader.next_chunk().await.unwrap().is_some());
        let err = reader.next_chunk().await.unwrap_err();
        assert!(matches!(err, ChunkReadError::TooLarge { max_bytes: 50 }));
    }

    #[tokio::test]
    async fn pump_through_small_queue_preserves_order() {
        let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
        let (tx, mut rx) = mpsc::channel(2);
        let reader = ChunkReader::new(std::io::Cursor::new(data.clone()), 1024);

        let consumer = tokio::spawn(async move {
            let mut received = Vec::new();
            while let Some(chunk) = rx.recv().await {
                received.push(chunk);
                tokio::task::yield_now().await;
            }
            received
        });

        let summary = reader.pump(tx).await.unwrap();
        let received = consumer.await.unwrap();

        assert_eq!(summary.chunks, 10);
        assert_eq!(summary.bytes, 10_000);
        let joined: Vec<u8> = received.iter().flat_map(|c| c.data.to_vec()).collect();
        assert_eq!(joined, data);
    }

    #[tokio::test]
    async fn pump_stops_when_queue_closes() {
        let data = vec![0u8; 100];
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let err = ChunkReader::new(&data[..], 10).pump(tx).await.unwrap_err();
        assert!(matches!(err, ChunkReadError::QueueClosed { index: 0 }));
    }
}
