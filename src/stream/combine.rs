// src/stream/combine.rs

//! Fan-in of several byte streams into one.
//!
//! Every source gets its own reader task as soon as [`combine_streams`] is
//! called. Chunks are forwarded in arrival order over an unbounded channel,
//! so nothing a source produces before the consumer starts reading is lost,
//! and each source's bytes keep their own order. There is no ordering across
//! sources beyond "whoever delivered first".
//!
//! The combined stream ends once *all* sources have ended. The first read
//! error from any source is forwarded and ends the stream for the consumer;
//! the other reader tasks keep going until the stream is dropped or
//! [`CombinedStream::discard_remaining`] has run them to EOF.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};
use tokio::sync::mpsc;
use tracing::trace;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Boxed source accepted by [`combine_streams`].
pub type BoxedSource = Box<dyn AsyncRead + Send + Unpin>;

/// One piece of data read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Index of the source in the vector passed to [`combine_streams`].
    pub source: usize,
    pub data: Vec<u8>,
}

#[derive(Debug)]
pub struct CombinedStream {
    rx: mpsc::UnboundedReceiver<io::Result<Chunk>>,
    failed: bool,
    // Partially consumed chunk for the `AsyncRead` impl.
    pending: Vec<u8>,
    pending_pos: usize,
}

/// Start reading every source and merge their output.
pub fn combine_streams<R>(sources: Vec<R>) -> CombinedStream
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    for (index, source) in sources.into_iter().enumerate() {
        tokio::spawn(pump(index, source, tx.clone()));
    }

    CombinedStream {
        rx,
        failed: false,
        pending: Vec::new(),
        pending_pos: 0,
    }
}

async fn pump<R>(index: usize, mut source: R, tx: mpsc::UnboundedSender<io::Result<Chunk>>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = Chunk {
                    source: index,
                    data: buf[..n].to_vec(),
                };
                if tx.send(Ok(chunk)).is_err() {
                    // Consumer went away.
                    break;
                }
            }
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
    trace!(source = index, "combined source ended");
}

impl CombinedStream {
    /// Next chunk from any source, or `None` once every source has ended
    /// (or after an error was returned).
    pub async fn next_chunk(&mut self) -> Option<io::Result<Chunk>> {
        if self.failed {
            return None;
        }
        let item = self.rx.recv().await;
        self.observe(item)
    }

    fn poll_next_chunk(&mut self, cx: &mut Context<'_>) -> Poll<Option<io::Result<Chunk>>> {
        if self.failed {
            return Poll::Ready(None);
        }
        let item = ready!(self.rx.poll_recv(cx));
        Poll::Ready(self.observe(item))
    }

    /// Read every remaining source to its end, dropping the data.
    ///
    /// Lets writers on the other side of the sources finish instead of
    /// blocking once the consumer has stopped caring, e.g. after an error.
    pub async fn discard_remaining(&mut self) {
        self.failed = true;
        self.pending.clear();
        self.pending_pos = 0;
        while self.rx.recv().await.is_some() {}
    }

    fn observe(&mut self, item: Option<io::Result<Chunk>>) -> Option<io::Result<Chunk>> {
        if let Some(Err(_)) = &item {
            self.failed = true;
        }
        item
    }
}

impl AsyncRead for CombinedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        while this.pending_pos >= this.pending.len() {
            match ready!(this.poll_next_chunk(cx)) {
                Some(Ok(chunk)) => {
                    this.pending = chunk.data;
                    this.pending_pos = 0;
                }
                Some(Err(e)) => return Poll::Ready(Err(e)),
                None => return Poll::Ready(Ok(())),
            }
        }

        let available = &this.pending[this.pending_pos..];
        let n = available.len().min(buf.remaining());
        buf.put_slice(&available[..n]);
        this.pending_pos += n;
        Poll::Ready(Ok(()))
    }
}
