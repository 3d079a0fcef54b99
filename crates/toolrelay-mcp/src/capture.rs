//! Output capture for tool server processes.
//!
//! Tool servers print whatever they like, whenever they like, with no framing.
//! Each stdout/stderr stream gets a reader task that appends raw chunks to an
//! [`OutputBuffer`] as soon as they arrive. Readers either take a snapshot of
//! everything retained so far or subscribe with an [`OutputCursor`] that
//! yields every chunk appended after the subscription, in emission order.
//!
//! The retained text is bounded: once the cap is exceeded the oldest chunks
//! are evicted, and the most recent output is always retained. Subscribers
//! get each chunk whole before eviction runs, so a reply larger than the cap
//! still reaches its reader intact.

use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Size of a single read from a child stream.
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Which standard stream a buffer captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

#[derive(Debug, Default)]
struct BufferState {
    chunks: VecDeque<String>,
    bytes: usize,
    closed: bool,
    subscribers: Vec<mpsc::UnboundedSender<String>>,
}

impl BufferState {
    fn evict(&mut self, cap: usize) {
        while self.bytes > cap && self.chunks.len() > 1 {
            if let Some(oldest) = self.chunks.pop_front() {
                self.bytes -= oldest.len();
            }
        }

        // A single chunk larger than the cap keeps only its tail
        if self.bytes > cap {
            if let Some(only) = self.chunks.front_mut() {
                let mut cut = self.bytes - cap;
                while !only.is_char_boundary(cut) {
                    cut += 1;
                }
                only.drain(..cut);
                self.bytes = only.len();
            }
        }
    }
}

/// Append-only, bounded text buffer for one child stream.
#[derive(Debug)]
pub struct OutputBuffer {
    kind: StreamKind,
    cap: usize,
    state: RwLock<BufferState>,
}

impl OutputBuffer {
    /// Create an empty buffer retaining at most `cap` bytes.
    pub fn new(kind: StreamKind, cap: usize) -> Self {
        Self {
            kind,
            cap: cap.max(1),
            state: RwLock::new(BufferState::default()),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, BufferState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, BufferState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub const fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Append a chunk of decoded output.
    pub fn append(&self, text: String) {
        if text.is_empty() {
            return;
        }

        let mut state = self.write_state();
        // Cursors that were dropped are forgotten here
        state.subscribers.retain(|tx| tx.send(text.clone()).is_ok());
        state.bytes += text.len();
        state.chunks.push_back(text);
        state.evict(self.cap);
    }

    /// Mark the stream as finished (EOF or read error).
    pub fn close(&self) {
        let mut state = self.write_state();
        state.closed = true;
        // Cursors drain what they were sent, then end
        state.subscribers.clear();
    }

    /// Everything currently retained, oldest first.
    pub fn snapshot(&self) -> String {
        let state = self.read_state();
        let mut text = String::with_capacity(state.bytes);
        for chunk in &state.chunks {
            text.push_str(chunk);
        }
        text
    }

    /// Bytes currently retained.
    pub fn len(&self) -> usize {
        self.read_state().bytes
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the producing stream has ended.
    pub fn is_closed(&self) -> bool {
        self.read_state().closed
    }

    /// Follow chunks appended from now on.
    pub fn subscribe(&self) -> OutputCursor {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.write_state();
        if !state.closed {
            state.subscribers.push(tx);
        }
        OutputCursor { rx }
    }
}

/// Subscription to the chunks of one [`OutputBuffer`].
///
/// Chunk boundaries are preserved, so a consumer sees the same sequence of
/// appends the producer made. Chunks queue up until read, so a cursor should
/// be dropped once its reader is done.
#[derive(Debug)]
pub struct OutputCursor {
    rx: mpsc::UnboundedReceiver<String>,
}

impl OutputCursor {
    /// Wait for the next batch of chunks.
    ///
    /// Returns `None` once the stream is closed and every chunk has been
    /// delivered.
    pub async fn next_chunks(&mut self) -> Option<Vec<String>> {
        let first = self.rx.recv().await?;
        let mut chunks = vec![first];
        while let Ok(more) = self.rx.try_recv() {
            chunks.push(more);
        }
        Some(chunks)
    }
}

/// Incremental UTF-8 decoder that carries split multi-byte sequences over to
/// the next read and replaces invalid bytes.
#[derive(Debug, Default)]
pub(crate) struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub(crate) fn decode(&mut self, input: &[u8]) -> String {
        self.pending.extend_from_slice(input);

        let mut out = String::new();
        let mut rest: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[bad..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes
                            rest = tail;
                            break;
                        }
                    }
                }
            }
        }

        let carry = rest.to_vec();
        self.pending = carry;
        out
    }

    pub(crate) fn finish(&mut self) -> String {
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }
}

/// Spawn a reader task appending everything from `stream` to `buffer`.
///
/// The buffer is closed when the stream hits EOF or a read error.
pub fn spawn_capture(
    mut stream: impl AsyncRead + Unpin + Send + 'static,
    buffer: Arc<OutputBuffer>,
    server_name: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let stream_type = buffer.kind().as_str();
        let mut decoder = Utf8Decoder::default();
        let mut raw = vec![0u8; READ_CHUNK_BYTES];

        loop {
            match stream.read(&mut raw).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    let text = decoder.decode(&raw[..n]);
                    if !text.is_empty() {
                        debug!(server_name = %server_name, %stream_type, "{}", text.trim_end());
                        buffer.append(text);
                    }
                }
                Err(e) => {
                    debug!(server_name = %server_name, %stream_type, error = %e, "output reader exiting due to read error");
                    break;
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            buffer.append(tail);
        }
        buffer.close();

        debug!(server_name = %server_name, %stream_type, "output reader task exiting");
    })
}
