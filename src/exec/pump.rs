// src/exec/pump.rs

//! Background tasks that move bytes between a child's pipes and the caller.
//!
//! A draining pump reads an output stream line by line and hands each line to
//! a [`StreamConsumer`]. A feeding pump copies a caller-supplied source into
//! the child's stdin and then closes it. Both report through the same
//! done-flag so the executor can join them uniformly.
//!
//! Pumps never fail outward: a read or write error ends the pump and is kept
//! in its final [`PumpState`].

use std::borrow::Cow;
use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::sink::StreamConsumer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PumpState {
    Running,
    /// Reached end of stream (or end of source, for a feeder).
    Finished,
    /// Stopped on an I/O error, treated as end of stream.
    Failed(String),
    /// Stopped by [`StreamPump::close`] before finishing.
    Closed,
}

impl PumpState {
    pub fn is_done(&self) -> bool {
        !matches!(self, PumpState::Running)
    }
}

/// Handle to a running pump task.
///
/// Dropping the handle closes the pump.
#[derive(Debug)]
pub struct StreamPump {
    name: &'static str,
    state: watch::Receiver<PumpState>,
    handle: Option<JoinHandle<()>>,
    closed: bool,
}

impl StreamPump {
    /// Start draining `reader`, delivering each line to `consumer`.
    ///
    /// Lines are split on `\n`; a trailing `\r` is stripped as well, and bytes
    /// that are not valid UTF-8 are replaced. A final line without a
    /// terminator is still delivered.
    pub fn spawn<R>(name: &'static str, reader: R, consumer: Arc<dyn StreamConsumer>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = watch::channel(PumpState::Running);

        let handle = tokio::spawn(async move {
            let state = match drain_lines(reader, consumer.as_ref()).await {
                Ok(lines) => {
                    debug!(pump = name, lines, "stream drained");
                    PumpState::Finished
                }
                Err(e) => {
                    debug!(pump = name, error = %e, "stream read failed; treating as end of stream");
                    PumpState::Failed(e.to_string())
                }
            };
            tx.send_replace(state);
        });

        Self {
            name,
            state: rx,
            handle: Some(handle),
            closed: false,
        }
    }

    /// Start copying `source` into `sink`, then shut `sink` down so the
    /// reader on the other end sees end of input.
    pub fn spawn_feeder<R, W>(name: &'static str, source: R, sink: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = watch::channel(PumpState::Running);

        let handle = tokio::spawn(async move {
            let state = match feed(source, sink).await {
                Ok(bytes) => {
                    debug!(pump = name, bytes, "input fed and closed");
                    PumpState::Finished
                }
                Err(e) => {
                    debug!(pump = name, error = %e, "feeding input failed; closing");
                    PumpState::Failed(e.to_string())
                }
            };
            tx.send_replace(state);
        });

        Self {
            name,
            state: rx,
            handle: Some(handle),
            closed: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> PumpState {
        let state = self.state.borrow().clone();
        if state.is_done() {
            return state;
        }
        if self.closed {
            return PumpState::Closed;
        }
        match &self.handle {
            // The task ended without reporting, i.e. the consumer panicked.
            Some(handle) if handle.is_finished() => {
                PumpState::Failed("pump task ended without reporting".to_string())
            }
            _ => state,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state().is_done()
    }

    /// Wait until the pump reports done and return its final state.
    pub async fn wait(&mut self) -> PumpState {
        if self.closed {
            return self.state();
        }
        match self.state.wait_for(PumpState::is_done).await {
            Ok(state) => state.clone(),
            Err(_) => PumpState::Failed("pump task ended without reporting".to_string()),
        }
    }

    /// Stop the pump if it is still running. This drops the stream it holds.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!(pump = self.name, "closing pump before end of stream");
                handle.abort();
                self.closed = true;
            }
        }
    }
}

impl Drop for StreamPump {
    fn drop(&mut self) {
        self.close();
    }
}

async fn drain_lines<R>(reader: R, consumer: &dyn StreamConsumer) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(256);
    let mut lines = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(lines);
        }
        consumer.consume_line(&decode_line(&buf));
        lines += 1;
    }
}

fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}

async fn feed<R, W>(mut source: R, mut sink: W) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let bytes = tokio::io::copy(&mut source, &mut sink).await?;
    sink.shutdown().await?;
    Ok(bytes)
}
