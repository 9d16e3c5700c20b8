// src/exec/sink.rs

//! Line sinks fed by the stream pumps.

use std::io::{self, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

/// Receives one decoded line at a time, without its line terminator.
///
/// Calls come from the pump task that owns the stream, in the order the child
/// wrote the lines. Implementations needing mutable state use interior
/// mutability; callers keep an `Arc` to read results after the run.
pub trait StreamConsumer: Send + Sync {
    fn consume_line(&self, line: &str);
}

impl<F> StreamConsumer for F
where
    F: Fn(&str) + Send + Sync,
{
    fn consume_line(&self, line: &str) {
        self(line)
    }
}

/// Drops every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullConsumer;

impl StreamConsumer for NullConsumer {
    fn consume_line(&self, _line: &str) {}
}

/// Accumulates lines in memory.
#[derive(Debug, Default)]
pub struct LineCollector {
    lines: Mutex<Vec<String>>,
}

impl LineCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// All lines, each followed by `\n`.
    pub fn output(&self) -> String {
        let lines = self
            .lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines.iter() {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the collected lines, leaving the collector empty.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(
            &mut *self
                .lines
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl StreamConsumer for LineCollector {
    fn consume_line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
    }
}

/// Forwards lines to `tracing`, tagged with a label (e.g. the program name)
/// and the stream they came from.
#[derive(Debug, Clone)]
pub struct TracingConsumer {
    label: String,
    stream: &'static str,
    verbose: bool,
}

impl TracingConsumer {
    /// Log at `debug`.
    pub fn new(label: impl Into<String>, stream: &'static str) -> Self {
        Self {
            label: label.into(),
            stream,
            verbose: false,
        }
    }

    /// Log at `info` instead of `debug`.
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

impl StreamConsumer for TracingConsumer {
    fn consume_line(&self, line: &str) {
        if self.verbose {
            info!(label = %self.label, stream = self.stream, "{}", line);
        } else {
            debug!(label = %self.label, stream = self.stream, "{}", line);
        }
    }
}

type BrokenPipeHook = Box<dyn Fn() + Send + Sync>;

/// Writes each line, followed by `\n`, to an [`io::Write`].
///
/// Never panics on a write error. The first error is logged and every later
/// line is dropped. If the error is a broken pipe (the reader went away, as
/// with `| head`), the [`on_broken_pipe`](Self::on_broken_pipe) hook runs
/// once.
pub struct WriterConsumer<W> {
    stream: &'static str,
    writer: Mutex<W>,
    failed: AtomicBool,
    broken_pipe: AtomicBool,
    on_broken_pipe: Option<BrokenPipeHook>,
}

impl WriterConsumer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new("stdout", io::stdout())
    }
}

impl WriterConsumer<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new("stderr", io::stderr())
    }
}

impl<W: Write + Send> WriterConsumer<W> {
    pub fn new(stream: &'static str, writer: W) -> Self {
        Self {
            stream,
            writer: Mutex::new(writer),
            failed: AtomicBool::new(false),
            broken_pipe: AtomicBool::new(false),
            on_broken_pipe: None,
        }
    }

    pub fn on_broken_pipe(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_broken_pipe = Some(Box::new(hook));
        self
    }

    /// True once a write failed; later lines are being dropped.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn is_broken_pipe(&self) -> bool {
        self.broken_pipe.load(Ordering::SeqCst)
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(writer, "{line}")
    }
}

impl<W: Write + Send> StreamConsumer for WriterConsumer<W> {
    fn consume_line(&self, line: &str) {
        if self.has_failed() {
            return;
        }
        let Err(e) = self.write_line(line) else {
            return;
        };
        if self.failed.swap(true, Ordering::SeqCst) {
            return;
        }

        if e.kind() == io::ErrorKind::BrokenPipe {
            debug!(stream = self.stream, "output closed by reader; dropping further lines");
            self.broken_pipe.store(true, Ordering::SeqCst);
            if let Some(hook) = &self.on_broken_pipe {
                hook();
            }
        } else {
            debug!(stream = self.stream, error = %e, "write failed; dropping further lines");
        }
    }
}
