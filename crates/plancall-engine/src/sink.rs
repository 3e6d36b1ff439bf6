//! Live output sinks.

use std::io::Write;

/// Which child stream a chunk came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Receives solver output as it arrives.
///
/// Chunks from one stream arrive in order; no ordering holds across streams.
pub trait OutputSink: Send {
    /// Called once per decoded chunk.
    fn write_chunk(&mut self, stream: StreamKind, text: &str);
}

impl OutputSink for String {
    fn write_chunk(&mut self, _stream: StreamKind, text: &str) {
        self.push_str(text);
    }
}

impl OutputSink for Vec<(StreamKind, String)> {
    fn write_chunk(&mut self, stream: StreamKind, text: &str) {
        self.push((stream, text.to_string()));
    }
}

/// Forwards solver output to this process's terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink {
    stdout_to_stderr: bool,
}

impl ConsoleSink {
    /// Solver stdout to stdout, solver stderr to stderr.
    pub fn new() -> Self {
        Self::default()
    }

    /// Both solver streams to stderr, leaving stdout free for results.
    pub fn stderr_only() -> Self {
        Self {
            stdout_to_stderr: true,
        }
    }
}

impl OutputSink for ConsoleSink {
    fn write_chunk(&mut self, stream: StreamKind, text: &str) {
        // Progress display only; a closed terminal must not fail the run.
        let _ = if stream == StreamKind::Stdout && !self.stdout_to_stderr {
            let mut out = std::io::stdout().lock();
            out.write_all(text.as_bytes()).and_then(|_| out.flush())
        } else {
            let mut err = std::io::stderr().lock();
            err.write_all(text.as_bytes()).and_then(|_| err.flush())
        };
    }
}
