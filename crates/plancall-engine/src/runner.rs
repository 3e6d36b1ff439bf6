//! Deadline-bounded subprocess runner.
//!
//! The child's stdout and stderr are drained by two independent tasks that
//! feed one channel. The caller side waits on that channel with a bounded
//! poll and checks the deadline after every poll, so a silent hang is caught
//! as reliably as a flood of output.

use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::sink::{OutputSink, StreamKind};

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Program path plus arguments. Never interpreted by a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverCommand {
    argv: Vec<String>,
}

impl SolverCommand {
    /// Build a command from a non-empty argument vector.
    pub fn new<I, S>(argv: I) -> Result<Self, RunnerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.first().map_or(true, |p| p.is_empty()) {
            return Err(RunnerError::EmptyCommand);
        }
        Ok(Self { argv })
    }

    /// Executable path.
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments after the program.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    /// Full argument vector.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for SolverCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

/// What happened to one child process.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// The deadline fired and the child was killed.
    pub timed_out: bool,

    /// Everything read from stdout.
    pub stdout: String,

    /// Everything read from stderr.
    pub stderr: String,

    /// Exit code; `None` if killed by a signal or never reaped.
    pub exit_code: Option<i32>,

    /// OS process id, if the child was still running when spawned.
    pub pid: Option<u32>,

    /// Wall-clock time since launch.
    pub elapsed: Duration,
}

impl ExecutionResult {
    /// True if the child exited normally with code 0.
    pub fn exited_cleanly(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A piece of output read from one stream.
struct Chunk {
    stream: StreamKind,
    bytes: Vec<u8>,
}

/// Accumulated text for one stream.
#[derive(Default)]
struct StreamBuffer {
    text: String,
    pending: Vec<u8>,
}

impl StreamBuffer {
    /// Decode as much of `bytes` as possible and return the new text.
    ///
    /// Invalid bytes become U+FFFD. An incomplete UTF-8 sequence at the end
    /// or a trailing `\r` is held back until the next chunk so characters
    /// and `\r\n` survive chunk boundaries.
    fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut ready = 0;
        loop {
            match std::str::from_utf8(&self.pending[ready..]) {
                Ok(_) => {
                    ready = self.pending.len();
                    break;
                }
                Err(e) => match e.error_len() {
                    Some(invalid) => ready += e.valid_up_to() + invalid,
                    None => {
                        ready += e.valid_up_to();
                        break;
                    }
                },
            }
        }
        if ready > 0 && self.pending[ready - 1] == b'\r' {
            ready -= 1;
        }
        let rest = self.pending.split_off(ready);
        let decoded = std::mem::replace(&mut self.pending, rest);
        self.append(&decoded)
    }

    /// Decode whatever is still held back.
    fn flush(&mut self) -> String {
        let decoded = std::mem::take(&mut self.pending);
        self.append(&decoded)
    }

    fn append(&mut self, bytes: &[u8]) -> String {
        if bytes.is_empty() {
            return String::new();
        }
        let text = String::from_utf8_lossy(bytes).replace("\r\n", "\n");
        self.text.push_str(&text);
        text
    }
}

#[derive(Default)]
struct Capture {
    stdout: StreamBuffer,
    stderr: StreamBuffer,
}

impl Capture {
    fn buffer(&mut self, stream: StreamKind) -> &mut StreamBuffer {
        match stream {
            StreamKind::Stdout => &mut self.stdout,
            StreamKind::Stderr => &mut self.stderr,
        }
    }

    fn push(&mut self, chunk: Chunk, sink: &mut Option<&mut dyn OutputSink>) {
        let text = self.buffer(chunk.stream).push(&chunk.bytes);
        forward(sink, chunk.stream, &text);
    }

    fn finish(mut self, sink: &mut Option<&mut dyn OutputSink>) -> (String, String) {
        for stream in [StreamKind::Stdout, StreamKind::Stderr] {
            let text = self.buffer(stream).flush();
            forward(sink, stream, &text);
        }
        (self.stdout.text, self.stderr.text)
    }
}

fn forward(sink: &mut Option<&mut dyn OutputSink>, stream: StreamKind, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(sink) = sink.as_mut() {
        sink.write_chunk(stream, text);
    }
}

/// Read a stream to EOF, forwarding raw chunks.
async fn drain<R>(mut reader: R, stream: StreamKind, tx: mpsc::Sender<Chunk>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = Chunk {
                    stream,
                    bytes: buf[..n].to_vec(),
                };
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                warn!(?stream, error = %err, "stream read failed; abandoning stream");
                break;
            }
        }
    }
}

/// Runs solver commands under an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    config: RunnerConfig,
}

impl ProcessRunner {
    /// Create a runner with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner with custom configuration.
    pub fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Get the runner configuration.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run `command` to completion or until `timeout` elapses.
    ///
    /// Output is forwarded to `sink` as it arrives. On timeout the child is
    /// killed and whatever was captured so far is returned. Failing to start
    /// the process is an error; timing out is not.
    pub async fn run(
        &self,
        command: &SolverCommand,
        timeout: Option<Duration>,
        mut sink: Option<&mut dyn OutputSink>,
    ) -> Result<ExecutionResult, RunnerError> {
        if timeout.is_some_and(|t| t.is_zero()) {
            return Err(RunnerError::InvalidTimeout);
        }

        let program = command.program().to_string();
        let started = Instant::now();
        let mut cmd = Command::new(&program);
        cmd.args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // The child leads its own group so a timeout reaches its descendants.
        #[cfg(unix)]
        cmd.process_group(0);
        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            program: program.clone(),
            source,
        })?;
        let pid = child.id();
        debug!(%program, ?pid, ?timeout, "spawned solver process");

        let (tx, mut rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let mut drains: Vec<JoinHandle<()>> = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            drains.push(tokio::spawn(drain(stdout, StreamKind::Stdout, tx.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            drains.push(tokio::spawn(drain(stderr, StreamKind::Stderr, tx.clone())));
        }
        drop(tx);

        let poll_interval = self.config.poll_interval();
        let mut capture = Capture::default();
        let mut timed_out = false;

        loop {
            match time::timeout(poll_interval, rx.recv()).await {
                Ok(Some(chunk)) => capture.push(chunk, &mut sink),
                // Every drain has hit EOF.
                Ok(None) => break,
                Err(_) => {}
            }
            if deadline_passed(started, timeout) {
                timed_out = true;
                break;
            }
        }

        let status = if timed_out {
            warn!(%program, ?pid, elapsed_ms = elapsed_ms(started), "solver exceeded deadline; killing");
            while let Ok(chunk) = rx.try_recv() {
                capture.push(chunk, &mut sink);
            }
            for handle in &drains {
                handle.abort();
            }
            self.terminate(&mut child, pid, &program).await?
        } else {
            match remaining(started, timeout) {
                None => Some(wait(&mut child, &program).await?),
                Some(left) => match time::timeout(left, wait(&mut child, &program)).await {
                    Ok(status) => Some(status?),
                    Err(_) => {
                        warn!(%program, ?pid, "solver closed its output but kept running past the deadline");
                        timed_out = true;
                        self.terminate(&mut child, pid, &program).await?
                    }
                },
            }
        };

        let (stdout, stderr) = capture.finish(&mut sink);
        let exit_code = status.and_then(|s| s.code());
        let elapsed = started.elapsed();
        info!(
            %program,
            ?pid,
            timed_out,
            ?exit_code,
            elapsed_ms = elapsed.as_millis() as u64,
            "solver process finished"
        );

        Ok(ExecutionResult {
            timed_out,
            stdout,
            stderr,
            exit_code,
            pid,
            elapsed,
        })
    }

    /// Kill the child, retrying a bounded number of times.
    ///
    /// Returns the exit status if the child was reaped.
    async fn terminate(
        &self,
        child: &mut Child,
        pid: Option<u32>,
        program: &str,
    ) -> Result<Option<ExitStatus>, RunnerError> {
        let attempts = self.config.kill_attempts.max(1);
        for attempt in 1..=attempts {
            kill_process_group(pid);
            if let Err(err) = child.start_kill() {
                debug!(%program, error = %err, "kill failed; process already gone");
            }
            match time::timeout(self.config.kill_wait(), wait(child, program)).await {
                Ok(status) => return status.map(Some),
                Err(_) => warn!(%program, attempt, "process still alive after kill"),
            }
        }
        error!(%program, attempts, "giving up on killing solver process");
        Ok(None)
    }
}

/// SIGKILL every process in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pgid) = pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
        return;
    };
    // SAFETY: kill(2) takes plain integers and touches no memory of ours.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

async fn wait(child: &mut Child, program: &str) -> Result<ExitStatus, RunnerError> {
    child.wait().await.map_err(|source| RunnerError::Io {
        program: program.to_string(),
        source,
    })
}

fn deadline_passed(started: Instant, timeout: Option<Duration>) -> bool {
    timeout.is_some_and(|t| started.elapsed() >= t)
}

fn remaining(started: Instant, timeout: Option<Duration>) -> Option<Duration> {
    timeout.map(|t| t.saturating_sub(started.elapsed()))
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> ProcessRunner {
        ProcessRunner::with_config(RunnerConfig {
            poll_interval_ms: 50,
            kill_wait_ms: 500,
            ..RunnerConfig::default()
        })
    }

    fn sh(script: &str) -> SolverCommand {
        SolverCommand::new(["sh", "-c", script]).unwrap()
    }

    #[cfg(unix)]
    fn is_alive(pid: u32) -> bool {
        std::process::Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// True while `pid` exists and is not a zombie awaiting its reaper.
    #[cfg(target_os = "linux")]
    fn is_running(pid: u32) -> bool {
        std::fs::read_to_string(format!("/proc/{pid}/stat"))
            .ok()
            .and_then(|stat| {
                let state = stat.rsplit(')').next()?.split_whitespace().next()?.to_string();
                Some(state != "Z" && state != "X")
            })
            .unwrap_or(false)
    }

    #[test]
    fn test_command_rejects_empty() {
        assert!(matches!(
            SolverCommand::new(Vec::<String>::new()),
            Err(RunnerError::EmptyCommand)
        ));
        assert!(matches!(SolverCommand::new([""]), Err(RunnerError::EmptyCommand)));
    }

    #[test]
    fn test_command_parts() {
        let command = SolverCommand::new(["ff", "-o", "domain.pddl"]).unwrap();
        assert_eq!(command.program(), "ff");
        assert_eq!(command.args(), ["-o", "domain.pddl"]);
        assert_eq!(command.to_string(), "ff -o domain.pddl");
    }

    #[test]
    fn test_stream_buffer_holds_split_utf8() {
        let mut buffer = StreamBuffer::default();
        let bytes = "é".as_bytes();
        assert_eq!(buffer.push(&bytes[..1]), "");
        assert_eq!(buffer.push(&bytes[1..]), "é");
        assert_eq!(buffer.text, "é");
    }

    #[test]
    fn test_stream_buffer_normalises_split_crlf() {
        let mut buffer = StreamBuffer::default();
        assert_eq!(buffer.push(b"line\r"), "line");
        assert_eq!(buffer.push(b"\nnext"), "\nnext");
        assert_eq!(buffer.flush(), "");
        assert_eq!(buffer.text, "line\nnext");
    }

    #[test]
    fn test_stream_buffer_invalid_byte_before_split_char() {
        let mut buffer = StreamBuffer::default();
        assert_eq!(buffer.push(&[0xFF, b'a', 0xC3]), "\u{FFFD}a");
        assert_eq!(buffer.push(&[0xA9]), "é");
        assert_eq!(buffer.flush(), "");
        assert_eq!(buffer.text, "\u{FFFD}aé");
    }

    #[test]
    fn test_stream_buffer_invalid_bytes_mid_chunk() {
        let mut buffer = StreamBuffer::default();
        assert_eq!(buffer.push(b"ok\xFE\xFFdone\r"), "ok\u{FFFD}\u{FFFD}done");
        assert_eq!(buffer.push(b"\n"), "\n");
        assert_eq!(buffer.text, "ok\u{FFFD}\u{FFFD}done\n");
    }

    #[test]
    fn test_stream_buffer_flushes_truncated_char() {
        let mut buffer = StreamBuffer::default();
        assert_eq!(buffer.push(&[b'x', 0xE2, 0x82]), "x");
        assert_eq!(buffer.flush(), "\u{FFFD}");
    }

    #[test]
    fn test_stream_buffer_flushes_trailing_cr() {
        let mut buffer = StreamBuffer::default();
        buffer.push(b"end\r");
        assert_eq!(buffer.flush(), "\r");
        assert_eq!(buffer.text, "end\r");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_an_error() {
        let command = SolverCommand::new(["/nonexistent/plancall-solver"]).unwrap();
        let result = runner().run(&command, None, None).await;
        assert!(matches!(result, Err(RunnerError::Spawn { .. })));
    }

    #[tokio::test]
    async fn test_zero_timeout_rejected() {
        let result = runner()
            .run(&sh("true"), Some(Duration::ZERO), None)
            .await;
        assert!(matches!(result, Err(RunnerError::InvalidTimeout)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_both_streams_and_exit_code() {
        let result = runner()
            .run(&sh("echo out; echo err >&2; exit 3"), Some(Duration::from_secs(10)), None)
            .await
            .unwrap();

        assert!(!result.timed_out);
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
        assert_eq!(result.exit_code, Some(3));
        assert!(!result.exited_cleanly());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_normalises_crlf() {
        let result = runner()
            .run(&sh("printf 'a\\r\\nb\\r\\n'"), None, None)
            .await
            .unwrap();
        assert_eq!(result.stdout, "a\nb\n");
        assert!(result.exited_cleanly());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invalid_utf8_replaced_without_losing_text() {
        let mut live = String::new();
        let result = runner()
            .run(&sh("printf 'bad \\377 byte \\303'; sleep 0.1; printf '\\251\\n'"), None, Some(&mut live))
            .await
            .unwrap();
        assert_eq!(result.stdout, "bad \u{FFFD} byte é\n");
        assert_eq!(live, result.stdout);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sink_receives_each_stream_in_order() {
        let mut chunks: Vec<(StreamKind, String)> = Vec::new();
        let result = runner()
            .run(
                &sh("for i in 1 2 3; do echo o$i; echo e$i >&2; sleep 0.05; done"),
                Some(Duration::from_secs(10)),
                Some(&mut chunks),
            )
            .await
            .unwrap();

        let streamed = |kind: StreamKind| -> String {
            chunks
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, t)| t.as_str())
                .collect()
        };
        assert_eq!(streamed(StreamKind::Stdout), "o1\no2\no3\n");
        assert_eq!(streamed(StreamKind::Stderr), "e1\ne2\ne3\n");
        assert_eq!(result.stdout, "o1\no2\no3\n");
        assert_eq!(result.stderr, "e1\ne2\ne3\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_hang_times_out() {
        let result = runner()
            .run(&sh("exec sleep 30"), Some(Duration::from_millis(300)), None)
            .await
            .unwrap();

        assert!(result.timed_out);
        assert_eq!(result.exit_code, None);
        assert!(result.elapsed < Duration::from_secs(10));
        assert!(!is_alive(result.pid.unwrap()));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_grandchildren() {
        let result = runner()
            .run(
                &sh("sleep 30 & echo $!; wait"),
                Some(Duration::from_millis(500)),
                None,
            )
            .await
            .unwrap();
        assert!(result.timed_out);

        let grandchild: u32 = result.stdout.trim().parse().unwrap();
        let mut running = is_running(grandchild);
        for _ in 0..20 {
            if !running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            running = is_running(grandchild);
        }
        assert!(!running);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child_ignoring_term() {
        let result = runner()
            .run(
                &sh("trap '' TERM; echo started; exec sleep 30"),
                Some(Duration::from_millis(300)),
                None,
            )
            .await
            .unwrap();

        assert!(result.timed_out);
        assert_eq!(result.stdout, "started\n");
        assert!(!is_alive(result.pid.unwrap()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_flooded_stdout_does_not_block_slow_stderr() {
        let script = "(for i in 1 2 3; do echo slow$i >&2; sleep 0.1; done) & \
                      head -c 300000 /dev/zero | tr '\\000' x; wait";
        let result = runner()
            .run(&sh(script), Some(Duration::from_secs(20)), None)
            .await
            .unwrap();

        assert!(!result.timed_out);
        assert_eq!(result.stdout.len(), 300_000);
        assert_eq!(result.stderr, "slow1\nslow2\nslow3\n");
        assert!(result.exited_cleanly());
    }
}
