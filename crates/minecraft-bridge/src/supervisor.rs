//! Minecraft server child process supervision
//!
//! One child process per supervisor. Commands go in on stdin; replies are
//! picked out of the console output by the classifier. Three background
//! tasks live as long as the process: a reader for each output pipe and a
//! watcher waiting for the process to exit. All three are tied to a
//! per-process cancellation token, so the server outlives any single tool
//! call but not the supervisor's `close`.

use crate::classifier::{MarkerClassifier, ResponseClassifier, Verdict};
use crate::config::MinecraftConfig;
use crate::correlator::{CommandId, DEFAULT_RESPONSE_BUFFER, ResponseCorrelator, Subscription};
use crate::pipe::{PipeGuard, PipeStream, read_lines};
use crate::shutdown::{ShutdownPolicy, drain_tasks};
use craft_mcp_core::{CraftError, Result};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lifecycle phase of the child process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::NotStarted => "not started",
            Phase::Starting => "starting",
            Phase::Running => "running",
            Phase::ShuttingDown => "shutting down",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Launch and timing settings for [`ProcessSupervisor`]
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Working directory of the child
    pub working_dir: PathBuf,
    /// Executable to run
    pub executable: String,
    /// Whitespace separated arguments placed before the entry point
    pub memory_args: String,
    /// Jar passed with `-jar`
    pub entry_point: String,
    /// Flag appended unless already present
    pub default_flag: String,
    /// Console command that asks the server to stop
    pub shutdown_command: String,
    /// Overall wait for a command's response
    pub command_timeout: Duration,
    /// Quiet period that ends response collection
    pub collection_window: Duration,
    pub shutdown: ShutdownPolicy,
    /// Per-command response buffer, in lines
    pub response_buffer: usize,
    /// Run commands one at a time, write through response
    pub serialize_commands: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::from(&MinecraftConfig::default())
    }
}

impl From<&MinecraftConfig> for SupervisorConfig {
    fn from(config: &MinecraftConfig) -> Self {
        Self {
            working_dir: config.server_root_path.clone(),
            executable: config.java_path.clone(),
            memory_args: config.jvm_memory_args.clone(),
            entry_point: config.server_jar_file.clone(),
            default_flag: "nogui".to_string(),
            shutdown_command: config.shutdown_command.clone(),
            command_timeout: config.command_timeout(),
            collection_window: Duration::from_millis(500),
            shutdown: ShutdownPolicy::default(),
            response_buffer: DEFAULT_RESPONSE_BUFFER,
            serialize_commands: config.serialize_commands,
        }
    }
}

impl SupervisorConfig {
    /// Arguments passed to the executable
    pub fn launch_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self
            .memory_args
            .split_whitespace()
            .map(str::to_string)
            .collect();
        args.push("-jar".to_string());
        args.push(self.entry_point.clone());
        if !self.default_flag.is_empty() && !args.contains(&self.default_flag) {
            args.push(self.default_flag.clone());
        }
        args
    }
}

/// What happened to one console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Succeeded { command: String, message: String },
    /// Failure marker seen, or no success marker in the reply
    Failed { command: String, message: String },
    /// Written, but nothing came back in time
    TimedOut { command: String, after: Duration },
    /// Written, but the server went away before replying
    NoResponse { command: String },
    NotRunning,
    ConnectionLost,
    WriteFailed(String),
}

/// Text and error flag handed back to the tool caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub text: String,
    pub is_error: bool,
}

impl CommandOutcome {
    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            CommandOutcome::Succeeded { .. } | CommandOutcome::TimedOut { .. }
        )
    }

    pub fn into_result(self) -> CommandResult {
        let is_error = self.is_error();
        let text = match self {
            CommandOutcome::Succeeded { command, message } => {
                format!("Command '{}' executed: {}", command, message)
            }
            CommandOutcome::Failed { command, message } => {
                format!("Command '{}' failed: {}", command, message)
            }
            CommandOutcome::TimedOut { command, after } => format!(
                "Command '{}' sent, but response timed out after {} seconds",
                command,
                after.as_secs()
            ),
            CommandOutcome::NoResponse { command } => format!(
                "Command '{}' sent, but the server stopped before responding",
                command
            ),
            CommandOutcome::NotRunning => "Minecraft server is not running".to_string(),
            CommandOutcome::ConnectionLost => {
                "Failed to write command: Server connection lost (pipe closed)".to_string()
            }
            CommandOutcome::WriteFailed(e) => format!("Failed to write command: {}", e),
        };
        CommandResult { text, is_error }
    }
}

impl From<CommandOutcome> for CommandResult {
    fn from(outcome: CommandOutcome) -> Self {
        outcome.into_result()
    }
}

struct ProcessState {
    phase: Phase,
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
    stdin_guard: Arc<PipeGuard>,
    reader_guards: Vec<Arc<PipeGuard>>,
    cancel: CancellationToken,
    tasks: Option<JoinSet<()>>,
}

impl ProcessState {
    fn new() -> Self {
        Self {
            phase: Phase::NotStarted,
            pid: None,
            stdin: None,
            stdin_guard: Arc::new(PipeGuard::new(PipeStream::Stdin)),
            reader_guards: Vec::new(),
            cancel: CancellationToken::new(),
            tasks: None,
        }
    }
}

/// Owns the Minecraft server process and its pipes
pub struct ProcessSupervisor {
    config: SupervisorConfig,
    state: Arc<Mutex<ProcessState>>,
    correlator: Arc<ResponseCorrelator>,
    classifier: Arc<dyn ResponseClassifier>,
    command_gate: Mutex<()>,
}

impl ProcessSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self::with_classifier(config, Arc::new(MarkerClassifier::new()))
    }

    /// Supervisor judging replies with a custom classifier
    pub fn with_classifier(
        config: SupervisorConfig,
        classifier: Arc<dyn ResponseClassifier>,
    ) -> Self {
        let correlator = Arc::new(ResponseCorrelator::new(config.response_buffer));
        Self {
            config,
            state: Arc::new(Mutex::new(ProcessState::new())),
            correlator,
            classifier,
            command_gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    pub async fn is_running(&self) -> bool {
        self.phase().await == Phase::Running
    }

    /// OS process id while running
    pub async fn pid(&self) -> Option<u32> {
        self.state.lock().await.pid
    }

    /// Launch the server.
    ///
    /// The state lock is held from the phase check through the spawn, so at
    /// most one start is in flight.
    pub async fn start(&self) -> Result<()> {
        // Tasks left behind by an unexpected exit; the exit watcher needs the
        // state lock to finish, so drain them unlocked
        let leftover = {
            let mut state = self.state.lock().await;
            check_startable(state.phase)?;
            state.cancel.cancel();
            state.tasks.take()
        };
        if let Some(mut tasks) = leftover {
            drain_tasks(&mut tasks, self.config.shutdown.ceiling).await;
        }

        let mut state = self.state.lock().await;
        check_startable(state.phase)?;

        let dir = &self.config.working_dir;
        if !dir.is_dir() {
            return Err(CraftError::Config(format!(
                "server root {} is not a directory",
                dir.display()
            )));
        }

        let previous = state.phase;
        state.phase = Phase::Starting;
        match self.launch() {
            Ok(running) => {
                *state = running;
                Ok(())
            }
            Err(e) => {
                state.phase = previous;
                Err(e)
            }
        }
    }

    fn launch(&self) -> Result<ProcessState> {
        let args = self.config.launch_args();
        info!(
            executable = %self.config.executable,
            dir = %self.config.working_dir.display(),
            "Starting Minecraft server: {}",
            args.join(" ")
        );

        let mut child = Command::new(&self.config.executable)
            .args(&args)
            .current_dir(&self.config.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CraftError::Launch(format!("failed to start {}: {}", self.config.executable, e))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CraftError::Launch("stdin pipe unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CraftError::Launch("stdout pipe unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| CraftError::Launch("stderr pipe unavailable".to_string()))?;

        let pid = child.id();
        let cancel = CancellationToken::new();
        let stdout_guard = Arc::new(PipeGuard::new(PipeStream::Stdout));
        let stderr_guard = Arc::new(PipeGuard::new(PipeStream::Stderr));
        let stdin_guard = Arc::new(PipeGuard::new(PipeStream::Stdin));

        let mut tasks = JoinSet::new();
        tasks.spawn(drain_pipe(
            PipeStream::Stdout,
            read_lines(
                PipeStream::Stdout,
                stdout,
                stdout_guard.clone(),
                Some(self.correlator.clone()),
                cancel.clone(),
            ),
        ));
        tasks.spawn(drain_pipe(
            PipeStream::Stderr,
            read_lines(
                PipeStream::Stderr,
                stderr,
                stderr_guard.clone(),
                None,
                cancel.clone(),
            ),
        ));
        tasks.spawn(watch_exit(
            child,
            pid,
            self.state.clone(),
            self.correlator.clone(),
            cancel.clone(),
        ));

        info!(?pid, "Minecraft server started");

        Ok(ProcessState {
            phase: Phase::Running,
            pid,
            stdin: Some(stdin),
            stdin_guard,
            reader_guards: vec![stdout_guard, stderr_guard],
            cancel,
            tasks: Some(tasks),
        })
    }

    /// Write one console command and wait for its reply.
    ///
    /// Never fails: every problem is reported through the outcome.
    pub async fn write_command(&self, command: &str) -> CommandOutcome {
        // One console line per command, one subscription per line
        if command.contains(['\n', '\r']) {
            warn!(command, "Refusing multi-line command");
            return CommandOutcome::WriteFailed("command must be a single line".to_string());
        }

        let _gate = if self.config.serialize_commands {
            Some(self.command_gate.lock().await)
        } else {
            None
        };

        let subscription = {
            let mut state = self.state.lock().await;
            if state.phase != Phase::Running || !state.stdin_guard.is_open() {
                return CommandOutcome::NotRunning;
            }
            let Some(stdin) = state.stdin.as_mut() else {
                return CommandOutcome::NotRunning;
            };

            // Subscribe first so the reply cannot slip past
            let subscription = self.correlator.register(CommandId::generate());
            debug!(command, id = %subscription.id(), "Writing command");

            if let Err(e) = write_line(stdin, command).await {
                if e.kind() == io::ErrorKind::BrokenPipe {
                    warn!(command, "Server stdin closed, marking server stopped");
                    state.phase = Phase::Stopped;
                    let stdin = state.stdin.take();
                    let guard = state.stdin_guard.clone();
                    close_stdin(stdin, &guard).await;
                    return CommandOutcome::ConnectionLost;
                }
                error!(command, "Failed to write command: {}", e);
                return CommandOutcome::WriteFailed(e.to_string());
            }
            subscription
        };

        info!(command, "Command sent to Minecraft server");
        self.await_response(command, subscription).await
    }

    async fn await_response(&self, command: &str, mut subscription: Subscription) -> CommandOutcome {
        let deadline = Instant::now() + self.config.command_timeout;
        let window = self.config.collection_window;
        let mut lines = Vec::new();
        let mut settle: Option<Instant> = None;
        let mut conclusive = false;
        let mut closed = false;

        loop {
            let wake = settle.map_or(deadline, |s| s.min(deadline));
            tokio::select! {
                line = subscription.recv() => match line {
                    Some(line) => {
                        // Stop extending the window once the reply is known
                        if !conclusive {
                            settle = Some(Instant::now() + window);
                            conclusive = self.classifier.is_conclusive(&line);
                        }
                        lines.push(line);
                    }
                    None => {
                        closed = true;
                        break;
                    }
                },
                _ = sleep_until(wake) => break,
            }
        }
        drop(subscription);

        if lines.is_empty() {
            if closed {
                warn!(command, "Server stopped before responding");
                return CommandOutcome::NoResponse {
                    command: command.to_string(),
                };
            }
            warn!(command, "Timeout waiting for command response");
            return CommandOutcome::TimedOut {
                command: command.to_string(),
                after: self.config.command_timeout,
            };
        }

        let text = lines.join("\n");
        let message = self.classifier.extract_message(&text);
        match self.classifier.classify(&text) {
            Verdict::Succeeded => CommandOutcome::Succeeded {
                command: command.to_string(),
                message,
            },
            verdict => {
                debug!(command, ?verdict, "Command not confirmed");
                CommandOutcome::Failed {
                    command: command.to_string(),
                    message,
                }
            }
        }
    }

    /// Stop the server: shutdown command, grace period, close stdin,
    /// cancel, then wait for the background tasks up to the ceiling.
    ///
    /// Safe to call repeatedly. Only the first call after a start sends the
    /// shutdown command.
    pub async fn close(&self) -> Result<()> {
        let policy = self.config.shutdown;
        let (stdin, stdin_guard, reader_guards, cancel, tasks, pid) = {
            let mut state = self.state.lock().await;
            if state.phase != Phase::Running {
                state.cancel.cancel();
                let tasks = state.tasks.take();
                drop(state);
                if let Some(mut tasks) = tasks {
                    drain_tasks(&mut tasks, policy.ceiling).await;
                }
                return Ok(());
            }
            state.phase = Phase::ShuttingDown;
            (
                state.stdin.take(),
                state.stdin_guard.clone(),
                state.reader_guards.clone(),
                state.cancel.clone(),
                state.tasks.take(),
                state.pid,
            )
        };

        info!(?pid, "Shutting down Minecraft server");

        let mut stdin = stdin;
        if !self.config.shutdown_command.is_empty() {
            if let Some(writer) = stdin.as_mut() {
                if let Err(e) = write_line(writer, &self.config.shutdown_command).await {
                    warn!(?pid, "Failed to send shutdown command: {}", e);
                }
                tokio::time::sleep(policy.grace).await;
            }
        }

        close_stdin(stdin, &stdin_guard).await;
        cancel.cancel();
        self.correlator.close_all();

        let clean = match tasks {
            Some(mut tasks) => drain_tasks(&mut tasks, policy.ceiling).await,
            None => true,
        };
        if !clean {
            warn!(?pid, "Forced close of Minecraft server tasks");
        }
        for guard in &reader_guards {
            if guard.begin_close() {
                debug!(pipe = %guard.stream(), "Releasing pipe left open by its reader");
                guard.finish_close();
            }
        }

        let mut state = self.state.lock().await;
        state.phase = Phase::Stopped;
        state.pid = None;
        state.stdin = None;
        info!(?pid, "Minecraft server stopped");
        Ok(())
    }
}

fn check_startable(phase: Phase) -> Result<()> {
    match phase {
        Phase::Starting | Phase::Running => Err(CraftError::AlreadyRunning),
        Phase::ShuttingDown => Err(CraftError::Launch(
            "server is still shutting down".to_string(),
        )),
        Phase::NotStarted | Phase::Stopped => Ok(()),
    }
}

async fn write_line(stdin: &mut ChildStdin, line: &str) -> io::Result<()> {
    stdin.write_all(line.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

async fn close_stdin(stdin: Option<ChildStdin>, guard: &PipeGuard) {
    if !guard.begin_close() {
        return;
    }
    if let Some(mut stdin) = stdin {
        if let Err(e) = stdin.shutdown().await {
            debug!(pipe = %guard.stream(), "Error closing pipe: {}", e);
        }
    }
    guard.finish_close();
}

async fn drain_pipe(stream: PipeStream, reader: impl Future<Output = usize>) {
    let lines = reader.await;
    debug!(pipe = %stream, lines, "Pipe reader finished");
}

/// Wait for the child to exit, killing it if the token is cancelled first
async fn watch_exit(
    mut child: Child,
    pid: Option<u32>,
    state: Arc<Mutex<ProcessState>>,
    correlator: Arc<ResponseCorrelator>,
    cancel: CancellationToken,
) {
    let exited = tokio::select! {
        status = child.wait() => Some(status),
        _ = cancel.cancelled() => None,
    };
    let status = match exited {
        Some(status) => status,
        None => {
            if let Err(e) = child.start_kill() {
                debug!(?pid, "Kill after cancellation failed: {}", e);
            }
            child.wait().await
        }
    };

    let mut state = state.lock().await;
    let expected = state.phase == Phase::ShuttingDown || cancel.is_cancelled();
    match &status {
        Ok(status) if expected => info!(?pid, %status, "Minecraft server exited"),
        Ok(status) => error!(?pid, %status, "Minecraft server exited unexpectedly"),
        Err(e) => error!(?pid, "Failed to wait for Minecraft server: {}", e),
    }
    if expected {
        return;
    }

    state.phase = Phase::Stopped;
    state.pid = None;
    let stdin = state.stdin.take();
    let guard = state.stdin_guard.clone();
    close_stdin(stdin, &guard).await;
    drop(state);
    correlator.close_all();
}
