use crate::{
    CoreError, CoreResult,
    ipc::{DEFAULT_MAX_FRAME_LEN, FrameCodec, Transport},
};

use std::{
    io::{BufReader, ErrorKind},
    panic::Location,
    path::PathBuf,
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
    sync::{Arc, Mutex, MutexGuard},
    thread::JoinHandle,
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Marker argument telling the worker to speak the framed protocol on its
/// standard streams instead of running interactively.
pub const PIPE_MODE_FLAG: &str = "--pipe-mode";

/// Decoded frames buffered between the reader thread and `send`.
const RESPONSE_QUEUE_DEPTH: usize = 4;

/// How to launch and talk to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Executable to launch.
    pub program: PathBuf,
    /// Arguments placed before [`PIPE_MODE_FLAG`].
    pub args: Vec<String>,
    /// Frame ceiling for requests and responses.
    pub max_frame_len: usize,
    /// Bound on each response wait. `None` waits indefinitely.
    pub response_timeout: Option<Duration>,
}

impl WorkerConfig {
    /// Config for `program` with default limits and no timeout.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            response_timeout: None,
        }
    }
}

/// Lifecycle of the worker bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// `start` has never succeeded.
    NotStarted,
    /// Process spawned and pipes open.
    Running,
    /// Stopped explicitly or after a channel failure; may be restarted.
    Stopped,
}

/// Slot holding the live child, shared with every [`KillHandle`].
type ChildSlot = Arc<Mutex<Option<Child>>>;

/// Kills the worker from another thread without waiting for `send`.
///
/// A `send` blocked on the response then fails with `Io` once the process
/// is gone, and the bridge settles to Stopped.
#[derive(Clone)]
pub struct KillHandle {
    child: ChildSlot,
}

impl KillHandle {
    /// Kills the attached process if it is still running. Returns whether a
    /// kill was issued. Reaping is left to `stop`.
    #[instrument(skip(self))]
    pub fn kill(&self) -> bool {
        let mut slot = lock_slot(&self.child);
        let Some(child) = slot.as_mut() else {
            return false;
        };
        if !matches!(child.try_wait(), Ok(None)) {
            return false;
        }
        match child.kill() {
            Ok(()) => {
                info!(pid = child.id(), "Worker killed");
                true
            }
            Err(e) => {
                warn!(error = ?e, "Failed to kill worker");
                false
            }
        }
    }
}

/// The parent's ends of the worker's pipes.
struct WorkerHandle {
    requests: ChildStdin,
    responses: Receiver<CoreResult<Vec<u8>>>,
    reader: Option<JoinHandle<()>>,
}

/// Long-lived worker subprocess exchanging frames over stdin/stdout.
pub struct WorkerProcess {
    config: WorkerConfig,
    codec: FrameCodec,
    state: WorkerState,
    child: ChildSlot,
    handle: Option<WorkerHandle>,
}

impl WorkerProcess {
    /// Creates a bridge in the NotStarted state. Nothing is spawned yet.
    pub fn new(config: WorkerConfig) -> Self {
        let codec = FrameCodec::new(config.max_frame_len);
        Self {
            config,
            codec,
            state: WorkerState::NotStarted,
            child: Arc::new(Mutex::new(None)),
            handle: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// OS process id while a process is attached.
    pub fn pid(&self) -> Option<u32> {
        lock_slot(&self.child).as_ref().map(Child::id)
    }

    /// Handle that can kill this bridge's process from any thread, including
    /// processes spawned by later restarts.
    pub fn kill_handle(&self) -> KillHandle {
        KillHandle {
            child: Arc::clone(&self.child),
        }
    }

    /// Spawns the worker with piped stdin/stdout.
    ///
    /// A no-op while Running. From Stopped this is an explicit restart.
    ///
    /// # Errors
    ///
    /// `SpawnError` if the executable cannot be launched; state is unchanged.
    #[track_caller]
    #[instrument(skip(self), fields(program = ?self.config.program))]
    pub fn start(&mut self) -> CoreResult<()> {
        if self.state == WorkerState::Running {
            debug!("Worker already running");
            return Ok(());
        }

        // std opens the parent's pipe ends close-on-exec / non-inheritable,
        // so only the child's ends cross into the worker.
        let mut child = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(PIPE_MODE_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| CoreError::SpawnError {
                program: self.config.program.clone(),
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let pipes = child.stdin.take().zip(child.stdout.take());
        let Some((requests, stdout)) = pipes else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CoreError::SpawnError {
                program: self.config.program.clone(),
                source: std::io::Error::new(ErrorKind::BrokenPipe, "worker pipes were not created"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let (tx, responses) = crossbeam_channel::bounded(RESPONSE_QUEUE_DEPTH);
        let reader = match spawn_reader(stdout, self.codec, tx) {
            Ok(reader) => reader,
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CoreError::SpawnError {
                    program: self.config.program.clone(),
                    source,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        info!(pid = child.id(), "Worker started");

        *lock_slot(&self.child) = Some(child);
        self.handle = Some(WorkerHandle {
            requests,
            responses,
            reader: Some(reader),
        });
        self.state = WorkerState::Running;

        Ok(())
    }

    /// Terminates the worker and closes the pipes. Idempotent.
    #[instrument(skip(self))]
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // Taken out so the slot lock is not held while reaping.
            let child = lock_slot(&self.child).take();
            terminate(child, handle);
            info!("Worker stopped");
        }
        if self.state == WorkerState::Running {
            self.state = WorkerState::Stopped;
        }
    }

    /// Polls the process exit status without blocking.
    ///
    /// Does not change state; a dead worker is settled by `stop` or by the
    /// next failing `send`.
    pub fn is_alive(&mut self) -> bool {
        match lock_slot(&self.child).as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Writes one request frame and waits for one response frame.
    ///
    /// # Errors
    ///
    /// - `NotRunning` outside Running (no I/O performed).
    /// - `ProtocolError` if the payload exceeds the frame ceiling (not fatal),
    ///   or the response is malformed or truncated.
    /// - `Io` on pipe failure.
    /// - `Timeout` if a response timeout is configured and expires.
    ///
    /// Channel failures terminate the worker and leave it Stopped.
    #[track_caller]
    #[instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub fn send(&mut self, payload: &[u8]) -> CoreResult<Vec<u8>> {
        let handle = match (self.state, self.handle.as_mut()) {
            (WorkerState::Running, Some(handle)) => handle,
            _ => {
                return Err(CoreError::NotRunning {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        self.codec.check_len(payload.len())?;

        let result = exchange(&self.codec, handle, payload, self.config.response_timeout);

        match &result {
            Ok(response) => debug!(response_len = response.len(), "Worker responded"),
            Err(e) if e.is_channel_fatal() => {
                warn!(error = ?e, "Worker channel failed, stopping worker");
                self.stop();
            }
            Err(_) => {}
        }

        result
    }
}

impl Transport for WorkerProcess {
    fn send(&mut self, payload: &[u8]) -> CoreResult<Vec<u8>> {
        WorkerProcess::send(self, payload)
    }
}

impl Drop for WorkerProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

#[track_caller]
fn exchange(
    codec: &FrameCodec,
    handle: &mut WorkerHandle,
    payload: &[u8],
    timeout: Option<Duration>,
) -> CoreResult<Vec<u8>> {
    codec.write_frame(&mut handle.requests, payload)?;

    let received = match timeout {
        Some(waited) => handle.responses.recv_timeout(waited).map_err(|e| match e {
            RecvTimeoutError::Timeout => CoreError::Timeout {
                waited,
                location: ErrorLocation::from(Location::caller()),
            },
            RecvTimeoutError::Disconnected => response_stream_closed(),
        }),
        None => handle
            .responses
            .recv()
            .map_err(|_| response_stream_closed()),
    };

    received?
}

#[track_caller]
fn response_stream_closed() -> CoreError {
    CoreError::Io {
        source: std::io::Error::new(ErrorKind::BrokenPipe, "worker response stream closed"),
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Decodes response frames off the worker's stdout until the first failure.
///
/// Frames are forwarded through a channel so `send` can bound its wait.
fn spawn_reader(
    stdout: ChildStdout,
    codec: FrameCodec,
    tx: Sender<CoreResult<Vec<u8>>>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("worker-responses".to_string())
        .spawn(move || {
            let mut reader = BufReader::new(stdout);
            loop {
                let frame = codec.decode(&mut reader);
                let failed = frame.is_err();
                if tx.send(frame).is_err() || failed {
                    break;
                }
            }
            debug!("Worker response reader stopped");
        })
}

fn lock_slot(slot: &ChildSlot) -> MutexGuard<'_, Option<Child>> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

fn terminate(child: Option<Child>, mut handle: WorkerHandle) {
    if let Some(mut child) = child {
        match child.try_wait() {
            Ok(Some(status)) => debug!(?status, "Worker already exited"),
            Ok(None) => {
                if let Err(e) = child.kill() {
                    warn!(error = ?e, "Failed to kill worker");
                }
                match child.wait() {
                    Ok(status) => debug!(?status, "Worker terminated"),
                    Err(e) => warn!(error = ?e, "Failed to reap worker"),
                }
            }
            Err(e) => warn!(error = ?e, "Failed to poll worker status"),
        }
    }

    // Closing our end of stdin and dropping the receiver unblocks the reader;
    // it exits on EOF once the process is gone. A grandchild still holding
    // stdout would keep it blocked, so it is detached rather than joined.
    drop(handle.requests);
    drop(handle.responses);
    if let Some(reader) = handle.reader.take().filter(|r| r.is_finished()) {
        let _ = reader.join();
    }
}
