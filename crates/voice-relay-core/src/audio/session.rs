use crate::{
    CoreError, CoreResult,
    audio::{AudioDevice, CaptureConfig, DeviceHandle, StopHandle},
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::JoinHandle,
    time::Duration,
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Lifecycle of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, device not yet engaged.
    Idle,
    /// Samples are being appended.
    Recording,
    /// Finished; the buffer has been handed out.
    Stopped,
}

/// Owns the input device and admits at most one recording session at a time.
pub struct Recorder {
    device: Arc<dyn AudioDevice>,
    recording: Arc<AtomicBool>,
}

impl Recorder {
    /// Wraps an input device capability.
    pub fn new(device: Arc<dyn AudioDevice>) -> Self {
        Self {
            device,
            recording: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates an Idle session bound to this recorder.
    pub fn session(&self, config: CaptureConfig) -> CaptureSession {
        CaptureSession {
            device: Arc::clone(&self.device),
            recording: Arc::clone(&self.recording),
            config,
            state: SessionState::Idle,
            stop: StopHandle::new(),
            capture: None,
            guard: None,
        }
    }

    /// Creates a session and starts recording in the background.
    ///
    /// # Errors
    ///
    /// `AlreadyRecording` if another session holds the device, or
    /// `DeviceUnavailable` if the device cannot be opened.
    #[track_caller]
    pub fn start(&self, config: CaptureConfig) -> CoreResult<CaptureSession> {
        let mut session = self.session(config);
        session.start()?;
        Ok(session)
    }

    /// Whether any session from this recorder is currently recording.
    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Acquire)
    }
}

/// Releases the recorder's single recording slot on drop.
struct RecordingGuard {
    recording: Arc<AtomicBool>,
}

impl RecordingGuard {
    #[track_caller]
    fn claim(recording: &Arc<AtomicBool>) -> CoreResult<Self> {
        recording
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CoreError::AlreadyRecording {
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            recording: Arc::clone(recording),
        })
    }
}

impl Drop for RecordingGuard {
    fn drop(&mut self) {
        self.recording.store(false, Ordering::Release);
    }
}

/// One bounded capture attempt.
///
/// Samples are only exposed once the session reaches
/// [`SessionState::Stopped`]. Either drive it with [`run_for`](Self::run_for)
/// on the calling thread, or [`start`](Self::start) it in the background and
/// later [`stop_now`](Self::stop_now) or [`wait`](Self::wait).
pub struct CaptureSession {
    device: Arc<dyn AudioDevice>,
    recording: Arc<AtomicBool>,
    config: CaptureConfig,
    state: SessionState,
    stop: StopHandle,
    capture: Option<JoinHandle<CoreResult<Vec<i16>>>>,
    guard: Option<RecordingGuard>,
}

impl CaptureSession {
    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Format this session records in.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Signal that ends this session's capture early from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Idle -> Recording, capturing up to `max_duration` on a background thread.
    ///
    /// # Errors
    ///
    /// `AlreadyRecording` if this or another session is recording,
    /// `SessionFinished` if this session already stopped, `DeviceUnavailable`
    /// if the device cannot be opened (the session stays Idle).
    #[track_caller]
    #[instrument(skip(self))]
    pub fn start(&mut self) -> CoreResult<()> {
        let (guard, mut handle) = self.engage()?;
        let max_samples = self.config.samples_for(self.config.max_duration);
        let stop = self.stop.clone();

        let capture = std::thread::Builder::new()
            .name("capture-session".to_string())
            .spawn(move || handle.fill(max_samples, &stop))?;

        self.capture = Some(capture);
        self.guard = Some(guard);
        self.state = SessionState::Recording;

        info!(max_samples, "Capture session started");

        Ok(())
    }

    /// Ends the recording and returns the accumulated samples.
    ///
    /// Calling it again after the session stopped returns an empty buffer.
    #[instrument(skip(self))]
    pub fn stop_now(&mut self) -> CoreResult<Vec<i16>> {
        if self.state == SessionState::Recording {
            self.stop.stop();
        }
        self.finish()
    }

    /// Blocks until the background capture reaches `max_duration`.
    #[instrument(skip(self))]
    pub fn wait(&mut self) -> CoreResult<Vec<i16>> {
        self.finish()
    }

    /// Records on the calling thread for `min(duration, max_duration)`.
    ///
    /// A zero duration returns an empty buffer without touching the device.
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start); on `DeviceUnavailable` the session
    /// stays Idle and may be retried.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn run_for(&mut self, duration: Duration) -> CoreResult<Vec<i16>> {
        if self.state == SessionState::Idle && duration.is_zero() {
            self.state = SessionState::Stopped;
            debug!("Zero-length capture requested");
            return Ok(Vec::new());
        }

        let (guard, mut handle) = self.engage()?;
        let max_samples = self.config.samples_for(duration);
        self.state = SessionState::Recording;

        info!(max_samples, "Capture session running");

        let result = handle.fill(max_samples, &self.stop);

        drop(handle);
        drop(guard);
        self.state = SessionState::Stopped;

        let samples = result?;
        info!(sample_count = samples.len(), "Capture session stopped");

        Ok(samples)
    }

    /// Claims the recording slot and opens the device, leaving state untouched
    /// on failure.
    #[track_caller]
    fn engage(&mut self) -> CoreResult<(RecordingGuard, Box<dyn DeviceHandle>)> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Recording => {
                return Err(CoreError::AlreadyRecording {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            SessionState::Stopped => {
                return Err(CoreError::SessionFinished {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        self.config.validate()?;
        let guard = RecordingGuard::claim(&self.recording)?;
        let handle = self.device.acquire(&self.config)?;

        Ok((guard, handle))
    }

    fn finish(&mut self) -> CoreResult<Vec<i16>> {
        if self.state != SessionState::Recording {
            debug!(state = ?self.state, "No recording in progress");
            return Ok(Vec::new());
        }

        let result = match self.capture.take() {
            Some(capture) => capture.join().unwrap_or_else(|_| {
                Err(CoreError::DeviceUnavailable {
                    reason: "Capture thread panicked".to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })
            }),
            None => Ok(Vec::new()),
        };

        self.guard = None;
        self.state = SessionState::Stopped;

        let samples = result?;
        info!(sample_count = samples.len(), "Capture session stopped");

        Ok(samples)
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.state != SessionState::Recording {
            return;
        }
        if let Err(e) = self.stop_now() {
            warn!(error = ?e, "Capture session failed while stopping on drop");
        }
    }
}
