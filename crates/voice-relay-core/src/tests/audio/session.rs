use crate::{
    AudioDevice, CaptureConfig, CoreError, CoreResult, DeviceHandle, Recorder, SessionState,
    SilentDevice,
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use error_location::ErrorLocation;

const SHORT_MAX: Duration = Duration::from_millis(100);
const SHORT_MAX_SAMPLES: usize = 1_600;

/// Silent device that counts acquisitions and can be made unavailable.
struct ProbeDevice {
    acquisitions: AtomicUsize,
    available: bool,
}

impl ProbeDevice {
    fn new(available: bool) -> Arc<Self> {
        Arc::new(Self {
            acquisitions: AtomicUsize::new(0),
            available,
        })
    }

    fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }
}

impl AudioDevice for ProbeDevice {
    fn acquire(&self, config: &CaptureConfig) -> CoreResult<Box<dyn DeviceHandle>> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        if !self.available {
            return Err(CoreError::DeviceUnavailable {
                reason: "probe device unplugged".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        SilentDevice.acquire(config)
    }
}

fn short_config() -> CaptureConfig {
    CaptureConfig {
        max_duration: SHORT_MAX,
        ..CaptureConfig::default()
    }
}

/// WHAT: Only one session can record at a time
/// WHY: Interleaved captures would race on the single input device
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_starting_another_then_already_recording() {
    // Given: A recorder with one session recording
    let recorder = Recorder::new(ProbeDevice::new(true));
    let mut first = recorder.start(CaptureConfig::default()).unwrap();

    // When: Starting a second session
    let second = recorder.start(CaptureConfig::default());

    // Then: The second fails and the first is unaffected
    assert!(matches!(second, Err(CoreError::AlreadyRecording { .. })));
    assert_eq!(first.state(), SessionState::Recording);
    assert!(recorder.is_recording());

    first.stop_now().unwrap();
    assert!(!recorder.is_recording());
}

/// WHAT: Starting the same session twice fails
/// WHY: A recording session must not spawn a second capture
#[test]
#[allow(clippy::unwrap_used)]
fn given_started_session_when_starting_again_then_already_recording() {
    // Given: A recording session
    let recorder = Recorder::new(ProbeDevice::new(true));
    let mut session = recorder.session(CaptureConfig::default());
    session.start().unwrap();

    // When: Starting it again
    let result = session.start();

    // Then: AlreadyRecording, still recording
    assert!(matches!(result, Err(CoreError::AlreadyRecording { .. })));
    assert_eq!(session.state(), SessionState::Recording);
}

/// WHAT: stop_now returns the buffer once, then empty buffers
/// WHY: Stop-after-stop must be harmless
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_stopping_twice_then_second_is_empty() {
    // Given: A session that has recorded for a short while
    let recorder = Recorder::new(ProbeDevice::new(true));
    let mut session = recorder.start(CaptureConfig::default()).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    // When: Stopping twice
    let first = session.stop_now().unwrap();
    let second = session.stop_now().unwrap();

    // Then: First has samples, second is empty, session stopped
    assert!(!first.is_empty());
    assert!(first.len() < CaptureConfig::default().samples_for(Duration::from_secs(10)));
    assert!(second.is_empty());
    assert_eq!(session.state(), SessionState::Stopped);
}

/// WHAT: Zero-length capture never opens the device
/// WHY: Avoids device churn for degenerate requests
#[test]
#[allow(clippy::unwrap_used)]
fn given_zero_duration_when_running_then_empty_without_acquiring_device() {
    // Given: A recorder over a probe device
    let device = ProbeDevice::new(true);
    let recorder = Recorder::new(device.clone());
    let mut session = recorder.session(CaptureConfig::default());

    // When: Running for zero time
    let samples = session.run_for(Duration::ZERO).unwrap();

    // Then: Empty, and the device was never acquired
    assert!(samples.is_empty());
    assert_eq!(device.acquisitions(), 0);
}

/// WHAT: An unavailable device leaves the session Idle
/// WHY: Device failures must be safe to retry
#[test]
fn given_unavailable_device_when_running_then_device_unavailable_and_idle() {
    // Given: A device that cannot be acquired
    let device = ProbeDevice::new(false);
    let recorder = Recorder::new(device.clone());
    let mut session = recorder.session(short_config());

    // When: Running a capture
    let result = session.run_for(SHORT_MAX);

    // Then: DeviceUnavailable, still Idle, slot released
    assert!(matches!(result, Err(CoreError::DeviceUnavailable { .. })));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!recorder.is_recording());
    assert_eq!(device.acquisitions(), 1);
}

/// WHAT: run_for is clamped to max_duration
/// WHY: Session length is bounded regardless of the caller's request
#[test]
#[allow(clippy::unwrap_used)]
fn given_duration_over_max_when_running_then_stops_at_max() {
    // Given: A session capped at 100 ms
    let recorder = Recorder::new(ProbeDevice::new(true));
    let mut session = recorder.session(short_config());
    let started = Instant::now();

    // When: Asking for 5 seconds
    let samples = session.run_for(Duration::from_secs(5)).unwrap();

    // Then: 100 ms of samples, returned well before 5 seconds
    assert_eq!(samples.len(), SHORT_MAX_SAMPLES);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(session.state(), SessionState::Stopped);
}

/// WHAT: A stop handle ends run_for from another thread
/// WHY: Cancellation arrives from a different context than the capture
#[test]
#[allow(clippy::unwrap_used)]
fn given_running_capture_when_stop_signalled_then_returns_early() {
    // Given: A 10 second capture and its stop handle
    let recorder = Recorder::new(ProbeDevice::new(true));
    let mut session = recorder.session(CaptureConfig::default());
    let stop = session.stop_handle();
    let started = Instant::now();

    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        stop.stop();
    });

    // When: Running until stopped
    let samples = session.run_for(Duration::from_secs(10)).unwrap();
    stopper.join().unwrap();

    // Then: Returned early with a partial buffer
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(samples.len() < CaptureConfig::default().samples_for(Duration::from_secs(10)));
}

/// WHAT: wait() collects the full max_duration capture
/// WHY: Background sessions auto-stop at their bound
#[test]
#[allow(clippy::unwrap_used)]
fn given_background_session_when_waiting_then_full_duration_buffer() {
    // Given: A background session capped at 100 ms
    let recorder = Recorder::new(ProbeDevice::new(true));
    let mut session = recorder.start(short_config()).unwrap();

    // When: Waiting for it to finish
    let samples = session.wait().unwrap();

    // Then: Full buffer and the slot is free again
    assert_eq!(samples.len(), SHORT_MAX_SAMPLES);
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(!recorder.is_recording());
}

/// WHAT: Stopped sessions are single-use
/// WHY: A session is exactly one capture attempt
#[test]
#[allow(clippy::unwrap_used)]
fn given_stopped_session_when_running_again_then_session_finished() {
    // Given: A session that already ran
    let recorder = Recorder::new(ProbeDevice::new(true));
    let mut session = recorder.session(short_config());
    session.run_for(Duration::from_millis(20)).unwrap();

    // When: Running it again
    let result = session.run_for(Duration::from_millis(20));

    // Then: SessionFinished
    assert!(matches!(result, Err(CoreError::SessionFinished { .. })));
}

/// WHAT: Dropping a recording session frees the recorder
/// WHY: The one-session slot must not leak when a handle is discarded
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_session_when_dropped_then_recorder_available() {
    // Given: A recording session
    let recorder = Recorder::new(ProbeDevice::new(true));
    let session = recorder.start(CaptureConfig::default()).unwrap();

    // When: Dropping it
    drop(session);

    // Then: A new session can start
    let mut next = recorder.start(short_config()).unwrap();
    assert!(next.stop_now().is_ok());
}
