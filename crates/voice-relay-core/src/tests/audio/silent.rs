use crate::{AudioDevice, CaptureConfig, DeviceHandle, SilentDevice, StopHandle};

use std::time::{Duration, Instant};

const FILL_SAMPLES: usize = 1_600;
const FILL_DURATION: Duration = Duration::from_millis(100);

/// WHAT: Silent device paces its output in real time
/// WHY: Fixed-duration sessions must actually block for their duration
#[test]
#[allow(clippy::unwrap_used)]
fn given_silent_device_when_filling_100ms_then_blocks_and_returns_zeros() {
    // Given: A silent device at 16 kHz mono
    let config = CaptureConfig::default();
    let mut handle = SilentDevice.acquire(&config).unwrap();
    let started = Instant::now();

    // When: Filling 100 ms worth of samples
    let samples = handle.fill(FILL_SAMPLES, &StopHandle::new()).unwrap();

    // Then: Exactly the requested silence, after roughly the real duration
    assert_eq!(samples.len(), FILL_SAMPLES);
    assert!(samples.iter().all(|&s| s == 0));
    assert!(started.elapsed() >= FILL_DURATION - Duration::from_millis(15));
}

/// WHAT: A pre-signalled stop returns immediately with nothing
/// WHY: Cancellation before capture begins must not record at all
#[test]
#[allow(clippy::unwrap_used)]
fn given_stopped_handle_when_filling_then_returns_empty_immediately() {
    // Given: A stop signal already raised
    let mut handle = SilentDevice.acquire(&CaptureConfig::default()).unwrap();
    let stop = StopHandle::new();
    stop.stop();

    // When: Filling
    let samples = handle.fill(FILL_SAMPLES, &stop).unwrap();

    // Then: No samples are produced
    assert!(samples.is_empty());
}
