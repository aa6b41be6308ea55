use crate::{AudioDevice, CaptureConfig, CoreError, CpalDevice, DeviceHandle, StopHandle};

use std::time::Duration;

const CAPTURE_DURATION: Duration = Duration::from_millis(500);

/// WHAT: Unsupported bit depth is rejected before the host is touched
/// WHY: The pipeline only produces 16-bit PCM; anything else must fail loudly
#[test]
fn given_24_bit_config_when_acquiring_cpal_device_then_device_unavailable() {
    // Given: A config asking for 24-bit samples
    let config = CaptureConfig {
        bits_per_sample: 24,
        ..CaptureConfig::default()
    };

    // When: Acquiring the cpal device
    let result = CpalDevice.acquire(&config);

    // Then: Acquisition fails without opening a stream
    assert!(matches!(result, Err(CoreError::DeviceUnavailable { .. })));
}

/// WHAT: Real microphone capture stops at the requested sample count
/// WHY: Verifies cpal format negotiation and early completion on a full buffer
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)] // Requires a microphone that supports 16 kHz mono
#[allow(clippy::unwrap_used)]
fn given_default_microphone_when_filling_half_second_then_at_most_requested_samples() {
    // Given: The default input device at 16 kHz mono
    let config = CaptureConfig::default();
    let mut handle = CpalDevice.acquire(&config).unwrap();
    let max_samples = config.samples_for(CAPTURE_DURATION);

    // When: Filling for half a second
    let samples = handle.fill(max_samples, &StopHandle::new()).unwrap();

    // Then: The buffer never exceeds the request
    assert!(samples.len() <= max_samples);
}
