use crate::{CaptureConfig, CoreError};

use std::time::Duration;

/// WHAT: Defaults match the worker's expected input format
/// WHY: 16 kHz mono 16-bit with a 10 s cap is what the recognizer consumes
#[test]
fn given_default_config_when_inspecting_then_16khz_mono_16bit_10s() {
    // Given/When: The default capture config
    let config = CaptureConfig::default();

    // Then: Format and duration match the worker contract
    assert_eq!(config.sample_rate, 16_000);
    assert_eq!(config.channels, 1);
    assert_eq!(config.bits_per_sample, 16);
    assert_eq!(config.max_duration, Duration::from_secs(10));
    assert!(config.validate().is_ok());
}

/// WHAT: Requested durations beyond the cap are clamped
/// WHY: A session must never record longer than max_duration
#[test]
fn given_duration_over_max_when_computing_samples_then_clamped_to_max() {
    // Given: Stereo config capped at 1 second
    let config = CaptureConfig {
        channels: 2,
        max_duration: Duration::from_secs(1),
        ..CaptureConfig::default()
    };

    // When: Asking for 5 seconds and for a quarter second
    let clamped = config.samples_for(Duration::from_secs(5));
    let quarter = config.samples_for(Duration::from_millis(250));

    // Then: Counts are interleaved frames, capped at 1 second
    assert_eq!(clamped, 16_000 * 2);
    assert_eq!(quarter, 4_000 * 2);
}

/// WHAT: Zero channels is not a capturable format
/// WHY: Prevents division-free but meaningless empty sessions
#[test]
fn given_zero_channels_when_validating_then_device_unavailable() {
    // Given: A config with no channels
    let config = CaptureConfig {
        channels: 0,
        ..CaptureConfig::default()
    };

    // When: Validating
    let result = config.validate();

    // Then: Rejected as an unusable device format
    assert!(matches!(result, Err(CoreError::DeviceUnavailable { .. })));
}

/// WHAT: Formats whose WAV header fields overflow are rejected
/// WHY: A validated config must always encode to a consistent header
#[test]
fn given_oversized_format_when_validating_then_device_unavailable() {
    // Given: Formats overflowing block align, byte rate, and the data size
    let cases = [
        CaptureConfig {
            channels: 40_000,
            ..CaptureConfig::default()
        },
        CaptureConfig {
            sample_rate: 3_000_000_000,
            ..CaptureConfig::default()
        },
        CaptureConfig {
            max_duration: Duration::from_secs(200_000),
            ..CaptureConfig::default()
        },
    ];

    for config in cases {
        // When: Validating
        let result = config.validate();

        // Then: Rejected
        assert!(
            matches!(result, Err(CoreError::DeviceUnavailable { .. })),
            "{:?} should be rejected",
            config
        );
    }
}

/// WHAT: The largest accepted stereo format still gives exact header math
/// WHY: byteRate == sampleRate * blockAlign must hold for every valid config
#[test]
#[allow(clippy::unwrap_used)]
fn given_large_valid_format_when_encoding_then_header_consistent() {
    // Given: 8 channels at 192 kHz, which fits every header field
    let config = CaptureConfig {
        sample_rate: 192_000,
        channels: 8,
        ..CaptureConfig::default()
    };
    assert!(config.validate().is_ok());

    // When: Encoding a few frames
    let bytes = crate::wav::encode(&[0; 16], &config);
    let header = crate::wav::WavHeader::parse(&bytes).unwrap();

    // Then: Derived fields agree
    assert_eq!(header.block_align, 16);
    assert_eq!(header.byte_rate, 192_000 * 16);
}
