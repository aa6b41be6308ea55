mod capture;
mod config;
mod device;
mod session;
mod silent;
pub mod wav;

pub use {
    capture::CpalDevice,
    config::{
        CaptureConfig, DEFAULT_BITS_PER_SAMPLE, DEFAULT_CHANNELS, DEFAULT_MAX_DURATION,
        DEFAULT_SAMPLE_RATE,
    },
    device::{AudioDevice, DeviceHandle, StopHandle},
    session::{CaptureSession, Recorder, SessionState},
    silent::SilentDevice,
};
