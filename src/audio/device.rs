//! Audio device helpers

use cpal::traits::{DeviceTrait, HostTrait};

use crate::error::AudioError;

/// Default input device, or `DeviceUnavailable` when none is present.
pub fn default_input_device() -> Result<cpal::Device, AudioError> {
    cpal::default_host()
        .default_input_device()
        .ok_or_else(|| AudioError::DeviceUnavailable("no default input device".to_string()))
}

/// Default output device, or `DeviceUnavailable` when none is present.
pub fn default_output_device() -> Result<cpal::Device, AudioError> {
    cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceUnavailable("no default output device".to_string()))
}

/// Stream config for the device's native channel count at the pipeline
/// sample rate.
pub fn input_stream_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<cpal::StreamConfig, AudioError> {
    let native = device
        .default_input_config()
        .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

    Ok(cpal::StreamConfig {
        channels: native.channels(),
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    })
}

/// Output twin of [`input_stream_config`].
pub fn output_stream_config(
    device: &cpal::Device,
    sample_rate: u32,
) -> Result<cpal::StreamConfig, AudioError> {
    let native = device
        .default_output_config()
        .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;

    Ok(cpal::StreamConfig {
        channels: native.channels(),
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    })
}
