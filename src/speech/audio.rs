//! Microphone input
//!
//! One `MicCapture` per capture session: opening it starts the input
//! stream immediately, dropping it releases the device. The stream
//! callback appends into a shared buffer that the endpointing loop drains
//! with `take_buffer`.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use crate::{Error, Result};

/// Capture sample rate expected by the STT service (16 kHz mono)
pub const SAMPLE_RATE: u32 = 16000;

/// An open microphone stream feeding a shared sample buffer
pub struct MicCapture {
    buffer: Arc<Mutex<Vec<f32>>>,
    // Held for the lifetime of the capture session; dropping it stops
    // the input stream.
    _stream: Stream,
}

impl MicCapture {
    /// Open the default input device and start capturing
    ///
    /// # Errors
    ///
    /// Returns error if no input device supports 16 kHz mono or the
    /// stream cannot be started
    pub fn open() -> Result<Self> {
        let (device, config) = input_config()?;
        let buffer = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&buffer);
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut sink) = sink.lock() {
                        sink.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "microphone stream error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone capture started"
        );

        Ok(Self {
            buffer,
            _stream: stream,
        })
    }

    /// Probe whether a usable input device exists without opening a stream
    #[must_use]
    pub fn probe() -> bool {
        input_config().is_ok()
    }

    /// Drain the samples captured since the last call
    #[must_use]
    pub fn take_buffer(&self) -> Vec<f32> {
        self.buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

/// Find the default input device and a 16 kHz mono stream config
fn input_config() -> Result<(Device, StreamConfig)> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

    let supported = device
        .supported_input_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
        })
        .ok_or_else(|| Error::Audio("no 16 kHz mono input config".to_string()))?;

    let config = supported.with_sample_rate(SampleRate(SAMPLE_RATE)).config();
    Ok((device, config))
}

/// Encode captured samples as 16-bit mono WAV for the STT request body
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // f32 [-1.0, 1.0] to i16, clamping anything outside the range
            #[allow(clippy::cast_possible_truncation)]
            let quantized = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(quantized)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wav_clamps_out_of_range_samples() {
        let data = encode_wav(&[2.0, -2.0], SAMPLE_RATE).unwrap();

        let mut reader = hound::WavReader::new(std::io::Cursor::new(data)).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(std::result::Result::unwrap).collect();
        assert_eq!(samples, vec![32767, -32768]);
    }
}
