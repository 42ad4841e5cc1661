//! Audio encode/decode helpers used by the runtime and API layers.

use std::io::Cursor;

use tracing::debug;

use crate::error::{Error, Result};

/// Output encodings supported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    RawF32,
    RawI16,
}

impl AudioFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "wav" => Ok(Self::Wav),
            "raw_f32" | "pcm_f32" => Ok(Self::RawF32),
            "raw_i16" | "pcm_i16" => Ok(Self::RawI16),
            other => Err(Error::InvalidInput(format!(
                "Unknown audio format: {}",
                other
            ))),
        }
    }
}

/// Encodes mono f32 samples into a wire format.
pub struct AudioEncoder {
    sample_rate: u32,
    channels: u16,
}

impl AudioEncoder {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    pub fn encode(&self, samples: &[f32], format: AudioFormat) -> Result<Vec<u8>> {
        match format {
            AudioFormat::Wav => self.encode_wav(samples),
            AudioFormat::RawF32 => {
                let mut out = Vec::with_capacity(samples.len() * 4);
                for sample in samples {
                    out.extend_from_slice(&sample.to_le_bytes());
                }
                Ok(out)
            }
            AudioFormat::RawI16 => {
                let mut out = Vec::with_capacity(samples.len() * 2);
                for sample in samples {
                    let v = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                    out.extend_from_slice(&v.to_le_bytes());
                }
                Ok(out)
            }
        }
    }

    fn encode_wav(&self, samples: &[f32]) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| Error::InferenceError(format!("Failed to write WAV: {}", e)))?;
            for sample in samples {
                let v = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer
                    .write_sample(v)
                    .map_err(|e| Error::InferenceError(format!("Failed to write WAV: {}", e)))?;
            }
            writer
                .finalize()
                .map_err(|e| Error::InferenceError(format!("Failed to write WAV: {}", e)))?;
        }
        Ok(cursor.into_inner())
    }

    pub fn content_type(format: AudioFormat) -> &'static str {
        match format {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::RawF32 | AudioFormat::RawI16 => "application/octet-stream",
        }
    }
}

/// Encode mono f32 samples as a 16-bit WAV byte buffer.
pub fn encode_wav_bytes(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    AudioEncoder::new(sample_rate, 1).encode(samples, AudioFormat::Wav)
}

/// Decode WAV bytes into mono f32 samples plus the source sample rate.
/// Multi-channel input is downmixed by averaging.
pub fn decode_wav_bytes(wav_bytes: &[u8]) -> Result<(Vec<f32>, u32)> {
    let cursor = Cursor::new(wav_bytes);
    let mut reader = hound::WavReader::new(cursor)
        .map_err(|e| Error::InvalidInput(format!("Failed to parse WAV: {}", e)))?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels.max(1) as usize;

    let mut samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample.max(1) as u32;
            let max_val = if bits > 1 {
                ((1i64 << (bits - 1)) - 1) as f32
            } else {
                1.0
            };
            reader
                .samples::<i32>()
                .filter_map(|s| s.ok())
                .map(|s| (s as f32 / max_val).clamp(-1.0, 1.0))
                .collect()
        }
        hound::SampleFormat::Float => reader.samples::<f32>().filter_map(|s| s.ok()).collect(),
    };

    if channels > 1 {
        let mut mono = Vec::with_capacity(samples.len() / channels + 1);
        for frame in samples.chunks(channels) {
            if frame.is_empty() {
                continue;
            }
            let sum: f32 = frame.iter().copied().sum();
            mono.push(sum / frame.len() as f32);
        }
        samples = mono;
    }

    for sample in &mut samples {
        if !sample.is_finite() {
            *sample = 0.0;
        } else {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }

    Ok((samples, sample_rate))
}

/// Clean up reference audio before it conditions a voice clone: remove DC
/// bias, normalize peaks, reject silence. Returns an empty vec when the
/// input is unusable.
pub fn preprocess_reference_audio(mut samples: Vec<f32>, sample_rate: u32) -> Vec<f32> {
    if samples.is_empty() || sample_rate == 0 {
        return Vec::new();
    }

    let original_len = samples.len();

    for sample in &mut samples {
        if !sample.is_finite() {
            *sample = 0.0;
        }
    }

    // Remove DC bias.
    let mean = samples.iter().copied().sum::<f32>() / samples.len() as f32;
    for sample in &mut samples {
        *sample -= mean;
    }

    let peak = samples.iter().fold(0.0f32, |p, &s| p.max(s.abs()));
    if peak < 1e-5 {
        return Vec::new();
    }

    if peak > 0.95 {
        let scale = 0.95 / peak;
        for sample in &mut samples {
            *sample *= scale;
        }
    }

    debug!(
        "Reference preprocessing: {} -> {} samples @ {} Hz",
        original_len,
        samples.len(),
        sample_rate
    );

    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_round_trip_preserves_length_and_rate() {
        let samples: Vec<f32> = (0..2400).map(|i| (i as f32 * 0.01).sin() * 0.5).collect();
        let bytes = encode_wav_bytes(&samples, 24000).unwrap();

        let (decoded, rate) = decode_wav_bytes(&bytes).unwrap();
        assert_eq!(rate, 24000);
        assert_eq!(decoded.len(), samples.len());
        // 16-bit quantization bounds the error.
        for (a, b) in samples.iter().zip(decoded.iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn stereo_input_downmixes_to_mono() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..100 {
                writer.write_sample(8000i16).unwrap();
                writer.write_sample(-8000i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        let (decoded, rate) = decode_wav_bytes(&cursor.into_inner()).unwrap();
        assert_eq!(rate, 16000);
        assert_eq!(decoded.len(), 100);
        // Averaged channels cancel out.
        assert!(decoded.iter().all(|s| s.abs() < 1e-3));
    }

    #[test]
    fn raw_i16_encoding_is_two_bytes_per_sample() {
        let encoder = AudioEncoder::new(24000, 1);
        let bytes = encoder.encode(&[0.0, 0.5, -0.5], AudioFormat::RawI16).unwrap();
        assert_eq!(bytes.len(), 6);
    }

    #[test]
    fn silent_reference_is_rejected() {
        let silent = vec![0.0f32; 16000];
        assert!(preprocess_reference_audio(silent, 16000).is_empty());
        assert!(preprocess_reference_audio(Vec::new(), 16000).is_empty());
    }

    #[test]
    fn loud_reference_is_normalized() {
        let loud: Vec<f32> = (0..1000).map(|i| if i % 2 == 0 { 1.5 } else { -1.5 }).collect();
        let processed = preprocess_reference_audio(loud, 16000);
        let peak = processed.iter().fold(0.0f32, |p, &s| p.max(s.abs()));
        assert!(peak <= 0.95 + 1e-3);
    }

    #[test]
    fn format_parse_accepts_aliases() {
        assert_eq!(AudioFormat::parse("WAV").unwrap(), AudioFormat::Wav);
        assert_eq!(AudioFormat::parse("pcm_f32").unwrap(), AudioFormat::RawF32);
        assert!(AudioFormat::parse("mp3").is_err());
    }
}
