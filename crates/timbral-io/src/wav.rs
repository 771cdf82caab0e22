//! WAV file reading and writing.
//!
//! Samples are interleaved f32 throughout. 32-bit files are written as IEEE
//! float, other depths as clamped integer PCM.

use crate::Result;
use hound::{SampleFormat, WavReader, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let total_samples = reader.len() as u64; // total across all channels
    let num_frames = total_samples / spec.channels as u64;
    let duration_secs = num_frames as f64 / spec.sample_rate as f64;

    let format = match spec.sample_format {
        SampleFormat::Float => WavFormat::IeeeFloat,
        SampleFormat::Int => WavFormat::Pcm,
    };

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs,
        format,
    })
}

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample (16, 24 or 32).
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Read a WAV file as interleaved f32 along with its spec.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, WavSpec)> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());

    let samples: Vec<f32> = match reader.spec().sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    Ok((samples, spec))
}

/// Write interleaved samples to a WAV file.
///
/// # Example
/// ```ignore
/// let samples = vec![0.0f32; 2 * 48000]; // 1 second of stereo silence
/// write_wav("output.wav", &samples, WavSpec::default())?;
/// ```
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    let mut writer = WavSink::create(path, spec)?;
    writer.write(samples)?;
    writer.finalize()
}

/// Incremental WAV writer for block-by-block renders.
///
/// Blocks are appended as they are produced so long renders never hold the
/// whole file in memory. Call [`finalize`](Self::finalize) to patch the
/// header; dropping without it leaves hound to finalize silently.
pub struct WavSink {
    writer: WavWriter<BufWriter<File>>,
    spec: WavSpec,
    frames: u64,
}

impl WavSink {
    /// Create (or truncate) `path` for writing.
    pub fn create<P: AsRef<Path>>(path: P, spec: WavSpec) -> Result<Self> {
        let writer = WavWriter::create(path, hound::WavSpec::from(spec))?;
        Ok(Self {
            writer,
            spec,
            frames: 0,
        })
    }

    /// Append interleaved samples.
    pub fn write(&mut self, samples: &[f32]) -> Result<()> {
        if self.spec.bits_per_sample == 32 {
            for &sample in samples {
                self.writer.write_sample(sample)?;
            }
        } else {
            let max_val = (1i32 << (self.spec.bits_per_sample - 1)) as f32;
            for &sample in samples {
                let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
                self.writer.write_sample(int_sample)?;
            }
        }
        self.frames += (samples.len() / self.spec.channels.max(1) as usize) as u64;
        Ok(())
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Output spec.
    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Flush and patch the header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}

impl std::fmt::Debug for WavSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavSink")
            .field("spec", &self.spec)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_roundtrip_f32() {
        let samples: Vec<f32> = (0..1000).map(|i| (i as f32 / 1000.0).sin()).collect();
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec, spec);
        assert_eq!(loaded.len(), samples.len());

        for (a, b) in samples.iter().zip(loaded.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_roundtrip_i16_stereo() {
        let samples: Vec<f32> = (0..2000).map(|i| (i as f32 / 500.0).sin() * 0.9).collect();
        let spec = WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
        };

        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &samples, spec).unwrap();

        let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
        assert_eq!(loaded_spec.channels, 2);
        assert_eq!(loaded.len(), samples.len());

        // 16-bit has less precision
        for (a, b) in samples.iter().zip(loaded.iter()) {
            assert!((a - b).abs() < 0.001);
        }
    }

    #[test]
    fn test_int_output_clamps() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 16,
        };
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), &[2.0, -2.0], spec).unwrap();

        let (loaded, _) = read_wav(file.path()).unwrap();
        assert!(loaded[0] < 1.0 && loaded[0] > 0.99);
        assert_eq!(loaded[1], -1.0);
    }

    #[test]
    fn test_sink_counts_frames() {
        let spec = WavSpec::default();
        let file = NamedTempFile::new().unwrap();
        let mut sink = WavSink::create(file.path(), spec).unwrap();
        sink.write(&[0.0; 256]).unwrap();
        sink.write(&[0.5; 128]).unwrap();
        assert_eq!(sink.frames(), 192);
        sink.finalize().unwrap();

        let info = read_wav_info(file.path()).unwrap();
        assert_eq!(info.num_frames, 192);
        assert_eq!(info.channels, 2);
        assert_eq!(info.format, WavFormat::IeeeFloat);
    }
}
