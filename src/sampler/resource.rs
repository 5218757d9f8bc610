//! Instrument sample resources: WAV decoding, mono mixdown, resampling, and a cached library.

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use super::SamplerError;

/// Pitch an instrument sample is assumed to be recorded at.
pub const SAMPLE_ROOT_PITCH: u8 = 60;

/// A mono instrument sample at a known sample rate.
#[derive(Debug, Clone)]
pub struct SampleData {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleData {
    /// Wrap raw mono samples.
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Decode a WAV stream to mono f32 at `target_rate`.
    ///
    /// Accepts 8/16/24/32-bit integer and 32-bit float files. Channels are
    /// averaged; a differing source rate is resampled linearly.
    pub fn from_wav<R: Read + Seek>(
        reader: R,
        id: &str,
        target_rate: u32,
    ) -> Result<Self, SamplerError> {
        let wav = hound::WavReader::new(reader)?;
        let spec = wav.spec();
        let channels = usize::from(spec.channels.max(1));
        if spec.sample_rate == 0 {
            return Err(SamplerError::UnsupportedFormat(format!(
                "{id}: sample rate 0"
            )));
        }

        let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Float, 32) => {
                wav.into_samples::<f32>().collect::<Result<_, _>>()?
            }
            (hound::SampleFormat::Int, bits @ 8..=32) => {
                let scale = (1u64 << (bits - 1)) as f32;
                wav.into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<Result<_, _>>()?
            }
            (format, bits) => {
                return Err(SamplerError::UnsupportedFormat(format!(
                    "{bits}-bit {format:?}"
                )))
            }
        };

        if interleaved.is_empty() {
            return Err(SamplerError::Empty(id.to_string()));
        }

        let mono: Vec<f32> = interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        let samples = if spec.sample_rate == target_rate {
            mono
        } else {
            resample_linear(&mono, spec.sample_rate, target_rate)
        };

        Ok(Self {
            samples,
            sample_rate: target_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Linearly interpolated read at a fractional position; zero past the end.
    pub fn read(&self, position: f64) -> f32 {
        let idx = position as usize;
        let frac = (position - idx as f64) as f32;
        match (self.samples.get(idx), self.samples.get(idx + 1)) {
            (Some(&a), Some(&b)) => a + (b - a) * frac,
            (Some(&a), None) => a * (1.0 - frac),
            _ => 0.0,
        }
    }
}

/// Linear-interpolation resampling from `source_rate` to `target_rate`.
fn resample_linear(input: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if input.len() < 2 {
        return input.to_vec();
    }

    let step = f64::from(source_rate) / f64::from(target_rate);
    let output_len = (input.len() as f64 / step).ceil() as usize;
    let last = input.len() - 1;

    (0..output_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let frac = (pos - idx as f64) as f32;
            if idx < last {
                input[idx] * (1.0 - frac) + input[idx + 1] * frac
            } else {
                input[last]
            }
        })
        .collect()
}

/// Instrument samples on disk, decoded once and shared.
pub struct InstrumentLibrary {
    root: PathBuf,
    sample_rate: u32,
    cache: Mutex<HashMap<String, Arc<SampleData>>>,
}

impl InstrumentLibrary {
    /// A library reading `<root>/<resource_id>` and decoding at `sample_rate`.
    pub fn new(root: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            root: root.into(),
            sample_rate,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, resource_id: &str) -> PathBuf {
        self.root.join(resource_id)
    }

    /// Load a resource, decoding it on first use.
    pub fn load(&self, resource_id: &str) -> Result<Arc<SampleData>, SamplerError> {
        if let Some(hit) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(resource_id)
        {
            return Ok(hit.clone());
        }

        let path = self.path_for(resource_id);
        let file = std::fs::File::open(&path)
            .map_err(|_| SamplerError::ResourceMissing(path.clone()))?;
        let data = Arc::new(SampleData::from_wav(
            std::io::BufReader::new(file),
            resource_id,
            self.sample_rate,
        )?);
        info!(resource = resource_id, frames = data.len(), "instrument sample decoded");

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(resource_id.to_string(), data.clone());
        Ok(data)
    }
}
