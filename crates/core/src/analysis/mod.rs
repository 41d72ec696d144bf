use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{config::AnalysisConfig, Pool, PoolError, Real, Result, StereoSample};

/// Splits a signal into fixed-size, possibly overlapping frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCutter {
    frame_size: usize,
    hop_size: usize,
}

impl FrameCutter {
    pub fn new(frame_size: usize, hop_size: usize) -> Result<Self> {
        if frame_size < 2 {
            return Err(PoolError::InvalidInput("frames need at least two samples"));
        }
        if hop_size == 0 {
            return Err(PoolError::InvalidInput("hop size must be positive"));
        }

        Ok(Self {
            frame_size,
            hop_size,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Number of frames [`FrameCutter::frames`] yields for `len` samples.
    pub fn frame_count(&self, len: usize) -> usize {
        len.div_ceil(self.hop_size)
    }

    /// Yields `(start, frame)` pairs. Frames start every `hop_size` samples
    /// and the tail of the signal is zero padded.
    pub fn frames<'a>(&self, samples: &'a [Real]) -> impl Iterator<Item = (usize, Vec<Real>)> + 'a {
        let frame_size = self.frame_size;
        (0..samples.len()).step_by(self.hop_size).map(move |start| {
            let end = (start + frame_size).min(samples.len());
            let mut frame = samples[start..end].to_vec();
            frame.resize(frame_size, 0.0);
            (start, frame)
        })
    }
}

/// What a finished analysis run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub frame_count: usize,
    pub duration_seconds: Real,
}

/// Reference producer: cuts the signal into frames, applies a Hann window,
/// computes the magnitude spectrum and appends per-frame descriptors to a
/// [`Pool`] under the configured namespace.
pub struct FrameAnalyzer {
    config: AnalysisConfig,
    cutter: FrameCutter,
    fft: FftResources,
}

impl FrameAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        if config.sample_rate == 0 {
            return Err(PoolError::InvalidInput("sample rate must be positive"));
        }
        let cutter = FrameCutter::new(config.frame_size, config.hop_size)?;
        let fft = FftResources::new(config.frame_size);

        Ok(Self {
            config,
            cutter,
            fft,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyses a mono signal.
    pub fn analyze(&mut self, samples: &[Real], pool: &mut Pool) -> Result<AnalysisSummary> {
        if samples.is_empty() {
            return Err(PoolError::InvalidInput("analysis requires at least one sample"));
        }

        let keys = DescriptorKeys::new(&self.config.namespace);
        for (_, frame) in self.cutter.frames(samples) {
            self.analyze_frame(&frame, &keys, pool)?;
        }

        self.finish(samples.len(), &keys, pool)
    }

    /// Analyses the downmix of two channels and records the first sample
    /// pair of every frame.
    pub fn analyze_stereo(
        &mut self,
        left: &[Real],
        right: &[Real],
        pool: &mut Pool,
    ) -> Result<AnalysisSummary> {
        if left.len() != right.len() {
            return Err(PoolError::InvalidInput("stereo channels differ in length"));
        }
        if left.is_empty() {
            return Err(PoolError::InvalidInput("analysis requires at least one sample"));
        }

        let mono: Vec<Real> = left
            .iter()
            .zip(right)
            .map(|(l, r)| (l + r) * 0.5)
            .collect();
        let keys = DescriptorKeys::new(&self.config.namespace);
        for (start, frame) in self.cutter.frames(&mono) {
            pool.add(&keys.stereo_head, StereoSample::new(left[start], right[start]))?;
            self.analyze_frame(&frame, &keys, pool)?;
        }

        self.finish(mono.len(), &keys, pool)
    }

    fn analyze_frame(&mut self, frame: &[Real], keys: &DescriptorKeys, pool: &mut Pool) -> Result<()> {
        let rms = compute_rms(frame);
        let magnitudes = self.fft.magnitudes(frame)?;
        let centroid = spectral_centroid(&magnitudes, self.config.sample_rate, frame.len());

        pool.add(&keys.rms, rms)?;
        pool.add(&keys.spectral_centroid, centroid)?;
        pool.add(&keys.spectrum, magnitudes)?;
        Ok(())
    }

    fn finish(&self, len: usize, keys: &DescriptorKeys, pool: &mut Pool) -> Result<AnalysisSummary> {
        let summary = AnalysisSummary {
            frame_count: self.cutter.frame_count(len),
            duration_seconds: len as Real / self.config.sample_rate as Real,
        };

        pool.set(&keys.frame_count, summary.frame_count as Real)?;
        pool.set(&keys.duration, summary.duration_seconds)?;
        tracing::debug!(
            frames = summary.frame_count,
            duration = summary.duration_seconds,
            namespace = %self.config.namespace,
            "analysis finished"
        );
        Ok(summary)
    }
}

impl fmt::Debug for FrameAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameAnalyzer")
            .field("config", &self.config)
            .field("cutter", &self.cutter)
            .finish()
    }
}

struct DescriptorKeys {
    rms: String,
    spectral_centroid: String,
    spectrum: String,
    stereo_head: String,
    frame_count: String,
    duration: String,
}

impl DescriptorKeys {
    fn new(namespace: &str) -> Self {
        let key = |name: &str| format!("{namespace}.{name}");
        Self {
            rms: key("rms"),
            spectral_centroid: key("spectral_centroid"),
            spectrum: key("spectrum"),
            stereo_head: key("stereo_head"),
            frame_count: key("frame_count"),
            duration: key("duration"),
        }
    }
}

struct FftResources {
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl FftResources {
    fn new(size: usize) -> Self {
        let plan = RealFftPlanner::<f32>::new().plan_fft_forward(size);
        Self {
            scratch: plan.make_scratch_vec(),
            spectrum: plan.make_output_vec(),
            input: plan.make_input_vec(),
            plan,
        }
    }

    /// Hann-windowed magnitude spectrum of `frame`.
    fn magnitudes(&mut self, frame: &[Real]) -> Result<Vec<Real>> {
        let len = frame.len();
        for (index, (slot, value)) in self.input.iter_mut().zip(frame).enumerate() {
            *slot = *value * hann_value(index, len);
        }

        self.plan
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)?;
        Ok(self.spectrum.iter().map(|bin| bin.norm()).collect())
    }
}

fn compute_rms(samples: &[Real]) -> Real {
    let sum: Real = samples.iter().map(|sample| sample * sample).sum();
    (sum / samples.len() as Real).sqrt()
}

/// Magnitude-weighted mean frequency in Hz.
fn spectral_centroid(magnitudes: &[Real], sample_rate: u32, frame_len: usize) -> Real {
    let bin_hz = sample_rate as Real / frame_len as Real;
    let (weighted, total) = magnitudes
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(weighted, total), (bin, magnitude)| {
            (weighted + magnitude * bin as Real * bin_hz, total + magnitude)
        });

    if total <= Real::EPSILON {
        0.0
    } else {
        weighted / total
    }
}

fn hann_value(index: usize, len: usize) -> Real {
    if len <= 1 {
        return 1.0;
    }

    0.5 - 0.5 * ((2.0 * PI * index as Real) / (len as Real - 1.0)).cos()
}
