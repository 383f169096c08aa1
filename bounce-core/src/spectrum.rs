//! # Spectrum Analysis Module
//!
//! Magnitude-spectrum computation for synthesized tones. The analyzer
//! windows the most recent chunk of a waveform, transforms it with RustFFT
//! and exposes the positive half of the spectrum for note detection and
//! the front end's spectrogram feed.
//!
//! ## Features
//! - High-performance FFT using RustFFT
//! - 4-term Blackman-Harris windowing for low spectral leakage
//! - DC offset removal for accurate analysis
//! - Dominant-frequency extraction

use rustfft::{FftPlanner, num_complex::Complex};

/// One analysis window's magnitude spectrum.
///
/// `magnitudes[i]` covers the frequency `i * sample_rate / (2 * len)`;
/// only the positive half of the spectrum is kept (Nyquist theorem).
#[derive(Debug, Clone)]
pub struct SpectrumFrame {
    /// Magnitude per frequency bin, DC bin first.
    pub magnitudes: Vec<f32>,
    /// Sample rate of the analyzed audio in Hz.
    pub sample_rate: u32,
}

impl SpectrumFrame {
    /// Width of one frequency bin in Hz.
    pub fn frequency_resolution(&self) -> f32 {
        self.sample_rate as f32 / (2.0 * self.magnitudes.len() as f32)
    }
}

/// Computes magnitude spectra from waveform buffers.
///
/// Holds the FFT planner so repeated analyses of the same window size
/// reuse the prepared transform.
pub struct SpectrumAnalyzer {
    planner: FftPlanner<f32>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectrumAnalyzer {
    /// Creates a new analyzer.
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Computes the magnitude spectrum of the most recent `window_size`
    /// samples of `samples`.
    ///
    /// Shorter inputs are zero-padded on the left so the freshest audio
    /// always sits at the end of the window. Processing steps:
    /// 1. DC offset removal
    /// 2. Blackman-Harris windowing
    /// 3. Forward FFT
    /// 4. Magnitudes of the first `window_size / 2` bins
    pub fn analyze(&mut self, samples: &[f32], sample_rate: u32, window_size: usize) -> SpectrumFrame {
        let mut windowed = vec![0.0_f32; window_size];
        let take = samples.len().min(window_size);
        windowed[window_size - take..].copy_from_slice(&samples[samples.len() - take..]);

        remove_dc_offset(&mut windowed);
        apply_blackman_harris_window(&mut windowed);

        let fft = self.planner.plan_fft_forward(window_size);
        let mut buffer: Vec<Complex<f32>> = windowed
            .into_iter()
            .map(|sample| Complex { re: sample, im: 0.0 })
            .collect();
        fft.process(&mut buffer);

        let magnitudes = buffer
            .iter()
            .take(window_size / 2)
            .map(|c| c.norm()) // .norm() is sqrt(re^2 + im^2)
            .collect();

        SpectrumFrame {
            magnitudes,
            sample_rate,
        }
    }

    /// Returns the frequency of the strongest bin, excluding DC.
    ///
    /// A silent frame (no bin above zero) reports 0 Hz.
    pub fn dominant_frequency(frame: &SpectrumFrame) -> f32 {
        let mut max_amplitude = 0.0_f32;
        let mut max_index = 0;

        for (i, &magnitude) in frame.magnitudes.iter().enumerate().skip(1) {
            if magnitude > max_amplitude {
                max_amplitude = magnitude;
                max_index = i;
            }
        }

        max_index as f32 * frame.frequency_resolution()
    }
}

/// Removes the DC offset from a signal by making its average value zero.
///
/// A DC component would otherwise dominate bin 0 and leak into its
/// neighbours, skewing low-frequency detection.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Applies a 4-term Blackman-Harris window in place.
///
/// Chosen over lighter windows for its very low side lobes, matching the
/// leakage characteristics the game's analysis was built around.
fn apply_blackman_harris_window(buffer: &mut [f32]) {
    const A0: f32 = 0.35875;
    const A1: f32 = 0.48829;
    const A2: f32 = 0.14128;
    const A3: f32 = 0.01168;

    let n = buffer.len();
    if n < 2 {
        return;
    }
    let n_minus_1 = (n - 1) as f32;
    for (i, sample) in buffer.iter_mut().enumerate() {
        let phase = std::f32::consts::TAU * i as f32 / n_minus_1;
        let multiplier =
            A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos() - A3 * (3.0 * phase).cos();
        *sample *= multiplier;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (std::f32::consts::TAU * freq * t).sin()
            })
            .collect()
    }

    #[test]
    fn frame_holds_half_the_window() {
        let samples = sine(440.0, 44100, 4096);
        let frame = SpectrumAnalyzer::new().analyze(&samples, 44100, 1024);
        assert_eq!(frame.magnitudes.len(), 512);
        assert_eq!(frame.sample_rate, 44100);
    }

    #[test]
    fn dominant_frequency_finds_a_pure_tone() {
        let samples = sine(1000.0, 44100, 8192);
        let frame = SpectrumAnalyzer::new().analyze(&samples, 44100, 1024);
        let dominant = SpectrumAnalyzer::dominant_frequency(&frame);
        // One bin is ~21.5 Hz wide at this window size
        assert!(
            (dominant - 1000.0).abs() < 30.0,
            "dominant {} too far from 1000",
            dominant
        );
    }

    #[test]
    fn stronger_tone_wins() {
        let sample_rate = 44100;
        let weak = sine(500.0, sample_rate, 4096);
        let strong = sine(2000.0, sample_rate, 4096);
        let mixed: Vec<f32> = weak
            .iter()
            .zip(&strong)
            .map(|(w, s)| 0.2 * w + 1.0 * s)
            .collect();

        let frame = SpectrumAnalyzer::new().analyze(&mixed, sample_rate, 2048);
        let dominant = SpectrumAnalyzer::dominant_frequency(&frame);
        assert!((dominant - 2000.0).abs() < 20.0);
    }

    #[test]
    fn short_input_is_left_padded() {
        let samples = sine(1000.0, 44100, 300);
        let frame = SpectrumAnalyzer::new().analyze(&samples, 44100, 1024);
        assert_eq!(frame.magnitudes.len(), 512);
        assert!(frame.magnitudes.iter().all(|m| m.is_finite()));
    }

    #[test]
    fn constant_signal_reports_no_dominant_frequency() {
        let samples = vec![0.5_f32; 2048];
        let frame = SpectrumAnalyzer::new().analyze(&samples, 44100, 1024);
        // DC removal leaves silence; argmax stays on the excluded bin 0
        assert_eq!(SpectrumAnalyzer::dominant_frequency(&frame), 0.0);
    }

    #[test]
    fn resolution_matches_the_bin_formula() {
        let frame = SpectrumFrame {
            magnitudes: vec![0.0; 512],
            sample_rate: 44100,
        };
        assert!((frame.frequency_resolution() - 44100.0 / 1024.0).abs() < 1e-3);
    }
}
