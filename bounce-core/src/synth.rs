//! # Tone Synthesis Module
//!
//! Turns a collision into sound: additive synthesis over the instrument's
//! harmonic profile, shaped by a closed-form ADSR envelope.
//!
//! ## Features
//! - Additive harmonic synthesis from per-instrument amplitude sets
//! - Closed-form ADSR envelope (no event-driven state machine)
//! - Impact-position to frequency mapping with playful random jitter
//! - Fixed output attenuation to keep summed harmonics from clipping

use rand::Rng;

use crate::config::AdsrConfig;
use crate::instrument::InstrumentType;

/// Fixed attenuation applied to every synthesized sample.
const MASTER_ATTENUATION: f32 = 0.1;

/// A synthesized block of audio samples.
///
/// Created per synthesis call and discarded after playback/analysis.
#[derive(Debug, Clone)]
pub struct WaveformBuffer {
    /// Interleaved mono samples.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl WaveformBuffer {
    /// Buffer duration in seconds.
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Synthesizes instrument tones for collision events.
#[derive(Debug, Clone)]
pub struct ToneSynthesizer {
    sample_rate: u32,
    adsr: AdsrConfig,
}

impl ToneSynthesizer {
    /// Creates a synthesizer for the given sample rate and envelope shape.
    pub fn new(sample_rate: u32, adsr: AdsrConfig) -> Self {
        Self { sample_rate, adsr }
    }

    /// The sample rate this synthesizer renders at.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Renders a tone at `freq` Hz for `duration` seconds.
    ///
    /// Each sample is the sum over the instrument's harmonics
    /// `amplitude[h] * sin(2π * freq * (h + 1) * t)`, multiplied by the
    /// ADSR envelope and the fixed attenuation. The output always has
    /// exactly `round(duration * sample_rate)` samples and contains no
    /// NaN/infinite values for positive frequencies.
    pub fn synthesize(
        &self,
        freq: f32,
        instrument: InstrumentType,
        duration: f32,
    ) -> WaveformBuffer {
        let sample_count = (duration * self.sample_rate as f32).round() as usize;
        let harmonics = &instrument.profile().harmonics;

        let mut samples = Vec::with_capacity(sample_count);
        for i in 0..sample_count {
            let time = i as f32 / self.sample_rate as f32;

            let mut sample = 0.0_f32;
            for (h, &amplitude) in harmonics.iter().enumerate() {
                let harmonic_freq = freq * (h as f32 + 1.0);
                sample += amplitude * (std::f32::consts::TAU * harmonic_freq * time).sin();
            }

            let envelope = envelope_value(&self.adsr, time, duration);
            samples.push(sample * envelope * MASTER_ATTENUATION);
        }

        WaveformBuffer {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Maps an impact height to a frequency inside the instrument's range.
    ///
    /// `normalized_y` is clamped to [0, 1]; 0 is the bottom of the arena
    /// (lowest pitch), 1 the top. A uniform random jitter in [0.9, 1.1]
    /// keeps repeated hits at the same height from sounding identical.
    pub fn frequency_from_position(
        &self,
        instrument: InstrumentType,
        normalized_y: f32,
    ) -> f32 {
        self.frequency_from_position_with(instrument, normalized_y, &mut rand::thread_rng())
    }

    /// Like [`ToneSynthesizer::frequency_from_position`] but with a caller
    /// supplied RNG, so tests can seed the jitter.
    pub fn frequency_from_position_with<R: Rng>(
        &self,
        instrument: InstrumentType,
        normalized_y: f32,
        rng: &mut R,
    ) -> f32 {
        let profile = instrument.profile();
        let t = normalized_y.clamp(0.0, 1.0);
        let frequency = profile.min_freq + (profile.max_freq - profile.min_freq) * t;
        frequency * rng.gen_range(0.9..1.1)
    }
}

/// Evaluates the ADSR envelope at `time` within a note of `duration` seconds.
///
/// Piecewise linear: attack ramp 0 -> 1, decay ramp 1 -> sustain, flat
/// sustain, then a release ramp over the final `release_fraction` of the
/// note. At `time == 0` the value is 0 and at the end of the attack it is 1.
pub fn envelope_value(adsr: &AdsrConfig, time: f32, duration: f32) -> f32 {
    let release = duration * adsr.release_fraction;

    if time < adsr.attack {
        time / adsr.attack
    } else if time < adsr.attack + adsr.decay {
        1.0 - ((time - adsr.attack) / adsr.decay) * (1.0 - adsr.sustain)
    } else if time < duration - release {
        adsr.sustain
    } else {
        adsr.sustain * (duration - time) / release
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn synth() -> ToneSynthesizer {
        ToneSynthesizer::new(44100, AdsrConfig::default())
    }

    #[test]
    fn output_length_is_rounded_duration_times_rate() {
        let buffer = synth().synthesize(440.0, InstrumentType::Piano, 0.5);
        assert_eq!(buffer.samples.len(), 22050);

        let buffer = synth().synthesize(440.0, InstrumentType::Piano, 0.01);
        assert_eq!(buffer.samples.len(), 441);
    }

    #[test]
    fn samples_are_finite_and_bounded_by_harmonic_sum() {
        for instrument in InstrumentType::ALL {
            let amplitude_sum: f32 = instrument.profile().harmonics.iter().sum();
            let bound = amplitude_sum * 0.1 + 1e-5;

            let buffer = synth().synthesize(261.63, instrument, 0.5);
            for &sample in &buffer.samples {
                assert!(sample.is_finite());
                assert!(sample.abs() <= bound, "{} exceeds {}", sample, bound);
            }
        }
    }

    #[test]
    fn envelope_breakpoints_match_the_original_constants() {
        let adsr = AdsrConfig::default();
        let duration = 0.5;

        assert_eq!(envelope_value(&adsr, 0.0, duration), 0.0);
        // End of attack: full level
        assert!((envelope_value(&adsr, 0.1, duration) - 1.0).abs() < 1e-6);
        // End of decay: sustain level
        assert!((envelope_value(&adsr, 0.3, duration) - 0.7).abs() < 1e-5);
        // Mid sustain (release starts at 0.35 for a 0.5 s note)
        assert!((envelope_value(&adsr, 0.34, duration) - 0.7).abs() < 1e-6);
        // End of note: silence
        assert!(envelope_value(&adsr, 0.5, duration).abs() < 1e-6);
    }

    #[test]
    fn envelope_release_is_a_fraction_of_duration() {
        let adsr = AdsrConfig::default();
        // For a 2 s note the release window is 0.6 s, so the ramp starts at 1.4 s
        let mid_release = envelope_value(&adsr, 1.7, 2.0);
        assert!((mid_release - 0.35).abs() < 1e-5);
    }

    #[test]
    fn position_maps_linearly_across_the_instrument_range() {
        // rng jitter fixed by seed; verify bounds instead of exact values
        let synth = synth();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let top = synth.frequency_from_position_with(InstrumentType::Drums, 1.0, &mut rng);
            assert!((180.0..220.0).contains(&top), "{} out of jitter range", top);

            let bottom =
                synth.frequency_from_position_with(InstrumentType::Drums, 0.0, &mut rng);
            assert!((54.0..66.0).contains(&bottom), "{} out of jitter range", bottom);
        }
    }

    #[test]
    fn position_is_clamped_to_the_arena() {
        let synth = synth();
        let mut rng = StdRng::seed_from_u64(7);
        let above = synth.frequency_from_position_with(InstrumentType::Flute, 2.0, &mut rng);
        assert!(above <= 2093.0 * 1.1);
        let below = synth.frequency_from_position_with(InstrumentType::Flute, -1.0, &mut rng);
        assert!(below >= 262.0 * 0.9);
    }

    #[test]
    fn zero_frequency_produces_silence() {
        let buffer = synth().synthesize(0.0, InstrumentType::Piano, 0.1);
        assert!(buffer.samples.iter().all(|s| *s == 0.0));
    }
}
