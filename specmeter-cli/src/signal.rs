//! Test-signal synthesis.
//!
//! Stands in for the capture layer when no WAV file is given: generates a
//! few blocks of a known waveform so every reading the analyzer prints can
//! be checked by eye against the expected value.

use clap::ValueEnum;
use log::debug;
use std::f32::consts::PI;

/// Waveforms the driver can synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Waveform {
    /// Pure tone at the requested frequency
    Sine,
    /// Alternating full-swing square wave at the requested frequency
    Square,
    /// Single unit impulse at sample zero, silence after
    Impulse,
}

/// Generates `total` 16-bit samples of the requested waveform.
///
/// # Arguments
/// * `wave` - Waveform shape
/// * `total` - Number of samples to generate
/// * `sample_rate` - Sample rate in Hz
/// * `freq` - Tone frequency in Hz (ignored for the impulse)
/// * `amplitude` - Peak amplitude as a fraction of full scale, clamped to [0, 1]
pub fn synthesize(
    wave: Waveform,
    total: usize,
    sample_rate: u32,
    freq: f32,
    amplitude: f32,
) -> Vec<i16> {
    let peak = amplitude.clamp(0.0, 1.0) * i16::MAX as f32;
    let phase_delta = 2.0 * PI * freq / sample_rate as f32;

    debug!(
        "synthesizing {total} samples of {wave:?} at {freq} Hz, peak {}",
        peak as i16
    );

    match wave {
        Waveform::Sine => (0..total)
            .map(|i| (peak * (phase_delta * i as f32).sin()) as i16)
            .collect(),
        Waveform::Square => (0..total)
            .map(|i| {
                if (phase_delta * i as f32).sin() >= 0.0 {
                    peak as i16
                } else {
                    -peak as i16
                }
            })
            .collect(),
        Waveform::Impulse => {
            let mut samples = vec![0i16; total];
            if let Some(first) = samples.first_mut() {
                *first = peak as i16;
            }
            samples
        }
    }
}
