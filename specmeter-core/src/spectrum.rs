//! # Spectrum Transform Module
//!
//! This module computes one-sided magnitude spectra from blocks of real
//! audio samples using an iterative, in-place radix-2 decimation-in-time
//! FFT. It is the expensive half of the per-block analysis pipeline and is
//! written to run repeatedly without allocating.
//!
//! ## Features
//! - Power-of-two block sizes, validated at construction
//! - Preallocated working buffers and twiddle tables, reused across blocks
//! - Accepts normalized floats or signed 16-bit PCM input
//! - One-sided magnitude readout into a caller-supplied buffer

use log::debug;

use crate::errors::{DspError, Result};
use crate::samples;

/// A reusable spectrum analyzer for a fixed power-of-two block size.
///
/// One instance is created per desired block size and fed many blocks over
/// its lifetime. Analyzing a block is a three-step protocol:
///
/// 1. [`set_input`](Self::set_input) (or
///    [`set_input_i16`](Self::set_input_i16)) copies the block into the
///    internal buffers. This is the only step that reads the caller's
///    buffer, so when the source is a shared capture buffer a lock needs to
///    be held only across this cheap copy.
/// 2. [`transform`](Self::transform) runs the FFT in place.
/// 3. [`write_magnitudes`](Self::write_magnitudes) folds the complex result
///    into a one-sided magnitude spectrum.
///
/// A single instance is not synchronized; concurrent use requires external
/// locking. Independent instances share nothing and may run on separate
/// threads.
#[derive(Debug)]
pub struct SpectrumTransform {
    /// Block size N. Always a positive power of two.
    size: usize,
    /// log2(N), the number of butterfly passes.
    stages: u32,
    /// Working buffers, rewritten by every `set_input` call.
    real: Vec<f32>,
    imag: Vec<f32>,
    /// Precomputed `exp(-2*pi*i*p/size)` for `p` in `0..size/2`.
    cos_table: Vec<f32>,
    sin_table: Vec<f32>,
}

impl SpectrumTransform {
    /// Creates a transform for blocks of exactly `size` samples.
    ///
    /// All O(N) storage is allocated here so the per-block calls stay
    /// allocation-free.
    ///
    /// # Arguments
    /// * `size` - Block size in samples; must be a positive power of two
    ///
    /// # Returns
    /// * `Ok(transform)` - Ready-to-use analyzer
    /// * `Err(DspError::InvalidSize)` - `size` is zero or not a power of two
    pub fn new(size: usize) -> Result<Self> {
        if !size.is_power_of_two() {
            return Err(DspError::InvalidSize(size));
        }

        let half = size / 2;
        let mut cos_table = Vec::with_capacity(half);
        let mut sin_table = Vec::with_capacity(half);
        for p in 0..half {
            let angle = -2.0 * std::f64::consts::PI * p as f64 / size as f64;
            cos_table.push(angle.cos() as f32);
            sin_table.push(angle.sin() as f32);
        }

        debug!("created {size}-point spectrum transform");

        Ok(Self {
            size,
            stages: size.trailing_zeros(),
            real: vec![0.0; size],
            imag: vec![0.0; size],
            cos_table,
            sin_table,
        })
    }

    /// The configured block size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Length of the one-sided magnitude spectrum, `size / 2`.
    pub fn output_len(&self) -> usize {
        self.size / 2
    }

    /// Loads a block of normalized float samples.
    ///
    /// Copies the block into the real working buffer and clears the
    /// imaginary one. After this returns the caller's buffer may be reused
    /// or mutated freely.
    ///
    /// # Arguments
    /// * `samples` - Exactly `size` samples in [-1, 1]
    ///
    /// # Returns
    /// * `Err(DspError::SizeMismatch)` - The block length disagrees with
    ///   the configured size
    pub fn set_input(&mut self, samples: &[f32]) -> Result<()> {
        self.check_len(samples.len())?;
        self.real.copy_from_slice(samples);
        self.imag.fill(0.0);
        Ok(())
    }

    /// Loads a block of signed 16-bit PCM samples, scaling each into
    /// [-1, 1] on the way in. Otherwise identical to [`set_input`](Self::set_input).
    pub fn set_input_i16(&mut self, samples: &[i16]) -> Result<()> {
        self.check_len(samples.len())?;
        for (slot, &sample) in self.real.iter_mut().zip(samples) {
            *slot = samples::normalize(sample);
        }
        self.imag.fill(0.0);
        Ok(())
    }

    /// Runs the radix-2 decimation-in-time FFT in place.
    ///
    /// Each of the log2(N) passes halves the butterfly span (`N/2`, `N/4`,
    /// ... `1`). A butterfly combines elements `k` and `k + span` with the
    /// twiddle factor `exp(-2*pi*i*p/N)`, where `p` is the bit-reversal of
    /// `k >> (stages - pass)`; the twiddle index is constant within a
    /// group, so it is looked up once per group. A final bit-reversal
    /// permutation puts the buffer into natural frequency order.
    pub fn transform(&mut self) {
        if self.size <= 1 {
            return;
        }

        let stages = self.stages;
        for pass in 1..=stages {
            let half = self.size >> pass;
            let span = half << 1;
            for base in (0..self.size).step_by(span) {
                let p = bit_reverse(base >> (stages - pass), stages);
                let (cos, sin) = (self.cos_table[p], self.sin_table[p]);
                for k in base..base + half {
                    let t_re = cos * self.real[k + half] - sin * self.imag[k + half];
                    let t_im = sin * self.real[k + half] + cos * self.imag[k + half];
                    self.real[k + half] = self.real[k] - t_re;
                    self.imag[k + half] = self.imag[k] - t_im;
                    self.real[k] += t_re;
                    self.imag[k] += t_im;
                }
            }
        }

        // Reorder into natural frequency order. Swapping only upward avoids
        // undoing a swap already made.
        for k in 0..self.size {
            let swapped = bit_reverse(k, stages);
            if swapped > k {
                self.real.swap(k, swapped);
                self.imag.swap(k, swapped);
            }
        }
    }

    /// Writes the one-sided magnitude spectrum of the last transform.
    ///
    /// Bin 0 is the DC term, `|X[0]| / N`. Every other bin is doubled,
    /// `2 * |X[i]| / N`, to fold in the mirrored negative-frequency half of
    /// the real-input spectrum. Bin `i` covers the frequency band
    /// `i * sample_rate / N`.
    ///
    /// # Arguments
    /// * `out` - Destination buffer of exactly `size / 2` elements
    ///
    /// # Returns
    /// * `Err(DspError::SizeMismatch)` - The destination length is not
    ///   `size / 2`
    pub fn write_magnitudes(&self, out: &mut [f32]) -> Result<()> {
        let expected = self.size / 2;
        if out.len() != expected {
            return Err(DspError::SizeMismatch {
                expected,
                actual: out.len(),
            });
        }

        let scale = 1.0 / self.size as f32;
        for (i, slot) in out.iter_mut().enumerate() {
            let magnitude =
                (self.real[i] * self.real[i] + self.imag[i] * self.imag[i]).sqrt();
            *slot = if i == 0 {
                magnitude * scale
            } else {
                2.0 * magnitude * scale
            };
        }
        Ok(())
    }

    fn check_len(&self, actual: usize) -> Result<()> {
        if actual != self.size {
            return Err(DspError::SizeMismatch {
                expected: self.size,
                actual,
            });
        }
        Ok(())
    }
}

/// Reverses the low `bits` bits of `index`.
#[inline]
fn bit_reverse(index: usize, bits: u32) -> usize {
    index.reverse_bits() >> (usize::BITS - bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::{num_complex::Complex, FftPlanner};

    fn magnitudes(transform: &SpectrumTransform) -> Vec<f32> {
        let mut out = vec![0.0; transform.output_len()];
        transform.write_magnitudes(&mut out).unwrap();
        out
    }

    fn sine_block(size: usize, bin: usize, amplitude: f64) -> Vec<f32> {
        (0..size)
            .map(|n| {
                let phase = 2.0 * std::f64::consts::PI * bin as f64 * n as f64 / size as f64;
                (amplitude * phase.sin()) as f32
            })
            .collect()
    }

    /// Deterministic pseudo-random block in [-1, 1).
    fn noise_block(len: usize) -> Vec<f32> {
        let mut state = 0x2545_f491u32;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / 8_388_608.0 - 1.0
            })
            .collect()
    }

    #[test]
    fn rejects_non_power_of_two_sizes() {
        assert_eq!(
            SpectrumTransform::new(100).unwrap_err(),
            DspError::InvalidSize(100)
        );
        assert_eq!(
            SpectrumTransform::new(0).unwrap_err(),
            DspError::InvalidSize(0)
        );
        assert!(SpectrumTransform::new(128).is_ok());
    }

    #[test]
    fn rejects_mismatched_buffers() {
        let mut transform = SpectrumTransform::new(128).unwrap();
        assert_eq!(
            transform.set_input(&vec![0.0; 100]).unwrap_err(),
            DspError::SizeMismatch {
                expected: 128,
                actual: 100
            }
        );

        let mut short_out = vec![0.0; 100];
        assert_eq!(
            transform.write_magnitudes(&mut short_out).unwrap_err(),
            DspError::SizeMismatch {
                expected: 64,
                actual: 100
            }
        );
    }

    #[test]
    fn impulse_has_flat_spectrum() {
        let size = 64;
        let mut transform = SpectrumTransform::new(size).unwrap();
        let mut block = vec![0.0; size];
        block[0] = 1.0;
        transform.set_input(&block).unwrap();
        transform.transform();

        let spectrum = magnitudes(&transform);
        assert!((spectrum[0] - 1.0 / size as f32).abs() < 1e-6);
        for &bin in &spectrum[1..] {
            assert!((bin - 2.0 / size as f32).abs() < 1e-6);
        }
    }

    #[test]
    fn dc_block_concentrates_in_bin_zero() {
        let mut transform = SpectrumTransform::new(64).unwrap();
        transform.set_input(&vec![0.25; 64]).unwrap();
        transform.transform();

        let spectrum = magnitudes(&transform);
        assert!((spectrum[0] - 0.25).abs() < 1e-6);
        for &bin in &spectrum[1..] {
            assert!(bin.abs() < 1e-5);
        }
    }

    #[test]
    fn pure_sine_peaks_at_its_bin() {
        let size = 1024;
        let bin = 100;
        let mut transform = SpectrumTransform::new(size).unwrap();
        transform.set_input(&sine_block(size, bin, 0.8)).unwrap();
        transform.transform();

        let spectrum = magnitudes(&transform);
        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(peak, bin);
        assert!((spectrum[bin] - 0.8).abs() < 1e-3);
        for (i, &value) in spectrum.iter().enumerate() {
            if i != bin {
                assert!(value < 1e-3, "unexpected leakage {value} in bin {i}");
            }
        }
    }

    #[test]
    fn i16_input_is_normalized() {
        let mut transform = SpectrumTransform::new(32).unwrap();
        transform.set_input_i16(&[16384; 32]).unwrap();
        transform.transform();

        let spectrum = magnitudes(&transform);
        assert!((spectrum[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn two_tone_energy_is_conserved() {
        // Discrete Parseval identity, folded for the one-sided output:
        // sum(x^2) == N*m[0]^2 + N/2 * sum(m[1..]^2) when the signal has no
        // Nyquist-bin content.
        let size = 512;
        let block: Vec<f32> = sine_block(size, 5, 0.5)
            .iter()
            .zip(&sine_block(size, 20, 0.25))
            .map(|(a, b)| a + b)
            .collect();

        let mut transform = SpectrumTransform::new(size).unwrap();
        transform.set_input(&block).unwrap();
        transform.transform();
        let spectrum = magnitudes(&transform);

        let time_energy: f64 = block.iter().map(|&s| (s as f64) * (s as f64)).sum();
        let freq_energy = size as f64 * (spectrum[0] as f64).powi(2)
            + size as f64 / 2.0
                * spectrum[1..]
                    .iter()
                    .map(|&m| (m as f64) * (m as f64))
                    .sum::<f64>();

        let relative = (time_energy - freq_energy).abs() / time_energy;
        assert!(relative < 1e-3, "energy mismatch: {relative}");
    }

    #[test]
    fn matches_reference_fft() {
        let size = 256;
        let block = noise_block(size);

        let mut transform = SpectrumTransform::new(size).unwrap();
        transform.set_input(&block).unwrap();
        transform.transform();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let mut reference: Vec<Complex<f32>> = block
            .iter()
            .map(|&sample| Complex { re: sample, im: 0.0 })
            .collect();
        fft.process(&mut reference);

        for k in 0..size {
            assert!(
                (transform.real[k] - reference[k].re).abs() < 2e-2,
                "re mismatch in bin {k}"
            );
            assert!(
                (transform.imag[k] - reference[k].im).abs() < 2e-2,
                "im mismatch in bin {k}"
            );
        }
    }

    #[test]
    fn set_input_resets_previous_state() {
        let size = 64;
        let mut transform = SpectrumTransform::new(size).unwrap();
        let mut impulse = vec![0.0; size];
        impulse[0] = 1.0;
        transform.set_input(&impulse).unwrap();
        transform.transform();

        transform.set_input(&vec![0.0; size]).unwrap();
        transform.transform();
        assert!(magnitudes(&transform).iter().all(|&bin| bin == 0.0));
    }
}
