//! # Level Estimation Module
//!
//! Cheap O(N) signal statistics computed fresh per block: DC bias,
//! peak-to-peak range and an overall power estimate in decibels relative to
//! full scale. Everything here is a stateless free function, safe to call
//! from any thread, and meant to run on every block ahead of (and
//! independently from) the spectrum transform.
//!
//! Both sample formats that cross the API boundary are supported: signed
//! 16-bit PCM (full scale 32768, summed exactly in integers) and normalized
//! floats in [-1, 1] (full scale 1.0, summed in f64).

use crate::errors::{DspError, Result};
use crate::samples::FULL_SCALE;

/// Fractional power at or below this value reads as silence. It sits around
/// -150 dBFS, under the 16-bit quantization floor at analysis block sizes
/// (a single +-1 sample in a 32768-sample block still carries ~3e-14), so
/// the clamp does not mask real signals. It also absorbs the tiny negative
/// power a float rounding error can leave behind in the bias-correction
/// term. With this floor an all-zero block reports -0.5 instead of negative
/// infinity.
const POWER_FLOOR: f64 = 1e-15;

/// Converts a fractional power in (0, 1] to the decibel-style level value.
///
/// The mapping is `1 + log10(p) / 10`: full power reads 1.0, every 10 dB of
/// attenuation subtracts 0.1, and -100 dBFS lands at 0. The upstream
/// callers historically carried two cosmetically different spellings of
/// this formula; this is the single shared implementation.
fn power_to_db(power: f64) -> f32 {
    (1.0 + power.max(POWER_FLOOR).log10() / 10.0) as f32
}

/// Computes the DC bias and half the peak-to-peak range of a float block.
///
/// A single scan tracks the running sum, minimum and maximum. The bias is
/// the mean sample value; the range is half the span between the
/// bias-corrected extremes, which reduces to `(max - min) / 2`. A constant
/// block therefore reports its value as bias and a range of zero.
///
/// # Arguments
/// * `samples` - Non-empty block of normalized samples
///
/// # Returns
/// * `Ok((bias, range))` - Mean value and half peak-to-peak span
/// * `Err(DspError::EmptyInput)` - The block is empty
pub fn bias_and_range(samples: &[f32]) -> Result<(f32, f32)> {
    if samples.is_empty() {
        return Err(DspError::EmptyInput);
    }

    let mut sum = 0.0f64;
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &sample in samples {
        sum += f64::from(sample);
        min = min.min(sample);
        max = max.max(sample);
    }

    let bias = (sum / samples.len() as f64) as f32;
    Ok((bias, (max - min) / 2.0))
}

/// 16-bit PCM variant of [`bias_and_range`]. The sum is accumulated in
/// integers, so the bias is exact up to the final division.
pub fn bias_and_range_i16(samples: &[i16]) -> Result<(f32, f32)> {
    if samples.is_empty() {
        return Err(DspError::EmptyInput);
    }

    let mut sum: i64 = 0;
    let mut min = i16::MAX;
    let mut max = i16::MIN;
    for &sample in samples {
        sum += i64::from(sample);
        min = min.min(sample);
        max = max.max(sample);
    }

    let bias = (sum as f64 / samples.len() as f64) as f32;
    Ok((bias, (f32::from(max) - f32::from(min)) / 2.0))
}

/// Estimates the power of a float block in decibels relative to full scale.
///
/// Uses the single-pass bias-corrected sum of squares,
/// `sum(v^2) - sum(v)^2 / count`, so a DC offset does not register as
/// power and no separate bias-removal pass is needed. The result is
/// normalized by the block length (full scale is 1.0 for normalized input)
/// and mapped through [`power_to_db`]: a full-amplitude square wave reads
/// 1.0, silence reads the documented -0.5 floor.
///
/// # Arguments
/// * `samples` - Non-empty block of normalized samples
///
/// # Returns
/// * `Ok(db)` - Level value, at most 1.0 for in-range input
/// * `Err(DspError::EmptyInput)` - The block is empty
pub fn power_db(samples: &[f32]) -> Result<f32> {
    if samples.is_empty() {
        return Err(DspError::EmptyInput);
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for &sample in samples {
        let v = f64::from(sample);
        sum += v;
        sum_sq += v * v;
    }

    let count = samples.len() as f64;
    let power = sum_sq - sum * sum / count;
    Ok(power_to_db(power / count))
}

/// 16-bit PCM variant of [`power_db`], normalized by a full scale of
/// 32768. Both running sums stay exact in i64 for any realistic block
/// length (the squared sum overflows only past ~8.5 billion full-scale
/// samples).
pub fn power_db_i16(samples: &[i16]) -> Result<f32> {
    if samples.is_empty() {
        return Err(DspError::EmptyInput);
    }

    let mut sum: i64 = 0;
    let mut sum_sq: i64 = 0;
    for &sample in samples {
        let v = i64::from(sample);
        sum += v;
        sum_sq += v * v;
    }

    let count = samples.len() as f64;
    let power = sum_sq as f64 - (sum as f64) * (sum as f64) / count;
    let full_scale = f64::from(FULL_SCALE);
    Ok(power_to_db(power / (full_scale * full_scale * count)))
}
