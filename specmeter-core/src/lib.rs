// specmeter-core/src/lib.rs

//! The core signal-processing toolkit for the block-oriented audio meter.
//! This crate turns blocks of raw PCM samples into magnitude spectra and
//! scalar level estimates. It is completely headless and contains no
//! capture or UI code; callers own the sample buffers and feed one block
//! at a time.

pub mod errors;
pub mod level;
pub mod samples;
pub mod spectrum;

pub use errors::{DspError, Result};
pub use spectrum::SpectrumTransform;

use serde::{Deserialize, Serialize};

/// Represents the result of analyzing a single sample block.
///
/// The level statistics and the spectrum come from independent components;
/// this record is how a caller carries them together to a display or a
/// serializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockAnalysis {
    /// Overall signal power, 1.0 = full scale, -0.5 = silence floor.
    pub power_db: f32,
    /// DC bias (mean sample value) of the block.
    pub bias: f32,
    /// Half the peak-to-peak span of the block.
    pub range: f32,
    /// One-sided magnitude spectrum, one entry per frequency bin.
    pub spectrum: Vec<f32>,
}
