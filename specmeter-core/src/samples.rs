//! Sample-format helpers shared by the spectrum and level paths.

/// Maximum representable amplitude of signed 16-bit PCM. A sample divided
/// by this lands in [-1.0, 1.0).
pub const FULL_SCALE: f32 = 32768.0;

/// Scales a signed 16-bit sample into the normalized [-1, 1] range.
#[inline]
pub fn normalize(sample: i16) -> f32 {
    sample as f32 / FULL_SCALE
}

/// Scales a whole 16-bit block into a freshly allocated float block.
pub fn normalize_block(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| normalize(s)).collect()
}
