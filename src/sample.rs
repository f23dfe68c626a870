//! Sample Codec
//!
//! Stateless arithmetic between raw per-channel byte fields and normalized
//! `f64` values in `[-1.0, +1.0]`.
//!
//! A sample is one time-slice across all channels; each channel contributes
//! one slice of `bits_per_sample / 8` bytes. Decoding averages the channels
//! into a single value; encoding writes one value into every channel slice,
//! which collapses multi-channel audio written through this path to mono.
//!
//! Slices wider than one byte are two's-complement signed; single-byte
//! slices are unsigned, following the 8-bit wave convention. Both cases map
//! linearly between the full unsigned range of the slice width and
//! `[-1.0, +1.0]`.

/// All-ones value for a slice of `width` bytes (1..=8)
pub fn max_unsigned(width: usize) -> u64 {
    let mut value = 0u64;
    for i in 0..width {
        value |= 0xFF << (8 * i);
    }
    value
}

/// Largest representable signed magnitude for a slice of `width` bytes
pub fn max_signed(width: usize) -> u64 {
    !(1u64 << (width * 8 - 1)) & max_unsigned(width)
}

/// Fold a two's-complement bit pattern into the biased unsigned range
/// `[0, max_unsigned]`, where the most negative value maps to 0
///
/// The same fold, applied twice, is the identity: it is its own inverse, so
/// encoding reuses it to go from biased range back to the bit pattern.
fn bias_fold(raw: u64, width: usize) -> u64 {
    let offset = max_signed(width) + 1;
    if raw > max_signed(width) {
        raw - offset
    } else {
        raw + offset
    }
}

/// Decode one slice: assemble `width` little-endian bytes, unbiasing signed
/// patterns into `[0, max_unsigned]`
fn decode_slice(bytes: &[u8], width: usize, signed: bool) -> u64 {
    let mut raw = 0u64;
    for (i, &byte) in bytes.iter().take(width).enumerate() {
        raw |= u64::from(byte) << (8 * i);
    }

    if signed {
        bias_fold(raw, width)
    } else {
        raw
    }
}

/// Average all channel slices in `segment` and map to `[-1.0, +1.0]`
///
/// Only slices that fit entirely inside `segment` participate; a file whose
/// format section under-declares the block alignment yields a shorter
/// segment than `channels * width`, and the surplus channels are ignored
/// rather than read out of bounds. Returns 0.0 for degenerate geometry (no
/// channels, zero-width slices, or no slice fitting at all).
pub fn decode_average(segment: &[u8], channels: usize, width: usize, signed: bool) -> f64 {
    if channels == 0 || width == 0 {
        return 0.0;
    }
    let fitting = (segment.len() / width).min(channels);
    if fitting == 0 {
        return 0.0;
    }

    let mut total: u128 = 0;
    for ch in 0..fitting {
        total += u128::from(decode_slice(&segment[ch * width..], width, signed));
    }

    let average = total as f64 / fitting as f64;
    (average / max_unsigned(width) as f64) * 2.0 - 1.0
}

/// Encode a normalized value into every channel slice of `segment`
///
/// The value is mapped from `[-1.0, +1.0]` to `[0, max_unsigned]`, re-biased
/// into its two's-complement pattern when the slice is signed, then written
/// little-endian into each of the `channels` slices. As with decoding, only
/// slices that fit entirely inside `segment` are written.
pub fn encode_all_channels(
    value: f64,
    segment: &mut [u8],
    channels: usize,
    width: usize,
    signed: bool,
) {
    if channels == 0 || width == 0 {
        return;
    }
    let fitting = (segment.len() / width).min(channels);

    let mut pattern = ((value + 1.0) / 2.0 * max_unsigned(width) as f64) as u64;
    if signed {
        pattern = bias_fold(pattern, width);
    }

    for ch in 0..fitting {
        for (i, byte) in segment[ch * width..ch * width + width].iter_mut().enumerate() {
            *byte = (pattern >> (8 * i)) as u8;
        }
    }
}
