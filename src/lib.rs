//! Wavecore - RIFF/WAVE Container Core
//!
//! Wavecore reads and writes the chunk-structured RIFF/WAVE audio container
//! and exposes its raw PCM payload as a flat sequence of normalized `f64`
//! samples, whatever the file's channel count or bit depth.
//!
//! # Architecture
//!
//! - `wire`: little-endian integer codec, the only place byte order lives
//! - `chunk`: the section types (RIFF envelope, format, raw/unknown) and
//!   their word-alignment rules
//! - `sample`: arithmetic between channel-slice byte groups and normalized
//!   values
//! - `wave`: the container, orchestrating load/save and per-sample access
//!
//! # Example
//!
//! ```no_run
//! use wavecore::Wave;
//!
//! let mut wave = Wave::new();
//! wave.fmt.channels = 1;
//! wave.fmt.bits_per_sample = 16;
//!
//! wave.resize(10_000);
//! for i in 0..10_000 {
//!     wave.set_sample(i, (i as f64 / 50.0).sin());
//! }
//!
//! wave.save("tone.wav")?;
//! # Ok::<(), wavecore::WaveError>(())
//! ```

pub mod chunk;
pub mod error;
pub mod sample;
pub mod wave;
pub mod wire;

pub use error::{Result, WaveError};
pub use wave::{Wave, WaveInfo};
