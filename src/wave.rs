//! Wave Container
//!
//! Owns the three sections every wave file carries (RIFF envelope, format,
//! audio payload) plus any unrecognized sections encountered along the way,
//! and exposes normalized per-sample access over the raw payload.
//!
//! A container is default-constructed empty, populated by [`Wave::load`] or
//! [`Wave::load_metadata`], mutated through [`Wave::resize`] and
//! [`Wave::set_sample`], and serialized with [`Wave::save`]. File handles
//! live only for the duration of a single load or save call.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chunk::{DataChunk, FmtChunk, FourCc, RiffChunk};
use crate::error::{Result, WaveError};
use crate::sample;

/// A parsed wave file: envelope, format, audio payload, and pass-through
/// sections
///
/// `extras` holds every section the load loop did not recognize, in
/// encounter order, byte-for-byte; save re-emits them between the format
/// section and the audio payload.
#[derive(Debug, Clone, Default)]
pub struct Wave {
    pub riff: RiffChunk,
    pub fmt: FmtChunk,
    pub data: DataChunk,
    pub extras: Vec<DataChunk>,
}

/// Serializable summary of a container's header fields
///
/// This is what metadata-only loads exist for: callers inspect the encoding
/// parameters and derived sample count without paying for the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveInfo {
    pub file_size: u32,
    pub compression: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
    pub sample_count: u32,
}

impl Wave {
    /// Create an empty container with default header values
    /// (mono, 22050 Hz, 16-bit PCM, no payload)
    pub fn new() -> Self {
        Wave::default()
    }

    // ========================================================================
    // Load / Save
    // ========================================================================

    /// Load a wave file in full, payload included
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = open_for_read(path)?;
        let mut reader = BufReader::new(file);
        self.read_stream(&mut reader, path, true)
    }

    /// Load header sections only, skipping the audio payload without
    /// allocating for it
    ///
    /// The payload's declared size is still recorded, so
    /// [`Wave::sample_count`] and [`Wave::info`] report the file's real
    /// geometry; sample accessors see an empty buffer and return silence.
    pub fn load_metadata<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = open_for_read(path)?;
        let mut reader = BufReader::new(file);
        self.read_stream(&mut reader, path, false)
    }

    /// Write the container to `path`, truncating any existing file
    ///
    /// Size bookkeeping is recomputed first: the RIFF declared size from the
    /// section sizes, and the format section's derived fields from channel
    /// count, sample rate, and bit depth. Values loaded from a file are
    /// never trusted here.
    ///
    /// Extras are always written between the format section and the payload,
    /// whatever position they were loaded from; only their order relative to
    /// each other is preserved.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        self.update_riff_size();
        self.update_fmt_fields();

        self.riff.write_to(&mut writer)?;
        self.fmt.write_to(&mut writer)?;
        for extra in &self.extras {
            extra.write_to(&mut writer)?;
        }
        self.data.write_to(&mut writer)?;

        writer.flush()?;
        debug!(path = %path.display(), bytes = self.riff.header.size.saturating_add(8), "saved wave file");
        Ok(())
    }

    /// Shared load loop. Reads the envelope, then dispatches sections on
    /// their tag until the stream runs out.
    fn read_stream<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        path: &Path,
        load_data: bool,
    ) -> Result<()> {
        let tag = FourCc::read_from(reader).map_err(|_| WaveError::NotRiff {
            path: path.display().to_string(),
        })?;
        if tag != FourCc::RIFF {
            return Err(WaveError::NotRiff {
                path: path.display().to_string(),
            });
        }

        self.riff.read_from(reader)?;
        if self.riff.riff_type != FourCc::WAVE {
            return Err(WaveError::NotWave {
                path: path.display().to_string(),
            });
        }

        loop {
            // A clean end-of-file between sections terminates the loop.
            let tag = match FourCc::read_from(reader) {
                Ok(tag) => tag,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            };

            let read_result = match tag {
                FourCc::FMT => self.fmt.read_from(reader),
                FourCc::DATA => {
                    if load_data {
                        self.data.read_from(reader)
                    } else {
                        self.data.skip(reader)
                    }
                }
                other => {
                    let mut chunk = DataChunk::with_tag(other);
                    let result = chunk.read_from(reader);
                    if result.is_ok() || result.as_ref().is_err_and(is_truncation) {
                        self.extras.push(chunk);
                    }
                    result
                }
            };

            match read_result {
                Ok(()) => {}
                // A declared size larger than the remaining stream: keep
                // what was read and stop, as if the file simply ended.
                Err(e) if is_truncation(&e) => {
                    warn!(
                        path = %path.display(),
                        section = %tag,
                        "section body truncated: {e}"
                    );
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!(
            path = %path.display(),
            extras = self.extras.len(),
            samples = self.sample_count(),
            "loaded wave file"
        );
        Ok(())
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    /// Bytes per sample across all channels (the block alignment)
    fn bytes_per_sample(&self) -> usize {
        usize::from(self.fmt.block_align)
    }

    /// Bytes in a single channel's slice of one sample
    fn bytes_per_slice(&self) -> usize {
        usize::from(self.fmt.bits_per_sample / 8)
    }

    /// Number of samples in the audio payload
    pub fn sample_count(&self) -> u32 {
        if self.data.header.size == 0 || self.bytes_per_sample() == 0 {
            0
        } else {
            self.data.header.size / self.bytes_per_sample() as u32
        }
    }

    /// Reallocate the payload for `count` samples at the current format
    ///
    /// Existing sample content is not preserved; the buffer comes back
    /// zeroed and every sample must be re-populated.
    pub fn resize(&mut self, count: u32) {
        self.update_fmt_fields();
        let bytes = u64::from(count) * self.bytes_per_sample() as u64;
        self.data.set_len(u32::try_from(bytes).unwrap_or(u32::MAX));
    }

    // ========================================================================
    // Sample access
    // ========================================================================

    /// Read the sample at `offset` as a normalized value in `[-1.0, +1.0]`,
    /// averaged across channels
    ///
    /// Out-of-range offsets return 0.0 rather than signaling; so does a
    /// metadata-only container, whose payload was never materialized.
    pub fn get_sample(&self, offset: u32) -> f64 {
        if offset >= self.sample_count() {
            return 0.0;
        }

        let bps = self.bytes_per_sample();
        let start = offset as usize * bps;
        let Some(segment) = self.data.data().get(start..start + bps) else {
            return 0.0;
        };

        let width = self.bytes_per_slice();
        sample::decode_average(segment, usize::from(self.fmt.channels), width, width > 1)
    }

    /// Write a normalized value into every channel slice of the sample at
    /// `offset`
    ///
    /// Out-of-range offsets are a silent no-op. All channels receive the
    /// same value, so multi-channel audio written through this path becomes
    /// mono-duplicated.
    pub fn set_sample(&mut self, offset: u32, value: f64) {
        if offset >= self.sample_count() {
            return;
        }

        let bps = self.bytes_per_sample();
        let width = self.bytes_per_slice();
        let channels = usize::from(self.fmt.channels);
        let start = offset as usize * bps;
        let Some(segment) = self.data.data_mut().get_mut(start..start + bps) else {
            return;
        };

        sample::encode_all_channels(value, segment, channels, width, width > 1);
    }

    /// Decode the whole payload into a flat vector of normalized samples
    pub fn samples(&self) -> Vec<f64> {
        (0..self.sample_count()).map(|i| self.get_sample(i)).collect()
    }

    /// Resize to fit `values` and write them all
    pub fn set_samples(&mut self, values: &[f64]) {
        self.resize(values.len() as u32);
        for (i, &value) in values.iter().enumerate() {
            self.set_sample(i as u32, value);
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Summary of the header fields, as populated by the last load
    pub fn info(&self) -> WaveInfo {
        WaveInfo {
            file_size: self.riff.header.size.saturating_add(8),
            compression: self.fmt.compression,
            channels: self.fmt.channels,
            sample_rate: self.fmt.sample_rate,
            byte_rate: self.fmt.byte_rate,
            block_align: self.fmt.block_align,
            bits_per_sample: self.fmt.bits_per_sample,
            data_size: self.data.header.size,
            sample_count: self.sample_count(),
        }
    }

    // ========================================================================
    // Bookkeeping
    // ========================================================================

    /// Recompute the RIFF declared size from the current section sizes
    ///
    /// Saturating adds: corrupt section sizes can sum past u32 and the size
    /// field simply pins at its maximum instead of panicking.
    fn update_riff_size(&mut self) {
        // Header overhead for the riff, fmt, and data sections, plus the
        // 4-byte format-family tag.
        let mut total: u32 = 8 * 3 + 4;

        total = total.saturating_add(self.fmt.header.size);
        total = total.saturating_add(self.data.header.size);
        for extra in &self.extras {
            total = total.saturating_add(extra.header.size);
        }

        self.riff.header.size = total;
    }

    /// Rederive byte rate and block alignment from the primary fields
    ///
    /// Computed in widened types and saturated: a loaded file can carry a
    /// channel count whose true block alignment does not fit the 16-bit
    /// field, and that must not abort a save.
    fn update_fmt_fields(&mut self) {
        let slice = u32::from(self.fmt.bits_per_sample / 8);
        let block_align = u32::from(self.fmt.channels) * slice;
        self.fmt.block_align = u16::try_from(block_align).unwrap_or(u16::MAX);
        self.fmt.byte_rate = self.fmt.sample_rate.saturating_mul(block_align);
    }
}

impl fmt::Display for Wave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.info();
        writeln!(f, "WAV file info:")?;
        writeln!(f, "\tFile size: {}", info.file_size)?;
        writeln!(f, "\tCompression: {}", info.compression)?;
        writeln!(f, "\tChannels: {}", info.channels)?;
        writeln!(f, "\tSample rate: {}", info.sample_rate)?;
        writeln!(f, "\tBytes per second: {}", info.byte_rate)?;
        writeln!(f, "\tBlock align: {}", info.block_align)?;
        writeln!(f, "\tBits per sample: {}", info.bits_per_sample)?;
        write!(f, "\tData size: {}", info.data_size)
    }
}

/// True when an error means "the stream ended before the section did"
fn is_truncation(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::UnexpectedEof
}

fn open_for_read(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            WaveError::FileNotFound {
                path: path.display().to_string(),
                source: Some(e),
            }
        } else {
            WaveError::Io(e)
        }
    })
}
