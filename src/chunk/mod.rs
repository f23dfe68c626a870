//! Chunk Model
//!
//! A wave file is a sequence of tagged, length-prefixed sections: the RIFF
//! envelope, the format section, the data section, and any number of sections
//! this library does not interpret. Each section shares the same 8-byte
//! prefix (4-byte tag + 4-byte declared size) and each is word aligned on
//! disk: a section with an odd declared size carries one trailing zero pad
//! byte that is not counted by the size field.
//!
//! Dispatch on the tag happens one level up, in the container's load loop,
//! so `read_from` on every section here starts at the declared-size field.

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::wire;

// ============================================================================
// FourCc
// ============================================================================

/// A four-character section tag, stored as the little-endian u32 it occupies
/// on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FourCc(pub u32);

impl FourCc {
    /// The RIFF envelope tag
    pub const RIFF: FourCc = FourCc::new(*b"RIFF");
    /// The WAVE format-family tag carried inside the RIFF envelope
    pub const WAVE: FourCc = FourCc::new(*b"WAVE");
    /// The format section tag
    pub const FMT: FourCc = FourCc::new(*b"fmt ");
    /// The audio payload tag
    pub const DATA: FourCc = FourCc::new(*b"data");

    /// Build a tag from its four ASCII bytes
    pub const fn new(bytes: [u8; 4]) -> Self {
        FourCc(u32::from_le_bytes(bytes))
    }

    /// The tag's four bytes in on-disk order
    pub const fn as_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(FourCc(wire::read_u32(reader)?))
    }

    pub fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()> {
        wire::write_u32(writer, self.0)
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.as_bytes() {
            let c = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '?'
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

// ============================================================================
// ChunkHeader
// ============================================================================

/// The common 8-byte section prefix
///
/// `size` counts only the payload bytes that follow the header; it excludes
/// the header itself and any alignment pad byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: FourCc,
    pub size: u32,
}

impl ChunkHeader {
    pub fn new(tag: FourCc, size: u32) -> Self {
        ChunkHeader { tag, size }
    }

    /// Read the declared size. The tag was already consumed by the
    /// dispatcher that decided which section type to construct.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.size = wire::read_u32(reader)?;
        Ok(())
    }

    /// Write tag then size
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.tag.write_to(writer)?;
        wire::write_u32(writer, self.size)
    }
}

// ============================================================================
// RiffChunk
// ============================================================================

/// The outer RIFF envelope: header plus the format-family tag
///
/// The format-family tag must be `WAVE` for the file to be accepted; the
/// container checks it right after reading this section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiffChunk {
    pub header: ChunkHeader,
    pub riff_type: FourCc,
}

/// Declared size of an empty default file: format-family tag + fmt and data
/// headers + the default fmt payload
pub const DEFAULT_RIFF_SIZE: u32 = 4 + 8 + FMT_CHUNK_SIZE + 8;

impl Default for RiffChunk {
    fn default() -> Self {
        RiffChunk {
            header: ChunkHeader::new(FourCc::RIFF, DEFAULT_RIFF_SIZE),
            riff_type: FourCc::WAVE,
        }
    }
}

impl RiffChunk {
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.header.read_from(reader)?;
        self.riff_type = FourCc::read_from(reader)?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.header.write_to(writer)?;
        self.riff_type.write_to(writer)
    }
}

// ============================================================================
// FmtChunk
// ============================================================================

/// Compression code for uncompressed PCM, the only encoding supported
pub const COMPRESSION_NONE: u16 = 1;

/// On-disk payload size of the format section
pub const FMT_CHUNK_SIZE: u32 = 16;

const DEFAULT_CHANNELS: u16 = 1;
const DEFAULT_SAMPLE_RATE: u32 = 22050;
const DEFAULT_BITS_PER_SAMPLE: u16 = 16;

/// The format section: how the audio payload is encoded
///
/// `block_align` and `byte_rate` are derived from the other fields and are
/// recomputed by the container before every save; values loaded from a file
/// are never trusted when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmtChunk {
    pub header: ChunkHeader,
    pub compression: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl Default for FmtChunk {
    fn default() -> Self {
        let block_align = DEFAULT_CHANNELS * (DEFAULT_BITS_PER_SAMPLE / 8);
        FmtChunk {
            header: ChunkHeader::new(FourCc::FMT, FMT_CHUNK_SIZE),
            compression: COMPRESSION_NONE,
            channels: DEFAULT_CHANNELS,
            sample_rate: DEFAULT_SAMPLE_RATE,
            byte_rate: DEFAULT_SAMPLE_RATE * u32::from(block_align),
            block_align,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
        }
    }
}

impl FmtChunk {
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.header.read_from(reader)?;

        self.compression = wire::read_u16(reader)?;
        self.channels = wire::read_u16(reader)?;
        self.sample_rate = wire::read_u32(reader)?;
        self.byte_rate = wire::read_u32(reader)?;
        self.block_align = wire::read_u16(reader)?;
        self.bits_per_sample = wire::read_u16(reader)?;

        if self.compression != COMPRESSION_NONE {
            tracing::warn!(
                compression = self.compression,
                "compressed wave data is not supported; samples will decode as if PCM"
            );
        }

        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.header.write_to(writer)?;

        wire::write_u16(writer, self.compression)?;
        wire::write_u16(writer, self.channels)?;
        wire::write_u32(writer, self.sample_rate)?;
        wire::write_u32(writer, self.byte_rate)?;
        wire::write_u16(writer, self.block_align)?;
        wire::write_u16(writer, self.bits_per_sample)
    }
}

// ============================================================================
// DataChunk
// ============================================================================

/// A section whose payload is an opaque, owned byte buffer
///
/// This is both the audio payload (`data` tag) and the catch-all for any
/// section tag the container does not interpret; unrecognized sections are
/// held byte-for-byte so a later save can re-emit them unchanged.
///
/// Invariant: the buffer's length equals the declared size rounded up to
/// even, and when the size is odd the final byte is the zero pad byte. The
/// declared size itself is never rounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataChunk {
    pub header: ChunkHeader,
    data: Vec<u8>,
}

impl Default for DataChunk {
    fn default() -> Self {
        DataChunk {
            header: ChunkHeader::new(FourCc::DATA, 0),
            data: Vec::new(),
        }
    }
}

impl DataChunk {
    /// An empty chunk carrying an arbitrary tag, for unrecognized sections
    pub fn with_tag(tag: FourCc) -> Self {
        DataChunk {
            header: ChunkHeader::new(tag, 0),
            data: Vec::new(),
        }
    }

    /// Payload bytes including the pad byte, exactly as written to disk
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// The buffer length for a declared size: rounded up to even
    ///
    /// Widened before rounding so a corrupt all-ones size cannot overflow.
    pub fn aligned_len(size: u32) -> usize {
        (u64::from(size) + u64::from(size % 2)) as usize
    }

    /// Drop any previous payload and allocate a zeroed, word-aligned buffer
    /// for `size` payload bytes
    ///
    /// The zero fill covers the pad-byte invariant for odd sizes.
    pub fn set_len(&mut self, size: u32) {
        self.header.size = size;
        self.data = vec![0; Self::aligned_len(size)];
    }

    /// Read size and payload, consuming the pad byte so the stream cursor
    /// lands on the next section header
    ///
    /// On a declared size that exceeds the remaining stream, the bytes that
    /// could be read are kept (the rest of the buffer stays zeroed) and
    /// `ErrorKind::UnexpectedEof` is returned so the caller can decide how
    /// loud to be about the truncation.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> io::Result<()> {
        self.header.read_from(reader)?;
        self.set_len(self.header.size);

        let filled = read_full(reader, &mut self.data)?;
        if filled < self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "section '{}' declares {} bytes but only {} were available",
                    self.header.tag, self.header.size, filled
                ),
            ));
        }
        Ok(())
    }

    /// Read only the size, then advance the stream past the aligned payload
    /// without allocating
    ///
    /// Used for metadata-only loads. Afterwards the declared size reflects
    /// the file but the in-memory buffer is empty; sample accessors treat
    /// the missing payload as silence.
    pub fn skip<R: Read + Seek>(&mut self, reader: &mut R) -> io::Result<()> {
        self.data.clear();
        self.header.read_from(reader)?;
        reader.seek(SeekFrom::Current(Self::aligned_len(self.header.size) as i64))?;
        Ok(())
    }

    /// Write tag, size, and the exact aligned buffer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.header.write_to(writer)?;
        writer.write_all(&self.data)
    }
}

/// Read until `buf` is full or the stream ends, returning the bytes obtained
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
