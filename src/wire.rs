//! Little-Endian Wire Codec
//!
//! Fixed-width unsigned integer reads and writes over any `Read`/`Write`
//! stream, in little-endian byte order. Every multi-byte field in the
//! container format goes through these helpers, so byte order is decided in
//! exactly one place.
//!
//! Widths of 1 through 8 bytes are supported. Writes truncate the value to
//! the requested width rather than range-checking it; reads that hit the end
//! of the stream mid-value surface `ErrorKind::UnexpectedEof` so callers can
//! tell a truncated field from a clean end-of-file.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Mask covering the low `width` bytes of a u64
#[inline]
fn width_mask(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (width * 8)) - 1
    }
}

/// Read an unsigned integer of `width` bytes (1..=8), little-endian
pub fn read_uint<R: Read>(reader: &mut R, width: usize) -> io::Result<u64> {
    debug_assert!((1..=8).contains(&width));
    reader.read_uint::<LittleEndian>(width)
}

/// Write the low `width` bytes (1..=8) of `value`, little-endian
///
/// Bits above the requested width are discarded, matching the wire format's
/// "caller controls the field width" contract.
pub fn write_uint<W: Write>(writer: &mut W, value: u64, width: usize) -> io::Result<()> {
    debug_assert!((1..=8).contains(&width));
    writer.write_uint::<LittleEndian>(value & width_mask(width), width)
}

/// Read a little-endian u16
pub fn read_u16<R: Read>(reader: &mut R) -> io::Result<u16> {
    Ok(read_uint(reader, 2)? as u16)
}

/// Read a little-endian u32
pub fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    Ok(read_uint(reader, 4)? as u32)
}

/// Write a little-endian u16
pub fn write_u16<W: Write>(writer: &mut W, value: u16) -> io::Result<()> {
    write_uint(writer, u64::from(value), 2)
}

/// Write a little-endian u32
pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    write_uint(writer, u64::from(value), 4)
}
