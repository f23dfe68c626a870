//! Container Integration Tests
//!
//! End-to-end coverage over real files: load/save round trips, save
//! idempotence, unknown-section pass-through, metadata-only loads, and the
//! failure modes a malformed file can trigger.

use std::fs;
use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use wavecore::chunk::FourCc;
use wavecore::{Wave, WaveError};

/// Append one section: tag, little-endian size, payload, pad byte if odd
fn push_chunk(out: &mut Vec<u8>, tag: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(tag);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
}

/// A 16-byte fmt payload with every field spelled out, for files whose
/// derived fields are deliberately wrong
fn fmt_payload_raw(
    compression: u16,
    channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
    bits: u16,
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&compression.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out
}

/// Standard 16-byte fmt payload with consistent derived fields
fn fmt_payload(compression: u16, channels: u16, sample_rate: u32, bits: u16) -> Vec<u8> {
    let block_align = channels * (bits / 8);
    let byte_rate = sample_rate * u32::from(block_align);
    fmt_payload_raw(compression, channels, sample_rate, byte_rate, block_align, bits)
}

/// Wrap hand-built section bytes in the RIFF/WAVE envelope
fn wrap_riff(body: &[u8]) -> Vec<u8> {
    let mut file = Vec::new();
    file.extend_from_slice(b"RIFF");
    file.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
    file.extend_from_slice(b"WAVE");
    file.extend_from_slice(body);
    file
}

/// A minimal well-formed mono 16-bit file with the given data payload and
/// any extra sections spliced in between fmt and data
fn build_wave_file(data: &[u8], extras: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    push_chunk(&mut body, b"fmt ", &fmt_payload(1, 1, 22050, 16));
    for (tag, payload) in extras {
        push_chunk(&mut body, tag, payload);
    }
    push_chunk(&mut body, b"data", data);
    wrap_riff(&body)
}

fn write_temp(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_save_load_round_trip_preserves_samples() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.wav");

    let mut original = Wave::new();
    original.fmt.channels = 2;
    original.fmt.sample_rate = 44100;
    original.fmt.bits_per_sample = 16;
    original.resize(500);
    for i in 0..500 {
        original.set_sample(i, (i as f64 / 25.0).sin() * 0.9);
    }
    original.save(&path).unwrap();

    let mut reloaded = Wave::new();
    reloaded.load(&path).unwrap();

    assert_eq!(reloaded.fmt, original.fmt);
    assert_eq!(reloaded.sample_count(), 500);

    let step = 2.0 / 65535.0;
    for i in 0..500 {
        assert_abs_diff_eq!(
            reloaded.get_sample(i),
            original.get_sample(i),
            epsilon = step
        );
    }
}

#[test]
fn test_save_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("a.wav");
    let second = dir.path().join("b.wav");

    let mut wave = Wave::new();
    wave.resize(101); // odd byte count exercises the pad path on 8-bit
    wave.fmt.bits_per_sample = 8;
    wave.resize(101);
    for i in 0..101 {
        wave.set_sample(i, (i as f64 / 10.0).cos());
    }

    wave.save(&first).unwrap();
    wave.save(&second).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_save_load_save_is_byte_stable() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.wav");
    let second = dir.path().join("second.wav");

    let mut wave = Wave::new();
    wave.fmt.sample_rate = 8000;
    wave.resize(200);
    for i in 0..200 {
        wave.set_sample(i, (i as f64 * 0.03).sin());
    }
    wave.save(&first).unwrap();

    let mut reloaded = Wave::new();
    reloaded.load(&first).unwrap();
    reloaded.save(&second).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

// ============================================================================
// Unknown-section pass-through
// ============================================================================

#[test]
fn test_unknown_section_preserved_and_data_unharmed() {
    let dir = TempDir::new().unwrap();
    let cue_payload = [0xDE, 0xAD, 0xBE, 0xEF, 0x01];
    let samples = [0x34, 0x12, 0x78, 0x56];
    let bytes = build_wave_file(&samples, &[(b"cue ", &cue_payload)]);
    let path = write_temp(&dir, "cue.wav", &bytes);

    let mut wave = Wave::new();
    wave.load(&path).unwrap();

    assert_eq!(wave.extras.len(), 1);
    assert_eq!(wave.extras[0].header.tag, FourCc::new(*b"cue "));
    assert_eq!(wave.extras[0].header.size, 5);
    // aligned buffer: payload plus the zero pad byte
    assert_eq!(wave.extras[0].data(), &[0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x00]);

    // the data section after the odd-sized extra parsed cleanly
    assert_eq!(wave.data.header.size, 4);
    assert_eq!(wave.data.data(), &samples);
}

#[test]
fn test_extras_re_emitted_in_order_before_data() {
    let dir = TempDir::new().unwrap();
    let bytes = build_wave_file(&[0, 0], &[(b"cue ", &[1, 2]), (b"list", &[3, 4, 5, 6])]);
    let path = write_temp(&dir, "multi.wav", &bytes);

    let mut wave = Wave::new();
    wave.load(&path).unwrap();
    assert_eq!(wave.extras.len(), 2);

    let dest = dir.path().join("out.wav");
    wave.save(&dest).unwrap();
    let written = fs::read(&dest).unwrap();

    let cue_pos = written.windows(4).position(|w| w == b"cue ").unwrap();
    let list_pos = written.windows(4).position(|w| w == b"list").unwrap();
    let data_pos = written.windows(4).position(|w| w == b"data").unwrap();
    assert!(cue_pos < list_pos);
    assert!(list_pos < data_pos);
}

#[test]
fn test_extra_after_data_moves_before_data_on_save() {
    let dir = TempDir::new().unwrap();

    // hand-build: fmt, data, then a trailing extra
    let mut body = Vec::new();
    push_chunk(&mut body, b"fmt ", &fmt_payload(1, 1, 22050, 16));
    push_chunk(&mut body, b"data", &[1, 0, 2, 0]);
    push_chunk(&mut body, b"tail", &[7, 8]);
    let path = write_temp(&dir, "tail.wav", &wrap_riff(&body));

    let mut wave = Wave::new();
    wave.load(&path).unwrap();
    assert_eq!(wave.extras.len(), 1);
    assert_eq!(wave.extras[0].header.tag, FourCc::new(*b"tail"));

    let dest = dir.path().join("out.wav");
    wave.save(&dest).unwrap();
    let written = fs::read(&dest).unwrap();

    let tail_pos = written.windows(4).position(|w| w == b"tail").unwrap();
    let data_pos = written.windows(4).position(|w| w == b"data").unwrap();
    assert!(tail_pos < data_pos, "extras always precede the payload");
}

// ============================================================================
// Metadata-only loads
// ============================================================================

#[test]
fn test_load_metadata_reports_geometry_without_payload() {
    let dir = TempDir::new().unwrap();
    let samples: Vec<u8> = vec![0x55; 400];
    let path = write_temp(&dir, "meta.wav", &build_wave_file(&samples, &[]));

    let mut full = Wave::new();
    full.load(&path).unwrap();

    let mut meta = Wave::new();
    meta.load_metadata(&path).unwrap();

    assert_eq!(meta.info(), full.info());
    assert_eq!(meta.sample_count(), 200);
    assert!(meta.data.data().is_empty());
    // accessors see silence rather than panicking on the missing buffer
    assert_eq!(meta.get_sample(0), 0.0);
}

#[test]
fn test_load_metadata_still_collects_extras() {
    let dir = TempDir::new().unwrap();
    let bytes = build_wave_file(&[0, 0], &[(b"note", b"hello")]);
    let path = write_temp(&dir, "note.wav", &bytes);

    let mut meta = Wave::new();
    meta.load_metadata(&path).unwrap();
    assert_eq!(meta.extras.len(), 1);
    assert_eq!(&meta.extras[0].data()[..5], b"hello");
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn test_missing_file_is_reported() {
    let mut wave = Wave::new();
    let err = wave.load("/nonexistent/nowhere.wav").unwrap_err();
    assert!(matches!(err, WaveError::FileNotFound { .. }));
}

#[test]
fn test_non_riff_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_temp(&dir, "bad.wav", b"MP3 data, definitely not riff");

    let mut wave = Wave::new();
    let err = wave.load(&path).unwrap_err();
    assert!(matches!(err, WaveError::NotRiff { .. }));
    // container untouched beyond defaults
    assert_eq!(wave.sample_count(), 0);
}

#[test]
fn test_riff_but_not_wave_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&4u32.to_le_bytes());
    bytes.extend_from_slice(b"AVI ");
    let path = write_temp(&dir, "avi.wav", &bytes);

    let mut wave = Wave::new();
    let err = wave.load(&path).unwrap_err();
    assert!(matches!(err, WaveError::NotWave { .. }));
}

#[test]
fn test_oversized_declared_size_truncates_quietly() {
    let dir = TempDir::new().unwrap();

    // data section claims 1000 bytes but the file ends after 4
    let mut body = Vec::new();
    push_chunk(&mut body, b"fmt ", &fmt_payload(1, 1, 22050, 16));
    body.extend_from_slice(b"data");
    body.extend_from_slice(&1000u32.to_le_bytes());
    body.extend_from_slice(&[0x11, 0x22, 0x33, 0x44]);
    let path = write_temp(&dir, "trunc.wav", &wrap_riff(&body));

    let mut wave = Wave::new();
    // local recovery: the load terminates as if at end-of-file
    wave.load(&path).unwrap();

    assert_eq!(wave.fmt.sample_rate, 22050);
    assert_eq!(wave.data.header.size, 1000);
    assert_eq!(&wave.data.data()[..4], &[0x11, 0x22, 0x33, 0x44]);
}

#[test]
fn test_compressed_file_loads_with_warning() {
    let dir = TempDir::new().unwrap();
    let mut body = Vec::new();
    // compression code 85 (MP3), not PCM
    push_chunk(&mut body, b"fmt ", &fmt_payload(85, 2, 44100, 16));
    push_chunk(&mut body, b"data", &[0; 8]);
    let path = write_temp(&dir, "mp3.wav", &wrap_riff(&body));

    let mut wave = Wave::new();
    wave.load(&path).unwrap();

    // load continues; fields are populated even though decoding would be
    // meaningless
    assert_eq!(wave.fmt.compression, 85);
    assert_eq!(wave.fmt.channels, 2);
    assert_eq!(wave.data.header.size, 8);
}

#[test]
fn test_understated_block_align_does_not_panic() {
    let dir = TempDir::new().unwrap();

    // fmt claims 3 channels of 16-bit audio but a block alignment of only
    // 2 bytes, so each sample segment holds just one slice
    let mut body = Vec::new();
    push_chunk(
        &mut body,
        b"fmt ",
        &fmt_payload_raw(1, 3, 22050, 44100, 2, 16),
    );
    let slice = 12345i16.to_le_bytes();
    push_chunk(&mut body, b"data", &slice);
    let path = write_temp(&dir, "narrow.wav", &wrap_riff(&body));

    let mut wave = Wave::new();
    wave.load(&path).unwrap();
    assert_eq!(wave.sample_count(), 1);

    // the channels that don't fit the segment are ignored, not indexed
    let step = 2.0 / 65535.0;
    let expected = (12345.0 + 32768.0) / 65535.0 * 2.0 - 1.0;
    assert_abs_diff_eq!(wave.get_sample(0), expected, epsilon = step);

    wave.set_sample(0, 0.5);
    assert_abs_diff_eq!(wave.get_sample(0), 0.5, epsilon = step);
}

#[test]
fn test_oversized_channel_count_saturates_on_save() {
    let dir = TempDir::new().unwrap();

    // 40000 channels of 16-bit audio: the true block alignment (80000)
    // does not fit the 16-bit field
    let mut body = Vec::new();
    push_chunk(
        &mut body,
        b"fmt ",
        &fmt_payload_raw(1, 40000, 44100, 176400, 4, 16),
    );
    push_chunk(&mut body, b"data", &[0; 8]);
    let path = write_temp(&dir, "wide.wav", &wrap_riff(&body));

    let mut wave = Wave::new();
    wave.load(&path).unwrap();
    assert_eq!(wave.fmt.channels, 40000);

    // bookkeeping saturates instead of overflowing
    let dest = dir.path().join("out.wav");
    wave.save(&dest).unwrap();
    assert_eq!(wave.fmt.block_align, u16::MAX);

    let mut reloaded = Wave::new();
    reloaded.load(&dest).unwrap();
    assert_eq!(reloaded.fmt.block_align, u16::MAX);
    // one sample no longer fits the payload; accessors stay silent
    assert_eq!(reloaded.sample_count(), 0);
    assert_eq!(reloaded.get_sample(0), 0.0);
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_info_serializes() {
    let mut wave = Wave::new();
    wave.resize(10);
    let info = wave.info();

    let json = serde_json::to_string(&info).unwrap();
    let back: wavecore::WaveInfo = serde_json::from_str(&json).unwrap();
    assert_eq!(back, info);
    assert_eq!(back.sample_count, 10);
}
