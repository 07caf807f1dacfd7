//! XM file parsing and reading functions

use std::io::{Cursor, Read, Seek, SeekFrom};

use crate::error::XmError;
use crate::module::{XmEnvelope, XmInstrument, XmModule, XmNote, XmPattern, XmSample};
use crate::{
    MAX_CHANNELS, MAX_INSTRUMENTS, MAX_PATTERN_ROWS, MAX_PATTERNS, MAX_SAMPLES_PER_INSTRUMENT,
    SAMPLE_MAP_SIZE, XM_MAGIC, XM_VERSION,
};

/// Size of a sample header as written by FastTracker 2
const SAMPLE_HEADER_SIZE: u32 = 40;

/// Offset (from the start of an instrument header) just past the fadeout field
const EXTENDED_HEADER_END: u32 = 241;

/// Options controlling how much of the file is decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip decoding sample PCM (headers are still read)
    pub skip_samples: bool,
    /// Skip unpacking pattern data (patterns are returned empty)
    pub skip_patterns: bool,
}

/// Parse an XM file into an XmModule, decoding patterns and sample data
///
/// # Example
/// ```ignore
/// let xm_data = std::fs::read("song.xm")?;
/// let module = parse_xm(&xm_data)?;
/// println!("Loaded: {}", module.name);
/// ```
pub fn parse_xm(data: &[u8]) -> Result<XmModule, XmError> {
    parse_xm_with(data, &ParseOptions::default())
}

/// Parse an XM file with explicit [`ParseOptions`]
pub fn parse_xm_with(data: &[u8], options: &ParseOptions) -> Result<XmModule, XmError> {
    if data.len() < 60 {
        return Err(XmError::TooSmall);
    }

    if &data[0..17] != XM_MAGIC {
        return Err(XmError::InvalidMagic);
    }

    let mut cursor = Cursor::new(data);
    let mut warnings = Vec::new();

    cursor.seek(SeekFrom::Start(17))?;

    // Module name (20 bytes, null-terminated)
    let mut name_bytes = [0u8; 20];
    cursor.read_exact(&mut name_bytes)?;
    let name = read_string(&name_bytes);

    // 0x1A marker
    cursor.seek(SeekFrom::Current(1))?;

    // Tracker name (20 bytes)
    let mut tracker_bytes = [0u8; 20];
    cursor.read_exact(&mut tracker_bytes)?;
    let tracker_name = read_string(&tracker_bytes);

    let version = read_u16(&mut cursor)?;
    if version != XM_VERSION {
        return Err(XmError::UnsupportedVersion(version));
    }

    // header_size is measured from the position of this field itself (offset 60)
    let header_start = cursor.position();
    let header_size = read_u32(&mut cursor)?;
    if header_size < 20 {
        return Err(XmError::InvalidHeaderSize);
    }

    let mut song_length = read_u16(&mut cursor)?;
    let restart_position = read_u16(&mut cursor)?;

    let raw_channels = read_u16(&mut cursor)?;
    if raw_channels == 0 || raw_channels > MAX_CHANNELS as u16 {
        return Err(XmError::TooManyChannels(raw_channels.min(255) as u8));
    }
    let num_channels = raw_channels as u8;

    let num_patterns = read_u16(&mut cursor)?;
    if num_patterns > MAX_PATTERNS {
        return Err(XmError::TooManyPatterns(num_patterns));
    }

    let num_instruments = read_u16(&mut cursor)?;
    if num_instruments > MAX_INSTRUMENTS {
        return Err(XmError::TooManyInstruments(num_instruments));
    }

    let flags = read_u16(&mut cursor)?;
    let linear_frequency_table = (flags & 1) != 0;

    let default_speed = read_u16(&mut cursor)?;
    let default_bpm = read_u16(&mut cursor)?;

    // Pattern order table (256 bytes)
    let mut order_table = vec![0u8; 256];
    cursor.read_exact(&mut order_table)?;
    if song_length > 256 {
        warnings.push(format!("song length {} clamped to 256", song_length));
        song_length = 256;
    }
    order_table.truncate(song_length as usize);

    cursor.seek(SeekFrom::Start(header_start + header_size as u64))?;

    let mut patterns = Vec::with_capacity(num_patterns as usize);
    for pattern_idx in 0..num_patterns {
        let pattern = parse_pattern(&mut cursor, num_channels, options.skip_patterns)
            .map_err(|_| XmError::InvalidPattern(pattern_idx))?;
        patterns.push(pattern);
    }

    let mut instruments = Vec::with_capacity(num_instruments as usize);
    for instr_idx in 0..num_instruments {
        let instrument = parse_instrument(&mut cursor, instr_idx, options, &mut warnings)?;
        instruments.push(instrument);
    }

    Ok(XmModule {
        name,
        tracker_name,
        num_channels,
        num_patterns,
        num_instruments,
        song_length,
        restart_position,
        default_speed,
        default_bpm,
        linear_frequency_table,
        order_table,
        patterns,
        instruments,
        warnings,
    })
}

/// Parse a single pattern from the cursor
pub(crate) fn parse_pattern(
    cursor: &mut Cursor<&[u8]>,
    num_channels: u8,
    skip_data: bool,
) -> Result<XmPattern, XmError> {
    // Pattern header length INCLUDES the 4-byte length field itself
    let header_start = cursor.position();
    let header_length = read_u32(cursor)?;

    // Packing type (1 byte) - always 0
    let _packing_type = read_u8(cursor)?;

    let num_rows = read_u16(cursor)?;
    if num_rows == 0 || num_rows > MAX_PATTERN_ROWS {
        return Err(XmError::InvalidPattern(0));
    }

    let packed_size = read_u16(cursor)?;

    cursor.seek(SeekFrom::Start(header_start + header_length as u64))?;

    if packed_size == 0 || skip_data {
        cursor.seek(SeekFrom::Current(packed_size as i64))?;
        return Ok(XmPattern::empty(num_rows, num_channels));
    }

    let pattern_start = cursor.position();
    let mut notes = Vec::with_capacity(num_rows as usize);
    for _ in 0..num_rows {
        let mut row = Vec::with_capacity(num_channels as usize);
        for _ in 0..num_channels {
            row.push(unpack_note(cursor)?);
        }
        notes.push(row);
    }

    // Seek to end of pattern data in case we didn't read it all
    cursor.seek(SeekFrom::Start(pattern_start + packed_size as u64))?;

    Ok(XmPattern { num_rows, notes })
}

/// Unpack a single note from the pattern data
pub(crate) fn unpack_note(cursor: &mut Cursor<&[u8]>) -> Result<XmNote, XmError> {
    let first_byte = read_u8(cursor)?;

    if first_byte & 0x80 != 0 {
        // Packed format - first byte indicates which fields are present
        let mut note = XmNote::default();

        if first_byte & 0x01 != 0 {
            note.note = read_u8(cursor)?;
        }
        if first_byte & 0x02 != 0 {
            note.instrument = read_u8(cursor)?;
        }
        if first_byte & 0x04 != 0 {
            note.volume = read_u8(cursor)?;
        }
        if first_byte & 0x08 != 0 {
            note.effect = read_u8(cursor)?;
        }
        if first_byte & 0x10 != 0 {
            note.effect_param = read_u8(cursor)?;
        }

        Ok(note)
    } else {
        // Unpacked format - 5 bytes in sequence
        Ok(XmNote {
            note: first_byte,
            instrument: read_u8(cursor)?,
            volume: read_u8(cursor)?,
            effect: read_u8(cursor)?,
            effect_param: read_u8(cursor)?,
        })
    }
}

/// Header fields of one sample, before its data is read
struct SampleHeader {
    length_bytes: u32,
    sample: XmSample,
}

/// Parse a single instrument, its sample headers and its sample data
pub(crate) fn parse_instrument(
    cursor: &mut Cursor<&[u8]>,
    index: u16,
    options: &ParseOptions,
    warnings: &mut Vec<String>,
) -> Result<XmInstrument, XmError> {
    let header_start = cursor.position();
    let header_size = read_u32(cursor).map_err(|_| XmError::InvalidInstrument(index))?;
    let header_end = header_start + header_size.max(4) as u64;

    if header_size < 29 {
        cursor.seek(SeekFrom::Start(header_end))?;
        return Ok(XmInstrument::default());
    }

    let (mut instrument, num_samples) = read_instrument_header(cursor, header_size)
        .map_err(|_| XmError::InvalidInstrument(index))?;
    cursor.seek(SeekFrom::Start(header_end))?;

    if num_samples == 0 {
        return Ok(instrument);
    }

    let sample_header_size = instrument_sample_header_size(cursor, header_start, header_size)?;

    let mut headers = Vec::with_capacity(num_samples);
    for sample_idx in 0..num_samples {
        let header = read_sample_header(cursor, sample_header_size)
            .map_err(|_| XmError::InvalidSample(index, sample_idx as u8))?;
        headers.push(header);
    }

    for (sample_idx, header) in headers.into_iter().enumerate() {
        let SampleHeader {
            length_bytes,
            mut sample,
        } = header;

        let start = cursor.position() as usize;
        let data = *cursor.get_ref();
        let available = data.len().saturating_sub(start);
        let wanted = length_bytes as usize;

        if wanted > available {
            warnings.push(format!(
                "instrument {} sample {}: {} of {} data bytes present",
                index + 1,
                sample_idx,
                available,
                wanted
            ));
        }
        let take = wanted.min(available);

        if !options.skip_samples {
            let bytes = data.get(start..start + take).unwrap_or(&[]);
            sample.data = decode_sample_data(bytes, sample.is_16bit)?;
        }
        cursor.seek(SeekFrom::Current(take as i64))?;
        instrument.samples.push(sample);
    }

    Ok(instrument)
}

/// Read the fixed instrument header fields following the size field
///
/// Returns the instrument (without samples) and its declared sample count.
fn read_instrument_header(
    cursor: &mut Cursor<&[u8]>,
    header_size: u32,
) -> Result<(XmInstrument, usize), XmError> {
    let mut name_bytes = [0u8; 22];
    cursor.read_exact(&mut name_bytes)?;
    let name = read_string(&name_bytes);

    // Instrument type (1 byte) - always 0
    let _instrument_type = read_u8(cursor)?;

    let num_samples = read_u16(cursor)?;
    if num_samples > MAX_SAMPLES_PER_INSTRUMENT as u16 {
        return Err(XmError::InvalidHeaderSize);
    }

    let num_samples = num_samples as usize;
    let mut instrument = XmInstrument {
        name,
        samples: Vec::with_capacity(num_samples),
        ..Default::default()
    };

    if num_samples == 0 || header_size < EXTENDED_HEADER_END {
        return Ok((instrument, num_samples));
    }

    // Sample header size, re-read by the caller once the header is skipped
    let _sample_header_size = read_u32(cursor)?;

    let mut sample_map = [0u8; SAMPLE_MAP_SIZE];
    cursor.read_exact(&mut sample_map)?;
    instrument.sample_map = sample_map;

    let mut vol_points = Vec::with_capacity(12);
    for _ in 0..12 {
        let x = read_u16(cursor)?;
        let y = read_u16(cursor)?;
        vol_points.push((x, y));
    }

    let mut pan_points = Vec::with_capacity(12);
    for _ in 0..12 {
        let x = read_u16(cursor)?;
        let y = read_u16(cursor)?;
        pan_points.push((x, y));
    }

    let num_vol_points = read_u8(cursor)?.min(12);
    let num_pan_points = read_u8(cursor)?.min(12);

    let vol_sustain = read_u8(cursor)?;
    let vol_loop_start = read_u8(cursor)?;
    let vol_loop_end = read_u8(cursor)?;

    let pan_sustain = read_u8(cursor)?;
    let pan_loop_start = read_u8(cursor)?;
    let pan_loop_end = read_u8(cursor)?;

    let vol_type = read_u8(cursor)?;
    let pan_type = read_u8(cursor)?;

    instrument.vibrato_type = read_u8(cursor)?;
    instrument.vibrato_sweep = read_u8(cursor)?;
    instrument.vibrato_depth = read_u8(cursor)?;
    instrument.vibrato_rate = read_u8(cursor)?;

    instrument.volume_fadeout = read_u16(cursor)?;

    if num_vol_points > 0 {
        vol_points.truncate(num_vol_points as usize);
        instrument.volume_envelope = Some(XmEnvelope {
            points: vol_points,
            sustain_point: vol_sustain,
            loop_start: vol_loop_start,
            loop_end: vol_loop_end,
            enabled: (vol_type & 1) != 0,
            sustain_enabled: (vol_type & 2) != 0,
            loop_enabled: (vol_type & 4) != 0,
        });
    }

    if num_pan_points > 0 {
        pan_points.truncate(num_pan_points as usize);
        instrument.panning_envelope = Some(XmEnvelope {
            points: pan_points,
            sustain_point: pan_sustain,
            loop_start: pan_loop_start,
            loop_end: pan_loop_end,
            enabled: (pan_type & 1) != 0,
            sustain_enabled: (pan_type & 2) != 0,
            loop_enabled: (pan_type & 4) != 0,
        });
    }

    Ok((instrument, num_samples))
}

/// Sample header size declared in the instrument header (40 when absent or bogus)
fn instrument_sample_header_size(
    cursor: &mut Cursor<&[u8]>,
    header_start: u64,
    header_size: u32,
) -> Result<u32, XmError> {
    if header_size < 33 {
        return Ok(SAMPLE_HEADER_SIZE);
    }
    let resume = cursor.position();
    cursor.seek(SeekFrom::Start(header_start + 29))?;
    let size = read_u32(cursor)?;
    cursor.seek(SeekFrom::Start(resume))?;
    Ok(size.max(SAMPLE_HEADER_SIZE))
}

fn read_sample_header(
    cursor: &mut Cursor<&[u8]>,
    header_size: u32,
) -> Result<SampleHeader, XmError> {
    let length_bytes = read_u32(cursor)?;
    let loop_start_bytes = read_u32(cursor)?;
    let loop_length_bytes = read_u32(cursor)?;
    let volume = read_u8(cursor)?.min(64);
    let finetune = read_u8(cursor)? as i8;
    let sample_type = read_u8(cursor)?;
    let panning = read_u8(cursor)?;
    let relative_note = read_u8(cursor)? as i8;

    // Reserved (1 byte)
    let _reserved = read_u8(cursor)?;

    let mut name_bytes = [0u8; 22];
    cursor.read_exact(&mut name_bytes)?;
    let name = read_string(&name_bytes);

    if header_size > SAMPLE_HEADER_SIZE {
        cursor.seek(SeekFrom::Current((header_size - SAMPLE_HEADER_SIZE) as i64))?;
    }

    let is_16bit = (sample_type & 0x10) != 0;
    let width = if is_16bit { 2 } else { 1 };
    let frames = length_bytes / width;

    let mut loop_type = match sample_type & 0x03 {
        0 => 0,
        1 => 1,
        _ => 2,
    };
    let loop_start = (loop_start_bytes / width).min(frames);
    let loop_length = (loop_length_bytes / width).min(frames - loop_start);
    if loop_length == 0 {
        loop_type = 0;
    }

    Ok(SampleHeader {
        length_bytes,
        sample: XmSample {
            name,
            loop_start,
            loop_length,
            volume,
            finetune,
            loop_type,
            is_16bit,
            panning,
            relative_note,
            data: Vec::new(),
        },
    })
}

/// Decode delta-encoded sample data to i16 PCM
///
/// 8-bit samples are scaled to the full 16-bit range.
pub(crate) fn decode_sample_data(bytes: &[u8], is_16bit: bool) -> Result<Vec<i16>, XmError> {
    let frames = if is_16bit { bytes.len() / 2 } else { bytes.len() };
    let mut samples = Vec::new();
    samples
        .try_reserve_exact(frames)
        .map_err(|_| XmError::OutOfMemory(frames * 2))?;

    if is_16bit {
        let mut old = 0i16;
        for pair in bytes.chunks_exact(2) {
            old = old.wrapping_add(i16::from_le_bytes([pair[0], pair[1]]));
            samples.push(old);
        }
    } else {
        let mut old = 0i8;
        for &byte in bytes {
            old = old.wrapping_add(byte as i8);
            samples.push((old as i16) * 256);
        }
    }

    Ok(samples)
}

/// Get list of instrument names from an XM file without decoding samples
pub fn get_instrument_names(data: &[u8]) -> Result<Vec<String>, XmError> {
    let options = ParseOptions {
        skip_samples: true,
        skip_patterns: true,
    };
    let module = parse_xm_with(data, &options)?;
    Ok(module.instruments.into_iter().map(|i| i.name).collect())
}

// =============================================================================
// Helper functions for reading data
// =============================================================================

pub(crate) fn read_u8(cursor: &mut Cursor<&[u8]>) -> Result<u8, XmError> {
    let mut buf = [0u8; 1];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| XmError::UnexpectedEof)?;
    Ok(buf[0])
}

pub(crate) fn read_u16(cursor: &mut Cursor<&[u8]>) -> Result<u16, XmError> {
    let mut buf = [0u8; 2];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| XmError::UnexpectedEof)?;
    Ok(u16::from_le_bytes(buf))
}

pub(crate) fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, XmError> {
    let mut buf = [0u8; 4];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| XmError::UnexpectedEof)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len])
        .trim_end()
        .to_string()
}
