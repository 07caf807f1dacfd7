//! MOD file parser

use crate::error::ModError;
use crate::module::{ModModule, ModNote, ModPattern, ModSample};
use crate::{HEADER_SIZE, MAX_ORDERS, NUM_SAMPLES, ROWS_PER_PATTERN, TAG_OFFSET, channels_for_tag};

/// Options controlling how much of the file is decoded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip copying sample PCM (headers are still read)
    pub skip_samples: bool,
    /// Skip decoding pattern cells (patterns are returned empty)
    pub skip_patterns: bool,
}

/// Parse a MOD file, decoding patterns and sample data
pub fn parse_mod(data: &[u8]) -> Result<ModModule, ModError> {
    parse_mod_with(data, &ParseOptions::default())
}

/// Parse a MOD file with explicit [`ParseOptions`]
pub fn parse_mod_with(data: &[u8], options: &ParseOptions) -> Result<ModModule, ModError> {
    if data.len() < HEADER_SIZE {
        return Err(ModError::TooSmall(data.len()));
    }

    let mut tag = [0u8; 4];
    tag.copy_from_slice(&data[TAG_OFFSET..TAG_OFFSET + 4]);
    let num_channels = channels_for_tag(&tag).ok_or(ModError::UnknownTag(tag))?;

    let mut warnings = Vec::new();
    let title = read_string(&data[0..20]);

    // Sample headers: 31 x 30 bytes starting at offset 20
    let mut samples = Vec::with_capacity(NUM_SAMPLES);
    let mut lengths = Vec::with_capacity(NUM_SAMPLES);
    for header in data[20..20 + NUM_SAMPLES * 30].chunks_exact(30) {
        let (sample, length) = read_sample_header(header);
        samples.push(sample);
        lengths.push(length);
    }

    let song_length = data[950];
    if song_length == 0 || song_length as usize > MAX_ORDERS {
        return Err(ModError::InvalidSongLength(song_length));
    }
    let restart_position = data[951];
    let all_orders = &data[952..952 + MAX_ORDERS];
    let order_table = all_orders[..song_length as usize].to_vec();

    let pattern_size = ROWS_PER_PATTERN as usize * num_channels as usize * 4;
    let available = data.len() - HEADER_SIZE;

    // ProTracker stores every pattern referenced anywhere in the 128-entry
    // table; fall back to the played part when the file is too short for that.
    let mut num_patterns = all_orders.iter().copied().max().unwrap_or(0) as usize + 1;
    if num_patterns * pattern_size > available {
        let played = order_table.iter().copied().max().unwrap_or(0) as usize + 1;
        if played < num_patterns {
            warnings.push(format!(
                "order table references {} patterns beyond the file; using {}",
                num_patterns - played,
                played
            ));
            num_patterns = played;
        }
    }
    let needed = num_patterns * pattern_size;
    if needed > available {
        return Err(ModError::TruncatedPatterns { needed, available });
    }

    let pattern_bytes = &data[HEADER_SIZE..HEADER_SIZE + needed];
    let patterns = pattern_bytes
        .chunks_exact(pattern_size)
        .map(|chunk| {
            if options.skip_patterns {
                ModPattern::empty(num_channels)
            } else {
                decode_pattern(chunk, num_channels)
            }
        })
        .collect();

    // Sample data follows the patterns back to back
    let mut offset = HEADER_SIZE + needed;
    for (index, (sample, length)) in samples.iter_mut().zip(lengths).enumerate() {
        let remaining = data.len().saturating_sub(offset);
        if length > remaining {
            warnings.push(format!(
                "sample {}: {} of {} bytes present",
                index + 1,
                remaining,
                length
            ));
        }
        let take = length.min(remaining);

        if !options.skip_samples {
            sample.data = widen_pcm(&data[offset..offset + take])?;
        }
        offset += take;
    }

    Ok(ModModule {
        title,
        tag,
        num_channels,
        samples,
        restart_position,
        order_table,
        patterns,
        warnings,
    })
}

/// Read one 30-byte sample header, returning the sample and its data length in bytes
fn read_sample_header(header: &[u8]) -> (ModSample, usize) {
    let word = |i: usize| u16::from_be_bytes([header[i], header[i + 1]]) as u32 * 2;

    let length = word(22);
    // Low nibble is a signed 4-bit value
    let finetune = ((header[24] & 0x0F) << 4) as i8 >> 4;
    let volume = header[25].min(64);
    let mut loop_start = word(26);
    let mut loop_length = word(28);

    if loop_start >= length {
        loop_start = 0;
        loop_length = 0;
    } else if loop_start + loop_length > length {
        loop_length = length - loop_start;
    }

    let sample = ModSample {
        name: read_string(&header[0..22]),
        finetune,
        volume,
        loop_start,
        loop_length,
        data: Vec::new(),
    };
    (sample, length as usize)
}

fn decode_pattern(chunk: &[u8], num_channels: u8) -> ModPattern {
    let row_size = num_channels as usize * 4;
    let rows = chunk
        .chunks_exact(row_size)
        .map(|row| {
            row.chunks_exact(4)
                .map(|cell| ModNote::from_bytes([cell[0], cell[1], cell[2], cell[3]]))
                .collect()
        })
        .collect();
    ModPattern { rows }
}

fn widen_pcm(bytes: &[u8]) -> Result<Vec<i16>, ModError> {
    let mut pcm = Vec::new();
    pcm.try_reserve_exact(bytes.len())
        .map_err(|_| ModError::OutOfMemory(bytes.len() * 2))?;
    pcm.extend(bytes.iter().map(|&b| (b as i8 as i16) * 256));
    Ok(pcm)
}

fn read_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len])
        .trim_end()
        .to_string()
}
