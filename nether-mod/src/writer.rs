//! MOD file writer

use crate::module::{ModModule, ModPattern, ModSample};
use crate::{MAX_ORDERS, NUM_SAMPLES, ROWS_PER_PATTERN, tag_for_channels};

/// Serialize a module to MOD bytes
///
/// The tag is derived from `num_channels`. Samples beyond 31 are dropped;
/// missing slots are written empty. Odd-length sample data is padded by one
/// zero frame since lengths are stored in words.
pub fn write_mod(module: &ModModule) -> Vec<u8> {
    let num_channels = module.num_channels.max(1);
    let mut output = Vec::with_capacity(
        crate::HEADER_SIZE + module.patterns.len() * ROWS_PER_PATTERN as usize * 16,
    );

    write_fixed_str(&mut output, &module.title, 20);

    let empty = ModSample::default();
    for index in 0..NUM_SAMPLES {
        let sample = module.samples.get(index).unwrap_or(&empty);
        write_sample_header(&mut output, sample);
    }

    let song_length = module.order_table.len().clamp(1, MAX_ORDERS);
    output.push(song_length as u8);
    output.push(module.restart_position);

    let mut orders = [0u8; MAX_ORDERS];
    let played = module.order_table.len().min(MAX_ORDERS);
    orders[..played].copy_from_slice(&module.order_table[..played]);
    output.extend_from_slice(&orders);

    output.extend_from_slice(&tag_for_channels(num_channels));

    for pattern in &module.patterns {
        write_pattern(&mut output, pattern, num_channels);
    }

    for sample in module.samples.iter().take(NUM_SAMPLES) {
        output.extend(sample.data.iter().map(|&v| (v >> 8) as i8 as u8));
        if sample.data.len() % 2 == 1 {
            output.push(0);
        }
    }

    output
}

fn write_sample_header(output: &mut Vec<u8>, sample: &ModSample) {
    let words = |frames: u32| frames.div_ceil(2).min(u16::MAX as u32) as u16;
    let loop_start_words = (sample.loop_start / 2).min(u16::MAX as u32) as u16;

    write_fixed_str(output, &sample.name, 22);
    output.extend_from_slice(&words(sample.data.len() as u32).to_be_bytes());
    output.push((sample.finetune as u8) & 0x0F);
    output.push(sample.volume);
    output.extend_from_slice(&loop_start_words.to_be_bytes());
    output.extend_from_slice(&words(sample.loop_length).to_be_bytes());
}

fn write_pattern(output: &mut Vec<u8>, pattern: &ModPattern, num_channels: u8) {
    for row in 0..ROWS_PER_PATTERN {
        for channel in 0..num_channels {
            let cell = pattern.get_note(row, channel).copied().unwrap_or_default();
            output.extend_from_slice(&cell.to_bytes());
        }
    }
}

fn write_fixed_str(output: &mut Vec<u8>, s: &str, len: usize) {
    let bytes = s.as_bytes();
    let copy_len = bytes.len().min(len);
    output.extend_from_slice(&bytes[..copy_len]);
    output.resize(output.len() + (len - copy_len), 0);
}
