//! XM file writing functions

use crate::module::{XmEnvelope, XmInstrument, XmModule, XmPattern, XmSample};
use crate::{XM_MAGIC, XM_VERSION};

/// Serialize a module to XM bytes
///
/// Counts (patterns, instruments, song length) are taken from the vectors,
/// not from the cached count fields, so a hand-built module always produces
/// a consistent file. Sample data is delta-encoded in the width given by
/// `is_16bit`.
pub fn write_xm(module: &XmModule) -> Vec<u8> {
    let mut output = Vec::with_capacity(336 + module.total_samples() * 64);

    // ========== Header ==========

    output.extend_from_slice(XM_MAGIC);
    write_fixed_str(&mut output, &module.name, 20);
    output.push(0x1A);
    write_fixed_str(&mut output, &module.tracker_name, 20);
    write_u16(&mut output, XM_VERSION);

    // 276 = 4 (header_size) + 8 * 2 (fields) + 256 (order_table)
    write_u32(&mut output, 276);

    let song_length = module.order_table.len().min(256);
    write_u16(&mut output, song_length as u16);
    write_u16(&mut output, module.restart_position);
    write_u16(&mut output, module.num_channels as u16);
    write_u16(&mut output, module.patterns.len() as u16);
    write_u16(&mut output, module.instruments.len() as u16);
    write_u16(&mut output, module.linear_frequency_table as u16);
    write_u16(&mut output, module.default_speed);
    write_u16(&mut output, module.default_bpm);

    let mut order_table = [0u8; 256];
    order_table[..song_length].copy_from_slice(&module.order_table[..song_length]);
    output.extend_from_slice(&order_table);

    // ========== Patterns ==========

    for pattern in &module.patterns {
        // 9 = 4 (length) + 1 (packing) + 2 (rows) + 2 (packed_size)
        write_u32(&mut output, 9);
        output.push(0);
        write_u16(&mut output, pattern.num_rows);

        let packed = pack_pattern_data(pattern, module.num_channels);
        write_u16(&mut output, packed.len() as u16);
        output.extend_from_slice(&packed);
    }

    // ========== Instruments ==========

    for instrument in &module.instruments {
        write_instrument(&mut output, instrument);
    }

    output
}

fn write_instrument(output: &mut Vec<u8>, instrument: &XmInstrument) {
    let num_samples = instrument.samples.len().min(crate::MAX_SAMPLES_PER_INSTRUMENT as usize);
    let header_size: u32 = if num_samples > 0 { 243 } else { 29 };

    write_u32(output, header_size);
    write_fixed_str(output, &instrument.name, 22);
    output.push(0);
    write_u16(output, num_samples as u16);

    if num_samples == 0 {
        return;
    }

    write_u32(output, 40);
    output.extend_from_slice(&instrument.sample_map);

    write_envelope_points(output, instrument.volume_envelope.as_ref());
    write_envelope_points(output, instrument.panning_envelope.as_ref());

    let vol = instrument.volume_envelope.as_ref();
    let pan = instrument.panning_envelope.as_ref();

    output.push(vol.map_or(0, |e| e.points.len().min(12) as u8));
    output.push(pan.map_or(0, |e| e.points.len().min(12) as u8));
    output.push(vol.map_or(0, |e| e.sustain_point));
    output.push(vol.map_or(0, |e| e.loop_start));
    output.push(vol.map_or(0, |e| e.loop_end));
    output.push(pan.map_or(0, |e| e.sustain_point));
    output.push(pan.map_or(0, |e| e.loop_start));
    output.push(pan.map_or(0, |e| e.loop_end));
    output.push(vol.map_or(0, XmEnvelope::type_flags));
    output.push(pan.map_or(0, XmEnvelope::type_flags));

    output.push(instrument.vibrato_type);
    output.push(instrument.vibrato_sweep);
    output.push(instrument.vibrato_depth);
    output.push(instrument.vibrato_rate);
    write_u16(output, instrument.volume_fadeout);

    // Reserved (2 bytes)
    write_u16(output, 0);

    let samples = &instrument.samples[..num_samples];
    for sample in samples {
        write_sample_header(output, sample);
    }
    for sample in samples {
        write_sample_data(output, sample);
    }
}

fn write_envelope_points(output: &mut Vec<u8>, envelope: Option<&XmEnvelope>) {
    let points = envelope.map_or(&[][..], |e| &e.points[..]);
    for i in 0..12 {
        let (x, y) = points.get(i).copied().unwrap_or((0, 0));
        write_u16(output, x);
        write_u16(output, y);
    }
}

fn write_sample_header(output: &mut Vec<u8>, sample: &XmSample) {
    let width = if sample.is_16bit { 2 } else { 1 };
    write_u32(output, sample.data.len() as u32 * width);
    write_u32(output, sample.loop_start * width);
    write_u32(output, sample.loop_length * width);
    output.push(sample.volume);
    output.push(sample.finetune as u8);
    output.push((sample.loop_type & 0x03) | if sample.is_16bit { 0x10 } else { 0 });
    output.push(sample.panning);
    output.push(sample.relative_note as u8);
    output.push(0);
    write_fixed_str(output, &sample.name, 22);
}

fn write_sample_data(output: &mut Vec<u8>, sample: &XmSample) {
    if sample.is_16bit {
        let mut old = 0i16;
        for &value in &sample.data {
            output.extend_from_slice(&value.wrapping_sub(old).to_le_bytes());
            old = value;
        }
    } else {
        let mut old = 0i8;
        for &value in &sample.data {
            let value = (value >> 8) as i8;
            output.push(value.wrapping_sub(old) as u8);
            old = value;
        }
    }
}

/// Pack pattern data into XM format using compressed packed format
///
/// Packed format:
/// - If note is all zeros: single byte 0x80
/// - Otherwise: flag byte (0x80 | field_flags) followed by present fields
///   - Bit 0 (0x01): Note present
///   - Bit 1 (0x02): Instrument present
///   - Bit 2 (0x04): Volume present
///   - Bit 3 (0x08): Effect present
///   - Bit 4 (0x10): Effect param present
pub(crate) fn pack_pattern_data(pattern: &XmPattern, num_channels: u8) -> Vec<u8> {
    let mut output = Vec::new();

    for row in &pattern.notes {
        for ch in 0..num_channels as usize {
            let note = row.get(ch).copied().unwrap_or_default();
            let fields = [
                note.note,
                note.instrument,
                note.volume,
                note.effect,
                note.effect_param,
            ];

            let mut flags = 0x80u8;
            for (bit, &value) in fields.iter().enumerate() {
                if value != 0 {
                    flags |= 1 << bit;
                }
            }

            output.push(flags);
            output.extend(fields.iter().copied().filter(|&v| v != 0));
        }
    }

    output
}

fn write_fixed_str(output: &mut Vec<u8>, s: &str, len: usize) {
    let bytes = s.as_bytes();
    let copy_len = bytes.len().min(len);
    output.extend_from_slice(&bytes[..copy_len]);
    output.resize(output.len() + (len - copy_len), 0);
}

fn write_u16(output: &mut Vec<u8>, val: u16) {
    output.extend_from_slice(&val.to_le_bytes());
}

fn write_u32(output: &mut Vec<u8>, val: u32) {
    output.extend_from_slice(&val.to_le_bytes());
}
