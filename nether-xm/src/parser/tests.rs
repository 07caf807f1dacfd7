//! Tests for XM parser and writer

use super::read::*;
use super::write::*;
use crate::error::XmError;
use crate::module::{XmEnvelope, XmInstrument, XmModule, XmNote, XmPattern, XmSample};
use std::io::Cursor;

#[test]
fn test_read_string() {
    assert_eq!(read_string(b"Hello\0World"), "Hello");
    assert_eq!(read_string(b"No null"), "No null");
    assert_eq!(read_string(b"Trailing   "), "Trailing");
    assert_eq!(read_string(b""), "");
}

#[test]
fn test_parse_invalid_magic() {
    let data = b"Not an XM file at all!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!!";
    assert!(matches!(parse_xm(data), Err(XmError::InvalidMagic)));
}

#[test]
fn test_parse_too_small() {
    let data = b"Extended Module: test";
    assert!(matches!(parse_xm(data), Err(XmError::TooSmall)));
}

#[test]
fn test_unpack_note_packed() {
    let data = [
        0b10011111u8, // All fields present
        0x31,         // Note C-4
        0x01,         // Instrument 1
        0x40,         // Volume 64
        0x0F,         // Effect F (set speed)
        0x06,         // Param 6
    ];
    let mut cursor = Cursor::new(&data[..]);
    let note = unpack_note(&mut cursor).unwrap();

    assert_eq!(note.note, 0x31);
    assert_eq!(note.instrument, 0x01);
    assert_eq!(note.volume, 0x40);
    assert_eq!(note.effect, 0x0F);
    assert_eq!(note.effect_param, 0x06);
}

#[test]
fn test_unpack_note_packed_partial() {
    let data = [0b10001001u8, 0x31, 0x0F];
    let mut cursor = Cursor::new(&data[..]);
    let note = unpack_note(&mut cursor).unwrap();

    assert_eq!(note.note, 0x31);
    assert_eq!(note.instrument, 0);
    assert_eq!(note.volume, 0);
    assert_eq!(note.effect, 0x0F);
    assert_eq!(note.effect_param, 0);
}

#[test]
fn test_unpack_note_unpacked() {
    let data = [0x31, 0x01, 0x40, 0x00, 0x00];
    let mut cursor = Cursor::new(&data[..]);
    let note = unpack_note(&mut cursor).unwrap();

    assert_eq!(note.note, 0x31);
    assert_eq!(note.instrument, 0x01);
    assert_eq!(note.volume, 0x40);
}

#[test]
fn test_unpack_note_truncated() {
    let data = [0b10000011u8, 0x31];
    let mut cursor = Cursor::new(&data[..]);
    assert!(matches!(unpack_note(&mut cursor), Err(XmError::UnexpectedEof)));
}

#[test]
fn test_pack_pattern_data() {
    let pattern = XmPattern {
        num_rows: 2,
        notes: vec![
            vec![
                XmNote {
                    note: 49,
                    instrument: 1,
                    ..Default::default()
                },
                XmNote::default(),
            ],
            vec![XmNote {
                effect: 0x0F,
                effect_param: 3,
                ..Default::default()
            }],
        ],
    };

    let packed = pack_pattern_data(&pattern, 2);
    // Short second row is padded with an empty cell
    assert_eq!(packed, vec![0x83, 49, 1, 0x80, 0x98, 0x0F, 3, 0x80]);
}

/// Two channels, two patterns, one instrument holding an 8-bit looped sample
/// and a 16-bit sample selected for the upper half of the keyboard.
fn demo_module() -> XmModule {
    let mut pattern0 = XmPattern::empty(4, 2);
    pattern0.notes[0][0] = XmNote {
        note: 49,
        instrument: 1,
        volume: 0x40,
        effect: 0,
        effect_param: 0,
    };
    pattern0.notes[2][1] = XmNote {
        note: 97,
        ..Default::default()
    };
    pattern0.notes[3][0] = XmNote {
        effect: crate::effects::PATTERN_BREAK,
        ..Default::default()
    };

    let mut instrument = XmInstrument {
        name: "DemoInstr".into(),
        volume_fadeout: 256,
        vibrato_type: 1,
        vibrato_depth: 4,
        volume_envelope: Some(XmEnvelope {
            points: vec![(0, 64), (8, 32), (16, 0)],
            sustain_point: 1,
            enabled: true,
            sustain_enabled: true,
            ..Default::default()
        }),
        ..Default::default()
    };
    instrument.sample_map[60..].fill(1);
    instrument.samples.push(XmSample {
        name: "square".into(),
        volume: 48,
        finetune: -16,
        relative_note: 12,
        loop_type: 1,
        loop_start: 4,
        loop_length: 8,
        panning: 0x80,
        data: (0..16).map(|i| if i % 4 < 2 { 0x4000 } else { -0x4000 }).collect(),
        ..Default::default()
    });
    instrument.samples.push(XmSample {
        name: "ramp16".into(),
        volume: 64,
        is_16bit: true,
        data: vec![-30000, -10000, 0, 12345, 32767],
        ..Default::default()
    });

    XmModule {
        name: "nether-xm demo".into(),
        tracker_name: "nether-xm tests".into(),
        num_channels: 2,
        order_table: vec![0, 1, 0],
        restart_position: 1,
        patterns: vec![pattern0, XmPattern::empty(8, 2)],
        instruments: vec![instrument],
        ..Default::default()
    }
}

#[test]
fn test_written_module_parses_back() {
    let bytes = write_xm(&demo_module());
    let module = parse_xm(&bytes).expect("written XM should parse");

    assert_eq!(module.name, "nether-xm demo");
    assert_eq!(module.tracker_name, "nether-xm tests");
    assert_eq!(module.num_channels, 2);
    assert_eq!(module.num_patterns, 2);
    assert_eq!(module.song_length, 3);
    assert_eq!(module.order_table, vec![0, 1, 0]);
    assert_eq!(module.restart_position, 1);
    assert!(module.linear_frequency_table);
    assert!(module.warnings.is_empty());

    assert_eq!(module.patterns[0].num_rows, 4);
    assert_eq!(module.patterns[1].num_rows, 8);
    assert_eq!(module.patterns[0].notes[0][0].note, 49);
    assert_eq!(module.patterns[0].notes[0][0].get_volume(), Some(0x30));
    assert!(module.patterns[0].notes[2][1].is_note_off());

    let instr = &module.instruments[0];
    assert_eq!(instr.name, "DemoInstr");
    assert_eq!(instr.samples.len(), 2);
    assert_eq!(instr.volume_fadeout, 256);
    assert_eq!(instr.sample_for_note(49).map(|s| s.name.as_str()), Some("square"));
    assert_eq!(instr.sample_for_note(61).map(|s| s.name.as_str()), Some("ramp16"));

    let env = instr.volume_envelope.as_ref().unwrap();
    assert_eq!(env.points, vec![(0, 64), (8, 32), (16, 0)]);
    assert_eq!(env.sustain_tick(), Some(8));
    assert!(!env.loop_enabled);

    let square = &instr.samples[0];
    assert_eq!(square.volume, 48);
    assert_eq!(square.finetune, -16);
    assert_eq!(square.relative_note, 12);
    assert_eq!((square.loop_start, square.loop_length), (4, 8));
    assert_eq!(square.data.len(), 16);
    assert_eq!(square.data[0], 0x4000);
    assert_eq!(square.data[2], -0x4000);

    let ramp = &instr.samples[1];
    assert!(ramp.is_16bit);
    assert_eq!(ramp.data, vec![-30000, -10000, 0, 12345, 32767]);
}

#[test]
fn test_skip_options() {
    let bytes = write_xm(&demo_module());

    let options = ParseOptions {
        skip_samples: true,
        skip_patterns: true,
    };
    let module = parse_xm_with(&bytes, &options).unwrap();

    assert_eq!(module.patterns[0].num_rows, 4);
    assert!(module.patterns[0].notes[0][0].is_empty());
    let instr = &module.instruments[0];
    assert_eq!(instr.samples.len(), 2);
    assert!(instr.samples.iter().all(|s| s.data.is_empty()));
    assert_eq!(instr.samples[0].loop_length, 8);
}

#[test]
fn test_truncated_sample_data_is_a_warning() {
    let mut bytes = write_xm(&demo_module());
    // Drop the last two 16-bit frames
    bytes.truncate(bytes.len() - 4);

    let module = parse_xm(&bytes).unwrap();
    assert_eq!(module.warnings.len(), 1);
    assert_eq!(module.instruments[0].samples[1].data, vec![-30000, -10000, 0]);
}

#[test]
fn test_truncated_pattern_is_an_error() {
    let bytes = write_xm(&demo_module());
    // Cut inside the first pattern's packed data
    let cut = 336 + 9 + 3;
    assert!(matches!(
        parse_xm(&bytes[..cut]),
        Err(XmError::InvalidPattern(0))
    ));
}

#[test]
fn test_rejects_bad_channel_count() {
    let mut bytes = write_xm(&demo_module());
    bytes[68..70].copy_from_slice(&40u16.to_le_bytes());
    assert!(matches!(parse_xm(&bytes), Err(XmError::TooManyChannels(40))));

    bytes[68..70].copy_from_slice(&0u16.to_le_bytes());
    assert!(matches!(parse_xm(&bytes), Err(XmError::TooManyChannels(0))));
}

#[test]
fn test_rejects_other_versions() {
    let mut bytes = write_xm(&demo_module());
    bytes[58..60].copy_from_slice(&0x0103u16.to_le_bytes());
    assert!(matches!(
        parse_xm(&bytes),
        Err(XmError::UnsupportedVersion(0x0103))
    ));
}

#[test]
fn test_instrument_names() {
    let bytes = write_xm(&demo_module());
    assert_eq!(get_instrument_names(&bytes).unwrap(), vec!["DemoInstr"]);
}

#[test]
fn test_delta_decoding() {
    // 8-bit: deltas 1, 1, -3 -> 1, 2, -1 scaled by 256
    assert_eq!(
        decode_sample_data(&[1, 1, 0xFD], false).unwrap(),
        vec![256, 512, -256]
    );
    // 16-bit: odd trailing byte is ignored
    assert_eq!(
        decode_sample_data(&[0x10, 0x00, 0xF0, 0xFF, 0x7F], true).unwrap(),
        vec![16, 0]
    );
}
