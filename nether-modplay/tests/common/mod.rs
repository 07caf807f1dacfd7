//! Module fixtures shared by the integration tests
//!
//! Both fixtures are 4 channels, two 64-row patterns at speed 6 / tempo 125,
//! so they play for 128 * 0.12 = 15.36 s.

#![allow(dead_code)]

use nether_mod::{ModModule, ModNote, ModPattern, ModSample};
use nether_xm::{XmInstrument, XmModule, XmNote, XmPattern, XmSample};

pub const RATE: u32 = 44100;

/// Frames one pass of either fixture lasts at [`RATE`]
pub const SONG_FRAMES: usize = 677_376;

pub const SONG_SECONDS: f64 = 15.36;

/// Notes placed every 16 rows in the first pattern
const MELODY: [u8; 4] = [49, 53, 56, 61];

fn saw() -> Vec<i16> {
    (0..64).map(|i| (i * 1000 - 32000) as i16).collect()
}

pub fn xm_bytes() -> Vec<u8> {
    let mut first = XmPattern::empty(64, 4);
    let mut second = XmPattern::empty(64, 4);
    for (i, note) in MELODY.into_iter().enumerate() {
        first.notes[i * 16][0] = XmNote {
            note,
            instrument: 1,
            ..Default::default()
        };
        second.notes[i * 16][1] = XmNote {
            note: note - 12,
            instrument: 1,
            // Volume column: set volume 32
            volume: 0x30,
            ..Default::default()
        };
    }
    // F06 on the first row keeps the default speed explicit
    first.notes[0][3] = XmNote {
        effect: 0x0F,
        effect_param: 0x06,
        ..Default::default()
    };

    let module = XmModule {
        name: "fixture xm".to_string(),
        tracker_name: "FastTracker v2.00".to_string(),
        num_channels: 4,
        num_patterns: 2,
        num_instruments: 1,
        song_length: 2,
        order_table: vec![0, 1],
        patterns: vec![first, second],
        instruments: vec![XmInstrument {
            name: "lead".to_string(),
            samples: vec![XmSample {
                name: "saw".to_string(),
                loop_start: 0,
                loop_length: 64,
                volume: 48,
                loop_type: 1,
                is_16bit: true,
                panning: 128,
                data: saw(),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };
    nether_xm::write_xm(&module)
}

pub fn mod_bytes() -> Vec<u8> {
    let mut first = ModPattern::empty(4);
    let mut second = ModPattern::empty(4);
    // C-2, E-2, G-2, C-3 in ProTracker periods
    for (i, period) in [428u16, 339, 285, 214].into_iter().enumerate() {
        first.rows[i * 16][0] = ModNote {
            period,
            sample: 1,
            effect: 0,
            param: 0,
        };
        second.rows[i * 16][1] = ModNote {
            period: period * 2,
            sample: 1,
            effect: 0x0C,
            param: 32,
        };
    }

    let mut samples = vec![ModSample::default(); nether_mod::NUM_SAMPLES];
    samples[0] = ModSample {
        name: "saw".to_string(),
        finetune: 0,
        volume: 48,
        loop_start: 0,
        loop_length: 64,
        data: saw(),
    };

    let module = ModModule {
        title: "fixture mod".to_string(),
        tag: *b"M.K.",
        num_channels: 4,
        samples,
        restart_position: 0,
        order_table: vec![0, 1],
        patterns: vec![first, second],
        warnings: Vec::new(),
    };
    nether_mod::write_mod(&module)
}

/// Read until the player returns 0, at most `limit` frames
pub fn count_frames(player: &mut nether_modplay::Player, limit: usize) -> usize {
    let mut buffer = vec![0.0f32; 4096 * 2];
    let mut total = 0;
    while total < limit {
        let frames = player.read_interleaved_stereo(RATE, &mut buffer);
        if frames == 0 {
            break;
        }
        total += frames;
    }
    total
}
