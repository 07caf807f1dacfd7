//! Nether-MOD: ProTracker-family MOD parser
//!
//! Reads the 31-sample MOD layout shared by ProTracker, NoiseTracker,
//! StarTrekker (4-channel), FastTracker 1 (`xCHN`, `xxCH`) and the
//! Falcon/Oktalyzer 8-channel variants. Sample data is signed 8-bit PCM and
//! is widened to `i16` on load.
//!
//! Pattern cells store Amiga periods rather than note numbers; use
//! [`period_to_note`] / [`note_to_period`] to move between the two. Notes use
//! the XM numbering (1 = C-0, 49 = C-4), where ProTracker's middle C
//! (period 428) is note 49.
//!
//! ```ignore
//! let module = nether_mod::parse_mod(&std::fs::read("song.mod")?)?;
//! println!("{} channels, {} patterns", module.num_channels, module.patterns.len());
//! ```

mod error;
mod module;
mod parser;
mod writer;

pub use error::ModError;
pub use module::{ModModule, ModNote, ModPattern, ModSample};
pub use parser::{ParseOptions, parse_mod, parse_mod_with};
pub use writer::write_mod;

/// Offset of the format tag
pub const TAG_OFFSET: usize = 1080;

/// Size of everything before the first pattern
pub const HEADER_SIZE: usize = 1084;

/// Sample slots in a 31-sample module
pub const NUM_SAMPLES: usize = 31;

/// Length of the stored order table
pub const MAX_ORDERS: usize = 128;

/// Every MOD pattern has 64 rows
pub const ROWS_PER_PATTERN: u16 = 64;

/// Largest channel count a tag can declare
pub const MAX_CHANNELS: u8 = 32;

/// Note number of the first entry in [`PERIOD_TABLE`]
pub const FIRST_TABLE_NOTE: u8 = 25;

/// ProTracker periods (finetune 0) over five octaves, starting at note 25
pub const PERIOD_TABLE: [u16; 60] = [
    1712, 1616, 1525, 1440, 1357, 1281, 1209, 1141, 1077, 1017, 961, 907, //
    856, 808, 762, 720, 678, 640, 604, 570, 538, 508, 480, 453, //
    428, 404, 381, 360, 340, 320, 302, 285, 269, 254, 240, 226, //
    214, 202, 190, 180, 170, 160, 151, 143, 135, 127, 120, 113, //
    107, 101, 95, 90, 85, 80, 75, 71, 67, 63, 60, 57,
];

/// Channel count declared by a format tag, or `None` if the tag is unknown
pub fn channels_for_tag(tag: &[u8; 4]) -> Option<u8> {
    match tag {
        b"M.K." | b"M!K!" | b"M&K!" | b"FLT4" | b"N.T." => Some(4),
        b"CD81" | b"OKTA" | b"OCTA" => Some(8),
        [d, b'C', b'H', b'N'] if d.is_ascii_digit() && *d != b'0' => Some(d - b'0'),
        [d1, d2, b'C', b'H' | b'N'] if d1.is_ascii_digit() && d2.is_ascii_digit() => {
            let n = (d1 - b'0') * 10 + (d2 - b'0');
            (1..=MAX_CHANNELS).contains(&n).then_some(n)
        }
        _ => None,
    }
}

/// Tag written for a channel count
pub fn tag_for_channels(num_channels: u8) -> [u8; 4] {
    match num_channels {
        4 => *b"M.K.",
        1..=9 => [b'0' + num_channels, b'C', b'H', b'N'],
        n => [b'0' + n / 10 % 10, b'0' + n % 10, b'C', b'H'],
    }
}

/// Closest note for an Amiga period (0 = no note)
pub fn period_to_note(period: u16) -> u8 {
    if period == 0 {
        return 0;
    }
    let (index, _) = PERIOD_TABLE
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| p.abs_diff(period))
        .unwrap_or((0, &0));
    FIRST_TABLE_NOTE + index as u8
}

/// Period for a note inside the table range (0 otherwise)
pub fn note_to_period(note: u8) -> u16 {
    note.checked_sub(FIRST_TABLE_NOTE)
        .and_then(|i| PERIOD_TABLE.get(i as usize))
        .copied()
        .unwrap_or(0)
}
