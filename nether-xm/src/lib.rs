//! Nether-XM: XM (Extended Module) tracker format parser
//!
//! Pure Rust reader and writer for the FastTracker 2 XM format. The parser
//! decodes everything a playback engine needs: song header, order table,
//! packed pattern data, instruments with their note-to-sample maps and
//! envelopes, and delta-encoded 8/16-bit sample PCM (normalized to `i16`).
//!
//! # XM Format Overview
//!
//! XM files contain:
//! - Header with song metadata (name, tracker, speed, BPM, channels)
//! - Pattern data (packed note/effect sequences)
//! - Instruments, each holding up to 16 samples, a 96-entry sample map,
//!   volume/panning envelopes and auto-vibrato settings
//! - Sample data stored as deltas after each instrument's sample headers
//!
//! # Usage
//!
//! ```ignore
//! use nether_xm::{parse_xm, ParseOptions};
//!
//! let xm_data = std::fs::read("song.xm").unwrap();
//! let module = parse_xm(&xm_data).unwrap();
//!
//! println!("Song: {} ({})", module.name, module.tracker_name);
//! for instr in &module.instruments {
//!     println!("  {} with {} samples", instr.name, instr.samples.len());
//! }
//!
//! // Header-only pass, no PCM decoding
//! let headers = nether_xm::parse_xm_with(&xm_data, &ParseOptions {
//!     skip_samples: true,
//!     ..Default::default()
//! }).unwrap();
//! ```
//!
//! # Format Reference
//!
//! - FastTracker 2 XM file format documentation, v0104
//! - <https://github.com/milkytracker/MilkyTracker/blob/master/resources/reference/xm-form.txt>

mod error;
mod module;
mod parser;

pub use error::XmError;
pub use module::{XmEnvelope, XmInstrument, XmModule, XmNote, XmPattern, XmSample};
pub use parser::{ParseOptions, get_instrument_names, parse_xm, parse_xm_with, write_xm};

// =============================================================================
// Constants
// =============================================================================

/// XM format magic string
pub const XM_MAGIC: &[u8; 17] = b"Extended Module: ";

/// XM format version we support
pub const XM_VERSION: u16 = 0x0104;

/// Maximum number of channels supported
pub const MAX_CHANNELS: u8 = 32;

/// Maximum number of patterns supported
pub const MAX_PATTERNS: u16 = 256;

/// Maximum pattern length (rows)
pub const MAX_PATTERN_ROWS: u16 = 256;

/// Maximum instruments in an XM file
pub const MAX_INSTRUMENTS: u16 = 128;

/// Maximum samples per instrument
pub const MAX_SAMPLES_PER_INSTRUMENT: u8 = 16;

/// Number of entries in an instrument's note-to-sample map
pub const SAMPLE_MAP_SIZE: usize = 96;

// =============================================================================
// Note Constants
// =============================================================================

/// Note value for "note off"
pub const NOTE_OFF: u8 = 97;

/// Minimum valid note (C-0)
pub const NOTE_MIN: u8 = 1;

/// Maximum valid note (B-7)
pub const NOTE_MAX: u8 = 96;

// =============================================================================
// Effect Constants
// =============================================================================

/// XM effect commands for reference
pub mod effects {
    /// 0xy - Arpeggio
    pub const ARPEGGIO: u8 = 0x00;
    /// 1xx - Portamento up
    pub const PORTA_UP: u8 = 0x01;
    /// 2xx - Portamento down
    pub const PORTA_DOWN: u8 = 0x02;
    /// 3xx - Tone portamento
    pub const TONE_PORTA: u8 = 0x03;
    /// 4xy - Vibrato
    pub const VIBRATO: u8 = 0x04;
    /// 5xy - Tone portamento + volume slide
    pub const TONE_PORTA_VOL_SLIDE: u8 = 0x05;
    /// 6xy - Vibrato + volume slide
    pub const VIBRATO_VOL_SLIDE: u8 = 0x06;
    /// 7xy - Tremolo
    pub const TREMOLO: u8 = 0x07;
    /// 8xx - Set panning
    pub const SET_PANNING: u8 = 0x08;
    /// 9xx - Sample offset
    pub const SAMPLE_OFFSET: u8 = 0x09;
    /// Axy - Volume slide
    pub const VOLUME_SLIDE: u8 = 0x0A;
    /// Bxx - Position jump
    pub const POSITION_JUMP: u8 = 0x0B;
    /// Cxx - Set volume
    pub const SET_VOLUME: u8 = 0x0C;
    /// Dxx - Pattern break
    pub const PATTERN_BREAK: u8 = 0x0D;
    /// Exy - Extended effects
    pub const EXTENDED: u8 = 0x0E;
    /// Fxx - Set speed/tempo
    pub const SET_SPEED_TEMPO: u8 = 0x0F;
    /// Gxx - Set global volume
    pub const SET_GLOBAL_VOLUME: u8 = 0x10;
    /// Hxy - Global volume slide
    pub const GLOBAL_VOLUME_SLIDE: u8 = 0x11;
    /// Kxx - Key off
    pub const KEY_OFF: u8 = 0x14;
    /// Lxx - Set envelope position
    pub const SET_ENVELOPE_POS: u8 = 0x15;
    /// Pxy - Panning slide
    pub const PANNING_SLIDE: u8 = 0x19;
    /// Rxy - Multi retrig note
    pub const MULTI_RETRIG: u8 = 0x1B;
    /// Txy - Tremor
    pub const TREMOR: u8 = 0x1D;
    /// Xxx - Extra fine portamento
    pub const EXTRA_FINE_PORTA: u8 = 0x21;
}

/// Extended effect sub-commands (Exy where x is the sub-command)
pub mod extended_effects {
    /// E1x - Fine portamento up
    pub const FINE_PORTA_UP: u8 = 0x1;
    /// E2x - Fine portamento down
    pub const FINE_PORTA_DOWN: u8 = 0x2;
    /// E3x - Glissando control
    pub const GLISSANDO: u8 = 0x3;
    /// E4x - Vibrato waveform
    pub const VIBRATO_WAVEFORM: u8 = 0x4;
    /// E5x - Set finetune
    pub const SET_FINETUNE: u8 = 0x5;
    /// E6x - Pattern loop
    pub const PATTERN_LOOP: u8 = 0x6;
    /// E7x - Tremolo waveform
    pub const TREMOLO_WAVEFORM: u8 = 0x7;
    /// E8x - Set panning (coarse)
    pub const SET_PANNING_COARSE: u8 = 0x8;
    /// E9x - Retrigger note
    pub const RETRIG: u8 = 0x9;
    /// EAx - Fine volume slide up
    pub const FINE_VOLUME_UP: u8 = 0xA;
    /// EBx - Fine volume slide down
    pub const FINE_VOLUME_DOWN: u8 = 0xB;
    /// ECx - Note cut
    pub const NOTE_CUT: u8 = 0xC;
    /// EDx - Note delay
    pub const NOTE_DELAY: u8 = 0xD;
    /// EEx - Pattern delay
    pub const PATTERN_DELAY: u8 = 0xE;
}

// =============================================================================
// Tests
// =============================================================================
