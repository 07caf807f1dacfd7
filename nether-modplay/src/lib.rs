//! Nether-ModPlay: tracker module playback engine (XM and MOD)
//!
//! Loads FastTracker 2 XM and ProTracker-family MOD files into the unified
//! [`nether_tracker`] model and renders them to interleaved float stereo.
//!
//! # Architecture
//!
//! - **Module** - immutable, `Arc`-shared module data: the converted song,
//!   subsong timelines computed at load time and metadata strings
//! - **Player** - one playback cursor: sequencer, channel voices, render
//!   config. Players never modify the module, so any number of them can
//!   share one module across threads
//! - **Sequencer** - order/row cursor and flow effects, shared by the
//!   load-time timeline walk and live playback so seeking by time lands
//!   exactly where rendering would
//! - **Engine** - tick-rate channel processing (effects, envelopes) and
//!   the frame-rate mixer
//!
//! # Usage
//!
//! ```ignore
//! use nether_modplay::{Module, Player};
//!
//! let module = Module::from_bytes(&std::fs::read("song.xm")?)?;
//! println!("{} ({:.1}s)", module.metadata("title"), module.duration_seconds());
//!
//! let mut player = Player::new(module);
//! player.play();
//! let mut buffer = vec![0.0f32; 1024 * 2];
//! while player.read_interleaved_stereo(48000, &mut buffer) > 0 {
//!     // hand the frames to an audio sink
//! }
//! ```
//!
//! Patterns are read-only: the edit calls on [`Module`] validate their
//! arguments and then fail with [`Error::UnsupportedOperation`].

mod channels;
pub mod config;
pub mod controls;
mod edit;
mod engine;
mod error;
mod loader;
mod metadata;
mod module;
mod player;
mod sequencer;
mod timeline;
mod utils;

pub use config::{EndBehaviour, Interpolation, RenderConfig, RenderParam};
pub use controls::Controls;
pub use error::{Error, ErrorCode, Result};
pub use loader::{LoadOptions, probe_format};
pub use metadata::{METADATA_KEYS, ModuleInfo, SubsongInfo};
pub use module::{Cell, DEFAULT_ROWS_PER_BEAT, DEFAULT_ROWS_PER_MEASURE, Module};
pub use player::{PlaybackState, PlaybackStatus, Player};
pub use sequencer::tick_seconds;
pub use timeline::{RowTiming, Subsong};

pub use nether_tracker::{SourceFormat, TrackerModule};

/// Most channels a module may have
pub const MAX_CHANNELS: usize = 32;

/// Lowest output rate the renderer accepts
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Highest output rate the renderer accepts
pub const MAX_SAMPLE_RATE: u32 = 192_000;
