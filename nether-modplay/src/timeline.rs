//! Subsong detection and per-row timing
//!
//! Every subsong is walked once at load time with the playback
//! [`Sequencer`]. The walk records where each row starts in song time
//! (tempo factor 1.0) together with the timing state in effect at that
//! point, which is what seeking restores.

use nether_tracker::{OrderEntry, SourceFormat, TrackerModule};
use serde::Serialize;
use tracing::{debug, warn};

use crate::sequencer::{RowAdvance, Sequencer, VisitedRows};

/// Upper bound on rows walked for one subsong
pub const MAX_TIMELINE_ROWS: usize = 1 << 20;

/// Timing state at the start of a row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowTiming {
    pub order: u16,
    pub row: u16,
    /// Song time at which the row starts
    pub seconds: f64,
    pub speed: u16,
    pub tempo: u16,
    pub global_volume: u8,
}

/// One independently playable path through the order list
#[derive(Debug, Clone, Default)]
pub struct Subsong {
    pub start_order: u16,
    pub duration_seconds: f64,
    /// Rows in play order, loops unrolled
    pub rows: Vec<RowTiming>,
}

impl Subsong {
    /// Index of the row playing at `seconds` (clamped to the subsong)
    pub fn entry_at_seconds(&self, seconds: f64) -> usize {
        self.rows
            .partition_point(|r| r.seconds <= seconds)
            .saturating_sub(1)
    }

    /// First time the walk reached `(order, row)`
    pub fn entry_index(&self, order: u16, row: u16) -> Option<usize> {
        self.rows.iter().position(|r| r.order == order && r.row == row)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Walk one subsong starting at `start_order`, marking orders it uses
fn walk_subsong(module: &TrackerModule, start_order: u16, used: &mut [bool]) -> Subsong {
    let effect_memory = module.source == SourceFormat::Xm;
    let mut seq = Sequencer::new(module, start_order);
    let mut subsong = Subsong {
        start_order,
        ..Default::default()
    };
    if !seq.normalize(module) {
        return subsong;
    }
    subsong.start_order = seq.order;

    let mut visited = VisitedRows::new(module);
    let mut seconds = 0.0;
    while let Some(pattern) = module.pattern_at_order(seq.order) {
        if subsong.rows.len() >= MAX_TIMELINE_ROWS {
            warn!(start_order, rows = MAX_TIMELINE_ROWS, "timeline row limit reached");
            break;
        }
        subsong.rows.push(RowTiming {
            order: seq.order,
            row: seq.row,
            seconds,
            speed: seq.speed,
            tempo: seq.tempo,
            global_volume: seq.global_volume,
        });
        visited.mark(seq.order, seq.row);
        if let Some(slot) = used.get_mut(seq.order as usize) {
            *slot = true;
        }

        seq.begin_row(pattern, effect_memory);
        seconds += seq.row_seconds();

        match seq.advance(module) {
            RowAdvance::End => break,
            RowAdvance::Next { looped: false } if visited.is_visited(seq.order, seq.row) => break,
            RowAdvance::Next { .. } => {}
        }
    }

    subsong.duration_seconds = seconds;
    subsong
}

/// Find every subsong of a module
///
/// The first subsong starts at order 0; each further one starts at the
/// first playable order no earlier walk reached. There is always at least
/// one (possibly empty) subsong.
pub fn build_subsongs(module: &TrackerModule) -> Vec<Subsong> {
    let mut used = vec![false; module.orders.len()];
    let mut subsongs = vec![walk_subsong(module, 0, &mut used)];

    loop {
        let next = (0..module.orders.len()).find(|&order| {
            !used[order]
                && matches!(
                    module.order(order as u16),
                    Some(OrderEntry::Pattern(p)) if module.patterns.get(p as usize).is_some_and(|pat| pat.num_rows > 0)
                )
        });
        let Some(order) = next else { break };
        let subsong = walk_subsong(module, order as u16, &mut used);
        // A walk always marks its start order, so this cannot spin
        used[order] = true;
        if !subsong.is_empty() {
            subsongs.push(subsong);
        }
    }

    debug!(
        subsongs = subsongs.len(),
        duration = subsongs[0].duration_seconds,
        "timeline built"
    );
    subsongs
}
