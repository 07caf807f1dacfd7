//! Song flow: order/row cursor, speed, tempo and flow-control effects
//!
//! The same [`Sequencer`] drives the timeline walk done at load time and
//! live playback, so seeking through the timeline lands exactly where
//! rendering would have arrived.

use nether_tracker::{OrderEntry, TrackerEffect, TrackerModule, TrackerPattern};

use crate::MAX_CHANNELS;

/// Ticks per row used when the module declares none
pub const DEFAULT_SPEED: u16 = 6;
/// Tempo used when the module declares an unusable one
pub const DEFAULT_TEMPO: u16 = 125;
/// Lowest tempo an XM/MOD file can select
pub const MIN_TEMPO: u16 = 32;
/// Highest tempo an XM/MOD file can select
pub const MAX_TEMPO: u16 = 255;

/// Seconds per tick at a tempo
#[inline]
pub fn tick_seconds(tempo: u16) -> f64 {
    2.5 / tempo.max(1) as f64
}

/// Outcome of finishing a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAdvance {
    /// Cursor moved to another row; `looped` is set for pattern-loop jumps
    Next { looped: bool },
    /// End marker, end of order list or a jump past it
    End,
}

/// Cursor over the order list
#[derive(Debug, Clone)]
pub struct Sequencer {
    pub order: u16,
    pub row: u16,
    pub speed: u16,
    pub tempo: u16,
    /// Approximate global volume (0-64), tracked at row resolution
    pub global_volume: u8,
    global_slide_memory: u8,
    pattern_delay: u8,
    loop_rows: [u16; MAX_CHANNELS],
    loop_counts: [u8; MAX_CHANNELS],
    jump: Option<u16>,
    break_row: Option<u16>,
    loop_to: Option<u16>,
}

impl Sequencer {
    /// Cursor at `start_order` with the module's initial speed, tempo and volume
    pub fn new(module: &TrackerModule, start_order: u16) -> Self {
        let speed = match module.initial_speed {
            0 => DEFAULT_SPEED,
            s => s as u16,
        };
        let tempo = match module.initial_tempo as u16 {
            t if t < MIN_TEMPO => DEFAULT_TEMPO,
            t => t,
        };
        Self {
            order: start_order,
            row: 0,
            speed,
            tempo,
            global_volume: module.global_volume.min(64),
            global_slide_memory: 0,
            pattern_delay: 0,
            loop_rows: [0; MAX_CHANNELS],
            loop_counts: [0; MAX_CHANNELS],
            jump: None,
            break_row: None,
            loop_to: None,
        }
    }

    /// Place the cursor with explicit timing values, clearing loop state
    pub fn set_position(&mut self, order: u16, row: u16, speed: u16, tempo: u16, global_volume: u8) {
        self.order = order;
        self.row = row;
        self.speed = speed.max(1);
        self.tempo = tempo.clamp(MIN_TEMPO, MAX_TEMPO);
        self.global_volume = global_volume.min(64);
        self.pattern_delay = 0;
        self.jump = None;
        self.break_row = None;
        self.loop_to = None;
        self.reset_loops();
    }

    fn reset_loops(&mut self) {
        self.loop_rows = [0; MAX_CHANNELS];
        self.loop_counts = [0; MAX_CHANNELS];
    }

    /// Step over skip markers until the cursor sits on a playable pattern
    ///
    /// Returns false when an end marker or the end of the order list is hit.
    pub fn normalize(&mut self, module: &TrackerModule) -> bool {
        loop {
            match module.order(self.order) {
                Some(OrderEntry::Pattern(p))
                    if module
                        .patterns
                        .get(p as usize)
                        .is_some_and(|pattern| pattern.num_rows > 0) =>
                {
                    return true;
                }
                Some(OrderEntry::Pattern(_) | OrderEntry::Skip) => match self.order.checked_add(1) {
                    Some(next) => self.order = next,
                    None => return false,
                },
                Some(OrderEntry::End) | None => return false,
            }
        }
    }

    /// Apply the flow and timing effects of the current row (tick 0)
    pub fn begin_row(&mut self, pattern: &TrackerPattern, effect_memory: bool) {
        self.pattern_delay = 0;
        self.jump = None;
        self.break_row = None;
        self.loop_to = None;

        let Some(cells) = pattern.notes.get(self.row as usize) else {
            return;
        };

        let mut global_slide = None;
        for (channel, cell) in cells.iter().enumerate().take(MAX_CHANNELS) {
            match cell.effect {
                TrackerEffect::SetSpeed(speed) if speed > 0 => self.speed = speed as u16,
                TrackerEffect::SetTempo(tempo) => {
                    self.tempo = (tempo as u16).clamp(MIN_TEMPO, MAX_TEMPO);
                }
                TrackerEffect::PositionJump(order) => {
                    self.jump = Some(order as u16);
                }
                TrackerEffect::PatternBreak(row) => self.break_row = Some(row as u16),
                TrackerEffect::PatternLoop(0) => self.loop_rows[channel] = self.row,
                TrackerEffect::PatternLoop(count) => {
                    if self.loop_counts[channel] == 0 {
                        self.loop_counts[channel] = count;
                        self.loop_to = Some(self.loop_rows[channel]);
                    } else {
                        self.loop_counts[channel] -= 1;
                        if self.loop_counts[channel] > 0 {
                            self.loop_to = Some(self.loop_rows[channel]);
                        }
                    }
                }
                TrackerEffect::PatternDelay(rows) if self.pattern_delay == 0 => {
                    self.pattern_delay = rows;
                }
                TrackerEffect::SetGlobalVolume(volume) => self.global_volume = volume.min(64),
                TrackerEffect::GlobalVolumeSlide { up, down } => {
                    let param = (up << 4) | down;
                    if param != 0 {
                        self.global_slide_memory = param;
                    }
                    if param != 0 || effect_memory {
                        global_slide = Some(self.global_slide_memory);
                    }
                }
                _ => {}
            }
        }

        if let Some(param) = global_slide {
            let slide_ticks = (self.speed.saturating_sub(1) as u32) * (1 + self.pattern_delay as u32);
            let (up, down) = (param >> 4, param & 0x0F);
            let volume = self.global_volume as i32;
            let delta = if up > 0 { up as i32 } else { -(down as i32) };
            self.global_volume = (volume + delta * slide_ticks as i32).clamp(0, 64) as u8;
        }
    }

    /// Ticks the current row lasts, pattern delay included
    pub fn row_ticks(&self) -> u32 {
        self.speed as u32 * (1 + self.pattern_delay as u32)
    }

    /// Seconds the current row lasts
    pub fn row_seconds(&self) -> f64 {
        self.row_ticks() as f64 * tick_seconds(self.tempo)
    }

    /// Move past the current row
    pub fn advance(&mut self, module: &TrackerModule) -> RowAdvance {
        if let Some(target) = self.loop_to.take() {
            self.row = target;
            return RowAdvance::Next { looped: true };
        }

        if self.jump.is_some() || self.break_row.is_some() {
            let next_order = match self.jump.take() {
                Some(order) => order,
                None => match self.order.checked_add(1) {
                    Some(order) => order,
                    None => return RowAdvance::End,
                },
            };
            self.order = next_order;
            self.row = self.break_row.take().unwrap_or(0);
            self.reset_loops();
            if !self.normalize(module) {
                return RowAdvance::End;
            }
            if self.row >= self.current_rows(module) {
                self.row = 0;
            }
            return RowAdvance::Next { looped: false };
        }

        self.row += 1;
        if self.row >= self.current_rows(module) {
            self.row = 0;
            self.reset_loops();
            self.order = match self.order.checked_add(1) {
                Some(order) => order,
                None => return RowAdvance::End,
            };
            if !self.normalize(module) {
                return RowAdvance::End;
            }
        }
        RowAdvance::Next { looped: false }
    }

    fn current_rows(&self, module: &TrackerModule) -> u16 {
        module
            .pattern_at_order(self.order)
            .map(|p| p.num_rows)
            .unwrap_or(0)
    }
}

/// One bit per (order, row) pair, for detecting revisited rows
#[derive(Debug, Clone)]
pub struct VisitedRows {
    offsets: Vec<usize>,
    bits: Vec<u64>,
}

impl VisitedRows {
    pub fn new(module: &TrackerModule) -> Self {
        let mut offsets = Vec::with_capacity(module.orders.len() + 1);
        let mut total = 0usize;
        for order in 0..module.orders.len() {
            offsets.push(total);
            total += module
                .pattern_at_order(order as u16)
                .map(|p| p.num_rows as usize)
                .unwrap_or(0);
        }
        offsets.push(total);
        Self {
            offsets,
            bits: vec![0; total.div_ceil(64)],
        }
    }

    fn index(&self, order: u16, row: u16) -> Option<usize> {
        let start = *self.offsets.get(order as usize)?;
        let end = *self.offsets.get(order as usize + 1)?;
        let index = start + row as usize;
        (index < end).then_some(index)
    }

    pub fn is_visited(&self, order: u16, row: u16) -> bool {
        self.index(order, row)
            .is_some_and(|i| self.bits[i / 64] & (1 << (i % 64)) != 0)
    }

    pub fn mark(&mut self, order: u16, row: u16) {
        if let Some(i) = self.index(order, row) {
            self.bits[i / 64] |= 1 << (i % 64);
        }
    }

    pub fn clear(&mut self) {
        self.bits.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nether_tracker::TrackerNote;

    fn module_with(patterns: Vec<TrackerPattern>, orders: Vec<OrderEntry>) -> TrackerModule {
        TrackerModule {
            num_channels: 2,
            orders,
            patterns,
            channel_panning: vec![128; 2],
            ..Default::default()
        }
    }

    fn with_effect(mut pattern: TrackerPattern, row: usize, channel: usize, effect: TrackerEffect) -> TrackerPattern {
        pattern.notes[row][channel] = TrackerNote {
            effect,
            ..Default::default()
        };
        pattern
    }

    /// Count rows until the song ends
    fn walk(module: &TrackerModule) -> usize {
        let mut seq = Sequencer::new(module, 0);
        assert!(seq.normalize(module));
        let mut rows = 0;
        loop {
            let pattern = module.pattern_at_order(seq.order).unwrap();
            seq.begin_row(pattern, true);
            rows += 1;
            assert!(rows < 10_000, "walk did not terminate");
            if seq.advance(module) == RowAdvance::End {
                return rows;
            }
        }
    }

    #[test]
    fn test_plain_walk_and_skip_markers() {
        let module = module_with(
            vec![TrackerPattern::empty(4, 2), TrackerPattern::empty(8, 2)],
            vec![OrderEntry::Pattern(0), OrderEntry::Skip, OrderEntry::Pattern(1)],
        );
        assert_eq!(walk(&module), 12);
    }

    #[test]
    fn test_end_marker_stops() {
        let module = module_with(
            vec![TrackerPattern::empty(4, 2)],
            vec![OrderEntry::Pattern(0), OrderEntry::End, OrderEntry::Pattern(0)],
        );
        assert_eq!(walk(&module), 4);
    }

    #[test]
    fn test_pattern_break_and_jump() {
        let first = with_effect(TrackerPattern::empty(8, 2), 1, 0, TrackerEffect::PatternBreak(6));
        let module = module_with(
            vec![first, TrackerPattern::empty(8, 2)],
            vec![OrderEntry::Pattern(0), OrderEntry::Pattern(1)],
        );
        // Rows 0-1 of the first pattern, then rows 6-7 of the second
        assert_eq!(walk(&module), 4);

        let mut seq = Sequencer::new(&module, 0);
        seq.begin_row(&module.patterns[0], true);
        seq.advance(&module);
        seq.begin_row(&module.patterns[0], true);
        assert_eq!(seq.advance(&module), RowAdvance::Next { looped: false });
        assert_eq!((seq.order, seq.row), (1, 6));

        // Break row past the pattern end goes to row 0
        let first = with_effect(TrackerPattern::empty(4, 2), 0, 1, TrackerEffect::PatternBreak(40));
        let module = module_with(
            vec![first, TrackerPattern::empty(4, 2)],
            vec![OrderEntry::Pattern(0), OrderEntry::Pattern(1)],
        );
        assert_eq!(walk(&module), 5);
    }

    #[test]
    fn test_pattern_loop() {
        let pattern = with_effect(TrackerPattern::empty(4, 2), 0, 1, TrackerEffect::PatternLoop(0));
        let pattern = with_effect(pattern, 1, 1, TrackerEffect::PatternLoop(2));
        let module = module_with(vec![pattern], vec![OrderEntry::Pattern(0)]);
        // Rows 0-1 three times, then rows 2-3
        assert_eq!(walk(&module), 8);
    }

    #[test]
    fn test_speed_tempo_and_delay() {
        let pattern = with_effect(TrackerPattern::empty(2, 2), 0, 0, TrackerEffect::SetSpeed(3));
        let mut pattern = with_effect(pattern, 0, 1, TrackerEffect::SetTempo(250));
        pattern.notes[1][0].effect = TrackerEffect::PatternDelay(2);
        pattern.notes[1][1].effect = TrackerEffect::PatternDelay(5);
        let module = module_with(vec![pattern], vec![OrderEntry::Pattern(0)]);

        let mut seq = Sequencer::new(&module, 0);
        seq.begin_row(&module.patterns[0], true);
        assert_eq!((seq.speed, seq.tempo), (3, 250));
        assert_eq!(seq.row_ticks(), 3);
        assert!((seq.row_seconds() - 0.03).abs() < 1e-12);

        seq.advance(&module);
        seq.begin_row(&module.patterns[0], true);
        // First non-zero delay on the row wins
        assert_eq!(seq.row_ticks(), 9);
    }

    #[test]
    fn test_global_volume_tracking() {
        let pattern = with_effect(TrackerPattern::empty(2, 2), 0, 0, TrackerEffect::SetGlobalVolume(40));
        let pattern = with_effect(pattern, 1, 0, TrackerEffect::GlobalVolumeSlide { up: 0, down: 2 });
        let module = module_with(vec![pattern], vec![OrderEntry::Pattern(0)]);

        let mut seq = Sequencer::new(&module, 0);
        seq.begin_row(&module.patterns[0], true);
        assert_eq!(seq.global_volume, 40);
        seq.advance(&module);
        seq.begin_row(&module.patterns[0], true);
        // Five slide ticks at speed 6
        assert_eq!(seq.global_volume, 30);
    }

    #[test]
    fn test_visited_rows() {
        let module = module_with(
            vec![TrackerPattern::empty(4, 2), TrackerPattern::empty(70, 2)],
            vec![OrderEntry::Pattern(0), OrderEntry::Skip, OrderEntry::Pattern(1)],
        );
        let mut visited = VisitedRows::new(&module);
        assert!(!visited.is_visited(2, 69));
        visited.mark(2, 69);
        visited.mark(0, 3);
        assert!(visited.is_visited(2, 69));
        assert!(visited.is_visited(0, 3));
        assert!(!visited.is_visited(2, 68));
        // Out of range is never visited and marking it is ignored
        visited.mark(1, 0);
        assert!(!visited.is_visited(1, 0));
        assert!(!visited.is_visited(0, 4));
    }
}
