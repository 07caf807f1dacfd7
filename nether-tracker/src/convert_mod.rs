//! MOD → TrackerModule conversion

use crate::{
    FormatFlags, LoopType, OrderEntry, SourceFormat, TrackerEffect, TrackerInstrument,
    TrackerModule, TrackerNote, TrackerPattern, TrackerSample, VolumeEffect, convert_orders,
    message_from_names,
};

/// Hard-left / hard-right positions of the Amiga LRRL channel layout
const PAN_LEFT: u8 = 0;
const PAN_RIGHT: u8 = 255;

/// Convert a MOD module to the unified TrackerModule format
///
/// Every sample slot becomes an instrument playing that sample over the whole
/// keyboard, so pattern sample numbers can be used as instrument numbers.
pub fn from_mod_module(module: &nether_mod::ModModule) -> TrackerModule {
    let mut warnings = module.warnings.clone();

    let samples: Vec<TrackerSample> = module.samples.iter().map(convert_mod_sample).collect();
    let instruments = module
        .samples
        .iter()
        .enumerate()
        .map(|(index, sample)| TrackerInstrument::single_sample(sample.name.clone(), index as u16))
        .collect();

    let patterns: Vec<TrackerPattern> = module
        .patterns
        .iter()
        .map(|pattern| convert_mod_pattern(pattern, module.num_channels))
        .collect();

    let orders: Vec<OrderEntry> =
        convert_orders(&module.order_table, patterns.len(), &mut warnings);

    // ProTracker writes 127 here; anything past the song means "from the top"
    let restart_position = if (module.restart_position as usize) < orders.len() {
        module.restart_position as u16
    } else {
        0
    };

    let channel_panning = (0..module.num_channels)
        .map(|channel| match channel % 4 {
            0 | 3 => PAN_LEFT,
            _ => PAN_RIGHT,
        })
        .collect();

    TrackerModule {
        name: module.title.clone(),
        source: SourceFormat::Mod,
        tracker: tracker_name_for_tag(&module.tag).to_string(),
        num_channels: module.num_channels,
        initial_speed: 6,
        initial_tempo: 125,
        global_volume: 64,
        orders,
        restart_position,
        patterns,
        instruments,
        message: message_from_names(module.samples.iter().map(|s| s.name.as_str())),
        samples,
        channel_panning,
        format: FormatFlags::AMIGA_LIMITS,
        warnings,
    }
}

/// Best guess at the tracker that wrote a MOD, from its format tag
pub fn tracker_name_for_tag(tag: &[u8; 4]) -> &'static str {
    match tag {
        b"M.K." | b"M!K!" => "ProTracker",
        b"M&K!" | b"N.T." => "NoiseTracker",
        b"FLT4" => "StarTrekker",
        b"CD81" | b"OKTA" | b"OCTA" => "Oktalyzer",
        [_, b'C', b'H', b'N'] | [_, _, b'C', b'H'] => "FastTracker",
        [_, _, b'C', b'N'] => "TakeTracker",
        _ => "Generic MOD-compatible tracker",
    }
}

fn convert_mod_sample(sample: &nether_mod::ModSample) -> TrackerSample {
    let (loop_type, loop_start, loop_end) = if sample.has_loop() {
        (LoopType::Forward, sample.loop_start, sample.loop_end())
    } else {
        (LoopType::None, 0, 0)
    };

    TrackerSample {
        name: sample.name.clone(),
        data: sample.data.clone(),
        default_volume: sample.volume.min(64),
        default_pan: None,
        // MOD finetune steps are 1/8 semitone, ours are 1/128
        finetune: sample.finetune.clamp(-8, 7) * 16,
        relative_note: 0,
        loop_start,
        loop_end,
        loop_type,
    }
}

fn convert_mod_pattern(pattern: &nether_mod::ModPattern, num_channels: u8) -> TrackerPattern {
    let notes = pattern
        .rows
        .iter()
        .map(|row| {
            (0..num_channels as usize)
                .map(|ch| row.get(ch).map(convert_mod_note).unwrap_or_default())
                .collect()
        })
        .collect();

    TrackerPattern {
        num_rows: pattern.rows.len() as u16,
        notes,
    }
}

fn convert_mod_note(cell: &nether_mod::ModNote) -> TrackerNote {
    TrackerNote {
        note: cell.note(),
        instrument: cell.sample,
        volume: 0,
        effect_cmd: cell.effect,
        effect_param: cell.param,
        effect: TrackerEffect::from_protracker(cell.effect, cell.param),
        vol_effect: VolumeEffect::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nether_mod::{ModModule, ModNote, ModPattern, ModSample};

    fn demo_module(num_channels: u8) -> ModModule {
        let mut pattern = ModPattern::empty(num_channels);
        pattern.rows[0][0] = ModNote {
            period: 428,
            sample: 2,
            effect: 0xD,
            param: 0x32,
        };
        pattern.rows[1][1] = ModNote {
            period: 0,
            sample: 0,
            effect: 0xE,
            param: 0x61,
        };

        let mut samples = vec![ModSample::default(); nether_mod::NUM_SAMPLES];
        samples[1] = ModSample {
            name: "snare".into(),
            finetune: -3,
            volume: 50,
            loop_start: 4,
            loop_length: 8,
            data: vec![100; 16],
        };
        samples[2] = ModSample {
            name: "kick".into(),
            loop_length: 2,
            data: vec![0; 16],
            ..Default::default()
        };

        ModModule {
            title: "mod demo".into(),
            tag: *b"M.K.",
            num_channels,
            samples,
            restart_position: 127,
            order_table: vec![0, 0, 3],
            patterns: vec![pattern],
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_module_conversion() {
        let module = from_mod_module(&demo_module(4));

        assert_eq!(module.name, "mod demo");
        assert_eq!(module.source, SourceFormat::Mod);
        assert_eq!(module.tracker, "ProTracker");
        assert_eq!((module.initial_speed, module.initial_tempo), (6, 125));
        assert!(module.uses_amiga_limits());
        assert!(!module.uses_linear_slides());
        assert!(!module.uses_instruments());
        assert_eq!(module.restart_position, 0);
        assert_eq!(module.instruments.len(), 31);
        assert_eq!(module.samples.len(), 31);
        assert_eq!(
            module.orders,
            vec![OrderEntry::Pattern(0), OrderEntry::Pattern(0), OrderEntry::Skip]
        );
        assert_eq!(module.warnings.len(), 1);
        assert_eq!(module.message.as_deref(), Some("\nsnare\nkick"));
    }

    #[test]
    fn test_lrrl_panning() {
        let module = from_mod_module(&demo_module(8));
        assert_eq!(
            module.channel_panning,
            vec![0, 255, 255, 0, 0, 255, 255, 0]
        );
    }

    #[test]
    fn test_cells() {
        let module = from_mod_module(&demo_module(4));
        let pattern = &module.patterns[0];
        assert_eq!(pattern.num_rows, 64);

        let cell = pattern.get_note(0, 0).unwrap();
        assert_eq!(cell.note, 49);
        assert_eq!(cell.instrument, 2);
        assert_eq!(cell.effect, TrackerEffect::PatternBreak(32));
        assert_eq!(cell.vol_effect, VolumeEffect::None);

        let cell = pattern.get_note(1, 1).unwrap();
        assert!(!cell.has_note());
        assert_eq!(cell.effect, TrackerEffect::PatternLoop(1));

        // Instrument 2 is the "snare" slot and plays it on every key
        assert_eq!(module.sample_for(2, 1).map(|s| s.name.as_str()), Some("snare"));
    }

    #[test]
    fn test_samples() {
        let module = from_mod_module(&demo_module(4));

        let snare = &module.samples[1];
        assert_eq!(snare.finetune, -48);
        assert_eq!(snare.default_volume, 50);
        assert_eq!(snare.loop_type, LoopType::Forward);
        assert_eq!((snare.loop_start, snare.loop_end), (4, 12));
        assert_eq!(snare.default_pan, None);

        // A two-frame loop is ProTracker's "no loop"
        assert_eq!(module.samples[2].loop_type, LoopType::None);
    }

    #[test]
    fn test_tracker_names() {
        assert_eq!(tracker_name_for_tag(b"M.K."), "ProTracker");
        assert_eq!(tracker_name_for_tag(b"8CHN"), "FastTracker");
        assert_eq!(tracker_name_for_tag(b"16CH"), "FastTracker");
        assert_eq!(tracker_name_for_tag(b"16CN"), "TakeTracker");
        assert_eq!(tracker_name_for_tag(b"FLT4"), "StarTrekker");
    }
}
