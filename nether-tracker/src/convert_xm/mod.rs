//! XM → TrackerModule conversion

use crate::{
    FormatFlags, PAN_CENTER, SourceFormat, TrackerModule, TrackerNote, TrackerPattern,
    convert_orders, message_from_names,
};

mod effects;
mod instruments;


pub use effects::{convert_xm_effect, convert_xm_volume};

/// Convert an XM module to the unified TrackerModule format
pub fn from_xm_module(xm: &nether_xm::XmModule) -> TrackerModule {
    let mut warnings = xm.warnings.clone();

    let patterns: Vec<TrackerPattern> = xm.patterns.iter().map(convert_xm_pattern).collect();

    // XM keeps samples inside instruments; flatten them and remap the keyboards
    let mut samples = Vec::with_capacity(xm.total_samples());
    let mut instruments = Vec::with_capacity(xm.instruments.len());
    for instr in &xm.instruments {
        instruments.push(instruments::convert_xm_instrument(instr, samples.len()));
        samples.extend(instr.samples.iter().map(instruments::convert_xm_sample));
    }

    let orders = convert_orders(&xm.order_table, patterns.len(), &mut warnings);

    let mut format = FormatFlags::INSTRUMENTS;
    if xm.linear_frequency_table {
        format = format | FormatFlags::LINEAR_SLIDES;
    }

    let restart_position = if (xm.restart_position as usize) < orders.len() {
        xm.restart_position
    } else {
        0
    };

    let tracker = if xm.tracker_name.is_empty() {
        "FastTracker II".to_string()
    } else {
        xm.tracker_name.clone()
    };

    TrackerModule {
        name: xm.name.clone(),
        source: SourceFormat::Xm,
        tracker,
        num_channels: xm.num_channels,
        initial_speed: xm.default_speed.clamp(1, 31) as u8,
        initial_tempo: xm.default_bpm.clamp(32, 255) as u8,
        global_volume: 64,
        orders,
        restart_position,
        patterns,
        message: message_from_names(xm.instruments.iter().map(|i| i.name.as_str())),
        instruments,
        samples,
        channel_panning: vec![PAN_CENTER; xm.num_channels as usize],
        format,
        warnings,
    }
}

fn convert_xm_pattern(xm_pat: &nether_xm::XmPattern) -> TrackerPattern {
    let notes = xm_pat
        .notes
        .iter()
        .map(|row| row.iter().map(convert_xm_note).collect())
        .collect();

    TrackerPattern {
        num_rows: xm_pat.num_rows,
        notes,
    }
}

fn convert_xm_note(xm_note: &nether_xm::XmNote) -> TrackerNote {
    // XM note numbering already matches ours: 0=none, 1-96=C-0..B-7, 97=note-off
    let note = if xm_note.is_note_off() {
        TrackerNote::NOTE_OFF
    } else if (nether_xm::NOTE_MIN..=nether_xm::NOTE_MAX).contains(&xm_note.note) {
        xm_note.note
    } else {
        0
    };

    TrackerNote {
        note,
        instrument: xm_note.instrument,
        volume: xm_note.volume,
        effect_cmd: xm_note.effect,
        effect_param: xm_note.effect_param,
        effect: convert_xm_effect(xm_note.effect, xm_note.effect_param),
        vol_effect: convert_xm_volume(xm_note.volume),
    }
}
