//! XM instrument, sample and envelope conversion

use crate::{
    EnvelopeFlags, LoopType, NUM_NOTES, TrackerEnvelope, TrackerInstrument, TrackerSample,
};

/// Convert an instrument whose samples start at `first_sample` in the flat list
pub(super) fn convert_xm_instrument(
    xm_instr: &nether_xm::XmInstrument,
    first_sample: usize,
) -> TrackerInstrument {
    let num_samples = xm_instr.samples.len();
    let mut sample_map = [None; NUM_NOTES];
    for (entry, &local) in sample_map.iter_mut().zip(xm_instr.sample_map.iter()) {
        if (local as usize) < num_samples {
            *entry = Some((first_sample + local as usize) as u16);
        }
    }

    TrackerInstrument {
        name: xm_instr.name.clone(),
        sample_map,
        volume_envelope: xm_instr.volume_envelope.as_ref().map(convert_xm_envelope),
        panning_envelope: xm_instr.panning_envelope.as_ref().map(convert_xm_envelope),
        fadeout: xm_instr.volume_fadeout,
        auto_vibrato_type: xm_instr.vibrato_type,
        auto_vibrato_sweep: xm_instr.vibrato_sweep,
        auto_vibrato_depth: xm_instr.vibrato_depth,
        auto_vibrato_rate: xm_instr.vibrato_rate,
    }
}

pub(super) fn convert_xm_sample(xm_sample: &nether_xm::XmSample) -> TrackerSample {
    let loop_type = if !xm_sample.has_loop() {
        LoopType::None
    } else if xm_sample.is_pingpong_loop() {
        LoopType::PingPong
    } else {
        LoopType::Forward
    };
    let (loop_start, loop_end) = if loop_type == LoopType::None {
        (0, 0)
    } else {
        (xm_sample.loop_start, xm_sample.loop_end())
    };

    TrackerSample {
        name: xm_sample.name.clone(),
        data: xm_sample.data.clone(),
        default_volume: xm_sample.volume.min(64),
        default_pan: Some(xm_sample.panning),
        finetune: xm_sample.finetune,
        relative_note: xm_sample.relative_note,
        loop_start,
        loop_end,
        loop_type,
    }
}

fn convert_xm_envelope(xm_env: &nether_xm::XmEnvelope) -> TrackerEnvelope {
    TrackerEnvelope {
        points: xm_env
            .points
            .iter()
            .map(|&(x, y)| (x, y.min(64) as u8))
            .collect(),
        loop_begin: xm_env.loop_start,
        loop_end: xm_env.loop_end,
        sustain_point: xm_env.sustain_point,
        flags: convert_xm_envelope_flags(xm_env),
    }
}

fn convert_xm_envelope_flags(xm_env: &nether_xm::XmEnvelope) -> EnvelopeFlags {
    let mut flags = EnvelopeFlags::empty();

    if xm_env.enabled {
        flags = flags | EnvelopeFlags::ENABLED;
    }
    if xm_env.sustain_enabled {
        flags = flags | EnvelopeFlags::SUSTAIN;
    }
    if xm_env.loop_enabled {
        flags = flags | EnvelopeFlags::LOOP;
    }

    flags
}
