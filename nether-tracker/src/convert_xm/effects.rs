//! XM effect conversion functions

use crate::{TrackerEffect, VolumeEffect};
use nether_xm::effects;

/// Convert the XM volume column
pub fn convert_xm_volume(vol: u8) -> VolumeEffect {
    let value = vol & 0x0F;
    match vol {
        0x10..=0x50 => VolumeEffect::SetVolume(vol - 0x10),
        0x60..=0x6F => VolumeEffect::SlideDown(value),
        0x70..=0x7F => VolumeEffect::SlideUp(value),
        0x80..=0x8F => VolumeEffect::FineDown(value),
        0x90..=0x9F => VolumeEffect::FineUp(value),
        0xA0..=0xAF => VolumeEffect::VibratoSpeed(value),
        0xB0..=0xBF => VolumeEffect::VibratoDepth(value),
        0xC0..=0xCF => VolumeEffect::SetPanning(value << 4),
        0xD0..=0xDF => VolumeEffect::PanSlideLeft(value),
        0xE0..=0xEF => VolumeEffect::PanSlideRight(value),
        0xF0..=0xFF => VolumeEffect::TonePortamento(value),
        _ => VolumeEffect::None,
    }
}

/// Convert an XM effect command to the unified TrackerEffect
pub fn convert_xm_effect(effect: u8, param: u8) -> TrackerEffect {
    let (hi, lo) = (param >> 4, param & 0x0F);
    match effect {
        0x00..=0x0F => TrackerEffect::from_protracker(effect, param),

        // Gxx - Set global volume
        effects::SET_GLOBAL_VOLUME => TrackerEffect::SetGlobalVolume(param.min(64)),

        // Hxy - Global volume slide
        effects::GLOBAL_VOLUME_SLIDE => TrackerEffect::GlobalVolumeSlide { up: hi, down: lo },

        // Kxx - Key off at tick xx
        effects::KEY_OFF => TrackerEffect::KeyOff(param),

        // Lxx - Set envelope position
        effects::SET_ENVELOPE_POS => TrackerEffect::SetEnvelopePosition(param),

        // Pxy - Panning slide (x = right, y = left)
        effects::PANNING_SLIDE => TrackerEffect::PanningSlide {
            left: lo,
            right: hi,
        },

        // Rxy - Multi retrig (x = volume change, y = interval)
        effects::MULTI_RETRIG => TrackerEffect::MultiRetrig {
            ticks: lo,
            volume: hi,
        },

        // Txy - Tremor
        effects::TREMOR => TrackerEffect::Tremor {
            ontime: hi,
            offtime: lo,
        },

        // X1y / X2y - Extra fine portamento
        effects::EXTRA_FINE_PORTA => match hi {
            0x1 => TrackerEffect::ExtraFinePortaUp(lo),
            0x2 => TrackerEffect::ExtraFinePortaDown(lo),
            _ => TrackerEffect::None,
        },

        _ => TrackerEffect::None,
    }
}
