//! Playback helpers: lookup tables, waveforms, pitch math and resampling

use nether_tracker::{LoopType, TrackerSample};

use crate::channels::Voice;
use crate::config::Interpolation;

/// Sample rate a note plays back at for C-4 with no finetune
pub const C4_FREQUENCY: f32 = 8363.0;
/// Amiga period of C-4
pub const C4_AMIGA_PERIOD: f32 = 428.0;
/// Linear period of C-4 (6 * 12 * 16 * 4)
pub const C4_LINEAR_PERIOD: f32 = 4608.0;
/// Note number of C-4
pub const C4_NOTE: u8 = 49;
/// Smallest Amiga period ProTracker can reach (B-3)
pub const AMIGA_MIN_PERIOD: f32 = 113.0;
/// Largest Amiga period ProTracker can reach (C-1)
pub const AMIGA_MAX_PERIOD: f32 = 856.0;
/// Upper clamp for periods outside Amiga limits
pub const MAX_PERIOD: f32 = 32000.0;

/// 64-point quarter-sine for vibrato/tremolo
/// Values represent sin(i * π/128) * 127 for i = 0..63
pub const SINE_LUT_64: [i8; 64] = [
    0, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24, 26, 28, 30, 32, 34, 36, 38, 40, 42, 44, 46, 48,
    50, 52, 54, 56, 58, 60, 62, 64, 66, 68, 70, 72, 74, 76, 78, 80, 82, 84, 86, 88, 89, 91, 93, 95,
    96, 98, 100, 101, 103, 104, 106, 107, 108, 110, 111, 112, 113, 114, 115,
];

/// 16-point quarter-sine used for constant-power panning
pub const SINE_LUT: [i8; 16] = [
    0, 12, 24, 37, 48, 60, 71, 81, 90, 98, 106, 112, 118, 122, 125, 127,
];

/// 2^(i/768) for i = 0..=768
///
/// One octave of linear periods is 768 units (12 notes × 64). Entry 768 is
/// kept so interpolation at the top of the octave needs no branch.
pub const LINEAR_FREQ_TABLE: [f32; 769] = {
    let mut table = [0.0f32; 769];
    let mut i = 0;
    while i < 769 {
        // e^(x ln 2) by Taylor series, const-evaluable
        let x = i as f64 / 768.0;
        let ln2 = 0.693147180559945309417232121458176568;
        let t = x * ln2;
        let e_t = 1.0
            + t * (1.0
                + t * (0.5
                    + t * (0.16666666666666666
                        + t * (0.041666666666666664
                            + t * (0.008333333333333333
                                + t * (0.001388888888888889 + t * 0.0001984126984126984))))));
        table[i] = e_t as f32;
        i += 1;
    }
    table
};

/// Vibrato/tremolo waveform value in roughly -1.0..=1.0
///
/// Positions cover a full cycle in 256 steps.
/// - 0: sine
/// - 1: ramp down
/// - 2: square
/// - 3: pseudo-random (deterministic)
pub fn get_waveform_value(waveform: u8, position: u8) -> f32 {
    match waveform & 0x03 {
        0 => {
            let idx = (position & 0x3F) as usize;
            let val = match position >> 6 {
                0 => SINE_LUT_64[idx],
                1 => SINE_LUT_64[63 - idx],
                2 => -SINE_LUT_64[idx],
                _ => -SINE_LUT_64[63 - idx],
            };
            val as f32 / 115.0
        }
        1 => (128i16 - position as i16) as f32 / 128.0,
        2 => {
            if position < 128 {
                1.0
            } else {
                -1.0
            }
        }
        _ => {
            let x = position.wrapping_mul(0x9E) ^ 0x5C;
            (x as f32 / 127.5) - 1.0
        }
    }
}

/// Instrument auto-vibrato waveform (0 = sine, 1 = square, 2 = ramp down, 3 = ramp up)
pub fn auto_vibrato_value(kind: u8, position: u8) -> f32 {
    match kind & 0x03 {
        0 => get_waveform_value(0, position),
        1 => get_waveform_value(2, position),
        2 => get_waveform_value(1, position),
        _ => -get_waveform_value(1, position),
    }
}

/// Linear period of a note: 7680 - (note - 1) * 64 - finetune / 2
pub fn linear_note_period(note: u8, finetune: i8) -> f32 {
    if note == 0 {
        return 0.0;
    }
    let period = 10.0 * 12.0 * 16.0 * 4.0 - ((note - 1) as f32 * 16.0 * 4.0) - (finetune as f32 / 2.0);
    period.max(1.0)
}

/// Frequency of a linear period: 8363 * 2^((4608 - period) / 768)
#[inline]
pub fn linear_period_to_frequency(period: f32) -> f32 {
    if period <= 0.0 {
        return 0.0;
    }

    let diff = C4_LINEAR_PERIOD - period;
    let octaves = (diff / 768.0).floor();
    let frac = diff - (octaves * 768.0);

    let idx = (frac as usize).min(767);
    let t = frac - idx as f32;
    let freq_frac = LINEAR_FREQ_TABLE[idx] * (1.0 - t) + LINEAR_FREQ_TABLE[idx + 1] * t;

    let octave_scale = if octaves >= 0.0 {
        (1u32 << (octaves as u32).min(31)) as f32
    } else {
        1.0 / (1u32 << ((-octaves) as u32).min(31)) as f32
    };

    C4_FREQUENCY * freq_frac * octave_scale
}

/// Amiga period of a note; finetune is in 1/128 semitones
pub fn amiga_note_period(note: u8, finetune: i8) -> f32 {
    if note == 0 {
        return 0.0;
    }
    let semitones = (note as f32 - C4_NOTE as f32) + finetune as f32 / 128.0;
    C4_AMIGA_PERIOD * 2f32.powf(-semitones / 12.0)
}

/// Frequency of an Amiga period, tuned so period 428 plays at 8363 Hz
#[inline]
pub fn amiga_period_to_frequency(period: f32) -> f32 {
    if period <= 0.0 {
        return 0.0;
    }
    C4_FREQUENCY * C4_AMIGA_PERIOD / period
}

/// Constant-power pan gains for pan in -1.0..=1.0
#[inline]
pub fn fast_pan_gains(pan: f32) -> (f32, f32) {
    let pos = (pan.clamp(-1.0, 1.0) + 1.0) * 7.5;
    let idx = (pos as usize).min(14);
    let frac = pos - idx as f32;

    // Right reads the table forward (sin), left reads it reversed (cos)
    let sin_val = SINE_LUT[idx] as f32 * (1.0 - frac) + SINE_LUT[idx + 1] as f32 * frac;
    let cos_val = SINE_LUT[15 - idx] as f32 * (1.0 - frac) + SINE_LUT[14 - idx] as f32 * frac;

    (cos_val / 127.0, sin_val / 127.0)
}

/// Output frames per tick (fractional); the caller carries the remainder
///
/// XM/MOD timing: one tick lasts 2.5 / tempo seconds.
pub fn frames_per_tick(sample_rate: u32, tempo: u16, tempo_factor: f64) -> f64 {
    sample_rate as f64 * 2.5 / (tempo.max(1) as f64 * tempo_factor)
}

/// Usable loop range of a sample clamped to its data, if any
#[inline]
fn loop_bounds(sample: &TrackerSample) -> Option<(i64, i64)> {
    if !sample.has_loop() {
        return None;
    }
    let end = (sample.loop_end as usize).min(sample.len()) as i64;
    let start = sample.loop_start as i64;
    (end > start).then_some((start, end))
}

/// Frame at an integer index, following the sample's loop past its end
#[inline]
fn frame_at(sample: &TrackerSample, index: i64) -> f32 {
    let data = &sample.data;
    let len = data.len() as i64;
    let index = match loop_bounds(sample) {
        Some((start, end)) if index >= end => {
            let span = end - start;
            let over = index - end;
            match sample.loop_type {
                LoopType::PingPong => {
                    let k = over % (2 * span);
                    if k < span { end - 1 - k } else { start + (k - span) }
                }
                _ => start + over % span,
            }
        }
        _ => index,
    };
    if index < 0 {
        data.first().map_or(0.0, |&s| s as f32 / 32768.0)
    } else if index >= len {
        0.0
    } else {
        data[index as usize] as f32 / 32768.0
    }
}

/// Resample a sample at a fractional position
pub fn interpolate(sample: &TrackerSample, position: f64, interpolation: Interpolation) -> f32 {
    let base = position.floor();
    let i = base as i64;
    let t = (position - base) as f32;
    match interpolation {
        Interpolation::Nearest => frame_at(sample, i),
        Interpolation::Linear => {
            let a = frame_at(sample, i);
            let b = frame_at(sample, i + 1);
            a + (b - a) * t
        }
        Interpolation::Cubic => {
            let y0 = frame_at(sample, i - 1);
            let y1 = frame_at(sample, i);
            let y2 = frame_at(sample, i + 1);
            let y3 = frame_at(sample, i + 2);
            let c1 = 0.5 * (y2 - y0);
            let c2 = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
            let c3 = 0.5 * (y3 - y0) + 1.5 * (y1 - y2);
            ((c3 * t + c2) * t + c1) * t + y1
        }
    }
}

/// Move a voice's sample position, handling loops and the sample end
///
/// Returns false once a non-looping sample has run past its last frame.
pub fn advance_position(voice: &mut Voice, sample: &TrackerSample, increment: f64) -> bool {
    voice.position += increment * voice.direction as f64;

    let Some((start, end)) = loop_bounds(sample) else {
        return voice.position < sample.len() as f64;
    };
    let (start, end) = (start as f64, end as f64);

    match sample.loop_type {
        LoopType::PingPong => {
            let span = end - start;
            let over = if voice.direction > 0 && voice.position >= end {
                Some(voice.position - end)
            } else if voice.direction < 0 && voice.position < start {
                Some(start - voice.position)
            } else {
                None
            };
            if let Some(over) = over {
                // Whole back-and-forth passes leave position and direction unchanged
                let rest = over.rem_euclid(2.0 * span);
                if rest < span {
                    voice.position = if voice.direction > 0 { end - rest } else { start + rest };
                    voice.direction = -voice.direction;
                } else {
                    let rest = rest - span;
                    voice.position = if voice.direction > 0 { start + rest } else { end - rest };
                }
            }
        }
        _ => {
            if voice.position >= end {
                voice.position = start + (voice.position - start).rem_euclid(end - start);
            }
        }
    }
    true
}

/// Produce one frame of a voice, with the anti-click fades
///
/// `fade_out_frames` is the length of the tail faded out when a
/// non-looping sample ends.
pub fn sample_voice(
    voice: &mut Voice,
    sample: &TrackerSample,
    increment: f64,
    interpolation: Interpolation,
    fade_out_frames: u32,
) -> f32 {
    if voice.fade_out_remaining > 0 {
        let ratio = voice.fade_out_remaining as f32 / voice.fade_out_length.max(1) as f32;
        voice.fade_out_remaining -= 1;
        let value = voice.prev_sample * ratio;
        if voice.fade_out_remaining == 0 {
            voice.silence();
        }
        return value;
    }

    let mut value = interpolate(sample, voice.position, interpolation);

    // Crossfade from whatever the voice played before the note started
    if voice.fade_in_remaining > 0 {
        let ratio = 1.0 - voice.fade_in_remaining as f32 / voice.fade_in_length.max(1) as f32;
        voice.fade_in_remaining -= 1;
        value = voice.prev_sample * (1.0 - ratio) + value * ratio;
    }
    if voice.fade_in_remaining == 0 {
        voice.prev_sample = value;
    }

    if !advance_position(voice, sample, increment) {
        if fade_out_frames > 0 {
            voice.fade_out_remaining = fade_out_frames;
            voice.fade_out_length = fade_out_frames;
        } else {
            voice.silence();
        }
    }

    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_sample(len: usize, loop_type: LoopType, loop_start: u32, loop_end: u32) -> TrackerSample {
        TrackerSample {
            data: (0..len).map(|i| (i as i16) * 1000).collect(),
            loop_type,
            loop_start,
            loop_end,
            default_volume: 64,
            ..Default::default()
        }
    }

    #[test]
    fn test_linear_periods() {
        assert_eq!(linear_note_period(49, 0), 4608.0);
        assert_eq!(linear_note_period(61, 0), 4608.0 - 768.0);
        assert!(linear_note_period(49, 64) < 4608.0);

        let c4 = linear_period_to_frequency(linear_note_period(49, 0));
        assert!((c4 - 8363.0).abs() < 0.5, "got {c4}");
        let c5 = linear_period_to_frequency(linear_note_period(61, 0));
        assert!((c5 / c4 - 2.0).abs() < 0.001);
        let c3 = linear_period_to_frequency(linear_note_period(37, 0));
        assert!((c4 / c3 - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_amiga_periods() {
        assert!((amiga_note_period(49, 0) - 428.0).abs() < 0.01);
        assert!((amiga_note_period(61, 0) - 214.0).abs() < 0.01);
        assert!((amiga_period_to_frequency(428.0) - 8363.0).abs() < 0.01);
        // One finetune step down is 1/8 semitone flat
        assert!(amiga_note_period(49, -16) > 428.0);
        assert_eq!(amiga_period_to_frequency(0.0), 0.0);
    }

    #[test]
    fn test_waveforms() {
        assert!(get_waveform_value(0, 0).abs() < 0.1);
        assert!(get_waveform_value(0, 64) > 0.9);
        assert!(get_waveform_value(0, 192) < -0.9);
        assert_eq!(get_waveform_value(2, 10), 1.0);
        assert_eq!(get_waveform_value(2, 200), -1.0);
        assert_eq!(get_waveform_value(1, 0), 1.0);
        // Square auto-vibrato maps to the square waveform
        assert_eq!(auto_vibrato_value(1, 200), -1.0);
        assert_eq!(auto_vibrato_value(3, 0), -1.0);
        // Random is repeatable
        assert_eq!(get_waveform_value(3, 77), get_waveform_value(3, 77));
    }

    #[test]
    fn test_pan_gains() {
        let (l, r) = fast_pan_gains(0.0);
        assert!((l - r).abs() < 0.01);
        assert!((l - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.05);
        assert_eq!(fast_pan_gains(-1.0), (1.0, 0.0));
        let (l, r) = fast_pan_gains(1.0);
        assert!(l.abs() < 1e-6 && (r - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_frames_per_tick() {
        assert_eq!(frames_per_tick(44100, 125, 1.0), 882.0);
        assert_eq!(frames_per_tick(44100, 125, 2.0), 441.0);
        assert!((frames_per_tick(48000, 125, 1.0) - 960.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_kinds() {
        let sample = ramp_sample(8, LoopType::None, 0, 0);
        assert!((interpolate(&sample, 2.5, Interpolation::Nearest) - 2000.0 / 32768.0).abs() < 1e-6);
        assert!((interpolate(&sample, 2.5, Interpolation::Linear) - 2500.0 / 32768.0).abs() < 1e-6);
        // Hermite reproduces a straight line exactly
        assert!((interpolate(&sample, 2.5, Interpolation::Cubic) - 2500.0 / 32768.0).abs() < 1e-5);
        // Past the end of a one-shot sample reads silence
        assert_eq!(interpolate(&sample, 20.0, Interpolation::Linear), 0.0);
    }

    #[test]
    fn test_loop_aware_neighbours() {
        let sample = ramp_sample(8, LoopType::Forward, 2, 6);
        // Index 6 wraps to the loop start
        assert_eq!(frame_at(&sample, 6), frame_at(&sample, 2));
        assert_eq!(frame_at(&sample, 9), frame_at(&sample, 5));

        let pingpong = ramp_sample(8, LoopType::PingPong, 2, 6);
        assert_eq!(frame_at(&pingpong, 6), frame_at(&pingpong, 5));
        assert_eq!(frame_at(&pingpong, 9), frame_at(&pingpong, 2));
        assert_eq!(frame_at(&pingpong, 10), frame_at(&pingpong, 2));
    }

    #[test]
    fn test_advance_forward_loop() {
        let sample = ramp_sample(100, LoopType::Forward, 20, 60);
        let mut voice = Voice::default();
        voice.reset();
        voice.position = 58.0;
        assert!(advance_position(&mut voice, &sample, 5.0));
        assert!((voice.position - 23.0).abs() < 1e-9);
        // Increments longer than the loop still land inside it
        assert!(advance_position(&mut voice, &sample, 100.0));
        assert!(voice.position >= 20.0 && voice.position < 60.0);
    }

    #[test]
    fn test_advance_pingpong_loop() {
        let sample = ramp_sample(100, LoopType::PingPong, 20, 60);
        let mut voice = Voice::default();
        voice.reset();
        voice.position = 58.0;
        advance_position(&mut voice, &sample, 4.0);
        assert_eq!(voice.direction, -1);
        assert!((voice.position - 58.0).abs() < 1e-9);
        voice.position = 21.0;
        advance_position(&mut voice, &sample, 3.0);
        assert_eq!(voice.direction, 1);
        assert!((voice.position - 22.0).abs() < 1e-9);

        // Several passes at once: 22 + 250 overshoots by 212 = 2 * 80 + 52
        advance_position(&mut voice, &sample, 250.0);
        assert_eq!(voice.direction, 1);
        assert!((voice.position - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_shot_end_fades_out() {
        let sample = ramp_sample(4, LoopType::None, 0, 0);
        let mut voice = Voice::default();
        voice.reset();
        voice.active = true;
        voice.position = 3.0;
        sample_voice(&mut voice, &sample, 1.0, Interpolation::Linear, 4);
        assert_eq!(voice.fade_out_remaining, 4);
        for _ in 0..4 {
            sample_voice(&mut voice, &sample, 1.0, Interpolation::Linear, 4);
        }
        assert!(!voice.active);

        let mut voice = Voice::default();
        voice.reset();
        voice.active = true;
        voice.position = 3.5;
        sample_voice(&mut voice, &sample, 1.0, Interpolation::Linear, 0);
        assert!(!voice.active);
    }
}
