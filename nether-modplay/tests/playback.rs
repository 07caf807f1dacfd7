//! End-to-end playback of written XM and MOD files

mod common;

use common::{RATE, SONG_FRAMES, SONG_SECONDS, count_frames, mod_bytes, xm_bytes};
use nether_modplay::{Controls, EndBehaviour, Module, PlaybackStatus, Player, RenderConfig};

fn checksum(samples: &[f32]) -> u64 {
    samples
        .iter()
        .fold(0xcbf2_9ce4_8422_2325u64, |hash, s| {
            (hash ^ s.to_bits() as u64).wrapping_mul(0x0100_0000_01b3)
        })
}

#[test]
fn test_both_formats_play_to_the_end() {
    for bytes in [xm_bytes(), mod_bytes()] {
        let module = Module::from_bytes(&bytes).unwrap();
        assert!((module.duration_seconds() - SONG_SECONDS).abs() < 1e-9);

        let mut player = Player::new(module);
        player.play();
        assert_eq!(count_frames(&mut player, usize::MAX), SONG_FRAMES);
        assert_eq!(player.status(), PlaybackStatus::Stopped);

        let mut out = [0.0f32; 256];
        assert_eq!(player.read_interleaved_stereo(RATE, &mut out), 0);
    }
}

#[test]
fn test_output_is_audible_and_finite() {
    for bytes in [xm_bytes(), mod_bytes()] {
        let mut player = Player::new(Module::from_bytes(&bytes).unwrap());
        player.play();
        let out = player.render(RATE, 44_100);
        assert_eq!(out.len(), 2 * 44_100);
        assert!(out.iter().all(|s| s.is_finite()));
        assert!(out.iter().any(|s| s.abs() > 0.01));
    }
}

#[test]
fn test_rendering_is_deterministic_across_players() {
    let module = Module::from_bytes(&xm_bytes()).unwrap();
    let render = |module: &Module| {
        let mut player = Player::new(module.clone());
        player.play();
        let mut all = Vec::new();
        let mut buffer = vec![0.0f32; 1000 * 2];
        loop {
            let frames = player.read_interleaved_stereo(RATE, &mut buffer);
            if frames == 0 {
                break;
            }
            all.extend_from_slice(&buffer[..frames * 2]);
        }
        all
    };

    let first = render(&module);
    let second = render(&module);
    assert_eq!(first.len(), SONG_FRAMES * 2);
    assert_eq!(checksum(&first), checksum(&second));
}

#[test]
fn test_buffer_size_does_not_change_output() {
    let module = Module::from_bytes(&mod_bytes()).unwrap();

    let mut whole = Player::new(module.clone());
    whole.play();
    let expected = whole.render(RATE, 30_000);

    let mut pieces = Player::new(module);
    pieces.play();
    let mut got = Vec::new();
    let mut buffer = vec![0.0f32; 37 * 2];
    while got.len() < expected.len() {
        let want = ((expected.len() - got.len()) / 2).min(37);
        let frames = pieces.read_interleaved_stereo(RATE, &mut buffer[..want * 2]);
        assert_eq!(frames, want);
        got.extend_from_slice(&buffer[..frames * 2]);
    }
    assert_eq!(got, expected);
}

#[test]
fn test_players_share_a_module_across_threads() {
    let module = Module::from_bytes(&xm_bytes()).unwrap();

    let sums: Vec<u64> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let module = module.clone();
                scope.spawn(move || {
                    let mut player = Player::new(module);
                    player.play();
                    checksum(&player.render(RATE, 100_000))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(sums.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn test_repeat_count_extends_playback() {
    let module = Module::from_bytes(&mod_bytes()).unwrap();

    let mut player = Player::new(module.clone());
    player.set_repeat_count(2).unwrap();
    player.play();
    assert_eq!(count_frames(&mut player, usize::MAX), 3 * SONG_FRAMES);

    let mut player = Player::new(module);
    player.set_repeat_count(-1).unwrap();
    player.play();
    let limit = 4 * SONG_FRAMES;
    assert!(count_frames(&mut player, limit) >= limit);
    assert!(player.is_playing());
}

#[test]
fn test_seek_is_idempotent_and_row_aligned() {
    let module = Module::from_bytes(&xm_bytes()).unwrap();
    let mut player = Player::new(module);
    player.play();
    player.render(RATE, 10_000);

    let first = player.set_position_seconds(10.0);
    let after_first = player.render(RATE, 8192);
    let second = player.set_position_seconds(10.0);
    let after_second = player.render(RATE, 8192);

    // 10.0 s falls in row 83 (9.96 s): order 1, row 19
    assert!((first - 9.96).abs() < 1e-9);
    assert_eq!(first, second);
    assert_eq!(checksum(&after_first), checksum(&after_second));
}

#[test]
fn test_seek_then_play_to_end_counts_remaining_frames() {
    let mut player = Player::new(Module::from_bytes(&mod_bytes()).unwrap());
    player.seek_order_row(1, 0).unwrap();
    player.play();
    // Second pattern only: 64 rows * 6 ticks * 882 frames
    assert_eq!(count_frames(&mut player, usize::MAX), SONG_FRAMES / 2);
}

#[test]
fn test_sync_samples_off_still_seeks() {
    let controls = Controls::new().with("seek.sync_samples", "0").unwrap();
    let module = Module::from_bytes_with_controls(&xm_bytes(), &controls).unwrap();
    assert!(!module.default_config().sync_samples);

    let mut player = Player::new(module);
    player.play();
    let position = player.set_position_seconds(7.68);
    assert!((position - 7.68).abs() < 1e-9);
    assert_eq!(player.current_order(), 1);
    assert_eq!(player.current_row(), 0);
}

#[test]
fn test_load_time_render_controls_become_defaults() {
    let controls = Controls::new()
        .with("play.at_end", "continue")
        .unwrap()
        .with("render.mastergain_millibel", "-300")
        .unwrap();
    let module = Module::from_bytes_with_controls(&mod_bytes(), &controls).unwrap();

    let mut player = Player::new(module);
    assert_eq!(player.config().end_behaviour, EndBehaviour::Continue);
    assert_eq!(player.ctl_get("render.mastergain_millibel"), "-300");

    player.play();
    let mut out = vec![0.0f32; SONG_FRAMES * 2];
    assert_eq!(player.read_interleaved_stereo(RATE, &mut out), SONG_FRAMES);
    // The next read finds the end, then play continues from the top
    assert_eq!(player.read_interleaved_stereo(RATE, &mut out[..2000]), 0);
    assert!(player.is_playing());
    assert_eq!(player.read_interleaved_stereo(RATE, &mut out[..2000]), 1000);
    assert_eq!(player.current_order(), 0);
}

#[test]
fn test_config_file_round_trip_drives_player() {
    let config = RenderConfig {
        stereo_separation_percent: 0,
        ..Default::default()
    };
    let text = config.to_toml_string().unwrap();
    let loaded = RenderConfig::from_toml_str(&text).unwrap();

    let mut player = Player::with_config(Module::from_bytes(&xm_bytes()).unwrap(), loaded);
    player.play();
    let out = player.render(RATE, 20_000);
    for frame in out.chunks_exact(2) {
        assert!((frame[0] - frame[1]).abs() < 1e-6);
    }
}
