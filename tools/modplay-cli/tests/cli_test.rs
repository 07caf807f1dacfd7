//! Integration tests for the modplay commands
//!
//! Writes a small XM file to a temp dir, then runs the command entry points
//! against it.

use std::path::{Path, PathBuf};

use modplay_cli::{info, load_module, parse_controls, patterns, render};
use nether_modplay::Controls;
use nether_xm::{XmInstrument, XmModule, XmNote, XmPattern, XmSample};
use tempfile::tempdir;

/// 16 rows at speed 6 / tempo 125 and 44.1 kHz
const FRAMES: usize = 16 * 6 * 882;

fn write_fixture(dir: &Path) -> PathBuf {
    let mut pattern = XmPattern::empty(16, 2);
    pattern.notes[0][0] = XmNote {
        note: 49,
        instrument: 1,
        ..Default::default()
    };
    pattern.notes[8][1] = XmNote {
        note: 56,
        instrument: 1,
        effect: 0x0C,
        effect_param: 0x20,
        ..Default::default()
    };

    let module = XmModule {
        name: "cli fixture".to_string(),
        num_channels: 2,
        num_patterns: 1,
        num_instruments: 1,
        song_length: 1,
        order_table: vec![0],
        patterns: vec![pattern],
        instruments: vec![XmInstrument {
            name: "square".to_string(),
            samples: vec![XmSample {
                name: "square".to_string(),
                loop_start: 0,
                loop_length: 32,
                volume: 64,
                loop_type: 1,
                is_16bit: true,
                panning: 128,
                data: (0..32).map(|i| if i < 16 { 12000 } else { -12000 }).collect(),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    };

    let path = dir.join("fixture.xm");
    std::fs::write(&path, nether_xm::write_xm(&module)).expect("Failed to write fixture");
    path
}

fn render_args(file: PathBuf, output: PathBuf) -> render::RenderArgs {
    render::RenderArgs {
        file,
        output: Some(output),
        rate: 44100,
        subsong: 0,
        repeat: None,
        seconds: None,
        config: None,
        ctl: Vec::new(),
        checksum: false,
    }
}

#[test]
fn test_render_writes_float_wav() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_fixture(dir.path());
    let output = dir.path().join("out.wav");

    render::execute(render_args(input, output.clone())).expect("Render failed");

    let mut reader = hound::WavReader::open(&output).expect("Failed to open WAV");
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.bits_per_sample, 32);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);
    assert_eq!(reader.duration() as usize, FRAMES);

    let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
    assert!(samples.iter().any(|s| s.abs() > 0.01));
}

#[test]
fn test_render_defaults_output_next_to_input() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_fixture(dir.path());

    let mut args = render_args(input, PathBuf::new());
    args.output = None;
    render::execute(args).expect("Render failed");
    assert!(dir.path().join("fixture.wav").exists());
}

#[test]
fn test_checksum_is_stable() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_fixture(dir.path());
    let module = load_module(&input, &Controls::new()).unwrap();
    let args = render_args(input, dir.path().join("unused.wav"));

    let first = render::render_samples(&module, module.default_config().clone(), &args).unwrap();
    let second = render::render_samples(&module, module.default_config().clone(), &args).unwrap();
    assert_eq!(first.len(), FRAMES * 2);
    assert_eq!(render::checksum(&first), render::checksum(&second));
}

#[test]
fn test_seconds_and_repeat_limits() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_fixture(dir.path());
    let module = load_module(&input, &Controls::new()).unwrap();

    let mut args = render_args(input, dir.path().join("unused.wav"));
    args.seconds = Some(0.5);
    let samples = render::render_samples(&module, module.default_config().clone(), &args).unwrap();
    assert_eq!(samples.len(), 22050 * 2);

    args.seconds = None;
    args.repeat = Some(1);
    let samples = render::render_samples(&module, module.default_config().clone(), &args).unwrap();
    assert_eq!(samples.len(), 2 * FRAMES * 2);

    // Endless playback needs a time limit
    args.repeat = Some(-1);
    assert!(render::render_samples(&module, module.default_config().clone(), &args).is_err());
    args.seconds = Some(5.0);
    let samples = render::render_samples(&module, module.default_config().clone(), &args).unwrap();
    assert_eq!(samples.len(), 5 * 44100 * 2);
}

#[test]
fn test_render_rejects_bad_arguments() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_fixture(dir.path());
    let module = load_module(&input, &Controls::new()).unwrap();

    let mut args = render_args(input.clone(), dir.path().join("unused.wav"));
    args.rate = 1000;
    assert!(render::render_samples(&module, module.default_config().clone(), &args).is_err());

    let mut args = render_args(input.clone(), dir.path().join("unused.wav"));
    args.subsong = 3;
    assert!(render::render_samples(&module, module.default_config().clone(), &args).is_err());

    let mut args = render_args(input, dir.path().join("unused.wav"));
    args.ctl = vec!["render.interpolationfilter_length=5".to_string()];
    assert!(render::execute(args).is_err());
}

#[test]
fn test_render_with_config_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_fixture(dir.path());
    let config_path = dir.path().join("render.toml");
    std::fs::write(&config_path, "stereo_separation_percent = 0\n").unwrap();

    let output = dir.path().join("mono.wav");
    let mut args = render_args(input, output.clone());
    args.config = Some(config_path);
    render::execute(args).expect("Render failed");

    let mut reader = hound::WavReader::open(&output).expect("Failed to open WAV");
    let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
    for frame in samples.chunks_exact(2) {
        assert!((frame[0] - frame[1]).abs() < 1e-6);
    }
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let err = load_module(&dir.path().join("nope.xm"), &Controls::new()).unwrap_err();
    assert!(err.to_string().contains("Failed to read"));

    let garbage = dir.path().join("garbage.xm");
    std::fs::write(&garbage, [0u8; 100]).unwrap();
    let err = load_module(&garbage, &Controls::new()).unwrap_err();
    assert!(err.to_string().contains("Failed to load"));
}

#[test]
fn test_info_and_patterns_text() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_fixture(dir.path());
    let controls = parse_controls(&["load.skip_samples=1".to_string()]).unwrap();
    let module = load_module(&input, &controls).unwrap();

    let text = info::describe(&module);
    assert!(text.contains("Title:       cli fixture"));
    assert!(text.contains("Channels:    2"));
    assert!(text.contains("Duration:    0:01.920"));
    assert!(text.contains("01 square"));

    let grid = patterns::dump_pattern(&module, 0).unwrap();
    assert!(grid.starts_with("Pattern 0 (16 rows)"));
    assert_eq!(grid.lines().count(), 17);
    assert!(grid.lines().nth(1).unwrap().starts_with("000*|C-4 01"));
    assert!(patterns::dump_pattern(&module, 1).is_err());

    info::execute(info::InfoArgs {
        file: input,
        json: true,
        ctl: Vec::new(),
    })
    .expect("info failed");
}
