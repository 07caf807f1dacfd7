//! Loading, metadata and the read-only pattern model

mod common;

use common::{mod_bytes, xm_bytes};
use nether_modplay::{
    Cell, Controls, Error, ErrorCode, METADATA_KEYS, Module, Player, SourceFormat, probe_format,
};

#[test]
fn test_probe_format() {
    assert_eq!(probe_format(&xm_bytes()), Some(SourceFormat::Xm));
    assert_eq!(probe_format(&mod_bytes()), Some(SourceFormat::Mod));
    assert_eq!(probe_format(b"not a module"), None);
}

#[test]
fn test_xm_structure() {
    let module = Module::from_bytes(&xm_bytes()).unwrap();
    assert_eq!(module.num_channels(), 4);
    assert_eq!(module.num_orders(), 2);
    assert_eq!(module.num_patterns(), 2);
    assert_eq!(module.num_instruments(), 1);
    assert_eq!(module.num_samples(), 1);
    assert_eq!(module.order_sequence(), vec![0, 1]);
    assert_eq!(module.order_pattern(1), 1);
    assert_eq!(module.order_pattern(2), -1);
    assert_eq!(module.pattern_num_rows(0), 64);
    assert_eq!(module.pattern_num_rows(5), 0);

    let cell = module.pattern_cell(0, 0, 0).unwrap();
    assert_eq!(cell.note, 49);
    assert_eq!(cell.instrument, 1);
    assert!(module.format_cell(0, 0, 0).starts_with("C-4 01"));
    assert_eq!(module.pattern_cell(0, 1, 0), Some(Cell::default()));
    assert_eq!(module.pattern_cell(0, 64, 0), None);
    assert_eq!(module.pattern_cell(0, 0, 4), None);
}

#[test]
fn test_xm_metadata() {
    let module = Module::from_bytes(&xm_bytes()).unwrap();
    assert_eq!(module.metadata("type"), "xm");
    assert_eq!(module.metadata("type_long"), "FastTracker II");
    assert_eq!(module.metadata("title"), "fixture xm");
    assert!(module.metadata("tracker").starts_with("FastTracker"));
    assert_eq!(module.metadata("no_such_key"), "");
    assert_eq!(module.metadata_keys().len(), METADATA_KEYS.len());

    assert_eq!(module.instrument_name(0), "lead");
    assert_eq!(module.sample_name(0), "saw");
    assert_eq!(module.instrument_name(1), "");
    assert_eq!(module.sample_name(-1), "");
}

#[test]
fn test_mod_metadata() {
    let module = Module::from_bytes(&mod_bytes()).unwrap();
    assert_eq!(module.metadata("type"), "mod");
    assert_eq!(module.metadata("type_long"), "ProTracker");
    assert_eq!(module.metadata("title"), "fixture mod");
    // MOD has samples only
    assert_eq!(module.num_instruments(), 0);
    assert_eq!(module.sample_name(0), "saw");
}

#[test]
fn test_info_serializes() {
    let module = Module::from_bytes(&mod_bytes()).unwrap();
    let info = module.info();
    assert_eq!(info.channels, 4);
    assert_eq!(info.subsongs.len(), 1);
    assert_eq!(info.order_list, vec![0, 1]);

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["type"], "mod");
    assert_eq!(json["title"], "fixture mod");
    assert_eq!(json["subsongs"][0]["rows"], 128);
}

#[test]
fn test_unsupported_and_corrupt_input() {
    let mut it = b"IMPM".to_vec();
    it.resize(512, 0);
    let err = Module::from_bytes(&it).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(ref msg) if msg.contains("IT")));

    let mut s3m = vec![0u8; 512];
    s3m[44..48].copy_from_slice(b"SCRM");
    let err = Module::from_bytes(&s3m).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(ref msg) if msg.contains("S3M")));

    assert_eq!(
        Module::from_bytes(&[]).unwrap_err().code(),
        ErrorCode::UnsupportedFormat
    );
    assert_eq!(
        Module::from_bytes(&[0x55; 4000]).unwrap_err().code(),
        ErrorCode::UnsupportedFormat
    );

    let truncated = &xm_bytes()[..40];
    assert_eq!(
        Module::from_bytes(truncated).unwrap_err().code(),
        ErrorCode::CorruptData
    );
}

#[test]
fn test_edits_fail_and_leave_the_module_unchanged() {
    let module = Module::from_bytes(&xm_bytes()).unwrap();
    assert!(!module.is_pattern_editing_supported());
    let before = module.format_cell(0, 0, 0);

    let cell = Cell {
        note: 61,
        instrument: 1,
        ..Default::default()
    };
    assert!(matches!(
        module.set_pattern_cell(0, 0, 0, cell),
        Err(Error::UnsupportedOperation(_))
    ));
    assert!(module.set_pattern_note(0, 0, 0, 50).is_err());
    assert!(module.clear_pattern_row(0, 0).is_err());
    assert!(module.insert_pattern_row(0, 64).is_err());
    assert!(module.delete_pattern_row(0, 0).is_err());

    // Bad coordinates are reported as such before the read-only refusal
    assert!(matches!(
        module.set_pattern_note(9, 0, 0, 50),
        Err(Error::InvalidIndex { what: "pattern", .. })
    ));

    assert_eq!(module.format_cell(0, 0, 0), before);
    assert_eq!(module.pattern_num_rows(0), 64);
}

#[test]
fn test_skip_patterns_control() {
    let controls = Controls::new().with("load.skip_patterns", "1").unwrap();
    let module = Module::from_bytes_with_controls(&xm_bytes(), &controls).unwrap();
    assert!(module.load_options().skip_patterns);
    assert_eq!(module.pattern_num_rows(0), 64);
    assert_eq!(module.pattern_cell(0, 0, 0), Some(Cell::default()));

    let player = Player::new(module);
    assert_eq!(player.ctl_get("load.skip_patterns"), "1");
}

#[test]
fn test_bad_load_controls_are_rejected() {
    let mut controls = Controls::new();
    assert!(controls.set("load.skip_samples", "maybe").is_err());
    assert!(matches!(
        controls.set("no.such.key", "1"),
        Err(Error::InvalidControl { .. })
    ));
    assert!(controls.is_empty());
}
