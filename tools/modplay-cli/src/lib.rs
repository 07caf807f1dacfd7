//! Commands behind the `modplay` binary
//!
//! Each command module has a clap `Args` struct and an `execute` entry
//! point; the string-producing helpers are public so they can be tested
//! without spawning the binary.

pub mod info;
pub mod patterns;
pub mod render;

use std::path::Path;

use anyhow::{Context, Result};
use nether_modplay::{Controls, Module};

/// Parse repeated `--ctl key=value` arguments
pub fn parse_controls(pairs: &[String]) -> Result<Controls> {
    let mut controls = Controls::new();
    for pair in pairs {
        controls
            .set_pair(pair)
            .with_context(|| format!("Invalid --ctl {pair:?}"))?;
    }
    Ok(controls)
}

/// Read and load a module file with load-time controls
pub fn load_module(path: &Path, controls: &Controls) -> Result<Module> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Module::from_bytes_with_controls(&data, controls)
        .with_context(|| format!("Failed to load {}", path.display()))
}

/// `m:ss.mmm`
pub fn format_duration(seconds: f64) -> String {
    let millis = (seconds.max(0.0) * 1000.0).round() as u64;
    format!("{}:{:02}.{:03}", millis / 60_000, millis / 1000 % 60, millis % 1000)
}
