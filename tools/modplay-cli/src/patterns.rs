//! `modplay patterns`: pattern grids

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use nether_modplay::{Controls, Module};

use crate::load_module;

#[derive(Args, Debug, Clone)]
pub struct PatternsArgs {
    /// XM or MOD file
    pub file: PathBuf,

    /// Only dump this pattern
    #[arg(short, long)]
    pub pattern: Option<i32>,
}

pub fn execute(args: PatternsArgs) -> Result<()> {
    let module = load_module(&args.file, &Controls::new())?;

    match args.pattern {
        Some(pattern) => print!("{}", dump_pattern(&module, pattern)?),
        None => {
            for pattern in 0..module.num_patterns() {
                print!("{}", dump_pattern(&module, pattern)?);
                println!();
            }
        }
    }
    Ok(())
}

/// One pattern as text: a header line, then one line per row
///
/// Rows on a measure boundary are marked with `*`, beat boundaries with `-`.
pub fn dump_pattern(module: &Module, pattern: i32) -> Result<String> {
    let rows = module.pattern_num_rows(pattern);
    if rows == 0 {
        bail!(
            "Pattern {pattern} does not exist (module has {})",
            module.num_patterns()
        );
    }
    let per_beat = module.pattern_rows_per_beat(pattern).max(1);
    let per_measure = module.pattern_rows_per_measure(pattern).max(1);

    let mut out = String::new();
    let _ = writeln!(out, "Pattern {pattern} ({rows} rows)");
    for row in 0..rows {
        let mark = if row % per_measure == 0 {
            '*'
        } else if row % per_beat == 0 {
            '-'
        } else {
            ' '
        };
        let _ = write!(out, "{row:03}{mark}");
        for channel in 0..module.num_channels() {
            let _ = write!(out, "|{}", module.format_cell(pattern, row, channel));
        }
        out.push_str("|\n");
    }
    Ok(out)
}
