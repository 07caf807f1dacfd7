//! `modplay info`: metadata, counts, subsongs and the order list

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use nether_modplay::Module;

use crate::{format_duration, load_module, parse_controls};

#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    /// XM or MOD file
    pub file: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Load control as key=value (repeatable)
    #[arg(long = "ctl", value_name = "KEY=VALUE")]
    pub ctl: Vec<String>,
}

pub fn execute(args: InfoArgs) -> Result<()> {
    let controls = parse_controls(&args.ctl)?;
    let module = load_module(&args.file, &controls)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&module.info()).context("Failed to serialize module info")?;
        println!("{json}");
    } else {
        print!("{}", describe(&module));
    }
    Ok(())
}

/// Human-readable summary
pub fn describe(module: &Module) -> String {
    let info = module.info();
    let mut out = String::new();

    let _ = writeln!(out, "Title:       {}", info.title);
    let _ = writeln!(out, "Format:      {} ({})", info.type_long, info.kind);
    if !info.tracker.is_empty() {
        let _ = writeln!(out, "Tracker:     {}", info.tracker);
    }
    let _ = writeln!(out, "Channels:    {}", info.channels);
    let _ = writeln!(out, "Orders:      {}", info.orders);
    let _ = writeln!(out, "Patterns:    {}", info.patterns);
    let _ = writeln!(out, "Instruments: {}", info.instruments);
    let _ = writeln!(out, "Samples:     {}", info.samples);
    let _ = writeln!(out, "Duration:    {}", format_duration(info.duration_seconds));

    let _ = writeln!(out, "Subsongs:    {}", info.subsongs.len());
    for subsong in &info.subsongs {
        let _ = writeln!(
            out,
            "  #{}: order {}, {} rows, {}",
            subsong.index,
            subsong.start_order,
            subsong.rows,
            format_duration(subsong.duration_seconds)
        );
    }

    let orders: Vec<String> = info
        .order_list
        .iter()
        .map(|&p| match p {
            254 => "+++".to_string(),
            255 => "---".to_string(),
            p => p.to_string(),
        })
        .collect();
    let _ = writeln!(out, "Order list:  {}", orders.join(" "));

    let names = module.instrument_names();
    if !names.is_empty() {
        let _ = writeln!(out, "Instruments:");
        for (i, name) in names.iter().enumerate() {
            let _ = writeln!(out, "  {:02} {name}", i + 1);
        }
    }
    let names = module.sample_names();
    if names.iter().any(|n| !n.is_empty()) {
        let _ = writeln!(out, "Samples:");
        for (i, name) in names.iter().enumerate() {
            let _ = writeln!(out, "  {:02} {name}", i + 1);
        }
    }

    if !info.message.is_empty() {
        let _ = writeln!(out, "Message:");
        for line in info.message.lines() {
            let _ = writeln!(out, "  {line}");
        }
    }
    for warning in &info.warnings {
        let _ = writeln!(out, "Warning:     {warning}");
    }
    out
}
