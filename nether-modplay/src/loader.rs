//! Module loader: format detection and conversion to the unified model

use nether_tracker::{ModConverter, ModuleConverter, SourceFormat, TrackerModule, XmConverter};
use tracing::debug;

use crate::MAX_CHANNELS;
use crate::error::{Error, Result};

/// Options applied while parsing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Keep sample headers but do not decode PCM
    pub skip_samples: bool,
    /// Keep pattern sizes but do not unpack cells
    pub skip_patterns: bool,
}

/// Detect the container format of raw module bytes
pub fn probe_format(data: &[u8]) -> Option<SourceFormat> {
    if data.starts_with(nether_xm::XM_MAGIC) {
        return Some(SourceFormat::Xm);
    }
    let tag: &[u8; 4] = data
        .get(nether_mod::TAG_OFFSET..nether_mod::HEADER_SIZE)?
        .try_into()
        .ok()?;
    nether_mod::channels_for_tag(tag).map(|_| SourceFormat::Mod)
}

/// Describe bytes that are not a supported module
fn describe_unsupported(data: &[u8]) -> String {
    if data.is_empty() {
        return "empty input".to_string();
    }
    if data.starts_with(b"IMPM") {
        return "Impulse Tracker (IT) modules are not supported".to_string();
    }
    if data.get(44..48) == Some(b"SCRM".as_slice()) {
        return "Scream Tracker 3 (S3M) modules are not supported".to_string();
    }
    format!("no XM signature or MOD tag found in {} bytes", data.len())
}

/// Parse module bytes into the unified model
///
/// The input is only borrowed for the call; every sample is copied out.
pub fn load_tracker_module(data: &[u8], options: &LoadOptions) -> Result<TrackerModule> {
    let format = probe_format(data).ok_or_else(|| Error::UnsupportedFormat(describe_unsupported(data)))?;
    debug!(
        format = format.short_name(),
        bytes = data.len(),
        skip_samples = options.skip_samples,
        skip_patterns = options.skip_patterns,
        "parsing module"
    );

    let module = match format {
        SourceFormat::Xm => {
            let parse_options = nether_xm::ParseOptions {
                skip_samples: options.skip_samples,
                skip_patterns: options.skip_patterns,
            };
            let xm = nether_xm::parse_xm_with(data, &parse_options)?;
            XmConverter::convert(&xm)
        }
        SourceFormat::Mod => {
            let parse_options = nether_mod::ParseOptions {
                skip_samples: options.skip_samples,
                skip_patterns: options.skip_patterns,
            };
            let parsed = nether_mod::parse_mod_with(data, &parse_options)?;
            ModConverter::convert(&parsed)
        }
    };

    if module.num_channels == 0 || module.num_channels as usize > MAX_CHANNELS {
        return Err(Error::CorruptData(format!(
            "channel count {} outside 1..={MAX_CHANNELS}",
            module.num_channels
        )));
    }

    debug!(
        channels = module.num_channels,
        orders = module.orders.len(),
        patterns = module.patterns.len(),
        instruments = module.instruments.len(),
        samples = module.samples.len(),
        warnings = module.warnings.len(),
        "module converted"
    );
    Ok(module)
}
