//! XM file parser
//!
//! - `read` - Parsing XM files into structured data, including sample PCM
//! - `write` - Serializing an [`XmModule`](crate::XmModule) back to XM bytes
//! - `tests` - Parser and writer tests

mod read;
mod write;

#[cfg(test)]
mod tests;

pub use read::{ParseOptions, get_instrument_names, parse_xm, parse_xm_with};
pub use write::write_xm;
