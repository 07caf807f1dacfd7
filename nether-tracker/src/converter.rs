//! Module conversion trait
//!
//! This module provides a trait abstraction for converting format-specific
//! modules (XM, MOD) to the unified TrackerModule format.

use crate::TrackerModule;

/// Trait for converting format-specific modules to TrackerModule
///
/// This trait abstracts the common conversion pattern shared by the XM and
/// MOD converters:
/// 1. Parse format-specific module
/// 2. Convert patterns, instruments, samples
/// 3. Build unified TrackerModule
///
/// # Examples
///
/// ```ignore
/// use nether_tracker::{ModuleConverter, XmConverter};
///
/// let xm_module = nether_xm::parse_xm(&data)?;
/// let tracker_module = XmConverter::convert(&xm_module);
/// ```
pub trait ModuleConverter {
    /// The source module type to convert from
    type Source;

    /// Convert a source module to the unified TrackerModule format
    ///
    /// Conversion is infallible; problems the source still carries are
    /// reported through `TrackerModule::warnings`.
    fn convert(source: &Self::Source) -> TrackerModule;
}

/// XM to TrackerModule converter
pub struct XmConverter;

impl ModuleConverter for XmConverter {
    type Source = nether_xm::XmModule;

    fn convert(source: &Self::Source) -> TrackerModule {
        crate::convert_xm::from_xm_module(source)
    }
}

/// MOD to TrackerModule converter
pub struct ModConverter;

impl ModuleConverter for ModConverter {
    type Source = nether_mod::ModModule;

    fn convert(source: &Self::Source) -> TrackerModule {
        crate::convert_mod::from_mod_module(source)
    }
}
