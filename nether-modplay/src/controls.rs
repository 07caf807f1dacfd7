//! String key/value controls
//!
//! Hosts configure loading and rendering through a flat map of
//! libopenmpt-style keys. Values are validated when they are set, so a
//! [`Controls`] map that exists is always applicable.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::loader::LoadOptions;

pub const LOAD_SKIP_SAMPLES: &str = "load.skip_samples";
pub const LOAD_SKIP_PATTERNS: &str = "load.skip_patterns";
/// `stop` or `continue`; `fadeout` is not supported and is rejected
pub const PLAY_AT_END: &str = "play.at_end";
pub const PLAY_TEMPO_FACTOR: &str = "play.tempo_factor";
pub const PLAY_PITCH_FACTOR: &str = "play.pitch_factor";
pub const RENDER_STEREOSEPARATION_PERCENT: &str = "render.stereoseparation_percent";
pub const RENDER_INTERPOLATIONFILTER_LENGTH: &str = "render.interpolationfilter_length";
pub const RENDER_VOLUMERAMPING_STRENGTH: &str = "render.volumeramping_strength";
pub const RENDER_MASTERGAIN_MILLIBEL: &str = "render.mastergain_millibel";
pub const SEEK_SYNC_SAMPLES: &str = "seek.sync_samples";

/// Every key the engine understands
pub const KNOWN_KEYS: [&str; 10] = [
    LOAD_SKIP_SAMPLES,
    LOAD_SKIP_PATTERNS,
    PLAY_AT_END,
    PLAY_TEMPO_FACTOR,
    PLAY_PITCH_FACTOR,
    RENDER_STEREOSEPARATION_PERCENT,
    RENDER_INTERPOLATIONFILTER_LENGTH,
    RENDER_VOLUMERAMPING_STRENGTH,
    RENDER_MASTERGAIN_MILLIBEL,
    SEEK_SYNC_SAMPLES,
];

/// True for keys that only matter while a module is being loaded
pub fn is_load_key(key: &str) -> bool {
    key.starts_with("load.")
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

pub(crate) fn format_bool(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// Validated control map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Controls {
    values: HashMap<String, String>,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Controls::set`]
    pub fn with(mut self, key: &str, value: &str) -> Result<Self> {
        self.set(key, value)?;
        Ok(self)
    }

    /// Set a control after checking the key exists and the value parses
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if is_load_key(key) {
            if !KNOWN_KEYS.contains(&key) || parse_bool(value).is_none() {
                return Err(Error::invalid_control(key, value));
            }
        } else {
            RenderConfig::default().set(key, value)?;
        }
        self.values.insert(key.to_string(), value.trim().to_string());
        Ok(())
    }

    /// Parse a `key=value` pair, as given on a command line
    pub fn set_pair(&mut self, pair: &str) -> Result<()> {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| Error::invalid_control(pair, ""))?;
        self.set(key.trim(), value)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries sorted by key
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self
            .values
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_unstable();
        entries
    }

    /// Re-check every entry (maps built through serde skip [`Controls::set`])
    pub fn validate(&self) -> Result<()> {
        let mut scratch = Controls::new();
        for (key, value) in self.entries() {
            scratch.set(key, value)?;
        }
        Ok(())
    }

    pub(crate) fn load_options(&self) -> LoadOptions {
        let flag = |key| self.get(key).and_then(parse_bool).unwrap_or(false);
        LoadOptions {
            skip_samples: flag(LOAD_SKIP_SAMPLES),
            skip_patterns: flag(LOAD_SKIP_PATTERNS),
        }
    }

    /// Apply the render/play/seek entries to a config
    pub fn apply_to(&self, config: &mut RenderConfig) -> Result<()> {
        for (key, value) in self.entries() {
            if !is_load_key(key) {
                config.set(key, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Interpolation;

    #[test]
    fn test_set_validates() {
        let mut controls = Controls::new();
        controls.set(LOAD_SKIP_SAMPLES, "1").unwrap();
        controls.set(RENDER_STEREOSEPARATION_PERCENT, " 70 ").unwrap();
        assert_eq!(controls.get(RENDER_STEREOSEPARATION_PERCENT), Some("70"));

        assert!(controls.set("load.bogus", "1").is_err());
        assert!(controls.set(LOAD_SKIP_PATTERNS, "maybe").is_err());
        assert!(controls.set(RENDER_STEREOSEPARATION_PERCENT, "400").is_err());
        assert!(controls.set("dither", "1").is_err());
        assert_eq!(controls.len(), 2);
    }

    #[test]
    fn test_load_options() {
        let controls = Controls::new()
            .with(LOAD_SKIP_PATTERNS, "true")
            .unwrap();
        let options = controls.load_options();
        assert!(options.skip_patterns);
        assert!(!options.skip_samples);
    }

    #[test]
    fn test_apply_to_config() {
        let controls = Controls::new()
            .with(RENDER_INTERPOLATIONFILTER_LENGTH, "2")
            .and_then(|c| c.with(PLAY_TEMPO_FACTOR, "1.5"))
            .and_then(|c| c.with(LOAD_SKIP_SAMPLES, "0"))
            .unwrap();
        let mut config = RenderConfig::default();
        controls.apply_to(&mut config).unwrap();
        assert_eq!(config.interpolation, Interpolation::Linear);
        assert_eq!(config.tempo_factor, 1.5);
    }

    #[test]
    fn test_set_pair() {
        let mut controls = Controls::new();
        controls.set_pair("play.at_end=continue").unwrap();
        assert_eq!(controls.get(PLAY_AT_END), Some("continue"));
        assert!(controls.set_pair("play.at_end").is_err());
    }

    #[test]
    fn test_deserialize_from_toml_table() {
        let controls: Controls = toml::from_str(
            r#"
            "render.mastergain_millibel" = "-200"
            "seek.sync_samples" = "0"
            "#,
        )
        .unwrap();
        assert!(controls.validate().is_ok());
        assert_eq!(
            controls.entries(),
            vec![
                ("render.mastergain_millibel", "-200"),
                ("seek.sync_samples", "0")
            ]
        );

        let bad: Controls = toml::from_str(r#""render.mastergain_millibel" = "loud""#).unwrap();
        assert!(bad.validate().is_err());
    }
}
