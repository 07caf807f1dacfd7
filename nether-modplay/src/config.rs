//! Render configuration
//!
//! [`RenderConfig`] holds every playback setting a [`Player`](crate::Player)
//! uses. It can be loaded from TOML and is also reachable through the
//! libopenmpt-style string controls (`render.stereoseparation_percent`, ...)
//! via [`RenderConfig::get`] / [`RenderConfig::set`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::controls;
use crate::error::{Error, Result};

/// Lowest accepted gain in millibel
pub const MIN_MASTER_GAIN_MILLIBEL: i32 = -10_000;
/// Highest accepted gain in millibel
pub const MAX_MASTER_GAIN_MILLIBEL: i32 = 10_000;
/// Largest tempo or pitch factor
pub const MAX_FACTOR: f64 = 4.0;

/// What happens when the song ends and no repeats are left
///
/// There is no fade-out mode; `play.at_end=fadeout` is an invalid control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EndBehaviour {
    /// Rendering returns 0 frames and the player stops
    #[default]
    Stop,
    /// The short read signals the end; the next read restarts the song
    Continue,
}

impl EndBehaviour {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Continue => "continue",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "stop" => Some(Self::Stop),
            "continue" => Some(Self::Continue),
            _ => None,
        }
    }
}

/// Resampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Zero-order hold
    Nearest,
    /// Two-point linear
    Linear,
    /// Four-point cubic Hermite
    #[default]
    Cubic,
}

impl Interpolation {
    /// Map a filter length (taps) to a filter; 0 selects the default
    pub fn from_filter_length(length: i32) -> Option<Self> {
        match length {
            0 => Some(Self::default()),
            1 => Some(Self::Nearest),
            2 => Some(Self::Linear),
            4 | 8 => Some(Self::Cubic),
            _ => None,
        }
    }

    /// Number of taps the filter reads
    pub fn filter_length(self) -> i32 {
        match self {
            Self::Nearest => 1,
            Self::Linear => 2,
            Self::Cubic => 4,
        }
    }
}

/// Integer render parameters addressable by enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderParam {
    MasterGainMillibel,
    StereoSeparationPercent,
    InterpolationFilterLength,
    VolumeRampingStrength,
}

impl RenderParam {
    pub const ALL: [RenderParam; 4] = [
        RenderParam::MasterGainMillibel,
        RenderParam::StereoSeparationPercent,
        RenderParam::InterpolationFilterLength,
        RenderParam::VolumeRampingStrength,
    ];

    /// Control key carrying the same setting
    pub fn control_key(self) -> &'static str {
        match self {
            Self::MasterGainMillibel => controls::RENDER_MASTERGAIN_MILLIBEL,
            Self::StereoSeparationPercent => controls::RENDER_STEREOSEPARATION_PERCENT,
            Self::InterpolationFilterLength => controls::RENDER_INTERPOLATIONFILTER_LENGTH,
            Self::VolumeRampingStrength => controls::RENDER_VOLUMERAMPING_STRENGTH,
        }
    }
}

/// Playback settings for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Output gain in millibel (default: 0)
    #[serde(default)]
    pub master_gain_millibel: i32,
    /// Stereo separation (default: 100, range: 0-200)
    #[serde(default = "default_stereo_separation")]
    pub stereo_separation_percent: i32,
    /// Resampling filter (default: cubic)
    #[serde(default)]
    pub interpolation: Interpolation,
    /// Anti-click ramping (default: -1 = engine default, 0 = off, 1-10 = ms)
    #[serde(default = "default_ramping")]
    pub volume_ramping_strength: i32,
    /// Extra passes through the song (default: 0, -1 = forever)
    #[serde(default)]
    pub repeat_count: i32,
    /// Behaviour once the song is over (default: stop)
    #[serde(default)]
    pub end_behaviour: EndBehaviour,
    /// Playback speed multiplier (default: 1.0)
    #[serde(default = "default_factor")]
    pub tempo_factor: f64,
    /// Pitch multiplier (default: 1.0)
    #[serde(default = "default_factor")]
    pub pitch_factor: f64,
    /// Restore notes and sample positions when seeking (default: true)
    #[serde(default = "default_true")]
    pub sync_samples: bool,
}

fn default_stereo_separation() -> i32 {
    100
}
fn default_ramping() -> i32 {
    -1
}
fn default_factor() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            master_gain_millibel: 0,
            stereo_separation_percent: default_stereo_separation(),
            interpolation: Interpolation::default(),
            volume_ramping_strength: default_ramping(),
            repeat_count: 0,
            end_behaviour: EndBehaviour::default(),
            tempo_factor: default_factor(),
            pitch_factor: default_factor(),
            sync_samples: default_true(),
        }
    }
}

impl RenderConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Serialize to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check every field against its accepted range
    pub fn validate(&self) -> Result<()> {
        let checks: [(&str, String, bool); 6] = [
            (
                controls::RENDER_MASTERGAIN_MILLIBEL,
                self.master_gain_millibel.to_string(),
                (MIN_MASTER_GAIN_MILLIBEL..=MAX_MASTER_GAIN_MILLIBEL)
                    .contains(&self.master_gain_millibel),
            ),
            (
                controls::RENDER_STEREOSEPARATION_PERCENT,
                self.stereo_separation_percent.to_string(),
                (0..=200).contains(&self.stereo_separation_percent),
            ),
            (
                controls::RENDER_VOLUMERAMPING_STRENGTH,
                self.volume_ramping_strength.to_string(),
                (-1..=10).contains(&self.volume_ramping_strength),
            ),
            (
                "repeat_count",
                self.repeat_count.to_string(),
                self.repeat_count >= -1,
            ),
            (
                controls::PLAY_TEMPO_FACTOR,
                self.tempo_factor.to_string(),
                valid_factor(self.tempo_factor),
            ),
            (
                controls::PLAY_PITCH_FACTOR,
                self.pitch_factor.to_string(),
                valid_factor(self.pitch_factor),
            ),
        ];

        match checks.iter().find(|(_, _, ok)| !ok) {
            Some((key, value, _)) => Err(Error::invalid_control(key, value)),
            None => Ok(()),
        }
    }

    /// Current value of a render/play/seek control
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            controls::PLAY_AT_END => self.end_behaviour.as_str().to_string(),
            controls::PLAY_TEMPO_FACTOR => self.tempo_factor.to_string(),
            controls::PLAY_PITCH_FACTOR => self.pitch_factor.to_string(),
            controls::RENDER_STEREOSEPARATION_PERCENT => {
                self.stereo_separation_percent.to_string()
            }
            controls::RENDER_INTERPOLATIONFILTER_LENGTH => {
                self.interpolation.filter_length().to_string()
            }
            controls::RENDER_VOLUMERAMPING_STRENGTH => self.volume_ramping_strength.to_string(),
            controls::RENDER_MASTERGAIN_MILLIBEL => self.master_gain_millibel.to_string(),
            controls::SEEK_SYNC_SAMPLES => controls::format_bool(self.sync_samples).to_string(),
            _ => return None,
        };
        Some(value)
    }

    /// Set a render/play/seek control from its string form
    ///
    /// The config is left untouched when the value is rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || Error::invalid_control(key, value);
        let mut next = self.clone();

        match key {
            controls::PLAY_AT_END => {
                next.end_behaviour = EndBehaviour::parse(value).ok_or_else(invalid)?;
            }
            controls::PLAY_TEMPO_FACTOR => {
                next.tempo_factor = value.trim().parse().map_err(|_| invalid())?;
            }
            controls::PLAY_PITCH_FACTOR => {
                next.pitch_factor = value.trim().parse().map_err(|_| invalid())?;
            }
            controls::SEEK_SYNC_SAMPLES => {
                next.sync_samples = controls::parse_bool(value).ok_or_else(invalid)?;
            }
            controls::RENDER_STEREOSEPARATION_PERCENT
            | controls::RENDER_INTERPOLATIONFILTER_LENGTH
            | controls::RENDER_VOLUMERAMPING_STRENGTH
            | controls::RENDER_MASTERGAIN_MILLIBEL => {
                let param = RenderParam::ALL
                    .into_iter()
                    .find(|p| p.control_key() == key)
                    .ok_or_else(invalid)?;
                let number: i32 = value.trim().parse().map_err(|_| invalid())?;
                next.set_render_param(param, number)?;
            }
            _ => return Err(invalid()),
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Integer value of a render parameter
    pub fn render_param(&self, param: RenderParam) -> i32 {
        match param {
            RenderParam::MasterGainMillibel => self.master_gain_millibel,
            RenderParam::StereoSeparationPercent => self.stereo_separation_percent,
            RenderParam::InterpolationFilterLength => self.interpolation.filter_length(),
            RenderParam::VolumeRampingStrength => self.volume_ramping_strength,
        }
    }

    /// Set a render parameter, rejecting out-of-range values
    pub fn set_render_param(&mut self, param: RenderParam, value: i32) -> Result<()> {
        let invalid = || Error::invalid_control(param.control_key(), &value.to_string());
        let mut next = self.clone();

        match param {
            RenderParam::MasterGainMillibel => next.master_gain_millibel = value,
            RenderParam::StereoSeparationPercent => next.stereo_separation_percent = value,
            RenderParam::InterpolationFilterLength => {
                next.interpolation = Interpolation::from_filter_length(value).ok_or_else(invalid)?;
            }
            RenderParam::VolumeRampingStrength => next.volume_ramping_strength = value,
        }

        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Linear output gain
    pub fn master_gain(&self) -> f32 {
        10f32.powf(self.master_gain_millibel as f32 / 2000.0)
    }
}

fn valid_factor(factor: f64) -> bool {
    factor.is_finite() && factor > 0.0 && factor <= MAX_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderConfig::default();
        assert_eq!(config.stereo_separation_percent, 100);
        assert_eq!(config.volume_ramping_strength, -1);
        assert_eq!(config.interpolation, Interpolation::Cubic);
        assert_eq!(config.end_behaviour, EndBehaviour::Stop);
        assert!(config.sync_samples);
        assert!((config.master_gain() - 1.0).abs() < 1e-6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = RenderConfig::from_toml_str(
            r#"
            stereo_separation_percent = 50
            interpolation = "linear"
            end_behaviour = "continue"
            "#,
        )
        .unwrap();
        assert_eq!(config.stereo_separation_percent, 50);
        assert_eq!(config.interpolation, Interpolation::Linear);
        assert_eq!(config.end_behaviour, EndBehaviour::Continue);
        // Everything else keeps its default
        assert_eq!(config.tempo_factor, 1.0);
        assert!(config.sync_samples);
    }

    #[test]
    fn test_from_toml_rejects_out_of_range() {
        let err = RenderConfig::from_toml_str("stereo_separation_percent = 300").unwrap_err();
        assert!(matches!(err, Error::InvalidControl { .. }));

        let err = RenderConfig::from_toml_str("interpolation = \"sinc\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = RenderConfig {
            master_gain_millibel: -300,
            repeat_count: 2,
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(RenderConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.toml");
        std::fs::write(&path, "master_gain_millibel = 600\n").unwrap();
        assert_eq!(RenderConfig::load(&path).unwrap().master_gain_millibel, 600);
        assert!(matches!(
            RenderConfig::load(&dir.path().join("missing.toml")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_control_get_set() {
        let mut config = RenderConfig::default();
        config.set("render.stereoseparation_percent", "150").unwrap();
        assert_eq!(config.get("render.stereoseparation_percent").as_deref(), Some("150"));

        config.set("render.interpolationfilter_length", "8").unwrap();
        assert_eq!(config.interpolation, Interpolation::Cubic);
        config.set("render.interpolationfilter_length", "1").unwrap();
        assert_eq!(config.get("render.interpolationfilter_length").as_deref(), Some("1"));

        config.set("play.at_end", "continue").unwrap();
        config.set("seek.sync_samples", "0").unwrap();
        assert_eq!(config.get("seek.sync_samples").as_deref(), Some("0"));
        assert!(config.get("no.such.key").is_none());
    }

    #[test]
    fn test_rejected_set_leaves_config_unchanged() {
        let mut config = RenderConfig::default();
        let before = config.clone();
        assert!(config.set("render.stereoseparation_percent", "-5").is_err());
        assert!(config.set("render.interpolationfilter_length", "3").is_err());
        assert!(config.set("play.tempo_factor", "0").is_err());
        assert!(config.set("play.tempo_factor", "fast").is_err());
        assert!(matches!(
            config.set("play.at_end", "fadeout"),
            Err(Error::InvalidControl { .. })
        ));
        assert!(config.set("render.unknown", "1").is_err());
        assert_eq!(config, before);
    }

    #[test]
    fn test_render_params() {
        let mut config = RenderConfig::default();
        config
            .set_render_param(RenderParam::MasterGainMillibel, -600)
            .unwrap();
        assert_eq!(config.render_param(RenderParam::MasterGainMillibel), -600);
        assert!((config.master_gain() - 0.501).abs() < 0.01);
        assert_eq!(config.render_param(RenderParam::InterpolationFilterLength), 4);
        assert!(
            config
                .set_render_param(RenderParam::VolumeRampingStrength, 11)
                .is_err()
        );
    }
}
