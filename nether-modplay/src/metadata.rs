//! Metadata: string keys, names and the serializable module summary

use hashbrown::HashMap;
use nether_tracker::TrackerModule;
use serde::Serialize;

use crate::Module;

/// Keys answered by [`Module::metadata`]
pub const METADATA_KEYS: [&str; 13] = [
    "type",
    "type_long",
    "originaltype",
    "originaltype_long",
    "container",
    "container_long",
    "tracker",
    "artist",
    "title",
    "date",
    "message",
    "message_raw",
    "warnings",
];

/// Metadata strings captured at load time
#[derive(Debug, Clone, Default)]
pub(crate) struct Metadata {
    values: HashMap<&'static str, String>,
}

impl Metadata {
    pub(crate) fn from_module(module: &TrackerModule) -> Self {
        let message = module.message.clone().unwrap_or_default();
        let entries = [
            ("type", module.source.short_name().to_string()),
            ("type_long", module.source.long_name().to_string()),
            // Modules are played natively, never converted from another format
            ("originaltype", String::new()),
            ("originaltype_long", String::new()),
            ("container", String::new()),
            ("container_long", String::new()),
            ("tracker", module.tracker.clone()),
            ("artist", String::new()),
            ("title", module.name.trim_end().to_string()),
            ("date", String::new()),
            ("message", message.clone()),
            ("message_raw", message),
            ("warnings", module.warnings.join("\n")),
        ];

        let mut values = HashMap::with_capacity(entries.len());
        for (key, value) in entries {
            values.insert(key, value);
        }
        Self { values }
    }

    pub(crate) fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Summary of one subsong
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsongInfo {
    pub index: usize,
    pub start_order: u16,
    pub duration_seconds: f64,
    pub rows: usize,
}

/// Everything `modplay info` prints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleInfo {
    pub title: String,
    pub artist: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub type_long: String,
    pub tracker: String,
    pub channels: i32,
    pub orders: i32,
    pub patterns: i32,
    pub instruments: i32,
    pub samples: i32,
    pub duration_seconds: f64,
    pub subsongs: Vec<SubsongInfo>,
    pub order_list: Vec<i32>,
    pub message: String,
    pub warnings: Vec<String>,
}

impl Module {
    /// Metadata string for `key`; "" for unknown or absent keys
    pub fn metadata(&self, key: &str) -> String {
        self.inner.metadata.get(key).to_string()
    }

    /// Keys [`Module::metadata`] answers
    pub fn metadata_keys(&self) -> Vec<&'static str> {
        METADATA_KEYS.to_vec()
    }

    /// Instrument name, "" for an invalid index
    ///
    /// MOD files have samples only and report no instruments.
    pub fn instrument_name(&self, index: i32) -> String {
        if index < 0 || index >= self.num_instruments() {
            return String::new();
        }
        self.tracker()
            .instruments
            .get(index as usize)
            .map(|i| i.name.trim_end().to_string())
            .unwrap_or_default()
    }

    /// Sample name, "" for an invalid index
    pub fn sample_name(&self, index: i32) -> String {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.tracker().samples.get(i))
            .map(|s| s.name.trim_end().to_string())
            .unwrap_or_default()
    }

    pub fn instrument_names(&self) -> Vec<String> {
        (0..self.num_instruments())
            .map(|i| self.instrument_name(i))
            .collect()
    }

    pub fn sample_names(&self) -> Vec<String> {
        (0..self.num_samples()).map(|i| self.sample_name(i)).collect()
    }

    /// Serializable summary of the module
    pub fn info(&self) -> ModuleInfo {
        let tracker = self.tracker();
        ModuleInfo {
            title: self.metadata("title"),
            artist: self.metadata("artist"),
            kind: self.metadata("type"),
            type_long: self.metadata("type_long"),
            tracker: self.metadata("tracker"),
            channels: self.num_channels(),
            orders: self.num_orders(),
            patterns: self.num_patterns(),
            instruments: self.num_instruments(),
            samples: self.num_samples(),
            duration_seconds: self.duration_seconds(),
            subsongs: self
                .subsongs()
                .iter()
                .enumerate()
                .map(|(index, s)| SubsongInfo {
                    index,
                    start_order: s.start_order,
                    duration_seconds: s.duration_seconds,
                    rows: s.rows.len(),
                })
                .collect(),
            order_list: self.order_sequence(),
            message: self.metadata("message"),
            warnings: tracker.warnings.clone(),
        }
    }
}
