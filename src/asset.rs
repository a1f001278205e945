//! Signal asset definitions.
//!
//! A signal asset describes every configuration a traffic signal can show,
//! each as an ordered list of light bulbs with their target state. Assets are
//! authored alongside the scene and loaded from JSON.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// Target state of a single light bulb in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawBulbState")]
pub enum BulbState {
    Off,
    On,
    Blinking,
    /// An authored value outside the known states, kept verbatim.
    Unknown(String),
}

/// Authoring tools emit either the state name or its integer code.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBulbState {
    Code(i64),
    Name(String),
}

impl From<RawBulbState> for BulbState {
    fn from(raw: RawBulbState) -> Self {
        match raw {
            RawBulbState::Code(0) => BulbState::Off,
            RawBulbState::Code(1) => BulbState::On,
            RawBulbState::Code(2) => BulbState::Blinking,
            RawBulbState::Code(other) => BulbState::Unknown(other.to_string()),
            RawBulbState::Name(name) => match name.to_ascii_lowercase().as_str() {
                "off" => BulbState::Off,
                "on" => BulbState::On,
                "blinking" => BulbState::Blinking,
                _ => BulbState::Unknown(name),
            },
        }
    }
}

impl fmt::Display for BulbState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BulbState::Off => write!(f, "Off"),
            BulbState::On => write!(f, "On"),
            BulbState::Blinking => write!(f, "Blinking"),
            BulbState::Unknown(raw) => write!(f, "Unknown({})", raw),
        }
    }
}

/// A light bulb and the state it takes in one configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LightBulbState {
    /// Bulb name, matched against scene component names.
    pub name: String,
    pub state: BulbState,
}

/// One phase of a signal's appearance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub light_bulb_states: Vec<LightBulbState>,
}

/// Every configuration a signal type can display, in authoring order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalAsset {
    pub id: String,
    #[serde(default)]
    pub configurations: Vec<Configuration>,
}

impl SignalAsset {
    pub fn new(id: impl Into<String>, configurations: Vec<Configuration>) -> Self {
        Self {
            id: id.into(),
            configurations,
        }
    }

    /// Find a configuration index by its display name.
    pub fn configuration_index(&self, name: &str) -> Option<usize> {
        self.configurations
            .iter()
            .position(|c| c.name.as_deref() == Some(name))
    }
}

/// Read access to signal assets by id.
pub trait AssetStore {
    fn signal_asset(&self, asset_id: &str) -> Option<&SignalAsset>;
}

#[derive(Deserialize)]
struct AssetDocument {
    #[serde(default)]
    signals: Vec<SignalAsset>,
}

/// In-memory asset registry.
#[derive(Debug, Clone, Default)]
pub struct AssetLibrary {
    assets: HashMap<String, SignalAsset>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an asset document. Later duplicates of an id replace earlier ones.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: AssetDocument = serde_json::from_str(json)?;
        let mut library = Self::new();
        for asset in doc.signals {
            library.insert(asset);
        }
        Ok(library)
    }

    /// Load an asset document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn insert(&mut self, asset: SignalAsset) {
        if let Some(previous) = self.assets.insert(asset.id.clone(), asset) {
            log::warn!("Signal asset {} defined more than once, keeping the last", previous.id);
        }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetStore for AssetLibrary {
    fn signal_asset(&self, asset_id: &str) -> Option<&SignalAsset> {
        self.assets.get(asset_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PHASE: &str = r#"{
        "signals": [{
            "id": "sig-3",
            "configurations": [
                { "name": "stop", "lightBulbStates": [
                    { "name": "red", "state": "On" },
                    { "name": "green", "state": "Off" }
                ]},
                { "name": "go", "lightBulbStates": [
                    { "name": "red", "state": 0 },
                    { "name": "green", "state": 1 }
                ]}
            ]
        }]
    }"#;

    #[test]
    fn test_parse_asset_document() {
        let library = AssetLibrary::from_json(TWO_PHASE).unwrap();
        assert_eq!(library.len(), 1);

        let asset = library.signal_asset("sig-3").unwrap();
        assert_eq!(asset.configurations.len(), 2);
        assert_eq!(asset.configurations[0].light_bulb_states[0].state, BulbState::On);
        assert_eq!(asset.configurations[1].light_bulb_states[1].state, BulbState::On);
        assert_eq!(asset.configuration_index("go"), Some(1));
        assert_eq!(asset.configuration_index("caution"), None);
    }

    #[test]
    fn test_bulb_state_names_and_codes() {
        let states: Vec<BulbState> =
            serde_json::from_str(r#"["off", "BLINKING", 2, 7, "flash"]"#).unwrap();
        assert_eq!(
            states,
            vec![
                BulbState::Off,
                BulbState::Blinking,
                BulbState::Blinking,
                BulbState::Unknown("7".to_string()),
                BulbState::Unknown("flash".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_asset() {
        let library = AssetLibrary::new();
        assert!(library.is_empty());
        assert!(library.signal_asset("nope").is_none());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(AssetLibrary::from_json("{ not json").is_err());
    }
}
