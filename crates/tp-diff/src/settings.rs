//! Declarative diff settings.
//!
//! [`DiffSettings`] is the serializable subset of [`PatchConfig`]: everything
//! except the strategy functions, with keys expressed as a field name. It is
//! what the CLI reads from a TOML file.
//!
//! ```toml
//! map = true
//! key = "id"
//!
//! [fields.tags]
//! sorted = true
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::options::PatchConfig;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSettings {
    /// Inputs are already sorted by key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorted: Option<bool>,

    /// Diff sequences as keyed collections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<bool>,

    /// Record field used as each element's key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Settings for the elements of a collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<Box<DiffSettings>>,

    /// Settings for named record fields.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, DiffSettings>,
}

impl DiffSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay `other` onto these settings. Values set in `other` win; field
    /// settings are overlaid name by name.
    pub fn merge(mut self, other: DiffSettings) -> Self {
        self.sorted = other.sorted.or(self.sorted);
        self.map = other.map.or(self.map);
        self.key = other.key.or(self.key);
        self.element = match (self.element, other.element) {
            (Some(base), Some(over)) => Some(Box::new(base.merge(*over))),
            (base, over) => over.or(base),
        };
        for (name, over) in other.fields {
            let merged = match self.fields.remove(&name) {
                Some(base) => base.merge(over),
                None => over,
            };
            self.fields.insert(name, merged);
        }
        self
    }

    pub fn to_config(&self) -> PatchConfig {
        let mut config = PatchConfig::new();
        config.sorted = self.sorted;
        config.map = self.map;
        if let Some(key) = &self.key {
            config = config.keyed_by(key.clone());
        }
        if let Some(element) = &self.element {
            config = config.with_element(element.to_config());
        }
        for (name, field) in &self.fields {
            config = config.with_field(name.clone(), field.to_config());
        }
        config
    }
}

impl From<&DiffSettings> for PatchConfig {
    fn from(settings: &DiffSettings) -> Self {
        settings.to_config()
    }
}

impl From<DiffSettings> for PatchConfig {
    fn from(settings: DiffSettings) -> Self {
        settings.to_config()
    }
}
