//! Technology Registry (External Collaborator)
//!
//! The registry is the external database of technologies and frameworks from
//! which dynamic triggers are derived. The core only ever reads it; how the
//! entries got there (scraping, curation) is out of scope. The file-backed
//! implementation reads one local JSON document shaped like every other
//! persisted store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::StateManager;
use crate::types::Result;

/// One technology/framework known to the registry
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TechnologyEntry {
    /// Display name, e.g. "Tailwind CSS"
    pub name: String,
    /// Kind of technology: "language", "framework", ...
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default)]
    pub category: String,
    /// Declared capabilities, folded into the generated prompt
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub use_cases: Vec<String>,
    #[serde(default)]
    pub version_info: BTreeMap<String, Value>,
    /// Only validated entries become triggers
    #[serde(default)]
    pub validated: bool,
}

/// Read-only view of the technology database
pub trait TechnologyRegistry: Send + Sync {
    /// List entries, optionally restricted to validated ones
    fn list_entries(&self, validated_only: bool) -> Result<Vec<TechnologyEntry>>;
}

/// Registry data as persisted on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryData {
    pub entries: Vec<TechnologyEntry>,
}

/// Registry backed by a single local JSON file
pub struct FileRegistry {
    store: StateManager<RegistryData>,
}

impl FileRegistry {
    pub fn open(path: impl Into<std::path::PathBuf>) -> Result<Self> {
        Ok(Self {
            store: StateManager::new(path)?,
        })
    }
}

impl TechnologyRegistry for FileRegistry {
    fn list_entries(&self, validated_only: bool) -> Result<Vec<TechnologyEntry>> {
        let entries = self.store.load()?.data.entries;
        Ok(entries
            .into_iter()
            .filter(|e| !validated_only || e.validated)
            .collect())
    }
}

/// Fixed in-memory registry, useful for tests and demos
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    entries: Vec<TechnologyEntry>,
}

impl StaticRegistry {
    pub fn new(entries: Vec<TechnologyEntry>) -> Self {
        Self { entries }
    }
}

impl TechnologyRegistry for StaticRegistry {
    fn list_entries(&self, validated_only: bool) -> Result<Vec<TechnologyEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| !validated_only || e.validated)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str, validated: bool) -> TechnologyEntry {
        TechnologyEntry {
            name: name.to_string(),
            entry_type: "framework".to_string(),
            category: "css".to_string(),
            validated,
            ..Default::default()
        }
    }

    #[test]
    fn test_static_registry_filters_validated() {
        let registry = StaticRegistry::new(vec![entry("A", true), entry("B", false)]);
        assert_eq!(registry.list_entries(true).unwrap().len(), 1);
        assert_eq!(registry.list_entries(false).unwrap().len(), 2);
    }

    #[test]
    fn test_file_registry_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        {
            let store: StateManager<RegistryData> = StateManager::new(&path).unwrap();
            store
                .save(&RegistryData {
                    entries: vec![entry("Tailwind CSS", true), entry("Draft", false)],
                })
                .unwrap();
        }
        let registry = FileRegistry::open(&path).unwrap();
        let validated = registry.list_entries(true).unwrap();
        assert_eq!(validated.len(), 1);
        assert_eq!(validated[0].name, "Tailwind CSS");
    }
}
