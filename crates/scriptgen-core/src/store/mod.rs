use std::{collections::BTreeMap, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostic::confidence;
use crate::error::ValidationError;
use crate::templates::{GeneratedScriptSet, ScriptCategory, Tier, Variant};

pub mod file_store;
pub mod library;
pub mod memory;
pub mod site_url;

pub use file_store::FileStore;
pub use library::Library;
pub use memory::MemoryStore;
pub use site_url::normalize_url;

/// A saved target site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub name: String,
    pub url: String,
    pub status: String,
    pub active: bool,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub scripts: BTreeMap<String, serde_json::Value>,
}

/// Per-category usage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub uses: u64,
    #[serde(alias = "success")]
    pub success_rate: u8,
}

pub type Stats = BTreeMap<ScriptCategory, StatsRecord>;

/// Stats shown before anything has been recorded.
pub fn default_stats() -> Stats {
    ScriptCategory::ALL
        .into_iter()
        .map(|category| {
            let success_rate = match category {
                ScriptCategory::Cart => 98,
                ScriptCategory::Payment => 95,
                ScriptCategory::Disable => 100,
                ScriptCategory::Autofill => 92,
                ScriptCategory::Total => 97,
            };
            (
                category,
                StatsRecord {
                    uses: 0,
                    success_rate,
                },
            )
        })
        .collect()
}

/// A generated script set kept in the library under `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredConfig")]
pub struct SavedConfig {
    pub name: String,
    pub category: ScriptCategory,
    pub selector: String,
    pub score: i64,
    pub scripts: GeneratedScriptSet,
    pub documentation: String,
    pub created: DateTime<Utc>,
}

pub type Configs = BTreeMap<String, SavedConfig>;

/// Decoded form of a saved config. Backups written by the browser tool keep
/// `type` for the category and each tier as a bare code string.
#[derive(Deserialize)]
struct StoredConfig {
    name: String,
    #[serde(alias = "type")]
    category: ScriptCategory,
    selector: String,
    score: i64,
    scripts: StoredScripts,
    documentation: String,
    created: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredScripts {
    Variants(GeneratedScriptSet),
    Code {
        basic: String,
        optimized: String,
        advanced: String,
    },
}

impl StoredScripts {
    /// Bare code strings get the tier confidences `score` would produce today.
    fn into_set(self, score: i64) -> GeneratedScriptSet {
        match self {
            Self::Variants(set) => set,
            Self::Code {
                basic,
                optimized,
                advanced,
            } => {
                let base = i64::from(confidence(score));
                let variant = |tier: Tier, code: String| Variant {
                    tier,
                    code,
                    confidence: tier.confidence(base),
                };
                GeneratedScriptSet {
                    basic: variant(Tier::Basic, basic),
                    optimized: variant(Tier::Optimized, optimized),
                    advanced: variant(Tier::Advanced, advanced),
                }
            }
        }
    }
}

impl From<StoredConfig> for SavedConfig {
    fn from(stored: StoredConfig) -> Self {
        Self {
            scripts: stored.scripts.into_set(stored.score),
            name: stored.name,
            category: stored.category,
            selector: stored.selector,
            score: stored.score,
            documentation: stored.documentation,
            created: stored.created,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub debug_enabled: bool,
}

/// Self-contained backup of every durable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub sites: Vec<Site>,
    pub stats: Stats,
    pub configs: Configs,
    pub theme: Theme,
    pub export_date: DateTime<Utc>,
}

/// Import document; any subset of the export keys may be present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotImport {
    pub sites: Option<Vec<Site>>,
    pub stats: Option<Stats>,
    pub configs: Option<Configs>,
    pub theme: Option<Theme>,
    #[serde(default)]
    pub export_date: Option<DateTime<Utc>>,
}

impl SnapshotImport {
    /// Reject percentages above 100 before anything is written.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let percent = |field: String, value: u8| {
            if value > 100 {
                Err(ValidationError::PercentOutOfRange { field, value })
            } else {
                Ok(())
            }
        };
        for (category, record) in self.stats.iter().flatten() {
            percent(format!("stats.{category}.successRate"), record.success_rate)?;
        }
        for (name, config) in self.configs.iter().flatten() {
            for variant in config.scripts.iter() {
                let field = format!("configs.{name}.scripts.{}.confidence", variant.tier);
                percent(field, variant.confidence)?;
            }
        }
        Ok(())
    }
}

/// Failures while reading, writing or decoding durable records.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not encode {what}: {source}")]
    Encode {
        what: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whole-record persistence for the four logical records.
///
/// Every save replaces the stored record entirely.
pub trait RecordStore {
    fn load_sites(&self) -> Result<Vec<Site>, StoreError>;
    fn save_sites(&self, sites: &[Site]) -> Result<(), StoreError>;

    fn load_stats(&self) -> Result<Stats, StoreError>;
    fn save_stats(&self, stats: &Stats) -> Result<(), StoreError>;

    fn load_configs(&self) -> Result<Configs, StoreError>;
    fn save_configs(&self, configs: &Configs) -> Result<(), StoreError>;

    fn load_preferences(&self) -> Result<Preferences, StoreError>;
    fn save_preferences(&self, preferences: &Preferences) -> Result<(), StoreError>;

    /// Replace every record present in `import` in one step. Backends that can
    /// stage writes should not leave a partially applied import behind.
    fn apply_import(&self, import: &SnapshotImport) -> Result<(), StoreError> {
        if let Some(sites) = &import.sites {
            self.save_sites(sites)?;
        }
        if let Some(stats) = &import.stats {
            self.save_stats(stats)?;
        }
        if let Some(configs) = &import.configs {
            self.save_configs(configs)?;
        }
        if let Some(theme) = import.theme {
            let preferences = Preferences {
                theme,
                ..self.load_preferences()?
            };
            self.save_preferences(&preferences)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_stats_cover_every_category() {
        let stats = default_stats();
        assert_eq!(stats.len(), 5);
        assert_eq!(stats[&ScriptCategory::Disable].success_rate, 100);
        assert!(stats.values().all(|s| s.uses == 0));
    }

    #[test]
    fn stats_accept_legacy_success_key() {
        let record: StatsRecord =
            serde_json::from_value(json!({ "uses": 3, "success": 92 })).unwrap();
        assert_eq!(
            record,
            StatsRecord {
                uses: 3,
                success_rate: 92
            }
        );
        let encoded = serde_json::to_value(record).unwrap();
        assert_eq!(encoded, json!({ "uses": 3, "successRate": 92 }));
    }

    #[test]
    fn import_document_tolerates_missing_keys() {
        let import: SnapshotImport = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert!(import.sites.is_none());
        assert!(import.stats.is_none());
        assert!(import.configs.is_none());
        assert_eq!(import.theme, Some(Theme::Dark));
    }

    #[test]
    fn saved_config_accepts_code_strings() {
        let config: SavedConfig = serde_json::from_value(json!({
            "name": "checkout",
            "type": "cart",
            "selector": ".cart-items",
            "score": 42,
            "scripts": {
                "basic": "getItems();",
                "optimized": "observe();",
                "advanced": "withFallbacks();"
            },
            "documentation": "# Cart Items Script Generator",
            "created": "2024-05-01T10:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(config.category, ScriptCategory::Cart);
        assert_eq!(config.scripts.basic.code, "getItems();");
        assert_eq!(config.scripts.basic.confidence, 95);
        assert_eq!(config.scripts.optimized.confidence, 90);
        assert_eq!(config.scripts.advanced.tier, Tier::Advanced);
        assert_eq!(config.scripts.advanced.confidence, 98);

        // re-encoding writes the current variant shape, which decodes back unchanged
        let encoded = serde_json::to_value(&config).unwrap();
        assert_eq!(encoded["scripts"]["basic"]["confidence"], 95);
        let decoded: SavedConfig = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn import_validation_rejects_out_of_range_percentages() {
        let import: SnapshotImport =
            serde_json::from_str(r#"{"stats":{"cart":{"uses":1,"successRate":250}}}"#).unwrap();
        assert_eq!(
            import.validate(),
            Err(ValidationError::PercentOutOfRange {
                field: "stats.cart.successRate".into(),
                value: 250,
            })
        );

        let config = |confidence: u8| {
            json!({
                "name": "c",
                "category": "total",
                "selector": ".order-total",
                "score": 20,
                "scripts": {
                    "basic": { "tier": "basic", "code": "a", "confidence": confidence },
                    "optimized": { "tier": "optimized", "code": "b", "confidence": 45 },
                    "advanced": { "tier": "advanced", "code": "c", "confidence": 53 }
                },
                "documentation": "",
                "created": "2024-05-01T10:00:00Z"
            })
        };
        let import: SnapshotImport =
            serde_json::from_value(json!({ "configs": { "c": config(101) } })).unwrap();
        assert!(matches!(
            import.validate(),
            Err(ValidationError::PercentOutOfRange { value: 101, .. })
        ));
        let import: SnapshotImport =
            serde_json::from_value(json!({ "configs": { "c": config(100) } })).unwrap();
        assert_eq!(import.validate(), Ok(()));
    }

    #[test]
    fn theme_toggles() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
