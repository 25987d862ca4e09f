use std::sync::{Mutex, MutexGuard};

use super::{
    default_stats, Configs, Preferences, RecordStore, Site, SnapshotImport, Stats, StoreError,
};

#[derive(Debug, Clone)]
struct Records {
    sites: Vec<Site>,
    stats: Stats,
    configs: Configs,
    preferences: Preferences,
}

/// Process-local store, used for tests and throwaway sessions.
#[derive(Debug)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            records: Mutex::new(Records {
                sites: Vec::new(),
                stats: default_stats(),
                configs: Configs::new(),
                preferences: Preferences::default(),
            }),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, Records> {
        // a panic while holding the lock cannot leave a record half-replaced
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RecordStore for MemoryStore {
    fn load_sites(&self) -> Result<Vec<Site>, StoreError> {
        Ok(self.records().sites.clone())
    }

    fn save_sites(&self, sites: &[Site]) -> Result<(), StoreError> {
        self.records().sites = sites.to_vec();
        Ok(())
    }

    fn load_stats(&self) -> Result<Stats, StoreError> {
        Ok(self.records().stats.clone())
    }

    fn save_stats(&self, stats: &Stats) -> Result<(), StoreError> {
        self.records().stats = stats.clone();
        Ok(())
    }

    fn load_configs(&self) -> Result<Configs, StoreError> {
        Ok(self.records().configs.clone())
    }

    fn save_configs(&self, configs: &Configs) -> Result<(), StoreError> {
        self.records().configs = configs.clone();
        Ok(())
    }

    fn load_preferences(&self) -> Result<Preferences, StoreError> {
        Ok(self.records().preferences)
    }

    fn save_preferences(&self, preferences: &Preferences) -> Result<(), StoreError> {
        self.records().preferences = *preferences;
        Ok(())
    }

    fn apply_import(&self, import: &SnapshotImport) -> Result<(), StoreError> {
        let mut records = self.records();
        if let Some(sites) = &import.sites {
            records.sites = sites.clone();
        }
        if let Some(stats) = &import.stats {
            records.stats = stats.clone();
        }
        if let Some(configs) = &import.configs {
            records.configs = configs.clone();
        }
        if let Some(theme) = import.theme {
            records.preferences.theme = theme;
        }
        Ok(())
    }
}
