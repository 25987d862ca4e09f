use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use super::{
    normalize_url, Configs, Preferences, RecordStore, SavedConfig, Site, Snapshot,
    SnapshotImport, Stats, StatsRecord, StoreError, Theme,
};
use crate::error::{InputError, Result, ValidationError};
use crate::templates::ScriptCategory;

const NEW_SITE_STATUS: &str = "active";

/// Record-level operations over a [`RecordStore`]. Every mutation loads the
/// affected record, changes it and writes it back whole.
pub struct Library<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> Library<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // sites

    pub fn sites(&self) -> Result<Vec<Site>> {
        Ok(self.store.load_sites()?)
    }

    /// Sites whose name or URL contains `query`, case-insensitively, paired
    /// with their index in the full list.
    pub fn search_sites(&self, query: &str) -> Result<Vec<(usize, Site)>> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .sites()?
            .into_iter()
            .enumerate()
            .filter(|(_, site)| {
                needle.is_empty()
                    || site.name.to_lowercase().contains(&needle)
                    || site.url.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Add a site. The first site added becomes the active one.
    pub fn add_site(&self, name: &str, raw_url: &str, now: DateTime<Utc>) -> Result<Site> {
        let name = required_name(name)?;
        let url = normalize_url(raw_url)?;
        let mut sites = self.store.load_sites()?;
        let site = Site {
            name,
            url,
            status: NEW_SITE_STATUS.to_string(),
            active: sites.is_empty(),
            last_updated: now,
            scripts: Default::default(),
        };
        sites.push(site.clone());
        self.store.save_sites(&sites)?;
        info!(name = %site.name, url = %site.url, "site added");
        Ok(site)
    }

    pub fn edit_site(
        &self,
        index: i64,
        name: Option<&str>,
        raw_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Site> {
        let mut sites = self.store.load_sites()?;
        let slot = site_index(index, sites.len())?;
        let name = name.map(required_name).transpose()?;
        let url = raw_url.map(normalize_url).transpose()?;

        let site = &mut sites[slot];
        if let Some(name) = name {
            site.name = name;
        }
        if let Some(url) = url {
            site.url = url;
        }
        site.last_updated = now;
        let edited = site.clone();
        self.store.save_sites(&sites)?;
        info!(index = slot, name = %edited.name, "site edited");
        Ok(edited)
    }

    pub fn delete_site(&self, index: i64) -> Result<Site> {
        let mut sites = self.store.load_sites()?;
        let slot = site_index(index, sites.len())?;
        let removed = sites.remove(slot);
        self.store.save_sites(&sites)?;
        info!(name = %removed.name, "site deleted");
        Ok(removed)
    }

    /// Mark exactly the site at `index` active and every other site inactive.
    pub fn set_active_site(&self, index: i64) -> Result<Site> {
        let mut sites = self.store.load_sites()?;
        let slot = site_index(index, sites.len())?;
        for (i, site) in sites.iter_mut().enumerate() {
            site.active = i == slot;
        }
        self.store.save_sites(&sites)?;
        debug!(index = slot, "active site updated");
        Ok(sites.swap_remove(slot))
    }

    // stats

    pub fn stats(&self) -> Result<Stats> {
        Ok(self.store.load_stats()?)
    }

    /// Count one more use of `category`.
    pub fn record_use(&self, category: ScriptCategory) -> Result<StatsRecord> {
        let mut stats = self.store.load_stats()?;
        let defaults = super::default_stats();
        let record = stats
            .entry(category)
            .or_insert_with(|| defaults[&category]);
        record.uses = record.uses.saturating_add(1);
        let updated = *record;
        self.store.save_stats(&stats)?;
        debug!(%category, uses = updated.uses, "stats updated");
        Ok(updated)
    }

    // configs

    pub fn configs(&self) -> Result<Configs> {
        Ok(self.store.load_configs()?)
    }

    pub fn config(&self, name: &str) -> Result<Option<SavedConfig>> {
        Ok(self.store.load_configs()?.remove(name))
    }

    /// Store `config` under its name, replacing any config with the same name.
    pub fn save_config(&self, config: SavedConfig) -> Result<()> {
        if config.name.trim().is_empty() {
            return Err(InputError::EmptyConfigName.into());
        }
        let mut configs = self.store.load_configs()?;
        let name = config.name.clone();
        let replaced = configs.insert(name.clone(), config).is_some();
        self.store.save_configs(&configs)?;
        info!(%name, replaced, "config saved");
        Ok(())
    }

    // preferences

    pub fn preferences(&self) -> Result<Preferences> {
        Ok(self.store.load_preferences()?)
    }

    pub fn set_theme(&self, theme: Theme) -> Result<Preferences> {
        self.update_preferences(|prefs| prefs.theme = theme)
    }

    pub fn toggle_theme(&self) -> Result<Preferences> {
        self.update_preferences(|prefs| prefs.theme = prefs.theme.toggled())
    }

    pub fn set_debug(&self, enabled: bool) -> Result<Preferences> {
        self.update_preferences(|prefs| prefs.debug_enabled = enabled)
    }

    fn update_preferences(&self, change: impl FnOnce(&mut Preferences)) -> Result<Preferences> {
        let mut prefs = self.store.load_preferences()?;
        change(&mut prefs);
        self.store.save_preferences(&prefs)?;
        Ok(prefs)
    }

    // exchange

    #[instrument(name = "export_snapshot", skip(self))]
    pub fn export_snapshot(&self, now: DateTime<Utc>) -> Result<Snapshot> {
        let snapshot = Snapshot {
            sites: self.store.load_sites()?,
            stats: self.store.load_stats()?,
            configs: self.store.load_configs()?,
            theme: self.store.load_preferences()?.theme,
            export_date: now,
        };
        info!(
            sites = snapshot.sites.len(),
            configs = snapshot.configs.len(),
            "snapshot exported"
        );
        Ok(snapshot)
    }

    /// Replace the records present in `raw`. An undecodable document, or one
    /// carrying a percentage above 100, is rejected before anything is written.
    #[instrument(name = "import_snapshot", skip(self, raw), fields(input_len = raw.len()))]
    pub fn import_snapshot(&self, raw: &str) -> Result<SnapshotImport> {
        let import: SnapshotImport =
            serde_json::from_str(raw).map_err(|source| StoreError::Decode {
                what: "import document".to_string(),
                source,
            })?;
        import.validate()?;
        self.store.apply_import(&import)?;
        info!(
            sites = import.sites.is_some(),
            stats = import.stats.is_some(),
            configs = import.configs.is_some(),
            theme = import.theme.is_some(),
            "snapshot imported"
        );
        Ok(import)
    }
}

fn required_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptySiteName.into());
    }
    Ok(trimmed.to_string())
}

fn site_index(index: i64, len: usize) -> Result<usize, ValidationError> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or(ValidationError::SiteOutOfRange { index, len })
}
