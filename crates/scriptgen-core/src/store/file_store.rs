use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, trace, warn};

use super::{
    default_stats, Configs, Preferences, RecordStore, Site, SnapshotImport, Stats, StoreError,
};

const SITES_FILE: &str = "sites.json";
const STATS_FILE: &str = "stats.json";
const CONFIGS_FILE: &str = "configs.json";
const PREFERENCES_FILE: &str = "preferences.json";

/// Keeps each record as a pretty-printed JSON file under a base directory.
///
/// Missing files read as the record's default. Writes go through a temporary
/// file and a rename so a record is never half-written.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory. The directory is created
    /// on first write.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn record_path(&self, file: &str) -> PathBuf {
        self.base_path.join(file)
    }

    fn read_record<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StoreError> {
        let path = self.record_path(file);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let value = serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
            what: path.display().to_string(),
            source,
        })?;
        trace!(path = %path.display(), "record loaded");
        Ok(Some(value))
    }

    /// Serialize `value` next to its final location and return the staged path.
    fn stage_record<T: Serialize + ?Sized>(
        &self,
        file: &str,
        value: &T,
    ) -> Result<(PathBuf, PathBuf), StoreError> {
        fs::create_dir_all(&self.base_path).map_err(|source| StoreError::Io {
            path: self.base_path.clone(),
            source,
        })?;
        let target = self.record_path(file);
        let staged = self.record_path(&format!("{file}.tmp"));
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode {
            what: file.to_string(),
            source,
        })?;
        fs::write(&staged, json).map_err(|source| StoreError::Io {
            path: staged.clone(),
            source,
        })?;
        Ok((staged, target))
    }

    fn commit(staged: &Path, target: &Path) -> Result<(), StoreError> {
        fs::rename(staged, target).map_err(|source| StoreError::Io {
            path: target.to_path_buf(),
            source,
        })
    }

    fn write_record<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let (staged, target) = self.stage_record(file, value)?;
        Self::commit(&staged, &target)?;
        debug!(path = %target.display(), "record saved");
        Ok(())
    }

    fn discard(staged: &[(PathBuf, PathBuf)]) {
        for (path, _) in staged {
            let _ = fs::remove_file(path);
        }
    }

    /// Current bytes at `target`, or `None` when nothing is stored there yet.
    fn previous_contents(target: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(target) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: target.to_path_buf(),
                source,
            }),
        }
    }

    /// Put committed targets back the way they were, newest first.
    ///
    /// Best effort: a failed restore is logged and the rest still run.
    fn roll_back(committed: &[(&Path, Option<Vec<u8>>)]) {
        for (target, previous) in committed.iter().rev() {
            let outcome = match previous {
                Some(bytes) => fs::write(target, bytes),
                None => fs::remove_file(target),
            };
            if let Err(err) = outcome {
                warn!(path = %target.display(), error = %err, "could not restore record");
            }
        }
    }
}

impl RecordStore for FileStore {
    fn load_sites(&self) -> Result<Vec<Site>, StoreError> {
        Ok(self.read_record(SITES_FILE)?.unwrap_or_default())
    }

    fn save_sites(&self, sites: &[Site]) -> Result<(), StoreError> {
        self.write_record(SITES_FILE, sites)
    }

    fn load_stats(&self) -> Result<Stats, StoreError> {
        Ok(self.read_record(STATS_FILE)?.unwrap_or_else(default_stats))
    }

    fn save_stats(&self, stats: &Stats) -> Result<(), StoreError> {
        self.write_record(STATS_FILE, stats)
    }

    fn load_configs(&self) -> Result<Configs, StoreError> {
        Ok(self.read_record(CONFIGS_FILE)?.unwrap_or_default())
    }

    fn save_configs(&self, configs: &Configs) -> Result<(), StoreError> {
        self.write_record(CONFIGS_FILE, configs)
    }

    fn load_preferences(&self) -> Result<Preferences, StoreError> {
        Ok(self.read_record(PREFERENCES_FILE)?.unwrap_or_default())
    }

    fn save_preferences(&self, preferences: &Preferences) -> Result<(), StoreError> {
        self.write_record(PREFERENCES_FILE, preferences)
    }

    /// Stage every present record first; only rename once all are written.
    ///
    /// If a rename fails, records already renamed are restored from the
    /// contents they had before the import and leftover staged files are
    /// removed.
    fn apply_import(&self, import: &SnapshotImport) -> Result<(), StoreError> {
        let mut staged = Vec::new();
        if let Err(err) = self.stage_import(import, &mut staged) {
            Self::discard(&staged);
            return Err(err);
        }
        let mut committed = Vec::with_capacity(staged.len());
        for (index, (path, target)) in staged.iter().enumerate() {
            let outcome = Self::previous_contents(target).and_then(|previous| {
                Self::commit(path, target)?;
                Ok(previous)
            });
            match outcome {
                Ok(previous) => committed.push((target.as_path(), previous)),
                Err(err) => {
                    Self::discard(&staged[index..]);
                    Self::roll_back(&committed);
                    warn!(error = %err, rolled_back = committed.len(), "import aborted");
                    return Err(err);
                }
            }
        }
        debug!(records = staged.len(), "import committed");
        Ok(())
    }
}

impl FileStore {
    fn stage_import(
        &self,
        import: &SnapshotImport,
        staged: &mut Vec<(PathBuf, PathBuf)>,
    ) -> Result<(), StoreError> {
        if let Some(sites) = &import.sites {
            staged.push(self.stage_record(SITES_FILE, sites)?);
        }
        if let Some(stats) = &import.stats {
            staged.push(self.stage_record(STATS_FILE, stats)?);
        }
        if let Some(configs) = &import.configs {
            staged.push(self.stage_record(CONFIGS_FILE, configs)?);
        }
        if let Some(theme) = import.theme {
            let preferences = Preferences {
                theme,
                ..self.load_preferences()?
            };
            staged.push(self.stage_record(PREFERENCES_FILE, &preferences)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{StatsRecord, Theme};
    use crate::templates::ScriptCategory;
    use chrono::Utc;

    fn site(name: &str) -> Site {
        Site {
            name: name.into(),
            url: format!("https://{name}.example/"),
            status: "active".into(),
            active: false,
            last_updated: Utc::now(),
            scripts: Default::default(),
        }
    }

    fn staged_leftovers(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "tmp"))
            .collect()
    }

    #[test]
    fn missing_files_read_as_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp.path().join("nested"));
        assert!(store.load_sites().unwrap().is_empty());
        assert_eq!(store.load_stats().unwrap(), default_stats());
        assert!(store.load_configs().unwrap().is_empty());
        assert_eq!(store.load_preferences().unwrap(), Preferences::default());
    }

    #[test]
    fn records_round_trip_through_files() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp.path());
        let sites = vec![site("alpha"), site("beta")];
        store.save_sites(&sites).unwrap();
        let mut stats = default_stats();
        stats.insert(
            ScriptCategory::Cart,
            StatsRecord {
                uses: 4,
                success_rate: 98,
            },
        );
        store.save_stats(&stats).unwrap();

        let reopened = FileStore::new(temp.path());
        assert_eq!(reopened.load_sites().unwrap(), sites);
        assert_eq!(reopened.load_stats().unwrap(), stats);
        assert!(temp.path().join(SITES_FILE).exists());
        assert!(!temp.path().join("sites.json.tmp").exists());
    }

    #[test]
    fn corrupt_record_reports_decode_error() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(SITES_FILE), "{ nope").unwrap();
        let store = FileStore::new(temp.path());
        let err = store.load_sites().unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[test]
    fn import_replaces_only_present_records() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp.path());
        store.save_sites(&[site("kept")]).unwrap();
        store
            .save_preferences(&Preferences {
                theme: Theme::Light,
                debug_enabled: true,
            })
            .unwrap();

        let import = SnapshotImport {
            theme: Some(Theme::Dark),
            configs: Some(Configs::new()),
            ..Default::default()
        };
        store.apply_import(&import).unwrap();

        assert_eq!(store.load_sites().unwrap()[0].name, "kept");
        let prefs = store.load_preferences().unwrap();
        assert_eq!(prefs.theme, Theme::Dark);
        assert!(prefs.debug_enabled);
        assert!(temp.path().join(CONFIGS_FILE).exists());
    }

    #[test]
    fn failed_staging_leaves_records_untouched() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp.path());
        let kept = vec![site("kept")];
        store.save_sites(&kept).unwrap();
        fs::write(temp.path().join(PREFERENCES_FILE), "{ nope").unwrap();

        let import = SnapshotImport {
            sites: Some(vec![site("incoming")]),
            theme: Some(Theme::Dark),
            ..Default::default()
        };
        let err = store.apply_import(&import).unwrap_err();

        assert!(matches!(err, StoreError::Decode { .. }));
        assert_eq!(store.load_sites().unwrap(), kept);
        assert!(staged_leftovers(temp.path()).is_empty());
    }

    #[test]
    fn failed_commit_restores_earlier_records() {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp.path());
        let kept = vec![site("kept")];
        store.save_sites(&kept).unwrap();
        // a directory where the configs file belongs makes its rename fail
        fs::create_dir(temp.path().join(CONFIGS_FILE)).unwrap();
        fs::write(temp.path().join(CONFIGS_FILE).join("keep"), "x").unwrap();

        let import = SnapshotImport {
            sites: Some(vec![site("incoming")]),
            stats: Some(default_stats()),
            configs: Some(Configs::new()),
            ..Default::default()
        };
        let err = store.apply_import(&import).unwrap_err();

        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(store.load_sites().unwrap(), kept);
        assert!(!temp.path().join(STATS_FILE).exists());
        assert!(staged_leftovers(temp.path()).is_empty());
    }
}
