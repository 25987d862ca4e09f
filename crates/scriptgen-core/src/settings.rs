use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::diagnostic::AUTO_SELECT_CONFIDENCE;
use crate::error::ValidationError;

/// Runtime settings. Every field has a default, so partial sources are fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Directory holding the JSON records.
    pub store_dir: PathBuf,
    /// Minimum confidence for the top candidate to be picked automatically.
    pub auto_select_threshold: u32,
    /// Delay before each batch category starts processing.
    pub batch_interval_ms: u64,
    /// Delay between a category starting and finishing.
    pub batch_step_ms: u64,
}

impl AppSettings {
    pub const DEFAULT_STORE_DIR: &'static str = "./.scriptgen";
    pub const DEFAULT_BATCH_INTERVAL_MS: u64 = 1500;
    pub const DEFAULT_BATCH_STEP_MS: u64 = 1000;

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.auto_select_threshold > 100 {
            return Err(ValidationError::InvalidThreshold {
                value: self.auto_select_threshold,
            });
        }
        Ok(())
    }

    /// Threshold as a confidence value. Call [`validate`](Self::validate) first;
    /// out-of-range values saturate at 100.
    pub fn threshold(&self) -> u8 {
        self.auto_select_threshold.min(100) as u8
    }

    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }

    pub fn batch_step(&self) -> Duration {
        Duration::from_millis(self.batch_step_ms)
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(Self::DEFAULT_STORE_DIR),
            auto_select_threshold: u32::from(AUTO_SELECT_CONFIDENCE),
            batch_interval_ms: Self::DEFAULT_BATCH_INTERVAL_MS,
            batch_step_ms: Self::DEFAULT_BATCH_STEP_MS,
        }
    }
}
