use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analyzers::segmentation::PitWindow;
use crate::error::{LapDataError, Result};

pub const DATASET_DIR_VAR: &str = "LAP_EVENTS_DATASET_DIR";
pub const OUTPUT_DIR_VAR: &str = "LAP_EVENTS_OUTPUT_DIR";

/// Where input tables live, where reports go, and analysis thresholds.
///
/// Stored as JSON; every field is optional:
/// ```json
/// {
///   "dataset_dir": "../dataset",
///   "output_dir": "../csv_generated",
///   "pit_window": { "min_secs": 10.0, "max_secs": 60.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub dataset_dir: PathBuf,
    pub output_dir: PathBuf,
    pub laps_file: String,
    pub weather_file: String,
    pub positions_file: String,
    pub results_file: String,
    pub pit_window: PitWindow,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            dataset_dir: PathBuf::from("../dataset"),
            output_dir: PathBuf::from("../csv_generated"),
            laps_file: "lap_2024.csv".to_string(),
            weather_file: "weather_2024.csv".to_string(),
            positions_file: "position_2024.csv".to_string(),
            results_file: "result_2024.csv".to_string(),
            pit_window: PitWindow::default(),
        }
    }
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| LapDataError::MissingInput {
                path: path.to_path_buf(),
                source,
            })?;
        let config: AnalysisConfig =
            serde_json::from_str(&content).map_err(|e| LapDataError::InvalidConfig {
                reason: format!("{}: {e}", path.display()),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Applies directory overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies directory overrides from `lookup`; empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| lookup(name).filter(|v: &String| !v.is_empty());
        if let Some(dir) = lookup(DATASET_DIR_VAR) {
            self.dataset_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(OUTPUT_DIR_VAR) {
            self.output_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        let PitWindow { min_secs, max_secs } = self.pit_window;
        if !min_secs.is_finite() || !max_secs.is_finite() || min_secs > max_secs {
            return Err(LapDataError::InvalidConfig {
                reason: format!("pit window [{min_secs}, {max_secs}] is not a valid range"),
            });
        }
        Ok(())
    }

    pub fn laps_path(&self) -> PathBuf {
        self.dataset_dir.join(&self.laps_file)
    }

    pub fn weather_path(&self) -> PathBuf {
        self.dataset_dir.join(&self.weather_file)
    }

    pub fn positions_path(&self) -> PathBuf {
        self.dataset_dir.join(&self.positions_file)
    }

    pub fn results_path(&self) -> PathBuf {
        self.dataset_dir.join(&self.results_file)
    }
}
