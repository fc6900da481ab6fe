//! Explicit configuration for fusion, evaluation and threshold search.
//!
//! Every section has working defaults, so an empty JSON object is a valid
//! configuration file.

use crate::error::{Result, RoiEvalError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding [`ThresholdSearchConfig::workers`].
pub const WORKERS_ENV: &str = "ROI_EVAL_WORKERS";

/// Class reserved for invalid annotations, left out of the `Total` statistics.
pub const INVALID_CLASS: &str = "INVALID";

/// Settings of the multi-resolution detection fuser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Containment ratio above which two candidates collide.
    pub containment_threshold: f64,
    /// Uniform per-class score threshold used when no tuned map is available.
    pub lowest_score_threshold: f64,
    /// Minimum side (pixels) of a materialized ROI.
    pub min_side_size: u32,
    pub algorithm: String,
    pub algorithm_version: String,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            containment_threshold: 0.5,
            lowest_score_threshold: 0.5,
            min_side_size: 0,
            algorithm: "retinanet".to_string(),
            algorithm_version: String::new(),
        }
    }
}

/// Settings of the ROI evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Minimum side length (pixels) for an ROI to be counted.
    pub min_size: u32,
    /// Classes left out of the `Total` statistics.
    pub excluded_total_classes: Vec<String>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            min_size: 25,
            excluded_total_classes: vec![INVALID_CLASS.to_string()],
        }
    }
}

/// Settings of the per-class confidence threshold search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSearchConfig {
    pub start: f64,
    pub end: f64,
    pub step: f64,
    /// Threshold held by every class other than the one being searched.
    pub default_threshold: f64,
    /// Minimum ROI side used by the evaluations run during the search.
    pub min_size: u32,
    /// Worker pool size; `None` uses half of the available parallelism.
    pub workers: Option<usize>,
    pub excluded_total_classes: Vec<String>,
}

impl Default for ThresholdSearchConfig {
    fn default() -> Self {
        Self {
            start: 0.10,
            end: 1.00,
            step: 0.01,
            default_threshold: 0.5,
            min_size: 15,
            workers: None,
            excluded_total_classes: vec![INVALID_CLASS.to_string()],
        }
    }
}

impl ThresholdSearchConfig {
    /// Evaluation settings used for every candidate threshold.
    pub fn evaluation(&self) -> EvaluationConfig {
        EvaluationConfig {
            min_size: self.min_size,
            excluded_total_classes: self.excluded_total_classes.clone(),
        }
    }

    /// Number of worker threads to run the search with.
    pub fn worker_count(&self) -> usize {
        match self.workers {
            Some(n) => n.max(1),
            None => {
                let available = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(2);
                (available / 2).max(1)
            }
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fusion: FusionConfig,
    pub evaluation: EvaluationConfig,
    pub threshold_search: ThresholdSearchConfig,
}

impl Config {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides taken from the environment.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(value) = std::env::var(WORKERS_ENV) {
            let workers = value.trim().parse::<usize>().map_err(|e| {
                RoiEvalError::InvalidConfig(format!("{WORKERS_ENV}={value}: {e}"))
            })?;
            self.threshold_search.workers = Some(workers);
        }
        Ok(self)
    }

    /// Check ranges of every numeric setting.
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| -> Result<()> {
            if !(0.0..=1.0).contains(&value) {
                return Err(RoiEvalError::InvalidConfig(format!(
                    "{name} must be between 0.0 and 1.0, got {value}"
                )));
            }
            Ok(())
        };

        unit("fusion.containment_threshold", self.fusion.containment_threshold)?;
        unit("fusion.lowest_score_threshold", self.fusion.lowest_score_threshold)?;

        let search = &self.threshold_search;
        unit("threshold_search.start", search.start)?;
        unit("threshold_search.end", search.end)?;
        unit("threshold_search.default_threshold", search.default_threshold)?;
        if search.start > search.end {
            return Err(RoiEvalError::InvalidConfig(format!(
                "threshold_search.start ({}) must be <= end ({})",
                search.start, search.end
            )));
        }
        if !(search.step > 0.0 && search.step.is_finite()) {
            return Err(RoiEvalError::InvalidConfig(format!(
                "threshold_search.step must be positive, got {}",
                search.step
            )));
        }
        if search.workers == Some(0) {
            return Err(RoiEvalError::InvalidConfig(
                "threshold_search.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and validate a configuration file, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    Config::from_json_str(&contents)?.with_env_overrides()
}
