use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::baseline::BaselineConfig;
use crate::error::VitalsError;
use crate::logging::LogConfig;
use crate::phenoage::PhenoAgeConfig;
use crate::recovery::RecoveryConfig;
use crate::strain::StrainConfig;

/// Scoring configuration
///
/// Every section is optional in the TOML file; missing sections and keys
/// take their documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Personal baseline window and minimum sample counts
    pub baseline: BaselineConfig,

    /// Strain defaults used when the athlete profile is incomplete
    pub strain: StrainConfig,

    /// Reading-source policy for recovery inputs
    pub recovery: RecoveryConfig,

    /// PhenoAge percentile model
    pub phenoage: PhenoAgeConfig,

    /// Logging settings
    pub logging: LogConfig,
}

impl ScoringConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: ScoringConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML configuration: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the calculators meaningless
    pub fn validate(&self) -> crate::error::Result<()> {
        let invalid = |msg: String| Err(VitalsError::Configuration(msg));

        if self.baseline.window_days == 0 {
            return invalid("baseline.window_days must be at least 1".to_string());
        }
        if self.baseline.hrv_stddev_floor <= 0.0 || self.baseline.resting_hr_stddev_floor <= 0.0 {
            return invalid("baseline standard deviation floors must be positive".to_string());
        }

        let strain = &self.strain;
        if !(0.0..=1.0).contains(&strain.non_hr_weight) {
            return invalid(format!(
                "strain.non_hr_weight must be within 0-1, got {}",
                strain.non_hr_weight
            ));
        }
        if strain.default_max_hr <= strain.default_resting_hr {
            return invalid(format!(
                "strain.default_max_hr ({}) must exceed strain.default_resting_hr ({})",
                strain.default_max_hr, strain.default_resting_hr
            ));
        }
        if strain.reference_calories_per_minute <= 0.0 {
            return invalid("strain.reference_calories_per_minute must be positive".to_string());
        }
        if strain.min_calorie_ratio <= 0.0 || strain.min_calorie_ratio > strain.max_calorie_ratio {
            return invalid(format!(
                "strain calorie ratio bounds are inverted or non-positive ({} - {})",
                strain.min_calorie_ratio, strain.max_calorie_ratio
            ));
        }

        if self.phenoage.population_stddev <= 0.0 {
            return invalid("phenoage.population_stddev must be positive".to_string());
        }

        Ok(())
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// `~/.vitalscore/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vitalscore")
            .join("config.toml")
    }

    /// Load the default config file, falling back to defaults when it is
    /// absent or unreadable
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();
        if !config_path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Ignoring invalid config {}: {:#}", config_path.display(), e);
                Self::default()
            }
        }
    }
}
