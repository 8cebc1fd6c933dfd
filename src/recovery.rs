//! Recovery score composition
//!
//! Five weighted components feed the recovery score:
//!
//! - **Sleep quality** (35%): last night's sleep score
//! - **HRV status** (25%): tonight's HRV against the personal baseline
//! - **Resting HR status** (15%): tonight's resting HR, lower is better
//! - **Strain impact** (15%): how much yesterday's load still weighs
//! - **Sleep consistency** (10%): bedtime deviation from the usual bedtime
//!
//! Against a baseline, HRV and resting HR are mapped through a smooth
//! sigmoid of their z-score:
//!
//! ```text
//! score = 75 + 25 · tanh(0.75 · z)
//! ```
//!
//! Sleep quality is mandatory. Without it no score is produced at all.
//! Any other missing component is left out and the remaining weights are
//! re-normalised.

use crate::baseline::{circular_deviation_minutes, PersonalBaseline};
use crate::models::ScoreComponent;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

pub const SLEEP_WEIGHT: f64 = 0.35;
pub const HRV_WEIGHT: f64 = 0.25;
pub const RESTING_HR_WEIGHT: f64 = 0.15;
pub const STRAIN_WEIGHT: f64 = 0.15;
pub const CONSISTENCY_WEIGHT: f64 = 0.10;

/// Which readings may stand in for tonight's missing values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingPolicy {
    /// Only readings taken during the scored night count
    #[default]
    NightlyOnly,
    /// Fall back to the most recent older reading when the night has none
    AllowStale,
}

impl ReadingPolicy {
    /// Resolve the reading to use, nightly first
    ///
    /// Non-positive or non-finite values are treated as absent.
    pub fn resolve(&self, sources: &ReadingSources) -> Option<f64> {
        let nightly = sources.nightly.filter(|v| is_reading(*v));
        match self {
            ReadingPolicy::NightlyOnly => nightly,
            ReadingPolicy::AllowStale => nightly.or(sources.stale.filter(|v| is_reading(*v))),
        }
    }
}

impl fmt::Display for ReadingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingPolicy::NightlyOnly => write!(f, "nightly_only"),
            ReadingPolicy::AllowStale => write!(f, "allow_stale"),
        }
    }
}

impl std::str::FromStr for ReadingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "nightly_only" | "nightly" => Ok(ReadingPolicy::NightlyOnly),
            "allow_stale" | "stale" => Ok(ReadingPolicy::AllowStale),
            _ => Err(format!("Invalid reading policy: {}", s)),
        }
    }
}

fn is_reading(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Candidate values for one physiological reading, in precedence order
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingSources {
    /// Value measured during the scored night
    #[serde(default)]
    pub nightly: Option<f64>,

    /// Most recent value from an older, non-nightly sample
    #[serde(default)]
    pub stale: Option<f64>,
}

impl ReadingSources {
    pub fn nightly(value: Option<f64>) -> Self {
        Self {
            nightly: value,
            stale: None,
        }
    }

    pub fn with_stale(mut self, value: Option<f64>) -> Self {
        self.stale = value;
        self
    }
}

/// Recovery configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default)]
    pub reading_policy: ReadingPolicy,
}

/// Everything the composer needs for one morning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryInputs {
    /// Last night's sleep score (0-100); zero means no data
    #[serde(default)]
    pub sleep_score: Option<f64>,

    #[serde(default)]
    pub hrv: ReadingSources,

    #[serde(default)]
    pub resting_hr: ReadingSources,

    /// Yesterday's daily strain (0-21); zero is a valid rest day
    #[serde(default)]
    pub prior_day_strain: Option<f64>,

    /// Tonight's bedtime in minutes after midnight
    #[serde(default)]
    pub bedtime_minutes: Option<f64>,
}

/// Recovery band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryCategory {
    Optimal,
    Good,
    Moderate,
    Low,
    InsufficientData,
}

impl RecoveryCategory {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 85 => RecoveryCategory::Optimal,
            s if s >= 70 => RecoveryCategory::Good,
            s if s >= 50 => RecoveryCategory::Moderate,
            _ => RecoveryCategory::Low,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            RecoveryCategory::Optimal => {
                "Fully recovered. Your body is primed for a demanding session."
            }
            RecoveryCategory::Good => {
                "Well recovered. Train as planned and keep an eye on how you feel."
            }
            RecoveryCategory::Moderate => {
                "Partially recovered. Favour technique or aerobic work over intensity."
            }
            RecoveryCategory::Low => {
                "Recovery is low. Prioritise rest, hydration and an early night."
            }
            RecoveryCategory::InsufficientData => {
                "Wear your device overnight so last night's sleep can be tracked; recovery needs sleep data."
            }
        }
    }

    pub fn training_intensity(&self) -> &'static str {
        match self {
            RecoveryCategory::Optimal => "High intensity: intervals, races or max efforts",
            RecoveryCategory::Good => "Moderate to high intensity",
            RecoveryCategory::Moderate => "Low to moderate intensity",
            RecoveryCategory::Low => "Rest or light active recovery",
            RecoveryCategory::InsufficientData => "Unknown: listen to your body",
        }
    }
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Optimal => write!(f, "Optimal"),
            RecoveryCategory::Good => write!(f, "Good"),
            RecoveryCategory::Moderate => write!(f, "Moderate"),
            RecoveryCategory::Low => write!(f, "Low"),
            RecoveryCategory::InsufficientData => write!(f, "Insufficient Data"),
        }
    }
}

/// Per-component breakdown of a recovery score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryComponents {
    pub sleep_quality: ScoreComponent,
    pub hrv_status: ScoreComponent,
    pub resting_hr_status: ScoreComponent,
    pub strain_impact: ScoreComponent,
    pub sleep_consistency: ScoreComponent,
}

impl RecoveryComponents {
    pub fn as_array(&self) -> [(&'static str, ScoreComponent); 5] {
        [
            ("sleep_quality", self.sleep_quality),
            ("hrv_status", self.hrv_status),
            ("resting_hr_status", self.resting_hr_status),
            ("strain_impact", self.strain_impact),
            ("sleep_consistency", self.sleep_consistency),
        ]
    }
}

/// Composed recovery for one morning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryResult {
    /// Recovery score (0-100), `None` without sleep data
    pub score: Option<u8>,
    pub category: RecoveryCategory,
    pub components: RecoveryComponents,

    /// Sum of the weights that contributed to the score
    pub contributing_weight: f64,

    pub recommendation: String,
    pub training_intensity: String,
}

/// Recovery composer
#[derive(Debug, Clone, Default)]
pub struct RecoveryCalculator {
    config: RecoveryConfig,
}

impl RecoveryCalculator {
    pub fn new(config: RecoveryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Compose the recovery score
    pub fn calculate_recovery(
        &self,
        inputs: &RecoveryInputs,
        baseline: Option<&PersonalBaseline>,
    ) -> RecoveryResult {
        let policy = self.config.reading_policy;
        let sleep_score = inputs.sleep_score.filter(|s| is_reading(*s));
        let hrv = policy.resolve(&inputs.hrv);
        let resting_hr = policy.resolve(&inputs.resting_hr);

        let components = RecoveryComponents {
            sleep_quality: ScoreComponent::from_option(sleep_score, SLEEP_WEIGHT),
            hrv_status: ScoreComponent::from_option(
                hrv.map(|v| Self::score_hrv(v, baseline)),
                HRV_WEIGHT,
            ),
            resting_hr_status: ScoreComponent::from_option(
                resting_hr.map(|v| Self::score_resting_hr(v, baseline)),
                RESTING_HR_WEIGHT,
            ),
            strain_impact: ScoreComponent::from_option(
                inputs
                    .prior_day_strain
                    .filter(|s| s.is_finite() && *s >= 0.0)
                    .map(Self::score_strain_impact),
                STRAIN_WEIGHT,
            ),
            sleep_consistency: ScoreComponent::from_option(
                Self::score_consistency(inputs.bedtime_minutes, baseline),
                CONSISTENCY_WEIGHT,
            ),
        };

        let parts = components.as_array().map(|(_, c)| c);
        let contributing_weight = ScoreComponent::contributing_weight(&parts);

        if sleep_score.is_none() {
            warn!("No sleep data for the night; recovery cannot be calculated");
            let category = RecoveryCategory::InsufficientData;
            return RecoveryResult {
                score: None,
                category,
                components,
                contributing_weight,
                recommendation: category.recommendation().to_string(),
                training_intensity: category.training_intensity().to_string(),
            };
        }

        let score = ScoreComponent::combine(&parts)
            .map(|s| s.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(0);
        let category = RecoveryCategory::from_score(score);

        if baseline.is_none() {
            debug!("No personal baseline; HRV and resting HR scored on population bands");
        }
        debug!(score, %category, contributing_weight, "Recovery composed");

        RecoveryResult {
            score: Some(score),
            category,
            components,
            contributing_weight,
            recommendation: category.recommendation().to_string(),
            training_intensity: category.training_intensity().to_string(),
        }
    }

    /// Smooth mapping of a z-score to 50-100 around a neutral 75
    pub fn sigmoid_score(z: f64) -> f64 {
        75.0 + 25.0 * (0.75 * z).tanh()
    }

    /// HRV status, higher is better
    pub fn score_hrv(hrv: f64, baseline: Option<&PersonalBaseline>) -> f64 {
        match baseline {
            Some(b) => Self::sigmoid_score(b.hrv_z_score(hrv)),
            None => match hrv {
                v if v >= 70.0 => 95.0,
                v if v >= 50.0 => 80.0,
                v if v >= 35.0 => 65.0,
                v if v >= 25.0 => 50.0,
                _ => 35.0,
            },
        }
    }

    /// Resting HR status, lower is better
    pub fn score_resting_hr(resting_hr: f64, baseline: Option<&PersonalBaseline>) -> f64 {
        match baseline {
            Some(b) => Self::sigmoid_score(-b.resting_hr_z_score(resting_hr)),
            None => match resting_hr {
                v if v <= 50.0 => 95.0,
                v if v <= 60.0 => 85.0,
                v if v <= 70.0 => 70.0,
                v if v <= 80.0 => 55.0,
                _ => 40.0,
            },
        }
    }

    /// Residual impact of yesterday's strain, monotonically decreasing
    pub fn score_strain_impact(strain: f64) -> f64 {
        match strain {
            s if s <= 3.0 => 100.0,
            s if s <= 6.0 => 90.0,
            s if s <= 10.0 => 80.0,
            s if s <= 14.0 => 65.0,
            s if s <= 18.0 => 40.0,
            _ => 15.0,
        }
    }

    /// Bedtime consistency, `None` without both a bedtime and a baseline
    pub fn score_consistency(
        bedtime_minutes: Option<f64>,
        baseline: Option<&PersonalBaseline>,
    ) -> Option<f64> {
        let bedtime = bedtime_minutes.filter(|m| m.is_finite())?;
        let baseline = baseline?;

        let deviation = circular_deviation_minutes(bedtime, baseline.avg_bedtime_minutes);
        let score = match deviation {
            d if d <= 15.0 => 100.0,
            d if d <= 30.0 => 85.0,
            d if d <= 45.0 => 70.0,
            d if d <= 60.0 => 55.0,
            d if d <= 90.0 => 40.0,
            _ => 25.0,
        };
        Some(score)
    }
}
