//! Training strain estimation on a 0-21 scale
//!
//! ## Heart-rate model
//!
//! Banister's TRIMP weights time by an exponential function of heart-rate
//! reserve:
//!
//! ```text
//! y      = (HR_avg - HR_rest) / (HR_max - HR_rest)
//! TRIMP  = duration_min × y × a·e^(b·y)
//! strain = clamp(3.5 · ln(TRIMP + 1), 0, 21)
//! ```
//!
//! with `a = 0.64, b = 1.92` for men and `a = 0.86, b = 1.67` for women.
//!
//! ## Fallback without heart rate
//!
//! `strain = duration_h × 10 × intensity(type)`, scaled by how the session's
//! calorie burn rate compares to a reference rate.
//!
//! ## Daily aggregation
//!
//! TRIMP is additive, so heart-rate sessions are summed before the log
//! transform (diminishing returns apply to the day, not to each session).
//! Sessions without heart rate add their own strain at 70% weight. A day
//! with no heart-rate data at all uses `sqrt(N) × mean(strain)`.

use crate::models::{AthleteProfile, Gender, WorkoutSample, WorkoutType};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Upper end of the strain scale
pub const MAX_STRAIN: f64 = 21.0;

/// Log-scale factor mapping TRIMP to strain
const STRAIN_LOG_FACTOR: f64 = 3.5;

/// Strain configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrainConfig {
    /// Resting HR assumed when none is known (default: 60 bpm)
    pub default_resting_hr: f64,

    /// Max HR assumed when neither max HR nor age is known (default: 190 bpm)
    pub default_max_hr: f64,

    /// Weight of non-HR sessions in a day that has HR sessions (default: 0.7)
    pub non_hr_weight: f64,

    /// Calorie burn rate treated as "typical" in kcal/min (default: 8.0)
    pub reference_calories_per_minute: f64,

    /// Bounds of the calorie scaling ratio (default: 0.5 - 1.5)
    pub min_calorie_ratio: f64,
    pub max_calorie_ratio: f64,
}

impl Default for StrainConfig {
    fn default() -> Self {
        StrainConfig {
            default_resting_hr: 60.0,
            default_max_hr: 190.0,
            non_hr_weight: 0.7,
            reference_calories_per_minute: 8.0,
            min_calorie_ratio: 0.5,
            max_calorie_ratio: 1.5,
        }
    }
}

/// Strain band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrainCategory {
    Rest,
    Low,
    Moderate,
    High,
    Max,
}

impl StrainCategory {
    /// rest [0,3), low [3,9), moderate [9,14), high [14,18), max [18,21]
    pub fn from_strain(strain: f64) -> Self {
        match strain {
            s if s < 3.0 => StrainCategory::Rest,
            s if s < 9.0 => StrainCategory::Low,
            s if s < 14.0 => StrainCategory::Moderate,
            s if s < 18.0 => StrainCategory::High,
            _ => StrainCategory::Max,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StrainCategory::Rest => "Active recovery or rest",
            StrainCategory::Low => "Light activity, minimal cardiovascular load",
            StrainCategory::Moderate => "Moderate load that maintains fitness",
            StrainCategory::High => "High load that builds fitness but needs recovery",
            StrainCategory::Max => "All-out effort, plan recovery accordingly",
        }
    }
}

impl fmt::Display for StrainCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrainCategory::Rest => write!(f, "Rest"),
            StrainCategory::Low => write!(f, "Low"),
            StrainCategory::Moderate => write!(f, "Moderate"),
            StrainCategory::High => write!(f, "High"),
            StrainCategory::Max => write!(f, "Max"),
        }
    }
}

/// Method used for a strain estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrainMethod {
    HeartRate,
    Estimated,
}

/// Input for a single-session strain calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrainInput {
    pub duration_minutes: f64,
    #[serde(default)]
    pub hr_avg: Option<f64>,
    #[serde(default)]
    pub hr_max: Option<f64>,
    #[serde(default)]
    pub hr_rest: Option<f64>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default = "default_workout_type")]
    pub workout_type: WorkoutType,
    #[serde(default)]
    pub calories: Option<f64>,
}

fn default_workout_type() -> WorkoutType {
    WorkoutType::Other
}

impl StrainInput {
    /// Combine a workout with the athlete's physiological profile
    pub fn from_workout(workout: &WorkoutSample, profile: &AthleteProfile) -> Self {
        StrainInput {
            duration_minutes: workout.duration_minutes,
            hr_avg: workout.avg_heart_rate.filter(|hr| *hr > 0.0),
            hr_max: profile.max_hr,
            hr_rest: profile.resting_hr,
            age: profile.age,
            gender: profile.gender,
            workout_type: workout.workout_type,
            calories: workout.calories,
        }
    }
}

/// Strain of a single session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrainResult {
    /// Strain on the 0-21 scale, one decimal
    pub strain: f64,
    pub category: StrainCategory,
    pub method: StrainMethod,

    /// Banister TRIMP, heart-rate method only
    pub trimp: Option<f64>,

    /// Heart-rate reserve fraction, heart-rate method only
    pub hr_reserve: Option<f64>,
}

/// Aggregated strain of one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStrainResult {
    pub strain: f64,
    pub category: StrainCategory,
    pub workout_count: usize,
    pub hr_workout_count: usize,

    /// Summed TRIMP of the heart-rate sessions
    pub total_trimp: f64,

    pub workouts: Vec<StrainResult>,
}

/// Training strain calculator
#[derive(Debug, Clone, Default)]
pub struct StrainCalculator {
    config: StrainConfig,
}

impl StrainCalculator {
    pub fn new(config: StrainConfig) -> Self {
        Self { config }
    }

    /// Strain of one session, by heart rate when available
    pub fn calculate_strain(&self, input: &StrainInput) -> StrainResult {
        match input.hr_avg.filter(|hr| *hr > 0.0) {
            Some(hr_avg) => {
                let (resting, max) = self.heart_rate_bounds(input);
                let y = Self::hr_reserve(hr_avg, resting, max);
                let trimp = Self::trimp(input.duration_minutes, y, input.gender);
                let strain = round1(Self::strain_from_trimp(trimp));

                debug!(hr_avg, resting, max, y, trimp, strain, "Heart-rate strain");

                StrainResult {
                    strain,
                    category: StrainCategory::from_strain(strain),
                    method: StrainMethod::HeartRate,
                    trimp: Some(trimp),
                    hr_reserve: Some(y),
                }
            }
            None => {
                let strain = round1(self.estimate_without_hr(
                    input.duration_minutes,
                    input.workout_type,
                    input.calories,
                ));

                debug!(workout_type = %input.workout_type, strain, "Estimated strain without heart rate");

                StrainResult {
                    strain,
                    category: StrainCategory::from_strain(strain),
                    method: StrainMethod::Estimated,
                    trimp: None,
                    hr_reserve: None,
                }
            }
        }
    }

    /// Aggregate every session of one day
    pub fn calculate_daily_strain(
        &self,
        workouts: &[WorkoutSample],
        profile: &AthleteProfile,
    ) -> DailyStrainResult {
        let results: Vec<StrainResult> = workouts
            .iter()
            .map(|w| self.calculate_strain(&StrainInput::from_workout(w, profile)))
            .collect();

        let total_trimp: f64 = results.iter().filter_map(|r| r.trimp).sum();
        let hr_workout_count = results.iter().filter(|r| r.trimp.is_some()).count();
        let estimated: Vec<f64> = results
            .iter()
            .filter(|r| r.method == StrainMethod::Estimated)
            .map(|r| r.strain)
            .collect();

        let raw = if results.is_empty() {
            0.0
        } else if hr_workout_count == 0 {
            let n = estimated.len() as f64;
            let mean = estimated.iter().sum::<f64>() / n;
            n.sqrt() * mean
        } else {
            Self::strain_from_trimp(total_trimp)
                + self.config.non_hr_weight * estimated.iter().sum::<f64>()
        };

        let strain = round1(raw.clamp(0.0, MAX_STRAIN));

        debug!(
            workouts = results.len(),
            hr_workout_count, total_trimp, strain, "Aggregated daily strain"
        );

        DailyStrainResult {
            strain,
            category: StrainCategory::from_strain(strain),
            workout_count: results.len(),
            hr_workout_count,
            total_trimp,
            workouts: results,
        }
    }

    /// Heart-rate reserve fraction, never negative
    ///
    /// A max HR at or below resting HR yields 0.
    pub fn hr_reserve(hr_avg: f64, hr_rest: f64, hr_max: f64) -> f64 {
        let reserve = hr_max - hr_rest;
        if reserve <= 0.0 {
            return 0.0;
        }
        ((hr_avg - hr_rest) / reserve).max(0.0)
    }

    /// Banister TRIMP with gender-specific coefficients (male by default)
    pub fn trimp(duration_minutes: f64, hr_reserve: f64, gender: Option<Gender>) -> f64 {
        let (a, b) = Self::banister_coefficients(gender);
        duration_minutes.max(0.0) * hr_reserve * a * (b * hr_reserve).exp()
    }

    /// `clamp(3.5 · ln(TRIMP + 1), 0, 21)`, unrounded
    pub fn strain_from_trimp(trimp: f64) -> f64 {
        (STRAIN_LOG_FACTOR * (trimp.max(0.0) + 1.0).ln()).clamp(0.0, MAX_STRAIN)
    }

    /// Tanaka age-predicted max HR: `208 - 0.7 × age`
    pub fn tanaka_max_hr(age: u32) -> f64 {
        208.0 - 0.7 * f64::from(age)
    }

    fn banister_coefficients(gender: Option<Gender>) -> (f64, f64) {
        match gender {
            Some(Gender::Female) => (0.86, 1.67),
            Some(Gender::Male) | None => (0.64, 1.92),
        }
    }

    /// Resting and max HR, falling back to defaults and the Tanaka formula
    fn heart_rate_bounds(&self, input: &StrainInput) -> (f64, f64) {
        let resting = input
            .hr_rest
            .filter(|hr| *hr > 0.0)
            .unwrap_or(self.config.default_resting_hr);
        let max = input
            .hr_max
            .filter(|hr| *hr > 0.0)
            .or_else(|| input.age.map(Self::tanaka_max_hr))
            .unwrap_or(self.config.default_max_hr);
        (resting, max)
    }

    /// Duration × type intensity, optionally scaled by calorie burn rate
    fn estimate_without_hr(
        &self,
        duration_minutes: f64,
        workout_type: WorkoutType,
        calories: Option<f64>,
    ) -> f64 {
        let duration = duration_minutes.max(0.0);
        let base = duration / 60.0 * 10.0 * workout_type.intensity_multiplier();

        let ratio = match calories {
            Some(kcal) if kcal > 0.0 && duration > 0.0 => (kcal / duration
                / self.config.reference_calories_per_minute)
                .clamp(self.config.min_calorie_ratio, self.config.max_calorie_ratio),
            _ => 1.0,
        };

        (base * ratio).clamp(0.0, MAX_STRAIN)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
