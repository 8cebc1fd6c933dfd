use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Biological sex used to select gender-specific model coefficients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            _ => Err(format!("Invalid gender: {}", s)),
        }
    }
}

/// Workout categories recognised by the strain fallback model
///
/// The mapping to an intensity multiplier is total: every category has a
/// multiplier, and free-form names that don't match a known category are
/// turned into `Other` when the sample is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Running,
    Cycling,
    Swimming,
    Walking,
    Hiking,
    Strength,
    Hiit,
    Yoga,
    Pilates,
    Rowing,
    Elliptical,
    Dance,
    Other,
}

impl WorkoutType {
    /// Relative intensity of an average session of this type (0.35 - 1.0)
    pub fn intensity_multiplier(&self) -> f64 {
        match self {
            WorkoutType::Yoga => 0.35,
            WorkoutType::Pilates => 0.40,
            WorkoutType::Walking => 0.40,
            WorkoutType::Hiking => 0.55,
            WorkoutType::Dance => 0.55,
            WorkoutType::Strength => 0.60,
            WorkoutType::Other => 0.60,
            WorkoutType::Elliptical => 0.65,
            WorkoutType::Cycling => 0.70,
            WorkoutType::Rowing => 0.75,
            WorkoutType::Swimming => 0.75,
            WorkoutType::Running => 0.80,
            WorkoutType::Hiit => 1.0,
        }
    }

    /// Resolve a free-form activity name, falling back to `Other`
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or(WorkoutType::Other)
    }
}

impl FromStr for WorkoutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "running" | "run" | "trail_running" | "treadmill" => Ok(WorkoutType::Running),
            "cycling" | "bike" | "biking" | "indoor_cycling" | "spinning" => Ok(WorkoutType::Cycling),
            "swimming" | "swim" | "pool_swim" | "open_water_swim" => Ok(WorkoutType::Swimming),
            "walking" | "walk" => Ok(WorkoutType::Walking),
            "hiking" | "hike" => Ok(WorkoutType::Hiking),
            "strength" | "strength_training" | "weightlifting" | "weights"
            | "functional_strength_training" | "traditional_strength_training" => {
                Ok(WorkoutType::Strength)
            }
            "hiit" | "high_intensity_interval_training" | "crossfit" => Ok(WorkoutType::Hiit),
            "yoga" => Ok(WorkoutType::Yoga),
            "pilates" => Ok(WorkoutType::Pilates),
            "rowing" | "row" | "indoor_rowing" => Ok(WorkoutType::Rowing),
            "elliptical" => Ok(WorkoutType::Elliptical),
            "dance" | "dancing" => Ok(WorkoutType::Dance),
            "other" => Ok(WorkoutType::Other),
            _ => Err(format!("Unknown workout type: {}", s)),
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkoutType::Running => "Running",
            WorkoutType::Cycling => "Cycling",
            WorkoutType::Swimming => "Swimming",
            WorkoutType::Walking => "Walking",
            WorkoutType::Hiking => "Hiking",
            WorkoutType::Strength => "Strength",
            WorkoutType::Hiit => "HIIT",
            WorkoutType::Yoga => "Yoga",
            WorkoutType::Pilates => "Pilates",
            WorkoutType::Rowing => "Rowing",
            WorkoutType::Elliptical => "Elliptical",
            WorkoutType::Dance => "Dance",
            WorkoutType::Other => "Other",
        };
        write!(f, "{}", name)
    }
}

/// Unit a duration value was reported in by the upstream source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    #[default]
    Minutes,
    Hours,
}

impl DurationUnit {
    pub fn to_minutes(&self, value: f64) -> f64 {
        match self {
            DurationUnit::Minutes => value,
            DurationUnit::Hours => value * 60.0,
        }
    }
}

/// Per-night sleep summary
///
/// Stage minutes need not sum to `total_minutes`; upstream sources usually
/// report light sleep as whatever remains after deep and REM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSample {
    /// Total time asleep in minutes
    pub total_minutes: f64,

    /// Total time in bed in minutes
    pub in_bed_minutes: f64,

    pub deep_minutes: f64,
    pub rem_minutes: f64,
    pub light_minutes: f64,

    /// Minutes awake after sleep onset
    pub awake_minutes: f64,

    /// Sleep-onset latency in minutes
    pub latency_minutes: f64,

    /// Average HRV (RMSSD, ms) over the session
    #[serde(default)]
    pub avg_hrv: Option<f64>,
}

/// Sleep summary as delivered by an upstream export
///
/// Some exports report durations in hours, others in minutes. The unit is
/// stated explicitly and converted by
/// [`SampleValidator::sleep_from_report`](crate::validation::SampleValidator::sleep_from_report);
/// it is never inferred from magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepReport {
    #[serde(default)]
    pub unit: DurationUnit,

    #[serde(alias = "total_minutes")]
    pub total: f64,
    #[serde(alias = "in_bed_minutes")]
    pub in_bed: f64,
    #[serde(alias = "deep_minutes")]
    pub deep: f64,
    #[serde(alias = "rem_minutes")]
    pub rem: f64,
    #[serde(alias = "light_minutes")]
    pub light: f64,
    #[serde(alias = "awake_minutes")]
    pub awake: f64,
    #[serde(alias = "latency_minutes")]
    pub latency: f64,

    #[serde(default)]
    pub avg_hrv: Option<f64>,
}

/// Per-workout summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSample {
    pub duration_minutes: f64,

    /// Average heart rate over the session in bpm
    #[serde(default)]
    pub avg_heart_rate: Option<f64>,

    /// Peak heart rate recorded during the session in bpm
    ///
    /// Only checked for plausibility. Strain takes physiological max HR
    /// from the athlete profile, never from a single session's peak.
    #[serde(default)]
    pub max_heart_rate: Option<f64>,

    pub workout_type: WorkoutType,

    #[serde(default)]
    pub calories: Option<f64>,
}

impl WorkoutSample {
    pub fn has_heart_rate(&self) -> bool {
        self.avg_heart_rate.map_or(false, |hr| hr > 0.0)
    }
}

/// Physiological profile used to personalise strain estimation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    #[serde(default)]
    pub resting_hr: Option<f64>,
    #[serde(default)]
    pub max_hr: Option<f64>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<Gender>,
}

/// Broad grouping of blood markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiomarkerCategory {
    Metabolic,
    Lipids,
    Inflammation,
    Liver,
    Kidney,
    Blood,
    Hormones,
    Vitamins,
    Thyroid,
    Other,
}

impl fmt::Display for BiomarkerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BiomarkerCategory::Metabolic => "Metabolic",
            BiomarkerCategory::Lipids => "Lipids",
            BiomarkerCategory::Inflammation => "Inflammation",
            BiomarkerCategory::Liver => "Liver",
            BiomarkerCategory::Kidney => "Kidney",
            BiomarkerCategory::Blood => "Blood",
            BiomarkerCategory::Hormones => "Hormones",
            BiomarkerCategory::Vitamins => "Vitamins",
            BiomarkerCategory::Thyroid => "Thyroid",
            BiomarkerCategory::Other => "Other",
        };
        write!(f, "{}", name)
    }
}

/// A single blood-panel measurement, read-only to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerValue {
    /// Canonical marker name (e.g. "albumin", "crp")
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub category: BiomarkerCategory,
}

impl BiomarkerValue {
    pub fn new(
        name: impl Into<String>,
        value: f64,
        unit: impl Into<String>,
        category: BiomarkerCategory,
    ) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            category,
        }
    }
}

/// One weighted input to a composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    /// Component score in [0, 100], `None` when the input was missing
    pub score: Option<f64>,

    /// Fixed weight of this component within its composite
    pub weight: f64,

    pub has_data: bool,
}

impl ScoreComponent {
    pub fn present(score: f64, weight: f64) -> Self {
        Self {
            score: Some(score.clamp(0.0, 100.0)),
            weight,
            has_data: true,
        }
    }

    pub fn missing(weight: f64) -> Self {
        Self {
            score: None,
            weight,
            has_data: false,
        }
    }

    pub fn from_option(score: Option<f64>, weight: f64) -> Self {
        match score {
            Some(s) => Self::present(s, weight),
            None => Self::missing(weight),
        }
    }

    /// Weighted mean over the components that have data
    ///
    /// Weights of the contributing components are re-normalised to sum to
    /// 1.0. Returns `None` when nothing contributes.
    pub fn combine(components: &[ScoreComponent]) -> Option<f64> {
        let (weighted_sum, total_weight) = components
            .iter()
            .filter(|c| c.has_data)
            .filter_map(|c| c.score.map(|s| (s * c.weight, c.weight)))
            .fold((0.0, 0.0), |(sum, weight), (s, w)| (sum + s, weight + w));

        if total_weight <= f64::EPSILON {
            None
        } else {
            Some(weighted_sum / total_weight)
        }
    }

    /// Sum of the weights that actually contributed
    pub fn contributing_weight(components: &[ScoreComponent]) -> f64 {
        components
            .iter()
            .filter(|c| c.has_data && c.score.is_some())
            .map(|c| c.weight)
            .sum()
    }
}

/// Convert a wall-clock time to minutes after midnight
pub fn minutes_from_midnight(time: NaiveTime) -> f64 {
    f64::from(time.hour() * 60 + time.minute()) + f64::from(time.second()) / 60.0
}

/// A dated nightly observation feeding the personal baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineObservation {
    pub date: NaiveDate,
    #[serde(default)]
    pub hrv: Option<f64>,
    #[serde(default)]
    pub resting_hr: Option<f64>,
    /// Bedtime as minutes after midnight
    #[serde(default)]
    pub bedtime_minutes: Option<f64>,
}
