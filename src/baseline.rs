//! Personal baselines from a rolling history window
//!
//! HRV and resting heart rate use ordinary population statistics. Bedtime
//! uses circular statistics: 23:50 and 00:10 are twenty minutes apart, not
//! twelve hours, so times of day are projected onto the unit circle
//! (`angle = minutes / 1440 * 2π`), averaged as sine/cosine components and
//! mapped back with `atan2`.

use crate::models::BaselineObservation;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Minutes in a day
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Baseline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Number of most recent nights considered (default: 14)
    pub window_days: usize,

    /// Minimum HRV observations required (default: 5)
    pub min_hrv_samples: usize,

    /// Minimum resting HR observations required (default: 5)
    pub min_resting_hr_samples: usize,

    /// Minimum bedtime observations for a bedtime baseline (default: 5)
    pub min_bedtime_samples: usize,

    /// Replacement for a zero HRV standard deviation in ms (default: 5)
    pub hrv_stddev_floor: f64,

    /// Replacement for a zero resting HR standard deviation in bpm (default: 3)
    pub resting_hr_stddev_floor: f64,

    /// Bedtime standard deviation used without enough samples (default: 30)
    pub default_bedtime_stddev: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        BaselineConfig {
            window_days: 14,
            min_hrv_samples: 5,
            min_resting_hr_samples: 5,
            min_bedtime_samples: 5,
            hrv_stddev_floor: 5.0,
            resting_hr_stddev_floor: 3.0,
            default_bedtime_stddev: 30.0,
        }
    }
}

/// A user's statistical baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalBaseline {
    pub hrv_mean: f64,
    pub hrv_stddev: f64,
    pub resting_hr_mean: f64,
    pub resting_hr_stddev: f64,

    /// Circular mean bedtime in minutes after midnight, in [0, 1440)
    pub avg_bedtime_minutes: f64,

    /// Circular standard deviation of bedtime in minutes
    pub bedtime_stddev_minutes: f64,

    /// Observations in the window the baseline was built from
    pub sample_count: usize,
}

impl PersonalBaseline {
    /// z-score of an HRV reading against this baseline
    pub fn hrv_z_score(&self, hrv: f64) -> f64 {
        z_score(hrv, self.hrv_mean, self.hrv_stddev)
    }

    /// z-score of a resting HR reading against this baseline
    pub fn resting_hr_z_score(&self, resting_hr: f64) -> f64 {
        z_score(resting_hr, self.resting_hr_mean, self.resting_hr_stddev)
    }
}

/// Builds personal baselines from recent nights
#[derive(Debug, Clone, Default)]
pub struct BaselineCalculator {
    config: BaselineConfig,
}

impl BaselineCalculator {
    pub fn new(config: BaselineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BaselineConfig {
        &self.config
    }

    /// Compute the baseline, or `None` when there are too few HRV or
    /// resting HR readings
    ///
    /// The history may arrive in any order; the most recent
    /// `window_days` observations by date are used.
    pub fn calculate_baseline(&self, history: &[BaselineObservation]) -> Option<PersonalBaseline> {
        let mut recent: Vec<&BaselineObservation> = history.iter().collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(self.config.window_days);

        let hrv: Vec<f64> = recent.iter().filter_map(|o| o.hrv).filter(|v| v.is_finite()).collect();
        let resting_hr: Vec<f64> = recent
            .iter()
            .filter_map(|o| o.resting_hr)
            .filter(|v| v.is_finite())
            .collect();
        let bedtimes: Vec<f64> = recent
            .iter()
            .filter_map(|o| o.bedtime_minutes)
            .filter(|v| v.is_finite())
            .collect();

        if hrv.len() < self.config.min_hrv_samples
            || resting_hr.len() < self.config.min_resting_hr_samples
        {
            warn!(
                hrv_samples = hrv.len(),
                resting_hr_samples = resting_hr.len(),
                "Not enough observations for a personal baseline"
            );
            return None;
        }

        let hrv_mean = hrv.iter().mean();
        let hrv_stddev = floor_zero(hrv.iter().population_std_dev(), self.config.hrv_stddev_floor);
        let resting_hr_mean = resting_hr.iter().mean();
        let resting_hr_stddev = floor_zero(
            resting_hr.iter().population_std_dev(),
            self.config.resting_hr_stddev_floor,
        );

        let (avg_bedtime_minutes, bedtime_stddev_minutes) =
            if bedtimes.len() >= self.config.min_bedtime_samples {
                let mean = circular_mean_minutes(&bedtimes).unwrap_or(0.0);
                (mean, circular_stddev_minutes(&bedtimes, mean))
            } else {
                (0.0, self.config.default_bedtime_stddev)
            };

        let baseline = PersonalBaseline {
            hrv_mean,
            hrv_stddev,
            resting_hr_mean,
            resting_hr_stddev,
            avg_bedtime_minutes,
            bedtime_stddev_minutes,
            sample_count: recent.len(),
        };

        debug!(?baseline, "Computed personal baseline");
        Some(baseline)
    }
}

/// Circular mean of times of day in minutes after midnight
///
/// Returns `None` for an empty slice or when the samples cancel out
/// exactly (e.g. two times twelve hours apart).
pub fn circular_mean_minutes(minutes: &[f64]) -> Option<f64> {
    if minutes.is_empty() {
        return None;
    }

    let (sin_sum, cos_sum) = minutes.iter().fold((0.0, 0.0), |(s, c), &m| {
        let angle = m / MINUTES_PER_DAY * 2.0 * PI;
        (s + angle.sin(), c + angle.cos())
    });

    let n = minutes.len() as f64;
    let (sin_mean, cos_mean) = (sin_sum / n, cos_sum / n);
    if sin_mean.hypot(cos_mean) < 1e-12 {
        return None;
    }

    let mean = sin_mean.atan2(cos_mean) / (2.0 * PI) * MINUTES_PER_DAY;
    Some(wrap_minutes(mean))
}

/// Root-mean-square of each sample's shortest distance to `mean`
pub fn circular_stddev_minutes(minutes: &[f64], mean: f64) -> f64 {
    if minutes.is_empty() {
        return 0.0;
    }

    let sum_sq: f64 = minutes
        .iter()
        .map(|&m| circular_deviation_minutes(m, mean).powi(2))
        .sum();
    (sum_sq / minutes.len() as f64).sqrt()
}

/// Shortest distance between two times of day, in [0, 720]
pub fn circular_deviation_minutes(a: f64, b: f64) -> f64 {
    let deviation = (wrap_minutes(a) - wrap_minutes(b)).abs();
    if deviation > MINUTES_PER_DAY / 2.0 {
        MINUTES_PER_DAY - deviation
    } else {
        deviation
    }
}

/// Wrap any minute value into [0, 1440)
pub fn wrap_minutes(minutes: f64) -> f64 {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY);
    // rem_euclid can round up to the modulus itself for tiny negatives
    if wrapped >= MINUTES_PER_DAY - 1e-9 {
        0.0
    } else {
        wrapped
    }
}

/// z-score with a zero-stddev guard
pub fn z_score(value: f64, mean: f64, stddev: f64) -> f64 {
    if stddev <= f64::EPSILON {
        0.0
    } else {
        (value - mean) / stddev
    }
}

fn floor_zero(stddev: f64, floor: f64) -> f64 {
    if stddev.is_nan() || stddev <= f64::EPSILON {
        floor
    } else {
        stddev
    }
}
