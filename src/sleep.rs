//! Sleep quality scoring
//!
//! Seven weighted components, each scored on a coarse step scale:
//!
//! | Component | Weight |
//! |---|---|
//! | Duration | 20% |
//! | Efficiency | 20% |
//! | Deep sleep % | 15% |
//! | REM sleep % | 15% |
//! | Latency | 10% |
//! | Awakenings | 10% |
//! | HRV vs. baseline | 10% |
//!
//! Unlike recovery, every component always has a score here: a night
//! without an HRV reading gets a neutral 75 for that component.

use crate::baseline::PersonalBaseline;
use crate::models::{ScoreComponent, SleepSample};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub const DURATION_WEIGHT: f64 = 0.20;
pub const EFFICIENCY_WEIGHT: f64 = 0.20;
pub const DEEP_WEIGHT: f64 = 0.15;
pub const REM_WEIGHT: f64 = 0.15;
pub const LATENCY_WEIGHT: f64 = 0.10;
pub const AWAKENINGS_WEIGHT: f64 = 0.10;
pub const HRV_WEIGHT: f64 = 0.10;

/// HRV component score when the night has no HRV reading
const NEUTRAL_HRV_SCORE: f64 = 75.0;

/// Components scoring below this produce a recommendation
const RECOMMENDATION_THRESHOLD: f64 = 75.0;

/// Qualitative sleep label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SleepQuality {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 85 => SleepQuality::Excellent,
            s if s >= 70 => SleepQuality::Good,
            s if s >= 50 => SleepQuality::Fair,
            _ => SleepQuality::Poor,
        }
    }
}

impl fmt::Display for SleepQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SleepQuality::Excellent => write!(f, "Excellent"),
            SleepQuality::Good => write!(f, "Good"),
            SleepQuality::Fair => write!(f, "Fair"),
            SleepQuality::Poor => write!(f, "Poor"),
        }
    }
}

/// Per-component breakdown of a sleep score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepComponents {
    pub duration: ScoreComponent,
    pub efficiency: ScoreComponent,
    pub deep_sleep: ScoreComponent,
    pub rem_sleep: ScoreComponent,
    pub latency: ScoreComponent,
    pub awakenings: ScoreComponent,
    pub hrv: ScoreComponent,
}

impl SleepComponents {
    /// Components in evaluation order
    pub fn as_array(&self) -> [(&'static str, ScoreComponent); 7] {
        [
            ("duration", self.duration),
            ("efficiency", self.efficiency),
            ("deep_sleep", self.deep_sleep),
            ("rem_sleep", self.rem_sleep),
            ("latency", self.latency),
            ("awakenings", self.awakenings),
            ("hrv", self.hrv),
        ]
    }
}

/// Result of scoring one night
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepScoreResult {
    /// Composite score (0-100)
    pub score: u8,
    pub quality: SleepQuality,
    pub components: SleepComponents,

    /// Asleep / in-bed in percent, 0 when in-bed time is zero
    pub efficiency_percent: f64,
    pub deep_percent: f64,
    pub rem_percent: f64,

    pub recommendations: Vec<String>,
}

/// Sleep quality scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepScorer;

impl SleepScorer {
    pub fn new() -> Self {
        SleepScorer
    }

    /// Score a night of sleep, optionally against a personal baseline
    pub fn score_sleep(
        &self,
        sample: &SleepSample,
        baseline: Option<&PersonalBaseline>,
    ) -> SleepScoreResult {
        let efficiency_percent = Self::efficiency_percent(sample.total_minutes, sample.in_bed_minutes);
        let deep_percent = Self::stage_percent(sample.deep_minutes, sample.total_minutes);
        let rem_percent = Self::stage_percent(sample.rem_minutes, sample.total_minutes);

        let components = SleepComponents {
            duration: ScoreComponent::present(Self::score_duration(sample.total_minutes), DURATION_WEIGHT),
            efficiency: ScoreComponent::present(
                Self::score_efficiency(sample.total_minutes, sample.in_bed_minutes),
                EFFICIENCY_WEIGHT,
            ),
            deep_sleep: ScoreComponent::present(Self::score_deep_percent(deep_percent), DEEP_WEIGHT),
            rem_sleep: ScoreComponent::present(Self::score_rem_percent(rem_percent), REM_WEIGHT),
            latency: ScoreComponent::present(Self::score_latency(sample.latency_minutes), LATENCY_WEIGHT),
            awakenings: ScoreComponent::present(
                Self::score_awakenings(sample.awake_minutes),
                AWAKENINGS_WEIGHT,
            ),
            hrv: ScoreComponent::present(Self::score_hrv(sample.avg_hrv, baseline), HRV_WEIGHT),
        };

        let total = ScoreComponent::combine(&components.as_array().map(|(_, c)| c)).unwrap_or(0.0);
        let score = total.round().clamp(0.0, 100.0) as u8;
        let recommendations = Self::recommendations(&components);

        debug!(
            score,
            duration = ?components.duration.score,
            efficiency = ?components.efficiency.score,
            hrv = ?components.hrv.score,
            "Scored sleep session"
        );

        SleepScoreResult {
            score,
            quality: SleepQuality::from_score(score),
            components,
            efficiency_percent,
            deep_percent,
            rem_percent,
            recommendations,
        }
    }

    /// 7-9h: 100, 6-7h or 9-10h: 75, otherwise 50
    pub fn score_duration(total_minutes: f64) -> f64 {
        if (420.0..=540.0).contains(&total_minutes) {
            100.0
        } else if (360.0..420.0).contains(&total_minutes)
            || (total_minutes > 540.0 && total_minutes <= 600.0)
        {
            75.0
        } else {
            50.0
        }
    }

    /// Asleep/in-bed percentage: ≥85: 100, ≥75: 75, ≥65: 50, else 25.
    /// Zero in-bed time scores 0.
    pub fn score_efficiency(total_minutes: f64, in_bed_minutes: f64) -> f64 {
        if in_bed_minutes <= 0.0 {
            return 0.0;
        }

        let efficiency = Self::efficiency_percent(total_minutes, in_bed_minutes);
        if efficiency >= 85.0 {
            100.0
        } else if efficiency >= 75.0 {
            75.0
        } else if efficiency >= 65.0 {
            50.0
        } else {
            25.0
        }
    }

    /// 15-20%: 100, 10-15% or 20-25%: 75, otherwise 50
    pub fn score_deep_percent(deep_percent: f64) -> f64 {
        Self::band_score(deep_percent, (15.0, 20.0), (10.0, 25.0))
    }

    /// 20-25%: 100, 15-20% or 25-30%: 75, otherwise 50
    pub fn score_rem_percent(rem_percent: f64) -> f64 {
        Self::band_score(rem_percent, (20.0, 25.0), (15.0, 30.0))
    }

    /// <15 min: 100, ≤30: 75, ≤60: 50, else 25
    pub fn score_latency(latency_minutes: f64) -> f64 {
        if latency_minutes < 15.0 {
            100.0
        } else if latency_minutes <= 30.0 {
            75.0
        } else if latency_minutes <= 60.0 {
            50.0
        } else {
            25.0
        }
    }

    /// Minutes awake after onset: <5: 100, ≤20: 75, ≤30: 50, else 25
    pub fn score_awakenings(awake_minutes: f64) -> f64 {
        if awake_minutes < 5.0 {
            100.0
        } else if awake_minutes <= 20.0 {
            75.0
        } else if awake_minutes <= 30.0 {
            50.0
        } else {
            25.0
        }
    }

    /// HRV relative to the personal baseline when there is one, otherwise
    /// against population bands. No reading scores a neutral 75.
    pub fn score_hrv(hrv: Option<f64>, baseline: Option<&PersonalBaseline>) -> f64 {
        let Some(hrv) = hrv else {
            return NEUTRAL_HRV_SCORE;
        };

        match baseline {
            Some(b) => {
                let z = b.hrv_z_score(hrv);
                if z >= 0.5 {
                    100.0
                } else if z >= -0.5 {
                    75.0
                } else if z >= -1.0 {
                    50.0
                } else {
                    25.0
                }
            }
            None => {
                if hrv >= 60.0 {
                    100.0
                } else if hrv >= 50.0 {
                    85.0
                } else if hrv >= 40.0 {
                    70.0
                } else if hrv >= 30.0 {
                    55.0
                } else {
                    40.0
                }
            }
        }
    }

    pub fn efficiency_percent(total_minutes: f64, in_bed_minutes: f64) -> f64 {
        if in_bed_minutes <= 0.0 {
            0.0
        } else {
            total_minutes / in_bed_minutes * 100.0
        }
    }

    fn stage_percent(stage_minutes: f64, total_minutes: f64) -> f64 {
        if total_minutes <= 0.0 {
            0.0
        } else {
            stage_minutes / total_minutes * 100.0
        }
    }

    fn band_score(value: f64, ideal: (f64, f64), acceptable: (f64, f64)) -> f64 {
        if value >= ideal.0 && value <= ideal.1 {
            100.0
        } else if value >= acceptable.0 && value <= acceptable.1 {
            75.0
        } else {
            50.0
        }
    }

    fn recommendations(components: &SleepComponents) -> Vec<String> {
        components
            .as_array()
            .iter()
            .filter(|(_, c)| c.score.map_or(false, |s| s < RECOMMENDATION_THRESHOLD))
            .map(|(name, _)| Self::recommendation_for(name).to_string())
            .collect()
    }

    fn recommendation_for(component: &str) -> &'static str {
        match component {
            "duration" => "Aim for 7-9 hours of sleep by keeping a consistent bedtime and wake time",
            "efficiency" => "Reduce time awake in bed: only go to bed when sleepy and get up if you can't fall asleep",
            "deep_sleep" => "Support deep sleep with regular exercise, a cool bedroom and no alcohol before bed",
            "rem_sleep" => "Protect REM sleep by avoiding late caffeine and alcohol and sleeping in to your full duration",
            "latency" => "Build a wind-down routine and limit screens in the hour before bed to fall asleep faster",
            "awakenings" => "Minimise night-time disruptions: keep the room dark and quiet and limit fluids before bed",
            "hrv" => "HRV is below your baseline; prioritise recovery, hydration and stress management today",
            _ => "Review your sleep habits",
        }
    }
}
