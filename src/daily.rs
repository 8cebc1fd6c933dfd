//! Daily assessment: baseline, sleep, strain and recovery in one pass
//!
//! Each day is independent of every other day, so batches of days (or of
//! users) are evaluated in parallel with rayon.

use crate::baseline::{BaselineCalculator, PersonalBaseline};
use crate::config::ScoringConfig;
use crate::error::Result;
use crate::models::{
    minutes_from_midnight, AthleteProfile, BaselineObservation, SleepSample, WorkoutSample,
};
use crate::recovery::{ReadingSources, RecoveryCalculator, RecoveryInputs, RecoveryResult};
use crate::sleep::{SleepScoreResult, SleepScorer};
use crate::strain::{DailyStrainResult, StrainCalculator};
use crate::validation::SampleValidator;
use chrono::{NaiveDate, NaiveTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

/// Everything known about one user on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInput {
    pub date: NaiveDate,

    #[serde(default)]
    pub user_id: Option<String>,

    /// Recent nights for the personal baseline; entries on or after
    /// `date` are ignored
    #[serde(default)]
    pub history: Vec<BaselineObservation>,

    /// Last night's sleep
    #[serde(default)]
    pub sleep: Option<SleepSample>,

    /// Last night's bedtime
    #[serde(default)]
    pub bedtime: Option<NaiveTime>,

    /// Resting HR measured during last night's sleep
    #[serde(default)]
    pub resting_hr: Option<f64>,

    /// Older non-nightly readings, used only under `ReadingPolicy::AllowStale`
    #[serde(default)]
    pub stale_hrv: Option<f64>,
    #[serde(default)]
    pub stale_resting_hr: Option<f64>,

    /// Today's workouts
    #[serde(default)]
    pub workouts: Vec<WorkoutSample>,

    /// Yesterday's workouts; an empty list is a rest day, `None` is unknown
    #[serde(default)]
    pub prior_day_workouts: Option<Vec<WorkoutSample>>,

    #[serde(default)]
    pub profile: AthleteProfile,
}

impl DailyInput {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            user_id: None,
            history: Vec::new(),
            sleep: None,
            bedtime: None,
            resting_hr: None,
            stale_hrv: None,
            stale_resting_hr: None,
            workouts: Vec::new(),
            prior_day_workouts: None,
            profile: AthleteProfile::default(),
        }
    }
}

/// Scores for one user on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAssessment {
    pub date: NaiveDate,
    pub user_id: Option<String>,
    pub baseline: Option<PersonalBaseline>,
    pub sleep: Option<SleepScoreResult>,
    pub strain: DailyStrainResult,
    pub prior_day_strain: Option<f64>,
    pub recovery: RecoveryResult,
}

/// Counts and timing of a batch evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub duration_ms: u128,
}

impl DailyAssessment {
    /// Validate the day's samples and score them
    pub fn evaluate(input: &DailyInput, config: &ScoringConfig) -> Result<Self> {
        let span = info_span!(
            "daily_assessment",
            date = %input.date,
            user = input.user_id.as_deref().unwrap_or("-")
        );
        let _guard = span.enter();

        if let Some(sleep) = &input.sleep {
            SampleValidator::validate_sleep(sleep)?;
        }
        SampleValidator::validate_profile(&input.profile)?;
        let workouts = Self::clean_workouts(&input.workouts)?;
        let prior_day_workouts = input
            .prior_day_workouts
            .as_deref()
            .map(Self::clean_workouts)
            .transpose()?;

        let history: Vec<BaselineObservation> = input
            .history
            .iter()
            .filter(|obs| obs.date < input.date)
            .cloned()
            .collect();
        let baseline = BaselineCalculator::new(config.baseline.clone()).calculate_baseline(&history);

        let sleep = input
            .sleep
            .as_ref()
            .map(|s| SleepScorer::new().score_sleep(s, baseline.as_ref()));

        let strain_calculator = StrainCalculator::new(config.strain.clone());
        let strain = strain_calculator.calculate_daily_strain(&workouts, &input.profile);
        let prior_day_strain = prior_day_workouts
            .map(|w| strain_calculator.calculate_daily_strain(&w, &input.profile).strain);

        let recovery_inputs = RecoveryInputs {
            sleep_score: sleep.as_ref().map(|s| f64::from(s.score)),
            hrv: ReadingSources::nightly(input.sleep.as_ref().and_then(|s| s.avg_hrv))
                .with_stale(input.stale_hrv),
            resting_hr: ReadingSources::nightly(input.resting_hr)
                .with_stale(input.stale_resting_hr),
            prior_day_strain,
            bedtime_minutes: input.bedtime.map(minutes_from_midnight),
        };
        let recovery = RecoveryCalculator::new(config.recovery.clone())
            .calculate_recovery(&recovery_inputs, baseline.as_ref());

        debug!(
            sleep = ?sleep.as_ref().map(|s| s.score),
            strain = strain.strain,
            recovery = ?recovery.score,
            "Daily assessment complete"
        );

        Ok(DailyAssessment {
            date: input.date,
            user_id: input.user_id.clone(),
            baseline,
            sleep,
            strain,
            prior_day_strain,
            recovery,
        })
    }

    /// Evaluate many days in parallel, preserving input order
    ///
    /// A failing day does not affect the others.
    pub fn evaluate_batch(
        inputs: &[DailyInput],
        config: &ScoringConfig,
    ) -> (Vec<Result<DailyAssessment>>, BatchSummary) {
        let start = Instant::now();
        info!("Evaluating {} days in parallel", inputs.len());

        let results: Vec<Result<DailyAssessment>> = inputs
            .par_iter()
            .map(|input| Self::evaluate(input, config))
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        for (input, err) in inputs
            .iter()
            .zip(&results)
            .filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
        {
            warn!(date = %input.date, error = %err, "Daily assessment failed");
        }

        let summary = BatchSummary {
            total: inputs.len(),
            successful: inputs.len() - failed,
            failed,
            duration_ms: start.elapsed().as_millis(),
        };
        info!(
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            duration_ms = summary.duration_ms as u64,
            "Batch evaluation complete"
        );

        (results, summary)
    }

    fn clean_workouts(workouts: &[WorkoutSample]) -> Result<Vec<WorkoutSample>> {
        workouts
            .iter()
            .cloned()
            .map(|mut w| {
                SampleValidator::validate_workout(&mut w)?;
                Ok(w)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, WorkoutType};
    use crate::recovery::RecoveryCategory;
    use crate::strain::StrainCategory;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn history() -> Vec<BaselineObservation> {
        (1..=10)
            .map(|day| BaselineObservation {
                date: date(day),
                hrv: Some(if day % 2 == 0 { 45.0 } else { 55.0 }),
                resting_hr: Some(if day % 2 == 0 { 54.0 } else { 56.0 }),
                bedtime_minutes: Some(1410.0),
            })
            .collect()
    }

    fn input() -> DailyInput {
        let mut input = DailyInput::new(date(11));
        input.history = history();
        input.sleep = Some(SleepSample {
            total_minutes: 480.0,
            in_bed_minutes: 500.0,
            deep_minutes: 80.0,
            rem_minutes: 100.0,
            light_minutes: 300.0,
            awake_minutes: 20.0,
            latency_minutes: 10.0,
            avg_hrv: Some(50.0),
        });
        input.bedtime = NaiveTime::from_hms_opt(23, 40, 0);
        input.resting_hr = Some(55.0);
        input.workouts = vec![WorkoutSample {
            duration_minutes: 45.0,
            avg_heart_rate: Some(150.0),
            max_heart_rate: Some(178.0),
            workout_type: WorkoutType::Running,
            calories: Some(520.0),
        }];
        input.profile = AthleteProfile {
            resting_hr: Some(60.0),
            max_hr: Some(190.0),
            age: Some(35),
            gender: Some(Gender::Male),
        };
        input
    }

    #[test]
    fn test_full_day() {
        let assessment = DailyAssessment::evaluate(&input(), &ScoringConfig::default()).unwrap();

        let baseline = assessment.baseline.unwrap();
        assert!((baseline.hrv_mean - 50.0).abs() < 1e-9);

        assert_eq!(assessment.sleep.as_ref().unwrap().score, 95);
        assert_eq!(assessment.strain.strain, 15.2);
        assert_eq!(assessment.strain.category, StrainCategory::High);

        // sleep 95, HRV 75, RHR 75, consistency 100; no prior-day data
        // (33.25 + 18.75 + 11.25 + 10) / 0.85 = 86.2
        assert_eq!(assessment.prior_day_strain, None);
        assert_eq!(assessment.recovery.score, Some(86));
        assert_eq!(assessment.recovery.category, RecoveryCategory::Optimal);
    }

    #[test]
    fn test_rest_day_yesterday_counts() {
        let mut input = input();
        input.prior_day_workouts = Some(Vec::new());
        let assessment = DailyAssessment::evaluate(&input, &ScoringConfig::default()).unwrap();

        assert_eq!(assessment.prior_day_strain, Some(0.0));
        assert!(assessment.recovery.components.strain_impact.has_data);
    }

    #[test]
    fn test_no_sleep_means_no_recovery() {
        let mut input = input();
        input.sleep = None;
        let assessment = DailyAssessment::evaluate(&input, &ScoringConfig::default()).unwrap();

        assert!(assessment.sleep.is_none());
        assert_eq!(assessment.recovery.score, None);
        assert_eq!(assessment.recovery.category, RecoveryCategory::InsufficientData);
    }

    #[test]
    fn test_future_history_is_ignored() {
        let mut input = input();
        input.history.push(BaselineObservation {
            date: date(12),
            hrv: Some(500.0),
            resting_hr: Some(120.0),
            bedtime_minutes: Some(600.0),
        });
        let assessment = DailyAssessment::evaluate(&input, &ScoringConfig::default()).unwrap();
        assert_eq!(assessment.baseline.unwrap().sample_count, 10);
    }

    #[test]
    fn test_invalid_sample_is_rejected() {
        let mut input = input();
        if let Some(sleep) = input.sleep.as_mut() {
            sleep.deep_minutes = -10.0;
        }
        assert!(DailyAssessment::evaluate(&input, &ScoringConfig::default()).is_err());
    }

    #[test]
    fn test_batch_preserves_order_and_isolates_failures() {
        let mut bad = input();
        bad.workouts[0].duration_minutes = -1.0;

        let mut second = input();
        second.user_id = Some("second".to_string());

        let inputs = vec![input(), bad, second];
        let (results, summary) = DailyAssessment::evaluate_batch(&inputs, &ScoringConfig::default());

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(
            results[2].as_ref().unwrap().user_id.as_deref(),
            Some("second")
        );
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
    }
}
