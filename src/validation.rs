//! Ingestion-boundary checks for samples handed to the scorers
//!
//! Scorers assume well-formed input. Everything here runs before them:
//! structural violations (negative minutes, empty workouts) are rejected,
//! physiologically implausible heart rates are dropped from the sample.

use crate::error::{CalculationError, Result, VitalsError};
use crate::models::{
    AthleteProfile, BiomarkerValue, DurationUnit, SleepReport, SleepSample, WorkoutSample,
};
use tracing::debug;

/// Plausible heart rate range in bpm
const MIN_HEART_RATE: f64 = 25.0;
const MAX_HEART_RATE: f64 = 250.0;

/// Validate and clean samples before scoring
pub struct SampleValidator;

impl SampleValidator {
    /// Reject sleep samples with negative or non-finite minute fields
    pub fn validate_sleep(sample: &SleepSample) -> Result<()> {
        let fields = [
            ("total_minutes", sample.total_minutes),
            ("in_bed_minutes", sample.in_bed_minutes),
            ("deep_minutes", sample.deep_minutes),
            ("rem_minutes", sample.rem_minutes),
            ("light_minutes", sample.light_minutes),
            ("awake_minutes", sample.awake_minutes),
            ("latency_minutes", sample.latency_minutes),
        ];

        for (field, value) in fields {
            Self::check_minutes(field, value)?;
        }

        if let Some(hrv) = sample.avg_hrv {
            if !hrv.is_finite() || hrv < 0.0 {
                return Err(VitalsError::Validation(format!(
                    "avg_hrv must be a non-negative number, got: {}",
                    hrv
                )));
            }
        }

        Ok(())
    }

    /// Convert an exported sleep report into minutes and validate it
    pub fn sleep_from_report(report: &SleepReport) -> Result<SleepSample> {
        let unit = report.unit;
        let sample = SleepSample {
            total_minutes: normalize_minutes(report.total, unit)?,
            in_bed_minutes: normalize_minutes(report.in_bed, unit)?,
            deep_minutes: normalize_minutes(report.deep, unit)?,
            rem_minutes: normalize_minutes(report.rem, unit)?,
            light_minutes: normalize_minutes(report.light, unit)?,
            awake_minutes: normalize_minutes(report.awake, unit)?,
            latency_minutes: normalize_minutes(report.latency, unit)?,
            avg_hrv: report.avg_hrv,
        };
        Self::validate_sleep(&sample)?;
        Ok(sample)
    }

    /// Validate a workout and drop implausible heart rates
    pub fn validate_workout(workout: &mut WorkoutSample) -> Result<()> {
        if !workout.duration_minutes.is_finite() || workout.duration_minutes <= 0.0 {
            return Err(VitalsError::Validation(format!(
                "Workout duration must be positive, got: {}",
                workout.duration_minutes
            )));
        }

        if let Some(calories) = workout.calories {
            if !calories.is_finite() || calories < 0.0 {
                return Err(VitalsError::Validation(format!(
                    "Workout calories cannot be negative, got: {}",
                    calories
                )));
            }
        }

        if let Some(hr) = workout.avg_heart_rate {
            if !is_plausible_heart_rate(hr) {
                debug!(hr, "Dropping implausible average heart rate");
                workout.avg_heart_rate = None;
            }
        }

        if let Some(hr) = workout.max_heart_rate {
            if !is_plausible_heart_rate(hr) {
                debug!(hr, "Dropping implausible peak heart rate");
                workout.max_heart_rate = None;
            }
        }

        Ok(())
    }

    /// Check the athlete profile used for strain personalisation
    pub fn validate_profile(profile: &AthleteProfile) -> Result<()> {
        if let Some(resting) = profile.resting_hr {
            if !(MIN_HEART_RATE..=150.0).contains(&resting) {
                return Err(invalid_parameter("strain", "resting_hr", resting));
            }
        }

        if let Some(max) = profile.max_hr {
            if !(100.0..=MAX_HEART_RATE).contains(&max) {
                return Err(invalid_parameter("strain", "max_hr", max));
            }
            if let Some(resting) = profile.resting_hr {
                if max <= resting {
                    return Err(invalid_parameter("strain", "max_hr", max));
                }
            }
        }

        if let Some(age) = profile.age {
            if age == 0 || age > 120 {
                return Err(invalid_parameter("strain", "age", age));
            }
        }

        Ok(())
    }

    /// Chronological age must be a positive number of years
    pub fn validate_age(age: f64) -> Result<()> {
        if !age.is_finite() || age <= 0.0 || age > 120.0 {
            return Err(invalid_parameter("PhenoAge", "chronological_age", age));
        }
        Ok(())
    }

    pub fn validate_biomarker(marker: &BiomarkerValue) -> Result<()> {
        if marker.name.trim().is_empty() {
            return Err(VitalsError::Validation(
                "Biomarker name cannot be empty".to_string(),
            ));
        }
        if !marker.value.is_finite() || marker.value < 0.0 {
            return Err(VitalsError::Validation(format!(
                "Biomarker '{}' must have a non-negative value, got: {}",
                marker.name, marker.value
            )));
        }
        Ok(())
    }

    fn check_minutes(field: &str, value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(VitalsError::Validation(format!(
                "{} cannot be negative, got: {}",
                field, value
            )));
        }
        Ok(())
    }
}

/// Convert a duration reported in an explicit unit to minutes
pub fn normalize_minutes(value: f64, unit: DurationUnit) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(VitalsError::Validation(format!(
            "Duration cannot be negative, got: {} {:?}",
            value, unit
        )));
    }
    Ok(unit.to_minutes(value))
}

fn is_plausible_heart_rate(hr: f64) -> bool {
    (MIN_HEART_RATE..=MAX_HEART_RATE).contains(&hr)
}

fn invalid_parameter(calculation: &str, parameter: &str, value: impl ToString) -> VitalsError {
    VitalsError::Calculation(CalculationError::InvalidParameter {
        calculation: calculation.to_string(),
        parameter: parameter.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BiomarkerCategory, Gender, WorkoutType};

    fn night() -> SleepSample {
        SleepSample {
            total_minutes: 420.0,
            in_bed_minutes: 450.0,
            deep_minutes: 70.0,
            rem_minutes: 90.0,
            light_minutes: 260.0,
            awake_minutes: 15.0,
            latency_minutes: 12.0,
            avg_hrv: Some(48.0),
        }
    }

    #[test]
    fn test_valid_sleep() {
        assert!(SampleValidator::validate_sleep(&night()).is_ok());
    }

    #[test]
    fn test_negative_minutes_rejected() {
        let mut sample = night();
        sample.awake_minutes = -5.0;
        let err = SampleValidator::validate_sleep(&sample).unwrap_err();
        assert!(err.to_string().contains("awake_minutes"));
    }

    #[test]
    fn test_zero_in_bed_is_allowed() {
        let mut sample = night();
        sample.in_bed_minutes = 0.0;
        assert!(SampleValidator::validate_sleep(&sample).is_ok());
    }

    #[test]
    fn test_workout_validation() {
        let mut workout = WorkoutSample {
            duration_minutes: 45.0,
            avg_heart_rate: Some(400.0),
            max_heart_rate: Some(180.0),
            workout_type: WorkoutType::Running,
            calories: Some(500.0),
        };
        SampleValidator::validate_workout(&mut workout).unwrap();
        assert_eq!(workout.avg_heart_rate, None);
        assert_eq!(workout.max_heart_rate, Some(180.0));

        workout.duration_minutes = 0.0;
        assert!(SampleValidator::validate_workout(&mut workout).is_err());
    }

    #[test]
    fn test_profile_validation() {
        let mut profile = AthleteProfile {
            resting_hr: Some(55.0),
            max_hr: Some(185.0),
            age: Some(40),
            gender: Some(Gender::Female),
        };
        assert!(SampleValidator::validate_profile(&profile).is_ok());

        profile.max_hr = Some(50.0);
        let err = SampleValidator::validate_profile(&profile).unwrap_err();
        assert!(matches!(
            err,
            VitalsError::Calculation(CalculationError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_age_validation() {
        assert!(SampleValidator::validate_age(45.0).is_ok());
        assert!(SampleValidator::validate_age(0.0).is_err());
        assert!(SampleValidator::validate_age(f64::NAN).is_err());
    }

    #[test]
    fn test_biomarker_validation() {
        let marker = BiomarkerValue::new("crp", 0.4, "mg/L", BiomarkerCategory::Inflammation);
        assert!(SampleValidator::validate_biomarker(&marker).is_ok());

        let negative = BiomarkerValue::new("crp", -1.0, "mg/L", BiomarkerCategory::Inflammation);
        assert!(SampleValidator::validate_biomarker(&negative).is_err());
    }

    #[test]
    fn test_sleep_report_in_hours() {
        let report: SleepReport = serde_json::from_str(
            r#"{"unit": "hours", "total": 7.5, "in_bed": 8.0, "deep": 1.25,
                "rem": 1.5, "light": 4.75, "awake": 0.25, "latency": 0.2}"#,
        )
        .unwrap();

        let sample = SampleValidator::sleep_from_report(&report).unwrap();
        assert_eq!(sample.total_minutes, 450.0);
        assert_eq!(sample.in_bed_minutes, 480.0);
        assert_eq!(sample.deep_minutes, 75.0);
        assert!((sample.latency_minutes - 12.0).abs() < 1e-9);
        assert_eq!(sample.avg_hrv, None);
    }

    #[test]
    fn test_sleep_report_defaults_to_minutes() {
        let report: SleepReport = serde_json::from_str(
            r#"{"total_minutes": 420, "in_bed_minutes": 450, "deep_minutes": 70,
                "rem_minutes": 90, "light_minutes": 260, "awake_minutes": 15,
                "latency_minutes": 10, "avg_hrv": 48}"#,
        )
        .unwrap();
        assert_eq!(report.unit, DurationUnit::Minutes);

        let sample = SampleValidator::sleep_from_report(&report).unwrap();
        assert_eq!(sample.total_minutes, 420.0);
        assert_eq!(sample.avg_hrv, Some(48.0));
    }

    #[test]
    fn test_sleep_report_rejects_negative_duration() {
        let report = SleepReport {
            unit: DurationUnit::Hours,
            total: 7.0,
            in_bed: 7.5,
            deep: -1.0,
            rem: 1.5,
            light: 4.0,
            awake: 0.2,
            latency: 0.1,
            avg_hrv: None,
        };
        assert!(matches!(
            SampleValidator::sleep_from_report(&report),
            Err(VitalsError::Validation(_))
        ));
    }

    #[test]
    fn test_normalize_minutes() {
        assert_eq!(normalize_minutes(7.5, DurationUnit::Hours).unwrap(), 450.0);
        assert_eq!(normalize_minutes(450.0, DurationUnit::Minutes).unwrap(), 450.0);
        assert!(normalize_minutes(-1.0, DurationUnit::Minutes).is_err());
    }
}
