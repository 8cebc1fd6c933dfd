use chrono::{NaiveDate, NaiveTime};
use vitalscore::{baseline, biomarkers, config, daily, phenoage, recovery, sleep, strain};

/// End-to-end workflows through the public API

#[cfg(test)]
mod integration_tests {
    use super::*;
    use vitalscore::models::{
        AthleteProfile, BaselineObservation, BiomarkerCategory, BiomarkerValue, Gender,
        SleepSample, WorkoutSample, WorkoutType,
    };

    fn reference_night() -> SleepSample {
        SleepSample {
            total_minutes: 480.0,
            in_bed_minutes: 500.0,
            deep_minutes: 80.0,
            rem_minutes: 100.0,
            light_minutes: 300.0,
            awake_minutes: 20.0,
            latency_minutes: 10.0,
            avg_hrv: None,
        }
    }

    fn two_weeks_of_history(start: NaiveDate) -> Vec<BaselineObservation> {
        (0..14)
            .map(|offset| BaselineObservation {
                date: start + chrono::Duration::days(offset),
                hrv: Some(48.0 + (offset % 5) as f64),
                resting_hr: Some(52.0 + (offset % 3) as f64),
                // alternating 23:50 and 00:10
                bedtime_minutes: Some(if offset % 2 == 0 { 1430.0 } else { 10.0 }),
            })
            .collect()
    }

    fn panel() -> Vec<BiomarkerValue> {
        vec![
            BiomarkerValue::new("Albumin", 4.5, "g/dL", BiomarkerCategory::Liver),
            BiomarkerValue::new("Creatinine", 0.9, "mg/dL", BiomarkerCategory::Kidney),
            BiomarkerValue::new("Glucose", 85.0, "mg/dL", BiomarkerCategory::Metabolic),
            BiomarkerValue::new("hs-CRP", 0.5, "mg/L", BiomarkerCategory::Inflammation),
            BiomarkerValue::new("Lymphocytes", 30.0, "%", BiomarkerCategory::Blood),
            BiomarkerValue::new("MCV", 89.0, "fL", BiomarkerCategory::Blood),
            BiomarkerValue::new("RDW", 12.5, "%", BiomarkerCategory::Blood),
            BiomarkerValue::new("ALP", 65.0, "U/L", BiomarkerCategory::Liver),
            BiomarkerValue::new("WBC", 5.5, "10^3/uL", BiomarkerCategory::Inflammation),
            BiomarkerValue::new("LDL", 140.0, "mg/dL", BiomarkerCategory::Lipids),
        ]
    }

    #[test]
    fn test_reference_sleep_scenario() {
        let result = sleep::SleepScorer::new().score_sleep(&reference_night(), None);
        assert_eq!(result.score, 95);
        assert_eq!(result.quality, sleep::SleepQuality::Excellent);
    }

    #[test]
    fn test_reference_strain_scenario() {
        let input = strain::StrainInput {
            duration_minutes: 45.0,
            hr_avg: Some(150.0),
            hr_max: Some(190.0),
            hr_rest: Some(60.0),
            age: None,
            gender: Some(Gender::Male),
            workout_type: WorkoutType::Running,
            calories: None,
        };
        let result = strain::StrainCalculator::default().calculate_strain(&input);
        assert_eq!(result.category, strain::StrainCategory::High);
        assert!(result.strain > 14.0 && result.strain < 16.0);
    }

    #[test]
    fn test_bedtime_baseline_wraps_midnight() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let baseline = baseline::BaselineCalculator::default()
            .calculate_baseline(&two_weeks_of_history(start))
            .unwrap();

        let distance_from_midnight =
            baseline::circular_deviation_minutes(baseline.avg_bedtime_minutes, 0.0);
        assert!(distance_from_midnight < 1e-6);
        assert!((baseline.bedtime_stddev_minutes - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_complete_daily_workflow() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();

        let mut input = daily::DailyInput::new(today);
        input.user_id = Some("athlete-1".to_string());
        input.history = two_weeks_of_history(start);
        input.sleep = Some(SleepSample {
            avg_hrv: Some(55.0),
            ..reference_night()
        });
        input.bedtime = NaiveTime::from_hms_opt(0, 5, 0);
        input.resting_hr = Some(52.0);
        input.workouts = vec![
            WorkoutSample {
                duration_minutes: 60.0,
                avg_heart_rate: Some(140.0),
                max_heart_rate: Some(165.0),
                workout_type: WorkoutType::Cycling,
                calories: Some(600.0),
            },
            WorkoutSample {
                duration_minutes: 30.0,
                avg_heart_rate: None,
                max_heart_rate: None,
                workout_type: WorkoutType::Yoga,
                calories: None,
            },
        ];
        input.prior_day_workouts = Some(vec![WorkoutSample {
            duration_minutes: 90.0,
            avg_heart_rate: Some(160.0),
            max_heart_rate: Some(182.0),
            workout_type: WorkoutType::Running,
            calories: None,
        }]);
        input.profile = AthleteProfile {
            resting_hr: Some(52.0),
            max_hr: None,
            age: Some(40),
            gender: Some(Gender::Female),
        };

        let assessment =
            daily::DailyAssessment::evaluate(&input, &config::ScoringConfig::default()).unwrap();

        assert!(assessment.baseline.is_some());
        assert!(assessment.sleep.as_ref().unwrap().score >= 85);
        assert_eq!(assessment.strain.workout_count, 2);
        assert_eq!(assessment.strain.hr_workout_count, 1);
        assert!(assessment.prior_day_strain.unwrap() > assessment.strain.strain / 2.0);

        let recovery = &assessment.recovery;
        assert!(recovery.score.is_some());
        assert!((recovery.contributing_weight - 1.0).abs() < 1e-9);
        assert_ne!(recovery.category, recovery::RecoveryCategory::InsufficientData);
    }

    #[test]
    fn test_daily_input_from_json() {
        let json = r#"{
            "date": "2024-05-15",
            "sleep": {
                "total_minutes": 420, "in_bed_minutes": 460, "deep_minutes": 60,
                "rem_minutes": 85, "light_minutes": 275, "awake_minutes": 25,
                "latency_minutes": 18, "avg_hrv": 42
            },
            "bedtime": "23:15:00",
            "workouts": [
                {"duration_minutes": 40, "workout_type": "strength", "calories": 250}
            ],
            "prior_day_workouts": []
        }"#;
        let input: daily::DailyInput = serde_json::from_str(json).unwrap();
        let assessment =
            daily::DailyAssessment::evaluate(&input, &config::ScoringConfig::default()).unwrap();

        assert!(assessment.baseline.is_none());
        assert_eq!(assessment.prior_day_strain, Some(0.0));
        assert_eq!(assessment.strain.hr_workout_count, 0);
        // no baseline, so consistency has no data
        assert!(!assessment.recovery.components.sleep_consistency.has_data);
        assert!(assessment.recovery.score.is_some());
    }

    #[test]
    fn test_results_serialize_for_presentation() {
        let result = recovery::RecoveryCalculator::default()
            .calculate_recovery(&recovery::RecoveryInputs::default(), None);
        let json = serde_json::to_value(&result).unwrap();

        assert!(json["score"].is_null());
        assert_eq!(json["category"], "insufficient_data");
        assert_eq!(json["components"]["sleep_quality"]["has_data"], false);
        assert_eq!(json["components"]["hrv_status"]["weight"], 0.25);
    }

    #[test]
    fn test_blood_panel_workflow() {
        let markers = panel();

        let result = phenoage::PhenoAgeCalculator::default().calculate_phenoage(&markers, 50.0);
        assert!(result.can_calculate);
        assert!(result.age_difference.unwrap() < 0.0);
        assert!(result.pillars.iter().all(|p| p.score.is_some()));

        let classifications = biomarkers::classify_panel(&markers);
        assert_eq!(classifications.len(), markers.len());
        let ldl = classifications.iter().find(|c| c.name == "ldl").unwrap();
        assert_eq!(ldl.status, biomarkers::MarkerStatus::Warning);

        let by_category = biomarkers::summarize_by_category(&markers);
        assert!(by_category.contains_key(&BiomarkerCategory::Lipids));
        assert!(by_category[&BiomarkerCategory::Lipids] < 100);
    }

    #[test]
    fn test_config_round_trip_drives_calculators() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut cfg = config::ScoringConfig::default();
        cfg.recovery.reading_policy = recovery::ReadingPolicy::AllowStale;
        cfg.save_to_file(&path).unwrap();

        let loaded = config::ScoringConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, cfg);

        let mut input = daily::DailyInput::new(NaiveDate::from_ymd_opt(2024, 5, 15).unwrap());
        input.sleep = Some(reference_night());
        input.stale_hrv = Some(60.0);

        let strict =
            daily::DailyAssessment::evaluate(&input, &config::ScoringConfig::default()).unwrap();
        let lenient = daily::DailyAssessment::evaluate(&input, &loaded).unwrap();

        assert!(!strict.recovery.components.hrv_status.has_data);
        assert!(lenient.recovery.components.hrv_status.has_data);
    }
}
