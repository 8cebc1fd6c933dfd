use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vitalscore::{baseline, config, daily, models, phenoage, strain};

/// Benchmarks for the scoring engine
///
/// Single-day scoring is dominated by the baseline window; batch
/// evaluation checks that rayon scales across independent days.

fn create_history(end: NaiveDate, nights: i64) -> Vec<models::BaselineObservation> {
    (1..=nights)
        .map(|offset| models::BaselineObservation {
            date: end - chrono::Duration::days(offset),
            hrv: Some(45.0 + (offset % 7) as f64 * 2.0),
            resting_hr: Some(52.0 + (offset % 4) as f64),
            bedtime_minutes: Some(1400.0 + (offset % 6) as f64 * 10.0),
        })
        .collect()
}

fn create_daily_input(index: usize) -> daily::DailyInput {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(index as i64 % 365);
    let mut input = daily::DailyInput::new(date);
    input.user_id = Some(format!("user-{}", index));
    input.history = create_history(date, 14);
    input.sleep = Some(models::SleepSample {
        total_minutes: 420.0 + (index % 60) as f64,
        in_bed_minutes: 470.0,
        deep_minutes: 70.0,
        rem_minutes: 95.0,
        light_minutes: 255.0,
        awake_minutes: 20.0,
        latency_minutes: 12.0,
        avg_hrv: Some(50.0),
    });
    input.resting_hr = Some(54.0);
    input.workouts = vec![
        models::WorkoutSample {
            duration_minutes: 50.0,
            avg_heart_rate: Some(145.0),
            max_heart_rate: Some(172.0),
            workout_type: models::WorkoutType::Running,
            calories: Some(550.0),
        },
        models::WorkoutSample {
            duration_minutes: 30.0,
            avg_heart_rate: None,
            max_heart_rate: None,
            workout_type: models::WorkoutType::Strength,
            calories: Some(200.0),
        },
    ];
    input.prior_day_workouts = Some(Vec::new());
    input.profile = models::AthleteProfile {
        resting_hr: Some(54.0),
        max_hr: Some(188.0),
        age: Some(38),
        gender: Some(models::Gender::Male),
    };
    input
}

fn bench_baseline(c: &mut Criterion) {
    let calculator = baseline::BaselineCalculator::default();
    let end = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let mut group = c.benchmark_group("Baseline");

    for &nights in &[14, 90, 365] {
        let history = create_history(end, nights);
        group.throughput(Throughput::Elements(nights as u64));
        group.bench_with_input(
            BenchmarkId::new("calculate_baseline", nights),
            &history,
            |b, history| b.iter(|| calculator.calculate_baseline(black_box(history))),
        );
    }

    group.finish();
}

fn bench_daily_strain(c: &mut Criterion) {
    let calculator = strain::StrainCalculator::default();
    let input = create_daily_input(0);

    c.bench_function("calculate_daily_strain", |b| {
        b.iter(|| calculator.calculate_daily_strain(black_box(&input.workouts), &input.profile))
    });
}

fn bench_phenoage(c: &mut Criterion) {
    use models::{BiomarkerCategory::*, BiomarkerValue};

    let calculator = phenoage::PhenoAgeCalculator::default();
    let markers = vec![
        BiomarkerValue::new("albumin", 4.4, "g/dL", Liver),
        BiomarkerValue::new("creatinine", 0.95, "mg/dL", Kidney),
        BiomarkerValue::new("fasting_glucose", 88.0, "mg/dL", Metabolic),
        BiomarkerValue::new("crp", 0.8, "mg/L", Inflammation),
        BiomarkerValue::new("lymphocyte_percent", 32.0, "%", Blood),
        BiomarkerValue::new("mcv", 90.0, "fL", Blood),
        BiomarkerValue::new("rdw", 12.8, "%", Blood),
        BiomarkerValue::new("alkaline_phosphatase", 70.0, "U/L", Liver),
        BiomarkerValue::new("wbc", 6.0, "10^3/uL", Inflammation),
    ];

    c.bench_function("calculate_phenoage", |b| {
        b.iter(|| calculator.calculate_phenoage(black_box(&markers), 45.0))
    });
}

fn bench_daily_assessment(c: &mut Criterion) {
    let config = config::ScoringConfig::default();
    let input = create_daily_input(0);

    c.bench_function("daily_assessment", |b| {
        b.iter(|| daily::DailyAssessment::evaluate(black_box(&input), &config))
    });
}

fn bench_batch_evaluation(c: &mut Criterion) {
    let config = config::ScoringConfig::default();
    let mut group = c.benchmark_group("Batch Evaluation");

    for &size in &[10, 100, 1000] {
        let inputs: Vec<daily::DailyInput> = (0..size).map(create_daily_input).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("evaluate_batch", size),
            &inputs,
            |b, inputs| b.iter(|| daily::DailyAssessment::evaluate_batch(black_box(inputs), &config)),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_baseline,
    bench_daily_strain,
    bench_phenoage,
    bench_daily_assessment,
    bench_batch_evaluation
);

criterion_main!(benches);
