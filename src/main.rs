use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use vitalscore::baseline::{BaselineCalculator, PersonalBaseline};
use vitalscore::biomarkers::{classify_panel, category_summary_score, summarize_by_category};
use vitalscore::config::ScoringConfig;
use vitalscore::daily::DailyAssessment;
use vitalscore::error::{CalculationError, VitalsError};
use vitalscore::logging::{init_logging, LogFormat, LogLevel};
use vitalscore::models::{
    AthleteProfile, BaselineObservation, BiomarkerValue, ScoreComponent, SleepReport,
    WorkoutSample,
};
use vitalscore::phenoage::PhenoAgeCalculator;
use vitalscore::recovery::{RecoveryCalculator, RecoveryInputs};
use vitalscore::sleep::SleepScorer;
use vitalscore::strain::StrainCalculator;
use vitalscore::validation::SampleValidator;
use vitalscore::DailyInput;

/// vitalscore - Biometric scoring CLI
///
/// Scores sleep, training strain, recovery and phenotypic age from JSON
/// exports of wearable and lab data.
#[derive(Parser)]
#[command(name = "vitalscore")]
#[command(version)]
#[command(about = "Sleep, strain, recovery and biological age scoring", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one night of sleep
    Sleep {
        /// Sleep report (JSON, durations in minutes unless `"unit": "hours"`)
        #[arg(short, long)]
        input: PathBuf,

        /// Recent nights for the personal baseline (JSON array)
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Estimate the strain of a day's workouts
    Strain {
        /// Workouts and athlete profile (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compose a recovery score
    Recovery {
        /// Recovery inputs (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Recent nights for the personal baseline (JSON array)
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Estimate phenotypic age from a blood panel
    Phenoage {
        /// Biomarker list (JSON array)
        #[arg(short, long)]
        input: PathBuf,

        /// Chronological age in years
        #[arg(short, long)]
        age: f64,

        /// Fail instead of reporting pillars only when markers are missing
        #[arg(long)]
        strict: bool,
    },

    /// Classify biomarkers against reference ranges
    Classify {
        /// Biomarker list (JSON array)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Full daily assessment for one or many days
    Daily {
        /// One daily input object or an array of them (JSON)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Manage the configuration file
    Config {
        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}

/// Input file of the `strain` command
#[derive(Debug, Deserialize)]
struct StrainRequest {
    workouts: Vec<WorkoutSample>,
    #[serde(default)]
    profile: AthleteProfile,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DailyFile {
    Many(Vec<DailyInput>),
    One(Box<DailyInput>),
}

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Weight")]
    weight: String,
}

#[derive(Tabled)]
struct WorkoutRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "TRIMP")]
    trimp: String,
    #[tabled(rename = "Strain")]
    strain: String,
    #[tabled(rename = "Category")]
    category: String,
}

#[derive(Tabled)]
struct MarkerRow {
    #[tabled(rename = "Marker")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    message: String,
}

#[derive(Tabled)]
struct PillarRow {
    #[tabled(rename = "Pillar")]
    pillar: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Markers")]
    markers: String,
}

#[derive(Tabled)]
struct DailyRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Sleep")]
    sleep: String,
    #[tabled(rename = "Strain")]
    strain: String,
    #[tabled(rename = "Recovery")]
    recovery: String,
    #[tabled(rename = "Category")]
    category: String,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        match e.downcast_ref::<VitalsError>() {
            Some(err) => {
                tracing::event!(tracing::Level::ERROR, error = %err, "Command failed");
                eprintln!("{} {}", "error:".red().bold(), err.user_message());
            }
            None => eprintln!("{} {:#}", "error:".red().bold(), e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ScoringConfig::load_from_file(path)?,
        None => ScoringConfig::load_or_default(),
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    init_logging(&config.logging)?;

    let format = cli.format;

    match cli.command {
        Commands::Sleep { input, history } => {
            let report: SleepReport = read_json(&input)?;
            let sample = SampleValidator::sleep_from_report(&report)?;
            let baseline = load_baseline(history.as_deref(), &config)?;

            let result = SleepScorer::new().score_sleep(&sample, baseline.as_ref());

            if format == OutputFormat::Json {
                return print_json(&result);
            }
            println!(
                "{} {} ({})",
                "Sleep score:".bold(),
                colorize_score(Some(result.score)),
                result.quality
            );
            println!("{}", component_table(&result.components.as_array()));
            println!(
                "Efficiency {:.1}%  Deep {:.1}%  REM {:.1}%",
                result.efficiency_percent, result.deep_percent, result.rem_percent
            );
            print_recommendations(&result.recommendations);
        }

        Commands::Strain { input } => {
            let mut request: StrainRequest = read_json(&input)?;
            SampleValidator::validate_profile(&request.profile)?;
            for workout in request.workouts.iter_mut() {
                SampleValidator::validate_workout(workout)?;
            }

            let result = StrainCalculator::new(config.strain.clone())
                .calculate_daily_strain(&request.workouts, &request.profile);

            if format == OutputFormat::Json {
                return print_json(&result);
            }
            println!(
                "{} {} ({})",
                "Daily strain:".bold(),
                format!("{:.1}", result.strain).cyan().bold(),
                result.category
            );
            let rows: Vec<WorkoutRow> = result
                .workouts
                .iter()
                .enumerate()
                .map(|(i, w)| WorkoutRow {
                    index: i + 1,
                    method: format!("{:?}", w.method),
                    trimp: w.trimp.map_or("-".to_string(), |t| format!("{:.1}", t)),
                    strain: format!("{:.1}", w.strain),
                    category: w.category.to_string(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            println!("{}", result.category.description().dimmed());
        }

        Commands::Recovery { input, history } => {
            let inputs: RecoveryInputs = read_json(&input)?;
            let baseline = load_baseline(history.as_deref(), &config)?;

            let result = RecoveryCalculator::new(config.recovery.clone())
                .calculate_recovery(&inputs, baseline.as_ref());

            if format == OutputFormat::Json {
                return print_json(&result);
            }
            println!(
                "{} {} ({})",
                "Recovery:".bold(),
                colorize_score(result.score),
                result.category
            );
            println!("{}", component_table(&result.components.as_array()));
            println!("{}", result.recommendation);
            println!("{} {}", "Suggested intensity:".bold(), result.training_intensity);
        }

        Commands::Phenoage { input, age, strict } => {
            let markers: Vec<BiomarkerValue> = read_json(&input)?;
            SampleValidator::validate_age(age)?;
            for marker in &markers {
                SampleValidator::validate_biomarker(marker)?;
            }

            let result = PhenoAgeCalculator::new(config.phenoage.clone())
                .calculate_phenoage(&markers, age);

            if strict && !result.can_calculate {
                return Err(VitalsError::Calculation(CalculationError::InsufficientData {
                    calculation: "PhenoAge".to_string(),
                    reason: format!("missing markers: {}", result.missing_markers.join(", ")),
                })
                .into());
            }

            if format == OutputFormat::Json {
                return print_json(&result);
            }
            match (result.phenotypic_age, result.age_difference, result.percentile) {
                (Some(pheno), Some(diff), Some(pct)) => {
                    let diff_text = format!("{:+.1} years", diff);
                    let diff_colored = if diff <= 0.0 {
                        diff_text.green()
                    } else {
                        diff_text.red()
                    };
                    println!(
                        "{} {:.1} (chronological {:.1}, {}, percentile {:.0})",
                        "Phenotypic age:".bold(),
                        pheno,
                        result.chronological_age,
                        diff_colored,
                        pct
                    );
                }
                _ => println!(
                    "{} missing {}",
                    "Phenotypic age unavailable:".yellow().bold(),
                    result.missing_markers.join(", ")
                ),
            }
            let rows: Vec<PillarRow> = result
                .pillars
                .iter()
                .map(|p| PillarRow {
                    pillar: p.pillar.to_string(),
                    score: p.score.map_or("-".to_string(), |s| s.to_string()),
                    label: p.label.map_or("-".to_string(), |l| l.to_string()),
                    markers: format!("{}/{}", p.factors_present, p.factors_total),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Classify { input } => {
            let markers: Vec<BiomarkerValue> = read_json(&input)?;
            for marker in &markers {
                SampleValidator::validate_biomarker(marker)?;
            }

            let classifications = classify_panel(&markers);
            let by_category = summarize_by_category(&markers);
            let overall = category_summary_score(&classifications);

            if format == OutputFormat::Json {
                #[derive(Serialize)]
                struct ClassifyOutput<'a> {
                    markers: &'a [vitalscore::biomarkers::MarkerClassification],
                    categories: &'a std::collections::BTreeMap<vitalscore::BiomarkerCategory, u8>,
                    overall: Option<u8>,
                }
                return print_json(&ClassifyOutput {
                    markers: &classifications,
                    categories: &by_category,
                    overall,
                });
            }

            let rows: Vec<MarkerRow> = classifications
                .iter()
                .map(|c| MarkerRow {
                    name: c.name.clone(),
                    value: format!("{}", c.value),
                    status: c.status.to_string(),
                    message: c.message.clone(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            for (category, score) in &by_category {
                println!("  {:<14} {}", category.to_string(), colorize_score(Some(*score)));
            }
            println!("{} {}", "Overall:".bold(), colorize_score(overall));
        }

        Commands::Daily { input } => {
            let inputs = match read_json::<DailyFile>(&input)? {
                DailyFile::Many(inputs) => inputs,
                DailyFile::One(input) => vec![*input],
            };

            let (results, summary) = DailyAssessment::evaluate_batch(&inputs, &config);

            if format == OutputFormat::Json {
                let assessments: Vec<&DailyAssessment> =
                    results.iter().filter_map(|r| r.as_ref().ok()).collect();
                return print_json(&assessments);
            }

            let rows: Vec<DailyRow> = results
                .iter()
                .filter_map(|r| r.as_ref().ok())
                .map(|a| DailyRow {
                    date: a.date.to_string(),
                    user: a.user_id.clone().unwrap_or_else(|| "-".to_string()),
                    sleep: a.sleep.as_ref().map_or("-".to_string(), |s| s.score.to_string()),
                    strain: format!("{:.1}", a.strain.strain),
                    recovery: a.recovery.score.map_or("-".to_string(), |s| s.to_string()),
                    category: a.recovery.category.to_string(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));

            for (input, err) in inputs
                .iter()
                .zip(&results)
                .filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
            {
                eprintln!("{} {}: {}", "skipped".yellow(), input.date, err.user_message());
            }
            println!(
                "{}",
                format!(
                    "{} evaluated, {} failed in {} ms",
                    summary.successful, summary.failed, summary.duration_ms
                )
                .dimmed()
            );
        }

        Commands::Config { init, show } => {
            let path = cli.config.unwrap_or_else(ScoringConfig::default_config_path);
            if init {
                ScoringConfig::default().save_to_file(&path)?;
                println!("{} {}", "Wrote default configuration to".green(), path.display());
            }
            if show || !init {
                let content = toml::to_string_pretty(&config)
                    .context("Failed to serialize configuration to TOML")?;
                println!("{}", content);
            }
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .map_err(VitalsError::from)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    let value = serde_json::from_str(&content).map_err(VitalsError::from)?;
    Ok(value)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_baseline(path: Option<&Path>, config: &ScoringConfig) -> Result<Option<PersonalBaseline>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let history: Vec<BaselineObservation> = read_json(path)?;
    Ok(BaselineCalculator::new(config.baseline.clone()).calculate_baseline(&history))
}

fn component_table(components: &[(&'static str, ScoreComponent)]) -> String {
    let rows: Vec<ComponentRow> = components
        .iter()
        .map(|(name, c)| ComponentRow {
            component: name.replace('_', " "),
            score: c.score.map_or("no data".to_string(), |s| format!("{:.0}", s)),
            weight: format!("{:.0}%", c.weight * 100.0),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

fn colorize_score(score: Option<u8>) -> ColoredString {
    match score {
        Some(s) if s >= 70 => s.to_string().green().bold(),
        Some(s) if s >= 50 => s.to_string().yellow().bold(),
        Some(s) => s.to_string().red().bold(),
        None => "n/a".dimmed(),
    }
}

fn print_recommendations(recommendations: &[String]) {
    if recommendations.is_empty() {
        return;
    }
    println!("{}", "Recommendations:".bold());
    for recommendation in recommendations {
        println!("  • {}", recommendation);
    }
}
