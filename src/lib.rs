//! vitalscore: scoring engine for sleep, training strain, recovery and
//! biological age
//!
//! Every calculator is a pure function of its inputs. Missing data is
//! expressed through `Option` and per-component `has_data` flags rather
//! than errors; only configuration, input validation and I/O can fail.

pub mod baseline;
pub mod biomarkers;
pub mod config;
pub mod daily;
pub mod error;
pub mod logging;
pub mod models;
pub mod phenoage;
pub mod recovery;
pub mod sleep;
pub mod strain;
pub mod validation;

// Re-export commonly used types for convenience
pub use models::*;
pub use baseline::{BaselineCalculator, PersonalBaseline};
pub use biomarkers::{classify, Biomarker, MarkerClassification, MarkerStatus};
pub use config::ScoringConfig;
pub use daily::{DailyAssessment, DailyInput};
pub use error::{CalculationError, Result, VitalsError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use phenoage::{PhenoAgeCalculator, PhenoAgeResult};
pub use recovery::{ReadingPolicy, ReadingSources, RecoveryCalculator, RecoveryInputs, RecoveryResult};
pub use sleep::{SleepScoreResult, SleepScorer};
pub use strain::{DailyStrainResult, StrainCalculator, StrainInput, StrainResult};
