//! Phenotypic age (Levine PhenoAge)
//!
//! Nine blood markers and chronological age feed a linear predictor of
//! mortality risk:
//!
//! ```text
//! xb = -19.9067 - 0.0336·albumin(g/L) + 0.0095·creatinine(µmol/L)
//!      + 0.1953·glucose(mmol/L) + 0.0954·ln(CRP) - 0.0120·lymphocyte%
//!      + 0.0268·MCV + 0.3306·RDW + 0.00188·ALP + 0.0554·WBC + 0.0804·age
//! ```
//!
//! which is turned into a 10-year mortality score with a Gompertz model
//! (`γ = 0.0076927`):
//!
//! ```text
//! M = 1 - exp(-exp(xb) · (exp(120γ) - 1) / γ)
//! ```
//!
//! and inverted to the age at which an average person carries the same
//! risk:
//!
//! ```text
//! PhenoAge = 141.50225 + ln(-0.00553 · ln(1 - M)) / 0.09165
//! ```
//!
//! Independently of the age estimate, four pillar scores (metabolic,
//! inflammation, liver, blood) summarise whichever markers are present.

use crate::biomarkers::Biomarker;
use crate::models::BiomarkerValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Markers required for a numeric PhenoAge, in coefficient order
pub const REQUIRED_MARKERS: [Biomarker; 9] = [
    Biomarker::Albumin,
    Biomarker::Creatinine,
    Biomarker::FastingGlucose,
    Biomarker::Crp,
    Biomarker::LymphocytePercent,
    Biomarker::Mcv,
    Biomarker::Rdw,
    Biomarker::AlkalinePhosphatase,
    Biomarker::Wbc,
];

const INTERCEPT: f64 = -19.9067;
const AGE_COEFFICIENT: f64 = 0.0804;

/// Gompertz shape parameter
pub const GAMMA: f64 = 0.0076927;

const INVERSION_OFFSET: f64 = 141.50225;
const INVERSION_SCALE: f64 = -0.00553;
const INVERSION_RATE: f64 = 0.09165;

/// CRP floor keeping `ln` finite
const CRP_FLOOR: f64 = 0.1;

const MIN_PHENOAGE: f64 = 20.0;
const MAX_PHENOAGE: f64 = 120.0;

/// Logistic approximation factor of the standard normal CDF
const LOGISTIC_CDF_FACTOR: f64 = 1.702;

/// PhenoAge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhenoAgeConfig {
    /// Assumed population standard deviation of the age gap in years
    pub population_stddev: f64,
}

impl Default for PhenoAgeConfig {
    fn default() -> Self {
        PhenoAgeConfig {
            population_stddev: 7.0,
        }
    }
}

/// Health pillar covered by a subset of the PhenoAge markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Metabolic,
    Inflammation,
    Liver,
    Blood,
}

impl Pillar {
    pub const ALL: [Pillar; 4] = [
        Pillar::Metabolic,
        Pillar::Inflammation,
        Pillar::Liver,
        Pillar::Blood,
    ];

    pub fn markers(&self) -> &'static [Biomarker] {
        match self {
            Pillar::Metabolic => &[Biomarker::FastingGlucose, Biomarker::Creatinine],
            Pillar::Inflammation => &[
                Biomarker::Crp,
                Biomarker::Wbc,
                Biomarker::LymphocytePercent,
            ],
            Pillar::Liver => &[Biomarker::Albumin, Biomarker::AlkalinePhosphatase],
            Pillar::Blood => &[Biomarker::Mcv, Biomarker::Rdw],
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pillar::Metabolic => write!(f, "Metabolic"),
            Pillar::Inflammation => write!(f, "Inflammation"),
            Pillar::Liver => write!(f, "Liver"),
            Pillar::Blood => write!(f, "Blood"),
        }
    }
}

/// Qualitative pillar label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PillarLabel {
    Optimal,
    Good,
    Fair,
    Poor,
}

impl PillarLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 90 => PillarLabel::Optimal,
            s if s >= 70 => PillarLabel::Good,
            s if s >= 50 => PillarLabel::Fair,
            _ => PillarLabel::Poor,
        }
    }
}

impl fmt::Display for PillarLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PillarLabel::Optimal => write!(f, "Optimal"),
            PillarLabel::Good => write!(f, "Good"),
            PillarLabel::Fair => write!(f, "Fair"),
            PillarLabel::Poor => write!(f, "Poor"),
        }
    }
}

/// Score of one pillar over the markers that were supplied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PillarScore {
    pub pillar: Pillar,

    /// Mean factor score (0-100), `None` when no marker of the pillar is present
    pub score: Option<u8>,
    pub label: Option<PillarLabel>,
    pub factors_present: usize,
    pub factors_total: usize,
}

/// Result of a PhenoAge calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhenoAgeResult {
    /// True only when all nine markers are present
    pub can_calculate: bool,
    pub chronological_age: f64,

    /// Phenotypic age in years, one decimal
    pub phenotypic_age: Option<f64>,

    /// Phenotypic minus chronological age; negative is younger
    pub age_difference: Option<f64>,

    /// Share of same-age peers with an older phenotypic age (1-99)
    pub percentile: Option<f64>,

    /// 10-year mortality score from the Gompertz model
    pub mortality_score: Option<f64>,

    /// Canonical names of the required markers that were not supplied
    pub missing_markers: Vec<String>,

    pub pillars: Vec<PillarScore>,
}

/// PhenoAge calculator
#[derive(Debug, Clone, Default)]
pub struct PhenoAgeCalculator {
    config: PhenoAgeConfig,
}

impl PhenoAgeCalculator {
    pub fn new(config: PhenoAgeConfig) -> Self {
        Self { config }
    }

    /// Estimate phenotypic age from a blood panel
    ///
    /// Markers are matched by canonical name or alias; unrelated markers
    /// are ignored. Values are read in US conventional units unless the
    /// unit says SI (g/L, µmol/L, mmol/L).
    pub fn calculate_phenoage(
        &self,
        markers: &[BiomarkerValue],
        chronological_age: f64,
    ) -> PhenoAgeResult {
        let values = Self::collect_conventional(markers);
        let missing_markers = Self::missing_markers_in(&values);
        let pillars = Pillar::ALL
            .iter()
            .map(|p| Self::score_pillar(*p, &values))
            .collect();

        let mut result = PhenoAgeResult {
            can_calculate: missing_markers.is_empty(),
            chronological_age,
            phenotypic_age: None,
            age_difference: None,
            percentile: None,
            mortality_score: None,
            missing_markers,
            pillars,
        };

        if !result.can_calculate {
            warn!(missing = ?result.missing_markers, "PhenoAge cannot be calculated");
            return result;
        }

        let get = |m: Biomarker| values.get(&m).copied().unwrap_or_default();
        let xb = Self::linear_predictor(
            get(Biomarker::Albumin),
            get(Biomarker::Creatinine),
            get(Biomarker::FastingGlucose),
            get(Biomarker::Crp),
            get(Biomarker::LymphocytePercent),
            get(Biomarker::Mcv),
            get(Biomarker::Rdw),
            get(Biomarker::AlkalinePhosphatase),
            get(Biomarker::Wbc),
            chronological_age,
        );

        let hazard = Self::cumulative_hazard(xb);
        let mortality = 1.0 - (-hazard).exp();
        let phenotypic_age = round1(Self::age_from_hazard(hazard));
        let age_difference = round1(phenotypic_age - chronological_age);
        let percentile = self.percentile(age_difference);

        debug!(xb, mortality, phenotypic_age, age_difference, percentile, "PhenoAge calculated");

        result.phenotypic_age = Some(phenotypic_age);
        result.age_difference = Some(age_difference);
        result.percentile = Some(percentile);
        result.mortality_score = Some(mortality);
        result
    }

    /// Canonical names of required markers absent from the panel
    pub fn missing_markers(markers: &[BiomarkerValue]) -> Vec<String> {
        Self::missing_markers_in(&Self::collect_conventional(markers))
    }

    pub fn can_calculate(markers: &[BiomarkerValue]) -> bool {
        Self::missing_markers(markers).is_empty()
    }

    /// Linear mortality predictor, inputs in US conventional units
    #[allow(clippy::too_many_arguments)]
    pub fn linear_predictor(
        albumin_g_dl: f64,
        creatinine_mg_dl: f64,
        glucose_mg_dl: f64,
        crp: f64,
        lymphocyte_percent: f64,
        mcv: f64,
        rdw: f64,
        alkaline_phosphatase: f64,
        wbc: f64,
        age: f64,
    ) -> f64 {
        let albumin = albumin_g_dl * 10.0;
        let creatinine = creatinine_mg_dl * 88.4;
        let glucose = glucose_mg_dl * 0.0555;
        let ln_crp = crp.max(CRP_FLOOR).ln();

        INTERCEPT - 0.0336 * albumin
            + 0.0095 * creatinine
            + 0.1953 * glucose
            + 0.0954 * ln_crp
            - 0.0120 * lymphocyte_percent
            + 0.0268 * mcv
            + 0.3306 * rdw
            + 0.00188 * alkaline_phosphatase
            + 0.0554 * wbc
            + AGE_COEFFICIENT * age
    }

    /// Gompertz mortality score `M` for a linear predictor
    pub fn mortality_score(xb: f64) -> f64 {
        1.0 - (-Self::cumulative_hazard(xb)).exp()
    }

    /// Phenotypic age for a mortality score, clamped to [20, 120]
    pub fn age_from_mortality(mortality: f64) -> f64 {
        let survival = (1.0 - mortality).clamp(f64::MIN_POSITIVE, 1.0);
        Self::age_from_hazard(-survival.ln())
    }

    /// Percentile among peers of the same age, clamped to [1, 99]
    pub fn percentile(&self, age_difference: f64) -> f64 {
        let stddev = if self.config.population_stddev > 0.0 {
            self.config.population_stddev
        } else {
            PhenoAgeConfig::default().population_stddev
        };
        let z = -age_difference / stddev;
        let p = 100.0 / (1.0 + (-LOGISTIC_CDF_FACTOR * z).exp());
        p.round().clamp(1.0, 99.0)
    }

    /// `exp(xb) · (exp(120γ) - 1) / γ`, equal to `-ln(1 - M)`
    fn cumulative_hazard(xb: f64) -> f64 {
        xb.exp() * ((120.0 * GAMMA).exp() - 1.0) / GAMMA
    }

    fn age_from_hazard(hazard: f64) -> f64 {
        let inner = (-INVERSION_SCALE * hazard).max(f64::MIN_POSITIVE);
        let age = INVERSION_OFFSET + inner.ln() / INVERSION_RATE;
        if age.is_nan() {
            return MIN_PHENOAGE;
        }
        age.clamp(MIN_PHENOAGE, MAX_PHENOAGE)
    }

    /// Resolve names and convert SI values back to conventional units
    fn collect_conventional(markers: &[BiomarkerValue]) -> HashMap<Biomarker, f64> {
        let mut values = HashMap::new();
        for marker in markers {
            let Some(biomarker) = Biomarker::from_name(&marker.name) else {
                continue;
            };
            if !REQUIRED_MARKERS.contains(&biomarker) || !marker.value.is_finite() {
                continue;
            }
            values
                .entry(biomarker)
                .or_insert_with(|| to_conventional(biomarker, marker.value, &marker.unit));
        }
        values
    }

    fn missing_markers_in(values: &HashMap<Biomarker, f64>) -> Vec<String> {
        REQUIRED_MARKERS
            .iter()
            .filter(|m| !values.contains_key(m))
            .map(|m| m.canonical_name().to_string())
            .collect()
    }

    fn score_pillar(pillar: Pillar, values: &HashMap<Biomarker, f64>) -> PillarScore {
        let scores: Vec<f64> = pillar
            .markers()
            .iter()
            .filter_map(|m| values.get(m).map(|v| factor_score(*m, *v)))
            .collect();

        let score = if scores.is_empty() {
            None
        } else {
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            Some(mean.round().clamp(0.0, 100.0) as u8)
        };

        PillarScore {
            pillar,
            score,
            label: score.map(PillarLabel::from_score),
            factors_present: scores.len(),
            factors_total: pillar.markers().len(),
        }
    }
}

fn to_conventional(marker: Biomarker, value: f64, unit: &str) -> f64 {
    let unit = unit.trim().to_lowercase().replace(['µ', 'μ'], "u");
    match (marker, unit.as_str()) {
        (Biomarker::Albumin, "g/l") => value / 10.0,
        (Biomarker::Creatinine, "umol/l") => value / 88.4,
        (Biomarker::FastingGlucose, "mmol/l") => value / 0.0555,
        _ => value,
    }
}

/// Clinical step score of one pillar factor, conventional units
fn factor_score(marker: Biomarker, value: f64) -> f64 {
    match marker {
        Biomarker::FastingGlucose => match value {
            v if (70.0..=90.0).contains(&v) => 100.0,
            v if (65.0..=99.0).contains(&v) => 80.0,
            v if (55.0..=125.0).contains(&v) => 50.0,
            _ => 20.0,
        },
        Biomarker::Creatinine => match value {
            v if (0.7..=1.1).contains(&v) => 100.0,
            v if (0.6..=1.3).contains(&v) => 80.0,
            v if (0.5..=1.5).contains(&v) => 50.0,
            _ => 20.0,
        },
        Biomarker::Crp => match value {
            v if v < 1.0 => 100.0,
            v if v <= 3.0 => 70.0,
            v if v <= 10.0 => 40.0,
            _ => 10.0,
        },
        Biomarker::Wbc => match value {
            v if (4.0..=7.0).contains(&v) => 100.0,
            v if (3.5..=10.5).contains(&v) => 75.0,
            _ => 40.0,
        },
        Biomarker::LymphocytePercent => match value {
            v if (25.0..=40.0).contains(&v) => 100.0,
            v if (20.0..=45.0).contains(&v) => 75.0,
            _ => 40.0,
        },
        Biomarker::Albumin => match value {
            v if v >= 4.2 => 100.0,
            v if v >= 3.8 => 75.0,
            v if v >= 3.5 => 50.0,
            _ => 25.0,
        },
        Biomarker::AlkalinePhosphatase => match value {
            v if (40.0..=80.0).contains(&v) => 100.0,
            v if (30.0..=129.0).contains(&v) => 75.0,
            _ => 40.0,
        },
        Biomarker::Mcv => match value {
            v if (82.0..=92.0).contains(&v) => 100.0,
            v if (80.0..=100.0).contains(&v) => 75.0,
            _ => 40.0,
        },
        Biomarker::Rdw => match value {
            v if v <= 13.0 => 100.0,
            v if v <= 14.5 => 70.0,
            _ => 35.0,
        },
        _ => 0.0,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BiomarkerCategory;

    fn marker(name: &str, value: f64, unit: &str) -> BiomarkerValue {
        let category = Biomarker::from_name(name)
            .map(|b| b.category())
            .unwrap_or(BiomarkerCategory::Other);
        BiomarkerValue::new(name, value, unit, category)
    }

    fn healthy_panel() -> Vec<BiomarkerValue> {
        vec![
            marker("albumin", 4.5, "g/dL"),
            marker("creatinine", 0.9, "mg/dL"),
            marker("fasting_glucose", 85.0, "mg/dL"),
            marker("crp", 0.5, "mg/L"),
            marker("lymphocyte_percent", 30.0, "%"),
            marker("mcv", 89.0, "fL"),
            marker("rdw", 12.5, "%"),
            marker("alkaline_phosphatase", 65.0, "U/L"),
            marker("wbc", 5.5, "10^3/uL"),
        ]
    }

    #[test]
    fn test_healthy_panel_is_younger() {
        let result = PhenoAgeCalculator::default().calculate_phenoage(&healthy_panel(), 50.0);

        assert!(result.can_calculate);
        assert!(result.missing_markers.is_empty());
        assert_eq!(result.phenotypic_age, Some(42.0));
        assert_eq!(result.age_difference, Some(-8.0));
        assert_eq!(result.percentile, Some(87.0));

        let mortality = result.mortality_score.unwrap();
        assert!((mortality - 0.01967).abs() < 1e-4);
    }

    #[test]
    fn test_inflamed_panel_is_older() {
        let panel = vec![
            marker("albumin", 3.6, "g/dL"),
            marker("creatinine", 1.4, "mg/dL"),
            marker("fasting_glucose", 120.0, "mg/dL"),
            marker("crp", 8.0, "mg/L"),
            marker("lymphocyte_percent", 18.0, "%"),
            marker("mcv", 98.0, "fL"),
            marker("rdw", 15.5, "%"),
            marker("alkaline_phosphatase", 120.0, "U/L"),
            marker("wbc", 10.0, "10^3/uL"),
        ];
        let result = PhenoAgeCalculator::default().calculate_phenoage(&panel, 50.0);

        assert_eq!(result.phenotypic_age, Some(75.8));
        assert_eq!(result.percentile, Some(1.0));
    }

    #[test]
    fn test_si_units_match_conventional() {
        let conventional = PhenoAgeCalculator::default().calculate_phenoage(&healthy_panel(), 50.0);

        let mut si = healthy_panel();
        si[0] = marker("albumin", 45.0, "g/L");
        si[1] = marker("creatinine", 0.9 * 88.4, "µmol/L");
        si[2] = marker("fasting_glucose", 85.0 * 0.0555, "mmol/L");
        let si = PhenoAgeCalculator::default().calculate_phenoage(&si, 50.0);

        assert_eq!(conventional.phenotypic_age, si.phenotypic_age);
    }

    #[test]
    fn test_zero_crp_is_floored() {
        let mut panel = healthy_panel();
        panel[3] = marker("crp", 0.0, "mg/L");
        let result = PhenoAgeCalculator::default().calculate_phenoage(&panel, 50.0);
        assert_eq!(result.phenotypic_age, Some(40.4));
    }

    #[test]
    fn test_missing_markers_listed_exactly() {
        let panel: Vec<BiomarkerValue> = healthy_panel()
            .into_iter()
            .filter(|m| m.name != "crp" && m.name != "rdw")
            .collect();
        let result = PhenoAgeCalculator::default().calculate_phenoage(&panel, 50.0);

        assert!(!result.can_calculate);
        assert_eq!(result.missing_markers, vec!["crp".to_string(), "rdw".to_string()]);
        assert_eq!(result.phenotypic_age, None);
        assert_eq!(result.percentile, None);
        assert!(!PhenoAgeCalculator::can_calculate(&panel));
    }

    #[test]
    fn test_pillars_with_partial_panel() {
        let panel = vec![
            marker("glucose", 85.0, "mg/dL"),
            marker("hs-crp", 2.0, "mg/L"),
            marker("wbc", 5.0, "10^3/uL"),
        ];
        let result = PhenoAgeCalculator::default().calculate_phenoage(&panel, 40.0);
        assert!(!result.can_calculate);
        assert_eq!(result.missing_markers.len(), 6);

        let pillar = |p: Pillar| result.pillars.iter().find(|s| s.pillar == p).unwrap();

        assert_eq!(pillar(Pillar::Metabolic).score, Some(100));
        assert_eq!(pillar(Pillar::Metabolic).label, Some(PillarLabel::Optimal));
        assert_eq!(pillar(Pillar::Metabolic).factors_present, 1);

        // (70 + 100) / 2
        assert_eq!(pillar(Pillar::Inflammation).score, Some(85));
        assert_eq!(pillar(Pillar::Inflammation).label, Some(PillarLabel::Good));

        assert_eq!(pillar(Pillar::Liver).score, None);
        assert_eq!(pillar(Pillar::Liver).label, None);
        assert_eq!(pillar(Pillar::Blood).factors_total, 2);
    }

    #[test]
    fn test_empty_panel() {
        let result = PhenoAgeCalculator::default().calculate_phenoage(&[], 40.0);
        assert_eq!(result.missing_markers.len(), 9);
        assert!(result.pillars.iter().all(|p| p.score.is_none()));
    }

    #[test]
    fn test_age_is_clamped() {
        assert_eq!(PhenoAgeCalculator::age_from_mortality(0.0), 20.0);
        assert_eq!(PhenoAgeCalculator::age_from_mortality(1.0), 120.0);
        let m = PhenoAgeCalculator::mortality_score(-9.203078);
        assert!((PhenoAgeCalculator::age_from_mortality(m) - 42.03).abs() < 0.05);
    }

    #[test]
    fn test_percentile_bounds() {
        let calculator = PhenoAgeCalculator::default();
        assert_eq!(calculator.percentile(0.0), 50.0);
        assert_eq!(calculator.percentile(-60.0), 99.0);
        assert_eq!(calculator.percentile(60.0), 1.0);
    }

    #[test]
    fn test_pillar_labels() {
        assert_eq!(PillarLabel::from_score(90), PillarLabel::Optimal);
        assert_eq!(PillarLabel::from_score(89), PillarLabel::Good);
        assert_eq!(PillarLabel::from_score(50), PillarLabel::Fair);
        assert_eq!(PillarLabel::from_score(49), PillarLabel::Poor);
    }
}
