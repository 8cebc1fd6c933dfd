//! Blood marker catalogue and range/status classification
//!
//! Each known marker carries a reference range (the laboratory "normal"
//! interval) and a tighter optimal range. Values are classified as:
//!
//! - **Optimal**: inside the optimal range
//! - **Normal**: inside the reference range
//! - **Warning**: outside the reference range by a moderate margin
//! - **Critical**: below the reference minimum by more than 30%, or above
//!   the reference maximum by more than 50%
//!
//! Ranges are expressed in US conventional units.

use crate::models::{BiomarkerCategory, BiomarkerValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Percent below the reference minimum beyond which a value is critical
const CRITICAL_LOW_PCT: f64 = 30.0;

/// Percent above the reference maximum beyond which a value is critical
const CRITICAL_HIGH_PCT: f64 = 50.0;

/// Closed numeric interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Reference and optimal ranges for one marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDefinition {
    pub display_name: String,
    pub unit: String,
    pub category: BiomarkerCategory,
    pub reference: Range,
    pub optimal: Range,
    /// `Some(true)` when higher values are favourable, `Some(false)` when
    /// lower values are, `None` when both directions matter
    pub higher_is_better: Option<bool>,
}

impl MarkerDefinition {
    /// Which side of the optimal band a normal value should move towards
    fn direction_hint(&self, value: f64) -> &'static str {
        match self.higher_is_better {
            Some(true) if value < self.optimal.min => "; higher is better",
            Some(false) if value > self.optimal.max => "; lower is better",
            _ => "",
        }
    }
}

/// Canonical blood markers known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biomarker {
    Albumin,
    Creatinine,
    FastingGlucose,
    Crp,
    LymphocytePercent,
    Mcv,
    Rdw,
    AlkalinePhosphatase,
    Wbc,
    Hba1c,
    FastingInsulin,
    TotalCholesterol,
    Ldl,
    Hdl,
    Triglycerides,
    Alt,
    Ast,
    Ggt,
    Bun,
    Hemoglobin,
    Hematocrit,
    Platelets,
    Ferritin,
    VitaminD,
    VitaminB12,
    Tsh,
    Testosterone,
}

impl Biomarker {
    pub const ALL: [Biomarker; 27] = [
        Biomarker::Albumin,
        Biomarker::Creatinine,
        Biomarker::FastingGlucose,
        Biomarker::Crp,
        Biomarker::LymphocytePercent,
        Biomarker::Mcv,
        Biomarker::Rdw,
        Biomarker::AlkalinePhosphatase,
        Biomarker::Wbc,
        Biomarker::Hba1c,
        Biomarker::FastingInsulin,
        Biomarker::TotalCholesterol,
        Biomarker::Ldl,
        Biomarker::Hdl,
        Biomarker::Triglycerides,
        Biomarker::Alt,
        Biomarker::Ast,
        Biomarker::Ggt,
        Biomarker::Bun,
        Biomarker::Hemoglobin,
        Biomarker::Hematocrit,
        Biomarker::Platelets,
        Biomarker::Ferritin,
        Biomarker::VitaminD,
        Biomarker::VitaminB12,
        Biomarker::Tsh,
        Biomarker::Testosterone,
    ];

    /// Canonical snake_case name used across the API
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Biomarker::Albumin => "albumin",
            Biomarker::Creatinine => "creatinine",
            Biomarker::FastingGlucose => "fasting_glucose",
            Biomarker::Crp => "crp",
            Biomarker::LymphocytePercent => "lymphocyte_percent",
            Biomarker::Mcv => "mcv",
            Biomarker::Rdw => "rdw",
            Biomarker::AlkalinePhosphatase => "alkaline_phosphatase",
            Biomarker::Wbc => "wbc",
            Biomarker::Hba1c => "hba1c",
            Biomarker::FastingInsulin => "fasting_insulin",
            Biomarker::TotalCholesterol => "total_cholesterol",
            Biomarker::Ldl => "ldl",
            Biomarker::Hdl => "hdl",
            Biomarker::Triglycerides => "triglycerides",
            Biomarker::Alt => "alt",
            Biomarker::Ast => "ast",
            Biomarker::Ggt => "ggt",
            Biomarker::Bun => "bun",
            Biomarker::Hemoglobin => "hemoglobin",
            Biomarker::Hematocrit => "hematocrit",
            Biomarker::Platelets => "platelets",
            Biomarker::Ferritin => "ferritin",
            Biomarker::VitaminD => "vitamin_d",
            Biomarker::VitaminB12 => "vitamin_b12",
            Biomarker::Tsh => "tsh",
            Biomarker::Testosterone => "testosterone",
        }
    }

    /// Resolve a marker from its canonical name or a common alias
    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    pub fn category(&self) -> BiomarkerCategory {
        self.definition().category
    }

    /// Reference ranges in US conventional units
    pub fn definition(&self) -> MarkerDefinition {
        use BiomarkerCategory::*;

        let (display_name, unit, category, reference, optimal, higher_is_better) = match self {
            Biomarker::Albumin => ("Albumin", "g/dL", Liver, Range::new(3.5, 5.0), Range::new(4.2, 5.0), Some(true)),
            Biomarker::Creatinine => ("Creatinine", "mg/dL", Kidney, Range::new(0.6, 1.3), Range::new(0.7, 1.1), None),
            Biomarker::FastingGlucose => ("Fasting Glucose", "mg/dL", Metabolic, Range::new(70.0, 99.0), Range::new(72.0, 90.0), None),
            Biomarker::Crp => ("C-Reactive Protein", "mg/L", Inflammation, Range::new(0.0, 3.0), Range::new(0.0, 1.0), Some(false)),
            Biomarker::LymphocytePercent => ("Lymphocytes", "%", Blood, Range::new(20.0, 45.0), Range::new(25.0, 40.0), None),
            Biomarker::Mcv => ("Mean Corpuscular Volume", "fL", Blood, Range::new(80.0, 100.0), Range::new(82.0, 92.0), None),
            Biomarker::Rdw => ("Red Cell Distribution Width", "%", Blood, Range::new(11.5, 14.5), Range::new(11.5, 13.0), Some(false)),
            Biomarker::AlkalinePhosphatase => ("Alkaline Phosphatase", "U/L", Liver, Range::new(40.0, 129.0), Range::new(40.0, 80.0), None),
            Biomarker::Wbc => ("White Blood Cells", "10^3/uL", Inflammation, Range::new(4.0, 10.5), Range::new(4.0, 7.0), None),
            Biomarker::Hba1c => ("Hemoglobin A1c", "%", Metabolic, Range::new(4.0, 5.6), Range::new(4.6, 5.3), Some(false)),
            Biomarker::FastingInsulin => ("Fasting Insulin", "uIU/mL", Metabolic, Range::new(2.6, 24.9), Range::new(2.6, 8.0), Some(false)),
            Biomarker::TotalCholesterol => ("Total Cholesterol", "mg/dL", Lipids, Range::new(100.0, 199.0), Range::new(150.0, 199.0), None),
            Biomarker::Ldl => ("LDL Cholesterol", "mg/dL", Lipids, Range::new(0.0, 99.0), Range::new(0.0, 70.0), Some(false)),
            Biomarker::Hdl => ("HDL Cholesterol", "mg/dL", Lipids, Range::new(40.0, 100.0), Range::new(60.0, 100.0), Some(true)),
            Biomarker::Triglycerides => ("Triglycerides", "mg/dL", Lipids, Range::new(0.0, 149.0), Range::new(0.0, 90.0), Some(false)),
            Biomarker::Alt => ("ALT", "U/L", Liver, Range::new(7.0, 56.0), Range::new(10.0, 26.0), None),
            Biomarker::Ast => ("AST", "U/L", Liver, Range::new(10.0, 40.0), Range::new(10.0, 26.0), None),
            Biomarker::Ggt => ("GGT", "U/L", Liver, Range::new(8.0, 61.0), Range::new(8.0, 25.0), Some(false)),
            Biomarker::Bun => ("Blood Urea Nitrogen", "mg/dL", Kidney, Range::new(7.0, 20.0), Range::new(10.0, 16.0), None),
            Biomarker::Hemoglobin => ("Hemoglobin", "g/dL", Blood, Range::new(12.0, 17.5), Range::new(13.5, 16.0), None),
            Biomarker::Hematocrit => ("Hematocrit", "%", Blood, Range::new(36.0, 50.0), Range::new(40.0, 47.0), None),
            Biomarker::Platelets => ("Platelets", "10^3/uL", Blood, Range::new(150.0, 400.0), Range::new(175.0, 300.0), None),
            Biomarker::Ferritin => ("Ferritin", "ng/mL", Blood, Range::new(30.0, 400.0), Range::new(50.0, 150.0), None),
            Biomarker::VitaminD => ("Vitamin D (25-OH)", "ng/mL", Vitamins, Range::new(30.0, 100.0), Range::new(40.0, 60.0), None),
            Biomarker::VitaminB12 => ("Vitamin B12", "pg/mL", Vitamins, Range::new(200.0, 900.0), Range::new(500.0, 900.0), Some(true)),
            Biomarker::Tsh => ("TSH", "mIU/L", Thyroid, Range::new(0.4, 4.5), Range::new(1.0, 2.5), None),
            Biomarker::Testosterone => ("Total Testosterone", "ng/dL", Hormones, Range::new(264.0, 916.0), Range::new(500.0, 900.0), None),
        };

        MarkerDefinition {
            display_name: display_name.to_string(),
            unit: unit.to_string(),
            category,
            reference,
            optimal,
            higher_is_better,
        }
    }
}

impl FromStr for Biomarker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' ', '.'], "_");
        let marker = match normalized.as_str() {
            "albumin" | "alb" | "serum_albumin" => Biomarker::Albumin,
            "creatinine" | "creat" | "serum_creatinine" => Biomarker::Creatinine,
            "fasting_glucose" | "glucose" | "glucose_fasting" | "blood_glucose" => {
                Biomarker::FastingGlucose
            }
            "crp" | "c_reactive_protein" | "hs_crp" | "hscrp" => Biomarker::Crp,
            "lymphocyte_percent" | "lymphocytes" | "lymphocyte_pct" | "lymphocytes_pct"
            | "lymphocyte_%" | "lymphs" => Biomarker::LymphocytePercent,
            "mcv" | "mean_corpuscular_volume" => Biomarker::Mcv,
            "rdw" | "rdw_cv" | "red_cell_distribution_width" => Biomarker::Rdw,
            "alkaline_phosphatase" | "alp" | "alk_phos" | "alkphos" => {
                Biomarker::AlkalinePhosphatase
            }
            "wbc" | "white_blood_cells" | "white_blood_cell_count" | "leukocytes" => Biomarker::Wbc,
            "hba1c" | "a1c" | "hemoglobin_a1c" => Biomarker::Hba1c,
            "fasting_insulin" | "insulin" => Biomarker::FastingInsulin,
            "total_cholesterol" | "cholesterol" => Biomarker::TotalCholesterol,
            "ldl" | "ldl_c" | "ldl_cholesterol" => Biomarker::Ldl,
            "hdl" | "hdl_c" | "hdl_cholesterol" => Biomarker::Hdl,
            "triglycerides" | "tg" | "trigs" => Biomarker::Triglycerides,
            "alt" | "sgpt" => Biomarker::Alt,
            "ast" | "sgot" => Biomarker::Ast,
            "ggt" | "gamma_gt" => Biomarker::Ggt,
            "bun" | "urea_nitrogen" | "blood_urea_nitrogen" => Biomarker::Bun,
            "hemoglobin" | "hgb" | "haemoglobin" => Biomarker::Hemoglobin,
            "hematocrit" | "hct" => Biomarker::Hematocrit,
            "platelets" | "plt" | "platelet_count" => Biomarker::Platelets,
            "ferritin" => Biomarker::Ferritin,
            "vitamin_d" | "25_oh_vitamin_d" | "vitamin_d_25_oh" | "vit_d" => Biomarker::VitaminD,
            "vitamin_b12" | "b12" | "cobalamin" => Biomarker::VitaminB12,
            "tsh" => Biomarker::Tsh,
            "testosterone" | "total_testosterone" => Biomarker::Testosterone,
            _ => return Err(format!("Unknown biomarker: {}", s)),
        };
        Ok(marker)
    }
}

impl fmt::Display for Biomarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// Qualitative status of a marker value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStatus {
    Optimal,
    Normal,
    Warning,
    Critical,
}

impl MarkerStatus {
    /// Points used by the category summary score
    pub fn points(&self) -> f64 {
        match self {
            MarkerStatus::Optimal => 100.0,
            MarkerStatus::Normal => 80.0,
            MarkerStatus::Warning => 50.0,
            MarkerStatus::Critical => 20.0,
        }
    }
}

impl fmt::Display for MarkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerStatus::Optimal => write!(f, "Optimal"),
            MarkerStatus::Normal => write!(f, "Normal"),
            MarkerStatus::Warning => write!(f, "Warning"),
            MarkerStatus::Critical => write!(f, "Critical"),
        }
    }
}

/// Outcome of classifying a single value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerClassification {
    pub name: String,
    pub value: f64,
    pub status: MarkerStatus,
    pub message: String,
    /// Whether a definition was on file for this marker
    pub classified: bool,
}

/// Classify a value against an explicit definition
pub fn classify_with_definition(
    name: &str,
    value: f64,
    definition: &MarkerDefinition,
) -> MarkerClassification {
    let label = &definition.display_name;
    let unit = &definition.unit;
    let reference = definition.reference;

    let (status, message) = if definition.optimal.contains(value) {
        (
            MarkerStatus::Optimal,
            format!("{} is in the optimal range ({} {})", label, value, unit),
        )
    } else if reference.contains(value) {
        (
            MarkerStatus::Normal,
            format!(
                "{} is within the reference range but outside optimal ({} {}, optimal {}-{}){}",
                label,
                value,
                unit,
                definition.optimal.min,
                definition.optimal.max,
                definition.direction_hint(value)
            ),
        )
    } else if value < reference.min {
        let deviation = percent_deviation(reference.min - value, reference.min);
        let status = if deviation > CRITICAL_LOW_PCT {
            MarkerStatus::Critical
        } else {
            MarkerStatus::Warning
        };
        (
            status,
            format!(
                "{} is {:.0}% below the reference minimum ({} {}, reference {}-{})",
                label, deviation, value, unit, reference.min, reference.max
            ),
        )
    } else {
        let deviation = percent_deviation(value - reference.max, reference.max);
        let status = if deviation > CRITICAL_HIGH_PCT {
            MarkerStatus::Critical
        } else {
            MarkerStatus::Warning
        };
        (
            status,
            format!(
                "{} is {:.0}% above the reference maximum ({} {}, reference {}-{})",
                label, deviation, value, unit, reference.min, reference.max
            ),
        )
    };

    debug!(marker = name, value, status = ?status, "Classified biomarker");

    MarkerClassification {
        name: name.to_string(),
        value,
        status,
        message,
        classified: true,
    }
}

/// Classify a value by marker name, degrading to `Normal` for unknown names
pub fn classify(name: &str, value: f64) -> MarkerClassification {
    match Biomarker::from_name(name) {
        Some(marker) => {
            classify_with_definition(marker.canonical_name(), value, &marker.definition())
        }
        None => MarkerClassification {
            name: name.to_string(),
            value,
            status: MarkerStatus::Normal,
            message: format!("No reference range on file for '{}'; cannot classify", name),
            classified: false,
        },
    }
}

/// Classify every value of a panel
pub fn classify_panel(values: &[BiomarkerValue]) -> Vec<MarkerClassification> {
    values.iter().map(|v| classify(&v.name, v.value)).collect()
}

/// Count-weighted average of status points, rounded; `None` for an empty list
pub fn category_summary_score(classifications: &[MarkerClassification]) -> Option<u8> {
    if classifications.is_empty() {
        return None;
    }

    let total: f64 = classifications.iter().map(|c| c.status.points()).sum();
    Some((total / classifications.len() as f64).round() as u8)
}

/// Summary score of a panel grouped by marker category
pub fn summarize_by_category(values: &[BiomarkerValue]) -> BTreeMap<BiomarkerCategory, u8> {
    let mut grouped: BTreeMap<BiomarkerCategory, Vec<MarkerClassification>> = BTreeMap::new();
    for value in values {
        grouped
            .entry(value.category)
            .or_default()
            .push(classify(&value.name, value.value));
    }

    grouped
        .into_iter()
        .filter_map(|(category, items)| category_summary_score(&items).map(|s| (category, s)))
        .collect()
}

/// Relative deviation in percent, infinite when the bound itself is zero
fn percent_deviation(distance: f64, bound: f64) -> f64 {
    if bound.abs() <= f64::EPSILON {
        f64::INFINITY
    } else {
        distance / bound.abs() * 100.0
    }
}
