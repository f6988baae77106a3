//! Automated analysis result returned by the verification backend
//!
//! Produced once per submission and immutable after creation. All score
//! fields are expected in [0,1]; `validate` rejects anything else as a
//! corrupt payload rather than silently defaulting.

use revo_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Recommendation issued by the backend analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Approve,
    Reject,
    Review,
}

/// Defect categories the analysis can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefectType {
    Hole,
    Stain,
    Crack,
    Fade,
    Tear,
    Scratch,
    Dent,
}

/// Severity of a single defect finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

/// Normalized bounding region of a finding within the photo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One detected defect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectFinding {
    #[serde(rename = "type")]
    pub defect_type: DefectType,
    pub confidence: f64,
    pub location: BoundingRegion,
    pub severity: Severity,
}

/// Counterfeit / item-substitution check
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudCheck {
    pub is_original_item: bool,
    pub confidence: f64,
    #[serde(default)]
    pub matched_features: Vec<String>,
    #[serde(default)]
    pub suspicious_indicators: Vec<String>,
}

/// Assessed wear level of the returned item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WearLevel {
    New,
    Light,
    Moderate,
    Heavy,
}

/// Wear assessment with supporting detail notes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WearAssessment {
    pub level: WearLevel,
    pub score: f64,
    #[serde(default)]
    pub details: Vec<String>,
}

/// Full analysis result for one submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Overall condition score [0,1]
    pub overall_score: f64,
    /// Confidence of the whole assessment [0,1]
    pub confidence: f64,
    #[serde(default)]
    pub defects_found: Vec<DefectFinding>,
    pub fraud_check: FraudCheck,
    pub wear_level: WearAssessment,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub reasoning: String,
}

impl AnalysisResult {
    /// Reject malformed payloads before any decision is taken.
    ///
    /// A result with out-of-range sub-scores is fatal for the submission:
    /// the caller must resubmit, never decide on defaulted values.
    pub fn validate(&self) -> Result<()> {
        check_unit_range("overallScore", self.overall_score)?;
        check_unit_range("confidence", self.confidence)?;
        check_unit_range("fraudCheck.confidence", self.fraud_check.confidence)?;
        check_unit_range("wearLevel.score", self.wear_level.score)?;
        for (i, defect) in self.defects_found.iter().enumerate() {
            check_unit_range(&format!("defectsFound[{}].confidence", i), defect.confidence)?;
        }
        Ok(())
    }
}

fn check_unit_range(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(Error::CorruptResult(format!(
            "{} out of range [0,1]: {}",
            field, value
        )));
    }
    Ok(())
}
