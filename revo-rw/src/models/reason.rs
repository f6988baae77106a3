//! Return reason catalog
//!
//! Static reference data loaded once at startup and never mutated. Each
//! reason carries the analysis focus hints and the ordered photo checklist
//! that seeds a return's evidence set at reason-selection time.

use crate::models::evidence::CaptureTarget;
use revo_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// One photo step in a reason's capture checklist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoStep {
    /// Stable identifier, unique within the reason
    pub id: String,
    pub title: String,
    pub instruction: String,
    pub target: CaptureTarget,
    pub required: bool,
}

impl PhotoStep {
    fn new(id: &str, title: &str, instruction: &str, target: CaptureTarget, required: bool) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            instruction: instruction.to_string(),
            target,
            required,
        }
    }
}

/// Catalog entry: why the customer is returning the product
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnReason {
    pub id: String,
    pub title: String,
    pub description: String,
    /// What the automated analysis should focus on for this reason
    pub analysis_focus: Vec<String>,
    pub requires_photos: bool,
    /// Ordered capture checklist; order is advisory for the UI
    pub photo_steps: Vec<PhotoStep>,
}

impl ReturnReason {
    pub fn required_step_count(&self) -> usize {
        self.photo_steps.iter().filter(|s| s.required).count()
    }
}

/// Immutable reason catalog, built once at process start
#[derive(Debug, Clone)]
pub struct ReasonCatalog {
    reasons: Vec<ReturnReason>,
}

impl ReasonCatalog {
    /// The built-in retail return reason catalog.
    pub fn builtin() -> Self {
        use CaptureTarget::*;

        let reasons = vec![
            ReturnReason {
                id: "damaged".to_string(),
                title: "Damaged Item".to_string(),
                description: "Product arrived damaged or broke during use".to_string(),
                analysis_focus: strings(&["cracks", "dents", "scratches", "holes"]),
                requires_photos: true,
                photo_steps: vec![
                    PhotoStep::new(
                        "overview",
                        "Overall View",
                        "Include overall product view",
                        Overview,
                        true,
                    ),
                    PhotoStep::new(
                        "damage",
                        "Damage Focus",
                        "Take clear photos of all damage",
                        Damage,
                        true,
                    ),
                    PhotoStep::new(
                        "closeup",
                        "Damage Close-up",
                        "Show close-ups of affected areas",
                        Closeup,
                        true,
                    ),
                    PhotoStep::new(
                        "label",
                        "Product Label",
                        "Capture the product label if visible",
                        Label,
                        false,
                    ),
                ],
            },
            ReturnReason {
                id: "defective".to_string(),
                title: "Defective/Not Working".to_string(),
                description: "Product does not function as expected".to_string(),
                analysis_focus: strings(&["functionality", "missing_parts", "assembly_issues"]),
                requires_photos: true,
                photo_steps: vec![
                    PhotoStep::new(
                        "defect",
                        "Defective Part",
                        "Show the defective part clearly",
                        Damage,
                        true,
                    ),
                    PhotoStep::new(
                        "overview",
                        "All Components",
                        "Include all product components",
                        Overview,
                        true,
                    ),
                    PhotoStep::new(
                        "closeup",
                        "Issue Demonstration",
                        "Demonstrate the issue if possible",
                        Closeup,
                        false,
                    ),
                ],
            },
            ReturnReason {
                id: "wrong_size".to_string(),
                title: "Wrong Size".to_string(),
                description: "Item is too big, too small, or incorrect size".to_string(),
                analysis_focus: strings(&["size_verification", "label_check"]),
                requires_photos: true,
                photo_steps: vec![
                    PhotoStep::new(
                        "label",
                        "Size Label",
                        "Show size label clearly",
                        Label,
                        true,
                    ),
                    PhotoStep::new(
                        "overview",
                        "Overall View",
                        "Include overall product view",
                        Overview,
                        true,
                    ),
                ],
            },
            ReturnReason {
                id: "color_faded".to_string(),
                title: "Color Faded/Wrong Color".to_string(),
                description: "Color is different from description or faded".to_string(),
                analysis_focus: strings(&["color_analysis", "fading_detection"]),
                requires_photos: true,
                photo_steps: vec![
                    PhotoStep::new(
                        "overview",
                        "Overall View",
                        "Include good lighting photos",
                        Overview,
                        true,
                    ),
                    PhotoStep::new(
                        "closeup",
                        "Color Variation",
                        "Show color variation clearly",
                        Closeup,
                        true,
                    ),
                    PhotoStep::new(
                        "label",
                        "Product Label",
                        "Capture the care/color label",
                        Label,
                        false,
                    ),
                ],
            },
            ReturnReason {
                id: "not_as_described".to_string(),
                title: "Not as Described".to_string(),
                description: "Product does not match the description".to_string(),
                analysis_focus: strings(&["feature_verification", "description_match"]),
                requires_photos: true,
                photo_steps: vec![
                    PhotoStep::new(
                        "overview",
                        "Overall View",
                        "Show discrepancy clearly",
                        Overview,
                        true,
                    ),
                    PhotoStep::new(
                        "label",
                        "Product Labels",
                        "Include product labels",
                        Label,
                        true,
                    ),
                    PhotoStep::new(
                        "closeup",
                        "Missing Features",
                        "Document missing features",
                        Closeup,
                        false,
                    ),
                ],
            },
            ReturnReason {
                id: "quality_issues".to_string(),
                title: "Poor Quality".to_string(),
                description: "Product quality is below expectations".to_string(),
                analysis_focus: strings(&["quality_assessment", "wear_detection"]),
                requires_photos: true,
                photo_steps: vec![
                    PhotoStep::new(
                        "overview",
                        "Overall View",
                        "Include overall product view",
                        Overview,
                        true,
                    ),
                    PhotoStep::new(
                        "closeup",
                        "Quality Issues",
                        "Show quality issues clearly",
                        Closeup,
                        true,
                    ),
                    PhotoStep::new(
                        "damage",
                        "Material Defects",
                        "Include material defects",
                        Damage,
                        false,
                    ),
                ],
            },
            ReturnReason {
                id: "changed_mind".to_string(),
                title: "Changed Mind".to_string(),
                description: "No longer need this item".to_string(),
                analysis_focus: strings(&["condition_check", "wear_assessment"]),
                requires_photos: true,
                photo_steps: vec![
                    PhotoStep::new(
                        "overview",
                        "Original Condition",
                        "Show item in original condition",
                        Overview,
                        true,
                    ),
                    PhotoStep::new(
                        "label",
                        "Original Packaging",
                        "Include all original packaging",
                        Label,
                        false,
                    ),
                    PhotoStep::new(
                        "closeup",
                        "Minimal Use",
                        "Demonstrate minimal use",
                        Closeup,
                        false,
                    ),
                ],
            },
        ];

        Self { reasons }
    }

    /// Look up a reason by id.
    pub fn get(&self, reason_id: &str) -> Result<&ReturnReason> {
        self.reasons
            .iter()
            .find(|r| r.id == reason_id)
            .ok_or_else(|| Error::NotFound(format!("Unknown return reason: {}", reason_id)))
    }

    /// All reasons in catalog order.
    pub fn all(&self) -> &[ReturnReason] {
        &self.reasons
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
