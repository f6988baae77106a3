//! Domain models for the return workflow

pub mod analysis;
pub mod evidence;
pub mod product;
pub mod reason;
pub mod return_process;

pub use analysis::{AnalysisResult, Recommendation, WearLevel};
pub use evidence::{CaptureTarget, EvidenceItem, EvidenceStatus};
pub use product::{Product, PurchaseCondition};
pub use reason::{PhotoStep, ReasonCatalog, ReturnReason};
pub use return_process::{ReturnProcess, ReturnState, StateTransition};
