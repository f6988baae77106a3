//! Product record resolved from a scanned identifier
//!
//! Products are fetched once from the backend and treated as read-only
//! afterwards. Field names follow the backend wire format (camelCase).

use serde::{Deserialize, Serialize};

/// Condition of the product at purchase time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseCondition {
    New,
    Used,
    Damaged,
}

/// Product resolved from a scanned barcode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub category: String,
    pub price: f64,
    /// Canonical eligibility field name (the legacy `eligible` spelling is
    /// accepted on input for backward compatibility)
    #[serde(alias = "eligible")]
    pub return_eligible: bool,
    /// Return window in days from the purchase date
    #[serde(alias = "returnWindowDays")]
    pub return_window: u32,
    pub condition: PurchaseCondition,
    #[serde(default)]
    pub purchase_date: Option<String>,
    #[serde(default)]
    pub order_number: Option<String>,
}
