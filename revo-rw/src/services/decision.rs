//! Decision engine: analysis result → final disposition
//!
//! A pure function of (analysis, product, policy). The check order is
//! load-bearing: the confidence floor short-circuits before the
//! recommendation is ever inspected, so a low-confidence "approve" can
//! never auto-approve. Thresholds and the wear-based refund schedule come
//! from configuration, not code.

use crate::models::{AnalysisResult, Product, Recommendation, WearLevel};
use revo_common::config::DecisionPolicyConfig;
use revo_common::Result;
use serde::{Deserialize, Serialize};

/// Final automated disposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Approved,
    Rejected,
    Review,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Approved => write!(f, "approved"),
            Outcome::Rejected => write!(f, "rejected"),
            Outcome::Review => write!(f, "review"),
        }
    }
}

/// Decision with its audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub outcome: Outcome,
    pub refund_amount: Option<f64>,
    /// Machine-readable codes explaining how the outcome was reached
    pub reason_codes: Vec<String>,
}

/// Operator-tunable policy: thresholds plus the wear→refund table
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    low_confidence: f64,
    medium_confidence: f64,
    high_confidence: f64,
    refund_new: f64,
    refund_light: f64,
    refund_moderate: f64,
    refund_heavy: f64,
}

impl DecisionPolicy {
    pub fn from_config(config: &DecisionPolicyConfig) -> Self {
        Self {
            low_confidence: config.low_confidence,
            medium_confidence: config.medium_confidence,
            high_confidence: config.high_confidence,
            refund_new: config.refund_percent.new,
            refund_light: config.refund_percent.light,
            refund_moderate: config.refund_percent.moderate,
            refund_heavy: config.refund_percent.heavy,
        }
    }

    fn refund_fraction(&self, wear: WearLevel) -> f64 {
        match wear {
            WearLevel::New => self.refund_new,
            WearLevel::Light => self.refund_light,
            WearLevel::Moderate => self.refund_moderate,
            WearLevel::Heavy => self.refund_heavy,
        }
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::from_config(&DecisionPolicyConfig::default())
    }
}

/// Threshold-based decision engine
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    policy: DecisionPolicy,
}

impl DecisionEngine {
    pub fn new(policy: DecisionPolicy) -> Self {
        Self { policy }
    }

    /// Decide the disposition for a validated analysis result.
    ///
    /// Malformed results are rejected up front as `CorruptResult`; values
    /// are never silently defaulted.
    pub fn decide(&self, analysis: &AnalysisResult, product: &Product) -> Result<Decision> {
        analysis.validate()?;
        let p = &self.policy;
        let mut reason_codes = Vec::new();

        // Confidence floor dominates everything else.
        if analysis.confidence < p.low_confidence {
            reason_codes.push(format!(
                "confidence_below_floor:{:.2}<{:.2}",
                analysis.confidence, p.low_confidence
            ));
            return Ok(Decision {
                outcome: Outcome::Review,
                refund_amount: None,
                reason_codes,
            });
        }

        if analysis.recommendation == Recommendation::Reject
            && analysis.confidence >= p.medium_confidence
        {
            reason_codes.push("reject_recommended".to_string());
            reason_codes.push(format!(
                "confidence_at_least_medium:{:.2}",
                analysis.confidence
            ));
            if !analysis.fraud_check.suspicious_indicators.is_empty() {
                reason_codes.push(format!(
                    "suspicious_indicators:{}",
                    analysis.fraud_check.suspicious_indicators.join(",")
                ));
            }
            return Ok(Decision {
                outcome: Outcome::Rejected,
                refund_amount: None,
                reason_codes,
            });
        }

        if analysis.recommendation == Recommendation::Approve
            && analysis.confidence >= p.high_confidence
            && analysis.fraud_check.is_original_item
        {
            let wear = analysis.wear_level.level;
            let fraction = p.refund_fraction(wear);
            let refund = round_cents(product.price * fraction);
            reason_codes.push("approve_recommended".to_string());
            reason_codes.push(format!("confidence_at_least_high:{:.2}", analysis.confidence));
            reason_codes.push("item_verified_original".to_string());
            reason_codes.push(format!("wear_{:?}_refund_{:.0}pct", wear, fraction * 100.0));
            return Ok(Decision {
                outcome: Outcome::Approved,
                refund_amount: Some(refund),
                reason_codes,
            });
        }

        // Everything else needs a human.
        reason_codes.push(match analysis.recommendation {
            Recommendation::Review => "review_recommended".to_string(),
            Recommendation::Reject => "reject_below_medium_confidence".to_string(),
            Recommendation::Approve if !analysis.fraud_check.is_original_item => {
                "approve_blocked_fraud_check".to_string()
            }
            Recommendation::Approve => "approve_below_high_confidence".to_string(),
        });
        Ok(Decision {
            outcome: Outcome::Review,
            refund_amount: None,
            reason_codes,
        })
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_fixtures::{analysis, product_priced};
    use revo_common::Error;

    #[test]
    fn high_confidence_approve_refunds_by_wear_table() {
        let engine = DecisionEngine::default();
        let result = analysis(0.85, Recommendation::Approve, WearLevel::Moderate, true);

        let decision = engine.decide(&result, &product_priced(100.0)).unwrap();
        assert_eq!(decision.outcome, Outcome::Approved);
        assert_eq!(decision.refund_amount, Some(75.0));
    }

    #[test]
    fn refund_table_covers_every_wear_level() {
        let engine = DecisionEngine::default();
        let expected = [
            (WearLevel::New, 100.0),
            (WearLevel::Light, 90.0),
            (WearLevel::Moderate, 75.0),
            (WearLevel::Heavy, 50.0),
        ];
        for (wear, refund) in expected {
            let result = analysis(0.9, Recommendation::Approve, wear, true);
            let decision = engine.decide(&result, &product_priced(100.0)).unwrap();
            assert_eq!(decision.refund_amount, Some(refund), "wear {:?}", wear);
        }
    }

    #[test]
    fn reject_below_medium_confidence_goes_to_review() {
        let engine = DecisionEngine::default();
        let result = analysis(0.5, Recommendation::Reject, WearLevel::Light, true);

        let decision = engine.decide(&result, &product_priced(100.0)).unwrap();
        assert_eq!(decision.outcome, Outcome::Review);
        assert!(decision.refund_amount.is_none());
    }

    #[test]
    fn reject_at_medium_confidence_is_rejected() {
        let engine = DecisionEngine::default();
        let result = analysis(0.6, Recommendation::Reject, WearLevel::Light, true);

        let decision = engine.decide(&result, &product_priced(100.0)).unwrap();
        assert_eq!(decision.outcome, Outcome::Rejected);
    }

    #[test]
    fn confidence_floor_dominates_every_recommendation() {
        let engine = DecisionEngine::default();
        for recommendation in [
            Recommendation::Approve,
            Recommendation::Reject,
            Recommendation::Review,
        ] {
            for is_original in [true, false] {
                let result = analysis(0.39, recommendation, WearLevel::New, is_original);
                let decision = engine.decide(&result, &product_priced(50.0)).unwrap();
                assert_eq!(
                    decision.outcome,
                    Outcome::Review,
                    "recommendation {:?} original {}",
                    recommendation,
                    is_original
                );
            }
        }
    }

    #[test]
    fn approve_without_original_item_never_auto_approves() {
        let engine = DecisionEngine::default();
        let result = analysis(0.95, Recommendation::Approve, WearLevel::New, false);

        let decision = engine.decide(&result, &product_priced(100.0)).unwrap();
        assert_eq!(decision.outcome, Outcome::Review);
        assert!(decision
            .reason_codes
            .iter()
            .any(|c| c == "approve_blocked_fraud_check"));
    }

    #[test]
    fn approve_below_high_confidence_goes_to_review() {
        let engine = DecisionEngine::default();
        let result = analysis(0.7, Recommendation::Approve, WearLevel::New, true);

        let decision = engine.decide(&result, &product_priced(100.0)).unwrap();
        assert_eq!(decision.outcome, Outcome::Review);
    }

    #[test]
    fn decision_is_deterministic() {
        let engine = DecisionEngine::default();
        let result = analysis(0.85, Recommendation::Approve, WearLevel::Light, true);
        let product = product_priced(59.99);

        let first = engine.decide(&result, &product).unwrap();
        let second = engine.decide(&result, &product).unwrap();
        assert_eq!(first.outcome, second.outcome);
        assert_eq!(first.refund_amount, second.refund_amount);
        assert_eq!(first.reason_codes, second.reason_codes);
    }

    #[test]
    fn refunds_round_to_cents() {
        let engine = DecisionEngine::default();
        let result = analysis(0.9, Recommendation::Approve, WearLevel::Light, true);

        let decision = engine.decide(&result, &product_priced(33.33)).unwrap();
        // 33.33 * 0.9 = 29.997 → 30.00
        assert_eq!(decision.refund_amount, Some(30.0));
    }

    #[test]
    fn corrupt_result_is_fatal_not_defaulted() {
        let engine = DecisionEngine::default();
        let result = analysis(1.7, Recommendation::Approve, WearLevel::New, true);

        let err = engine.decide(&result, &product_priced(100.0)).unwrap_err();
        assert!(matches!(err, Error::CorruptResult(_)));
    }

    #[test]
    fn custom_policy_table_is_honored() {
        let mut config = DecisionPolicyConfig::default();
        config.refund_percent.moderate = 0.6;
        config.high_confidence = 0.7;
        let engine = DecisionEngine::new(DecisionPolicy::from_config(&config));

        let result = analysis(0.75, Recommendation::Approve, WearLevel::Moderate, true);
        let decision = engine.decide(&result, &product_priced(100.0)).unwrap();
        assert_eq!(decision.outcome, Outcome::Approved);
        assert_eq!(decision.refund_amount, Some(60.0));
    }
}
