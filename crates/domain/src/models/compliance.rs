//! Compliance evaluation models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of evaluating one compliance rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    /// The rule itself could not be evaluated.
    Error,
}

/// Evaluation of a single compliance rule against device facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluation {
    pub rule_id: Uuid,
    pub rule_name: String,
    pub status: ComplianceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Compliance report for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceComplianceReport {
    pub device_id: Uuid,
    pub overall: ComplianceStatus,
    pub rules: Vec<RuleEvaluation>,
}

impl DeviceComplianceReport {
    /// Non-compliance dominates errors; no rules at all counts as compliant.
    pub fn new(device_id: Uuid, rules: Vec<RuleEvaluation>) -> Self {
        let overall = if rules.iter().any(|r| r.status == ComplianceStatus::NonCompliant) {
            ComplianceStatus::NonCompliant
        } else if rules.iter().any(|r| r.status == ComplianceStatus::Error) {
            ComplianceStatus::Error
        } else {
            ComplianceStatus::Compliant
        };
        Self {
            device_id,
            overall,
            rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation(status: ComplianceStatus) -> RuleEvaluation {
        RuleEvaluation {
            rule_id: Uuid::new_v4(),
            rule_name: "rule".to_string(),
            status,
            failed_field: None,
            message: None,
        }
    }

    #[test]
    fn test_overall_status() {
        let device = Uuid::new_v4();
        assert_eq!(DeviceComplianceReport::new(device, vec![]).overall, ComplianceStatus::Compliant);
        assert_eq!(
            DeviceComplianceReport::new(
                device,
                vec![evaluation(ComplianceStatus::Error), evaluation(ComplianceStatus::Compliant)]
            )
            .overall,
            ComplianceStatus::Error
        );
        assert_eq!(
            DeviceComplianceReport::new(
                device,
                vec![evaluation(ComplianceStatus::Error), evaluation(ComplianceStatus::NonCompliant)]
            )
            .overall,
            ComplianceStatus::NonCompliant
        );
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ComplianceStatus::NonCompliant).unwrap(),
            "\"non_compliant\""
        );
    }
}
