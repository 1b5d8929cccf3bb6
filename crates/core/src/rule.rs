use serde::{Deserialize, Serialize};

use crate::ids::{RuleId, TenantId};

/// Threshold comparator. Comparison is always against a finite `f64`;
/// `NaN` never matches any variant (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Comparator {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    /// Evaluate `sample <comparator> threshold`. Returns `false` whenever
    /// `sample` is `NaN`, regardless of comparator.
    #[must_use]
    pub fn evaluate(self, sample: f64, threshold: f64) -> bool {
        if sample.is_nan() {
            return false;
        }
        match self {
            Self::Gt => sample > threshold,
            Self::Gte => sample >= threshold,
            Self::Lt => sample < threshold,
            Self::Lte => sample <= threshold,
        }
    }
}

/// Severity carried through to alerts and delivery payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// A customer-defined threshold rule, keyed by `(tenant_id, rule_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub tenant_id: TenantId,
    pub rule_id: RuleId,
    pub metric_name: String,
    pub comparator: Comparator,
    pub threshold: f64,
    /// Device selector expression; matched against site/tag attributes.
    /// Module budget keeps this a flat glob-like string rather than a full
    /// predicate language — see [`crate::selector`].
    pub device_selector: String,
    pub severity: Severity,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_never_matches() {
        for cmp in [Comparator::Gt, Comparator::Gte, Comparator::Lt, Comparator::Lte] {
            assert!(!cmp.evaluate(f64::NAN, 10.0));
        }
    }

    #[test]
    fn threshold_edge_scenario() {
        // Scenario 5 from spec.md §8: temp_c > 50.
        let cmp = Comparator::Gt;
        assert!(!cmp.evaluate(49.9, 50.0));
        assert!(cmp.evaluate(50.1, 50.0));
        assert!(!cmp.evaluate(49.5, 50.0));
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }
}
