//! Rule selection and ordering for the evaluator's tick loop (spec.md §4.4
//! "Threshold rule evaluation").
//!
//! This crate holds no state of its own: it takes a rule plus the already
//! loaded device/sample snapshot for a tick and produces a deterministically
//! ordered plan the evaluator executes against `AlertStore`.

use chrono::{DateTime, Utc};
use opspulse_core::{AlertRule, DeviceId, DeviceRegistryEntry, DeviceSelector, MetricValue};
use opspulse_state::LatestSample;

/// One `(device, rule)` pair and the verdict for this tick.
#[derive(Debug, Clone)]
pub struct RuleEvaluation {
    pub device_id: DeviceId,
    pub rule: AlertRule,
    pub sample_value: Option<MetricValue>,
    pub observed_at: Option<DateTime<Utc>>,
    pub matched: bool,
}

/// Evaluate one rule against every device it selects, using the tick's
/// latest-sample snapshot for the rule's metric.
///
/// A device with no sample for the metric evaluates to `matched = false`
/// (spec.md §4.4: "NaN/missing samples: treated as non-matching").
#[must_use]
pub fn evaluate_rule(
    rule: &AlertRule,
    selector: &DeviceSelector,
    devices: &[DeviceRegistryEntry],
    samples: &[LatestSample],
) -> Vec<RuleEvaluation> {
    devices
        .iter()
        .filter(|device| selector.matches(device))
        .map(|device| {
            let sample = samples.iter().find(|s| s.device_id == device.device_id);
            let matched = sample
                .map(|s| rule.comparator.evaluate(s.value.as_f64(), rule.threshold))
                .unwrap_or(false);
            RuleEvaluation {
                device_id: device.device_id.clone(),
                rule: rule.clone(),
                sample_value: sample.map(|s| s.value),
                observed_at: sample.map(|s| s.observed_at),
                matched,
            }
        })
        .collect()
}

/// Order a tick's evaluations for deterministic processing: newest sample
/// timestamp first, ties broken by ascending `rule_id` (spec.md §4.4
/// "Tie-break for simultaneous edges"). Evaluations with no sample sort
/// last within their rule_id group.
pub fn order_evaluations(mut evaluations: Vec<RuleEvaluation>) -> Vec<RuleEvaluation> {
    evaluations.sort_by(|a, b| {
        b.observed_at
            .cmp(&a.observed_at)
            .then_with(|| a.rule.rule_id.as_str().cmp(b.rule.rule_id.as_str()))
    });
    evaluations
}
