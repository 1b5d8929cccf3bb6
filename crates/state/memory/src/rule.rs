use async_trait::async_trait;
use opspulse_core::{AlertRule, RuleId, TenantId};
use opspulse_state::{AlertRuleStore, StateError};

use crate::backend::MemoryBackend;

#[async_trait]
impl AlertRuleStore for MemoryBackend {
    async fn get(&self, tenant_id: &TenantId, rule_id: &RuleId) -> Result<Option<AlertRule>, StateError> {
        Ok(self
            .rules
            .get(&(tenant_id.clone(), rule_id.clone()))
            .map(|r| r.value().clone()))
    }

    async fn list_enabled(&self, tenant_id: &TenantId) -> Result<Vec<AlertRule>, StateError> {
        let mut rules: Vec<AlertRule> = self
            .rules
            .iter()
            .filter(|r| &r.key().0 == tenant_id && r.value().enabled)
            .map(|r| r.value().clone())
            .collect();
        rules.sort_by(|a, b| a.rule_id.as_str().cmp(b.rule_id.as_str()));
        Ok(rules)
    }

    async fn upsert(&self, rule: AlertRule) -> Result<(), StateError> {
        self.rules.insert((rule.tenant_id.clone(), rule.rule_id.clone()), rule);
        Ok(())
    }
}
