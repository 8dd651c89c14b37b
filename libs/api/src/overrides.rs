//! Records of override policies applied to a workload.

use serde::{Deserialize, Serialize};

/// One applied override policy and what it changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverridePolicyShadow {
    pub policy_name: String,
    pub overriders: serde_json::Value,
}

/// Override policies applied to a workload, in application order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppliedOverrides(Vec<OverridePolicyShadow>);

impl AppliedOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, policy_name: impl Into<String>, overriders: serde_json::Value) {
        self.0.push(OverridePolicyShadow {
            policy_name: policy_name.into(),
            overriders,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn policies(&self) -> &[OverridePolicyShadow] {
        &self.0
    }

    /// JSON form stored in annotations, `None` when nothing was applied.
    pub fn to_annotation(&self) -> Result<Option<String>, serde_json::Error> {
        if self.0.is_empty() {
            return Ok(None);
        }
        serde_json::to_string(&self.0).map(Some)
    }
}
