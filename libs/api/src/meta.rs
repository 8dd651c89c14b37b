//! Object metadata shared by every stored resource.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Labels or an equality label selector.
pub type LabelSet = BTreeMap<String, String>;

/// Metadata of a stored resource.
///
/// `uid`, `resource_version` and `creation_timestamp` are assigned by the
/// store. Writers leave them untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: LabelSet,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    /// Create metadata with a name and namespace (empty for cluster scope).
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// `namespace/name`, or `name` for cluster-scoped objects.
    pub fn key(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }
}

/// Reference to the workload a binding schedules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{} {}", self.kind, self.name)
        } else {
            write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_key() {
        assert_eq!(ObjectMeta::new("rb", "default").key(), "default/rb");
        assert_eq!(ObjectMeta::new("crb", "").key(), "crb");
    }

    #[test]
    fn test_meta_omits_store_fields() {
        let json = serde_json::to_value(ObjectMeta::new("rb", "default")).unwrap();
        assert_eq!(json, serde_json::json!({"name": "rb", "namespace": "default"}));
    }

    #[test]
    fn test_reference_display() {
        let reference = ObjectReference {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            namespace: "default".to_string(),
            name: "nginx".to_string(),
        };
        assert_eq!(reference.to_string(), "Deployment default/nginx");
    }
}
