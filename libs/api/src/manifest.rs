//! Generic workload manifests.
//!
//! A workload is kept as the document it was read as. The materializer only
//! touches identity, labels and `spec.replicas`, each through an explicit
//! accessor below.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{LabelSet, ManifestError, ObjectReference};

/// A workload manifest of any kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Workload(Value);

impl Workload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn api_version(&self) -> &str {
        self.str_at(&["apiVersion"])
    }

    pub fn kind(&self) -> &str {
        self.str_at(&["kind"])
    }

    pub fn name(&self) -> &str {
        self.str_at(&["metadata", "name"])
    }

    pub fn namespace(&self) -> &str {
        self.str_at(&["metadata", "namespace"])
    }

    /// String-valued labels; malformed entries are ignored.
    pub fn labels(&self) -> LabelSet {
        self.nested(&["metadata", "labels"])
            .and_then(Value::as_object)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reference identifying this workload.
    pub fn reference(&self) -> ObjectReference {
        ObjectReference {
            api_version: self.api_version().to_string(),
            kind: self.kind().to_string(),
            namespace: self.namespace().to_string(),
            name: self.name().to_string(),
        }
    }

    /// Set one label, creating `metadata.labels` when missing.
    pub fn merge_label(&mut self, key: &str, value: &str) -> Result<(), ManifestError> {
        self.set_nested_field(&["metadata", "labels", key], Value::String(value.to_string()))
    }

    /// Value at `path`, or `None` when any segment is missing.
    pub fn nested(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(&self.0, |value, key| value.get(*key))
    }

    /// Integer at `path`.
    ///
    /// Returns `Ok(None)` when the field is absent and an error when it is
    /// present with a non-integer value. Floats with no fractional part
    /// (`3.0`) are read as integers.
    pub fn nested_i64(&self, path: &[&str]) -> Result<Option<i64>, ManifestError> {
        match self.nested(path) {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .or_else(|| value.as_f64().and_then(integral_f64))
                .map(Some)
                .ok_or_else(|| ManifestError::FieldTypeMismatch {
                    path: path.join("."),
                    expected: "an integer",
                }),
        }
    }

    /// Set the value at `path`, creating missing parent objects.
    pub fn set_nested_field(&mut self, path: &[&str], value: Value) -> Result<(), ManifestError> {
        let Some((last, parents)) = path.split_last() else {
            self.0 = value;
            return Ok(());
        };

        let mut current = &mut self.0;
        for (depth, key) in parents.iter().enumerate() {
            let map = as_object_mut(current, path, depth)?;
            current = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        as_object_mut(current, path, parents.len())?.insert(last.to_string(), value);
        Ok(())
    }

    fn str_at(&self, path: &[&str]) -> &str {
        self.nested(path).and_then(Value::as_str).unwrap_or_default()
    }
}

fn integral_f64(value: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then_some(value as i64)
}

fn as_object_mut<'a>(
    value: &'a mut Value,
    path: &[&str],
    depth: usize,
) -> Result<&'a mut Map<String, Value>, ManifestError> {
    if value.is_null() {
        *value = Value::Object(Map::new());
    }
    value.as_object_mut().ok_or_else(|| ManifestError::NotAnObject {
        path: path.join("."),
        parent: if depth == 0 {
            "<root>".to_string()
        } else {
            path[..depth].join(".")
        },
    })
}

impl From<Value> for Workload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deployment() -> Workload {
        Workload::new(json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {"name": "nginx", "namespace": "default", "labels": {"app": "nginx"}},
            "spec": {"replicas": 3}
        }))
    }

    #[test]
    fn test_identity_accessors() {
        let workload = deployment();
        assert_eq!(workload.api_version(), "apps/v1");
        assert_eq!(workload.kind(), "Deployment");
        assert_eq!(workload.name(), "nginx");
        assert_eq!(workload.namespace(), "default");
        assert_eq!(workload.labels().get("app").map(String::as_str), Some("nginx"));
    }

    #[test]
    fn test_nested_i64() {
        let workload = deployment();
        assert_eq!(workload.nested_i64(&["spec", "replicas"]).unwrap(), Some(3));
        assert_eq!(workload.nested_i64(&["spec", "paused"]).unwrap(), None);
    }

    #[test]
    fn test_nested_i64_type_mismatch() {
        let workload = Workload::new(json!({"spec": {"replicas": "three"}}));
        assert!(matches!(
            workload.nested_i64(&["spec", "replicas"]),
            Err(ManifestError::FieldTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_nested_i64_integral_float() {
        let workload = Workload::new(json!({"spec": {"replicas": 3.0}}));
        assert_eq!(workload.nested_i64(&["spec", "replicas"]).unwrap(), Some(3));

        let workload = Workload::new(json!({"spec": {"replicas": 2.5}}));
        assert!(workload.nested_i64(&["spec", "replicas"]).is_err());

        let workload = Workload::new(json!({"spec": {"replicas": 1e300}}));
        assert!(workload.nested_i64(&["spec", "replicas"]).is_err());
    }

    #[test]
    fn test_set_nested_field_creates_parents() {
        let mut workload = Workload::new(json!({"kind": "ConfigMap"}));
        workload.merge_label("team", "infra").unwrap();
        assert_eq!(workload.labels().get("team").map(String::as_str), Some("infra"));
    }

    #[test]
    fn test_set_nested_field_rejects_scalar_parent() {
        let mut workload = Workload::new(json!({"spec": 1}));
        let err = workload
            .set_nested_field(&["spec", "replicas"], json!(2))
            .unwrap_err();
        assert_eq!(
            err,
            ManifestError::NotAnObject {
                path: "spec.replicas".to_string(),
                parent: "spec".to_string()
            }
        );
    }

    #[test]
    fn test_reference() {
        let reference = deployment().reference();
        assert_eq!(reference.kind, "Deployment");
        assert_eq!(reference.namespace, "default");
    }
}
