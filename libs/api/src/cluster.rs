//! Member cluster resource.

use serde::{Deserialize, Serialize};

use crate::{LabelSet, ObjectMeta};

/// A member cluster. Only its name and labels matter to weight rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub metadata: ObjectMeta,
}

impl Cluster {
    /// Create a cluster with the given labels.
    pub fn new(name: impl Into<String>, labels: LabelSet) -> Self {
        let mut metadata = ObjectMeta::new(name, "");
        metadata.labels = labels;
        Self { metadata }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}
