//! Execution space naming.
//!
//! Each member cluster owns one execution space. Works destined for that
//! cluster are stored there, so the cluster can be recovered from a work's
//! namespace alone.

use crate::NameError;

/// Prefix shared by every execution space.
pub const EXECUTION_SPACE_PREFIX: &str = "fanout-es-";

/// Maximum length of a namespace name (DNS-1123 label).
const MAX_NAMESPACE_LEN: usize = 63;

/// Generates the execution space name for a cluster.
pub fn execution_space_name(cluster_name: &str) -> Result<String, NameError> {
    if cluster_name.is_empty() {
        return Err(NameError::Empty("cluster name"));
    }

    let space = format!("{EXECUTION_SPACE_PREFIX}{cluster_name}");
    if space.len() > MAX_NAMESPACE_LEN {
        return Err(NameError::InvalidFormat {
            name: space,
            message: format!("must be no more than {MAX_NAMESPACE_LEN} characters"),
        });
    }

    Ok(space)
}

/// Derives the cluster name from an execution space name.
pub fn cluster_name_from_execution_space(space: &str) -> Result<String, NameError> {
    if space.is_empty() {
        return Err(NameError::Empty("execution space"));
    }

    let Some(cluster) = space.strip_prefix(EXECUTION_SPACE_PREFIX) else {
        return Err(NameError::MissingPrefix {
            expected: EXECUTION_SPACE_PREFIX,
            actual: space.to_string(),
        });
    };

    if cluster.is_empty() {
        return Err(NameError::Empty("cluster name"));
    }

    Ok(cluster.to_string())
}
