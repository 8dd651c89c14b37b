//! Work naming.

use sha2::{Digest, Sha256};

use crate::NameError;

/// Number of hash bytes appended to a work name (hex encoded: 10 chars).
const HASH_BYTES: usize = 5;

/// Generates the name of the work that carries a workload.
///
/// The result depends only on the workload's kind, name and namespace, so a
/// workload produces the same work name in every execution space.
pub fn work_name(kind: &str, name: &str, namespace: &str) -> Result<String, NameError> {
    if kind.is_empty() {
        return Err(NameError::Empty("workload kind"));
    }
    if name.is_empty() {
        return Err(NameError::Empty("workload name"));
    }

    let key = if namespace.is_empty() {
        format!("{name}-{kind}")
    } else {
        format!("{namespace}-{name}-{kind}")
    }
    .to_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();

    Ok(format!("{}-{}", name, hex::encode(&digest[..HASH_BYTES])))
}
