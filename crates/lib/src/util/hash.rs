//! Content hashing for resolved specs and compiled plans.
//!
//! Any serializable value gets a short, stable identifier by hashing its JSON
//! form. Types that already carry a content hash override
//! [`Hashable::compute_hash`] to return it. Maps in hashed values are `BTreeMap`s so the serialization, and
//! therefore the hash, does not depend on insertion order.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::OBJ_HASH_PREFIX_LEN;

pub type HashError = serde_json::Error;

/// A truncated SHA-256 of a value's JSON serialization.
///
/// The hash is a lowercase hexadecimal string, e.g. `"a1b2c3d4e5f6789012ab"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHash(pub String);

impl std::fmt::Display for ObjectHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Truncated SHA-256 of raw bytes.
pub fn digest(bytes: &[u8]) -> ObjectHash {
  let mut hasher = Sha256::new();
  hasher.update(bytes);
  let full = format!("{:x}", hasher.finalize());
  ObjectHash(full[..OBJ_HASH_PREFIX_LEN].to_string())
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<ObjectHash, HashError> {
    let serialized = serde_json::to_string(self)?;
    Ok(digest(serialized.as_bytes()))
  }
}
