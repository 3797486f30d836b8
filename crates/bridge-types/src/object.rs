use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque descriptor for a stored object, as returned by a LIST or STAT
/// call against the object store. `etag` is treated as an opaque version
/// token — we never interpret its contents, only compare it for equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub key: String,
    pub etag: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

impl ObjectMeta {
    pub fn new(key: impl Into<String>, etag: impl Into<String>, size: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            etag: etag.into(),
            size,
            last_modified,
        }
    }
}
