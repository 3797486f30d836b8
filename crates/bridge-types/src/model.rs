use std::collections::HashMap;

use crate::object::ObjectMeta;

/// One deployable model revision, as described by a single index blob.
///
/// Invariant (spec §3): `blobs` and `index.etag` are only ever updated
/// together, via [`Model::complete_load`]. A caller that wants to detect
/// "does the catalog already have the latest version of this index" reads
/// `index.etag` and compares it against the candidate object's etag from a
/// fresh LIST/STAT call; a mismatch forces a full reload, never a partial
/// patch of `blobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// Metadata of the index blob as of the last *successful* Load. For a
    /// model that has never successfully loaded, `index.etag` is empty so
    /// any candidate etag forces a load attempt.
    pub index: ObjectMeta,
    /// Directory prefix shared by every blob in `blobs`; uniquely names
    /// the model. Empty until the first successful load.
    pub base_dir: String,
    /// blob key -> blob metadata, as of the last successful Load.
    pub blobs: HashMap<String, ObjectMeta>,
}

impl Model {
    /// A freshly-discovered index key with no successful load yet: ETag
    /// cleared, no base directory, no blobs. `key` becomes `index.key`.
    pub fn pending(key: impl Into<String>) -> Self {
        Self {
            index: ObjectMeta {
                key: key.into(),
                etag: String::new(),
                size: 0,
                last_modified: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            },
            base_dir: String::new(),
            blobs: HashMap::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.index.key
    }

    pub fn stored_etag(&self) -> &str {
        &self.index.etag
    }

    /// Atomically replace the loaded state of this model after a
    /// successful Load (§4.4): the index ETag advances, the base
    /// directory is recorded, and the blob map is fully replaced. Called
    /// only after every referenced blob has been STATed successfully —
    /// never with a partial blob map.
    pub fn complete_load(&mut self, index: ObjectMeta, base_dir: String, blobs: HashMap<String, ObjectMeta>) {
        self.index = index;
        self.base_dir = base_dir;
        self.blobs = blobs;
    }

    /// Every blob in `blobs` is conceptually rooted under `base_dir`; this
    /// is enforced at load time (the loader refuses to build a `Model`
    /// whose rows disagree), so this is a cheap sanity check rather than a
    /// correctness gate.
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn pending_has_cleared_etag() {
        let m = Model::pending("index-X.csv");
        assert_eq!(m.key(), "index-X.csv");
        assert_eq!(m.stored_etag(), "");
        assert_eq!(m.blob_count(), 0);
    }

    #[test]
    fn complete_load_replaces_everything_together() {
        let mut m = Model::pending("index-X.csv");
        let mut blobs = HashMap::new();
        blobs.insert(
            "baseA/a.bin".to_string(),
            ObjectMeta::new("baseA/a.bin", "etag-a", 10, Utc::now()),
        );
        m.complete_load(
            ObjectMeta::new("index-X.csv", "etag-1", 42, Utc::now()),
            "baseA".to_string(),
            blobs,
        );
        assert_eq!(m.stored_etag(), "etag-1");
        assert_eq!(m.base_dir, "baseA");
        assert_eq!(m.blob_count(), 1);
    }
}
