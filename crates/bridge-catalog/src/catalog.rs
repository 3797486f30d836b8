use std::collections::{HashMap, HashSet};

use bridge_types::{Endpoint, Model};
use parking_lot::Mutex;

/// The single in-memory record of every model known to every configured
/// endpoint (§4.5). One mutex guards the whole two-level map; callers never
/// see a torn read across the endpoint and key levels.
#[derive(Default)]
pub struct Catalog {
    inner: Mutex<HashMap<Endpoint, HashMap<String, Model>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `model` under `(endpoint, key)`, overwriting whatever was
    /// there.
    pub fn add(&self, endpoint: Endpoint, key: impl Into<String>, model: Model) {
        self.inner.lock().entry(endpoint).or_default().insert(key.into(), model);
    }

    /// Returns a clone of the model at `(endpoint, key)`, if present. The
    /// catalog's own copy is never handed out by reference — a caller that
    /// wants to publish a change must go back through [`Catalog::add`] or
    /// [`Catalog::set_etag`].
    pub fn get(&self, endpoint: &Endpoint, key: &str) -> Option<Model> {
        self.inner.lock().get(endpoint).and_then(|keys| keys.get(key)).cloned()
    }

    /// Atomic ETag update; a no-op if the entry is absent (§4.5).
    pub fn set_etag(&self, endpoint: &Endpoint, key: &str, etag: impl Into<String>) {
        if let Some(model) = self.inner.lock().get_mut(endpoint).and_then(|keys| keys.get_mut(key)) {
            model.index.etag = etag.into();
        }
    }

    /// Removes every entry at `endpoint` whose key is not in
    /// `observed_keys`, returning deep copies of everything removed so the
    /// caller (the Scanner, after a scan pass) can log or react to what
    /// disappeared.
    pub fn groom(&self, endpoint: &Endpoint, observed_keys: &HashSet<String>) -> Vec<Model> {
        let mut guard = self.inner.lock();
        let Some(keys) = guard.get_mut(endpoint) else {
            return Vec::new();
        };
        let stale: Vec<String> = keys.keys().filter(|k| !observed_keys.contains(*k)).cloned().collect();
        stale.into_iter().filter_map(|k| keys.remove(&k)).collect()
    }

    /// Removes `(endpoint, key)`; drops the endpoint's submap entirely once
    /// it is empty, so [`Catalog::get_bases`] never has to look past
    /// genuinely-present endpoints.
    pub fn delete(&self, endpoint: &Endpoint, key: &str) -> Option<Model> {
        let mut guard = self.inner.lock();
        let keys = guard.get_mut(endpoint)?;
        let removed = keys.remove(key);
        if keys.is_empty() {
            guard.remove(endpoint);
        }
        removed
    }

    /// Total number of models held across every endpoint; used only for
    /// the `bridge_catalog_models` gauge.
    pub fn model_count(&self) -> usize {
        self.inner.lock().values().map(|keys| keys.len()).sum()
    }

    /// Every distinct base directory currently loaded, across every
    /// endpoint (§4.6 diffs against this set).
    pub fn get_bases(&self) -> HashSet<String> {
        self.inner
            .lock()
            .values()
            .flat_map(|keys| keys.values())
            .map(|model| model.base_dir.clone())
            .filter(|base| !base.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn model(base: &str) -> Model {
        let mut m = Model::pending(format!("index-{base}.csv"));
        m.complete_load(
            bridge_types::ObjectMeta::new(format!("index-{base}.csv"), "etag-1", 10, Utc::now()),
            base.to_string(),
            HashMap::new(),
        );
        m
    }

    #[test]
    fn add_then_get_round_trips() {
        let catalog = Catalog::new();
        let ep = Endpoint::new("store", 9000);
        catalog.add(ep.clone(), "index-a.csv", model("baseA"));
        let fetched = catalog.get(&ep, "index-a.csv").unwrap();
        assert_eq!(fetched.base_dir, "baseA");
    }

    #[test]
    fn get_of_absent_entry_is_none() {
        let catalog = Catalog::new();
        let ep = Endpoint::new("store", 9000);
        assert!(catalog.get(&ep, "missing").is_none());
    }

    #[test]
    fn set_etag_is_noop_when_absent() {
        let catalog = Catalog::new();
        let ep = Endpoint::new("store", 9000);
        catalog.set_etag(&ep, "missing", "etag-x");
        assert!(catalog.get(&ep, "missing").is_none());
    }

    #[test]
    fn set_etag_updates_existing_entry() {
        let catalog = Catalog::new();
        let ep = Endpoint::new("store", 9000);
        catalog.add(ep.clone(), "index-a.csv", model("baseA"));
        catalog.set_etag(&ep, "index-a.csv", "etag-2");
        assert_eq!(catalog.get(&ep, "index-a.csv").unwrap().stored_etag(), "etag-2");
    }

    #[test]
    fn groom_removes_unobserved_keys_and_returns_copies() {
        let catalog = Catalog::new();
        let ep = Endpoint::new("store", 9000);
        catalog.add(ep.clone(), "index-a.csv", model("baseA"));
        catalog.add(ep.clone(), "index-b.csv", model("baseB"));

        let observed: HashSet<String> = ["index-a.csv".to_string()].into_iter().collect();
        let removed = catalog.groom(&ep, &observed);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].base_dir, "baseB");
        assert!(catalog.get(&ep, "index-a.csv").is_some());
        assert!(catalog.get(&ep, "index-b.csv").is_none());
    }

    #[test]
    fn delete_drops_empty_endpoint_submap() {
        let catalog = Catalog::new();
        let ep = Endpoint::new("store", 9000);
        catalog.add(ep.clone(), "index-a.csv", model("baseA"));
        catalog.delete(&ep, "index-a.csv");
        assert!(catalog.get_bases().is_empty());
    }

    #[test]
    fn get_bases_spans_all_endpoints() {
        let catalog = Catalog::new();
        let ep1 = Endpoint::new("store-1", 9000);
        let ep2 = Endpoint::new("store-2", 9000);
        catalog.add(ep1, "index-a.csv", model("baseA"));
        catalog.add(ep2, "index-b.csv", model("baseB"));
        let bases = catalog.get_bases();
        assert_eq!(bases.len(), 2);
        assert!(bases.contains("baseA"));
        assert!(bases.contains("baseB"));
    }
}
