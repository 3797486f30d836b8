use std::collections::HashSet;

use bridge_catalog::Catalog;
use bridge_store::{load_index, IndexOutcome, ObjectStoreClient};
use bridge_types::{BridgeError, Endpoint, Model};
use tracing::{info, warn};

const INDEX_PREFIX: &str = "index-";

/// One scan pass (§4.3 steps 2-4): list, load each candidate, groom.
///
/// A listing failure aborts the whole pass and is returned to the caller
/// (which decides whether to rebuild the client or just back off); a
/// per-index load failure is logged and leaves that key's catalog entry
/// untouched, but the key still counts as "observed" for the grooming step
/// that follows, since it was present in the listing regardless of whether
/// its load succeeded.
pub async fn scan_pass(client: &dyn ObjectStoreClient, catalog: &Catalog, endpoint: &Endpoint) -> Result<(), BridgeError> {
    let listed = client.list_recursive(INDEX_PREFIX).await?;

    let mut observed = HashSet::with_capacity(listed.len());
    for object in listed {
        if !object.key.ends_with(".csv") {
            continue;
        }
        observed.insert(object.key.clone());

        let existing = catalog.get(endpoint, &object.key);
        match load_index(client, &object, existing.as_ref()).await {
            Ok(IndexOutcome::Loaded(model)) => catalog.add(endpoint.clone(), object.key.clone(), model),
            Ok(IndexOutcome::Unchanged) => {}
            Err(e) => warn!(endpoint = %endpoint, key = %object.key, error = %e, "index load failed; catalog entry unchanged"),
        }
    }

    let removed = catalog.groom(endpoint, &observed);
    if !removed.is_empty() {
        let keys: Vec<&str> = removed.iter().map(Model::key).collect();
        info!(endpoint = %endpoint, count = removed.len(), keys = ?keys, "groomed indexes no longer listed");
    }
    Ok(())
}
