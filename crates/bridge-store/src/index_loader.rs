use std::collections::HashMap;

use bridge_types::{BridgeError, Model, ObjectMeta};

use crate::client::ObjectStoreClient;

/// Hard size limit on an index blob (§4.4): anything larger is rejected
/// without being fetched.
pub const MAX_INDEX_SIZE_BYTES: u64 = 5 * 1024 * 1024;

/// Outcome of one Index Loader invocation (§4.4).
#[derive(Debug)]
pub enum IndexOutcome {
    /// The candidate's ETag matched the model's stored ETag; nothing was
    /// fetched or changed.
    Unchanged,
    /// A full Load ran to completion; this is the model's new state.
    Loaded(Model),
}

struct IndexRow {
    base: String,
    key: String,
}

/// Fetches, parses, and validates one candidate index object, producing a
/// fully-loaded [`Model`] or leaving the caller's existing state alone.
///
/// On any error the caller's `existing` model (if any) is left untouched —
/// this function never returns a partially-updated `Model`; it either
/// returns `Loaded` with every field replaced together, or an `Err` with
/// nothing for the caller to apply.
pub async fn load_index(client: &dyn ObjectStoreClient, candidate: &ObjectMeta, existing: Option<&Model>) -> Result<IndexOutcome, BridgeError> {
    if candidate.size > MAX_INDEX_SIZE_BYTES {
        return Err(BridgeError::data(format!(
            "index {} is {} bytes, exceeds the {} byte limit",
            candidate.key, candidate.size, MAX_INDEX_SIZE_BYTES
        )));
    }

    if let Some(model) = existing {
        if !model.stored_etag().is_empty() && model.stored_etag() == candidate.etag {
            return Ok(IndexOutcome::Unchanged);
        }
    }

    let body = client.get(&candidate.key).await?;
    let rows = parse_index_csv(&body)?;

    let base_dir = uniform_base_dir(&candidate.key, &rows)?;

    let mut blobs = HashMap::with_capacity(rows.len());
    for row in rows {
        let meta = client
            .stat(&row.key)
            .await
            .map_err(|e| BridgeError::data(format!("failed to stat blob '{}' referenced by index {}: {e}", row.key, candidate.key)))?;
        blobs.insert(row.key, meta);
    }

    let mut model = existing.cloned().unwrap_or_else(|| Model::pending(candidate.key.clone()));
    model.complete_load(candidate.clone(), base_dir, blobs);
    Ok(IndexOutcome::Loaded(model))
}

/// Enforces "all rows in one file must have the same first field" (§3).
fn uniform_base_dir(index_key: &str, rows: &[IndexRow]) -> Result<String, BridgeError> {
    let mut base_dir: Option<&str> = None;
    for row in rows {
        match base_dir {
            None => base_dir = Some(&row.base),
            Some(seen) if seen != row.base => {
                return Err(BridgeError::data(format!(
                    "index {index_key} mixes base directories '{seen}' and '{}'",
                    row.base
                )));
            }
            _ => {}
        }
    }
    Ok(base_dir.unwrap_or("").to_string())
}

/// Parses `base,key,etag` rows, tolerating empty rows (§3).
fn parse_index_csv(data: &[u8]) -> Result<Vec<IndexRow>, BridgeError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(false).flexible(true).from_reader(data);
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| BridgeError::data(format!("malformed index CSV row: {e}")))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() != 3 {
            return Err(BridgeError::data(format!(
                "index row has {} fields, expected base,key,etag",
                record.len()
            )));
        }
        rows.push(IndexRow {
            base: record[0].trim().to_string(),
            key: record[1].trim().to_string(),
        });
    }
    Ok(rows)
}
