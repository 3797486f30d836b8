//! Object-store access (§4.3/§4.4): a narrow client seam over
//! `object_store`, plus the Index Loader that turns one index blob into a
//! fully-validated [`bridge_types::Model`].

mod client;
mod index_loader;

pub use client::{classify, s3_client, ObjectStoreClient, StoreClient};
pub use index_loader::{load_index, IndexOutcome, MAX_INDEX_SIZE_BYTES};
