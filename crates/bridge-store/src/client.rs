use std::sync::Arc;

use async_trait::async_trait;
use bridge_types::{BridgeError, ObjectMeta};
use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as StorePath;
use object_store::ObjectStore;

/// Narrow seam over the object store so the Scanner and Index Loader can
/// be tested against `object_store::memory::InMemory` instead of a real
/// S3-compatible endpoint (§8). The HTTP transport itself is an excluded
/// collaborator (§1); this trait is the contract the core depends on.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Recursive LIST under `prefix`, with metadata. A missing bucket or
    /// prefix is reported as an empty list, not an error (§4.3 error
    /// policy: NoSuchBucket means "bucket empty").
    async fn list_recursive(&self, prefix: &str) -> Result<Vec<ObjectMeta>, BridgeError>;

    async fn get(&self, key: &str) -> Result<Bytes, BridgeError>;

    async fn stat(&self, key: &str) -> Result<ObjectMeta, BridgeError>;
}

/// Wraps any `object_store::ObjectStore` implementation. Used both for the
/// real S3-compatible endpoint (via [`s3_client`]) and, in tests, for
/// `object_store::memory::InMemory`.
pub struct StoreClient {
    store: Arc<dyn ObjectStore>,
}

impl StoreClient {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }
}

/// Builds a [`StoreClient`] against an S3-compatible endpoint. Credential
/// rotation (§7 Auth) is handled by discarding and rebuilding a client via
/// this constructor, not by mutating an existing one in place.
pub fn s3_client(endpoint: &str, access_key: &str, secret_key: &str, bucket: &str, region: &str) -> Result<StoreClient, BridgeError> {
    let endpoint_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    };
    let store = AmazonS3Builder::new()
        .with_endpoint(endpoint_url)
        .with_access_key_id(access_key)
        .with_secret_access_key(secret_key)
        .with_bucket_name(bucket)
        .with_allow_http(true)
        .with_region(region)
        .build()
        .map_err(|e| BridgeError::configuration(format!("failed to build object-store client: {e}")))?;
    Ok(StoreClient::new(Arc::new(store)))
}

#[async_trait]
impl ObjectStoreClient for StoreClient {
    async fn list_recursive(&self, prefix: &str) -> Result<Vec<ObjectMeta>, BridgeError> {
        let path = StorePath::from(prefix);
        let mut stream = self.store.list(Some(&path));
        let mut out = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(meta) => out.push(convert(meta)?),
                Err(object_store::Error::NotFound { .. }) => return Ok(Vec::new()),
                Err(e) => return Err(classify(e)),
            }
        }
        Ok(out)
    }

    async fn get(&self, key: &str) -> Result<Bytes, BridgeError> {
        let path = StorePath::from(key);
        let result = self.store.get(&path).await.map_err(classify)?;
        result.bytes().await.map_err(classify)
    }

    async fn stat(&self, key: &str) -> Result<ObjectMeta, BridgeError> {
        let path = StorePath::from(key);
        let meta = self.store.head(&path).await.map_err(classify)?;
        convert(meta)
    }
}

fn convert(meta: object_store::ObjectMeta) -> Result<ObjectMeta, BridgeError> {
    let etag = meta
        .e_tag
        .ok_or_else(|| BridgeError::data(format!("object {} has no ETag", meta.location)))?;
    Ok(ObjectMeta::new(meta.location.to_string(), etag, meta.size as u64, meta.last_modified))
}

/// Maps the transport's error taxonomy onto ours (§7). `PermissionDenied`
/// / `Unauthenticated` become `Auth` so the Scanner can detect credential
/// rotation and rebuild its client; everything else not explicitly
/// classified is treated as transient and left to the backoff loop.
pub fn classify(err: object_store::Error) -> BridgeError {
    use object_store::Error as E;
    match err {
        E::NotFound { path, .. } => BridgeError::data(format!("object not found: {path}")),
        E::PermissionDenied { source, .. } => BridgeError::auth(source.to_string()),
        E::Unauthenticated { source, .. } => BridgeError::auth(source.to_string()),
        other => BridgeError::transient(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes as BytesT;
    use chrono::Utc;
    use object_store::memory::InMemory;
    use object_store::PutPayload;

    fn client() -> (StoreClient, Arc<InMemory>) {
        let store = Arc::new(InMemory::new());
        (StoreClient::new(store.clone()), store)
    }

    #[tokio::test]
    async fn list_recursive_reports_empty_for_missing_prefix() {
        let (client, _store) = client();
        let listed = client.list_recursive("index-").await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn list_get_stat_round_trip() {
        let (client, store) = client();
        store
            .put(&StorePath::from("index-a.csv"), PutPayload::from(BytesT::from_static(b"baseA,baseA/x,etag-x\n")))
            .await
            .unwrap();

        let listed = client.list_recursive("index-").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "index-a.csv");
        assert!(!listed[0].etag.is_empty());

        let body = client.get("index-a.csv").await.unwrap();
        assert_eq!(body, Bytes::from_static(b"baseA,baseA/x,etag-x\n"));

        let stat = client.stat("index-a.csv").await.unwrap();
        assert_eq!(stat.key, "index-a.csv");
        let _ = Utc::now();
    }

    #[tokio::test]
    async fn stat_of_missing_key_is_data_error() {
        let (client, _store) = client();
        let err = client.stat("does-not-exist").await.unwrap_err();
        assert_eq!(err.kind(), bridge_types::ErrorKind::Data);
    }
}
