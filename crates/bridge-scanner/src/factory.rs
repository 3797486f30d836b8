use bridge_types::{BridgeError, ConfigSnapshot};
use bridge_store::{s3_client, ObjectStoreClient};

/// Builds an object-store client from the currently-published configuration
/// (§4.3 step 1, and "construct a client" on credential rotation). Kept
/// behind a trait so tests can substitute an in-memory store or a
/// fault-injecting wrapper without touching a real S3-compatible endpoint.
pub trait ClientFactory: Send + Sync {
    fn build(&self, snapshot: &ConfigSnapshot) -> Result<Box<dyn ObjectStoreClient>, BridgeError>;
}

/// The live factory: builds a real `object_store` S3 client from the
/// snapshot's endpoint, credentials, and bucket. `region` comes from the
/// process's `AWS_DEFAULT_REGION` flag/env var, since the S3-compatible
/// endpoint itself carries no region information.
pub struct S3ClientFactory {
    pub region: String,
}

impl ClientFactory for S3ClientFactory {
    fn build(&self, snapshot: &ConfigSnapshot) -> Result<Box<dyn ObjectStoreClient>, BridgeError> {
        let endpoint = snapshot
            .endpoint
            .as_deref()
            .ok_or_else(|| BridgeError::configuration("no endpoint configured"))?;
        let bucket = snapshot
            .bucket
            .as_deref()
            .ok_or_else(|| BridgeError::configuration("no bucket configured"))?;
        let (access_key, secret_key) = snapshot
            .credentials()
            .ok_or_else(|| BridgeError::configuration("incomplete credentials"))?;
        let client = s3_client(endpoint, access_key, secret_key, bucket, &self.region)?;
        Ok(Box::new(client))
    }
}
