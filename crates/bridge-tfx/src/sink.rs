use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_types::BridgeError;

/// The serving-config sink the reconciler reads from and writes to (§4.6).
/// Kept as a trait so tests exercise the reconcile logic against an
/// in-memory double instead of a filesystem or a Kubernetes API call.
#[async_trait]
pub trait ServingConfigSink: Send + Sync {
    /// A stable identifier for the underlying resource (filename,
    /// config-map name); used only to detect a sink swap between passes
    /// (§4.6 readiness edge case), never interpreted.
    fn id(&self) -> &str;

    /// Returns the empty string for a sink that exists but has no content
    /// yet — that's the valid "initially-empty document" case (§4.6), not
    /// an error.
    async fn read(&self) -> Result<String, BridgeError>;

    async fn write(&self, content: &str) -> Result<(), BridgeError>;
}

/// Serving-config sink backed by a local file (§6 `tfx_config_fn`).
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ServingConfigSink for FileSink {
    fn id(&self) -> &str {
        self.path.to_str().unwrap_or("")
    }

    async fn read(&self) -> Result<String, BridgeError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(BridgeError::transient(format!("reading {}: {e}", self.path.display()))),
        }
    }

    async fn write(&self, content: &str) -> Result<(), BridgeError> {
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| BridgeError::transient(format!("writing {}: {e}", self.path.display())))
    }
}

/// Backend for [`ConfigMapSink`]. The real Kubernetes API calls that would
/// back this in production are an excluded collaborator (§1): this crate
/// defines the seam the bridge-node process wires up, and tests exercise it
/// against an in-memory double.
#[async_trait]
pub trait ConfigMapBackend: Send + Sync {
    async fn read(&self, config_map: &str) -> Result<String, BridgeError>;
    async fn write(&self, config_map: &str, content: &str) -> Result<(), BridgeError>;
}

/// Serving-config sink backed by a mounted/managed config map (§6
/// `tfx_config_cm`).
pub struct ConfigMapSink {
    name: String,
    backend: Arc<dyn ConfigMapBackend>,
}

impl ConfigMapSink {
    pub fn new(name: impl Into<String>, backend: Arc<dyn ConfigMapBackend>) -> Self {
        Self { name: name.into(), backend }
    }
}

#[async_trait]
impl ServingConfigSink for ConfigMapSink {
    fn id(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> Result<String, BridgeError> {
        self.backend.read(&self.name).await
    }

    async fn write(&self, content: &str) -> Result<(), BridgeError> {
        self.backend.write(&self.name, content).await
    }
}
