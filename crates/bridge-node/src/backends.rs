use async_trait::async_trait;
use bridge_queue::{JobSpecSink, QueueFactsProvider};
use bridge_tfx::ConfigMapBackend;
use bridge_types::{BridgeError, NodeGroupInventory, QueueStatus};
use tracing::info;

/// `ConfigMapBackend` that refuses every call. The Kubernetes API calls a
/// real backend would make are an excluded collaborator; a process that
/// selects the config-map sink without swapping this out gets a clear
/// configuration error instead of a silent no-op.
pub struct UnimplementedConfigMapBackend;

#[async_trait]
impl ConfigMapBackend for UnimplementedConfigMapBackend {
    async fn read(&self, config_map: &str) -> Result<String, BridgeError> {
        Err(BridgeError::configuration(format!("config-map sink '{config_map}' selected but no Kubernetes backend is wired into this binary")))
    }

    async fn write(&self, config_map: &str, _content: &str) -> Result<(), BridgeError> {
        Err(BridgeError::configuration(format!("config-map sink '{config_map}' selected but no Kubernetes backend is wired into this binary")))
    }
}

/// Placeholder queue-facts source: always reports no queues and no node
/// groups. The real queue service and cluster-autoscaler API are excluded
/// collaborators (§1); wiring them in is the deploying binary's job.
pub struct NullQueueFactsProvider;

#[async_trait]
impl QueueFactsProvider for NullQueueFactsProvider {
    async fn fetch(&self) -> Result<(Vec<QueueStatus>, NodeGroupInventory), BridgeError> {
        Ok((Vec::new(), NodeGroupInventory::new()))
    }
}

/// Logs rendered job specs instead of submitting them to a scheduler.
/// Submission to a real job-running system is an excluded collaborator.
pub struct LoggingJobSpecSink;

#[async_trait]
impl JobSpecSink for LoggingJobSpecSink {
    async fn submit(&self, job_spec: &str) -> Result<(), BridgeError> {
        info!(job_spec, "queue matcher produced a job spec");
        Ok(())
    }
}
