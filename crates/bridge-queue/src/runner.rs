use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_config::CycleSignals;
use bridge_types::{BridgeError, BridgeMetrics, ErrorSuppressor, NodeGroupInventory, QueueStatus};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::pass::run_queue_matcher_pass;
use crate::renderer::JobSpecRenderer;

/// Default queue-matcher pass ticker.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Supplies the facts the Queue Matcher needs each pass: queue backlog
/// depths (with a peeked resource requirement) and the cluster's
/// autoscaling-group inventory. Both are read from external systems (a
/// queue service, a cluster API) that are excluded collaborators; this
/// trait is their seam.
#[async_trait]
pub trait QueueFactsProvider: Send + Sync {
    async fn fetch(&self) -> Result<(Vec<QueueStatus>, NodeGroupInventory), BridgeError>;
}

/// Accepts one rendered job spec per (queue, node-group) shortfall.
/// Submitting it to a real scheduler is an excluded collaborator; this
/// trait is that seam.
#[async_trait]
pub trait JobSpecSink: Send + Sync {
    async fn submit(&self, job_spec: &str) -> Result<(), BridgeError>;
}

/// Runs Queue Matcher passes until `cancel` fires (§4.7, §5: one task per
/// component). Unlike the Scanner and TFX Reconciler, this task doesn't
/// gate on `ConfigSnapshot` readiness: it consumes queue-backlog and
/// cluster-topology facts that are independent of the S3/TFX
/// configuration surface.
pub struct QueueMatcherRunner {
    pub facts: Arc<dyn QueueFactsProvider>,
    pub renderer: Arc<dyn JobSpecRenderer>,
    pub sink: Arc<dyn JobSpecSink>,
    pub signals: CycleSignals,
    pub tick_interval: Duration,
    pub metrics: Arc<BridgeMetrics>,
    pub error_suppressor: Arc<ErrorSuppressor>,
}

impl QueueMatcherRunner {
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.tick_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            self.signals.started.fire();
            let result = self.run_pass().await;
            self.signals.ended.fire();

            if let Err(e) = result {
                if self.error_suppressor.should_emit(&e.to_string()) {
                    warn!(error = %e, "queue matcher pass failed");
                }
            }
        }
    }

    async fn run_pass(&self) -> Result<(), BridgeError> {
        let (queues, inventory) = self.facts.fetch().await?;
        let job_specs = run_queue_matcher_pass(queues, &inventory, self.renderer.as_ref(), &self.metrics)?;
        for job_spec in &job_specs {
            self.sink.submit(job_spec).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::TemplateJobSpecRenderer;
    use bridge_types::{PricedInstanceType, ResourceRequirement};
    use parking_lot::Mutex;
    use std::collections::HashSet;

    struct FixedFacts {
        queues: Mutex<Option<Vec<QueueStatus>>>,
        inventory: NodeGroupInventory,
    }

    #[async_trait]
    impl QueueFactsProvider for FixedFacts {
        async fn fetch(&self) -> Result<(Vec<QueueStatus>, NodeGroupInventory), BridgeError> {
            let queues = self.queues.lock().take().unwrap_or_default();
            Ok((queues, self.inventory.clone()))
        }
    }

    struct RecordingSink {
        submitted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl JobSpecSink for RecordingSink {
        async fn submit(&self, job_spec: &str) -> Result<(), BridgeError> {
            self.submitted.lock().push(job_spec.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn run_loop_renders_and_submits_one_pass_of_job_specs() {
        let queues = vec![QueueStatus {
            name: "needy".into(),
            ready: 2,
            in_flight: 0,
            running: 0,
            resource: Some(ResourceRequirement::default()),
            acceptable_instance_types: vec![PricedInstanceType {
                instance_type: "small".into(),
                price_per_hour: 0.2,
            }],
            assigned_group: None,
            known_jobs: HashSet::new(),
        }];
        let mut inventory = NodeGroupInventory::new();
        inventory.insert("group-a".to_string(), vec!["small".to_string()]);

        let facts = Arc::new(FixedFacts {
            queues: Mutex::new(Some(queues)),
            inventory,
        });
        let sink = Arc::new(RecordingSink { submitted: Mutex::new(Vec::new()) });
        let registry = prometheus::Registry::new();

        let runner = QueueMatcherRunner {
            facts,
            renderer: Arc::new(TemplateJobSpecRenderer::new("{queue}/{node_group}/{instance_type}@{price_per_hour}")),
            sink: sink.clone(),
            signals: CycleSignals::new(),
            tick_interval: Duration::from_millis(10),
            metrics: Arc::new(BridgeMetrics::register(&registry).unwrap()),
            error_suppressor: Arc::new(ErrorSuppressor::new()),
        };

        let cancel = CancellationToken::new();
        let mut started = runner.signals.started.waiter();
        let mut ended = runner.signals.ended.waiter();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(runner.run(cancel_clone));

        assert!(started.wait_next().await);
        assert!(ended.wait_next().await);
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(sink.submitted.lock().as_slice(), &["needy/group-a/small@0.2".to_string()]);
    }
}
