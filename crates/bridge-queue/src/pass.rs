use bridge_types::{BridgeError, BridgeMetrics, NodeGroupInventory, QueueStatus};

use crate::matcher::{groom_queues, select_node_groups};
use crate::renderer::JobSpecRenderer;

/// Runs all three Queue Matcher passes (§4.7) in order: groom, node-group
/// selection, job synthesis.
pub fn run_queue_matcher_pass(queues: Vec<QueueStatus>, inventory: &NodeGroupInventory, renderer: &dyn JobSpecRenderer, metrics: &BridgeMetrics) -> Result<Vec<String>, BridgeError> {
    let mut remaining = groom_queues(queues);
    let assignments = select_node_groups(&mut remaining, inventory);
    metrics.queue_assignments_total.inc_by(assignments.len() as u64);
    assignments.iter().map(|assignment| renderer.render(assignment)).collect()
}
