use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Resource requirement derived from peeking one message off a queue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirement {
    pub cpu: f64,
    pub gpu: f64,
    pub ram: f64,
    pub disk: f64,
    pub gpu_mem: f64,
}

/// One acceptable instance type for a queue, with its unit price. Queues
/// carry these already ordered cost-ascending (§4.7 step 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedInstanceType {
    pub instance_type: String,
    pub price_per_hour: f64,
}

/// Per-queue backlog and assignment state for the Queue Matcher (§4.7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub name: String,
    pub ready: u64,
    pub in_flight: u64,
    pub running: u64,
    pub resource: Option<ResourceRequirement>,
    /// Acceptable instance types, ordered cost-ascending.
    pub acceptable_instance_types: Vec<PricedInstanceType>,
    pub assigned_group: Option<String>,
    pub known_jobs: HashSet<String>,
}

impl QueueStatus {
    /// Groom predicate (§4.7 pass 1): a queue is fully covered, and should
    /// be dropped, once `running >= ready + in_flight`.
    pub fn is_fully_covered(&self) -> bool {
        self.running >= self.ready + self.in_flight
    }
}

/// Cluster topology input: autoscaling-group name -> instance types it
/// offers.
pub type NodeGroupInventory = std::collections::HashMap<String, Vec<String>>;

/// One job spec to submit so a (queue, node group) shortfall is covered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAssignment {
    pub queue: String,
    pub node_group: String,
    pub instance_type: String,
    pub price_per_hour: f64,
}
