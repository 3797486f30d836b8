//! Queue Matcher (§4.7): grooms covered queues, assigns each remaining
//! queue the cheapest compatible node group, and renders job specs to
//! cover the shortfall.

mod matcher;
mod pass;
mod renderer;
mod runner;

pub use matcher::{groom_queues, select_node_groups};
pub use pass::run_queue_matcher_pass;
pub use renderer::{JobSpecRenderer, TemplateJobSpecRenderer};
pub use runner::{JobSpecSink, QueueFactsProvider, QueueMatcherRunner, DEFAULT_TICK_INTERVAL};
