//! Configuration fan-out (§4.1) and per-component readiness gating
//! (§4.2), plus the "close, then replace" test-facing cycle signal used
//! by the scanner and reconciler (§4.3/§4.6).

mod broadcaster;
mod readiness;
mod signal;

pub use broadcaster::{ConfigBroadcaster, SubscriptionId};
pub use readiness::ReadinessGate;
pub use signal::{CycleSignal, CycleSignals, CycleWaiter};
