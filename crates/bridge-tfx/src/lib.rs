//! TFX Reconciler (§4.6): diffs the model catalog against a served-model
//! configuration document and writes the minimal update back to its sink.

mod document;
mod reconciler;
mod sink;

pub use document::{ServedModelEntry, ServingConfigDocument};
pub use reconciler::{reconcile_pass, DefaultSinkFactory, ReconcileOutcome, SinkFactory, TfxReconciler, DEFAULT_TICK_INTERVAL};
pub use sink::{ConfigMapBackend, ConfigMapSink, FileSink, ServingConfigSink};
