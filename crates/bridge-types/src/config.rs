use serde::{Deserialize, Serialize};

use crate::endpoint::Endpoint;
use crate::error::BridgeError;

/// A fully- (or partially-) populated configuration value.
///
/// Used both as the broadcaster's *current snapshot* (every field may or
/// may not be set yet) and as the argument to `Publish` (an *update*: any
/// subset of fields, the rest left `None` meaning "don't touch"). There is
/// deliberately one type for both roles — see DESIGN.md — matching how the
/// upstream system's partial-update struct models "present means
/// override" directly via `Option`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
    pub tfx_config_fn: Option<String>,
    pub tfx_config_cm: Option<String>,
}

/// One of the two serving-config sinks, resolved from a snapshot.
///
/// Open Question (i) from the design is resolved here: the two sinks are
/// mutually exclusive. [`ConfigSnapshot::sink`] rejects a snapshot with
/// both set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSink {
    File(String),
    ConfigMap(String),
    Unconfigured,
}

impl ConfigSnapshot {
    /// Field-wise last-writer-wins merge: every `Some` field in `update`
    /// overwrites the corresponding field in `self`; `None` fields leave
    /// `self` untouched. This is the whole of the Config Broadcaster's
    /// Publish semantics (§4.1) — the rest of Publish is fan-out, not
    /// merge logic.
    pub fn merge(&mut self, update: &ConfigSnapshot) {
        if update.endpoint.is_some() {
            self.endpoint = update.endpoint.clone();
        }
        if update.access_key.is_some() {
            self.access_key = update.access_key.clone();
        }
        if update.secret_key.is_some() {
            self.secret_key = update.secret_key.clone();
        }
        if update.bucket.is_some() {
            self.bucket = update.bucket.clone();
        }
        if update.tfx_config_fn.is_some() {
            self.tfx_config_fn = update.tfx_config_fn.clone();
        }
        if update.tfx_config_cm.is_some() {
            self.tfx_config_cm = update.tfx_config_cm.clone();
        }
    }

    pub fn merged(mut self, update: &ConfigSnapshot) -> Self {
        self.merge(update);
        self
    }

    pub fn endpoint(&self) -> Option<Result<Endpoint, BridgeError>> {
        self.endpoint.as_deref().map(str::parse)
    }

    /// Resolves the active serving-config sink, enforcing mutual
    /// exclusivity between the file sink and the config-map sink.
    pub fn sink(&self) -> Result<ConfigSink, BridgeError> {
        match (&self.tfx_config_fn, &self.tfx_config_cm) {
            (Some(_), Some(_)) => Err(BridgeError::configuration(
                "tfx_config_fn and tfx_config_cm are mutually exclusive; only one sink may be configured",
            )),
            (Some(fname), None) if !fname.is_empty() => Ok(ConfigSink::File(fname.clone())),
            (None, Some(cm)) if !cm.is_empty() => Ok(ConfigSink::ConfigMap(cm.clone())),
            _ => Ok(ConfigSink::Unconfigured),
        }
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(a), Some(s)) => Some((a, s)),
            _ => None,
        }
    }
}
