use std::fmt;
use std::net::ToSocketAddrs;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// The (host, port) pair identifying the object-store endpoint a Scanner
/// was configured with. Doubles as the Catalog's outer sharding key so a
/// single process can run more than one Scanner against distinct
/// endpoints without their model keys colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The readiness predicate the Bucket Scanner (§4.3) waits on: the
    /// endpoint must parse as host:port. We additionally require the host
    /// be non-empty; full DNS resolvability is deliberately not checked
    /// here since a bucket endpoint may not resolve until the network is
    /// up, and that's a transient-I/O concern for the scan loop, not a
    /// readiness concern.
    pub fn is_parseable(raw: &str) -> bool {
        Endpoint::from_str(raw).is_ok()
    }

    /// Best-effort resolvability check, used only by diagnostics; never
    /// gates readiness (see `is_parseable`).
    pub fn resolves(&self) -> bool {
        (self.host.as_str(), self.port).to_socket_addrs().is_ok()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| BridgeError::configuration(format!("endpoint '{s}' is not host:port")))?;
        if host.is_empty() {
            return Err(BridgeError::configuration(format!("endpoint '{s}' has empty host")));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| BridgeError::configuration(format!("endpoint '{s}' has invalid port")))?;
        Ok(Endpoint::new(host, port))
    }
}
