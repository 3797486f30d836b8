//! Structured error taxonomy shared by every bridge crate.
//!
//! Each variant corresponds to one of the error Kinds in the design:
//! Configuration, TransientIo, Auth, Data, State, Cancellation. Call sites
//! match on `BridgeError::kind()` rather than inspecting the message, so
//! retry/backoff/suppression policy lives next to the match, not the error.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    TransientIo,
    Auth,
    Data,
    State,
    Cancellation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::TransientIo => "transient_io",
            ErrorKind::Auth => "auth",
            ErrorKind::Data => "data",
            ErrorKind::State => "state",
            ErrorKind::Cancellation => "cancellation",
        };
        f.write_str(s)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("transient I/O error: {0}")]
    TransientIo(String),

    #[error("auth error: {0}")]
    Auth(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("state error: {0}")]
    State(String),

    #[error("cancelled")]
    Cancellation,
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Configuration(_) => ErrorKind::Configuration,
            BridgeError::TransientIo(_) => ErrorKind::TransientIo,
            BridgeError::Auth(_) => ErrorKind::Auth,
            BridgeError::Data(_) => ErrorKind::Data,
            BridgeError::State(_) => ErrorKind::State,
            BridgeError::Cancellation => ErrorKind::Cancellation,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::TransientIo | ErrorKind::Auth)
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        BridgeError::Configuration(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        BridgeError::TransientIo(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        BridgeError::Auth(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        BridgeError::Data(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        BridgeError::State(msg.into())
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
