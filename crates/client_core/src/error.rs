use shared::domain::NodeId;
use thiserror::Error;

use crate::types::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("node {0} is not part of the loaded hierarchy")]
    UnknownNode(NodeId),
    #[error("selection holds node {0} which is not part of the loaded hierarchy")]
    InvariantViolation(NodeId),
    #[error("controller state channel closed")]
    Closed,
}

/// Why a call to `submit` did not start a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("a submission is already in flight")]
    InFlight,
    #[error("cannot submit while {0:?}")]
    NotReady(Phase),
    #[error(transparent)]
    Invariant(#[from] ControllerError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field} '{value}': {source}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        source: url::ParseError,
    },
    #[error("{field} must use http or https, got '{scheme}'")]
    UnsupportedScheme { field: &'static str, scheme: String },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },
}
