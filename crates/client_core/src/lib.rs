//! Client-side state for building a view-only link out of a fetched project
//! hierarchy: load the nodes, track the selection, submit it once.

pub mod config;
pub mod controller;
pub mod error;
pub mod transport;
pub mod types;

pub use config::ControllerConfig;
pub use controller::SelectionController;
pub use error::{ConfigError, ControllerError, SubmitRejected, TransportError};
pub use transport::{HttpTransport, LinkSubmitter, NodeSource};
pub use types::{ControllerEvent, ControllerSnapshot, Node, Phase, SelectionSet};
