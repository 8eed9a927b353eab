//! The deployment lifecycle driver: the context facade, deploy/undeploy
//! sequencing, and rollback-aware event dispatch.
//!
//! `warden_engine` is the layer that actually runs a deployment: it owns
//! the [`Context`] a caller constructs once per deployment, and the
//! `deploy`/`undeploy` functions that drive it through its lifecycle
//! against the node set and plan `warden_graph` computed and the
//! operations `warden_ops` resolves.

/// The deployment status state machine.
pub mod status;

/// Error types for the context facade and lifecycle driver.
pub mod error;

/// The context facade: name, status, bound inputs/outputs, node set, plan.
pub mod context;

/// The lifecycle driver: `deploy`/`undeploy` phase sequencing.
pub mod driver;

pub use context::{Context, ContextSnapshot, NodeSnapshot, OutputsError};
pub use driver::{deploy, undeploy};
pub use error::{ContextError, DriverError};
pub use status::Status;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::context::{Context, ContextSnapshot, NodeSnapshot, OutputsError};
    pub use crate::driver::{deploy, undeploy};
    pub use crate::error::{ContextError, DriverError};
    pub use crate::status::Status;
}
