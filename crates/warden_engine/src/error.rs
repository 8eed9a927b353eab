//! Error types for the context facade and lifecycle driver.

use warden_graph::{NodeError, PlannerError};
use warden_ops::OperationError;

use crate::status::Status;

/// Errors raised while driving a deployment through `deploy`/`undeploy`.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// `deploy` was called while the context was not `Pending`.
    #[error("cannot deploy: expected status pending, found {actual:?}")]
    BadState {
        /// The status observed instead of `Pending`.
        actual: Status,
    },
    /// `undeploy` was called while the context was neither destructible
    /// nor running with rollback enabled.
    #[error("cannot undeploy: status {actual:?} is not destructible and rollback is disabled")]
    NotDestructible {
        /// The status observed.
        actual: Status,
    },
    /// `undeploy` was called but no node in the deployment was ever
    /// provisioned.
    #[error("cannot undeploy: no node was provisioned")]
    NodesNotProvisioned,
    /// The dependency plan could not be built.
    #[error(transparent)]
    Planner(#[from] PlannerError),
    /// A node's properties could not be materialized.
    #[error(transparent)]
    Node(#[from] NodeError),
    /// An operation reference could not be resolved, or the operation
    /// itself failed.
    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors raised while constructing a [`crate::Context`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContextError {
    /// A node type declares no `create` standard-interface operation.
    /// `create` is required on every node type: without it the node could
    /// never be provisioned in the first place.
    #[error("node {node} declares no create operation")]
    MissingCreate {
        /// The node missing a `create` operation.
        node: String,
    },
}
