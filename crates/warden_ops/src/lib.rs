//! Pluggable operation dispatch: the static registry resolving lifecycle
//! and relationship event implementations, plus the built-in no-op
//! relationship.
//!
//! Template authors reference operations by a `"module:symbol"` string;
//! this crate resolves those references against an
//! [`OperationRegistry`] built once at startup, rather than loading code
//! dynamically at deploy time.

/// Operation traits and the shared error type.
pub mod operation;

/// The static operation registry and its builder.
pub mod registry;

/// The built-in `noop`/`link`/`unlink` operations.
pub mod noop;

pub use operation::{parse_reference, BoxFuture, OperationError, RelationshipOperation, StandardOperation};
pub use registry::{OperationRegistry, OperationRegistryBuilder};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::operation::{BoxFuture, OperationError, RelationshipOperation, StandardOperation};
    pub use crate::registry::{OperationRegistry, OperationRegistryBuilder};
}
