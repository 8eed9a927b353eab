//! # Warden Internal Library
//!
//! Re-exports the core Warden crates for convenience.

/// Ambient stack: retry helper and tracing subscriber setup.
pub use warden_core;

/// Template graph primitives: typed nodes, intrinsic functions, planner.
pub use warden_graph;

/// Pluggable operation dispatch: the registry and built-in no-op.
pub use warden_ops;

/// The lifecycle driver: the context facade and deploy/undeploy.
pub use warden_engine;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use warden_core::prelude::*;
    pub use warden_engine::prelude::*;
    pub use warden_graph::prelude::*;
    pub use warden_ops::prelude::*;
}
