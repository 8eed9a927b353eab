//! A deployment orchestrator for declarative topology templates.
//!

pub use warden_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use warden_internal::prelude::*;
}
