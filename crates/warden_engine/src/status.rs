//! Deployment status state machine (§4.7, §8).

use serde::{Deserialize, Serialize};

/// The lifecycle state of a [`crate::Context`].
///
/// `Pending` → `Running` (on `deploy`) → `Completed`/`Failed`. `undeploy` is
/// permitted from `Completed`/`Failed` unconditionally, or from any state
/// when rollback is enabled; on success it returns to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Freshly constructed, or torn down by a prior `undeploy`.
    Pending,
    /// A `deploy` is currently executing.
    Running,
    /// `deploy` finished every phase without error.
    Completed,
    /// `deploy` (or a later phase) raised an error.
    Failed,
}

impl Status {
    /// Whether `undeploy` may run against this status without rollback
    /// being enabled.
    #[must_use]
    pub fn available_for_destruction(self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_completed_and_failed_are_destructible() {
        assert!(!Status::Pending.available_for_destruction());
        assert!(!Status::Running.available_for_destruction());
        assert!(Status::Completed.available_for_destruction());
        assert!(Status::Failed.available_for_destruction());
    }
}
