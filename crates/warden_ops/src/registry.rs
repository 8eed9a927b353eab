//! The operation registry (§9 REDESIGN FLAG): a static map from
//! `"module:symbol"` reference to operation implementation, populated once
//! at startup rather than resolved by dynamic module loading.

use hashbrown::HashMap;
use std::sync::Arc;

use crate::operation::{parse_reference, OperationError, RelationshipOperation, StandardOperation};

/// Resolves lifecycle and relationship event implementation references.
///
/// Built via [`OperationRegistryBuilder`] and then immutable for the
/// lifetime of the deployment it serves.
#[derive(Default)]
pub struct OperationRegistry {
    standard: HashMap<String, Arc<dyn StandardOperation>>,
    relationship: HashMap<String, Arc<dyn RelationshipOperation>>,
}

impl OperationRegistry {
    /// Starts building a registry pre-populated with the built-in
    /// `noop`/`link`/`unlink` operations (§4.4).
    #[must_use]
    pub fn builder() -> OperationRegistryBuilder {
        OperationRegistryBuilder::with_builtins()
    }

    /// Resolves and validates a standard-interface implementation
    /// reference.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidReference`] if `reference` is not
    /// of the form `"module:symbol"`, or
    /// [`OperationError::StandardNotFound`] if no implementation is
    /// registered under it.
    pub fn resolve_standard(&self, reference: &str) -> Result<&dyn StandardOperation, OperationError> {
        parse_reference(reference)?;
        self.standard
            .get(reference)
            .map(|op| op.as_ref())
            .ok_or_else(|| OperationError::StandardNotFound {
                reference: reference.to_string(),
            })
    }

    /// Resolves and validates a relationship implementation reference.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidReference`] if `reference` is not
    /// of the form `"module:symbol"`, or
    /// [`OperationError::RelationshipNotFound`] if no implementation is
    /// registered under it.
    pub fn resolve_relationship(&self, reference: &str) -> Result<&dyn RelationshipOperation, OperationError> {
        parse_reference(reference)?;
        self.relationship
            .get(reference)
            .map(|op| op.as_ref())
            .ok_or_else(|| OperationError::RelationshipNotFound {
                reference: reference.to_string(),
            })
    }
}

/// Builder for [`OperationRegistry`]: registers operation implementations
/// under their `"module:symbol"` reference before the registry is sealed.
#[derive(Default)]
pub struct OperationRegistryBuilder {
    standard: HashMap<String, Arc<dyn StandardOperation>>,
    relationship: HashMap<String, Arc<dyn RelationshipOperation>>,
}

impl OperationRegistryBuilder {
    /// Starts an empty builder with no built-ins registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a builder pre-populated with the built-in no-op relationship
    /// under its canonical references (§4.4).
    #[must_use]
    pub fn with_builtins() -> Self {
        Self::new()
            .register_relationship(crate::noop::LINK_REFERENCE, Arc::new(crate::noop::Link))
            .register_relationship(crate::noop::UNLINK_REFERENCE, Arc::new(crate::noop::Unlink))
    }

    /// Registers a standard-interface operation under `reference`,
    /// replacing any existing registration.
    #[must_use]
    pub fn register_standard(
        mut self,
        reference: impl Into<String>,
        operation: Arc<dyn StandardOperation>,
    ) -> Self {
        self.standard.insert(reference.into(), operation);
        self
    }

    /// Registers a relationship operation under `reference`, replacing any
    /// existing registration.
    #[must_use]
    pub fn register_relationship(
        mut self,
        reference: impl Into<String>,
        operation: Arc<dyn RelationshipOperation>,
    ) -> Self {
        self.relationship.insert(reference.into(), operation);
        self
    }

    /// Seals the registry; no further operations can be registered.
    #[must_use]
    pub fn build(self) -> OperationRegistry {
        OperationRegistry {
            standard: self.standard,
            relationship: self.relationship,
        }
    }
}
