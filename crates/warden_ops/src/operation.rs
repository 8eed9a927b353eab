//! Operation traits: the fixed `(node, inputs) -> Result<(), _>` signature
//! every lifecycle and relationship event implementation conforms to.

use std::future::Future;
use std::pin::Pin;

use hashbrown::HashMap;
use warden_graph::{Node, Value};

/// A boxed future, not bound to `Send`.
///
/// Execution is single-threaded and cooperative, and operations borrow
/// [`Node`]s holding `RefCell` fields across their `.await` points, so
/// unlike a thread-pool-ready executor's system futures, these cannot be
/// `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Error surfaced by operation resolution and execution.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// An implementation reference was not of the form `"module:symbol"`.
    #[error("invalid operation reference {reference:?}: expected \"module:symbol\"")]
    InvalidReference {
        /// The malformed reference string.
        reference: String,
    },
    /// No standard operation is registered under this reference.
    #[error("no standard operation registered for {reference:?}")]
    StandardNotFound {
        /// The reference that failed to resolve.
        reference: String,
    },
    /// No relationship operation is registered under this reference.
    #[error("no relationship operation registered for {reference:?}")]
    RelationshipNotFound {
        /// The reference that failed to resolve.
        reference: String,
    },
    /// The operation itself raised an error while running.
    #[error("operation {reference} failed: {source}")]
    Failed {
        /// The reference of the operation that failed.
        reference: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + 'static>,
    },
}

/// Splits an implementation reference into its `(module, symbol)` halves,
/// per the `"module:symbol"` contract (§4.3).
///
/// # Errors
///
/// Returns [`OperationError::InvalidReference`] unless the string contains
/// exactly one `:` separator.
pub fn parse_reference(reference: &str) -> Result<(&str, &str), OperationError> {
    let mut parts = reference.splitn(2, ':');
    let module = parts.next().filter(|s| !s.is_empty());
    let symbol = parts.next().filter(|s| !s.is_empty());
    match (module, symbol) {
        (Some(module), Some(symbol)) if !symbol.contains(':') => Ok((module, symbol)),
        _ => Err(OperationError::InvalidReference {
            reference: reference.to_string(),
        }),
    }
}

/// A lifecycle event implementation (`create`/`configure`/`start`/`stop`/`delete`).
pub trait StandardOperation {
    /// Runs the operation against `node` with its bound `inputs`.
    ///
    /// # Errors
    ///
    /// Returns whatever error the operation raises, to be wrapped by the
    /// caller as [`OperationError::Failed`].
    fn call<'a>(
        &'a self,
        node: &'a Node,
        inputs: &'a HashMap<String, Value>,
    ) -> BoxFuture<'a, Result<(), Box<dyn std::error::Error>>>;
}

/// A relationship event implementation (`link`/`unlink`).
pub trait RelationshipOperation {
    /// Runs the operation with `source` depending on `target`, with the
    /// relationship's bound `inputs`.
    ///
    /// # Errors
    ///
    /// Returns whatever error the operation raises, to be wrapped by the
    /// caller as [`OperationError::Failed`].
    fn call<'a>(
        &'a self,
        source: &'a Node,
        target: &'a Node,
        inputs: &'a HashMap<String, Value>,
    ) -> BoxFuture<'a, Result<(), Box<dyn std::error::Error>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_reference_splits_on_its_single_colon() {
        assert_eq!(
            parse_reference("warden_ops.noop:link").unwrap(),
            ("warden_ops.noop", "link")
        );
    }

    #[test]
    fn reference_with_embedded_double_colon_is_invalid() {
        assert!(parse_reference("warden_ops::noop:link").is_err());
    }

    #[test]
    fn reference_without_colon_is_invalid() {
        assert!(parse_reference("no_colon_here").is_err());
    }

    #[test]
    fn reference_with_two_colons_is_invalid() {
        assert!(parse_reference("module:symbol:extra").is_err());
    }

    #[test]
    fn empty_module_or_symbol_is_invalid() {
        assert!(parse_reference(":symbol").is_err());
        assert!(parse_reference("module:").is_err());
    }
}
