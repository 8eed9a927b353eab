//! The built-in no-op lifecycle and relationship operations (§4.4),
//! registered by default under [`NOOP_REFERENCE`], [`LINK_REFERENCE`], and
//! [`UNLINK_REFERENCE`].
//!
//! `link` propagates a target's runtime attributes onto its source;
//! `unlink` removes whatever `link` added. Together they give every
//! relationship a usable default so a template author only has to declare
//! an explicit `Configure` interface when the default isn't enough.

use hashbrown::HashMap;
use warden_graph::{Node, Value};

use crate::operation::{BoxFuture, StandardOperation};
use crate::RelationshipOperation;

/// Reference under which the built-in no-op standard operation is
/// registered.
pub const NOOP_REFERENCE: &str = "warden_ops.noop:noop";
/// Reference under which the built-in `link` relationship is registered.
pub const LINK_REFERENCE: &str = "warden_ops.noop:link";
/// Reference under which the built-in `unlink` relationship is registered.
pub const UNLINK_REFERENCE: &str = "warden_ops.noop:unlink";

/// A standard-interface event with no declared implementation resolves to
/// this: it does nothing and always succeeds.
pub struct Noop;

impl StandardOperation for Noop {
    fn call<'a>(
        &'a self,
        _node: &'a Node,
        _inputs: &'a HashMap<String, Value>,
    ) -> BoxFuture<'a, Result<(), Box<dyn std::error::Error>>> {
        Box::pin(async { Ok(()) })
    }
}

/// Copies every entry of the target's runtime attribute view onto the
/// source, overwriting any keys already present.
pub struct Link;

impl RelationshipOperation for Link {
    fn call<'a>(
        &'a self,
        source: &'a Node,
        target: &'a Node,
        _inputs: &'a HashMap<String, Value>,
    ) -> BoxFuture<'a, Result<(), Box<dyn std::error::Error>>> {
        Box::pin(async move {
            let snapshot = target.attributes_snapshot();
            source.batch_update_attributes(&snapshot);
            Ok(())
        })
    }
}

/// Removes from the source every key also present in the target's runtime
/// attribute view, undoing a prior [`Link`].
pub struct Unlink;

impl RelationshipOperation for Unlink {
    fn call<'a>(
        &'a self,
        source: &'a Node,
        target: &'a Node,
        _inputs: &'a HashMap<String, Value>,
    ) -> BoxFuture<'a, Result<(), Box<dyn std::error::Error>>> {
        Box::pin(async move {
            let snapshot = target.attributes_snapshot();
            source.remove_attributes(&snapshot);
            Ok(())
        })
    }
}
