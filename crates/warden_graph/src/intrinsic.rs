//! Intrinsic template functions (§4.3): references that resolve lazily
//! against a live node set rather than being baked in at parse time.

use crate::node::{NodeError, PropertyResolver};
use crate::value::Value;

/// A `get_input` / `get_property` / `get_attribute` reference embedded in a
/// node template's declared properties or interface inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum IntrinsicRef {
    /// `get_input: <name>` — resolved against the deployment's bound inputs.
    GetInput {
        /// Name of the top-level template input.
        input_name: String,
    },
    /// `get_property: [<node>, <property>]` — resolved against another
    /// node's (already-materialized) declared property.
    GetProperty {
        /// Name of the node template owning the property.
        node_template_name: String,
        /// Name of the property.
        property_name: String,
    },
    /// `get_attribute: [<node>, <attribute>]` — resolved against another
    /// node's runtime attribute view, populated as operations run.
    GetAttribute {
        /// Name of the node template owning the attribute.
        node_template_name: String,
        /// Name of the attribute.
        attribute_name: String,
    },
}

impl IntrinsicRef {
    /// The node template name this reference depends on, if any (bare
    /// `get_input` references depend on nothing).
    #[must_use]
    pub fn depends_on(&self) -> Option<&str> {
        match self {
            IntrinsicRef::GetInput { .. } => None,
            IntrinsicRef::GetProperty {
                node_template_name, ..
            }
            | IntrinsicRef::GetAttribute {
                node_template_name, ..
            } => Some(node_template_name),
        }
    }
}

/// A declared property's value: either a literal or an unresolved
/// intrinsic reference, materialized on every read per §4.3.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A literal value, already in final form.
    Literal(Value),
    /// An intrinsic reference resolved against the live node set.
    Intrinsic(IntrinsicRef),
}

/// Materializes a declared property or output value: a literal is cloned
/// as-is, an intrinsic reference is resolved against `resolver` (§4.3).
///
/// Shared by [`crate::node::Node::property`] and by the context facade's
/// output resolution, which walks the same literal/intrinsic shape.
///
/// # Errors
///
/// Returns whatever error `resolver` raises for an intrinsic reference it
/// cannot satisfy.
pub fn resolve(value: &PropertyValue, resolver: &dyn PropertyResolver) -> Result<Value, NodeError> {
    match value {
        PropertyValue::Literal(value) => Ok(value.clone()),
        PropertyValue::Intrinsic(IntrinsicRef::GetInput { input_name }) => resolver.resolve_input(input_name),
        PropertyValue::Intrinsic(IntrinsicRef::GetProperty {
            node_template_name,
            property_name,
        }) => resolver.resolve_property(node_template_name, property_name),
        PropertyValue::Intrinsic(IntrinsicRef::GetAttribute {
            node_template_name,
            attribute_name,
        }) => resolver.resolve_attribute(node_template_name, attribute_name),
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        PropertyValue::Literal(value)
    }
}

impl From<IntrinsicRef> for PropertyValue {
    fn from(reference: IntrinsicRef) -> Self {
        PropertyValue::Intrinsic(reference)
    }
}
