//! The `all` composite type and its root field
//!
//! `all` resolves to the argument bag it was called with; each nested kind
//! field receives that bag as its parent value.

use std::collections::BTreeSet;

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputValue, Object, ResolverContext, TypeRef,
};

use super::dispatch::kind_field;
use super::registry::ResolvedKind;
use super::resolver::{
    CompositeArgs, FIELD_SELECTOR_ARG, INCLUDE_UNINITIALIZED_ARG, LABEL_SELECTOR_ARG,
    NAMESPACE_ARG,
};
use crate::error::{BuildError, BuildResult};

/// Name of the root field
pub const ALL_FIELD: &str = "all";

/// Name of the composite object type
pub const ALL_TYPE: &str = "all";

/// The composite type with its root field, ready to register
pub struct CompositeType {
    pub object: Object,
    pub root_field: Field,
    /// Kind field names, in registration order
    pub kinds: Vec<String>,
}

/// Assemble the `all` type from resolved kinds
///
/// # Errors
/// Returns `BuildError::SchemaComposition` when no kinds are given or two
/// kinds share a field name.
pub fn assemble(kinds: Vec<ResolvedKind>) -> BuildResult<CompositeType> {
    if kinds.is_empty() {
        return Err(BuildError::SchemaComposition(
            "at least one kind must be registered".to_string(),
        ));
    }

    let mut seen = BTreeSet::new();
    let mut names = Vec::with_capacity(kinds.len());
    let mut object = Object::new(ALL_TYPE).description("All kube resources.");

    for kind in kinds {
        let name = kind.kind().to_string();
        if !seen.insert(name.clone()) {
            return Err(BuildError::SchemaComposition(format!(
                "kind '{}' is registered twice",
                name
            )));
        }
        object = object.field(kind_field(kind));
        names.push(name);
    }

    Ok(CompositeType {
        object,
        root_field: root_field(),
        kinds: names,
    })
}

fn root_field() -> Field {
    Field::new(ALL_FIELD, TypeRef::named(ALL_TYPE), resolve_arguments)
        .description("Kube resources of every registered kind.")
        .argument(
            InputValue::new(FIELD_SELECTOR_ARG, TypeRef::named(TypeRef::STRING))
                .description("A selector to restrict the list of returned objects by their fields."),
        )
        .argument(
            InputValue::new(LABEL_SELECTOR_ARG, TypeRef::named(TypeRef::STRING))
                .description("A selector to restrict the list of returned objects by their labels."),
        )
        .argument(
            InputValue::new(NAMESPACE_ARG, TypeRef::named(TypeRef::STRING))
                .description("Only return objects in this namespace."),
        )
        .argument(
            InputValue::new(INCLUDE_UNINITIALIZED_ARG, TypeRef::named(TypeRef::BOOLEAN))
                .description("Include partially initialized resources where supported."),
        )
}

fn resolve_arguments(ctx: ResolverContext<'_>) -> FieldFuture<'_> {
    let args = CompositeArgs::from_arguments(&ctx.args);
    FieldFuture::new(async move { Ok(Some(FieldValue::owned_any(args?))) })
}
