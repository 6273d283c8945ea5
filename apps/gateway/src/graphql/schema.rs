//! GraphQL schema composition for qlkube
//!
//! The executable schema is the base schema, unmodified, decorated with the
//! `all` root field and its composite type.

use async_graphql::dynamic::{Object, Schema};

use super::all::{assemble, CompositeType, ALL_FIELD, ALL_TYPE};
use super::base::BaseSchema;
use super::registry::KindRegistry;
use crate::error::{BuildError, BuildResult};

/// Name of the query root type
pub const QUERY_TYPE: &str = "Query";

/// The qlkube GraphQL schema type
pub type QlkubeSchema = Schema;

/// Builder that decorates a base schema with the `all` field
pub struct SchemaComposer {
    base: BaseSchema,
    registry: KindRegistry,
}

impl SchemaComposer {
    /// Start from a base schema with the stock Kubernetes kinds
    pub fn new(base: BaseSchema) -> Self {
        Self {
            base,
            registry: KindRegistry::kubernetes(),
        }
    }

    /// Replace the kinds aggregated under `all`
    pub fn registry(mut self, registry: KindRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Build the executable schema
    ///
    /// # Errors
    /// - `BuildError::MissingOperation` / `BuildError::ReturnTypeMismatch` -
    ///   A registered kind does not match the base schema
    /// - `BuildError::SchemaComposition` - Names collide or the engine
    ///   rejects the merged schema
    pub fn compose(self) -> BuildResult<QlkubeSchema> {
        let kinds = self.registry.resolve(&self.base)?;
        let composite = assemble(kinds)?;
        check_collisions(&self.base, &composite)?;

        let kind_count = composite.kinds.len();
        let (operations, types) = self.base.into_parts();
        let operation_count = operations.len();

        let mut query = Object::new(QUERY_TYPE);
        for operation in &operations {
            query = query.field(operation.query_field());
        }
        query = query.field(composite.root_field);

        let mut builder = Schema::build(QUERY_TYPE, None, None);
        for ty in types {
            builder = builder.register(ty);
        }

        let schema = builder
            .register(composite.object)
            .register(query)
            .finish()
            .map_err(|e| BuildError::SchemaComposition(e.to_string()))?;

        tracing::info!(
            operations = operation_count,
            kinds = kind_count,
            "GraphQL schema composed"
        );
        Ok(schema)
    }
}

/// Compose `base` with the kinds in `registry`
pub fn compose_schema(base: BaseSchema, registry: KindRegistry) -> BuildResult<QlkubeSchema> {
    SchemaComposer::new(base).registry(registry).compose()
}

fn check_collisions(base: &BaseSchema, composite: &CompositeType) -> BuildResult<()> {
    for name in [ALL_TYPE, QUERY_TYPE] {
        if base.has_type(name) {
            return Err(BuildError::SchemaComposition(format!(
                "type '{}' is already defined by the base schema",
                name
            )));
        }
    }

    let fields = std::iter::once(ALL_FIELD).chain(composite.kinds.iter().map(String::as_str));
    for name in fields {
        if base.operation(name).is_some() {
            return Err(BuildError::SchemaComposition(format!(
                "field '{}' collides with a base query field",
                name
            )));
        }
    }

    Ok(())
}
