//! The base schema: one root field per Kubernetes list operation
//!
//! The base schema is produced from the API server's OpenAPI document and
//! later decorated with the `all` field. Each operation keeps its delegate
//! resolver so the `all` dispatchers can invoke it directly.

mod list;
mod openapi;
mod types;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, InputValue, Type, TypeRef};

use crate::error::{BuildError, BuildResult, ResolverError, ResolverResult};
use crate::graphql::resolver::{
    CallContext, OperationResolver, ResourceList, FIELD_SELECTOR_ARG, INCLUDE_UNINITIALIZED_ARG,
    LABEL_SELECTOR_ARG, NAMESPACE_ARG,
};

pub use list::{AuthMode, KubeListResolver};
pub use openapi::ListOperation;
pub use types::JSON_SCALAR;

/// An argument a list operation accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationArgument {
    /// The `{namespace}` path segment
    Namespace,
    FieldSelector,
    LabelSelector,
    IncludeUninitialized,
}

impl OperationArgument {
    /// GraphQL argument name, identical to the query parameter name
    pub fn name(self) -> &'static str {
        match self {
            Self::Namespace => NAMESPACE_ARG,
            Self::FieldSelector => FIELD_SELECTOR_ARG,
            Self::LabelSelector => LABEL_SELECTOR_ARG,
            Self::IncludeUninitialized => INCLUDE_UNINITIALIZED_ARG,
        }
    }

    /// Map a forwarded query parameter; other parameters are not exposed
    pub fn from_query_parameter(name: &str) -> Option<Self> {
        match name {
            FIELD_SELECTOR_ARG => Some(Self::FieldSelector),
            LABEL_SELECTOR_ARG => Some(Self::LabelSelector),
            INCLUDE_UNINITIALIZED_ARG => Some(Self::IncludeUninitialized),
            _ => None,
        }
    }

    fn input_value(self) -> InputValue {
        let type_ref = match self {
            Self::Namespace => TypeRef::named_nn(TypeRef::STRING),
            Self::IncludeUninitialized => TypeRef::named(TypeRef::BOOLEAN),
            Self::FieldSelector | Self::LabelSelector => TypeRef::named(TypeRef::STRING),
        };
        InputValue::new(self.name(), type_ref)
    }
}

/// A base root field together with the delegate that resolves it
pub struct OperationDescriptor {
    name: String,
    description: Option<String>,
    return_type: String,
    arguments: Vec<OperationArgument>,
    resolver: Arc<dyn OperationResolver>,
}

impl OperationDescriptor {
    pub fn new(
        name: impl Into<String>,
        return_type: impl Into<String>,
        resolver: Arc<dyn OperationResolver>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            return_type: return_type.into(),
            arguments: Vec::new(),
            resolver,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn argument(mut self, argument: OperationArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> &str {
        &self.return_type
    }

    pub fn arguments(&self) -> &[OperationArgument] {
        &self.arguments
    }

    /// Invoke the delegate
    pub async fn invoke(&self, call: CallContext) -> ResolverResult<ResourceList> {
        self.resolver.resolve(call).await
    }

    /// The root field exposing this operation
    pub(crate) fn query_field(self: &Arc<Self>) -> Field {
        let operation = Arc::clone(self);
        let mut field = Field::new(
            self.name.clone(),
            TypeRef::named(self.return_type.clone()),
            move |ctx| {
                let operation = Arc::clone(&operation);
                FieldFuture::new(async move {
                    let call = CallContext::from_field_arguments(&ctx)?;
                    let list = operation
                        .invoke(call)
                        .await
                        .map_err(ResolverError::into_graphql)?;
                    Ok(Some(FieldValue::owned_any(list)))
                })
            },
        );

        for argument in &self.arguments {
            field = field.argument(argument.input_value());
        }
        if let Some(description) = &self.description {
            field = field.description(description.clone());
        }
        field
    }
}

impl fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Operations and types of the undecorated schema
#[derive(Default)]
pub struct BaseSchema {
    operations: BTreeMap<String, Arc<OperationDescriptor>>,
    types: Vec<Type>,
    type_names: BTreeSet<String>,
}

impl BaseSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named type; names must be unique
    pub fn add_type(&mut self, name: impl Into<String>, ty: impl Into<Type>) -> BuildResult<()> {
        let name = name.into();
        if !self.type_names.insert(name.clone()) {
            return Err(BuildError::SchemaComposition(format!(
                "type '{}' is defined twice",
                name
            )));
        }
        self.types.push(ty.into());
        Ok(())
    }

    /// Add a root operation; names must be unique
    pub fn add_operation(&mut self, operation: OperationDescriptor) -> BuildResult<()> {
        if self.operations.contains_key(operation.name()) {
            return Err(BuildError::SchemaComposition(format!(
                "operation '{}' is defined twice",
                operation.name()
            )));
        }
        self.operations
            .insert(operation.name().to_string(), Arc::new(operation));
        Ok(())
    }

    pub fn operation(&self, name: &str) -> Option<&Arc<OperationDescriptor>> {
        self.operations.get(name)
    }

    pub fn operations(&self) -> impl Iterator<Item = &Arc<OperationDescriptor>> {
        self.operations.values()
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.type_names.contains(name)
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub(crate) fn into_parts(self) -> (Vec<Arc<OperationDescriptor>>, Vec<Type>) {
        (self.operations.into_values().collect(), self.types)
    }
}

impl fmt::Debug for BaseSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseSchema")
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .field("types", &self.type_names)
            .finish()
    }
}
