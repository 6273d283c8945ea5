//! Resolvers for the fields of the `all` type
//!
//! A paired kind chooses its delegate from the `namespace` argument: a
//! non-empty namespace selects the namespaced operation, anything else the
//! cluster-wide one. The call is forwarded unchanged and the delegate's
//! result or error is returned as is. The namespaces kind has no namespaced
//! operation and filters the cluster-wide list by name instead.

use std::sync::Arc;

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, TypeRef};
use async_trait::async_trait;
use serde_json::Value;

use super::base::OperationDescriptor;
use super::registry::{NamespaceSource, OperationPair, ResolvedKind};
use super::resolver::{CallContext, CompositeArgs, ResourceList};
use crate::error::{ResolverError, ResolverResult};

/// Resolves one field of the `all` type
#[async_trait]
pub trait KindDispatcher: Send + Sync {
    /// Field name on the `all` type
    fn kind(&self) -> &str;

    fn return_type(&self) -> &str;

    fn description(&self) -> String;

    async fn dispatch(&self, call: CallContext) -> ResolverResult<ResourceList>;
}

/// Dispatches between the two operations of a pair
#[derive(Debug, Clone)]
pub struct DelegatingField {
    pair: OperationPair,
}

impl DelegatingField {
    pub fn new(pair: OperationPair) -> Self {
        Self { pair }
    }

    /// The delegate `args` select
    pub fn select(&self, args: &CompositeArgs) -> &Arc<OperationDescriptor> {
        if args.namespace().is_some() {
            &self.pair.namespaced
        } else {
            &self.pair.all_namespaces
        }
    }
}

#[async_trait]
impl KindDispatcher for DelegatingField {
    fn kind(&self) -> &str {
        &self.pair.kind
    }

    fn return_type(&self) -> &str {
        self.pair.return_type()
    }

    fn description(&self) -> String {
        format!("All {} in all namespaces, or in `namespace` when given.", self.pair.kind)
    }

    async fn dispatch(&self, call: CallContext) -> ResolverResult<ResourceList> {
        let operation = self.select(&call.args);
        tracing::debug!(
            kind = %self.pair.kind,
            operation = operation.name(),
            "Dispatching kind field"
        );
        operation.invoke(call).await
    }
}

/// Lists namespaces, narrowed to one when a namespace is given
#[derive(Debug, Clone)]
pub struct NamespaceField {
    source: NamespaceSource,
}

impl NamespaceField {
    pub fn new(source: NamespaceSource) -> Self {
        Self { source }
    }
}

#[async_trait]
impl KindDispatcher for NamespaceField {
    fn kind(&self) -> &str {
        &self.source.kind
    }

    fn return_type(&self) -> &str {
        self.source.all_namespaces.return_type()
    }

    fn description(&self) -> String {
        "All namespaces, or only `namespace` when given.".to_string()
    }

    async fn dispatch(&self, call: CallContext) -> ResolverResult<ResourceList> {
        let name = call.args.namespace().map(str::to_string);
        tracing::debug!(
            kind = %self.source.kind,
            operation = self.source.all_namespaces.name(),
            filter = ?name,
            "Dispatching namespace field"
        );
        let list = self.source.all_namespaces.invoke(call).await?;

        match name {
            Some(name) => filter_namespaces(list, &name),
            None => Ok(list),
        }
    }
}

/// Keep only the items whose `metadata.name` equals `name`
///
/// # Errors
/// Returns `ResolverError::UnexpectedShape` if the list has no `items` array
/// or an item has no string `metadata.name`.
pub fn filter_namespaces(mut list: ResourceList, name: &str) -> ResolverResult<ResourceList> {
    let items = list
        .get_mut("items")
        .and_then(Value::as_array_mut)
        .ok_or_else(|| ResolverError::UnexpectedShape("list has no items array".to_string()))?;

    if items.iter().any(|item| item_name(item).is_none()) {
        return Err(ResolverError::UnexpectedShape(
            "list item has no metadata.name".to_string(),
        ));
    }

    items.retain(|item| item_name(item) == Some(name));
    Ok(list)
}

fn item_name(item: &Value) -> Option<&str> {
    item.pointer("/metadata/name").and_then(Value::as_str)
}

/// The GraphQL field for a resolved kind
pub fn kind_field(kind: ResolvedKind) -> Field {
    let dispatcher: Arc<dyn KindDispatcher> = match kind {
        ResolvedKind::Paired(pair) => Arc::new(DelegatingField::new(pair)),
        ResolvedKind::NamespaceFiltered(source) => Arc::new(NamespaceField::new(source)),
    };

    let name = dispatcher.kind().to_string();
    let return_type = TypeRef::named(dispatcher.return_type());
    let description = dispatcher.description();

    Field::new(name, return_type, move |ctx| {
        let dispatcher = Arc::clone(&dispatcher);
        FieldFuture::new(async move {
            let call = CallContext::from_parent(&ctx)?;
            let list = dispatcher
                .dispatch(call)
                .await
                .map_err(ResolverError::into_graphql)?;
            Ok(Some(FieldValue::owned_any(list)))
        })
    })
    .description(description)
}
