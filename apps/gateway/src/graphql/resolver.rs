//! The resolver contract shared by base operations and the `all` dispatchers
//!
//! Every delegate is an [`OperationResolver`]: it takes one [`CallContext`]
//! and yields a [`ResourceList`]. The call context stands for the usual
//! `(parent, args, context, info)` quadruple: the argument bag plays both the
//! parent and argument roles, the bearer token is the request context and the
//! field name is the execution info.

use std::fmt;

use async_graphql::dynamic::{ObjectAccessor, ResolverContext};
use async_trait::async_trait;

use crate::error::ResolverResult;

/// Opaque Kubernetes list payload (`{ apiVersion, kind, metadata, items }`)
pub type ResourceList = serde_json::Value;

pub const FIELD_SELECTOR_ARG: &str = "fieldSelector";
pub const LABEL_SELECTOR_ARG: &str = "labelSelector";
pub const NAMESPACE_ARG: &str = "namespace";
pub const INCLUDE_UNINITIALIZED_ARG: &str = "includeUninitialized";

/// Arguments accepted by `all` and forwarded to every nested kind field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeArgs {
    pub field_selector: Option<String>,
    pub label_selector: Option<String>,
    pub namespace: Option<String>,
    /// Forwarded only to operations that declare the parameter
    pub include_uninitialized: Option<bool>,
}

impl CompositeArgs {
    /// Arguments scoped to one namespace
    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Self::default()
        }
    }

    /// The requested namespace; an empty string counts as absent
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    /// Read the bag from field arguments, ignoring arguments that are not
    /// declared or are explicitly null
    pub fn from_arguments(args: &ObjectAccessor<'_>) -> async_graphql::Result<Self> {
        let include_uninitialized = match args.get(INCLUDE_UNINITIALIZED_ARG) {
            Some(value) if !value.is_null() => Some(value.boolean()?),
            _ => None,
        };

        Ok(Self {
            field_selector: string_argument(args, FIELD_SELECTOR_ARG)?,
            label_selector: string_argument(args, LABEL_SELECTOR_ARG)?,
            namespace: string_argument(args, NAMESPACE_ARG)?,
            include_uninitialized,
        })
    }
}

fn string_argument(args: &ObjectAccessor<'_>, name: &str) -> async_graphql::Result<Option<String>> {
    match args.get(name) {
        Some(value) if !value.is_null() => Ok(Some(value.string()?.to_string())),
        _ => Ok(None),
    }
}

/// Caller credentials taken from the HTTP `Authorization` header
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

/// Everything a delegate needs to perform one call
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub args: CompositeArgs,
    pub token: Option<BearerToken>,
    /// Name of the GraphQL field being resolved
    pub field: String,
}

impl CallContext {
    pub fn new(args: CompositeArgs) -> Self {
        Self {
            args,
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: BearerToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Context for a field nested under `all`: the arguments are the parent
    /// value produced by the `all` resolver, the field's own arguments are
    /// ignored.
    pub fn from_parent(ctx: &ResolverContext<'_>) -> async_graphql::Result<Self> {
        let args = ctx.parent_value.try_downcast_ref::<CompositeArgs>()?.clone();
        Ok(Self::capture(ctx, args))
    }

    /// Context for a base operation field invoked directly
    pub fn from_field_arguments(ctx: &ResolverContext<'_>) -> async_graphql::Result<Self> {
        let args = CompositeArgs::from_arguments(&ctx.args)?;
        Ok(Self::capture(ctx, args))
    }

    fn capture(ctx: &ResolverContext<'_>, args: CompositeArgs) -> Self {
        Self {
            args,
            token: ctx.data_opt::<BearerToken>().cloned(),
            field: ctx.field().name().to_string(),
        }
    }
}

/// A resolvable list operation
#[async_trait]
pub trait OperationResolver: Send + Sync {
    async fn resolve(&self, call: CallContext) -> ResolverResult<ResourceList>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Instrumented resolvers for dispatch tests

    use std::sync::{Arc, Mutex};

    use qlkube_kube_client::KubeError;

    use super::*;
    use crate::error::ResolverError;

    enum Reply {
        List(ResourceList),
        Status(u16),
    }

    /// Records every call and answers with a fixed reply
    pub struct RecordingResolver {
        reply: Reply,
        calls: Mutex<Vec<CallContext>>,
    }

    impl RecordingResolver {
        pub fn returning(list: ResourceList) -> Arc<Self> {
            Arc::new(Self {
                reply: Reply::List(list),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Reply::Status(status),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> Vec<CallContext> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl OperationResolver for RecordingResolver {
        async fn resolve(&self, call: CallContext) -> ResolverResult<ResourceList> {
            self.calls.lock().unwrap().push(call);
            match &self.reply {
                Reply::List(list) => Ok(list.clone()),
                Reply::Status(status) => Err(ResolverError::Kube(KubeError::Api {
                    status: *status,
                    reason: "Failure".to_string(),
                    message: format!("upstream answered {}", status),
                })),
            }
        }
    }
}
