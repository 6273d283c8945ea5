//! Delegate that performs a list operation against the API server

use async_trait::async_trait;
use qlkube_kube_client::{split_path, KubeClient};

use super::{ListOperation, OperationArgument};
use crate::error::{ResolverError, ResolverResult};
use crate::graphql::resolver::{
    BearerToken, CallContext, CompositeArgs, OperationResolver, ResourceList, NAMESPACE_ARG,
};

const NAMESPACE_SEGMENT: &str = "{namespace}";

/// Which credentials list calls carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// Send the caller's bearer token, or nothing when the caller has none
    #[default]
    Forward,
    /// Always send the gateway's service token
    Service,
}

impl std::str::FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "service" => Ok(Self::Service),
            other => Err(format!(
                "unknown auth mode '{}', expected 'forward' or 'service'",
                other
            )),
        }
    }
}

/// Resolves one list operation with a GET request
#[derive(Debug, Clone)]
pub struct KubeListResolver {
    client: KubeClient,
    path: String,
    arguments: Vec<OperationArgument>,
    auth: AuthMode,
}

impl KubeListResolver {
    pub fn new(client: KubeClient, operation: &ListOperation, auth: AuthMode) -> Self {
        Self {
            client,
            path: operation.path.clone(),
            arguments: operation.arguments.clone(),
            auth,
        }
    }

    /// Path segments with the namespace substituted
    fn segments(&self, args: &CompositeArgs) -> ResolverResult<Vec<String>> {
        split_path(&self.path)
            .map(|segment| {
                if segment == NAMESPACE_SEGMENT {
                    args.namespace()
                        .map(str::to_string)
                        .ok_or(ResolverError::MissingArgument(NAMESPACE_ARG))
                } else {
                    Ok(segment.to_string())
                }
            })
            .collect()
    }

    /// Query parameters for the arguments this operation declares
    fn query(&self, args: &CompositeArgs) -> Vec<(&'static str, String)> {
        self.arguments
            .iter()
            .filter_map(|argument| {
                let value = match argument {
                    OperationArgument::Namespace => None,
                    OperationArgument::FieldSelector => args.field_selector.clone(),
                    OperationArgument::LabelSelector => args.label_selector.clone(),
                    OperationArgument::IncludeUninitialized => {
                        args.include_uninitialized.map(|flag| flag.to_string())
                    }
                };
                value.map(|value| (argument.name(), value))
            })
            .collect()
    }

    fn token<'a>(&'a self, call: &'a CallContext) -> Option<&'a str> {
        match self.auth {
            AuthMode::Forward => call.token.as_ref().map(BearerToken::as_str),
            AuthMode::Service => self.client.service_token(),
        }
    }
}

#[async_trait]
impl OperationResolver for KubeListResolver {
    async fn resolve(&self, call: CallContext) -> ResolverResult<ResourceList> {
        let segments = self.segments(&call.args)?;
        let query = self.query(&call.args);

        tracing::debug!(field = %call.field, path = %self.path, "Listing resources");
        Ok(self
            .client
            .get_json(segments, &query, self.token(&call))
            .await?)
    }
}
