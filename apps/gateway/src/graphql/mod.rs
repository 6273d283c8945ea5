//! GraphQL schema and resolvers for qlkube
//!
//! This module contains the dynamic async-graphql schema including:
//! - The base schema generated from the API server's OpenAPI document
//! - The kind registry naming the operations aggregated under `all`
//! - Dispatchers choosing between namespaced and cluster-wide operations
//! - Composition of the base schema with the `all` field

pub mod all;
pub mod base;
pub mod dispatch;
pub mod registry;
pub mod resolver;
pub mod schema;

pub use base::{AuthMode, BaseSchema, KubeListResolver, ListOperation, OperationDescriptor};
pub use registry::KindRegistry;
pub use resolver::{BearerToken, CallContext, CompositeArgs, OperationResolver, ResourceList};
pub use schema::{compose_schema, QlkubeSchema, SchemaComposer};
