//! Discovery of list operations in a Swagger 2.0 document

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::types::{sanitize_name, TypeCatalog};
use super::{BaseSchema, OperationArgument, OperationDescriptor};
use crate::error::{BuildError, BuildResult};
use crate::graphql::resolver::OperationResolver;

const LIST_ACTION: &str = "list";
const DEFINITION_PREFIX: &str = "#/definitions/";
const PARAMETER_PREFIX: &str = "#/parameters/";
const NAMESPACE_PLACEHOLDER: &str = "{namespace}";

#[derive(Debug, Deserialize)]
struct OpenApiDocument {
    paths: BTreeMap<String, PathItem>,
    #[serde(default)]
    parameters: BTreeMap<String, Parameter>,
    #[serde(default)]
    definitions: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct PathItem {
    get: Option<Operation>,
    #[serde(default)]
    parameters: Vec<Parameter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Operation {
    operation_id: Option<String>,
    description: Option<String>,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(default)]
    responses: BTreeMap<String, Response>,
    #[serde(rename = "x-kubernetes-action")]
    action: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Parameter {
    name: Option<String>,
    #[serde(rename = "in")]
    location: Option<String>,
    #[serde(rename = "$ref")]
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Response {
    schema: Option<Value>,
}

/// A list operation found in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOperation {
    pub operation_id: String,
    /// Path template, e.g. `/api/v1/namespaces/{namespace}/pods`
    pub path: String,
    pub description: Option<String>,
    /// Definition key of the 200 response, e.g. `io.k8s.api.core.v1.PodList`
    pub return_definition: String,
    pub arguments: Vec<OperationArgument>,
}

impl ListOperation {
    pub fn is_namespaced(&self) -> bool {
        self.arguments.contains(&OperationArgument::Namespace)
    }
}

impl BaseSchema {
    /// Build the base schema from an OpenAPI v2 document
    ///
    /// One root field is created per list operation; `resolver` supplies the
    /// delegate that performs the call.
    pub fn from_openapi<F>(document: &Value, resolver: F) -> BuildResult<Self>
    where
        F: Fn(&ListOperation) -> Arc<dyn OperationResolver>,
    {
        let document = OpenApiDocument::deserialize(document)
            .map_err(|e| BuildError::InvalidOpenApi(e.to_string()))?;
        let operations = list_operations(&document)?;

        let mut catalog = TypeCatalog::new(&document.definitions);
        let mut base = BaseSchema::new();

        for operation in &operations {
            let Some(return_type) = catalog.object_type(&operation.return_definition) else {
                tracing::debug!(
                    operation = %operation.operation_id,
                    definition = %operation.return_definition,
                    "Skipping list operation without an object return type"
                );
                continue;
            };

            let mut descriptor = OperationDescriptor::new(
                sanitize_name(&operation.operation_id),
                return_type,
                resolver(operation),
            );
            if let Some(description) = &operation.description {
                descriptor = descriptor.description(description.clone());
            }
            for argument in &operation.arguments {
                descriptor = descriptor.argument(*argument);
            }
            base.add_operation(descriptor)?;
        }

        for (name, ty) in catalog.finish() {
            base.add_type(name, ty)?;
        }

        tracing::info!(
            operations = base.operation_count(),
            types = base.type_count(),
            "Built base schema from OpenAPI document"
        );
        Ok(base)
    }
}

fn list_operations(document: &OpenApiDocument) -> BuildResult<Vec<ListOperation>> {
    let mut operations = Vec::new();

    for (path, item) in &document.paths {
        let Some(get) = &item.get else { continue };
        if get.action.as_deref() != Some(LIST_ACTION) {
            continue;
        }
        let Some(operation_id) = &get.operation_id else {
            tracing::debug!(path = %path, "Skipping list operation without operationId");
            continue;
        };

        let placeholders = path.matches('{').count();
        let namespaced = path.contains(NAMESPACE_PLACEHOLDER);
        if placeholders > usize::from(namespaced) {
            tracing::debug!(
                operation = %operation_id,
                path = %path,
                "Skipping list operation with unsupported path parameters"
            );
            continue;
        }

        let Some(return_definition) = get
            .responses
            .get("200")
            .and_then(|response| response.schema.as_ref())
            .and_then(|schema| schema.get("$ref"))
            .and_then(Value::as_str)
            .and_then(|reference| reference.strip_prefix(DEFINITION_PREFIX))
        else {
            tracing::debug!(operation = %operation_id, "Skipping list operation without a 200 schema");
            continue;
        };

        let mut arguments = Vec::new();
        if namespaced {
            arguments.push(OperationArgument::Namespace);
        }
        for parameter in item.parameters.iter().chain(&get.parameters) {
            let (name, location) = resolve_parameter(parameter, &document.parameters)?;
            if location != "query" {
                continue;
            }
            if let Some(argument) = OperationArgument::from_query_parameter(&name) {
                if !arguments.contains(&argument) {
                    arguments.push(argument);
                }
            }
        }

        operations.push(ListOperation {
            operation_id: operation_id.clone(),
            path: path.clone(),
            description: get.description.clone(),
            return_definition: return_definition.to_string(),
            arguments,
        });
    }

    Ok(operations)
}

/// Resolve a parameter, following a `#/parameters/...` reference
fn resolve_parameter(
    parameter: &Parameter,
    shared: &BTreeMap<String, Parameter>,
) -> BuildResult<(String, String)> {
    let parameter = match &parameter.reference {
        Some(reference) => reference
            .strip_prefix(PARAMETER_PREFIX)
            .and_then(|key| shared.get(key))
            .ok_or_else(|| {
                BuildError::InvalidOpenApi(format!("unresolved parameter reference '{}'", reference))
            })?,
        None => parameter,
    };

    match (&parameter.name, &parameter.location) {
        (Some(name), Some(location)) => Ok((name.clone(), location.clone())),
        _ => Err(BuildError::InvalidOpenApi(
            "parameter without name or location".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::resolver::testing::RecordingResolver;
    use assert_matches::assert_matches;
    use qlkube_test_utils::OpenApiFixture;
    use serde_json::json;

    fn recorder(_: &ListOperation) -> Arc<dyn OperationResolver> {
        RecordingResolver::returning(json!({"items": []}))
    }

    fn operations(document: Value) -> Vec<ListOperation> {
        let document = OpenApiDocument::deserialize(&document).unwrap();
        list_operations(&document).unwrap()
    }

    #[test]
    fn test_list_operations_from_kubernetes_document() {
        let found = operations(
            OpenApiFixture::new()
                .list_operation("listCoreV1PodForAllNamespaces", "/api/v1/pods", "io.k8s.api.core.v1.Pod")
                .list_operation(
                    "listCoreV1NamespacedPod",
                    "/api/v1/namespaces/{namespace}/pods",
                    "io.k8s.api.core.v1.Pod",
                )
                .build(),
        );

        assert_eq!(found.len(), 2);
        let namespaced = found
            .iter()
            .find(|op| op.operation_id == "listCoreV1NamespacedPod")
            .unwrap();
        assert!(namespaced.is_namespaced());
        assert_eq!(namespaced.return_definition, "io.k8s.api.core.v1.PodList");
        assert_eq!(
            namespaced.arguments,
            vec![
                OperationArgument::Namespace,
                OperationArgument::FieldSelector,
                OperationArgument::LabelSelector,
            ]
        );

        let cluster_wide = found
            .iter()
            .find(|op| op.operation_id == "listCoreV1PodForAllNamespaces")
            .unwrap();
        assert!(!cluster_wide.is_namespaced());
    }

    #[test]
    fn test_non_list_operations_are_ignored() {
        let found = operations(
            OpenApiFixture::new()
                .path(
                    "/api/v1/namespaces/{namespace}/pods/{name}",
                    json!({"get": {
                        "operationId": "readCoreV1NamespacedPod",
                        "x-kubernetes-action": "get",
                        "responses": {"200": {"schema": {"$ref": "#/definitions/io.k8s.api.core.v1.Pod"}}}
                    }}),
                )
                .path(
                    "/api/v1/watch/pods",
                    json!({"get": {
                        "operationId": "watchCoreV1PodListForAllNamespaces",
                        "x-kubernetes-action": "watchlist",
                        "responses": {"200": {"schema": {"$ref": "#/definitions/io.k8s.apimachinery.pkg.apis.meta.v1.WatchEvent"}}}
                    }}),
                )
                .build(),
        );

        assert!(found.is_empty());
    }

    #[test]
    fn test_unresolved_parameter_reference() {
        let document = OpenApiFixture::new()
            .path(
                "/api/v1/pods",
                json!({"get": {
                    "operationId": "listPods",
                    "x-kubernetes-action": "list",
                    "parameters": [{"$ref": "#/parameters/does-not-exist"}],
                    "responses": {"200": {"schema": {"$ref": "#/definitions/io.k8s.apimachinery.pkg.apis.meta.v1.ListMeta"}}}
                }}),
            )
            .build();

        let result = BaseSchema::from_openapi(&document, recorder);
        assert_matches!(result, Err(BuildError::InvalidOpenApi(msg)) if msg.contains("does-not-exist"));
    }

    #[test]
    fn test_document_without_paths_is_invalid() {
        let result = BaseSchema::from_openapi(&json!({"swagger": "2.0"}), recorder);
        assert_matches!(result, Err(BuildError::InvalidOpenApi(_)));
    }

    #[test]
    fn test_base_schema_from_kubernetes_document() {
        let document = OpenApiFixture::kubernetes().build();
        let base = BaseSchema::from_openapi(&document, recorder).unwrap();

        let pods = base.operation("listCoreV1NamespacedPod").unwrap();
        assert_eq!(pods.return_type(), "IoK8sApiCoreV1PodList");
        assert!(base.has_type("IoK8sApiCoreV1PodList"));
        assert!(base.has_type("IoK8sApiCoreV1Pod"));
        assert!(base.has_type("IoK8sApimachineryPkgApisMetaV1ObjectMeta"));
        assert!(base.operation("listCoreV1Namespace").is_some());
        assert_eq!(base.operation_count(), 17);
    }
}
