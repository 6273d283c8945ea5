//! OpenAPI and resource list fixtures shaped like a Kubernetes API server's

use serde_json::{json, Map, Value};

/// A list operation pair as served by a real API server
#[derive(Debug, Clone, Copy)]
pub struct ListKindFixture {
    /// Definition name of the item type, e.g. `io.k8s.api.core.v1.Pod`
    pub definition: &'static str,
    /// `(operationId, path)` of the cluster-wide list operation
    pub all_namespaces: (&'static str, &'static str),
    /// `(operationId, path)` of the namespaced list operation, if any
    pub namespaced: Option<(&'static str, &'static str)>,
}

/// The list operations qlkube aggregates by default
pub const KUBE_KINDS: &[ListKindFixture] = &[
    ListKindFixture {
        definition: "io.k8s.api.core.v1.Service",
        all_namespaces: ("listCoreV1ServiceForAllNamespaces", "/api/v1/services"),
        namespaced: Some((
            "listCoreV1NamespacedService",
            "/api/v1/namespaces/{namespace}/services",
        )),
    },
    ListKindFixture {
        definition: "io.k8s.api.apps.v1.Deployment",
        all_namespaces: ("listAppsV1DeploymentForAllNamespaces", "/apis/apps/v1/deployments"),
        namespaced: Some((
            "listAppsV1NamespacedDeployment",
            "/apis/apps/v1/namespaces/{namespace}/deployments",
        )),
    },
    ListKindFixture {
        definition: "io.k8s.api.core.v1.Pod",
        all_namespaces: ("listCoreV1PodForAllNamespaces", "/api/v1/pods"),
        namespaced: Some((
            "listCoreV1NamespacedPod",
            "/api/v1/namespaces/{namespace}/pods",
        )),
    },
    ListKindFixture {
        definition: "io.k8s.api.apps.v1.DaemonSet",
        all_namespaces: ("listAppsV1DaemonSetForAllNamespaces", "/apis/apps/v1/daemonsets"),
        namespaced: Some((
            "listAppsV1NamespacedDaemonSet",
            "/apis/apps/v1/namespaces/{namespace}/daemonsets",
        )),
    },
    ListKindFixture {
        definition: "io.k8s.api.apps.v1.ReplicaSet",
        all_namespaces: ("listAppsV1ReplicaSetForAllNamespaces", "/apis/apps/v1/replicasets"),
        namespaced: Some((
            "listAppsV1NamespacedReplicaSet",
            "/apis/apps/v1/namespaces/{namespace}/replicasets",
        )),
    },
    ListKindFixture {
        definition: "io.k8s.api.apps.v1.StatefulSet",
        all_namespaces: (
            "listAppsV1StatefulSetForAllNamespaces",
            "/apis/apps/v1/statefulsets",
        ),
        namespaced: Some((
            "listAppsV1NamespacedStatefulSet",
            "/apis/apps/v1/namespaces/{namespace}/statefulsets",
        )),
    },
    ListKindFixture {
        definition: "io.k8s.api.batch.v1.Job",
        all_namespaces: ("listBatchV1JobForAllNamespaces", "/apis/batch/v1/jobs"),
        namespaced: Some((
            "listBatchV1NamespacedJob",
            "/apis/batch/v1/namespaces/{namespace}/jobs",
        )),
    },
    ListKindFixture {
        definition: "io.k8s.api.batch.v1.CronJob",
        all_namespaces: ("listBatchV1CronJobForAllNamespaces", "/apis/batch/v1/cronjobs"),
        namespaced: Some((
            "listBatchV1NamespacedCronJob",
            "/apis/batch/v1/namespaces/{namespace}/cronjobs",
        )),
    },
    ListKindFixture {
        definition: "io.k8s.api.core.v1.Namespace",
        all_namespaces: ("listCoreV1Namespace", "/api/v1/namespaces"),
        namespaced: None,
    },
];

const OBJECT_META: &str = "io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta";
const LIST_META: &str = "io.k8s.apimachinery.pkg.apis.meta.v1.ListMeta";
const TIME: &str = "io.k8s.apimachinery.pkg.apis.meta.v1.Time";

/// Builder for a Swagger 2.0 document with Kubernetes-style list operations
///
/// Shared parameters are emitted as `$ref`s into the `parameters` section the
/// way the API server publishes them.
#[derive(Debug, Clone)]
pub struct OpenApiFixture {
    paths: Map<String, Value>,
    definitions: Map<String, Value>,
}

impl Default for OpenApiFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenApiFixture {
    /// Start a document holding only the shared metadata definitions
    pub fn new() -> Self {
        let mut definitions = Map::new();
        definitions.insert(
            OBJECT_META.to_string(),
            json!({
                "description": "Standard object's metadata.",
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "namespace": {"type": "string"},
                    "uid": {"type": "string"},
                    "generation": {"type": "integer", "format": "int64"},
                    "labels": {
                        "type": "object",
                        "additionalProperties": {"type": "string"}
                    },
                    "creationTimestamp": {"$ref": format!("#/definitions/{}", TIME)}
                }
            }),
        );
        definitions.insert(
            LIST_META.to_string(),
            json!({
                "type": "object",
                "properties": {
                    "resourceVersion": {"type": "string"},
                    "continue": {"type": "string"},
                    "remainingItemCount": {"type": "integer", "format": "int64"}
                }
            }),
        );
        definitions.insert(
            TIME.to_string(),
            json!({"type": "string", "format": "date-time"}),
        );

        Self {
            paths: Map::new(),
            definitions,
        }
    }

    /// A document with every default kind
    pub fn kubernetes() -> Self {
        KUBE_KINDS.iter().fold(Self::new(), |fixture, kind| {
            let fixture = fixture.list_operation(
                kind.all_namespaces.0,
                kind.all_namespaces.1,
                kind.definition,
            );
            match kind.namespaced {
                Some((operation_id, path)) => {
                    fixture.list_operation(operation_id, path, kind.definition)
                }
                None => fixture,
            }
        })
    }

    /// Add a list operation returning `<item_definition>List`
    ///
    /// The item and list definitions are created on first use. Paths
    /// containing `{namespace}` get the namespace path parameter.
    pub fn list_operation(mut self, operation_id: &str, path: &str, item_definition: &str) -> Self {
        let list_definition = format!("{}List", item_definition);
        let kind = item_definition.rsplit('.').next().unwrap_or(item_definition);

        self.definitions
            .entry(item_definition.to_string())
            .or_insert_with(|| {
                json!({
                    "description": format!("{} resource.", kind),
                    "type": "object",
                    "properties": {
                        "apiVersion": {"type": "string"},
                        "kind": {"type": "string"},
                        "metadata": {"$ref": format!("#/definitions/{}", OBJECT_META)},
                        "spec": {"type": "object"},
                        "status": {
                            "type": "object",
                            "additionalProperties": {"type": "string"}
                        }
                    }
                })
            });
        self.definitions
            .entry(list_definition.clone())
            .or_insert_with(|| {
                json!({
                    "description": format!("{}List is a list of {}.", kind, kind),
                    "type": "object",
                    "required": ["items"],
                    "properties": {
                        "apiVersion": {"type": "string"},
                        "kind": {"type": "string"},
                        "items": {
                            "type": "array",
                            "items": {"$ref": format!("#/definitions/{}", item_definition)}
                        },
                        "metadata": {"$ref": format!("#/definitions/{}", LIST_META)}
                    }
                })
            });

        let mut path_parameters = vec![json!({"$ref": "#/parameters/pretty-tJGM1-ng"})];
        if path.contains("{namespace}") {
            path_parameters.push(json!({"$ref": "#/parameters/namespace-vgWSWtn3"}));
        }

        self.paths.insert(
            path.to_string(),
            json!({
                "get": {
                    "description": format!("list or watch objects of kind {}", kind),
                    "operationId": operation_id,
                    "parameters": [
                        {"$ref": "#/parameters/fieldSelector-xIcQKXFG"},
                        {"$ref": "#/parameters/labelSelector-5Zw57w4C"},
                        {"$ref": "#/parameters/limit-1NfNmdNH"},
                        {"$ref": "#/parameters/watch-XNNPZGbK"}
                    ],
                    "produces": ["application/json"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "schema": {"$ref": format!("#/definitions/{}", list_definition)}
                        },
                        "401": {"description": "Unauthorized"}
                    },
                    "x-kubernetes-action": "list"
                },
                "parameters": path_parameters
            }),
        );
        self
    }

    /// Add a raw path item
    pub fn path(mut self, path: &str, item: Value) -> Self {
        self.paths.insert(path.to_string(), item);
        self
    }

    /// Produce the document
    pub fn build(self) -> Value {
        json!({
            "swagger": "2.0",
            "info": {"title": "Kubernetes", "version": "v1.29.2"},
            "paths": self.paths,
            "definitions": self.definitions,
            "parameters": {
                "fieldSelector-xIcQKXFG": {
                    "description": "A selector to restrict the list of returned objects by their fields.",
                    "in": "query",
                    "name": "fieldSelector",
                    "type": "string",
                    "uniqueItems": true
                },
                "labelSelector-5Zw57w4C": {
                    "description": "A selector to restrict the list of returned objects by their labels.",
                    "in": "query",
                    "name": "labelSelector",
                    "type": "string",
                    "uniqueItems": true
                },
                "limit-1NfNmdNH": {
                    "in": "query",
                    "name": "limit",
                    "type": "integer",
                    "uniqueItems": true
                },
                "watch-XNNPZGbK": {
                    "in": "query",
                    "name": "watch",
                    "type": "boolean",
                    "uniqueItems": true
                },
                "pretty-tJGM1-ng": {
                    "in": "query",
                    "name": "pretty",
                    "type": "string",
                    "uniqueItems": true
                },
                "namespace-vgWSWtn3": {
                    "description": "object name and auth scope, such as for teams and projects",
                    "in": "path",
                    "name": "namespace",
                    "required": true,
                    "type": "string",
                    "uniqueItems": true
                }
            }
        })
    }
}

/// A Kubernetes list object of `kind` holding one minimal item per
/// `(name, namespace)` entry
pub fn resource_list(kind: &str, items: &[(&str, Option<&str>)]) -> Value {
    let item_kind = kind.strip_suffix("List").unwrap_or(kind);
    let items: Vec<Value> = items
        .iter()
        .map(|(name, namespace)| {
            let mut metadata = json!({"name": name, "uid": format!("uid-{}", name)});
            if let Some(namespace) = namespace {
                metadata["namespace"] = json!(namespace);
            }
            json!({"apiVersion": "v1", "kind": item_kind, "metadata": metadata})
        })
        .collect();

    json!({
        "apiVersion": "v1",
        "kind": kind,
        "metadata": {"resourceVersion": "1024"},
        "items": items
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kubernetes_document_has_every_kind() {
        let document = OpenApiFixture::kubernetes().build();
        for kind in KUBE_KINDS {
            let (operation_id, path) = kind.all_namespaces;
            assert_eq!(document["paths"][path]["get"]["operationId"], operation_id);
            assert!(document["definitions"][format!("{}List", kind.definition)].is_object());
        }
    }

    #[test]
    fn test_namespaced_path_gets_namespace_parameter() {
        let document = OpenApiFixture::new()
            .list_operation(
                "listCoreV1NamespacedPod",
                "/api/v1/namespaces/{namespace}/pods",
                "io.k8s.api.core.v1.Pod",
            )
            .build();
        let parameters = document["paths"]["/api/v1/namespaces/{namespace}/pods"]["parameters"]
            .as_array()
            .unwrap();
        assert!(parameters
            .iter()
            .any(|p| p["$ref"] == "#/parameters/namespace-vgWSWtn3"));
    }

    #[test]
    fn test_resource_list() {
        let list = resource_list("NamespaceList", &[("default", None), ("kube-system", None)]);
        assert_eq!(list["kind"], "NamespaceList");
        assert_eq!(list["items"][1]["metadata"]["name"], "kube-system");
        assert_eq!(list["items"][0]["kind"], "Namespace");
        assert!(list["items"][0]["metadata"].get("namespace").is_none());
    }
}
