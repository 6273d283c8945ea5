//! Registry of the resource kinds exposed under `all`
//!
//! Each kind names the base operations it delegates to. Names are resolved
//! against the base schema once, at build time, so a missing operation or a
//! pair with mismatched return types stops startup instead of failing the
//! first query.

use std::sync::Arc;

use super::base::{BaseSchema, OperationDescriptor};
use crate::error::{BuildError, BuildResult};

/// The operations a kind delegates to, by base field name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindSource {
    /// Dispatch on the `namespace` argument
    Paired {
        all_namespaces: String,
        namespaced: String,
    },
    /// Filter the cluster-wide list by `metadata.name`
    NamespaceFiltered { all_namespaces: String },
}

/// One field of the `all` type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindEntry {
    pub kind: String,
    pub source: KindSource,
}

/// Ordered set of kinds to aggregate
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    entries: Vec<KindEntry>,
}

impl KindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind served by an all-namespaces / namespaced pair
    pub fn register(
        mut self,
        kind: impl Into<String>,
        all_namespaces: impl Into<String>,
        namespaced: impl Into<String>,
    ) -> Self {
        self.entries.push(KindEntry {
            kind: kind.into(),
            source: KindSource::Paired {
                all_namespaces: all_namespaces.into(),
                namespaced: namespaced.into(),
            },
        });
        self
    }

    /// Register a kind whose list is filtered by name instead of scoped
    pub fn register_namespaces(
        mut self,
        kind: impl Into<String>,
        all_namespaces: impl Into<String>,
    ) -> Self {
        self.entries.push(KindEntry {
            kind: kind.into(),
            source: KindSource::NamespaceFiltered {
                all_namespaces: all_namespaces.into(),
            },
        });
        self
    }

    /// The kinds aggregated for a stock API server
    pub fn kubernetes() -> Self {
        Self::new()
            .register(
                "services",
                "listCoreV1ServiceForAllNamespaces",
                "listCoreV1NamespacedService",
            )
            .register(
                "deployments",
                "listAppsV1DeploymentForAllNamespaces",
                "listAppsV1NamespacedDeployment",
            )
            .register(
                "pods",
                "listCoreV1PodForAllNamespaces",
                "listCoreV1NamespacedPod",
            )
            .register(
                "daemonSets",
                "listAppsV1DaemonSetForAllNamespaces",
                "listAppsV1NamespacedDaemonSet",
            )
            .register(
                "replicaSets",
                "listAppsV1ReplicaSetForAllNamespaces",
                "listAppsV1NamespacedReplicaSet",
            )
            .register(
                "statefulSets",
                "listAppsV1StatefulSetForAllNamespaces",
                "listAppsV1NamespacedStatefulSet",
            )
            .register(
                "jobs",
                "listBatchV1JobForAllNamespaces",
                "listBatchV1NamespacedJob",
            )
            .register(
                "cronJobs",
                "listBatchV1CronJobForAllNamespaces",
                "listBatchV1NamespacedCronJob",
            )
            .register_namespaces("namespaces", "listCoreV1Namespace")
    }

    pub fn entries(&self) -> &[KindEntry] {
        &self.entries
    }

    /// Bind every entry to its base operations
    ///
    /// # Errors
    /// - `BuildError::MissingOperation` - A named operation does not exist
    /// - `BuildError::ReturnTypeMismatch` - A pair returns different types
    pub fn resolve(&self, base: &BaseSchema) -> BuildResult<Vec<ResolvedKind>> {
        self.entries
            .iter()
            .map(|entry| entry.resolve(base))
            .collect()
    }
}

impl KindEntry {
    fn resolve(&self, base: &BaseSchema) -> BuildResult<ResolvedKind> {
        let resolved = match &self.source {
            KindSource::Paired {
                all_namespaces,
                namespaced,
            } => {
                let all_namespaces = self.lookup(base, all_namespaces)?;
                let namespaced = self.lookup(base, namespaced)?;
                if all_namespaces.return_type() != namespaced.return_type() {
                    return Err(BuildError::ReturnTypeMismatch {
                        kind: self.kind.clone(),
                        all_namespaces: all_namespaces.name().to_string(),
                        all_namespaces_type: all_namespaces.return_type().to_string(),
                        namespaced: namespaced.name().to_string(),
                        namespaced_type: namespaced.return_type().to_string(),
                    });
                }
                ResolvedKind::Paired(OperationPair {
                    kind: self.kind.clone(),
                    all_namespaces,
                    namespaced,
                })
            }
            KindSource::NamespaceFiltered { all_namespaces } => {
                ResolvedKind::NamespaceFiltered(NamespaceSource {
                    kind: self.kind.clone(),
                    all_namespaces: self.lookup(base, all_namespaces)?,
                })
            }
        };

        tracing::debug!(kind = %self.kind, "Resolved kind operations");
        Ok(resolved)
    }

    fn lookup(&self, base: &BaseSchema, operation: &str) -> BuildResult<Arc<OperationDescriptor>> {
        base.operation(operation)
            .cloned()
            .ok_or_else(|| BuildError::MissingOperation {
                kind: self.kind.clone(),
                operation: operation.to_string(),
            })
    }
}

/// A kind bound to its two delegates
#[derive(Debug, Clone)]
pub struct OperationPair {
    pub kind: String,
    pub all_namespaces: Arc<OperationDescriptor>,
    pub namespaced: Arc<OperationDescriptor>,
}

impl OperationPair {
    /// Shared return type of both operations
    pub fn return_type(&self) -> &str {
        self.all_namespaces.return_type()
    }
}

/// The namespaces kind bound to its cluster-wide delegate
#[derive(Debug, Clone)]
pub struct NamespaceSource {
    pub kind: String,
    pub all_namespaces: Arc<OperationDescriptor>,
}

#[derive(Debug, Clone)]
pub enum ResolvedKind {
    Paired(OperationPair),
    NamespaceFiltered(NamespaceSource),
}

impl ResolvedKind {
    pub fn kind(&self) -> &str {
        match self {
            Self::Paired(pair) => &pair.kind,
            Self::NamespaceFiltered(source) => &source.kind,
        }
    }

    pub fn return_type(&self) -> &str {
        match self {
            Self::Paired(pair) => pair.return_type(),
            Self::NamespaceFiltered(source) => source.all_namespaces.return_type(),
        }
    }
}
