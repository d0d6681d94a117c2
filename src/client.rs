// Copyright 2025 The kube-forge Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::error::{Error, Result};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Pod, Secret};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client, Config};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Cluster access handle shared by every builder.
///
/// Wraps a configured [`kube::Client`] together with a per-handle scheme
/// registry of extension-kind codecs. Cloning is cheap and clones share the
/// registry. The handle itself never fails after construction; failures
/// surface in the verbs that use it.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    schemes: Arc<Mutex<HashMap<GroupVersionKind, ApiResource>>>,
}

impl ApiClient {
    /// Connect using an explicit kubeconfig path, or fall back to the
    /// conventional resolution (`KUBECONFIG`, then the default location)
    /// when the path is absent or empty.
    pub async fn new(kubeconfig_path: Option<&str>) -> Result<Self> {
        let kubeconfig = match kubeconfig_path {
            Some(path) if !path.is_empty() => {
                debug!("loading kubeconfig from {path}");
                Kubeconfig::read_from(path).map_err(|err| Error::Config(err.to_string()))?
            }
            _ => {
                debug!("loading kubeconfig from the environment");
                Kubeconfig::read().map_err(|err| Error::Config(err.to_string()))?
            }
        };

        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|err| Error::Config(err.to_string()))?;
        let client = Client::try_from(config).map_err(|err| Error::Config(err.to_string()))?;

        Ok(Self::from_client(client))
    }

    /// Wrap a pre-built client. Used by the in-memory test client and by
    /// callers that assemble their own [`kube::Client`].
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            schemes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Install the codec for one extension kind. Idempotent: the first
    /// registration of a `GroupVersionKind` wins and repeats are no-ops, so
    /// every builder construction may call this unconditionally.
    pub fn register_scheme(&self, gvk: GroupVersionKind, resource: ApiResource) {
        let mut schemes = self.schemes.lock().unwrap_or_else(PoisonError::into_inner);
        schemes.entry(gvk).or_insert(resource);
    }

    pub fn scheme(&self, gvk: &GroupVersionKind) -> Option<ApiResource> {
        let schemes = self.schemes.lock().unwrap_or_else(PoisonError::into_inner);
        schemes.get(gvk).cloned()
    }

    /// Dynamic accessor for a registered extension kind. Cluster-scoped when
    /// `namespace` is `None`.
    pub fn dynamic_api(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
    ) -> Result<Api<DynamicObject>> {
        let resource = self.scheme(gvk).ok_or_else(|| {
            Error::SchemeNotRegistered(format!("{}/{}, Kind={}", gvk.group, gvk.version, gvk.kind))
        })?;
        Ok(match namespace {
            Some(ns) => Api::namespaced_with(self.client(), ns, &resource),
            None => Api::all_with(self.client(), &resource),
        })
    }

    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client(), namespace)
    }

    pub fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client(), namespace)
    }

    pub fn daemon_sets(&self, namespace: &str) -> Api<DaemonSet> {
        Api::namespaced(self.client(), namespace)
    }

    pub fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client(), namespace)
    }

    pub fn config_maps(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client(), namespace)
    }

    pub fn network_policies(&self, namespace: &str) -> Api<NetworkPolicy> {
        Api::namespaced(self.client(), namespace)
    }

    pub fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.client())
    }

    /// Typed accessor for any namespaced kind.
    pub fn resource<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        Api::namespaced(self.client(), namespace)
    }

    /// Typed accessor for any cluster-scoped kind.
    pub fn cluster_resource<K>(&self) -> Api<K>
    where
        K: kube::Resource<Scope = ClusterResourceScope>,
        K::DynamicType: Default,
    {
        Api::all(self.client())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeClientBuilder;
    use k8s_openapi::api::core::v1::Pod;

    fn test_gvk() -> GroupVersionKind {
        GroupVersionKind::gvk("example.io", "v1", "Widget")
    }

    #[tokio::test]
    async fn scheme_registration_is_idempotent() {
        let client = FakeClientBuilder::new().build();
        let first = ApiResource::erase::<Pod>(&());
        let mut second = ApiResource::erase::<Pod>(&());
        second.plural = "changed".to_string();

        client.register_scheme(test_gvk(), first.clone());
        client.register_scheme(test_gvk(), second);

        let stored = client.scheme(&test_gvk()).expect("scheme registered");
        assert_eq!(stored.plural, first.plural);
    }

    #[tokio::test]
    async fn dynamic_api_requires_registration() {
        let client = FakeClientBuilder::new().build();
        let err = client
            .dynamic_api(&test_gvk(), Some("default"))
            .expect_err("unregistered scheme");
        assert!(err.to_string().contains("is not registered"));
    }

    #[tokio::test]
    async fn handles_carry_independent_registries() {
        let one = FakeClientBuilder::new().build();
        let two = FakeClientBuilder::new().build();
        one.register_scheme(test_gvk(), ApiResource::erase::<Pod>(&()));
        assert!(one.scheme(&test_gvk()).is_some());
        assert!(two.scheme(&test_gvk()).is_none());
    }
}
