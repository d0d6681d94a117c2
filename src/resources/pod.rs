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

use crate::builder::{Builder, BuilderKind};
use crate::client::ApiClient;
use crate::error::{Error, Result};
use crate::wait::WaitOptions;
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Api;
use std::time::Duration;
use tracing::debug;

pub type PodBuilder = Builder<Pod>;

impl BuilderKind for Pod {
    const LABEL: &'static str = "pod";
    const NAMESPACED: bool = true;

    fn api(client: &ApiClient, namespace: Option<&str>) -> Api<Self> {
        client.pods(namespace.unwrap_or_default())
    }

    fn phase(object: &Self) -> Option<String> {
        object.status.as_ref().and_then(|status| status.phase.clone())
    }
}

fn definition(name: &str, nsname: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(nsname.to_string()),
            ..ObjectMeta::default()
        },
        ..Pod::default()
    }
}

fn validate_identity(name: &str, nsname: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("pod 'name' cannot be empty");
    }
    if nsname.is_empty() {
        return Some("pod 'namespace' cannot be empty");
    }
    None
}

impl Builder<Pod> {
    pub fn new(api_client: &ApiClient, name: &str, nsname: &str) -> Self {
        debug!("initializing new pod structure with name: {name}, namespace: {nsname}");
        let builder = Self::from_definition(api_client, definition(name, nsname));
        if let Some(message) = validate_identity(name, nsname) {
            return builder.bail(message);
        }
        builder
    }

    pub async fn pull(api_client: &ApiClient, name: &str, nsname: &str) -> Result<Self> {
        debug!("pulling existing pod: {name} in namespace: {nsname}");
        if let Some(message) = validate_identity(name, nsname) {
            return Err(Error::validation(message));
        }
        Self::pull_with(api_client, definition(name, nsname)).await
    }

    /// Append a container to the pod spec. A pod that is already bound on
    /// the cluster can not be redefined.
    pub fn with_container(mut self, container: Container) -> Self {
        if let Err(err) = self.validate_unbound() {
            if let Error::Validation(message) = err {
                return self.bail(message);
            }
            return self;
        }
        if container.name.is_empty() {
            return self.bail("container's name is empty");
        }
        if let Some(pod) = self.definition.as_mut() {
            pod.spec
                .get_or_insert_with(PodSpec::default)
                .containers
                .push(container);
        }
        self
    }

    /// Set the restart policy: `Always`, `OnFailure` or `Never`.
    pub fn with_restart_policy(mut self, policy: &str) -> Self {
        if self.validate().is_err() {
            return self;
        }
        if !matches!(policy, "Always" | "OnFailure" | "Never") {
            return self.bail(format!("invalid pod restart policy: {policy}"));
        }
        if let Some(pod) = self.definition.as_mut() {
            pod.spec.get_or_insert_with(PodSpec::default).restart_policy = Some(policy.to_string());
        }
        self
    }

    /// Wait for the pod to report the `Running` phase.
    pub async fn wait_until_running(&mut self, timeout: Duration) -> Result<()> {
        self.wait_until_status("Running", &WaitOptions::timeout(timeout))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeClientBuilder;

    fn shell_container(name: &str) -> Container {
        Container {
            name: name.to_string(),
            image: Some("registry.example.com/shell:latest".to_string()),
            command: Some(vec!["/bin/sh".to_string()]),
            ..Container::default()
        }
    }

    #[tokio::test]
    async fn bound_pod_can_not_be_redefined() {
        let client = FakeClientBuilder::new().build();

        let builder = PodBuilder::new(&client, "worker", "demo-ns")
            .with_container(shell_container("app"))
            .create()
            .await
            .expect("pod created");

        let builder = builder.with_container(shell_container("sidecar"));
        assert_eq!(builder.error_message(), Some("can not redefine running pod"));

        let err = builder.update(false).await.expect_err("channel set");
        assert_eq!(err.to_string(), "can not redefine running pod");
    }

    #[tokio::test]
    async fn unbound_pod_accepts_more_containers() {
        let client = FakeClientBuilder::new().build();

        let builder = PodBuilder::new(&client, "worker", "demo-ns")
            .with_container(shell_container("app"))
            .with_container(shell_container("sidecar"));
        assert!(builder.error_message().is_none());
        let containers = builder
            .definition
            .as_ref()
            .and_then(|pod| pod.spec.as_ref())
            .map(|spec| spec.containers.len());
        assert_eq!(containers, Some(2));
    }
}
