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
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use kube::Api;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub type DeploymentBuilder = Builder<Deployment>;

impl BuilderKind for Deployment {
    const LABEL: &'static str = "deployment";
    const NAMESPACED: bool = true;

    fn api(client: &ApiClient, namespace: Option<&str>) -> Api<Self> {
        client.deployments(namespace.unwrap_or_default())
    }
}

fn definition(
    name: &str,
    nsname: &str,
    labels: BTreeMap<String, String>,
    container: Container,
) -> Deployment {
    Deployment {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(nsname.to_string()),
            labels: Some(labels.clone()),
            ..ObjectMeta::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..LabelSelector::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..ObjectMeta::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    ..PodSpec::default()
                }),
            },
            ..DeploymentSpec::default()
        }),
        ..Deployment::default()
    }
}

fn identity_error(name: &str, nsname: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("deployment 'name' cannot be empty");
    }
    if nsname.is_empty() {
        return Some("deployment 'nsname' cannot be empty");
    }
    None
}

impl Builder<Deployment> {
    pub fn new(
        api_client: &ApiClient,
        name: &str,
        nsname: &str,
        labels: BTreeMap<String, String>,
        container: Container,
    ) -> Self {
        debug!("initializing new deployment structure with name: {name}, namespace: {nsname}");
        let labels_empty = labels.is_empty();
        let builder = Self::from_definition(api_client, definition(name, nsname, labels, container));
        if let Some(message) = identity_error(name, nsname) {
            return builder.bail(message);
        }
        if labels_empty {
            return builder.bail("deployment 'labels' cannot be empty");
        }
        builder
    }

    pub async fn pull(api_client: &ApiClient, name: &str, nsname: &str) -> Result<Self> {
        debug!("pulling existing deployment: {name} in namespace: {nsname}");
        if let Some(message) = identity_error(name, nsname) {
            return Err(Error::validation(message));
        }
        let pulled = Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(nsname.to_string()),
                ..ObjectMeta::default()
            },
            ..Deployment::default()
        };
        Self::pull_with(api_client, pulled).await
    }

    /// Set the replica count.
    pub fn with_replicas(mut self, replicas: i32) -> Self {
        if self.validate().is_err() {
            return self;
        }
        if let Some(deployment) = self.definition.as_mut() {
            deployment
                .spec
                .get_or_insert_with(DeploymentSpec::default)
                .replicas = Some(replicas);
        }
        self
    }

    /// Set the pod template's node selector. The map must be non-empty.
    pub fn with_node_selector(mut self, selector: BTreeMap<String, String>) -> Self {
        if self.validate().is_err() {
            return self;
        }
        if selector.is_empty() {
            return self.bail("can not apply empty nodeSelector to deployment");
        }
        if let Some(deployment) = self.definition.as_mut() {
            let spec = deployment.spec.get_or_insert_with(DeploymentSpec::default);
            spec.template
                .spec
                .get_or_insert_with(PodSpec::default)
                .node_selector = Some(selector);
        }
        self
    }

    /// Wait until the observed deployment reports every desired replica
    /// ready.
    pub async fn wait_until_ready(&mut self, timeout: Duration) -> Result<()> {
        self.wait_until_condition(&WaitOptions::timeout(timeout), |deployment| {
            let desired = deployment
                .spec
                .as_ref()
                .and_then(|spec| spec.replicas)
                .unwrap_or(1);
            let ready = deployment
                .status
                .as_ref()
                .and_then(|status| status.ready_replicas)
                .unwrap_or_default();
            ready >= desired
        })
        .await
    }
}
