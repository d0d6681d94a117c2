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
use kube::core::{ApiResource, GroupVersionKind};
use kube::{Api, CustomResource, Resource, ResourceExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `network-attachment-definitions.k8s.cni.cncf.io`, the Multus extension
/// kind carrying a CNI configuration blob.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default)]
#[kube(
    group = "k8s.cni.cncf.io",
    version = "v1",
    kind = "NetworkAttachmentDefinition",
    plural = "network-attachment-definitions",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAttachmentDefinitionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

pub type NetworkAttachmentDefinitionBuilder = Builder<NetworkAttachmentDefinition>;

pub fn gvk() -> GroupVersionKind {
    GroupVersionKind::gvk("k8s.cni.cncf.io", "v1", "NetworkAttachmentDefinition")
}

impl BuilderKind for NetworkAttachmentDefinition {
    const LABEL: &'static str = "networkAttachmentDefinition";
    const NAMESPACED: bool = true;

    fn api(client: &ApiClient, namespace: Option<&str>) -> Api<Self> {
        client.resource(namespace.unwrap_or_default())
    }

    fn register(client: &ApiClient) {
        client.register_scheme(gvk(), ApiResource::erase::<Self>(&()));
    }
}

fn definition(name: &str, nsname: &str) -> NetworkAttachmentDefinition {
    let mut nad =
        NetworkAttachmentDefinition::new(name, NetworkAttachmentDefinitionSpec::default());
    nad.meta_mut().namespace = Some(nsname.to_string());
    nad
}

fn identity_error(name: &str, nsname: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("networkAttachmentDefinition 'name' cannot be empty");
    }
    if nsname.is_empty() {
        return Some("networkAttachmentDefinition 'nsname' cannot be empty");
    }
    None
}

impl Builder<NetworkAttachmentDefinition> {
    pub fn new(api_client: &ApiClient, name: &str, nsname: &str) -> Self {
        debug!(
            "initializing new networkAttachmentDefinition structure with name: {name}, namespace: {nsname}"
        );
        let builder = Self::from_definition(api_client, definition(name, nsname));
        if let Some(message) = identity_error(name, nsname) {
            return builder.bail(message);
        }
        builder
    }

    pub async fn pull(api_client: &ApiClient, name: &str, nsname: &str) -> Result<Self> {
        debug!("pulling existing networkAttachmentDefinition: {name} in namespace: {nsname}");
        if let Some(message) = identity_error(name, nsname) {
            return Err(Error::validation(message));
        }
        Self::pull_with(api_client, definition(name, nsname)).await
    }

    /// Set the CNI configuration. The blob must be valid JSON.
    pub fn with_config(mut self, config: &str) -> Self {
        if self.validate().is_err() {
            return self;
        }
        if config.is_empty() {
            return self.bail("networkAttachmentDefinition 'config' cannot be empty");
        }
        if serde_json::from_str::<serde_json::Value>(config).is_err() {
            return self.bail("networkAttachmentDefinition 'config' is not valid JSON");
        }
        if let Some(nad) = self.definition.as_mut() {
            nad.spec.config = Some(config.to_string());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeClientBuilder;

    #[tokio::test]
    async fn construction_registers_the_scheme() {
        let client = FakeClientBuilder::new().build();
        let _builder = NetworkAttachmentDefinitionBuilder::new(&client, "macvlan", "demo-ns");
        let resource = client.scheme(&gvk()).expect("scheme registered");
        assert_eq!(resource.plural, "network-attachment-definitions");
    }

    #[tokio::test]
    async fn invalid_config_sets_the_channel() {
        let client = FakeClientBuilder::new().build();
        let builder = NetworkAttachmentDefinitionBuilder::new(&client, "macvlan", "demo-ns")
            .with_config("{not json");
        assert_eq!(
            builder.error_message(),
            Some("networkAttachmentDefinition 'config' is not valid JSON")
        );
    }
}
