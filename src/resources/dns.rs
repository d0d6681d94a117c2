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
use crate::error::Result;
use kube::core::{ApiResource, GroupVersionKind};
use kube::{Api, CustomResource};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fixed name of the cluster-wide DNS configuration object.
pub const CLUSTER_DNS_NAME: &str = "cluster";

/// `dnses.config.openshift.io`, the OpenShift cluster DNS configuration.
/// Singleton kind: the only instance is named `cluster`.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default)]
#[kube(
    group = "config.openshift.io",
    version = "v1",
    kind = "DNS",
    plural = "dnses",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct DNSSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_domain: Option<String>,
}

pub type DNSBuilder = Builder<DNS>;

pub fn gvk() -> GroupVersionKind {
    GroupVersionKind::gvk("config.openshift.io", "v1", "DNS")
}

impl BuilderKind for DNS {
    const LABEL: &'static str = "dns";
    const NAMESPACED: bool = false;

    fn api(client: &ApiClient, _namespace: Option<&str>) -> Api<Self> {
        client.cluster_resource()
    }

    fn register(client: &ApiClient) {
        client.register_scheme(gvk(), ApiResource::erase::<Self>(&()));
    }
}

impl Builder<DNS> {
    /// Pull the cluster DNS configuration. The identity is fixed by
    /// contract, so this is the only entry point; there is no `new`.
    pub async fn pull(api_client: &ApiClient) -> Result<Self> {
        debug!("pulling cluster dns configuration");
        Self::pull_with(api_client, DNS::new(CLUSTER_DNS_NAME, DNSSpec::default())).await
    }

    /// Set the cluster's base DNS domain.
    pub fn with_base_domain(mut self, domain: &str) -> Self {
        if self.validate().is_err() {
            return self;
        }
        if domain.is_empty() {
            return self.bail("dns 'baseDomain' cannot be empty");
        }
        if let Some(dns) = self.definition.as_mut() {
            dns.spec.base_domain = Some(domain.to_string());
        }
        self
    }
}
