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
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Api;
use tracing::debug;

/// Builder for cluster-scoped namespaces.
pub type NamespaceBuilder = Builder<Namespace>;

impl BuilderKind for Namespace {
    const LABEL: &'static str = "namespace";
    const NAMESPACED: bool = false;

    fn api(client: &ApiClient, _namespace: Option<&str>) -> Api<Self> {
        client.namespaces()
    }

    fn phase(object: &Self) -> Option<String> {
        object.status.as_ref().and_then(|status| status.phase.clone())
    }
}

fn definition(name: &str) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..ObjectMeta::default()
        },
        ..Namespace::default()
    }
}

impl Builder<Namespace> {
    pub fn new(api_client: &ApiClient, name: &str) -> Self {
        debug!("initializing new namespace structure with name: {name}");
        let builder = Self::from_definition(api_client, definition(name));
        if name.is_empty() {
            return builder.bail("namespace 'name' cannot be empty");
        }
        builder
    }

    /// Pull an existing namespace from the cluster.
    pub async fn pull(api_client: &ApiClient, name: &str) -> Result<Self> {
        debug!("pulling existing namespace: {name}");
        if name.is_empty() {
            return Err(Error::validation("namespace 'name' cannot be empty"));
        }
        Self::pull_with(api_client, definition(name)).await
    }
}
