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
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Api;
use std::collections::BTreeMap;
use tracing::debug;

pub type ConfigMapBuilder = Builder<ConfigMap>;

impl BuilderKind for ConfigMap {
    const LABEL: &'static str = "configmap";
    const NAMESPACED: bool = true;

    fn api(client: &ApiClient, namespace: Option<&str>) -> Api<Self> {
        client.config_maps(namespace.unwrap_or_default())
    }
}

fn definition(name: &str, nsname: &str) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(nsname.to_string()),
            ..ObjectMeta::default()
        },
        ..ConfigMap::default()
    }
}

fn identity_error(name: &str, nsname: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("configmap 'name' cannot be empty");
    }
    if nsname.is_empty() {
        return Some("configmap 'nsname' cannot be empty");
    }
    None
}

impl Builder<ConfigMap> {
    pub fn new(api_client: &ApiClient, name: &str, nsname: &str) -> Self {
        debug!("initializing new configmap structure with name: {name}, namespace: {nsname}");
        let builder = Self::from_definition(api_client, definition(name, nsname));
        if let Some(message) = identity_error(name, nsname) {
            return builder.bail(message);
        }
        builder
    }

    pub async fn pull(api_client: &ApiClient, name: &str, nsname: &str) -> Result<Self> {
        debug!("pulling existing configmap: {name} in namespace: {nsname}");
        if let Some(message) = identity_error(name, nsname) {
            return Err(Error::validation(message));
        }
        Self::pull_with(api_client, definition(name, nsname)).await
    }

    /// Replace the configmap's data. The map must be non-empty.
    pub fn with_data(mut self, data: BTreeMap<String, String>) -> Self {
        if self.validate().is_err() {
            return self;
        }
        if data.is_empty() {
            return self.bail("configmap 'data' cannot be empty");
        }
        if let Some(configmap) = self.definition.as_mut() {
            configmap.data = Some(data);
        }
        self
    }
}
