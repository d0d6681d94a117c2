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
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::Api;
use std::collections::BTreeMap;
use tracing::debug;

pub type SecretBuilder = Builder<Secret>;

impl BuilderKind for Secret {
    const LABEL: &'static str = "secret";
    const NAMESPACED: bool = true;

    fn api(client: &ApiClient, namespace: Option<&str>) -> Api<Self> {
        client.secrets(namespace.unwrap_or_default())
    }
}

fn definition(name: &str, nsname: &str, secret_type: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(nsname.to_string()),
            ..ObjectMeta::default()
        },
        type_: Some(secret_type.to_string()),
        ..Secret::default()
    }
}

fn identity_error(name: &str, nsname: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("secret 'name' cannot be empty");
    }
    if nsname.is_empty() {
        return Some("secret 'nsname' cannot be empty");
    }
    None
}

impl Builder<Secret> {
    pub fn new(api_client: &ApiClient, name: &str, nsname: &str, secret_type: &str) -> Self {
        debug!("initializing new secret structure with name: {name}, namespace: {nsname}");
        let builder = Self::from_definition(api_client, definition(name, nsname, secret_type));
        if let Some(message) = identity_error(name, nsname) {
            return builder.bail(message);
        }
        if secret_type.is_empty() {
            return builder.bail("secret 'type' cannot be empty");
        }
        builder
    }

    pub async fn pull(api_client: &ApiClient, name: &str, nsname: &str) -> Result<Self> {
        debug!("pulling existing secret: {name} in namespace: {nsname}");
        if let Some(message) = identity_error(name, nsname) {
            return Err(Error::validation(message));
        }
        Self::pull_with(api_client, definition(name, nsname, "")).await
    }

    /// Replace the secret's string data. The map must be non-empty.
    pub fn with_data(mut self, data: BTreeMap<String, String>) -> Self {
        if self.validate().is_err() {
            return self;
        }
        if data.is_empty() {
            return self.bail("secret 'data' cannot be empty");
        }
        if let Some(secret) = self.definition.as_mut() {
            secret.string_data = Some(data);
        }
        self
    }
}
