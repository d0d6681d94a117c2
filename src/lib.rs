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

//! Fluent resource builders for Kubernetes and OpenShift clusters.
//!
//! Every supported kind is exposed through a [`Builder`] bundling a desired
//! document, an optional observed document, a shared [`ApiClient`] handle and
//! a deferred-error channel: `with_` mutators record invalid arguments in the
//! channel instead of failing, and the terminal verbs (`get`, `create`,
//! `update`, `delete`, `exists`) surface the recorded message before ever
//! contacting the cluster.
//!
//! ```no_run
//! use kube_forge::{ApiClient, NamespaceBuilder};
//!
//! # async fn demo() -> kube_forge::Result<()> {
//! let client = ApiClient::new(None).await?;
//! let namespace = NamespaceBuilder::new(&client, "example")
//!     .with_label("team", "platform")
//!     .create()
//!     .await?;
//! # Ok(())
//! # }
//! ```

// Core modules
pub mod builder;
pub mod client;
pub mod error;
pub mod resources;
pub mod testing;
pub mod wait;

// Re-export commonly used types
pub use builder::{Builder, BuilderKind};
pub use client::ApiClient;
pub use error::{Error, Result};
pub use wait::WaitOptions;

pub use resources::{
    ConfigMapBuilder, ContainerBuilder, DNSBuilder, DeploymentBuilder, EgressRuleBuilder,
    MultiNetworkPolicyBuilder, NamespaceBuilder, NetworkAttachmentDefinitionBuilder, PodBuilder,
    SecretBuilder,
};
