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

pub mod configmap;
pub mod container;
pub mod deployment;
pub mod dns;
pub mod multinetworkpolicy;
pub mod nad;
pub mod namespace;
pub mod pod;
pub mod secret;

pub use configmap::ConfigMapBuilder;
pub use container::ContainerBuilder;
pub use deployment::DeploymentBuilder;
pub use dns::{DNSBuilder, DNSSpec, DNS};
pub use multinetworkpolicy::{
    EgressRuleBuilder, MultiNetworkPolicy, MultiNetworkPolicyBuilder, MultiNetworkPolicyEgressRule,
    MultiNetworkPolicyPeer, MultiNetworkPolicyPort, MultiNetworkPolicySpec,
};
pub use nad::{NetworkAttachmentDefinition, NetworkAttachmentDefinitionBuilder, NetworkAttachmentDefinitionSpec};
pub use namespace::NamespaceBuilder;
pub use pod::PodBuilder;
pub use secret::SecretBuilder;
