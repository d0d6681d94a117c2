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
use k8s_openapi::api::networking::v1::IPBlock;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::core::{ApiResource, GroupVersionKind};
use kube::{Api, CustomResource, Resource, ResourceExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::debug;

/// Annotation that binds a policy to the secondary networks it governs.
pub const POLICY_FOR_ANNOTATION: &str = "k8s.v1.cni.cncf.io/policy-for";

const ALLOWED_PROTOCOLS: [&str; 3] = ["TCP", "UDP", "SCTP"];

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultiNetworkPolicyPort {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultiNetworkPolicyPeer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_selector: Option<LabelSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_block: Option<IPBlock>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultiNetworkPolicyEgressRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<Vec<MultiNetworkPolicyPort>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<MultiNetworkPolicyPeer>>,
}

/// `multi-networkpolicies.k8s.cni.cncf.io`, network policy for secondary
/// (Multus) networks.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default)]
#[kube(
    group = "k8s.cni.cncf.io",
    version = "v1beta1",
    kind = "MultiNetworkPolicy",
    plural = "multi-networkpolicies",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct MultiNetworkPolicySpec {
    #[serde(default)]
    pub pod_selector: LabelSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egress: Option<Vec<MultiNetworkPolicyEgressRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_types: Option<Vec<String>>,
}

pub type MultiNetworkPolicyBuilder = Builder<MultiNetworkPolicy>;

pub fn gvk() -> GroupVersionKind {
    GroupVersionKind::gvk("k8s.cni.cncf.io", "v1beta1", "MultiNetworkPolicy")
}

impl BuilderKind for MultiNetworkPolicy {
    const LABEL: &'static str = "multiNetworkPolicy";
    const NAMESPACED: bool = true;

    fn api(client: &ApiClient, namespace: Option<&str>) -> Api<Self> {
        client.resource(namespace.unwrap_or_default())
    }

    fn register(client: &ApiClient) {
        client.register_scheme(gvk(), ApiResource::erase::<Self>(&()));
    }
}

fn definition(name: &str, nsname: &str) -> MultiNetworkPolicy {
    let mut policy = MultiNetworkPolicy::new(name, MultiNetworkPolicySpec::default());
    policy.meta_mut().namespace = Some(nsname.to_string());
    policy
}

fn identity_error(name: &str, nsname: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("multiNetworkPolicy 'name' cannot be empty");
    }
    if nsname.is_empty() {
        return Some("multiNetworkPolicy 'nsname' cannot be empty");
    }
    None
}

fn valid_cidr(cidr: &str) -> bool {
    let Some((address, prefix)) = cidr.split_once('/') else {
        return false;
    };
    let Ok(address) = address.parse::<IpAddr>() else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    match address {
        IpAddr::V4(_) => prefix <= 32,
        IpAddr::V6(_) => prefix <= 128,
    }
}

impl Builder<MultiNetworkPolicy> {
    pub fn new(api_client: &ApiClient, name: &str, nsname: &str) -> Self {
        debug!("initializing new multiNetworkPolicy structure with name: {name}, namespace: {nsname}");
        let builder = Self::from_definition(api_client, definition(name, nsname));
        if let Some(message) = identity_error(name, nsname) {
            return builder.bail(message);
        }
        builder
    }

    pub async fn pull(api_client: &ApiClient, name: &str, nsname: &str) -> Result<Self> {
        debug!("pulling existing multiNetworkPolicy: {name} in namespace: {nsname}");
        if let Some(message) = identity_error(name, nsname) {
            return Err(Error::validation(message));
        }
        Self::pull_with(api_client, definition(name, nsname)).await
    }

    /// Bind the policy to secondary networks via the policy-for annotation.
    pub fn with_network(mut self, network: &str) -> Self {
        if self.validate().is_err() {
            return self;
        }
        if network.is_empty() {
            return self.bail("multiNetworkPolicy 'network' cannot be empty");
        }
        if let Some(policy) = self.definition.as_mut() {
            policy
                .annotations_mut()
                .insert(POLICY_FOR_ANNOTATION.to_string(), network.to_string());
        }
        self
    }

    /// Replace the pod selector the policy applies to.
    pub fn with_pod_selector(mut self, labels: BTreeMap<String, String>) -> Self {
        if self.validate().is_err() {
            return self;
        }
        if labels.is_empty() {
            return self.bail("multiNetworkPolicy 'podSelector' cannot be empty");
        }
        if let Some(policy) = self.definition.as_mut() {
            policy.spec.pod_selector = LabelSelector {
                match_labels: Some(labels),
                ..LabelSelector::default()
            };
        }
        self
    }

    /// Append one egress rule, typically built with [`EgressRuleBuilder`].
    pub fn with_egress_rule(mut self, rule: MultiNetworkPolicyEgressRule) -> Self {
        if self.validate().is_err() {
            return self;
        }
        if let Some(policy) = self.definition.as_mut() {
            policy.spec.egress.get_or_insert_with(Vec::new).push(rule);
            let types = policy.spec.policy_types.get_or_insert_with(Vec::new);
            if !types.iter().any(|t| t == "Egress") {
                types.push("Egress".to_string());
            }
        }
        self
    }
}

/// Sub-builder assembling one egress rule. Follows the deferred-error
/// protocol without touching the cluster.
#[derive(Default)]
pub struct EgressRuleBuilder {
    definition: MultiNetworkPolicyEgressRule,
    error_msg: Option<String>,
}

impl EgressRuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn bail(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        debug!("egress rule builder validation failed: {message}");
        if self.error_msg.is_none() {
            self.error_msg = Some(message);
        }
        self
    }

    /// Append a port/protocol pair. The port must be non-zero and the
    /// protocol one of TCP, UDP or SCTP.
    pub fn with_port_and_protocol(mut self, port: u16, protocol: &str) -> Self {
        if self.error_msg.is_some() {
            return self;
        }
        if port == 0 {
            return self.bail("port number can not be 0");
        }
        if !ALLOWED_PROTOCOLS.contains(&protocol) {
            return self.bail("invalid protocol argument. Allowed protocols: TCP, UDP & SCTP");
        }
        self.definition
            .ports
            .get_or_insert_with(Vec::new)
            .push(MultiNetworkPolicyPort {
                protocol: Some(protocol.to_string()),
                port: Some(i32::from(port)),
            });
        self
    }

    /// Append a peer addressed by CIDR.
    pub fn with_peer_cidr(mut self, cidr: &str) -> Self {
        if self.error_msg.is_some() {
            return self;
        }
        if !valid_cidr(cidr) {
            return self.bail(format!("invalid CIDR argument: {cidr}"));
        }
        self.definition
            .to
            .get_or_insert_with(Vec::new)
            .push(MultiNetworkPolicyPeer {
                pod_selector: None,
                ip_block: Some(IPBlock {
                    cidr: cidr.to_string(),
                    except: None,
                }),
            });
        self
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_msg.as_deref()
    }

    /// Finished egress rule, or the deferred validation error verbatim.
    pub fn get_egress_rule_cfg(&self) -> Result<MultiNetworkPolicyEgressRule> {
        match &self.error_msg {
            Some(message) => Err(Error::Validation(message.clone())),
            None => Ok(self.definition.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_port_sets_the_channel() {
        let builder = EgressRuleBuilder::new().with_port_and_protocol(0, "TCP");
        assert_eq!(builder.error_message(), Some("port number can not be 0"));

        let err = builder.get_egress_rule_cfg().expect_err("invalid rule");
        assert_eq!(err.to_string(), "port number can not be 0");
    }

    #[test]
    fn invalid_protocol_is_rejected() {
        let builder = EgressRuleBuilder::new().with_port_and_protocol(443, "ICMP");
        assert_eq!(
            builder.error_message(),
            Some("invalid protocol argument. Allowed protocols: TCP, UDP & SCTP")
        );
    }

    #[test]
    fn channel_is_sticky_across_mutators() {
        let builder = EgressRuleBuilder::new()
            .with_port_and_protocol(0, "TCP")
            .with_port_and_protocol(443, "TCP")
            .with_peer_cidr("10.0.0.0/24");
        assert_eq!(builder.error_message(), Some("port number can not be 0"));
    }

    #[test]
    fn malformed_cidr_is_rejected() {
        let builder = EgressRuleBuilder::new().with_peer_cidr("10.0.0.0/64");
        assert_eq!(
            builder.error_message(),
            Some("invalid CIDR argument: 10.0.0.0/64")
        );

        let builder = EgressRuleBuilder::new().with_peer_cidr("not-a-cidr");
        assert!(builder.error_message().is_some());
    }

    #[test]
    fn valid_rule_round_trips() {
        let rule = EgressRuleBuilder::new()
            .with_port_and_protocol(443, "TCP")
            .with_peer_cidr("2001:db8::/64")
            .get_egress_rule_cfg()
            .expect("valid rule");
        assert_eq!(rule.ports.as_ref().map(Vec::len), Some(1));
        assert_eq!(rule.to.as_ref().map(Vec::len), Some(1));
    }
}
