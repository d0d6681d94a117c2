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

use crate::error::{Error, Result};
use k8s_openapi::api::core::v1::{Container, ContainerPort, EnvVar, SecurityContext};
use tracing::debug;

/// Sub-builder assembling a container spec for pod-bearing kinds.
///
/// Follows the deferred-error protocol but never contacts the cluster;
/// [`Self::get_container_cfg`] is its only terminal method.
pub struct ContainerBuilder {
    definition: Container,
    error_msg: Option<String>,
}

impl ContainerBuilder {
    pub fn new(name: &str, image: &str, cmd: &[&str]) -> Self {
        debug!("initializing new container structure with name: {name}");
        let definition = Container {
            name: name.to_string(),
            image: Some(image.to_string()),
            command: Some(cmd.iter().map(|arg| arg.to_string()).collect()),
            ..Container::default()
        };
        let mut builder = Self {
            definition,
            error_msg: None,
        };
        if name.is_empty() {
            builder.error_msg = Some("container's name is empty".to_string());
        } else if image.is_empty() {
            builder.error_msg = Some("container's image is empty".to_string());
        } else if cmd.is_empty() {
            builder.error_msg = Some("container's cmd is empty".to_string());
        }
        builder
    }

    fn bail(mut self, message: &str) -> Self {
        debug!("container builder validation failed: {message}");
        if self.error_msg.is_none() {
            self.error_msg = Some(message.to_string());
        }
        self
    }

    /// Append ports to the container. Every port number must be non-zero.
    pub fn with_ports(mut self, ports: &[ContainerPort]) -> Self {
        if self.error_msg.is_some() {
            return self;
        }
        if ports.is_empty() {
            return self.bail("container's ports list is empty");
        }
        if ports.iter().any(|port| port.container_port == 0) {
            return self.bail("port number can not be 0");
        }
        self.definition
            .ports
            .get_or_insert_with(Vec::new)
            .extend_from_slice(ports);
        self
    }

    /// Append one environment variable.
    pub fn with_env(mut self, name: &str, value: &str) -> Self {
        if self.error_msg.is_some() {
            return self;
        }
        if name.is_empty() {
            return self.bail("environment variable name is empty");
        }
        self.definition.env.get_or_insert_with(Vec::new).push(EnvVar {
            name: name.to_string(),
            value: Some(value.to_string()),
            value_from: None,
        });
        self
    }

    /// Replace the container's security context.
    pub fn with_security_context(mut self, context: SecurityContext) -> Self {
        if self.error_msg.is_some() {
            return self;
        }
        self.definition.security_context = Some(context);
        self
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_msg.as_deref()
    }

    /// Finished container spec, or the deferred validation error verbatim.
    pub fn get_container_cfg(&self) -> Result<Container> {
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
    fn empty_name_sets_the_channel() {
        let builder = ContainerBuilder::new("", "img", &["/bin/sh"]);
        assert_eq!(builder.error_message(), Some("container's name is empty"));

        let err = builder.get_container_cfg().expect_err("invalid container");
        assert_eq!(err.to_string(), "container's name is empty");
    }

    #[test]
    fn empty_image_and_cmd_are_rejected() {
        let builder = ContainerBuilder::new("test", "", &["/bin/sh"]);
        assert_eq!(builder.error_message(), Some("container's image is empty"));

        let builder = ContainerBuilder::new("test", "img", &[]);
        assert_eq!(builder.error_message(), Some("container's cmd is empty"));
    }

    #[test]
    fn zero_port_is_rejected_and_sticky() {
        let port = ContainerPort {
            container_port: 0,
            ..ContainerPort::default()
        };
        let builder = ContainerBuilder::new("test", "img", &["/bin/sh"]).with_ports(&[port]);
        assert_eq!(builder.error_message(), Some("port number can not be 0"));

        // later mutators never clear the channel
        let builder = builder.with_env("KEY", "value");
        assert_eq!(builder.error_message(), Some("port number can not be 0"));
    }

    #[test]
    fn valid_chain_produces_the_spec() {
        let port = ContainerPort {
            container_port: 8080,
            ..ContainerPort::default()
        };
        let container = ContainerBuilder::new("test", "img", &["/bin/sh"])
            .with_ports(&[port])
            .with_env("KEY", "value")
            .get_container_cfg()
            .expect("valid container");
        assert_eq!(container.name, "test");
        assert_eq!(container.ports.as_ref().map(Vec::len), Some(1));
        assert_eq!(container.env.as_ref().map(Vec::len), Some(1));
    }
}
