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

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds surfaced by every builder operation.
///
/// Pre-flight kinds (`UndefinedDefinition`, `MissingApiClient`, `Validation`)
/// are detected before any cluster call and signal a programming or
/// user-input error. An absent builder handle needs no kind of its own:
/// ownership makes it unrepresentable. `NotFound` and `Api` map server
/// responses after the call. `Timeout` and `Cancelled` only come out of the
/// polling layer and are deliberately distinct variants.
#[derive(Error, Debug)]
pub enum Error {
    #[error("can not redefine the undefined {0}")]
    UndefinedDefinition(&'static str),

    #[error("{0} builder cannot have an empty api client")]
    MissingApiClient(&'static str),

    /// The deferred-error channel's message, returned verbatim. Tests rely on
    /// string matching, so the exact phrasing is part of the contract.
    #[error("{0}")]
    Validation(String),

    #[error("{kind} object {name} doesn't exist{}", namespace_clause(.namespace))]
    NotFound {
        kind: &'static str,
        name: String,
        namespace: Option<String>,
    },

    #[error("kubernetes api error: {0}")]
    Api(#[from] kube::Error),

    #[error("failed to load cluster configuration: {0}")]
    Config(String),

    #[error("scheme {0} is not registered")]
    SchemeNotRegistered(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("wait for {0} was cancelled")]
    Cancelled(String),
}

impl Error {
    pub fn not_found(kind: &'static str, name: impl Into<String>, namespace: Option<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
            namespace,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for server responses that report the addressed object as absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Api(err) => is_api_not_found(err),
            _ => false,
        }
    }
}

fn namespace_clause(namespace: &Option<String>) -> String {
    match namespace {
        Some(ns) => format!(" in namespace {ns}"),
        None => String::new(),
    }
}

/// HTTP 404 from the apiserver.
pub(crate) fn is_api_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 404)
}
