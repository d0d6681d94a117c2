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

use crate::client::ApiClient;
use crate::error::{is_api_not_found, Error, Result};
use kube::api::{DeleteParams, ListParams, PostParams};
use kube::{Api, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, trace, warn};

/// Implemented by every resource kind exposed through [`Builder`].
///
/// The constants feed log and error messages; `api` fixes the scope of the
/// typed accessor; `register` lets extension kinds install their codec into
/// the handle's scheme registry at construction time (built-ins keep the
/// no-op default).
pub trait BuilderKind:
    Resource<DynamicType = ()> + Clone + Serialize + DeserializeOwned + Debug + Send + Sync
{
    /// Lower-case singular label used in every message about this kind.
    const LABEL: &'static str;

    /// Whether the kind lives inside a namespace.
    const NAMESPACED: bool;

    fn api(client: &ApiClient, namespace: Option<&str>) -> Api<Self>;

    fn register(_client: &ApiClient) {}

    /// Scalar phase of the observed object, for kinds that report one
    /// (`Running`, `Active`, ...).
    fn phase(_object: &Self) -> Option<String> {
        None
    }
}

/// Generic builder implementing the verb set shared by all resource wrappers.
///
/// A builder bundles the desired-state document (`definition`), the most
/// recent server snapshot (`object`), the cluster handle, and a sticky
/// deferred-error channel that fluent mutators write into instead of
/// returning errors. Terminal verbs consult the channel first and refuse to
/// contact the cluster while it is set.
///
/// Builders are single-threaded: callers needing parallelism construct
/// distinct builders over the same (shareable) [`ApiClient`].
pub struct Builder<K: BuilderKind> {
    pub(crate) api_client: Option<ApiClient>,
    /// Desired-state document assembled by the constructor and mutators.
    pub definition: Option<K>,
    /// Most recent server-returned snapshot, if the resource is known to exist.
    pub object: Option<K>,
    pub(crate) error_msg: Option<String>,
}

// Client handles carry no useful Debug output, so only the documents and the
// channel are shown.
impl<K: BuilderKind> Debug for Builder<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("definition", &self.definition)
            .field("object", &self.object)
            .field("error_msg", &self.error_msg)
            .finish_non_exhaustive()
    }
}

impl<K: BuilderKind> Builder<K> {
    /// Wrap a fully-formed definition. Installs the kind's scheme before
    /// anything else so dynamic accessors work from the first verb.
    pub(crate) fn from_definition(api_client: &ApiClient, definition: K) -> Self {
        K::register(api_client);
        Self {
            api_client: Some(api_client.clone()),
            definition: Some(definition),
            object: None,
            error_msg: None,
        }
    }

    /// Shared `Pull` logic: insist on server-side existence and populate both
    /// documents from the server's view.
    pub(crate) async fn pull_with(api_client: &ApiClient, definition: K) -> Result<Self> {
        let mut builder = Self::from_definition(api_client, definition);
        let object = builder.get().await?;
        builder.definition = Some(object.clone());
        builder.object = Some(object);
        Ok(builder)
    }

    /// Write into the deferred-error channel. The first message is sticky:
    /// later failures never overwrite it.
    pub(crate) fn bail(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        debug!("{} builder validation failed: {message}", K::LABEL);
        if self.error_msg.is_none() {
            self.error_msg = Some(message);
        }
        self
    }

    /// Standard pre-check run by every mutator and verb.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.definition.is_none() {
            return Err(Error::UndefinedDefinition(K::LABEL));
        }
        if self.api_client.is_none() {
            return Err(Error::MissingApiClient(K::LABEL));
        }
        if let Some(message) = &self.error_msg {
            return Err(Error::Validation(message.clone()));
        }
        Ok(())
    }

    /// Pre-check for mutators of kinds that forbid redefining a live object.
    pub(crate) fn validate_unbound(&self) -> Result<()> {
        self.validate()?;
        if self.object.is_some() {
            return Err(Error::validation(format!(
                "can not redefine running {}",
                K::LABEL
            )));
        }
        Ok(())
    }

    pub fn name(&self) -> String {
        self.definition
            .as_ref()
            .map(|definition| definition.name_any())
            .unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<String> {
        self.definition
            .as_ref()
            .and_then(|definition| definition.namespace())
    }

    /// Current content of the deferred-error channel, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_msg.as_deref()
    }

    fn api(&self) -> Result<Api<K>> {
        let client = self
            .api_client
            .as_ref()
            .ok_or(Error::MissingApiClient(K::LABEL))?;
        Ok(K::api(client, self.namespace().as_deref()))
    }

    fn not_found(&self) -> Error {
        let namespace = if K::NAMESPACED { self.namespace() } else { None };
        Error::not_found(K::LABEL, self.name(), namespace)
    }

    /// Attach a label to the definition's metadata. Append mode.
    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        if self.validate().is_err() {
            return self;
        }
        if key.is_empty() {
            return self.bail(format!("{} label key cannot be empty", K::LABEL));
        }
        if let Some(definition) = self.definition.as_mut() {
            definition
                .labels_mut()
                .insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Attach an annotation to the definition's metadata. Append mode.
    pub fn with_annotation(mut self, key: &str, value: &str) -> Self {
        if self.validate().is_err() {
            return self;
        }
        if key.is_empty() {
            return self.bail(format!("{} annotation key cannot be empty", K::LABEL));
        }
        if let Some(definition) = self.definition.as_mut() {
            definition
                .annotations_mut()
                .insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Apply caller-supplied transformations under the standard protocol: on
    /// the first failure the deferred-error channel is set and the remaining
    /// options are skipped.
    pub fn with_options<F>(mut self, options: impl IntoIterator<Item = F>) -> Self
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        if self.validate().is_err() {
            return self;
        }
        for option in options {
            if let Err(err) = option(&mut self) {
                let message = err.to_string();
                debug!("{} builder option failed: {message}", K::LABEL);
                if self.error_msg.is_none() {
                    self.error_msg = Some(message);
                }
                break;
            }
        }
        self
    }

    /// Whether the resource currently exists on the cluster.
    ///
    /// Refreshes the observed document on success and leaves it unchanged on
    /// Not-Found. Any server failure other than Not-Found also reports
    /// `true`; only a definite 404 yields `false`. Returns `false` without a
    /// cluster call when any pre-check fails.
    pub async fn exists(&mut self) -> bool {
        if self.validate().is_err() {
            return false;
        }
        let Ok(api) = self.api() else {
            return false;
        };
        let name = self.name();
        trace!("checking if {} {name} exists", K::LABEL);
        match api.get(&name).await {
            Ok(object) => {
                trace!("refreshing observed {} {name}", K::LABEL);
                self.object = Some(object);
                true
            }
            Err(err) if is_api_not_found(&err) => false,
            Err(err) => {
                debug!("failed to probe {} {name}: {err}", K::LABEL);
                true
            }
        }
    }

    /// Fetch the server's current view of the resource without mutating the
    /// builder.
    pub async fn get(&self) -> Result<K> {
        self.validate()?;
        let api = self.api()?;
        let name = self.name();
        trace!("getting {} {name}", K::LABEL);
        api.get(&name).await.map_err(|err| {
            if is_api_not_found(&err) {
                self.not_found()
            } else {
                Error::Api(err)
            }
        })
    }

    /// Create the resource on the cluster unless it already exists, in which
    /// case this is a no-op. Server-assigned metadata is elided before the
    /// post; the returned object lands in the observed slot.
    pub async fn create(mut self) -> Result<Self> {
        self.validate()?;
        debug!("creating {} {}", K::LABEL, self.name());
        if !self.exists().await {
            let api = self.api()?;
            let mut definition = self
                .definition
                .clone()
                .ok_or(Error::UndefinedDefinition(K::LABEL))?;
            let meta = definition.meta_mut();
            meta.resource_version = None;
            meta.creation_timestamp = None;
            meta.uid = None;
            meta.managed_fields = None;
            let created = api.create(&PostParams::default(), &definition).await?;
            trace!("refreshing observed {} {}", K::LABEL, self.name());
            self.object = Some(created);
        }
        Ok(self)
    }

    /// Replace the resource on the cluster with the desired document.
    ///
    /// The observed resource version is refreshed from the server and carried
    /// over before sending, and the creation timestamp is cleared, so a
    /// current builder never trips the server's conflict check. Fails with
    /// Not-Found when the resource is absent. With `force`, a failed replace
    /// falls back to delete + create; the intervening window is observable to
    /// other clients.
    pub async fn update(mut self, force: bool) -> Result<Self> {
        self.validate()?;
        let name = self.name();
        debug!("updating {} {name}", K::LABEL);

        let current = self.get().await?;
        if let Some(definition) = self.definition.as_mut() {
            definition.meta_mut().resource_version = current.resource_version();
            definition.meta_mut().creation_timestamp = None;
        }

        let api = self.api()?;
        let definition = self
            .definition
            .clone()
            .ok_or(Error::UndefinedDefinition(K::LABEL))?;
        match api.replace(&name, &PostParams::default(), &definition).await {
            Ok(object) => {
                trace!("refreshing observed {} {name}", K::LABEL);
                self.definition = Some(object.clone());
                self.object = Some(object);
                Ok(self)
            }
            Err(err) if force => {
                warn!("failed to update {} {name}, deleting and recreating: {err}", K::LABEL);
                self = self.delete().await?;
                self.create().await
            }
            Err(err) => Err(Error::Api(err)),
        }
    }

    /// Remove the resource from the cluster; a no-op when it is already
    /// absent. Clears the observed document on success.
    pub async fn delete(mut self) -> Result<Self> {
        self.validate()?;
        let name = self.name();
        debug!("deleting {} {name}", K::LABEL);
        if !self.exists().await {
            self.object = None;
            return Ok(self);
        }
        let api = self.api()?;
        let _ = api.delete(&name, &DeleteParams::default()).await?;
        self.object = None;
        Ok(self)
    }

    /// Bulk-read the kind and wrap every element as if it had been pulled:
    /// desired and observed documents are both the listed element.
    pub async fn list(
        api_client: &ApiClient,
        namespace: Option<&str>,
        params: ListParams,
    ) -> Result<Vec<Self>> {
        if K::NAMESPACED && namespace.map_or(true, str::is_empty) {
            return Err(Error::validation(format!(
                "failed to list {}s, 'nsname' parameter is empty",
                K::LABEL
            )));
        }
        K::register(api_client);
        debug!("listing {}s in {}", K::LABEL, namespace.unwrap_or("cluster scope"));
        let api = K::api(api_client, namespace);
        let objects = api.list(&params).await?;
        Ok(objects
            .items
            .into_iter()
            .map(|item| Self {
                api_client: Some(api_client.clone()),
                definition: Some(item.clone()),
                object: Some(item),
                error_msg: None,
            })
            .collect())
    }
}
