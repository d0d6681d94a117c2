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

//! In-memory test client.
//!
//! [`FakeClientBuilder`] produces an [`ApiClient`] backed by a tiny apiserver
//! implemented as a tower service over an in-memory object store, the same
//! way `kube` itself wires mock services into `Client::new`. The fake obeys
//! the real contract: 404 `Status` bodies for absent objects, 409 on create
//! conflicts and stale resource versions, resource-version bumps on replace,
//! and equality-based `labelSelector` filtering on list.

use crate::client::ApiClient;
use chrono::{SecondsFormat, Utc};
use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::core::{ApiResource, GroupVersionKind};
use kube::{Client, Resource};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Default)]
struct Store {
    /// Objects keyed by their canonical request path, without a leading
    /// slash: `api/v1/namespaces/default/pods/example`.
    objects: BTreeMap<String, Value>,
    counter: u64,
    reject_replace: bool,
}

/// Builds an [`ApiClient`] backed by an in-memory store.
#[derive(Default)]
pub struct FakeClientBuilder {
    objects: Vec<(String, Value)>,
    schemes: Vec<(GroupVersionKind, ApiResource)>,
    reject_replace: bool,
}

impl FakeClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a pre-existing object. Panics on a fixture without a name, as
    /// mock setups conventionally do.
    pub fn with_object<K>(mut self, object: &K) -> Self
    where
        K: Resource<DynamicType = ()> + Serialize,
    {
        let name = object
            .meta()
            .name
            .clone()
            .expect("seeded object must have metadata.name");
        let collection = K::url_path(&(), object.meta().namespace.as_deref());
        let value = serde_json::to_value(object).expect("seeded object serializes");
        let key = format!("{}/{name}", collection.trim_matches('/'));
        self.objects.push((key, value));
        self
    }

    /// Pre-register an extension-kind codec on the produced handle.
    pub fn with_scheme(mut self, gvk: GroupVersionKind, resource: ApiResource) -> Self {
        self.schemes.push((gvk, resource));
        self
    }

    /// Make every replace request fail with 409, to exercise force-update
    /// fallbacks.
    pub fn with_replace_conflicts(mut self) -> Self {
        self.reject_replace = true;
        self
    }

    pub fn build(self) -> ApiClient {
        let mut store = Store {
            reject_replace: self.reject_replace,
            ..Store::default()
        };
        for (key, mut value) in self.objects {
            store.counter += 1;
            let meta = &mut value["metadata"];
            if meta.get("resourceVersion").is_none() {
                meta["resourceVersion"] = json!("1");
            }
            if meta.get("uid").is_none() {
                meta["uid"] = json!(format!("fake-uid-{}", store.counter));
            }
            if meta.get("creationTimestamp").is_none() {
                meta["creationTimestamp"] = json!(now());
            }
            store.objects.insert(key, value);
        }

        let store = Arc::new(Mutex::new(store));
        let service = tower::service_fn(move |request: Request<Body>| {
            let store = store.clone();
            async move { Ok::<_, Infallible>(handle(store, request).await) }
        });
        let client = Client::new(service, "default");

        let api_client = ApiClient::from_client(client);
        for (gvk, resource) in self.schemes {
            api_client.register_scheme(gvk, resource);
        }
        api_client
    }
}

/// Request target parsed out of an apiserver path.
struct Target {
    collection: String,
    name: Option<String>,
}

fn parse_path(path: &str) -> Option<Target> {
    let trimmed = path.trim_matches('/');
    let segments: Vec<&str> = trimmed.split('/').collect();
    let prefix = match segments.first() {
        Some(&"api") if segments.len() >= 3 => 2,
        Some(&"apis") if segments.len() >= 4 => 3,
        _ => return None,
    };
    let rest = segments.len() - prefix;
    match rest {
        // `.../{plural}` or `.../namespaces/{ns}/{plural}`
        1 | 3 => Some(Target {
            collection: trimmed.to_string(),
            name: None,
        }),
        // `.../{plural}/{name}` or `.../namespaces/{ns}/{plural}/{name}`
        2 | 4 => Some(Target {
            collection: segments[..segments.len() - 1].join("/"),
            name: segments.last().map(|s| s.to_string()),
        }),
        _ => None,
    }
}

async fn handle(store: Arc<Mutex<Store>>, request: Request<Body>) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let Some(target) = parse_path(uri.path()) else {
        return status_response(
            StatusCode::NOT_FOUND,
            "NotFound",
            format!("the server could not find the requested resource {}", uri.path()),
        );
    };
    let body = request
        .into_body()
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();

    let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
    match (method.as_str(), target.name) {
        ("GET", Some(name)) => get_object(&store, &target.collection, &name),
        ("GET", None) => list_objects(&store, &target.collection, uri.query()),
        ("POST", None) => create_object(&mut store, &target.collection, &body),
        ("PUT", Some(name)) => replace_object(&mut store, &target.collection, &name, &body),
        ("DELETE", Some(name)) => delete_object(&mut store, &target.collection, &name),
        _ => status_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "MethodNotAllowed",
            format!("{method} is not supported on {}", uri.path()),
        ),
    }
}

fn object_key(collection: &str, name: &str) -> String {
    format!("{collection}/{name}")
}

fn get_object(store: &Store, collection: &str, name: &str) -> Response<Body> {
    match store.objects.get(&object_key(collection, name)) {
        Some(object) => json_response(StatusCode::OK, object),
        None => not_found(collection, name),
    }
}

fn list_objects(store: &Store, collection: &str, query: Option<&str>) -> Response<Body> {
    let selector = query.and_then(label_selector);
    let prefix = format!("{collection}/");
    let items: Vec<&Value> = store
        .objects
        .iter()
        .filter(|(key, _)| {
            key.strip_prefix(&prefix)
                .is_some_and(|rest| !rest.contains('/'))
        })
        .map(|(_, object)| object)
        .filter(|object| match &selector {
            Some(selector) => matches_selector(object, selector),
            None => true,
        })
        .collect();
    let list = json!({
        "kind": "List",
        "apiVersion": "v1",
        "metadata": { "resourceVersion": "1" },
        "items": items,
    });
    json_response(StatusCode::OK, &list)
}

fn create_object(store: &mut Store, collection: &str, body: &[u8]) -> Response<Body> {
    let Ok(mut object) = serde_json::from_slice::<Value>(body) else {
        return status_response(StatusCode::BAD_REQUEST, "BadRequest", "malformed body".into());
    };
    let Some(name) = object["metadata"]["name"].as_str().map(str::to_string) else {
        return status_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid",
            "metadata.name is required".into(),
        );
    };
    let key = object_key(collection, &name);
    if store.objects.contains_key(&key) {
        return status_response(
            StatusCode::CONFLICT,
            "AlreadyExists",
            format!("object {name} already exists"),
        );
    }
    store.counter += 1;
    object["metadata"]["resourceVersion"] = json!("1");
    object["metadata"]["uid"] = json!(format!("fake-uid-{}", store.counter));
    object["metadata"]["creationTimestamp"] = json!(now());
    store.objects.insert(key, object.clone());
    json_response(StatusCode::CREATED, &object)
}

fn replace_object(store: &mut Store, collection: &str, name: &str, body: &[u8]) -> Response<Body> {
    if store.reject_replace {
        return status_response(
            StatusCode::CONFLICT,
            "Conflict",
            format!("operation cannot be fulfilled on {name}: replace rejected"),
        );
    }
    let Ok(mut object) = serde_json::from_slice::<Value>(body) else {
        return status_response(StatusCode::BAD_REQUEST, "BadRequest", "malformed body".into());
    };
    let key = object_key(collection, name);
    let Some(current) = store.objects.get(&key) else {
        return not_found(collection, name);
    };
    let current_version = current["metadata"]["resourceVersion"].as_str().unwrap_or("1");
    let sent_version = object["metadata"]["resourceVersion"].as_str().unwrap_or_default();
    if sent_version != current_version {
        return status_response(
            StatusCode::CONFLICT,
            "Conflict",
            format!(
                "operation cannot be fulfilled on {name}: the object has been modified"
            ),
        );
    }
    let bumped = current_version.parse::<u64>().unwrap_or(1) + 1;
    object["metadata"]["resourceVersion"] = json!(bumped.to_string());
    if object["metadata"].get("creationTimestamp").is_none() {
        object["metadata"]["creationTimestamp"] = current["metadata"]["creationTimestamp"].clone();
    }
    if object["metadata"].get("uid").is_none() {
        object["metadata"]["uid"] = current["metadata"]["uid"].clone();
    }
    store.objects.insert(key, object.clone());
    json_response(StatusCode::OK, &object)
}

fn delete_object(store: &mut Store, collection: &str, name: &str) -> Response<Body> {
    match store.objects.remove(&object_key(collection, name)) {
        Some(object) => json_response(StatusCode::OK, &object),
        None => not_found(collection, name),
    }
}

fn label_selector(query: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "labelSelector")
        .map(|(_, value)| value.into_owned())
}

/// Equality-based selector terms: `k=v`, `k==v`, `k!=v`, bare `k`.
fn matches_selector(object: &Value, selector: &str) -> bool {
    let labels = &object["metadata"]["labels"];
    selector.split(',').all(|term| {
        let term = term.trim();
        if term.is_empty() {
            return true;
        }
        if let Some((key, value)) = term.split_once("!=") {
            return labels[key].as_str() != Some(value);
        }
        if let Some((key, value)) = term.split_once("==").or_else(|| term.split_once('=')) {
            return labels[key].as_str() == Some(value);
        }
        labels.get(term).is_some()
    })
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn not_found(collection: &str, name: &str) -> Response<Body> {
    let plural = collection.rsplit('/').next().unwrap_or(collection);
    status_response(
        StatusCode::NOT_FOUND,
        "NotFound",
        format!("{plural} \"{name}\" not found"),
    )
}

fn status_response(code: StatusCode, reason: &str, message: String) -> Response<Body> {
    let status = json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code.as_u16(),
    });
    json_response(code, &status)
}

fn json_response(code: StatusCode, value: &Value) -> Response<Body> {
    let bytes = serde_json::to_vec(value).expect("response body serializes");
    Response::builder()
        .status(code)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .expect("valid http response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_core_collection_and_object_paths() {
        let collection = parse_path("/api/v1/namespaces/default/pods").expect("collection");
        assert!(collection.name.is_none());

        let object = parse_path("/api/v1/namespaces/default/pods/example").expect("object");
        assert_eq!(object.name.as_deref(), Some("example"));
        assert_eq!(object.collection, "api/v1/namespaces/default/pods");
    }

    #[test]
    fn parses_cluster_scoped_group_paths() {
        let object = parse_path("/apis/config.openshift.io/v1/dnses/cluster").expect("object");
        assert_eq!(object.name.as_deref(), Some("cluster"));
        assert_eq!(object.collection, "apis/config.openshift.io/v1/dnses");
    }

    #[test]
    fn selector_matching_is_equality_based() {
        let object = json!({"metadata": {"labels": {"app": "demo", "tier": "web"}}});
        assert!(matches_selector(&object, "app=demo"));
        assert!(matches_selector(&object, "app==demo,tier=web"));
        assert!(matches_selector(&object, "app!=other"));
        assert!(matches_selector(&object, "tier"));
        assert!(!matches_selector(&object, "app=other"));
    }
}
