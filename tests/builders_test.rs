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

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::api::ListParams;
    use kube::ResourceExt;
    use kube_forge::testing::FakeClientBuilder;
    use kube_forge::{
        Builder, ConfigMapBuilder, DeploymentBuilder, Error, NamespaceBuilder, SecretBuilder,
    };
    use std::collections::BTreeMap;

    fn seeded_configmap(name: &str, nsname: &str, labels: &[(&str, &str)]) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(nsname.to_string()),
                labels: Some(
                    labels
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
                ..ObjectMeta::default()
            },
            data: Some(BTreeMap::from([("key".to_string(), "value".to_string())])),
            ..ConfigMap::default()
        }
    }

    #[tokio::test]
    async fn namespace_lifecycle() {
        let client = FakeClientBuilder::new().build();

        let builder = NamespaceBuilder::new(&client, "example").with_label("k", "v");
        let mut builder = builder.create().await.expect("namespace created");

        let observed = builder.object.as_ref().expect("observed document set");
        assert_eq!(observed.metadata.name.as_deref(), Some("example"));
        assert_eq!(
            observed.labels().get("k").map(String::as_str),
            Some("v")
        );

        assert!(builder.exists().await);

        let mut builder = builder.delete().await.expect("namespace deleted");
        assert!(builder.object.is_none());
        assert!(!builder.exists().await);
    }

    #[tokio::test]
    async fn create_and_delete_are_idempotent() {
        let client = FakeClientBuilder::new().build();

        let builder = NamespaceBuilder::new(&client, "repeat");
        let builder = builder.create().await.expect("first create");
        let first_version = builder.object.as_ref().and_then(|o| o.resource_version());

        let builder = builder.create().await.expect("second create is a no-op");
        assert_eq!(
            builder.object.as_ref().and_then(|o| o.resource_version()),
            first_version
        );

        let builder = builder.delete().await.expect("first delete");
        assert!(builder.object.is_none());
        let builder = builder.delete().await.expect("second delete is a no-op");
        assert!(builder.object.is_none());
    }

    #[tokio::test]
    async fn pull_of_a_missing_deployment_reports_not_found() {
        let client = FakeClientBuilder::new().build();
        let err = DeploymentBuilder::pull(&client, "test2", "test-namespace")
            .await
            .expect_err("deployment is absent");
        assert_eq!(
            err.to_string(),
            "deployment object test2 doesn't exist in namespace test-namespace"
        );
    }

    #[tokio::test]
    async fn builders_render_their_documents_in_debug_output() {
        let client = FakeClientBuilder::new().build();
        let builder = NamespaceBuilder::new(&client, "example");
        let rendered = format!("{builder:?}");
        assert!(rendered.contains("definition"));
        assert!(rendered.contains("example"));
        assert!(rendered.contains("error_msg: None"));
    }

    #[tokio::test]
    async fn constructor_validation_is_sticky_through_verbs() {
        let client = FakeClientBuilder::new().build();

        let builder = NamespaceBuilder::new(&client, "");
        assert_eq!(builder.error_message(), Some("namespace 'name' cannot be empty"));

        // no mutator clears the channel
        let builder = builder.with_label("k", "v").with_annotation("a", "b");
        assert_eq!(builder.error_message(), Some("namespace 'name' cannot be empty"));

        let err = builder.create().await.expect_err("verb short-circuits");
        assert_eq!(err.to_string(), "namespace 'name' cannot be empty");
    }

    #[tokio::test]
    async fn exists_and_get_agree_on_absence_and_presence() {
        let client = FakeClientBuilder::new()
            .with_object(&seeded_configmap("present", "demo-ns", &[]))
            .build();

        let mut absent = ConfigMapBuilder::new(&client, "absent", "demo-ns");
        assert!(!absent.exists().await);
        let err = absent.get().await.expect_err("absent object");
        assert!(matches!(err, Error::NotFound { .. }));

        let mut present = ConfigMapBuilder::new(&client, "present", "demo-ns");
        assert!(present.exists().await);
        let fetched = present.get().await.expect("present object");
        assert_eq!(Some(fetched), present.object);
    }

    #[tokio::test]
    async fn pulled_update_without_mutation_only_bumps_the_version() {
        let client = FakeClientBuilder::new()
            .with_object(&seeded_configmap("settings", "demo-ns", &[]))
            .build();

        let builder = ConfigMapBuilder::pull(&client, "settings", "demo-ns")
            .await
            .expect("pulled");
        let pulled_version = builder.object.as_ref().and_then(|o| o.resource_version());
        assert_eq!(pulled_version.as_deref(), Some("1"));

        let builder = builder.update(false).await.expect("no-op update");
        let updated = builder.object.as_ref().expect("observed after update");
        assert_eq!(updated.resource_version().as_deref(), Some("2"));
        assert_eq!(
            updated.data.as_ref().and_then(|d| d.get("key")).map(String::as_str),
            Some("value")
        );
    }

    #[tokio::test]
    async fn update_carries_mutated_data_to_the_server() {
        let client = FakeClientBuilder::new()
            .with_object(&seeded_configmap("settings", "demo-ns", &[]))
            .build();

        let builder = ConfigMapBuilder::pull(&client, "settings", "demo-ns")
            .await
            .expect("pulled")
            .with_data(BTreeMap::from([("key".to_string(), "changed".to_string())]));
        let builder = builder.update(false).await.expect("updated");

        let fetched = builder.get().await.expect("fetched after update");
        assert_eq!(
            fetched.data.as_ref().and_then(|d| d.get("key")).map(String::as_str),
            Some("changed")
        );
    }

    #[tokio::test]
    async fn force_update_falls_back_to_delete_and_create() {
        let client = FakeClientBuilder::new()
            .with_object(&seeded_configmap("settings", "demo-ns", &[]))
            .with_replace_conflicts()
            .build();

        let pulled = ConfigMapBuilder::pull(&client, "settings", "demo-ns")
            .await
            .expect("pulled");
        let err = pulled.update(false).await.expect_err("replace rejected");
        assert!(matches!(err, Error::Api(_)));

        let pulled = ConfigMapBuilder::pull(&client, "settings", "demo-ns")
            .await
            .expect("pulled again")
            .with_data(BTreeMap::from([("key".to_string(), "forced".to_string())]));
        let builder = pulled.update(true).await.expect("forced update");
        let observed = builder.object.as_ref().expect("recreated object");
        assert_eq!(
            observed.data.as_ref().and_then(|d| d.get("key")).map(String::as_str),
            Some("forced")
        );
    }

    #[tokio::test]
    async fn list_wraps_every_element_as_pulled() {
        let client = FakeClientBuilder::new()
            .with_object(&seeded_configmap("one", "demo-ns", &[("app", "demo")]))
            .with_object(&seeded_configmap("two", "demo-ns", &[("app", "demo")]))
            .with_object(&seeded_configmap("other", "second-ns", &[]))
            .build();

        let builders = ConfigMapBuilder::list(&client, Some("demo-ns"), ListParams::default())
            .await
            .expect("listed");
        assert_eq!(builders.len(), 2);

        for listed in builders {
            let pulled = ConfigMapBuilder::pull(&client, &listed.name(), "demo-ns")
                .await
                .expect("pull of a listed element");
            assert_eq!(pulled.object, listed.object);
            assert_eq!(listed.definition, listed.object);
        }
    }

    #[tokio::test]
    async fn list_honours_label_selectors() {
        let client = FakeClientBuilder::new()
            .with_object(&seeded_configmap("one", "demo-ns", &[("app", "demo")]))
            .with_object(&seeded_configmap("two", "demo-ns", &[("app", "other")]))
            .build();

        let builders = ConfigMapBuilder::list(
            &client,
            Some("demo-ns"),
            ListParams::default().labels("app=demo"),
        )
        .await
        .expect("listed");
        assert_eq!(builders.len(), 1);
        assert_eq!(builders[0].name(), "one");
    }

    #[tokio::test]
    async fn list_requires_a_namespace_for_namespaced_kinds() {
        let client = FakeClientBuilder::new().build();
        let err = Builder::<ConfigMap>::list(&client, None, ListParams::default())
            .await
            .expect_err("namespace required");
        assert_eq!(
            err.to_string(),
            "failed to list configmaps, 'nsname' parameter is empty"
        );
    }

    #[tokio::test]
    async fn secret_requires_a_type_and_round_trips_string_data() {
        let client = FakeClientBuilder::new().build();

        let builder = SecretBuilder::new(&client, "credentials", "demo-ns", "");
        assert_eq!(builder.error_message(), Some("secret 'type' cannot be empty"));

        let builder = SecretBuilder::new(&client, "credentials", "demo-ns", "Opaque")
            .with_data(BTreeMap::from([("token".to_string(), "s3cr3t".to_string())]));
        let builder = builder.create().await.expect("secret created");
        let observed = builder.object.as_ref().expect("observed secret");
        assert_eq!(observed.type_.as_deref(), Some("Opaque"));
        assert_eq!(
            observed
                .string_data
                .as_ref()
                .and_then(|data| data.get("token"))
                .map(String::as_str),
            Some("s3cr3t")
        );
    }

    #[tokio::test]
    async fn options_hook_applies_and_fails_under_the_protocol() {
        let client = FakeClientBuilder::new().build();

        let builder = NamespaceBuilder::new(&client, "example").with_options([
            |builder: &mut NamespaceBuilder| {
                if let Some(definition) = builder.definition.as_mut() {
                    definition.metadata.finalizers = Some(vec!["demo/finalizer".to_string()]);
                }
                Ok(())
            },
        ]);
        assert!(builder.error_message().is_none());
        let finalizers = builder
            .definition
            .as_ref()
            .and_then(|d| d.metadata.finalizers.clone());
        assert_eq!(finalizers.as_ref().map(Vec::len), Some(1));

        let builder = builder.with_options([|_builder: &mut NamespaceBuilder| {
            Err(Error::validation("option rejected the builder"))
        }]);
        assert_eq!(builder.error_message(), Some("option rejected the builder"));
    }
}
