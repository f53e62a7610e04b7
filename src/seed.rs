//! Boot-time resource loading from a multi-document YAML file.
//!
//! Each document is `{type: <Kind>, spec: <resource>}` and is applied with
//! CreateOrReplace as a cluster admin, so loading the same file twice is harmless.

use anyhow::{bail, Context as _};
use serde::Deserialize;

use crate::actions::Context;
use crate::app::AppState;
use crate::auth::Viewer;
use crate::types::{
    Asset, CheckConfig, ClusterRole, ClusterRoleBinding, Entity, Event, EventFilter, Handler,
    HookConfig, Mutator, Namespace, Resource, Role, RoleBinding, Silenced, User,
};

const SEED_USER: &str = "seed";

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "type")]
    kind: String,
    spec: serde_yaml::Value,
}

/// Apply every document in `yaml`, returning how many were applied
pub async fn load(state: &AppState, yaml: &str) -> anyhow::Result<usize> {
    let mut applied = 0;
    for (index, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
        let document = Document::deserialize(document)
            .with_context(|| format!("seed document {} is malformed", index + 1))?;
        let kind = document.kind.clone();
        apply(state, document)
            .await
            .with_context(|| format!("seed document {} ({})", index + 1, kind))?;
        applied += 1;
    }
    tracing::info!(documents = applied, "seed loaded");
    Ok(applied)
}

pub async fn load_file(state: &AppState, path: &std::path::Path) -> anyhow::Result<usize> {
    let yaml = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    load(state, &yaml).await
}

async fn apply(state: &AppState, document: Document) -> anyhow::Result<()> {
    let spec = document.spec;
    match document.kind.as_str() {
        "CheckConfig" | "checks" => put::<CheckConfig>(state, spec).await,
        "Entity" | "entities" => put::<Entity>(state, spec).await,
        "Event" | "events" => put::<Event>(state, spec).await,
        "Handler" | "handlers" => put::<Handler>(state, spec).await,
        "EventFilter" | "filters" => put::<EventFilter>(state, spec).await,
        "Mutator" | "mutators" => put::<Mutator>(state, spec).await,
        "Asset" | "assets" => put::<Asset>(state, spec).await,
        "HookConfig" | "hooks" => put::<HookConfig>(state, spec).await,
        "Silenced" | "silenced" => put::<Silenced>(state, spec).await,
        "Role" | "roles" => put::<Role>(state, spec).await,
        "RoleBinding" | "rolebindings" => put::<RoleBinding>(state, spec).await,
        "ClusterRole" | "clusterroles" => put::<ClusterRole>(state, spec).await,
        "ClusterRoleBinding" | "clusterrolebindings" => put::<ClusterRoleBinding>(state, spec).await,
        "Namespace" | "namespaces" => put::<Namespace>(state, spec).await,
        "User" | "users" => put::<User>(state, spec).await,
        other => bail!("unknown resource type {:?}", other),
    }
}

async fn put<T: Resource>(state: &AppState, spec: serde_yaml::Value) -> anyhow::Result<()> {
    let mut resource: T = serde_yaml::from_value(spec)?;
    resource.normalize();
    let ctx = Context::new(resource.namespace(), Viewer::cluster_admin(SEED_USER));
    state.controller::<T>().create_or_replace(&ctx, resource).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::store::{MemoryStore, Store};
    use std::sync::Arc;

    const SEED: &str = r#"
type: Namespace
spec:
  metadata:
    name: prod
---
type: CheckConfig
spec:
  metadata:
    name: cpu
    namespace: prod
  command: check-cpu.sh
  interval: 30
---
type: User
spec:
  metadata:
    name: alice
  password: correct-horse
"#;

    fn state() -> AppState {
        AppState::new(AppConfig::development(), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn loads_every_document() {
        let state = state();
        assert_eq!(load(&state, SEED).await.unwrap(), 3);
        // idempotent
        assert_eq!(load(&state, SEED).await.unwrap(), 3);

        let check = state.store::<CheckConfig>().get_by_name("prod", "cpu").await.unwrap().unwrap();
        assert_eq!(check.interval, 30);
        let alice = state.store::<User>().get_by_name("", "alice").await.unwrap().unwrap();
        assert!(alice.verify_password("correct-horse"));
    }

    #[tokio::test]
    async fn rejects_unknown_types_and_invalid_resources() {
        let err = load(&state(), "type: Widget\nspec: {}\n").await.unwrap_err();
        assert!(format!("{:#}", err).contains("unknown resource type"));

        let invalid = "type: CheckConfig\nspec:\n  metadata:\n    name: cpu\n    namespace: default\n";
        let err = load(&state(), invalid).await.unwrap_err();
        assert!(format!("{:#}", err).contains("command"));
    }
}
