//! Profile collaborator: per-user professional context.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

/// Free-form professional context handed to agent handlers.
pub type ProfileContext = HashMap<String, Value>;

/// Read/write access to user profile context.
///
/// A user without a stored profile is not an error; handlers receive an
/// empty context and degrade their analysis accordingly.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn context_for(&self, user_id: &str) -> anyhow::Result<ProfileContext>;

    async fn upsert(&self, user_id: &str, key: &str, value: Value) -> anyhow::Result<()>;
}

/// Bundled store backed by a concurrent map. State does not survive a
/// restart, matching the rest of the in-memory core.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: DashMap<String, ProfileContext>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn context_for(&self, user_id: &str) -> anyhow::Result<ProfileContext> {
        Ok(self
            .profiles
            .get(user_id)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }

    async fn upsert(&self, user_id: &str, key: &str, value: Value) -> anyhow::Result<()> {
        self.profiles
            .entry(user_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn missing_profile_yields_empty_context() {
        let store = InMemoryProfileStore::new();
        let ctx = store.context_for("nobody").await.unwrap();
        assert!(ctx.is_empty());
    }

    #[tokio::test]
    async fn upsert_then_read_back() {
        let store = InMemoryProfileStore::new();
        store
            .upsert("u1", "current_role", json!("software engineer"))
            .await
            .unwrap();
        store
            .upsert("u1", "skills", json!(["rust", "sql"]))
            .await
            .unwrap();

        let ctx = store.context_for("u1").await.unwrap();
        assert_eq!(ctx["current_role"], json!("software engineer"));
        assert_eq!(ctx["skills"], json!(["rust", "sql"]));
    }
}
