use std::collections::{BTreeMap, HashMap as StdHashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::model::{Policy, Role};
use crate::pagination;
use super::Manager;

/// Documents of one collection, ordered by key.
type Collection = BTreeMap<String, JsonValue>;

/// In-process backend holding every collection in memory.
///
/// Clones share the same underlying map, so a single instance can be handed to
/// the server and kept by the caller for seeding or inspection.
#[derive(Clone, Default)]
pub struct MemoryManager {
    /// collection name -> (key -> document)
    inner: Arc<parking_lot::RwLock<StdHashMap<String, Collection>>>,
}

/// On-disk seed format: `{"roles": [...], "policies": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub policies: Vec<Policy>,
}

impl MemoryManager {
    pub fn new() -> Self { Self::default() }

    /// Number of documents in a collection (0 if it does not exist).
    pub fn len(&self, collection: &str) -> usize {
        self.inner.read().get(collection).map(|c| c.len()).unwrap_or(0)
    }

    /// Names of all collections that currently hold a document.
    pub fn collections(&self) -> Vec<String> {
        let mut out: Vec<String> = self.inner.read().iter().filter(|(_, c)| !c.is_empty()).map(|(k, _)| k.clone()).collect();
        out.sort();
        out
    }

    pub fn insert(&self, collection: &str, key: &str, value: JsonValue) {
        let mut w = self.inner.write();
        w.entry(collection.to_string()).or_default().insert(key.to_string(), value);
    }

    pub fn seed_roles(&self, collection: &str, roles: &[Role]) -> AppResult<()> {
        for role in roles {
            self.insert(collection, &role.id, serde_json::to_value(role)?);
        }
        Ok(())
    }

    pub fn seed_policies(&self, collection: &str, policies: &[Policy]) -> AppResult<()> {
        for policy in policies {
            self.insert(collection, &policy.id, serde_json::to_value(policy)?);
        }
        Ok(())
    }

    /// Load roles and policies from a JSON seed file into `<namespace>/roles`
    /// and `<namespace>/policies`. Returns the number of documents loaded.
    pub fn load_seed_file(&self, path: &Path, namespace: &str) -> AppResult<usize> {
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::backend("io".to_string(), format!("cannot read seed file {}: {}", path.display(), e)))?;
        let seed: SeedFile = serde_json::from_slice(&bytes)?;
        if let Some(role) = seed.roles.iter().find(|r| r.id.is_empty()) {
            return Err(AppError::user("invalid_seed".to_string(), format!("role with members {:?} has no id", role.members)));
        }
        if seed.policies.iter().any(|p| p.id.is_empty()) {
            return Err(AppError::user("invalid_seed", "policy without id in seed file"));
        }
        self.seed_roles(&format!("{namespace}/roles"), &seed.roles)?;
        self.seed_policies(&format!("{namespace}/policies"), &seed.policies)?;
        Ok(seed.roles.len() + seed.policies.len())
    }

    fn snapshot(&self, collection: &str, limit: Option<usize>, offset: usize) -> Vec<JsonValue> {
        let r = self.inner.read();
        let Some(c) = r.get(collection) else { return Vec::new(); };
        let (start, end) = match limit {
            Some(limit) => pagination::index(limit, offset, c.len()),
            None => (0, c.len()),
        };
        c.values().skip(start).take(end - start).cloned().collect()
    }
}

#[async_trait]
impl Manager for MemoryManager {
    async fn get(&self, ctx: &RequestContext, collection: &str, key: &str) -> AppResult<JsonValue> {
        ctx.ensure_active()?;
        let r = self.inner.read();
        r.get(collection)
            .and_then(|c| c.get(key))
            .cloned()
            .ok_or_else(|| not_found(collection, key))
    }

    async fn delete(&self, ctx: &RequestContext, collection: &str, key: &str) -> AppResult<()> {
        ctx.ensure_active()?;
        let mut w = self.inner.write();
        let removed = w.get_mut(collection).and_then(|c| c.remove(key));
        match removed {
            Some(_) => {
                debug!(target: "aclstore::storage", collection, key, "deleted");
                Ok(())
            }
            None => Err(not_found(collection, key)),
        }
    }

    async fn upsert(&self, ctx: &RequestContext, collection: &str, key: &str, value: JsonValue) -> AppResult<JsonValue> {
        ctx.ensure_active()?;
        self.insert(collection, key, value.clone());
        debug!(target: "aclstore::storage", collection, key, "upserted");
        Ok(value)
    }

    async fn list(&self, ctx: &RequestContext, collection: &str, limit: usize, offset: usize) -> AppResult<Vec<JsonValue>> {
        ctx.ensure_active()?;
        Ok(self.snapshot(collection, Some(limit), offset))
    }

    async fn list_all(&self, ctx: &RequestContext, collection: &str) -> AppResult<Vec<JsonValue>> {
        ctx.ensure_active()?;
        Ok(self.snapshot(collection, None, 0))
    }
}

fn not_found(collection: &str, key: &str) -> AppError {
    AppError::not_found("not_found".to_string(), format!("no record '{key}' in collection '{collection}'"))
}
