//!
//! aclstore storage module
//! ------------------------
//! Backend abstraction for keyed collections of JSON documents. A collection
//! is an opaque name such as `acl/roles`; each record inside it is addressed
//! by a string key.
//!
//! The request layer only depends on the [`Manager`] trait. The crate ships
//! [`MemoryManager`], an in-process backend used by the server binary and by
//! tests; durable backends implement the same trait elsewhere.
//!
//! Contract shared by all backends:
//! - `get`/`delete` on a missing key fail with `AppError::NotFound`.
//! - `upsert` creates or replaces and returns the document as stored.
//! - `list` and `list_all` return documents in ascending key order; an unknown
//!   collection lists as empty.
//! - Every operation observes `RequestContext` cancellation before touching data.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::context::RequestContext;
use crate::error::AppResult;

pub mod memory;

pub use memory::{MemoryManager, SeedFile};

#[async_trait]
pub trait Manager: Send + Sync {
    /// Fetch one document.
    async fn get(&self, ctx: &RequestContext, collection: &str, key: &str) -> AppResult<JsonValue>;

    /// Remove one document.
    async fn delete(&self, ctx: &RequestContext, collection: &str, key: &str) -> AppResult<()>;

    /// Create or replace the document at `key`, returning what was written.
    async fn upsert(&self, ctx: &RequestContext, collection: &str, key: &str, value: JsonValue) -> AppResult<JsonValue>;

    /// One page of at most `limit` documents starting at `offset`.
    async fn list(&self, ctx: &RequestContext, collection: &str, limit: usize, offset: usize) -> AppResult<Vec<JsonValue>>;

    /// Every document in the collection.
    async fn list_all(&self, ctx: &RequestContext, collection: &str) -> AppResult<Vec<JsonValue>>;
}

/// Backend handle shared across handlers and requests.
pub type SharedManager = Arc<dyn Manager>;
