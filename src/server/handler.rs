//! Generic Get/Delete/List/Upsert orchestration.
//!
//! Each operation runs `factory -> backend -> reply`. Factories are supplied per
//! endpoint and are the only place that looks at transport input.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::model::{Record, Shape};
use crate::params::{PathParams, QueryMap};
use crate::storage::SharedManager;
use super::list::{self, ListRequest};

/// Transport input handed to factories.
#[derive(Debug, Clone, Default)]
pub struct Incoming {
    pub params: PathParams,
    pub query: QueryMap,
    pub body: Bytes,
}

impl Incoming {
    pub fn new(params: PathParams, query: QueryMap, body: Bytes) -> Self {
        Self { params, query, body }
    }

    /// Required path parameter; absent or blank values are a user error.
    pub fn param(&self, name: &str) -> AppResult<&str> {
        match self.params.get(name).map(|s| s.trim()) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(AppError::user("missing_param".to_string(), format!("path parameter '{name}' is required"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRequest {
    pub collection: String,
    pub key: String,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub collection: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpsertRequest {
    pub collection: String,
    pub key: String,
    pub value: Record,
}

/// Builds a typed request from transport input.
pub type FactoryFn<R> = dyn Fn(&RequestContext, &Incoming) -> AppResult<R> + Send + Sync;

/// Successful operation outcome, independent of the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Json(JsonValue),
    NoContent,
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(v) => (StatusCode::OK, Json(v)).into_response(),
            Reply::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

#[derive(Clone)]
pub struct Handler {
    manager: SharedManager,
}

impl Handler {
    pub fn new(manager: SharedManager) -> Self { Self { manager } }

    pub fn manager(&self) -> &SharedManager { &self.manager }

    pub async fn get(&self, ctx: &RequestContext, incoming: &Incoming, factory: &FactoryFn<GetRequest>) -> AppResult<Reply> {
        let req = factory(ctx, incoming).inspect_err(|e| log_rejected(ctx, "get", e))?;
        debug!(target: "aclstore::handler", request_id = %ctx.request_id, collection = %req.collection, key = %req.key, "get");
        let value = self.manager.get(ctx, &req.collection, &req.key).await?;
        let record = Record::decode(req.shape, value)?;
        Ok(Reply::Json(record.to_value()?))
    }

    pub async fn delete(&self, ctx: &RequestContext, incoming: &Incoming, factory: &FactoryFn<DeleteRequest>) -> AppResult<Reply> {
        let req = factory(ctx, incoming).inspect_err(|e| log_rejected(ctx, "delete", e))?;
        debug!(target: "aclstore::handler", request_id = %ctx.request_id, collection = %req.collection, key = %req.key, "delete");
        self.manager.delete(ctx, &req.collection, &req.key).await?;
        Ok(Reply::NoContent)
    }

    pub async fn upsert(&self, ctx: &RequestContext, incoming: &Incoming, factory: &FactoryFn<UpsertRequest>) -> AppResult<Reply> {
        let req = factory(ctx, incoming).inspect_err(|e| log_rejected(ctx, "upsert", e))?;
        debug!(target: "aclstore::handler", request_id = %ctx.request_id, collection = %req.collection, key = %req.key, "upsert");
        let written = self.manager.upsert(ctx, &req.collection, &req.key, req.value.to_value()?).await?;
        // Echo what the backend stored, in the caller's shape
        let record = Record::decode(req.value.shape(), written)?;
        Ok(Reply::Json(record.to_value()?))
    }

    pub async fn list(&self, ctx: &RequestContext, incoming: &Incoming, factory: &FactoryFn<ListRequest>) -> AppResult<Reply> {
        let req = factory(ctx, incoming).inspect_err(|e| log_rejected(ctx, "list", e))?;
        let listing = list::execute(self.manager.as_ref(), ctx, &req, &incoming.query).await?;
        Ok(Reply::Json(serde_json::to_value(&listing)?))
    }
}

fn log_rejected(ctx: &RequestContext, op: &str, err: &AppError) {
    warn!(target: "aclstore::handler", request_id = %ctx.request_id, op, error = %err, "factory rejected request");
}
