//!
//! aclstore HTTP server
//! --------------------
//! Axum router exposing the generic Get/Delete/List/Upsert operations.
//!
//! Responsibilities:
//! - Roles and policies under the configured namespace, with query filtering on list.
//! - Generic collections under `/collections/{name}` stored as raw JSON documents.
//! - One `RequestContext` (request id, optional cancel signal) per call.
//! - Startup logging of the listen address and namespace.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::context::RequestContext;
use crate::error::AppResult;
use crate::params::{query_from_pairs, PathParams};
use crate::storage::SharedManager;

pub mod factories;
pub mod handler;
pub mod list;

use factories::{policies_collection, roles_collection, Factories};
use handler::{Handler, Incoming, Reply};

/// Shared server state injected into all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub handler: Handler,
    pub namespace: String,
    routes: Arc<Routes>,
}

struct Routes {
    roles: Factories,
    policies: Factories,
    collections: Factories,
}

impl AppState {
    pub fn new(manager: SharedManager, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let routes = Routes {
            roles: Factories::fixed(roles_collection(&namespace)),
            policies: Factories::fixed(policies_collection(&namespace)),
            collections: Factories::generic(&namespace),
        };
        Self { handler: Handler::new(manager), namespace, routes: Arc::new(routes) }
    }
}

/// Which factory family a route uses.
#[derive(Debug, Clone, Copy)]
enum Family {
    Roles,
    Policies,
    Collections,
}

impl Routes {
    fn family(&self, family: Family) -> &Factories {
        match family {
            Family::Roles => &self.roles,
            Family::Policies => &self.policies,
            Family::Collections => &self.collections,
        }
    }
}

type QueryPairs = Query<Vec<(String, String)>>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "aclstore ok" }))
        .route("/roles", get(|s: State<AppState>, q: QueryPairs| list_fixed(s, Family::Roles, q)))
        .route(
            "/roles/{id}",
            get(|s: State<AppState>, p: Path<PathParams>| get_one(s, Family::Roles, p))
                .put(|s: State<AppState>, p: Path<PathParams>, b: Bytes| upsert_one(s, Family::Roles, p, b))
                .delete(|s: State<AppState>, p: Path<PathParams>| delete_one(s, Family::Roles, p)),
        )
        .route("/policies", get(|s: State<AppState>, q: QueryPairs| list_fixed(s, Family::Policies, q)))
        .route(
            "/policies/{id}",
            get(|s: State<AppState>, p: Path<PathParams>| get_one(s, Family::Policies, p))
                .put(|s: State<AppState>, p: Path<PathParams>, b: Bytes| upsert_one(s, Family::Policies, p, b))
                .delete(|s: State<AppState>, p: Path<PathParams>| delete_one(s, Family::Policies, p)),
        )
        .route("/collections/{name}", get(list_collection))
        .route(
            "/collections/{name}/{key}",
            get(|s: State<AppState>, p: Path<PathParams>| get_one(s, Family::Collections, p))
                .put(|s: State<AppState>, p: Path<PathParams>, b: Bytes| upsert_one(s, Family::Collections, p, b))
                .delete(|s: State<AppState>, p: Path<PathParams>| delete_one(s, Family::Collections, p)),
        )
        .with_state(state)
}

async fn list_fixed(State(state): State<AppState>, family: Family, Query(pairs): QueryPairs) -> AppResult<Reply> {
    let incoming = Incoming::new(PathParams::new(), query_from_pairs(pairs), Bytes::new());
    let ctx = RequestContext::new();
    debug!(target: "aclstore::handler", request_id = %ctx.request_id, ?family, "list");
    state.handler.list(&ctx, &incoming, state.routes.family(family).list.as_ref()).await
}

async fn list_collection(
    State(state): State<AppState>,
    Path(params): Path<PathParams>,
    Query(pairs): QueryPairs,
) -> AppResult<Reply> {
    let incoming = Incoming::new(params, query_from_pairs(pairs), Bytes::new());
    let ctx = RequestContext::new();
    debug!(target: "aclstore::handler", request_id = %ctx.request_id, family = ?Family::Collections, "list");
    state.handler.list(&ctx, &incoming, state.routes.collections.list.as_ref()).await
}

async fn get_one(State(state): State<AppState>, family: Family, Path(params): Path<PathParams>) -> AppResult<Reply> {
    let incoming = Incoming::new(params, Default::default(), Bytes::new());
    state.handler.get(&RequestContext::new(), &incoming, state.routes.family(family).get.as_ref()).await
}

async fn delete_one(State(state): State<AppState>, family: Family, Path(params): Path<PathParams>) -> AppResult<Reply> {
    let incoming = Incoming::new(params, Default::default(), Bytes::new());
    state.handler.delete(&RequestContext::new(), &incoming, state.routes.family(family).delete.as_ref()).await
}

async fn upsert_one(State(state): State<AppState>, family: Family, Path(params): Path<PathParams>, body: Bytes) -> AppResult<Reply> {
    let incoming = Incoming::new(params, Default::default(), body);
    state.handler.upsert(&RequestContext::new(), &incoming, state.routes.family(family).upsert.as_ref()).await
}

/// Serve `state` on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Bind the configured address and serve the API backed by `manager`.
pub async fn run(config: &ServerConfig, manager: SharedManager) -> anyhow::Result<()> {
    let addr = config.listen_addr();
    info!(
        target: "startup",
        "aclstore starting. namespace={}, roles={}, policies={}, seed={:?}",
        config.namespace,
        roles_collection(&config.namespace),
        policies_collection(&config.namespace),
        config.seed_file
    );
    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(target: "startup", "failed to bind {}: {}", addr, e);
            return Err(e.into());
        }
    };
    info!(target: "startup", "Starting server on {}", addr);
    serve(listener, AppState::new(manager, config.namespace.clone())).await
}
