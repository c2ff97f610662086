//! List decision engine.
//!
//! A list call either pulls the whole collection and filters it in memory, or
//! lets the backend return one page. Which path is taken depends on the
//! trailing segment of the collection name and on which filter dimensions the
//! query carries:
//!
//! | kind       | dimensions that force a full scan | refining only |
//! |------------|-----------------------------------|---------------|
//! | `roles`    | `member`                          | `id`          |
//! | `policies` | `subject`, `resource`, `action`   | `id`          |
//! | other      | none                              | none          |
//!
//! Pagination runs exactly once per request: in the backend on the page path,
//! over the filtered result on the scan path.

use tracing::debug;

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::model::{Listing, Policy, Role, Shape};
use crate::pagination;
use crate::params::QueryMap;
use crate::storage::Manager;

/// Record kind implied by the last `/` segment of a collection name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Roles,
    Policies,
    Other,
}

impl CollectionKind {
    pub fn of(collection: &str) -> Self {
        match collection.rsplit('/').next().unwrap_or_default() {
            "roles" => CollectionKind::Roles,
            "policies" => CollectionKind::Policies,
            _ => CollectionKind::Other,
        }
    }

    /// Query parameters that turn a list call into a full scan. `id` is never
    /// one of them.
    pub fn scan_dimensions(&self) -> &'static [&'static str] {
        match self {
            CollectionKind::Roles => &["member"],
            CollectionKind::Policies => &["action", "subject", "resource"],
            CollectionKind::Other => &[],
        }
    }

    /// Record shape kept in collections of this kind.
    pub fn shape(&self) -> Shape {
        match self {
            CollectionKind::Roles => Shape::Roles,
            CollectionKind::Policies => Shape::Policies,
            CollectionKind::Other => Shape::Raw,
        }
    }
}

/// True iff the query names at least one scan dimension for this kind.
pub fn is_filter(kind: CollectionKind, query: &QueryMap) -> bool {
    kind.scan_dimensions().iter().any(|d| query.contains_key(*d))
}

/// Filter routine bound to a [`ListRequest`] when it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStrategy {
    /// Keep records matching every supplied dimension of the query.
    ByQuery,
    /// Leave the listing untouched.
    Passthrough,
}

impl FilterStrategy {
    pub fn apply(self, listing: Listing, query: &QueryMap) -> AppResult<Listing> {
        match self {
            FilterStrategy::ByQuery => listing.apply_filters(query),
            FilterStrategy::Passthrough => Ok(listing),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub collection: String,
    pub shape: Shape,
    pub strategy: FilterStrategy,
}

impl ListRequest {
    pub fn roles(collection: impl Into<String>) -> Self {
        Self { collection: collection.into(), shape: Shape::Roles, strategy: FilterStrategy::ByQuery }
    }

    pub fn policies(collection: impl Into<String>) -> Self {
        Self { collection: collection.into(), shape: Shape::Policies, strategy: FilterStrategy::ByQuery }
    }

    pub fn raw(collection: impl Into<String>) -> Self {
        Self { collection: collection.into(), shape: Shape::Raw, strategy: FilterStrategy::Passthrough }
    }

    /// Request whose shape and strategy follow from the collection name.
    pub fn for_collection(collection: impl Into<String>) -> Self {
        let collection = collection.into();
        match CollectionKind::of(&collection) {
            CollectionKind::Roles => Self::roles(collection),
            CollectionKind::Policies => Self::policies(collection),
            CollectionKind::Other => Self::raw(collection),
        }
    }

    /// Reject a strategy that cannot handle the request's shape before any
    /// backend work is done.
    pub fn validate(&self) -> AppResult<()> {
        if self.strategy == FilterStrategy::ByQuery && self.shape == Shape::Raw {
            return Err(unfilterable(&self.collection));
        }
        Ok(())
    }
}

/// Capability shared by decoded listings: query filtering and windowing.
pub trait Filterable: Sized {
    fn apply_filters(self, query: &QueryMap) -> AppResult<Self>;
    fn apply_window(self, limit: usize, offset: usize) -> Self;
}

/// Values of one dimension; an empty slice means "no constraint".
fn dimension<'a>(query: &'a QueryMap, name: &str) -> &'a [String] {
    query.get(name).map(|v| v.as_slice()).unwrap_or(&[])
}

fn passes(wanted: &[String], test: impl FnOnce(&[String]) -> bool) -> bool {
    wanted.is_empty() || test(wanted)
}

fn id_in(id: &str, wanted: &[String]) -> bool {
    wanted.iter().any(|w| w == id)
}

pub fn role_matches(role: &Role, query: &QueryMap) -> bool {
    passes(dimension(query, "member"), |m| role.has_any_member(m))
        && passes(dimension(query, "id"), |ids| id_in(&role.id, ids))
}

pub fn policy_matches(policy: &Policy, query: &QueryMap) -> bool {
    passes(dimension(query, "subject"), |s| policy.has_any_subject(s))
        && passes(dimension(query, "resource"), |r| policy.has_any_resource(r))
        && passes(dimension(query, "action"), |a| policy.has_any_action(a))
        && passes(dimension(query, "id"), |ids| id_in(&policy.id, ids))
}

fn window<T>(mut items: Vec<T>, limit: usize, offset: usize) -> Vec<T> {
    let (start, end) = pagination::index(limit, offset, items.len());
    items.truncate(end);
    items.drain(..start);
    items
}

impl Filterable for Listing {
    fn apply_filters(self, query: &QueryMap) -> AppResult<Self> {
        match self {
            Listing::Roles(roles) => Ok(Listing::Roles(roles.into_iter().filter(|r| role_matches(r, query)).collect())),
            Listing::Policies(policies) => Ok(Listing::Policies(policies.into_iter().filter(|p| policy_matches(p, query)).collect())),
            Listing::Raw(_) => Err(AppError::contract("unfilterable_shape", "raw listings cannot be filtered by query")),
        }
    }

    fn apply_window(self, limit: usize, offset: usize) -> Self {
        match self {
            Listing::Roles(v) => Listing::Roles(window(v, limit, offset)),
            Listing::Policies(v) => Listing::Policies(window(v, limit, offset)),
            Listing::Raw(v) => Listing::Raw(window(v, limit, offset)),
        }
    }
}

/// How a single list call will be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListPlan {
    pub kind: CollectionKind,
    /// Full scan plus in-memory filtering when true, backend page otherwise.
    pub scan: bool,
    pub limit: usize,
    pub offset: usize,
}

impl ListPlan {
    pub fn new(request: &ListRequest, query: &QueryMap) -> Self {
        let kind = CollectionKind::of(&request.collection);
        let (limit, offset) = pagination::parse_default(query);
        Self { kind, scan: is_filter(kind, query), limit, offset }
    }
}

/// Serve a list call against `manager`.
pub async fn execute(manager: &dyn Manager, ctx: &RequestContext, request: &ListRequest, query: &QueryMap) -> AppResult<Listing> {
    request.validate()?;
    let plan = ListPlan::new(request, query);
    debug!(
        target: "aclstore::list",
        request_id = %ctx.request_id,
        collection = %request.collection,
        kind = ?plan.kind,
        scan = plan.scan,
        limit = plan.limit,
        offset = plan.offset,
        "list plan"
    );

    let values = if plan.scan {
        manager.list_all(ctx, &request.collection).await?
    } else {
        manager.list(ctx, &request.collection, plan.limit, plan.offset).await?
    };
    let fetched = values.len();
    let listing = request.strategy.apply(Listing::decode(request.shape, values)?, query)?;
    let listing = if plan.scan { listing.apply_window(plan.limit, plan.offset) } else { listing };

    debug!(target: "aclstore::list", request_id = %ctx.request_id, fetched, returned = listing.len(), "list done");
    Ok(listing)
}

fn unfilterable(collection: &str) -> AppError {
    AppError::contract(
        "unfilterable_shape".to_string(),
        format!("list request for '{collection}' binds a query filter to raw documents"),
    )
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod list_tests;
