//! Request factories for the routes mounted by [`super::router`].
//!
//! Roles and policies live in fixed collections under the configured
//! namespace and are addressed by the `id` path parameter. Generic collections
//! are addressed by `name` and `key`; their shape follows the collection name,
//! so `/collections/roles` behaves exactly like `/roles`.

use std::sync::Arc;

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::model::{Record, Shape};
use super::handler::{DeleteRequest, FactoryFn, GetRequest, Incoming, UpsertRequest};
use super::list::{CollectionKind, ListRequest};

pub fn roles_collection(namespace: &str) -> String { format!("{namespace}/roles") }
pub fn policies_collection(namespace: &str) -> String { format!("{namespace}/policies") }

/// The four factories of one endpoint family.
#[derive(Clone)]
pub struct Factories {
    pub get: Arc<FactoryFn<GetRequest>>,
    pub delete: Arc<FactoryFn<DeleteRequest>>,
    pub upsert: Arc<FactoryFn<UpsertRequest>>,
    pub list: Arc<FactoryFn<ListRequest>>,
}

impl Factories {
    /// One fixed collection keyed by the `id` path parameter.
    pub fn fixed(collection: String) -> Self {
        let shape = CollectionKind::of(&collection).shape();
        let c_get = collection.clone();
        let c_delete = collection.clone();
        let c_upsert = collection.clone();
        let c_list = collection;
        Self {
            get: Arc::new(move |_: &RequestContext, inc: &Incoming| -> AppResult<GetRequest> {
                Ok(GetRequest { collection: c_get.clone(), key: inc.param("id")?.to_string(), shape })
            }),
            delete: Arc::new(move |_: &RequestContext, inc: &Incoming| -> AppResult<DeleteRequest> {
                Ok(DeleteRequest { collection: c_delete.clone(), key: inc.param("id")?.to_string() })
            }),
            upsert: Arc::new(move |_: &RequestContext, inc: &Incoming| -> AppResult<UpsertRequest> {
                let key = inc.param("id")?;
                Ok(UpsertRequest { collection: c_upsert.clone(), key: key.to_string(), value: decode_keyed(shape, key, inc)? })
            }),
            list: Arc::new(move |_: &RequestContext, _: &Incoming| -> AppResult<ListRequest> {
                Ok(ListRequest::for_collection(c_list.clone()))
            }),
        }
    }

    /// `/collections/{name}[/{key}]` under a namespace.
    pub fn generic(namespace: &str) -> Self {
        let ns = namespace.to_string();
        let (ns_get, ns_delete, ns_upsert, ns_list) = (ns.clone(), ns.clone(), ns.clone(), ns);
        Self {
            get: Arc::new(move |_: &RequestContext, inc: &Incoming| -> AppResult<GetRequest> {
                let collection = collection_from(&ns_get, inc)?;
                let shape = CollectionKind::of(&collection).shape();
                Ok(GetRequest { collection, key: inc.param("key")?.to_string(), shape })
            }),
            delete: Arc::new(move |_: &RequestContext, inc: &Incoming| -> AppResult<DeleteRequest> {
                Ok(DeleteRequest { collection: collection_from(&ns_delete, inc)?, key: inc.param("key")?.to_string() })
            }),
            upsert: Arc::new(move |_: &RequestContext, inc: &Incoming| -> AppResult<UpsertRequest> {
                let collection = collection_from(&ns_upsert, inc)?;
                let key = inc.param("key")?;
                let value = decode_keyed(CollectionKind::of(&collection).shape(), key, inc)?;
                Ok(UpsertRequest { collection, key: key.to_string(), value })
            }),
            list: Arc::new(move |_: &RequestContext, inc: &Incoming| -> AppResult<ListRequest> {
                Ok(ListRequest::for_collection(collection_from(&ns_list, inc)?))
            }),
        }
    }
}

fn collection_from(namespace: &str, inc: &Incoming) -> AppResult<String> {
    let name = inc.param("name")?;
    if name.contains('/') {
        return Err(AppError::user("invalid_collection".to_string(), format!("collection name '{name}' must not contain '/'")));
    }
    Ok(format!("{namespace}/{name}"))
}

/// Decode the body and reconcile its `id` with the path key. A missing id is
/// filled from the path; a different one is rejected.
fn decode_keyed(shape: Shape, key: &str, inc: &Incoming) -> AppResult<Record> {
    let mut record = Record::from_body(shape, &inc.body)?;
    let id = match &mut record {
        Record::Role(r) => Some(&mut r.id),
        Record::Policy(p) => Some(&mut p.id),
        Record::Raw(_) => None,
    };
    if let Some(id) = id {
        if id.is_empty() {
            *id = key.to_string();
        } else if id.as_str() != key {
            return Err(AppError::user("id_mismatch".to_string(), format!("body id '{id}' does not match path id '{key}'")));
        }
    }
    Ok(record)
}
