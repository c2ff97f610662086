//! HTTP API integration tests: the router served on an ephemeral port and
//! driven with reqwest.

use std::sync::Arc;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use aclstore::model::{Policy, Role};
use aclstore::server::{self, AppState};
use aclstore::storage::MemoryManager;

async fn spawn_server(manager: MemoryManager) -> Result<String> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let addr = listener.local_addr()?;
    let state = AppState::new(Arc::new(manager), "acl");
    tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            eprintln!("server exited: {e}");
        }
    });
    Ok(format!("http://{addr}"))
}

fn seeded() -> MemoryManager {
    let m = MemoryManager::new();
    m.seed_roles(
        "acl/roles",
        &[Role::new("r1", &["alice", "bob"]), Role::new("r2", &["carol"]), Role::new("r3", &["alice"])],
    )
    .unwrap();
    m.seed_policies(
        "acl/policies",
        &[
            Policy::new("p1", &["alice"], &["doc"], &["read"]),
            Policy::new("p2", &["bob"], &["doc"], &["read", "write"]),
            Policy::new("p3", &["alice"], &["wiki"], &["write"]),
        ],
    )
    .unwrap();
    m
}

fn ids(v: &Value) -> Vec<String> {
    v.as_array()
        .expect("array body")
        .iter()
        .map(|r| r["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

async fn get_json(client: &reqwest::Client, url: String) -> Result<(StatusCode, Value)> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    Ok((status, resp.json().await?))
}

#[tokio::test]
async fn root_reports_ok() -> Result<()> {
    let base = spawn_server(MemoryManager::new()).await?;
    let body = reqwest::get(format!("{base}/")).await?.text().await?;
    assert_eq!(body, "aclstore ok");
    Ok(())
}

#[tokio::test]
async fn roles_filter_by_member_then_window() -> Result<()> {
    let base = spawn_server(seeded()).await?;
    let client = reqwest::Client::new();

    let (status, body) = get_json(&client, format!("{base}/roles?member=alice")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["r1", "r3"]);

    let (_, body) = get_json(&client, format!("{base}/roles?member=alice&limit=1&offset=1")).await?;
    assert_eq!(ids(&body), vec!["r3"]);

    let (_, body) = get_json(&client, format!("{base}/roles?member=alice&member=carol&id=r2")).await?;
    assert_eq!(ids(&body), vec!["r2"]);
    Ok(())
}

#[tokio::test]
async fn policies_dimensions_are_anded() -> Result<()> {
    let base = spawn_server(seeded()).await?;
    let client = reqwest::Client::new();

    let (_, body) = get_json(&client, format!("{base}/policies?action=write")).await?;
    assert_eq!(ids(&body), vec!["p2", "p3"]);

    let (_, body) = get_json(&client, format!("{base}/policies?action=write&subject=alice")).await?;
    assert_eq!(ids(&body), vec!["p3"]);

    let (_, body) = get_json(&client, format!("{base}/policies?resource=doc&action=read")).await?;
    assert_eq!(ids(&body), vec!["p1", "p2"]);
    assert_eq!(body[0]["effect"], "deny");
    Ok(())
}

#[tokio::test]
async fn unfiltered_list_pages_in_key_order() -> Result<()> {
    let base = spawn_server(seeded()).await?;
    let client = reqwest::Client::new();

    let (_, body) = get_json(&client, format!("{base}/roles?limit=2&offset=1")).await?;
    assert_eq!(ids(&body), vec!["r2", "r3"]);

    let (_, body) = get_json(&client, format!("{base}/roles?offset=9")).await?;
    assert_eq!(ids(&body), Vec::<String>::new());

    // An unparseable limit falls back to the default, a negative offset clamps to zero.
    let (status, body) = get_json(&client, format!("{base}/roles?limit=lots&offset=-3")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["r1", "r2", "r3"]);
    Ok(())
}

#[tokio::test]
async fn upsert_get_delete_lifecycle() -> Result<()> {
    let base = spawn_server(MemoryManager::new()).await?;
    let client = reqwest::Client::new();

    let resp = client.put(format!("{base}/roles/r9")).body(r#"{"members":["dave"]}"#).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.json::<Value>().await?, json!({"id": "r9", "members": ["dave"]}));

    let (status, body) = get_json(&client, format!("{base}/roles/r9")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"], json!(["dave"]));

    let resp = client.delete(format!("{base}/roles/r9")).send().await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.bytes().await?.is_empty());

    let (status, body) = get_json(&client, format!("{base}/roles/r9")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], "not_found");

    let resp = client.delete(format!("{base}/roles/r9")).send().await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn bad_bodies_are_user_errors() -> Result<()> {
    let base = spawn_server(MemoryManager::new()).await?;
    let client = reqwest::Client::new();

    let resp = client.put(format!("{base}/policies/p1")).body(r#"{"id":"p2"}"#).send().await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>().await?["code"], "id_mismatch");

    let resp = client.put(format!("{base}/policies/p1")).body("not json").send().await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.json::<Value>().await?["code"], "invalid_body");

    let (_, body) = get_json(&client, format!("{base}/policies")).await?;
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn generic_collections_store_raw_documents() -> Result<()> {
    let base = spawn_server(seeded()).await?;
    let client = reqwest::Client::new();

    let resp = client.put(format!("{base}/collections/widgets/w1")).body(r#"{"color":"red"}"#).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.json::<Value>().await?, json!({"color": "red"}));

    // No dimensions are recognized for raw collections; the query is ignored.
    let (status, body) = get_json(&client, format!("{base}/collections/widgets?member=alice")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"color": "red"}]));

    // The shape follows the last segment, so this is the roles collection.
    let (_, body) = get_json(&client, format!("{base}/collections/roles?member=carol")).await?;
    assert_eq!(ids(&body), vec!["r2"]);

    let (status, _) = get_json(&client, format!("{base}/collections/widgets/w2")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
