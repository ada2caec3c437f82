mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn root_and_health_respond() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.client.get(server.url("/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["store"], "ok");
    Ok(())
}

#[tokio::test]
async fn register_returns_token_and_public_user() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "username": "alice", "password": "pw", "display_name": "Alice A." }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = res.json().await?;
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["display_name"], "Alice A.");
    assert!(body["user"].get("password").is_none());

    // Stored as a full row under the header
    let rows = server.store.snapshot("users").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][1], "alice");
    assert_eq!(rows[1][2], "pw");
    Ok(())
}

#[tokio::test]
async fn display_name_defaults_to_username() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "username": "bob", "password": "pw" }))
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["user"]["display_name"], "bob");
    Ok(())
}

#[tokio::test]
async fn duplicate_username_conflicts() -> Result<()> {
    let server = common::spawn_server().await?;
    server.register("carol").await?;

    let res = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "username": "carol", "password": "other" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(server.store.snapshot("users").await.unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn register_requires_username_and_password() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .post(server.url("/auth/register"))
        .json(&json!({ "username": "dave" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"].get("password").is_some());
    assert!(body["field_errors"].get("username").is_none());
    Ok(())
}

#[tokio::test]
async fn login_checks_both_factors() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, user_id) = server.register("erin").await?;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .json(&json!({ "username": "erin", "password": "secret" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["user"]["id"], user_id.as_str());
    assert_eq!(body["expiresIn"], "1h");
    assert!(body["token"].is_string());

    for (username, password) in [("erin", "wrong"), ("nobody", "secret")] {
        let res = server
            .client
            .post(server.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = res.json().await?;
        assert_eq!(body["message"], "Invalid username or password");
    }
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .post(server.url("/auth/login"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}
