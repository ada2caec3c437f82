mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn worklog_routes_require_a_valid_token() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.client.get(server.url("/api/worklogs")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .get(server.url("/api/worklogs"))
        .bearer_auth("not-a-jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "UNAUTHORIZED");

    let res = server
        .client
        .delete(server.url("/api/worklogs/log-1"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn create_assigns_id_owner_and_empty_notes() -> Result<()> {
    let server = common::spawn_server().await?;
    let (token, user_id) = server.register("frank").await?;

    let res = server
        .client
        .post(server.url("/api/worklogs"))
        .bearer_auth(&token)
        .json(&json!({
            "id": "forged",
            "user_id": "someone-else",
            "date": "2024-05-01",
            "duration_hours": 3,
            "reason": "deploy",
            "mood": "tired"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = res.json().await?;
    let data = &body["data"];
    assert!(body["message"].is_string());
    assert_ne!(data["id"], "forged");
    assert_eq!(data["user_id"], user_id.as_str());
    assert_eq!(data["notes"], "");
    assert!(data.get("mood").is_none());
    Ok(())
}

#[tokio::test]
async fn create_reports_missing_fields() -> Result<()> {
    let server = common::spawn_server().await?;
    let (token, _) = server.register("gina").await?;

    let res = server
        .client
        .post(server.url("/api/worklogs"))
        .bearer_auth(&token)
        .json(&json!({ "date": "2024-05-01" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert!(body["field_errors"].get("duration_hours").is_some());
    assert!(body["field_errors"].get("reason").is_some());

    // Nothing but the header was written
    assert_eq!(server.store.snapshot("worklogs").await.unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn create_rejects_non_object_bodies() -> Result<()> {
    let server = common::spawn_server().await?;
    let (token, _) = server.register("hank").await?;

    let res = server
        .client
        .post(server.url("/api/worklogs"))
        .bearer_auth(&token)
        .json(&json!(["2024-05-01", 2, "deploy"]))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn list_is_scoped_to_caller_and_newest_first() -> Result<()> {
    let server = common::spawn_server().await?;
    let (ivy, _) = server.register("ivy").await?;
    let (jack, _) = server.register("jack").await?;

    server.create_worklog(&ivy, "2024-01-05", json!(1)).await?;
    server.create_worklog(&jack, "2024-06-01", json!(4)).await?;
    server.create_worklog(&ivy, "2024-03-20", json!("2.5")).await?;

    let res = server
        .client
        .get(server.url("/api/worklogs"))
        .bearer_auth(&ivy)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["date"], "2024-03-20");
    assert_eq!(data[0]["duration_hours"], json!(2.5));
    assert_eq!(data[1]["date"], "2024-01-05");
    assert_eq!(data[1]["duration_hours"], json!(1));
    Ok(())
}

#[tokio::test]
async fn update_merges_and_keeps_identity_fields() -> Result<()> {
    let server = common::spawn_server().await?;
    let (token, user_id) = server.register("kate").await?;
    let created = server.create_worklog(&token, "2024-02-01", json!(2)).await?;
    let id = created["id"].as_str().unwrap();

    let res = server
        .client
        .put(server.url(&format!("/api/worklogs/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "notes": "stayed late", "user_id": "hijack", "id": "other" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["user_id"], user_id.as_str());
    assert_eq!(body["data"]["notes"], "stayed late");
    assert_eq!(body["data"]["reason"], "release");

    let rows = server.store.snapshot("worklogs").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], id);
    assert_eq!(rows[1][5], "stayed late");
    Ok(())
}

#[tokio::test]
async fn other_users_get_forbidden_and_unknown_ids_not_found() -> Result<()> {
    let server = common::spawn_server().await?;
    let (owner, _) = server.register("leo").await?;
    let (intruder, _) = server.register("mia").await?;
    let created = server.create_worklog(&owner, "2024-02-01", json!(2)).await?;
    let path = format!("/api/worklogs/{}", created["id"].as_str().unwrap());

    let res = server
        .client
        .put(server.url(&path))
        .bearer_auth(&intruder)
        .json(&json!({ "notes": "mine now" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.client.delete(server.url(&path)).bearer_auth(&intruder).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .delete(server.url("/api/worklogs/log-missing"))
        .bearer_auth(&owner)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Untouched
    let rows = server.store.snapshot("worklogs").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get(5).map(String::as_str).unwrap_or(""), "");
    Ok(())
}

#[tokio::test]
async fn delete_removes_the_row_and_shifts_the_rest() -> Result<()> {
    let server = common::spawn_server().await?;
    let (token, _) = server.register("nina").await?;
    let first = server.create_worklog(&token, "2024-01-01", json!(1)).await?;
    let second = server.create_worklog(&token, "2024-01-02", json!(2)).await?;
    let third = server.create_worklog(&token, "2024-01-03", json!(3)).await?;

    let res = server
        .client
        .delete(server.url(&format!("/api/worklogs/{}", second["id"].as_str().unwrap())))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["id"], second["id"]);

    let rows = server.store.snapshot("worklogs").await.unwrap();
    let ids: Vec<&str> = rows.iter().skip(1).map(|r| r[0].as_str()).collect();
    assert_eq!(ids, vec![first["id"].as_str().unwrap(), third["id"].as_str().unwrap()]);

    // The shifted row is still addressable by id
    let res = server
        .client
        .put(server.url(&format!("/api/worklogs/{}", third["id"].as_str().unwrap())))
        .bearer_auth(&token)
        .json(&json!({ "reason": "hotfix" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let rows = server.store.snapshot("worklogs").await.unwrap();
    assert_eq!(rows[2][4], "hotfix");
    Ok(())
}
