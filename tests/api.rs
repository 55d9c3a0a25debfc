//! End-to-end tests against a real PostgreSQL database.
//!
//! Set `TEST_DATABASE_URL` (e.g. `postgres://localhost/postgres`) to run them; without it they return early.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use sqlx::PgPool;

async fn create(server: &TestServer, path: &str, body: Value) -> Value {
    let response = server.post(path).json(&body).await;
    response.assert_status(StatusCode::CREATED);
    let envelope: Value = response.json();
    assert_eq!(envelope["status"], "ok");
    envelope["data"].clone()
}

async fn create_id(server: &TestServer, path: &str, body: Value) -> i64 {
    create(server, path, body).await["id"].as_i64().unwrap()
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap();
    n
}

fn reason(response: &axum_test::TestResponse) -> String {
    let body: Value = response.json();
    assert_eq!(body["status"], "fail");
    body["reason"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn template_round_trip() {
    let Some((server, _pool)) = common::test_server().await else {
        return;
    };

    let config = json!([{"key": "value"}, {"nested": {"depth": 2}}]);
    let id = create_id(&server, "/template", json!({"config": config, "type": "Office"})).await;

    let response = server.get(&format!("/template/{}", id)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["data"]["config"], config);
    assert_eq!(body["data"]["type"], "Office");
    assert!(body["data"]["created_at"].is_string());
}

#[tokio::test]
async fn template_without_type_and_scalar_configs() {
    let Some((server, pool)) = common::test_server().await else {
        return;
    };

    let id = create_id(&server, "/template", json!({"config": {"theme": "dark"}})).await;
    let body: Value = server.get(&format!("/template/{}", id)).await.json();
    assert_eq!(body["data"]["config"], json!({"theme": "dark"}));
    assert_eq!(body["data"]["type"], Value::Null);

    for scalar in [json!(0), json!(false), json!(5), json!("dark")] {
        let response = server.post("/template").json(&json!({"config": scalar})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(reason(&response), "config must be an object or a list");
    }
    assert_eq!(count(&pool, "template").await, 1);
}

#[tokio::test]
async fn duplicate_names_and_types_conflict() {
    let Some((server, _pool)) = common::test_server().await else {
        return;
    };

    create(&server, "/template", json!({"config": {"a": 1}, "type": "Home"})).await;
    let response = server
        .post("/template")
        .json(&json!({"config": {"b": 2}, "type": "Home"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(reason(&response), "Template with such type already exists");

    create(&server, "/user", json!({"name": "Ann"})).await;
    let response = server.post("/user").json(&json!({"name": "Ann"})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(reason(&response), "User with such name already exists");

    create(&server, "/workspace", json!({"name": "W1"})).await;
    let response = server.post("/workspace").json(&json!({"name": "W1"})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(reason(&response), "Workspace with such name already exists");
}

#[tokio::test]
async fn missing_entities_are_not_found() {
    let Some((server, _pool)) = common::test_server().await else {
        return;
    };

    let response = server.get("/template/999").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(reason(&response), "Template 999 doesn't exist");

    let response = server.patch("/workspace/999").json(&json!({"name": "X"})).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(reason(&response), "Workspace 999 doesn't exist");

    let response = server.delete("/user/999").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(reason(&response), "User 999 doesn't exist");

    let response = server.post("/user/999/workspace").json(&json!({"name": "W"})).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(reason(&response), "User 999 doesn't exist");
}

#[tokio::test]
async fn list_filters_and_pages() {
    let Some((server, _pool)) = common::test_server().await else {
        return;
    };

    create(&server, "/workspace", json!({"name": "Office", "type": "OW"})).await;
    create(&server, "/workspace", json!({"name": "Home", "type": "HW"})).await;
    create(&server, "/workspace", json!({"name": "Cabin", "type": "HW"})).await;

    let body: Value = server.get("/workspace").add_query_param("type", "HW").await.json();
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Home", "Cabin"]);

    let body: Value = server
        .get("/workspace")
        .add_query_param("limit", 1)
        .add_query_param("offset", 1)
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Home");
}

#[tokio::test]
async fn workspace_type_links_exactly_the_matching_template() {
    let Some((server, pool)) = common::test_server().await else {
        return;
    };

    let home = create_id(&server, "/template", json!({"config": {"theme": "light"}, "type": "HW"})).await;
    create_id(&server, "/template", json!({"config": {"theme": "dark"}, "type": "OW"})).await;

    let workspace = create(&server, "/workspace", json!({"name": "W1", "type": "HW"})).await;
    assert_eq!(workspace["templates"], json!([home]));
    assert_eq!(count(&pool, "workspace_template").await, 1);

    let body: Value = server
        .get(&format!("/workspace/{}/template", workspace["id"]))
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["id"], home);

    // No template of that type: the workspace is still created, just unlinked.
    let other = create(&server, "/workspace", json!({"name": "W2", "type": "XX"})).await;
    assert_eq!(other["templates"], json!([]));
    assert_eq!(count(&pool, "workspace_template").await, 1);
}

#[tokio::test]
async fn unknown_template_type_rolls_back_workspace() {
    let Some((server, pool)) = common::test_server().await else {
        return;
    };

    let response = server
        .post("/workspace")
        .json(&json!({"name": "W1", "template_types": ["missing"]}))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(reason(&response), "Template with type 'missing' doesn't exist");
    assert_eq!(count(&pool, "workspace").await, 0);
}

#[tokio::test]
async fn explicit_links_and_unlinks() {
    let Some((server, _pool)) = common::test_server().await else {
        return;
    };

    let template = create_id(&server, "/template", json!({"config": {"a": 1}})).await;
    let workspace = create_id(&server, "/workspace", json!({"name": "W1"})).await;
    let link_path = format!("/workspace/{}/link_template", workspace);

    let link = create(&server, &link_path, json!({"template": template})).await;
    assert_eq!(link, json!({"workspace_id": workspace, "template_id": template}));

    let response = server.post(&link_path).json(&json!({"template_id": template})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        reason(&response),
        format!("Template {} is already linked to workspace {}", template, workspace)
    );

    let response = server.post(&link_path).json(&json!({"template": 999})).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(reason(&response), "Template 999 doesn't exist");

    let unlink_path = format!("/workspace/{}/template/{}", workspace, template);
    server.delete(&unlink_path).await.assert_status_ok();
    server.delete(&unlink_path).await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_workspace_create_propagates_templates() {
    let Some((server, pool)) = common::test_server().await else {
        return;
    };

    let config = json!({"layout": "grid"});
    let template = create_id(&server, "/template", json!({"config": config, "type": "HW"})).await;
    let ann = create_id(&server, "/user", json!({"name": "Ann"})).await;
    create(&server, "/workspace", json!({"name": "W1", "type": "HW"})).await;

    let workspace = create(
        &server,
        &format!("/user/{}/workspace", ann),
        json!({"name": "Ann-WS", "type": "HW"}),
    )
    .await;
    assert_eq!(workspace["type"], "HW");
    let copies = workspace["user_templates"].as_array().unwrap();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0]["template_id"], template);
    assert_eq!(copies[0]["user_id"], ann);
    assert_eq!(copies[0]["config"], config);

    let body: Value = server.get(&format!("/user/{}/workspace", ann)).await.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["name"], "Ann-WS");

    let body: Value = server
        .get(&format!("/user/{}/workspace/{}/template", ann, workspace["id"]))
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(count(&pool, "user_workspace_template").await, 1);
}

#[tokio::test]
async fn untyped_user_workspace_has_no_templates() {
    let Some((server, _pool)) = common::test_server().await else {
        return;
    };

    let ann = create_id(&server, "/user", json!({"name": "Ann"})).await;
    let response = server.get(&format!("/user/{}/workspace", ann)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(reason(&response), "User doesn't have any workspaces yet");

    let workspace = create(&server, &format!("/user/{}/workspace", ann), json!({"name": "Plain"})).await;
    assert_eq!(workspace["user_templates"], json!([]));

    let response = server
        .get(&format!("/user/{}/workspace/{}/template", ann, workspace["id"]))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(reason(&response), "User doesn't have any templates yet");
}

#[tokio::test]
async fn user_template_patch_is_idempotent_and_isolated() {
    let Some((server, _pool)) = common::test_server().await else {
        return;
    };

    let source = json!({"colour": "blue"});
    let template = create_id(&server, "/template", json!({"config": source, "type": "OW"})).await;
    create(&server, "/workspace", json!({"name": "Office", "type": "OW"})).await;
    let ann = create_id(&server, "/user", json!({"name": "Ann"})).await;
    let workspace = create_id(
        &server,
        &format!("/user/{}/workspace", ann),
        json!({"name": "Ann-Office", "type": "OW"}),
    )
    .await;

    let path = format!("/user/{}/workspace/{}/template/{}", ann, workspace, template);
    for _ in 0..2 {
        let response = server.patch(&path).json(&json!({"config": {"a": 1}})).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["config"], json!({"a": 1}));
    }

    for falsy in [json!(false), json!(0)] {
        let response = server.patch(&path).json(&json!({"config": falsy})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(reason(&response), "config must be an object or a list");
    }

    let body: Value = server.get(&path).await.json();
    assert_eq!(body["data"]["config"], json!({"a": 1}));

    let body: Value = server.get(&format!("/template/{}", template)).await.json();
    assert_eq!(body["data"]["config"], source);
}

#[tokio::test]
async fn user_template_delete_keeps_shared_template() {
    let Some((server, pool)) = common::test_server().await else {
        return;
    };

    let template = create_id(&server, "/template", json!({"config": {"k": "v"}, "type": "HW"})).await;
    create(&server, "/workspace", json!({"name": "Home", "type": "HW"})).await;
    let ann = create_id(&server, "/user", json!({"name": "Ann"})).await;
    let workspace = create_id(
        &server,
        &format!("/user/{}/workspace", ann),
        json!({"name": "Ann-Home", "type": "HW"}),
    )
    .await;

    let path = format!("/user/{}/workspace/{}/template/{}", ann, workspace, template);
    let response = server.delete(&path).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({"status": "ok", "data": []}));

    server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    server.delete(&path).await.assert_status(StatusCode::NOT_FOUND);
    server
        .get(&format!("/template/{}", template))
        .await
        .assert_status_ok();
    assert_eq!(count(&pool, "workspace_template").await, 1);
}

#[tokio::test]
async fn template_delete_cascades_to_links_and_copies() {
    let Some((server, pool)) = common::test_server().await else {
        return;
    };

    let template = create_id(&server, "/template", json!({"config": {"k": 1}, "type": "HW"})).await;
    let shared = create_id(&server, "/workspace", json!({"name": "Home", "type": "HW"})).await;
    let ann = create_id(&server, "/user", json!({"name": "Ann"})).await;
    create(&server, &format!("/user/{}/workspace", ann), json!({"name": "Ann-Home", "type": "HW"})).await;
    assert_eq!(count(&pool, "workspace_template").await, 1);
    assert_eq!(count(&pool, "user_workspace_template").await, 1);

    server
        .delete(&format!("/template/{}", template))
        .await
        .assert_status_ok();

    assert_eq!(count(&pool, "workspace_template").await, 0);
    assert_eq!(count(&pool, "user_workspace_template").await, 0);
    server
        .get(&format!("/workspace/{}", shared))
        .await
        .assert_status_ok();
    server
        .get(&format!("/template/{}", template))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn workspace_delete_cascades_to_links_members_and_copies() {
    let Some((server, pool)) = common::test_server().await else {
        return;
    };

    let home = create_id(&server, "/template", json!({"config": {"k": 1}, "type": "HW"})).await;
    let extra = create_id(&server, "/template", json!({"config": {"k": 2}})).await;
    let shared = create_id(&server, "/workspace", json!({"name": "Home", "type": "HW"})).await;
    create(
        &server,
        &format!("/workspace/{}/link_template", shared),
        json!({"template": extra}),
    )
    .await;
    let ann = create_id(&server, "/user", json!({"name": "Ann"})).await;
    let own = create_id(
        &server,
        &format!("/user/{}/workspace", ann),
        json!({"name": "Ann-Home", "type": "HW"}),
    )
    .await;
    create(
        &server,
        &format!("/workspace/{}/link_template", own),
        json!({"template": home}),
    )
    .await;
    assert_eq!(count(&pool, "workspace_template").await, 3);
    assert_eq!(count(&pool, "user_workspace").await, 1);
    assert_eq!(count(&pool, "user_workspace_template").await, 2);

    for workspace in [shared, own] {
        let response = server.delete(&format!("/workspace/{}", workspace)).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({"status": "ok", "data": []}));
    }

    assert_eq!(count(&pool, "workspace_template").await, 0);
    assert_eq!(count(&pool, "user_workspace").await, 0);
    assert_eq!(count(&pool, "user_workspace_template").await, 0);
    assert_eq!(count(&pool, "workspace").await, 0);
    assert_eq!(count(&pool, "template").await, 2);
    server.get(&format!("/user/{}", ann)).await.assert_status_ok();
    server
        .delete(&format!("/workspace/{}", shared))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_workspace_delete_checks_ownership() {
    let Some((server, pool)) = common::test_server().await else {
        return;
    };

    let ann = create_id(&server, "/user", json!({"name": "Ann"})).await;
    let bob = create_id(&server, "/user", json!({"name": "Bob"})).await;
    let workspace = create_id(&server, &format!("/user/{}/workspace", ann), json!({"name": "Ann-WS"})).await;

    let response = server.delete(&format!("/user/{}/workspace/{}", bob, workspace)).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        reason(&response),
        format!("Workspace {} does not belong to user {}", workspace, bob)
    );

    server
        .delete(&format!("/user/{}/workspace/{}", ann, workspace))
        .await
        .assert_status_ok();
    server
        .get(&format!("/workspace/{}", workspace))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(count(&pool, "user_workspace").await, 0);
}

#[tokio::test]
async fn user_delete_cascades_to_associations() {
    let Some((server, pool)) = common::test_server().await else {
        return;
    };

    create(&server, "/template", json!({"config": {"k": 1}, "type": "HW"})).await;
    create(&server, "/workspace", json!({"name": "Home", "type": "HW"})).await;
    let ann = create_id(&server, "/user", json!({"name": "Ann"})).await;
    let workspace = create_id(
        &server,
        &format!("/user/{}/workspace", ann),
        json!({"name": "Ann-Home", "type": "HW"}),
    )
    .await;

    server.delete(&format!("/user/{}", ann)).await.assert_status_ok();
    assert_eq!(count(&pool, "user_workspace").await, 0);
    assert_eq!(count(&pool, "user_workspace_template").await, 0);
    server
        .get(&format!("/workspace/{}", workspace))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn workspace_update_replaces_template_links() {
    let Some((server, pool)) = common::test_server().await else {
        return;
    };

    let home = create_id(&server, "/template", json!({"config": {"h": 1}, "type": "HW"})).await;
    let office = create_id(&server, "/template", json!({"config": {"o": 1}, "type": "OW"})).await;
    let workspace = create_id(&server, "/workspace", json!({"name": "W1", "type": "HW"})).await;

    let response = server
        .patch(&format!("/workspace/{}", workspace))
        .json(&json!({"name": "W1", "template_types": ["OW"]}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["templates"], json!([office]));
    assert_eq!(body["data"]["type"], Value::Null);

    let linked: Vec<(i64,)> = sqlx::query_as("SELECT template_id FROM workspace_template WHERE workspace_id = $1")
        .bind(workspace)
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(linked, vec![(office,)]);
    assert_ne!(home, office);
}

#[tokio::test]
async fn ready_reports_database() {
    let Some((server, _pool)) = common::test_server().await else {
        return;
    };

    let response = server.get("/ready").await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({"status": "ok", "data": {"database": "ok"}})
    );
}
