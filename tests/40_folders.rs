mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{id_of, TestApp};

#[tokio::test]
async fn folder_lists_its_snippet() {
    let (app, _) = TestApp::in_memory();
    let (alice, token) = app.signup("alice").await;

    let folder = app.create_folder(&token, json!({"name": "F", "user_id": alice})).await;
    assert!(folder["parent_id"].is_null());
    let snippet = app
        .create_snippet(&token, json!({"code": "print(1)", "folder_id": folder["id"]}))
        .await;

    let (status, body) = app.get(&format!("/folders?id={}", id_of(&folder)), &token).await;
    assert_eq!(status, StatusCode::OK);
    let snippets = body["data"]["snippets"].as_array().unwrap();
    assert_eq!(snippets.len(), 1);
    assert_eq!(snippets[0]["id"], snippet["id"]);
    assert!(body["data"]["folders"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn contents_are_direct_children_only() {
    let (app, _) = TestApp::in_memory();
    let (_, token) = app.signup("alice").await;

    let root = app.create_folder(&token, json!({"name": "root"})).await;
    let child = app.create_folder(&token, json!({"name": "child", "parent_id": root["id"]})).await;
    let grandchild = app
        .create_folder(&token, json!({"name": "grandchild", "parent_id": child["id"]}))
        .await;
    app.create_snippet(&token, json!({"code": "deep", "folder_id": grandchild["id"]})).await;

    let (_, body) = app.get(&format!("/folders?id={}", id_of(&root)), &token).await;
    let folders = body["data"]["folders"].as_array().unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0]["id"], child["id"]);
    assert!(body["data"]["snippets"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn user_folders_span_all_depths() {
    let (app, _) = TestApp::in_memory();
    let (alice, alice_token) = app.signup("alice").await;
    let (_, bob_token) = app.signup("bob").await;

    let root = app.create_folder(&alice_token, json!({"name": "a"})).await;
    app.create_folder(&alice_token, json!({"name": "b", "parent_id": root["id"]})).await;
    app.create_folder(&bob_token, json!({"name": "c"})).await;

    let (status, body) = app.get(&format!("/folders/user/{}", alice), &bob_token).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b"]);

    let (status, body) = app.get("/folders/user/bogus", &bob_token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid user ID");
}

#[tokio::test]
async fn folder_queries_need_a_valid_id() {
    let (app, _) = TestApp::in_memory();
    let (_, token) = app.signup("alice").await;

    for uri in ["/folders", "/folders?id=", "/folders?id=xyz"] {
        let (status, body) = app.get(uri, &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], "Invalid folder ID");
    }

    let (status, body) = app.get(&format!("/folders?id={}", Uuid::new_v4()), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"snippets": [], "folders": []}));
}

#[tokio::test]
async fn folder_creation_is_validated() {
    let (app, _) = TestApp::in_memory();
    let (_, alice) = app.signup("alice").await;
    let (_, bob) = app.signup("bob").await;

    let (status, body) = app.post("/folders", &alice, json!({"name": "  "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name cannot be empty");

    let (status, _) = app
        .post("/folders", &alice, json!({"name": "orphan", "parent_id": Uuid::new_v4()}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bobs = app.create_folder(&bob, json!({"name": "bob's"})).await;
    let (status, _) = app
        .post("/folders", &alice, json!({"name": "intruder", "parent_id": bobs["id"]}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_a_folder_unfiles_its_subtree() {
    let (app, _) = TestApp::in_memory();
    let (alice, token) = app.signup("alice").await;

    let top = app.create_folder(&token, json!({"name": "top"})).await;
    let nested = app.create_folder(&token, json!({"name": "nested", "parent_id": top["id"]})).await;
    let sibling = app.create_folder(&token, json!({"name": "sibling"})).await;
    let in_nested = app
        .create_snippet(&token, json!({"code": "n", "folder_id": nested["id"], "tags": ["t"]}))
        .await;
    let in_sibling = app
        .create_snippet(&token, json!({"code": "s", "folder_id": sibling["id"]}))
        .await;

    let (status, body) = app.delete(&format!("/folders/{}", id_of(&top)), &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (_, body) = app.get(&format!("/folders/user/{}", alice), &token).await;
    let remaining: Vec<Value> = body["data"].as_array().unwrap().clone();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["id"], sibling["id"]);

    let (status, body) = app.get(&format!("/snippets/{}", id_of(&in_nested)), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["folder_id"].is_null());
    assert_eq!(body["data"]["tags"], json!(["t"]));

    let (_, body) = app.get(&format!("/snippets/{}", id_of(&in_sibling)), &token).await;
    assert_eq!(body["data"]["folder_id"], sibling["id"]);

    let (status, body) = app.delete(&format!("/folders/{}", id_of(&top)), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Folder not found");
}

#[tokio::test]
async fn folder_routes_reject_other_methods() {
    let (app, _) = TestApp::in_memory();
    let (_, token) = app.signup("alice").await;

    let (status, _) = app.request(Method::PUT, "/folders", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = app
        .request(Method::GET, &format!("/folders/{}", Uuid::new_v4()), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
