//! End-to-end tests through the intercepting client.
//!
//! Each test builds the demo server, seeds what it needs, and talks to it
//! the way application code would: `fetch`, then read the body.

use jsonapi_mock::{Attrs, Fixtures, HttpClient, MockServer, RequestInit, JSONAPI_MEDIA_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

fn setup() -> (MockServer, HttpClient) {
    let server = Fixtures::server().expect("demo server builds");
    let client = HttpClient::new().unwrap().intercept(server.clone());
    (server, client)
}

async fn get_json(client: &HttpClient, url: &str) -> Value {
    client.get(url).await.unwrap().json().await.unwrap()
}

// =============================================================================
// Plain endpoints
// =============================================================================

#[tokio::test]
async fn test_basic_text_endpoint() {
    let (_server, client) = setup();

    let response = client.get("https://api.test/ping").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "pong");
}

#[tokio::test]
async fn test_basic_json_endpoint() {
    let (_server, client) = setup();

    let body = get_json(&client, "https://api.test/ping.json").await;

    assert_eq!(body, json!({ "result": "pong" }));
}

// =============================================================================
// Models, relationships, factories
// =============================================================================

#[tokio::test]
async fn test_basic_model() {
    let (server, client) = setup();
    server
        .create("document", &[], Attrs::new().with("title", "First document"))
        .await
        .unwrap();

    let body = get_json(&client, "https://api.test/documents").await;

    assert_eq!(body["data"][0]["id"], "1");
    assert_eq!(body["data"][0]["type"], "documents");
    assert_eq!(body["data"][0]["attributes"]["title"], "First document");
    assert!(body.get("included").is_none());
}

#[tokio::test]
async fn test_basic_relationship() {
    let (server, client) = setup();
    let folder = server
        .create("folder", &[], Attrs::new().with("name", "Notes"))
        .await
        .unwrap();
    server
        .create_related(&folder.key(), "documents", Attrs::new().with("title", "Hello World"))
        .await
        .unwrap();

    let body = get_json(&client, "https://api.test/folders?include=documents").await;

    let folder = &body["data"][0];
    assert_eq!(folder["attributes"]["name"], "Notes");
    assert_eq!(
        folder["relationships"]["documents"]["data"],
        json!([{ "type": "documents", "id": "1" }])
    );
    assert_eq!(body["included"][0]["type"], "documents");
    assert_eq!(body["included"][0]["attributes"]["title"], "Hello World");
}

#[tokio::test]
async fn test_basic_factory() {
    let (server, client) = setup();
    server.create("pizza", &[], Attrs::new()).await.unwrap();

    let body = get_json(&client, "https://api.test/pizzas").await;

    assert_eq!(body["data"][0]["id"], "1");
    assert_eq!(body["data"][0]["type"], "pizzas");
    assert_eq!(body["data"][0]["attributes"]["kind"], "margherita");
}

#[tokio::test]
async fn test_dynamic_factory_attribute() {
    let (server, client) = setup();
    server.create_list("rocky", 6, &[], Attrs::new()).await.unwrap();

    let body = get_json(&client, "https://api.test/rockies").await;

    let rockies = body["data"].as_array().unwrap();
    let titles: Vec<&str> = rockies
        .iter()
        .map(|r| r["attributes"]["title"].as_str().unwrap())
        .collect();
    let ids: Vec<&str> = rockies.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(
        titles,
        ["Rocky", "Rocky II", "Rocky III", "Rocky IV", "Rocky V", "Rocky Balboa"]
    );
    assert_eq!(ids, ["1", "2", "3", "4", "5", "6"]);
    assert!(rockies.iter().all(|r| r["type"] == "rockies"));
}

#[tokio::test]
async fn test_basic_trait() {
    let (server, client) = setup();
    let document = server.create("document", &["rfc"], Attrs::new()).await.unwrap();

    let body = get_json(&client, &format!("https://api.test/documents/{}", document.id)).await;

    assert_eq!(body["data"]["id"], document.id.as_str());
    assert_eq!(body["data"]["type"], "documents");
    assert_eq!(body["data"]["attributes"]["title"], "RFC-001: Example RFC");
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_post_with_jsonapi_body() {
    let (_server, client) = setup();
    let init = RequestInit::new(Method::POST)
        .jsonapi(&json!({ "data": { "type": "pizzas", "attributes": { "kind": "quattro stagioni" } } }))
        .unwrap();

    let created = client.fetch("https://api.test/pizzas", init).await.unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let body = get_json(&client, "https://api.test/pizzas").await;
    assert_eq!(body["data"][0]["id"], "1");
    assert_eq!(body["data"][0]["attributes"]["kind"], "quattro stagioni");
}

#[tokio::test]
async fn test_post_with_generic_json_body() {
    let (_server, client) = setup();
    let init = RequestInit::new(Method::POST)
        .json(&json!({ "kind": "quattro stagioni" }))
        .unwrap();

    let created = client.fetch("https://api.test/pizzas", init).await.unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let body = get_json(&client, "https://api.test/pizzas").await;
    assert_eq!(body["data"][0]["id"], "1");
    assert_eq!(body["data"][0]["attributes"]["kind"], "quattro stagioni");
}

#[tokio::test]
async fn test_post_bodies_produce_identical_records() {
    let (server, client) = setup();
    let jsonapi = RequestInit::new(Method::POST)
        .header("content-type", JSONAPI_MEDIA_TYPE)
        .unwrap()
        .body(r#"{"data":{"type":"pizzas","attributes":{"kind":"diavola"}}}"#);
    let flat = RequestInit::new(Method::POST)
        .json(&json!({ "kind": "diavola" }))
        .unwrap();

    client.fetch("https://api.test/pizzas", jsonapi).await.unwrap();
    client.fetch("https://api.test/pizzas", flat).await.unwrap();

    let pizzas = server.all("pizza").await.unwrap();
    assert_eq!(pizzas[0].attributes, pizzas[1].attributes);
}

#[tokio::test]
async fn test_patch_moves_document_between_folders() {
    let (server, client) = setup();
    let notes = server.create("folder", &[], Attrs::new()).await.unwrap();
    server.create("folder", &[], Attrs::new()).await.unwrap();
    server
        .create_related(&notes.key(), "documents", Attrs::new())
        .await
        .unwrap();
    let init = RequestInit::new(Method::PATCH)
        .jsonapi(&json!({
            "data": {
                "type": "documents",
                "id": "1",
                "relationships": { "folder": { "data": { "type": "folders", "id": "2" } } }
            }
        }))
        .unwrap();

    let response = client.fetch("https://api.test/documents/1", init).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let folders = get_json(&client, "https://api.test/folders").await;
    assert_eq!(folders["data"][0]["relationships"]["documents"]["data"], json!([]));
    assert_eq!(
        folders["data"][1]["relationships"]["documents"]["data"][0]["id"],
        "1"
    );
}

#[tokio::test]
async fn test_delete_severs_relationships() {
    let (server, client) = setup();
    let folder = server.create("folder", &[], Attrs::new()).await.unwrap();
    server
        .create_related(&folder.key(), "documents", Attrs::new())
        .await
        .unwrap();

    let response = client
        .fetch("https://api.test/documents/1", RequestInit::new(Method::DELETE))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let folder = server.find("folder", "1").await.unwrap();
    assert!(folder.related_ids("documents").is_empty());
    let missing = client.get("https://api.test/documents/1").await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ids_are_never_reused_after_delete() {
    let (server, _client) = setup();
    server.create_list("pizza", 2, &[], Attrs::new()).await.unwrap();

    server.delete("pizza", "2").await.unwrap();
    let next = server.create("pizza", &[], Attrs::new()).await.unwrap();

    assert_eq!(next.id, "3");
}

// =============================================================================
// Serializer includes
// =============================================================================

#[tokio::test]
async fn test_serializer_auto_includes_related_records() {
    let (server, client) = setup();
    let artist = server
        .create("artist", &[], Attrs::new().with("name", "Mary Lou Williams"))
        .await
        .unwrap();
    server
        .create(
            "album",
            &[],
            Attrs::new().with("title", "Zoning").with("artists", vec![artist]),
        )
        .await
        .unwrap();

    let body = get_json(&client, "https://api.test/albums/1").await;

    assert_eq!(body["data"]["attributes"]["title"], "Zoning");
    assert_eq!(
        body["data"]["relationships"]["artists"]["data"],
        json!([{ "type": "artists", "id": "1" }])
    );
    assert_eq!(body["included"].as_array().unwrap().len(), 1);
    assert_eq!(body["included"][0]["attributes"]["name"], "Mary Lou Williams");
}

#[tokio::test]
async fn test_nested_include_paths() {
    let (server, client) = setup();
    let folder = server
        .create("folder", &[], Attrs::new().with("name", "Notes"))
        .await
        .unwrap();
    server
        .create_related(&folder.key(), "documents", Attrs::new())
        .await
        .unwrap();

    let body = get_json(&client, "https://api.test/documents/1?include=folder.documents").await;

    let included = body["included"].as_array().unwrap();
    assert_eq!(included.len(), 1, "primary document must not repeat");
    assert_eq!(included[0]["type"], "folders");
}

// =============================================================================
// Errors and the request log
// =============================================================================

#[tokio::test]
async fn test_unknown_route_is_a_404_response() {
    let (server, client) = setup();

    let response = client.get("https://api.test/nowhere").await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"][0]["status"], "404");
    assert_eq!(server.handled_requests().await[0].status, 404);
}

#[tokio::test]
async fn test_requests_apply_in_issue_order() {
    let (server, client) = setup();
    let post = |kind: &'static str| {
        let client = client.clone();
        async move {
            let init = RequestInit::new(Method::POST).json(&json!({ "kind": kind })).unwrap();
            client.fetch("https://api.test/pizzas", init).await.unwrap()
        }
    };

    post("first").await;
    post("second").await;

    let pizzas = server.all("pizza").await.unwrap();
    assert_eq!(pizzas[0].attr_str("kind"), Some("first"));
    assert_eq!(pizzas[1].attr_str("kind"), Some("second"));
    let paths: Vec<String> = server
        .handled_requests()
        .await
        .into_iter()
        .map(|h| format!("{} {}", h.method, h.path))
        .collect();
    assert_eq!(paths, ["POST /pizzas", "POST /pizzas"]);
}
