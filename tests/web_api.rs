#![cfg(feature = "web")]

use async_trait::async_trait;
use autocss::completion::{CompletionClient, CompletionRequest};
use autocss::web::{create_router, AppState};
use autocss::{ConfigBuilder, Error};
use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::io::Read;
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};
use tower::util::ServiceExt; // for oneshot

const BOUNDARY: &str = "autocss-test-boundary";

/// Answers every completion with a fixed reply, or fails if there is none.
struct FixedClient {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FixedClient {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CompletionClient for FixedClient {
    async fn complete(&self, request: &CompletionRequest) -> autocss::Result<String> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.reply
            .clone()
            .ok_or_else(|| Error::Generation("model unavailable".to_string()))
    }
}

fn setup(client: Arc<FixedClient>) -> (TempDir, AppState, Router) {
    let temp = tempdir().unwrap();
    let config = ConfigBuilder::new()
        .data_dir(temp.path())
        .max_retries(0)
        .build()
        .unwrap();
    let state = AppState::new(config, client);
    let app = create_router(state.clone());
    (temp, state, app)
}

fn multipart_body(files: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, content) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

async fn upload(app: &Router, files: &[(&str, &str)]) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(files)))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn post_json(app: &Router, uri: &str, payload: Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

const SITE: &[(&str, &str)] = &[
    (
        "index.html",
        r#"<html><head></head><body><nav class="menu" id="main"></nav></body></html>"#,
    ),
    ("pages/about.html", r#"<body><p class="lead"></p></body>"#),
    ("style.css", "p { color: red; }"),
];

async fn uploaded_project(app: &Router) -> String {
    let response = upload(app, SITE).await;
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["projectId"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_static_index_is_served() {
    let (_temp, _state, app) = setup(FixedClient::failing());

    let response = get(&app, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("<title>AutoCSS Studio</title>"));
}

#[tokio::test]
async fn test_unknown_static_path_is_404() {
    let (_temp, _state, app) = setup(FixedClient::failing());
    let response = get(&app, "/nope.js").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_features_reports_github_support() {
    let (_temp, _state, app) = setup(FixedClient::failing());
    let body = json_body(get(&app, "/api/features").await).await;
    assert_eq!(body["github"], json!(cfg!(feature = "github")));
}

#[tokio::test]
async fn test_upload_returns_project_summary() {
    let (temp, _state, app) = setup(FixedClient::failing());

    let response = upload(&app, SITE).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let id = body["projectId"].as_str().unwrap();
    assert_eq!(
        body["summary"]["htmlFiles"],
        json!(["index.html", "pages/about.html"])
    );
    assert_eq!(body["summary"]["cssFiles"], json!(["style.css"]));
    assert_eq!(
        body["summary"]["elements"]["classes"],
        json!(["lead", "menu"])
    );
    assert!(temp
        .path()
        .join("projects")
        .join(id)
        .join("project/pages/about.html")
        .is_file());

    // The summary is available again by id.
    let summary = json_body(get(&app, &format!("/api/projects/{id}")).await).await;
    assert_eq!(summary["elements"]["ids"], json!(["main"]));
}

#[tokio::test]
async fn test_upload_rejects_traversal_paths() {
    let (temp, _state, app) = setup(FixedClient::failing());

    let response = upload(&app, &[("../escape.html", "<p></p>")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Invalid upload"));
    assert!(!temp.path().join("escape.html").exists());
}

#[tokio::test]
async fn test_upload_without_files_is_bad_request() {
    let (_temp, _state, app) = setup(FixedClient::failing());
    let response = upload(&app, &[]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_project_is_404() {
    let (_temp, _state, app) = setup(FixedClient::failing());

    for uri in [
        "/api/projects/not-a-uuid",
        "/api/projects/6f1c2a4e-8d3b-4a7e-9c1f-2b3d4e5f6a7b",
        "/api/download/6f1c2a4e-8d3b-4a7e-9c1f-2b3d4e5f6a7b",
    ] {
        assert_eq!(get(&app, uri).await.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_generate_css_then_download() {
    let client = FixedClient::replying(
        "Here you go:\n```css\n.menu { display: flex; }\n@media (max-width: 640px) { .lead { font-size: 1rem; } }\n```",
    );
    let (temp, _state, app) = setup(client.clone());
    let id = uploaded_project(&app).await;

    // Download before any generation has nothing to serve.
    assert_eq!(
        get(&app, &format!("/api/download/{id}")).await.status(),
        StatusCode::NOT_FOUND
    );

    let response = post_json(
        &app,
        "/api/generate-css",
        json!({ "projectId": id, "instructions": "High contrast" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["css"].as_str().unwrap().starts_with(".menu { display: flex; }"));
    assert_eq!(body["downloadUrl"], json!(format!("/api/download/{id}")));
    assert_eq!(body["report"]["mediaQueries"], json!(1));
    assert_eq!(body["report"]["flexboxUsage"], json!(1));
    assert!(client.prompts.lock().unwrap()[0].contains("High contrast"));

    let response = get(&app, &format!("/api/download/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"autocss-enhanced-{id}.zip\"").as_str()
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    let mut index = String::new();
    archive
        .by_name("index.html")
        .unwrap()
        .read_to_string(&mut index)
        .unwrap();
    assert!(index.contains(r#"<link rel="stylesheet" href="autocss-generated.css"></head>"#));
    assert!(archive.by_name("autocss-generated.css").is_ok());
    assert!(archive.by_name("pages/about.html").is_ok());

    // The archive file is removed once served.
    assert!(!temp
        .path()
        .join("archives")
        .join(format!("{id}.zip"))
        .exists());
}

#[tokio::test]
async fn test_generate_css_accepts_user_instructions_alias() {
    let client = FixedClient::replying("```css\nbody { margin: 0; }\n```");
    let (_temp, _state, app) = setup(client.clone());
    let id = uploaded_project(&app).await;

    let response = post_json(
        &app,
        "/api/generate-css",
        json!({ "projectId": id, "userInstructions": "Serif headings" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(client.prompts.lock().unwrap()[0].contains("Serif headings"));
}

#[tokio::test]
async fn test_generate_css_conflicts_with_running_job() {
    let client = FixedClient::replying("```css\nbody { margin: 0; }\n```");
    let (_temp, state, app) = setup(client.clone());
    let id = uploaded_project(&app).await;

    let lease = state.store.lease(&id).unwrap();
    let response = post_json(&app, "/api/generate-css", json!({ "projectId": id })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(client.prompts.lock().unwrap().is_empty());

    drop(lease);
    let response = post_json(&app, "/api/generate-css", json!({ "projectId": id })).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_generate_css_upstream_failure_is_bad_gateway() {
    let (_temp, _state, app) = setup(FixedClient::failing());
    let id = uploaded_project(&app).await;

    let response = post_json(&app, "/api/generate-css", json!({ "projectId": id })).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("model unavailable"));
}

#[tokio::test]
async fn test_generate_code_requires_prompt() {
    let (_temp, _state, app) = setup(FixedClient::replying("unused"));

    let response = post_json(&app, "/api/generate", json!({ "prompt": "   " })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], json!("Prompt is required"));
}

#[tokio::test]
async fn test_generate_code_returns_fenced_code() {
    let client = FixedClient::replying("```python\nprint('hi')\n```");
    let (_temp, _state, app) = setup(client);

    let response = post_json(&app, "/api/generate", json!({ "prompt": "say hi" })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["code"], json!("print('hi')"));
    assert_eq!(body["language"], json!("python"));
}

#[tokio::test]
async fn test_cors_preflight_is_permissive() {
    let (_temp, _state, app) = setup(FixedClient::failing());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/generate-css")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
