//! End-to-end tests driving the full router in-process.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use diaspeak_backend::controllers::{
    admin::AdminController, auth::AuthController, catalog::CatalogController,
    download::DownloadController, jobs::JobsController, speak::SpeakController,
};
use diaspeak_backend::domain::audio::Assembler;
use diaspeak_backend::domain::ratelimit::RateLimiter;
use diaspeak_backend::domain::{
    admin::AdminService, auth::AuthService, catalog::CatalogService, job::JobService,
    speech::{SpeechConfig, SpeechService},
};
use diaspeak_backend::infrastructure::config::{Config, Environment, LogFormat};
use diaspeak_backend::infrastructure::http::build_router;
use diaspeak_backend::infrastructure::ports::{
    DisabledObjectStore, ProcessCodec, TestToneSynthesizer, TokioJobBackend,
};
use diaspeak_backend::infrastructure::repositories::{
    AuditRepository, CatalogRepository, JobHistoryRepository, UserRepository,
};
use diaspeak_backend::infrastructure::store::OutputStore;

struct TestApp {
    router: Router,
    // Holds the output tree alive for the duration of the test
    _dir: TempDir,
}

fn test_config(dir: &TempDir, rate_limit: usize) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: "test-secret".to_string(),
        token_ttl_hours: 1,
        rate_limit_window_secs: 60,
        rate_limit_max_requests: rate_limit,
        chunk_max_chars: 200,
        chunk_overlap_chars: 20,
        output_root: dir.path().join("outputs"),
        synthesizer_url: None,
        synthesis_timeout_secs: 5,
        ffmpeg_bin: "ffmpeg".to_string(),
        object_store_endpoint: None,
        object_store_bucket: None,
        admin_users: vec!["admin".to_string()],
        default_admin_password: "admin".to_string(),
        environment: Environment::Development,
        log_format: LogFormat::Pretty,
    }
}

async fn spawn_app_with_limit(rate_limit: usize) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(&dir, rate_limit));
    tokio::fs::create_dir_all(&config.output_root).await.unwrap();

    let user_repo = Arc::new(UserRepository::new(config.output_root.join("users.json")));
    let catalog_repo = Arc::new(CatalogRepository::new(config.output_root.join("catalog.csv")));
    let job_history_repo = Arc::new(JobHistoryRepository::new(
        config.output_root.join("job_history.csv"),
    ));
    let audit_repo = Arc::new(AuditRepository::new(config.output_root.join("audit_log.csv")));
    user_repo.seed_if_missing("admin", "admin").await.unwrap();

    let output_store = Arc::new(OutputStore::new(
        config.output_root.clone(),
        Arc::new(DisabledObjectStore),
        None,
    ));
    let speech_service = Arc::new(SpeechService::new(
        SpeechConfig {
            chunk_max_chars: config.chunk_max_chars,
            chunk_overlap_chars: config.chunk_overlap_chars,
            synthesis_timeout: Duration::from_secs(config.synthesis_timeout_secs),
        },
        Arc::new(TestToneSynthesizer::default()),
        Assembler::new(Arc::new(ProcessCodec::new(config.ffmpeg_bin.clone()))),
        output_store,
        catalog_repo.clone(),
    ));
    let job_backend = Arc::new(TokioJobBackend::new(speech_service.clone()));
    let job_service = Arc::new(JobService::new(job_history_repo, job_backend));
    let rate_limiter = Arc::new(RateLimiter::new(
        Duration::from_secs(config.rate_limit_window_secs),
        config.rate_limit_max_requests,
    ));

    let auth_controller = Arc::new(AuthController::new(Arc::new(AuthService::new(
        user_repo.clone(),
        config.jwt_secret.clone(),
        config.token_ttl_hours,
    ))));
    let speak_controller = Arc::new(SpeakController::new(
        speech_service,
        rate_limiter.clone(),
    ));
    let jobs_controller = Arc::new(JobsController::new(job_service, rate_limiter));
    let catalog_controller = Arc::new(CatalogController::new(Arc::new(CatalogService::new(
        catalog_repo,
        config.output_root.clone(),
    ))));
    let download_controller = Arc::new(DownloadController::new(config.output_root.clone()));
    let admin_controller = Arc::new(AdminController::new(Arc::new(AdminService::new(
        user_repo, audit_repo,
    ))));

    let router = build_router(
        config,
        auth_controller,
        speak_controller,
        jobs_controller,
        catalog_controller,
        download_controller,
        admin_controller,
    );

    TestApp { router, _dir: dir }
}

async fn spawn_app() -> TestApp {
    spawn_app_with_limit(100).await
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, bytes) = self.send(request).await;
        (status, parse_json(&bytes))
    }

    async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        let (status, bytes) = self.send(request).await;
        (status, parse_json(&bytes))
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .post_json(
                "/login",
                None,
                json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }
}

fn parse_json(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(Value::Null)
    }
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_login_and_auth_guard() {
    let app = spawn_app().await;

    let (status, _) = app
        .post_json(
            "/login",
            None,
            json!({ "username": "admin", "password": "wrong" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.login("admin", "admin").await;
    assert!(!token.is_empty());

    // No token
    let (status, _) = app
        .post_json("/speak", None, json!({ "text": "hi", "format": "wav" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Garbage token
    let (status, _) = app
        .post_json(
            "/speak",
            Some("not.a.jwt"),
            json!({ "text": "hi", "format": "wav" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_speak_end_to_end() {
    let app = spawn_app().await;
    let token = app.login("admin", "admin").await;

    let (status, body) = app
        .post_json(
            "/speak",
            Some(&token),
            json!({
                "text": "Hello there. This is a longer passage meant to span chunks.",
                "format": "wav",
                "title": "Greeting"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "speak failed: {}", body);
    assert_eq!(body["title"], "Greeting");
    assert!(body["duration"].as_f64().unwrap() > 0.0);
    assert!(body["length"].as_u64().unwrap() > 0);
    let file_path = body["file_path"].as_str().unwrap();
    assert!(file_path.ends_with(".wav"));
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/download/"));

    // Download the full file; the streamed body must match the declared length
    let request = Request::builder().uri(&url).body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_length: usize = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.len(), content_length);
    assert_eq!(&bytes[..4], b"RIFF");

    // The catalog should have exactly this one row
    let (status, body) = app.get("/catalog?user=admin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["results"][0]["title"], "Greeting");
    assert_eq!(body["results"][0]["format"], "wav");
}

#[tokio::test]
async fn test_speak_validation() {
    let app = spawn_app().await;
    let token = app.login("admin", "admin").await;

    let (status, _) = app
        .post_json("/speak", Some(&token), json!({ "text": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/speak",
            Some(&token),
            json!({ "text": "hi", "format": "flac" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_speak_file_upload() {
    let app = spawn_app().await;
    let token = app.login("admin", "admin").await;

    let boundary = "----diaspeak-test";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"story.txt\"\r\n\
         Content-Type: text/plain\r\n\r\nOnce upon a time.\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"format\"\r\n\r\nwav\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/speak-file")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, bytes) = app.send(request).await;
    let body = parse_json(&bytes);
    assert_eq!(status, StatusCode::OK, "upload failed: {}", body);
    assert_eq!(body["title"], "story");
    assert_eq!(body["length"], "Once upon a time.".chars().count() as u64);
}

#[tokio::test]
async fn test_rate_limit() {
    let app = spawn_app_with_limit(2).await;
    let token = app.login("admin", "admin").await;

    for _ in 0..2 {
        let (status, _) = app
            .post_json(
                "/speak",
                Some(&token),
                json!({ "text": "hi", "format": "wav" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = app
        .post_json(
            "/speak",
            Some(&token),
            json!({ "text": "hi", "format": "wav" }),
        )
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_range_requests() {
    let app = spawn_app().await;
    let token = app.login("admin", "admin").await;

    let (_, body) = app
        .post_json(
            "/speak",
            Some(&token),
            json!({ "text": "range me", "format": "wav" }),
        )
        .await;
    let url = body["url"].as_str().unwrap().to_string();

    let request = Request::builder()
        .uri(&url)
        .header(header::RANGE, "bytes=0-3")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    let content_range = response
        .headers()
        .get(header::CONTENT_RANGE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_range.starts_with("bytes 0-3/"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"RIFF");

    let request = Request::builder()
        .uri(&url)
        .header(header::RANGE, "bytes=999999999-")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);
}

#[tokio::test]
async fn test_download_rejects_traversal() {
    let app = spawn_app().await;

    // A real file one level above the output root
    std::fs::write(app._dir.path().join("secret.txt"), b"keep out").unwrap();
    let request = Request::builder()
        .uri("/download/../secret.txt")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/download/2099/01/01/missing.wav").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_update_and_delete() {
    let app = spawn_app().await;
    let token = app.login("admin", "admin").await;

    app.post_json(
        "/speak",
        Some(&token),
        json!({ "text": "entry one", "format": "wav", "title": "First" }),
    )
    .await;

    let request = Request::builder()
        .method("PUT")
        .uri("/catalog/0")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "title": "Renamed" }).to_string()))
        .unwrap();
    let (status, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(&bytes)["title"], "Renamed");

    // CSV export carries the edit
    let request = Request::builder()
        .uri("/catalog?export=csv")
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(bytes).unwrap().contains("Renamed"));

    let request = Request::builder()
        .method("DELETE")
        .uri("/catalog/0")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = app.get("/catalog").await;
    assert_eq!(body["total"], 0);

    let (status, _) = app.get("/catalog?page=1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_catalog_batch_edit() {
    let app = spawn_app().await;
    let token = app.login("admin", "admin").await;

    for title in ["a", "b", "c"] {
        app.post_json(
            "/speak",
            Some(&token),
            json!({ "text": "short", "format": "wav", "title": title }),
        )
        .await;
    }

    let (status, body) = app
        .post_json(
            "/catalog/batch",
            None,
            json!({
                "action": "edit",
                "indices": [0, 2],
                "update": { "voice": "narrator" }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated"], 2);

    let (_, body) = app.get("/catalog").await;
    assert_eq!(body["results"][0]["voice"], "narrator");
    assert_eq!(body["results"][1]["voice"], "");
    assert_eq!(body["results"][2]["voice"], "narrator");
}

#[tokio::test]
async fn test_async_job_lifecycle() {
    let app = spawn_app().await;
    let token = app.login("admin", "admin").await;

    let (status, body) = app
        .post_json(
            "/speak-async",
            Some(&token),
            json!({ "text": "async hello", "format": "wav" }),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let job_id = body["job_id"].as_str().unwrap().to_string();

    let mut last = Value::Null;
    for _ in 0..50 {
        let (status, body) = app.get(&format!("/job/{}", job_id)).await;
        assert_eq!(status, StatusCode::OK);
        last = body;
        if last["status"] == "complete" || last["status"] == "error" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(last["status"], "complete", "job did not finish: {}", last);
    assert!(last["result_url"].as_str().unwrap().starts_with("/download/"));

    let (status, body) = app.get("/jobs?user=admin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["page_size"], 20);
    assert_eq!(body["results"][0]["id"], job_id.as_str());

    let (status, _) = app.get("/job/no-such-job").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_user_management() {
    let app = spawn_app().await;
    let admin_token = app.login("admin", "admin").await;

    let (status, body) = app
        .post_json(
            "/admin/users",
            Some(&admin_token),
            json!({ "username": "alice", "password": "pw", "tenant": "acme" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    // Password never leaves the server
    assert!(body.get("password").is_none());

    // The new account can log in, but cannot reach admin routes
    let alice_token = app.login("alice", "pw").await;
    let request = Request::builder()
        .uri("/admin/users")
        .header(header::AUTHORIZATION, format!("Bearer {}", alice_token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = Request::builder()
        .uri("/admin/tenants")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token))
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(&bytes), json!(["acme", "default"]));

    // Creation is audited
    let request = Request::builder()
        .uri("/admin/audit-log")
        .header(header::AUTHORIZATION, format!("Bearer {}", admin_token))
        .body(Body::empty())
        .unwrap();
    let (status, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let log = parse_json(&bytes);
    assert!(log
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["action"] == "create_user" && r["details"].as_str().unwrap().contains("alice")));
}
