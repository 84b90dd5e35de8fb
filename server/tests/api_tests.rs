//! End-to-end tests against a real listener on an ephemeral port.

use eda_server::{AppState, ServerConfig, app};
use pretty_assertions::assert_eq;
use reqwest::{Client, StatusCode, multipart};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;

// ============================================================================
// Helpers
// ============================================================================

struct TestServer {
    base: String,
    client: Client,
    state: AppState,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(ServerConfig::default()).await
    }

    async fn start_with(config: ServerConfig) -> Self {
        let state = AppState::new(config, None);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base: format!("http://{addr}"),
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap(),
            state,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> reqwest::Response {
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("text/csv")
            .unwrap();
        let form = multipart::Form::new().part("file", part);
        self.client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    async fn upload_fixture(&self, name: &str) -> String {
        let response = self.upload(name, fixture(name)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        body["session_id"].as_str().unwrap().to_string()
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }
}

fn fixture(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../crates/eda-processing/tests/fixtures")
        .join(name);
    std::fs::read(path).unwrap()
}

// ============================================================================
// Service endpoints
// ============================================================================

#[tokio::test]
async fn test_root_and_health() {
    let server = TestServer::start().await;

    let (status, body) = server.get_json("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "EDA Assistant Backend Running");

    let (status, body) = server.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 0);
    assert!(body["timestamp"].is_string());
}

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_upload_returns_metadata() {
    let server = TestServer::start().await;
    let response = server.upload("messy.csv", fixture("messy.csv")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["filename"], "messy.csv");
    assert_eq!(body["rows"], 8);
    assert_eq!(body["columns"], 4);
    assert_eq!(
        body["column_names"],
        serde_json::json!(["name", "age", "city", "salary"])
    );
    assert_eq!(body["preview"].as_array().unwrap().len(), 5);
    assert_eq!(body["preview"][1]["age"], Value::Null);
    assert!(body["session_id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(server.state.sessions.len(), 1);
}

#[tokio::test]
async fn test_upload_rejects_non_csv_filename() {
    let server = TestServer::start().await;
    let response = server.upload("notes.txt", b"a,b\n1,2\n".to_vec()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["status"], 400);
    assert!(server.state.sessions.is_empty());
}

#[tokio::test]
async fn test_upload_rejects_empty_file() {
    let server = TestServer::start().await;
    let response = server.upload("empty.csv", b"  \n".to_vec()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "EMPTY_DATASET");
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let server = TestServer::start().await;
    let form = multipart::Form::new().text("other", "value");
    let response = server
        .client
        .post(server.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let config = ServerConfig::builder()
        .max_upload_bytes(16)
        .build()
        .unwrap();
    let server = TestServer::start_with(config).await;
    let response = server.upload("messy.csv", fixture("messy.csv")).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(server.state.sessions.is_empty());
}

// ============================================================================
// Analysis
// ============================================================================

#[tokio::test]
async fn test_profile_by_path_and_query_agree() {
    let server = TestServer::start().await;
    let id = server.upload_fixture("messy.csv").await;

    let (status, by_path) = server.get_json(&format!("/profile/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, by_query) = server.get_json(&format!("/profile?session_id={id}")).await;
    assert_eq!(by_path, by_query);

    assert_eq!(by_path["session_id"], id.as_str());
    assert_eq!(by_path["rows"], 8);
    assert_eq!(by_path["duplicates"], 2);
    let columns = by_path["columns_analysis"].as_array().unwrap();
    assert_eq!(columns.len(), 4);
    assert_eq!(columns[1]["name"], "age");
    assert_eq!(columns[1]["missing_count"], 3);
    assert!(columns[1].get("median").is_some());
    assert!(columns[0].get("median").is_none());
}

#[tokio::test]
async fn test_risk_for_messy_dataset() {
    let server = TestServer::start().await;
    let id = server.upload_fixture("messy.csv").await;

    let (status, body) = server.get_json(&format!("/risk/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_level"], "Low");
    assert!((body["risk_score"].as_f64().unwrap() - 0.2125).abs() < 1e-9);
    assert_eq!(body["issues"][0]["type"], "missing_values");
    assert_eq!(body["issues"][0]["column"], "age");
    assert_eq!(body["issues"][1]["type"], "duplicates");
    assert_eq!(body["issues"][1]["severity"], "critical");
    assert!(body["generated_at"].is_string());
}

#[tokio::test]
async fn test_risk_is_memoized_per_session() {
    let server = TestServer::start().await;
    let id = server.upload_fixture("messy.csv").await;

    let (_, first) = server.get_json(&format!("/risk/{id}")).await;
    let (_, second) = server.get_json(&format!("/risk?session_id={id}")).await;
    assert_eq!(first["generated_at"], second["generated_at"]);
}

#[tokio::test]
async fn test_compare_for_messy_dataset() {
    let server = TestServer::start().await;
    let id = server.upload_fixture("messy.csv").await;

    let (status, body) = server.get_json(&format!("/compare/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["before"]["rows"], 8);
    assert_eq!(body["after"]["rows"], 6);
    assert_eq!(body["after"]["missing_values"], 0);
    assert_eq!(body["improvements"]["rows_removed"], 2);
    assert_eq!(body["improvements"]["missing_values_fixed"], 5);
    assert_eq!(body["improvements"]["duplicates_removed"], 2);
}

#[tokio::test]
async fn test_cleaned_csv_download() {
    let server = TestServer::start().await;
    let id = server.upload_fixture("messy.csv").await;

    let response = server
        .client
        .get(server.url(&format!("/cleaned/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));

    let text = response.text().await.unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("name,age,city,salary"));
    assert_eq!(lines.count(), 6);
}

#[tokio::test]
async fn test_explain_falls_back_to_rules() {
    let server = TestServer::start().await;
    let id = server.upload_fixture("sparse_column.csv").await;

    let (status, body) = server.get_json(&format!("/explain?session_id={id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "RuleBased");
    assert!(body["explanation"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body.get("model").is_none());
}

#[tokio::test]
async fn test_script_endpoint() {
    let server = TestServer::start().await;
    let id = server.upload_fixture("messy.csv").await;

    let (status, body) = server.get_json(&format!("/script/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["language"], "python");
    assert_eq!(body["format"], "pandas");
    assert_eq!(body["session_id"], id.as_str());
    let script = body["script"].as_str().unwrap();
    assert!(script.contains("drop_duplicates"));
    assert_eq!(body["code"].as_str(), Some(script));
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let server = TestServer::start().await;
    let missing = uuid::Uuid::new_v4();

    for path in ["profile", "risk", "compare", "explain", "script"] {
        let (status, body) = server.get_json(&format!("/{path}/{missing}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(body["error"]["type"], "session_not_found");
    }

    let (status, _) = server.get_json("/profile/not-a-uuid").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_session_id_is_bad_request() {
    let server = TestServer::start().await;
    let (status, body) = server.get_json("/profile").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_input");
}

#[tokio::test]
async fn test_delete_session() {
    let server = TestServer::start().await;
    let id = server.upload_fixture("messy.csv").await;

    let url = server.url(&format!("/session/{id}"));
    let response = server.client.delete(&url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = server.get_json(&format!("/profile/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = server.client.delete(&url).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let server = TestServer::start().await;
    let messy = server.upload_fixture("messy.csv").await;
    let clean = server.upload_fixture("clean_numeric.csv").await;
    assert_ne!(messy, clean);

    let (_, messy_profile) = server.get_json(&format!("/profile/{messy}")).await;
    let (_, clean_profile) = server.get_json(&format!("/profile/{clean}")).await;
    assert_eq!(messy_profile["rows"], 8);
    assert_eq!(clean_profile["rows"], 100);
}
