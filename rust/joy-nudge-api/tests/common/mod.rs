//! Shared harness: the full router over an in-memory store, with the
//! Gemini driver pointed at a wiremock server.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{Value, json};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use joy_nudge_api::AppState;
use joy_nudge_api::config::{AppConfig, DatabaseDriver};
use joy_nudge_api::database::Database;
use joy_nudge_api::gateway::auth::generate_jwt;
use joy_nudge_api::llm::providers::GoogleDriver;
use joy_nudge_api::llm::{LlmSettings, Provider};
use joy_nudge_api::nudge::NudgeGenerator;
use joy_nudge_api::server::{build_router, in_memory_database};

pub const SECRET: &str = "joy-nudge-test-secret-with-enough-length";

pub struct Harness {
    pub server: TestServer,
    pub llm: MockServer,
    pub database: Database,
}

pub async fn harness() -> Harness {
    harness_with(|_| {}).await
}

/// Build a harness after letting the caller adjust the configuration.
pub async fn harness_with(customize: impl FnOnce(&mut AppConfig)) -> Harness {
    let llm = MockServer::start().await;

    let mut config = AppConfig::default();
    config.gateway.jwt_secret = Some(SECRET.to_string());
    config.database.driver = DatabaseDriver::Memory;
    customize(&mut config);

    let settings = LlmSettings {
        base_url: llm.uri(),
        api_key: Some("g-key".into()),
        model: "gemini-test".into(),
        provider: Provider::Google,
        ..LlmSettings::default()
    };
    let driver = Arc::new(GoogleDriver::new(settings).unwrap());
    let generator = Arc::new(NudgeGenerator::with_seed(driver, 7));

    let database = in_memory_database().await.unwrap();
    let state = AppState::new(config, database.clone(), generator);
    let server = TestServer::new(build_router(state)).unwrap();

    Harness {
        server,
        llm,
        database,
    }
}

pub fn token_for(user_id: &str) -> String {
    generate_jwt(user_id, Some(&format!("{user_id}@example.com")), SECRET, 3600).unwrap()
}

/// Make every Gemini call answer with `text`.
pub async fn mount_llm_text(llm: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }],
            "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 40, "totalTokenCount": 160 }
        })))
        .mount(llm)
        .await;
}

pub async fn mount_llm_status(llm: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream unavailable"))
        .mount(llm)
        .await;
}

/// A draft as the model would emit it.
pub fn draft(category: &str, interactive_type: &str) -> String {
    json!({
        "title": "Window Sky Watch",
        "description": "Find a window and follow one cloud for a minute.",
        "category": category,
        "interactive_type": interactive_type,
        "duration_seconds": 60
    })
    .to_string()
}

pub const GENERATABLE_TYPES: [&str; 4] = ["BREATHING", "TIMED", "OBSERVATIONAL", "REFLECTIVE"];

pub const FALLBACK_TITLES: [&str; 4] = [
    "A Calming Breath",
    "Gentle Stretch",
    "Tiny Gratitude",
    "Check In With Yourself",
];

pub fn data(body: &Value) -> &Value {
    assert_eq!(body["success"], true, "unexpected body: {body}");
    &body["data"]
}
