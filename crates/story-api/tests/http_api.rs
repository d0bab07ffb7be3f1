use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use story_api::{serve_listener, SqliteSessionStore, StoryApi};
use story_core::Catalog;
use tokio::net::TcpListener;

async fn spawn_server(api: StoryApi) -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = serve_listener(listener, api).await;
    });
    format!("http://{addr}/api")
}

async fn start_with_choices(client: &Client, base: &str, session_id: &str) {
    let response = client
        .post(format!("{base}/game/start"))
        .json(&json!({ "session_id": session_id }))
        .send()
        .await
        .expect("start request");
    assert_eq!(response.status(), StatusCode::OK);

    let choices = [("alex", "medishield_basic"), ("jamie", "integrated_shield")];
    for (character_id, option_id) in choices {
        let response = client
            .post(format!("{base}/game/decision"))
            .json(&json!({
                "session_id": session_id,
                "decision": {
                    "character_id": character_id,
                    "insurance_option_id": option_id,
                    "reasoning": "test run"
                }
            }))
            .send()
            .await
            .expect("decision request");
        assert_eq!(response.status(), StatusCode::OK);
    }
}

fn assert_amount(value: &Value, expected: f64) {
    let actual = value.as_f64().expect("numeric amount");
    assert!(
        (actual - expected).abs() < 0.05,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn health_check_and_catalog_endpoints() {
    let base = spawn_server(StoryApi::in_memory()).await;
    let client = Client::new();

    let root: Value = client
        .get(format!("{base}/"))
        .send()
        .await
        .expect("root")
        .json()
        .await
        .expect("root json");
    assert_eq!(root["message"], "MediShield Story Game API");

    let options: Value = client
        .get(format!("{base}/insurance-options"))
        .send()
        .await
        .expect("options")
        .json()
        .await
        .expect("options json");
    assert_eq!(options.as_array().map(Vec::len), Some(2));
    assert_eq!(options[0]["id"], "medishield_basic");
    assert_eq!(options[0]["type"], "basic");
    assert_eq!(options[1]["coverage_limit"], 1_000_000.0);

    let characters: Value = client
        .get(format!("{base}/characters"))
        .send()
        .await
        .expect("characters")
        .json()
        .await
        .expect("characters json");
    assert_eq!(characters[1]["occupation"], "Marketing Executive");
    assert!(characters[0]["insurance_choice"].is_null());

    let scenarios: Value = client
        .get(format!("{base}/scenarios"))
        .send()
        .await
        .expect("scenarios")
        .json()
        .await
        .expect("scenarios json");
    assert_eq!(scenarios.as_array().map(Vec::len), Some(3));

    let random: Value = client
        .get(format!("{base}/scenarios/random/2"))
        .send()
        .await
        .expect("random")
        .json()
        .await
        .expect("random json");
    assert_eq!(random.as_array().map(Vec::len), Some(2));

    let comparison: Value = client
        .get(format!("{base}/stats/comparison"))
        .send()
        .await
        .expect("comparison")
        .json()
        .await
        .expect("comparison json");
    assert_eq!(comparison["cost_difference"]["monthly"], 300.0);
    assert_eq!(comparison["enhanced_plan"]["annual_cost"], 5_400.0);
}

#[tokio::test]
async fn full_game_flow_over_http() {
    let base = spawn_server(StoryApi::in_memory()).await;
    let client = Client::new();
    start_with_choices(&client, &base, "http-flow").await;

    let state: Value = client
        .get(format!("{base}/game/http-flow"))
        .send()
        .await
        .expect("state")
        .json()
        .await
        .expect("state json");
    assert_eq!(state["current_chapter"], 1);
    assert_eq!(state["completed_decisions"]["alex"], "medishield_basic");
    assert_eq!(state["characters"][1]["insurance_choice"], "integrated_shield");

    let response = client
        .post(format!(
            "{base}/game/calculate-outcome?session_id=http-flow&scenario_id=cancer_diagnosis"
        ))
        .send()
        .await
        .expect("outcome");
    assert_eq!(response.status(), StatusCode::OK);
    let report: Value = response.json().await.expect("outcome json");

    assert_eq!(report["scenario"]["id"], "cancer_diagnosis");
    let alex = &report["outcomes"]["alex"];
    assert_eq!(alex["character_name"], "Alex");
    assert_eq!(alex["insurance_plan"], "MediShield Life (Basic)");
    assert_amount(&alex["out_of_pocket_cost"], 47_700.0);
    assert_amount(&alex["insurance_covered"], 132_300.0);
    assert_eq!(alex["financial_impact"], "High");
    assert_amount(&alex["annual_premium"], 1_800.0);

    let jamie = &report["outcomes"]["jamie"];
    assert_amount(&jamie["out_of_pocket_cost"], 9_950.0);
    assert_eq!(jamie["financial_impact"], "Medium");
}

#[tokio::test]
async fn not_found_and_lenient_paths() {
    let base = spawn_server(StoryApi::in_memory()).await;
    let client = Client::new();

    let missing = client
        .get(format!("{base}/game/never-started"))
        .send()
        .await
        .expect("missing state");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: Value = missing.json().await.expect("error json");
    assert_eq!(body["error_code"], "SESSION_NOT_FOUND");

    let missing_outcome = client
        .post(format!(
            "{base}/game/calculate-outcome?session_id=never-started&scenario_id=broken_arm"
        ))
        .send()
        .await
        .expect("missing outcome");
    assert_eq!(missing_outcome.status(), StatusCode::NOT_FOUND);

    let missing_decision = client
        .post(format!("{base}/game/decision"))
        .json(&json!({
            "session_id": "never-started",
            "decision": { "character_id": "alex", "insurance_option_id": "medishield_basic" }
        }))
        .send()
        .await
        .expect("missing decision");
    assert_eq!(missing_decision.status(), StatusCode::NOT_FOUND);

    start_with_choices(&client, &base, "lenient").await;

    let unknown_scenario = client
        .post(format!(
            "{base}/game/calculate-outcome?session_id=lenient&scenario_id=nonexistent_scenario"
        ))
        .send()
        .await
        .expect("unknown scenario");
    assert_eq!(unknown_scenario.status(), StatusCode::NOT_FOUND);
    let body: Value = unknown_scenario.json().await.expect("error json");
    assert_eq!(body["error_code"], "SCENARIO_NOT_FOUND");

    let ghost = client
        .post(format!("{base}/game/decision"))
        .json(&json!({
            "session_id": "lenient",
            "decision": {
                "character_id": "nonexistent_character",
                "insurance_option_id": "medishield_basic"
            }
        }))
        .send()
        .await
        .expect("ghost decision");
    assert_eq!(ghost.status(), StatusCode::OK);
    let ack: Value = ghost.json().await.expect("ack json");
    assert_eq!(ack["applied"], false);

    let state: Value = client
        .get(format!("{base}/game/lenient"))
        .send()
        .await
        .expect("state")
        .json()
        .await
        .expect("state json");
    assert!(state["completed_decisions"]
        .get("nonexistent_character")
        .is_none());
}

#[tokio::test]
async fn cors_headers_and_preflight() {
    let base = spawn_server(StoryApi::in_memory()).await;
    let client = Client::new();

    let response = client
        .get(format!("{base}/scenarios"))
        .send()
        .await
        .expect("scenarios");
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );

    let preflight = client
        .request(reqwest::Method::OPTIONS, format!("{base}/game/start"))
        .send()
        .await
        .expect("preflight");
    assert_eq!(preflight.status(), StatusCode::NO_CONTENT);
    assert!(preflight
        .headers()
        .contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn sqlite_store_survives_server_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("sessions.sqlite");

    let open_api = || {
        let store = SqliteSessionStore::open(&db_path).expect("open sqlite store");
        StoryApi::new(std::sync::Arc::new(Catalog::builtin()), Box::new(store))
    };

    let client = Client::new();
    let first = spawn_server(open_api()).await;
    start_with_choices(&client, &first, "durable").await;

    let second = spawn_server(open_api()).await;
    let state: Value = client
        .get(format!("{second}/game/durable"))
        .send()
        .await
        .expect("state")
        .json()
        .await
        .expect("state json");
    assert_eq!(state["completed_decisions"]["jamie"], "integrated_shield");
}
