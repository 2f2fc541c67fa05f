// Integration tests for the Siren API
// Run against a live server: cargo test --test integration_test -- --ignored

use serde_json::{json, Value};

const API_BASE_URL: &str = "http://localhost:9000";

async fn create_user(client: &reqwest::Client, name: &str, role: &str, bay: &str) -> Value {
    let response = client
        .post(format!("{API_BASE_URL}/v1/users"))
        .json(&json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
            "role": role,
            "bay_name": bay,
            "seat_number": "D-34",
            "wifi_name": "Corp-Guest",
        }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(response.status(), 201);
    response.json().await.expect("Failed to parse user")
}

#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_alert_lifecycle() {
    let client = reqwest::Client::new();

    // Reporter with an empty bay name: alert must still be created
    let reporter = create_user(&client, "Jane Doe", "employee", "").await;
    let reporter_id = reporter["id"].as_str().unwrap();
    let doctor = create_user(&client, "Dr Smith", "doctor", "Medical").await;
    let doctor_id = doctor["id"].as_str().unwrap();

    // Submit without summary (non-gated flow)
    let response = client
        .post(format!("{API_BASE_URL}/v1/alerts"))
        .json(&json!({ "user_id": reporter_id, "with_summary": false }))
        .send()
        .await
        .expect("Failed to submit alert");
    assert_eq!(response.status(), 201);
    let alert: Value = response.json().await.unwrap();
    let alert_id = alert["id"].as_str().unwrap().to_string();
    assert_eq!(alert["status"], "open");
    assert_eq!(alert["user_name"], "Jane Doe");
    assert_eq!(alert["bay_name"], "");
    assert_eq!(alert["seat_number"], "D-34");

    // Doctor view: wifi_name projected away
    let response = client
        .get(format!("{API_BASE_URL}/v1/alerts?role=doctor"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let list: Value = response.json().await.unwrap();
    let row = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == alert_id.as_str())
        .expect("alert missing from doctor view");
    assert!(row.get("wifi_name").is_none());

    // IT view: wifi_name visible, snapshot fields round-trip
    let response = client
        .get(format!("{API_BASE_URL}/v1/alerts?role=it_team"))
        .send()
        .await
        .unwrap();
    let list: Value = response.json().await.unwrap();
    let row = list["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == alert_id.as_str())
        .expect("alert missing from IT view");
    assert_eq!(row["wifi_name"], "Corp-Guest");

    // Acknowledge, then resolve
    let response = client
        .post(format!("{API_BASE_URL}/v1/alerts/{alert_id}/status"))
        .json(&json!({ "status": "acknowledged", "actor_id": doctor_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["changed"], true);

    let response = client
        .post(format!("{API_BASE_URL}/v1/alerts/{alert_id}/status"))
        .json(&json!({ "status": "resolved", "actor_id": doctor_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["changed"], true);

    // Second resolve: idempotent no-op, not an error
    let response = client
        .post(format!("{API_BASE_URL}/v1/alerts/{alert_id}/status"))
        .json(&json!({ "status": "resolved", "actor_id": doctor_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["changed"], false);
    assert_eq!(body["alert"]["status"], "resolved");

    // Backward transition rejected
    let response = client
        .post(format!("{API_BASE_URL}/v1/alerts/{alert_id}/status"))
        .json(&json!({ "status": "open", "actor_id": doctor_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);

    // Gone from the active view, present in history
    let response = client
        .get(format!("{API_BASE_URL}/v1/alerts?role=doctor"))
        .send()
        .await
        .unwrap();
    let list: Value = response.json().await.unwrap();
    assert!(!list["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a["id"] == alert_id.as_str()));

    let response = client
        .get(format!("{API_BASE_URL}/v1/alerts/history?role=doctor"))
        .send()
        .await
        .unwrap();
    let list: Value = response.json().await.unwrap();
    assert!(list["data"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a["id"] == alert_id.as_str()));

    // The feed carries both the create and the status change
    let response = client
        .get(format!(
            "{API_BASE_URL}/v1/alerts/feed/events?role=doctor&offset=0&limit=1000"
        ))
        .send()
        .await
        .unwrap();
    let page: Value = response.json().await.unwrap();
    let events: Vec<&Value> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["alert"]["id"] == alert_id.as_str())
        .collect();
    assert!(events.iter().any(|e| e["kind"] == "created"));
    assert!(events
        .iter()
        .any(|e| e["kind"] == "status_changed" && e["alert"]["status"] == "resolved"));
}

#[tokio::test]
#[ignore]
async fn test_gated_submission_requires_coordinates() {
    let client = reqwest::Client::new();
    let reporter = create_user(&client, "No Location", "employee", "Delta Wing").await;
    let reporter_id = reporter["id"].as_str().unwrap();

    // Gated flow without coordinates: 422, and no alert may exist for the user
    let response = client
        .post(format!("{API_BASE_URL}/v1/alerts"))
        .json(&json!({ "user_id": reporter_id, "with_summary": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "location_unavailable");

    let response = client
        .get(format!("{API_BASE_URL}/v1/alerts?role=admin"))
        .send()
        .await
        .unwrap();
    let list: Value = response.json().await.unwrap();
    assert!(
        !list["data"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a["user_id"] == reporter_id),
        "aborted gated submission must leave no partial alert"
    );
}

#[tokio::test]
#[ignore] // Requires a server running WITHOUT a summarization provider (no OPENAI_API_KEY)
async fn test_gated_submission_aborts_when_summarizer_fails() {
    let client = reqwest::Client::new();
    let reporter = create_user(&client, "Summary Needed", "employee", "Delta Wing").await;
    let reporter_id = reporter["id"].as_str().unwrap();

    // Coordinates present, so the summarizer itself is what fails
    let response = client
        .post(format!("{API_BASE_URL}/v1/alerts"))
        .json(&json!({
            "user_id": reporter_id,
            "with_summary": true,
            "latitude": 12.97,
            "longitude": 77.59,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "summarizer_failed");
    assert_eq!(body["retryable"], true);

    // Summarization runs strictly before the insert; its failure must
    // leave zero alert rows for the reporter
    for path in ["/v1/alerts?role=admin", "/v1/alerts/history?role=admin"] {
        let response = client
            .get(format!("{API_BASE_URL}{path}"))
            .send()
            .await
            .unwrap();
        let list: Value = response.json().await.unwrap();
        assert!(
            !list["data"]
                .as_array()
                .unwrap()
                .iter()
                .any(|a| a["user_id"] == reporter_id),
            "failed summarization must not write an alert"
        );
    }
}

#[tokio::test]
#[ignore]
async fn test_notification_claim_is_first_wins() {
    let client = reqwest::Client::new();
    let user = create_user(&client, "Two Tabs", "employee", "Delta Wing").await;
    let user_id = user["id"].as_str().unwrap();

    let response = client
        .post(format!("{API_BASE_URL}/v1/users/{user_id}/notifications"))
        .json(&json!({ "title": "Break time", "body": "Step away from the screen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let notification: Value = response.json().await.unwrap();
    let id = notification["id"].as_str().unwrap();

    // Two sessions race; exactly one claim succeeds
    let first = client
        .post(format!("{API_BASE_URL}/v1/notifications/{id}/claim"))
        .send()
        .await
        .unwrap();
    let second = client
        .post(format!("{API_BASE_URL}/v1/notifications/{id}/claim"))
        .send()
        .await
        .unwrap();

    let statuses = [first.status().as_u16(), second.status().as_u16()];
    assert!(statuses.contains(&200));
    assert!(statuses.contains(&404));
}
