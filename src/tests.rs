//! Integration tests for the check-in backend.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some("test-api-key".to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Create config
        let config = Config {
            api_psk: psk.clone(),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            ticket_prefix: "IFI2026-".to_string(),
        };

        let app = create_router(AppState::new(repo, config));

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn scan(&self, code: &str) -> Value {
        let (status, body) = self.post("/api/scan", json!({ "code": code })).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], true);
        body["data"].clone()
    }

    /// The team every end-to-end scenario starts from.
    async fn seed_alice_team(&self) {
        let (status, _) = self
            .post(
                "/api/teams",
                json!({
                    "id": "T1",
                    "name": "Alice",
                    "ticketId": "A1",
                    "team": "Byte Me",
                    "email": "alice@example.com",
                    "members": [{ "name": "Bob", "ticketId": "B1" }]
                }),
            )
            .await;
        assert_eq!(status, 200);
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    // Request without API key
    let resp = Client::new()
        .get(fixture.url("/api/attendees"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_psk() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .post(fixture.url("/api/scan"))
        .header("x-api-key", "wrong-key")
        .json(&json!({ "code": "A1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_auth_disabled_without_psk() {
    let fixture = TestFixture::with_psk(None).await;

    let resp = Client::new()
        .get(fixture.url("/api/attendees"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_event_stream_accepts_encoded_query_key() {
    let fixture = TestFixture::with_psk(Some("k+y/=".to_string())).await;

    let resp = Client::new()
        .get(fixture.url("/api/events?api_key=k%2By%2F%3D"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = Client::new()
        .get(fixture.url("/api/events?api_key=k%2By"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_leader_scan_success_then_duplicate() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;

    let first = fixture.scan("A1").await;
    assert_eq!(first["status"], "SUCCESS");
    assert_eq!(first["entity"]["name"], "Alice");
    assert_eq!(first["entity"]["role"], "leader");
    assert_eq!(first["entity"]["checkedIn"], true);

    let (_, team) = fixture.get("/api/teams/T1").await;
    assert_eq!(team["data"]["checkedIn"], true);
    assert!(team["data"]["checkInTime"].is_string());
    assert_eq!(team["data"]["members"][0]["checkedIn"], false);

    let second = fixture.scan("A1").await;
    assert_eq!(second["status"], "DUPLICATE");
    assert_eq!(second["entity"]["name"], "Alice");
}

#[tokio::test]
async fn test_member_scan_updates_only_member() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;

    let result = fixture.scan("B1").await;
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(result["entity"]["name"], "Bob");
    assert_eq!(result["entity"]["memberIndex"], 0);

    let (_, team) = fixture.get("/api/teams/T1").await;
    assert_eq!(team["data"]["members"][0]["checkedIn"], true);
    assert_eq!(team["data"]["members"][0]["ticketId"], "B1");
    assert_eq!(team["data"]["checkedIn"], false);
}

#[tokio::test]
async fn test_unknown_code_not_found() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;

    let result = fixture.scan("ZZZ").await;
    assert_eq!(result["status"], "NOT_FOUND");
    assert_eq!(result["code"], "ZZZ");
}

#[tokio::test]
async fn test_prefixed_code_resolves_like_plain_code() {
    let fixture = TestFixture::new().await;
    fixture
        .post(
            "/api/teams",
            json!({ "id": "D1", "name": "Dana", "ticketId": "T42" }),
        )
        .await;

    let result = fixture.scan("IFI2026-T42").await;
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(result["entity"]["parentDocId"], "D1");

    let again = fixture.scan("T42").await;
    assert_eq!(again["status"], "DUPLICATE");
}

#[tokio::test]
async fn test_team_code_requires_selection_without_writes() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;
    let (_, before) = fixture.get("/api/revision").await;

    let result = fixture.scan("T1").await;
    assert_eq!(result["status"], "SELECTION_REQUIRED");
    assert_eq!(result["parentDocId"], "T1");
    let entities = result["entities"].as_array().unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0]["name"], "Alice");
    assert_eq!(entities[1]["name"], "Bob");

    let (_, after) = fixture.get("/api/revision").await;
    assert_eq!(before["revisionId"], after["revisionId"]);

    // Operator picks Bob
    let (status, body) = fixture
        .post(
            "/api/checkin",
            json!({ "parentDocId": "T1", "role": "member", "memberIndex": 0 }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "SUCCESS");
    assert_eq!(body["data"]["entity"]["name"], "Bob");
}

#[tokio::test]
async fn test_manual_check_in_requires_member_index() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;

    let (status, body) = fixture
        .post("/api/checkin", json!({ "parentDocId": "T1", "role": "member" }))
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_member_ticket_found_by_collection_scan() {
    let fixture = TestFixture::new().await;
    fixture
        .post(
            "/api/teams",
            json!({
                "id": "LEGACY",
                "team": "Old Import",
                "members": [
                    { "name": "Uma", "ticketId": "U1" },
                    { "name": "Vik", "ticketId": "V1" }
                ]
            }),
        )
        .await;

    let result = fixture.scan("V1").await;
    assert_eq!(result["status"], "SUCCESS");
    assert_eq!(result["entity"]["name"], "Vik");
    assert_eq!(result["entity"]["memberIndex"], 1);
}

#[tokio::test]
async fn test_create_team_validation() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/teams",
            json!({ "id": "EMPTY", "members": [{ "ticketId": "X" }] }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    fixture.seed_alice_team().await;
    let (status, body) = fixture
        .post("/api/teams", json!({ "id": "T1", "name": "Again" }))
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "VERSION_MISMATCH");
}

#[tokio::test]
async fn test_roster_and_attendance_views() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;
    fixture
        .post(
            "/api/teams",
            json!({ "id": "T2", "name": "Zed", "ticketId": "Z1", "team": "Aardvarks" }),
        )
        .await;
    fixture.scan("B1").await;

    let (status, roster) = fixture.get("/api/attendees").await;
    assert_eq!(status, 200);
    let names: Vec<&str> = roster["data"]["attendees"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alice", "Bob", "Zed"]);
    assert_eq!(roster["data"]["stats"]["total"], 3);
    assert_eq!(roster["data"]["stats"]["checkedIn"], 1);
    assert_eq!(roster["data"]["stats"]["pending"], 2);

    let (_, groups) = fixture.get("/api/attendance").await;
    let groups = groups["data"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["teamName"], "Aardvarks");
    assert_eq!(groups[1]["teamName"], "Byte Me");
    assert_eq!(groups[1]["members"][0]["name"], "Alice");
}

#[tokio::test]
async fn test_dashboard_toggle_checks_out() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;
    fixture.scan("B1").await;

    let (status, body) = fixture
        .put(
            "/api/teams/T1/attendance",
            json!({ "role": "member", "memberIndex": 0, "checkedIn": false }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["checkedIn"], false);

    // Checked out people can be scanned in again
    let result = fixture.scan("B1").await;
    assert_eq!(result["status"], "SUCCESS");
}

#[tokio::test]
async fn test_deleted_team_no_longer_scans() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;

    let resp = fixture
        .client
        .delete(fixture.url("/api/teams/T1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let result = fixture.scan("A1").await;
    assert_eq!(result["status"], "NOT_FOUND");

    let (status, body) = fixture.get("/api/teams/T1").await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_registration_lookup_prefers_rsvp() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;

    let (status, _) = fixture
        .post(
            "/api/candidates",
            json!({
                "id": "U1",
                "Candidate's Name": "Alice Duplicate",
                "Candidate's Email": "alice@example.com",
                "Team Name": "Elsewhere",
                "Candidate role": "Team Leader"
            }),
        )
        .await;
    assert_eq!(status, 200);
    fixture
        .post(
            "/api/candidates",
            json!({
                "id": "U2",
                "Candidate's Name": "Ravi",
                "Candidate's Email": "ravi@example.com"
            }),
        )
        .await;

    let (_, rsvp) = fixture
        .get("/api/registrations?email=alice@example.com")
        .await;
    assert_eq!(rsvp["data"]["source"], "rsvp");
    assert_eq!(rsvp["data"]["id"], "T1");
    assert_eq!(rsvp["data"]["team"], "Byte Me");

    let (_, unstop) = fixture.get("/api/registrations?email=ravi@example.com").await;
    assert_eq!(unstop["data"]["source"], "unstop");
    assert_eq!(unstop["data"]["team"], "Individual");
    assert_eq!(unstop["data"]["role"], "Participant");

    let (status, _) = fixture.get("/api/registrations?email=nobody@example.com").await;
    assert_eq!(status, 404);

    let (_, candidates) = fixture.get("/api/candidates").await;
    let candidates = candidates["data"].as_array().unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0]["role"], "leader");
    assert_eq!(candidates[0]["source"], "unstop");
}

#[tokio::test]
async fn test_registration_corrections() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;
    fixture
        .post(
            "/api/candidates",
            json!({
                "id": "U2",
                "Candidate's Name": "Ravi",
                "Candidate's Email": "ravi@example.com"
            }),
        )
        .await;

    let (status, body) = fixture
        .put("/api/registrations/rsvp/T1", json!({ "name": "Alice Liddell" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "Alice Liddell");
    assert_eq!(body["data"]["email"], "alice@example.com");

    let (status, body) = fixture
        .put("/api/registrations/unstop/U2", json!({ "team": "Solo Act" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["team"], "Solo Act");

    let (status, _) = fixture
        .put("/api/registrations/rsvp/T1", json!({ "name": "  " }))
        .await;
    assert_eq!(status, 400);

    let (status, _) = fixture
        .put("/api/registrations/csv/T1", json!({ "name": "X" }))
        .await;
    assert_eq!(status, 400);

    // Member fields survive the leader profile update
    let (_, team) = fixture.get("/api/teams/T1").await;
    assert_eq!(team["data"]["members"][0]["name"], "Bob");
}

#[tokio::test]
async fn test_revision_increments_on_check_in() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;

    let (_, before) = fixture.get("/api/revision").await;
    let before = before["data"]["revisionId"].as_i64().unwrap();

    fixture.scan("A1").await;
    let (_, after) = fixture.get("/api/revision").await;
    assert_eq!(after["data"]["revisionId"].as_i64().unwrap(), before + 1);

    // Duplicate scans do not write
    fixture.scan("A1").await;
    let (_, again) = fixture.get("/api/revision").await;
    assert_eq!(again["data"]["revisionId"].as_i64().unwrap(), before + 1);
}

#[tokio::test]
async fn test_event_stream_sends_initial_roster() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;

    let mut resp = Client::new()
        .get(fixture.url("/api/events?api_key=test-api-key"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let mut received = String::new();
    let read = tokio::time::timeout(Duration::from_secs(5), async {
        while !received.contains("\n\n") {
            match resp.chunk().await.unwrap() {
                Some(bytes) => received.push_str(&String::from_utf8_lossy(&bytes)),
                None => break,
            }
        }
    })
    .await;
    assert!(read.is_ok(), "no SSE event within timeout");
    assert!(received.contains("event: roster"));
    assert!(received.contains("\"total\":2"));
}

#[tokio::test]
async fn test_padded_tickets_are_stored_trimmed() {
    let fixture = TestFixture::new().await;
    let (status, body) = fixture
        .post(
            "/api/teams",
            json!({
                "id": "R1",
                "name": "Rhea",
                "ticketId": " T9 ",
                "members": [{ "name": "Milo", "ticketId": " M9 " }]
            }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["ticketId"], "T9");
    assert_eq!(body["data"]["members"][0]["ticketId"], "M9");

    assert_eq!(fixture.scan("T9").await["status"], "SUCCESS");
    assert_eq!(fixture.scan("M9").await["status"], "SUCCESS");
}

#[tokio::test]
async fn test_missing_member_slot_reports_slot_code() {
    let fixture = TestFixture::new().await;
    fixture.seed_alice_team().await;

    let (status, body) = fixture
        .put(
            "/api/teams/T1/attendance",
            json!({ "role": "member", "memberIndex": 7, "checkedIn": true }),
        )
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "SLOT_NOT_FOUND");
}

#[tokio::test]
async fn test_racing_creates_of_one_key_conflict() {
    let fixture = TestFixture::new().await;
    let body = json!({ "id": "T7", "name": "Tess", "ticketId": "T7A" });

    let (a, b) = tokio::join!(
        fixture.post("/api/teams", body.clone()),
        fixture.post("/api/teams", body.clone())
    );
    let mut statuses = [a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, [200, 409]);

    let loser = if a.0 == 409 { a.1 } else { b.1 };
    assert_eq!(loser["error"]["code"], "VERSION_MISMATCH");
}
