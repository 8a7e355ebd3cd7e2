//! End-to-end registration flow against a mock registration service.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wa_registration::registration::{RateLimit, Stage};
use wa_registration::{
    ClientState, CodeMethod, EventName, PhoneNumber, ReferenceTables, RegistrationClient,
    RegistrationConfig, RegistrationError, RegistrationEvent, RegistrationOutcome,
    RetryableError, StaticToken,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    data_dir: tempfile::TempDir,
    tables: Arc<ReferenceTables>,
}

impl Harness {
    async fn start() -> Self {
        let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
        Self {
            server: MockServer::start().await,
            data_dir: tempfile::tempdir().unwrap(),
            tables: Arc::new(ReferenceTables::load_dir(fixtures).unwrap()),
        }
    }

    fn config(&self) -> RegistrationConfig {
        RegistrationConfig::builder()
            .data_dir(self.data_dir.path())
            .timeout(Duration::from_secs(5))
            .build()
            .with_api_base(&self.server.uri())
            .unwrap()
            .with_version_check_url(format!("{}/version", self.server.uri()).parse().unwrap())
    }

    fn client(&self, number: &str) -> RegistrationClient {
        RegistrationClient::connect(
            PhoneNumber::new(number).unwrap(),
            Arc::clone(&self.tables),
            StaticToken::new("test-token"),
            self.config(),
        )
        .unwrap()
    }

    async fn respond(&self, endpoint: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }
}

fn record_events(client: &mut RegistrationClient) -> Arc<Mutex<Vec<RegistrationEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for name in EventName::ALL {
        let sink = Arc::clone(&seen);
        client.on(name, move |event| sink.lock().unwrap().push(event.clone()));
    }
    seen
}

#[tokio::test]
async fn test_request_code_sent() {
    let h = Harness::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/code"))
        .and(header("accept", "text/json"))
        .and(query_param("cc", "34"))
        .and(query_param("in", "600111222"))
        .and(query_param("lg", "es"))
        .and(query_param("lc", "ES"))
        .and(query_param("token", "test-token"))
        .and(query_param("mcc", "214"))
        .and(query_param("mnc", "07"))
        .and(query_param("sim_mcc", "214"))
        .and(query_param("method", "sms"))
        .and(query_param("mistyped", "6"))
        .and(query_param("network_radio_type", "1"))
        .and(query_param("simnum", "1"))
        .and(query_param("copiedrc", "1"))
        .and(query_param("hasinrc", "1"))
        .and(query_param("rcmatch", "1"))
        .and(query_param("extexist", "1"))
        .and(query_param("extstate", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "sent", "length": 6, "method": "sms"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let mut client = h.client("34600111222");
    let seen = record_events(&mut client);

    let outcome = client
        .request_code(CodeMethod::Sms, None, None)
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        RegistrationOutcome::CodeSent {
            length: Some(6),
            method: CodeMethod::Sms
        }
    ));
    assert_eq!(client.state(), ClientState::CodeRequested);

    let code_events: Vec<_> = seen
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.name() == EventName::CodeRequest)
        .cloned()
        .collect();
    assert_eq!(code_events.len(), 1);
    match &code_events[0] {
        RegistrationEvent::CodeRequest { length, method, .. } => {
            assert_eq!(*length, Some(6));
            assert_eq!(*method, CodeMethod::Sms);
        }
        other => panic!("Expected CodeRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn test_request_code_sends_identity_and_nonces() {
    let h = Harness::start().await;
    h.respond("/v2/code", serde_json::json!({"status": "sent", "length": 6}))
        .await;

    let mut client = h.client("447700900123");
    client
        .request_code(CodeMethod::Voice, Some("O2"), None)
        .await
        .unwrap();

    let requests = h.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let pairs: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let get = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };

    assert_eq!(get("mnc").as_deref(), Some("10"));
    assert_eq!(get("method").as_deref(), Some("voice"));
    assert_eq!(get("s").as_deref(), Some(""));

    let pid: u16 = get("pid").unwrap().parse().unwrap();
    assert!((100..=9999).contains(&pid));
    assert_eq!(get("rchash").unwrap().len(), 44);
    assert_eq!(get("anhash").unwrap().len(), 32);

    // The raw id bytes survive percent-encoding.
    let raw_query = requests[0].url.query().unwrap().to_string();
    let id_encoded = raw_query
        .split('&')
        .find_map(|pair| pair.strip_prefix("id="))
        .unwrap();
    let id = urlencoding::decode_binary(id_encoded.as_bytes());
    assert_eq!(id.as_ref(), client.identity().as_bytes());
}

#[tokio::test]
async fn test_request_code_too_recent() {
    let h = Harness::start().await;
    h.respond(
        "/v2/code",
        serde_json::json!({"status": "fail", "reason": "too_recent", "retry_after": 120}),
    )
    .await;

    let mut client = h.client("34600111222");
    let seen = record_events(&mut client);

    let err = client
        .request_code(CodeMethod::Sms, None, None)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("2 minutes"));
    assert!(matches!(
        err,
        RegistrationError::RateLimited {
            limit: RateLimit::TooRecent,
            ..
        }
    ));
    assert_eq!(err.retry_after(), Some(Duration::from_secs(120)));

    let events = seen.lock().unwrap();
    let too_recent = events
        .iter()
        .find(|e| e.name() == EventName::CodeRequestFailedTooRecent)
        .expect("too-recent event");
    match too_recent {
        RegistrationEvent::CodeRequestFailedTooRecent { retry_after, .. } => {
            assert_eq!(*retry_after, Some(120));
        }
        other => panic!("Expected CodeRequestFailedTooRecent, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_registration_then_check() {
    let h = Harness::start().await;
    h.respond("/v2/code", serde_json::json!({"status": "sent", "length": 6}))
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/register"))
        .and(query_param("code", "123456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "login": "34600111222",
            "pw": "first-password",
            "type": "new",
            "expiration": 1767225600,
            "kind": "free",
            "price": "0,89 €",
            "cost": "0.89",
            "currency": "EUR",
            "price_expiration": 1700000000
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    h.respond(
        "/v2/exist",
        serde_json::json!({"status": "ok", "login": "34600111222", "pw": "rotated-password"}),
    )
    .await;

    let mut client = h.client("34600111222");
    client
        .request_code(CodeMethod::Sms, None, None)
        .await
        .unwrap();

    let registered = client.register_code("123-456").await.unwrap();
    assert_eq!(registered.login, "34600111222");
    assert_eq!(registered.expose_password(), "first-password");
    assert_eq!(registered.currency.as_deref(), Some("EUR"));
    assert_eq!(client.state(), ClientState::Registered);

    let checked = client.check_credentials().await.unwrap();
    assert_eq!(checked.expose_password(), "rotated-password");
    assert_eq!(client.state(), ClientState::CredentialsChecked);

    // The identity file was created and is reused by a new client.
    let again = h.client("34600111222");
    assert_eq!(again.identity(), client.identity());
}

#[tokio::test]
async fn test_old_version_starts_version_check() {
    let h = Harness::start().await;
    h.respond(
        "/v2/register",
        serde_json::json!({"status": "fail", "reason": "old_version"}),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/version"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"a": "x", "d": "2.99.0"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let mut client = h.client("34600111222");
    let err = client.register_code("111-111").await.unwrap_err();

    assert!(err.is_old_version());
    assert!(
        err.to_string()
            .ends_with("registering the registration code from WhatsApp. Reason: old_version")
    );

    // The check runs in the background.
    for _ in 0..50 {
        let requests = h.server.received_requests().await.unwrap();
        if requests.iter().any(|r| r.url.path() == "/version") {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("version check was not started");
}

#[tokio::test]
async fn test_bad_credentials() {
    let h = Harness::start().await;
    h.respond(
        "/v2/exist",
        serde_json::json!({"status": "fail", "reason": "incorrect"}),
    )
    .await;

    let mut client = h.client("34600111222");
    let seen = record_events(&mut client);

    let err = client.check_credentials().await.unwrap_err();

    assert!(matches!(
        err,
        RegistrationError::Protocol {
            stage: Stage::CredentialsCheck,
            ..
        }
    ));
    assert_eq!(
        seen.lock().unwrap().last().map(|e| e.name()),
        Some(EventName::CredentialsBad)
    );
}

#[tokio::test]
async fn test_non_json_response_is_transport_failure() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/code"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&h.server)
        .await;

    let mut client = h.client("34600111222");
    let seen = record_events(&mut client);

    let err = client
        .request_code(CodeMethod::Sms, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::Transport(_)));
    assert_eq!(
        seen.lock().unwrap().last().map(|e| e.name()),
        Some(EventName::TransportFailed)
    );
}

#[tokio::test]
async fn test_unknown_number_makes_no_request() {
    let h = Harness::start().await;

    let mut client = h.client("999123456");
    let err = client
        .request_code(CodeMethod::Sms, None, None)
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::InvalidPhoneNumber { .. }));
    assert!(h.server.received_requests().await.unwrap().is_empty());
}
