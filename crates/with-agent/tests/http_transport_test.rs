//! HTTP transport tests against a local mock server.

use std::sync::Arc;

use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use serde_json::json;
use with_agent::{
    check_health, ClassifierClient, EscalationSession, HttpTransport, ServiceConfig, Transport,
    TransportError,
};
use with_coordination::{Note, Phase, SeverityTier};

fn transport_for(server: &MockServer) -> HttpTransport {
    let config = ServiceConfig {
        base_url: server.base_url(),
        timeout_secs: 5,
        ..Default::default()
    };
    HttpTransport::new(config).expect("client")
}

#[tokio::test]
async fn classify_posts_utf8_json_and_reads_state() {
    let server = MockServer::start_async().await;
    let classify = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/classify")
                .header("content-type", "application/json; charset=utf-8")
                .json_body(json!({ "text": "estou nervoso" }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "state": "critical" }));
        })
        .await;

    let client = ClassifierClient::new(transport_for(&server));
    let tier = client
        .classify(&Note::parse(" estou nervoso ").unwrap())
        .await
        .unwrap();

    assert_eq!(tier, SeverityTier::Critical);
    classify.assert_async().await;
}

#[tokio::test]
async fn non_success_status_is_service_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/classify");
            then.status(503).body("upstream unavailable");
        })
        .await;

    let err = transport_for(&server)
        .post("/classify", &json!({ "text": "oi" }))
        .await
        .unwrap_err();

    match err {
        TransportError::Service { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "upstream unavailable");
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_success_body_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/respond");
            then.status(200).body("<html>oops</html>");
        })
        .await;

    let err = transport_for(&server)
        .post("/respond", &json!({ "text": "oi", "state": "elevated" }))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Decode { .. }));
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    let config = ServiceConfig {
        base_url: "http://127.0.0.1:1".into(),
        timeout_secs: 2,
        ..Default::default()
    };
    let err = HttpTransport::new(config)
        .unwrap()
        .post("/classify", &json!({ "text": "oi" }))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Network { .. }));
}

#[tokio::test]
async fn exactly_one_request_per_failed_call() {
    let server = MockServer::start_async().await;
    let failing = server
        .mock_async(|when, then| {
            when.method(POST).path("/classify");
            then.status(500);
        })
        .await;

    let mut session = EscalationSession::new(Arc::new(transport_for(&server)));
    let snapshot = session.submit_note("oi").await.unwrap();

    assert_eq!(snapshot.phase, Phase::Settled);
    assert!(!snapshot.loading);
    assert_eq!(failing.hits_async().await, 1);
}

#[tokio::test]
async fn full_escalation_over_http() {
    let server = MockServer::start_async().await;
    let classify = server
        .mock_async(|when, then| {
            when.method(POST).path("/classify");
            then.status(200).json_body(json!({ "state": "elevated" }));
        })
        .await;
    let respond = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/respond")
                .json_body(json!({ "text": "no limite", "state": "elevated" }));
            then.status(200)
                .json_body(json!({ "reply": "O que você precisa agora?" }));
        })
        .await;

    let mut session = EscalationSession::new(Arc::new(transport_for(&server)));
    let gated = session.submit_note("no limite").await.unwrap();
    assert!(gated.consent_gate_visible);
    assert_eq!(respond.hits_async().await, 0);

    let done = session.consent_now().await.unwrap();
    assert_eq!(done.reply, "O que você precisa agora?");
    classify.assert_async().await;
    respond.assert_async().await;
}

#[tokio::test]
async fn health_reads_status_from_root() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).json_body(json!({ "status": "WITH online" }));
        })
        .await;

    let status = check_health(&transport_for(&server)).await.unwrap();
    assert_eq!(status, "WITH online");
}
