//! Integration tests for HMAC-SHA256 payload signatures.
//!
//! The signature header carries the hex HMAC of the raw JSON body; receivers
//! verify it byte-for-byte before trusting the payload.

mod common;

use common::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

use talentgate_notifications::crypto::{compute_signature, encrypt_secret, verify_signature};

#[tokio::test]
async fn test_signature_header_matches_raw_body() {
    let server = MockServer::start().await;
    let capture = CaptureResponder::new();

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(capture.clone())
        .mount(&server)
        .await;

    let harness = TestHarness::new();
    let mut endpoint = test_endpoint(USER_1, &format!("{}/hook", server.uri()), &["ALL"]);
    endpoint.secret_encrypted =
        Some(encrypt_secret(SECRET_1, &TEST_KEY).expect("encrypt secret"));
    harness.insert_endpoint(&endpoint).await;

    harness
        .engine
        .deliver(&endpoint, &test_notification(USER_1))
        .await;

    let requests = capture.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];

    let signature = req
        .header("x-webhook-signature")
        .expect("signature header must be present when a secret is configured");

    assert_eq!(
        signature,
        compute_signature(SECRET_1, &req.body),
        "signature must be the HMAC of the exact bytes sent"
    );
    assert!(verify_signature(signature, SECRET_1, &req.body));
}

#[tokio::test]
async fn test_signature_is_hex_sha256() {
    let server = MockServer::start().await;
    let capture = CaptureResponder::new();

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(capture.clone())
        .mount(&server)
        .await;

    let harness = TestHarness::new();
    let mut endpoint = test_endpoint(USER_1, &format!("{}/hook", server.uri()), &["ALL"]);
    endpoint.secret_encrypted =
        Some(encrypt_secret(SECRET_1, &TEST_KEY).expect("encrypt secret"));
    harness.insert_endpoint(&endpoint).await;

    harness
        .engine
        .deliver(&endpoint, &test_notification(USER_1))
        .await;

    let requests = capture.requests();
    let signature = requests[0].header("x-webhook-signature").unwrap();

    // SHA256 = 32 bytes = 64 hex chars, no prefix.
    assert_eq!(signature.len(), 64);
    assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_no_secret_omits_signature_header() {
    let server = MockServer::start().await;
    let capture = CaptureResponder::new();

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(capture.clone())
        .mount(&server)
        .await;

    let harness = TestHarness::new();
    let endpoint = test_endpoint(USER_1, &format!("{}/hook", server.uri()), &["ALL"]);
    harness.insert_endpoint(&endpoint).await;

    harness
        .engine
        .deliver(&endpoint, &test_notification(USER_1))
        .await;

    let requests = capture.requests();
    assert_eq!(
        requests[0].header("x-webhook-signature"),
        None,
        "unsigned endpoints must not carry a signature header"
    );
}

#[tokio::test]
async fn test_tampered_body_fails_verification() {
    let server = MockServer::start().await;
    let capture = CaptureResponder::new();

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(capture.clone())
        .mount(&server)
        .await;

    let harness = TestHarness::new();
    let mut endpoint = test_endpoint(USER_1, &format!("{}/hook", server.uri()), &["ALL"]);
    endpoint.secret_encrypted =
        Some(encrypt_secret(SECRET_1, &TEST_KEY).expect("encrypt secret"));
    harness.insert_endpoint(&endpoint).await;

    harness
        .engine
        .deliver(&endpoint, &test_notification(USER_1))
        .await;

    let requests = capture.requests();
    let signature = requests[0].header("x-webhook-signature").unwrap();

    let mut tampered = requests[0].body.clone();
    tampered[0] ^= 0x01;
    assert!(!verify_signature(signature, SECRET_1, &tampered));

    // Wrong secret fails too.
    assert!(!verify_signature(signature, "other-secret", &requests[0].body));
}

#[tokio::test]
async fn test_signatures_differ_per_endpoint() {
    let server = MockServer::start().await;
    let capture_a = CaptureResponder::new();
    let capture_b = CaptureResponder::new();

    Mock::given(method("POST"))
        .and(path("/a"))
        .respond_with(capture_a.clone())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/b"))
        .respond_with(capture_b.clone())
        .mount(&server)
        .await;

    let harness = TestHarness::new();
    let mut endpoint_a = test_endpoint(USER_1, &format!("{}/a", server.uri()), &["ALL"]);
    endpoint_a.secret_encrypted =
        Some(encrypt_secret(SECRET_1, &TEST_KEY).expect("encrypt secret"));
    let mut endpoint_b = test_endpoint(USER_1, &format!("{}/b", server.uri()), &["ALL"]);
    endpoint_b.secret_encrypted =
        Some(encrypt_secret(SECRET_1, &TEST_KEY).expect("encrypt secret"));
    harness.insert_endpoint(&endpoint_a).await;
    harness.insert_endpoint(&endpoint_b).await;

    let notification = test_notification(USER_1);
    harness.engine.deliver(&endpoint_a, &notification).await;
    harness.engine.deliver(&endpoint_b, &notification).await;

    // The payload embeds the endpoint id, so even the same notification
    // produces endpoint-specific bodies and signatures.
    let sig_a = capture_a.requests()[0]
        .header("x-webhook-signature")
        .unwrap()
        .to_string();
    let sig_b = capture_b.requests()[0]
        .header("x-webhook-signature")
        .unwrap()
        .to_string();
    assert_ne!(sig_a, sig_b);
}
