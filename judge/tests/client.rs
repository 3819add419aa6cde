//! Integration tests for the judge HTTP client.
//!
//! Uses wiremock for HTTP mocking. Covers submit, status polling semantics,
//! idempotent deletion, the health probe, and the error taxonomy mapping
//! (local validation, 4xx, 5xx, 404, connection refused).

use judge::types::{languages, status};
use judge::{Judge, Judge0Client, JudgeConfig, JudgeError, ResourceLimits, SubmissionRequest};
use wiremock::matchers::{body_json_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> Judge0Client {
    Judge0Client::new(JudgeConfig::default().with_base_url(server.uri()))
        .expect("failed to build client")
}

fn hello_request() -> SubmissionRequest {
    SubmissionRequest::new("print('hello')", languages::PYTHON_3_8)
        .with_stdin("")
        .with_expected_output("hello")
}

#[tokio::test]
async fn test_submit_returns_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .and(query_param("wait", "false"))
        .and(query_param("base64_encoded", "false"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"token": "abc-123"})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server);
    let token = client.submit(&hello_request()).await.expect("submit failed");
    assert_eq!(token, "abc-123");
}

#[tokio::test]
async fn test_submit_sends_auth_header_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .and(header("X-Auth-Token", "secret"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"token": "tok"})),
        )
        .mount(&server)
        .await;

    let client = Judge0Client::new(
        JudgeConfig::default()
            .with_base_url(server.uri())
            .with_api_key("secret"),
    )
    .expect("failed to build client");

    client.submit(&hello_request()).await.expect("submit failed");
}

#[tokio::test]
async fn test_submit_rejects_empty_source_locally() {
    // No mock mounted: validation must fail before any network call.
    let server = MockServer::start().await;
    let client = test_client(&server);

    let request = SubmissionRequest::new("   ", languages::PYTHON_3_8);
    let err = client.submit(&request).await.unwrap_err();
    assert!(matches!(err, JudgeError::InvalidRequest(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_rejects_excessive_limits_locally() {
    let server = MockServer::start().await;
    let client = test_client(&server);

    let request = hello_request().with_limits(ResourceLimits {
        cpu_time_limit: Some(100.0),
        memory_limit: None,
    });
    assert!(matches!(
        client.submit(&request).await.unwrap_err(),
        JudgeError::InvalidRequest(_)
    ));

    let request = hello_request().with_limits(ResourceLimits {
        cpu_time_limit: None,
        memory_limit: Some(4_000_000),
    });
    assert!(matches!(
        client.submit(&request).await.unwrap_err(),
        JudgeError::InvalidRequest(_)
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_missing_token_is_bad_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.submit(&hello_request()).await.unwrap_err();
    assert!(matches!(err, JudgeError::BadResponse(_)));
}

#[tokio::test]
async fn test_submit_client_error_keeps_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .respond_with(ResponseTemplate::new(422).set_body_string("language_id is invalid"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    match client.submit(&hello_request()).await.unwrap_err() {
        JudgeError::Client { status, body } => {
            assert_eq!(status, 422);
            assert!(body.contains("language_id"));
        }
        other => panic!("expected Client error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.submit(&hello_request()).await.unwrap_err();
    assert!(matches!(err, JudgeError::Server { status: 503 }));
    assert!(err.is_retriable());
}

#[tokio::test]
async fn test_submit_connection_refused_is_unavailable() {
    let client = Judge0Client::new(
        // Port 1 is never listening.
        JudgeConfig::default().with_base_url("http://127.0.0.1:1"),
    )
    .expect("failed to build client");

    let err = client.submit(&hello_request()).await.unwrap_err();
    assert!(matches!(err, JudgeError::Unavailable(_)));
}

#[tokio::test]
async fn test_get_status_parses_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/submissions/tok-1"))
        .and(query_param("base64_encoded", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": {"id": status::ACCEPTED, "description": "Accepted"},
            "stdout": "hello\n",
            "time": "0.002",
            "wall_time": "0.031",
            "memory": 2048,
            "token": "tok-1"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.get_status("tok-1", false).await.expect("status failed");
    assert_eq!(result.status_id(), Some(status::ACCEPTED));
    assert!(!result.is_in_progress());
    assert_eq!(result.stdout.as_deref(), Some("hello\n"));
    assert_eq!(result.time_secs(), Some(0.002));
}

#[tokio::test]
async fn test_get_status_in_queue_is_in_progress() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/submissions/tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": {"id": status::IN_QUEUE, "description": "In Queue"}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let result = client.get_status("tok-2", false).await.expect("status failed");
    assert!(result.is_in_progress());
}

#[tokio::test]
async fn test_get_status_unknown_token_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/submissions/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.get_status("missing", false).await.unwrap_err();
    assert!(matches!(err, JudgeError::NotFound(_)));
}

#[tokio::test]
async fn test_get_status_rejects_empty_token() {
    let server = MockServer::start().await;
    let client = test_client(&server);
    assert!(matches!(
        client.get_status("  ", false).await.unwrap_err(),
        JudgeError::InvalidRequest(_)
    ));
}

/// Deleting twice never raises an error the second time.
#[tokio::test]
async fn test_delete_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/submissions/tok-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/submissions/tok-3"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.delete("tok-3").await.expect("first delete failed");
    client.delete("tok-3").await.expect("second delete must be a no-op");
}

#[tokio::test]
async fn test_is_available_true_on_ok() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "version": "1.13.0"
        })))
        .mount(&server)
        .await;

    assert!(test_client(&server).is_available().await);
}

#[tokio::test]
async fn test_is_available_swallows_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(!test_client(&server).is_available().await);

    let dead = Judge0Client::new(JudgeConfig::default().with_base_url("http://127.0.0.1:1"))
        .expect("failed to build client");
    assert!(!dead.is_available().await);
}

#[tokio::test]
async fn test_submit_carries_limit_fields() {
    let server = MockServer::start().await;

    let request = hello_request().with_limits(ResourceLimits {
        cpu_time_limit: Some(2.5),
        memory_limit: Some(64_000),
    });
    let expected_body = serde_json::to_string(&request).unwrap();

    Mock::given(method("POST"))
        .and(path("/submissions"))
        .and(body_json_string(&expected_body))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(serde_json::json!({"token": "tok"})),
        )
        .mount(&server)
        .await;

    test_client(&server)
        .submit(&request)
        .await
        .expect("submit with limits failed");
}
