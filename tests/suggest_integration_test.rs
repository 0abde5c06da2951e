//! Integration tests for the diff to commit message pipeline.
//!
//! A wiremock server stands in for the tokenizer and inference endpoints so
//! the real HTTP client, routing and assembly run end to end.

mod common;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use commit_autosuggest::diff::{parse_patches, read_diff_file};
use commit_autosuggest::{
    HttpInferenceService, InferenceService, ParseError, ServiceError, assemble_message,
    suggest_messages,
};

use common::{diff_fixture, message_response, read_fixture, whitespace_tokenizer};

async fn mount_tokenizer(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/tokenizer"))
        .respond_with(whitespace_tokenizer)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_mixed_and_added_files_end_to_end() {
    let server = MockServer::start().await;
    mount_tokenizer(&server).await;

    Mock::given(method("POST"))
        .and(path("/diff"))
        .and(body_json(json!({
            "idx": 0,
            "added": ["x=2"],
            "deleted": ["x=1"],
        })))
        .respond_with(message_response(&["update", "x"]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/added"))
        .and(body_json(json!({
            "idx": 1,
            "added": ["print(x)", "exit()"],
            "deleted": [],
        })))
        .respond_with(message_response(&["add", "b"]))
        .expect(1)
        .mount(&server)
        .await;

    let diff = read_diff_file(&diff_fixture("mixed_and_added.diff")).unwrap();
    let patches = parse_patches(&diff).unwrap();
    let service = HttpInferenceService::new(&server.uri()).unwrap();

    let mut progress = Vec::new();
    let suggestions = suggest_messages(&patches, &service, |entry| {
        progress.push((entry.index, entry.path.clone()));
    })
    .await
    .unwrap();

    assert_eq!(
        progress,
        vec![(0, "a.py".to_string()), (1, "b.py".to_string())]
    );
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions.get("a.py").unwrap().message, vec!["update", "x"]);

    let mut echoed = Vec::new();
    let message = assemble_message(&suggestions, 1, |line| echoed.push(line.to_string()));
    assert_eq!(message, "update x\nadd b");
    assert_eq!(echoed, vec!["update x", "add b"]);

    assert_eq!(assemble_message(&suggestions, 2, |_| {}), "update x\n\nadd b");
}

#[tokio::test]
async fn test_deleted_file_goes_to_added_with_empty_key() {
    let server = MockServer::start().await;
    mount_tokenizer(&server).await;

    Mock::given(method("POST"))
        .and(path("/added"))
        .and(body_json(json!({
            "idx": 0,
            "added": [],
            "deleted": ["def", "legacy():", "pass"],
        })))
        .respond_with(message_response(&["remove", "legacy"]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/diff"))
        .respond_with(message_response(&["unexpected"]))
        .expect(0)
        .mount(&server)
        .await;

    let patches = parse_patches(&read_fixture(diff_fixture("deleted_file.diff"))).unwrap();
    let service = HttpInferenceService::new(&server.uri()).unwrap();

    let suggestions = suggest_messages(&patches, &service, |_| {}).await.unwrap();
    assert_eq!(suggestions.get("").unwrap().text(), "remove legacy");
}

#[tokio::test]
async fn test_requests_are_sent_as_utf8_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tokenizer"))
        .and(header("content-type", "application/json; charset=utf-8"))
        .and(body_json(json!({ "code": "let é = 1;" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tokens": ["let", "é"] })))
        .expect(1)
        .mount(&server)
        .await;

    let service = HttpInferenceService::new(&server.uri()).unwrap();
    let tokens = service.tokenize("let é = 1;").await.unwrap();
    assert_eq!(tokens, vec!["let", "é"]);
}

#[tokio::test]
async fn test_extra_response_fields_are_kept_for_verbose_output() {
    let server = MockServer::start().await;
    mount_tokenizer(&server).await;

    Mock::given(method("POST"))
        .and(path("/added"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": ["add", "b"], "score": 0.5 })),
        )
        .mount(&server)
        .await;

    let diff = "--- /dev/null\n+++ b/b.py\n@@ -0,0 +1 @@\n+print(x)\n";
    let patches = parse_patches(diff).unwrap();
    let service = HttpInferenceService::new(&server.uri()).unwrap();

    let suggestions = suggest_messages(&patches, &service, |_| {}).await.unwrap();
    let json = suggestions.to_json_pretty().unwrap();
    assert!(json.contains("\"score\": 0.5"), "verbose output was: {}", json);
    assert!(json.starts_with("{\n    \"b.py\": {"), "verbose output was: {}", json);
}

#[tokio::test]
async fn test_tokenizer_without_tokens_aborts_before_inference() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tokenizer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ids": [1, 2] })))
        .mount(&server)
        .await;

    for route in ["/diff", "/added"] {
        Mock::given(method("POST"))
            .and(path(route))
            .respond_with(message_response(&["unexpected"]))
            .expect(0)
            .mount(&server)
            .await;
    }

    let patches = parse_patches(&read_fixture(diff_fixture("mixed_and_added.diff"))).unwrap();
    let service = HttpInferenceService::new(&server.uri()).unwrap();

    let err = suggest_messages(&patches, &service, |_| {}).await.unwrap_err();
    assert!(
        matches!(err, ServiceError::MalformedResponse { .. }),
        "expected MalformedResponse, got {:?}",
        err
    );
}

#[tokio::test]
async fn test_inference_without_message_is_malformed() {
    let server = MockServer::start().await;
    mount_tokenizer(&server).await;

    Mock::given(method("POST"))
        .and(path("/diff"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let patches = parse_patches(&read_fixture(diff_fixture("mixed_and_added.diff"))).unwrap();
    let service = HttpInferenceService::new(&server.uri()).unwrap();

    let err = suggest_messages(&patches, &service, |_| {}).await.unwrap_err();
    match err {
        ServiceError::MalformedResponse { endpoint, reason } => {
            assert!(endpoint.ends_with("/diff"), "endpoint was {}", endpoint);
            assert!(reason.contains("not json"), "reason was {}", reason);
        }
        other => panic!("expected MalformedResponse, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tokenizer"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let service = HttpInferenceService::new(&server.uri()).unwrap();
    let err = service.tokenize("x = 1").await.unwrap_err();
    assert!(
        matches!(err, ServiceError::BadStatus { status: 503, .. }),
        "expected BadStatus, got {:?}",
        err
    );
}

#[tokio::test]
async fn test_unreachable_service_is_unavailable() {
    // Reserve a free port, then close it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);

    let patches = parse_patches(&read_fixture(diff_fixture("mixed_and_added.diff"))).unwrap();
    let service = HttpInferenceService::new(&uri).unwrap();

    let err = suggest_messages(&patches, &service, |_| {}).await.unwrap_err();
    assert!(
        matches!(err, ServiceError::Unavailable { .. }),
        "expected Unavailable, got {:?}",
        err
    );
}

#[tokio::test]
async fn test_empty_diff_makes_no_requests() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let patches = parse_patches("").unwrap();
    let service = HttpInferenceService::new(&server.uri()).unwrap();

    let suggestions = suggest_messages(&patches, &service, |_| {}).await.unwrap();
    assert!(suggestions.is_empty());
    assert_eq!(assemble_message(&suggestions, 1, |_| {}), "");
}

#[test]
fn test_malformed_diff_fails_before_dispatch() {
    let err = parse_patches(&read_fixture(diff_fixture("malformed.diff"))).unwrap_err();
    assert!(
        matches!(err, ParseError::TruncatedHunk { .. }),
        "expected TruncatedHunk, got {:?}",
        err
    );
}
