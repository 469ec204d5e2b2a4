use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use test_board::engine::{HttpTestService, RemoteError, TestService};
use test_board::types::{ActionState, BatchId, TestType};

async fn service(server: &MockServer) -> HttpTestService {
    // Trailing slash is trimmed from the base URL.
    HttpTestService::new(&format!("{}/testrunner/", server.uri()), Duration::from_secs(5))
        .expect("client builds")
}

#[tokio::test]
async fn list_tests_parses_catalogue() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/testrunner/tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "java://a.B$testLogin()", "type": "unit"},
            {"name": "js://ui.c.testClick()", "type": "jsTest", "jsConsoleLink": "/c"},
            {"name": "odd()", "type": "perf", "status": "RUNNING"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let tests = service(&server).await.list_tests().await.unwrap();
    assert_eq!(tests.len(), 3);
    assert_eq!(tests[0].test_type, TestType::Unit);
    assert_eq!(tests[1].test_type, TestType::JsTest);
    assert_eq!(tests[1].js_console.as_deref(), Some("/c"));
    assert_eq!(tests[2].test_type, TestType::Unknown);
    assert_eq!(tests[2].status, "RUNNING");
}

#[tokio::test]
async fn submit_posts_batch_and_test_set() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/testrunner/runs"))
        .and(body_json(json!({"batch": 4, "testSet": ["a()", "b()"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "SUCCESS"})))
        .expect(1)
        .mount(&server)
        .await;

    let tests = vec!["a()".to_owned(), "b()".to_owned()];
    let resp = service(&server)
        .await
        .submit_test_set(BatchId(4), &tests)
        .await
        .unwrap();
    assert_eq!(resp.state, ActionState::Success);
}

#[tokio::test]
async fn submit_error_state_is_not_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/testrunner/runs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"state": "ERROR", "error": "runner busy"})),
        )
        .mount(&server)
        .await;

    let resp = service(&server)
        .await
        .submit_test_set(BatchId(1), &["a()".to_owned()])
        .await
        .unwrap();
    assert_eq!(resp.state, ActionState::Error);
    assert_eq!(resp.error.as_deref(), Some("runner busy"));
}

#[tokio::test]
async fn poll_status_sends_batch_and_parses_map() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/testrunner/runs/status"))
        .and(query_param("batch", "9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "SUCCESS",
            "returnValue": {
                "testsWithPropsMap": {
                    "a()": {"status": "PASSED"},
                    "b()": {"status": "FAILED", "exception": "boom\n\tat x"}
                },
                "testsRunning": false
            }
        })))
        .mount(&server)
        .await;

    let resp = service(&server).await.poll_status(BatchId(9)).await.unwrap();
    let status = resp.return_value.unwrap();
    assert!(!status.tests_running);
    assert_eq!(status.tests_with_props_map["a()"].status, "PASSED");
    assert_eq!(
        status.tests_with_props_map["b()"].exception.as_deref(),
        Some("boom\n\tat x")
    );
}

#[tokio::test]
async fn non_success_http_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/testrunner/tests"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
        .mount(&server)
        .await;

    let err = service(&server).await.list_tests().await.unwrap_err();
    match err {
        RemoteError::Status { status, body, url } => {
            assert_eq!(status, 503);
            assert_eq!(body, "down for maintenance");
            assert!(url.ends_with("/testrunner/tests"));
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_an_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/testrunner/tests"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = service(&server).await.list_tests().await.unwrap_err();
    assert!(matches!(err, RemoteError::Http { .. }), "got {err:?}");
}
