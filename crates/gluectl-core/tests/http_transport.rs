//! HTTP transport and invoker tests against a mock service

use std::time::Duration;

use gluectl_core::{
    CoreError, GlueTransport, HttpTransport, InvocationContext, Invoker, Page, TransportConfig,
    TransportError, operations,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::new(TransportConfig::new(server.uri())).unwrap()
}

#[tokio::test]
async fn test_call_sends_target_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", "AWSGlue.GetBlueprint"))
        .and(header("content-type", "application/x-amz-json-1.1"))
        .and(body_json(json!({"Name": "b1"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Blueprint": {"Name": "b1"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server)
        .call("GetBlueprint", &json!({"Name": "b1"}))
        .await
        .unwrap();

    assert_eq!(response, json!({"Blueprint": {"Name": "b1"}}));
}

#[tokio::test]
async fn test_static_headers_and_user_agent_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-team", "data-platform"))
        .and(header("user-agent", gluectl_core::transport::USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let config = TransportConfig::new(server.uri()).with_header("x-team", "data-platform");
    HttpTransport::new(config)
        .unwrap()
        .call("GetCatalogs", &json!({}))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_empty_success_body_decodes_as_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let response = transport(&server)
        .call("DeleteBlueprint", &json!({"Name": "b1"}))
        .await
        .unwrap();
    assert_eq!(response, json!({}));
}

#[tokio::test]
async fn test_service_error_document_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "com.amazonaws.glue#EntityNotFoundException",
            "message": "Blueprint b9 not found"
        })))
        .mount(&server)
        .await;

    let err = transport(&server)
        .call("GetBlueprint", &json!({"Name": "b9"}))
        .await
        .unwrap_err();

    match &err {
        TransportError::Service {
            status,
            code,
            message,
        } => {
            assert_eq!(*status, 400);
            assert_eq!(code, "EntityNotFoundException");
            assert_eq!(message, "Blueprint b9 not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_error_type_header_is_used() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("x-amzn-ErrorType", "ThrottlingException:http://internal/")
                .set_body_json(json!({"Message": "Rate exceeded"})),
        )
        .mount(&server)
        .await;

    let err = transport(&server)
        .call("GetJobs", &json!({}))
        .await
        .unwrap_err();
    assert!(err.is_throttled());
    assert!(err.to_string().contains("Rate exceeded"));
}

#[tokio::test]
async fn test_malformed_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = transport(&server)
        .call("GetJobs", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = TransportConfig::new(server.uri()).with_timeout(Duration::from_millis(100));
    let err = HttpTransport::new(config)
        .unwrap()
        .call("GetJobs", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Timeout(_)), "{err:?}");
}

#[tokio::test]
async fn test_unresolvable_host_is_a_name_resolution_error() {
    let endpoint = "http://glue.does-not-exist.invalid";
    let transport = HttpTransport::new(TransportConfig::new(endpoint)).unwrap();
    let invoker = Invoker::new(transport);

    let mut ctx = InvocationContext::new(operations::find("GetBlueprint").unwrap());
    ctx.bind("Name", "b1").unwrap();

    let mut pages: Vec<Page> = Vec::new();
    let err = invoker
        .invoke(&ctx, &mut pages, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::NameResolution { .. }), "{err:?}");
    assert!(err.to_string().contains(endpoint));
}

#[tokio::test]
async fn test_invoker_follows_marker_pages_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSGlue.DescribeIntegrations"))
        .and(body_json(json!({"MaxRecords": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Integrations": [{"IntegrationName": "i1"}, {"IntegrationName": "i2"}],
            "Marker": "m1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("x-amz-target", "AWSGlue.DescribeIntegrations"))
        .and(body_json(json!({"MaxRecords": 2, "Marker": "m1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Integrations": [{"IntegrationName": "i3"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let invoker = Invoker::new(transport(&server));
    let mut ctx = InvocationContext::new(operations::find("Get-IntegrationList").unwrap());
    ctx.bind_raw("MaxRecord", &["2".to_string()]).unwrap();

    let mut pages: Vec<Page> = Vec::new();
    let summary = invoker
        .invoke(&ctx, &mut pages, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.calls, 2);
    let names: Vec<_> = pages
        .iter()
        .flat_map(|p| p.items.iter())
        .map(|item| item["IntegrationName"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["i1", "i2", "i3"]);
}
