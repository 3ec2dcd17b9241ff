//! Tests for the getPackageList step

mod helpers;

use cpi_steps::client::{Auth, Method};
use cpi_steps::core::{CommonPipelineEnvironment, INTEGRATION_PACKAGE_LIST};
use cpi_steps::steps::{run_get_package_list, GetPackageListOptions, StepError};
use helpers::*;

fn packages_body(ids: &[&str]) -> String {
    let results: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "Id": id,
                "Name": format!("{} package", id),
                "Version": "1.0.0",
            })
        })
        .collect();
    serde_json::json!({ "d": { "results": results } }).to_string()
}

#[tokio::test]
async fn test_lists_all_package_ids() {
    let sender = MockSender::new(vec![
        token_response(),
        respond(200, &packages_body(&["PkgA", "PkgB", "PkgC"])),
    ]);
    let options = GetPackageListOptions::new(service_key());
    let mut env = CommonPipelineEnvironment::new();

    let ids = run_get_package_list(&options, &sender, &mut env).await.unwrap();

    assert_eq!(ids, vec!["PkgA", "PkgB", "PkgC"]);
    assert_eq!(env.custom(INTEGRATION_PACKAGE_LIST), Some("PkgA,PkgB,PkgC"));

    let requests = sender.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].method, Method::Get);
    assert_eq!(requests[1].url, format!("{}/api/v1/IntegrationPackages", HOST));
    assert_eq!(requests[1].auth, Some(Auth::Bearer(TOKEN.to_string())));
}

#[tokio::test]
async fn test_empty_tenant() {
    let sender = MockSender::new(vec![token_response(), respond(200, &packages_body(&[]))]);
    let options = GetPackageListOptions::new(service_key());
    let mut env = CommonPipelineEnvironment::new();

    let ids = run_get_package_list(&options, &sender, &mut env).await.unwrap();

    assert!(ids.is_empty());
    assert_eq!(env.custom(INTEGRATION_PACKAGE_LIST), Some(""));
}

#[tokio::test]
async fn test_server_error() {
    let sender = MockSender::new(vec![token_response(), respond(500, "boom")]);
    let options = GetPackageListOptions::new(service_key());
    let mut env = CommonPipelineEnvironment::new();

    let err = run_get_package_list(&options, &sender, &mut env)
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::UnexpectedStatus { status: 500, .. }));
    assert!(err.to_string().contains("unable to get integration package list"));
    assert!(env.custom(INTEGRATION_PACKAGE_LIST).is_none());
}

#[tokio::test]
async fn test_invalid_json() {
    let sender = MockSender::new(vec![token_response(), respond(200, "<html>login</html>")]);
    let options = GetPackageListOptions::new(service_key());
    let mut env = CommonPipelineEnvironment::new();

    let err = run_get_package_list(&options, &sender, &mut env)
        .await
        .unwrap_err();
    assert!(matches!(err, StepError::Json(_)));
}

#[tokio::test]
async fn test_token_without_access_token() {
    let sender = MockSender::new(vec![respond(200, r#"{"token_type":"bearer"}"#)]);
    let options = GetPackageListOptions::new(service_key());
    let mut env = CommonPipelineEnvironment::new();

    let err = run_get_package_list(&options, &sender, &mut env)
        .await
        .unwrap_err();
    assert!(matches!(err, StepError::Token(_)));
    assert_eq!(sender.request_count(), 1);
}

#[tokio::test]
async fn test_malformed_service_key_sends_nothing() {
    let sender = MockSender::new(vec![]);
    let options = GetPackageListOptions::new(cpi_steps::ServiceKeySource::new(r#"{"oauth": {}}"#));
    let mut env = CommonPipelineEnvironment::new();

    let err = run_get_package_list(&options, &sender, &mut env)
        .await
        .unwrap_err();
    assert!(matches!(err, StepError::ServiceKey(_)));
    assert_eq!(sender.request_count(), 0);
}
