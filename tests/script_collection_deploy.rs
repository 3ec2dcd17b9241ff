//! Tests for the scriptCollectionDeploy step against a scripted tenant

mod helpers;

use cpi_steps::client::{Auth, HttpError, Method};
use cpi_steps::core::{CommonPipelineEnvironment, SCRIPT_COLLECTION_DEPLOY_STATUS};
use cpi_steps::steps::{
    run_script_collection_deploy, PollPolicy, ScriptCollectionDeployOptions, StepError,
};
use helpers::*;
use std::time::Duration;

fn options() -> ScriptCollectionDeployOptions {
    let mut options = ScriptCollectionDeployOptions::new(service_key(), "Scripts1");
    options.poll = PollPolicy::new(5, Duration::from_secs(3));
    options
}

#[tokio::test(start_paused = true)]
async fn test_deploy_and_wait_for_success() {
    let sender = MockSender::new(vec![
        token_response(),
        respond(202, "task-1"),
        deploy_status("DEPLOYING"),
        deploy_status("DEPLOYING"),
        deploy_status("SUCCESS"),
    ]);
    let mut env = CommonPipelineEnvironment::new();

    run_script_collection_deploy(&options(), &sender, &mut env)
        .await
        .unwrap();

    assert_eq!(env.custom(SCRIPT_COLLECTION_DEPLOY_STATUS), Some("SUCCESS"));
    assert_eq!(sender.remaining(), 0);

    let requests = sender.requests();
    assert_eq!(requests.len(), 5);

    // token request
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(
        requests[0].url,
        format!("{}?grant_type=client_credentials", TOKEN_URL)
    );
    assert!(matches!(requests[0].auth, Some(Auth::Basic { .. })));

    // deploy request
    assert_eq!(requests[1].method, Method::Post);
    assert_eq!(
        requests[1].url,
        format!(
            "{}/api/v1/DeployScriptCollectionDesigntimeArtifact?Id='Scripts1'&Version='Active'",
            HOST
        )
    );
    assert_eq!(requests[1].auth, Some(Auth::Bearer(TOKEN.to_string())));
    assert_eq!(requests[1].header_value("Accept"), Some("application/json"));

    // status requests
    for request in &requests[2..] {
        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.url,
            format!("{}/api/v1/BuildAndDeployStatus(TaskId='task-1')", HOST)
        );
        assert_eq!(request.auth, Some(Auth::Bearer(TOKEN.to_string())));
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_deployment_returns_error_details() {
    let sender = MockSender::new(vec![
        token_response(),
        respond(202, "task-1"),
        deploy_status("DEPLOYING"),
        deploy_status("FAIL"),
        respond(200, "Script 'Main.groovy' could not be compiled"),
    ]);
    let mut env = CommonPipelineEnvironment::new();

    let err = run_script_collection_deploy(&options(), &sender, &mut env)
        .await
        .unwrap_err();

    match &err {
        StepError::DeploymentFailed {
            artifact_id,
            details,
        } => {
            assert_eq!(artifact_id, "Scripts1");
            assert_eq!(details, "Script 'Main.groovy' could not be compiled");
        }
        other => panic!("expected DeploymentFailed, got {:?}", other),
    }
    assert!(err.to_string().contains("could not be compiled"));
    assert!(env.custom(SCRIPT_COLLECTION_DEPLOY_STATUS).is_none());

    let urls = sender.urls();
    assert_eq!(
        urls.last().unwrap(),
        &format!(
            "{}/api/v1/IntegrationRuntimeArtifacts('Scripts1')/ErrorInformation/$value",
            HOST
        )
    );
}

#[tokio::test(start_paused = true)]
async fn test_license_error_is_a_failure() {
    let sender = MockSender::new(vec![
        token_response(),
        respond(202, "task-1"),
        deploy_status("FAIL_ON_LICENSE_ERROR"),
        respond(200, "license exceeded"),
    ]);
    let mut env = CommonPipelineEnvironment::new();

    let err = run_script_collection_deploy(&options(), &sender, &mut env)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StepError::DeploymentFailed { ref details, .. } if details == "license exceeded"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_error_details_request_failing() {
    let sender = MockSender::new(vec![
        token_response(),
        respond(202, "task-1"),
        deploy_status("FAIL"),
        respond(404, "not found"),
    ]);
    let mut env = CommonPipelineEnvironment::new();

    let err = run_script_collection_deploy(&options(), &sender, &mut env)
        .await
        .unwrap_err();
    assert!(matches!(err, StepError::UnexpectedStatus { status: 404, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_polling_gives_up_after_retries() {
    let mut options = options();
    options.poll = PollPolicy::new(3, Duration::from_secs(10));

    let sender = MockSender::new(vec![
        token_response(),
        respond(202, "task-1"),
        deploy_status("DEPLOYING"),
        deploy_status("DEPLOYING"),
        deploy_status("DEPLOYING"),
        deploy_status("SUCCESS"),
    ]);
    let mut env = CommonPipelineEnvironment::new();
    let start = tokio::time::Instant::now();

    let err = run_script_collection_deploy(&options, &sender, &mut env)
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::PollExhausted { attempts: 3 }));
    assert_eq!(sender.request_count(), 5);
    assert_eq!(sender.remaining(), 1);
    assert!(start.elapsed() >= Duration::from_secs(20));
}

#[tokio::test]
async fn test_no_wait_returns_after_accept() {
    let mut options = options();
    options.wait = false;

    let sender = MockSender::new(vec![token_response(), respond(202, "task-1")]);
    let mut env = CommonPipelineEnvironment::new();

    run_script_collection_deploy(&options, &sender, &mut env)
        .await
        .unwrap();

    assert_eq!(sender.request_count(), 2);
    assert_eq!(env.custom(SCRIPT_COLLECTION_DEPLOY_STATUS), Some("ACCEPTED"));
}

#[tokio::test]
async fn test_empty_task_id_does_not_poll() {
    let sender = MockSender::new(vec![token_response(), respond(202, "")]);
    let mut env = CommonPipelineEnvironment::new();

    run_script_collection_deploy(&options(), &sender, &mut env)
        .await
        .unwrap();

    assert_eq!(sender.request_count(), 2);
    assert_eq!(env.custom(SCRIPT_COLLECTION_DEPLOY_STATUS), Some("ACCEPTED"));
}

#[tokio::test]
async fn test_deploy_rejected() {
    let sender = MockSender::new(vec![
        token_response(),
        respond(500, r#"{"error":{"message":"internal"}}"#),
    ]);
    let mut env = CommonPipelineEnvironment::new();

    let err = run_script_collection_deploy(&options(), &sender, &mut env)
        .await
        .unwrap_err();

    match err {
        StepError::UnexpectedStatus {
            status,
            ref body,
            ..
        } => {
            assert_eq!(status, 500);
            assert!(body.contains("internal"));
        }
        ref other => panic!("expected UnexpectedStatus, got {:?}", other),
    }
    assert!(err.to_string().contains("script collection deployment failed"));
}

#[tokio::test(start_paused = true)]
async fn test_status_request_rejected_is_not_retried() {
    let sender = MockSender::new(vec![
        token_response(),
        respond(202, "task-1"),
        respond(500, "runtime unavailable"),
        deploy_status("SUCCESS"),
    ]);
    let mut env = CommonPipelineEnvironment::new();

    let err = run_script_collection_deploy(&options(), &sender, &mut env)
        .await
        .unwrap_err();

    match err {
        StepError::UnexpectedStatus {
            status,
            ref body,
            ..
        } => {
            assert_eq!(status, 500);
            assert_eq!(body, "runtime unavailable");
        }
        ref other => panic!("expected UnexpectedStatus, got {:?}", other),
    }
    assert!(err
        .to_string()
        .contains("failed to get script collection artefact runtime status"));

    // one status request, no retry
    assert_eq!(sender.request_count(), 3);
    assert_eq!(sender.remaining(), 1);
    assert!(env.custom(SCRIPT_COLLECTION_DEPLOY_STATUS).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_quoted_task_id_is_unwrapped() {
    let sender = MockSender::new(vec![
        token_response(),
        respond(202, "\"task-1\"\n"),
        deploy_status("SUCCESS"),
    ]);
    let mut env = CommonPipelineEnvironment::new();

    run_script_collection_deploy(&options(), &sender, &mut env)
        .await
        .unwrap();

    let urls = sender.urls();
    assert_eq!(
        urls[2],
        format!("{}/api/v1/BuildAndDeployStatus(TaskId='task-1')", HOST)
    );
    assert_eq!(env.custom(SCRIPT_COLLECTION_DEPLOY_STATUS), Some("SUCCESS"));
}

#[tokio::test]
async fn test_token_failure_stops_before_deploy() {
    let sender = MockSender::new(vec![respond(401, "bad credentials")]);
    let mut env = CommonPipelineEnvironment::new();

    let err = run_script_collection_deploy(&options(), &sender, &mut env)
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Token(_)));
    assert_eq!(sender.request_count(), 1);
}

#[tokio::test]
async fn test_transport_error_on_deploy() {
    let sender = MockSender::new(vec![
        token_response(),
        Err(HttpError::Transport("connection reset".to_string())),
    ]);
    let mut env = CommonPipelineEnvironment::new();

    let err = run_script_collection_deploy(&options(), &sender, &mut env)
        .await
        .unwrap_err();

    match err {
        StepError::Http { method, ref url, .. } => {
            assert_eq!(method, Method::Post);
            assert!(url.contains("DeployScriptCollectionDesigntimeArtifact"));
        }
        other => panic!("expected Http error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_status_body_without_status_field() {
    let sender = MockSender::new(vec![
        token_response(),
        respond(202, "task-1"),
        respond(200, r#"{"d":{"TaskId":"task-1"}}"#),
    ]);
    let mut env = CommonPipelineEnvironment::new();

    let err = run_script_collection_deploy(&options(), &sender, &mut env)
        .await
        .unwrap_err();
    assert!(matches!(err, StepError::Json(_)));
}

#[tokio::test]
async fn test_unknown_status_is_settled() {
    let sender = MockSender::new(vec![
        token_response(),
        respond(202, "task-1"),
        deploy_status("STOPPED"),
    ]);
    let mut env = CommonPipelineEnvironment::new();

    run_script_collection_deploy(&options(), &sender, &mut env)
        .await
        .unwrap();
    assert_eq!(sender.request_count(), 3);
}

#[tokio::test]
async fn test_invalid_options_send_nothing() {
    let mut options = options();
    options.script_collection_id = String::new();

    let sender = MockSender::new(vec![]);
    let mut env = CommonPipelineEnvironment::new();

    let err = run_script_collection_deploy(&options, &sender, &mut env)
        .await
        .unwrap_err();
    assert!(matches!(err, StepError::Config(_)));
    assert_eq!(sender.request_count(), 0);
}
