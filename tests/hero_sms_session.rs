//! Session manager driving the Hero SMS client against a mock HTTP server.

#![cfg(feature = "hero-sms")]

use sms_sessions::hero_sms::{HeroSms, HeroSmsProvider};
use sms_sessions::{
    PollStatus, Price, RetryConfig, SessionError, SessionManager, SessionManagerConfig,
    SessionManagerTrait, SessionState, SmsRetryableProvider,
};
use std::time::Duration;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_account(server: &MockServer) {
    Mock::given(method("GET"))
        .and(query_param("action", "getBalance"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ACCESS_BALANCE:12.50"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("action", "getPrices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "73": {"mm": {"cost": 0.2, "count": 1500}}
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("action", "getNumberV2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "activationId": 987654,
            "phoneNumber": "5511955551234",
            "activationCost": 0.2,
            "countryCode": "55",
            "canGetAnotherSms": true
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(query_param("action", "setStatus"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ACCESS_RETRY_GET"))
        .mount(server)
        .await;
}

/// Answer getStatus with each body once, then keep answering with the last.
async fn mount_statuses(server: &MockServer, bodies: &[&str]) {
    let (last, sequence) = bodies.split_last().expect("at least one body");
    for body in sequence {
        Mock::given(method("GET"))
            .and(query_param("action", "getStatus"))
            .respond_with(ResponseTemplate::new(200).set_body_string(*body))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(query_param("action", "getStatus"))
        .respond_with(ResponseTemplate::new(200).set_body_string(*last))
        .mount(server)
        .await;
}

fn manager(server: &MockServer, config: SessionManagerConfig) -> SessionManager<HeroSmsProvider> {
    let client = HeroSms::new(server.uri(), "test_key").unwrap();
    SessionManager::new(HeroSmsProvider::new(client), config)
}

async fn set_status_calls(server: &MockServer, status: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| {
            request
                .url
                .query_pairs()
                .any(|(k, v)| k == "action" && v == "setStatus")
                && request
                    .url
                    .query_pairs()
                    .any(|(k, v)| k == "status" && v == status)
        })
        .count()
}

#[tokio::test]
async fn test_code_delivery_over_http() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    mount_statuses(
        &server,
        &["STATUS_WAIT_CODE", "STATUS_OK:1234", "STATUS_OK:1234", "STATUS_WAIT_RETRY:1234"],
    )
    .await;

    let manager = manager(&server, SessionManagerConfig::default());
    let handle = manager.acquire_default().await.unwrap();
    assert_eq!(handle.session_id.as_str(), "987654");
    assert_eq!(handle.phone_number, "11955551234");
    assert_eq!(handle.price, Price::new(0.2).unwrap());

    let id = handle.session_id;
    assert_eq!(manager.poll(&id).await.unwrap().status, PollStatus::WaitingForCode);

    let report = manager.poll(&id).await.unwrap();
    assert_eq!(report.status, PollStatus::CodeReceived);
    assert_eq!(report.code.unwrap().as_str(), "1234");
    assert_eq!(report.state, Some(SessionState::AwaitingNextCode));

    assert_eq!(manager.poll(&id).await.unwrap().status, PollStatus::WaitingForNewCode);
    assert_eq!(manager.poll(&id).await.unwrap().status, PollStatus::WaitingForNewCode);

    assert_eq!(set_status_calls(&server, "3").await, 1);
    assert_eq!(manager.stats().total_codes_delivered, 1);

    assert!(manager.finish(&id).await.was_active);
    assert_eq!(set_status_calls(&server, "6").await, 1);
}

#[tokio::test]
async fn test_idle_session_is_cancelled_remotely() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    mount_statuses(&server, &["STATUS_WAIT_CODE"]).await;

    let config = SessionManagerConfig::default().with_session_timeout(Duration::from_millis(200));
    let manager = manager(&server, config);
    let id = manager.acquire_default().await.unwrap().session_id;

    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(manager.session(&id).await.is_none());
    assert_eq!(manager.poll(&id).await.unwrap().status, PollStatus::NotFound);
    assert_eq!(set_status_calls(&server, "8").await, 1);
}

#[tokio::test]
async fn test_remote_cancellation_is_reported() {
    let server = MockServer::start().await;
    mount_account(&server).await;
    mount_statuses(&server, &["STATUS_CANCEL"]).await;

    let manager = manager(&server, SessionManagerConfig::default());
    let id = manager.acquire_default().await.unwrap().session_id;

    assert_eq!(manager.poll(&id).await.unwrap().status, PollStatus::Cancelled);
    assert!(!manager.cancel(&id).await.was_active);
    assert_eq!(set_status_calls(&server, "8").await, 0);
}

#[tokio::test]
async fn test_no_numbers_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("action", "getBalance"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ACCESS_BALANCE:12.50"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("action", "getNumberV2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("NO_NUMBERS"))
        .mount(&server)
        .await;

    let manager = manager(&server, SessionManagerConfig::default());
    let err = manager.acquire_default().await.unwrap_err();
    assert!(matches!(err, SessionError::NoNumbersAvailable { .. }));
    assert_eq!(manager.stats().active_count, 0);
}

#[tokio::test]
async fn test_bad_key_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("action", "getBalance"))
        .respond_with(ResponseTemplate::new(200).set_body_string("BAD_KEY"))
        .mount(&server)
        .await;

    let manager = manager(&server, SessionManagerConfig::default());
    let err = manager.acquire_default().await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidCredentials));
}

#[tokio::test]
async fn test_retry_wrapper_rides_out_transient_failures() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("action", "getBalance"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ERROR_SQL"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_account(&server).await;

    let client = HeroSms::new(server.uri(), "test_key").unwrap();
    let retry = RetryConfig::default()
        .with_min_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(5));
    let provider = SmsRetryableProvider::with_config(HeroSmsProvider::new(client), retry);
    let manager = SessionManager::new(provider, SessionManagerConfig::default());

    assert_eq!(manager.balance().await.unwrap(), Price::new(12.5).unwrap());
}
