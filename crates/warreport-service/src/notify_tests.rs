//! Tests for notification publishing.

use super::*;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_webhook_posts_the_slack_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/T000/B000"))
        .and(body_json(serde_json::json!({"text": "Battle in E1N1"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(
        format!("{}/services/T000/B000", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();

    notifier.publish("Battle in E1N1").await.unwrap();
}

#[tokio::test]
async fn test_non_200_answer_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(server.uri(), Duration::from_secs(5)).unwrap();

    let error = notifier.publish("Battle in E1N1").await.unwrap_err();
    assert!(matches!(error, NotifyError::Http { status: 500 }));
}

#[tokio::test]
async fn test_log_notifier_always_succeeds() {
    LogNotifier.publish("Battle in E1N1").await.unwrap();
}
