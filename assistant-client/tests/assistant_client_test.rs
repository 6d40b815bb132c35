//! Integration tests for [`assistant_client::AssistantClient`] against a mockito server.
//!
//! Covers: request body shape, reply parsing with buttons, empty array as valid
//! "no reply", non-2xx classification, and timeout classification (slow server
//! against a small budget).

use std::io::Write;
use std::time::Duration;

use assistant_client::{AssistantClient, AssistantError};
use mockito::Matcher;

#[tokio::test]
async fn test_converse_sends_sender_and_message() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/webhooks/rest/webhook")
        .match_body(Matcher::Json(serde_json::json!({
            "sender": "CiviBot-Session-plaza",
            "message": "hola"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"text":"Hola! Soy CiviBot."}]"#)
        .create_async()
        .await;

    let client = AssistantClient::new(format!("{}/webhooks/rest/webhook", server.url()));
    let replies = client
        .converse("CiviBot-Session-plaza", "hola", Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].text.as_deref(), Some("Hola! Soy CiviBot."));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_array_is_valid_no_reply() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/webhooks/rest/webhook")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let client = AssistantClient::new(format!("{}/webhooks/rest/webhook", server.url()));
    let replies = client
        .converse("s1", "/greet", Duration::from_secs(5))
        .await
        .unwrap();
    assert!(replies.is_empty());
}

#[tokio::test]
async fn test_non_2xx_maps_to_status_error() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/webhooks/rest/webhook")
        .with_status(502)
        .with_body("Bad Gateway")
        .create_async()
        .await;

    let client = AssistantClient::new(format!("{}/webhooks/rest/webhook", server.url()));
    let err = client
        .converse("s1", "hola", Duration::from_secs(5))
        .await
        .unwrap_err();
    match err {
        AssistantError::Status(502) => {}
        other => panic!("expected Status(502), got {other:?}"),
    }
    assert!(!err.is_timeout());
}

#[tokio::test]
async fn test_slow_server_classifies_as_timeout() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("POST", "/webhooks/rest/webhook")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(400));
            w.write_all(b"[]")
        })
        .create_async()
        .await;

    let client = AssistantClient::new(format!("{}/webhooks/rest/webhook", server.url()));
    let err = client
        .converse("s1", "/greet", Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {err:?}");
}
