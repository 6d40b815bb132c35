//! Integration tests for [`command_handlers::CommandChain`] and the fixed command set.
//!
//! Covers: each command producing exactly one locally-generated bot message,
//! zero network calls for the static commands, FAQ menu buttons, the
//! procedures listing (success, empty, failure), and free text falling
//! through the chain.

use std::sync::Arc;

use civi_core::{CommandOutcome, ChatMessage};
use command_handlers::{
    CommandChain, ContactInfoHandler, EmergencyHandler, FaqMenuHandler, ProcedureListHandler,
    CMD_ASK_FAQ, CMD_CONTACT_INFO, CMD_LIST_PROCEDURES, CMD_REPORT_EMERGENCY,
};
use records_client::RecordsClient;

const BOT_NAME: &str = "CiviBot";

fn full_chain(records: RecordsClient) -> CommandChain {
    CommandChain::new()
        .add_handler(Arc::new(ContactInfoHandler::new(BOT_NAME)))
        .add_handler(Arc::new(EmergencyHandler::new(BOT_NAME)))
        .add_handler(Arc::new(FaqMenuHandler::new(BOT_NAME)))
        .add_handler(Arc::new(ProcedureListHandler::new(BOT_NAME, records)))
}

fn expect_single_reply(outcome: CommandOutcome) -> ChatMessage {
    match outcome {
        CommandOutcome::Reply(mut messages) => {
            assert_eq!(messages.len(), 1, "expected exactly one synthetic message");
            messages.remove(0)
        }
        CommandOutcome::Continue => panic!("command was not intercepted"),
    }
}

/// **Test: static commands answer locally with one bot message and no network call.**
#[tokio::test]
async fn test_static_commands_answer_locally() {
    let mut server = mockito::Server::new_async().await;
    let guard = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let chain = full_chain(RecordsClient::new(server.url()));

    for command in [CMD_CONTACT_INFO, CMD_REPORT_EMERGENCY, CMD_ASK_FAQ] {
        let message = expect_single_reply(chain.handle(command).await.unwrap());
        assert_eq!(message.author.name, BOT_NAME);
        assert!(!message.content.is_empty());
    }

    guard.assert_async().await;
}

/// **Test: contact and emergency replies carry the fixed copy (phone 4323-9400, 911).**
#[tokio::test]
async fn test_canned_reply_content() {
    let server = mockito::Server::new_async().await;
    let chain = full_chain(RecordsClient::new(server.url()));

    let contact = expect_single_reply(chain.handle(CMD_CONTACT_INFO).await.unwrap());
    assert!(contact.content.contains("4323-9400"));
    assert!(contact.buttons.is_empty());

    let emergency = expect_single_reply(chain.handle(CMD_REPORT_EMERGENCY).await.unwrap());
    assert!(emergency.content.contains("911"));
}

/// **Test: FAQ menu carries three buttons whose payloads embed process_category.**
#[tokio::test]
async fn test_faq_menu_buttons() {
    let server = mockito::Server::new_async().await;
    let chain = full_chain(RecordsClient::new(server.url()));

    let menu = expect_single_reply(chain.handle(CMD_ASK_FAQ).await.unwrap());
    assert_eq!(menu.buttons.len(), 3);
    let licencia = &menu.buttons[1];
    assert_eq!(licencia.title, "Licencia de Conducir");
    assert!(licencia.payload.starts_with("/faq_gcba"));
    assert!(licencia
        .payload
        .contains("\"process_category\":\"Licencias de Conducir\""));
}

/// **Test: /list_procedures_ui lists up to 8 procedures, annotated with departments.**
#[tokio::test]
async fn test_list_procedures_caps_at_eight() {
    let mut server = mockito::Server::new_async().await;
    let rows: Vec<String> = (1..=10)
        .map(|i| format!(r#"{{"id":{i},"name":"Trámite {i}","departments":{{"name":"Depto"}}}}"#))
        .collect();
    let _m = server
        .mock("GET", "/procedures")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!("[{}]", rows.join(",")))
        .create_async()
        .await;

    let chain = full_chain(RecordsClient::new(server.url()));
    let message = expect_single_reply(chain.handle(CMD_LIST_PROCEDURES).await.unwrap());

    assert!(message.content.starts_with("Podés solicitar turno para:"));
    assert_eq!(message.content.matches('•').count(), 8);
    assert!(message.content.contains("Trámite 1 — Depto"));
    assert!(!message.content.contains("Trámite 9"));
}

/// **Test: empty and failing procedure listings degrade to fixed copy, never an error.**
#[tokio::test]
async fn test_list_procedures_empty_and_failure() {
    let mut server = mockito::Server::new_async().await;
    let empty = server
        .mock("GET", "/procedures")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let chain = full_chain(RecordsClient::new(server.url()));
    let message = expect_single_reply(chain.handle(CMD_LIST_PROCEDURES).await.unwrap());
    assert_eq!(message.content, "No hay trámites disponibles por ahora.");
    empty.assert_async().await;

    let mut failing_server = mockito::Server::new_async().await;
    let _failing = failing_server
        .mock("GET", "/procedures")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;
    let chain = full_chain(RecordsClient::new(failing_server.url()));
    let message = expect_single_reply(chain.handle(CMD_LIST_PROCEDURES).await.unwrap());
    assert_eq!(
        message.content,
        "No pude obtener los trámites en este momento. Intenta más tarde."
    );
}

/// **Test: free text and unknown commands fall through as Continue.**
#[tokio::test]
async fn test_unrecognized_content_falls_through() {
    let server = mockito::Server::new_async().await;
    let chain = full_chain(RecordsClient::new(server.url()));

    for content in ["necesito renovar mi licencia", "/greet", "/consult_appointment"] {
        assert_eq!(
            chain.handle(content).await.unwrap(),
            CommandOutcome::Continue,
            "{content} should not be intercepted"
        );
    }
}
