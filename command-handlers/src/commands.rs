//! The fixed local command set and its canned replies.
//!
//! Reply copy is user-facing Spanish; every handler produces exactly one
//! bot-authored message and never appends to the store itself.

use async_trait::async_trait;
use civi_core::{Button, ChatMessage, CommandHandler, CommandOutcome, Result};
use records_client::RecordsClient;
use tracing::warn;

pub const CMD_GREET: &str = "/greet";
pub const CMD_CONTACT_INFO: &str = "/request_contact_info";
pub const CMD_REPORT_EMERGENCY: &str = "/report_emergency";
pub const CMD_ASK_FAQ: &str = "/ask_faq";
pub const CMD_LIST_PROCEDURES: &str = "/list_procedures_ui";

/// FAQ-category payloads start with this intent; the dispatcher gives them an
/// extended budget and a transient placeholder.
pub const FAQ_CATEGORY_PREFIX: &str = "/faq_gcba";

const CONTACT_INFO_TEXT: &str = "📞 Información de Contacto:\n\n• Teléfono: 4323-9400\n• Email: info@buenosaires.gob.ar\n• Dirección: Av. de Mayo 525, CABA\n• Horario: Lunes a Viernes 8:00-18:00";

const EMERGENCY_TEXT: &str = "🚨 Contactos de Emergencia:\n\n• Policía: 911\n• SAME (Emergencias Médicas): 107\n• Bomberos: 100\n• Defensa Civil: 103\n• Violencia de Género: 144";

const NO_PROCEDURES_TEXT: &str = "No hay trámites disponibles por ahora.";
const PROCEDURES_UNAVAILABLE_TEXT: &str =
    "No pude obtener los trámites en este momento. Intenta más tarde.";

/// At most this many procedures are listed in one message.
const MAX_LISTED_PROCEDURES: usize = 8;

/// `/request_contact_info` → static contact card.
pub struct ContactInfoHandler {
    bot_name: String,
}

impl ContactInfoHandler {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
        }
    }
}

#[async_trait]
impl CommandHandler for ContactInfoHandler {
    async fn handle(&self, content: &str) -> Result<CommandOutcome> {
        if content != CMD_CONTACT_INFO {
            return Ok(CommandOutcome::Continue);
        }
        Ok(CommandOutcome::Reply(vec![ChatMessage::from_bot(
            &self.bot_name,
            CONTACT_INFO_TEXT,
        )]))
    }
}

/// `/report_emergency` → static emergency numbers.
pub struct EmergencyHandler {
    bot_name: String,
}

impl EmergencyHandler {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
        }
    }
}

#[async_trait]
impl CommandHandler for EmergencyHandler {
    async fn handle(&self, content: &str) -> Result<CommandOutcome> {
        if content != CMD_REPORT_EMERGENCY {
            return Ok(CommandOutcome::Continue);
        }
        Ok(CommandOutcome::Reply(vec![ChatMessage::from_bot(
            &self.bot_name,
            EMERGENCY_TEXT,
        )]))
    }
}

/// `/ask_faq` → FAQ menu plus three category buttons whose payloads embed the
/// `process_category` entity so the assistant answers deterministically.
pub struct FaqMenuHandler {
    bot_name: String,
}

impl FaqMenuHandler {
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
        }
    }

    fn menu_text() -> String {
        [
            "📄 Trámites frecuentes:",
            "",
            "• Cómo cambio el domicilio en mi DNI?",
            "• Licencia de Conducir",
            "• Cómo saco turno en un Centro de Salud (CeSAC)?",
            "",
            "Seleccioná una opción:",
        ]
        .join("\n")
    }

    fn menu_buttons() -> Vec<Button> {
        vec![
            Button {
                title: "Solicitud de DNI".to_string(),
                payload: format!(
                    "{}{{\"process_category\":\"Registro Civil y DNI\"}}",
                    FAQ_CATEGORY_PREFIX
                ),
            },
            Button {
                title: "Licencia de Conducir".to_string(),
                payload: format!(
                    "{}{{\"process_category\":\"Licencias de Conducir\"}}",
                    FAQ_CATEGORY_PREFIX
                ),
            },
            Button {
                title: "CeSAC".to_string(),
                payload: format!("{}{{\"process_category\":\"Salud\"}}", FAQ_CATEGORY_PREFIX),
            },
        ]
    }
}

#[async_trait]
impl CommandHandler for FaqMenuHandler {
    async fn handle(&self, content: &str) -> Result<CommandOutcome> {
        if content != CMD_ASK_FAQ {
            return Ok(CommandOutcome::Continue);
        }
        let message = ChatMessage::from_bot(&self.bot_name, Self::menu_text())
            .with_buttons(Self::menu_buttons());
        Ok(CommandOutcome::Reply(vec![message]))
    }
}

/// `/list_procedures_ui` → queries the global procedures listing and formats
/// up to eight entries, each annotated with its department when known.
/// Failures degrade to a fixed apology; this handler never errors.
pub struct ProcedureListHandler {
    bot_name: String,
    records: RecordsClient,
}

impl ProcedureListHandler {
    pub fn new(bot_name: impl Into<String>, records: RecordsClient) -> Self {
        Self {
            bot_name: bot_name.into(),
            records,
        }
    }
}

#[async_trait]
impl CommandHandler for ProcedureListHandler {
    async fn handle(&self, content: &str) -> Result<CommandOutcome> {
        if content != CMD_LIST_PROCEDURES {
            return Ok(CommandOutcome::Continue);
        }

        let text = match self.records.list_procedures().await {
            Ok(listing) if !listing.is_empty() => {
                let mut lines = vec!["Podés solicitar turno para:".to_string()];
                for row in listing.iter().take(MAX_LISTED_PROCEDURES) {
                    match &row.department {
                        Some(dept) => lines.push(format!("• {} — {}", row.name, dept.name)),
                        None => lines.push(format!("• {}", row.name)),
                    }
                }
                lines.join("\n")
            }
            Ok(_) => NO_PROCEDURES_TEXT.to_string(),
            Err(e) => {
                warn!(error = %e, "procedures listing unavailable");
                PROCEDURES_UNAVAILABLE_TEXT.to_string()
            }
        };

        Ok(CommandOutcome::Reply(vec![ChatMessage::from_bot(
            &self.bot_name,
            text,
        )]))
    }
}
