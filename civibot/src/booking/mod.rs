//! Appointment booking workflow: a one-shot state machine over the records
//! backend, reporting progress and failures through the chat stream.
//!
//! Each state is a precondition for the next; a failed state emits its
//! message pair (explanation + phone fallback) and aborts. No state is
//! retried; the workflow runs once per form submission and is not resumable.

use chrono::Datelike;
use records_client::{NewAppointment, RecordsClient};
use tracing::{info, instrument, warn};

use crate::session::BotSink;

pub mod matcher;

/// Booking time slots offered by the form.
pub const ALLOWED_TIMES: &[&str] = &["09:00", "10:00", "11:00", "14:00", "15:00", "16:00"];

const ADDRESS_UNAVAILABLE: &str = "Dirección no disponible";
const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";
/// Appended to the department name for the map query when no address resolved.
const MAPS_CITY_QUALIFIER: &str = "Buenos Aires";

/// Input of one booking attempt, as collected by the appointment form.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub dni: String,
    pub department_id: String,
    pub department_name: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`, one of [`ALLOWED_TIMES`].
    pub time: String,
    pub reason: String,
}

impl BookingRequest {
    /// Form-level validation; the error is the user-facing message.
    pub fn validate(&self) -> Result<(), String> {
        if self.dni.len() < 7 || self.dni.len() > 10 || !self.dni.bytes().all(|b| b.is_ascii_digit())
        {
            return Err("Ingresa un DNI válido (7-10 dígitos, solo números).".to_string());
        }
        if self.department_id.trim().is_empty() {
            return Err("Selecciona un departamento.".to_string());
        }
        let Ok(date) = chrono::NaiveDate::parse_from_str(&self.date, "%Y-%m-%d") else {
            return Err("Selecciona una fecha.".to_string());
        };
        if date <= chrono::Utc::now().date_naive() {
            return Err("La fecha debe ser posterior al día de hoy.".to_string());
        }
        if matches!(date.weekday(), chrono::Weekday::Sat | chrono::Weekday::Sun) {
            return Err("Solo se permiten días de lunes a viernes.".to_string());
        }
        if !ALLOWED_TIMES.contains(&self.time.as_str()) {
            return Err(
                "El horario debe ser 09:00, 10:00, 11:00, 14:00, 15:00 o 16:00.".to_string(),
            );
        }
        if self.reason.trim().is_empty() {
            return Err("Indica brevemente el motivo de la consulta.".to_string());
        }
        Ok(())
    }

    /// The appointment instant: date and time combined, e.g.
    /// `2025-03-10T10:00:00.000Z`.
    fn scheduled_at(&self) -> String {
        format!("{}T{}:00.000Z", self.date, self.time)
    }
}

/// Drives the booking transaction. Owns no state between runs; emits every
/// outcome through the session's bot sink.
pub struct BookingWorkflow {
    records: RecordsClient,
    sink: BotSink,
}

impl BookingWorkflow {
    pub fn new(records: RecordsClient, sink: BotSink) -> Self {
        Self { records, sink }
    }

    /// Runs the workflow once. Never returns an error: every failed state
    /// converts to a bot message pair and aborts.
    #[instrument(skip(self, request), fields(department_id = %request.department_id))]
    pub async fn run(&self, request: &BookingRequest) {
        // CitizenLookup
        let citizen = match self.records.get_citizen(&request.dni).await {
            Ok(citizen) => citizen,
            Err(e) => {
                let detail = e.detail_or(
                    "DNI no encontrado. Debes registrarte antes de solicitar turno.",
                );
                self.sink.push(format!("❌ {detail}"));
                self.sink.push(
                    "ℹ️ Puedes registrarte proporcionando tu DNI, nombre y correo en el sistema.",
                );
                return;
            }
        };

        // DepartmentLookup — non-fatal; the address is recovered at
        // composition time from the full listing when this misses.
        let department = match self.records.get_department(&request.department_id).await {
            Ok(department) => Some(department),
            Err(e) => {
                warn!(error = %e, "department lookup failed, continuing without address");
                None
            }
        };

        // ProcedureListing
        let procedures = match self
            .records
            .list_department_procedures(&request.department_id)
            .await
        {
            Ok(procedures) => procedures,
            Err(e) => {
                warn!(error = %e, "procedures fetch failed");
                self.sink.push(
                    "❌ No se pudieron obtener los trámites del departamento seleccionado. Intenta más tarde.",
                );
                self.sink
                    .push("📞 Si necesitas asistencia inmediata, contacta al 4323-9400.");
                return;
            }
        };
        if procedures.is_empty() {
            self.sink.push(
                "ℹ️ El departamento seleccionado no tiene trámites disponibles en este momento.",
            );
            self.sink
                .push("📞 Puedes llamar al 4323-9400 para más información.");
            return;
        }

        // ProcedureSelection — deterministic, no network
        let procedure = matcher::select_procedure(&procedures, &request.reason);
        info!(procedure = %procedure.name, "procedure selected for reason");

        // AppointmentCreation
        let created = match self
            .records
            .create_appointment(&NewAppointment {
                procedure_id: procedure.id.clone(),
                citizen_dni: request.dni.clone(),
                scheduled_at: request.scheduled_at(),
            })
            .await
        {
            Ok(created) => created,
            Err(e) => {
                let detail = e.detail_or("Error desconocido");
                self.sink.push(format!("❌ Error al crear el turno: {detail}"));
                self.sink.push(
                    "📞 Por favor, contacta al 4323-9400 para solicitar tu turno manualmente",
                );
                return;
            }
        };

        // CompositionStep
        let address = match department.and_then(|d| d.address) {
            Some(address) => Some(address),
            None => self.address_from_listing(&request.department_id).await,
        };
        let address_text = address.as_deref().unwrap_or(ADDRESS_UNAVAILABLE);

        self.sink.push(format!(
            "✅ Turno solicitado exitosamente para {}!",
            citizen.full_name()
        ));
        self.sink.push(format!(
            "📋 Detalles: • Trámite: {} • Departamento: {} • Oficina {}: {} • Fecha: {} • Hora: {} • Número de confirmación: #{}",
            procedure.name,
            request.department_name,
            request.department_name,
            address_text,
            request.date,
            request.time,
            created.confirmation_number()
        ));
        self.sink.push(format!(
            "🗺️ Mapa: {}",
            maps_url(address.as_deref(), &request.department_name)
        ));
        self.sink
            .push("📞 Si necesitas reprogramar, contacta al 4323-9400");
    }

    /// Address fallback: the full department list, matched by id.
    async fn address_from_listing(&self, department_id: &str) -> Option<String> {
        match self.records.list_departments().await {
            Ok(departments) => departments
                .into_iter()
                .find(|d| d.id == department_id)
                .and_then(|d| d.address),
            Err(e) => {
                warn!(error = %e, "department list fallback failed");
                None
            }
        }
    }
}

/// Map-search link for the resolved address, or for
/// `"<department> Buenos Aires"` when no address is known.
fn maps_url(address: Option<&str>, department_name: &str) -> String {
    let query = match address {
        Some(address) => address.to_string(),
        None => format!("{department_name} {MAPS_CITY_QUALIFIER}"),
    };
    reqwest::Url::parse_with_params(MAPS_SEARCH_URL, &[("api", "1"), ("query", query.as_str())])
        .map(String::from)
        .unwrap_or_else(|_| MAPS_SEARCH_URL.to_string())
}
