//! # Municipal-records client
//!
//! Thin typed client over the records proxy: citizens, departments,
//! procedures, and appointment creation. Every non-2xx or malformed response
//! maps to [`RecordsError`], never a panic; list endpoints coerce anything
//! that is not an array to "no data".

use thiserror::Error;
use tracing::{debug, instrument, warn};

mod types;

pub use types::{
    Appointment, Citizen, Department, DepartmentRef, NewAppointment, Procedure, ProcedureListing,
};

#[derive(Error, Debug)]
pub enum RecordsError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream status {status}")]
    Upstream { status: u16, detail: Option<String> },

    #[error("malformed response body: {0}")]
    Decode(String),
}

impl RecordsError {
    /// Human-readable detail for user-facing messages: the upstream `detail`
    /// when one was provided, otherwise `fallback`.
    pub fn detail_or(&self, fallback: &str) -> String {
        match self {
            RecordsError::Upstream {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Pulls the upstream error detail out of a proxy error envelope
/// (`{error, status?, body?}`), a raw backend error (`{detail}`), or the
/// envelope's own `error` label, in that order of preference.
fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/body/detail")
        .or_else(|| value.pointer("/detail"))
        .or_else(|| value.pointer("/error"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Deserializes a JSON array of `T`; anything else (null, object, malformed
/// elements) is "no data". The array check happens here, once.
fn coerce_array<T: serde::de::DeserializeOwned>(body: &str) -> Vec<T> {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        Ok(other) => {
            warn!(got = %other, "expected array from records backend, treating as empty");
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "malformed array body from records backend, treating as empty");
            Vec::new()
        }
    }
}

/// Client for the municipal-records proxy. Cheap to clone; reuses one
/// `reqwest::Client` for all calls.
#[derive(Clone)]
pub struct RecordsClient {
    client: reqwest::Client,
    base_url: String,
}

impl RecordsClient {
    /// Builds a client for the given proxy base URL (e.g. `http://localhost:8000/api/v1`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Builds a client reusing an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_text(&self, url: &str) -> Result<String, RecordsError> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        debug!(url = %url, status = status.as_u16(), "records GET");
        if !status.is_success() {
            return Err(RecordsError::Upstream {
                status: status.as_u16(),
                detail: extract_detail(&body),
            });
        }
        Ok(body)
    }

    /// `GET /citizens/{dni}` — citizen record, or `Upstream` with the
    /// backend's detail when the DNI is unknown.
    #[instrument(skip(self))]
    pub async fn get_citizen(&self, dni: &str) -> Result<Citizen, RecordsError> {
        let body = self
            .get_text(&format!("{}/citizens/{}", self.base_url, dni))
            .await?;
        serde_json::from_str(&body).map_err(|e| RecordsError::Decode(e.to_string()))
    }

    /// `GET /departments` — all departments; non-array bodies yield an empty list.
    #[instrument(skip(self))]
    pub async fn list_departments(&self) -> Result<Vec<Department>, RecordsError> {
        let body = self
            .get_text(&format!("{}/departments", self.base_url))
            .await?;
        Ok(coerce_array(&body))
    }

    /// `GET /departments/{id}` — a single department (address may be absent).
    #[instrument(skip(self))]
    pub async fn get_department(&self, id: &str) -> Result<Department, RecordsError> {
        let body = self
            .get_text(&format!("{}/departments/{}", self.base_url, id))
            .await?;
        serde_json::from_str(&body).map_err(|e| RecordsError::Decode(e.to_string()))
    }

    /// `GET /departments/{id}/procedures` — the department's procedures;
    /// empty array means "no procedures", never null.
    #[instrument(skip(self))]
    pub async fn list_department_procedures(
        &self,
        id: &str,
    ) -> Result<Vec<Procedure>, RecordsError> {
        let body = self
            .get_text(&format!("{}/departments/{}/procedures", self.base_url, id))
            .await?;
        Ok(coerce_array(&body))
    }

    /// `GET /procedures` — global listing with embedded department names,
    /// used by the local procedures command.
    #[instrument(skip(self))]
    pub async fn list_procedures(&self) -> Result<Vec<ProcedureListing>, RecordsError> {
        let body = self
            .get_text(&format!("{}/procedures", self.base_url))
            .await?;
        Ok(coerce_array(&body))
    }

    /// `POST /turnos/` — creates the appointment; non-2xx surfaces the
    /// upstream detail for the user-facing error pair.
    #[instrument(skip(self, appointment), fields(procedure_id = %appointment.procedure_id))]
    pub async fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, RecordsError> {
        let url = format!("{}/turnos/", self.base_url);
        let resp = self.client.post(&url).json(appointment).send().await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        debug!(url = %url, status = status.as_u16(), "records POST");
        if !status.is_success() {
            return Err(RecordsError::Upstream {
                status: status.as_u16(),
                detail: extract_detail(&body),
            });
        }
        serde_json::from_str(&body).map_err(|e| RecordsError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_detail_prefers_envelope_body() {
        let body = r#"{"error":"Citizen lookup failed","status":404,"body":{"detail":"Citizen not found"}}"#;
        assert_eq!(extract_detail(body).as_deref(), Some("Citizen not found"));
    }

    #[test]
    fn test_extract_detail_falls_back_to_detail_then_error() {
        assert_eq!(
            extract_detail(r#"{"detail":"Turno not found"}"#).as_deref(),
            Some("Turno not found")
        );
        assert_eq!(
            extract_detail(r#"{"error":"Proxy request failed"}"#).as_deref(),
            Some("Proxy request failed")
        );
        assert_eq!(extract_detail("not json"), None);
    }

    #[test]
    fn test_coerce_array_tolerates_non_arrays() {
        let rows: Vec<Procedure> = coerce_array(r#"[{"id":1,"name":"Pasaporte"}]"#);
        assert_eq!(rows.len(), 1);

        let none: Vec<Procedure> = coerce_array(r#"{"detail":"oops"}"#);
        assert!(none.is_empty());

        let broken: Vec<Procedure> = coerce_array("<!doctype html>");
        assert!(broken.is_empty());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = RecordsClient::new("http://localhost:8000/api/v1/");
        assert_eq!(client.base_url(), "http://localhost:8000/api/v1");
    }
}
