//! Wire types for the municipal-records backend.
//!
//! The backend is reached through a proxy that normalizes failures into a
//! JSON envelope `{error, status?, body?}`; `body` may itself carry the
//! upstream `{detail}`. Ids arrive as strings or numbers depending on the
//! table, so they are coerced to strings at this boundary.

use serde::{Deserialize, Deserializer, Serialize};

/// Accepts a JSON string or number and yields a string id.
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Citizen record looked up by DNI; used only to format confirmation text.
#[derive(Debug, Clone, Deserialize)]
pub struct Citizen {
    pub dni: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl Citizen {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Administrative unit offering procedures, with a physical office address.
#[derive(Debug, Clone, Deserialize)]
pub struct Department {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// A bookable municipal service within a department.
#[derive(Debug, Clone, Deserialize)]
pub struct Procedure {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
}

/// Department annotation embedded in the global procedures listing.
#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentRef {
    pub name: String,
}

/// One row of the global (unscoped) procedures listing; the backend joins the
/// owning department under the plural `departments` key.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcedureListing {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub name: String,
    #[serde(default, rename = "departments")]
    pub department: Option<DepartmentRef>,
}

/// Appointment creation request body.
#[derive(Debug, Clone, Serialize)]
pub struct NewAppointment {
    pub procedure_id: String,
    pub citizen_dni: String,
    /// ISO-8601 instant, e.g. `2025-03-10T10:00:00.000Z`.
    pub scheduled_at: String,
}

/// Created appointment; only `id` is guaranteed by the backend, the rest is
/// echoed when present.
#[derive(Debug, Clone, Deserialize)]
pub struct Appointment {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub procedure_id: Option<String>,
    #[serde(default)]
    pub citizen_dni: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
}

impl Appointment {
    /// Confirmation number shown to the citizen: first 8 characters of the id.
    pub fn confirmation_number(&self) -> String {
        self.id.chars().take(8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids_coerce_to_strings() {
        let dept: Department = serde_json::from_str(r#"{"id":5,"name":"Licencias"}"#).unwrap();
        assert_eq!(dept.id, "5");
        assert_eq!(dept.address, None);

        let proc: Procedure =
            serde_json::from_str(r#"{"id":"abc-123","name":"Pasaporte"}"#).unwrap();
        assert_eq!(proc.id, "abc-123");
    }

    #[test]
    fn test_listing_carries_optional_department() {
        let row: ProcedureListing = serde_json::from_str(
            r#"{"id":1,"name":"Licencia de Conducir","departments":{"name":"Licencias"}}"#,
        )
        .unwrap();
        assert_eq!(row.department.unwrap().name, "Licencias");

        let bare: ProcedureListing =
            serde_json::from_str(r#"{"id":2,"name":"Pasaporte"}"#).unwrap();
        assert!(bare.department.is_none());
    }

    #[test]
    fn test_confirmation_number_truncates() {
        let appt = Appointment {
            id: "a1b2c3d4-e5f6-7890".to_string(),
            procedure_id: None,
            citizen_dni: None,
            scheduled_at: None,
        };
        assert_eq!(appt.confirmation_number(), "a1b2c3d4");
    }
}
