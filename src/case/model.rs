use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Lifecycle state of a repair case.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pending,
    InProgress,
    Resolved,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 3] = [Self::Pending, Self::InProgress, Self::Resolved];

    /// Wire and column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        }
    }

    /// Label printed on documents and in appended notes.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::InProgress => "En Proceso",
            Self::Resolved => "Resuelto",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidStatus(pub String);

impl fmt::Display for InvalidStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid status '{}' (expected pending, in_progress or resolved)",
            self.0
        )
    }
}

impl std::error::Error for InvalidStatus {}

impl FromStr for CaseStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

/// One printer-repair service record.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
pub struct Case {
    #[schema(example = "a1b2c3d4-e5f6-7890-1234-567890abcdef")]
    pub id: Uuid,
    #[schema(example = 42)]
    pub case_number: i64,
    #[schema(example = "HP M404dn")]
    pub reference: String,
    #[schema(example = "Ana Ruiz")]
    pub client_name: String,
    #[schema(example = "123456789")]
    pub client_tax_id: String,
    #[schema(example = "3000000000")]
    pub phone: String,
    pub notes: Option<String>,
    pub intake_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub status: CaseStatus,
    pub status_changed_at: DateTime<Utc>,
    pub resolution_note: Option<String>,
    pub process_note: Option<String>,
}

impl Case {
    /// True when `query` (already lowercased) matches one of the searchable fields.
    pub fn matches_search(&self, query: &str) -> bool {
        [
            self.reference.as_str(),
            self.client_name.as_str(),
            self.client_tax_id.as_str(),
            self.phone.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(query))
            || self.case_number.to_string() == query
    }
}

/// Fields supplied at intake; everything else is defaulted by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCase {
    pub reference: String,
    pub client_name: String,
    pub client_tax_id: String,
    pub phone: String,
    pub notes: Option<String>,
}

/// Field-by-field update merged by the store. Identity, intake time and case
/// number have no slot here and cannot be changed through a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CasePatch {
    pub reference: Option<String>,
    pub client_name: Option<String>,
    pub client_tax_id: Option<String>,
    pub phone: Option<String>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
    pub status: Option<CaseStatus>,
    pub status_changed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub process_note: Option<String>,
    pub resolution_note: Option<String>,
}

impl CasePatch {
    pub fn is_empty(&self) -> bool {
        *self == CasePatch::default()
    }

    pub fn apply_to(self, case: &mut Case) {
        if let Some(reference) = self.reference {
            case.reference = reference;
        }
        if let Some(client_name) = self.client_name {
            case.client_name = client_name;
        }
        if let Some(client_tax_id) = self.client_tax_id {
            case.client_tax_id = client_tax_id;
        }
        if let Some(phone) = self.phone {
            case.phone = phone;
        }
        if let Some(notes) = self.notes {
            case.notes = notes;
        }
        if let Some(status) = self.status {
            case.status = status;
        }
        if let Some(changed_at) = self.status_changed_at {
            case.status_changed_at = changed_at;
        }
        if let Some(delivered_at) = self.delivered_at {
            case.delivered_at = Some(delivered_at);
        }
        if let Some(process_note) = self.process_note {
            case.process_note = Some(process_note);
        }
        if let Some(resolution_note) = self.resolution_note {
            case.resolution_note = Some(resolution_note);
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, ToSchema)]
pub struct CreateCaseRequest {
    #[schema(example = "HP M404dn")]
    pub reference: String,
    #[schema(example = "Ana Ruiz")]
    pub client_name: String,
    #[schema(example = "123456789")]
    pub client_tax_id: String,
    #[schema(example = "3000000000")]
    pub phone: String,
    #[schema(example = "No jala papel de la bandeja 2")]
    #[serde(default)]
    pub notes: Option<String>,
}

/// Edit payload. The identity, intake and status slots exist only so that a
/// request naming them can be rejected instead of silently ignored.
#[derive(Debug, Deserialize, Serialize, Clone, Default, ToSchema)]
pub struct UpdateCaseRequest {
    #[schema(value_type = Option<String>)]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[schema(value_type = Option<i64>)]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub case_number: Option<serde_json::Value>,
    #[schema(value_type = Option<String>)]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub intake_at: Option<serde_json::Value>,
    #[schema(value_type = Option<String>)]
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub status: Option<serde_json::Value>,
    #[schema(example = "HP M404dn (bandeja 2)")]
    pub reference: Option<String>,
    pub client_name: Option<String>,
    pub client_tax_id: Option<String>,
    pub phone: Option<String>,
    /// An empty string clears the notes.
    pub notes: Option<String>,
}

impl UpdateCaseRequest {
    /// Names of locked fields present in the payload, `null` included.
    pub fn locked_fields(&self) -> Vec<&'static str> {
        [
            ("id", self.id.is_some()),
            ("case_number", self.case_number.is_some()),
            ("intake_at", self.intake_at.is_some()),
            ("status", self.status.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }
}

// Distinguishes an explicit `null` from an absent key.
fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize, Serialize, Clone, ToSchema)]
pub struct ChangeStatusRequest {
    #[schema(example = "in_progress")]
    pub status: String,
    #[schema(example = "Cambio de fusor")]
    #[serde(default)]
    pub note: Option<String>,
}

/// Optional narrowing of the case list.
#[derive(Debug, Deserialize, Clone, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CaseFilter {
    /// Only cases in this status (`pending`, `in_progress`, `resolved`).
    pub status: Option<String>,
    /// Case-insensitive search over reference, client, tax id, phone and case number.
    pub q: Option<String>,
}
