use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QueueError;

/// Statuses a visit passes through. Wire strings match what the frontend
/// and the display clients already consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueStatus {
    Waiting,
    #[serde(rename = "Queued for Assessment")]
    QueuedForAssessment,
    #[serde(rename = "Queued for Treatment")]
    QueuedForTreatment,
    #[serde(rename = "Ongoing for Laboratory")]
    OngoingForLaboratory,
    #[serde(rename = "Ongoing for Treatment")]
    OngoingForTreatment,
    Completed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Waiting => "Waiting",
            QueueStatus::QueuedForAssessment => "Queued for Assessment",
            QueueStatus::QueuedForTreatment => "Queued for Treatment",
            QueueStatus::OngoingForLaboratory => "Ongoing for Laboratory",
            QueueStatus::OngoingForTreatment => "Ongoing for Treatment",
            QueueStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriorityLevel {
    Regular,
    Priority,
}

impl PriorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityLevel::Regular => "Regular",
            PriorityLevel::Priority => "Priority",
        }
    }
}

/// Staff action when accepting a waiting visitor into the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptAction {
    Preliminary,
    Treatment,
    Lab,
}

impl AcceptAction {
    pub fn parse(raw: &str) -> Result<Self, QueueError> {
        match raw {
            "preliminary" => Ok(AcceptAction::Preliminary),
            "treatment" => Ok(AcceptAction::Treatment),
            "lab" => Ok(AcceptAction::Lab),
            other => Err(QueueError::InvalidAction(other.to_string())),
        }
    }

    pub fn target_status(&self) -> QueueStatus {
        match self {
            AcceptAction::Preliminary => QueueStatus::QueuedForAssessment,
            AcceptAction::Treatment => QueueStatus::QueuedForTreatment,
            AcceptAction::Lab => QueueStatus::OngoingForLaboratory,
        }
    }
}

/// One visit occurrence. Exactly one of the patient reference and the
/// temporary bundle is authoritative: `is_new_patient` tells which.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: i64,
    pub patient_id: Option<String>,
    pub temp_first_name: Option<String>,
    pub temp_middle_name: Option<String>,
    pub temp_last_name: Option<String>,
    pub temp_email: Option<String>,
    pub temp_phone_number: Option<String>,
    pub temp_date_of_birth: Option<String>,
    pub temp_gender: Option<String>,
    pub temp_street_address: Option<String>,
    pub temp_barangay: Option<String>,
    pub temp_municipal_city: Option<String>,
    pub is_new_patient: bool,
    pub priority_level: PriorityLevel,
    pub complaint: Option<String>,
    pub queue_number: i32,
    pub position: Option<i32>,
    pub status: QueueStatus,
    pub created_at: DateTime<Utc>,
}

/// The patient columns the snapshot needs, embedded by PostgREST when a
/// queue entry row is fetched with `select=*,patients(...)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<String>,
}

/// Queue entry row joined with its resolved patient, as read for the
/// snapshot projection.
#[derive(Debug, Clone, Deserialize)]
pub struct WaitingEntry {
    #[serde(flatten)]
    pub entry: QueueEntry,
    #[serde(rename = "patients")]
    pub patient: Option<PatientSummary>,
}

/// Identity fields for display, resolved from whichever side of the entry
/// is authoritative. Replaces the original runtime shape-guessing with one
/// explicit variant.
#[derive(Debug, Clone)]
pub enum PatientRef {
    Resolved(PatientSummary),
    Temporary {
        first_name: String,
        last_name: String,
        phone_number: Option<String>,
        date_of_birth: Option<String>,
    },
}

impl WaitingEntry {
    pub fn patient_ref(&self) -> PatientRef {
        match (&self.patient, self.entry.is_new_patient) {
            (Some(patient), false) => PatientRef::Resolved(patient.clone()),
            _ => PatientRef::Temporary {
                first_name: self.entry.temp_first_name.clone().unwrap_or_default(),
                last_name: self.entry.temp_last_name.clone().unwrap_or_default(),
                phone_number: self.entry.temp_phone_number.clone(),
                date_of_birth: self.entry.temp_date_of_birth.clone(),
            },
        }
    }
}

/// One row of the live display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayEntry {
    pub id: i64,
    pub patient_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<String>,
    pub age: Option<i32>,
    pub priority_level: PriorityLevel,
    pub complaint: Option<String>,
    pub status: QueueStatus,
    pub queue_number: i32,
    pub position: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub is_new_patient: bool,
}

/// Ordered view of today's waiting visitors, split by priority tier. The
/// `*_current`/`*_next` fields repeat the head of each list for older
/// display clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub priority_queue: Vec<DisplayEntry>,
    pub regular_queue: Vec<DisplayEntry>,
    pub priority_current: Option<DisplayEntry>,
    pub priority_next1: Option<DisplayEntry>,
    pub priority_next2: Option<DisplayEntry>,
    pub regular_current: Option<DisplayEntry>,
    pub regular_next1: Option<DisplayEntry>,
    pub regular_next2: Option<DisplayEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterQueueRequest {
    /// Present for returning patients; absent for walk-ins without an
    /// account yet.
    pub patient_id: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub street_address: Option<String>,
    pub barangay: Option<String>,
    pub municipal_city: Option<String>,
    pub complaint: Option<String>,
    pub other_complaint: Option<String>,
    pub priority_level: Option<PriorityLevel>,
}

impl RegisterQueueRequest {
    /// Intake substitutes the free-text complaint when the fixed "Other"
    /// category was picked.
    pub fn resolved_complaint(&self) -> String {
        match self.complaint.as_deref() {
            Some("Other") => self
                .other_complaint
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcceptRequest {
    pub queue_entry_id: Option<serde_json::Value>,
    pub action: Option<String>,
}

impl AcceptRequest {
    /// The frontend has been observed to send the id as a number, a numeric
    /// string, or the literal strings "null"/"undefined".
    pub fn entry_id(&self) -> Result<i64, QueueError> {
        let raw = self
            .queue_entry_id
            .as_ref()
            .ok_or_else(|| QueueError::InvalidInput("Missing queue_entry_id in request".to_string()))?;

        match raw {
            serde_json::Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| QueueError::InvalidInput("Invalid queue_entry_id format".to_string())),
            serde_json::Value::String(s) if s != "null" && s != "undefined" => s
                .parse::<i64>()
                .map_err(|_| QueueError::InvalidInput("Invalid queue_entry_id format".to_string())),
            _ => Err(QueueError::InvalidInput("Invalid queue_entry_id format".to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveTreatmentRequest {
    pub patient_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComplaintQuery {
    pub patient_id: Option<String>,
}
