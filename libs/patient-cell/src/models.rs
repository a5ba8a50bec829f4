use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: String,
    pub user_id: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub street_address: Option<String>,
    pub barangay: Option<String>,
    pub municipal_city: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        match self.middle_name.as_deref().filter(|m| !m.is_empty()) {
            Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
            None => format!("{} {}", self.first_name, self.last_name),
        }
    }

    /// Completed years as of today; None when the birth date is missing or
    /// malformed.
    pub fn age(&self) -> Option<i32> {
        let dob = NaiveDate::parse_from_str(self.date_of_birth.as_deref()?, "%Y-%m-%d").ok()?;
        let today = Utc::now().date_naive();
        let mut age = today.year() - dob.year();
        if (today.month(), today.day()) < (dob.month(), dob.day()) {
            age -= 1;
        }
        Some(age)
    }
}

/// Summary of one visit, embedded under a patient row by PostgREST.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStamp {
    pub id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub priority_level: Option<String>,
    pub queue_number: Option<i32>,
    pub complaint: Option<String>,
}

/// Patient row with all their visits embedded, as the directory reads it.
#[derive(Debug, Clone, Deserialize)]
pub struct PatientWithVisits {
    #[serde(flatten)]
    pub patient: Patient,
    #[serde(rename = "queue_entries", default)]
    pub visits: Vec<QueueStamp>,
}

impl PatientWithVisits {
    pub fn latest_visit(&self) -> Option<&QueueStamp> {
        self.visits.iter().max_by_key(|v| v.created_at)
    }
}

/// One row of the staff-facing patient directory.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryEntry {
    #[serde(flatten)]
    pub patient: Patient,
    pub age: Option<i32>,
    pub latest_queue: Option<QueueStamp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePatientRequest {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub street_address: Option<String>,
    pub barangay: Option<String>,
    pub municipal_city: Option<String>,
}

impl UpdatePatientRequest {
    /// Only the fields present in the request end up in the PATCH body.
    pub fn patch_body(&self) -> Value {
        let mut body = serde_json::Map::new();
        let mut put = |key: &str, value: &Option<String>| {
            if let Some(v) = value {
                body.insert(key.to_string(), Value::String(v.clone()));
            }
        };
        put("first_name", &self.first_name);
        put("middle_name", &self.middle_name);
        put("last_name", &self.last_name);
        put("email", &self.email);
        put("phone_number", &self.phone_number);
        put("date_of_birth", &self.date_of_birth);
        put("gender", &self.gender);
        put("street_address", &self.street_address);
        put("barangay", &self.barangay);
        put("municipal_city", &self.municipal_city);
        Value::Object(body)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.patch_body(), Value::Object(map) if map.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientSearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub patient: Patient,
    pub age: Option<i32>,
    pub complaint: Option<String>,
}

/// Latest treatment with its related rows flattened out of the PostgREST
/// join shape.
#[derive(Debug, Clone, Serialize)]
pub struct TreatmentSummary {
    pub id: Option<i64>,
    pub treatment_notes: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub diagnoses: Vec<Value>,
    pub prescriptions: Vec<Value>,
}

impl Default for TreatmentSummary {
    fn default() -> Self {
        Self {
            id: None,
            treatment_notes: String::new(),
            created_at: None,
            updated_at: None,
            diagnoses: Vec::new(),
            prescriptions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentHistory {
    pub appointment_date: Option<String>,
    pub status: Option<String>,
    pub doctor_id: Option<String>,
    pub doctor_name: String,
    pub reason: String,
}

/// Everything the patient detail page renders in one response.
#[derive(Debug, Clone, Serialize)]
pub struct PatientInfo {
    pub patient: Patient,
    pub age: Option<i32>,
    pub latest_queue: Option<QueueStamp>,
    pub latest_treatment: TreatmentSummary,
    pub appointments: Vec<AppointmentHistory>,
    pub latest_lab_result: Option<LabResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLabRequestRequest {
    pub patient_id: String,
    pub test_type: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabRequest {
    pub id: i64,
    pub patient_id: String,
    pub test_type: String,
    pub notes: Option<String>,
    pub status: String,
    pub requested_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Upload payload: the image travels base64-encoded in the JSON body, the
/// same shape the frontend already sends for avatars.
#[derive(Debug, Clone, Deserialize)]
pub struct LabResultUpload {
    pub patient_id: String,
    pub lab_request_id: Option<i64>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub image: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabResult {
    pub id: i64,
    pub lab_request_id: Option<i64>,
    pub patient_id: String,
    pub object_path: String,
    pub public_url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplaintCount {
    pub complaint: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitReport {
    pub monthly: Vec<MonthlyCount>,
    pub top_complaints: Vec<ComplaintCount>,
}
