use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::models::{Patient, PatientWithVisits, QueueStamp, UpdatePatientRequest};
use patient_cell::services::patient::{
    annotate_appointments, matches_query, project_directory, summarize_treatment, PatientService,
};
use shared_utils::test_utils::{TestConfig, TestUser};

fn patient(patient_id: &str, first: &str, last: &str) -> Patient {
    Patient {
        patient_id: patient_id.to_string(),
        user_id: None,
        first_name: first.to_string(),
        middle_name: None,
        last_name: last.to_string(),
        email: Some(format!("{}@example.com", first.to_lowercase())),
        phone_number: Some("09171234567".to_string()),
        date_of_birth: Some("1990-06-15".to_string()),
        gender: Some("Female".to_string()),
        street_address: None,
        barangay: None,
        municipal_city: None,
        created_at: None,
    }
}

fn visit(id: i64, status: &str, day: u32, complaint: Option<&str>) -> QueueStamp {
    QueueStamp {
        id,
        status: status.to_string(),
        created_at: Utc.with_ymd_and_hms(2025, 6, day, 8, 0, 0).unwrap(),
        priority_level: Some("Regular".to_string()),
        queue_number: Some(1),
        complaint: complaint.map(str::to_string),
    }
}

#[test]
fn directory_excludes_patients_whose_latest_visit_is_waiting() {
    let rows = vec![
        PatientWithVisits {
            patient: patient("cruz-02000a01", "Maria", "Cruz"),
            visits: vec![visit(1, "Completed", 1, None), visit(2, "Waiting", 2, None)],
        },
        PatientWithVisits {
            patient: patient("reyes-02000a02", "Ana", "Reyes"),
            visits: vec![visit(3, "Waiting", 1, None), visit(4, "Completed", 2, None)],
        },
    ];

    let entries = project_directory(rows, false);

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].patient.patient_id, "reyes-02000a02");
    assert_eq!(entries[0].latest_queue.as_ref().map(|v| v.id), Some(4));
}

#[test]
fn flow_view_keeps_waiting_patients() {
    let rows = vec![PatientWithVisits {
        patient: patient("cruz-02000a01", "Maria", "Cruz"),
        visits: vec![visit(2, "Waiting", 2, None)],
    }];

    let entries = project_directory(rows, true);
    assert_eq!(entries.len(), 1);
}

#[test]
fn directory_deduplicates_by_patient_id() {
    let rows = vec![
        PatientWithVisits {
            patient: patient("cruz-02000a01", "Maria", "Cruz"),
            visits: vec![visit(1, "Completed", 1, None)],
        },
        PatientWithVisits {
            patient: patient("cruz-02000a01", "Maria", "Cruz"),
            visits: vec![visit(1, "Completed", 1, None)],
        },
    ];

    assert_eq!(project_directory(rows, true).len(), 1);
}

#[test]
fn search_matches_names_contacts_and_complaints() {
    let row = PatientWithVisits {
        patient: patient("cruz-02000a01", "Maria", "Cruz"),
        visits: vec![visit(1, "Completed", 1, Some("Persistent cough"))],
    };

    assert!(matches_query(&row, "maria"));
    assert!(matches_query(&row, "CRUZ"));
    assert!(matches_query(&row, "0917"));
    assert!(matches_query(&row, "cough"));
    assert!(!matches_query(&row, "fever"));
}

#[test]
fn treatment_summary_flattens_joined_rows() {
    let row = json!({
        "id": 42,
        "treatment_notes": "Rest and fluids",
        "created_at": "2025-06-01T10:00:00Z",
        "updated_at": "2025-06-01T11:00:00Z",
        "treatment_diagnoses": [
            { "id": 1, "diagnosis_id": 7, "diagnoses": { "id": 7, "diagnosis_description": "Influenza" } },
            { "id": 2, "diagnosis_id": 8, "diagnoses": null }
        ],
        "treatment_prescriptions": [
            { "id": 3, "prescription_id": 9, "prescriptions": { "id": 9, "quantity": 10 } }
        ]
    });

    let summary = summarize_treatment(Some(&row));

    assert_eq!(summary.id, Some(42));
    assert_eq!(summary.treatment_notes, "Rest and fluids");
    assert_eq!(summary.diagnoses.len(), 1);
    assert_eq!(summary.prescriptions.len(), 1);
}

#[test]
fn missing_treatment_yields_an_empty_summary() {
    let summary = summarize_treatment(None);
    assert!(summary.id.is_none());
    assert!(summary.diagnoses.is_empty());
}

#[test]
fn appointments_are_annotated_with_doctor_names_and_reasons() {
    let rows = vec![json!({
        "appointment_date": "2025-06-10",
        "status": "Scheduled",
        "doctor_id": "doc-1",
        "referrals": { "id": 5, "reason": "Follow-up" }
    })];
    let mut names = HashMap::new();
    names.insert("doc-1".to_string(), "Jose Rizal".to_string());

    let annotated = annotate_appointments(&rows, &names);

    assert_eq!(annotated[0].doctor_name, "Jose Rizal");
    assert_eq!(annotated[0].reason, "Follow-up");
}

#[test]
fn empty_update_requests_are_rejected_early() {
    assert!(UpdatePatientRequest::default().is_empty());

    let req = UpdatePatientRequest {
        phone_number: Some("09998887777".to_string()),
        ..Default::default()
    };
    assert!(!req.is_empty());
    assert_eq!(req.patch_body()["phone_number"], "09998887777");
    assert!(req.patch_body().get("email").is_none());
}

#[tokio::test]
async fn on_call_doctor_only_sees_treated_patients() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/treatments"))
        .and(query_param("select", "patient_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "patient_id": "cruz-02000a01" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "patient_id": "cruz-02000a01",
            "user_id": null,
            "first_name": "Maria",
            "middle_name": null,
            "last_name": "Cruz",
            "email": "maria@example.com",
            "phone_number": "09171234567",
            "date_of_birth": "1990-06-15",
            "gender": "Female",
            "street_address": null,
            "barangay": null,
            "municipal_city": null,
            "created_at": null,
            "queue_entries": [{
                "id": 1,
                "status": "Completed",
                "created_at": "2025-06-01T08:00:00Z",
                "priority_level": "Regular",
                "queue_number": 3,
                "complaint": "Fever"
            }]
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let doctor = TestUser::new("oncall@example.com", "on-call-doctor").to_user();
    let service = PatientService::new(&config);
    let entries = service.directory(&doctor, false, None).await.unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].patient.patient_id, "cruz-02000a01");
}

#[tokio::test]
async fn on_call_doctor_with_no_treatments_gets_an_empty_directory() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/treatments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let doctor = TestUser::new("oncall@example.com", "on-call-doctor").to_user();
    let service = PatientService::new(&config);
    let entries = service.directory(&doctor, false, None).await.unwrap();

    assert!(entries.is_empty());
}
