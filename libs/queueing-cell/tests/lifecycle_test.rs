use assert_matches::assert_matches;
use serde_json::json;
use tokio::sync::Mutex;
use wiremock::matchers::{body_partial_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use queueing_cell::error::QueueError;
use queueing_cell::models::{AcceptRequest, PriorityLevel, QueueStatus, RegisterQueueRequest};
use queueing_cell::services::broadcast::QueueBroadcast;
use queueing_cell::services::lifecycle::LifecycleService;
use queueing_cell::services::registration::RegistrationService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

fn accept_request(id: serde_json::Value, action: &str) -> AcceptRequest {
    AcceptRequest {
        queue_entry_id: Some(id),
        action: Some(action.to_string()),
    }
}

fn mount_snapshot_refresh(mock_server: &MockServer) -> impl std::future::Future<Output = ()> + '_ {
    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("status", "eq.Waiting"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
}

#[tokio::test]
async fn invalid_action_is_rejected_before_anything_is_read() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let service = LifecycleService::new(&config, QueueBroadcast::new());
    let result = service
        .advance(&accept_request(json!(5), "discharge"), None)
        .await;

    assert_matches!(result, Err(QueueError::InvalidAction(_)));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn string_and_numeric_entry_ids_are_both_accepted() {
    let req = accept_request(json!("5"), "preliminary");
    assert_eq!(req.entry_id().unwrap(), 5);

    let req = accept_request(json!(5), "preliminary");
    assert_eq!(req.entry_id().unwrap(), 5);

    let req = accept_request(json!("undefined"), "preliminary");
    assert_matches!(req.entry_id(), Err(QueueError::InvalidInput(_)));
}

#[tokio::test]
async fn accepting_a_returning_patient_updates_only_the_status() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::queue_entry_row(5, Some("cruz-02000abc"), "Waiting", 3, "Regular")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("id", "eq.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::queue_entry_row(
                5,
                Some("cruz-02000abc"),
                "Queued for Assessment",
                3,
                "Regular"
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_snapshot_refresh(&mock_server).await;

    let service = LifecycleService::new(&config, QueueBroadcast::new());
    let updated = service
        .advance(&accept_request(json!(5), "preliminary"), None)
        .await
        .unwrap();

    assert_eq!(updated.status, QueueStatus::QueuedForAssessment);
    assert_eq!(updated.patient_id.as_deref(), Some("cruz-02000abc"));
}

#[tokio::test]
async fn accepting_a_new_patient_resolves_identity_and_links_it() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("id", "eq.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::queue_entry_row(9, None, "Waiting", 7, "Regular")
        ])))
        .mount(&mock_server)
        .await;

    // Email check and identifier probes both come back empty.
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a3f1c2d4-0000-0000-0000-000000000000",
            "email": "juan@example.com"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::patient_row("delacruz-02000abc", "Juan", "DelaCruz")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("id", "eq.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::queue_entry_row(
                9,
                Some("delacruz-02000abc"),
                "Ongoing for Laboratory",
                7,
                "Regular"
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_snapshot_refresh(&mock_server).await;

    let service = LifecycleService::new(&config, QueueBroadcast::new());
    let updated = service
        .advance(&accept_request(json!(9), "lab"), None)
        .await
        .unwrap();

    assert_eq!(updated.status, QueueStatus::OngoingForLaboratory);
    assert!(updated.patient_id.is_some());
    assert!(!updated.is_new_patient);
}

#[tokio::test]
async fn failed_link_rolls_the_new_identity_back() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("id", "eq.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::queue_entry_row(9, None, "Waiting", 7, "Regular")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a3f1c2d4-0000-0000-0000-000000000000"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::patient_row("delacruz-02000abc", "Juan", "DelaCruz")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/queue_entries"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path_regex(r"^/auth/v1/admin/users/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = LifecycleService::new(&config, QueueBroadcast::new());
    let result = service.advance(&accept_request(json!(9), "treatment"), None).await;

    assert_matches!(result, Err(QueueError::DatabaseError(_)));
}

#[tokio::test]
async fn completing_targets_the_latest_visit() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("patient_id", "eq.cruz-02000abc"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::queue_entry_row(
                12,
                Some("cruz-02000abc"),
                "Ongoing for Treatment",
                4,
                "Regular"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("id", "eq.12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::queue_entry_row(
                12,
                Some("cruz-02000abc"),
                "Completed",
                4,
                "Regular"
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_snapshot_refresh(&mock_server).await;

    let service = LifecycleService::new(&config, QueueBroadcast::new());
    let updated = service.complete("cruz-02000abc", None).await.unwrap();

    assert_eq!(updated.status, QueueStatus::Completed);
}

#[tokio::test]
async fn saving_a_treatment_moves_the_latest_visit_to_ongoing() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("patient_id", "eq.cruz-02000abc"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::queue_entry_row(
                12,
                Some("cruz-02000abc"),
                "Queued for Treatment",
                4,
                "Regular"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("id", "eq.12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::queue_entry_row(
                12,
                Some("cruz-02000abc"),
                "Ongoing for Treatment",
                4,
                "Regular"
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_snapshot_refresh(&mock_server).await;

    let service = LifecycleService::new(&config, QueueBroadcast::new());
    let updated = service
        .mark_ongoing_treatment("cruz-02000abc", None)
        .await
        .unwrap();

    assert_eq!(updated.status, QueueStatus::OngoingForTreatment);
}

#[tokio::test]
async fn completing_an_unknown_patient_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = LifecycleService::new(&config, QueueBroadcast::new());
    let result = service.complete("nobody-020001", None).await;

    assert_matches!(result, Err(QueueError::EntryNotFound(_)));
}

#[tokio::test]
async fn registering_a_returning_patient_inherits_their_tier() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "patient_id": "cruz-02000abc" }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("select", "priority_level"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "priority_level": "Priority" }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("select", "queue_number"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/queue_entries"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::queue_entry_row(
                30,
                Some("cruz-02000abc"),
                "Waiting",
                1,
                "Priority"
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = RegisterQueueRequest {
        patient_id: Some("cruz-02000abc".to_string()),
        first_name: None,
        middle_name: None,
        last_name: None,
        email: None,
        phone_number: None,
        date_of_birth: None,
        gender: None,
        street_address: None,
        barangay: None,
        municipal_city: None,
        complaint: Some("Fever".to_string()),
        other_complaint: None,
        priority_level: None,
    };

    let service = RegistrationService::new(&config);
    let lock = Mutex::new(());
    let entry = service.register(&request, &lock).await.unwrap();

    assert_eq!(entry.priority_level, PriorityLevel::Priority);
    assert_eq!(entry.queue_number, 1);
    assert_eq!(entry.status, QueueStatus::Waiting);
}

#[tokio::test]
async fn registering_a_walk_in_requires_contact_details() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let request = RegisterQueueRequest {
        patient_id: None,
        first_name: Some("Juan".to_string()),
        middle_name: None,
        last_name: None,
        email: None,
        phone_number: None,
        date_of_birth: None,
        gender: None,
        street_address: None,
        barangay: None,
        municipal_city: None,
        complaint: Some("Fever".to_string()),
        other_complaint: None,
        priority_level: None,
    };

    let service = RegistrationService::new(&config);
    let lock = Mutex::new(());
    let result = service.register(&request, &lock).await;

    assert_matches!(result, Err(QueueError::InvalidInput(_)));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn walk_in_with_a_registered_email_is_rejected_at_intake() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("email", "eq.juan.reyes@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "patient_id": "reyes-02000abc" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = RegisterQueueRequest {
        patient_id: None,
        first_name: Some("Juan".to_string()),
        middle_name: None,
        last_name: Some("Reyes".to_string()),
        email: Some("juan.reyes@example.com".to_string()),
        phone_number: Some("09170000001".to_string()),
        date_of_birth: None,
        gender: None,
        street_address: None,
        barangay: None,
        municipal_city: None,
        complaint: Some("Fever".to_string()),
        other_complaint: None,
        priority_level: None,
    };

    let service = RegistrationService::new(&config);
    let lock = Mutex::new(());
    let result = service.register(&request, &lock).await;

    assert_matches!(result, Err(QueueError::EmailAlreadyRegistered(_)));

    // The rejected registration must not leave an entry behind.
    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/rest/v1/queue_entries"));
}

#[tokio::test]
async fn other_complaint_substitutes_the_free_text() {
    let request = RegisterQueueRequest {
        patient_id: None,
        first_name: None,
        middle_name: None,
        last_name: None,
        email: None,
        phone_number: None,
        date_of_birth: None,
        gender: None,
        street_address: None,
        barangay: None,
        municipal_city: None,
        complaint: Some("Other".to_string()),
        other_complaint: Some("  ringing in ears  ".to_string()),
        priority_level: None,
    };

    assert_eq!(request.resolved_complaint(), "ringing in ears");
}

#[tokio::test]
async fn concurrent_registrations_never_share_a_queue_number() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    // First maximum read sees an empty day, the second sees the entry the
    // first registration inserted.
    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("select", "queue_number"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("select", "queue_number"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "queue_number": 1 }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/queue_entries"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::queue_entry_row(31, None, "Waiting", 1, "Regular")
        ])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let walk_in = RegisterQueueRequest {
        patient_id: None,
        first_name: Some("Juan".to_string()),
        middle_name: None,
        last_name: Some("Reyes".to_string()),
        email: Some("juan.reyes@example.com".to_string()),
        phone_number: Some("09170000001".to_string()),
        date_of_birth: None,
        gender: None,
        street_address: None,
        barangay: None,
        municipal_city: None,
        complaint: Some("Fever".to_string()),
        other_complaint: None,
        priority_level: None,
    };

    let service = RegistrationService::new(&config);
    let lock = Mutex::new(());
    let (first, second) = tokio::join!(
        service.register(&walk_in, &lock),
        service.register(&walk_in, &lock),
    );
    first.unwrap();
    second.unwrap();

    // The lock is held across read-max and insert, so the queue_entries
    // requests must strictly alternate and the inserted numbers must differ.
    let requests: Vec<_> = mock_server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == "/rest/v1/queue_entries")
        .collect();
    let methods: Vec<&str> = requests.iter().map(|r| r.method.as_str()).collect();
    assert_eq!(methods, vec!["GET", "POST", "GET", "POST"]);

    let numbers: Vec<i64> = requests
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["queue_number"].as_i64().unwrap()
        })
        .collect();
    assert_eq!(numbers, vec![1, 2]);
}

fn migraine_entry_row(status: &str, patient_id: Option<&str>) -> serde_json::Value {
    json!({
        "id": 40,
        "patient_id": patient_id,
        "temp_first_name": if patient_id.is_some() { json!(null) } else { json!("Maria") },
        "temp_middle_name": null,
        "temp_last_name": if patient_id.is_some() { json!(null) } else { json!("Santos") },
        "temp_email": if patient_id.is_some() { json!(null) } else { json!("maria.santos@example.com") },
        "temp_phone_number": if patient_id.is_some() { json!(null) } else { json!("09170000002") },
        "temp_date_of_birth": if patient_id.is_some() { json!(null) } else { json!("1998-03-22") },
        "temp_gender": null,
        "temp_street_address": null,
        "temp_barangay": null,
        "temp_municipal_city": null,
        "is_new_patient": patient_id.is_none(),
        "priority_level": "Regular",
        "complaint": "Migraine",
        "queue_number": 1,
        "position": null,
        "status": status,
        "created_at": "2026-08-31T08:00:00Z"
    })
}

#[tokio::test]
async fn free_text_complaint_follows_the_visit_into_treatment() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    // Email check at intake, identity email check and identifier lookups
    // all come back empty.
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("select", "queue_number"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    // The free text must already be substituted when the entry is inserted.
    Mock::given(method("POST"))
        .and(path("/rest/v1/queue_entries"))
        .and(body_partial_json(json!({ "complaint": "Migraine" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([migraine_entry_row("Waiting", None)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("id", "eq.40"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([migraine_entry_row("Waiting", None)])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "b4e2d3c5-0000-0000-0000-000000000000",
            "email": "maria.santos@example.com"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::patient_row("santos-02000abc", "Maria", "Santos")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/queue_entries"))
        .and(body_partial_json(json!({ "status": "Queued for Treatment" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            migraine_entry_row("Queued for Treatment", Some("santos-02000abc"))
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/queue_entries"))
        .and(query_param("patient_id", "eq.santos-02000abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            migraine_entry_row("Queued for Treatment", Some("santos-02000abc"))
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/queue_entries"))
        .and(body_partial_json(json!({ "status": "Ongoing for Treatment" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            migraine_entry_row("Ongoing for Treatment", Some("santos-02000abc"))
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    mount_snapshot_refresh(&mock_server).await;

    let request = RegisterQueueRequest {
        patient_id: None,
        first_name: Some("Maria".to_string()),
        middle_name: None,
        last_name: Some("Santos".to_string()),
        email: Some("maria.santos@example.com".to_string()),
        phone_number: Some("09170000002".to_string()),
        date_of_birth: None,
        gender: None,
        street_address: None,
        barangay: None,
        municipal_city: None,
        complaint: Some("Other".to_string()),
        other_complaint: Some("Migraine".to_string()),
        priority_level: None,
    };

    let registration = RegistrationService::new(&config);
    let lock = Mutex::new(());
    let entry = registration.register(&request, &lock).await.unwrap();
    assert_eq!(entry.complaint.as_deref(), Some("Migraine"));
    assert_eq!(entry.status, QueueStatus::Waiting);

    let lifecycle = LifecycleService::new(&config, QueueBroadcast::new());
    let accepted = lifecycle
        .advance(&accept_request(json!(40), "treatment"), None)
        .await
        .unwrap();
    assert_eq!(accepted.status, QueueStatus::QueuedForTreatment);
    let patient_id = accepted.patient_id.clone().unwrap();

    let ongoing = lifecycle
        .mark_ongoing_treatment(&patient_id, None)
        .await
        .unwrap();
    assert_eq!(ongoing.status, QueueStatus::OngoingForTreatment);
    assert_eq!(ongoing.complaint.as_deref(), Some("Migraine"));
}
