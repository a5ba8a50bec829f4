use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use medicine_cell::error::MedicineError;
use medicine_cell::models::MedicineWrite;
use medicine_cell::services::inventory::InventoryService;
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

#[tokio::test]
async fn listing_skips_archived_medicines_by_default() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/medicines"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::medicine_row(1, "Paracetamol", 120),
            MockSupabaseResponses::medicine_row(2, "Amoxicillin", 40),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = InventoryService::new(&config);
    let medicines = service.list(false, None).await.unwrap();

    assert_eq!(medicines.len(), 2);
    assert_eq!(medicines[0].name, "Paracetamol");
}

#[tokio::test]
async fn unknown_medicine_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/medicines"))
        .and(query_param("id", "eq.99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = InventoryService::new(&config);
    let result = service.get(99, None).await;

    assert_matches!(result, Err(MedicineError::NotFound(99)));
}

#[tokio::test]
async fn blank_search_returns_nothing_without_a_request() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let service = InventoryService::new(&config);
    let medicines = service.search("   ", None).await.unwrap();

    assert!(medicines.is_empty());
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn search_wraps_the_query_in_ilike_wildcards() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("GET"))
        .and(path("/rest/v1/medicines"))
        .and(query_param("name", "ilike.*para*"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::medicine_row(1, "Paracetamol", 120)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = InventoryService::new(&config);
    let medicines = service.search("para", None).await.unwrap();

    assert_eq!(medicines.len(), 1);
}

#[tokio::test]
async fn creating_requires_a_name_and_non_negative_stock() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    let service = InventoryService::new(&config);

    let nameless = MedicineWrite {
        name: "   ".to_string(),
        dosage_form: None,
        strength: None,
        stocks: Some(10),
        expiration_date: None,
    };
    assert_matches!(
        service.create(&nameless, None).await,
        Err(MedicineError::InvalidInput(_))
    );

    let negative = MedicineWrite {
        name: "Paracetamol".to_string(),
        dosage_form: None,
        strength: None,
        stocks: Some(-5),
        expiration_date: None,
    };
    assert_matches!(
        service.create(&negative, None).await,
        Err(MedicineError::InvalidInput(_))
    );

    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn new_medicines_start_active() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("POST"))
        .and(path("/rest/v1/medicines"))
        .and(body_partial_json(json!({
            "name": "Cetirizine",
            "stocks": 0,
            "is_active": true
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([MockSupabaseResponses::medicine_row(3, "Cetirizine", 0)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = InventoryService::new(&config);
    let request = MedicineWrite {
        name: "Cetirizine  ".to_string(),
        dosage_form: Some("Tablet".to_string()),
        strength: Some("10 mg".to_string()),
        stocks: None,
        expiration_date: None,
    };
    let medicine = service.create(&request, None).await.unwrap();

    assert_eq!(medicine.id, 3);
    assert!(medicine.is_active);
}

#[tokio::test]
async fn archiving_flips_the_active_flag_instead_of_deleting() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/medicines"))
        .and(query_param("id", "eq.1"))
        .and(body_partial_json(json!({ "is_active": false })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([MockSupabaseResponses::medicine_row(1, "Paracetamol", 120)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = InventoryService::new(&config);
    service.set_archived(1, true, None).await.unwrap();
}
