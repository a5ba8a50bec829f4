use chrono::{NaiveDate, TimeZone, Utc};

use queueing_cell::models::{
    PatientSummary, PriorityLevel, QueueEntry, QueueStatus, WaitingEntry,
};
use queueing_cell::services::snapshot::{derive_age, project_snapshot};

fn entry(
    id: i64,
    priority_level: PriorityLevel,
    queue_number: i32,
    position: Option<i32>,
    status: QueueStatus,
) -> WaitingEntry {
    WaitingEntry {
        entry: QueueEntry {
            id,
            patient_id: Some(format!("cruz-02000a{:02}", id)),
            temp_first_name: None,
            temp_middle_name: None,
            temp_last_name: None,
            temp_email: None,
            temp_phone_number: None,
            temp_date_of_birth: None,
            temp_gender: None,
            temp_street_address: None,
            temp_barangay: None,
            temp_municipal_city: None,
            is_new_patient: false,
            priority_level,
            complaint: Some("Check-up".to_string()),
            queue_number,
            position,
            status,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        },
        patient: Some(PatientSummary {
            patient_id: format!("cruz-02000a{:02}", id),
            first_name: "Maria".to_string(),
            last_name: "Cruz".to_string(),
            phone_number: Some("09171234567".to_string()),
            date_of_birth: Some("1990-06-15".to_string()),
        }),
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

#[test]
fn age_counts_completed_years_only() {
    let dob = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();
    assert_eq!(derive_age(dob, NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()), 34);
    assert_eq!(derive_age(dob, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), 35);
    assert_eq!(derive_age(dob, NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()), 35);
}

#[test]
fn snapshot_splits_tiers_and_orders_by_queue_number() {
    let rows = vec![
        entry(1, PriorityLevel::Regular, 3, None, QueueStatus::Waiting),
        entry(2, PriorityLevel::Priority, 2, None, QueueStatus::Waiting),
        entry(3, PriorityLevel::Regular, 1, None, QueueStatus::Waiting),
        entry(4, PriorityLevel::Priority, 4, None, QueueStatus::Waiting),
    ];

    let snapshot = project_snapshot(&rows, today());

    let regular: Vec<i64> = snapshot.regular_queue.iter().map(|e| e.id).collect();
    let priority: Vec<i64> = snapshot.priority_queue.iter().map(|e| e.id).collect();
    assert_eq!(regular, vec![3, 1]);
    assert_eq!(priority, vec![2, 4]);
}

#[test]
fn explicit_positions_come_before_unpositioned_entries() {
    let rows = vec![
        entry(1, PriorityLevel::Regular, 1, None, QueueStatus::Waiting),
        entry(2, PriorityLevel::Regular, 5, Some(2), QueueStatus::Waiting),
        entry(3, PriorityLevel::Regular, 9, Some(1), QueueStatus::Waiting),
    ];

    let snapshot = project_snapshot(&rows, today());

    let order: Vec<i64> = snapshot.regular_queue.iter().map(|e| e.id).collect();
    assert_eq!(order, vec![3, 2, 1]);
}

#[test]
fn ties_break_by_insertion_order() {
    // A reused queue number after wraparound must not reorder entries.
    let rows = vec![
        entry(10, PriorityLevel::Regular, 1, None, QueueStatus::Waiting),
        entry(11, PriorityLevel::Regular, 1, None, QueueStatus::Waiting),
    ];

    let snapshot = project_snapshot(&rows, today());

    let order: Vec<i64> = snapshot.regular_queue.iter().map(|e| e.id).collect();
    assert_eq!(order, vec![10, 11]);
}

#[test]
fn non_waiting_entries_are_excluded() {
    let rows = vec![
        entry(1, PriorityLevel::Regular, 1, None, QueueStatus::Waiting),
        entry(2, PriorityLevel::Regular, 2, None, QueueStatus::QueuedForAssessment),
        entry(3, PriorityLevel::Regular, 3, None, QueueStatus::Completed),
    ];

    let snapshot = project_snapshot(&rows, today());

    assert_eq!(snapshot.regular_queue.len(), 1);
    assert_eq!(snapshot.regular_queue[0].id, 1);
}

#[test]
fn head_fields_mirror_the_lists() {
    let rows = vec![
        entry(1, PriorityLevel::Regular, 1, None, QueueStatus::Waiting),
        entry(2, PriorityLevel::Regular, 2, None, QueueStatus::Waiting),
        entry(3, PriorityLevel::Regular, 3, None, QueueStatus::Waiting),
        entry(4, PriorityLevel::Regular, 4, None, QueueStatus::Waiting),
    ];

    let snapshot = project_snapshot(&rows, today());

    assert_eq!(snapshot.regular_current.as_ref().map(|e| e.id), Some(1));
    assert_eq!(snapshot.regular_next1.as_ref().map(|e| e.id), Some(2));
    assert_eq!(snapshot.regular_next2.as_ref().map(|e| e.id), Some(3));
    assert!(snapshot.priority_current.is_none());
}

#[test]
fn projection_is_deterministic() {
    let rows = vec![
        entry(5, PriorityLevel::Priority, 2, None, QueueStatus::Waiting),
        entry(6, PriorityLevel::Regular, 1, Some(1), QueueStatus::Waiting),
    ];

    let first = project_snapshot(&rows, today());
    let second = project_snapshot(&rows, today());
    assert_eq!(first, second);
}

#[test]
fn temporary_entries_display_from_the_temp_bundle() {
    let mut row = entry(7, PriorityLevel::Regular, 1, None, QueueStatus::Waiting);
    row.entry.is_new_patient = true;
    row.entry.patient_id = None;
    row.patient = None;
    row.entry.temp_first_name = Some("Juan".to_string());
    row.entry.temp_last_name = Some("DelaCruz".to_string());
    row.entry.temp_date_of_birth = Some("2000-06-15".to_string());

    let snapshot = project_snapshot(&[row], today());

    let display = &snapshot.regular_queue[0];
    assert_eq!(display.first_name, "Juan");
    assert_eq!(display.last_name, "DelaCruz");
    assert!(display.is_new_patient);
    assert_eq!(display.age, Some(24));
}
