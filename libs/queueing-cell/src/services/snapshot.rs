use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    DisplayEntry, PatientRef, PriorityLevel, QueueSnapshot, QueueStatus, WaitingEntry,
};

/// Whole years between `dob` and `today`, one less if the birthday has not
/// come around yet this year.
pub fn derive_age(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

fn parse_dob(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn display_entry(row: &WaitingEntry, today: NaiveDate) -> DisplayEntry {
    let (patient_id, first_name, last_name, phone_number, date_of_birth, is_new_patient) =
        match row.patient_ref() {
            PatientRef::Resolved(p) => (
                Some(p.patient_id),
                p.first_name,
                p.last_name,
                p.phone_number,
                p.date_of_birth,
                false,
            ),
            PatientRef::Temporary {
                first_name,
                last_name,
                phone_number,
                date_of_birth,
            } => (None, first_name, last_name, phone_number, date_of_birth, true),
        };

    let age = date_of_birth
        .as_deref()
        .and_then(parse_dob)
        .map(|dob| derive_age(dob, today));

    DisplayEntry {
        id: row.entry.id,
        patient_id,
        first_name,
        last_name,
        phone_number,
        date_of_birth,
        age,
        priority_level: row.entry.priority_level,
        complaint: row.entry.complaint.clone(),
        status: row.entry.status,
        queue_number: row.entry.queue_number,
        position: row.entry.position,
        created_at: row.entry.created_at,
        is_new_patient,
    }
}

fn tier_sort_key(entry: &DisplayEntry) -> (u8, i32, i32, i64) {
    // Explicit positions first (ascending), unpositioned entries after,
    // ordered by queue number; id breaks remaining ties by insertion order.
    match entry.position {
        Some(p) => (0, p, entry.queue_number, entry.id),
        None => (1, 0, entry.queue_number, entry.id),
    }
}

/// Pure projection of waiting rows into the ordered two-tier display view.
/// Calling it twice over the same rows yields identical output.
pub fn project_snapshot(rows: &[WaitingEntry], today: NaiveDate) -> QueueSnapshot {
    let mut priority_queue = Vec::new();
    let mut regular_queue = Vec::new();

    for row in rows {
        if row.entry.status != QueueStatus::Waiting {
            continue;
        }
        let display = display_entry(row, today);
        match display.priority_level {
            PriorityLevel::Priority => priority_queue.push(display),
            PriorityLevel::Regular => regular_queue.push(display),
        }
    }

    priority_queue.sort_by_key(tier_sort_key);
    regular_queue.sort_by_key(tier_sort_key);

    QueueSnapshot {
        priority_current: priority_queue.first().cloned(),
        priority_next1: priority_queue.get(1).cloned(),
        priority_next2: priority_queue.get(2).cloned(),
        regular_current: regular_queue.first().cloned(),
        regular_next1: regular_queue.get(1).cloned(),
        regular_next2: regular_queue.get(2).cloned(),
        priority_queue,
        regular_queue,
    }
}

pub struct SnapshotService {
    supabase: SupabaseClient,
}

impl SnapshotService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Read today's waiting entries fresh and project them. No caching
    /// across calls.
    pub async fn compute_snapshot(&self, auth_token: Option<&str>) -> Result<QueueSnapshot> {
        let today = Utc::now().date_naive();
        let day_start = today.format("%Y-%m-%dT00:00:00Z");
        let day_end = today
            .succ_opt()
            .unwrap_or(today)
            .format("%Y-%m-%dT00:00:00Z");

        let path = format!(
            "/rest/v1/queue_entries?select=*,patients(patient_id,first_name,last_name,phone_number,date_of_birth)&status=eq.Waiting&created_at=gte.{}&created_at=lt.{}",
            day_start, day_end
        );

        let rows: Vec<WaitingEntry> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        debug!("Computing snapshot over {} waiting entries", rows.len());
        Ok(project_snapshot(&rows, today))
    }
}
