use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use reqwest::Method;
use serde::Deserialize;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::PatientError;
use crate::models::{ComplaintCount, MonthlyCount, ReportQuery, VisitReport};

const TOP_COMPLAINTS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct VisitRow {
    pub created_at: DateTime<Utc>,
    pub complaint: Option<String>,
}

fn month_label(year: i32, month: u32) -> String {
    let names = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    format!("{} {}", names[(month as usize) - 1], year)
}

/// Aggregate visit rows into per-month counts (chronological) and the most
/// frequent complaints, compared case-insensitively.
pub fn aggregate_visits(rows: &[VisitRow]) -> VisitReport {
    let mut by_month: HashMap<(i32, u32), usize> = HashMap::new();
    let mut by_complaint: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let date = row.created_at.date_naive();
        *by_month.entry((date.year(), date.month())).or_default() += 1;

        if let Some(complaint) = row.complaint.as_deref() {
            let normalized = complaint.trim().to_lowercase();
            if !normalized.is_empty() {
                *by_complaint.entry(normalized).or_default() += 1;
            }
        }
    }

    let mut months: Vec<_> = by_month.into_iter().collect();
    months.sort_by_key(|((year, month), _)| (*year, *month));
    let monthly = months
        .into_iter()
        .map(|((year, month), count)| MonthlyCount {
            month: month_label(year, month),
            count,
        })
        .collect();

    let mut complaints: Vec<_> = by_complaint.into_iter().collect();
    complaints.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    complaints.truncate(TOP_COMPLAINTS);
    let top_complaints = complaints
        .into_iter()
        .map(|(complaint, count)| ComplaintCount { complaint, count })
        .collect();

    VisitReport {
        monthly,
        top_complaints,
    }
}

pub struct ReportService {
    supabase: SupabaseClient,
}

impl ReportService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn visit_report(
        &self,
        query: &ReportQuery,
        auth_token: Option<&str>,
    ) -> Result<VisitReport, PatientError> {
        let mut path = "/rest/v1/queue_entries?select=created_at,complaint".to_string();
        if let Some(start) = query.start {
            path.push_str(&format!("&created_at=gte.{}", day_bound(start)));
        }
        if let Some(end) = query.end {
            // Exclusive upper bound on the day after `end`.
            let next = end.succ_opt().unwrap_or(end);
            path.push_str(&format!("&created_at=lt.{}", day_bound(next)));
        }

        let rows: Vec<VisitRow> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| PatientError::DatabaseError(e.to_string()))?;

        Ok(aggregate_visits(&rows))
    }
}

fn day_bound(day: NaiveDate) -> String {
    day.format("%Y-%m-%dT00:00:00Z").to_string()
}
