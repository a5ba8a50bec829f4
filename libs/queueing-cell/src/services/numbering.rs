use anyhow::Result;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

/// Once the running maximum for a day reaches this cap, numbering restarts
/// at 1. Reuse of `(date, queue_number)` pairs past the cap is accepted.
pub const DAILY_QUEUE_CAP: i32 = 50;

/// Next queue number given the day's current maximum.
pub fn wraparound_next(max_today: Option<i32>) -> i32 {
    match max_today {
        None => 1,
        Some(max) if max >= DAILY_QUEUE_CAP => 1,
        Some(max) => max + 1,
    }
}

pub struct QueueNumbering {
    supabase: SupabaseClient,
}

impl QueueNumbering {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Per-day sequential number with wraparound reset. The date is caller
    /// supplied so the policy stays testable. Callers that must not race
    /// hold the cell's assignment lock across this call and the insert.
    pub async fn next_queue_number(
        &self,
        today: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<i32> {
        let max = self.max_queue_number_for(today, auth_token).await?;
        let next = wraparound_next(max);
        debug!("Queue number for {}: max={:?} next={}", today, max, next);
        Ok(next)
    }

    async fn max_queue_number_for(
        &self,
        today: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Option<i32>> {
        let day_start = today.format("%Y-%m-%dT00:00:00Z");
        let day_end = today
            .succ_opt()
            .unwrap_or(today)
            .format("%Y-%m-%dT00:00:00Z");

        let path = format!(
            "/rest/v1/queue_entries?select=queue_number&created_at=gte.{}&created_at=lt.{}&order=queue_number.desc&limit=1",
            day_start, day_end
        );

        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await?;

        Ok(rows
            .first()
            .and_then(|row| row["queue_number"].as_i64())
            .map(|n| n as i32))
    }
}
