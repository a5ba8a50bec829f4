use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::MedicineError;
use crate::models::{ForecastResult, Medicine, Prescription};

/// Fraction of zero months above which demand counts as intermittent.
const SPARSITY_THRESHOLD: f64 = 0.7;
/// Smoothing factor for the intermittent-demand estimates.
const CROSTON_ALPHA: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPoint {
    pub month: NaiveDate,
    pub quantity: f64,
}

fn month_of(raw: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()?;
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

fn next_month(month: NaiveDate) -> NaiveDate {
    let (year, m) = if month.month() == 12 {
        (month.year() + 1, 1)
    } else {
        (month.year(), month.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, m, 1).unwrap_or(month)
}

/// Sum prescription quantities per medicine per calendar month. Rows with
/// unparsable dates are skipped; they still count toward the totals.
pub fn build_series(
    prescriptions: &[Prescription],
) -> (HashMap<i64, Vec<MonthlyPoint>>, HashMap<i64, i64>) {
    let mut totals: HashMap<i64, i64> = HashMap::new();
    let mut buckets: HashMap<i64, HashMap<NaiveDate, f64>> = HashMap::new();

    for p in prescriptions {
        *totals.entry(p.medication_id).or_default() += 1;
        if let Some(month) = p.start_date.as_deref().and_then(month_of) {
            *buckets
                .entry(p.medication_id)
                .or_default()
                .entry(month)
                .or_default() += f64::from(p.quantity);
        }
    }

    let series = buckets
        .into_iter()
        .map(|(id, months)| {
            let mut points: Vec<MonthlyPoint> = months
                .into_iter()
                .map(|(month, quantity)| MonthlyPoint { month, quantity })
                .collect();
            points.sort_by_key(|p| p.month);
            (id, points)
        })
        .collect();

    (series, totals)
}

/// Continuous month range from first to last observation, zero-filled where
/// a month saw no prescriptions.
pub fn fill_month_range(points: &[MonthlyPoint]) -> Vec<f64> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };

    let by_month: HashMap<NaiveDate, f64> =
        points.iter().map(|p| (p.month, p.quantity)).collect();

    let mut filled = Vec::new();
    let mut cursor = first.month;
    while cursor <= last.month {
        filled.push(by_month.get(&cursor).copied().unwrap_or(0.0));
        cursor = next_month(cursor);
    }
    filled
}

fn round_at_least_one(value: f64) -> i64 {
    (value.round() as i64).max(1)
}

/// No monthly history at all: estimate from how often the medicine was
/// prescribed over the year.
pub fn frequency_forecast(total_prescriptions: i64) -> Vec<i64> {
    if total_prescriptions == 0 {
        return vec![1, 1, 2];
    }
    let monthly_avg = ((total_prescriptions as f64) / 12.0).round().max(1.0);
    vec![
        round_at_least_one(monthly_avg * 0.9),
        monthly_avg as i64,
        round_at_least_one(monthly_avg * 1.1),
    ]
}

pub fn single_month_forecast(month_quantity: f64) -> Vec<i64> {
    let base = round_at_least_one(month_quantity);
    vec![
        round_at_least_one(base as f64 * 0.95),
        base,
        round_at_least_one(base as f64 * 0.90),
    ]
}

/// Linear trend from two observations, damped as it is projected forward.
pub fn two_month_trend_forecast(first: f64, second: f64) -> Vec<i64> {
    let trend = second - first;
    (1..=3)
        .map(|i| {
            let damped = trend * (0.8 - ((i - 1) as f64) * 0.2);
            round_at_least_one(second + damped * (i as f64))
        })
        .collect()
}

pub fn sparsity(filled: &[f64]) -> f64 {
    if filled.is_empty() {
        return 1.0;
    }
    let zeros = filled.iter().filter(|&&q| q == 0.0).count();
    (zeros as f64) / (filled.len() as f64)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / (values.len() as f64)
    }
}

fn trend_fallback(filled: &[f64]) -> Vec<i64> {
    let base = round_at_least_one(mean(filled));
    vec![(base - 1).max(1), base, base + 1]
}

fn spread_if_flat(forecast: Vec<i64>) -> (Vec<i64>, bool) {
    let flat = forecast.windows(2).all(|w| w[0] == w[1]);
    if flat && forecast.first().copied().unwrap_or(0) > 0 {
        let base = forecast[0];
        (vec![(base - 1).max(1), base, base + 1], true)
    } else {
        (forecast, false)
    }
}

/// Croston's classic method: exponentially smoothed demand size divided by
/// exponentially smoothed inter-demand interval, projected flat over the
/// horizon.
pub fn croston_forecast(filled: &[f64]) -> (Vec<i64>, String) {
    let non_zero = filled.iter().filter(|&&q| q > 0.0).count();
    if non_zero < 2 {
        return (trend_fallback(filled), "croston_fallback_trend".to_string());
    }

    let mut size_hat: Option<f64> = None;
    let mut interval_hat: Option<f64> = None;
    let mut since_last = 1.0;

    for &q in filled {
        if q > 0.0 {
            size_hat = Some(match size_hat {
                Some(z) => z + CROSTON_ALPHA * (q - z),
                None => q,
            });
            interval_hat = Some(match interval_hat {
                Some(p) => p + CROSTON_ALPHA * (since_last - p),
                None => since_last,
            });
            since_last = 1.0;
        } else {
            since_last += 1.0;
        }
    }

    let rate = match (size_hat, interval_hat) {
        (Some(z), Some(p)) if p > 0.0 => z / p,
        _ => mean(filled),
    };

    let flat = (rate.round() as i64).max(0);
    let (forecast, _) = spread_if_flat(vec![flat, flat, flat]);
    (forecast, "croston".to_string())
}

/// Regular-demand branch: least-squares trend over the month index, applied
/// iteratively so each projected month feeds the next.
pub fn lag_trend_forecast(filled: &[f64]) -> (Vec<i64>, String) {
    if filled.len() < 3 {
        return (
            trend_fallback(filled),
            "lag_trend_insufficient_data".to_string(),
        );
    }

    let n = filled.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = mean(filled);

    let mut cov = 0.0;
    let mut var = 0.0;
    for (i, &y) in filled.iter().enumerate() {
        let dx = (i as f64) - mean_x;
        cov += dx * (y - mean_y);
        var += dx * dx;
    }
    let slope = if var > 0.0 { cov / var } else { 0.0 };
    let intercept = mean_y - slope * mean_x;

    let forecast: Vec<i64> = (0..3)
        .map(|i| {
            let x = n + (i as f64);
            let predicted = intercept + slope * x;
            (predicted.round() as i64).max(0)
        })
        .collect();

    let (forecast, adjusted) = spread_if_flat(forecast);
    let method = if adjusted { "lag_trend_adjusted" } else { "lag_trend" };
    (forecast, method.to_string())
}

/// Strategy selection by months of history, then by sparsity.
pub fn forecast_series(points: &[MonthlyPoint], total_prescriptions: i64) -> (Vec<i64>, String) {
    match points.len() {
        0 => (
            frequency_forecast(total_prescriptions),
            "frequency_based".to_string(),
        ),
        1 => (
            single_month_forecast(points[0].quantity),
            "single_month_trend".to_string(),
        ),
        2 => (
            two_month_trend_forecast(points[0].quantity, points[1].quantity),
            "two_month_trend".to_string(),
        ),
        _ => {
            let filled = fill_month_range(points);
            if sparsity(&filled) > SPARSITY_THRESHOLD {
                croston_forecast(&filled)
            } else {
                lag_trend_forecast(&filled)
            }
        }
    }
}

pub struct ForecastService {
    supabase: SupabaseClient,
}

impl ForecastService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Demand forecast across the whole inventory, busiest medicines first.
    pub async fn predict(
        &self,
        auth_token: Option<&str>,
    ) -> Result<Vec<ForecastResult>, MedicineError> {
        let medicines: Vec<Medicine> = self
            .supabase
            .request(Method::GET, "/rest/v1/medicines?select=*", auth_token, None)
            .await
            .map_err(|e| MedicineError::DatabaseError(e.to_string()))?;

        let prescriptions: Vec<Prescription> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/prescriptions?select=id,medication_id,quantity,start_date,patient_id",
                auth_token,
                None,
            )
            .await
            .map_err(|e| MedicineError::DatabaseError(e.to_string()))?;

        let names: HashMap<i64, &str> = medicines
            .iter()
            .map(|m| (m.id, m.name.as_str()))
            .collect();

        let (series, totals) = build_series(&prescriptions);

        let mut results: Vec<ForecastResult> = series
            .iter()
            .map(|(&medicine_id, points)| {
                let total = totals.get(&medicine_id).copied().unwrap_or(0);
                let (forecast, method) = forecast_series(points, total);
                debug!(
                    "Forecast for medicine {}: {} months, method {}",
                    medicine_id,
                    points.len(),
                    method
                );
                ForecastResult {
                    medicine_id,
                    name: names
                        .get(&medicine_id)
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| format!("Medicine_{}", medicine_id)),
                    forecast_next_3_months: forecast,
                    method,
                    months_of_data: points.len(),
                    total_prescriptions: total,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.total_prescriptions
                .cmp(&a.total_prescriptions)
                .then_with(|| a.medicine_id.cmp(&b.medicine_id))
        });
        Ok(results)
    }
}
