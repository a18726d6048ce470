//! FRED API integration for the 10-year Treasury yield.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::AppError;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const OBS_LIMIT: usize = 10;

/// 10-Year Treasury constant maturity, percent.
pub const SERIES_DGS10: &str = "DGS10";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateObservation {
    pub date: NaiveDate,
    pub rate_bp: f64,
}

pub struct FredClient {
    client: Client,
    api_key: String,
}

impl FredClient {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("FRED_API_KEY")
            .map_err(|_| AppError::new(2, "Missing FRED_API_KEY in environment (.env)."))?;
        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    /// Latest published DGS10 print, in basis points.
    pub fn latest_10y(&self) -> Result<RateObservation, AppError> {
        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("series_id", SERIES_DGS10),
                ("api_key", &self.api_key),
                ("file_type", "json"),
                ("sort_order", "desc"),
                ("limit", &OBS_LIMIT.to_string()),
            ])
            .send()
            .map_err(|e| AppError::new(4, format!("FRED request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("FRED request failed with status {}.", resp.status()),
            ));
        }

        let body: ObservationsResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse FRED response: {e}")))?;

        latest_observation(body)?.ok_or_else(|| {
            AppError::new(4, format!("No observations returned for series {SERIES_DGS10}."))
        })
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

/// Most recent dated print; holidays come back as `"."` and are skipped.
fn latest_observation(body: ObservationsResponse) -> Result<Option<RateObservation>, AppError> {
    let mut latest: Option<RateObservation> = None;
    for obs in body.observations {
        let Some(value) = parse_value(&obs.value) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
            .map_err(|e| AppError::new(4, format!("Invalid FRED date '{}': {e}", obs.date)))?;
        // Treasury yields are published in percent.
        let candidate = RateObservation {
            date,
            rate_bp: value * 100.0,
        };
        if latest.is_none_or(|l| candidate.date > l.date) {
            latest = Some(candidate);
        }
    }
    Ok(latest)
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(raw: &str) -> ObservationsResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn picks_latest_numeric_print() {
        let b = body(
            r#"{"observations":[
                {"date":"2025-07-04","value":"."},
                {"date":"2025-07-03","value":"4.35"},
                {"date":"2025-07-02","value":"4.29"}
            ]}"#,
        );
        let obs = latest_observation(b).unwrap().unwrap();
        assert_eq!(obs.date, NaiveDate::from_ymd_opt(2025, 7, 3).unwrap());
        assert!((obs.rate_bp - 435.0).abs() < 1e-9);
    }

    #[test]
    fn only_holidays_yield_nothing() {
        let b = body(r#"{"observations":[{"date":"2025-12-25","value":"."}]}"#);
        assert!(latest_observation(b).unwrap().is_none());
    }

    #[test]
    fn bad_date_is_an_error() {
        let b = body(r#"{"observations":[{"date":"07/03/2025","value":"4.1"}]}"#);
        assert_eq!(latest_observation(b).unwrap_err().exit_code(), 4);
    }
}
