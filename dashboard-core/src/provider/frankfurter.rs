use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::{
    error::GatewayError,
    model::{RatePoint, RateSeries},
    provider::{ensure_success, fetch_text},
};

use super::RateProvider;

const SERVICE: &str = "Frankfurter";

#[derive(Debug, Clone)]
pub struct FrankfurterProvider {
    base_url: String,
    http: Client,
}

impl FrankfurterProvider {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into(), http }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Deserialize)]
struct FkSeriesResponse {
    rates: HashMap<String, HashMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct FkLatestResponse {
    rates: HashMap<String, f64>,
}

/// Parses a time-series body (`{"rates": {"2025-05-01": {"KRW": 1305.0}, ...}}`).
///
/// Days without a quote for `target` are skipped. Output is ascending by date.
pub(crate) fn parse_series(body: &str, base: &str, target: &str) -> Result<RateSeries, GatewayError> {
    let parsed: FkSeriesResponse = serde_json::from_str(body)
        .context("Failed to parse Frankfurter time-series JSON")
        .map_err(GatewayError::provider)?;

    let mut points = Vec::with_capacity(parsed.rates.len());
    for (date, quotes) in parsed.rates {
        let Some(rate) = quotes.get(target).copied() else {
            continue;
        };
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{date}' in Frankfurter time series"))
            .map_err(GatewayError::provider)?;
        points.push(RatePoint { date, rate });
    }

    Ok(RateSeries::new(base, target, points))
}

pub(crate) fn parse_latest(body: &str, target: &str) -> Result<f64, GatewayError> {
    let parsed: FkLatestResponse = serde_json::from_str(body)
        .context("Failed to parse Frankfurter latest JSON")
        .map_err(GatewayError::provider)?;

    parsed
        .rates
        .get(target)
        .copied()
        .ok_or_else(|| GatewayError::provider(anyhow!("Frankfurter latest response has no {target} rate")))
}

/// A currency against itself: one point per calendar day at 1.0.
fn flat_series(base: &str, start: NaiveDate, end: NaiveDate) -> RateSeries {
    let points = start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| RatePoint { date, rate: 1.0 })
        .collect();
    RateSeries::new(base, base, points)
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    async fn fetch_rate_series(
        &self,
        base: &str,
        target: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateSeries, GatewayError> {
        if base.eq_ignore_ascii_case(target) {
            return Ok(flat_series(base, start, end));
        }

        let url = self.url(&format!("{}..{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d")));
        debug!("Frankfurter timeseries URL: {url}?from={base}&to={target}");

        let request = self.http.get(&url).query(&[("from", base), ("to", target)]);
        let (status, body) = fetch_text(request, SERVICE).await?;
        ensure_success(SERVICE, status, &body)?;

        parse_series(&body, base, target)
    }

    async fn fetch_latest_rate(&self, base: &str, target: &str) -> Result<f64, GatewayError> {
        if base.eq_ignore_ascii_case(target) {
            return Ok(1.0);
        }

        let url = self.url("latest");
        debug!("Frankfurter latest URL: {url}?from={base}&to={target}");

        let request = self.http.get(&url).query(&[("from", base), ("to", target)]);
        let (status, body) = fetch_text(request, SERVICE).await?;
        ensure_success(SERVICE, status, &body)?;

        parse_latest(&body, target)
    }
}
