use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{RequestBuilder, StatusCode};
use std::fmt::Debug;

use crate::{
    error::GatewayError,
    model::{Coordinates, CountryProfile, CurrentWeather, RateSeries},
};

pub mod frankfurter;
pub mod open_meteo;
pub mod restcountries;

/// Country metadata lookup by alpha-2 code.
#[async_trait]
pub trait CountryProvider: Send + Sync + Debug {
    async fn fetch_country_profile(&self, code: &str) -> Result<CountryProfile, GatewayError>;
}

/// Historical and current exchange rates.
#[async_trait]
pub trait RateProvider: Send + Sync + Debug {
    async fn fetch_rate_series(
        &self,
        base: &str,
        target: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateSeries, GatewayError>;

    async fn fetch_latest_rate(&self, base: &str, target: &str) -> Result<f64, GatewayError>;
}

/// Current conditions at a location.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current_weather(
        &self,
        at: Coordinates,
        timezone: &str,
    ) -> Result<CurrentWeather, GatewayError>;
}

/// Sends `request` and reads the body, whatever the status.
pub(crate) async fn fetch_text(
    request: RequestBuilder,
    service: &str,
) -> Result<(StatusCode, String), GatewayError> {
    let res = request.send().await.map_err(|err| transport_error(service, err))?;
    let status = res.status();
    let body = res.text().await.map_err(|err| transport_error(service, err))?;

    Ok((status, body))
}

/// Rejects non-2xx responses as provider failures.
pub(crate) fn ensure_success(service: &str, status: StatusCode, body: &str) -> Result<(), GatewayError> {
    if status.is_success() {
        return Ok(());
    }

    Err(GatewayError::Provider(format!(
        "{service} request failed with status {status}: {}",
        truncate_body(body)
    )))
}

fn transport_error(service: &str, err: reqwest::Error) -> GatewayError {
    let msg = format!("Failed to reach {service}: {err}");
    if err.is_timeout() { GatewayError::Provider(msg) } else { GatewayError::Network(msg) }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
