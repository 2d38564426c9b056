use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::GatewayError,
    model::{Coordinates, CurrentWeather},
    provider::{ensure_success, fetch_text},
    weather_code,
};

use super::WeatherProvider;

const SERVICE: &str = "Open-Meteo";

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into(), http }
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature: f64,
    windspeed: f64,
    weathercode: u16,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    current_weather: OmCurrent,
}

pub(crate) fn parse_current(body: &str) -> Result<CurrentWeather, GatewayError> {
    let parsed: OmResponse = serde_json::from_str(body)
        .context("Failed to parse Open-Meteo current weather JSON")
        .map_err(GatewayError::provider)?;

    let cw = parsed.current_weather;
    Ok(CurrentWeather {
        description: weather_code::describe(cw.weathercode).to_string(),
        temperature_celsius: cw.temperature,
        wind_speed: cw.windspeed,
    })
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn fetch_current_weather(
        &self,
        at: Coordinates,
        timezone: &str,
    ) -> Result<CurrentWeather, GatewayError> {
        let url = format!("{}/forecast", self.base_url.trim_end_matches('/'));
        let latitude = at.latitude.to_string();
        let longitude = at.longitude.to_string();
        debug!("Open-Meteo URL: {url}?latitude={latitude}&longitude={longitude}&timezone={timezone}");

        let request = self.http.get(&url).query(&[
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
            ("current_weather", "true"),
            ("windspeed_unit", "ms"),
            ("timezone", timezone),
        ]);
        let (status, body) = fetch_text(request, SERVICE).await?;
        ensure_success(SERVICE, status, &body)?;

        parse_current(&body)
    }
}
