use chrono::{Duration as DayCount, NaiveDate};
use reqwest::Client;
use std::{future::Future, time::Duration};

use crate::{
    config::Config,
    error::GatewayError,
    model::{Coordinates, CountryProfile, CurrentWeather, RateSeries},
    provider::{
        CountryProvider, RateProvider, WeatherProvider, frankfurter::FrankfurterProvider,
        open_meteo::OpenMeteoProvider, restcountries::RestCountriesProvider,
    },
};

/// Length of the exchange-rate window, both ends inclusive.
pub const RATE_WINDOW_DAYS: i64 = 30;

/// `(end - 29 days, end)`.
pub fn trailing_window(end: NaiveDate) -> (NaiveDate, NaiveDate) {
    (end - DayCount::days(RATE_WINDOW_DAYS - 1), end)
}

/// The three remote data sources, each call bounded by `timeout`.
#[derive(Debug)]
pub struct Gateway {
    countries: Box<dyn CountryProvider>,
    rates: Box<dyn RateProvider>,
    weather: Box<dyn WeatherProvider>,
    timeout: Duration,
}

impl Gateway {
    pub fn new(
        countries: Box<dyn CountryProvider>,
        rates: Box<dyn RateProvider>,
        weather: Box<dyn WeatherProvider>,
    ) -> Self {
        Self {
            countries,
            rates,
            weather,
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn country_profile(&self, code: &str) -> Result<CountryProfile, GatewayError> {
        self.bounded("country profile", self.countries.fetch_country_profile(code)).await
    }

    pub async fn rate_series(
        &self,
        base: &str,
        target: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateSeries, GatewayError> {
        self.bounded("rate series", self.rates.fetch_rate_series(base, target, start, end)).await
    }

    pub async fn latest_rate(&self, base: &str, target: &str) -> Result<f64, GatewayError> {
        self.bounded("latest rate", self.rates.fetch_latest_rate(base, target)).await
    }

    pub async fn current_weather(
        &self,
        at: Coordinates,
        timezone: &str,
    ) -> Result<CurrentWeather, GatewayError> {
        self.bounded("current weather", self.weather.fetch_current_weather(at, timezone)).await
    }

    async fn bounded<T>(
        &self,
        what: &str,
        call: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Provider(format!(
                "{what} lookup timed out after {}s",
                self.timeout.as_secs_f32()
            ))),
        }
    }
}

/// Construct the HTTP-backed gateway from config.
pub fn gateway_from_config(config: &Config) -> anyhow::Result<Gateway> {
    let http = Client::builder()
        .timeout(config.request_timeout())
        .user_agent(concat!("country-dashboard/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let endpoints = &config.endpoints;
    let gateway = Gateway::new(
        Box::new(RestCountriesProvider::new(
            endpoints.countries.as_str(),
            config.translation_language.as_str(),
            http.clone(),
        )),
        Box::new(FrankfurterProvider::new(endpoints.rates.as_str(), http.clone())),
        Box::new(OpenMeteoProvider::new(endpoints.weather.as_str(), http)),
    );

    Ok(gateway.with_timeout(config.request_timeout()))
}
