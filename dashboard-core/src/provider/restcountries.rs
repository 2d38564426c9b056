use anyhow::{Context, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;

use crate::{
    error::GatewayError,
    model::{Coordinates, CountryProfile},
    provider::{ensure_success, fetch_text},
};

use super::CountryProvider;

const SERVICE: &str = "RestCountries";

#[derive(Debug, Clone)]
pub struct RestCountriesProvider {
    base_url: String,
    translation: String,
    http: Client,
}

impl RestCountriesProvider {
    /// `translation` is the RestCountries translation key for the localized name, e.g. "kor".
    pub fn new(base_url: impl Into<String>, translation: impl Into<String>, http: Client) -> Self {
        Self { base_url: base_url.into(), translation: translation.into(), http }
    }
}

#[derive(Debug, Deserialize)]
struct RcName {
    common: String,
}

#[derive(Debug, Default, Deserialize)]
struct RcFlags {
    png: Option<String>,
    svg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RcTranslation {
    common: String,
}

#[derive(Debug, Deserialize)]
struct RcCountry {
    name: RcName,
    latlng: Vec<f64>,
    #[serde(default)]
    capital: Vec<String>,
    #[serde(default)]
    population: u64,
    #[serde(default)]
    languages: HashMap<String, String>,
    #[serde(default)]
    flags: RcFlags,
    #[serde(default)]
    translations: HashMap<String, RcTranslation>,
}

/// Parses an `/alpha/{code}` body, which is a JSON array of matches.
pub(crate) fn parse_profile(body: &str, code: &str, translation: &str) -> Result<CountryProfile, GatewayError> {
    let parsed: Vec<RcCountry> = serde_json::from_str(body)
        .context("Failed to parse RestCountries JSON")
        .map_err(GatewayError::provider)?;

    let country = parsed.into_iter().next().ok_or_else(|| GatewayError::NotFound(code.to_string()))?;

    let coordinates = match country.latlng.as_slice() {
        [latitude, longitude, ..] => Coordinates { latitude: *latitude, longitude: *longitude },
        _ => {
            return Err(GatewayError::provider(anyhow!(
                "RestCountries record for '{code}' has no coordinates"
            )));
        }
    };

    let mut languages: Vec<String> = country.languages.into_values().collect();
    languages.sort();

    Ok(CountryProfile {
        common_name: country.name.common,
        coordinates,
        capital: country.capital.into_iter().next(),
        population: country.population,
        languages,
        flag_image_url: country.flags.png.or(country.flags.svg).unwrap_or_default(),
        localized_name: country.translations.get(translation).map(|t| t.common.clone()),
    })
}

#[async_trait]
impl CountryProvider for RestCountriesProvider {
    async fn fetch_country_profile(&self, code: &str) -> Result<CountryProfile, GatewayError> {
        let url = format!("{}/alpha/{}", self.base_url.trim_end_matches('/'), code);
        debug!("RestCountries URL: {url}");

        let (status, body) = fetch_text(self.http.get(&url), SERVICE).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(code.to_string()));
        }
        ensure_success(SERVICE, status, &body)?;

        parse_profile(&body, code, &self.translation)
    }
}
