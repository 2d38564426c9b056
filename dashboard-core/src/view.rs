//! Pure transforms from gateway results to displayable values.
//!
//! Nothing here touches a renderer; the coordinator pushes a [`DashboardView`]
//! into whatever [`crate::coordinator::Surface`] it drives.

use crate::{
    catalog::CountryEntry,
    error::GatewayError,
    model::{Coordinates, CountryProfile, CurrentWeather, RateSeries},
};

pub const PLACEHOLDER: &str = "-";
pub const NOT_AVAILABLE: &str = "N/A";
pub const WEATHER_UNAVAILABLE: &str = "weather unavailable";
pub const RATE_UNAVAILABLE: &str = "rate unavailable";
pub const COUNTRY_UNAVAILABLE: &str = "country info unavailable";

/// Colour of the rate delta. An increase is shown in red.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaColor {
    Increase,
    Decrease,
    Neutral,
}

impl DeltaColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeltaColor::Increase => "red",
            DeltaColor::Decrease => "blue",
            DeltaColor::Neutral => "neutral",
        }
    }
}

/// Difference between the last two entries of a series; absent below two entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateDelta(Option<f64>);

impl RateDelta {
    pub fn from_series(series: &RateSeries) -> Self {
        match series.points() {
            [.., previous, current] => Self(Some(current.rate - previous.rate)),
            _ => Self(None),
        }
    }

    pub fn absent() -> Self {
        Self(None)
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }

    pub fn color(&self) -> DeltaColor {
        match self.0 {
            Some(d) if d > 0.0 => DeltaColor::Increase,
            Some(d) if d < 0.0 => DeltaColor::Decrease,
            _ => DeltaColor::Neutral,
        }
    }

    pub fn label(&self) -> String {
        match self.0 {
            Some(d) => format!("{d:+.2}"),
            None => NOT_AVAILABLE.to_string(),
        }
    }
}

/// Line-chart dataset. Replaced wholesale on every render.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn from_series(series: &RateSeries) -> Self {
        Self {
            label: pair_label(&series.base, &series.target),
            labels: series.points().iter().map(|p| p.date.format("%Y-%m-%d").to_string()).collect(),
            values: series.points().iter().map(|p| p.rate).collect(),
        }
    }

    pub fn empty(base: &str, target: &str) -> Self {
        Self { label: pair_label(base, target), labels: Vec::new(), values: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub fn pair_label(base: &str, target: &str) -> String {
    format!("{base} → {target}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateView {
    pub pair: String,
    pub current: Option<f64>,
    pub delta: RateDelta,
    pub chart: ChartSeries,
}

impl RateView {
    /// Prefers the latest-rate lookup, then the tail of the series.
    pub fn build(
        base: &str,
        target: &str,
        series: &Result<RateSeries, GatewayError>,
        latest: &Result<f64, GatewayError>,
    ) -> Self {
        let (chart, delta, tail) = match series {
            Ok(series) => (
                ChartSeries::from_series(series),
                RateDelta::from_series(series),
                series.last().map(|p| p.rate),
            ),
            Err(_) => (ChartSeries::empty(base, target), RateDelta::absent(), None),
        };

        Self {
            pair: pair_label(base, target),
            current: latest.as_ref().ok().copied().or(tail),
            delta,
            chart,
        }
    }

    pub fn rate_text(&self) -> String {
        match self.current {
            Some(rate) => format!("{}: {rate:.2}", self.pair),
            None => RATE_UNAVAILABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryDisplay {
    pub name: String,
    pub localized_name: String,
    pub capital: String,
    pub population: String,
    pub languages: String,
    pub flag_url: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl CountryDisplay {
    pub fn build(entry: &CountryEntry, profile: &Result<CountryProfile, GatewayError>) -> Self {
        match profile {
            Ok(p) => Self {
                name: p.common_name.clone(),
                localized_name: p.localized_name.clone().unwrap_or_else(|| p.common_name.clone()),
                capital: p.capital.clone().unwrap_or_else(|| PLACEHOLDER.to_string()),
                population: format_population(p.population),
                languages: join_or_placeholder(&p.languages),
                flag_url: Some(p.flag_image_url.clone()).filter(|url| !url.is_empty()),
                coordinates: Some(p.coordinates),
            },
            Err(_) => Self {
                name: entry.display_name.clone(),
                localized_name: entry.display_name.clone(),
                capital: PLACEHOLDER.to_string(),
                population: PLACEHOLDER.to_string(),
                languages: PLACEHOLDER.to_string(),
                flag_url: None,
                coordinates: entry.approximate_center,
            },
        }
    }
}

pub fn weather_text(weather: &Result<CurrentWeather, GatewayError>) -> String {
    match weather {
        Ok(w) => format!("{}, {}°C, wind {} m/s", w.description, w.temperature_celsius, w.wind_speed),
        Err(_) => WEATHER_UNAVAILABLE.to_string(),
    }
}

/// Groups digits in threes: `51780579` → `51,780,579`.
pub fn format_population(population: u64) -> String {
    let digits = population.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn join_or_placeholder(items: &[String]) -> String {
    if items.is_empty() { PLACEHOLDER.to_string() } else { items.join(", ") }
}

/// Everything one render pushes to the surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub country_code: String,
    pub country: CountryDisplay,
    /// `Some` only when the profile lookup failed.
    pub country_error: Option<String>,
    pub rate: RateView,
    pub weather: String,
}

impl DashboardView {
    pub fn build(
        entry: &CountryEntry,
        base: &str,
        target: &str,
        profile: &Result<CountryProfile, GatewayError>,
        series: &Result<RateSeries, GatewayError>,
        latest: &Result<f64, GatewayError>,
        weather: &Result<CurrentWeather, GatewayError>,
    ) -> Self {
        Self {
            country_code: entry.code.clone(),
            country: CountryDisplay::build(entry, profile),
            country_error: profile.as_ref().err().map(|_| COUNTRY_UNAVAILABLE.to_string()),
            rate: RateView::build(base, target, series, latest),
            weather: weather_text(weather),
        }
    }
}
