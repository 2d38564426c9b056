use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Base currency of every exchange-rate query.
pub const BASE_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Country metadata returned by the profile lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProfile {
    pub common_name: String,
    pub coordinates: Coordinates,
    pub capital: Option<String>,
    pub population: u64,
    pub languages: Vec<String>,
    pub flag_image_url: String,
    pub localized_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatePoint {
    pub date: NaiveDate,
    pub rate: f64,
}

/// Daily rates from [`BASE_CURRENCY`] to `target`, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSeries {
    pub base: String,
    pub target: String,
    points: Vec<RatePoint>,
}

impl RateSeries {
    /// Builds a series, sorting the points by date whatever order they came in.
    pub fn new(base: impl Into<String>, target: impl Into<String>, mut points: Vec<RatePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { base: base.into(), target: target.into(), points }
    }

    pub fn points(&self) -> &[RatePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&RatePoint> {
        self.points.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub description: String,
    pub temperature_celsius: f64,
    pub wind_speed: f64,
}
