//! Core library for the country dashboard.
//!
//! This crate defines:
//! - The static country catalog (currency and timezone per country)
//! - A gateway over the country, exchange-rate and weather providers
//! - Pure view models derived from gateway results
//! - The render coordinator, the session context and the live clock
//! - Configuration handling
//!
//! It is used by `dashboard-cli`, but any [`coordinator::Surface`] can be driven by it.

pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod model;
pub mod provider;
pub mod session;
pub mod view;
pub mod weather_code;

pub use catalog::{Catalog, CountryEntry};
pub use config::{Config, Endpoints};
pub use coordinator::{Outcome, RenderCoordinator, RenderPhase, Surface};
pub use error::{GatewayError, SelectionError};
pub use gateway::{Gateway, gateway_from_config};
pub use model::{Coordinates, CountryProfile, CurrentWeather, RatePoint, RateSeries};
pub use provider::{CountryProvider, RateProvider, WeatherProvider};
pub use session::{SessionContext, session_channel, spawn_clock};
