use chrono::{Local, Utc};
use log::{debug, info, warn};
use std::{
    fmt,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::watch;

use crate::{
    catalog::Catalog,
    error::{GatewayError, SelectionError},
    gateway::{Gateway, trailing_window},
    model::{BASE_CURRENCY, Coordinates},
    session::SessionContext,
    view::{ChartSeries, CountryDisplay, DashboardView, RateDelta},
};

/// Map zoom used when centring on a selected country.
pub const COUNTRY_ZOOM: u8 = 5;

/// Display widgets driven by the coordinator.
pub trait Surface: Send {
    fn show_loading(&mut self, code: &str);
    fn center_map(&mut self, at: Coordinates, zoom: u8);
    /// Called once, on the first render with coordinates.
    fn create_marker(&mut self, at: Coordinates);
    fn move_marker(&mut self, at: Coordinates);
    /// Replaces the whole dataset.
    fn replace_chart(&mut self, chart: &ChartSeries);
    fn show_rate(&mut self, text: &str, delta: &RateDelta);
    fn show_country(&mut self, country: &CountryDisplay, error: Option<&str>);
    fn show_weather(&mut self, text: &str);
    fn show_last_updated(&mut self, text: &str);
    /// Blocking notification; the selection is abandoned.
    fn alert(&mut self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Idle,
    Loading,
    Rendered,
}

/// Identifies one selection; only the newest may render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SelectionToken(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rendered(Box<DashboardView>),
    /// A newer selection started before this one settled.
    Stale,
}

struct DisplayState<S> {
    surface: S,
    phase: RenderPhase,
    marker_placed: bool,
}

/// Runs selections: fetch, build the view, push it to the surface, publish
/// the new session context.
pub struct RenderCoordinator<S: Surface> {
    catalog: Catalog,
    gateway: Gateway,
    session: watch::Sender<SessionContext>,
    sequence: AtomicU64,
    display: Mutex<DisplayState<S>>,
}

impl<S: Surface> RenderCoordinator<S> {
    pub fn new(catalog: Catalog, gateway: Gateway, session: watch::Sender<SessionContext>, surface: S) -> Self {
        Self {
            catalog,
            gateway,
            session,
            sequence: AtomicU64::new(0),
            display: Mutex::new(DisplayState { surface, phase: RenderPhase::Idle, marker_placed: false }),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn phase(&self) -> RenderPhase {
        self.lock().phase
    }

    pub fn session(&self) -> watch::Receiver<SessionContext> {
        self.session.subscribe()
    }

    pub fn with_surface<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.lock().surface)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DisplayState<S>> {
        self.display.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_token(&self) -> SelectionToken {
        SelectionToken(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn is_current(&self, token: SelectionToken) -> bool {
        self.sequence.load(Ordering::SeqCst) == token.0
    }

    /// Handles one selection event, initial or user-driven.
    ///
    /// A country without a currency raises an alert, fetches nothing and
    /// leaves any selection still in flight untouched.
    /// Otherwise the profile (then weather), the rate series and the latest
    /// rate are fetched concurrently; each failure only degrades its own
    /// display fields.
    pub async fn select(&self, code: &str) -> Result<Outcome, SelectionError> {
        let Some(entry) = self.catalog.entry(code).cloned() else {
            self.lock().surface.alert(&format!("Unknown country code: {code}"));
            return Err(SelectionError::UnknownCountry(code.to_string()));
        };
        let Some(currency) = entry.currency.clone() else {
            warn!("No currency mapping for '{}'", entry.code);
            self.lock().surface.alert(&format!("{} is not supported.", entry.display_name));
            return Err(SelectionError::UnsupportedCurrency(entry.code));
        };
        let timezone = self.catalog.timezone_for(&entry.code).to_string();

        // Rejected selections take no token, so they never strand one in flight.
        let token = self.next_token();
        info!("Selection #{} of '{}'", token.0, entry.code);

        {
            let mut display = self.lock();
            display.phase = RenderPhase::Loading;
            display.surface.show_loading(&entry.code);
        }

        let (start, end) = trailing_window(Utc::now().date_naive());

        let profile_then_weather = async {
            let profile = self.gateway.country_profile(&entry.code).await;
            let at = profile.as_ref().ok().map(|p| p.coordinates).or(entry.approximate_center);
            let weather = match at {
                Some(at) => self.gateway.current_weather(at, &timezone).await,
                None => Err(GatewayError::Provider(format!(
                    "no coordinates for a weather lookup in '{}'",
                    entry.code
                ))),
            };
            (profile, weather)
        };

        let ((profile, weather), series, latest) = tokio::join!(
            profile_then_weather,
            self.gateway.rate_series(BASE_CURRENCY, &currency, start, end),
            self.gateway.latest_rate(BASE_CURRENCY, &currency),
        );

        log_failure("country profile", &entry.code, &profile);
        log_failure("rate series", &entry.code, &series);
        log_failure("latest rate", &entry.code, &latest);
        log_failure("weather", &entry.code, &weather);

        let view = DashboardView::build(
            &entry,
            BASE_CURRENCY,
            &currency,
            &profile,
            &series,
            &latest,
            &weather,
        );

        {
            let mut display = self.lock();
            if !self.is_current(token) {
                debug!("Discarding stale selection #{} of '{}'", token.0, entry.code);
                return Ok(Outcome::Stale);
            }
            render(&mut display, &view);
            display.phase = RenderPhase::Rendered;
        }

        self.session.send_replace(SessionContext { country_code: entry.code, timezone });

        Ok(Outcome::Rendered(Box::new(view)))
    }
}

fn render<S: Surface>(display: &mut DisplayState<S>, view: &DashboardView) {
    if let Some(at) = view.country.coordinates {
        display.surface.center_map(at, COUNTRY_ZOOM);
        if display.marker_placed {
            display.surface.move_marker(at);
        } else {
            display.surface.create_marker(at);
            display.marker_placed = true;
        }
    }

    display.surface.replace_chart(&view.rate.chart);
    display.surface.show_rate(&view.rate.rate_text(), &view.rate.delta);
    display.surface.show_country(&view.country, view.country_error.as_deref());
    display.surface.show_weather(&view.weather);
    display
        .surface
        .show_last_updated(&Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
}

fn log_failure<T, E: fmt::Display>(domain: &str, code: &str, result: &Result<T, E>) {
    if let Err(err) = result {
        warn!("Failed to load {domain} for '{code}': {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::CountryEntry,
        model::{CountryProfile, CurrentWeather, RatePoint, RateSeries},
        provider::{CountryProvider, RateProvider, WeatherProvider},
        session::session_channel,
        view::{DeltaColor, RATE_UNAVAILABLE, WEATHER_UNAVAILABLE},
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::{
        sync::{Arc, atomic::AtomicUsize},
        time::Duration,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Loading(String),
        Center(Coordinates),
        CreateMarker(Coordinates),
        MoveMarker(Coordinates),
        Chart(ChartSeries),
        Rate(String, DeltaColor),
        Country(String, Option<String>),
        Weather(String),
        LastUpdated,
        Alert(String),
    }

    #[derive(Debug, Default)]
    struct RecordingSurface {
        events: Vec<Event>,
    }

    impl RecordingSurface {
        fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
            self.events.iter().filter(|e| pred(*e)).count()
        }

        fn last_weather(&self) -> Option<&str> {
            self.events.iter().rev().find_map(|e| match e {
                Event::Weather(w) => Some(w.as_str()),
                _ => None,
            })
        }

        fn last_chart(&self) -> Option<&ChartSeries> {
            self.events.iter().rev().find_map(|e| match e {
                Event::Chart(c) => Some(c),
                _ => None,
            })
        }
    }

    impl Surface for RecordingSurface {
        fn show_loading(&mut self, code: &str) {
            self.events.push(Event::Loading(code.into()));
        }
        fn center_map(&mut self, at: Coordinates, _zoom: u8) {
            self.events.push(Event::Center(at));
        }
        fn create_marker(&mut self, at: Coordinates) {
            self.events.push(Event::CreateMarker(at));
        }
        fn move_marker(&mut self, at: Coordinates) {
            self.events.push(Event::MoveMarker(at));
        }
        fn replace_chart(&mut self, chart: &ChartSeries) {
            self.events.push(Event::Chart(chart.clone()));
        }
        fn show_rate(&mut self, text: &str, delta: &RateDelta) {
            self.events.push(Event::Rate(text.into(), delta.color()));
        }
        fn show_country(&mut self, country: &CountryDisplay, error: Option<&str>) {
            self.events.push(Event::Country(country.capital.clone(), error.map(str::to_string)));
        }
        fn show_weather(&mut self, text: &str) {
            self.events.push(Event::Weather(text.into()));
        }
        fn show_last_updated(&mut self, _text: &str) {
            self.events.push(Event::LastUpdated);
        }
        fn alert(&mut self, message: &str) {
            self.events.push(Event::Alert(message.into()));
        }
    }

    #[derive(Debug, Default, Clone)]
    struct Calls {
        profile: Arc<AtomicUsize>,
        series: Arc<AtomicUsize>,
        latest: Arc<AtomicUsize>,
        weather: Arc<AtomicUsize>,
    }

    impl Calls {
        fn total(&self) -> usize {
            [&self.profile, &self.series, &self.latest, &self.weather]
                .iter()
                .map(|c| c.load(Ordering::SeqCst))
                .sum()
        }
    }

    #[derive(Debug, Clone, Copy, Default)]
    struct Faults {
        profile: bool,
        rates: bool,
        weather: bool,
        /// Keep only this many points of the window.
        series_len: Option<usize>,
    }

    #[derive(Debug)]
    struct FakeCountries {
        calls: Calls,
        fail: bool,
        slow_code: Option<&'static str>,
    }

    #[async_trait]
    impl CountryProvider for FakeCountries {
        async fn fetch_country_profile(&self, code: &str) -> Result<CountryProfile, GatewayError> {
            self.calls.profile.fetch_add(1, Ordering::SeqCst);
            if self.slow_code == Some(code) {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            if self.fail {
                return Err(GatewayError::Network("connection reset".into()));
            }
            let (capital, latitude, longitude) = match code {
                "KR" => ("Seoul", 37.0, 127.5),
                "JP" => ("Tokyo", 36.0, 138.0),
                _ => return Err(GatewayError::NotFound(code.into())),
            };
            Ok(CountryProfile {
                common_name: code.into(),
                coordinates: Coordinates { latitude, longitude },
                capital: Some(capital.into()),
                population: 1_000,
                languages: vec!["Korean".into()],
                flag_image_url: format!("https://flagcdn.com/w320/{}.png", code.to_lowercase()),
                localized_name: None,
            })
        }
    }

    #[derive(Debug)]
    struct FakeRates {
        calls: Calls,
        fail: bool,
        series_len: Option<usize>,
    }

    #[async_trait]
    impl RateProvider for FakeRates {
        async fn fetch_rate_series(
            &self,
            base: &str,
            target: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<RateSeries, GatewayError> {
            self.calls.series.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GatewayError::Provider("status 500".into()));
            }
            // Newest first, as some providers do.
            let mut points: Vec<_> = start
                .iter_days()
                .take_while(|d| *d <= end)
                .enumerate()
                .map(|(i, date)| RatePoint { date, rate: 1300.0 + i as f64 })
                .collect();
            if let Some(len) = self.series_len {
                points.truncate(len);
            }
            points.reverse();
            Ok(RateSeries::new(base, target, points))
        }

        async fn fetch_latest_rate(&self, _base: &str, _target: &str) -> Result<f64, GatewayError> {
            self.calls.latest.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GatewayError::Provider("status 500".into()));
            }
            Err(GatewayError::Provider("latest disabled in tests".into()))
        }
    }

    #[derive(Debug)]
    struct FakeWeather {
        calls: Calls,
        fail: bool,
    }

    #[async_trait]
    impl WeatherProvider for FakeWeather {
        async fn fetch_current_weather(
            &self,
            _at: Coordinates,
            _timezone: &str,
        ) -> Result<CurrentWeather, GatewayError> {
            self.calls.weather.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GatewayError::Provider("status 503".into()));
            }
            Ok(CurrentWeather { description: "Clear sky".into(), temperature_celsius: 20.0, wind_speed: 2.5 })
        }
    }

    struct Harness {
        coordinator: RenderCoordinator<RecordingSurface>,
        calls: Calls,
    }

    fn harness_with(catalog: Catalog, faults: Faults, slow_code: Option<&'static str>) -> Harness {
        let calls = Calls::default();
        let gateway = Gateway::new(
            Box::new(FakeCountries { calls: calls.clone(), fail: faults.profile, slow_code }),
            Box::new(FakeRates { calls: calls.clone(), fail: faults.rates, series_len: faults.series_len }),
            Box::new(FakeWeather { calls: calls.clone(), fail: faults.weather }),
        );
        let (tx, _rx) = session_channel(SessionContext::for_country(&catalog, "KR"));
        let coordinator = RenderCoordinator::new(catalog, gateway, tx, RecordingSurface::default());
        Harness { coordinator, calls }
    }

    fn harness(faults: Faults) -> Harness {
        harness_with(Catalog::builtin(), faults, None)
    }

    fn rendered(outcome: Outcome) -> DashboardView {
        match outcome {
            Outcome::Rendered(view) => *view,
            Outcome::Stale => panic!("selection unexpectedly stale"),
        }
    }

    #[tokio::test]
    async fn selecting_korea_renders_everything() {
        let h = harness(Faults::default());
        assert_eq!(h.coordinator.phase(), RenderPhase::Idle);

        let view = rendered(h.coordinator.select("KR").await.unwrap());

        assert_eq!(view.country.capital, "Seoul");
        assert_eq!(view.rate.chart.label, "USD → KRW");
        assert_eq!(view.rate.chart.labels.len(), 30);
        assert!(view.rate.chart.labels.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(view.rate.delta.color(), DeltaColor::Increase);
        assert_eq!(view.weather, "Clear sky, 20°C, wind 2.5 m/s");

        assert_eq!(h.coordinator.phase(), RenderPhase::Rendered);
        let session = h.coordinator.session().borrow().clone();
        assert_eq!(session.timezone, "Asia/Seoul");
        h.coordinator.with_surface(|s| {
            assert_eq!(s.events.first(), Some(&Event::Loading("KR".into())));
            assert_eq!(s.count(|e| matches!(e, Event::LastUpdated)), 1);
        });
    }

    #[tokio::test]
    async fn marker_is_created_once_then_moved() {
        let h = harness(Faults::default());
        h.coordinator.select("KR").await.unwrap();
        h.coordinator.select("JP").await.unwrap();
        h.coordinator.select("KR").await.unwrap();

        h.coordinator.with_surface(|s| {
            assert_eq!(s.count(|e| matches!(e, Event::CreateMarker(_))), 1);
            assert_eq!(s.count(|e| matches!(e, Event::MoveMarker(_))), 2);
            assert_eq!(s.count(|e| matches!(e, Event::Chart(_))), 3);
            assert_eq!(s.last_chart().map(|c| c.labels.len()), Some(30));
        });
    }

    #[tokio::test]
    async fn unsupported_currency_alerts_without_fetching() {
        let mut entries = Catalog::builtin().list_countries().to_vec();
        entries.push(CountryEntry::new("AQ", "Antarctica").with_center(-90.0, 0.0));
        let h = harness_with(Catalog::new(entries), Faults::default(), None);

        let err = h.coordinator.select("AQ").await.unwrap_err();

        assert_eq!(err, SelectionError::UnsupportedCurrency("AQ".into()));
        assert_eq!(h.calls.total(), 0);
        assert_eq!(h.coordinator.phase(), RenderPhase::Idle);
        assert_eq!(h.coordinator.session().borrow().country_code, "KR");
        h.coordinator.with_surface(|s| {
            assert_eq!(s.events, [Event::Alert("Antarctica is not supported.".into())]);
        });
    }

    #[tokio::test]
    async fn unknown_code_is_rejected() {
        let h = harness(Faults::default());
        let err = h.coordinator.select("ZZ").await.unwrap_err();

        assert_eq!(err, SelectionError::UnknownCountry("ZZ".into()));
        assert_eq!(h.calls.total(), 0);
    }

    #[tokio::test]
    async fn weather_failure_leaves_country_and_rates() {
        let h = harness(Faults { weather: true, ..Faults::default() });
        let view = rendered(h.coordinator.select("KR").await.unwrap());

        assert_eq!(view.weather, WEATHER_UNAVAILABLE);
        assert_eq!(view.country.capital, "Seoul");
        assert_eq!(view.rate.chart.values.len(), 30);
        h.coordinator.with_surface(|s| assert_eq!(s.last_weather(), Some(WEATHER_UNAVAILABLE)));
    }

    #[tokio::test]
    async fn rate_failure_leaves_country_and_weather() {
        let h = harness(Faults { rates: true, ..Faults::default() });
        let view = rendered(h.coordinator.select("KR").await.unwrap());

        assert_eq!(view.rate.rate_text(), RATE_UNAVAILABLE);
        assert!(view.rate.chart.is_empty());
        assert_eq!(view.country.capital, "Seoul");
        assert_eq!(view.weather, "Clear sky, 20°C, wind 2.5 m/s");
    }

    #[tokio::test]
    async fn profile_failure_leaves_rates_and_weather() {
        let h = harness(Faults { profile: true, ..Faults::default() });
        let view = rendered(h.coordinator.select("KR").await.unwrap());

        assert_eq!(view.country.capital, "-");
        assert!(view.country_error.is_some());
        assert_eq!(view.rate.chart.values.len(), 30);
        // Falls back to the catalog centre.
        assert_eq!(view.weather, "Clear sky, 20°C, wind 2.5 m/s");
        assert_eq!(view.country.coordinates, Some(Coordinates { latitude: 37.0, longitude: 127.5 }));
        h.coordinator.with_surface(|s| {
            assert_eq!(s.count(|e| matches!(e, Event::CreateMarker(_))), 1);
        });
    }

    #[tokio::test]
    async fn failed_profile_moves_marker_to_catalog_centre() {
        let h = harness(Faults::default());
        h.coordinator.select("KR").await.unwrap();
        // The fake country provider has no record for FR.
        let view = rendered(h.coordinator.select("FR").await.unwrap());

        let paris_ish = Coordinates { latitude: 46.0, longitude: 2.0 };
        assert!(view.country_error.is_some());
        h.coordinator.with_surface(|s| {
            assert_eq!(s.events.iter().rev().find(|e| matches!(e, Event::MoveMarker(_))), Some(&Event::MoveMarker(paris_ish)));
            assert_eq!(s.events.iter().rev().find(|e| matches!(e, Event::Center(_))), Some(&Event::Center(paris_ish)));
        });
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_selection_does_not_strand_one_in_flight() {
        let mut entries = Catalog::builtin().list_countries().to_vec();
        entries.push(CountryEntry::new("AQ", "Antarctica"));
        let h = harness_with(Catalog::new(entries), Faults::default(), Some("JP"));
        let coordinator = &h.coordinator;

        let (first, second) = tokio::join!(coordinator.select("JP"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            coordinator.select("AQ").await
        });

        assert_eq!(second, Err(SelectionError::UnsupportedCurrency("AQ".into())));
        assert_eq!(rendered(first.unwrap()).country.capital, "Tokyo");
        assert_eq!(coordinator.phase(), RenderPhase::Rendered);
        assert_eq!(coordinator.session().borrow().country_code, "JP");
        coordinator.with_surface(|s| {
            assert!(s.events.contains(&Event::Alert("Antarctica is not supported.".into())));
            assert_eq!(s.events.last(), Some(&Event::LastUpdated));
        });
    }

    #[tokio::test(start_paused = true)]
    async fn clock_keeps_ticking_while_fetches_are_in_flight() {
        let h = harness_with(Catalog::builtin(), Faults::default(), Some("JP"));
        let ticks = Arc::new(AtomicUsize::new(0));
        let clock = {
            let ticks = Arc::clone(&ticks);
            crate::session::spawn_clock(h.coordinator.session(), move |_: &str| {
                ticks.fetch_add(1, Ordering::SeqCst);
            })
        };

        // JP's profile lookup takes five seconds.
        let view = rendered(h.coordinator.select("JP").await.unwrap());

        assert_eq!(view.country.capital, "Tokyo");
        assert!(ticks.load(Ordering::SeqCst) >= 5, "ticks: {}", ticks.load(Ordering::SeqCst));
        clock.abort();
    }

    #[tokio::test]
    async fn single_point_series_has_no_delta() {
        let h = harness(Faults { series_len: Some(1), ..Faults::default() });
        let view = rendered(h.coordinator.select("KR").await.unwrap());

        assert_eq!(view.rate.delta.label(), "N/A");
        assert_eq!(view.rate.delta.color(), DeltaColor::Neutral);
        assert_eq!(view.rate.rate_text(), "USD → KRW: 1300.00");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_selection_is_discarded() {
        let h = harness_with(Catalog::builtin(), Faults::default(), Some("JP"));
        let coordinator = &h.coordinator;

        let (first, second) = tokio::join!(coordinator.select("JP"), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            coordinator.select("KR").await
        });

        assert_eq!(first.unwrap(), Outcome::Stale);
        assert_eq!(rendered(second.unwrap()).country.capital, "Seoul");
        assert_eq!(coordinator.session().borrow().country_code, "KR");
        coordinator.with_surface(|s| {
            assert_eq!(s.count(|e| matches!(e, Event::Country(..))), 1);
            assert!(!s.events.contains(&Event::Country("Tokyo".into(), None)));
        });
    }
}
