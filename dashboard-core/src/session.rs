use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::warn;
use std::time::Duration;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use crate::catalog::Catalog;

pub const CLOCK_PERIOD: Duration = Duration::from_millis(1000);

/// The current selection, shared with the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub country_code: String,
    pub timezone: String,
}

impl SessionContext {
    pub fn for_country(catalog: &Catalog, code: &str) -> Self {
        Self { country_code: code.to_uppercase(), timezone: catalog.timezone_for(code).to_string() }
    }
}

/// Creates the session channel. The sender goes to the render coordinator,
/// which is its only writer; receivers are cheap to clone.
pub fn session_channel(
    initial: SessionContext,
) -> (watch::Sender<SessionContext>, watch::Receiver<SessionContext>) {
    watch::channel(initial)
}

/// Resolves an IANA name, falling back to UTC.
pub fn resolve_timezone(timezone: &str) -> Tz {
    timezone.parse().unwrap_or_else(|_| {
        warn!("Unknown timezone '{timezone}', using UTC");
        chrono_tz::UTC
    })
}

pub fn format_clock(now: DateTime<Utc>, timezone: &str) -> String {
    now.with_timezone(&resolve_timezone(timezone)).format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

/// Receives the formatted clock once per tick.
pub trait ClockSink: Send + 'static {
    fn show_clock(&mut self, text: &str);
}

impl<F> ClockSink for F
where
    F: FnMut(&str) + Send + 'static,
{
    fn show_clock(&mut self, text: &str) {
        self(text)
    }
}

/// Ticks every second for as long as the runtime lives, reading the timezone
/// from `session` on each tick. Independent of any fetch in flight.
pub fn spawn_clock(session: watch::Receiver<SessionContext>, mut sink: impl ClockSink) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(CLOCK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let timezone = session.borrow().timezone.clone();
            sink.show_clock(&format_clock(Utc::now(), &timezone));
        }
    })
}
