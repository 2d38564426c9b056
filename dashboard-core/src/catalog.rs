use crate::model::Coordinates;

/// Timezone used when a country has no explicit mapping.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// One selectable country.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryEntry {
    /// ISO 3166 alpha-2 code, upper case.
    pub code: String,
    pub display_name: String,
    /// ISO 4217 code; `None` means the country cannot be selected.
    pub currency: Option<String>,
    /// IANA timezone identifier.
    pub timezone: Option<String>,
    /// Rough centre of the country, used when the profile lookup is unavailable.
    pub approximate_center: Option<Coordinates>,
}

impl CountryEntry {
    pub fn new(code: &str, display_name: &str) -> Self {
        Self {
            code: code.to_uppercase(),
            display_name: display_name.to_string(),
            currency: None,
            timezone: None,
            approximate_center: None,
        }
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = Some(currency.to_string());
        self
    }

    pub fn with_timezone(mut self, timezone: &str) -> Self {
        self.timezone = Some(timezone.to_string());
        self
    }

    pub fn with_center(mut self, latitude: f64, longitude: f64) -> Self {
        self.approximate_center = Some(Coordinates { latitude, longitude });
        self
    }
}

/// Static country list with its currency and timezone maps.
///
/// Insertion order is display order.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CountryEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CountryEntry>) -> Self {
        Self { entries }
    }

    /// The compiled-in catalog.
    pub fn builtin() -> Self {
        Self::new(vec![
            CountryEntry::new("KR", "South Korea")
                .with_currency("KRW")
                .with_timezone("Asia/Seoul")
                .with_center(37.0, 127.5),
            CountryEntry::new("JP", "Japan")
                .with_currency("JPY")
                .with_timezone("Asia/Tokyo")
                .with_center(36.0, 138.0),
            CountryEntry::new("US", "United States")
                .with_currency("USD")
                .with_timezone("America/New_York")
                .with_center(38.0, -97.0),
            CountryEntry::new("GB", "United Kingdom")
                .with_currency("GBP")
                .with_timezone("Europe/London")
                .with_center(54.0, -2.0),
            CountryEntry::new("FR", "France")
                .with_currency("EUR")
                .with_timezone("Europe/Paris")
                .with_center(46.0, 2.0),
        ])
    }

    pub fn list_countries(&self) -> &[CountryEntry] {
        &self.entries
    }

    pub fn entry(&self, code: &str) -> Option<&CountryEntry> {
        self.entries.iter().find(|e| e.code.eq_ignore_ascii_case(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entry(code).is_some()
    }

    pub fn currency_for(&self, code: &str) -> Option<&str> {
        self.entry(code).and_then(|e| e.currency.as_deref())
    }

    pub fn timezone_for(&self, code: &str) -> &str {
        self.entry(code)
            .and_then(|e| e.timezone.as_deref())
            .unwrap_or(DEFAULT_TIMEZONE)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
