use crossterm::{
    execute,
    style::{StyledContent, Stylize},
    terminal::SetTitle,
};
use dashboard_core::{
    Coordinates, Surface,
    view::{ChartSeries, CountryDisplay, DeltaColor, RateDelta},
};
use std::io::{Write, stdout};

const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Prints each display surface as a section of plain terminal output.
///
/// The map is a centre readout; the marker position is kept so moves can be
/// shown as "from → to".
#[derive(Debug, Default)]
pub struct TerminalSurface {
    marker: Option<Coordinates>,
}

impl Surface for TerminalSurface {
    fn show_loading(&mut self, code: &str) {
        println!("\n{}", format!("Loading {code}...").dim());
    }

    fn center_map(&mut self, at: Coordinates, zoom: u8) {
        println!("{} {} (zoom {zoom})", "Map:".bold(), format_coordinates(at));
    }

    fn create_marker(&mut self, at: Coordinates) {
        println!("     marker placed at {}", format_coordinates(at));
        self.marker = Some(at);
    }

    fn move_marker(&mut self, at: Coordinates) {
        match self.marker.replace(at) {
            Some(from) => println!(
                "     marker moved {} → {}",
                format_coordinates(from),
                format_coordinates(at)
            ),
            None => println!("     marker moved to {}", format_coordinates(at)),
        }
    }

    fn replace_chart(&mut self, chart: &ChartSeries) {
        println!("{} {}", "Chart:".bold(), chart.label);
        if chart.is_empty() {
            println!("     (no data)");
            return;
        }

        let (min, max) = bounds(&chart.values);
        println!("     {}", sparkline(&chart.values));
        println!(
            "     {} .. {}  min {min:.2}  max {max:.2}",
            chart.labels.first().map(String::as_str).unwrap_or_default(),
            chart.labels.last().map(String::as_str).unwrap_or_default(),
        );
    }

    fn show_rate(&mut self, text: &str, delta: &RateDelta) {
        println!("{} {text}  {}", "Rate:".bold(), paint_delta(delta));
    }

    fn show_country(&mut self, country: &CountryDisplay, error: Option<&str>) {
        println!("{} {} / {}", "Country:".bold(), country.name, country.localized_name);
        if let Some(error) = error {
            println!("     {}", error.red());
        }
        println!("     Capital: {}", country.capital);
        println!("     Population: {}", country.population);
        println!("     Languages: {}", country.languages);
        if let Some(flag) = &country.flag_url {
            println!("     Flag: {flag}");
        }
    }

    fn show_weather(&mut self, text: &str) {
        println!("{} {text}", "Weather:".bold());
    }

    fn show_last_updated(&mut self, text: &str) {
        println!("{}", format!("Last updated {text}").dim());
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{} {message}", "!".red().bold());
    }
}

/// Clock sink for interactive mode; keeps the prompt undisturbed.
pub fn set_title_clock(text: &str) {
    let _ = execute!(stdout(), SetTitle(text));
}

/// Clock sink for watch mode; rewrites one status line.
pub fn print_status_clock(text: &str) {
    let mut out = stdout();
    let _ = write!(out, "\r{} {text}", "Local time:".bold());
    let _ = out.flush();
}

fn format_coordinates(at: Coordinates) -> String {
    format!("{:.2}, {:.2}", at.latitude, at.longitude)
}

fn paint_delta(delta: &RateDelta) -> StyledContent<String> {
    let label = format!("({})", delta.label());
    match delta.color() {
        DeltaColor::Increase => label.red(),
        DeltaColor::Decrease => label.blue(),
        DeltaColor::Neutral => label.grey(),
    }
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

/// One block character per value, scaled between the series min and max.
pub fn sparkline(values: &[f64]) -> String {
    let (min, max) = bounds(values);
    let span = max - min;

    values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                SPARKS[SPARKS.len() / 2]
            } else {
                let idx = ((v - min) / span * (SPARKS.len() - 1) as f64).round() as usize;
                SPARKS[idx.min(SPARKS.len() - 1)]
            }
        })
        .collect()
}
