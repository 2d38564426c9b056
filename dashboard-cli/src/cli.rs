use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use dashboard_core::{
    Catalog, Config, CountryEntry, Outcome, RenderCoordinator, SelectionError, SessionContext,
    gateway_from_config, session_channel, spawn_clock,
};
use inquire::{CustomType, InquireError, Select, Text};
use log::{debug, warn};
use std::{fmt, process::ExitCode};

use crate::terminal::{self, TerminalSurface};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "country-dashboard",
    version,
    about = "Country dashboard: location, USD exchange-rate trend and current weather"
)]
pub struct Cli {
    /// Log request URLs and per-domain failures.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pick countries from a list; the clock runs in the terminal title. (default)
    Interactive,

    /// Render the dashboard for one country and exit.
    Show {
        /// Alpha-2 country code; defaults to the configured country.
        country: Option<String>,
    },

    /// Render once, then keep the local clock of the country ticking until Ctrl-C.
    Watch {
        /// Alpha-2 country code; defaults to the configured country.
        country: Option<String>,
    },

    /// List supported countries.
    Countries,

    /// Edit the configuration file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let config = Config::load()?;
        let catalog = Catalog::builtin();

        match self.command.unwrap_or(Command::Interactive) {
            Command::Countries => {
                print_countries(&catalog);
                Ok(ExitCode::SUCCESS)
            }
            Command::Configure => {
                configure(config, &catalog).await?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Show { country } => {
                let code = country.unwrap_or_else(|| config.default_country.clone());
                let coordinator = build_coordinator(&config, catalog, &code)?;
                Ok(ExitCode::from(exit_status(&coordinator.select(&code).await)))
            }
            Command::Watch { country } => {
                let code = country.unwrap_or_else(|| config.default_country.clone());
                let coordinator = build_coordinator(&config, catalog, &code)?;
                let status = exit_status(&coordinator.select(&code).await);
                if status != 0 {
                    return Ok(ExitCode::from(status));
                }

                println!();
                let clock = spawn_clock(coordinator.session(), terminal::print_status_clock);
                tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
                clock.abort();
                println!();
                Ok(ExitCode::SUCCESS)
            }
            Command::Interactive => {
                config.validate(&catalog)?;
                interactive(&config, catalog).await?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Rejected selections were already alerted on the surface; only the status is left.
fn exit_status(result: &Result<Outcome, SelectionError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            debug!("{err}");
            1
        }
    }
}

fn build_coordinator(
    config: &Config,
    catalog: Catalog,
    code: &str,
) -> anyhow::Result<RenderCoordinator<TerminalSurface>> {
    let gateway = gateway_from_config(config).context("Failed to build HTTP client")?;
    let (session, _) = session_channel(SessionContext::for_country(&catalog, code));
    Ok(RenderCoordinator::new(catalog, gateway, session, TerminalSurface::default()))
}

async fn interactive(config: &Config, catalog: Catalog) -> anyhow::Result<()> {
    let options: Vec<CountryOption> = catalog.list_countries().iter().cloned().map(CountryOption).collect();
    let mut current = config.default_country.to_uppercase();

    let coordinator = build_coordinator(config, catalog, &current)?;
    let clock = spawn_clock(coordinator.session(), terminal::set_title_clock);

    loop {
        report(&current, coordinator.select(&current).await);

        let cursor = options.iter().position(|o| o.0.code == current).unwrap_or(0);
        let prompt_options = options.clone();
        let answer = tokio::task::spawn_blocking(move || {
            Select::new("Country:", prompt_options).with_starting_cursor(cursor).prompt()
        })
        .await
        .context("Country prompt panicked")?;

        match answer {
            Ok(choice) => current = choice.0.code,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err).context("Failed to read country selection"),
        }
    }

    clock.abort();
    Ok(())
}

/// Selection errors are already on screen; keep the session going.
fn report(code: &str, result: Result<Outcome, SelectionError>) {
    match result {
        Ok(Outcome::Rendered(_)) => {}
        Ok(Outcome::Stale) => debug!("Selection of '{code}' superseded"),
        Err(err) => warn!("{err}"),
    }
}

fn print_countries(catalog: &Catalog) {
    for entry in catalog.list_countries() {
        println!(
            "{:<4}{:<20}{:<6}{}",
            entry.code,
            entry.display_name,
            entry.currency.as_deref().unwrap_or("-"),
            catalog.timezone_for(&entry.code)
        );
    }
}

async fn configure(mut config: Config, catalog: &Catalog) -> anyhow::Result<()> {
    let options: Vec<CountryOption> = catalog.list_countries().iter().cloned().map(CountryOption).collect();
    let cursor = options
        .iter()
        .position(|o| o.0.code.eq_ignore_ascii_case(&config.default_country))
        .unwrap_or(0);
    let translation = config.translation_language.clone();
    let timeout = config.request_timeout_secs;

    let (country, translation, timeout) = tokio::task::spawn_blocking(move || {
        let country = Select::new("Default country:", options).with_starting_cursor(cursor).prompt()?;
        let translation = Text::new("Translation key for localized names (e.g. kor, jpn, fra):")
            .with_default(&translation)
            .prompt()?;
        let timeout = CustomType::<u64>::new("Request timeout in seconds:")
            .with_default(timeout)
            .with_error_message("Please enter a whole number of seconds")
            .prompt()?;
        Ok::<_, InquireError>((country, translation, timeout))
    })
    .await
    .context("Configuration prompt panicked")?
    .context("Configuration cancelled")?;

    if timeout == 0 {
        return Err(anyhow!("Request timeout must be at least one second"));
    }

    config.set_default_country(&country.0.code);
    config.translation_language = translation.trim().to_string();
    config.request_timeout_secs = timeout;
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

#[derive(Debug, Clone)]
struct CountryOption(CountryEntry);

impl fmt::Display for CountryOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0.display_name, self.0.code)
    }
}
