use anyhow::Context;
use chrono::FixedOffset;
use clap::{Parser, Subcommand};
use inquire::{Password, Text, validator::Validation};
use tracing::info;
use woff_weather_core::{
    ApiError, CityQuery, Config, ErrorCode, WeatherReport, WeatherSession, format::utc_offset,
    message::format_date_ja, provider_from_config, validate_city,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "woff-weather", version, about = "Weather card and chat message for the WOFF widget")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the OpenWeather API key and the default city.
    Configure,

    /// Show current weather and the daily forecast.
    Show {
        /// City name; the configured default when absent.
        city: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the chat message for the current weather.
    Message {
        /// City name; the configured default when absent.
        city: Option<String>,

        /// Running inside the chat client, where messages can be sent.
        #[arg(long)]
        in_client: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure()?,
            Command::Show { city, json } => {
                let config = Config::load()?;
                let mut session = open_session(&config, city.as_deref())?;
                let report = session.refresh().await.map_err(describe)?;

                if json {
                    println!("{}", serde_json::to_string_pretty(report)?);
                } else {
                    print_report(report, utc_offset(config.utc_offset_hours));
                }
            }
            Command::Message { city, in_client } => {
                let config = Config::load()?;
                let mut session = open_session(&config, city.as_deref())?;
                session.refresh().await.map_err(describe)?;

                let message = session.compose_message(in_client)?;
                println!("{}", serde_json::to_string_pretty(&message)?);
                info!(city = %session.city(), "chat message composed");
            }
        }

        Ok(())
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let city = Text::new("Default city:")
        .with_default(&config.default_city)
        .with_validator(|input: &str| {
            Ok(if validate_city(input) {
                Validation::Valid
            } else {
                Validation::Invalid(
                    "Use at least two ASCII letters, spaces, hyphens, commas or periods".into(),
                )
            })
        })
        .prompt()
        .context("Failed to read default city")?;

    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }
    config.default_city = city;

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

fn open_session(config: &Config, city: Option<&str>) -> anyhow::Result<WeatherSession> {
    let name = city.unwrap_or(&config.default_city);
    let city = CityQuery::parse(name).map_err(describe)?;
    let provider = provider_from_config(config)?;

    Ok(WeatherSession::new(provider, city).with_utc_offset(utc_offset(config.utc_offset_hours)))
}

/// Attach a user-facing explanation with the error code.
fn describe(err: ApiError) -> anyhow::Error {
    let hint = match (err.code(), err.status()) {
        (ErrorCode::Timeout, _) => "the weather service did not answer in time",
        (ErrorCode::Network, _) => "check your network connection",
        (ErrorCode::Api, Some(401)) => "the API key was rejected, run `woff-weather configure`",
        (ErrorCode::Api, Some(404)) => "the city was not found",
        (ErrorCode::Api, _) => "the weather service returned an error",
        (ErrorCode::Validation, _) => {
            "city names may only contain ASCII letters, spaces, hyphens, commas and periods"
        }
        (ErrorCode::Formatting, _) => "the weather service returned unexpected data",
    };

    let code = err.code();
    anyhow::Error::new(err).context(format!("Could not load weather data [{code}]: {hint}"))
}

fn print_report(report: &WeatherReport, offset: FixedOffset) {
    let current = &report.current;
    let observed = current.observed_at.with_timezone(&offset);

    println!("{}: {}", current.location, current.condition);
    println!("  Temperature: {}°C", current.temperature_c);
    println!("  Humidity:    {}%", current.humidity_pct);
    println!("  Wind:        {} km/h", current.wind_speed_kmh);
    println!("  Observed:    {}", observed.format("%Y-%m-%d %H:%M %:z"));

    if report.forecast.is_empty() {
        return;
    }

    println!();
    println!("Forecast:");
    for day in &report.forecast {
        println!(
            "  {:<12} {:>4}°C  {}  {}",
            format_date_ja(day.date),
            day.avg_temperature_c,
            day.icon_code,
            day.condition
        );
    }
}
