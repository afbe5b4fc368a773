//! Core library for the WOFF weather widget.
//!
//! This crate defines:
//! - City validation and the classified error taxonomy
//! - A resilient HTTP fetch client (timeout + bounded retry)
//! - The OpenWeather provider and the current/forecast formatters
//! - The chat message builder and per-widget session state
//! - Configuration & credentials handling
//!
//! It is used by `woff-weather-cli`, but the formatted records are plain data
//! any presentation layer can consume.

pub mod city;
pub mod config;
pub mod error;
pub mod fetch;
pub mod format;
pub mod message;
pub mod model;
pub mod provider;
pub mod session;

pub use city::{CityQuery, validate_city};
pub use config::Config;
pub use error::{ApiError, ErrorCode, FormatCause, Operation, SessionError};
pub use fetch::{FetchClient, HttpTransport, RetryPolicy, Transport};
pub use format::{format_current_weather, format_forecast, format_forecast_at};
pub use model::{CurrentWeatherRecord, DailyForecastSummary, WeatherReport};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use session::WeatherSession;
