use crate::{ApiError, CityQuery, Config, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

pub mod openweather;

/// Source of raw provider payloads for a validated city.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(&self, city: &CityQuery) -> Result<Value, ApiError>;

    async fn forecast(&self, city: &CityQuery) -> Result<Value, ApiError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `woff-weather configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    let provider = OpenWeatherProvider::from_config(api_key.to_owned(), config)?;
    Ok(Box::new(provider))
}
