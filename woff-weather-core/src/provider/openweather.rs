use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::{
    ApiError, CityQuery, Config,
    error::Operation,
    fetch::{FetchClient, HttpTransport, RetryPolicy, Transport},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_LANG: &str = "ja";
pub const DEFAULT_UNITS: &str = "metric";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider<T = HttpTransport> {
    api_key: String,
    base_url: String,
    lang: String,
    units: String,
    fetch: FetchClient<T>,
}

impl OpenWeatherProvider {
    /// Provider with the default endpoint, timeout and retry policy.
    pub fn new(api_key: String) -> Result<Self, ApiError> {
        Self::from_config(api_key, &Config::default())
    }

    pub fn from_config(api_key: String, config: &Config) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config.timeout())?;
        let fetch = FetchClient::new(transport)
            .with_timeout(config.timeout())
            .with_retry(RetryPolicy {
                max_retries: config.max_retries,
                delay: config.retry_delay(),
            });

        Ok(OpenWeatherProvider::with_client(api_key, fetch)
            .with_base_url(config.base_url.clone())
            .with_lang(config.lang.clone())
            .with_units(config.units.clone()))
    }
}

impl<T: Transport> OpenWeatherProvider<T> {
    pub fn with_client(api_key: String, fetch: FetchClient<T>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            lang: DEFAULT_LANG.to_string(),
            units: DEFAULT_UNITS.to_string(),
            fetch,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    /// `{base}/{endpoint}?q=..&units=..&lang=..&appid=..`, percent-encoded.
    pub fn endpoint_url(&self, endpoint: &str, city: &CityQuery) -> Result<Url, ApiError> {
        let base = self.base_url.trim_end_matches('/');

        Url::parse_with_params(
            &format!("{base}/{endpoint}"),
            &[
                ("q", city.as_str()),
                ("units", self.units.as_str()),
                ("lang", self.lang.as_str()),
                ("appid", self.api_key.as_str()),
            ],
        )
        .map_err(|e| ApiError::Network(format!("invalid weather API URL {base:?}: {e}")))
    }

    async fn query(
        &self,
        operation: Operation,
        endpoint: &str,
        city: &CityQuery,
    ) -> Result<Value, ApiError> {
        let result = match self.endpoint_url(endpoint, city) {
            Ok(url) => self.fetch.fetch_json(&url).await,
            Err(err) => Err(err),
        };

        result.map_err(|err| {
            error!(%operation, code = %err.code(), error = %err, "weather query failed");
            err.with_context(operation, city.as_str())
        })
    }
}

#[async_trait]
impl<T: Transport> WeatherProvider for OpenWeatherProvider<T> {
    #[instrument(skip(self, city), fields(city = %city))]
    async fn current_weather(&self, city: &CityQuery) -> Result<Value, ApiError> {
        info!("fetching current weather");
        let data = self.query(Operation::GetCurrentWeather, "weather", city).await?;
        debug!("current weather received");
        Ok(data)
    }

    #[instrument(skip(self, city), fields(city = %city))]
    async fn forecast(&self, city: &CityQuery) -> Result<Value, ApiError> {
        info!("fetching 5-day forecast");
        let data = self.query(Operation::GetForecast, "forecast", city).await?;
        let forecast_count = data.get("list").and_then(Value::as_array).map_or(0, Vec::len);
        debug!(forecast_count, "forecast received");
        Ok(data)
    }
}
