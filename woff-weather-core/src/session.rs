//! State owned by one widget instance: the provider, the city and the last
//! successfully loaded report.

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;
use tracing::info;

use crate::{
    ApiError, CityQuery,
    error::SessionError,
    format::{DEFAULT_UTC_OFFSET_HOURS, format_current_weather, format_forecast_at, utc_offset},
    message::build_flex_message,
    model::WeatherReport,
    provider::WeatherProvider,
};

#[derive(Debug)]
pub struct WeatherSession {
    provider: Box<dyn WeatherProvider>,
    city: CityQuery,
    offset: FixedOffset,
    report: Option<WeatherReport>,
}

impl WeatherSession {
    pub fn new(provider: Box<dyn WeatherProvider>, city: CityQuery) -> Self {
        Self { provider, city, offset: utc_offset(DEFAULT_UTC_OFFSET_HOURS), report: None }
    }

    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn city(&self) -> &CityQuery {
        &self.city
    }

    /// Last report loaded by [`refresh`](Self::refresh), if any.
    pub fn report(&self) -> Option<&WeatherReport> {
        self.report.as_ref()
    }

    pub async fn refresh(&mut self) -> Result<&WeatherReport, ApiError> {
        self.refresh_at(Utc::now()).await
    }

    /// Fetch both payloads concurrently and format them. The stored report is
    /// only replaced when everything succeeds.
    pub async fn refresh_at(&mut self, now: DateTime<Utc>) -> Result<&WeatherReport, ApiError> {
        let (current_raw, forecast_raw) = tokio::try_join!(
            self.provider.current_weather(&self.city),
            self.provider.forecast(&self.city),
        )?;

        let current = format_current_weather(&current_raw)?;
        let forecast = format_forecast_at(&forecast_raw, now, self.offset)?;

        info!(city = %self.city, days = forecast.len(), "weather refreshed");

        Ok(&*self.report.insert(WeatherReport { current, forecast, fetched_at: now }))
    }

    /// Flex message for the host chat. `in_client` is the host capability
    /// flag: false when running outside the chat client.
    pub fn compose_message(&self, in_client: bool) -> Result<Value, SessionError> {
        self.compose_message_at(in_client, Utc::now())
    }

    pub fn compose_message_at(
        &self,
        in_client: bool,
        now: DateTime<Utc>,
    ) -> Result<Value, SessionError> {
        if !in_client {
            return Err(SessionError::NotInClient);
        }
        let report = self.report.as_ref().ok_or(SessionError::NotLoaded)?;

        Ok(build_flex_message(&report.current, &report.forecast, now.with_timezone(&self.offset)))
    }
}
