use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions reshaped for display and chat messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeatherRecord {
    pub location: String,
    pub temperature_c: i64,
    pub condition: String,
    pub icon_code: String,
    pub humidity_pct: i64,
    pub wind_speed_kmh: i64,
    pub observed_at: DateTime<Utc>,
}

/// One calendar day reduced from the 3-hour forecast samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastSummary {
    pub date: NaiveDate,
    pub avg_temperature_c: i64,
    /// Most frequent icon of the day.
    pub icon_code: String,
    /// Description that accompanied `icon_code` on its first occurrence.
    pub condition: String,
}

/// Everything the presentation layer needs from one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub current: CurrentWeatherRecord,
    pub forecast: Vec<DailyForecastSummary>,
    pub fetched_at: DateTime<Utc>,
}
