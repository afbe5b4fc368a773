//! Pure transforms from provider JSON into the records the UI consumes.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{ApiError, FormatCause},
    model::{CurrentWeatherRecord, DailyForecastSummary},
};

/// Offset used to decide which calendar day "today" is (Japan Standard Time).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;
pub const MAX_FORECAST_DAYS: usize = 5;

const CURRENT_PAYLOAD: &str = "current weather";
const FORECAST_PAYLOAD: &str = "forecast";

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwCurrentMain,
    weather: Vec<OwCondition>,
    wind: OwWind,
}

/// Timestamp of a forecast sample, read before the rest of it.
#[derive(Debug, Deserialize)]
struct SampleTime {
    dt: i64,
}

/// The rest of a retained 3-hour sample.
#[derive(Debug, Deserialize)]
struct RawForecastEntry {
    main: OwMain,
    weather: Vec<OwCondition>,
}

/// Fixed offset of `hours` east of UTC, falling back to UTC when out of range.
pub fn utc_offset(hours: i32) -> FixedOffset {
    hours.checked_mul(3600).and_then(FixedOffset::east_opt).unwrap_or_else(|| Utc.fix())
}

/// Round to the nearest integer with halves going toward positive infinity.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn timestamp(payload: &'static str, secs: i64) -> Result<DateTime<Utc>, ApiError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| ApiError::formatting(payload, FormatCause::InvalidTimestamp(secs)))
}

pub fn format_current_weather(raw: &Value) -> Result<CurrentWeatherRecord, ApiError> {
    let parsed =
        OwCurrentResponse::deserialize(raw).map_err(|e| ApiError::formatting(CURRENT_PAYLOAD, e))?;

    let condition = parsed
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::formatting(CURRENT_PAYLOAD, FormatCause::MissingCondition))?;

    Ok(CurrentWeatherRecord {
        location: parsed.name,
        temperature_c: round_half_up(parsed.main.temp),
        condition: condition.description,
        icon_code: condition.icon,
        humidity_pct: round_half_up(parsed.main.humidity),
        // m/s -> km/h
        wind_speed_kmh: round_half_up(parsed.wind.speed * 3.6),
        observed_at: timestamp(CURRENT_PAYLOAD, parsed.dt)?,
    })
}

#[derive(Debug)]
struct IconTally {
    icon: String,
    condition: String,
    count: usize,
}

/// Samples collected for one calendar day.
#[derive(Debug, Default)]
struct DayBucket {
    temps: Vec<f64>,
    icons: Vec<IconTally>,
}

impl DayBucket {
    fn push(&mut self, temp: f64, condition: OwCondition) {
        self.temps.push(temp);
        match self.icons.iter_mut().find(|t| t.icon == condition.icon) {
            Some(tally) => tally.count += 1,
            None => self.icons.push(IconTally {
                icon: condition.icon,
                condition: condition.description,
                count: 1,
            }),
        }
    }

    fn summarize(self, date: NaiveDate) -> DailyForecastSummary {
        let mean = self.temps.iter().sum::<f64>() / self.temps.len() as f64;

        // Tallies are in first-seen order; on ties the later icon wins.
        let mut best: Option<IconTally> = None;
        for tally in self.icons {
            if best.as_ref().is_none_or(|b| tally.count >= b.count) {
                best = Some(tally);
            }
        }
        let (icon_code, condition) =
            best.map(|t| (t.icon, t.condition)).unwrap_or_default();

        DailyForecastSummary { date, avg_temperature_c: round_half_up(mean), icon_code, condition }
    }
}

/// Reduce the 5-day/3-hour feed to one summary per day, starting tomorrow
/// in the default +09:00 zone.
pub fn format_forecast(raw: &Value) -> Result<Vec<DailyForecastSummary>, ApiError> {
    format_forecast_at(raw, Utc::now(), utc_offset(DEFAULT_UTC_OFFSET_HOURS))
}

/// Like [`format_forecast`] with an explicit reference instant and zone.
///
/// Samples are grouped by their calendar date in `offset`. Dates on or
/// before the date of `now` in `offset` are dropped. At most
/// [`MAX_FORECAST_DAYS`] summaries are returned, in ascending date order.
pub fn format_forecast_at(
    raw: &Value,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Vec<DailyForecastSummary>, ApiError> {
    let list = raw.get("list").and_then(Value::as_array).ok_or_else(|| {
        ApiError::formatting(
            FORECAST_PAYLOAD,
            FormatCause::TypeMismatch { field: "list", expected: "an array" },
        )
    })?;

    let today = now.with_timezone(&offset).date_naive();
    let mut days: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();

    for item in list {
        let SampleTime { dt } =
            SampleTime::deserialize(item).map_err(|e| ApiError::formatting(FORECAST_PAYLOAD, e))?;

        let date = timestamp(FORECAST_PAYLOAD, dt)?.with_timezone(&offset).date_naive();
        if date <= today {
            continue;
        }

        let entry =
            RawForecastEntry::deserialize(item).map_err(|e| ApiError::formatting(FORECAST_PAYLOAD, e))?;

        let condition = entry
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::formatting(FORECAST_PAYLOAD, FormatCause::MissingCondition))?;

        days.entry(date).or_default().push(entry.main.temp, condition);
    }

    Ok(days
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .map(|(date, bucket)| bucket.summarize(date))
        .collect())
}
