//! Chat "flex" message built from the formatted weather records.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike};
use serde_json::{Value, json};

use crate::model::{CurrentWeatherRecord, DailyForecastSummary};

/// Forecast days that fit in the message bubble.
pub const MESSAGE_FORECAST_DAYS: usize = 3;

const ACCENT: &str = "#5c6bc0";
const MUTED: &str = "#78909c";
const TEXT: &str = "#37474f";
const PANEL: &str = "#f5f7fa";
const SEPARATOR: &str = "#e1e5ee";

const WEEKDAYS_JA: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

/// Image URL for an OpenWeather icon code, either on the provider CDN or
/// under the widget's bundled images.
pub fn icon_url(icon_code: &str, cdn: bool) -> String {
    if icon_code.is_empty() {
        return String::new();
    }

    if cdn {
        format!("https://openweathermap.org/img/wn/{icon_code}@2x.png")
    } else {
        let digits: String = icon_code.chars().filter(char::is_ascii_digit).collect();
        let variant: String = icon_code.chars().filter(|c| !c.is_ascii_digit()).collect();
        format!("public/images/weather/{digits}{variant}.png")
    }
}

pub fn weekday_ja(date: NaiveDate) -> &'static str {
    WEEKDAYS_JA[date.weekday().num_days_from_sunday() as usize]
}

/// `1月11日（木）`
pub fn format_date_ja(date: NaiveDate) -> String {
    format!("{}月{}日（{}）", date.month(), date.day(), weekday_ja(date))
}

fn format_timestamp_ja(now: DateTime<FixedOffset>) -> String {
    format!(
        "{}年{}月{}日 {}:{:02}",
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute()
    )
}

fn label_value(label: &str, value: String) -> Value {
    json!({
        "type": "box",
        "layout": "vertical",
        "contents": [
            { "type": "text", "text": label, "size": "sm", "color": MUTED },
            { "type": "text", "text": value, "size": "sm", "color": TEXT }
        ],
        "flex": 1
    })
}

fn forecast_column(day: &DailyForecastSummary) -> Value {
    json!({
        "type": "box",
        "layout": "vertical",
        "contents": [
            { "type": "text", "text": format_date_ja(day.date), "size": "xs", "color": ACCENT },
            { "type": "image", "url": icon_url(&day.icon_code, false), "size": "xs", "margin": "md" },
            {
                "type": "text",
                "text": format!("{}°C", day.avg_temperature_c),
                "size": "sm",
                "margin": "md",
                "color": TEXT
            }
        ],
        "alignItems": "center",
        "backgroundColor": PANEL,
        "cornerRadius": "md",
        "paddingAll": "sm",
        "margin": "xs"
    })
}

/// Flex bubble summarising current conditions and the next few days.
///
/// `now` is rendered in the header in its own offset.
pub fn build_flex_message(
    current: &CurrentWeatherRecord,
    forecast: &[DailyForecastSummary],
    now: DateTime<FixedOffset>,
) -> Value {
    let columns: Vec<Value> =
        forecast.iter().take(MESSAGE_FORECAST_DAYS).map(forecast_column).collect();

    json!({
        "type": "flex",
        "altText": format!("{}の天気予報", current.location),
        "contents": {
            "type": "bubble",
            "size": "kilo",
            "header": {
                "type": "box",
                "layout": "vertical",
                "contents": [
                    {
                        "type": "text",
                        "text": format!("{}の天気", current.location),
                        "weight": "bold",
                        "size": "xl",
                        "color": "#ffffff"
                    },
                    {
                        "type": "text",
                        "text": format_timestamp_ja(now),
                        "size": "xs",
                        "color": "#ffffff",
                        "margin": "md"
                    }
                ],
                "backgroundColor": ACCENT
            },
            "body": {
                "type": "box",
                "layout": "vertical",
                "contents": [
                    {
                        "type": "box",
                        "layout": "horizontal",
                        "contents": [
                            {
                                "type": "box",
                                "layout": "vertical",
                                "contents": [
                                    { "type": "image", "url": icon_url(&current.icon_code, true), "size": "md" }
                                ],
                                "width": "30%"
                            },
                            {
                                "type": "box",
                                "layout": "vertical",
                                "contents": [
                                    {
                                        "type": "text",
                                        "text": format!("{}°C", current.temperature_c),
                                        "size": "xxl",
                                        "weight": "bold",
                                        "color": ACCENT
                                    },
                                    {
                                        "type": "text",
                                        "text": current.condition,
                                        "size": "sm",
                                        "margin": "md",
                                        "color": MUTED
                                    }
                                ]
                            }
                        ]
                    },
                    {
                        "type": "box",
                        "layout": "horizontal",
                        "contents": [
                            label_value("湿度", format!("{}%", current.humidity_pct)),
                            label_value("風速", format!("{}km/h", current.wind_speed_kmh))
                        ],
                        "margin": "lg",
                        "backgroundColor": PANEL,
                        "cornerRadius": "md",
                        "paddingAll": "md"
                    },
                    { "type": "separator", "margin": "lg" },
                    { "type": "text", "text": "週間予報", "weight": "bold", "margin": "lg", "color": ACCENT },
                    {
                        "type": "box",
                        "layout": "horizontal",
                        "contents": columns,
                        "margin": "md",
                        "spacing": "md"
                    }
                ],
                "backgroundColor": "#ffffff"
            },
            "footer": {
                "type": "box",
                "layout": "vertical",
                "contents": [
                    { "type": "text", "text": "LINE WORKS 天気予報", "size": "xs", "color": MUTED, "align": "center" }
                ],
                "backgroundColor": PANEL,
                "paddingAll": "md"
            },
            "styles": {
                "header": { "backgroundColor": ACCENT },
                "body": { "backgroundColor": "#ffffff", "separator": true, "separatorColor": SEPARATOR },
                "footer": { "backgroundColor": PANEL, "separator": true, "separatorColor": SEPARATOR }
            }
        }
    })
}
