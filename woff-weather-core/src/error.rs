//! Error taxonomy shared by the fetch client, the provider and the formatters.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Fixed classification codes surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Timeout,
    Network,
    Api,
    Validation,
    Formatting,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Timeout => "TIMEOUT_ERROR",
            ErrorCode::Network => "NETWORK_ERROR",
            ErrorCode::Api => "API_ERROR",
            ErrorCode::Validation => "VALIDATION_ERROR",
            ErrorCode::Formatting => "FORMATTING_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query operation that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetCurrentWeather,
    GetForecast,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetCurrentWeather => "get_current_weather",
            Operation::GetForecast => "get_forecast",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Underlying reason a provider payload could not be formatted.
#[derive(Debug, Error)]
pub enum FormatCause {
    #[error("field `{field}` is missing or not {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    #[error("`weather` array has no condition entry")]
    MissingCondition,

    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("weather API request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP response. `body` is the parsed JSON error body, or an
    /// empty object when the body was not JSON.
    #[error("{message}")]
    Api {
        status: u16,
        status_text: String,
        message: String,
        body: Value,
    },

    #[error("invalid city name: {0:?}")]
    Validation(String),

    #[error("malformed {payload} data")]
    Formatting {
        payload: &'static str,
        #[source]
        source: FormatCause,
    },

    /// Adds the failing query and its input to an already classified error.
    #[error("{operation} failed for city {city:?}")]
    Context {
        operation: Operation,
        city: String,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    pub(crate) fn from_status(status: StatusCode, body: Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("API error: {}", status.as_u16()));

        ApiError::Api {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            message,
            body,
        }
    }

    pub(crate) fn formatting(payload: &'static str, cause: impl Into<FormatCause>) -> Self {
        ApiError::Formatting { payload, source: cause.into() }
    }

    /// Wrap this error with the name of the failing operation and its city.
    pub fn with_context(self, operation: Operation, city: &str) -> Self {
        ApiError::Context { operation, city: city.to_string(), source: Box::new(self) }
    }

    /// Classification code, looking through any operation context.
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Timeout { .. } => ErrorCode::Timeout,
            ApiError::Network(_) => ErrorCode::Network,
            ApiError::Api { .. } => ErrorCode::Api,
            ApiError::Validation(_) => ErrorCode::Validation,
            ApiError::Formatting { .. } => ErrorCode::Formatting,
            ApiError::Context { source, .. } => source.code(),
        }
    }

    /// HTTP status, when the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Context { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            ApiError::Context { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    /// Auth, permission and not-found responses, validation failures and
    /// unparseable payloads are permanent. Anything else may succeed on
    /// another attempt.
    pub fn is_retryable(&self) -> bool {
        if matches!(self.code(), ErrorCode::Validation | ErrorCode::Formatting) {
            return false;
        }
        !matches!(self.status(), Some(401 | 403 | 404))
    }
}

/// Failures of the send-to-chat flow in [`crate::session::WeatherSession`].
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("sending weather is only available inside the chat client")]
    NotInClient,

    #[error("weather data has not been loaded yet, refresh and try again")]
    NotLoaded,
}
