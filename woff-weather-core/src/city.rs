use std::fmt;

use crate::error::ApiError;

/// Returns true if `city` is at least two characters of ASCII letters,
/// whitespace, hyphens, commas or periods.
///
/// Non-ASCII letters are rejected, so `"São Paulo"` does not validate while
/// `"Sao Paulo"` does.
pub fn validate_city(city: &str) -> bool {
    city.chars().count() >= 2
        && city
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || matches!(c, '-' | ',' | '.'))
}

/// A city name that has passed [`validate_city`].
///
/// The provider only accepts this type, so no request is sent for a name
/// that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CityQuery(String);

impl CityQuery {
    pub fn parse(city: &str) -> Result<Self, ApiError> {
        if validate_city(city) {
            Ok(Self(city.to_string()))
        } else {
            Err(ApiError::Validation(city.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CityQuery {
    type Error = ApiError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
