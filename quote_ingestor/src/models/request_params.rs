use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which daily series endpoint of the quote API to call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeriesFunction {
    TimeSeriesDaily,
    #[default]
    TimeSeriesDailyAdjusted,
}

impl SeriesFunction {
    /// Value of the `function` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesFunction::TimeSeriesDaily => "TIME_SERIES_DAILY",
            SeriesFunction::TimeSeriesDailyAdjusted => "TIME_SERIES_DAILY_ADJUSTED",
        }
    }
}

impl fmt::Display for SeriesFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unsupported series function {0:?}")]
pub struct UnknownSeriesFunction(pub String);

impl FromStr for SeriesFunction {
    type Err = UnknownSeriesFunction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TIME_SERIES_DAILY" => Ok(SeriesFunction::TimeSeriesDaily),
            "TIME_SERIES_DAILY_ADJUSTED" => Ok(SeriesFunction::TimeSeriesDailyAdjusted),
            _ => Err(UnknownSeriesFunction(s.to_string())),
        }
    }
}

/// Parameters identifying the one series this process proxies.
///
/// Fixed at startup; callers of the proxy cannot change them per request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySeriesParams {
    /// Stock symbol to look up (e.g. `"IBM"`).
    pub symbol: String,

    /// Endpoint to call.
    #[serde(default)]
    pub function: SeriesFunction,
}

impl DailySeriesParams {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            function: SeriesFunction::default(),
        }
    }
}
