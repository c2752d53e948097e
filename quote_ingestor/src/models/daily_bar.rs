//! One trading day of OHLCV data as the quote API reports it.

use serde::{Deserialize, Serialize};

use crate::models::string_number;

/// A single daily bar (open, high, low, close, volume).
///
/// Prices and volume travel as decimal strings on the wire but are held as
/// numbers here. The adjusted endpoint's extra fields (adjusted close, dividend
/// amount, split coefficient) are not retained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    /// Opening price.
    #[serde(rename = "1. open", with = "string_number")]
    pub open: f64,

    /// Highest price of the session.
    #[serde(rename = "2. high", with = "string_number")]
    pub high: f64,

    /// Lowest price of the session.
    #[serde(rename = "3. low", with = "string_number")]
    pub low: f64,

    /// Closing price; the input to the closing average.
    #[serde(rename = "4. close", with = "string_number")]
    pub close: f64,

    /// Shares traded. The unadjusted endpoint numbers this field 5.
    #[serde(rename = "6. volume", alias = "5. volume", with = "string_number")]
    pub volume: u64,
}

impl DailyBar {
    /// Bar with every price equal to `close` and no volume.
    pub fn from_close(close: f64) -> Self {
        Self {
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}
