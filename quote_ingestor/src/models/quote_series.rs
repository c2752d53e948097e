//! A symbol's daily time series plus the average of its closing prices.
//!
//! [`QuoteSeries`] is built from an upstream payload with [`QuoteSeries::decode`],
//! narrowed with [`QuoteSeries::window_last_n_days`] and written out with
//! [`QuoteSeries::encode`]. Every constructor recomputes the [`ClosingAverage`],
//! so the average always describes the bars the series currently holds.

use std::{collections::BTreeMap, fmt};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

use crate::{
    errors::Error,
    models::{daily_bar::DailyBar, metadata::QuoteMetadata},
};

/// `chrono` format of a time-series key.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Mean closing price rounded to two decimal places.
///
/// Rounding is half away from zero on the hundredths, so a mean of `96.275`
/// becomes `96.28`. Serialized as a string with exactly two fraction digits.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ClosingAverage(f64);

impl ClosingAverage {
    /// Averages the closing prices of `bars`.
    ///
    /// Fails with [`Error::EmptySeries`] when there is nothing to average and
    /// with [`Error::NonFiniteClose`] when a close is NaN or infinite.
    pub fn from_bars(bars: &BTreeMap<String, DailyBar>) -> Result<Self, Error> {
        if bars.is_empty() {
            return Err(Error::EmptySeries);
        }

        let mut total = 0.0;
        for (date, bar) in bars {
            if !bar.close.is_finite() {
                return Err(Error::NonFiniteClose { date: date.clone() });
            }
            total += bar.close;
        }

        let mean = total / bars.len() as f64;
        Ok(Self(round_cents(mean)))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for ClosingAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for ClosingAverage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The upstream shape. Unknown top-level fields (including a `ClosingAverage`
/// produced by [`QuoteSeries::encode`]) are ignored.
#[derive(Deserialize)]
struct Payload {
    #[serde(rename = "Meta Data")]
    metadata: QuoteMetadata,
    #[serde(rename = "Time Series (Daily)")]
    bars: BTreeMap<String, DailyBar>,
}

/// Daily bars keyed by `YYYY-MM-DD`, with metadata and their closing average.
///
/// Keys are unique and kept in ascending order, which for zero-padded dates is
/// also chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteSeries {
    #[serde(rename = "Meta Data")]
    metadata: QuoteMetadata,

    #[serde(rename = "Time Series (Daily)")]
    bars: BTreeMap<String, DailyBar>,

    #[serde(rename = "ClosingAverage")]
    closing_average: ClosingAverage,
}

impl QuoteSeries {
    /// Builds a series and computes its closing average.
    pub fn new(metadata: QuoteMetadata, bars: BTreeMap<String, DailyBar>) -> Result<Self, Error> {
        let closing_average = ClosingAverage::from_bars(&bars)?;
        Ok(Self {
            metadata,
            bars,
            closing_average,
        })
    }

    /// Parses an upstream JSON payload.
    ///
    /// Numeric strings become numbers. A payload that is not JSON, or lacks
    /// `"Meta Data"`, `"Time Series (Daily)"` or a bar field, fails with
    /// [`Error::Decode`]. An empty time series fails with [`Error::EmptySeries`].
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let payload: Payload = serde_json::from_slice(bytes).map_err(Error::Decode)?;
        Self::new(payload.metadata, payload.bars)
    }

    /// Serializes to the wire shape, closing average included.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(Error::Encode)
    }

    /// Returns the series with its closing average recomputed from its bars.
    ///
    /// Applying this repeatedly yields the same average.
    pub fn with_closing_average(self) -> Result<Self, Error> {
        Self::new(self.metadata, self.bars)
    }

    /// Keeps the `n` most recent days.
    ///
    /// Every key must be a `YYYY-MM-DD` date or the whole operation fails with
    /// [`Error::DateParse`]. A series shorter than `n` is returned whole. `n == 0`
    /// leaves nothing to average and fails with [`Error::EmptySeries`].
    pub fn window_last_n_days(&self, n: usize) -> Result<Self, Error> {
        for key in self.bars.keys() {
            parse_date_key(key)?;
        }

        // Zero-padded keys sort chronologically, so the tail of the map is the newest.
        let recent = self
            .bars
            .iter()
            .rev()
            .take(n)
            .map(|(date, bar)| (date.clone(), *bar))
            .collect();

        Self::new(self.metadata.clone(), recent)
    }

    pub fn metadata(&self) -> &QuoteMetadata {
        &self.metadata
    }

    pub fn bars(&self) -> &BTreeMap<String, DailyBar> {
        &self.bars
    }

    pub fn closing_average(&self) -> ClosingAverage {
        self.closing_average
    }

    /// Number of days in the series.
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Parses a time-series key, insisting on the zero-padded `YYYY-MM-DD` form.
pub fn parse_date_key(key: &str) -> Result<NaiveDate, Error> {
    let date_parse = |reason: String| Error::DateParse {
        key: key.to_string(),
        reason,
    };

    if key.len() != 10 {
        return Err(date_parse("expected exactly 10 characters".into()));
    }
    NaiveDate::parse_from_str(key, DATE_FORMAT).map_err(|e| date_parse(e.to_string()))
}
