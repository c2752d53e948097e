use thiserror::Error;

/// Errors raised while decoding, windowing or encoding a quote series.
#[derive(Debug, Error)]
pub enum Error {
    /// The payload is not valid JSON or lacks the expected structure.
    #[error("error decoding quote payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// The series could not be serialized back to JSON.
    #[error("error encoding quote series: {0}")]
    Encode(#[source] serde_json::Error),

    /// A time-series key is not a `YYYY-MM-DD` calendar date.
    #[error("error parsing {key:?} as a YYYY-MM-DD date: {reason}")]
    DateParse { key: String, reason: String },

    /// The average of zero closing prices is undefined.
    #[error("cannot compute a closing average over an empty time series")]
    EmptySeries,

    /// A closing price parsed to NaN or infinity.
    #[error("closing price on {date} is not a finite number")]
    NonFiniteClose { date: String },
}
