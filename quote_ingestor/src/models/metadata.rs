use serde::{Deserialize, Serialize};

/// Descriptive fields the provider attaches to every daily series.
///
/// Passed through untouched from the upstream payload to the response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteMetadata {
    /// Source label, e.g. "Daily Time Series with Splits and Dividend Events".
    #[serde(rename = "1. Information")]
    pub information: String,

    #[serde(rename = "2. Symbol")]
    pub symbol: String,

    /// Calendar date of the most recent refresh (`YYYY-MM-DD`).
    #[serde(rename = "3. Last Refreshed")]
    pub last_refreshed: String,

    /// "Compact" or "Full Size".
    #[serde(rename = "4. Output Size")]
    pub output_size: String,

    #[serde(rename = "5. Time Zone")]
    pub time_zone: String,
}
