use serde::Deserialize;

use crate::providers::{ApiSnafu, ProviderError};

/// Error envelopes the API sends with a 200 status instead of a series.
#[derive(Deserialize)]
struct ApiNotice {
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    /// Rate limiting.
    #[serde(rename = "Note")]
    note: Option<String>,
    /// Premium endpoint or key problems.
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// Fails with [`ProviderError::Api`] if `body` is an error envelope.
///
/// Bodies that are not JSON objects pass through; decoding reports them.
pub(crate) fn check_for_api_notice(body: &[u8]) -> Result<(), ProviderError> {
    let Ok(notice) = serde_json::from_slice::<ApiNotice>(body) else {
        return Ok(());
    };

    match notice.error_message.or(notice.note).or(notice.information) {
        Some(message) => ApiSnafu { message }.fail(),
        None => Ok(()),
    }
}
