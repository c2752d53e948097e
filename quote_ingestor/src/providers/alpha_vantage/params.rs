use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use url::Url;

use crate::{
    models::request_params::DailySeriesParams,
    providers::{InvalidUrlSnafu, ProviderInitError},
};

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";

/// Query value that replaces the API key in anything we log.
const REDACTED: &str = "REDACTED";

/// Builds `<base>/query?symbol=..&function=..&apikey=..`.
///
/// `query` is appended to whatever path the base already has, so a base of
/// `http://host/av` yields `http://host/av/query`.
pub fn construct_url(
    base_url: &str,
    params: &DailySeriesParams,
    api_key: &SecretString,
) -> Result<Url, ProviderInitError> {
    let mut base = Url::parse(base_url).context(InvalidUrlSnafu { url: base_url })?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let mut url = base.join("query").context(InvalidUrlSnafu { url: base_url })?;
    url.query_pairs_mut()
        .clear()
        .append_pair("symbol", &params.symbol)
        .append_pair("function", params.function.as_str())
        .append_pair("apikey", api_key.expose_secret());

    Ok(url)
}

/// Renders `url` with the `apikey` query value masked.
pub fn redact_api_key(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "apikey" {
                REDACTED.to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
