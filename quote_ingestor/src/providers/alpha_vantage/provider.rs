use async_trait::async_trait;
use secrecy::SecretString;
use snafu::ResultExt;
use tokio::time::Instant;
use tracing::debug;

use crate::{
    models::{quote_series::QuoteSeries, request_params::DailySeriesParams},
    providers::{
        DecodeSnafu, ProviderError, ProviderInitError, QuoteProvider, ReqwestSnafu, StatusSnafu,
        alpha_vantage::{
            client::QuoteClient,
            params::{construct_url, redact_api_key},
            response::check_for_api_notice,
        },
    },
};

pub struct AlphaVantageProvider {
    client: QuoteClient,
}

impl AlphaVantageProvider {
    /// Creates a provider for `params` against the API at `base_url`.
    pub fn new(
        base_url: &str,
        params: &DailySeriesParams,
        api_key: &SecretString,
    ) -> Result<Self, ProviderInitError> {
        let url = construct_url(base_url, params, api_key)?;
        Ok(Self::with_client(QuoteClient::new(url)?))
    }

    pub fn with_client(client: QuoteClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    async fn fetch_daily_series(&self, deadline: Instant) -> Result<QuoteSeries, ProviderError> {
        let response = self.client.get(deadline).await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return StatusSnafu { status, message }.fail();
        }

        let body = response.bytes().await.context(ReqwestSnafu)?;
        debug!(bytes = body.len(), "received quote payload");

        check_for_api_notice(&body)?;
        QuoteSeries::decode(&body).context(DecodeSnafu)
    }

    fn endpoint(&self) -> String {
        redact_api_key(self.client.url())
    }
}
