use reqwest::{Client, Response};
use snafu::ResultExt;
use tokio::time::Instant;
use url::Url;

use crate::providers::{ClientBuildSnafu, ProviderError, ProviderInitError, ReqwestSnafu};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Issues GET requests against one preconfigured upstream URL.
///
/// The client is read-only after construction and cheap to share: `reqwest`
/// pools connections internally. Not `Debug`: the URL carries the API key.
#[derive(Clone)]
pub struct QuoteClient {
    client: Client,
    url: Url,
}

impl QuoteClient {
    pub fn new(url: Url) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context(ClientBuildSnafu)?;
        Ok(Self::with_client(client, url))
    }

    /// Uses an existing `reqwest` client, e.g. one with custom TLS settings.
    pub fn with_client(client: Client, url: Url) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Performs a single GET, bounded by `deadline`.
    ///
    /// The bound covers connecting, sending and reading the body, so a caller
    /// that goes on to consume the returned response is still held to it. The
    /// body is not interpreted here; dropping the response releases it.
    pub async fn get(&self, deadline: Instant) -> Result<Response, ProviderError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        self.client
            .get(self.url.clone())
            .timeout(remaining)
            .send()
            .await
            .context(ReqwestSnafu)
    }
}
