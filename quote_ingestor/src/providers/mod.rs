//! Provider abstraction for the upstream quote API.
//!
//! This module defines the [`QuoteProvider`] trait, the seam between the request
//! orchestration in the proxy and the vendor-specific HTTP details. The concrete
//! [`alpha_vantage::AlphaVantageProvider`] issues one GET per call through a
//! [`QuoteClient`](alpha_vantage::QuoteClient) and decodes the body into a
//! [`QuoteSeries`].
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`Arc<dyn QuoteProvider>`), which is how the proxy shares one provider across
//! all in-flight requests.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use quote_ingestor::models::quote_series::QuoteSeries;
//! use quote_ingestor::providers::{ProviderError, QuoteProvider};
//! use tokio::time::Instant;
//!
//! struct CannedProvider(QuoteSeries);
//!
//! #[async_trait]
//! impl QuoteProvider for CannedProvider {
//!     async fn fetch_daily_series(&self, _deadline: Instant) -> Result<QuoteSeries, ProviderError> {
//!         Ok(self.0.clone())
//!     }
//!
//!     fn endpoint(&self) -> String {
//!         "canned".to_string()
//!     }
//! }
//! ```

pub mod alpha_vantage;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};
use tokio::time::Instant;

use crate::{errors::Error, models::quote_series::QuoteSeries};

/// Fetches the configured symbol's daily series from a quote vendor.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Performs one upstream call and decodes the result.
    ///
    /// The call must give up once `deadline` passes. Any response body is
    /// released before this returns, whatever the outcome.
    async fn fetch_daily_series(&self, deadline: Instant) -> Result<QuoteSeries, ProviderError>;

    /// Upstream location for log lines, with credentials redacted.
    fn endpoint(&self) -> String;
}

/// Errors that can occur while constructing a provider.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The configured base URL cannot be parsed or extended.
    #[snafu(display("Invalid API base URL {url:?}: {source}"))]
    InvalidUrl {
        url: String,
        source: url::ParseError,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `QuoteProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// Transport failure: DNS, connect, TLS, or the deadline expiring mid-request.
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The upstream answered with a non-success status.
    #[snafu(display("API returned HTTP {status}: {message}"))]
    Status {
        status: reqwest::StatusCode,
        message: String,
        backtrace: Backtrace,
    },

    /// The provider's API reported an error in an otherwise successful response
    /// (invalid API key, rate limiting).
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The body could not be turned into a quote series.
    #[snafu(display("Invalid quote payload: {source}"))]
    Decode {
        source: Error,
        backtrace: Backtrace,
    },
}

impl ProviderError {
    /// True when the transport gave up because the deadline passed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Reqwest { source, .. } if source.is_timeout())
    }
}
