//! Resolved service configuration.
//!
//! Everything here is decided once at startup and handed to constructors by
//! value. Nothing is read from the environment after [`crate::cli::Cli`] has
//! produced a [`ServiceConfig`].

use std::{num::NonZeroUsize, time::Duration};

use quote_ingestor::{
    models::request_params::DailySeriesParams,
    providers::{ProviderInitError, alpha_vantage::AlphaVantageProvider},
};
use secrecy::SecretString;

use crate::errors::ServiceError;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

/// Fixed ceilings for one server instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Budget for one upstream call, measured from request arrival.
    pub request: Duration,
    /// Time allowed for a client to send the request head.
    pub read: Duration,
    /// Time allowed to produce and write a response.
    pub write: Duration,
    /// How long a keep-alive connection may sit without a request.
    pub idle: Duration,
    /// How long shutdown waits for in-flight requests.
    pub drain: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(60),
            read: Duration::from_secs(15),
            write: Duration::from_secs(75),
            idle: Duration::from_secs(120),
            drain: Duration::from_secs(30),
        }
    }
}

impl Timeouts {
    /// The write timeout has to outlast the upstream deadline, otherwise a
    /// timed-out request could never be answered with 504.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.write <= self.request {
            return Err(ServiceError::TimeoutOrder {
                write: self.write,
                request: self.request,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: String,
    pub api_base_url: String,
    pub api_key: SecretString,
    pub series: DailySeriesParams,
    /// Number of most recent days served.
    pub window: NonZeroUsize,
    pub timeouts: Timeouts,
}

impl ServiceConfig {
    /// Builds the upstream provider described by this configuration.
    pub fn provider(&self) -> Result<AlphaVantageProvider, ProviderInitError> {
        AlphaVantageProvider::new(&self.api_base_url, &self.series, &self.api_key)
    }

    /// Listen address with a bare `:port` expanded to all interfaces.
    pub fn bind_addr(&self) -> String {
        normalize_listen_addr(&self.listen_addr)
    }
}

pub fn normalize_listen_addr(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    }
}
