use std::time::Duration;

use axum::http::StatusCode;
use quote_ingestor::{
    errors::Error as TransformError,
    providers::{ProviderError, ProviderInitError},
};
use shared_utils::config::ConfigError;
use thiserror::Error;

/// Why a proxied request did not produce a quote body.
///
/// Only the status from [`ProxyError::status`] reaches the caller. The error
/// itself is for the log.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream fetch failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("quote transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("upstream task ended without reporting an outcome")]
    TaskAborted,

    #[error("upstream deadline of {deadline:?} exceeded")]
    Timeout { deadline: Duration },
}

impl ProxyError {
    /// True for any flavour of the request deadline expiring.
    pub fn is_timeout(&self) -> bool {
        match self {
            ProxyError::Timeout { .. } => true,
            ProxyError::Provider(e) => e.is_timeout(),
            _ => false,
        }
    }

    pub fn status(&self) -> StatusCode {
        if self.is_timeout() {
            StatusCode::GATEWAY_TIMEOUT
        } else {
            StatusCode::BAD_GATEWAY
        }
    }
}

/// Process-scope failures. Any of these ends the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("cannot listen on {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not gracefully shut down the server within {period:?}")]
    Drain { period: Duration },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to set up the quote provider: {0}")]
    Provider(#[from] ProviderInitError),

    #[error("write timeout {write:?} must exceed the upstream deadline {request:?}")]
    TimeoutOrder { write: Duration, request: Duration },
}
