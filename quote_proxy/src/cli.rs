use std::{num::NonZeroUsize, path::PathBuf};

use clap::Parser;
use quote_ingestor::{
    models::request_params::{DailySeriesParams, SeriesFunction},
    providers::alpha_vantage::params::DEFAULT_BASE_URL,
};
use secrecy::SecretString;
use shared_utils::config::resolve_secret;

use crate::{
    config::{DEFAULT_LISTEN_ADDR, ServiceConfig, Timeouts},
    errors::ServiceError,
};

/// Environment variable holding the upstream API key.
pub const API_KEY_ENV: &str = "APIKEY";

#[derive(Parser, Debug)]
#[command(version, about = "Proxy serving a stock's most recent daily closing prices")]
pub struct Cli {
    /// Server listen address
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: String,

    /// URL of the stock quote API
    #[arg(long = "api-url", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// File containing the API key, read when APIKEY is unset
    #[arg(long = "api-keyfile", value_name = "FILE")]
    pub api_keyfile: Option<PathBuf>,

    /// Number of most recent days to serve
    #[arg(long = "num-days", env = "NDAYS", default_value = "10")]
    pub num_days: NonZeroUsize,

    /// Stock symbol to look up
    #[arg(long, env = "SYMBOL", default_value = "MSFT")]
    pub symbol: String,

    /// Upstream time series function
    #[arg(long, default_value_t = SeriesFunction::default())]
    pub function: SeriesFunction,
}

impl Cli {
    /// Resolves the API key and freezes everything into a [`ServiceConfig`].
    pub fn into_config(self) -> Result<ServiceConfig, ServiceError> {
        self.resolve(API_KEY_ENV)
    }

    fn resolve(self, key_env: &str) -> Result<ServiceConfig, ServiceError> {
        let api_key = resolve_secret(key_env, self.api_keyfile.as_deref())?;
        let timeouts = Timeouts::default();
        timeouts.validate()?;

        Ok(ServiceConfig {
            listen_addr: self.listen_addr,
            api_base_url: self.api_url,
            api_key: SecretString::from(api_key),
            series: DailySeriesParams {
                symbol: self.symbol,
                function: self.function,
            },
            window: self.num_days,
            timeouts,
        })
    }
}
