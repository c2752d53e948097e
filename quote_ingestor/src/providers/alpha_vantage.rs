//! Alpha Vantage daily time series over plain HTTPS GET.

pub mod client;
pub mod params;
pub mod provider;
mod response;

pub use client::QuoteClient;
pub use provider::AlphaVantageProvider;
