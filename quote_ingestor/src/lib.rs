//! Daily quote ingestion: the upstream quote client and the time-series models.
//!
//! - [`providers`] fetches raw daily series from the quote API behind the
//!   [`QuoteProvider`](providers::QuoteProvider) trait.
//! - [`models`] decodes the payload into a [`QuoteSeries`](models::quote_series::QuoteSeries),
//!   trims it to the most recent days and keeps its closing average current.

pub mod errors;
pub mod models;
pub mod providers;
