//! HTTP proxy serving a stock's recent daily quotes with their closing average.
//!
//! A request to `/` makes exactly one upstream call, trims the series to the
//! configured window and answers with the re-encoded JSON. The upstream call
//! races a fixed deadline; whichever finishes first decides the single response
//! (200, 502 or 504). `/healthz` answers `ok` without touching the upstream.

pub mod cli;
pub mod config;
mod connection;
pub mod errors;
pub mod orchestrator;
pub mod server;
