//! Small helpers shared by the quote workspace crates.

pub mod config;
pub mod env;
