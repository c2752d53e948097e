pub mod daily_bar;
pub mod metadata;
pub mod quote_series;
pub mod request_params;
mod string_number;
