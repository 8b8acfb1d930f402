//! Binance REST API.

mod client;
mod models;

pub use client::{BinanceClient, API_KEY_HEADER};
pub use models::{CancelOrder, LimitOrder, RestResponse};
