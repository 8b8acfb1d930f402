//! 스트림 페이로드 타입.
//!
//! 핸들러는 원시 `serde_json::Value`를 받으며, 필요하면 여기의 타입으로 디코딩할 수 있습니다.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// 데이터 프레임 페이로드를 타입으로 디코딩.
pub fn decode<T: DeserializeOwned>(message: &Value) -> serde_json::Result<T> {
    T::deserialize(message)
}

/// 최우선 호가 이벤트 (`!bookTicker`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookTicker {
    #[serde(rename = "u")]
    pub update_id: u64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "b")]
    pub bid_price: Decimal,
    #[serde(rename = "B")]
    pub bid_quantity: Decimal,
    #[serde(rename = "a")]
    pub ask_price: Decimal,
    #[serde(rename = "A")]
    pub ask_quantity: Decimal,
}

impl BookTicker {
    /// 매도-매수 호가 차이.
    pub fn spread(&self) -> Decimal {
        self.ask_price - self.bid_price
    }

    /// 중간 가격.
    pub fn mid_price(&self) -> Decimal {
        (self.ask_price + self.bid_price) / Decimal::TWO
    }
}

/// 체결 이벤트 (`<pair>@trade`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TradeEvent {
    #[serde(rename = "E")]
    pub event_time: i64,
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "t")]
    pub trade_id: u64,
    #[serde(rename = "p")]
    pub price: Decimal,
    #[serde(rename = "q")]
    pub quantity: Decimal,
    #[serde(rename = "T")]
    pub trade_time: i64,
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

impl TradeEvent {
    /// 이벤트 시각.
    pub fn event_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.event_time).single()
    }

    /// 이벤트 발생부터 `now`까지의 지연 시간.
    pub fn latency(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.event_datetime().map(|event| now - event)
    }

    /// 체결 금액 (가격 x 수량).
    pub fn notional(&self) -> Decimal {
        self.price * self.quantity
    }
}
