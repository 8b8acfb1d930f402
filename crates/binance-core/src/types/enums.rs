//! 주문 관련 열거형.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 주문 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl OrderSide {
    /// API 파라미터 값.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

/// 주문 유효 기간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// 취소 시까지 유효 (GTC)
    #[serde(rename = "GTC")]
    GoodTillCancelled,
    /// 즉시 체결 후 잔량 취소 (IOC)
    #[serde(rename = "IOC")]
    ImmediateOrCancelled,
    /// 전량 체결 또는 취소 (FOK)
    #[serde(rename = "FOK")]
    FillOrKill,
}

impl TimeInForce {
    /// API 파라미터 값.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::GoodTillCancelled => "GTC",
            TimeInForce::ImmediateOrCancelled => "IOC",
            TimeInForce::FillOrKill => "FOK",
        }
    }
}

/// 주문 응답 상세 수준.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderResponseType {
    /// 접수 확인만
    Ack,
    /// 주문 결과
    Result,
    /// 체결 내역 포함
    Full,
}

impl OrderResponseType {
    /// API 파라미터 값.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderResponseType::Ack => "ACK",
            OrderResponseType::Result => "RESULT",
            OrderResponseType::Full => "FULL",
        }
    }
}

macro_rules! impl_display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

impl_display_as_str!(OrderSide, TimeInForce, OrderResponseType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_values() {
        assert_eq!(OrderSide::Sell.to_string(), "SELL");
        assert_eq!(TimeInForce::ImmediateOrCancelled.to_string(), "IOC");
        assert_eq!(OrderResponseType::Ack.to_string(), "ACK");
    }
}
