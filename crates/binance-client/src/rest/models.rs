//! REST 요청/응답 타입.

use binance_core::{OrderResponseType, OrderSide, Pair, TimeInForce};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ClientError, ClientResult};

/// REST 호출 결과.
///
/// 응답 본문이 비어 있으면 `response`는 `Value::Null`입니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestResponse {
    /// HTTP 상태 코드
    pub status_code: u16,
    /// JSON 응답 본문
    pub response: Value,
}

impl RestResponse {
    /// 응답 본문의 문자열 필드 조회.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.response.get(field).and_then(Value::as_str)
    }
}

/// Binance 에러 응답 본문.
#[derive(Debug, Deserialize)]
pub(crate) struct BinanceError {
    pub code: i32,
    pub msg: String,
}

/// 지정가 주문 요청.
#[derive(Debug, Clone)]
pub struct LimitOrder {
    pub pair: Pair,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub quote_order_quantity: Option<Decimal>,
    pub time_in_force: Option<TimeInForce>,
    pub new_client_order_id: Option<String>,
    pub iceberg_quantity: Option<Decimal>,
    pub new_order_response_type: Option<OrderResponseType>,
    pub recv_window_ms: Option<u64>,
}

impl LimitOrder {
    /// 새 지정가 주문 요청 생성.
    pub fn new(pair: Pair, side: OrderSide, quantity: Decimal, price: Decimal) -> Self {
        Self {
            pair,
            side,
            quantity,
            price,
            quote_order_quantity: None,
            time_in_force: None,
            new_client_order_id: None,
            iceberg_quantity: None,
            new_order_response_type: None,
            recv_window_ms: None,
        }
    }

    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
        self
    }

    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.new_client_order_id = Some(id.into());
        self
    }

    pub fn with_iceberg_quantity(mut self, quantity: Decimal) -> Self {
        self.iceberg_quantity = Some(quantity);
        self
    }

    pub fn with_response_type(mut self, response_type: OrderResponseType) -> Self {
        self.new_order_response_type = Some(response_type);
        self
    }

    pub fn with_recv_window_ms(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = Some(recv_window_ms);
        self
    }

    /// 요청 파라미터 목록 (누락 값 포함).
    pub(crate) fn params(&self) -> ClientResult<Vec<(&'static str, Option<String>)>> {
        if self.quantity <= Decimal::ZERO {
            return Err(ClientError::InvalidQuantity(format!(
                "수량은 0보다 커야 합니다: {}",
                self.quantity
            )));
        }
        if self.price <= Decimal::ZERO {
            return Err(ClientError::InvalidRequest(format!(
                "가격은 0보다 커야 합니다: {}",
                self.price
            )));
        }

        Ok(vec![
            ("symbol", Some(self.pair.to_string())),
            ("side", Some(self.side.as_str().to_string())),
            ("type", Some("LIMIT".to_string())),
            ("timeInForce", self.time_in_force.map(|t| t.as_str().to_string())),
            ("quantity", Some(self.quantity.to_string())),
            ("quoteOrderQty", self.quote_order_quantity.map(|q| q.to_string())),
            ("price", Some(self.price.to_string())),
            ("newClientOrderId", self.new_client_order_id.clone()),
            ("icebergQty", self.iceberg_quantity.map(|q| q.to_string())),
            (
                "newOrderRespType",
                self.new_order_response_type.map(|t| t.as_str().to_string()),
            ),
            ("recvWindow", self.recv_window_ms.map(|w| w.to_string())),
        ])
    }
}

/// 주문 취소 요청.
///
/// `order_id` 또는 `orig_client_order_id` 중 하나는 반드시 지정해야 합니다.
#[derive(Debug, Clone)]
pub struct CancelOrder {
    pub pair: Pair,
    pub order_id: Option<u64>,
    pub orig_client_order_id: Option<String>,
    pub new_client_order_id: Option<String>,
    pub recv_window_ms: Option<u64>,
}

impl CancelOrder {
    /// 거래소 주문 ID로 취소.
    pub fn by_order_id(pair: Pair, order_id: u64) -> Self {
        Self {
            pair,
            order_id: Some(order_id),
            orig_client_order_id: None,
            new_client_order_id: None,
            recv_window_ms: None,
        }
    }

    /// 클라이언트 주문 ID로 취소.
    pub fn by_client_order_id(pair: Pair, client_order_id: impl Into<String>) -> Self {
        Self {
            pair,
            order_id: None,
            orig_client_order_id: Some(client_order_id.into()),
            new_client_order_id: None,
            recv_window_ms: None,
        }
    }

    pub(crate) fn params(&self) -> ClientResult<Vec<(&'static str, Option<String>)>> {
        if self.order_id.is_none() && self.orig_client_order_id.is_none() {
            return Err(ClientError::InvalidRequest(
                "orderId 또는 origClientOrderId가 필요합니다".to_string(),
            ));
        }

        Ok(vec![
            ("symbol", Some(self.pair.to_string())),
            ("orderId", self.order_id.map(|id| id.to_string())),
            ("origClientOrderId", self.orig_client_order_id.clone()),
            ("newClientOrderId", self.new_client_order_id.clone()),
            ("recvWindow", self.recv_window_ms.map(|w| w.to_string())),
        ])
    }
}
