//! 스트림 제어/데이터 프레임.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{SessionError, SessionResult};

/// 구독 요청 프레임.
#[derive(Debug, Serialize)]
pub struct SubscribeRequest<'a> {
    pub method: &'static str,
    pub params: &'a [String],
    pub id: u64,
}

impl<'a> SubscribeRequest<'a> {
    pub fn new(params: &'a [String], id: u64) -> Self {
        Self {
            method: "SUBSCRIBE",
            params,
            id,
        }
    }
}

/// 구독 요청 프레임을 JSON 텍스트로 직렬화.
pub fn subscribe_frame(channels: &[String], id: u64) -> SessionResult<String> {
    Ok(serde_json::to_string(&SubscribeRequest::new(channels, id))?)
}

/// 채널 목록으로 결합 스트림 경로 생성 (`stream?streams=a/b`).
pub fn stream_path(channels: &[String]) -> String {
    format!("stream?streams={}", channels.join("/"))
}

/// 수신 프레임 분류 결과.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// 구독 확인 (`{"result": null, "id": n}`)
    Confirmation { id: Option<u64> },
    /// 데이터 프레임 (`{"stream": "...", "data": {...}}`)
    Data { stream: String, data: Value },
}

impl InboundFrame {
    /// JSON 텍스트 프레임 파싱.
    ///
    /// # Errors
    /// JSON이 아니거나 확인/데이터 프레임 어느 쪽에도 해당하지 않으면 `SessionError::Protocol`.
    pub fn parse(text: &str) -> SessionResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Object(object) => Self::from_object(object),
            other => Err(SessionError::Protocol(format!(
                "frame is not a JSON object: {}",
                other
            ))),
        }
    }

    fn from_object(mut object: Map<String, Value>) -> SessionResult<Self> {
        let has_payload = object.contains_key("stream") || object.contains_key("data");

        if !has_payload && matches!(object.get("result"), Some(Value::Null)) {
            return Ok(InboundFrame::Confirmation {
                id: object.get("id").and_then(Value::as_u64),
            });
        }

        if let Some(error) = object.get("error") {
            return Err(SessionError::Protocol(format!(
                "request rejected by server: {}",
                error
            )));
        }

        if !matches!(object.get("stream"), Some(Value::String(_))) || !object.contains_key("data")
        {
            return Err(SessionError::Protocol(format!(
                "unexpected frame schema: {}",
                Value::Object(object)
            )));
        }

        match (object.remove("stream"), object.remove("data")) {
            (Some(Value::String(stream)), Some(data)) => Ok(InboundFrame::Data { stream, data }),
            _ => Err(SessionError::Protocol("unexpected frame schema".to_string())),
        }
    }
}
