//! 구독 정의.
//!
//! 구독 하나는 논리적 스트림 하나(채널 하나)에 대응하며, 해당 채널로 들어온
//! 데이터 프레임을 등록된 핸들러들에 전달합니다.

use async_trait::async_trait;
use binance_core::Pair;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::handler::{dispatch, MessageHandler};
use crate::traits::UserDataStreamApi;
use crate::{SessionError, SessionResult};

/// 하나의 연결을 공유하는 구독 묶음 (순서 유지).
pub type Bundle = Vec<Box<dyn Subscription>>;

/// 스트림 구독.
///
/// 채널 이름은 한 세션 동안 바뀌지 않아야 합니다. 세션은 매 연결 시도마다
/// `initialize`를 다시 호출하므로, 구현체는 재초기화 시 채널 이름을 유지해야 합니다.
#[async_trait]
pub trait Subscription: Send + Sync {
    /// 구독 채널 이름. `initialize` 이후에만 유효할 수 있습니다.
    fn channel_name(&self) -> SessionResult<String>;

    /// 비동기 초기화 (기본: 아무 작업 없음).
    async fn initialize(&mut self) -> SessionResult<()> {
        Ok(())
    }

    /// 등록된 메시지 핸들러.
    fn handlers(&self) -> &[Arc<dyn MessageHandler>];

    /// 데이터 페이로드를 모든 핸들러에 전달.
    async fn handle(&self, message: &Value) -> SessionResult<()> {
        let channel = self.channel_name()?;
        dispatch(&channel, self.handlers(), message).await
    }
}

/// 전체 심볼 최우선 호가 스트림 (`!bookTicker`).
pub struct BestOrderBookTickerSubscription {
    handlers: Vec<Arc<dyn MessageHandler>>,
}

impl BestOrderBookTickerSubscription {
    pub const CHANNEL: &'static str = "!bookTicker";

    pub fn new(handlers: Vec<Arc<dyn MessageHandler>>) -> Self {
        Self { handlers }
    }
}

#[async_trait]
impl Subscription for BestOrderBookTickerSubscription {
    fn channel_name(&self) -> SessionResult<String> {
        Ok(Self::CHANNEL.to_string())
    }

    fn handlers(&self) -> &[Arc<dyn MessageHandler>] {
        &self.handlers
    }
}

/// 거래쌍 체결 스트림 (`<pair>@trade`).
pub struct TradeSubscription {
    pair: Pair,
    handlers: Vec<Arc<dyn MessageHandler>>,
}

impl TradeSubscription {
    pub fn new(pair: Pair, handlers: Vec<Arc<dyn MessageHandler>>) -> Self {
        Self { pair, handlers }
    }

    pub fn pair(&self) -> &Pair {
        &self.pair
    }
}

#[async_trait]
impl Subscription for TradeSubscription {
    fn channel_name(&self) -> SessionResult<String> {
        Ok(format!("{}@trade", self.pair.stream_symbol()))
    }

    fn handlers(&self) -> &[Arc<dyn MessageHandler>] {
        &self.handlers
    }
}

/// 계좌(사용자 데이터) 스트림.
///
/// 채널 이름은 초기화 시 REST로 발급받은 listen key입니다.
/// 재연결로 다시 초기화되면 기존 키를 keep-alive로 연장하고 그대로 사용합니다.
pub struct AccountSubscription {
    api: Arc<dyn UserDataStreamApi>,
    listen_key: Option<String>,
    handlers: Vec<Arc<dyn MessageHandler>>,
}

impl AccountSubscription {
    pub fn new(api: Arc<dyn UserDataStreamApi>, handlers: Vec<Arc<dyn MessageHandler>>) -> Self {
        Self {
            api,
            listen_key: None,
            handlers,
        }
    }

    /// 발급받은 listen key (초기화 전이면 `None`).
    pub fn listen_key(&self) -> Option<&str> {
        self.listen_key.as_deref()
    }
}

#[async_trait]
impl Subscription for AccountSubscription {
    fn channel_name(&self) -> SessionResult<String> {
        self.listen_key.clone().ok_or_else(|| {
            SessionError::Precondition(
                "account subscription has no listen key; initialize() must run first".to_string(),
            )
        })
    }

    async fn initialize(&mut self) -> SessionResult<()> {
        match &self.listen_key {
            None => {
                let listen_key = self
                    .api
                    .create_listen_key()
                    .await
                    .map_err(SessionError::Initialization)?;
                info!("Listen key acquired for account stream");
                self.listen_key = Some(listen_key);
            }
            Some(listen_key) => {
                self.api
                    .keep_alive_listen_key(listen_key)
                    .await
                    .map_err(SessionError::Initialization)?;
                debug!("Listen key kept alive");
            }
        }
        Ok(())
    }

    fn handlers(&self) -> &[Arc<dyn MessageHandler>] {
        &self.handlers
    }
}
