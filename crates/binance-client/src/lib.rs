//! Binance REST 클라이언트와 다중 채널 WebSocket 세션 엔진.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - [`BinanceClient`]: 서명 요청을 지원하는 REST 클라이언트
//! - [`stream`]: 구독, 연결 세션(자동 재연결), 세션 그룹(첫 실패 시 전체 취소)
//! - [`TlsTrust`]: REST와 WebSocket이 공유하는 TLS 신뢰 설정
//!
//! # 예시
//!
//! ```ignore
//! use binance_client::stream::{handler_fn, TradeSubscription};
//! use binance_client::BinanceClient;
//! use binance_core::Pair;
//! use tokio_util::sync::CancellationToken;
//!
//! let client = BinanceClient::from_env()?;
//! let mut group = client.session_group();
//! group.compose_subscriptions(vec![Box::new(TradeSubscription::new(
//!     Pair::new("ETH", "BTC"),
//!     vec![handler_fn(|msg| async move {
//!         println!("{msg}");
//!         Ok(())
//!     })],
//! ))]);
//! group.start_subscriptions(CancellationToken::new()).await?;
//! ```

pub mod error;
pub mod rest;
pub mod stream;
pub mod tls;
pub mod traits;

pub use error::*;
pub use rest::{BinanceClient, CancelOrder, LimitOrder, RestResponse};
pub use tls::{TlsTrust, TrustSource};
pub use traits::UserDataStreamApi;
