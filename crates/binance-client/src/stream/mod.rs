//! 다중 채널 WebSocket 세션 엔진.
//!
//! - [`Subscription`]: 채널 하나에 대한 구독 (호가, 체결, 계좌)
//! - [`ConnectionSession`]: 구독 묶음 하나를 담당하는 연결 (정상 종료 시 자동 재연결)
//! - [`SessionGroup`]: 여러 세션을 동시에 실행하고, 첫 실패 시 나머지를 모두 취소

pub mod events;
mod frame;
mod group;
mod handler;
mod request_id;
mod session;
mod subscription;

pub use frame::{stream_path, subscribe_frame, InboundFrame, SubscribeRequest};
pub use group::SessionGroup;
pub use handler::{dispatch, handler_fn, FnHandler, MessageHandler};
pub use request_id::RequestIdGenerator;
pub use session::{ConnectionSession, SessionContext, SessionState};
pub use subscription::{
    AccountSubscription, BestOrderBookTickerSubscription, Bundle, Subscription, TradeSubscription,
};
