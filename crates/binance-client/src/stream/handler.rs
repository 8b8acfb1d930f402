//! 메시지 핸들러.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::error;

use crate::{SessionError, SessionResult};

/// 구독 데이터 프레임의 `data` 페이로드를 처리하는 콜백.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn on_message(&self, message: &Value) -> anyhow::Result<()>;
}

/// 클로저 기반 핸들러.
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> MessageHandler for FnHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn on_message(&self, message: &Value) -> anyhow::Result<()> {
        (self.f)(message.clone()).await
    }
}

/// 비동기 클로저를 핸들러로 감쌉니다.
///
/// ```ignore
/// let handler = handler_fn(|msg| async move {
///     println!("{msg}");
///     Ok(())
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn MessageHandler>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}

/// 메시지 하나를 모든 핸들러에 동시에 전달합니다.
///
/// 모든 핸들러가 끝날 때까지 기다리며, 실패는 하나도 버리지 않고 모아서 반환합니다.
pub async fn dispatch(
    channel: &str,
    handlers: &[Arc<dyn MessageHandler>],
    message: &Value,
) -> SessionResult<()> {
    let results = join_all(handlers.iter().map(|handler| handler.on_message(message))).await;

    let failures: Vec<anyhow::Error> = results.into_iter().filter_map(Result::err).collect();
    if failures.is_empty() {
        return Ok(());
    }

    for failure in &failures {
        error!(channel, "Message handler failed: {:#}", failure);
    }

    Err(SessionError::Handler {
        channel: channel.to_string(),
        failures,
    })
}
