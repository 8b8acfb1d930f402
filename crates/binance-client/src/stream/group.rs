//! 세션 그룹 실행기.
//!
//! 구독 묶음마다 세션 태스크 하나를 띄우고, 가장 먼저 끝난 태스크의 결과로
//! 그룹 전체의 결과를 결정합니다. 먼저 끝난 태스크가 있으면 나머지 세션은
//! 모두 취소되며, 취소 완료를 기다린 뒤 반환합니다.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Instrument};

use super::request_id::RequestIdGenerator;
use super::session::{ConnectionSession, SessionContext};
use super::subscription::Bundle;
use crate::GroupError;

/// 여러 구독 묶음을 동시에 실행하는 세션 그룹.
pub struct SessionGroup {
    context: SessionContext,
    bundles: Vec<Bundle>,
}

impl SessionGroup {
    /// 새 세션 그룹.
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            bundles: Vec::new(),
        }
    }

    /// 구독 묶음 추가. 묶음 하나가 연결 하나에 대응합니다.
    pub fn compose_subscriptions(&mut self, bundle: Bundle) -> &mut Self {
        self.bundles.push(bundle);
        self
    }

    /// 구성된 묶음 수.
    pub fn bundle_count(&self) -> usize {
        self.bundles.len()
    }

    /// 그룹 세션들이 공유하는 요청 ID 생성기.
    pub fn request_ids(&self) -> &Arc<RequestIdGenerator> {
        self.context.request_ids()
    }

    /// 모든 묶음을 동시에 시작하고 그룹이 끝날 때까지 기다립니다.
    ///
    /// `shutdown`이 취소되면 모든 세션이 정상 종료하고 `Ok(())`를 반환합니다.
    ///
    /// # Errors
    /// - 묶음이 없으면 `GroupError::NoSubscriptions` (태스크를 시작하지 않음)
    /// - 빈 묶음이 있으면 `GroupError::EmptyBundle`
    /// - 처음으로 실패한 세션의 에러 (`SessionFailed` 또는 `TaskPanicked`)
    pub async fn start_subscriptions(self, shutdown: CancellationToken) -> Result<(), GroupError> {
        if self.bundles.is_empty() {
            error!("There are no subscriptions to be started.");
            return Err(GroupError::NoSubscriptions);
        }
        if let Some(index) = self.bundles.iter().position(Vec::is_empty) {
            return Err(GroupError::EmptyBundle(index));
        }

        let group_token = shutdown.child_token();
        let mut tasks = JoinSet::new();
        let mut sessions = HashMap::new();

        for (index, bundle) in self.bundles.into_iter().enumerate() {
            let mut session = ConnectionSession::new(index, bundle, self.context.clone())
                .map_err(|source| GroupError::SessionFailed {
                    session: index,
                    source,
                })?;
            let token = group_token.child_token();

            let handle = tasks.spawn(
                async move { session.run(&token).await }
                    .instrument(binance_core::stream_span!("session", index)),
            );
            sessions.insert(handle.id(), index);
        }

        info!(sessions = sessions.len(), "Subscriptions started");

        let mut outcome: Option<Result<(), GroupError>> = None;

        while let Some(joined) = tasks.join_next_with_id().await {
            let result = match joined {
                Ok((_, Ok(()))) => Ok(()),
                Ok((id, Err(source))) => Err(GroupError::SessionFailed {
                    session: sessions.get(&id).copied().unwrap_or_default(),
                    source,
                }),
                Err(join_error) => {
                    let session = sessions.get(&join_error.id()).copied();
                    let message = if join_error.is_panic() {
                        panic_message(join_error.into_panic())
                    } else {
                        join_error.to_string()
                    };
                    Err(GroupError::TaskPanicked { session, message })
                }
            };

            if outcome.is_some() {
                if let Err(e) = result {
                    debug!(error = %e, "Ignoring result of cancelled session");
                }
                continue;
            }

            if let Err(e) = &result {
                error!(
                    session = ?e.session(),
                    "Unrecoverable exception occurred while processing messages: {}", e
                );
                info!("All websockets scheduled for shutdown");
            }
            group_token.cancel();
            outcome = Some(result);
        }

        outcome.unwrap_or(Ok(()))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
