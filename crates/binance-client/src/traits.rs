//! 스트림 세션이 의존하는 REST 협력자 trait 정의.

use async_trait::async_trait;

use crate::ClientResult;

/// 사용자 데이터 스트림(계좌 스트림)의 세션 토큰(listen key) 관리.
///
/// 계좌 구독은 이 trait을 통해서만 REST 계층에 접근합니다.
/// 구현체의 수명은 호출자가 관리합니다 (`Arc`로 공유).
#[async_trait]
pub trait UserDataStreamApi: Send + Sync {
    /// 새 listen key 발급.
    async fn create_listen_key(&self) -> ClientResult<String>;

    /// 기존 listen key 유효기간 연장.
    async fn keep_alive_listen_key(&self, listen_key: &str) -> ClientResult<()>;
}
