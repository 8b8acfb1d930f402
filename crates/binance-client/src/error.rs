//! 클라이언트 에러 타입.
//!
//! - [`ClientError`]: REST 호출 및 클라이언트 구성 에러
//! - [`SessionError`]: 단일 WebSocket 세션을 종료시키는 복구 불가능한 에러
//! - [`GroupError`]: 세션 그룹 실행이 호출자에게 돌려주는 최종 에러

use thiserror::Error;

/// REST 호출 및 클라이언트 구성 에러.
#[derive(Debug, Error)]
pub enum ClientError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 인증/권한 에러
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded")]
    RateLimited,

    /// API 에러 코드
    #[error("API error {code}: {message}")]
    ApiError { code: i32, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 유효하지 않은 수량
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// 타임스탬프 동기화 에러
    #[error("Timestamp error: {0}")]
    TimestampError(String),

    /// 잔고 부족
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// 주문을 찾을 수 없음
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 요청에 필요한 자격증명 누락
    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),

    /// 잘못된 요청 파라미터
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// TLS 신뢰 설정 에러
    #[error("TLS error: {0}")]
    Tls(String),

    /// 설정 로드 에러
    #[error("Configuration error: {0}")]
    Config(#[from] binance_core::CoreError),

    /// 알 수 없는 에러
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ClientError {
    /// 재시도 가능한 에러인지 확인.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::NetworkError(_)
                | ClientError::RateLimited
                | ClientError::Timeout(_)
                | ClientError::TimestampError(_)
        )
    }

    /// 인증 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthorized(_) | ClientError::MissingCredentials(_)
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() || err.is_body() {
            ClientError::NetworkError(err.to_string())
        } else if err.is_decode() {
            ClientError::ParseError(err.to_string())
        } else {
            ClientError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::ParseError(err.to_string())
    }
}

/// REST 작업을 위한 Result 타입.
pub type ClientResult<T> = Result<T, ClientError>;

/// WebSocket 세션을 종료시키는 에러.
///
/// 정상 종료(graceful close)와 취소는 에러가 아니므로 여기에 포함되지 않습니다.
#[derive(Debug, Error)]
pub enum SessionError {
    /// 구독 초기화 실패 (예: listen key 발급 실패)
    #[error("Subscription initialization failed: {0}")]
    Initialization(#[source] ClientError),

    /// 초기화 전 채널 이름 요청 등 사용 순서 위반
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// 잘못된 프레임 또는 예상하지 못한 스키마
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// 연결 실패, TLS 실패, 비정상 종료
    #[error("Transport error: {0}")]
    Transport(String),

    /// 메시지 핸들러 실패 (모든 실패를 보존)
    #[error("{} handler(s) failed on channel {channel}: {}", .failures.len(), join_failures(.failures))]
    Handler {
        channel: String,
        failures: Vec<anyhow::Error>,
    },
}

fn join_failures(failures: &[anyhow::Error]) -> String {
    failures
        .iter()
        .map(|e| format!("{:#}", e))
        .collect::<Vec<_>>()
        .join("; ")
}

impl SessionError {
    /// 전송 계층 에러인지 확인.
    pub fn is_transport(&self) -> bool {
        matches!(self, SessionError::Transport(_))
    }

    /// 프로토콜 에러인지 확인.
    pub fn is_protocol(&self) -> bool {
        matches!(self, SessionError::Protocol(_))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SessionError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SessionError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Protocol(err.to_string())
    }
}

/// 세션 작업을 위한 Result 타입.
pub type SessionResult<T> = Result<T, SessionError>;

/// 세션 그룹 실행 결과 에러.
///
/// 그룹은 처음 발생한 에러 하나만 보고하며, 그 결과로 취소된 다른 세션은 에러를 더하지 않습니다.
#[derive(Debug, Error)]
pub enum GroupError {
    /// 시작할 구독 묶음이 없음
    #[error("There are no subscriptions to be started")]
    NoSubscriptions,

    /// 빈 구독 묶음
    #[error("Subscription bundle {0} is empty")]
    EmptyBundle(usize),

    /// 세션이 복구 불가능한 에러로 종료됨
    #[error("Session {session} failed: {source}")]
    SessionFailed {
        session: usize,
        #[source]
        source: SessionError,
    },

    /// 세션 태스크 패닉
    #[error("Session {session:?} task panicked: {message}")]
    TaskPanicked {
        session: Option<usize>,
        message: String,
    },
}

impl GroupError {
    /// 구성 에러(태스크 시작 전 실패)인지 확인.
    pub fn is_configuration(&self) -> bool {
        matches!(self, GroupError::NoSubscriptions | GroupError::EmptyBundle(_))
    }

    /// 실패한 세션 번호.
    pub fn session(&self) -> Option<usize> {
        match self {
            GroupError::SessionFailed { session, .. } => Some(*session),
            GroupError::TaskPanicked { session, .. } => *session,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_keeps_every_failure() {
        let err = SessionError::Handler {
            channel: "ethbtc@trade".to_string(),
            failures: vec![anyhow::anyhow!("first"), anyhow::anyhow!("second")],
        };
        let message = err.to_string();

        assert!(message.starts_with("2 handler(s) failed on channel ethbtc@trade"));
        assert!(message.contains("first"));
        assert!(message.contains("second"));
    }

    #[test]
    fn test_group_error_classification() {
        assert!(GroupError::NoSubscriptions.is_configuration());
        assert!(GroupError::EmptyBundle(1).is_configuration());

        let failed = GroupError::SessionFailed {
            session: 2,
            source: SessionError::Protocol("bad frame".to_string()),
        };
        assert!(!failed.is_configuration());
        assert_eq!(failed.session(), Some(2));
    }

    #[test]
    fn test_client_error_predicates() {
        assert!(ClientError::NetworkError("reset".to_string()).is_retryable());
        assert!(!ClientError::Unauthorized("bad key".to_string()).is_retryable());
        assert!(ClientError::MissingCredentials("api key").is_auth_error());
    }
}
