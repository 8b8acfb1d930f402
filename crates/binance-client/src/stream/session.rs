//! 단일 WebSocket 연결 세션.
//!
//! 세션은 고정된 구독 묶음 하나에 대해 연결 하나를 소유합니다.
//! 연결 시도마다 다음을 수행합니다:
//!
//! 1. 모든 구독을 순서대로 초기화
//! 2. 결합 스트림 경로(`stream?streams=...`)로 연결
//! 3. `SUBSCRIBE` 요청 전송 (그룹 공유 생성기에서 새 ID 발급)
//! 4. 수신 루프: 구독 확인은 로그만 남기고, 데이터 프레임은 채널이 일치하는 첫 구독으로 전달
//!
//! 서버가 정상 종료(1000/1001)하면 1단계부터 다시 시작합니다.
//! 그 밖의 실패는 세션을 끝내고, 취소는 에러 없이 `Ok(())`로 끝납니다.

use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, Request};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::frame::{stream_path, subscribe_frame, InboundFrame};
use super::request_id::RequestIdGenerator;
use super::subscription::Bundle;
use crate::rest::API_KEY_HEADER;
use crate::{SessionError, SessionResult, TlsTrust};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 취소 시 close 프레임 전송 대기 한도.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// 세션들이 공유하는 읽기 전용 연결 정보.
#[derive(Debug, Clone)]
pub struct SessionContext {
    stream_base_url: String,
    api_key: Option<SecretString>,
    tls: TlsTrust,
    request_ids: Arc<RequestIdGenerator>,
}

impl SessionContext {
    /// 새 컨텍스트. 요청 ID 생성기는 새로 만들어집니다.
    pub fn new(
        stream_base_url: impl Into<String>,
        api_key: Option<SecretString>,
        tls: TlsTrust,
    ) -> Self {
        Self {
            stream_base_url: stream_base_url.into(),
            api_key,
            tls,
            request_ids: Arc::new(RequestIdGenerator::new()),
        }
    }

    /// 요청 ID 생성기 교체.
    pub fn with_request_ids(mut self, request_ids: Arc<RequestIdGenerator>) -> Self {
        self.request_ids = request_ids;
        self
    }

    pub fn stream_base_url(&self) -> &str {
        &self.stream_base_url
    }

    pub fn request_ids(&self) -> &Arc<RequestIdGenerator> {
        &self.request_ids
    }

    /// 핸드셰이크 요청 생성 (API 키가 있으면 헤더 추가).
    fn handshake_request(&self, url: &str) -> SessionResult<Request<()>> {
        let mut request = url.into_client_request()?;

        if let Some(api_key) = &self.api_key {
            let value = HeaderValue::from_str(api_key.expose_secret())
                .map_err(|e| SessionError::Transport(format!("invalid api key header: {}", e)))?;
            request.headers_mut().insert(API_KEY_HEADER, value);
        }

        Ok(request)
    }
}

/// 세션 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 첫 연결 시도 중
    Connecting,
    /// 구독 완료, 수신 중
    Connected,
    /// 서버 정상 종료 후 재연결 중
    Reconnecting,
    /// 종료됨 (취소 또는 복구 불가능한 에러)
    Terminated,
}

impl SessionState {
    /// 허용되는 상태 전이인지 확인.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Terminated, _) => false,
            (_, Terminated) => true,
            (Connecting, Connected) | (Connected, Reconnecting) | (Reconnecting, Connected) => {
                true
            }
            _ => false,
        }
    }
}

/// 한 번의 연결이 끝난 이유.
#[derive(Debug)]
enum ConnectionEnd {
    Cancelled,
    Graceful,
}

/// 구독 묶음 하나를 담당하는 WebSocket 세션.
pub struct ConnectionSession {
    index: usize,
    subscriptions: Bundle,
    context: SessionContext,
    state: SessionState,
    reconnects: u32,
}

impl ConnectionSession {
    /// 새 세션.
    ///
    /// # Errors
    /// 구독이 하나도 없으면 `SessionError::Precondition`.
    pub fn new(index: usize, subscriptions: Bundle, context: SessionContext) -> SessionResult<Self> {
        if subscriptions.is_empty() {
            return Err(SessionError::Precondition(format!(
                "session {} has no subscriptions",
                index
            )));
        }

        Ok(Self {
            index,
            subscriptions,
            context,
            state: SessionState::Connecting,
            reconnects: 0,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 서버 정상 종료로 인한 재연결 횟수.
    pub fn reconnect_count(&self) -> u32 {
        self.reconnects
    }

    /// 취소되거나 복구 불가능한 에러가 날 때까지 실행합니다.
    ///
    /// 취소되면 `Ok(())`, 그 외 종료는 모두 `Err`입니다.
    pub async fn run(&mut self, shutdown: &CancellationToken) -> SessionResult<()> {
        let result = self.run_connections(shutdown).await;
        self.transition(SessionState::Terminated);

        match &result {
            Ok(()) => warn!(session = self.index, "Websocket requested to be shutdown."),
            Err(e) => error!(
                session = self.index,
                error = %e,
                "Exception occurred. Websocket will be closed."
            ),
        }

        result
    }

    async fn run_connections(&mut self, shutdown: &CancellationToken) -> SessionResult<()> {
        loop {
            match self.connect_once(shutdown).await? {
                ConnectionEnd::Cancelled => return Ok(()),
                ConnectionEnd::Graceful => {
                    self.transition(SessionState::Reconnecting);
                    self.reconnects += 1;
                    warn!(
                        session = self.index,
                        reconnects = self.reconnects,
                        "Websocket closed by server. Reconnecting."
                    );
                }
            }
        }
    }

    async fn connect_once(&mut self, shutdown: &CancellationToken) -> SessionResult<ConnectionEnd> {
        for subscription in self.subscriptions.iter_mut() {
            match until_cancelled(shutdown, subscription.initialize()).await {
                Some(result) => result?,
                None => return Ok(ConnectionEnd::Cancelled),
            }
        }

        let channels = self
            .subscriptions
            .iter()
            .map(|s| s.channel_name())
            .collect::<SessionResult<Vec<_>>>()?;

        let url = format!("{}{}", self.context.stream_base_url, stream_path(&channels));
        let request = self.context.handshake_request(&url)?;
        info!(session = self.index, "Connecting to {}", url);

        let connect = connect_async_tls_with_config(
            request,
            None,
            false,
            Some(self.context.tls.connector()),
        );
        let mut ws = match until_cancelled(shutdown, connect).await {
            Some(result) => result?.0,
            None => return Ok(ConnectionEnd::Cancelled),
        };

        let id = self.context.request_ids.next_id();
        let frame = subscribe_frame(&channels, id)?;
        debug!(session = self.index, "> {}", frame);

        match until_cancelled(shutdown, ws.send(Message::Text(frame))).await {
            Some(result) => result?,
            None => {
                close_on_cancel(&mut ws).await;
                return Ok(ConnectionEnd::Cancelled);
            }
        }

        self.transition(SessionState::Connected);
        info!(session = self.index, id, ?channels, "Subscription request sent");

        self.receive(&mut ws, &channels, shutdown).await
    }

    /// 수신 루프. 프레임은 도착 순서대로 하나씩 처리됩니다.
    async fn receive(
        &self,
        ws: &mut WsStream,
        channels: &[String],
        shutdown: &CancellationToken,
    ) -> SessionResult<ConnectionEnd> {
        loop {
            let message = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    close_on_cancel(ws).await;
                    return Ok(ConnectionEnd::Cancelled);
                }
                message = ws.next() => message,
            };

            let text = match message {
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(Message::Binary(bytes))) => String::from_utf8(bytes).map_err(|e| {
                    SessionError::Protocol(format!("binary frame is not UTF-8: {}", e))
                })?,
                Some(Ok(Message::Close(frame))) => {
                    let end = close_outcome(frame)?;
                    let _ = ws.close(None).await;
                    return Ok(end);
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => {
                    return Err(SessionError::Transport(
                        "stream ended without a close frame".to_string(),
                    ))
                }
            };

            debug!(session = self.index, "< {}", text);

            match InboundFrame::parse(&text)? {
                InboundFrame::Confirmation { id } => {
                    info!(session = self.index, ?id, "Subscription confirmed");
                }
                InboundFrame::Data { stream, data } => {
                    let Some(position) = channels.iter().position(|c| *c == stream) else {
                        debug!(session = self.index, %stream, "Dropping frame for unknown stream");
                        continue;
                    };

                    match until_cancelled(shutdown, self.subscriptions[position].handle(&data)).await
                    {
                        Some(result) => result?,
                        None => {
                            close_on_cancel(ws).await;
                            return Ok(ConnectionEnd::Cancelled);
                        }
                    }
                }
            }
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state.can_transition_to(next) {
            self.state = next;
        } else if self.state != next {
            debug!(session = self.index, from = ?self.state, to = ?next, "Ignored state transition");
        }
    }
}

/// 취소되면 `None`, 아니면 future의 결과.
async fn until_cancelled<F: Future>(shutdown: &CancellationToken, future: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => None,
        output = future => Some(output),
    }
}

/// 재연결 대상인 정상 종료 코드인지 확인합니다. 1000(Normal)과 1001(Away)만 해당합니다.
fn is_graceful_close(code: CloseCode) -> bool {
    matches!(code, CloseCode::Normal | CloseCode::Away)
}

/// close 프레임 분류.
fn close_outcome(frame: Option<CloseFrame<'static>>) -> SessionResult<ConnectionEnd> {
    match frame {
        Some(frame) if is_graceful_close(frame.code) => {
            info!(code = u16::from(frame.code), reason = %frame.reason, "Server closed websocket");
            Ok(ConnectionEnd::Graceful)
        }
        Some(frame) => Err(SessionError::Transport(format!(
            "abnormal close {}: {}",
            u16::from(frame.code),
            frame.reason
        ))),
        None => Err(SessionError::Transport(
            "close frame without status code".to_string(),
        )),
    }
}

async fn close_on_cancel(ws: &mut WsStream) {
    let frame = CloseFrame {
        code: CloseCode::Normal,
        reason: Cow::Borrowed("shutdown"),
    };
    match tokio::time::timeout(CLOSE_TIMEOUT, ws.close(Some(frame))).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Close frame not delivered: {}", e),
        Err(_) => debug!("Close frame timed out"),
    }
}
