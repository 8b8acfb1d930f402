//! 스트림 테스트가 공유하는 루프백 WebSocket 서버와 기록용 핸들러.

#![allow(dead_code)]

use async_trait::async_trait;
use binance_client::stream::{handler_fn, MessageHandler, SessionContext};
use binance_client::{ClientError, ClientResult, TlsTrust, UserDataStreamApi};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// 수락한 연결을 모두 테스트에 넘겨주는 프로세스 내 WebSocket 서버.
pub struct MockStreamServer {
    pub base_url: String,
    connections: mpsc::UnboundedReceiver<ServerConnection>,
}

impl MockStreamServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(connection) = ServerConnection::accept(stream).await {
                        let _ = tx.send(connection);
                    }
                });
            }
        });

        Self {
            base_url: format!("ws://{}/", addr),
            connections: rx,
        }
    }

    pub fn context(&self) -> SessionContext {
        SessionContext::new(self.base_url.clone(), None, TlsTrust::webpki_roots().unwrap())
    }

    pub async fn next_connection(&mut self) -> ServerConnection {
        tokio::time::timeout(TIMEOUT, self.connections.recv())
            .await
            .expect("timed out waiting for a websocket connection")
            .expect("mock server stopped")
    }

    /// `wait` 동안 새 연결이 없으면 `true`.
    pub async fn no_connection_within(&mut self, wait: Duration) -> bool {
        tokio::time::timeout(wait, self.connections.recv())
            .await
            .is_err()
    }
}

/// 수락된 클라이언트 연결 하나.
pub struct ServerConnection {
    pub path: String,
    pub api_key: Option<String>,
    ws: WebSocketStream<TcpStream>,
}

impl ServerConnection {
    async fn accept(stream: TcpStream) -> Option<Self> {
        let mut path = String::new();
        let mut api_key = None;

        let ws = accept_hdr_async(stream, |request: &Request, response: Response| {
            path = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_default();
            api_key = request
                .headers()
                .get("X-MBX-APIKEY")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            Ok(response)
        })
        .await
        .ok()?;

        Some(Self { path, api_key, ws })
    }

    /// 다음 텍스트 프레임을 JSON으로 디코딩. 종료나 타임아웃이면 패닉.
    pub async fn recv_json(&mut self) -> Value {
        loop {
            let message = tokio::time::timeout(TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for a client frame")
                .expect("client disconnected")
                .expect("websocket error");

            if let Message::Text(text) = message {
                return serde_json::from_str(&text).unwrap();
            }
        }
    }

    /// SUBSCRIBE 요청을 읽고 `(params, id)`를 반환.
    pub async fn expect_subscribe(&mut self) -> (Vec<String>, u64) {
        let frame = self.recv_json().await;
        assert_eq!(frame["method"], "SUBSCRIBE");

        let params = frame["params"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p.as_str().unwrap().to_string())
            .collect();
        (params, frame["id"].as_u64().unwrap())
    }

    pub async fn send_text(&mut self, text: impl Into<String>) {
        self.ws.send(Message::Text(text.into())).await.unwrap();
    }

    pub async fn confirm(&mut self, id: u64) {
        self.send_text(format!(r#"{{"result":null,"id":{}}}"#, id))
            .await;
    }

    pub async fn send_data(&mut self, stream: &str, data: Value) {
        let frame = serde_json::json!({ "stream": stream, "data": data });
        self.send_text(frame.to_string()).await;
    }

    /// `send_data`와 같지만 클라이언트가 이미 닫은 소켓이면 무시.
    pub async fn try_send_data(&mut self, stream: &str, data: Value) {
        let frame = serde_json::json!({ "stream": stream, "data": data });
        let _ = self.ws.send(Message::Text(frame.to_string())).await;
    }

    /// 주어진 코드로 close 프레임 전송.
    pub async fn close(&mut self, code: CloseCode) {
        let frame = CloseFrame {
            code,
            reason: Cow::Borrowed("bye"),
        };
        let _ = self.ws.close(Some(frame)).await;
    }

    /// 종료 핸드셰이크 없이 TCP 연결을 끊음.
    pub fn drop_connection(self) {
        drop(self.ws);
    }

    /// 클라이언트가 연결을 닫을 때까지 기다리고 close 코드를 반환.
    pub async fn closed_by_client(&mut self) -> Option<CloseCode> {
        loop {
            match tokio::time::timeout(TIMEOUT, self.ws.next()).await {
                Ok(Some(Ok(Message::Close(frame)))) => return frame.map(|f| f.code),
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(_))) | Ok(None) => return None,
                Err(_) => panic!("client did not close the connection"),
            }
        }
    }
}

/// 모든 페이로드를 채널로 전달하는 핸들러.
pub fn recording_handler() -> (Arc<dyn MessageHandler>, mpsc::UnboundedReceiver<Value>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = handler_fn(move |message| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(message);
            Ok(())
        }
    });
    (handler, rx)
}

pub async fn recv_payload(rx: &mut mpsc::UnboundedReceiver<Value>) -> Value {
    tokio::time::timeout(TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a delivered payload")
        .expect("handler channel closed")
}

/// listen key API 대역.
#[derive(Default)]
pub struct FakeUserStream {
    pub created: AtomicUsize,
    pub kept_alive: Mutex<Vec<String>>,
    pub fail: bool,
    /// 발급 요청이 끝나지 않음
    pub stall: bool,
    /// 발급 요청이 시작되면 알림
    pub requested: Notify,
}

impl FakeUserStream {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn stalled() -> Self {
        Self {
            stall: true,
            ..Default::default()
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDataStreamApi for FakeUserStream {
    async fn create_listen_key(&self) -> ClientResult<String> {
        self.requested.notify_one();
        if self.stall {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(ClientError::Unauthorized("Invalid API-key".to_string()));
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("pqia91ma19a5s61cv6a81va65sdf19v8a65a1a5s61cv6a81va65sdf19v8a6{}", n))
    }

    async fn keep_alive_listen_key(&self, listen_key: &str) -> ClientResult<()> {
        self.kept_alive.lock().unwrap().push(listen_key.to_string());
        Ok(())
    }
}
