//! Binance Spot REST 클라이언트.
//!
//! 모든 파라미터는 쿼리 문자열로 전송되며, 서명 요청은 `timestamp`와
//! HMAC-SHA256 `signature`를 쿼리 끝에 추가합니다.

use async_trait::async_trait;
use binance_core::{ClientSettings, Pair};
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use sha2::Sha256;
use std::time::{Duration, Instant};
use tracing::{debug, error};

use super::models::{BinanceError, CancelOrder, LimitOrder, RestResponse};
use crate::stream::{SessionContext, SessionGroup};
use crate::traits::UserDataStreamApi;
use crate::{ClientError, ClientResult, TlsTrust};

type HmacSha256 = Hmac<Sha256>;

/// API 키 헤더 이름.
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// 요청에 필요한 인증 수준.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Security {
    /// 인증 불필요
    Public,
    /// API 키 헤더 필요
    ApiKey,
    /// API 키 헤더 + 서명 필요
    Signed,
}

/// Binance REST 클라이언트.
///
/// 복제 비용이 낮으며(내부 HTTP 커넥션 풀 공유) 스트림 세션 그룹 생성에도 사용됩니다.
#[derive(Debug, Clone)]
pub struct BinanceClient {
    client: Client,
    settings: ClientSettings,
    tls: TlsTrust,
}

impl BinanceClient {
    /// 설정에서 클라이언트 생성.
    ///
    /// # Errors
    /// 인증서 번들을 로드할 수 없거나 HTTP 클라이언트 생성에 실패하면 에러를 반환합니다.
    pub fn new(settings: ClientSettings) -> ClientResult<Self> {
        let tls = TlsTrust::from_settings(&settings)?;
        Self::with_tls(settings, tls)
    }

    /// 이미 구성된 TLS 신뢰 설정으로 클라이언트 생성.
    pub fn with_tls(settings: ClientSettings, tls: TlsTrust) -> ClientResult<Self> {
        let client = Client::builder()
            .use_preconfigured_tls((*tls.client_config()).clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ClientError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            settings,
            tls,
        })
    }

    /// `BINANCE_*` 환경 변수에서 생성.
    ///
    /// # Errors
    /// 설정 로드 실패는 `ClientError::Config`, 인증서 번들 문제는 `ClientError::Tls`.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientSettings::from_env()?)
    }

    /// 클라이언트 설정.
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// 이 클라이언트의 자격증명과 TLS 설정을 공유하는 세션 그룹 생성.
    pub fn session_group(&self) -> SessionGroup {
        SessionGroup::new(SessionContext::new(
            self.settings.stream_base_url.clone(),
            self.settings.api_key.clone(),
            self.tls.clone(),
        ))
    }

    // === 공개 엔드포인트 ===

    /// 연결 확인.
    pub async fn ping(&self) -> ClientResult<RestResponse> {
        self.send(Method::GET, "ping", Vec::new(), Security::Public)
            .await
    }

    /// 서버 시간 조회.
    pub async fn get_time(&self) -> ClientResult<RestResponse> {
        self.send(Method::GET, "time", Vec::new(), Security::Public)
            .await
    }

    /// 거래소 규칙 및 심볼 정보 조회.
    pub async fn get_exchange_info(&self) -> ClientResult<RestResponse> {
        self.send(Method::GET, "exchangeInfo", Vec::new(), Security::Public)
            .await
    }

    /// 최우선 호가 조회. 거래쌍을 생략하면 전체 심볼을 반환합니다.
    pub async fn get_best_orderbook_ticker(
        &self,
        pair: Option<&Pair>,
    ) -> ClientResult<RestResponse> {
        let params = clean_params(vec![("symbol", pair.map(|p| p.to_string()))]);
        self.send(Method::GET, "ticker/bookTicker", params, Security::Public)
            .await
    }

    // === 계좌/주문 ===

    /// 계좌 정보 조회.
    pub async fn get_account(&self, recv_window_ms: Option<u64>) -> ClientResult<RestResponse> {
        let params = clean_params(vec![(
            "recvWindow",
            recv_window_ms.map(|w| w.to_string()),
        )]);
        self.send(Method::GET, "account", params, Security::Signed)
            .await
    }

    /// 지정가 주문 생성.
    pub async fn create_limit_order(&self, order: &LimitOrder) -> ClientResult<RestResponse> {
        let params = clean_params(order.params()?);
        self.send(Method::POST, "order", params, Security::Signed)
            .await
    }

    /// 주문 취소.
    pub async fn delete_order(&self, cancel: &CancelOrder) -> ClientResult<RestResponse> {
        let params = clean_params(cancel.params()?);
        self.send(Method::DELETE, "order", params, Security::Signed)
            .await
    }

    // === 사용자 데이터 스트림 ===

    /// 사용자 데이터 스트림 listen key 발급.
    pub async fn get_listen_key(&self) -> ClientResult<RestResponse> {
        self.send(Method::POST, "userDataStream", Vec::new(), Security::ApiKey)
            .await
    }

    /// listen key 유효기간 연장.
    pub async fn keep_alive_listen_key(&self, listen_key: &str) -> ClientResult<RestResponse> {
        let params = vec![("listenKey", listen_key.to_string())];
        self.send(Method::PUT, "userDataStream", params, Security::ApiKey)
            .await
    }

    // === 요청 처리 ===

    async fn send(
        &self,
        method: Method,
        resource: &str,
        mut params: Vec<(&'static str, String)>,
        security: Security,
    ) -> ClientResult<RestResponse> {
        let mut signing_secret = None;
        if security == Security::Signed {
            let secret = self
                .settings
                .api_secret
                .as_ref()
                .ok_or(ClientError::MissingCredentials("api secret"))?;

            if !params.iter().any(|(k, _)| *k == "recvWindow") {
                if let Some(window) = self.settings.recv_window_ms {
                    params.push(("recvWindow", window.to_string()));
                }
            }
            params.push(("timestamp", timestamp_ms().to_string()));
            signing_secret = Some(secret);
        }

        let mut url = request_url(&self.settings.rest_base_url, resource, &params)?;
        if let Some(secret) = signing_secret {
            // 서명은 실제로 전송되는 인코딩된 쿼리 문자열 기준
            let signature = sign(secret, url.query().unwrap_or_default())?;
            url.query_pairs_mut().append_pair("signature", &signature);
        }
        let query = url.query().unwrap_or_default().to_string();

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json");

        if security != Security::Public {
            let api_key = self
                .settings
                .api_key
                .as_ref()
                .ok_or(ClientError::MissingCredentials("api key"))?;
            request = request.header(API_KEY_HEADER, api_key.expose_secret());
        }

        if self.settings.api_trace_log {
            debug!(%method, resource, query = %redact_signature(&query), "> REST request");
        }

        let started = Instant::now();
        let result = match request.send().await {
            Ok(response) => self.handle_response(response).await,
            Err(e) => Err(ClientError::from(e)),
        };

        debug!(
            %method,
            resource,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "REST call finished"
        );

        result
    }

    /// API 응답 처리.
    async fn handle_response(&self, response: reqwest::Response) -> ClientResult<RestResponse> {
        let status = response.status();
        let body = response.text().await?;

        if self.settings.api_trace_log {
            debug!(status = status.as_u16(), body = %body, "< REST response");
        }

        if status.is_success() {
            let response = if body.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&body).map_err(|e| {
                    error!("Failed to parse response: {} - Body: {}", e, body);
                    ClientError::ParseError(e.to_string())
                })?
            };

            return Ok(RestResponse {
                status_code: status.as_u16(),
                response,
            });
        }

        // 에러 응답 파싱 시도
        if let Ok(error) = serde_json::from_str::<BinanceError>(&body) {
            Err(map_error_code(error.code, &error.msg))
        } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(ClientError::RateLimited)
        } else {
            Err(ClientError::ApiError {
                code: status.as_u16() as i32,
                message: body,
            })
        }
    }
}

#[async_trait]
impl UserDataStreamApi for BinanceClient {
    async fn create_listen_key(&self) -> ClientResult<String> {
        let response = self.get_listen_key().await?;
        response
            .str_field("listenKey")
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::ParseError(format!(
                    "listenKey 필드가 없는 응답: {}",
                    response.response
                ))
            })
    }

    async fn keep_alive_listen_key(&self, listen_key: &str) -> ClientResult<()> {
        BinanceClient::keep_alive_listen_key(self, listen_key).await?;
        Ok(())
    }
}

/// Binance 에러 코드를 ClientError로 매핑.
fn map_error_code(code: i32, msg: &str) -> ClientError {
    match code {
        -1000 => ClientError::Unknown(msg.to_string()),
        -1001 => ClientError::NetworkError(msg.to_string()),
        -1002 | -2014 | -2015 => ClientError::Unauthorized(msg.to_string()),
        -1003 => ClientError::RateLimited,
        -1013 => ClientError::InvalidQuantity(msg.to_string()),
        -1021 => ClientError::TimestampError(msg.to_string()),
        -2010 => ClientError::InsufficientBalance(msg.to_string()),
        -2011 | -2013 => ClientError::OrderNotFound(msg.to_string()),
        _ => ClientError::ApiError {
            code,
            message: msg.to_string(),
        },
    }
}

/// 값이 없는 파라미터 제거.
fn clean_params(params: Vec<(&'static str, Option<String>)>) -> Vec<(&'static str, String)> {
    params
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k, v)))
        .collect()
}

/// 리소스 URL에 퍼센트 인코딩된 쿼리를 붙입니다.
fn request_url(base: &str, resource: &str, params: &[(&str, String)]) -> ClientResult<Url> {
    let mut url = Url::parse(&format!("{}{}", base, resource))
        .map_err(|e| ClientError::InvalidRequest(format!("잘못된 URL {}{}: {}", base, resource, e)))?;

    if !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url)
}

/// HMAC-SHA256으로 쿼리 문자열 서명.
fn sign(secret: &SecretString, payload: &str) -> ClientResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| ClientError::InvalidRequest(format!("서명 키 오류: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn redact_signature(query: &str) -> String {
    match query.find("signature=") {
        Some(pos) => format!("{}signature=***", &query[..pos]),
        None => query.to_string(),
    }
}

/// 현재 타임스탬프(밀리초).
fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
