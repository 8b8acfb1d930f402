//! 클라이언트 설정 관리.
//!
//! 기본값 → (선택) TOML 파일 → `BINANCE_` 접두사 환경 변수 순서로 덮어씁니다.
//! 중첩 키는 `__` 구분자를 사용합니다 (예: `BINANCE_LOGGING__LEVEL=debug`).

use crate::{CoreResult, LogFormat};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 메인넷 REST API 기본 URL.
pub const DEFAULT_REST_BASE_URL: &str = "https://api.binance.com/api/v3/";

/// 메인넷 WebSocket 스트림 기본 URL.
pub const DEFAULT_STREAM_BASE_URL: &str = "wss://stream.binance.com:9443/";

/// 환경 변수 접두사.
const ENV_PREFIX: &str = "BINANCE";

/// Binance 클라이언트 설정.
///
/// # 보안
/// - `api_key`, `api_secret`은 `SecretString`으로 보관되어 `Debug` 출력에서 마스킹됩니다.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    /// API 키
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// API 시크릿 (서명 요청에 필요)
    #[serde(default)]
    pub api_secret: Option<SecretString>,
    /// REST API 기본 URL (끝에 `/` 포함)
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,
    /// WebSocket 스트림 기본 URL (끝에 `/` 포함)
    #[serde(default = "default_stream_base_url")]
    pub stream_base_url: String,
    /// TLS 신뢰 앵커 PEM 번들 경로 (미지정 시 내장 webpki 루트 사용)
    #[serde(default)]
    pub certificate_path: Option<PathBuf>,
    /// 서명 요청의 기본 수신 윈도우 (밀리초)
    #[serde(default)]
    pub recv_window_ms: Option<u64>,
    /// REST 요청 타임아웃 (초)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// REST 요청/응답 본문 추적 로그
    #[serde(default)]
    pub api_trace_log: bool,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 로그 레벨 필터 (예: "info", "binance_client=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 로그 형식
    #[serde(default)]
    pub format: LogFormat,
    /// 세션 span 생성/종료 이벤트 출력
    #[serde(default)]
    pub span_events: bool,
    /// 파일명과 줄 번호 출력
    #[serde(default = "default_true")]
    pub file_location: bool,
    /// 스레드 ID 출력
    #[serde(default)]
    pub thread_ids: bool,
    /// 모듈 경로 출력
    #[serde(default = "default_true")]
    pub target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            span_events: false,
            file_location: true,
            thread_ids: false,
            target: true,
        }
    }
}

fn default_rest_base_url() -> String {
    DEFAULT_REST_BASE_URL.to_string()
}

fn default_stream_base_url() -> String {
    DEFAULT_STREAM_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_secret: None,
            rest_base_url: default_rest_base_url(),
            stream_base_url: default_stream_base_url(),
            certificate_path: None,
            recv_window_ms: None,
            timeout_secs: default_timeout_secs(),
            api_trace_log: false,
            logging: LoggingSettings::default(),
        }
    }
}

impl ClientSettings {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut builder = config::Config::builder()
            .set_default("rest_base_url", DEFAULT_REST_BASE_URL)?
            .set_default("stream_base_url", DEFAULT_STREAM_BASE_URL)?
            .set_default("timeout_secs", default_timeout_secs())?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// 환경 변수에서만 설정을 로드합니다.
    pub fn from_env() -> CoreResult<Self> {
        Self::load(None)
    }

    /// API 키와 시크릿을 설정합니다.
    pub fn with_credentials(
        mut self,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self.api_secret = Some(SecretString::from(api_secret.into()));
        self
    }

    /// REST API 기본 URL을 설정합니다.
    pub fn with_rest_base_url(mut self, url: impl Into<String>) -> Self {
        self.rest_base_url = url.into();
        self
    }

    /// WebSocket 스트림 기본 URL을 설정합니다.
    pub fn with_stream_base_url(mut self, url: impl Into<String>) -> Self {
        self.stream_base_url = url.into();
        self
    }

    /// TLS 신뢰 앵커 번들 경로를 설정합니다.
    pub fn with_certificate_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.certificate_path = Some(path.into());
        self
    }

    /// 기본 수신 윈도우를 설정합니다.
    pub fn with_recv_window_ms(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = Some(recv_window_ms);
        self
    }

    /// REST 추적 로그를 활성화합니다.
    pub fn with_api_trace_log(mut self, enabled: bool) -> Self {
        self.api_trace_log = enabled;
        self
    }

    /// REST 요청 타임아웃(초)을 설정합니다.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = ClientSettings::default();
        assert_eq!(settings.rest_base_url, DEFAULT_REST_BASE_URL);
        assert_eq!(settings.stream_base_url, DEFAULT_STREAM_BASE_URL);
        assert_eq!(settings.timeout_secs, 30);
        assert!(settings.api_key.is_none());
        assert!(settings.certificate_path.is_none());
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_builder() {
        let settings = ClientSettings::default()
            .with_credentials("key", "secret")
            .with_stream_base_url("ws://127.0.0.1:9000/")
            .with_recv_window_ms(5000);

        assert_eq!(settings.api_key.as_ref().unwrap().expose_secret(), "key");
        assert_eq!(settings.api_secret.as_ref().unwrap().expose_secret(), "secret");
        assert_eq!(settings.stream_base_url, "ws://127.0.0.1:9000/");
        assert_eq!(settings.recv_window_ms, Some(5000));
    }

    #[test]
    fn test_debug_masks_secrets() {
        let settings = ClientSettings::default().with_credentials("visible-key", "visible-secret");
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("visible-key"));
        assert!(!debug.contains("visible-secret"));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "binance-core-settings-{}.toml",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
api_key = "file-key"
stream_base_url = "ws://localhost:1234/"
timeout_secs = 5
api_trace_log = true

[logging]
level = "debug"
format = "json"
span_events = true
thread_ids = true
"#
        )
        .unwrap();

        let settings = ClientSettings::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.api_key.unwrap().expose_secret(), "file-key");
        assert_eq!(settings.stream_base_url, "ws://localhost:1234/");
        assert_eq!(settings.rest_base_url, DEFAULT_REST_BASE_URL);
        assert_eq!(settings.timeout_secs, 5);
        assert!(settings.api_trace_log);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert!(settings.logging.span_events);
        assert!(settings.logging.thread_ids);
        assert!(settings.logging.file_location);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = ClientSettings::load(Some(Path::new("/nonexistent/binance.toml")));
        assert!(result.is_err());
    }
}
