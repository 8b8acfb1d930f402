//! tracing 기반 로깅 초기화.
//!
//! 설정 파일의 `[logging]` 섹션이 필터, 출력 형식, 부가 필드를 결정합니다.
//! `RUST_LOG`가 설정되어 있으면 필터는 그 값을 우선합니다.

use crate::LoggingSettings;
use serde::Deserialize;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// 사람이 읽기 쉬운 여러 줄 형식
    #[default]
    Pretty,
    /// 로그 수집기용 JSON
    Json,
    /// 한 줄 형식
    Compact,
}

/// subscriber 구성 값.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub filter: String,
    pub format: LogFormat,
    /// 세션 span 생성/종료 이벤트 출력
    pub span_events: FmtSpan,
    /// 파일명과 줄 번호
    pub file_location: bool,
    pub thread_ids: bool,
    /// 모듈 경로
    pub target: bool,
}

impl LogConfig {
    /// `[logging]` 설정에서 생성합니다.
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            filter: settings.level.clone(),
            format: settings.format,
            span_events: if settings.span_events {
                FmtSpan::NEW | FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            },
            file_location: settings.file_location,
            thread_ids: settings.thread_ids,
            target: settings.target,
        }
    }

    /// `RUST_LOG` 우선, 없으면 설정의 필터.
    fn env_filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&self.filter))
    }
}

/// 전역 subscriber를 설치합니다. 두 번째 호출은 에러를 반환합니다.
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = config.env_filter()?;

    let base = fmt::layer()
        .with_file(config.file_location)
        .with_line_number(config.file_location)
        .with_thread_ids(config.thread_ids)
        .with_target(config.target)
        .with_span_events(config.span_events.clone());

    let fmt_layer = match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base.json().boxed(),
        LogFormat::Compact => base.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(format = ?config.format, filter = %config.filter, "Logging initialized");
    Ok(())
}

/// 세션 번호 필드가 붙은 info span.
#[macro_export]
macro_rules! stream_span {
    ($name:expr, $session:expr) => {
        tracing::info_span!($name, session = %$session)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_follows_settings() {
        let settings = LoggingSettings {
            level: "binance_client=debug".to_string(),
            format: LogFormat::Json,
            span_events: true,
            file_location: false,
            thread_ids: true,
            target: false,
        };
        let config = LogConfig::from_settings(&settings);

        assert_eq!(config.filter, "binance_client=debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.span_events, FmtSpan::NEW | FmtSpan::CLOSE);
        assert!(!config.file_location);
        assert!(config.thread_ids);
        assert!(!config.target);
    }

    #[test]
    fn test_default_settings_keep_spans_quiet() {
        let config = LogConfig::from_settings(&LoggingSettings::default());

        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.span_events, FmtSpan::NONE);
        assert!(config.file_location);
        assert!(config.target);
        assert!(!config.thread_ids);
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LogConfig {
            filter: "binance_client=loud".to_string(),
            ..LogConfig::from_settings(&LoggingSettings::default())
        };
        assert!(config.env_filter().is_err());
    }
}
