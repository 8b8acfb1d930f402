//! # Binance Core
//!
//! Binance 클라이언트 크레이트들이 공유하는 기본 타입을 제공합니다:
//! - 거래쌍(`Pair`) 및 주문 관련 열거형
//! - 파일/환경 변수 기반 클라이언트 설정
//! - tracing 기반 로깅 인프라
//! - 공통 에러 타입

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
