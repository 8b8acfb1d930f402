//! Binance CLI 명령 모음.
//!
//! - REST 조회 (ping, 서버 시간, 거래소 정보, 최우선 호가, 계좌)
//! - 실시간 스트림 구독 (호가, 체결, 계좌)

pub mod commands;

pub use commands::rest::{run_query, RestQuery};
pub use commands::stream::{build_group, run_stream, StreamConfig};
