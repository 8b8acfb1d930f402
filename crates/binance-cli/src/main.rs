//! Binance REST/WebSocket CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 서버 연결 확인
//! binance ping
//!
//! # ETH/BTC 최우선 호가 조회
//! binance book-ticker --pair ETH/BTC
//!
//! # 전체 호가 + 체결 스트림 구독 (Ctrl+C로 종료)
//! binance stream --ticker --trade ETH/BTC --trade BNB/BTC
//!
//! # 계좌 스트림 (API 키 필요)
//! binance --config binance.toml stream --account
//! ```

use anyhow::anyhow;
use binance_cli::commands::rest::{run_query, RestQuery};
use binance_cli::commands::stream::{run_stream, StreamConfig};
use binance_client::BinanceClient;
use binance_core::{init_logging, ClientSettings, LogConfig, Pair};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "binance")]
#[command(about = "Binance REST/WebSocket client CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로 (환경 변수가 우선)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 서버 연결 확인
    Ping,

    /// 서버 시간 조회
    Time,

    /// 거래소 정보 조회
    ExchangeInfo,

    /// 최우선 호가 조회
    BookTicker {
        /// 거래쌍 (예: ETH/BTC), 생략 시 전체
        #[arg(short, long)]
        pair: Option<Pair>,
    },

    /// 계좌 정보 조회 (서명 필요)
    Account {
        /// 요청 유효 시간 (밀리초)
        #[arg(long)]
        recv_window: Option<u64>,
    },

    /// 실시간 스트림 구독
    Stream {
        /// 전체 심볼 최우선 호가 구독
        #[arg(long, default_value = "false")]
        ticker: bool,

        /// 체결 스트림 거래쌍 (여러 번 지정 가능)
        #[arg(long = "trade", value_name = "PAIR")]
        trades: Vec<Pair>,

        /// 계좌 스트림 구독 (별도 연결)
        #[arg(long, default_value = "false")]
        account: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = ClientSettings::load(cli.config.as_deref())?;
    init_logging(LogConfig::from_settings(&settings.logging)).map_err(|e| anyhow!(e.to_string()))?;

    let client = BinanceClient::new(settings)?;

    let result = match cli.command {
        Commands::Ping => run_query(&client, RestQuery::Ping).await,
        Commands::Time => run_query(&client, RestQuery::Time).await,
        Commands::ExchangeInfo => run_query(&client, RestQuery::ExchangeInfo).await,
        Commands::BookTicker { pair } => run_query(&client, RestQuery::BookTicker(pair)).await,
        Commands::Account { recv_window } => {
            run_query(
                &client,
                RestQuery::Account {
                    recv_window_ms: recv_window,
                },
            )
            .await
        }
        Commands::Stream {
            ticker,
            trades,
            account,
        } => {
            let config = StreamConfig {
                ticker,
                trades,
                account,
            };
            if config.is_empty() {
                return Err(anyhow!(
                    "구독할 스트림이 없습니다 (--ticker, --trade, --account 중 하나 이상 지정)"
                ));
            }

            let shutdown = CancellationToken::new();
            tokio::spawn(shutdown_signal(shutdown.clone()));
            run_stream(&client, &config, shutdown).await
        }
    };

    if let Err(e) = &result {
        error!("명령 실패: {:#}", e);
    }
    result
}

/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    shutdown_token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_with_multiple_trades() {
        let cli = Cli::try_parse_from([
            "binance", "stream", "--ticker", "--trade", "ETH/BTC", "--trade", "bnb/btc",
        ])
        .unwrap();

        match cli.command {
            Commands::Stream {
                ticker,
                trades,
                account,
            } => {
                assert!(ticker);
                assert!(!account);
                assert_eq!(trades, vec![Pair::new("ETH", "BTC"), Pair::new("BNB", "BTC")]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["binance", "ping", "--config", "binance.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("binance.toml")));
        assert!(matches!(cli.command, Commands::Ping));
    }

    #[test]
    fn test_parse_rejects_malformed_pair() {
        assert!(Cli::try_parse_from(["binance", "book-ticker", "--pair", "ETHBTC"]).is_err());
    }

    #[test]
    fn test_parse_account_recv_window() {
        let cli = Cli::try_parse_from(["binance", "account", "--recv-window", "5000"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Account {
                recv_window: Some(5000)
            }
        ));
    }
}
