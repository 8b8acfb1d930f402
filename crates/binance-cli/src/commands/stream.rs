//! 실시간 스트림 명령.
//!
//! 호가/체결 구독은 하나의 연결로 묶고, 계좌 스트림은 별도 연결로 엽니다.

use binance_client::stream::events::{decode, TradeEvent};
use binance_client::stream::{
    handler_fn, AccountSubscription, BestOrderBookTickerSubscription, Bundle, MessageHandler,
    SessionGroup, Subscription, TradeSubscription,
};
use binance_client::BinanceClient;
use binance_core::Pair;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// 구독 구성.
#[derive(Debug, Clone, Default)]
pub struct StreamConfig {
    /// 전체 심볼 최우선 호가
    pub ticker: bool,
    /// 체결 스트림 거래쌍
    pub trades: Vec<Pair>,
    /// 계좌 스트림
    pub account: bool,
}

impl StreamConfig {
    pub fn is_empty(&self) -> bool {
        !self.ticker && self.trades.is_empty() && !self.account
    }
}

/// 구성에 따라 세션 그룹을 만듭니다.
pub fn build_group(client: &BinanceClient, config: &StreamConfig) -> SessionGroup {
    let mut group = client.session_group();

    let mut market: Bundle = Vec::new();
    if config.ticker {
        market.push(Box::new(BestOrderBookTickerSubscription::new(vec![
            print_handler("book ticker"),
        ])));
    }
    for pair in &config.trades {
        market.push(Box::new(TradeSubscription::new(
            pair.clone(),
            vec![trade_latency_handler()],
        )));
    }
    if !market.is_empty() {
        group.compose_subscriptions(market);
    }

    if config.account {
        let account: Box<dyn Subscription> = Box::new(AccountSubscription::new(
            Arc::new(client.clone()),
            vec![print_handler("account")],
        ));
        group.compose_subscriptions(vec![account]);
    }

    group
}

/// 스트림을 시작하고 종료 신호까지 실행합니다.
pub async fn run_stream(
    client: &BinanceClient,
    config: &StreamConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let group = build_group(client, config);
    info!(bundles = group.bundle_count(), "스트림 시작");

    group.start_subscriptions(shutdown).await?;

    info!("스트림 종료");
    Ok(())
}

fn print_handler(label: &'static str) -> Arc<dyn MessageHandler> {
    handler_fn(move |message| async move {
        println!("[{}] {}", label, message);
        Ok(())
    })
}

fn trade_latency_handler() -> Arc<dyn MessageHandler> {
    handler_fn(|message| async move {
        let trade: TradeEvent = decode(&message)?;
        let latency = trade
            .latency(chrono::Utc::now())
            .map(|d| d.num_milliseconds())
            .unwrap_or_default();
        println!(
            "[trade] {} {} @ {} (latency {} ms)",
            trade.symbol, trade.quantity, trade.price, latency
        );
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use binance_core::ClientSettings;

    fn client() -> BinanceClient {
        BinanceClient::new(ClientSettings::default().with_credentials("key", "secret")).unwrap()
    }

    #[test]
    fn test_market_streams_share_one_bundle() {
        let config = StreamConfig {
            ticker: true,
            trades: vec![Pair::new("ETH", "BTC"), Pair::new("BNB", "BTC")],
            account: false,
        };
        assert_eq!(build_group(&client(), &config).bundle_count(), 1);
    }

    #[test]
    fn test_account_stream_gets_its_own_bundle() {
        let config = StreamConfig {
            ticker: false,
            trades: vec![Pair::new("ETH", "BTC")],
            account: true,
        };
        assert_eq!(build_group(&client(), &config).bundle_count(), 2);
    }

    #[test]
    fn test_empty_config() {
        let config = StreamConfig::default();
        assert!(config.is_empty());
        assert_eq!(build_group(&client(), &config).bundle_count(), 0);
    }
}
