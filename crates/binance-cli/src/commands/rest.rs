//! REST 조회 명령.

use binance_client::{BinanceClient, RestResponse};
use binance_core::Pair;
use tracing::info;

/// 실행할 REST 조회.
#[derive(Debug, Clone, PartialEq)]
pub enum RestQuery {
    Ping,
    Time,
    ExchangeInfo,
    BookTicker(Option<Pair>),
    Account { recv_window_ms: Option<u64> },
}

/// REST 조회를 실행하고 응답을 출력합니다.
pub async fn run_query(client: &BinanceClient, query: RestQuery) -> anyhow::Result<()> {
    info!(?query, "REST 조회 실행");

    let response = match &query {
        RestQuery::Ping => client.ping().await?,
        RestQuery::Time => client.get_time().await?,
        RestQuery::ExchangeInfo => client.get_exchange_info().await?,
        RestQuery::BookTicker(pair) => client.get_best_orderbook_ticker(pair.as_ref()).await?,
        RestQuery::Account { recv_window_ms } => client.get_account(*recv_window_ms).await?,
    };

    println!("{}", render(&response)?);
    Ok(())
}

fn render(response: &RestResponse) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_keeps_status_and_body() {
        let response = RestResponse {
            status_code: 200,
            response: json!({"serverTime": 1499827319559i64}),
        };
        let rendered: serde_json::Value = serde_json::from_str(&render(&response).unwrap()).unwrap();

        assert_eq!(rendered["status_code"], 200);
        assert_eq!(rendered["response"]["serverTime"], 1499827319559i64);
    }
}
