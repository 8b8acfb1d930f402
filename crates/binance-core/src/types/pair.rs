//! 거래쌍 정의.
//!
//! Binance는 거래쌍을 구분자 없는 `BASEQUOTE` 형식(예: `ETHBTC`)으로 표기하며,
//! 스트림 이름에는 같은 문자열의 소문자 형태를 사용합니다.

use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 기준 자산과 호가 자산으로 이루어진 거래쌍.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    /// 기준 자산 (예: ETH)
    pub base: String,
    /// 호가 자산 (예: BTC)
    pub quote: String,
}

impl Pair {
    /// 새 거래쌍을 생성합니다. 자산 이름은 대문자로 정규화됩니다.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// WebSocket 스트림 이름에 쓰이는 소문자 심볼 (예: `ethbtc`).
    pub fn stream_symbol(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base, self.quote)
    }
}

impl FromStr for Pair {
    type Err = CoreError;

    /// `BASE/QUOTE` 형식을 파싱합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((base, quote)) if !base.trim().is_empty() && !quote.trim().is_empty() => {
                Ok(Self::new(base.trim(), quote.trim()))
            }
            _ => Err(CoreError::InvalidInput(format!(
                "거래쌍 형식은 BASE/QUOTE 이어야 합니다: {}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pair_display() {
        let pair = Pair::new("eth", "btc");
        assert_eq!(pair.to_string(), "ETHBTC");
        assert_eq!(pair.stream_symbol(), "ethbtc");
    }

    #[test]
    fn test_pair_from_str() {
        let pair: Pair = "ETH/BTC".parse().unwrap();
        assert_eq!(pair, Pair::new("ETH", "BTC"));

        assert!("ETHBTC".parse::<Pair>().is_err());
        assert!("/BTC".parse::<Pair>().is_err());
        assert!("ETH/".parse::<Pair>().is_err());
    }

    proptest! {
        #[test]
        fn stream_symbol_is_lowercase_concatenation(
            base in "[A-Za-z]{2,6}",
            quote in "[A-Za-z]{2,6}",
        ) {
            let pair = Pair::new(base.clone(), quote.clone());
            prop_assert_eq!(
                pair.stream_symbol(),
                format!("{}{}", base.to_lowercase(), quote.to_lowercase())
            );
        }
    }
}
