//! Binance API 전반에서 사용되는 공통 타입.

mod enums;
mod pair;

pub use enums::*;
pub use pair::*;
