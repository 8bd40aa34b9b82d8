use async_trait::async_trait;

use crate::types::{ApiResult, BalanceEntry, PriceMap, PriceResult, SourceResponse, TokenListResult};

pub mod dia;
pub mod moralis;
pub mod oneinch;

pub use dia::DiaClient;
pub use moralis::MoralisClient;
pub use oneinch::OneInchClient;

/// Aggregator-side upstream: token catalog, wallet balances keyed by token
/// address, and bulk spot prices.
#[async_trait]
pub trait AggregatorProvider: Send + Sync {
    async fn token_catalog(&self) -> TokenListResult;

    async fn balances(&self, address: &str) -> ApiResult;

    async fn spot_prices(&self, addresses: &[String]) -> PriceResult;
}

/// Wallet-data upstream: native and ERC-20 balances plus prices with 24h
/// change. The wrapped-native address is used to price the native coin.
#[async_trait]
pub trait WalletDataProvider: Send + Sync {
    fn wrapped_native_address(&self) -> String;

    async fn native_balance(&self, address: &str) -> ApiResult;

    async fn erc20_balances(&self, address: &str) -> SourceResponse<Vec<BalanceEntry>>;

    async fn token_prices(&self, addresses: &[String]) -> PriceResult;
}

/// Per-asset price source consulted only when the bulk spot-price call
/// fails. Missing quotations are tolerated.
#[async_trait]
pub trait FallbackPriceProvider: Send + Sync {
    async fn asset_prices(&self, addresses: &[String]) -> PriceMap;
}
