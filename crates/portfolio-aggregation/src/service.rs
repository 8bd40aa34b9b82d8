use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

use crate::normalize::{self, DEFAULT_TOKEN_DECIMALS, UNKNOWN_TOKEN_NAME, UNKNOWN_TOKEN_SYMBOL};
use crate::source::{AggregatorProvider, FallbackPriceProvider, WalletDataProvider};
use crate::types::{
    BalanceEntry, PortfolioRaw, PortfolioResult, Token, TokenListResult,
};

/// Portfolio Aggregation Service
///
/// Joins upstream balances, catalog metadata and prices into the displayed
/// asset list. Two upstream paths share the same joiner: the aggregator
/// path (balances keyed by token address, catalog lookup, bulk spot
/// prices) and the wallet-data path (native + ERC-20 balances with their
/// own decimals, prices with 24h change).
#[derive(Debug)]
pub struct PortfolioService<A, W, F> {
    aggregator: Arc<A>,
    wallet: Arc<W>,
    fallback_prices: Arc<F>,
    dust_threshold_usd: f64,
}

impl<A, W, F> PortfolioService<A, W, F>
where
    A: AggregatorProvider,
    W: WalletDataProvider,
    F: FallbackPriceProvider,
{
    pub fn new(
        aggregator: Arc<A>,
        wallet: Arc<W>,
        fallback_prices: Arc<F>,
        dust_threshold_usd: f64,
    ) -> Self {
        Self { aggregator, wallet, fallback_prices, dust_threshold_usd }
    }

    pub async fn get_tokens(&self) -> TokenListResult {
        self.aggregator.token_catalog().await
    }

    /// Aggregator-path portfolio: balance map -> catalog + spot prices ->
    /// join. A balance failure is the only hard failure; catalog and price
    /// failures degrade (unknown metadata, zero prices) and stay visible on
    /// their own envelopes.
    pub async fn get_portfolio(&self, address: &str) -> PortfolioResult {
        debug!("Fetching aggregator portfolio for {}", address);

        let balance_result = self.aggregator.balances(address).await;
        let mut raw =
            PortfolioRaw { balance: Some(balance_result.clone()), ..Default::default() };

        if let Some(error) = balance_result.error.clone() {
            return PortfolioResult { assets: Vec::new(), raw, error: Some(error) };
        }

        let balances: Vec<(String, String)> = balance_result
            .response
            .as_object()
            .map(|map| {
                map.iter()
                    .filter_map(|(address, balance)| {
                        balance.as_str().map(|b| (address.clone(), b.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        if balances.is_empty() {
            return PortfolioResult { assets: Vec::new(), raw, error: None };
        }

        let addresses: Vec<String> = balances.iter().map(|(address, _)| address.clone()).collect();

        let (tokens_result, prices_result) =
            tokio::join!(self.aggregator.token_catalog(), self.aggregator.spot_prices(&addresses));

        let catalog: HashMap<String, Token> = tokens_result
            .tokens
            .iter()
            .map(|token| (token.address.to_lowercase(), token.clone()))
            .collect();

        let prices = if prices_result.error.is_some() {
            warn!(
                "Spot price lookup failed ({:?}), falling back to per-asset quotations",
                prices_result.error
            );
            self.fallback_prices.asset_prices(&addresses).await
        } else {
            prices_result.prices.clone()
        };

        raw.tokens = Some(tokens_result.raw);
        raw.spot_prices = Some(prices_result.raw);

        let entries: Vec<BalanceEntry> = balances
            .iter()
            .map(|(address, balance)| {
                let token = catalog.get(&address.to_lowercase());
                BalanceEntry {
                    token_address: address.clone(),
                    balance: balance.clone(),
                    decimals: token.map(|t| t.decimals).unwrap_or(DEFAULT_TOKEN_DECIMALS),
                    name: token
                        .map(|t| t.name.clone())
                        .unwrap_or_else(|| UNKNOWN_TOKEN_NAME.to_string()),
                    symbol: token
                        .map(|t| t.symbol.clone())
                        .unwrap_or_else(|| UNKNOWN_TOKEN_SYMBOL.to_string()),
                    logo: token.map(|t| t.icon.clone()),
                }
            })
            .collect();

        let assets =
            normalize::build_assets(None, None, &entries, &prices, self.dust_threshold_usd);

        PortfolioResult { assets, raw, error: None }
    }

    /// Wallet-data-path portfolio: native and ERC-20 balances fetched
    /// concurrently, prices fetched for every held token plus the
    /// wrapped-native address so the native coin gets a price and 24h
    /// change. Hard failure only when both balance calls fail.
    pub async fn get_portfolio_assets(&self, address: &str) -> PortfolioResult {
        debug!("Fetching wallet portfolio for {}", address);

        let (native_result, erc20_result) = tokio::join!(
            self.wallet.native_balance(address),
            self.wallet.erc20_balances(address)
        );

        let mut raw = PortfolioRaw {
            native_balance: Some(native_result.clone()),
            erc20_balances: Some(erc20_result.raw.clone()),
            ..Default::default()
        };

        if native_result.error.is_some() && erc20_result.error.is_some() {
            let error = native_result.error.clone();
            return PortfolioResult { assets: Vec::new(), raw, error };
        }

        let entries = erc20_result.data.clone().unwrap_or_default();

        let mut addresses: Vec<String> =
            entries.iter().map(|entry| entry.token_address.clone()).collect();
        addresses.push(self.wallet.wrapped_native_address());

        let prices_result = self.wallet.token_prices(&addresses).await;
        raw.prices = Some(prices_result.raw.clone());

        let native_price = prices_result
            .prices
            .get(&self.wallet.wrapped_native_address().to_lowercase())
            .copied();

        let native_balance = if native_result.error.is_none() {
            native_result
                .response
                .get("balance")
                .and_then(|balance| balance.as_str())
                .map(|balance| balance.to_string())
        } else {
            None
        };

        let assets = normalize::build_assets(
            native_balance.as_deref(),
            native_price,
            &entries,
            &prices_result.prices,
            self.dust_threshold_usd,
        );

        PortfolioResult { assets, raw, error: None }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::json;

    use crate::types::{
        ApiResult, PriceMap, PriceQuote, PriceResult, RequestDetails, SourceResponse,
        TokenListResult,
    };

    use super::*;

    mock! {
        pub Aggregator {}

        #[async_trait]
        impl AggregatorProvider for Aggregator {
            async fn token_catalog(&self) -> TokenListResult;
            async fn balances(&self, address: &str) -> ApiResult;
            async fn spot_prices(&self, addresses: &[String]) -> PriceResult;
        }
    }

    mock! {
        pub Wallet {}

        #[async_trait]
        impl WalletDataProvider for Wallet {
            fn wrapped_native_address(&self) -> String;
            async fn native_balance(&self, address: &str) -> ApiResult;
            async fn erc20_balances(&self, address: &str) -> SourceResponse<Vec<BalanceEntry>>;
            async fn token_prices(&self, addresses: &[String]) -> PriceResult;
        }
    }

    mock! {
        pub Fallback {}

        #[async_trait]
        impl FallbackPriceProvider for Fallback {
            async fn asset_prices(&self, addresses: &[String]) -> PriceMap;
        }
    }

    fn envelope(response: serde_json::Value, error: Option<&str>) -> ApiResult {
        ApiResult {
            request: RequestDetails {
                method: "GET".to_string(),
                url: "https://api.example.com".to_string(),
                body: None,
            },
            response,
            error: error.map(|e| e.to_string()),
        }
    }

    fn catalog_with_usdc() -> TokenListResult {
        TokenListResult {
            tokens: vec![Token {
                symbol: "USDC".to_string(),
                name: "USD Coin".to_string(),
                address: "0xA".to_string(),
                decimals: 6,
                icon: "https://icons/usdc.png".to_string(),
            }],
            raw: envelope(json!({ "tokens": {} }), None),
            error: None,
        }
    }

    fn service(
        aggregator: MockAggregator,
        wallet: MockWallet,
        fallback: MockFallback,
    ) -> PortfolioService<MockAggregator, MockWallet, MockFallback> {
        PortfolioService::new(
            Arc::new(aggregator),
            Arc::new(wallet),
            Arc::new(fallback),
            0.01,
        )
    }

    #[tokio::test]
    async fn test_catalog_balance_and_price_join() {
        let mut aggregator = MockAggregator::new();
        aggregator
            .expect_balances()
            .returning(|_| envelope(json!({ "0xA": "1000000" }), None));
        aggregator.expect_token_catalog().returning(|| catalog_with_usdc());
        aggregator.expect_spot_prices().returning(|_| {
            let mut prices = PriceMap::new();
            prices.insert("0xa".to_string(), PriceQuote { usd: 1.0, change24h: 0.0 });
            PriceResult { prices, raw: envelope(json!({ "0xA": "1.00" }), None), error: None }
        });

        let service = service(aggregator, MockWallet::new(), MockFallback::new());
        let result = service.get_portfolio("0xwallet").await;

        assert!(result.error.is_none());
        assert_eq!(result.assets.len(), 1);
        assert_eq!(result.assets[0].symbol, "USDC");
        assert_eq!(result.assets[0].balance, 1.0);
        assert_eq!(result.assets[0].price, 1.0);
    }

    #[tokio::test]
    async fn test_balance_failure_is_a_hard_failure() {
        let mut aggregator = MockAggregator::new();
        aggregator
            .expect_balances()
            .returning(|_| envelope(json!({ "error": "boom" }), Some("boom")));

        let service = service(aggregator, MockWallet::new(), MockFallback::new());
        let result = service.get_portfolio("0xwallet").await;

        assert!(result.assets.is_empty());
        assert_eq!(result.error.unwrap(), "boom");
    }

    #[tokio::test]
    async fn test_price_failure_degrades_to_zero_prices() {
        let mut aggregator = MockAggregator::new();
        aggregator
            .expect_balances()
            .returning(|_| envelope(json!({ "0xA": "1000000" }), None));
        aggregator.expect_token_catalog().returning(|| catalog_with_usdc());
        aggregator.expect_spot_prices().returning(|_| PriceResult {
            prices: PriceMap::new(),
            raw: envelope(json!({ "error": "rate limited" }), Some("rate limited")),
            error: Some("rate limited".to_string()),
        });

        let mut fallback = MockFallback::new();
        fallback.expect_asset_prices().returning(|_| PriceMap::new());

        let service = service(aggregator, MockWallet::new(), fallback);
        let result = service.get_portfolio("0xwallet").await;

        // balances still produce assets, the failure stays on the price envelope
        assert!(result.error.is_none());
        assert_eq!(result.assets.len(), 1);
        assert_eq!(result.assets[0].price, 0.0);
        assert_eq!(result.raw.spot_prices.unwrap().error.unwrap(), "rate limited");
    }

    #[tokio::test]
    async fn test_price_failure_consults_fallback_source() {
        let mut aggregator = MockAggregator::new();
        aggregator
            .expect_balances()
            .returning(|_| envelope(json!({ "0xA": "1000000" }), None));
        aggregator.expect_token_catalog().returning(|| catalog_with_usdc());
        aggregator.expect_spot_prices().returning(|_| PriceResult {
            prices: PriceMap::new(),
            raw: envelope(json!({ "error": "down" }), Some("down")),
            error: Some("down".to_string()),
        });

        let mut fallback = MockFallback::new();
        fallback.expect_asset_prices().times(1).returning(|_| {
            let mut prices = PriceMap::new();
            prices.insert("0xa".to_string(), PriceQuote { usd: 2.0, change24h: 0.0 });
            prices
        });

        let service = service(aggregator, MockWallet::new(), fallback);
        let result = service.get_portfolio("0xwallet").await;

        assert_eq!(result.assets[0].price, 2.0);
    }

    #[tokio::test]
    async fn test_unknown_catalog_entry_defaults_metadata() {
        let mut aggregator = MockAggregator::new();
        aggregator
            .expect_balances()
            .returning(|_| envelope(json!({ "0xdead": "1000000000000000000" }), None));
        aggregator.expect_token_catalog().returning(|| TokenListResult {
            tokens: Vec::new(),
            raw: envelope(json!({ "tokens": {} }), None),
            error: None,
        });
        aggregator.expect_spot_prices().returning(|_| {
            let mut prices = PriceMap::new();
            prices.insert("0xdead".to_string(), PriceQuote { usd: 1.0, change24h: 0.0 });
            PriceResult { prices, raw: envelope(json!({}), None), error: None }
        });

        let service = service(aggregator, MockWallet::new(), MockFallback::new());
        let result = service.get_portfolio("0xwallet").await;

        assert_eq!(result.assets[0].name, UNKNOWN_TOKEN_NAME);
        assert_eq!(result.assets[0].symbol, UNKNOWN_TOKEN_SYMBOL);
        // without catalog metadata the default scale applies
        assert_eq!(result.assets[0].balance, 1.0);
    }

    #[tokio::test]
    async fn test_empty_balance_map_returns_no_assets_without_error() {
        let mut aggregator = MockAggregator::new();
        aggregator.expect_balances().returning(|_| envelope(json!({}), None));

        let service = service(aggregator, MockWallet::new(), MockFallback::new());
        let result = service.get_portfolio("0xwallet").await;

        assert!(result.assets.is_empty());
        assert!(result.error.is_none());
    }

    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

    #[tokio::test]
    async fn test_wallet_path_prices_native_coin_via_wrapped_token() {
        let mut wallet = MockWallet::new();
        wallet.expect_wrapped_native_address().return_const(WETH.to_string());
        wallet
            .expect_native_balance()
            .returning(|_| envelope(json!({ "balance": "2000000000000000000" }), None));
        wallet.expect_erc20_balances().returning(|_| SourceResponse {
            data: Some(vec![BalanceEntry {
                token_address: "0xA".to_string(),
                balance: "5000000".to_string(),
                decimals: 6,
                name: "USD Coin".to_string(),
                symbol: "USDC".to_string(),
                logo: None,
            }]),
            raw: envelope(json!([]), None),
            error: None,
        });
        wallet.expect_token_prices().returning(|addresses| {
            assert!(addresses.contains(&WETH.to_string()));
            let mut prices = PriceMap::new();
            prices.insert(WETH.to_string(), PriceQuote { usd: 3000.0, change24h: -2.0 });
            prices.insert("0xa".to_string(), PriceQuote { usd: 1.0, change24h: 0.1 });
            PriceResult { prices, raw: envelope(json!({}), None), error: None }
        });

        let service = service(MockAggregator::new(), wallet, MockFallback::new());
        let result = service.get_portfolio_assets("0xwallet").await;

        assert_eq!(result.assets.len(), 2);
        // native position sorts first at 2 * 3000 USD
        assert_eq!(result.assets[0].id, "eth-native");
        assert_eq!(result.assets[0].price, 3000.0);
        assert_eq!(result.assets[0].change24h, -2.0);
        assert_eq!(result.assets[1].symbol, "USDC");
        assert_eq!(result.assets[1].change24h, 0.1);
    }

    #[tokio::test]
    async fn test_wallet_path_fails_only_when_both_balance_calls_fail() {
        let mut wallet = MockWallet::new();
        wallet.expect_wrapped_native_address().return_const(WETH.to_string());
        wallet
            .expect_native_balance()
            .returning(|_| envelope(json!({ "error": "down" }), Some("down")));
        wallet.expect_erc20_balances().returning(|_| SourceResponse {
            data: None,
            raw: envelope(json!({ "error": "down" }), Some("down")),
            error: Some("down".to_string()),
        });

        let service = service(MockAggregator::new(), wallet, MockFallback::new());
        let result = service.get_portfolio_assets("0xwallet").await;

        assert!(result.assets.is_empty());
        assert_eq!(result.error.unwrap(), "down");
    }
}
