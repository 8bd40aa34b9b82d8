use std::sync::Arc;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use portfolio_aggregation::types::{ApiResult, Asset, PortfolioRaw};

use crate::analyzer::RiskAnalysis;
use crate::traits::{MarketDataProvider, PortfolioProvider, RiskAnalyzer};

/// The structured payload handed to the analyzer: the top holdings by
/// value plus the raw market context the upstream calls returned.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisInput {
    pub top_token_holdings: Vec<Asset>,
    pub full_portfolio: serde_json::Value,
    pub history: serde_json::Value,
    pub liquidity_sources: serde_json::Value,
    pub presets: serde_json::Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SourceError {
    pub name: String,
    pub error: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct PreparedRaw {
    pub history: ApiResult,
    pub liquidity_sources: ApiResult,
    pub presets: ApiResult,
    pub health_check: ApiResult,
    pub portfolio: PortfolioRaw,
}

#[derive(Serialize, Debug, Clone)]
pub struct PreparedAnalysis {
    pub input: AnalysisInput,
    pub errors: Vec<SourceError>,
    pub raw: PreparedRaw,
}

#[derive(Serialize, Debug, Clone)]
pub struct ExecutionRaw {
    pub request: AnalysisInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<RiskAnalysis>,
}

#[derive(Serialize, Debug, Clone)]
pub struct ExecutedAnalysis {
    pub data: Option<RiskAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub raw: ExecutionRaw,
}

/// Risk Analysis Engine
///
/// Fans out the market-context and portfolio calls concurrently, merges
/// whatever subset succeeded, and hands the combined payload to the
/// analyzer. A failed source lands in the per-source error list; it never
/// aborts the aggregate.
#[derive(Debug)]
pub struct RiskEngine<M, P, A> {
    market: Arc<M>,
    portfolio: Arc<P>,
    analyzer: Arc<A>,
    top_holdings: usize,
}

impl<M, P, A> RiskEngine<M, P, A>
where
    M: MarketDataProvider,
    P: PortfolioProvider,
    A: RiskAnalyzer,
{
    pub fn new(market: Arc<M>, portfolio: Arc<P>, analyzer: Arc<A>, top_holdings: usize) -> Self {
        Self { market, portfolio, analyzer, top_holdings }
    }

    /// Gather everything the analyzer needs. Best-effort: the returned
    /// payload always carries whatever subset of sources succeeded.
    pub async fn prepare(&self, address: &str) -> PreparedAnalysis {
        info!("Preparing risk analysis for {}", address);

        let (history, liquidity_sources, presets, health_check, portfolio) = tokio::join!(
            self.market.transaction_history(address),
            self.market.liquidity_sources(),
            self.market.quote_presets(),
            self.market.health_check(),
            self.portfolio.portfolio(address),
        );

        let mut errors = Vec::new();
        for (name, error) in [
            ("History", &history.error),
            ("Liquidity Sources", &liquidity_sources.error),
            ("Presets", &presets.error),
            ("Health Check", &health_check.error),
            ("Portfolio", &portfolio.error),
        ] {
            if let Some(error) = error {
                errors.push(SourceError { name: name.to_string(), error: error.clone() });
            }
        }

        if !errors.is_empty() {
            warn!(
                "{} of 5 upstream calls failed during analysis preparation: {}",
                errors.len(),
                errors
                    .iter()
                    .map(|e| format!("{}: {}", e.name, e.error))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        let top_token_holdings: Vec<Asset> =
            portfolio.assets.iter().take(self.top_holdings).cloned().collect();

        let input = AnalysisInput {
            top_token_holdings,
            full_portfolio: serde_json::to_value(&portfolio.raw)
                .unwrap_or(serde_json::Value::Null),
            history: history.response.clone(),
            liquidity_sources: liquidity_sources.response.clone(),
            presets: presets.response.clone(),
        };

        PreparedAnalysis {
            input,
            errors,
            raw: PreparedRaw {
                history,
                liquidity_sources,
                presets,
                health_check,
                portfolio: portfolio.raw,
            },
        }
    }

    /// Hand a prepared payload to the analyzer.
    pub async fn execute(&self, input: &AnalysisInput) -> ExecutedAnalysis {
        match self.analyzer.analyze(input).await {
            Ok(analysis) => ExecutedAnalysis {
                data: Some(analysis.clone()),
                error: None,
                raw: ExecutionRaw { request: input.clone(), response: Some(analysis) },
            },
            Err(err) => {
                error!("Risk analysis execution failed: {}", err);
                ExecutedAnalysis {
                    data: None,
                    error: Some(err.to_string()),
                    raw: ExecutionRaw { request: input.clone(), response: None },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use mockall::mock;
    use reqwest::StatusCode;
    use serde_json::json;

    use portfolio_aggregation::types::{PortfolioResult, RequestDetails};

    use crate::analyzer::AnalyzerError;

    use super::*;

    mock! {
        pub Market {}

        #[async_trait]
        impl MarketDataProvider for Market {
            async fn transaction_history(&self, address: &str) -> ApiResult;
            async fn liquidity_sources(&self) -> ApiResult;
            async fn quote_presets(&self) -> ApiResult;
            async fn health_check(&self) -> ApiResult;
        }
    }

    mock! {
        pub Portfolio {}

        #[async_trait]
        impl PortfolioProvider for Portfolio {
            async fn portfolio(&self, address: &str) -> PortfolioResult;
        }
    }

    mock! {
        pub Analyzer {}

        #[async_trait]
        impl RiskAnalyzer for Analyzer {
            async fn analyze(&self, input: &AnalysisInput) -> Result<RiskAnalysis, AnalyzerError>;
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

    fn asset(symbol: &str, value: f64) -> Asset {
        Asset {
            id: symbol.to_lowercase(),
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            icon: String::new(),
            balance: 1.0,
            price: value,
            change24h: 0.0,
        }
    }

    fn portfolio_with(assets: Vec<Asset>) -> PortfolioResult {
        PortfolioResult { assets, raw: PortfolioRaw::default(), error: None }
    }

    fn sample_input() -> AnalysisInput {
        AnalysisInput {
            top_token_holdings: vec![asset("ETH", 3000.0)],
            full_portfolio: json!({}),
            history: json!({}),
            liquidity_sources: json!({}),
            presets: json!({}),
        }
    }

    #[tokio::test]
    async fn test_partial_upstream_failures_do_not_abort_the_aggregate() {
        let mut market = MockMarket::new();
        market
            .expect_transaction_history()
            .returning(|_| envelope(json!({ "error": "timeout" }), Some("timeout")));
        market
            .expect_liquidity_sources()
            .returning(|| envelope(json!({ "protocols": ["UNISWAP_V3"] }), None));
        market
            .expect_quote_presets()
            .returning(|| envelope(json!({ "error": "rate limited" }), Some("rate limited")));
        market.expect_health_check().returning(|| envelope(json!({ "status": "OK" }), None));

        let mut portfolio = MockPortfolio::new();
        portfolio
            .expect_portfolio()
            .returning(|_| portfolio_with(vec![asset("ETH", 3000.0), asset("USDC", 100.0)]));

        let engine =
            RiskEngine::new(Arc::new(market), Arc::new(portfolio), Arc::new(MockAnalyzer::new()), 5);
        let prepared = engine.prepare("0xwallet").await;

        let failed: Vec<&str> = prepared.errors.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(failed, vec!["History", "Presets"]);

        // the successes are still merged into the payload
        assert_eq!(prepared.input.liquidity_sources, json!({ "protocols": ["UNISWAP_V3"] }));
        assert_eq!(prepared.input.top_token_holdings.len(), 2);
        assert_eq!(prepared.raw.health_check.response, json!({ "status": "OK" }));
    }

    #[tokio::test]
    async fn test_top_holdings_are_truncated() {
        let mut market = MockMarket::new();
        market.expect_transaction_history().returning(|_| envelope(json!({}), None));
        market.expect_liquidity_sources().returning(|| envelope(json!({}), None));
        market.expect_quote_presets().returning(|| envelope(json!({}), None));
        market.expect_health_check().returning(|| envelope(json!({}), None));

        let mut portfolio = MockPortfolio::new();
        portfolio.expect_portfolio().returning(|_| {
            portfolio_with(
                (0..7).map(|i| asset(&format!("TOK{}", i), 100.0 - i as f64)).collect(),
            )
        });

        let engine =
            RiskEngine::new(Arc::new(market), Arc::new(portfolio), Arc::new(MockAnalyzer::new()), 5);
        let prepared = engine.prepare("0xwallet").await;

        assert_eq!(prepared.input.top_token_holdings.len(), 5);
        assert_eq!(prepared.input.top_token_holdings[0].symbol, "TOK0");
    }

    #[tokio::test]
    async fn test_execute_returns_analysis_with_request_response_pair() {
        let mut analyzer = MockAnalyzer::new();
        analyzer.expect_analyze().returning(|_| {
            Ok(RiskAnalysis {
                risk_summary: "Concentrated in ETH".to_string(),
                recommendations: "Diversify into stablecoins".to_string(),
            })
        });

        let engine = RiskEngine::new(
            Arc::new(MockMarket::new()),
            Arc::new(MockPortfolio::new()),
            Arc::new(analyzer),
            5,
        );
        let executed = engine.execute(&sample_input()).await;

        assert!(executed.error.is_none());
        assert_eq!(executed.data.unwrap().risk_summary, "Concentrated in ETH");
        assert!(executed.raw.response.is_some());
    }

    #[tokio::test]
    async fn test_execute_surfaces_analyzer_failure() {
        let mut analyzer = MockAnalyzer::new();
        analyzer
            .expect_analyze()
            .returning(|_| Err(AnalyzerError::RequestFailed(StatusCode::BAD_GATEWAY)));

        let engine = RiskEngine::new(
            Arc::new(MockMarket::new()),
            Arc::new(MockPortfolio::new()),
            Arc::new(analyzer),
            5,
        );
        let executed = engine.execute(&sample_input()).await;

        assert!(executed.data.is_none());
        assert!(executed.error.unwrap().contains("502"));
        assert!(executed.raw.response.is_none());
    }
}
