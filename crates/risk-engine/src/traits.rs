use async_trait::async_trait;

use portfolio_aggregation::PortfolioService;
use portfolio_aggregation::source::{
    AggregatorProvider, FallbackPriceProvider, OneInchClient, WalletDataProvider,
};
use portfolio_aggregation::types::{ApiResult, PortfolioResult};

use crate::analyzer::{AnalyzerError, RiskAnalysis};
use crate::engine::AnalysisInput;

/// Market-context upstream feeding the analysis payload. All four calls
/// return opaque envelopes; the engine never interprets their bodies.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn transaction_history(&self, address: &str) -> ApiResult;

    async fn liquidity_sources(&self) -> ApiResult;

    async fn quote_presets(&self) -> ApiResult;

    async fn health_check(&self) -> ApiResult;
}

#[async_trait]
pub trait PortfolioProvider: Send + Sync {
    async fn portfolio(&self, address: &str) -> PortfolioResult;
}

/// The LLM collaborator. Prompting is the service's concern; this side
/// only ships the structured input and reads the structured output.
#[async_trait]
pub trait RiskAnalyzer: Send + Sync {
    async fn analyze(&self, input: &AnalysisInput) -> Result<RiskAnalysis, AnalyzerError>;
}

#[async_trait]
impl MarketDataProvider for OneInchClient {
    async fn transaction_history(&self, address: &str) -> ApiResult {
        self.get_history(address).await
    }

    async fn liquidity_sources(&self) -> ApiResult {
        self.get_liquidity_sources().await
    }

    async fn quote_presets(&self) -> ApiResult {
        self.get_presets().await
    }

    async fn health_check(&self) -> ApiResult {
        OneInchClient::health_check(self).await
    }
}

#[async_trait]
impl<A, W, F> PortfolioProvider for PortfolioService<A, W, F>
where
    A: AggregatorProvider + 'static,
    W: WalletDataProvider + 'static,
    F: FallbackPriceProvider + 'static,
{
    async fn portfolio(&self, address: &str) -> PortfolioResult {
        self.get_portfolio(address).await
    }
}
