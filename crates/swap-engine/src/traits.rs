use async_trait::async_trait;

use portfolio_aggregation::source::OneInchClient;
use portfolio_aggregation::source::oneinch::types::{
    ClassicSwapRequest, FusionQuote, FusionQuoteRequest, Swap, SwapTransaction,
};
use portfolio_aggregation::types::SourceResponse;

/// Upstream quote source. Amounts in requests and responses are base
/// units; scaling to display floats happens in the engine, nowhere else.
#[async_trait]
pub trait SwapQuoteProvider: Send + Sync {
    async fn fusion_quote(&self, request: &FusionQuoteRequest) -> SourceResponse<FusionQuote>;

    async fn classic_swap(&self, request: &ClassicSwapRequest) -> SourceResponse<Swap>;
}

/// Gas estimation collaborator. Infallible by contract: implementations
/// degrade to a nominal constant instead of erroring.
#[async_trait]
pub trait GasProvider: Send + Sync {
    async fn estimate_gas(&self, tx: &SwapTransaction) -> String;
}

#[async_trait]
impl SwapQuoteProvider for OneInchClient {
    async fn fusion_quote(&self, request: &FusionQuoteRequest) -> SourceResponse<FusionQuote> {
        OneInchClient::fusion_quote(self, request).await
    }

    async fn classic_swap(&self, request: &ClassicSwapRequest) -> SourceResponse<Swap> {
        OneInchClient::classic_swap(self, request).await
    }
}
