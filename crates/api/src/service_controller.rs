use std::sync::Arc;

use axum::{Json, Router, extract::Query, http::StatusCode, response::IntoResponse, routing::get};
use serde::Deserialize;
use serde_json::json;

use portfolio_aggregation::PortfolioService;
use portfolio_aggregation::source::{DiaClient, MoralisClient, OneInchClient};
use portfolio_aggregation::types::Token;
use risk_engine::{AnalysisInput, HttpRiskAnalyzer, RiskEngine};
use swap_engine::{RpcGasEstimator, SwapEngine};

pub type AppPortfolioService = PortfolioService<OneInchClient, MoralisClient, DiaClient>;
pub type AppSwapEngine = SwapEngine<OneInchClient, RpcGasEstimator>;
pub type AppRiskEngine = RiskEngine<OneInchClient, AppPortfolioService, HttpRiskAnalyzer>;

#[derive(Deserialize, Debug)]
pub struct PortfolioQuery {
    pub address: String,
    // "aggregator" (default) or "wallet"
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct AddressQuery {
    pub address: String,
}

#[derive(Deserialize, Debug)]
pub struct SwapQuery {
    pub from_address: String,
    pub from_decimals: u8,
    #[serde(default)]
    pub from_symbol: Option<String>,
    pub to_address: String,
    pub to_decimals: u8,
    #[serde(default)]
    pub to_symbol: Option<String>,
    pub amount: String,
    pub wallet_address: String,
}

impl SwapQuery {
    fn from_token(&self) -> Token {
        token_from(&self.from_address, self.from_decimals, self.from_symbol.as_deref())
    }

    fn to_token(&self) -> Token {
        token_from(&self.to_address, self.to_decimals, self.to_symbol.as_deref())
    }
}

fn token_from(address: &str, decimals: u8, symbol: Option<&str>) -> Token {
    Token {
        symbol: symbol.unwrap_or_default().to_string(),
        name: String::new(),
        address: address.to_string(),
        decimals,
        icon: String::new(),
    }
}

pub struct ServiceController {
    portfolio_service: Arc<AppPortfolioService>,
    swap_engine: Arc<AppSwapEngine>,
    risk_engine: Arc<AppRiskEngine>,
}

impl ServiceController {
    pub fn new(
        portfolio_service: Arc<AppPortfolioService>,
        swap_engine: Arc<AppSwapEngine>,
        risk_engine: Arc<AppRiskEngine>,
    ) -> Self {
        Self { portfolio_service, swap_engine, risk_engine }
    }

    pub fn router(self) -> Router {
        let portfolio_service = self.portfolio_service.clone();
        let swap_engine = self.swap_engine.clone();
        let risk_engine = self.risk_engine.clone();

        Router::new()
            .route("/", get(ServiceController::status))
            .route("/api/health", get(ServiceController::status))
            .route(
                "/api/tokens",
                get({
                    let portfolio_service = portfolio_service.clone();
                    move || async move {
                        ServiceController::get_tokens(portfolio_service.clone()).await
                    }
                }),
            )
            .route(
                "/api/portfolio",
                get({
                    let portfolio_service = portfolio_service.clone();
                    move |Query(query): Query<PortfolioQuery>| async move {
                        ServiceController::get_portfolio(portfolio_service.clone(), query).await
                    }
                }),
            )
            .route(
                "/api/quote",
                get({
                    let swap_engine = swap_engine.clone();
                    move |Query(query): Query<SwapQuery>| async move {
                        ServiceController::get_quote(swap_engine.clone(), query).await
                    }
                }),
            )
            .route(
                "/api/swap",
                get({
                    let swap_engine = swap_engine.clone();
                    move |Query(query): Query<SwapQuery>| async move {
                        ServiceController::get_swap(swap_engine.clone(), query).await
                    }
                }),
            )
            .route(
                "/api/gas",
                get({
                    let swap_engine = swap_engine.clone();
                    move |Query(query): Query<SwapQuery>| async move {
                        ServiceController::get_gas(swap_engine.clone(), query).await
                    }
                }),
            )
            .route(
                "/api/risk/prepare",
                get({
                    let risk_engine = risk_engine.clone();
                    move |Query(query): Query<AddressQuery>| async move {
                        ServiceController::prepare_risk_analysis(risk_engine.clone(), query).await
                    }
                }),
            )
            .route(
                "/api/risk/execute",
                axum::routing::post({
                    let risk_engine = risk_engine.clone();
                    move |Json(input): Json<AnalysisInput>| async move {
                        ServiceController::execute_risk_analysis(risk_engine.clone(), input).await
                    }
                }),
            )
    }

    /// Health check endpoint
    pub async fn status() -> impl IntoResponse {
        let response = json!({
            "message": "Service is running...",
            "status": "ok"
        });
        (StatusCode::OK, Json(response))
    }

    /// Token catalog
    pub async fn get_tokens(portfolio_service: Arc<AppPortfolioService>) -> impl IntoResponse {
        let result = portfolio_service.get_tokens().await;
        let status = if result.error.is_some() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };
        (status, Json(json!(result)))
    }

    /// Priced asset list for a wallet
    pub async fn get_portfolio(
        portfolio_service: Arc<AppPortfolioService>,
        query: PortfolioQuery,
    ) -> impl IntoResponse {
        let result = match query.source.as_deref() {
            Some("wallet") => portfolio_service.get_portfolio_assets(&query.address).await,
            _ => portfolio_service.get_portfolio(&query.address).await,
        };

        let status = if result.error.is_some() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };
        (status, Json(json!(result)))
    }

    /// Auction swap quote
    pub async fn get_quote(swap_engine: Arc<AppSwapEngine>, query: SwapQuery) -> impl IntoResponse {
        let outcome = swap_engine
            .get_quote(&query.from_token(), &query.to_token(), &query.amount, &query.wallet_address)
            .await;
        (outcome_status(outcome.raw.is_some(), &outcome.error), Json(json!(outcome)))
    }

    /// Classic swap quote
    pub async fn get_swap(swap_engine: Arc<AppSwapEngine>, query: SwapQuery) -> impl IntoResponse {
        let outcome = swap_engine
            .get_swap(&query.from_token(), &query.to_token(), &query.amount, &query.wallet_address)
            .await;
        (outcome_status(outcome.raw.is_some(), &outcome.error), Json(json!(outcome)))
    }

    /// Gas estimate for a swap
    pub async fn get_gas(swap_engine: Arc<AppSwapEngine>, query: SwapQuery) -> impl IntoResponse {
        let outcome = swap_engine
            .get_gas_estimate(
                &query.from_token(),
                &query.to_token(),
                &query.amount,
                &query.wallet_address,
            )
            .await;
        (outcome_status(outcome.raw.is_some(), &outcome.error), Json(json!(outcome)))
    }

    /// Assemble the analysis payload (best-effort across sources)
    pub async fn prepare_risk_analysis(
        risk_engine: Arc<AppRiskEngine>,
        query: AddressQuery,
    ) -> impl IntoResponse {
        let prepared = risk_engine.prepare(&query.address).await;
        (StatusCode::OK, Json(json!(prepared)))
    }

    /// Run the analyzer on a prepared payload
    pub async fn execute_risk_analysis(
        risk_engine: Arc<AppRiskEngine>,
        input: AnalysisInput,
    ) -> impl IntoResponse {
        let executed = risk_engine.execute(&input).await;
        let status = if executed.error.is_some() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };
        (status, Json(json!(executed)))
    }
}

// A missing raw envelope means the request was rejected locally before any
// network call; everything else with an error is an upstream failure.
fn outcome_status(reached_upstream: bool, error: &Option<String>) -> StatusCode {
    match error {
        None => StatusCode::OK,
        Some(_) if !reached_upstream => StatusCode::BAD_REQUEST,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
