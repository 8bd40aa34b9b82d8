use async_trait::async_trait;
use log::error;
use reqwest::{Method, header};
use serde::de::DeserializeOwned;
use serde_json::json;

use config::config::OneInchConfig;

use crate::normalize;
use crate::source::AggregatorProvider;
use crate::types::{
    ApiResult, PriceMap, PriceQuote, PriceResult, RequestDetails, SourceResponse, TokenListResult,
};

use types::{ClassicSwapRequest, FusionQuote, FusionQuoteRequest, Swap};

pub mod types;

const PLACEHOLDER_API_KEY: &str = "YOUR_1INCH_API_KEY_HERE";

/// The converged aggregator API client. One client covers catalog, balance,
/// price, quote, swap and market-context endpoints; path construction uses
/// the configured `swap_api_version` instead of per-revision copies.
#[derive(Debug)]
pub struct OneInchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    chain_id: u32,
    swap_api_version: String,
}

impl OneInchClient {
    pub fn new(config: &OneInchConfig) -> Result<Self, header::InvalidHeaderValue> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))?,
        );
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        Ok(OneInchClient {
            client: reqwest::Client::builder().default_headers(headers).build().unwrap(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            chain_id: config.chain_id,
            swap_api_version: config.swap_api_version.clone(),
        })
    }

    fn api_key_configured(&self) -> bool {
        !self.api_key.is_empty() && self.api_key != PLACEHOLDER_API_KEY
    }

    /// Issue a request and capture the outcome in the uniform envelope.
    /// Never returns Err: a missing credential (no network call made),
    /// a non-2xx status, a transport failure and an unparseable body all
    /// land in `ApiResult.error`.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult {
        let url = format!("{}{}", self.base_url, path);
        let request =
            RequestDetails { method: method.to_string(), url: url.clone(), body: body.clone() };

        if !self.api_key_configured() {
            let message = "1inch API key is not set. Add it to the configuration file.";
            error!("{}", message);
            return ApiResult {
                request,
                response: json!({ "error": "API key not configured." }),
                error: Some(message.to_string()),
            };
        }

        let mut builder = self.client.request(method, &url);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        match builder.send().await {
            Ok(response) => {
                let status = response.status();
                let status_text =
                    status.canonical_reason().unwrap_or("Unknown status").to_string();
                let body = match response.text().await {
                    Ok(text) => serde_json::from_str(&text).unwrap_or_else(|_| {
                        json!({ "description": status_text.clone(), "error": status_text.clone() })
                    }),
                    Err(err) => json!({ "error": err.to_string() }),
                };

                if !status.is_success() {
                    let message = body
                        .get("description")
                        .and_then(|v| v.as_str())
                        .or_else(|| body.get("error").and_then(|v| v.as_str()))
                        .unwrap_or(&status_text)
                        .to_string();
                    error!("1inch API error: {} (status {})", message, status);
                    return ApiResult { request, response: body, error: Some(message) };
                }

                ApiResult { request, response: body, error: None }
            }
            Err(err) => {
                error!("Failed to reach the 1inch API: {}", err);
                ApiResult {
                    request,
                    response: json!({ "error": err.to_string() }),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    fn decode<T: DeserializeOwned>(raw: ApiResult) -> SourceResponse<T> {
        if let Some(error) = raw.error.clone() {
            return SourceResponse { data: None, raw, error: Some(error) };
        }

        match serde_json::from_value::<T>(raw.response.clone()) {
            Ok(data) => SourceResponse { data: Some(data), raw, error: None },
            Err(err) => {
                error!("Failed to decode 1inch response: {}", err);
                SourceResponse {
                    data: None,
                    raw,
                    error: Some(format!("Deserialization error: {}", err)),
                }
            }
        }
    }

    pub async fn get_tokens(&self) -> TokenListResult {
        let path = format!("/swap/{}/{}/tokens", self.swap_api_version, self.chain_id);
        let raw = self.call(Method::GET, &path, None).await;
        let (tokens, error) = normalize::tokens_from_catalog(&raw);
        TokenListResult { tokens, raw, error }
    }

    pub async fn get_balances(&self, address: &str) -> ApiResult {
        let path = format!("/balance/v1.2/{}/balances/{}", self.chain_id, address);
        self.call(Method::GET, &path, None).await
    }

    pub async fn get_spot_prices(&self, addresses: &[String]) -> PriceResult {
        let path = format!("/price/v1.1/{}", self.chain_id);
        let body = json!({ "tokens": addresses, "currency": "USD" });
        let raw = self.call(Method::POST, &path, Some(body)).await;

        if let Some(error) = raw.error.clone() {
            return PriceResult { prices: PriceMap::new(), raw, error: Some(error) };
        }

        let mut prices = PriceMap::new();
        if let Some(map) = raw.response.as_object() {
            for (address, price) in map {
                let usd = price.as_str().and_then(|p| p.parse::<f64>().ok()).unwrap_or(0.0);
                prices.insert(address.to_lowercase(), PriceQuote { usd, change24h: 0.0 });
            }
        }

        PriceResult { prices, raw, error: None }
    }

    pub async fn fusion_quote(&self, request: &FusionQuoteRequest) -> SourceResponse<FusionQuote> {
        let path = format!(
            "/fusion-plus/quoter/v1.0/quote/receive?srcChain={}&dstChain={}&srcTokenAddress={}&dstTokenAddress={}&amount={}&walletAddress={}&enableEstimate=true",
            self.chain_id,
            self.chain_id,
            request.src_token_address,
            request.dst_token_address,
            request.amount,
            request.wallet_address
        );
        let raw = self.call(Method::POST, &path, None).await;
        Self::decode(raw)
    }

    pub async fn classic_swap(&self, request: &ClassicSwapRequest) -> SourceResponse<Swap> {
        let path = format!(
            "/swap/{}/{}/swap?src={}&dst={}&amount={}&from={}&slippage={}",
            self.swap_api_version,
            self.chain_id,
            request.src_token_address,
            request.dst_token_address,
            request.amount,
            request.from_address,
            request.slippage
        );
        let raw = self.call(Method::GET, &path, None).await;
        Self::swap_from_raw(raw, request)
    }

    fn swap_from_raw(raw: ApiResult, request: &ClassicSwapRequest) -> SourceResponse<Swap> {
        // upstream reports unaffordable swaps as a generic description
        if let Some(description) = raw.response.get("description").and_then(|d| d.as_str()) {
            if description.contains("insufficient funds") {
                let token = request
                    .src_token_symbol
                    .clone()
                    .unwrap_or_else(|| request.src_token_address.clone());
                return SourceResponse {
                    data: None,
                    raw,
                    error: Some(format!("Not enough {} balance.", token)),
                };
            }
        }

        Self::decode(raw)
    }

    pub async fn get_history(&self, address: &str) -> ApiResult {
        let path = format!("/history/v2.0/history/{}/events", address);
        self.call(Method::GET, &path, None).await
    }

    pub async fn get_liquidity_sources(&self) -> ApiResult {
        let path = format!("/swap/{}/{}/liquidity-sources", self.swap_api_version, self.chain_id);
        self.call(Method::GET, &path, None).await
    }

    pub async fn get_presets(&self) -> ApiResult {
        let path = format!("/swap/{}/{}/presets", self.swap_api_version, self.chain_id);
        self.call(Method::GET, &path, None).await
    }

    pub async fn health_check(&self) -> ApiResult {
        self.call(Method::GET, "/healthcheck", None).await
    }
}

#[async_trait]
impl AggregatorProvider for OneInchClient {
    async fn token_catalog(&self) -> TokenListResult {
        self.get_tokens().await
    }

    async fn balances(&self, address: &str) -> ApiResult {
        self.get_balances(address).await
    }

    async fn spot_prices(&self, addresses: &[String]) -> PriceResult {
        self.get_spot_prices(addresses).await
    }
}
