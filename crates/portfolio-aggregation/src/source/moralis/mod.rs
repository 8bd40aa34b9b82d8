use async_trait::async_trait;
use log::error;
use reqwest::{Method, header};
use serde_json::json;

use config::config::MoralisConfig;

use crate::source::WalletDataProvider;
use crate::types::{
    ApiResult, BalanceEntry, PriceMap, PriceQuote, PriceResult, RequestDetails, SourceResponse,
};

use types::MoralisPrice;

pub mod types;

const PLACEHOLDER_API_KEY: &str = "YOUR_MORALIS_API_KEY_HERE";

/// Wallet-data API client: native balance, ERC-20 balances with their
/// declared decimals, and prices carrying 24h change.
#[derive(Debug)]
pub struct MoralisClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    chain: String,
    wrapped_native_address: String,
}

impl MoralisClient {
    pub fn new(config: &MoralisConfig) -> Result<Self, header::InvalidHeaderValue> {
        let mut headers = header::HeaderMap::new();
        headers.insert("X-API-Key", header::HeaderValue::from_str(&config.api_key)?);
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        Ok(MoralisClient {
            client: reqwest::Client::builder().default_headers(headers).build().unwrap(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            chain: config.chain.clone(),
            wrapped_native_address: config.wrapped_native_address.clone(),
        })
    }

    fn api_key_configured(&self) -> bool {
        !self.api_key.is_empty() && self.api_key != PLACEHOLDER_API_KEY
    }

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
            let message = "Moralis API key is not set. Add it to the configuration file.";
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
                    Ok(text) => serde_json::from_str(&text)
                        .unwrap_or_else(|_| json!({ "message": status_text.clone() })),
                    Err(err) => json!({ "error": err.to_string() }),
                };

                if !status.is_success() {
                    let message = body
                        .get("message")
                        .and_then(|v| v.as_str())
                        .unwrap_or(&status_text)
                        .to_string();
                    error!("Moralis API error: {} (status {})", message, status);
                    return ApiResult { request, response: body, error: Some(message) };
                }

                ApiResult { request, response: body, error: None }
            }
            Err(err) => {
                error!("Failed to reach the Moralis API: {}", err);
                ApiResult {
                    request,
                    response: json!({ "error": err.to_string() }),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    pub async fn get_native_balance(&self, address: &str) -> ApiResult {
        let path = format!("/{}/balance?chain={}", address, self.chain);
        self.call(Method::GET, &path, None).await
    }

    pub async fn get_erc20_balances(&self, address: &str) -> SourceResponse<Vec<BalanceEntry>> {
        let path = format!("/{}/erc20?chain={}", address, self.chain);
        let raw = self.call(Method::GET, &path, None).await;

        if let Some(error) = raw.error.clone() {
            return SourceResponse { data: None, raw, error: Some(error) };
        }

        match serde_json::from_value::<Vec<BalanceEntry>>(raw.response.clone()) {
            Ok(entries) => SourceResponse { data: Some(entries), raw, error: None },
            Err(err) => {
                error!("Failed to decode Moralis balance response: {}", err);
                SourceResponse {
                    data: None,
                    raw,
                    error: Some(format!("Deserialization error: {}", err)),
                }
            }
        }
    }

    pub async fn get_token_prices(&self, addresses: &[String]) -> PriceResult {
        if addresses.is_empty() {
            let url = format!("{}/erc20/prices?chain={}", self.base_url, self.chain);
            return PriceResult {
                prices: PriceMap::new(),
                raw: ApiResult {
                    request: RequestDetails { method: "POST".to_string(), url, body: None },
                    response: serde_json::Value::Null,
                    error: None,
                },
                error: None,
            };
        }

        let path = format!("/erc20/prices?chain={}&include=percent_change", self.chain);
        let body = json!({ "token_addresses": addresses });
        let raw = self.call(Method::POST, &path, Some(body)).await;

        if let Some(error) = raw.error.clone() {
            return PriceResult { prices: PriceMap::new(), raw, error: Some(error) };
        }

        let entries = raw
            .response
            .get("result")
            .and_then(|r| r.as_array())
            .or_else(|| raw.response.as_array());

        let entries = match entries {
            Some(entries) => entries.clone(),
            None => {
                return PriceResult {
                    prices: PriceMap::new(),
                    raw,
                    error: Some("Invalid price response".to_string()),
                };
            }
        };

        let mut prices = PriceMap::new();
        for entry in entries {
            if let Ok(price) = serde_json::from_value::<MoralisPrice>(entry) {
                let change24h = price
                    .percent_change_24h
                    .as_deref()
                    .and_then(|c| c.parse::<f64>().ok())
                    .unwrap_or(0.0);
                prices.insert(
                    price.token_address.to_lowercase(),
                    PriceQuote { usd: price.usd_price, change24h },
                );
            }
        }

        PriceResult { prices, raw, error: None }
    }
}

#[async_trait]
impl WalletDataProvider for MoralisClient {
    fn wrapped_native_address(&self) -> String {
        self.wrapped_native_address.clone()
    }

    async fn native_balance(&self, address: &str) -> ApiResult {
        self.get_native_balance(address).await
    }

    async fn erc20_balances(&self, address: &str) -> SourceResponse<Vec<BalanceEntry>> {
        self.get_erc20_balances(address).await
    }

    async fn token_prices(&self, addresses: &[String]) -> PriceResult {
        self.get_token_prices(addresses).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client_with_key(api_key: &str) -> MoralisClient {
        let config = MoralisConfig {
            base_url: "https://deep-index.moralis.io/api/v2.2".to_string(),
            api_key: api_key.to_string(),
            chain: "eth".to_string(),
            wrapped_native_address: "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".to_string(),
        };
        MoralisClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_placeholder_api_key_short_circuits_without_network_call() {
        let client = client_with_key(PLACEHOLDER_API_KEY);

        let result = client.get_native_balance("0xwallet").await;

        assert!(result.error.unwrap().contains("API key"));
        assert_eq!(result.response, json!({ "error": "API key not configured." }));
    }

    #[tokio::test]
    async fn test_empty_address_list_skips_price_call() {
        let client = client_with_key(PLACEHOLDER_API_KEY);

        let result = client.get_token_prices(&[]).await;

        assert!(result.error.is_none());
        assert!(result.prices.is_empty());
        assert_eq!(result.raw.response, serde_json::Value::Null);
    }
}
