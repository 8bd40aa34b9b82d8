use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Static catalog entry for a swappable token. Keyed by address
/// (case-insensitive) wherever a lookup is involved.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Token {
    pub symbol: String,
    pub name: String,
    pub address: String,
    pub decimals: u8,
    pub icon: String,
}

/// A wallet's position in one token, priced in USD. Recreated on every
/// portfolio fetch; the USD value is always derived, never stored.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub icon: String,
    pub balance: f64,
    pub price: f64,
    pub change24h: f64,
}

impl Asset {
    pub fn value(&self) -> f64 {
        self.balance * self.price
    }
}

/// USD quotation for one token, keyed by lowercase address in price maps.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceQuote {
    pub usd: f64,
    pub change24h: f64,
}

pub type PriceMap = HashMap<String, PriceQuote>;

/// The request half of the envelope, echoed back for diagnostics.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RequestDetails {
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// Uniform envelope for every outbound call. Success and failure use the
/// same shape; `error` is the only discriminator.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ApiResult {
    pub request: RequestDetails,
    pub response: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResult {
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

/// A typed upstream response together with its envelope. `data` is None
/// whenever `error` is set or the payload failed to deserialize.
#[derive(Serialize, Debug, Clone)]
pub struct SourceResponse<T> {
    pub data: Option<T>,
    pub raw: ApiResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct TokenListResult {
    pub tokens: Vec<Token>,
    pub raw: ApiResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct PriceResult {
    pub prices: PriceMap,
    pub raw: ApiResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-call envelopes collected while assembling a portfolio, for the
/// raw request/response debug view.
#[derive(Serialize, Debug, Clone, Default)]
pub struct PortfolioRaw {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<ApiResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<ApiResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_prices: Option<ApiResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_balance: Option<ApiResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erc20_balances: Option<ApiResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<ApiResult>,
}

#[derive(Serialize, Debug, Clone)]
pub struct PortfolioResult {
    pub assets: Vec<Asset>,
    pub raw: PortfolioRaw,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Normalized ERC-20 balance entry, the joiner's input shape. `decimals`
/// is the token's own declared value, never assumed.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BalanceEntry {
    pub token_address: String,
    pub balance: String,
    pub decimals: u8,
    pub name: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}
