use serde::{Deserialize, Serialize};

// POST /fusion-plus/quoter/v1.0/quote/receive
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FusionQuoteRequest {
    pub src_token_address: String,
    pub dst_token_address: String,
    // amount in the source token's base units
    pub amount: String,
    pub wallet_address: String,
}

// GET /swap/{version}/{chain}/swap
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ClassicSwapRequest {
    pub src_token_address: String,
    pub dst_token_address: String,
    // amount in the source token's base units
    pub amount: String,
    pub from_address: String,
    pub slippage: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_token_symbol: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FusionQuote {
    #[serde(default)]
    pub quote_id: Option<serde_json::Value>,
    #[serde(default)]
    pub from_token_amount: Option<String>,
    // amount in the destination token's base units
    pub to_token_amount: String,
    pub presets: FusionPresets,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FusionPresets {
    pub fast: FusionPreset,
    pub medium: FusionPreset,
    pub slow: FusionPreset,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FusionPreset {
    pub auction_duration: u64,
    pub auction_start_amount: String,
    pub auction_end_amount: String,
    #[serde(default)]
    pub start_amount: Option<String>,
    #[serde(default)]
    pub gas_cost: Option<FusionGasCost>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FusionGasCost {
    pub gas_bump_estimate: u64,
    pub gas_price_estimate: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Swap {
    // amount in the destination token's base units
    pub dst_amount: String,
    #[serde(default, alias = "route")]
    pub protocols: Option<Vec<Vec<RouteHop>>>,
    pub tx: SwapTransaction,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RouteHop {
    pub name: String,
    #[serde(default)]
    pub part: Option<f64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwapTransaction {
    pub from: String,
    pub to: String,
    pub data: String,
    pub value: String,
    #[serde(default)]
    pub gas: u64,
    #[serde(default)]
    pub gas_price: String,
}
