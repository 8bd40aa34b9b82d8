use serde::{Deserialize, Serialize};

// POST /erc20/prices entries
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MoralisPrice {
    pub token_address: String,
    pub usd_price: f64,
    #[serde(rename = "24hrPercentChange", default)]
    pub percent_change_24h: Option<String>,
}
