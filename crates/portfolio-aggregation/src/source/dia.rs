use async_trait::async_trait;
use log::{error, info};
use serde::Deserialize;

use config::config::DiaConfig;

use crate::source::FallbackPriceProvider;
use crate::types::{PriceMap, PriceQuote};

/// Per-asset price client, consulted only when the bulk spot-price call
/// fails. No API key; failures degrade to a missing quotation.
#[derive(Debug)]
pub struct DiaClient {
    client: reqwest::Client,
    base_url: String,
    chain: String,
}

#[derive(Debug, Deserialize)]
struct AssetQuotation {
    #[serde(rename = "Price")]
    price: f64,
}

impl DiaClient {
    pub fn new(config: &DiaConfig) -> Self {
        DiaClient {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            chain: config.chain.clone(),
        }
    }

    pub async fn get_asset_price(&self, address: &str) -> Option<f64> {
        let url = format!(
            "{}/v1/assetQuotation/{}/{}",
            self.base_url,
            self.chain,
            address.to_lowercase()
        );

        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<AssetQuotation>().await {
                    Ok(quotation) => Some(quotation.price),
                    Err(err) => {
                        error!("Failed to decode DIA quotation for {}: {}", address, err);
                        None
                    }
                }
            }
            Ok(response) => {
                error!("DIA quotation for {} failed with status: {}", address, response.status());
                None
            }
            Err(err) => {
                error!("Failed to reach the DIA API for {}: {}", address, err);
                None
            }
        }
    }
}

#[async_trait]
impl FallbackPriceProvider for DiaClient {
    async fn asset_prices(&self, addresses: &[String]) -> PriceMap {
        info!("Fetching fallback prices for {} assets", addresses.len());

        let quotes = futures::future::join_all(
            addresses.iter().map(|address| self.get_asset_price(address)),
        )
        .await;

        addresses
            .iter()
            .zip(quotes)
            .filter_map(|(address, price)| {
                price.map(|usd| (address.to_lowercase(), PriceQuote { usd, change24h: 0.0 }))
            })
            .collect()
    }
}
