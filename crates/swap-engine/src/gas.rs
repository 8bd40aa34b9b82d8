use async_trait::async_trait;
use log::{debug, error};
use ruint::aliases::U256;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use config::config::RpcConfig;

use portfolio_aggregation::source::oneinch::types::SwapTransaction;

use crate::traits::GasProvider;

/// JSON-RPC gas estimator. Any failure degrades to the configured nominal
/// gas value; callers never see an error from this collaborator.
#[derive(Debug)]
pub struct RpcGasEstimator {
    client: reqwest::Client,
    url: String,
    fallback_gas: u64,
}

#[derive(Debug, Error)]
pub enum GasEstimateError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("RPC response carried no result")]
    MissingResult,

    #[error("Invalid quantity in RPC payload: {0}")]
    InvalidQuantity(String),
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    message: String,
}

impl RpcGasEstimator {
    pub fn new(config: &RpcConfig) -> Self {
        RpcGasEstimator {
            client: reqwest::Client::new(),
            url: config.url.clone(),
            fallback_gas: config.fallback_gas,
        }
    }

    async fn try_estimate(&self, tx: &SwapTransaction) -> Result<String, GasEstimateError> {
        let value = if tx.value.is_empty() {
            U256::ZERO
        } else {
            U256::from_str_radix(&tx.value, 10)
                .map_err(|_| GasEstimateError::InvalidQuantity(tx.value.clone()))?
        };

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_estimateGas",
            "params": [{
                "from": tx.from,
                "to": tx.to,
                "data": tx.data,
                "value": format!("0x{:x}", value),
            }],
        });

        let response = self.client.post(&self.url).json(&body).send().await?;
        let rpc: JsonRpcResponse = response.json().await?;

        if let Some(err) = rpc.error {
            return Err(GasEstimateError::Rpc(err.message));
        }

        let quantity = rpc.result.ok_or(GasEstimateError::MissingResult)?;
        parse_gas_quantity(&quantity)
    }
}

fn parse_gas_quantity(quantity: &str) -> Result<String, GasEstimateError> {
    let digits = quantity.trim_start_matches("0x");
    let units = U256::from_str_radix(digits, 16)
        .map_err(|_| GasEstimateError::InvalidQuantity(quantity.to_string()))?;
    Ok(units.to_string())
}

#[async_trait]
impl GasProvider for RpcGasEstimator {
    async fn estimate_gas(&self, tx: &SwapTransaction) -> String {
        match self.try_estimate(tx).await {
            Ok(gas) => {
                debug!("Estimated gas for swap via {}: {}", tx.to, gas);
                gas
            }
            Err(err) => {
                error!("Gas estimation failed, using fallback: {}", err);
                self.fallback_gas.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swap_tx() -> SwapTransaction {
        SwapTransaction {
            from: "0xwallet".to_string(),
            to: "0xrouter".to_string(),
            data: "0xdeadbeef".to_string(),
            value: "0".to_string(),
            gas: 0,
            gas_price: String::new(),
        }
    }

    #[test]
    fn test_parse_gas_quantity() {
        assert_eq!(parse_gas_quantity("0x5208").unwrap(), "21000");
        assert_eq!(parse_gas_quantity("0x0").unwrap(), "0");
        assert!(parse_gas_quantity("0xzz").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_node_falls_back_to_nominal_gas() {
        let estimator = RpcGasEstimator {
            client: reqwest::Client::new(),
            url: "http://127.0.0.1:9".to_string(),
            fallback_gas: 150000,
        };

        let gas = estimator.estimate_gas(&swap_tx()).await;

        assert_eq!(gas, "150000");
    }

    #[tokio::test]
    async fn test_malformed_value_falls_back_to_nominal_gas() {
        let estimator = RpcGasEstimator {
            client: reqwest::Client::new(),
            url: "http://127.0.0.1:9".to_string(),
            fallback_gas: 150000,
        };

        let mut tx = swap_tx();
        tx.value = "not-a-number".to_string();

        let gas = estimator.estimate_gas(&tx).await;

        assert_eq!(gas, "150000");
    }
}
