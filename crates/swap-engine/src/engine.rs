use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use serde::Serialize;

use portfolio_aggregation::source::oneinch::types::{
    ClassicSwapRequest, FusionPreset, FusionQuoteRequest, SwapTransaction,
};
use portfolio_aggregation::types::{ApiResult, Token};
use portfolio_aggregation::units::{to_base_units, to_display_amount};

use crate::traits::{GasProvider, SwapQuoteProvider};

const INVALID_AMOUNT: &str = "Invalid amount";
const DEFAULT_SLIPPAGE: u8 = 1;

/// Result of one engine call. `data`, `error` and `raw` follow the same
/// envelope discipline as the upstream clients; `generation` and `stale`
/// let callers discard responses superseded by a newer request.
#[derive(Serialize, Debug, Clone)]
pub struct Outcome<T> {
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<ApiResult>,
    pub generation: u64,
    pub stale: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DisplayPreset {
    pub auction_duration: u64,
    pub auction_start_amount: f64,
    pub auction_end_amount: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DisplayPresets {
    pub fast: DisplayPreset,
    pub medium: DisplayPreset,
    pub slow: DisplayPreset,
}

/// Auction-quote view-model, all amounts scaled to the destination
/// token's display units.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DisplayQuote {
    pub amount_out: f64,
    pub presets: DisplayPresets,
}

/// Classic-swap view-model: scaled output amount, route protocol names
/// per hop, and the unsigned transaction for gas estimation.
#[derive(Serialize, Debug, Clone)]
pub struct DisplaySwap {
    pub amount_out: f64,
    pub route: Vec<Vec<String>>,
    pub gas: u64,
    pub tx: SwapTransaction,
}

#[derive(Serialize, Debug, Clone)]
pub struct GasEstimate {
    pub gas: String,
}

pub type QuoteOutcome = Outcome<DisplayQuote>;
pub type SwapOutcome = Outcome<DisplaySwap>;
pub type GasOutcome = Outcome<GasEstimate>;

/// Swap Engine
///
/// Validates local input before any network call, scales amounts through
/// the shared units module exactly once in each direction, and tags every
/// call with a monotonically increasing generation so superseded responses
/// can be discarded (requests are never cancelled in flight).
#[derive(Debug)]
pub struct SwapEngine<S, G> {
    source: Arc<S>,
    gas: Arc<G>,
    generation: AtomicU64,
}

impl<S, G> SwapEngine<S, G>
where
    S: SwapQuoteProvider,
    G: GasProvider,
{
    pub fn new(source: Arc<S>, gas: Arc<G>) -> Self {
        Self { source, gas, generation: AtomicU64::new(0) }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_stale(&self, generation: u64) -> bool {
        generation != self.generation.load(Ordering::SeqCst)
    }

    fn invalid<T>(&self, message: String, generation: u64) -> Outcome<T> {
        Outcome {
            data: None,
            error: Some(message),
            raw: None,
            generation,
            stale: self.is_stale(generation),
        }
    }

    /// Auction quote, normalized to display units.
    pub async fn get_quote(
        &self,
        from_token: &Token,
        to_token: &Token,
        amount: &str,
        wallet_address: &str,
    ) -> QuoteOutcome {
        let generation = self.next_generation();

        if !validate_amount(amount) {
            return self.invalid(INVALID_AMOUNT.to_string(), generation);
        }

        let amount_in = match to_base_units(amount, from_token.decimals) {
            Ok(amount_in) => amount_in,
            Err(err) => return self.invalid(err.to_string(), generation),
        };

        let request = FusionQuoteRequest {
            src_token_address: from_token.address.clone(),
            dst_token_address: to_token.address.clone(),
            amount: amount_in.to_string(),
            wallet_address: wallet_address.to_string(),
        };

        let response = self.source.fusion_quote(&request).await;
        let stale = self.is_stale(generation);
        if stale {
            debug!("Quote response for generation {} superseded", generation);
        }

        if let Some(error) = response.error {
            return Outcome {
                data: None,
                error: Some(error),
                raw: Some(response.raw),
                generation,
                stale,
            };
        }

        match response.data {
            Some(quote) => {
                let data = DisplayQuote {
                    amount_out: to_display_amount(&quote.to_token_amount, to_token.decimals),
                    presets: DisplayPresets {
                        fast: normalize_preset(&quote.presets.fast, to_token.decimals),
                        medium: normalize_preset(&quote.presets.medium, to_token.decimals),
                        slow: normalize_preset(&quote.presets.slow, to_token.decimals),
                    },
                };
                Outcome {
                    data: Some(data),
                    error: None,
                    raw: Some(response.raw),
                    generation,
                    stale,
                }
            }
            None => Outcome {
                data: None,
                error: Some("Failed to get quote.".to_string()),
                raw: Some(response.raw),
                generation,
                stale,
            },
        }
    }

    /// Classic swap quote, normalized to display units.
    pub async fn get_swap(
        &self,
        from_token: &Token,
        to_token: &Token,
        amount: &str,
        wallet_address: &str,
    ) -> SwapOutcome {
        let generation = self.next_generation();

        if !validate_amount(amount) {
            return self.invalid(INVALID_AMOUNT.to_string(), generation);
        }

        let amount_in = match to_base_units(amount, from_token.decimals) {
            Ok(amount_in) => amount_in,
            Err(err) => return self.invalid(err.to_string(), generation),
        };

        let request = ClassicSwapRequest {
            src_token_address: from_token.address.clone(),
            dst_token_address: to_token.address.clone(),
            amount: amount_in.to_string(),
            from_address: wallet_address.to_string(),
            slippage: DEFAULT_SLIPPAGE,
            src_token_symbol: Some(from_token.symbol.clone()),
        };

        let response = self.source.classic_swap(&request).await;
        let stale = self.is_stale(generation);

        if let Some(error) = response.error {
            return Outcome {
                data: None,
                error: Some(error),
                raw: Some(response.raw),
                generation,
                stale,
            };
        }

        match response.data {
            Some(swap) => {
                let route = swap
                    .protocols
                    .unwrap_or_default()
                    .iter()
                    .map(|hop| hop.iter().map(|leg| leg.name.clone()).collect())
                    .collect();
                let data = DisplaySwap {
                    amount_out: to_display_amount(&swap.dst_amount, to_token.decimals),
                    route,
                    gas: swap.tx.gas,
                    tx: swap.tx,
                };
                Outcome {
                    data: Some(data),
                    error: None,
                    raw: Some(response.raw),
                    generation,
                    stale,
                }
            }
            None => Outcome {
                data: None,
                error: Some("Failed to get swap data.".to_string()),
                raw: Some(response.raw),
                generation,
                stale,
            },
        }
    }

    /// Gas estimate for a swap: fetch the unsigned transaction, then ask
    /// the gas collaborator. The collaborator itself never fails; only a
    /// failed swap fetch surfaces as an error here.
    pub async fn get_gas_estimate(
        &self,
        from_token: &Token,
        to_token: &Token,
        amount: &str,
        wallet_address: &str,
    ) -> GasOutcome {
        let generation = self.next_generation();

        if !validate_amount(amount) {
            return self.invalid(INVALID_AMOUNT.to_string(), generation);
        }

        let amount_in = match to_base_units(amount, from_token.decimals) {
            Ok(amount_in) => amount_in,
            Err(err) => return self.invalid(err.to_string(), generation),
        };

        let request = ClassicSwapRequest {
            src_token_address: from_token.address.clone(),
            dst_token_address: to_token.address.clone(),
            amount: amount_in.to_string(),
            from_address: wallet_address.to_string(),
            slippage: DEFAULT_SLIPPAGE,
            src_token_symbol: Some(from_token.symbol.clone()),
        };

        let response = self.source.classic_swap(&request).await;
        let stale = self.is_stale(generation);

        if let Some(error) = response.error {
            return Outcome {
                data: None,
                error: Some(error),
                raw: Some(response.raw),
                generation,
                stale,
            };
        }

        match response.data {
            Some(swap) => {
                let gas = self.gas.estimate_gas(&swap.tx).await;
                Outcome {
                    data: Some(GasEstimate { gas }),
                    error: None,
                    raw: Some(response.raw),
                    generation,
                    stale,
                }
            }
            None => Outcome {
                data: None,
                error: Some("Failed to get swap data for gas estimation.".to_string()),
                raw: Some(response.raw),
                generation,
                stale,
            },
        }
    }
}

fn validate_amount(amount: &str) -> bool {
    match amount.trim().parse::<f64>() {
        Ok(value) => value > 0.0,
        Err(_) => false,
    }
}

fn normalize_preset(preset: &FusionPreset, decimals: u8) -> DisplayPreset {
    DisplayPreset {
        auction_duration: preset.auction_duration,
        auction_start_amount: to_display_amount(&preset.auction_start_amount, decimals),
        auction_end_amount: to_display_amount(&preset.auction_end_amount, decimals),
    }
}
