//! Pure reshaping of upstream payloads into the local view-models.

use log::warn;

use crate::types::{ApiResult, Asset, BalanceEntry, PriceMap, PriceQuote, Token};
use crate::units::{NATIVE_DECIMALS, to_display_amount};

pub const NATIVE_ASSET_ID: &str = "eth-native";
pub const NATIVE_ASSET_NAME: &str = "Ethereum";
pub const NATIVE_ASSET_SYMBOL: &str = "ETH";
pub const NATIVE_ASSET_ICON: &str = "https://cdn.moralis.io/eth/0x.png";

pub const UNKNOWN_TOKEN_NAME: &str = "Unknown Token";
pub const UNKNOWN_TOKEN_SYMBOL: &str = "UNKNOWN";

// Scale applied when a token is missing from the catalog entirely
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Reshape a bulk catalog response (map of address -> metadata) into an
/// ordered token list, preserving upstream iteration order.
///
/// Any upstream error yields an empty list plus the propagated error;
/// callers must treat that as "catalog unusable", not "wallet holds
/// nothing".
pub fn tokens_from_catalog(result: &ApiResult) -> (Vec<Token>, Option<String>) {
    if let Some(error) = &result.error {
        return (Vec::new(), Some(error.clone()));
    }

    let entries = match result.response.get("tokens").and_then(|t| t.as_object()) {
        Some(entries) => entries,
        None => return (Vec::new(), Some("Malformed token catalog response".to_string())),
    };

    let tokens = entries
        .values()
        .filter_map(|entry| {
            let token = Token {
                symbol: entry.get("symbol")?.as_str()?.to_string(),
                name: entry.get("name")?.as_str()?.to_string(),
                address: entry.get("address")?.as_str()?.to_string(),
                decimals: entry.get("decimals")?.as_u64()? as u8,
                icon: entry
                    .get("logoURI")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
            };
            Some(token)
        })
        .collect();

    (tokens, None)
}

/// Join balances with prices into the displayed asset list.
///
/// Each ERC-20 entry is scaled by its own declared decimals; the native
/// position uses the fixed native scale. A missing price is 0, never an
/// error. Entries below the dust threshold are dropped unless that would
/// empty a non-empty list, in which case the unfiltered list is kept so an
/// all-dust wallet still shows something. Sorted descending by USD value.
pub fn build_assets(
    native_balance_raw: Option<&str>,
    native_price: Option<PriceQuote>,
    entries: &[BalanceEntry],
    prices: &PriceMap,
    dust_threshold_usd: f64,
) -> Vec<Asset> {
    let mut assets = Vec::with_capacity(entries.len() + 1);

    if let Some(raw) = native_balance_raw {
        let balance = to_display_amount(raw, NATIVE_DECIMALS);
        let price = native_price.unwrap_or_default();
        if balance > 0.0 {
            assets.push(Asset {
                id: NATIVE_ASSET_ID.to_string(),
                name: NATIVE_ASSET_NAME.to_string(),
                symbol: NATIVE_ASSET_SYMBOL.to_string(),
                icon: NATIVE_ASSET_ICON.to_string(),
                balance,
                price: price.usd,
                change24h: price.change24h,
            });
        }
    }

    for entry in entries {
        let balance = to_display_amount(&entry.balance, entry.decimals);
        let price = prices.get(&entry.token_address.to_lowercase()).copied().unwrap_or_default();

        assets.push(Asset {
            id: entry.token_address.clone(),
            name: entry.name.clone(),
            symbol: entry.symbol.clone(),
            icon: entry.logo.clone().unwrap_or_default(),
            balance,
            price: price.usd,
            change24h: price.change24h,
        });
    }

    let filtered: Vec<Asset> =
        assets.iter().filter(|asset| asset.value() > dust_threshold_usd).cloned().collect();

    let mut assets = if filtered.is_empty() && !assets.is_empty() {
        warn!("All positions are below the dust threshold, keeping the unfiltered list");
        assets
    } else {
        filtered
    };

    assets.sort_by(|a, b| b.value().total_cmp(&a.value()));
    assets
}
