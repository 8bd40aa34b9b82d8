pub mod engine;
pub mod gas;
pub mod traits;

pub use engine::{
    DisplayPreset, DisplayPresets, DisplayQuote, DisplaySwap, GasEstimate, GasOutcome, Outcome,
    QuoteOutcome, SwapEngine, SwapOutcome,
};
pub use gas::RpcGasEstimator;
