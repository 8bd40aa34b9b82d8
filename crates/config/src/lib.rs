pub mod config;

pub use config::{
    AnalyzerConfig, Config, ConfigError, DiaConfig, MoralisConfig, OneInchConfig, PortfolioConfig,
    RpcConfig, ServerConfig, get_sample_config,
};
