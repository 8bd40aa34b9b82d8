use derive_more::{Display, From};
use serde::Deserialize;
use serde_valid::Validate;
use serde_valid::yaml::FromYamlStr;

// Config Type
#[derive(Debug)]
pub struct Config {
    // 1inch-style aggregator API configuration
    pub oneinch: OneInchConfig,
    // Moralis-style wallet data API configuration
    pub moralis: MoralisConfig,
    // DIA price API configuration (fallback price source)
    pub dia: DiaConfig,
    // Ethereum JSON-RPC node configuration (gas estimation)
    pub rpc: RpcConfig,
    // LLM analyzer service configuration
    pub analyzer: AnalyzerConfig,
    // Portfolio normalization tuning
    pub portfolio: PortfolioConfig,
    // API Server Configuration
    pub server: ServerConfig,
}

impl Config {
    pub fn from_file(file_path: &str) -> Result<Self, ConfigError> {
        let config_file_content = std::fs::read_to_string(file_path)?;
        Self::from_yaml_str(&config_file_content)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let raw_config = RawConfig::from_yaml_str(s)?;

        Ok(Config {
            oneinch: raw_config.oneinch,
            moralis: raw_config.moralis,
            dia: raw_config.dia,
            rpc: raw_config.rpc,
            analyzer: raw_config.analyzer,
            portfolio: raw_config.portfolio,
            server: raw_config.server,
        })
    }
}

#[derive(Debug, From, Display)]
pub enum ConfigError {
    #[display("Serde Error: {}", _0)]
    SerdeError(serde_valid::Error<serde_yaml::Error>),

    #[display("Error Reading Config File: {}", _0)]
    IoError(std::io::Error),
}

// Intermediate Config Type as Deserialization Target
#[derive(Debug, Deserialize, Validate)]
pub struct RawConfig {
    #[validate]
    pub oneinch: OneInchConfig,
    #[validate]
    pub moralis: MoralisConfig,
    #[validate]
    pub dia: DiaConfig,
    #[validate]
    pub rpc: RpcConfig,
    #[validate]
    pub analyzer: AnalyzerConfig,
    #[validate]
    pub portfolio: PortfolioConfig,
    #[validate]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct OneInchConfig {
    // The base URL of the aggregator API
    #[validate(
        pattern = r"https?:\/\/(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&//=]*)"
    )]
    pub base_url: String,

    // The API key to access the aggregator API
    #[validate(min_length = 1)]
    pub api_key: String,

    // Chain the dashboard operates on
    #[validate(minimum = 1)]
    pub chain_id: u32,

    // Version segment used when building swap API paths
    #[validate(min_length = 1)]
    pub swap_api_version: String,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct MoralisConfig {
    // The base URL of the wallet data API
    #[validate(
        pattern = r"https?:\/\/(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&//=]*)"
    )]
    pub base_url: String,

    // The API key to access the wallet data API
    #[validate(min_length = 1)]
    pub api_key: String,

    // Chain name in the wallet data API ("eth", "polygon", ...)
    #[validate(min_length = 1)]
    pub chain: String,

    // Wrapped-native token address used to price the native coin
    #[validate(pattern = r"0x[a-fA-F0-9]{40}")]
    pub wrapped_native_address: String,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct DiaConfig {
    // The base URL of the DIA price API
    #[validate(
        pattern = r"https?:\/\/(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&//=]*)"
    )]
    pub base_url: String,

    // Chain name in the DIA API ("ethereum", ...)
    #[validate(min_length = 1)]
    pub chain: String,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct RpcConfig {
    // JSON-RPC node URL
    #[validate(
        pattern = r"https?:\/\/(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&//=]*)"
    )]
    pub url: String,

    // Gas units returned when estimation fails
    #[validate(minimum = 21000)]
    pub fallback_gas: u64,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct AnalyzerConfig {
    // The base URL of the analyzer service
    #[validate(
        pattern = r"https?:\/\/(www\.)?[-a-zA-Z0-9@:%._\+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_\+.~#?&//=]*)"
    )]
    pub base_url: String,

    // The API key to access the analyzer service
    #[validate(min_length = 1)]
    pub api_key: String,

    // Model identifier forwarded to the analyzer service
    #[validate(min_length = 1)]
    pub model: String,
}

#[derive(Debug, Deserialize, Validate, Clone)]
pub struct PortfolioConfig {
    // Positions below this USD value are hidden from the asset list
    #[validate(minimum = 0.0)]
    pub dust_threshold_usd: f64,

    // Number of top holdings handed to the analyzer
    #[validate(minimum = 1)]
    pub top_holdings: usize,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ServerConfig {
    // The port the server will listen on
    #[validate(minimum = 1)]
    pub port: u16,

    // The host the server will listen on
    #[validate(min_length = 1)]
    pub host: String,
}

pub fn get_sample_config() -> Config {
    Config::from_file("../../config.yaml.example").unwrap()
}
