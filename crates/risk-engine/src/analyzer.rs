use async_trait::async_trait;
use log::{error, info};
use reqwest::{StatusCode, header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use config::config::AnalyzerConfig;

use crate::engine::AnalysisInput;
use crate::traits::RiskAnalyzer;

/// Structured analyzer output: a narrative risk summary plus concrete
/// recommendations.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
    pub risk_summary: String,
    pub recommendations: String,
}

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Analyzer request failed with status: {0}")]
    RequestFailed(StatusCode),

    #[error("Deserialization Error - Original String {0}, Error {1}")]
    DeserialisationError(String, serde_json::Error),

    #[error("API call error: {0}")]
    ApiCallError(#[from] reqwest::Error),
}

#[derive(Serialize, Debug)]
struct AnalyzeRequest<'a> {
    model: &'a str,
    input: &'a AnalysisInput,
}

/// HTTP client for the hosted text-generation service.
#[derive(Debug)]
pub struct HttpRiskAnalyzer {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl HttpRiskAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Result<Self, header::InvalidHeaderValue> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))?,
        );

        Ok(HttpRiskAnalyzer {
            client: reqwest::Client::builder().default_headers(headers).build().unwrap(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl RiskAnalyzer for HttpRiskAnalyzer {
    async fn analyze(&self, input: &AnalysisInput) -> Result<RiskAnalysis, AnalyzerError> {
        info!("Requesting risk analysis from model {}", self.model);

        let request = AnalyzeRequest { model: &self.model, input };
        let response = self
            .client
            .post(format!("{}/v1/analyze", self.base_url))
            .json(&request)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            error!("Analyzer request failed with status: {}", response.status());
            return Err(AnalyzerError::RequestFailed(response.status()));
        }

        let raw_text = response.text().await?;

        let analysis: RiskAnalysis = serde_json::from_str(&raw_text)
            .map_err(|err| AnalyzerError::DeserialisationError(raw_text, err))?;

        Ok(analysis)
    }
}
