pub mod analyzer;
pub mod engine;
pub mod traits;

pub use analyzer::{AnalyzerError, HttpRiskAnalyzer, RiskAnalysis};
pub use engine::{
    AnalysisInput, ExecutedAnalysis, PreparedAnalysis, RiskEngine, SourceError,
};
