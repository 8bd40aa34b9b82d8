pub mod normalize;
pub mod service;
pub mod source;
pub mod types;
pub mod units;

pub use service::PortfolioService;
