use std::env;
use std::sync::Arc;

use axum::http::Method;
use clap::Parser;
use log::{debug, info};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use api::ServiceController;
use config::Config;
use portfolio_aggregation::PortfolioService;
use portfolio_aggregation::source::{DiaClient, MoralisClient, OneInchClient};
use risk_engine::{HttpRiskAnalyzer, RiskEngine};
use swap_engine::{RpcGasEstimator, SwapEngine};

#[derive(Parser, Debug)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[tokio::main]
async fn main() {
    simple_logger::SimpleLogger::new().env().init().unwrap();
    dotenv::dotenv().ok();

    let args = Args::parse();
    debug!("Args: {:?}", args);

    // Load configuration from yaml; API keys can be overridden from the
    // environment so credentials stay out of the config file
    let mut config = Config::from_file(&args.config).expect("Failed to load config file");
    if let Ok(key) = env::var("ONE_INCH_API_KEY") {
        config.oneinch.api_key = key;
    }
    if let Ok(key) = env::var("MORALIS_API_KEY") {
        config.moralis.api_key = key;
    }
    if let Ok(key) = env::var("ANALYZER_API_KEY") {
        config.analyzer.api_key = key;
    }

    run_server(config).await;
}

async fn run_server(config: Config) {
    info!("Starting Panorama Server");

    let (app_host, app_port) = (config.server.host.clone(), config.server.port);

    let oneinch = Arc::new(
        OneInchClient::new(&config.oneinch).expect("Failed to instantiate aggregator client"),
    );
    let moralis = Arc::new(
        MoralisClient::new(&config.moralis).expect("Failed to instantiate wallet data client"),
    );
    let dia = Arc::new(DiaClient::new(&config.dia));

    let portfolio_service = Arc::new(PortfolioService::new(
        oneinch.clone(),
        moralis,
        dia,
        config.portfolio.dust_threshold_usd,
    ));

    let gas_estimator = Arc::new(RpcGasEstimator::new(&config.rpc));
    let swap_engine = Arc::new(SwapEngine::new(oneinch.clone(), gas_estimator));

    let analyzer = Arc::new(
        HttpRiskAnalyzer::new(&config.analyzer).expect("Failed to instantiate analyzer client"),
    );
    let risk_engine = Arc::new(RiskEngine::new(
        oneinch.clone(),
        portfolio_service.clone(),
        analyzer,
        config.portfolio.top_holdings,
    ));

    let service_controller = ServiceController::new(portfolio_service, swap_engine, risk_engine);

    let cors = CorsLayer::new().allow_origin(Any).allow_methods([Method::GET, Method::POST]);

    let app = service_controller.router().layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", app_host, app_port))
        .await
        .expect("Failed to bind port");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    info!("Server stopped.");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("Unable to handle ctrl+c");
    };
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, starting graceful shutdown");
}
