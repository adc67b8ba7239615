use clap::Parser;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use polymix::cli::{Cli, Command};
use polymix::config::AppConfig;
use polymix::domain::Platform;
use polymix::error::PolymixError;
use polymix::exchange::{ExchangeClient, KalshiClient, PolymarketClient};
use polymix::executor::OrderExecutor;
use polymix::feed::{FileCandidateSource, FileResolutionSource};
use polymix::ledger::Ledger;
use polymix::risk::{RiskController, RiskLimits};
use polymix::service::TradingService;
use polymix::settlement::SettlementReconciler;

fn init_tracing(config: &polymix::config::LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));
    if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn open_ledger(config: &AppConfig) -> polymix::Result<Arc<Ledger>> {
    Ok(Arc::new(
        Ledger::load(
            &config.ledger.path,
            config.risk.initial_balance,
            config.admin.reset_token.clone(),
        )
        .await?,
    ))
}

fn build_clients(config: &AppConfig) -> polymix::Result<HashMap<Platform, Arc<dyn ExchangeClient>>> {
    let timeout = Duration::from_secs(config.execution.call_timeout_secs);
    let kalshi = KalshiClient::new(
        &config.kalshi.api_base,
        config.kalshi.api_key.clone(),
        config.kalshi.api_secret.clone(),
        timeout,
    )?;
    let polymarket = PolymarketClient::new(
        &config.polymarket.api_base,
        config.polymarket.api_key.clone(),
        timeout,
    )?;

    let mut clients: HashMap<Platform, Arc<dyn ExchangeClient>> = HashMap::new();
    clients.insert(Platform::Kalshi, Arc::new(kalshi));
    clients.insert(Platform::Polymarket, Arc::new(polymarket));
    Ok(clients)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config_dir)?;
    init_tracing(&config.logging);

    if let Err(errors) = config.validate() {
        for error in &errors {
            tracing::error!(%error, "invalid configuration");
        }
        return Err(PolymixError::Validation(format!(
            "configuration invalid: {}",
            errors.join("; ")
        ))
        .into());
    }

    match cli.command {
        Command::Run {
            candidates,
            resolutions,
        } => {
            let ledger = open_ledger(&config).await?;
            let clients = build_clients(&config)?;
            let executor = Arc::new(OrderExecutor::new(
                clients,
                ledger.clone(),
                RiskController::new(RiskLimits::from(&config.risk)),
                config.risk.min_roi,
            ));
            let reconciler = Arc::new(SettlementReconciler::new(
                ledger,
                Arc::new(FileResolutionSource::new(&resolutions)),
            ));
            let service = TradingService::new(
                executor,
                reconciler,
                Arc::new(FileCandidateSource::new(&candidates, config.risk.bet_amount)),
                &config.execution,
            );
            service.run().await?;
        }
        Command::State => {
            let ledger = open_ledger(&config).await?;
            let snapshot = ledger.snapshot().await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Reset { token } => {
            let ledger = open_ledger(&config).await?;
            ledger.reset(&token).await?;
            info!("ledger reset");
        }
    }

    Ok(())
}
