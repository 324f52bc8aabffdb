use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tier_ledger::adapters::auth::JwtSessionValidator;
use tier_ledger::adapters::http::{api_router, AppState, AuthState, HttpConfig};
use tier_ledger::adapters::ledger::HorizonLedgerClient;
use tier_ledger::adapters::notify::TracingRenewalNotifier;
use tier_ledger::adapters::postgres::{
    PostgresSubscriptionReader, PostgresSubscriptionRepository, PostgresTierRepository,
    PostgresWalletDirectory,
};
use tier_ledger::adapters::scheduler::RenewalSchedulerDriver;
use tier_ledger::application::{AccessGate, PaymentVerifier, RenewalScheduler};
use tier_ledger::config::AppConfig;
use tier_ledger::ports::{SubscriptionReader, SubscriptionRepository, TierRepository};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("tier-ledger exited with error: {:#}", error);
        eprintln!("tier-ledger exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    init_tracing(&config);

    let pool = config
        .database
        .connect()
        .await
        .context("connecting to PostgreSQL")?;
    info!("Postgres connection pool established");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("running migrations")?;
        info!("Database migrations applied");
    }

    let tiers: Arc<dyn TierRepository> = Arc::new(PostgresTierRepository::new(pool.clone()));
    let subscriptions: Arc<dyn SubscriptionRepository> =
        Arc::new(PostgresSubscriptionRepository::new(pool.clone()));
    let reader: Arc<dyn SubscriptionReader> =
        Arc::new(PostgresSubscriptionReader::new(pool.clone()));

    info!(
        asset = %config.ledger.asset_code,
        platform_wallet = config.ledger.platform_wallet().unwrap_or("unset"),
        "Verifying payments against the ledger"
    );
    let ledger = HorizonLedgerClient::new(config.ledger.horizon_config())
        .context("building ledger client")?;
    let verifier = Arc::new(PaymentVerifier::new(Arc::new(ledger), config.ledger.asset()));
    let access_gate = Arc::new(AccessGate::new(
        tiers.clone(),
        subscriptions.clone(),
        reader.clone(),
    ));

    let state = AppState {
        tiers,
        subscriptions: subscriptions.clone(),
        reader: reader.clone(),
        wallets: Arc::new(PostgresWalletDirectory::new(pool)),
        verifier,
        access_gate,
        splitter: config.billing.splitter()?,
        policy: config.billing.policy(),
    };

    let validator: AuthState = Arc::new(JwtSessionValidator::new(config.auth.jwt_config()));
    let http_config = HttpConfig {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
    };
    let app = api_router(state, validator, &http_config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = if config.scheduler.enabled {
        let scheduler = Arc::new(RenewalScheduler::new(
            subscriptions,
            reader,
            Arc::new(TracingRenewalNotifier::new()),
        ));
        let driver = RenewalSchedulerDriver::new(scheduler, config.scheduler.driver_config());
        Some(tokio::spawn(async move { driver.run(shutdown_rx).await }))
    } else {
        info!("Renewal scheduler disabled");
        None
    };

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, environment = ?config.server.environment, "tier-ledger listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    // The send only fails if the driver already stopped.
    let _ = shutdown_tx.send(true);
    if let Some(task) = scheduler_task {
        if let Err(e) = task.await {
            error!(error = %e, "Renewal scheduler task failed");
        }
    }

    info!("tier-ledger stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received ctrl+c, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for ctrl+c; running until killed");
            std::future::pending::<()>().await
        }
    }
}
