//! # TaskHive Worker
//!
//! The delayed-job runner for TaskHive. Claims due `scheduled_jobs` rows
//! from Postgres and dispatches them to handlers; today that is the
//! `task-notify` handler delivering assignment notices and ETA reminders.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskhive-worker
//! ```

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskhive_shared::db::{migrations::run_migrations, pool};
use taskhive_shared::push::Pusher;
use taskhive_worker::config::WorkerConfig;
use taskhive_worker::handlers::task_notify::TaskNotifyHandler;
use taskhive_worker::runner::Runner;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskhive_worker=debug".into());

    let registry = tracing_subscriber::registry().with(filter);

    // LOG_FORMAT=json switches to structured output for log shippers
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    init_tracing();

    tracing::info!("TaskHive Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = WorkerConfig::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database_url.clone(),
        max_connections: config.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&db).await?;

    let pusher = Pusher::new(&config.push)?;

    let mut runner = Runner::new(db, config.runner);
    runner.register(Arc::new(TaskNotifyHandler::new(pusher)));

    let shutdown = runner.shutdown_token();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        shutdown.cancel();
    });

    runner.run().await?;

    Ok(())
}
