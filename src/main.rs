#[macro_use]
extern crate tracing;

use std::sync::Arc;

use clokwerk::Scheduler;
use ryker_rs::{config::Config, database::Database, scheduled, webserver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    let db = Arc::new(Database::open(config.data_dir.clone(), config.tuning.clone())?);

    let server = webserver::start_api(db.clone(), &config)?;
    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let mut scheduler = Scheduler::with_tz(chrono::Local);
    let handle = tokio::runtime::Handle::current();
    for setup in scheduled::SETUP_FUNCTIONS {
        setup(&mut scheduler, handle.clone(), db.clone());
    }
    let scheduler_handle = scheduler.watch_thread(std::time::Duration::from_millis(5000));

    info!(
        "Housemate Ryker is ready to manage the neighborhood on {}",
        config.bind_addr
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    scheduler_handle.stop();
    server_handle.stop(true).await;
    server_task.await??;
    db.flush().await;

    Ok(())
}
