mod config;
mod control;
mod error;
mod logging;
mod models;
mod observer;
mod rest;

use config::CONFIG;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;
use tracing::{error, info, warn};

static TERMINATED: AtomicUsize = AtomicUsize::new(0);

fn register_sigint_handler(shutdown: watch::Sender<bool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        let count = TERMINATED.fetch_add(1, Ordering::Relaxed);
        if count >= 1 {
            info!("Force killing");
            std::process::exit(0);
        }
        info!("Shutting down, press Ctrl-C again to force");
        let _ = shutdown.send(true);
    })
}

#[tokio::main]
pub async fn main() {
    let tracer_provider = logging::init();

    let db_conn = match models::establish_db_connection() {
        Ok(conn) => conn,
        Err(e) => {
            error!("Invalid database configuration: {}", e);
            return;
        }
    };
    if CONFIG.database_migrate() {
        match models::migrate(&db_conn).await {
            Ok(_) => info!("Database migrated"),
            Err(e) => error!("Failed migrating database: {}", e),
        }
    }
    if let Err(e) = models::check_schema(&db_conn).await {
        warn!("Database not ready, serving fallback data: {}", e);
    }

    let control = match control::ControlClient::from_config() {
        Ok(control) => control,
        Err(e) => {
            error!("Invalid control proxy configuration: {}", e);
            return;
        }
    };
    let addr: SocketAddr = match CONFIG.bind_addr().parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid BIND_ADDR {}: {}", CONFIG.bind_addr(), e);
            return;
        }
    };

    let observer = observer::ConcurrentObserver::new(db_conn, control);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if let Err(e) = register_sigint_handler(shutdown_tx) {
        warn!("Failed registering Ctrl-C handler: {}", e);
    }

    let auto_control_loop = tokio::spawn(
        observer::ConcurrentObserver::dispatch_auto_control_loop(
            observer.clone(),
            shutdown_rx.clone(),
        ),
    );
    if let Err(e) = rest::dispatch_server_daemon(observer.clone(), addr, shutdown_rx).await {
        error!("Webserver failed: {}", e);
        return;
    }
    let _ = auto_control_loop.await;

    observer.db_conn.close().await;
    if let Some(provider) = tracer_provider {
        provider.force_flush();
    }
}
