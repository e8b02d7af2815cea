use crate::config::CONFIG;
use crate::control::ControlClient;
use crate::error::DBError;
use crate::models::{control_node, reading};
use agri_core::control::{
    not_executed_entry, plan, skipped_entry, speed_entry, Decision, Device, DeviceStatus,
};
use agri_core::threshold::DataThresholds;
use agri_core::{Dataset, Dns2Record, DnsRecord, LogEntry, Record};
use chrono::Utc;
use parking_lot::RwLock;
use sqlx::MySqlPool;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, info_span, warn, Instrument};

pub mod auth;
pub mod auto;
pub mod data;
pub mod device;
pub mod log;
pub mod threshold;

pub use auto::{AutoControl, AutoControlObserver};
pub use data::DataObserver;
pub use device::DeviceObserver;
pub use log::{LogObserver, LogStore};
pub use threshold::ThresholdObserver;

pub struct ConcurrentObserver {
    pub(crate) db_conn: MySqlPool,
    pub(crate) control: ControlClient,
    pub(crate) auto_control: RwLock<AutoControl>,
    pub(crate) thresholds: RwLock<DataThresholds>,
    pub(crate) logs: LogStore,
    pub(crate) device_id: String,
    query_timeout: Duration,
    tick_lock: Mutex<()>,
}

impl Debug for ConcurrentObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentObserver").finish()
    }
}

impl ConcurrentObserver {
    pub fn new(db_conn: MySqlPool, control: ControlClient) -> Arc<Self> {
        let auto_control = AutoControl {
            enabled: CONFIG.auto_control(),
            settings: Default::default(),
        };
        let observer = ConcurrentObserver {
            db_conn,
            control,
            auto_control: RwLock::new(auto_control),
            thresholds: RwLock::new(DataThresholds::default()),
            logs: LogStore::new(CONFIG.log_count()),
            device_id: CONFIG.control_device_id(),
            query_timeout: Duration::from_millis(CONFIG.db_query_timeout_ms()),
            tick_lock: Mutex::new(()),
        };
        Arc::new(observer)
    }

    /// Fails a database call that exceeds the query timeout
    pub(crate) async fn bounded<T, F>(&self, query: F) -> Result<T, DBError>
    where
        F: Future<Output = Result<T, DBError>>,
    {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(res) => res,
            Err(_) => Err(DBError::Timeout(self.query_timeout.as_millis() as u64)),
        }
    }

    pub(crate) async fn query_latest(&self, dataset: Dataset) -> Result<Option<Record>, DBError> {
        self.bounded(reading::get_latest(&self.db_conn, dataset, Utc::now()))
            .await
    }

    /// Newest row of a dataset, the mock row if there is none
    /// or the database cannot be reached
    pub(crate) async fn latest_or_fallback(&self, dataset: Dataset) -> Record {
        match self.query_latest(dataset).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!(dataset = dataset.name(), "No readings found, serving fallback");
                Record::fallback(dataset, Utc::now())
            }
            Err(e) => {
                warn!(
                    dataset = dataset.name(),
                    "Failed fetching latest reading, serving fallback: {}", e
                );
                Record::fallback(dataset, Utc::now())
            }
        }
    }

    pub async fn check_db(&self) -> String {
        match self.bounded(reading::count(&self.db_conn, Dataset::Cns)).await {
            Ok(_) => "healthy".to_owned(),
            Err(e) => e.to_string(),
        }
    }

    pub async fn control_reachable(&self) -> bool {
        self.control.health().await
    }

    pub fn is_auto_control_enabled(&self) -> bool {
        self.auto_control.read().enabled
    }

    /// Evaluates every device once and sends the resulting commands.
    /// Returns the entries written to the system log, in order.
    pub async fn run_auto_control(&self) -> Vec<LogEntry> {
        // Overlapping ticks would send the same command twice
        let _tick = self.tick_lock.lock().await;

        let dns = match self.latest_reading(Dataset::Dns).await {
            Some(Record::Dns(r)) => Some(r),
            _ => None,
        };
        let dns2 = match self.latest_reading(Dataset::Dns2).await {
            Some(Record::Dns2(r)) => Some(r),
            _ => None,
        };
        let (dns, dns2): (DnsRecord, Dns2Record) = match (dns, dns2) {
            (Some(dns), Some(dns2)) => (dns, dns2),
            (dns, dns2) => {
                return not_executed_entry(dns.is_some(), dns2.is_some())
                    .map(|entry| vec![self.logs.push(entry)])
                    .unwrap_or_default();
            }
        };
        let status = match self.latest_reading(Dataset::Cns).await {
            Some(Record::Cns(r)) => DeviceStatus::from(&r),
            _ => DeviceStatus::default(),
        };
        self.apply_plan(&dns, &dns2, status).await
    }

    /// Sends the commands the current settings call for, given the
    /// readings and the device state
    pub(crate) async fn apply_plan(
        &self,
        dns: &DnsRecord,
        dns2: &Dns2Record,
        status: DeviceStatus,
    ) -> Vec<LogEntry> {
        let settings = self.auto_control.read().settings;
        debug!(?status, "Evaluating automatic control");

        let mut entries = Vec::new();
        for decision in plan(dns, dns2, status, &settings) {
            match decision {
                Ok(decision) => self.apply_decision(&decision, &mut entries).await,
                Err(e) => {
                    warn!("Skipping device: {}", e);
                    entries.push(self.logs.push(skipped_entry(&e)));
                }
            }
        }
        entries
    }

    /// Runs the automatic control every refresh interval while it is
    /// enabled, until the shutdown signal fires
    pub async fn dispatch_auto_control_loop(
        self: Arc<ConcurrentObserver>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let interval = Duration::from_millis(CONFIG.refresh_interval_ms());
        info!(
            "Start auto control loop with {} ms interval",
            interval.as_millis()
        );
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {
                    info!("Stopped auto control loop");
                    return;
                }
            }
            if !self.is_auto_control_enabled() {
                continue;
            }

            let span = info_span!("auto_control_tick");
            let entries = self.run_auto_control().instrument(span).await;
            debug!("Auto control tick wrote {} log entries", entries.len());
        }
    }

    async fn latest_reading(&self, dataset: Dataset) -> Option<Record> {
        match self.query_latest(dataset).await {
            Ok(record) => record,
            Err(e) => {
                warn!(dataset = dataset.name(), "Failed fetching reading: {}", e);
                None
            }
        }
    }

    async fn apply_decision(&self, decision: &Decision, entries: &mut Vec<LogEntry>) {
        entries.push(self.logs.push(decision.detected_entry()));
        let on = match decision.target() {
            Some(on) => on,
            None => return,
        };

        let device = decision.device;
        if let Err(e) = self.control.switch(device, on, true).await {
            error!(device = device.label(), "Automatic control failed: {}", e);
            entries.push(self.logs.push(decision.failed_entry()));
            return;
        }
        entries.push(self.logs.push(decision.completed_entry()));
        self.store_status(device, on).await;

        if let (true, Some(speed)) = (on, decision.speed) {
            let sent = self.control.set_speed(device, speed, true).await;
            if let Err(e) = &sent {
                error!(device = device.label(), "Failed setting speed: {}", e);
            }
            entries.push(self.logs.push(speed_entry(device, speed, true, sent.is_ok())));
            if sent.is_ok() {
                self.store_speed(device, speed).await;
            }
        }
    }

    async fn store_status(&self, device: Device, on: bool) {
        let value = if on { "1" } else { "0" };
        self.store_field(device.status_column(), value).await
    }

    async fn store_speed(&self, device: Device, speed: u8) {
        if let Some(column) = device.speed_column() {
            self.store_field(column, &speed.to_string()).await
        }
    }

    async fn store_field(&self, column: &'static str, value: &str) {
        let update =
            control_node::set_field(&self.db_conn, &self.device_id, column, value, Utc::now());
        match self.bounded(update).await {
            Ok(0) => debug!(column = column, "No control node row to update"),
            Ok(_) => debug!(column = column, value = value, "Stored control node state"),
            Err(e) => error!(column = column, "Failed storing control node state: {}", e),
        }
    }
}
