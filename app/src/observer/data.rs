use super::ConcurrentObserver;
use crate::config::CONFIG;
use crate::error::ObserverError;
use crate::models::{maintenance, reading};
use agri_core::{records_to_csv, Dataset, Record};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct DataObserver {
    inner: Arc<ConcurrentObserver>,
}

impl Clone for DataObserver {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl DataObserver {
    pub fn new(inner: Arc<ConcurrentObserver>) -> Self {
        DataObserver { inner }
    }

    /// The newest reading as a one element list, never empty
    pub async fn latest(&self, dataset: Dataset) -> Vec<Record> {
        vec![self.inner.latest_or_fallback(dataset).await]
    }

    /// Like [`DataObserver::latest`] for the control node,
    /// after dropping incomplete rows of every table
    pub async fn latest_control(&self) -> Vec<Record> {
        let (id, location, altitude) = CONFIG.external_sensor();
        let cleanup = maintenance::cleanup(&self.inner.db_conn, &id, &location, &altitude);
        match self.inner.bounded(cleanup).await {
            Ok(removed) if removed > 0 => info!("Removed {} incomplete rows", removed),
            Ok(_) => {}
            Err(e) => warn!("Failed cleaning up readings: {}", e),
        }
        self.latest(Dataset::Cns).await
    }

    pub async fn history(
        &self,
        dataset: Dataset,
        limit: u32,
    ) -> Result<Vec<Record>, ObserverError> {
        let query = reading::get_history(&self.inner.db_conn, dataset, limit, Utc::now());
        let records = self.inner.bounded(query).await?;
        debug!(dataset = dataset.name(), "Fetched {} rows", records.len());
        Ok(records)
    }

    pub async fn history_csv(&self, dataset: Dataset, limit: u32) -> Result<String, ObserverError> {
        let records = self.history(dataset, limit).await?;
        Ok(records_to_csv(dataset, &records))
    }

    /// Mock rows of a dataset name, unknown names yield nothing
    pub fn fallback(&self, dataset: &str) -> Vec<Record> {
        match dataset.parse::<Dataset>() {
            Ok(dataset) => vec![Record::fallback(dataset, Utc::now())],
            Err(e) => {
                debug!("No fallback data: {}", e);
                Vec::new()
            }
        }
    }

    /// Writes one mock row into every table, failures are only logged.
    /// Returns the number of inserted rows.
    pub async fn generate_mock(&self) -> usize {
        let now = Utc::now();
        let mut inserted = 0;
        for dataset in Dataset::ALL.iter() {
            let record = Record::seed(*dataset, now);
            match self.inner.bounded(reading::insert(&self.inner.db_conn, &record)).await {
                Ok(()) => inserted += 1,
                Err(e) => warn!(
                    dataset = dataset.name(),
                    "Failed inserting mock data: {}", e
                ),
            }
        }
        info!("Generated {} mock rows", inserted);
        inserted
    }
}
