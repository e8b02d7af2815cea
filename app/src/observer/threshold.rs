use super::ConcurrentObserver;
use crate::error::ObserverError;
use agri_core::threshold::{DataThresholds, MetricRange, MetricRating};
use agri_core::{Dataset, Record};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub struct ThresholdObserver {
    inner: Arc<ConcurrentObserver>,
}

impl Clone for ThresholdObserver {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl ThresholdObserver {
    pub fn new(inner: Arc<ConcurrentObserver>) -> Self {
        ThresholdObserver { inner }
    }

    pub fn get(&self) -> DataThresholds {
        self.inner.thresholds.read().clone()
    }

    pub fn update(
        &self,
        updates: BTreeMap<String, MetricRange>,
    ) -> Result<DataThresholds, ObserverError> {
        let count = updates.len();
        let mut thresholds = self.inner.thresholds.write();
        thresholds.merge(updates)?;
        info!("Updated {} data thresholds", count);
        Ok(thresholds.clone())
    }

    /// Rates the latest detection readings, mock rows stand in
    /// for missing ones
    pub async fn status(&self) -> Vec<MetricRating> {
        let dns = self.inner.latest_or_fallback(Dataset::Dns).await;
        let dns2 = self.inner.latest_or_fallback(Dataset::Dns2).await;
        let thresholds = self.get();
        match (dns, dns2) {
            (Record::Dns(dns), Record::Dns2(dns2)) => thresholds.evaluate(&dns, &dns2),
            _ => Vec::new(),
        }
    }
}
