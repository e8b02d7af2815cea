use crate::error::CoreError;
use crate::readings::{Dns2Record, DnsRecord, Record};
use crate::value::parse_number;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Best and worst value of a metric, either bound may be the larger one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MetricRange {
    pub best: f64,
    pub worst: f64,
}

impl MetricRange {
    pub fn new(best: f64, worst: f64) -> Self {
        MetricRange { best, worst }
    }

    pub fn validate(&self, metric: &str) -> Result<(), CoreError> {
        if !self.best.is_finite() || !self.worst.is_finite() {
            return Err(CoreError::InvalidSettings(format!(
                "{} bounds must be finite",
                metric
            )));
        }
        if (self.best - self.worst).abs() < f64::EPSILON {
            return Err(CoreError::InvalidSettings(format!(
                "{} best and worst must differ",
                metric
            )));
        }
        Ok(())
    }

    /// Position of `value` between worst (0) and best (100)
    pub fn position(&self, value: f64) -> f64 {
        let position = (value - self.worst) / (self.best - self.worst) * 100.0;
        position.max(0.0).min(100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Good,
    Fair,
    Poor,
}

impl Quality {
    fn from_position(position: f64) -> Self {
        if position >= 66.0 {
            Quality::Good
        } else if position >= 33.0 {
            Quality::Fair
        } else {
            Quality::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MetricRating {
    pub metric: String,
    pub value: f64,
    pub best: f64,
    pub worst: f64,
    pub position: f64,
    pub quality: Quality,
}

/// Best/worst bounds of every rated metric, keyed by column name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct DataThresholds(BTreeMap<String, MetricRange>);

const DEFAULT_RANGES: [(&str, f64, f64); 14] = [
    ("室内温度", 25.0, 35.0),
    ("室内湿度", 60.0, 90.0),
    ("光照强度", 800.0, 200.0),
    ("土壤湿度", 65.0, 30.0),
    ("挥发性有机化合物浓度", 400.0, 1000.0),
    ("二氧化碳浓度", 600.0, 1200.0),
    ("土壤温度", 22.0, 30.0),
    ("土壤导电率", 1.5, 3.0),
    ("土壤PH值", 6.5, 5.0),
    ("土壤含氮量", 150.0, 50.0),
    ("土壤含钾量", 200.0, 80.0),
    ("土壤含磷量", 100.0, 30.0),
    ("土壤盐度", 3.0, 8.0),
    ("土壤总溶解固体", 700.0, 1500.0),
];

impl Default for DataThresholds {
    fn default() -> Self {
        let ranges = DEFAULT_RANGES
            .iter()
            .map(|(metric, best, worst)| ((*metric).to_owned(), MetricRange::new(*best, *worst)))
            .collect();
        DataThresholds(ranges)
    }
}

impl DataThresholds {
    pub fn get(&self, metric: &str) -> Option<&MetricRange> {
        self.0.get(metric)
    }

    /// Overwrites the given metrics, unknown metrics are rejected
    /// and nothing is changed then
    pub fn merge(&mut self, updates: BTreeMap<String, MetricRange>) -> Result<(), CoreError> {
        for (metric, range) in updates.iter() {
            if !self.0.contains_key(metric) {
                return Err(CoreError::InvalidSettings(format!(
                    "Unknown metric {}",
                    metric
                )));
            }
            range.validate(metric)?;
        }
        self.0.extend(updates);
        Ok(())
    }

    pub fn rate(&self, metric: &str, value: f64) -> Option<MetricRating> {
        let range = self.get(metric)?;
        let position = range.position(value);
        Some(MetricRating {
            metric: metric.to_owned(),
            value,
            best: range.best,
            worst: range.worst,
            position,
            quality: Quality::from_position(position),
        })
    }

    /// Rates every known metric of the latest detection rows,
    /// values that are not numbers are left out
    pub fn evaluate(&self, dns: &DnsRecord, dns2: &Dns2Record) -> Vec<MetricRating> {
        let records = [Record::Dns(dns.clone()), Record::Dns2(dns2.clone())];
        let mut ratings = Vec::new();
        for record in records.iter() {
            for column in record.dataset().columns() {
                if self.get(column).is_none() {
                    continue;
                }
                if let Some(raw) = record.get(column) {
                    if let Ok(value) = parse_number(column, raw) {
                        if let Some(rating) = self.rate(column, value) {
                            ratings.push(rating);
                        }
                    }
                }
            }
        }
        ratings
    }
}
