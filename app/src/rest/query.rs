use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 500;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    limit: Option<u32>,
}

impl HistoryQuery {
    pub fn new(limit: Option<u32>) -> Self {
        HistoryQuery { limit }
    }

    /// Requested row count, clamped to `1..=500`
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}
