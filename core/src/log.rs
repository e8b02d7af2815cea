use crate::value::local_time;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

const CSV_HEADER: [&str; 6] = ["时间", "类型", "操作", "设备", "状态", "详情"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Success => "success",
        };
        f.write_str(name)
    }
}

/// One line of the system log shown in the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LogEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "type")]
    pub level: LogLevel,
}

impl LogEntry {
    pub fn new<S: Into<String>>(level: LogLevel, action: S) -> Self {
        LogEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action: action.into(),
            device: None,
            status: None,
            details: None,
            level,
        }
    }

    pub fn device<S: Into<String>>(mut self, device: S) -> Self {
        self.device = Some(device.into());
        self
    }

    pub fn status<S: Into<String>>(mut self, status: S) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn details<S: Into<String>>(mut self, details: S) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Narrows a log listing, every set field has to match
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LogFilter {
    #[serde(rename = "type")]
    pub level: Option<LogLevel>,
    pub device: Option<String>,
    /// Prefix of the action, e.g. `自动控制`
    pub action: Option<String>,
    /// Case insensitive search in action, details, device and status
    pub search: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(level) = self.level {
            if entry.level != level {
                return false;
            }
        }
        if let Some(device) = &self.device {
            if entry.device.as_ref() != Some(device) {
                return false;
            }
        }
        if let Some(action) = &self.action {
            if !entry.action.starts_with(action.as_str()) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let contains = |text: &Option<String>| {
                text.as_ref()
                    .map(|t| t.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            };
            return entry.action.to_lowercase().contains(&needle)
                || contains(&entry.details)
                || contains(&entry.device)
                || contains(&entry.status);
        }
        true
    }
}

/// Renders entries as the CSV the dashboard offers for download
pub fn logs_to_csv<T>(entries: &[LogEntry], tz: &T) -> String
where
    T: TimeZone,
    T::Offset: fmt::Display,
{
    let mut rows = vec![CSV_HEADER.join(",")];
    for entry in entries {
        let details = match &entry.details {
            Some(details) => format!("\"{}\"", details.replace('"', "\"\"")),
            None => String::new(),
        };
        let row = [
            local_time(entry.timestamp, tz),
            entry.level.to_string(),
            entry.action.clone(),
            entry.device.clone().unwrap_or_default(),
            entry.status.clone().unwrap_or_default(),
            details,
        ];
        rows.push(row.join(","));
    }
    rows.join("\n")
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Duration;

    fn entry() -> LogEntry {
        LogEntry::new(LogLevel::Success, "自动控制-开启风扇")
            .device("风扇")
            .status("开启")
            .details("当前温度30°C超过阈值28°C")
    }

    #[test]
    fn test_serialize_entry() {
        let json = serde_json::to_value(entry()).unwrap();

        assert_eq!(json["type"], "success");
        assert_eq!(json["action"], "自动控制-开启风扇");
        assert_eq!(json["device"], "风扇");

        let bare = serde_json::to_value(LogEntry::new(LogLevel::Info, "刷新")).unwrap();
        assert!(bare.get("device").is_none());
        assert!(bare.get("details").is_none());
    }

    #[test]
    fn test_filter() {
        let entry = entry();
        assert!(LogFilter::default().matches(&entry));

        let mut filter = LogFilter {
            level: Some(LogLevel::Success),
            action: Some("自动控制".to_owned()),
            ..LogFilter::default()
        };
        assert!(filter.matches(&entry));

        filter.level = Some(LogLevel::Error);
        assert!(!filter.matches(&entry));

        let device = LogFilter {
            device: Some("水泵".to_owned()),
            ..LogFilter::default()
        };
        assert!(!device.matches(&entry));

        let search = LogFilter {
            search: Some("阈值".to_owned()),
            ..LogFilter::default()
        };
        assert!(search.matches(&entry));

        let since = LogFilter {
            since: Some(entry.timestamp + Duration::seconds(1)),
            ..LogFilter::default()
        };
        assert!(!since.matches(&entry));
    }

    #[test]
    fn test_csv_escapes_details() {
        // Prepare
        let mut quoted = entry().details("say \"hi\", then leave");
        quoted.timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let mut bare = LogEntry::new(LogLevel::Warning, "自动控制-未执行");
        bare.timestamp = quoted.timestamp;

        // Execute
        let csv = logs_to_csv(&[quoted, bare], &chrono_tz::UTC);

        // Validate
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "时间,类型,操作,设备,状态,详情");
        assert_eq!(
            lines[1],
            "2024-01-02 03:04:05,success,自动控制-开启风扇,风扇,开启,\"say \"\"hi\"\", then leave\""
        );
        assert_eq!(lines[2], "2024-01-02 03:04:05,warning,自动控制-未执行,,,");
    }
}
