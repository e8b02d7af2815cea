use super::ConcurrentObserver;
use crate::error::ObserverError;
use agri_core::control::AutoControlSettings;
use agri_core::{LogEntry, LogLevel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoControl {
    pub enabled: bool,
    pub settings: AutoControlSettings,
}

pub struct AutoControlObserver {
    inner: Arc<ConcurrentObserver>,
}

impl Clone for AutoControlObserver {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl AutoControlObserver {
    pub fn new(inner: Arc<ConcurrentObserver>) -> Self {
        AutoControlObserver { inner }
    }

    pub fn get(&self) -> AutoControl {
        *self.inner.auto_control.read()
    }

    /// Replaces flag and settings, invalid settings leave both untouched
    pub fn update(&self, update: AutoControl) -> Result<AutoControl, ObserverError> {
        update.settings.validate()?;

        let previous = {
            let mut auto_control = self.inner.auto_control.write();
            let previous = *auto_control;
            *auto_control = update;
            previous
        };

        if previous.enabled != update.enabled {
            let state = if update.enabled { "已启用" } else { "已禁用" };
            self.inner.logs.push(
                LogEntry::new(LogLevel::Info, "自动控制-状态切换")
                    .status(state)
                    .details(format!("自动控制{}", state)),
            );
        }
        if previous.settings != update.settings {
            self.inner.logs.push(
                LogEntry::new(LogLevel::Success, "自动控制-设置更新")
                    .status("已保存")
                    .details("自动控制设置已保存"),
            );
        }
        Ok(update)
    }

    /// Runs one evaluation now, regardless of the enabled flag
    pub async fn run(&self) -> Vec<LogEntry> {
        self.inner.run_auto_control().await
    }
}
