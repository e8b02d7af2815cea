use super::ConcurrentObserver;
use crate::control::ForwardedResponse;
use crate::error::{ApiError, ObserverError};
use crate::models::control_node;
use agri_core::control::{Command, Device};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct DeviceObserver {
    inner: Arc<ConcurrentObserver>,
}

impl Clone for DeviceObserver {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl DeviceObserver {
    pub fn new(inner: Arc<ConcurrentObserver>) -> Self {
        DeviceObserver { inner }
    }

    /// Writes the on/off state of a device into the control node.
    /// `status` has to be `0` or `1`.
    pub async fn set_status(&self, device: Device, status: &str) -> Result<String, ObserverError> {
        let on = match status {
            "1" => true,
            "0" => false,
            _ => return Err(ApiError::InvalidParameter("status", status.to_owned()).into()),
        };

        self.store(device.status_column(), status).await?;
        let state = if on { "开启" } else { "关闭" };
        info!(device = device.label(), "Set status to {}", state);
        Ok(format!("{}状态已更新为{}", device.label(), state))
    }

    /// Writes the speed of the fan or the pump, `0` to `100`
    pub async fn set_speed(&self, device: Device, speed: &str) -> Result<String, ObserverError> {
        let column = device
            .speed_column()
            .ok_or_else(|| ApiError::InvalidParameter("device", device.label().to_owned()))?;
        let value = match speed.parse::<u8>() {
            Ok(value) if value <= 100 => value,
            _ => return Err(ApiError::InvalidParameter("speed", speed.to_owned()).into()),
        };

        self.store(column, &value.to_string()).await?;
        info!(device = device.label(), "Set speed to {}", value);
        Ok(format!("{}速度已更新为{}", device.label(), value))
    }

    async fn store(&self, column: &'static str, value: &str) -> Result<(), ObserverError> {
        let update = control_node::set_field(
            &self.inner.db_conn,
            &self.inner.device_id,
            column,
            value,
            Utc::now(),
        );
        if self.inner.bounded(update).await? == 0 {
            warn!(
                device_id = self.inner.device_id.as_str(),
                "No control node row updated"
            );
        }
        Ok(())
    }

    /// Passes a request to the control proxy.
    ///
    /// Device commands are sent with retries and recorded in the system log,
    /// everything else is forwarded once as is.
    pub async fn forward(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Vec<u8>,
        auto: bool,
    ) -> Result<ForwardedResponse, ObserverError> {
        let command = match Command::parse(path) {
            Some(command) if method == reqwest::Method::POST => command,
            _ => return Ok(self.inner.control.forward(method, path, body, auto).await?),
        };

        let res = self.inner.control.send(&command.path(), auto).await;
        debug!(
            device = command.device().label(),
            success = res.is_ok(),
            "Forwarded device command"
        );
        self.inner.logs.push(command.entry(auto, res.is_ok()));
        Ok(res?.into())
    }
}
