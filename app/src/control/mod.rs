use crate::config::CONFIG;
use crate::error::ControlError;
use agri_core::control::Device;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

pub const AUTO_CONTROL_HEADER: &str = "X-Auto-Control";

/// Answer of the control proxy to every command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl ControlResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Raw answer of a forwarded request
#[derive(Debug)]
pub struct ForwardedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl From<ControlResponse> for ForwardedResponse {
    fn from(resp: ControlResponse) -> Self {
        ForwardedResponse {
            status: 200,
            content_type: Some("application/json".to_owned()),
            body: serde_json::to_vec(&resp).unwrap_or_default(),
        }
    }
}

/// HTTP client of the device control proxy
pub struct ControlClient {
    client: reqwest::Client,
    base_url: String,
    retries: usize,
}

impl std::fmt::Debug for ControlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ControlClient {
    pub fn new(base_url: &str, timeout: Duration, retries: usize) -> Result<Self, ControlError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let mut base_url = base_url.to_owned();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Ok(ControlClient {
            client,
            base_url,
            retries: retries.max(1),
        })
    }

    pub fn from_config() -> Result<Self, ControlError> {
        ControlClient::new(
            &CONFIG.control_api_url(),
            Duration::from_millis(CONFIG.control_timeout_ms()),
            CONFIG.control_send_retries(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn switch(
        &self,
        device: Device,
        on: bool,
        auto: bool,
    ) -> Result<ControlResponse, ControlError> {
        self.send(device.switch_command(on), auto).await
    }

    pub async fn set_speed(
        &self,
        device: Device,
        speed: u8,
        auto: bool,
    ) -> Result<ControlResponse, ControlError> {
        let command = device
            .speed_command(speed)
            .ok_or_else(|| ControlError::Path(format!("{} has no speed", device)))?;
        self.send(&command, auto).await
    }

    /// Sends a command, retrying until the proxy confirmed it
    /// or all attempts are used up
    pub async fn send(&self, command: &str, auto: bool) -> Result<ControlResponse, ControlError> {
        let mut last_err = None;
        for i in 0..self.retries {
            match self.send_once(command, auto).await {
                Ok(resp) => {
                    debug!(command = command, auto = auto, "Sent control command");
                    return Ok(resp);
                }
                Err(e) => {
                    warn!(
                        "[{}/{}] Failed sending command {:?} with {}",
                        i + 1,
                        self.retries,
                        command,
                        e
                    );
                    last_err = Some(e);
                }
            }
        }

        error!(
            "Failed sending command after {} retries: {:?}",
            self.retries, command
        );
        Err(last_err.unwrap_or_else(|| ControlError::Rejected(command.to_owned())))
    }

    async fn send_once(&self, command: &str, auto: bool) -> Result<ControlResponse, ControlError> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, command))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(AUTO_CONTROL_HEADER, auto_header(auto))
            .body("{}")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ControlError::Status(status.as_u16()));
        }

        let body: ControlResponse = resp.json().await?;
        if !body.is_success() {
            return Err(ControlError::Rejected(body.message));
        }
        Ok(body)
    }

    /// Passes a request through to the proxy without retrying
    pub async fn forward(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Vec<u8>,
        auto: bool,
    ) -> Result<ForwardedResponse, ControlError> {
        let url = self.resolve(path)?;
        let resp = self
            .client
            .request(method, url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(AUTO_CONTROL_HEADER, auto_header(auto))
            .body(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_owned());
        let body = resp.bytes().await?.to_vec();
        Ok(ForwardedResponse {
            status,
            content_type,
            body,
        })
    }

    /// Joins `path` onto the base url, refusing anything that ends up
    /// outside of it
    fn resolve(&self, path: &str) -> Result<reqwest::Url, ControlError> {
        let path = path.trim_start_matches('/');
        let invalid = || ControlError::Path(path.to_owned());
        let escapes = path.split(['/', '?']).any(|segment| {
            segment.to_ascii_lowercase().replace("%2e", ".") == ".."
        });
        if escapes || path.contains("://") {
            return Err(invalid());
        }

        let base = reqwest::Url::parse(&self.base_url).map_err(|_| invalid())?;
        let url = base.join(path).map_err(|_| invalid())?;
        if !url.as_str().starts_with(base.as_str()) {
            return Err(invalid());
        }
        Ok(url)
    }

    /// True if the proxy answers on its root path
    pub async fn health(&self) -> bool {
        match self.client.get(&self.base_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Control proxy not reachable: {}", e);
                false
            }
        }
    }
}

fn auto_header(auto: bool) -> &'static str {
    if auto {
        "true"
    } else {
        "false"
    }
}

/// Reads the `X-Auto-Control` header value
pub fn is_auto_control(header: Option<&str>) -> bool {
    header
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[cfg(test)]
mod test;
