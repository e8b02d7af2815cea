use chrono_tz::Tz;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::env;
use std::str::FromStr;
use tracing::warn;

pub struct Config {
    inner: RwLock<InnerConfig>,
}

struct InnerConfig {
    bind_addr: String,
    database_url: String,
    database_migrate: bool,
    db_query_timeout_ms: u64,
    control_api_url: String,
    control_timeout_ms: u64,
    control_send_retries: usize,
    control_device_id: String,
    refresh_interval_ms: u64,
    auto_control: bool,
    log_count: usize,
    auth_username: String,
    auth_password: String,
    auth_token: String,
    timezone: Tz,
    external_sensor_id: String,
    external_sensor_location: String,
    external_sensor_altitude: String,
    static_dir: Option<String>,
}

impl Config {
    pub fn bind_addr(&self) -> String {
        let inner = self.inner.read();
        inner.bind_addr.clone()
    }

    pub fn database_url(&self) -> String {
        let inner = self.inner.read();
        inner.database_url.clone()
    }

    pub fn database_migrate(&self) -> bool {
        self.inner.read().database_migrate
    }

    pub fn db_query_timeout_ms(&self) -> u64 {
        self.inner.read().db_query_timeout_ms
    }

    /// Base url of the control proxy, always ends with a slash
    pub fn control_api_url(&self) -> String {
        let inner = self.inner.read();
        inner.control_api_url.clone()
    }

    pub fn control_timeout_ms(&self) -> u64 {
        self.inner.read().control_timeout_ms
    }

    pub fn control_send_retries(&self) -> usize {
        self.inner.read().control_send_retries
    }

    pub fn control_device_id(&self) -> String {
        let inner = self.inner.read();
        inner.control_device_id.clone()
    }

    pub fn refresh_interval_ms(&self) -> u64 {
        self.inner.read().refresh_interval_ms
    }

    pub fn auto_control(&self) -> bool {
        self.inner.read().auto_control
    }

    pub fn log_count(&self) -> usize {
        self.inner.read().log_count
    }

    pub fn credentials(&self) -> (String, String) {
        let inner = self.inner.read();
        (inner.auth_username.clone(), inner.auth_password.clone())
    }

    pub fn auth_token(&self) -> String {
        let inner = self.inner.read();
        inner.auth_token.clone()
    }

    pub fn timezone(&self) -> Tz {
        self.inner.read().timezone
    }

    /// Device id, location and altitude of the outdoor node
    /// the cleanup job keeps up to date
    pub fn external_sensor(&self) -> (String, String, String) {
        let inner = self.inner.read();
        (
            inner.external_sensor_id.clone(),
            inner.external_sensor_location.clone(),
            inner.external_sensor_altitude.clone(),
        )
    }

    pub fn static_dir(&self) -> Option<String> {
        let inner = self.inner.read();
        inner.static_dir.clone()
    }
}

/// Read on its own, the logger needs it before `CONFIG` may warn
pub fn trace_stdout() -> bool {
    dotenv::dotenv().ok();
    env::var("TRACE_STDOUT")
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid value for {}: {}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv::dotenv().ok();

    let mut control_api_url = var_or("CONTROL_API_URL", "http://localhost:9600/");
    if !control_api_url.ends_with('/') {
        control_api_url.push('/');
    }

    let timezone = var_or("TIMEZONE", "Asia/Shanghai");
    let timezone = timezone.parse::<Tz>().unwrap_or_else(|_| {
        warn!("Invalid timezone {}, using UTC", timezone);
        Tz::UTC
    });

    Config {
        inner: RwLock::new(InnerConfig {
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:5555"),
            database_url: var_or("DATABASE_URL", "mysql://root@localhost:3306/agriculture"),
            database_migrate: parsed_or("DATABASE_MIGRATE", false),
            db_query_timeout_ms: parsed_or("DB_QUERY_TIMEOUT_MS", 10_000),
            control_api_url,
            control_timeout_ms: parsed_or("CONTROL_TIMEOUT_MS", 5_000),
            control_send_retries: parsed_or::<usize>("CONTROL_SEND_RETRIES", 3).max(1),
            control_device_id: var_or("CONTROL_DEVICE_ID", "CNS_001"),
            refresh_interval_ms: parsed_or::<u64>("REFRESH_INTERVAL_MS", 30_000).max(1_000),
            auto_control: parsed_or("AUTO_CONTROL", false),
            log_count: parsed_or::<usize>("LOG_COUNT", 1_000).max(1),
            auth_username: var_or("AUTH_USERNAME", "jdzvua"),
            auth_password: var_or("AUTH_PASSWORD", "Jdzvua123"),
            auth_token: var_or("AUTH_TOKEN", "simple-auth-token"),
            timezone,
            external_sensor_id: var_or("EXTERNAL_SENSOR_ID", "External_Sensor_1"),
            external_sensor_location: var_or(
                "EXTERNAL_SENSOR_LOCATION",
                "117.23172499999998 N，29.34743600000002 E",
            ),
            external_sensor_altitude: var_or("EXTERNAL_SENSOR_ALTITUDE", "190"),
            static_dir: env::var("STATIC_DIR").ok().filter(|s| !s.is_empty()),
        }),
    }
});
