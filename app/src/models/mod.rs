use crate::config::CONFIG;
use crate::error::DBError;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;

macro_rules! sql_stmnt {
    ($ret:ident, $stmt:expr) => {
        sqlx::query_as::<_ ,$ret>($stmt)
    };
    ($stmt:expr) => {
        sqlx::query($stmt)
    };
    ($ret:ident, $stmt:expr, $($bind:expr),*) => {
        sqlx::query_as::<_ ,$ret>($stmt)$(.bind($bind))*
    };
    ($stmt:expr, $($bind:expr),*) => {
        sqlx::query($stmt)$(.bind($bind))*
    };
}

/// Creates the pool without connecting, the first query opens the
/// connection. Requests keep working on fallback data while the
/// database is down.
pub fn establish_db_connection() -> Result<MySqlPool, DBError> {
    connect_lazy(&CONFIG.database_url())
}

pub fn connect_lazy(database_url: &str) -> Result<MySqlPool, DBError> {
    let pool = MySqlPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_millis(CONFIG.db_query_timeout_ms()))
        .connect_lazy(database_url)?;
    Ok(pool)
}

pub async fn migrate(conn: &MySqlPool) -> Result<(), DBError> {
    sqlx::migrate!("./migrations").run(conn).await?;
    Ok(())
}

pub async fn check_schema(conn: &MySqlPool) -> Result<(), DBError> {
    for dataset in agri_core::Dataset::ALL.iter() {
        reading::count(conn, *dataset).await?;
    }
    Ok(())
}

/// Quotes an identifier, table and column names are static
pub(crate) fn quoted(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

#[derive(sqlx::FromRow)]
pub(crate) struct CountRecord {
    pub count: Option<i64>,
}

impl CountRecord {
    pub fn count(self) -> i64 {
        self.count.unwrap_or(0)
    }
}

pub mod control_node;
pub mod maintenance;
pub mod reading;
