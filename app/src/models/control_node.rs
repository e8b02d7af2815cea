use super::quoted;
use crate::error::DBError;
use agri_core::{report_time, Dataset};
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlPool;

/// Columns of the control node a client may write
pub const WRITABLE_COLUMNS: [&str; 5] =
    ["风扇状态", "生长灯状态", "水泵状态", "风扇速度", "水泵速度"];

/// Writes one actuator column of the control node and bumps its report time.
/// Returns the number of touched rows.
pub async fn set_field(
    conn: &MySqlPool,
    device_id: &str,
    column: &'static str,
    value: &str,
    now: DateTime<Utc>,
) -> Result<u64, DBError> {
    debug_assert!(WRITABLE_COLUMNS.contains(&column));
    let stmt = format!(
        "UPDATE {} SET {} = ?, {} = ? WHERE {} = ?",
        quoted(Dataset::Cns.table()),
        quoted(column),
        quoted(agri_core::REPORT_TIME),
        quoted("设备号")
    );

    let result = sql_stmnt!(&stmt, value, report_time(now), device_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
