use super::quoted;
use crate::error::DBError;
use agri_core::Dataset;
use sqlx::mysql::MySqlPool;

/// Removes rows without their key reading and pins the position
/// of the outdoor node
pub async fn cleanup(
    conn: &MySqlPool,
    external_id: &str,
    location: &str,
    altitude: &str,
) -> Result<u64, DBError> {
    let mut removed = 0;
    for dataset in [Dataset::Ens, Dataset::Cns, Dataset::Dns, Dataset::Dns2].iter() {
        let stmt = format!(
            "DELETE FROM {} WHERE {} IS NULL",
            quoted(dataset.table()),
            quoted(dataset.key_column())
        );
        removed += sql_stmnt!(&stmt).execute(conn).await?.rows_affected();
    }

    let table = quoted(Dataset::Ens.table());
    let update_location = format!("UPDATE {} SET `位置` = ? WHERE `设备号` = ?", table);
    sql_stmnt!(&update_location, location, external_id)
        .execute(conn)
        .await?;
    let update_altitude = format!("UPDATE {} SET `海拔高度` = ? WHERE `设备号` = ?", table);
    sql_stmnt!(&update_altitude, altitude, external_id)
        .execute(conn)
        .await?;

    Ok(removed)
}
