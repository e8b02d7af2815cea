use super::{quoted, CountRecord};
use crate::error::DBError;
use agri_core::{Dataset, Record};
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;

const SERIAL: &str = "序号";

/// Raw row of any node table, every column cast to text
pub struct ReadingDao {
    pub(crate) columns: Vec<Option<String>>,
}

impl<'r> sqlx::FromRow<'r, MySqlRow> for ReadingDao {
    fn from_row(row: &'r MySqlRow) -> Result<Self, sqlx::Error> {
        let mut columns = Vec::with_capacity(row.len());
        for idx in 0..row.len() {
            columns.push(row.try_get::<Option<String>, _>(idx)?);
        }
        Ok(ReadingDao { columns })
    }
}

impl ReadingDao {
    pub fn into_record(self, dataset: Dataset, now: DateTime<Utc>) -> Record {
        Record::from_columns(dataset, self.columns, now)
    }
}

fn select_columns(dataset: Dataset) -> String {
    dataset
        .columns()
        .iter()
        .map(|c| format!("CAST({0} AS CHAR) AS {0}", quoted(c)))
        .collect::<Vec<String>>()
        .join(", ")
}

/// Qualified so the ordering uses the numeric column, not the text alias
fn order_column(dataset: Dataset) -> String {
    format!("{}.{}", quoted(dataset.table()), quoted(SERIAL))
}

/// Newest row whose required columns are all set
pub async fn get_latest(
    conn: &MySqlPool,
    dataset: Dataset,
    now: DateTime<Utc>,
) -> Result<Option<Record>, DBError> {
    let filter = dataset
        .required_columns()
        .iter()
        .map(|c| format!("{} IS NOT NULL", quoted(c)))
        .collect::<Vec<String>>()
        .join(" AND ");
    let stmt = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {} DESC LIMIT 1",
        select_columns(dataset),
        quoted(dataset.table()),
        filter,
        order_column(dataset)
    );

    let dao = sql_stmnt!(ReadingDao, &stmt).fetch_optional(conn).await?;
    Ok(dao.map(|d| d.into_record(dataset, now)))
}

/// Newest rows first
pub async fn get_history(
    conn: &MySqlPool,
    dataset: Dataset,
    limit: u32,
    now: DateTime<Utc>,
) -> Result<Vec<Record>, DBError> {
    let stmt = format!(
        "SELECT {} FROM {} ORDER BY {} DESC LIMIT ?",
        select_columns(dataset),
        quoted(dataset.table()),
        order_column(dataset)
    );

    let mut daos = sql_stmnt!(ReadingDao, &stmt, limit)
        .fetch_all(conn)
        .await?;
    Ok(daos.drain(..).map(|d| d.into_record(dataset, now)).collect())
}

/// Column/value pairs of an insert, the serial is left to the database
pub(crate) fn insert_values(record: &Record) -> Vec<(&'static str, &str)> {
    record
        .dataset()
        .columns()
        .iter()
        .copied()
        .zip(record.values())
        .filter(|(column, _)| *column != SERIAL)
        .collect()
}

pub async fn insert(conn: &MySqlPool, record: &Record) -> Result<(), DBError> {
    let dataset = record.dataset();
    let values = insert_values(record);
    let stmt = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted(dataset.table()),
        values
            .iter()
            .map(|(c, _)| quoted(c))
            .collect::<Vec<String>>()
            .join(", "),
        vec!["?"; values.len()].join(", ")
    );

    let mut query = sql_stmnt!(&stmt);
    for (_, value) in values {
        query = query.bind(value);
    }
    query.execute(conn).await?;
    Ok(())
}

pub async fn count(conn: &MySqlPool, dataset: Dataset) -> Result<i64, DBError> {
    let stmt = format!(
        "SELECT COUNT(*) AS count FROM {}",
        quoted(dataset.table())
    );
    let record = sql_stmnt!(CountRecord, &stmt).fetch_one(conn).await?;
    Ok(record.count())
}
