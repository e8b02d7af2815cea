use crate::error::CoreError;
use crate::value::report_time;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Column every table uses for the report time
pub const REPORT_TIME: &str = "上报时间";

/// The four node tables a greenhouse reports into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    /// Indoor climate detection node
    Dns,
    /// Soil chemistry detection node
    Dns2,
    /// Actuator control node
    Cns,
    /// Outdoor environment node
    Ens,
}

impl Dataset {
    pub const ALL: [Dataset; 4] = [Dataset::Dns, Dataset::Dns2, Dataset::Cns, Dataset::Ens];

    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Dns => "dns",
            Dataset::Dns2 => "dns2",
            Dataset::Cns => "cns",
            Dataset::Ens => "ens",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Dataset::Dns => "智慧农业大棚检测节点",
            Dataset::Dns2 => "智慧农业大棚检测节点_2",
            Dataset::Cns => "智慧农业大棚控制节点",
            Dataset::Ens => "智慧农业环境检测节点",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Dataset::Dns => DnsRecord::COLUMNS,
            Dataset::Dns2 => Dns2Record::COLUMNS,
            Dataset::Cns => CnsRecord::COLUMNS,
            Dataset::Ens => EnsRecord::COLUMNS,
        }
    }

    /// Columns that must be set for a row to count as a reading.
    /// The first one is the key column used for cleanup.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Dataset::Dns => &["室内温度"],
            Dataset::Dns2 => &["土壤导电率"],
            Dataset::Cns => &[
                "风扇状态",
                "风扇速度",
                "水泵状态",
                "水泵速度",
                "生长灯状态",
            ],
            Dataset::Ens => &["室外温度"],
        }
    }

    pub fn key_column(&self) -> &'static str {
        self.required_columns()[0]
    }

    /// Replacement values for null columns, [`REPORT_TIME`] falls back to now
    pub fn defaults(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Dataset::Dns => &[
                ("室内温度", "25.0"),
                ("室内湿度", "60.0"),
                ("光照强度", "500"),
                ("土壤湿度", "30.0"),
                ("挥发性有机化合物浓度", "0.0"),
                ("二氧化碳浓度", "400"),
                ("土壤温度", "20.0"),
            ],
            Dataset::Dns2 => &[
                ("土壤导电率", "0.5"),
                ("土壤PH值", "7.0"),
                ("土壤含氮量", "100"),
                ("土壤含钾量", "150"),
                ("土壤含磷量", "50"),
                ("土壤盐度", "3.0"),
                ("土壤总溶解固体", "200"),
                ("土壤肥力", "中等"),
            ],
            Dataset::Cns => &[
                ("风扇状态", "0"),
                ("生长灯状态", "0"),
                ("水泵状态", "0"),
                ("风扇速度", "0"),
                ("水泵速度", "0"),
            ],
            Dataset::Ens => &[
                ("室外温度", "20.0"),
                ("室外湿度", "50.0"),
                ("室外光照强度", "1000"),
                ("室外压强", "1013"),
                ("位置", "TRUE"),
                ("海拔高度", "50"),
            ],
        }
    }

    /// Mock row served when the database has nothing to offer,
    /// ordered like [`Dataset::columns`] without the report time
    fn fallback_values(&self) -> &'static [&'static str] {
        match self {
            Dataset::Dns => &[
                "1", "DNS_001", "26.5", "65.0", "850", "40.5", "0.2", "450", "22.0",
            ],
            Dataset::Dns2 => &[
                "1", "DNS2_001", "0.6", "6.8", "120", "160", "60", "3.2", "220", "良好",
            ],
            Dataset::Cns => &["1", "CNS_001", "0", "1", "0", "0", "0"],
            Dataset::Ens => &["1", "ENS_001", "22.5", "55.0", "1200", "1010", "TRUE", "48"],
        }
    }

    /// Row written by the mock data generator. Only the control node
    /// differs from the fallback row, it is seeded with every actuator off.
    fn seed_values(&self) -> &'static [&'static str] {
        match self {
            Dataset::Cns => &["1", "CNS_001", "0", "0", "0", "0", "0"],
            _ => self.fallback_values(),
        }
    }

    fn default_for(&self, column: &str, now: DateTime<Utc>) -> String {
        if column == REPORT_TIME {
            return report_time(now);
        }
        self.defaults()
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| (*value).to_owned())
            .unwrap_or_default()
    }

    fn with_report_time(values: &[&str], now: DateTime<Utc>) -> Vec<String> {
        let mut row: Vec<String> = values.iter().map(|v| (*v).to_owned()).collect();
        row.push(report_time(now));
        row
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dns" => Ok(Dataset::Dns),
            "dns2" => Ok(Dataset::Dns2),
            "cns" => Ok(Dataset::Cns),
            "ens" => Ok(Dataset::Ens),
            _ => Err(CoreError::UnknownDataset(s.to_owned())),
        }
    }
}

macro_rules! reading {
    ($(#[$meta:meta])* $name:ident { $($field:ident => $column:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
        pub struct $name {
            $(
                #[serde(rename = $column)]
                pub $field: String,
            )*
        }

        impl $name {
            pub const COLUMNS: &'static [&'static str] = &[$($column),*];

            fn from_values(values: Vec<String>) -> Self {
                let mut iter = values.into_iter();
                $name {
                    $($field: iter.next().unwrap_or_default(),)*
                }
            }

            pub fn values(&self) -> Vec<&str> {
                vec![$(self.$field.as_str(),)*]
            }
        }
    };
}

reading!(
    /// Row of `智慧农业大棚检测节点`
    DnsRecord {
        serial => "序号",
        device => "设备号",
        indoor_temperature => "室内温度",
        indoor_humidity => "室内湿度",
        light_intensity => "光照强度",
        soil_moisture => "土壤湿度",
        voc_concentration => "挥发性有机化合物浓度",
        co2_concentration => "二氧化碳浓度",
        soil_temperature => "土壤温度",
        reported_at => "上报时间",
    }
);

reading!(
    /// Row of `智慧农业大棚检测节点_2`
    Dns2Record {
        serial => "序号",
        device => "设备号",
        soil_conductivity => "土壤导电率",
        soil_ph => "土壤PH值",
        soil_nitrogen => "土壤含氮量",
        soil_potassium => "土壤含钾量",
        soil_phosphorus => "土壤含磷量",
        soil_salinity => "土壤盐度",
        soil_dissolved_solids => "土壤总溶解固体",
        soil_fertility => "土壤肥力",
        reported_at => "上报时间",
    }
);

reading!(
    /// Row of `智慧农业大棚控制节点`
    CnsRecord {
        serial => "序号",
        device => "设备号",
        fan_status => "风扇状态",
        light_status => "生长灯状态",
        pump_status => "水泵状态",
        fan_speed => "风扇速度",
        pump_speed => "水泵速度",
        reported_at => "上报时间",
    }
);

reading!(
    /// Row of `智慧农业环境检测节点`
    EnsRecord {
        serial => "序号",
        device => "设备号",
        outdoor_temperature => "室外温度",
        outdoor_humidity => "室外湿度",
        outdoor_light_intensity => "室外光照强度",
        outdoor_pressure => "室外压强",
        location => "位置",
        altitude => "海拔高度",
        reported_at => "上报时间",
    }
);

/// A single row of any of the four tables
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Dns(DnsRecord),
    Dns2(Dns2Record),
    Cns(CnsRecord),
    Ens(EnsRecord),
}

impl Record {
    fn from_values(dataset: Dataset, values: Vec<String>) -> Self {
        match dataset {
            Dataset::Dns => Record::Dns(DnsRecord::from_values(values)),
            Dataset::Dns2 => Record::Dns2(Dns2Record::from_values(values)),
            Dataset::Cns => Record::Cns(CnsRecord::from_values(values)),
            Dataset::Ens => Record::Ens(EnsRecord::from_values(values)),
        }
    }

    /// Builds a record from raw column values ordered like
    /// [`Dataset::columns`], null columns get the dataset defaults
    pub fn from_columns(
        dataset: Dataset,
        columns: Vec<Option<String>>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut raw = columns.into_iter();
        let values = dataset
            .columns()
            .iter()
            .map(|column| match raw.next().flatten() {
                Some(value) => value,
                None => dataset.default_for(column, now),
            })
            .collect();
        Record::from_values(dataset, values)
    }

    pub fn fallback(dataset: Dataset, now: DateTime<Utc>) -> Self {
        let values = Dataset::with_report_time(dataset.fallback_values(), now);
        Record::from_values(dataset, values)
    }

    pub fn seed(dataset: Dataset, now: DateTime<Utc>) -> Self {
        let values = Dataset::with_report_time(dataset.seed_values(), now);
        Record::from_values(dataset, values)
    }

    pub fn dataset(&self) -> Dataset {
        match self {
            Record::Dns(_) => Dataset::Dns,
            Record::Dns2(_) => Dataset::Dns2,
            Record::Cns(_) => Dataset::Cns,
            Record::Ens(_) => Dataset::Ens,
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            Record::Dns(r) => r.values(),
            Record::Dns2(r) => r.values(),
            Record::Cns(r) => r.values(),
            Record::Ens(r) => r.values(),
        }
    }

    /// Looks a value up by its column name
    pub fn get(&self, column: &str) -> Option<&str> {
        let columns = self.dataset().columns();
        columns
            .iter()
            .position(|c| *c == column)
            .and_then(|idx| self.values().get(idx).copied())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

/// Renders rows of one dataset as CSV with the column names as header
pub fn records_to_csv(dataset: Dataset, records: &[Record]) -> String {
    let mut rows = vec![dataset.columns().join(",")];
    for record in records.iter().filter(|r| r.dataset() == dataset) {
        let row: Vec<String> = record.values().iter().map(|v| csv_field(v)).collect();
        rows.push(row.join(","));
    }
    rows.join("\n")
}
