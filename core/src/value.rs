use crate::error::CoreError;
use chrono::{DateTime, TimeZone, Utc};

/// Format of every `上报时间` column and of exported log timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders a report time the way the sensor nodes store it
pub fn report_time(now: DateTime<Utc>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

pub fn local_time<T>(time: DateTime<Utc>, tz: &T) -> String
where
    T: TimeZone,
    T::Offset: std::fmt::Display,
{
    time.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string()
}

/// Actuator columns hold either `0`/`1` or a `TRUE`/`FALSE` literal
pub fn parse_switch(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed == "1" || trimmed.eq_ignore_ascii_case("true")
}

pub fn parse_number(field: &str, value: &str) -> Result<f64, CoreError> {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(CoreError::InvalidValue(field.to_owned(), value.to_owned())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_switch() {
        assert!(parse_switch("1"));
        assert!(parse_switch("TRUE"));
        assert!(parse_switch("true"));
        assert!(parse_switch(" True "));
        assert!(!parse_switch("0"));
        assert!(!parse_switch("FALSE"));
        assert!(!parse_switch(""));
        assert!(!parse_switch("2"));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("室内温度", "26.5").unwrap(), 26.5);
        assert_eq!(parse_number("光照强度", " 850 ").unwrap(), 850.0);
        assert!(parse_number("室内温度", "").is_err());
        assert!(parse_number("室内温度", "abc").is_err());
        assert!(parse_number("室内温度", "NaN").is_err());
    }

    #[test]
    fn test_report_time() {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(report_time(time), "2024-03-09 07:05:01");
        assert_eq!(
            local_time(time, &chrono_tz::Asia::Shanghai),
            "2024-03-09 15:05:01"
        );
    }
}
