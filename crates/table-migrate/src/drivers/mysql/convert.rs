//! Conversion between mysql_async values and [`SqlValue`].
//!
//! Rows fetched over the text protocol arrive as raw bytes, so the column type
//! decides how they are parsed. Binary-protocol values are already typed.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::Value;

use crate::core::{Row, SqlValue};

/// Character set id MySQL reports for binary columns.
const BINARY_CHARSET: u16 = 63;

pub(super) fn row_from_mysql(row: mysql_async::Row) -> Row {
    let columns = row.columns();
    // Moves the values out; every column is still present here.
    let values = row.unwrap();
    columns
        .iter()
        .zip(values)
        .map(|(column, value)| {
            let converted = from_mysql(
                value,
                column.column_type(),
                column.flags(),
                column.character_set() == BINARY_CHARSET,
            );
            (column.name_str().into_owned(), converted)
        })
        .collect()
}

/// Convert one fetched value, using its column metadata.
pub fn from_mysql(
    value: Value,
    column_type: ColumnType,
    flags: ColumnFlags,
    binary: bool,
) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Int(v) => SqlValue::Int(v),
        Value::UInt(v) => SqlValue::UInt(v),
        Value::Float(v) => SqlValue::Float(v as f64),
        Value::Double(v) => SqlValue::Float(v),
        Value::Date(year, month, day, hour, minute, second, micros) => {
            let date_only = is_date_column(column_type);
            date_value(year, month, day, hour, minute, second, micros, date_only)
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => {
            time_value(negative, days, hours, minutes, seconds, micros)
        }
        Value::Bytes(bytes) => bytes_value(bytes, column_type, flags, binary),
    }
}

fn is_date_column(column_type: ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::MYSQL_TYPE_DATE | ColumnType::MYSQL_TYPE_NEWDATE
    )
}

#[allow(clippy::too_many_arguments)]
fn date_value(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    micros: u32,
    date_only: bool,
) -> SqlValue {
    let Some(date) = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32) else {
        // Zero dates have no chrono representation; keep MySQL's text form.
        return if date_only {
            SqlValue::Text(format!("{:04}-{:02}-{:02}", year, month, day))
        } else {
            SqlValue::Text(format!(
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ))
        };
    };
    if date_only {
        return SqlValue::Date(date);
    }
    match date.and_hms_micro_opt(hour as u32, minute as u32, second as u32, micros) {
        Some(datetime) => SqlValue::DateTime(datetime),
        None => SqlValue::Text(format!(
            "{} {:02}:{:02}:{:02}",
            date, hour, minute, second
        )),
    }
}

fn time_value(
    negative: bool,
    days: u32,
    hours: u8,
    minutes: u8,
    seconds: u8,
    micros: u32,
) -> SqlValue {
    if !negative && days == 0 {
        if let Some(time) =
            NaiveTime::from_hms_micro_opt(hours as u32, minutes as u32, seconds as u32, micros)
        {
            return SqlValue::Time(time);
        }
    }
    // TIME spans +/-838 hours, beyond what a time of day can hold.
    let total_hours = days * 24 + hours as u32;
    SqlValue::Text(format!(
        "{}{:02}:{:02}:{:02}",
        if negative { "-" } else { "" },
        total_hours,
        minutes,
        seconds
    ))
}

fn bytes_value(bytes: Vec<u8>, column_type: ColumnType, flags: ColumnFlags, binary: bool) -> SqlValue {
    use ColumnType::*;

    if binary && is_binary_type(column_type) {
        return SqlValue::Bytes(bytes);
    }
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => return SqlValue::Bytes(e.into_bytes()),
    };

    let parsed = match column_type {
        MYSQL_TYPE_TINY | MYSQL_TYPE_SHORT | MYSQL_TYPE_LONG | MYSQL_TYPE_INT24
        | MYSQL_TYPE_LONGLONG | MYSQL_TYPE_YEAR => {
            if flags.contains(ColumnFlags::UNSIGNED_FLAG) {
                text.parse().ok().map(SqlValue::UInt)
            } else {
                text.parse().ok().map(SqlValue::Int)
            }
        }
        MYSQL_TYPE_FLOAT | MYSQL_TYPE_DOUBLE => text.parse().ok().map(SqlValue::Float),
        MYSQL_TYPE_DATE | MYSQL_TYPE_NEWDATE => NaiveDate::parse_from_str(&text, "%Y-%m-%d")
            .ok()
            .map(SqlValue::Date),
        MYSQL_TYPE_DATETIME | MYSQL_TYPE_TIMESTAMP => {
            NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(SqlValue::DateTime)
        }
        MYSQL_TYPE_TIME => NaiveTime::parse_from_str(&text, "%H:%M:%S%.f")
            .ok()
            .map(SqlValue::Time),
        // DECIMAL stays textual to keep its exact digits
        _ => None,
    };

    parsed.unwrap_or(SqlValue::Text(text))
}

fn is_binary_type(column_type: ColumnType) -> bool {
    use ColumnType::*;
    matches!(
        column_type,
        MYSQL_TYPE_TINY_BLOB
            | MYSQL_TYPE_MEDIUM_BLOB
            | MYSQL_TYPE_LONG_BLOB
            | MYSQL_TYPE_BLOB
            | MYSQL_TYPE_STRING
            | MYSQL_TYPE_VAR_STRING
            | MYSQL_TYPE_VARCHAR
            | MYSQL_TYPE_GEOMETRY
            | MYSQL_TYPE_BIT
    )
}

/// Convert a value for use as a statement parameter.
pub fn to_mysql(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Bool(v) => Value::Int(*v as i64),
        SqlValue::Int(v) => Value::Int(*v),
        SqlValue::UInt(v) => Value::UInt(*v),
        SqlValue::Float(v) => Value::Double(*v),
        SqlValue::Text(v) => Value::Bytes(v.clone().into_bytes()),
        SqlValue::Bytes(v) => Value::Bytes(v.clone()),
        SqlValue::Date(d) => Value::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0),
        SqlValue::Time(t) => Value::Time(
            false,
            0,
            t.hour() as u8,
            t.minute() as u8,
            t.second() as u8,
            t.nanosecond() / 1000,
        ),
        SqlValue::DateTime(dt) => Value::Date(
            dt.year() as u16,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
            dt.nanosecond() / 1000,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(column_type: ColumnType, raw: &str) -> SqlValue {
        from_mysql(
            Value::Bytes(raw.as_bytes().to_vec()),
            column_type,
            ColumnFlags::empty(),
            false,
        )
    }

    #[test]
    fn test_text_protocol_integers() {
        assert_eq!(text(ColumnType::MYSQL_TYPE_LONGLONG, "42"), SqlValue::Int(42));
        assert_eq!(text(ColumnType::MYSQL_TYPE_TINY, "-1"), SqlValue::Int(-1));
        let unsigned = from_mysql(
            Value::Bytes(b"18446744073709551615".to_vec()),
            ColumnType::MYSQL_TYPE_LONGLONG,
            ColumnFlags::UNSIGNED_FLAG,
            false,
        );
        assert_eq!(unsigned, SqlValue::UInt(u64::MAX));
    }

    #[test]
    fn test_text_protocol_decimal_stays_text() {
        assert_eq!(
            text(ColumnType::MYSQL_TYPE_NEWDECIMAL, "100.00"),
            SqlValue::Text("100.00".to_string())
        );
    }

    #[test]
    fn test_text_protocol_dates() {
        assert_eq!(
            text(ColumnType::MYSQL_TYPE_DATE, "2024-03-01"),
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(
            text(ColumnType::MYSQL_TYPE_DATETIME, "2024-03-01 08:30:00"),
            SqlValue::DateTime(expected)
        );
        assert_eq!(
            text(ColumnType::MYSQL_TYPE_TIMESTAMP, "0000-00-00 00:00:00"),
            SqlValue::Text("0000-00-00 00:00:00".to_string())
        );
    }

    #[test]
    fn test_binary_zero_date_becomes_text() {
        let value = from_mysql(
            Value::Date(0, 0, 0, 0, 0, 0, 0),
            ColumnType::MYSQL_TYPE_DATETIME,
            ColumnFlags::empty(),
            false,
        );
        assert_eq!(value, SqlValue::Text("0000-00-00 00:00:00".to_string()));
    }

    #[test]
    fn test_binary_date_column() {
        let value = from_mysql(
            Value::Date(2023, 12, 31, 0, 0, 0, 0),
            ColumnType::MYSQL_TYPE_DATE,
            ColumnFlags::empty(),
            false,
        );
        assert_eq!(
            value,
            SqlValue::Date(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap())
        );
    }

    #[test]
    fn test_long_time_becomes_text() {
        let value = from_mysql(
            Value::Time(true, 2, 3, 4, 5, 0),
            ColumnType::MYSQL_TYPE_TIME,
            ColumnFlags::empty(),
            false,
        );
        assert_eq!(value, SqlValue::Text("-51:04:05".to_string()));
    }

    #[test]
    fn test_binary_blob_kept_as_bytes() {
        let value = from_mysql(
            Value::Bytes(vec![0xff, 0x00]),
            ColumnType::MYSQL_TYPE_BLOB,
            ColumnFlags::BINARY_FLAG,
            true,
        );
        assert_eq!(value, SqlValue::Bytes(vec![0xff, 0x00]));
    }

    #[test]
    fn test_to_mysql() {
        assert_eq!(to_mysql(&SqlValue::Null), Value::NULL);
        assert_eq!(to_mysql(&SqlValue::Bool(true)), Value::Int(1));
        assert_eq!(
            to_mysql(&SqlValue::from("active")),
            Value::Bytes(b"active".to_vec())
        );
        let dt = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_micro_opt(3, 4, 5, 6)
            .unwrap();
        assert_eq!(
            to_mysql(&SqlValue::DateTime(dt)),
            Value::Date(2024, 1, 2, 3, 4, 5, 6)
        );
    }
}
