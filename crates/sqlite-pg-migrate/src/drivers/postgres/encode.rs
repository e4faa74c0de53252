//! Binary encoding of source values into PostgreSQL parameters.
//!
//! SQLite values carry only a storage class. PostgreSQL infers the type of
//! every `$n` placeholder in an INSERT from its target column, so the value
//! is converted here, at bind time, into whatever that column expects.

use std::error::Error;
use std::str::FromStr;

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use postgres_types::{to_sql_checked, IsNull, Kind, ToSql, Type};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::value::SqlValue;

type EncodeResult = std::result::Result<IsNull, Box<dyn Error + Sync + Send>>;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> EncodeResult {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Integer(v) => encode_integer(*v, ty, out),
            SqlValue::Real(v) => encode_real(*v, ty, out),
            SqlValue::Text(s) => encode_text(s, ty, out),
            SqlValue::Blob(b) => encode_blob(b, ty, out),
        }
    }

    // Conversion failures surface per value from to_sql
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn is_text(ty: &Type) -> bool {
    *ty == Type::TEXT
        || *ty == Type::VARCHAR
        || *ty == Type::BPCHAR
        || *ty == Type::NAME
        || *ty == Type::UNKNOWN
}

fn is_enum(ty: &Type) -> bool {
    matches!(ty.kind(), Kind::Enum(_))
}

fn unsupported(value: &SqlValue, ty: &Type) -> EncodeResult {
    Err(format!(
        "cannot store {} value into a column of type {}",
        value.type_name(),
        ty
    )
    .into())
}

fn encode_integer(v: i64, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    if *ty == Type::INT8 {
        v.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::INT2 {
        i16::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::BOOL {
        (v != 0).to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        (v as f64).to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        (v as f32).to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::from(v).to_sql(ty, out)
    } else if *ty == Type::TIMESTAMPTZ {
        epoch_seconds(v)?.to_sql(ty, out)
    } else if *ty == Type::TIMESTAMP {
        epoch_seconds(v)?.naive_utc().to_sql(ty, out)
    } else if is_text(ty) {
        v.to_string().to_sql(ty, out)
    } else {
        unsupported(&SqlValue::Integer(v), ty)
    }
}

fn encode_real(v: f64, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    if *ty == Type::FLOAT8 {
        v.to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        (v as f32).to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::try_from(v)?.to_sql(ty, out)
    } else if (*ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8)
        && v.fract() == 0.0
        && v >= i64::MIN as f64
        && v <= i64::MAX as f64
    {
        encode_integer(v as i64, ty, out)
    } else if is_text(ty) {
        v.to_string().to_sql(ty, out)
    } else {
        unsupported(&SqlValue::Real(v), ty)
    }
}

fn encode_text(s: &str, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    if is_text(ty) {
        return s.to_sql(ty, out);
    }
    if is_enum(ty) {
        // Enum labels travel as their text in binary format too
        out.extend_from_slice(s.as_bytes());
        return Ok(IsNull::No);
    }

    let t = s.trim();
    if *ty == Type::BOOL {
        parse_bool(t)
            .ok_or_else(|| format!("invalid boolean '{}'", s))?
            .to_sql(ty, out)
    } else if *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8 {
        encode_integer(t.parse::<i64>()?, ty, out)
    } else if *ty == Type::FLOAT4 || *ty == Type::FLOAT8 {
        encode_real(t.parse::<f64>()?, ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::from_str(t)
            .or_else(|_| Decimal::from_scientific(t))?
            .to_sql(ty, out)
    } else if *ty == Type::DATE {
        parse_date(t)?.to_sql(ty, out)
    } else if *ty == Type::TIME {
        parse_time(t)?.to_sql(ty, out)
    } else if *ty == Type::TIMESTAMP {
        parse_timestamp(t)?.to_sql(ty, out)
    } else if *ty == Type::TIMESTAMPTZ {
        parse_timestamptz(t)?.to_sql(ty, out)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out)
    } else if *ty == Type::UUID {
        Uuid::parse_str(t)?.to_sql(ty, out)
    } else if *ty == Type::BYTEA {
        s.as_bytes().to_sql(ty, out)
    } else {
        unsupported(&SqlValue::Text(s.to_string()), ty)
    }
}

fn encode_blob(b: &[u8], ty: &Type, out: &mut BytesMut) -> EncodeResult {
    if *ty == Type::BYTEA {
        b.to_sql(ty, out)
    } else if *ty == Type::UUID && b.len() == 16 {
        Uuid::from_slice(b)?.to_sql(ty, out)
    } else if is_text(ty) || is_enum(ty) || *ty == Type::JSON || *ty == Type::JSONB {
        encode_text(std::str::from_utf8(b)?, ty, out)
    } else {
        unsupported(&SqlValue::Blob(b.to_vec()), ty)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "n" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn epoch_seconds(v: i64) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::from_timestamp(v, 0).ok_or_else(|| format!("timestamp {} out of range", v))
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    // Datetime text keeps only its date part
    let date = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
}

fn parse_time(s: &str) -> std::result::Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f").or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
}

fn parse_timestamp(s: &str) -> std::result::Result<NaiveDateTime, String> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| format!("invalid timestamp '{}'", s))
}

fn parse_timestamptz(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.with_timezone(&Utc));
    }
    // Naive text is taken as UTC
    parse_timestamp(s).map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: SqlValue, ty: &Type) -> std::result::Result<BytesMut, String> {
        let mut out = BytesMut::new();
        match value.to_sql(ty, &mut out) {
            Ok(IsNull::No) => Ok(out),
            Ok(IsNull::Yes) => Ok(BytesMut::new()),
            Err(e) => Err(e.to_string()),
        }
    }

    fn expected<T: ToSql>(value: T, ty: &Type) -> BytesMut {
        let mut out = BytesMut::new();
        value.to_sql(ty, &mut out).unwrap();
        out
    }

    #[test]
    fn test_null_is_null_for_any_type() {
        let mut out = BytesMut::new();
        let is_null = SqlValue::Null.to_sql(&Type::INT4, &mut out).unwrap();
        assert!(matches!(is_null, IsNull::Yes));
        assert!(SqlValue::accepts(&Type::JSONB));
    }

    #[test]
    fn test_integer_narrows_to_column_width() {
        assert_eq!(
            encode(SqlValue::Integer(42), &Type::INT4).unwrap(),
            expected(42i32, &Type::INT4)
        );
        assert_eq!(
            encode(SqlValue::Integer(7), &Type::INT2).unwrap(),
            expected(7i16, &Type::INT2)
        );
        assert!(encode(SqlValue::Integer(i64::MAX), &Type::INT4).is_err());
    }

    #[test]
    fn test_integer_into_bool_and_numeric() {
        assert_eq!(
            encode(SqlValue::Integer(1), &Type::BOOL).unwrap(),
            expected(true, &Type::BOOL)
        );
        assert_eq!(
            encode(SqlValue::Integer(0), &Type::BOOL).unwrap(),
            expected(false, &Type::BOOL)
        );
        assert_eq!(
            encode(SqlValue::Integer(15), &Type::NUMERIC).unwrap(),
            expected(Decimal::from(15), &Type::NUMERIC)
        );
    }

    #[test]
    fn test_real_into_numeric_and_integral_int() {
        assert_eq!(
            encode(SqlValue::Real(12.5), &Type::NUMERIC).unwrap(),
            expected(Decimal::from_str("12.5").unwrap(), &Type::NUMERIC)
        );
        assert_eq!(
            encode(SqlValue::Real(3.0), &Type::INT8).unwrap(),
            expected(3i64, &Type::INT8)
        );
        assert!(encode(SqlValue::Real(3.5), &Type::INT8).is_err());
    }

    #[test]
    fn test_text_parsed_into_typed_columns() {
        assert_eq!(
            encode(SqlValue::from("true"), &Type::BOOL).unwrap(),
            expected(true, &Type::BOOL)
        );
        assert_eq!(
            encode(SqlValue::from(" 99 "), &Type::INT4).unwrap(),
            expected(99i32, &Type::INT4)
        );
        assert_eq!(
            encode(SqlValue::from("2024-03-01 10:15:30"), &Type::TIMESTAMP).unwrap(),
            expected(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(10, 15, 30)
                    .unwrap(),
                &Type::TIMESTAMP
            )
        );
        assert_eq!(
            encode(SqlValue::from("2024-03-01"), &Type::DATE).unwrap(),
            expected(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), &Type::DATE)
        );
        assert!(encode(SqlValue::from(r#"{"a": 1}"#), &Type::JSONB).is_ok());
        assert!(encode(SqlValue::from("not a number"), &Type::INT8).is_err());
    }

    #[test]
    fn test_naive_timestamptz_taken_as_utc() {
        let naive = encode(SqlValue::from("2024-03-01 10:15:30"), &Type::TIMESTAMPTZ).unwrap();
        let zoned = encode(
            SqlValue::from("2024-03-01T10:15:30+00:00"),
            &Type::TIMESTAMPTZ,
        )
        .unwrap();
        assert_eq!(naive, zoned);
    }

    #[test]
    fn test_text_column_takes_text_as_is() {
        assert_eq!(
            encode(SqlValue::from("flour"), &Type::VARCHAR).unwrap(),
            expected("flour", &Type::VARCHAR)
        );
        assert_eq!(
            encode(SqlValue::Integer(5), &Type::TEXT).unwrap(),
            expected("5", &Type::TEXT)
        );
    }

    #[test]
    fn test_blob_into_bytea_and_uuid() {
        assert_eq!(
            encode(SqlValue::Blob(vec![1, 2, 3]), &Type::BYTEA).unwrap(),
            expected(&[1u8, 2, 3][..], &Type::BYTEA)
        );
        let id = Uuid::new_v4();
        assert_eq!(
            encode(SqlValue::Blob(id.as_bytes().to_vec()), &Type::UUID).unwrap(),
            expected(id, &Type::UUID)
        );
    }

    #[test]
    fn test_unsupported_combination_is_error() {
        let err = encode(SqlValue::Blob(vec![0]), &Type::INT4).unwrap_err();
        assert!(err.contains("blob"), "{}", err);
    }
}
