//! PostgreSQL type mappings.
//!
//! This module converts result rows into JSON objects.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Category decoders handle the actual value extraction
//!
//! Domains are classified by their base type and enums decode as text. Any
//! other type without a dedicated decoder is returned as base64 of its binary
//! wire form.

use crate::models::FieldInfo;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::types::{Oid, PgInterval, PgMoney, PgTimeTz};
use sqlx::postgres::{
    PgArgumentBuffer, PgColumn, PgHasArrayType, PgRow, PgTypeInfo, PgTypeKind, PgValueFormat,
    PgValueRef,
};
use sqlx::types::ipnet::IpNet;
use sqlx::{Column, Decode, Encode, Postgres, Row, Type, TypeInfo, ValueRef};
use std::fmt::Write as _;

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for PostgreSQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric,
    Boolean,
    Text,
    Binary,
    Json,
    Uuid,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    TimeTz,
    Interval,
    Inet,
    Cidr,
    Money,
    SmallIntArray,
    IntArray,
    BigIntArray,
    RealArray,
    DoubleArray,
    NumericArray,
    TextArray,
    BoolArray,
    UuidArray,
    DateArray,
    TimestampTzArray,
    Unknown,
}

/// Classify a PostgreSQL type name (as reported by sqlx, e.g. `INT4`) into a category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    match type_name.to_uppercase().as_str() {
        "INT2" => TypeCategory::SmallInt,
        "INT4" => TypeCategory::Integer,
        "INT8" | "OID" => TypeCategory::BigInt,
        "FLOAT4" => TypeCategory::Real,
        "FLOAT8" => TypeCategory::Double,
        "NUMERIC" => TypeCategory::Numeric,
        "BOOL" => TypeCategory::Boolean,
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" | "CITEXT" | "XML" | "UNKNOWN" => {
            TypeCategory::Text
        }
        "BYTEA" => TypeCategory::Binary,
        "JSON" | "JSONB" => TypeCategory::Json,
        "UUID" => TypeCategory::Uuid,
        "TIMESTAMP" => TypeCategory::Timestamp,
        "TIMESTAMPTZ" => TypeCategory::TimestampTz,
        "DATE" => TypeCategory::Date,
        "TIME" => TypeCategory::Time,
        "TIMETZ" => TypeCategory::TimeTz,
        "INTERVAL" => TypeCategory::Interval,
        "INET" => TypeCategory::Inet,
        "CIDR" => TypeCategory::Cidr,
        "MONEY" => TypeCategory::Money,
        "INT2[]" => TypeCategory::SmallIntArray,
        "INT4[]" => TypeCategory::IntArray,
        "INT8[]" => TypeCategory::BigIntArray,
        "FLOAT4[]" => TypeCategory::RealArray,
        "FLOAT8[]" => TypeCategory::DoubleArray,
        "NUMERIC[]" => TypeCategory::NumericArray,
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "CHAR[]" | "NAME[]" | "CITEXT[]" => {
            TypeCategory::TextArray
        }
        "BOOL[]" => TypeCategory::BoolArray,
        "UUID[]" => TypeCategory::UuidArray,
        "DATE[]" => TypeCategory::DateArray,
        "TIMESTAMPTZ[]" => TypeCategory::TimestampTzArray,
        _ => TypeCategory::Unknown,
    }
}

/// Follow a domain down to the type it is declared over.
pub(crate) fn base_type(ty: &PgTypeInfo) -> &PgTypeInfo {
    match ty.kind() {
        PgTypeKind::Domain(inner) => base_type(inner),
        _ => ty,
    }
}

/// Classify a column type, resolving domains and treating enums as text.
pub fn column_category(ty: &PgTypeInfo) -> TypeCategory {
    let ty = base_type(ty);
    if matches!(ty.kind(), PgTypeKind::Enum(_)) {
        return TypeCategory::Text;
    }
    categorize_type(ty.name())
}

/// Describe a column for the `fields` list of a query result.
pub fn field_info(column: &PgColumn) -> FieldInfo {
    let type_info = column.type_info();
    FieldInfo::new(
        column.name(),
        type_info.name(),
        type_info.oid().map(|oid| oid.0),
    )
}

// =============================================================================
// Numeric Support
// =============================================================================

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;
const NUMERIC_OID: Oid = Oid(1700);
const NUMERIC_ARRAY_OID: Oid = Oid(1231);
const NUMERIC_MAX_SCALE: usize = 16383;
const NUMERIC_MAX_EXPONENT: i64 = 131072;

/// NUMERIC value rendered as its exact decimal string.
///
/// Rendered as a string so precision beyond `f64` survives the trip to JSON.
#[derive(Debug)]
pub struct RawNumeric(pub String);

impl Type<Postgres> for RawNumeric {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(NUMERIC_OID)
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        ty.name().eq_ignore_ascii_case("numeric")
    }
}

impl PgHasArrayType for RawNumeric {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(NUMERIC_ARRAY_OID)
    }

    fn array_compatible(ty: &PgTypeInfo) -> bool {
        ty.name().eq_ignore_ascii_case("numeric[]")
    }
}

impl Encode<'_, Postgres> for RawNumeric {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        buf.extend_from_slice(&encode_numeric(&self.0)?);
        Ok(IsNull::No)
    }
}

impl<'r> Decode<'r, Postgres> for RawNumeric {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        match value.format() {
            PgValueFormat::Text => Ok(RawNumeric(value.as_str()?.to_string())),
            PgValueFormat::Binary => Ok(RawNumeric(format_numeric(value.as_bytes()?)?)),
        }
    }
}

/// Render the binary `numeric` wire format as a decimal string.
///
/// Layout: `ndigits`, `weight`, `sign`, `dscale` (all 16-bit big endian),
/// followed by `ndigits` base-10000 digits, most significant first.
pub fn format_numeric(buf: &[u8]) -> Result<String, String> {
    if buf.len() < 8 {
        return Err(format!("numeric header too short: {} bytes", buf.len()));
    }
    let read_u16 = |at: usize| u16::from_be_bytes([buf[at], buf[at + 1]]);

    let ndigits = read_u16(0) as usize;
    let weight = read_u16(2) as i16 as i32;
    let sign = read_u16(4);
    let dscale = read_u16(6) as usize;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        _ => {}
    }

    if buf.len() < 8 + ndigits * 2 {
        return Err(format!(
            "numeric body truncated: expected {} digits, got {} bytes",
            ndigits,
            buf.len() - 8
        ));
    }
    let digits: Vec<i32> = (0..ndigits).map(|i| read_u16(8 + i * 2) as i32).collect();
    let digit_at = |pos: i32| -> i32 {
        if pos < 0 {
            0
        } else {
            digits.get(pos as usize).copied().unwrap_or(0)
        }
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG && digits.iter().any(|d| *d != 0) {
        out.push('-');
    }

    if weight >= 0 {
        for pos in 0..=weight {
            let digit = digit_at(pos);
            if pos == 0 {
                let _ = write!(out, "{}", digit);
            } else {
                let _ = write!(out, "{:04}", digit);
            }
        }
    } else {
        out.push('0');
    }

    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut pos = weight + 1;
        while frac.len() < dscale {
            let _ = write!(frac, "{:04}", digit_at(pos));
            pos += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }

    Ok(out)
}

fn numeric_header(ndigits: u16, weight: i16, sign: u16, dscale: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + ndigits as usize * 2);
    buf.extend_from_slice(&ndigits.to_be_bytes());
    buf.extend_from_slice(&weight.to_be_bytes());
    buf.extend_from_slice(&sign.to_be_bytes());
    buf.extend_from_slice(&dscale.to_be_bytes());
    buf
}

/// Encode a decimal string (`-12.5`, `1e3`, `NaN`, `Infinity`) in the binary
/// `numeric` wire format read by [`format_numeric`].
pub fn encode_numeric(text: &str) -> Result<Vec<u8>, String> {
    let s = text.trim();
    match s.to_ascii_lowercase().as_str() {
        "nan" => return Ok(numeric_header(0, 0, NUMERIC_NAN, 0)),
        "infinity" | "+infinity" | "inf" | "+inf" => {
            return Ok(numeric_header(0, 0, NUMERIC_PINF, 0));
        }
        "-infinity" | "-inf" => return Ok(numeric_header(0, 0, NUMERIC_NINF, 0)),
        _ => {}
    }

    let invalid = || format!("invalid numeric value {:?}", text);
    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(at) => {
            let exponent: i64 = unsigned[at + 1..].parse().map_err(|_| invalid())?;
            (&unsigned[..at], exponent)
        }
        None => (unsigned, 0),
    };
    if exponent.abs() > NUMERIC_MAX_EXPONENT {
        return Err(invalid());
    }
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if (int_part.is_empty() && frac_part.is_empty())
        || !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    // value = digits * 10^-scale
    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes())
        .map(|b| b - b'0')
        .collect();
    let mut scale = frac_part.len() as i64 - exponent;
    if scale < 0 {
        digits.resize(digits.len() + (-scale) as usize, 0);
        scale = 0;
    }
    let scale = scale as usize;
    if scale > NUMERIC_MAX_SCALE {
        return Err(format!("numeric scale {} is out of range", scale));
    }
    if digits.len() < scale {
        let mut padded = vec![0; scale - digits.len()];
        padded.append(&mut digits);
        digits = padded;
    }

    let (int_digits, frac_digits) = digits.split_at(digits.len() - scale);
    let mut padded = vec![0u8; (4 - int_digits.len() % 4) % 4];
    padded.extend_from_slice(int_digits);
    let int_groups = padded.len() / 4;
    padded.extend_from_slice(frac_digits);
    padded.resize(padded.len() + (4 - frac_digits.len() % 4) % 4, 0);

    let mut groups: Vec<u16> = padded
        .chunks(4)
        .map(|chunk| chunk.iter().fold(0u16, |acc, d| acc * 10 + *d as u16))
        .collect();
    let leading = groups.iter().take_while(|g| **g == 0).count();
    groups.drain(..leading);
    while groups.last() == Some(&0) {
        groups.pop();
    }

    let weight = if groups.is_empty() {
        0
    } else {
        int_groups as i64 - 1 - leading as i64
    };
    let weight = i16::try_from(weight).map_err(|_| invalid())?;
    let ndigits = u16::try_from(groups.len()).map_err(|_| invalid())?;
    let sign = if negative && !groups.is_empty() {
        NUMERIC_NEG
    } else {
        NUMERIC_POS
    };

    let mut buf = numeric_header(ndigits, weight, sign, scale as u16);
    for group in groups {
        buf.extend_from_slice(&group.to_be_bytes());
    }
    Ok(buf)
}

// =============================================================================
// Other Formats
// =============================================================================

/// Render a network address the way PostgreSQL prints it: `inet` drops a
/// full-length prefix, `cidr` always keeps it.
pub fn format_inet(net: IpNet, always_prefix: bool) -> String {
    if !always_prefix && net.prefix_len() == net.max_prefix_len() {
        net.addr().to_string()
    } else {
        net.to_string()
    }
}

/// Render `money` with two fractional digits.
pub fn format_money(raw: i64) -> String {
    let sign = if raw < 0 { "-" } else { "" };
    let abs = (raw as i128).abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

// =============================================================================
// Row to JSON
// =============================================================================

/// Trait for converting database rows to JSON maps.
pub trait RowToJson {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue>;
}

impl RowToJson for PgRow {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = column_category(col.type_info());
                (col.name().to_string(), decode_column(self, idx, category))
            })
            .collect()
    }
}

fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> JsonValue {
    match category {
        TypeCategory::SmallInt => get::<i16>(row, idx).map_or(JsonValue::Null, Into::into),
        TypeCategory::Integer => get::<i32>(row, idx).map_or(JsonValue::Null, Into::into),
        TypeCategory::BigInt => get::<i64>(row, idx).map_or(JsonValue::Null, Into::into),
        TypeCategory::Real => {
            get::<f32>(row, idx).map_or(JsonValue::Null, |v| float_value(v as f64))
        }
        TypeCategory::Double => get::<f64>(row, idx).map_or(JsonValue::Null, float_value),
        TypeCategory::Numeric => {
            get::<RawNumeric>(row, idx).map_or(JsonValue::Null, |v| JsonValue::String(v.0))
        }
        TypeCategory::Boolean => get::<bool>(row, idx).map_or(JsonValue::Null, JsonValue::Bool),
        TypeCategory::Text => get::<String>(row, idx).map_or(JsonValue::Null, JsonValue::String),
        TypeCategory::Binary => get::<Vec<u8>>(row, idx).map_or(JsonValue::Null, |v| {
            JsonValue::String(STANDARD.encode(v))
        }),
        TypeCategory::Json => get::<JsonValue>(row, idx).unwrap_or(JsonValue::Null),
        TypeCategory::Uuid => get::<uuid::Uuid>(row, idx)
            .map_or(JsonValue::Null, |v| JsonValue::String(v.to_string())),
        TypeCategory::Timestamp => get::<NaiveDateTime>(row, idx).map_or(JsonValue::Null, |v| {
            JsonValue::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }),
        TypeCategory::TimestampTz => get::<DateTime<Utc>>(row, idx)
            .map_or(JsonValue::Null, |v| JsonValue::String(v.to_rfc3339())),
        TypeCategory::Date => get::<NaiveDate>(row, idx)
            .map_or(JsonValue::Null, |v| JsonValue::String(v.to_string())),
        TypeCategory::Time => get::<NaiveTime>(row, idx)
            .map_or(JsonValue::Null, |v| JsonValue::String(v.to_string())),
        TypeCategory::TimeTz => get::<PgTimeTz<NaiveTime, FixedOffset>>(row, idx)
            .map_or(JsonValue::Null, |v| {
                JsonValue::String(format!("{}{}", v.time, v.offset))
            }),
        TypeCategory::Interval => get::<PgInterval>(row, idx).map_or(JsonValue::Null, |v| {
            serde_json::json!({
                "months": v.months,
                "days": v.days,
                "microseconds": v.microseconds,
            })
        }),
        TypeCategory::Inet => get::<IpNet>(row, idx)
            .map_or(JsonValue::Null, |v| JsonValue::String(format_inet(v, false))),
        TypeCategory::Cidr => get::<IpNet>(row, idx)
            .map_or(JsonValue::Null, |v| JsonValue::String(format_inet(v, true))),
        TypeCategory::Money => get::<PgMoney>(row, idx)
            .map_or(JsonValue::Null, |v| JsonValue::String(format_money(v.0))),
        TypeCategory::SmallIntArray => get::<Vec<Option<i16>>>(row, idx)
            .map_or(JsonValue::Null, |v| serde_json::json!(v)),
        TypeCategory::IntArray => get::<Vec<Option<i32>>>(row, idx)
            .map_or(JsonValue::Null, |v| serde_json::json!(v)),
        TypeCategory::BigIntArray => get::<Vec<Option<i64>>>(row, idx)
            .map_or(JsonValue::Null, |v| serde_json::json!(v)),
        TypeCategory::RealArray => get::<Vec<Option<f32>>>(row, idx).map_or(JsonValue::Null, |v| {
            array_of(v, |x| float_value(x as f64))
        }),
        TypeCategory::DoubleArray => {
            get::<Vec<Option<f64>>>(row, idx).map_or(JsonValue::Null, |v| array_of(v, float_value))
        }
        TypeCategory::NumericArray => get::<Vec<Option<RawNumeric>>>(row, idx)
            .map_or(JsonValue::Null, |v| array_of(v, |x| JsonValue::String(x.0))),
        TypeCategory::TextArray => get::<Vec<Option<String>>>(row, idx)
            .map_or(JsonValue::Null, |v| serde_json::json!(v)),
        TypeCategory::BoolArray => get::<Vec<Option<bool>>>(row, idx)
            .map_or(JsonValue::Null, |v| serde_json::json!(v)),
        TypeCategory::UuidArray => get::<Vec<Option<uuid::Uuid>>>(row, idx)
            .map_or(JsonValue::Null, |v| {
                array_of(v, |x| JsonValue::String(x.to_string()))
            }),
        TypeCategory::DateArray => get::<Vec<Option<NaiveDate>>>(row, idx)
            .map_or(JsonValue::Null, |v| {
                array_of(v, |x| JsonValue::String(x.to_string()))
            }),
        TypeCategory::TimestampTzArray => get::<Vec<Option<DateTime<Utc>>>>(row, idx)
            .map_or(JsonValue::Null, |v| {
                array_of(v, |x| JsonValue::String(x.to_rfc3339()))
            }),
        TypeCategory::Unknown => decode_opaque(row, idx),
    }
}

fn array_of<T>(items: Vec<Option<T>>, render: impl Fn(T) -> JsonValue) -> JsonValue {
    JsonValue::Array(
        items
            .into_iter()
            .map(|item| item.map_or(JsonValue::Null, &render))
            .collect(),
    )
}

/// Decode a nullable column. Decode failures are logged and become NULL.
///
/// The category already pins the Rust type, so the driver's type check is
/// skipped; this also lets domain columns decode as their base type.
fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    match row.try_get_unchecked::<Option<T>, _>(idx) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(column = idx, error = %e, "Failed to decode column");
            None
        }
    }
}

fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

fn decode_opaque(row: &PgRow, idx: usize) -> JsonValue {
    match row.try_get_raw(idx) {
        Ok(value) if value.is_null() => JsonValue::Null,
        Ok(value) => match value.as_bytes() {
            Ok(bytes) => JsonValue::String(STANDARD.encode(bytes)),
            Err(e) => {
                tracing::error!(column = idx, error = %e, "Failed to read raw column value");
                JsonValue::Null
            }
        },
        Err(e) => {
            tracing::error!(column = idx, error = %e, "Failed to access column");
            JsonValue::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_bytes(weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(digits.len() as u16).to_be_bytes());
        buf.extend_from_slice(&weight.to_be_bytes());
        buf.extend_from_slice(&sign.to_be_bytes());
        buf.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            buf.extend_from_slice(&d.to_be_bytes());
        }
        buf
    }

    #[test]
    fn test_categorize_type() {
        assert_eq!(categorize_type("INT4"), TypeCategory::Integer);
        assert_eq!(categorize_type("int8"), TypeCategory::BigInt);
        assert_eq!(categorize_type("NUMERIC"), TypeCategory::Numeric);
        assert_eq!(categorize_type("JSONB"), TypeCategory::Json);
        assert_eq!(categorize_type("TIMESTAMPTZ"), TypeCategory::TimestampTz);
        assert_eq!(categorize_type("VARCHAR"), TypeCategory::Text);
        assert_eq!(categorize_type("TEXT[]"), TypeCategory::TextArray);
        assert_eq!(categorize_type("mood"), TypeCategory::Unknown);
    }

    #[test]
    fn test_format_numeric_fraction() {
        let buf = numeric_bytes(0, 0, 2, &[123, 4500]);
        assert_eq!(format_numeric(&buf).unwrap(), "123.45");
    }

    #[test]
    fn test_format_numeric_multi_group_integer() {
        let buf = numeric_bytes(1, 0, 1, &[1234, 5678, 9000]);
        assert_eq!(format_numeric(&buf).unwrap(), "12345678.9");

        let buf = numeric_bytes(1, 0, 0, &[1]);
        assert_eq!(format_numeric(&buf).unwrap(), "10000");
    }

    #[test]
    fn test_format_numeric_negative_small() {
        let buf = numeric_bytes(-1, NUMERIC_NEG, 1, &[5000]);
        assert_eq!(format_numeric(&buf).unwrap(), "-0.5");

        let buf = numeric_bytes(-2, 0, 8, &[123]);
        assert_eq!(format_numeric(&buf).unwrap(), "0.00000123");
    }

    #[test]
    fn test_format_numeric_zero_keeps_scale() {
        assert_eq!(format_numeric(&numeric_bytes(0, 0, 0, &[])).unwrap(), "0");
        assert_eq!(format_numeric(&numeric_bytes(0, 0, 2, &[])).unwrap(), "0.00");
    }

    #[test]
    fn test_format_numeric_special_values() {
        assert_eq!(format_numeric(&numeric_bytes(0, NUMERIC_NAN, 0, &[])).unwrap(), "NaN");
        assert_eq!(
            format_numeric(&numeric_bytes(0, NUMERIC_NINF, 0, &[])).unwrap(),
            "-Infinity"
        );
    }

    #[test]
    fn test_format_numeric_truncated_input() {
        assert!(format_numeric(&[0, 1]).is_err());
        let mut buf = numeric_bytes(0, 0, 0, &[1, 2]);
        buf.truncate(10);
        assert!(format_numeric(&buf).is_err());
    }

    #[test]
    fn test_encode_numeric_matches_wire_layout() {
        assert_eq!(encode_numeric("123.45").unwrap(), numeric_bytes(0, 0, 2, &[123, 4500]));
        assert_eq!(encode_numeric("-0.5").unwrap(), numeric_bytes(-1, NUMERIC_NEG, 1, &[5000]));
        assert_eq!(encode_numeric("0.00000123").unwrap(), numeric_bytes(-2, 0, 8, &[123]));
        assert_eq!(encode_numeric("10000").unwrap(), numeric_bytes(1, 0, 0, &[1]));
        assert_eq!(encode_numeric("1.5e3").unwrap(), numeric_bytes(0, 0, 0, &[1500]));
        assert_eq!(encode_numeric(".5").unwrap(), numeric_bytes(-1, 0, 1, &[5000]));
        assert_eq!(encode_numeric("-0").unwrap(), numeric_bytes(0, 0, 0, &[]));
        assert_eq!(encode_numeric("NaN").unwrap(), numeric_bytes(0, NUMERIC_NAN, 0, &[]));
    }

    #[test]
    fn test_encode_numeric_is_read_back_exactly() {
        let text = "-98765432109876543210.0123456789";
        assert_eq!(format_numeric(&encode_numeric(text).unwrap()).unwrap(), text);
    }

    #[test]
    fn test_encode_numeric_rejects_garbage() {
        assert!(encode_numeric("12a").is_err());
        assert!(encode_numeric("").is_err());
        assert!(encode_numeric(".").is_err());
        assert!(encode_numeric("1e999999").is_err());
    }

    #[test]
    fn test_categorize_network_and_array_types() {
        assert_eq!(categorize_type("INET"), TypeCategory::Inet);
        assert_eq!(categorize_type("FLOAT8[]"), TypeCategory::DoubleArray);
        assert_eq!(categorize_type("NUMERIC[]"), TypeCategory::NumericArray);
        assert_eq!(categorize_type("UUID[]"), TypeCategory::UuidArray);
        assert_eq!(categorize_type("citext"), TypeCategory::Text);
    }

    #[test]
    fn test_format_inet() {
        let host: IpNet = "10.0.0.1/32".parse().unwrap();
        assert_eq!(format_inet(host, false), "10.0.0.1");
        assert_eq!(format_inet(host, true), "10.0.0.1/32");
        let net: IpNet = "10.0.0.0/8".parse().unwrap();
        assert_eq!(format_inet(net, false), "10.0.0.0/8");
        let v6: IpNet = "::1/128".parse().unwrap();
        assert_eq!(format_inet(v6, false), "::1");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(12345), "123.45");
        assert_eq!(format_money(-5), "-0.05");
        assert_eq!(format_money(0), "0.00");
        assert_eq!(format_money(i64::MIN), "-92233720368547758.08");
    }

    #[test]
    fn test_float_value_non_finite_as_string() {
        assert_eq!(float_value(1.5), serde_json::json!(1.5));
        assert_eq!(float_value(f64::NAN), JsonValue::String("NaN".to_string()));
    }
}
