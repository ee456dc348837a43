//! Parameter encoding for database queries.
//!
//! Each JSON value is converted to the type the server inferred for its
//! placeholder and bound positionally through the driver, never interpolated
//! into SQL text. A string therefore works for a `timestamptz`, `uuid` or
//! `int` placeholder without a cast in the SQL.

use crate::db::types::{RawNumeric, base_type};
use crate::error::{DbError, DbResult};
use crate::models::QueryParam;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgTypeInfo, PgTypeKind};
use sqlx::types::Json;
use sqlx::types::ipnet::IpNet;
use sqlx::{Arguments, Encode, Postgres, Type, TypeInfo};
use std::net::IpAddr;
use uuid::Uuid;

/// Types whose binary wire form is their text.
const TEXT_LIKE: &[&str] = &[
    "TEXT", "VARCHAR", "BPCHAR", "NAME", "CHAR", "CITEXT", "XML", "UNKNOWN",
];

/// Encode every parameter (`$1`, `$2`, ...) as the type inferred for its placeholder.
pub(crate) fn encode_params(params: &[QueryParam], types: &[PgTypeInfo]) -> DbResult<PgArguments> {
    if params.len() != types.len() {
        return Err(DbError::invalid_input(format!(
            "Query expects {} parameter(s) but {} were supplied",
            types.len(),
            params.len()
        )));
    }

    let mut args = PgArguments::default();
    for (idx, (param, ty)) in params.iter().zip(types).enumerate() {
        encode_param(&mut args, param, ty)
            .map_err(|reason| DbError::invalid_input(format!("Parameter ${}: {}", idx + 1, reason)))?;
    }
    Ok(args)
}

fn encode_param(args: &mut PgArguments, param: &QueryParam, ty: &PgTypeInfo) -> Result<(), String> {
    if matches!(param, QueryParam::Null) {
        return add(args, None::<String>);
    }

    let ty = base_type(ty);
    match ty.kind() {
        PgTypeKind::Array(element) => return encode_array(args, param, base_type(element)),
        PgTypeKind::Enum(_) => return add(args, text_of(param)),
        _ => {}
    }

    let name = ty.name().to_ascii_uppercase();
    match name.as_str() {
        "BOOL" => add(args, to_bool(param)?),
        "INT2" => add(args, narrow::<i16>(to_int(param)?, "smallint")?),
        "INT4" => add(args, narrow::<i32>(to_int(param)?, "integer")?),
        "INT8" => add(args, to_int(param)?),
        "FLOAT4" => add(args, to_float(param)? as f32),
        "FLOAT8" => add(args, to_float(param)?),
        "NUMERIC" => add(args, RawNumeric(numeric_text(param)?)),
        "JSON" | "JSONB" => add(args, Json(to_json(param)?)),
        "UUID" => add(args, to_uuid(param)?),
        "DATE" => add(args, parse_date(expect_str(param, "date")?)?),
        "TIME" => add(args, parse_time(expect_str(param, "time")?)?),
        "TIMESTAMP" => add(args, parse_timestamp(expect_str(param, "timestamp")?)?),
        "TIMESTAMPTZ" => add(args, parse_timestamptz(expect_str(param, "timestamptz")?)?),
        "INET" | "CIDR" => add(args, parse_inet(expect_str(param, "inet")?)?),
        "BYTEA" => add(args, parse_bytea(expect_str(param, "bytea")?)?),
        other if TEXT_LIKE.contains(&other) => add(args, text_of(param)),
        other => Err(format!(
            "type {} cannot be bound from a JSON value; bind text and cast it, e.g. ($n::text)::{}",
            other.to_lowercase(),
            other.to_lowercase()
        )),
    }
}

fn encode_array(args: &mut PgArguments, param: &QueryParam, element: &PgTypeInfo) -> Result<(), String> {
    let QueryParam::Json(JsonValue::Array(items)) = param else {
        return Err(format!("expected a JSON array, got {}", param.type_name()));
    };

    match element.name().to_ascii_uppercase().as_str() {
        "BOOL" => add(args, elements(items, to_bool)?),
        "INT2" => add(args, elements(items, |p| narrow::<i16>(to_int(p)?, "smallint"))?),
        "INT4" => add(args, elements(items, |p| narrow::<i32>(to_int(p)?, "integer"))?),
        "INT8" => add(args, elements(items, to_int)?),
        "FLOAT4" => add(args, elements(items, |p| to_float(p).map(|v| v as f32))?),
        "FLOAT8" => add(args, elements(items, to_float)?),
        "NUMERIC" => add(args, elements(items, |p| numeric_text(p).map(RawNumeric))?),
        "TEXT" => add(args, elements(items, |p| Ok(text_of(p)))?),
        "UUID" => add(args, elements(items, to_uuid)?),
        other => Err(format!(
            "arrays of {} cannot be bound from a JSON array",
            other.to_lowercase()
        )),
    }
}

fn add<T>(args: &mut PgArguments, value: T) -> Result<(), String>
where
    T: 'static + Encode<'static, Postgres> + Type<Postgres>,
{
    <PgArguments as Arguments<'static>>::add(args, value).map_err(|e| e.to_string())
}

fn elements<T>(
    items: &[JsonValue],
    convert: impl Fn(&QueryParam) -> Result<T, String>,
) -> Result<Vec<Option<T>>, String> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| match param_of(item) {
            QueryParam::Null => Ok(None),
            param => convert(&param)
                .map(Some)
                .map_err(|reason| format!("element {}: {}", idx, reason)),
        })
        .collect()
}

fn param_of(value: &JsonValue) -> QueryParam {
    match value {
        JsonValue::Null => QueryParam::Null,
        JsonValue::Bool(b) => QueryParam::Bool(*b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => QueryParam::Int(i),
            None => QueryParam::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => QueryParam::String(s.clone()),
        other => QueryParam::Json(other.clone()),
    }
}

// =============================================================================
// Scalar Conversions
// =============================================================================

fn text_of(param: &QueryParam) -> String {
    match param {
        QueryParam::Null => String::new(),
        QueryParam::Bool(b) => b.to_string(),
        QueryParam::Int(i) => i.to_string(),
        QueryParam::Float(f) => f.to_string(),
        QueryParam::String(s) => s.clone(),
        QueryParam::Json(v) => v.to_string(),
    }
}

fn expect_str<'a>(param: &'a QueryParam, target: &str) -> Result<&'a str, String> {
    match param {
        QueryParam::String(s) => Ok(s.trim()),
        other => Err(format!("expected a string for {}, got {}", target, other.type_name())),
    }
}

fn to_bool(param: &QueryParam) -> Result<bool, String> {
    match param {
        QueryParam::Bool(b) => Ok(*b),
        QueryParam::Int(0) => Ok(false),
        QueryParam::Int(1) => Ok(true),
        QueryParam::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" | "on" | "1" => Ok(true),
            "f" | "false" | "n" | "no" | "off" | "0" => Ok(false),
            _ => Err(format!("invalid boolean {:?}", s)),
        },
        other => Err(format!("expected a boolean, got {}", other.type_name())),
    }
}

fn to_int(param: &QueryParam) -> Result<i64, String> {
    match param {
        QueryParam::Int(i) => Ok(*i),
        QueryParam::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(*f as i64),
        QueryParam::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("invalid integer {:?}", s)),
        other => Err(format!("expected an integer, got {}", other.type_name())),
    }
}

fn narrow<T: TryFrom<i64>>(value: i64, target: &str) -> Result<T, String> {
    T::try_from(value).map_err(|_| format!("{} is out of range for {}", value, target))
}

fn to_float(param: &QueryParam) -> Result<f64, String> {
    match param {
        QueryParam::Int(i) => Ok(*i as f64),
        QueryParam::Float(f) => Ok(*f),
        QueryParam::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("invalid number {:?}", s)),
        other => Err(format!("expected a number, got {}", other.type_name())),
    }
}

fn numeric_text(param: &QueryParam) -> Result<String, String> {
    match param {
        QueryParam::Int(i) => Ok(i.to_string()),
        QueryParam::Float(f) if f.is_nan() => Ok("NaN".to_string()),
        QueryParam::Float(f) if f.is_infinite() => {
            Ok(if *f > 0.0 { "Infinity" } else { "-Infinity" }.to_string())
        }
        QueryParam::Float(f) => Ok(f.to_string()),
        QueryParam::String(s) => Ok(s.trim().to_string()),
        other => Err(format!("expected a number, got {}", other.type_name())),
    }
}

fn to_json(param: &QueryParam) -> Result<JsonValue, String> {
    match param {
        QueryParam::Null => Ok(JsonValue::Null),
        QueryParam::Bool(b) => Ok(JsonValue::Bool(*b)),
        QueryParam::Int(i) => Ok(JsonValue::from(*i)),
        QueryParam::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| format!("{} is not representable in JSON", f)),
        QueryParam::String(s) => {
            serde_json::from_str(s).map_err(|e| format!("invalid JSON text: {}", e))
        }
        QueryParam::Json(v) => Ok(v.clone()),
    }
}

fn to_uuid(param: &QueryParam) -> Result<Uuid, String> {
    let s = expect_str(param, "uuid")?;
    Uuid::parse_str(s).map_err(|_| format!("invalid uuid {:?}", s))
}

// =============================================================================
// Date and Time
// =============================================================================

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| parse_timestamp(s).map(|ts| ts.date()))
        .map_err(|_| format!("invalid date {:?}", s))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| format!("invalid time {:?}", s))
}

/// `timestamp` keeps the wall-clock part and ignores any offset, as PostgreSQL does.
fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| format!("invalid timestamp {:?}", s))
}

/// Values without an offset are taken as UTC.
fn parse_timestamptz(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(ts) = DateTime::parse_from_str(s, fmt) {
            return Ok(ts.with_timezone(&Utc));
        }
    }
    parse_timestamp(s)
        .map(|ts| ts.and_utc())
        .map_err(|_| format!("invalid timestamptz {:?}", s))
}

// =============================================================================
// Other Types
// =============================================================================

fn parse_inet(s: &str) -> Result<IpNet, String> {
    s.parse::<IpNet>()
        .or_else(|_| s.parse::<IpAddr>().map(IpNet::from))
        .map_err(|_| format!("invalid network address {:?}", s))
}

/// `\x`-prefixed hex, as PostgreSQL prints bytea, or base64 as query results
/// return it.
fn parse_bytea(s: &str) -> Result<Vec<u8>, String> {
    match s.strip_prefix("\\x") {
        Some(hex) => decode_hex(hex).ok_or_else(|| format!("invalid hex bytea {:?}", s)),
        None => STANDARD
            .decode(s)
            .map_err(|_| "bytea must be \\x-prefixed hex or base64".to_string()),
    }
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|at| u8::from_str_radix(hex.get(at..at + 2)?, 16).ok())
        .collect()
}
