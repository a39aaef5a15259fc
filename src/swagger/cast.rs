//! Parameter casting for Swagger-declared operations.
//!
//! Every declared parameter is cast once per request, before the real
//! handler runs. Raw values are read from the request container named by
//! `in` and the typed result is written to `request.swagger[scope][name]`.
//!
//! Casting never fails the request: skips and malformed declarations come
//! back as [`CastOutcome`] variants.

use crate::error::CastError;
use crate::host::{Request, Scope};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

/// One entry of an operation's `parameters` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "in", default)]
    pub location: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(rename = "collectionFormat", default)]
    pub collection_format: Option<String>,
}

impl ParameterSpec {
    pub fn new(name: &str, location: &str, kind: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            location: Some(location.to_string()),
            kind: Some(kind.to_string()),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn with_collection_format(mut self, collection_format: &str) -> Self {
        self.collection_format = Some(collection_format.to_string());
        self
    }
}

/// A declared parameter as found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredParameter {
    Spec(ParameterSpec),
    /// The entry could not be read as a parameter object.
    Malformed(CastError),
}

impl DeclaredParameter {
    pub fn from_value(index: usize, value: &Value) -> Self {
        match serde_json::from_value::<ParameterSpec>(value.clone()) {
            Ok(spec) => DeclaredParameter::Spec(spec),
            Err(e) => DeclaredParameter::Malformed(CastError::Malformed {
                index,
                reason: e.to_string(),
            }),
        }
    }

    /// Read an operation's `parameters` value. Absent or `null` is empty.
    pub fn list_from_value(value: Option<&Value>) -> Vec<DeclaredParameter> {
        match value {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, v)| DeclaredParameter::from_value(i, v))
                .collect(),
            Some(other) => vec![DeclaredParameter::Malformed(CastError::Malformed {
                index: 0,
                reason: format!("parameters must be an array, got {other}"),
            })],
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            DeclaredParameter::Spec(spec) => spec.name.as_deref(),
            DeclaredParameter::Malformed(_) => None,
        }
    }
}

/// Typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum CastValue {
    /// String (and boolean) parameters, copied unchanged
    Text(String),
    Number(f64),
    Integer(i64),
    /// Sentinel for `number` / `integer` input with no leading numeric part
    NotANumber,
    Date(DateTime<Utc>),
    /// Sentinel for `date` / `date-time` input that is not a recognisable date
    InvalidDate,
    List(Vec<String>),
}

impl CastValue {
    pub fn to_json(&self) -> Value {
        match self {
            CastValue::Text(s) => Value::String(s.clone()),
            CastValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            CastValue::Integer(i) => Value::from(*i),
            CastValue::NotANumber | CastValue::InvalidDate => Value::Null,
            CastValue::Date(d) => Value::String(d.to_rfc3339()),
            CastValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, CastValue::NotANumber)
    }
}

/// Why a parameter was left uncast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `in` is not query, header or path.
    UnknownScope,
    /// The request carries no value for the parameter.
    Absent,
    /// `type` is missing or not one the caster handles.
    UnsupportedType,
    /// `type: array` without a known `collectionFormat`.
    UnsupportedCollectionFormat,
}

/// Result of casting one declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum CastOutcome {
    Cast(CastValue),
    Skipped(SkipReason),
    Failed(CastError),
}

/// Separator for an array `collectionFormat`.
pub fn collection_separator(collection_format: &str) -> Option<&'static str> {
    match collection_format {
        "csv" => Some(","),
        "ssv" => Some(" "),
        "tsv" => Some("\t"),
        "pipes" => Some("|"),
        _ => None,
    }
}

/// Cast `spec` against `req`, writing the result into `req.swagger`.
///
/// Parameters with an unknown `in` are skipped before any scratch is
/// created. For known scopes the scope map is created even when the value
/// turns out to be absent.
pub fn cast_parameter(req: &mut Request, spec: &ParameterSpec) -> CastOutcome {
    let Some(scope) = spec.location.as_deref().and_then(Scope::from_location) else {
        trace!(parameter = ?spec.name, location = ?spec.location, "Parameter has no scope");
        return CastOutcome::Skipped(SkipReason::UnknownScope);
    };
    req.swagger_mut().scope_mut(scope);

    let Some(name) = spec.name.as_deref() else {
        return CastOutcome::Skipped(SkipReason::Absent);
    };
    let Some(raw) = req.raw_param(scope, name).map(str::to_owned) else {
        return CastOutcome::Skipped(SkipReason::Absent);
    };

    match coerce(&raw, spec) {
        Ok(value) => {
            debug!(
                parameter = %name,
                scope = scope.as_str(),
                value = ?value,
                "Parameter cast"
            );
            req.swagger_mut()
                .scope_mut(scope)
                .insert(name.to_string(), value.clone());
            CastOutcome::Cast(value)
        }
        Err(reason) => {
            trace!(parameter = %name, reason = ?reason, "Parameter left uncast");
            CastOutcome::Skipped(reason)
        }
    }
}

/// [`cast_parameter`] for a declaration that may be malformed.
pub fn cast_declared(req: &mut Request, declared: &DeclaredParameter) -> CastOutcome {
    match declared {
        DeclaredParameter::Spec(spec) => cast_parameter(req, spec),
        DeclaredParameter::Malformed(err) => CastOutcome::Failed(err.clone()),
    }
}

fn coerce(raw: &str, spec: &ParameterSpec) -> Result<CastValue, SkipReason> {
    match spec.kind.as_deref() {
        Some("string") => match spec.format.as_deref() {
            Some("date" | "datetime" | "date-time") => Ok(parse_date(raw)
                .map(CastValue::Date)
                .unwrap_or(CastValue::InvalidDate)),
            _ => Ok(CastValue::Text(raw.to_string())),
        },
        Some("number") => Ok(parse_float_prefix(raw)
            .map(CastValue::Number)
            .unwrap_or(CastValue::NotANumber)),
        Some("integer") => Ok(parse_int_prefix(raw)),
        // No coercion: "false" stays a (truthy) string.
        Some("boolean") => Ok(CastValue::Text(raw.to_string())),
        Some("array") => {
            let sep = spec
                .collection_format
                .as_deref()
                .and_then(collection_separator)
                .ok_or(SkipReason::UnsupportedCollectionFormat)?;
            Ok(CastValue::List(raw.split(sep).map(str::to_string).collect()))
        }
        _ => Err(SkipReason::UnsupportedType),
    }
}

/// Parse the longest leading decimal number of `raw`, ignoring leading
/// whitespace and any trailing garbage (`"3.5kg"` is `3.5`).
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let (sign, rest) = split_sign(s);
    if rest.starts_with("Infinity") {
        return Some(sign * f64::INFINITY);
    }

    let bytes = rest.as_bytes();
    let mut end = 0;
    let mut digits = 0;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    let mut mantissa_end = end;
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            digits += 1;
        }
        mantissa_end = end;
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut j = end + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            mantissa_end = j;
        }
    }

    let literal = rest[..mantissa_end].trim_end_matches('.');
    let literal = if literal.starts_with('.') {
        format!("0{literal}")
    } else {
        literal.to_string()
    };
    literal.parse::<f64>().ok().map(|v| sign * v)
}

/// Parse the leading integer of `raw`, truncating at the first non-digit
/// (`"42.9"` is `42`). A `0x` prefix selects hexadecimal. Values beyond
/// `i64` come back as [`CastValue::Number`].
pub fn parse_int_prefix(raw: &str) -> CastValue {
    let s = raw.trim_start();
    let (sign, rest) = split_sign(s);
    let (radix, body) = match rest.get(..2) {
        Some("0x" | "0X") => (16, &rest[2..]),
        _ => (10, rest),
    };
    let len = body
        .bytes()
        .take_while(|b| (*b as char).is_digit(radix))
        .count();
    if len == 0 {
        return CastValue::NotANumber;
    }
    let digits = &body[..len];
    match i64::from_str_radix(digits, radix) {
        Ok(v) => CastValue::Integer(if sign < 0.0 { -v } else { v }),
        Err(_) => {
            let approx = digits
                .chars()
                .filter_map(|c| c.to_digit(radix))
                .fold(0f64, |acc, d| acc * f64::from(radix) + f64::from(d));
            CastValue::Number(sign * approx)
        }
    }
}

fn split_sign(s: &str) -> (f64, &str) {
    match s.as_bytes().first() {
        Some(b'-') => (-1.0, &s[1..]),
        Some(b'+') => (1.0, &s[1..]),
        _ => (1.0, s),
    }
}

/// Parse the date forms commonly sent in query strings and headers.
///
/// Date-only and offset-less date-time forms are read as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    let date = match s.len() {
        4 => NaiveDate::parse_from_str(&format!("{s}-01-01"), "%Y-%m-%d").ok(),
        7 => NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok(),
        _ => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
    }?;
    date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn float_prefix() {
        assert_eq!(parse_float_prefix("3.5"), Some(3.5));
        assert_eq!(parse_float_prefix("  -2e3x"), Some(-2000.0));
        assert_eq!(parse_float_prefix("3.5kg"), Some(3.5));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("7."), Some(7.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix("abc"), None);
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("-Infinity"), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn int_prefix() {
        assert_eq!(parse_int_prefix("42"), CastValue::Integer(42));
        assert_eq!(parse_int_prefix("42.9"), CastValue::Integer(42));
        assert_eq!(parse_int_prefix(" -7px"), CastValue::Integer(-7));
        assert_eq!(parse_int_prefix("0x1A"), CastValue::Integer(26));
        assert_eq!(parse_int_prefix("abc"), CastValue::NotANumber);
        assert_eq!(parse_int_prefix("-"), CastValue::NotANumber);
        assert!(matches!(
            parse_int_prefix("99999999999999999999"),
            CastValue::Number(n) if n > 9.0e18
        ));
    }

    #[test]
    fn dates() {
        let d = parse_date("2024-02-29").unwrap();
        assert_eq!(d.to_rfc3339(), "2024-02-29T00:00:00+00:00");
        let d = parse_date("2024-02-29T10:30:00+02:00").unwrap();
        assert_eq!(d.to_rfc3339(), "2024-02-29T08:30:00+00:00");
        assert!(parse_date("2024-02-29T10:30:00").is_some());
        assert!(parse_date("2024-05").is_some());
        assert!(parse_date("not a date").is_none());
        assert!(parse_date("2023-02-30").is_none());
    }

    #[test]
    fn separators() {
        assert_eq!(collection_separator("csv"), Some(","));
        assert_eq!(collection_separator("ssv"), Some(" "));
        assert_eq!(collection_separator("pipes"), Some("|"));
        assert_eq!(collection_separator("multi"), None);
    }

    #[test]
    fn malformed_entries() {
        assert!(matches!(
            DeclaredParameter::from_value(2, &json!("id")),
            DeclaredParameter::Malformed(CastError::Malformed { index: 2, .. })
        ));
        assert!(matches!(
            DeclaredParameter::from_value(0, &json!({ "name": 5 })),
            DeclaredParameter::Malformed(_)
        ));
        assert!(DeclaredParameter::list_from_value(None).is_empty());
        assert_eq!(DeclaredParameter::list_from_value(Some(&json!({}))).len(), 1);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let p = DeclaredParameter::from_value(
            0,
            &json!({ "name": "id", "in": "path", "type": "integer", "required": true }),
        );
        assert_eq!(p, DeclaredParameter::Spec(ParameterSpec::new("id", "path", "integer")));
    }

    #[test]
    fn nan_and_invalid_dates_serialize_as_null() {
        assert_eq!(CastValue::NotANumber.to_json(), Value::Null);
        assert_eq!(CastValue::InvalidDate.to_json(), Value::Null);
        assert_eq!(
            CastValue::List(vec!["a".into()]).to_json(),
            json!(["a"])
        );
    }
}
