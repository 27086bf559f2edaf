use std::error::Error;
use std::fmt;

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use postgres::types::{to_sql_checked, Format, FromSql, IsNull, Kind, ToSql, Type, WrongType};

type BoxError = Box<dyn Error + Sync + Send>;

/// An opaque scalar bound as a statement parameter or read back from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    /// Text in the server's input/output syntax for whatever type the column
    /// has. Sent verbatim and parsed by the server; also how column types
    /// without a native variant (numeric, date, timestamp, uuid, json, ...)
    /// are read back.
    Literal(String),
    Null,
}

impl Value {
    /// A literal typed on the command line. `null` is SQL NULL; anything else
    /// is kept exactly as typed and converted by the server.
    pub fn parse_literal(value: &str) -> Value {
        if value.trim().eq_ignore_ascii_case("null") {
            Value::Null
        } else {
            Value::Literal(value.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    // Native binary encodings; every other pairing goes over as text.
    fn binds_binary(&self, ty: &Type) -> bool {
        match self {
            Value::Null => true,
            Value::Integer(_) => matches!(
                *ty,
                Type::INT2 | Type::INT4 | Type::INT8 | Type::FLOAT4 | Type::FLOAT8
            ),
            Value::Float(_) => matches!(*ty, Type::FLOAT4 | Type::FLOAT8),
            Value::Boolean(_) => *ty == Type::BOOL,
            Value::String(_) => is_text(ty),
            Value::Literal(_) => false,
        }
    }

    fn text(&self) -> String {
        match self {
            Value::Float(f) => float_text(*f),
            other => other.to_string(),
        }
    }
}

fn float_text(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f == f64::INFINITY {
        "Infinity".to_string()
    } else if f == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        f.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) | Value::Literal(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

fn is_text(ty: &Type) -> bool {
    matches!(*ty, Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN)
}

fn wrong_type(ty: &Type) -> BoxError {
    Box::new(WrongType::new::<Value>(ty.clone()))
}

// Values are loosely typed: the server decides the parameter type from the
// statement. Matching kinds are encoded natively, the rest as text in the
// server's input syntax.
impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if !self.binds_binary(ty) {
            out.extend_from_slice(self.text().as_bytes());
            return Ok(IsNull::No);
        }

        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Integer(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                _ => i.to_sql(ty, out),
            },
            Value::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            Value::Boolean(b) => b.to_sql(ty, out),
            Value::String(s) => s.as_str().to_sql(ty, out),
            Value::Literal(_) => Err(wrong_type(ty)),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    fn encode_format(&self, ty: &Type) -> Format {
        if self.binds_binary(ty) {
            Format::Binary
        } else {
            Format::Text
        }
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        match *ty {
            Type::INT2 => Ok(Value::Integer(i16::from_sql(ty, raw)?.into())),
            Type::INT4 => Ok(Value::Integer(i32::from_sql(ty, raw)?.into())),
            Type::INT8 => Ok(Value::Integer(i64::from_sql(ty, raw)?)),
            Type::FLOAT4 => Ok(Value::Float(f32::from_sql(ty, raw)?.into())),
            Type::FLOAT8 => Ok(Value::Float(f64::from_sql(ty, raw)?)),
            Type::BOOL => Ok(Value::Boolean(bool::from_sql(ty, raw)?)),
            _ if is_text(ty) => Ok(Value::String(<&str>::from_sql(ty, raw)?.to_string())),
            _ => Ok(Value::Literal(server_text(ty, raw)?)),
        }
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2 | Type::INT4 | Type::INT8 | Type::FLOAT4 | Type::FLOAT8 | Type::BOOL
        ) || is_text(ty)
            || has_server_text(ty)
    }
}

fn has_server_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::NUMERIC
            | Type::DATE
            | Type::TIME
            | Type::TIMESTAMP
            | Type::TIMESTAMPTZ
            | Type::UUID
            | Type::JSON
            | Type::JSONB
            | Type::BYTEA
            | Type::CHAR
            | Type::OID
    ) || matches!(ty.kind(), Kind::Enum(_))
}

/// Renders a binary column value the way the server prints it as text.
fn server_text(ty: &Type, raw: &[u8]) -> Result<String, BoxError> {
    if let Kind::Enum(_) = ty.kind() {
        return Ok(std::str::from_utf8(raw)?.to_string());
    }

    match *ty {
        Type::NUMERIC => numeric_text(raw),
        Type::DATE => match i32::from_sql(ty, raw)? {
            i32::MAX => Ok("infinity".to_string()),
            i32::MIN => Ok("-infinity".to_string()),
            _ => Ok(NaiveDate::from_sql(ty, raw)?.format("%Y-%m-%d").to_string()),
        },
        Type::TIME => Ok(NaiveTime::from_sql(ty, raw)?.format("%H:%M:%S%.f").to_string()),
        Type::TIMESTAMP | Type::TIMESTAMPTZ => match i64::from_sql(&Type::INT8, raw)? {
            i64::MAX => Ok("infinity".to_string()),
            i64::MIN => Ok("-infinity".to_string()),
            _ if *ty == Type::TIMESTAMP => Ok(NaiveDateTime::from_sql(ty, raw)?
                .format("%Y-%m-%d %H:%M:%S%.f")
                .to_string()),
            _ => Ok(DateTime::<Utc>::from_sql(ty, raw)?
                .format("%Y-%m-%d %H:%M:%S%.f+00")
                .to_string()),
        },
        Type::UUID => {
            if raw.len() != 16 {
                return Err("invalid uuid length".into());
            }
            let hex = hex(raw);
            Ok(format!(
                "{}-{}-{}-{}-{}",
                &hex[0..8],
                &hex[8..12],
                &hex[12..16],
                &hex[16..20],
                &hex[20..32]
            ))
        }
        Type::JSON => Ok(std::str::from_utf8(raw)?.to_string()),
        Type::JSONB => match raw.split_first() {
            Some((1, body)) => Ok(std::str::from_utf8(body)?.to_string()),
            _ => Err("unsupported jsonb version".into()),
        },
        Type::BYTEA => Ok(format!("\\x{}", hex(raw))),
        Type::CHAR => Ok(char::from(i8::from_sql(ty, raw)? as u8).to_string()),
        Type::OID => Ok(u32::from_sql(ty, raw)?.to_string()),
        _ => Err(wrong_type(ty)),
    }
}

fn hex(raw: &[u8]) -> String {
    raw.iter().map(|b| format!("{:02x}", b)).collect()
}

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

// Binary numeric: ndigits, weight, sign, dscale, then base-10000 digits with
// the first one weighted 10000^weight.
fn numeric_text(raw: &[u8]) -> Result<String, BoxError> {
    let word = |i: usize| -> Result<u16, BoxError> {
        raw.get(i * 2..i * 2 + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .ok_or_else(|| "truncated numeric".into())
    };

    let ndigits = word(0)? as usize;
    let weight = word(1)? as i16 as i64;
    let sign = word(2)?;
    let dscale = word(3)? as usize;
    if raw.len() != 8 + ndigits * 2 {
        return Err("invalid numeric length".into());
    }

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        _ => {}
    }

    let digit = |index: i64| -> Result<u16, BoxError> {
        if index < 0 || index >= ndigits as i64 {
            Ok(0)
        } else {
            word(4 + index as usize)
        }
    };

    let mut text = String::new();
    if sign == NUMERIC_NEG {
        text.push('-');
    }

    if weight < 0 {
        text.push('0');
    } else {
        text.push_str(&digit(0)?.to_string());
        for index in 1..=weight {
            text.push_str(&format!("{:04}", digit(index)?));
        }
    }

    if dscale > 0 {
        let mut fraction = String::new();
        let mut index = weight + 1;
        while fraction.len() < dscale {
            fraction.push_str(&format!("{:04}", digit(index)?));
            index += 1;
        }
        text.push('.');
        text.push_str(&fraction[..dscale]);
    }

    Ok(text)
}

/// A result row, passed through as its column values in select-list order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl TryFrom<&postgres::Row> for Row {
    type Error = postgres::Error;

    fn try_from(row: &postgres::Row) -> Result<Self, Self::Error> {
        let values = (0..row.len())
            .map(|i| row.try_get::<_, Value>(i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Row::new(values))
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                Value::String(s) => write!(f, "'{}'", s)?,
                other => write!(f, "{}", other)?,
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // (sent as text, bytes written)
    fn bind(value: &Value, ty: &Type) -> (bool, String) {
        let mut buf = BytesMut::new();
        value.to_sql(ty, &mut buf).unwrap();
        let as_text = matches!(value.encode_format(ty), Format::Text);
        (as_text, String::from_utf8_lossy(&buf).to_string())
    }

    fn numeric(weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        for word in [digits.len() as u16, weight as u16, sign, dscale] {
            raw.extend_from_slice(&word.to_be_bytes());
        }
        for d in digits {
            raw.extend_from_slice(&d.to_be_bytes());
        }
        raw
    }

    #[test]
    fn test_parse_literal_keeps_text() {
        assert_eq!(Value::parse_literal("123"), Value::Literal("123".to_string()));
        assert_eq!(Value::parse_literal("alpha"), Value::Literal("alpha".to_string()));
        assert_eq!(Value::parse_literal("null"), Value::Null);
        assert_eq!(Value::parse_literal(" NULL "), Value::Null);
    }

    #[test]
    fn test_literal_sent_verbatim() {
        for typed in ["01234", "1.50", "Infinity", "TRUE", "1e3"] {
            let value = Value::parse_literal(typed);
            assert_eq!(bind(&value, &Type::VARCHAR), (true, typed.to_string()));
            assert_eq!(bind(&value, &Type::INT4), (true, typed.to_string()));
        }
    }

    #[test]
    fn test_integer_narrows_to_column_type() {
        let mut buf = BytesMut::new();
        let is_null = Value::Integer(123).to_sql(&Type::INT4, &mut buf).unwrap();

        assert!(matches!(is_null, IsNull::No));
        assert_eq!(&buf[..], &123i32.to_be_bytes());
        assert!(matches!(Value::Integer(123).encode_format(&Type::INT4), Format::Binary));
    }

    #[test]
    fn test_integer_overflow_is_rejected() {
        let mut buf = BytesMut::new();
        assert!(Value::Integer(70_000).to_sql(&Type::INT2, &mut buf).is_err());
    }

    #[test]
    fn test_other_column_types_bind_as_text() {
        assert_eq!(bind(&Value::Integer(5), &Type::NUMERIC), (true, "5".to_string()));
        assert_eq!(bind(&"2024-01-01".into(), &Type::DATE), (true, "2024-01-01".to_string()));
        assert_eq!(
            bind(&Value::Float(f64::INFINITY), &Type::NUMERIC),
            (true, "Infinity".to_string())
        );
        assert_eq!(bind(&"alpha".into(), &Type::INT4), (true, "alpha".to_string()));
    }

    #[test]
    fn test_null_binds_as_sql_null() {
        let mut buf = BytesMut::new();
        let is_null = Value::Null.to_sql(&Type::VARCHAR, &mut buf).unwrap();

        assert!(matches!(is_null, IsNull::Yes));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_from_sql() {
        let v = Value::from_sql(&Type::INT4, &42i32.to_be_bytes()).unwrap();
        assert_eq!(v, Value::Integer(42));

        let v = Value::from_sql(&Type::VARCHAR, b"beta").unwrap();
        assert_eq!(v, Value::String("beta".to_string()));

        let v = Value::from_sql_null(&Type::INT4).unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn test_numeric_read_as_text() {
        let cases = [
            (numeric(0, 0, 2, &[10, 5000]), "10.50"),
            (numeric(-1, 0, 4, &[12]), "0.0012"),
            (numeric(-2, 0, 5, &[1000]), "0.00001"),
            (numeric(1, 0, 0, &[1]), "10000"),
            (numeric(1, NUMERIC_NEG, 1, &[1, 2345, 6000]), "-12345.6"),
            (numeric(0, 0, 0, &[]), "0"),
            (numeric(0, NUMERIC_NAN, 0, &[]), "NaN"),
        ];

        for (raw, expected) in cases {
            let v = Value::from_sql(&Type::NUMERIC, &raw).unwrap();
            assert_eq!(v, Value::Literal(expected.to_string()));
        }
    }

    #[test]
    fn test_dates_and_uuids_read_as_text() {
        // 2024-01-01 is 8766 days after 2000-01-01.
        let v = Value::from_sql(&Type::DATE, &8766i32.to_be_bytes()).unwrap();
        assert_eq!(v, Value::Literal("2024-01-01".to_string()));

        let v = Value::from_sql(&Type::DATE, &i32::MAX.to_be_bytes()).unwrap();
        assert_eq!(v, Value::Literal("infinity".to_string()));

        let micros: i64 = 8766 * 86_400_000_000 + 3_661_500_000;
        let v = Value::from_sql(&Type::TIMESTAMP, &micros.to_be_bytes()).unwrap();
        assert_eq!(v, Value::Literal("2024-01-01 01:01:01.500".to_string()));

        let uuid: Vec<u8> = (0u8..16).collect();
        let v = Value::from_sql(&Type::UUID, &uuid).unwrap();
        assert_eq!(
            v,
            Value::Literal("00010203-0405-0607-0809-0a0b0c0d0e0f".to_string())
        );

        let v = Value::from_sql(&Type::JSONB, b"\x01{\"a\": 1}").unwrap();
        assert_eq!(v, Value::Literal("{\"a\": 1}".to_string()));
    }

    #[test]
    fn test_row_display() {
        let row = Row::new(vec![
            Value::Integer(123),
            "alpha".into(),
            Value::Literal("10.50".to_string()),
            Value::Null,
        ]);
        assert_eq!(row.to_string(), "(123, 'alpha', 10.50, NULL)");
    }
}
