//! Typed cell values and the coercion rules between text and values.
//!
//! Every cell in a table is a [`Value`] whose variant matches the declared
//! [`ColumnType`] of its column, or [`Value::Null`] when the cell is unset.
//! [`coerce`] turns user-typed text into a value and [`format`] turns a value
//! back into text; for every non-null value `v` of type `t`,
//! `coerce(&format(&v), t) == Ok(v)`.
//!
//! Floats are rendered with the shortest representation that parses back to
//! the same `f64`. A literal such as `0.10000000000000001` therefore comes
//! back as `0.1`; the stored number is identical, only the text differs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TableError};

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// 64-bit signed integer.
    Integer,
    /// 64-bit finite floating point.
    Float,
    /// UTF-8 text, accepted verbatim.
    Text,
    /// `true` / `false`.
    Boolean,
}

impl ColumnType {
    /// All column types, in menu order.
    pub const ALL: [ColumnType; 4] = [
        ColumnType::Integer,
        ColumnType::Float,
        ColumnType::Text,
        ColumnType::Boolean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
        }
    }

    /// SQL type declared for columns of this type.
    ///
    /// Booleans are declared `BOOLEAN` rather than `INTEGER` so that the
    /// declared type survives a save/load cycle. SQLite still stores the
    /// values as 0/1 integers.
    pub fn affinity(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Boolean => "BOOLEAN",
        }
    }

    /// Map a declared SQL column type back to a column type.
    ///
    /// Follows SQLite's affinity rules, except that any declaration
    /// containing `BOOL` is read as a boolean. Unknown or empty
    /// declarations fall back to text.
    pub fn from_affinity(declared: &str) -> ColumnType {
        let declared = declared.to_ascii_uppercase();
        if declared.contains("BOOL") {
            ColumnType::Boolean
        } else if declared.contains("INT") {
            ColumnType::Integer
        } else if declared.contains("CHAR") || declared.contains("CLOB") || declared.contains("TEXT")
        {
            ColumnType::Text
        } else if declared.contains("REAL")
            || declared.contains("FLOA")
            || declared.contains("DOUB")
            || declared.contains("NUMERIC")
            || declared.contains("DEC")
        {
            ColumnType::Float
        } else {
            ColumnType::Text
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "int" | "integer" => Ok(ColumnType::Integer),
            "float" | "real" | "double" => Ok(ColumnType::Float),
            "text" | "string" | "str" => Ok(ColumnType::Text),
            "bool" | "boolean" => Ok(ColumnType::Boolean),
            other => Err(format!(
                "Unknown column type '{}' (expected integer, float, text or boolean)",
                other
            )),
        }
    }
}

/// A single typed cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Unset cell. Distinct from `Integer(0)` and `Text("")`.
    #[default]
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Column type this value belongs to, `None` for `Null`.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Boolean(_) => Some(ColumnType::Boolean),
        }
    }

    /// Whether this value may be stored in a column of type `ty`.
    pub fn conforms_to(&self, ty: ColumnType) -> bool {
        match self.column_type() {
            None => true,
            Some(own) => own == ty,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
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

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Coerce a literal into a value of type `ty`.
///
/// The returned [`TableError::TypeMismatch`] carries an empty column name;
/// table operations fill it in.
///
/// - Integer: optional sign followed by ASCII digits, must fit in `i64`.
/// - Float: decimal or exponential notation, must be finite.
/// - Boolean: `true` / `false`, case-insensitive.
/// - Text: accepted verbatim.
///
/// For the non-text types, surrounding whitespace is ignored and an empty
/// literal yields [`Value::Null`].
pub fn coerce(literal: &str, ty: ColumnType) -> Result<Value> {
    if ty == ColumnType::Text {
        return Ok(Value::Text(literal.to_string()));
    }

    let trimmed = literal.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    let mismatch = || TableError::type_mismatch("", ty, literal);

    match ty {
        ColumnType::Integer => {
            let digits = trimmed
                .strip_prefix('-')
                .or_else(|| trimmed.strip_prefix('+'))
                .unwrap_or(trimmed);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(mismatch());
            }
            trimmed.parse::<i64>().map(Value::Integer).map_err(|_| mismatch())
        }
        ColumnType::Float => match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Value::Float(v)),
            _ => Err(mismatch()),
        },
        ColumnType::Boolean => match trimmed.to_lowercase().as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(mismatch()),
        },
        ColumnType::Text => unreachable!("text handled above"),
    }
}

/// Render a value as text. Inverse of [`coerce`].
pub fn format(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(v) => v.to_string(),
        Value::Float(v) => format_float(*v),
        Value::Text(v) => v.clone(),
        Value::Boolean(v) => v.to_string(),
    }
}

/// Convert an existing value to another column type.
///
/// Numeric conversions are done directly (an integral float becomes an
/// integer, 0/1 become booleans); text goes through [`coerce`]. Returns
/// `None` when the value has no representation in `ty`.
pub fn convert(value: &Value, ty: ColumnType) -> Option<Value> {
    match (value, ty) {
        (Value::Null, _) => Some(Value::Null),
        (v, ty) if v.column_type() == Some(ty) => Some(v.clone()),
        (v, ColumnType::Text) => Some(Value::Text(format(v))),
        (Value::Text(s), ty) => coerce(s, ty).ok(),
        (Value::Integer(i), ColumnType::Float) => Some(Value::Float(*i as f64)),
        (Value::Float(f), ColumnType::Integer) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                Some(Value::Integer(*f as i64))
            } else {
                None
            }
        }
        (Value::Integer(0), ColumnType::Boolean) => Some(Value::Boolean(false)),
        (Value::Integer(1), ColumnType::Boolean) => Some(Value::Boolean(true)),
        (Value::Boolean(b), ColumnType::Integer) => Some(Value::Integer(i64::from(*b))),
        _ => None,
    }
}

// Integral floats keep a trailing ".0" so they read as floats in exports.
fn format_float(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce("42", ColumnType::Integer).unwrap(), Value::Integer(42));
        assert_eq!(coerce("-7", ColumnType::Integer).unwrap(), Value::Integer(-7));
        assert_eq!(coerce("+3", ColumnType::Integer).unwrap(), Value::Integer(3));
        assert_eq!(coerce(" 12 ", ColumnType::Integer).unwrap(), Value::Integer(12));
        assert_eq!(coerce("007", ColumnType::Integer).unwrap(), Value::Integer(7));
    }

    #[test]
    fn test_coerce_integer_rejects_non_digits() {
        for bad in ["abc", "1.5", "1e3", "-", "12a", "--1", "99999999999999999999"] {
            let err = coerce(bad, ColumnType::Integer).unwrap_err();
            assert!(
                matches!(err, TableError::TypeMismatch { expected: ColumnType::Integer, .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_coerce_float() {
        assert_eq!(coerce("1.5", ColumnType::Float).unwrap(), Value::Float(1.5));
        assert_eq!(coerce("2e3", ColumnType::Float).unwrap(), Value::Float(2000.0));
        assert_eq!(coerce("-0.25", ColumnType::Float).unwrap(), Value::Float(-0.25));
        assert_eq!(coerce("3", ColumnType::Float).unwrap(), Value::Float(3.0));
        assert!(coerce("NaN", ColumnType::Float).is_err());
        assert!(coerce("inf", ColumnType::Float).is_err());
        assert!(coerce("1.2.3", ColumnType::Float).is_err());
    }

    #[test]
    fn test_coerce_boolean_case_insensitive() {
        assert_eq!(coerce("TRUE", ColumnType::Boolean).unwrap(), Value::Boolean(true));
        assert_eq!(coerce("False", ColumnType::Boolean).unwrap(), Value::Boolean(false));
        assert!(coerce("yes", ColumnType::Boolean).is_err());
        assert!(coerce("1", ColumnType::Boolean).is_err());
    }

    #[test]
    fn test_coerce_text_is_verbatim() {
        assert_eq!(coerce("  hi ", ColumnType::Text).unwrap(), Value::from("  hi "));
        assert_eq!(coerce("", ColumnType::Text).unwrap(), Value::from(""));
    }

    #[test]
    fn test_empty_literal_is_unset_for_typed_columns() {
        assert_eq!(coerce("", ColumnType::Integer).unwrap(), Value::Null);
        assert_eq!(coerce("  ", ColumnType::Float).unwrap(), Value::Null);
        assert_eq!(coerce("", ColumnType::Boolean).unwrap(), Value::Null);
    }

    #[test]
    fn test_format_then_coerce_round_trips() {
        let samples = [
            Value::Integer(0),
            Value::Integer(i64::MIN),
            Value::Integer(i64::MAX),
            Value::Float(0.1),
            Value::Float(-3.0),
            Value::Float(1e20),
            Value::Float(1.0e-7),
            Value::Text(String::new()),
            Value::Text("a, \"quoted\" cell".to_string()),
            Value::Boolean(true),
            Value::Boolean(false),
        ];
        for value in samples {
            let ty = value.column_type().unwrap();
            assert_eq!(coerce(&format(&value), ty).unwrap(), value, "{ty}");
        }
    }

    #[test]
    fn test_format_float_keeps_decimal_point() {
        assert_eq!(format(&Value::Float(3.0)), "3.0");
        assert_eq!(format(&Value::Float(0.5)), "0.5");
        assert_eq!(format(&Value::Null), "");
    }

    #[test]
    fn test_convert_between_types() {
        assert_eq!(convert(&Value::Integer(4), ColumnType::Float), Some(Value::Float(4.0)));
        assert_eq!(convert(&Value::Float(4.0), ColumnType::Integer), Some(Value::Integer(4)));
        assert_eq!(convert(&Value::Float(4.5), ColumnType::Integer), None);
        assert_eq!(convert(&Value::Integer(1), ColumnType::Boolean), Some(Value::Boolean(true)));
        assert_eq!(convert(&Value::Integer(2), ColumnType::Boolean), None);
        assert_eq!(convert(&Value::Boolean(true), ColumnType::Integer), Some(Value::Integer(1)));
        assert_eq!(convert(&Value::from("12"), ColumnType::Integer), Some(Value::Integer(12)));
        assert_eq!(convert(&Value::from("twelve"), ColumnType::Integer), None);
        assert_eq!(convert(&Value::Float(2.5), ColumnType::Text), Some(Value::from("2.5")));
        assert_eq!(convert(&Value::Null, ColumnType::Boolean), Some(Value::Null));
    }

    #[test]
    fn test_column_type_parse_aliases() {
        assert_eq!("INT".parse::<ColumnType>().unwrap(), ColumnType::Integer);
        assert_eq!("real".parse::<ColumnType>().unwrap(), ColumnType::Float);
        assert_eq!("String".parse::<ColumnType>().unwrap(), ColumnType::Text);
        assert_eq!("bool".parse::<ColumnType>().unwrap(), ColumnType::Boolean);
        assert!("date".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_affinity_round_trip() {
        for ty in ColumnType::ALL {
            assert_eq!(ColumnType::from_affinity(ty.affinity()), ty);
        }
        assert_eq!(ColumnType::from_affinity("BIGINT"), ColumnType::Integer);
        assert_eq!(ColumnType::from_affinity("VARCHAR(20)"), ColumnType::Text);
        assert_eq!(ColumnType::from_affinity("DOUBLE PRECISION"), ColumnType::Float);
        assert_eq!(ColumnType::from_affinity(""), ColumnType::Text);
    }

    #[test]
    fn test_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Value::Null,
            Value::Integer(1),
            Value::Float(1.5),
            Value::from("x"),
            Value::Boolean(true),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,1,1.5,"x",true]"#);
    }
}
