//! FILENAME: core/sql-query/src/value.rs
//! PURPOSE: Defines the scalar values a fetched row can hold.
//! CONTEXT: Drivers hand back integers, floats, text (often for DECIMAL
//! columns), booleans and NULL. The crosstab reads axis identities and
//! metrics out of these.

use serde::{Deserialize, Serialize};

/// A single field value of a fetched row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
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

    /// Numeric view of the value. Text is parsed because many drivers
    /// return SUM/AVG over DECIMAL columns as strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        }
    }

    /// Returns the display value as a String.
    pub fn display_value(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Float(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            Value::Text(s) => s.clone(),
            Value::Boolean(b) => b.to_string(),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_null() {
        assert!(Value::default().is_null());
        assert_eq!(Value::from(None::<i64>), Value::default());
    }

    #[test]
    fn decimal_text_is_numeric() {
        assert_eq!(Value::from("12.50").as_f64(), Some(12.5));
        assert_eq!(Value::from("n/a").as_f64(), None);
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn whole_floats_display_without_fraction() {
        assert_eq!(Value::Float(2024.0).display_value(), "2024");
        assert_eq!(Value::Float(2.5).display_value(), "2.5");
        assert_eq!(Value::Null.display_value(), "");
    }

    #[test]
    fn deserializes_untagged_json() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, 3, 1.5, "x", true]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Integer(3),
                Value::Float(1.5),
                Value::Text("x".to_string()),
                Value::Boolean(true),
            ]
        );
    }
}
