use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Pattern a money-tagged string must fully match to be written as a number.
static NUMERIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(\d+\.)?\d+$").expect("numeric pattern is valid")
});

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single extracted cell value before coercion.
///
/// This is a closed set: every variant has exactly one formatting rule in
/// [`coerce`], so adding a variant forces the match there to be updated.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Bool(bool),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
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

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Concrete write instruction for one cell.
///
/// Exactly one of blank, number or text is produced per cell. The `money`
/// flag requests the sink's money style; it never changes the value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellWrite {
    Blank,
    Number { value: f64, money: bool },
    Text(String),
}

/// Convert an extracted value plus its column's money flag into a cell
/// write instruction. There is no failure path: anything that does not
/// match a typed rule falls back to its textual representation.
pub fn coerce(value: Option<&Value>, money: bool) -> CellWrite {
    let Some(value) = value else {
        return CellWrite::Blank;
    };

    match value {
        Value::Int(n) => {
            if money {
                CellWrite::Number {
                    value: scale_minor_units(*n),
                    money: true,
                }
            } else {
                CellWrite::Number {
                    value: *n as f64,
                    money: false,
                }
            }
        }
        // Floats pass through unrounded; a money column still gets the style.
        Value::Float(f) => CellWrite::Number { value: *f, money },
        Value::Text(s) => {
            if money && NUMERIC_PATTERN.is_match(s) {
                match s.parse::<f64>() {
                    Ok(parsed) => CellWrite::Number {
                        value: parsed,
                        money: true,
                    },
                    Err(_) => CellWrite::Text(s.clone()),
                }
            } else {
                CellWrite::Text(s.clone())
            }
        }
        Value::Date(d) => CellWrite::Text(d.format(DATE_FORMAT).to_string()),
        Value::DateTime(dt) => CellWrite::Text(dt.format(DATETIME_FORMAT).to_string()),
        Value::Timestamp(ts) => CellWrite::Text(ts.format(DATETIME_FORMAT).to_string()),
        Value::Bool(b) => CellWrite::Text(b.to_string()),
    }
}

/// Reinterpret an integer as minor currency units: divide by 100 and round
/// half-up to two decimal places.
fn scale_minor_units(minor_units: i64) -> f64 {
    let amount = (Decimal::from(minor_units) / Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.to_f64().unwrap_or_default()
}
