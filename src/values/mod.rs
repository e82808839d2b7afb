#[cfg(test)]
mod tests;

use itertools::Itertools;
use serde_json::Value;
use tracing::warn;

use crate::api::{ColumnType, TableColumn};
use crate::ingest::is_vector_literal;

/// Typed value produced for one destination column of an output row
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Json(Value),
}

impl From<FieldValue> for Value {
    #[inline]
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => Value::String(s),
            FieldValue::Integer(n) => Value::from(n),
            FieldValue::Float(n) => Value::from(n),
            FieldValue::Bool(b) => Value::Bool(b),
            FieldValue::Json(v) => v,
        }
    }
}

/// Combine the source values mapped to one destination column into a
/// single typed value.
///
/// Vector-typed destinations are never written here; they belong to the
/// embedding step. Returns `None` when nothing contributes, in which case
/// the destination key is omitted from the row entirely.
#[inline]
pub fn combine_values(column: Option<&TableColumn>, values: &[String]) -> Option<FieldValue> {
    let column_type = column.map(|c| &c.column_type);

    if column_type == Some(&ColumnType::FloatVector) {
        warn!(
            "Dropping direct value for vector column {:?}; vector columns are populated by embedding generation",
            column.map(|c| c.field.as_str())
        );
        return None;
    }

    // Embedded vector literals never coerce into scalar columns.
    let contributing: Vec<&String> = values
        .iter()
        .filter(|value| {
            if is_vector_literal(value) {
                warn!(
                    "Dropping vector literal mapped to non-vector column {:?}",
                    column.map(|c| c.field.as_str())
                );
                false
            } else {
                true
            }
        })
        .collect();

    match contributing.as_slice() {
        [] => None,
        [single] => Some(coerce_value(column_type, single)),
        multiple => Some(combine_multiple(column_type, multiple)),
    }
}

fn combine_multiple(column_type: Option<&ColumnType>, values: &[&String]) -> FieldValue {
    match column_type {
        Some(ColumnType::Json) => FieldValue::Json(Value::Array(
            values
                .iter()
                .map(|v| Value::String((*v).clone()))
                .collect(),
        )),
        Some(ColumnType::Integer | ColumnType::Bigint) => {
            FieldValue::Integer(values.iter().map(|v| parse_integer(v)).sum())
        }
        Some(ColumnType::Float) => FieldValue::Float(values.iter().map(|v| parse_float(v)).sum()),
        Some(ColumnType::Bool) => FieldValue::Bool(values.iter().any(|v| parse_bool(v))),
        // Text, timestamp, unknown types, and missing metadata all merge
        // as space-joined text.
        _ => FieldValue::Text(
            values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .join(" "),
        ),
    }
}

fn coerce_value(column_type: Option<&ColumnType>, value: &str) -> FieldValue {
    match column_type {
        Some(ColumnType::Integer | ColumnType::Bigint) => FieldValue::Integer(parse_integer(value)),
        Some(ColumnType::Float) => FieldValue::Float(parse_float(value)),
        Some(ColumnType::Bool) => FieldValue::Bool(parse_bool(value)),
        Some(ColumnType::Json) => match serde_json::from_str(value) {
            Ok(parsed) => FieldValue::Json(parsed),
            Err(_) => FieldValue::Json(Value::String(value.to_string())),
        },
        _ => FieldValue::Text(value.to_string()),
    }
}

/// Lenient integer parse: whole numbers directly, fractional input
/// truncated, anything else 0
fn parse_integer(value: &str) -> i64 {
    let trimmed = value.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
        .unwrap_or(0)
}

fn parse_float(value: &str) -> f64 {
    value.trim().parse::<f64>().unwrap_or(0.0)
}

fn parse_bool(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.eq_ignore_ascii_case("true") || trimmed == "1"
}
