//! Chart suggestions for tabular results
//!
//! Charting is best effort: anything unexpected in the data simply means no
//! chart is suggested.

use crate::backend::Row;
use serde_json::Value;
use std::collections::HashSet;

/// Upper bound (exclusive) on distinct categories for a bar chart
const MAX_CATEGORIES: usize = 50;

/// Kind of chart to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
}

/// A renderable chart description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    /// Categorical column on the x axis
    pub x: String,
    /// Numeric column on the y axis
    pub y: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Categorical,
    /// Only booleans (and nulls); never charted
    Boolean,
}

/// Column names in first-seen order across all rows
pub fn columns(rows: &[Row]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                ordered.push(key.as_str());
            }
        }
    }
    ordered
}

/// Suggest a chart for a result set, if one makes sense.
pub fn suggest(rows: &[Row]) -> Option<ChartSpec> {
    let columns = columns(rows);
    if rows.is_empty() || columns.len() < 2 {
        return None;
    }

    let kinds: Vec<(&str, ColumnKind)> = columns
        .iter()
        .map(|&column| (column, classify(rows, column)))
        .collect();
    let x = kinds
        .iter()
        .find(|(_, kind)| *kind == ColumnKind::Categorical)?
        .0;
    let y = kinds
        .iter()
        .find(|(_, kind)| *kind == ColumnKind::Numeric)?
        .0;

    let categories = distinct_values(rows, x);
    if categories <= 1 || categories >= MAX_CATEGORIES {
        tracing::debug!(column = x, categories, "No chart: category count out of range");
        return None;
    }

    Some(ChartSpec {
        kind: ChartKind::Bar,
        x: x.to_string(),
        y: y.to_string(),
        title: format!("{y} by {x}"),
    })
}

/// Extract `(label, value)` pairs for a bar chart.
///
/// Rows with a null label or a non-numeric value are skipped.
pub fn bar_points(rows: &[Row], spec: &ChartSpec) -> Vec<(String, f64)> {
    rows.iter()
        .filter_map(|row| {
            let label = match row.get(&spec.x)? {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let value = numeric_value(row.get(&spec.y)?)?;
            Some((label, value))
        })
        .collect()
}

/// Numeric only if at least one value is present and every non-null value
/// is a number (or a string holding one).
fn classify(rows: &[Row], column: &str) -> ColumnKind {
    let mut present = false;
    let mut all_numeric = true;
    let mut all_boolean = true;

    for value in rows.iter().filter_map(|row| row.get(column)) {
        if value.is_null() {
            continue;
        }
        present = true;
        all_numeric &= numeric_value(value).is_some();
        all_boolean &= value.is_boolean();
    }

    if !present {
        ColumnKind::Categorical
    } else if all_boolean {
        ColumnKind::Boolean
    } else if all_numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn distinct_values(rows: &[Row], column: &str) -> usize {
    rows.iter()
        .filter_map(|row| row.get(column))
        .filter(|value| !value.is_null())
        .map(Value::to_string)
        .collect::<HashSet<_>>()
        .len()
}
