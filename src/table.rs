//! Schema-inferring table renderer.
//!
//! Renders any slice of uniform flat records without per-table
//! boilerplate. Columns are inferred from the first record's field
//! order; a pluggable row strategy turns each record into cells, so a
//! concrete table can restyle rows (e.g. flag best-known hits) without
//! reimplementing the shell.
//!
//! Inference uses only the first record. Records with differing key
//! sets render misaligned; the backend guarantees homogeneity per
//! table, so this is accepted rather than detected.

use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use serde::Serialize;

/// Turns one record into the cells of its rendered row. Implementations
/// read the record, never mutate it.
pub trait RowStrategy<R> {
    fn cells(&self, row: &R) -> Vec<Cell>;
}

/// Default strategy: every field value in field order, one cell each.
pub struct FieldOrder;

impl<R: Serialize> RowStrategy<R> for FieldOrder {
    fn cells(&self, row: &R) -> Vec<Cell> {
        record_fields(row)
            .iter()
            .map(|(_, value)| Cell::new(scalar_text(value)))
            .collect()
    }
}

/// Render with the default field-order strategy.
pub fn render<R: Serialize>(data: &[R]) -> Table {
    render_with(data, &FieldOrder)
}

/// Render one row per record, in input order, via `strategy`. The
/// renderer never sorts or filters.
pub fn render_with<R, S>(data: &[R], strategy: &S) -> Table
where
    R: Serialize,
    S: RowStrategy<R> + ?Sized,
{
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    match data.first() {
        Some(first) => {
            let header: Vec<Cell> = record_fields(first)
                .into_iter()
                .map(|(key, _)| Cell::new(key).add_attribute(Attribute::Bold))
                .collect();
            table.set_header(header);
            for row in data {
                table.add_row(strategy.cells(row));
            }
        }
        None => {
            table.set_header(vec![Cell::new("No data")]);
        }
    }
    table
}

/// Flatten a record into (column, value) pairs in field order. Struct
/// rows keep declaration order, dynamic rows keep insertion order
/// (serde_json `preserve_order`).
pub fn record_fields<R: Serialize>(row: &R) -> Vec<(String, serde_json::Value)> {
    match serde_json::to_value(row) {
        Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
        _ => Vec::new(),
    }
}

fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
