use tracing::debug;

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::page::{Page, PageType};
use crate::query::Query;
use crate::record::{Record, Value};
use crate::schema::{Column, Schema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutput {
    Count(usize),
    Rows(Vec<Vec<String>>),
}

/// Run `query` against the root page of its table.
///
/// Only single-page tables are scanned: a root page that is not a leaf table
/// page is rejected rather than traversed.
pub fn execute(query: &Query, schema: &Schema, table_page: &Page) -> Result<QueryOutput> {
    if table_page.page_type() != PageType::TableLeaf {
        return Err(Error::UnsupportedTableLayout {
            table: schema.table_name.clone(),
            page: table_page.number,
            page_type: table_page.page_type().tag(),
        });
    }

    // Header fast path: no record is decoded.
    if query.is_count() && query.predicate.is_none() {
        return Ok(QueryOutput::Count(table_page.cell_count()));
    }

    let projection = if query.is_count() {
        Vec::new()
    } else {
        projection(query, schema)?
    };
    let filter = query
        .predicate
        .as_ref()
        .map(|p| schema.column(&p.column).map(|column| (p, column)))
        .transpose()?;

    let mut rows = Vec::new();
    let mut scanned = 0usize;
    for cell in table_page.cells() {
        let Cell::TableLeaf { row_id, payload } = cell? else {
            continue;
        };
        scanned += 1;
        let record = Record::from_bytes(&payload)?;

        if let Some((predicate, column)) = filter {
            if !predicate.matches(&column_value(&record, column, row_id))? {
                continue;
            }
        }

        rows.push(
            projection
                .iter()
                .map(|column| column_value(&record, column, row_id).to_string())
                .collect(),
        );
    }

    debug!(
        table = %schema.table_name,
        scanned,
        matched = rows.len(),
        "scanned table page"
    );

    if query.is_count() {
        Ok(QueryOutput::Count(rows.len()))
    } else {
        Ok(QueryOutput::Rows(rows))
    }
}

fn projection<'a>(query: &Query, schema: &'a Schema) -> Result<Vec<&'a Column>> {
    if query.columns.len() == 1 && query.columns[0] == "*" {
        return Ok(schema.columns.iter().collect());
    }
    query.columns.iter().map(|name| schema.column(name)).collect()
}

/// The integer primary key is stored as NULL in the record; its value is the rowid.
/// Columns past the end of the record read as NULL.
fn column_value(record: &Record, column: &Column, row_id: i64) -> Value {
    match record.get(column.ordinal) {
        Some(Value::Null) | None if column.is_integer_primary_key => Value::Integer(row_id),
        Some(value) => value.clone(),
        None => Value::Null,
    }
}
