use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};
use crate::page::{Page, PageType};
use crate::record::{Record, Value};

/// Leading keywords of table-constraint entries in a column list.
const TABLE_CONSTRAINTS: [&str; 4] = ["CONSTRAINT", "CHECK", "UNIQUE", "FOREIGN"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Table,
    Index,
}

impl FromStr for ObjectType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(ObjectType::Table),
            "index" => Ok(ObjectType::Index),
            other => Err(Error::UnknownObjectType(other.to_string())),
        }
    }
}

/// One row of the schema table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaObject {
    pub object_type: String, // "table", "index", "view", etc.
    pub name: String,
    pub tbl_name: String, // table this object belongs to
    pub root_page: u32,   // 0 for views and triggers
    pub sql: Option<String>,
}

impl SchemaObject {
    pub fn from_record(record: &Record) -> Result<Self> {
        let text = |index: usize, field: &str| {
            let value = record.get(index);
            value.and_then(Value::as_text).map(str::to_string).ok_or_else(|| {
                Error::MalformedRecord(format!("schema {field} should be text, found {value:?}"))
            })
        };

        let sql = record.get(4).and_then(Value::as_text).map(str::to_string);

        Ok(SchemaObject {
            object_type: text(0, "type")?,
            name: text(1, "name")?,
            tbl_name: text(2, "tbl_name")?,
            root_page: root_page_from(record.get(3))?,
            sql,
        })
    }
}

/// The root page column is stored in whatever integer width fits, and small
/// page numbers can even collapse to the constant serial types.
fn root_page_from(value: Option<&Value>) -> Result<u32> {
    value
        .and_then(Value::as_integer)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| Error::MalformedRecord(format!("invalid root page {value:?}")))
}

/// Decode every row of the schema page in cell-pointer order.
pub fn schema_objects(page: &Page) -> Result<Vec<SchemaObject>> {
    if page.page_type() != PageType::TableLeaf {
        return Err(Error::UnsupportedTableLayout {
            table: "sqlite_schema".to_string(),
            page: page.number,
            page_type: page.page_type().tag(),
        });
    }

    page.cells()
        .map(|cell| {
            let cell = cell?;
            let payload = cell.payload().map(|p| p.as_ref()).unwrap_or_default();
            SchemaObject::from_record(&Record::from_bytes(payload)?)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub declared_type: String,
    pub ordinal: usize,
    pub is_integer_primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub column: String,
    pub column_ordinal: usize,
    pub root_page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub table_name: String,
    pub columns: Vec<Column>,
    pub root_page: u32,
    pub index: Option<Index>,
}

impl Schema {
    /// Build the schema of `table` from the rows of the schema page.
    pub fn resolve(schema_page: &Page, table: &str) -> Result<Self> {
        let mut table_row = None;
        let mut index_rows = Vec::new();

        for object in schema_objects(schema_page)? {
            if !object.tbl_name.eq_ignore_ascii_case(table) {
                continue;
            }
            match object.object_type.parse::<ObjectType>()? {
                ObjectType::Table if table_row.is_none() => table_row = Some(object),
                ObjectType::Table => {}
                ObjectType::Index => index_rows.push(object),
            }
        }

        let table_row = table_row.ok_or_else(|| Error::SchemaNotFound(table.to_string()))?;
        let sql = table_row.sql.as_deref().ok_or_else(|| {
            Error::InvalidDefinition(format!("table {} has no definition", table_row.name))
        })?;

        let mut schema = Schema {
            columns: Self::parse_columns(sql)?,
            table_name: table_row.name,
            root_page: table_row.root_page,
            index: None,
        };

        // Automatic indexes have no definition text; expression indexes have no plain column.
        for row in index_rows {
            let Some(column) = row.sql.as_deref().map(parse_index_column).transpose()?.flatten() else {
                continue;
            };
            let column_ordinal = schema.column(&column)?.ordinal;
            schema.index = Some(Index {
                name: row.name,
                column,
                column_ordinal,
                root_page: row.root_page,
            });
            break;
        }

        debug!(
            table = %schema.table_name,
            root_page = schema.root_page,
            columns = schema.columns.len(),
            index = ?schema.index.as_ref().map(|i| &i.name),
            "resolved schema"
        );
        Ok(schema)
    }

    pub fn parse_columns(sql: &str) -> Result<Vec<Column>> {
        // Extract column definitions between parentheses
        let start = sql
            .find('(')
            .ok_or_else(|| Error::InvalidDefinition(format!("no opening parenthesis in {sql:?}")))?;
        let end = sql
            .rfind(')')
            .ok_or_else(|| Error::InvalidDefinition(format!("no closing parenthesis in {sql:?}")))?;

        if start >= end {
            return Err(Error::InvalidDefinition(format!("invalid parentheses in {sql:?}")));
        }

        let mut columns: Vec<Column> = Vec::new();
        let mut table_primary_key = None;
        for part in split_top_level(&sql[start + 1..end]) {
            let definition = part.trim();
            if definition.is_empty() {
                continue;
            }
            if is_table_constraint(definition) {
                table_primary_key = table_primary_key.or_else(|| primary_key_columns(definition));
                continue;
            }

            let (name, declared_type) = split_name(definition);
            let normalized = normalize(declared_type);

            columns.push(Column {
                name,
                declared_type: declared_type.to_string(),
                ordinal: columns.len(),
                is_integer_primary_key: is_integer_type(declared_type)
                    && normalized.contains("PRIMARY KEY"),
            });
        }

        // `PRIMARY KEY (x)` on a single INTEGER column is a rowid alias too.
        if let Some([key]) = table_primary_key.as_deref() {
            if let Some(column) = columns.iter_mut().find(|c| c.name.eq_ignore_ascii_case(key)) {
                column.is_integer_primary_key |= is_integer_type(&column.declared_type);
            }
        }

        Ok(columns)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|col| col.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::ColumnNotFound {
                column: name.to_string(),
                table: self.table_name.clone(),
            })
    }
}

/// Name of the (first) indexed column in a `CREATE INDEX` statement, or
/// `None` when the leading key is an expression rather than a column.
pub fn parse_index_column(sql: &str) -> Result<Option<String>> {
    let inner = sql
        .find('(')
        .and_then(|start| enclosed(&sql[start..]))
        .ok_or_else(|| Error::InvalidDefinition(format!("no column list in {sql:?}")))?;

    let first = split_top_level(inner).first().copied().unwrap_or_default().trim();
    let (name, rest) = split_name(first);
    if name.is_empty() {
        return Err(Error::InvalidDefinition(format!("empty column list in {sql:?}")));
    }

    let quoted = first.starts_with(['"', '`', '[']);
    let plain = name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$');
    let ordering = rest.split_whitespace().next().map_or(true, |word| {
        ["ASC", "DESC", "COLLATE"].iter().any(|k| word.eq_ignore_ascii_case(k))
    });
    Ok(((quoted || plain) && ordering).then_some(name))
}

/// Text between the opening parenthesis at the start of `text` and its match.
fn enclosed(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 1 => return Some(&text[1..i]),
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// Columns named by a table-level `PRIMARY KEY (...)` constraint.
fn primary_key_columns(definition: &str) -> Option<Vec<String>> {
    let upper = definition.to_ascii_uppercase();
    let key = upper.find("PRIMARY")?;
    let open = key + upper[key..].find('(')?;
    if !normalize(&definition[key..open]).eq_ignore_ascii_case("PRIMARY KEY") {
        return None;
    }
    let list = enclosed(&definition[open..])?;
    Some(
        split_top_level(list)
            .into_iter()
            .map(|part| split_name(part.trim()).0)
            .collect(),
    )
}

fn is_integer_type(declared_type: &str) -> bool {
    declared_type
        .split_whitespace()
        .next()
        .is_some_and(|t| t.eq_ignore_ascii_case("INTEGER"))
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

/// Split on commas that are not nested inside parentheses or quotes.
fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in list.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '[') => quote = Some(']'),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&list[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

fn is_table_constraint(definition: &str) -> bool {
    let mut words = definition.split_whitespace().map(str::to_uppercase);
    match words.next() {
        Some(first) if first == "PRIMARY" => words.next().is_some_and(|w| w.starts_with("KEY")),
        Some(first) => TABLE_CONSTRAINTS
            .iter()
            .any(|kw| first == *kw || first.starts_with(&format!("{kw}("))),
        None => false,
    }
}

/// Split a definition into its (unquoted) leading identifier and the rest.
fn split_name(definition: &str) -> (String, &str) {
    let close = match definition.chars().next() {
        Some('"') => Some('"'),
        Some('`') => Some('`'),
        Some('[') => Some(']'),
        _ => None,
    };

    if let Some(close) = close {
        if let Some(end) = definition[1..].find(close) {
            let name = definition[1..1 + end].to_string();
            return (name, definition[end + 2..].trim());
        }
    }

    match definition.find(char::is_whitespace) {
        Some(end) => (definition[..end].to_string(), definition[end..].trim()),
        None => (definition.to_string(), ""),
    }
}
