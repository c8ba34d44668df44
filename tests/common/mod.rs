#![allow(dead_code)]

use std::io::Write;

use sqlite_scan::varint::encode_varint;
use sqlite_scan::DB_HEADER_SIZE;
use tempfile::NamedTempFile;

pub const PAGE_SIZE: usize = 4096;

pub const LEAF_TABLE: u8 = 0x0d;
pub const LEAF_INDEX: u8 = 0x0a;
pub const INTERIOR_TABLE: u8 = 0x05;

pub const APPLES_SQL: &str = "CREATE TABLE apples (id INTEGER PRIMARY KEY, name TEXT, color TEXT)";
pub const APPLES_INDEX_SQL: &str = "CREATE INDEX idx_apples_name ON apples (name)";

#[derive(Debug, Clone)]
pub enum Field {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

pub fn text(s: &str) -> Field {
    Field::Text(s.to_string())
}

/// Encode a record the way the file format stores it.
pub fn record(fields: &[Field]) -> Vec<u8> {
    let mut serial_types = Vec::new();
    let mut body = Vec::new();
    for field in fields {
        match field {
            Field::Null => serial_types.extend(encode_varint(0)),
            Field::Int(0) => serial_types.extend(encode_varint(8)),
            Field::Int(1) => serial_types.extend(encode_varint(9)),
            Field::Int(v) if i8::try_from(*v).is_ok() => {
                serial_types.extend(encode_varint(1));
                body.extend((*v as i8).to_be_bytes());
            }
            Field::Int(v) if i16::try_from(*v).is_ok() => {
                serial_types.extend(encode_varint(2));
                body.extend((*v as i16).to_be_bytes());
            }
            Field::Int(v) if i32::try_from(*v).is_ok() => {
                serial_types.extend(encode_varint(4));
                body.extend((*v as i32).to_be_bytes());
            }
            Field::Int(v) => {
                serial_types.extend(encode_varint(6));
                body.extend(v.to_be_bytes());
            }
            Field::Float(x) => {
                serial_types.extend(encode_varint(7));
                body.extend(x.to_be_bytes());
            }
            Field::Text(s) => {
                serial_types.extend(encode_varint(13 + 2 * s.len() as u64));
                body.extend(s.as_bytes());
            }
        }
    }

    let header_size = serial_types.len() + 1;
    assert!(header_size < 0x80, "fixture headers stay single-byte");
    let mut out = encode_varint(header_size as u64);
    out.extend(serial_types);
    out.extend(body);
    out
}

pub fn table_leaf_cell(row_id: i64, payload: &[u8]) -> Vec<u8> {
    let mut cell = encode_varint(payload.len() as u64);
    cell.extend(encode_varint(row_id as u64));
    cell.extend_from_slice(payload);
    cell
}

pub fn index_leaf_cell(payload: &[u8]) -> Vec<u8> {
    let mut cell = encode_varint(payload.len() as u64);
    cell.extend_from_slice(payload);
    cell
}

pub fn table_interior_cell(left_child: u32, row_id: i64) -> Vec<u8> {
    let mut cell = left_child.to_be_bytes().to_vec();
    cell.extend(encode_varint(row_id as u64));
    cell
}

/// Lay out one B-tree page: header, pointer array, cells packed from the end.
pub fn page(page_number: u32, page_type: u8, cells: &[Vec<u8>], right_most: Option<u32>) -> Vec<u8> {
    let mut data = vec![0u8; PAGE_SIZE];
    let header_offset = if page_number == 1 { DB_HEADER_SIZE } else { 0 };
    let header_size = if right_most.is_some() { 12 } else { 8 };

    let mut content_start = PAGE_SIZE;
    let mut pointers = Vec::new();
    for cell in cells {
        content_start -= cell.len();
        data[content_start..content_start + cell.len()].copy_from_slice(cell);
        pointers.push(content_start as u16);
    }

    data[header_offset] = page_type;
    data[header_offset + 3..header_offset + 5].copy_from_slice(&(cells.len() as u16).to_be_bytes());
    data[header_offset + 5..header_offset + 7].copy_from_slice(&(content_start as u16).to_be_bytes());
    if let Some(page) = right_most {
        data[header_offset + 8..header_offset + 12].copy_from_slice(&page.to_be_bytes());
    }
    for (i, ptr) in pointers.iter().enumerate() {
        let at = header_offset + header_size + i * 2;
        data[at..at + 2].copy_from_slice(&ptr.to_be_bytes());
    }
    data
}

pub fn schema_row(kind: &str, name: &str, tbl_name: &str, root_page: i64, sql: Option<&str>) -> Vec<u8> {
    record(&[
        text(kind),
        text(name),
        text(tbl_name),
        Field::Int(root_page),
        sql.map(text).unwrap_or(Field::Null),
    ])
}

/// Page 1 holds the schema rows; `pages` follow as pages 2, 3, ...
pub fn database(schema_rows: &[Vec<u8>], pages: Vec<Vec<u8>>) -> Vec<u8> {
    let cells: Vec<Vec<u8>> = schema_rows
        .iter()
        .enumerate()
        .map(|(i, row)| table_leaf_cell(i as i64 + 1, row))
        .collect();
    let mut file = page(1, LEAF_TABLE, &cells, None);
    file[..16].copy_from_slice(b"SQLite format 3\0");
    file[16..18].copy_from_slice(&(PAGE_SIZE as u16).to_be_bytes());
    for extra in pages {
        file.extend(extra);
    }
    file
}

pub fn apple_rows() -> Vec<Vec<u8>> {
    [(1, "Fuji", "Red"), (2, "Gala", "Yellow"), (3, "Honeycrisp", "Blush Red")]
        .iter()
        .map(|&(row_id, name, color)| {
            table_leaf_cell(row_id, &record(&[Field::Null, text(name), text(color)]))
        })
        .collect()
}

/// `apples` on page 2, an index on its `name` column on page 3.
pub fn apples_db() -> Vec<u8> {
    let index_cells: Vec<Vec<u8>> = [("Fuji", 1), ("Gala", 2), ("Honeycrisp", 3)]
        .iter()
        .map(|&(name, row_id)| index_leaf_cell(&record(&[text(name), Field::Int(row_id)])))
        .collect();

    database(
        &[
            schema_row("table", "apples", "apples", 2, Some(APPLES_SQL)),
            schema_row("index", "idx_apples_name", "apples", 3, Some(APPLES_INDEX_SQL)),
        ],
        vec![
            page(2, LEAF_TABLE, &apple_rows(), None),
            page(3, LEAF_INDEX, &index_cells, None),
        ],
    )
}

pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(bytes).expect("write database");
    file.flush().expect("flush database");
    file
}
