use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated input while reading {what}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Short read on page {page}: expected {expected} bytes, got {actual}")]
    ShortRead {
        page: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid page size {0}")]
    InvalidPageSize(u32),

    #[error("Invalid page number {0}")]
    InvalidPageNumber(u32),

    #[error("Unrecognized cell type: {0:#04x}")]
    UnrecognizedCellType(u8),

    #[error("Cell pointer {offset} out of range on page {page} (valid: {min}..{max})")]
    CellPointerOutOfRange {
        page: u32,
        offset: u16,
        min: usize,
        max: usize,
    },

    #[error("Payload of {declared} bytes exceeds the {available} bytes left in the page (overflow pages are not supported)")]
    PayloadOverflow { declared: u64, available: usize },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("Unknown object type: {0}")]
    UnknownObjectType(String),

    #[error("Table '{0}' not found")]
    SchemaNotFound(String),

    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { column: String, table: String },

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Table '{table}' spans more than one page (root page {page} has type {page_type:#04x})")]
    UnsupportedTableLayout {
        table: String,
        page: u32,
        page_type: u8,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

pub type Result<T> = std::result::Result<T, Error>;
