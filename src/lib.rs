pub mod cell;
pub mod commands;
pub mod database;
pub mod error;
pub mod executor;
pub mod page;
pub mod query;
pub mod record;
pub mod schema;
pub mod varint;

// Common constants
pub const DB_HEADER_SIZE: usize = 100;
pub const BTREE_HEADER_SIZE: usize = 8;
pub const BTREE_INTERIOR_HEADER_SIZE: usize = 12;

// Re-export main types for convenience
pub use cell::Cell;
pub use commands::{execute_command, run_command};
pub use database::Database;
pub use error::{Error, Result};
pub use executor::{execute, QueryOutput};
pub use page::{Page, PageHeader, PageType};
pub use query::{Operator, Predicate, Query, COUNT_STAR};
pub use record::{Record, SerialType, Value};
pub use schema::{Column, Index, ObjectType, Schema, SchemaObject};
