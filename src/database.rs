use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::executor::{self, QueryOutput};
use crate::page::Page;
use crate::query::Query;
use crate::schema::{schema_objects, Schema, SchemaObject};
use crate::DB_HEADER_SIZE;

const PAGE_SIZE_OFFSET: usize = 16;
const SCHEMA_PAGE: u32 = 1;

/// A read-only database file. Every access re-reads its page from the source.
pub struct Database<R = BufReader<File>> {
    source: R,
    page_size: usize,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened database");
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> Database<R> {
    pub fn from_reader(mut source: R) -> Result<Self> {
        let page_size = Self::read_page_size(&mut source)?;
        Ok(Self { source, page_size })
    }

    fn read_page_size(source: &mut R) -> Result<usize> {
        source.seek(SeekFrom::Start(0))?;
        let mut header = Vec::with_capacity(DB_HEADER_SIZE);
        source.by_ref().take(DB_HEADER_SIZE as u64).read_to_end(&mut header)?;
        if header.len() != DB_HEADER_SIZE {
            return Err(Error::ShortRead {
                page: SCHEMA_PAGE,
                expected: DB_HEADER_SIZE,
                actual: header.len(),
            });
        }

        let raw = u16::from_be_bytes([header[PAGE_SIZE_OFFSET], header[PAGE_SIZE_OFFSET + 1]]);
        // 65536 does not fit in two bytes and is stored as 1.
        let page_size = if raw == 1 { 65_536 } else { raw as u32 };
        if !page_size.is_power_of_two() || !(512..=65_536).contains(&page_size) {
            return Err(Error::InvalidPageSize(page_size));
        }
        Ok(page_size as usize)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn read_page(&mut self, page_number: u32) -> Result<Page> {
        Page::read(&mut self.source, self.page_size, page_number)
    }

    pub fn schema_page(&mut self) -> Result<Page> {
        self.read_page(SCHEMA_PAGE)
    }

    /// Number of rows in the schema table, as reported by its page header.
    pub fn table_count(&mut self) -> Result<usize> {
        Ok(self.schema_page()?.header.cell_count as usize)
    }

    /// Get all schema objects (tables, indexes, etc.) from the schema table
    pub fn schema_objects(&mut self) -> Result<Vec<SchemaObject>> {
        schema_objects(&self.schema_page()?)
    }

    pub fn table_names(&mut self) -> Result<Vec<String>> {
        Ok(self
            .schema_objects()?
            .into_iter()
            .filter(|obj| obj.object_type == "table")
            .map(|obj| obj.tbl_name)
            .collect())
    }

    pub fn schema(&mut self, table: &str) -> Result<Schema> {
        Schema::resolve(&self.schema_page()?, table)
    }

    pub fn execute(&mut self, query: &Query) -> Result<QueryOutput> {
        let schema = self.schema(&query.table)?;
        let table_page = self.read_page(schema.root_page)?;
        executor::execute(query, &schema, &table_page)
    }

    pub fn query(&mut self, sql: &str) -> Result<QueryOutput> {
        self.execute(&Query::parse(sql)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn header_with_page_size(raw: u16) -> Vec<u8> {
        let mut data = vec![0u8; DB_HEADER_SIZE];
        data[..16].copy_from_slice(b"SQLite format 3\0");
        data[PAGE_SIZE_OFFSET..PAGE_SIZE_OFFSET + 2].copy_from_slice(&raw.to_be_bytes());
        data
    }

    #[test]
    fn reads_page_size() {
        let db = Database::from_reader(Cursor::new(header_with_page_size(4096))).unwrap();
        assert_eq!(db.page_size(), 4096);
    }

    #[test]
    fn one_means_sixty_four_kib() {
        let db = Database::from_reader(Cursor::new(header_with_page_size(1))).unwrap();
        assert_eq!(db.page_size(), 65_536);
    }

    #[test]
    fn rejects_bad_page_sizes() {
        for raw in [0, 256, 1000, 3000] {
            let err = Database::from_reader(Cursor::new(header_with_page_size(raw)))
                .err()
                .unwrap();
            assert!(matches!(err, Error::InvalidPageSize(_)), "{raw}");
        }
    }

    #[test]
    fn short_file_header() {
        let err = Database::from_reader(Cursor::new(vec![0u8; 40])).err().unwrap();
        assert!(matches!(
            err,
            Error::ShortRead {
                expected: DB_HEADER_SIZE,
                actual: 40,
                ..
            }
        ));
    }
}
