use std::io::{Read, Seek, SeekFrom};

use bytes::Bytes;
use tracing::trace;

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::{BTREE_HEADER_SIZE, BTREE_INTERIOR_HEADER_SIZE, DB_HEADER_SIZE};

// B-tree page types
const INTERIOR_INDEX_PAGE: u8 = 0x02;
const INTERIOR_TABLE_PAGE: u8 = 0x05;
const LEAF_INDEX_PAGE: u8 = 0x0a;
const LEAF_TABLE_PAGE: u8 = 0x0d;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    IndexInterior,
    TableInterior,
    IndexLeaf,
    TableLeaf,
}

impl PageType {
    pub fn tag(self) -> u8 {
        match self {
            PageType::IndexInterior => INTERIOR_INDEX_PAGE,
            PageType::TableInterior => INTERIOR_TABLE_PAGE,
            PageType::IndexLeaf => LEAF_INDEX_PAGE,
            PageType::TableLeaf => LEAF_TABLE_PAGE,
        }
    }

    pub fn is_interior(self) -> bool {
        matches!(self, PageType::IndexInterior | PageType::TableInterior)
    }

    /// Size of the B-tree page header; interior pages carry the right-most pointer.
    pub fn header_size(self) -> usize {
        if self.is_interior() {
            BTREE_INTERIOR_HEADER_SIZE
        } else {
            BTREE_HEADER_SIZE
        }
    }
}

impl TryFrom<u8> for PageType {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            INTERIOR_INDEX_PAGE => Ok(PageType::IndexInterior),
            INTERIOR_TABLE_PAGE => Ok(PageType::TableInterior),
            LEAF_INDEX_PAGE => Ok(PageType::IndexLeaf),
            LEAF_TABLE_PAGE => Ok(PageType::TableLeaf),
            other => Err(Error::UnrecognizedCellType(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub first_freeblock: u16,
    pub cell_count: u16,
    pub cell_content_start: u16,
    pub fragmented_free_bytes: u8,
    pub right_most_pointer: Option<u32>,
}

impl PageHeader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let tag = *data.first().ok_or(Error::TruncatedInput {
            what: "page header",
            needed: BTREE_HEADER_SIZE,
            available: 0,
        })?;
        let page_type = PageType::try_from(tag)?;
        let size = page_type.header_size();
        if data.len() < size {
            return Err(Error::TruncatedInput {
                what: "page header",
                needed: size,
                available: data.len(),
            });
        }

        let right_most_pointer = page_type
            .is_interior()
            .then(|| u32::from_be_bytes([data[8], data[9], data[10], data[11]]));

        Ok(PageHeader {
            page_type,
            first_freeblock: u16::from_be_bytes([data[1], data[2]]),
            cell_count: u16::from_be_bytes([data[3], data[4]]),
            cell_content_start: u16::from_be_bytes([data[5], data[6]]),
            fragmented_free_bytes: data[7],
            right_most_pointer,
        })
    }

    pub fn size(&self) -> usize {
        self.page_type.header_size()
    }
}

/// One page of the file. `data` starts at the page's own offset 0, so cell
/// pointers index it directly, page 1 included.
#[derive(Debug, Clone)]
pub struct Page {
    pub number: u32,
    pub header: PageHeader,
    pub cell_pointers: Vec<u16>,
    pub data: Bytes,
}

impl Page {
    pub fn read<R: Read + Seek>(source: &mut R, page_size: usize, page_number: u32) -> Result<Self> {
        if page_number == 0 {
            return Err(Error::InvalidPageNumber(page_number));
        }
        let offset = (page_number as u64 - 1) * page_size as u64;
        source.seek(SeekFrom::Start(offset))?;

        let mut data = Vec::with_capacity(page_size);
        source.by_ref().take(page_size as u64).read_to_end(&mut data)?;
        if data.len() != page_size {
            return Err(Error::ShortRead {
                page: page_number,
                expected: page_size,
                actual: data.len(),
            });
        }

        let page = Self::from_bytes(Bytes::from(data), page_number)?;
        trace!(
            page = page_number,
            page_type = ?page.header.page_type,
            cells = page.cell_pointers.len(),
            "read page"
        );
        Ok(page)
    }

    pub fn from_bytes(data: Bytes, page_number: u32) -> Result<Self> {
        let header_offset = Self::header_offset(page_number);
        let header = PageHeader::from_bytes(data.get(header_offset..).unwrap_or_default())?;

        let ptr_start = header_offset + header.size();
        let ptr_end = ptr_start + header.cell_count as usize * 2;
        let pointer_array = data.get(ptr_start..ptr_end).ok_or(Error::TruncatedInput {
            what: "cell pointer array",
            needed: ptr_end - ptr_start,
            available: data.len().saturating_sub(ptr_start),
        })?;

        let cell_pointers: Vec<u16> = pointer_array
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();

        if let Some(&offset) = cell_pointers
            .iter()
            .find(|&&offset| !(ptr_end..data.len()).contains(&(offset as usize)))
        {
            return Err(Error::CellPointerOutOfRange {
                page: page_number,
                offset,
                min: ptr_end,
                max: data.len(),
            });
        }

        Ok(Page {
            number: page_number,
            header,
            cell_pointers,
            data,
        })
    }

    /// Page 1 starts with the file header; its B-tree header follows it.
    pub fn header_offset(page_number: u32) -> usize {
        if page_number == 1 {
            DB_HEADER_SIZE
        } else {
            0
        }
    }

    pub fn page_type(&self) -> PageType {
        self.header.page_type
    }

    pub fn cell_count(&self) -> usize {
        self.cell_pointers.len()
    }

    pub fn cell(&self, index: usize) -> Option<Result<Cell>> {
        self.cell_pointers
            .get(index)
            .map(|&offset| Cell::from_bytes(&self.data, offset as usize, self.page_type()))
    }

    /// Cells in pointer-array order.
    pub fn cells(&self) -> impl Iterator<Item = Result<Cell>> + '_ {
        self.cell_pointers
            .iter()
            .map(|&offset| Cell::from_bytes(&self.data, offset as usize, self.page_type()))
    }
}
