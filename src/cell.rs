use bytes::{Buf, Bytes};

use crate::error::{Error, Result};
use crate::page::PageType;
use crate::record::Record;
use crate::varint::read_varint;

/// One cell, shaped by the type of the page it lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    TableInterior { left_child_page: u32, row_id: i64 },
    TableLeaf { row_id: i64, payload: Bytes },
    IndexInterior { left_child_page: u32, payload: Bytes },
    IndexLeaf { payload: Bytes },
}

impl Cell {
    /// Decode the cell starting at `offset` within `page_data`.
    pub fn from_bytes(page_data: &Bytes, offset: usize, page_type: PageType) -> Result<Self> {
        if offset >= page_data.len() {
            return Err(Error::TruncatedInput {
                what: "cell",
                needed: 1,
                available: 0,
            });
        }
        let mut buf = page_data.slice(offset..);

        let cell = match page_type {
            PageType::TableLeaf => {
                let payload_size = take_varint(&mut buf)?;
                let row_id = take_varint(&mut buf)? as i64;
                let payload = take_payload(&mut buf, payload_size)?;
                Cell::TableLeaf { row_id, payload }
            }
            PageType::TableInterior => {
                let left_child_page = take_u32(&mut buf)?;
                let row_id = take_varint(&mut buf)? as i64;
                Cell::TableInterior {
                    left_child_page,
                    row_id,
                }
            }
            PageType::IndexLeaf => {
                let payload_size = take_varint(&mut buf)?;
                let payload = take_payload(&mut buf, payload_size)?;
                Cell::IndexLeaf { payload }
            }
            PageType::IndexInterior => {
                let left_child_page = take_u32(&mut buf)?;
                let payload_size = take_varint(&mut buf)?;
                let payload = take_payload(&mut buf, payload_size)?;
                Cell::IndexInterior {
                    left_child_page,
                    payload,
                }
            }
        };
        Ok(cell)
    }

    /// Decode a cell for a raw page-type tag, as stored in the page header.
    pub fn from_tagged_bytes(page_data: &Bytes, offset: usize, page_type: u8) -> Result<Self> {
        Self::from_bytes(page_data, offset, PageType::try_from(page_type)?)
    }

    pub fn row_id(&self) -> Option<i64> {
        match self {
            Cell::TableInterior { row_id, .. } | Cell::TableLeaf { row_id, .. } => Some(*row_id),
            _ => None,
        }
    }

    pub fn left_child_page(&self) -> Option<u32> {
        match self {
            Cell::TableInterior { left_child_page, .. }
            | Cell::IndexInterior { left_child_page, .. } => Some(*left_child_page),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            Cell::TableLeaf { payload, .. }
            | Cell::IndexInterior { payload, .. }
            | Cell::IndexLeaf { payload } => Some(payload),
            Cell::TableInterior { .. } => None,
        }
    }

    /// Decode the payload as a record. Interior table cells carry none.
    pub fn record(&self) -> Result<Option<Record>> {
        self.payload().map(|p| Record::from_bytes(p)).transpose()
    }
}

fn take_varint(buf: &mut Bytes) -> Result<u64> {
    let (value, bytes_read) = read_varint(buf, 0)?;
    buf.advance(bytes_read);
    Ok(value)
}

fn take_u32(buf: &mut Bytes) -> Result<u32> {
    if buf.remaining() < 4 {
        return Err(Error::TruncatedInput {
            what: "left child pointer",
            needed: 4,
            available: buf.remaining(),
        });
    }
    Ok(buf.get_u32())
}

fn take_payload(buf: &mut Bytes, payload_size: u64) -> Result<Bytes> {
    match usize::try_from(payload_size) {
        Ok(len) if len <= buf.remaining() => Ok(buf.split_to(len)),
        _ => Err(Error::PayloadOverflow {
            declared: payload_size,
            available: buf.remaining(),
        }),
    }
}
