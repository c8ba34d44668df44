use std::fmt;

use crate::error::{Error, Result};
use crate::varint::read_varint;

/// Storage class of one column, taken from the record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    /// Big-endian two's-complement integer of the given byte width (1, 2, 3, 4, 6 or 8).
    Int(usize),
    Float,
    Zero,
    One,
    /// Codes 10 and 11, reserved for internal use.
    Reserved(u64),
    Blob(usize),
    Text(usize),
}

impl SerialType {
    pub fn from_code(code: u64) -> Result<Self> {
        let serial_type = match code {
            0 => SerialType::Null,
            1 => SerialType::Int(1),
            2 => SerialType::Int(2),
            3 => SerialType::Int(3),
            4 => SerialType::Int(4),
            5 => SerialType::Int(6),
            6 => SerialType::Int(8),
            7 => SerialType::Float,
            8 => SerialType::Zero,
            9 => SerialType::One,
            10 | 11 => SerialType::Reserved(code),
            n if n % 2 == 0 => SerialType::Blob(Self::derived_len(n, 12)?),
            n => SerialType::Text(Self::derived_len(n, 13)?),
        };
        Ok(serial_type)
    }

    fn derived_len(code: u64, base: u64) -> Result<usize> {
        usize::try_from((code - base) / 2)
            .map_err(|_| Error::MalformedRecord(format!("serial type {code} is too large")))
    }

    /// Number of bytes this column occupies in the record body.
    pub fn content_size(&self) -> usize {
        match *self {
            SerialType::Null | SerialType::Zero | SerialType::One | SerialType::Reserved(_) => 0,
            SerialType::Int(width) => width,
            SerialType::Float => 8,
            SerialType::Blob(len) | SerialType::Text(len) => len,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Zero,
    One,
    Reserved(u64),
    Blob(Vec<u8>),
    Text(String),
}

impl Value {
    fn decode(serial_type: SerialType, data: &[u8]) -> Self {
        match serial_type {
            SerialType::Null => Value::Null,
            SerialType::Int(_) => Value::Integer(sign_extend(data)),
            SerialType::Float => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(data);
                Value::Float(f64::from_be_bytes(bytes))
            }
            SerialType::Zero => Value::Zero,
            SerialType::One => Value::One,
            SerialType::Reserved(code) => Value::Reserved(code),
            SerialType::Blob(_) => Value::Blob(data.to_vec()),
            SerialType::Text(_) => Value::Text(String::from_utf8_lossy(data).into_owned()),
        }
    }

    /// Integer view of the value; the constant serial types count as integers.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Zero => Some(0),
            Value::One => Some(1),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Zero => f.write_str("0"),
            Value::One => f.write_str("1"),
            Value::Reserved(code) => write!(f, "<RESERVED {code}>"),
            Value::Blob(b) => f.write_str(&String::from_utf8_lossy(b)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

fn sign_extend(bytes: &[u8]) -> i64 {
    let mut padded = if bytes.first().is_some_and(|b| b & 0x80 != 0) {
        [0xFF; 8]
    } else {
        [0; 8]
    };
    padded[8 - bytes.len()..].copy_from_slice(bytes);
    i64::from_be_bytes(padded)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub header_size: usize,
    pub serial_types: Vec<SerialType>,
    pub values: Vec<Value>,
}

impl Record {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        // A zero-length payload carries no header at all.
        if data.is_empty() {
            return Ok(Record {
                header_size: 0,
                serial_types: Vec::new(),
                values: Vec::new(),
            });
        }

        let (header_size, mut pos) = read_varint(data, 0)?;
        let header_size = usize::try_from(header_size)
            .ok()
            .filter(|size| (pos..=data.len()).contains(size))
            .ok_or_else(|| {
                Error::MalformedRecord(format!(
                    "header size {header_size} outside {pos}..={}",
                    data.len()
                ))
            })?;

        let mut serial_types = Vec::new();
        while pos < header_size {
            let (code, bytes_read) = read_varint(data, pos)?;
            pos += bytes_read;
            serial_types.push(SerialType::from_code(code)?);
        }
        if pos != header_size {
            return Err(Error::MalformedRecord(format!(
                "serial types end at byte {pos}, header declares {header_size}"
            )));
        }

        let mut values = Vec::with_capacity(serial_types.len());
        let mut offset = header_size;
        for &serial_type in &serial_types {
            let size = serial_type.content_size();
            let body = data.get(offset..offset + size).ok_or(Error::TruncatedInput {
                what: "record value",
                needed: size,
                available: data.len() - offset,
            })?;
            values.push(Value::decode(serial_type, body));
            offset += size;
        }

        Ok(Record {
            header_size,
            serial_types,
            values,
        })
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
