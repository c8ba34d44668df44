use crate::error::{Error, Result};

/// Largest value that still fits the 8 x 7-bit form; anything above needs the 9-byte form.
const SEVEN_BIT_GROUPS_MAX: u64 = 0x00FF_FFFF_FFFF_FFFF;

/// Read a variable-length integer from the given data at the specified offset
/// Returns (value, bytes_read)
pub fn read_varint(data: &[u8], offset: usize) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    let mut bytes_read = 0;

    // Varints are at most 9 bytes
    for i in 0..9 {
        let Some(&byte) = data.get(offset + bytes_read) else {
            return Err(Error::TruncatedInput {
                what: "varint",
                needed: bytes_read + 1,
                available: data.len().saturating_sub(offset),
            });
        };
        bytes_read += 1;

        if i == 8 {
            // 9th byte: take all 8 bits
            value = (value << 8) | byte as u64;
            break;
        }

        // High-order group comes first → shift before OR'ing
        value = (value << 7) | (byte & 0x7F) as u64;
        // msb 0 → this was the last byte
        if (byte & 0x80) == 0 {
            break;
        }
    }

    Ok((value, bytes_read))
}

/// Encode `value` in the shortest varint form (1 to 9 bytes).
pub fn encode_varint(value: u64) -> Vec<u8> {
    if value > SEVEN_BIT_GROUPS_MAX {
        let mut out = vec![0u8; 9];
        out[8] = value as u8;
        let mut rest = value >> 8;
        for byte in out[..8].iter_mut().rev() {
            *byte = 0x80 | (rest & 0x7F) as u8;
            rest >>= 7;
        }
        return out;
    }

    let mut out = Vec::with_capacity(8);
    let mut rest = value;
    loop {
        out.push((rest & 0x7F) as u8);
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    out.reverse();
    let last = out.len() - 1;
    for byte in &mut out[..last] {
        *byte |= 0x80;
    }
    out
}
