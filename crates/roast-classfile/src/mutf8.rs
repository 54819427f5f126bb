//! Modified UTF-8, the string encoding of CONSTANT_Utf8 entries.
//!
//! Differs from standard UTF-8 in two places: U+0000 is written as the two
//! bytes `C0 80`, and characters outside the BMP are written as a surrogate
//! pair with each half encoded on its own (six bytes in total).

/// Modified UTF-8 payload is malformed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("malformed modified UTF-8 at byte {offset}")]
pub struct InvalidMutf8 {
    pub offset: usize,
}

#[inline]
fn unit_len(unit: u16) -> usize {
    match unit {
        0x0001..=0x007F => 1,
        0x0000 | 0x0080..=0x07FF => 2,
        _ => 3,
    }
}

/// Number of bytes `text` occupies once encoded.
pub fn encoded_len(text: &str) -> usize {
    text.encode_utf16().map(unit_len).sum()
}

/// Encode `text` as modified UTF-8.
pub fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    encode_into(text, &mut out);
    out
}

/// Append the modified UTF-8 encoding of `text` to `out`.
pub fn encode_into(text: &str, out: &mut Vec<u8>) {
    for unit in text.encode_utf16() {
        match unit_len(unit) {
            1 => out.push(unit as u8),
            2 => {
                out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
}

/// Decode a modified UTF-8 payload.
pub fn decode(bytes: &[u8]) -> Result<String, InvalidMutf8> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    let continuation = |i: usize| -> Result<u16, InvalidMutf8> {
        match bytes.get(i) {
            Some(&b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
            _ => Err(InvalidMutf8 { offset: i }),
        }
    };

    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            if b == 0 {
                return Err(InvalidMutf8 { offset: i });
            }
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let low = continuation(i + 1)?;
            units.push(((b & 0x1F) as u16) << 6 | low);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let mid = continuation(i + 1)?;
            let low = continuation(i + 2)?;
            units.push(((b & 0x0F) as u16) << 12 | mid << 6 | low);
            i += 3;
        } else {
            return Err(InvalidMutf8 { offset: i });
        }
    }

    String::from_utf16(&units).map_err(|_| InvalidMutf8 { offset: bytes.len() })
}
