use crate::{error::InternalError, value::Value};
use thiserror::Error as ThisError;

// Component tags. Null sorts below every non-null value of a column; 0x01 is
// reserved for the hkey segment marker and is never a component tag.
const TAG_NULL: u8 = 0x00;
const TAG_BOOL: u8 = 0x10;
const TAG_INT: u8 = 0x20;
const TAG_UINT: u8 = 0x28;
const TAG_FLOAT: u8 = 0x30;
const TAG_TEXT: u8 = 0x40;

const ESCAPE: u8 = 0xFF;

///
/// OrderedValueEncodeError
///
/// Canonical key-encoding failures for one `Value` component.
///

#[derive(Debug, ThisError)]
pub(crate) enum OrderedValueEncodeError {
    #[error("value kind '{kind}' is not key-orderable")]
    UnsupportedValueKind { kind: &'static str },
}

impl From<OrderedValueEncodeError> for InternalError {
    fn from(err: OrderedValueEncodeError) -> Self {
        Self::index_unsupported(format!("value is not canonically order-encodable: {err}"))
    }
}

///
/// OrderedValueDecodeError
///

#[derive(Debug, ThisError)]
pub(crate) enum OrderedValueDecodeError {
    #[error("unknown component tag 0x{0:02x}")]
    UnknownTag(u8),

    #[error("component truncated at byte {0}")]
    Truncated(usize),

    #[error("text component is not valid utf-8")]
    InvalidText,
}

/// Append one key component so lexicographic byte order matches value order.
pub(crate) fn encode_component(
    out: &mut Vec<u8>,
    value: &Value,
) -> Result<(), OrderedValueEncodeError> {
    match value {
        Value::Null => out.push(TAG_NULL),
        Value::Bool(v) => {
            out.push(TAG_BOOL);
            out.push(u8::from(*v));
        }
        Value::Int(v) => {
            out.push(TAG_INT);
            out.extend_from_slice(&ordered_i64_bytes(*v));
        }
        Value::Uint(v) => {
            out.push(TAG_UINT);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Value::Float64(v) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&ordered_f64_bytes(*v));
        }
        Value::Text(v) => {
            out.push(TAG_TEXT);
            push_terminated_bytes(out, v.as_bytes());
        }
        Value::Blob(_) => {
            return Err(OrderedValueEncodeError::UnsupportedValueKind {
                kind: value.label(),
            });
        }
    }

    Ok(())
}

/// Decode one component starting at `*pos`, advancing past it.
pub(crate) fn decode_component(
    bytes: &[u8],
    pos: &mut usize,
) -> Result<Value, OrderedValueDecodeError> {
    let tag = *bytes
        .get(*pos)
        .ok_or(OrderedValueDecodeError::Truncated(*pos))?;
    *pos += 1;

    match tag {
        TAG_NULL => Ok(Value::Null),
        TAG_BOOL => {
            let byte = *bytes
                .get(*pos)
                .ok_or(OrderedValueDecodeError::Truncated(*pos))?;
            *pos += 1;
            Ok(Value::Bool(byte != 0))
        }
        TAG_INT => Ok(Value::Int(decode_i64(read_fixed(bytes, pos)?))),
        TAG_UINT => Ok(Value::Uint(u64::from_be_bytes(read_fixed(bytes, pos)?))),
        TAG_FLOAT => Ok(Value::Float64(decode_f64(read_fixed(bytes, pos)?))),
        TAG_TEXT => {
            let raw = read_terminated_bytes(bytes, pos)?;
            String::from_utf8(raw)
                .map(Value::Text)
                .map_err(|_| OrderedValueDecodeError::InvalidText)
        }
        other => Err(OrderedValueDecodeError::UnknownTag(other)),
    }
}

fn read_fixed(bytes: &[u8], pos: &mut usize) -> Result<[u8; 8], OrderedValueDecodeError> {
    let end = *pos + 8;
    let slice = bytes
        .get(*pos..end)
        .ok_or(OrderedValueDecodeError::Truncated(*pos))?;
    let mut out = [0u8; 8];
    out.copy_from_slice(slice);
    *pos = end;

    Ok(out)
}

// Byte strings are escaped so tuple boundaries remain unambiguous.
fn push_terminated_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    for &byte in bytes {
        if byte == 0 {
            out.extend_from_slice(&[0, ESCAPE]);
        } else {
            out.push(byte);
        }
    }

    out.extend_from_slice(&[0, 0]);
}

fn read_terminated_bytes(bytes: &[u8], pos: &mut usize) -> Result<Vec<u8>, OrderedValueDecodeError> {
    let mut out = Vec::new();

    loop {
        let byte = *bytes
            .get(*pos)
            .ok_or(OrderedValueDecodeError::Truncated(*pos))?;
        *pos += 1;

        if byte != 0 {
            out.push(byte);
            continue;
        }

        let next = *bytes
            .get(*pos)
            .ok_or(OrderedValueDecodeError::Truncated(*pos))?;
        *pos += 1;
        match next {
            0 => return Ok(out),
            ESCAPE => out.push(0),
            other => return Err(OrderedValueDecodeError::UnknownTag(other)),
        }
    }
}

const fn ordered_i64_bytes(value: i64) -> [u8; 8] {
    let biased = value.cast_unsigned() ^ (1u64 << 63);
    biased.to_be_bytes()
}

const fn decode_i64(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ (1u64 << 63)).cast_signed()
}

const fn ordered_f64_bytes(value: f64) -> [u8; 8] {
    let bits = value.to_bits();
    let ordered = if bits & 0x8000_0000_0000_0000 == 0 {
        bits ^ 0x8000_0000_0000_0000
    } else {
        !bits
    };

    ordered.to_be_bytes()
}

const fn decode_f64(bytes: [u8; 8]) -> f64 {
    let ordered = u64::from_be_bytes(bytes);
    let bits = if ordered & 0x8000_0000_0000_0000 == 0 {
        !ordered
    } else {
        ordered ^ 0x8000_0000_0000_0000
    };

    f64::from_bits(bits)
}

///
/// TESTS
///
