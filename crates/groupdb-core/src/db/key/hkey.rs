use crate::{
    db::key::ordered::{
        OrderedValueDecodeError, OrderedValueEncodeError, decode_component, encode_component,
    },
    error::InternalError,
    model::{HKeyLayout, Ordinal},
    value::Value,
};
use std::fmt::{self, Display};
use thiserror::Error as ThisError;

const SEGMENT_MARKER: u8 = 0x01;

///
/// HKeyDecodeError
/// (decode / corruption boundary)
///

#[derive(Debug, ThisError)]
pub(crate) enum HKeyDecodeError {
    #[error("expected segment marker at byte {0}")]
    MissingSegment(usize),

    #[error("segment ordinal truncated at byte {0}")]
    TruncatedOrdinal(usize),

    #[error("invalid hkey column: {0}")]
    Column(#[from] OrderedValueDecodeError),
}

impl From<HKeyDecodeError> for InternalError {
    fn from(err: HKeyDecodeError) -> Self {
        Self::store_corruption(format!("hkey decode failed: {err}"))
    }
}

///
/// HKeySegment
///

#[derive(Clone, Debug, PartialEq)]
pub struct HKeySegment {
    pub ordinal: Ordinal,
    pub values: Vec<Value>,
}

///
/// HKey
///
/// Hierarchical key: root-first `(ordinal, key columns)` segments.
/// The byte form of a parent's hkey is a prefix of every properly parented
/// descendant's byte form.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HKey {
    segments: Vec<HKeySegment>,
}

impl HKey {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn push_segment(&mut self, ordinal: Ordinal) {
        self.segments.push(HKeySegment {
            ordinal,
            values: Vec::new(),
        });
    }

    /// Append a column value to the last segment.
    pub fn push_value(&mut self, value: Value) {
        if let Some(segment) = self.segments.last_mut() {
            segment.values.push(value);
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[HKeySegment] {
        &self.segments
    }

    #[must_use]
    pub const fn depth(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn leaf_ordinal(&self) -> Option<Ordinal> {
        self.segments.last().map(|segment| segment.ordinal)
    }

    /// Whether any ancestor segment carries a null column.
    #[must_use]
    pub fn is_orphan(&self) -> bool {
        match self.segments.split_last() {
            Some((_, ancestors)) => ancestors
                .iter()
                .any(|segment| segment.values.iter().any(Value::is_null)),
            None => false,
        }
    }

    /// The hkey truncated to its first `depth` segments.
    #[must_use]
    pub fn prefix(&self, depth: usize) -> Self {
        Self {
            segments: self.segments[..depth.min(self.segments.len())].to_vec(),
        }
    }

    /// Layout-shaped hkey with every column null.
    #[must_use]
    pub fn null_for_layout(layout: &HKeyLayout) -> Self {
        let mut hkey = Self::new();
        for segment in &layout.segments {
            hkey.push_segment(segment.table);
            for _ in &segment.columns {
                hkey.push_value(Value::Null);
            }
        }

        hkey
    }

    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.segments.len() < other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a == b)
    }

    pub(crate) fn try_to_bytes(&self) -> Result<Vec<u8>, OrderedValueEncodeError> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;

        Ok(out)
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), OrderedValueEncodeError> {
        for segment in &self.segments {
            out.push(SEGMENT_MARKER);
            out.extend_from_slice(&segment.ordinal.0.to_be_bytes());
            for value in &segment.values {
                encode_component(out, value)?;
            }
        }

        Ok(())
    }

    pub(crate) fn try_from_bytes(bytes: &[u8]) -> Result<Self, HKeyDecodeError> {
        let mut hkey = Self::new();
        let mut pos = 0;

        while pos < bytes.len() {
            if bytes[pos] != SEGMENT_MARKER {
                if hkey.segments.is_empty() {
                    return Err(HKeyDecodeError::MissingSegment(pos));
                }
                let value = decode_component(bytes, &mut pos)?;
                hkey.push_value(value);
                continue;
            }

            let start = pos + 1;
            let raw = bytes
                .get(start..start + 4)
                .ok_or(HKeyDecodeError::TruncatedOrdinal(start))?;
            let mut ordinal = [0u8; 4];
            ordinal.copy_from_slice(raw);
            hkey.push_segment(Ordinal(u32::from_be_bytes(ordinal)));
            pos = start + 4;
        }

        Ok(hkey)
    }
}

impl Display for HKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", segment.ordinal)?;
            for value in &segment.values {
                write!(f, ":{value}")?;
            }
        }
        write!(f, "]")
    }
}

/// Exclusive upper bound of every key starting with `prefix`.
/// Returns `None` when no finite bound exists (all bytes 0xFF).
#[must_use]
pub(crate) fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut out = prefix.to_vec();
    while let Some(last) = out.pop() {
        if last < u8::MAX {
            out.push(last + 1);
            return Some(out);
        }
    }

    None
}

/// Half-open byte range holding exactly the strict descendants of the hkey
/// encoded as `prefix`. Every descendant continues with a segment marker.
#[must_use]
pub(crate) fn descendant_bounds(prefix: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut low = prefix.to_vec();
    low.push(SEGMENT_MARKER);
    let mut high = prefix.to_vec();
    high.push(SEGMENT_MARKER + 1);

    (low, high)
}

///
/// TESTS
///
