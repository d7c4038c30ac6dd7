use crate::{error::InternalError, model::GroupId};

/// Row payloads: `ROW_PREFIX ++ group ++ hkey`.
pub(crate) const ROW_PREFIX: u8 = 0x10;

/// Per-table row counters: `STATUS_PREFIX ++ ordinal`.
pub(crate) const STATUS_PREFIX: u8 = 0x30;

const ROW_KEY_HEADER: usize = 5;

/// Key prefix shared by every row of `group`.
#[must_use]
pub(crate) fn group_prefix(group: GroupId) -> Vec<u8> {
    let mut key = Vec::with_capacity(ROW_KEY_HEADER);
    key.push(ROW_PREFIX);
    key.extend_from_slice(&group.0.to_be_bytes());
    key
}

/// Physical key of the row stored at `hkey_bytes`.
#[must_use]
pub(crate) fn row_key(group: GroupId, hkey_bytes: &[u8]) -> Vec<u8> {
    let mut key = group_prefix(group);
    key.extend_from_slice(hkey_bytes);
    key
}

/// The hkey portion of a physical row key.
pub(crate) fn hkey_bytes_of(key: &[u8]) -> Result<&[u8], InternalError> {
    match key.split_first() {
        Some((&ROW_PREFIX, rest)) if rest.len() > ROW_KEY_HEADER - 1 => {
            Ok(&rest[ROW_KEY_HEADER - 1..])
        }
        _ => Err(InternalError::store_corruption(format!(
            "malformed row key ({} bytes)",
            key.len()
        ))),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_key_strips_back_to_hkey() {
        let key = row_key(GroupId(7), &[1, 0, 0, 0, 1, 0x20]);

        assert_eq!(&key[..5], &[ROW_PREFIX, 0, 0, 0, 7]);
        assert_eq!(hkey_bytes_of(&key).unwrap(), &[1, 0, 0, 0, 1, 0x20]);
    }

    #[test]
    fn foreign_prefix_is_corruption() {
        let err = hkey_bytes_of(&[STATUS_PREFIX, 0, 0, 0, 1, 9]).unwrap_err();

        assert!(err.is_corruption());
    }
}
