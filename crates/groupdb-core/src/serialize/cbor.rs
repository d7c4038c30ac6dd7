use crate::serialize::SerializeError;
use serde::{Serialize, de::DeserializeOwned};
use serde_cbor::{from_slice, to_vec};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Serialize a value into CBOR bytes.
pub(super) fn serialize<T>(t: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    to_vec(t).map_err(|e| SerializeError::Serialize(e.to_string()))
}

/// Deserialize CBOR bytes into a value.
///
/// Input size is bounded before decode, and a panic inside the decoder is
/// reported as a deserialize error rather than unwinding into the engine.
pub(super) fn deserialize<T>(bytes: &[u8], max_bytes: usize) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    if bytes.len() > max_bytes {
        return Err(SerializeError::Deserialize(
            "payload exceeds maximum allowed size".into(),
        ));
    }

    let result = catch_unwind(AssertUnwindSafe(|| from_slice(bytes)));

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(SerializeError::Deserialize(err.to_string())),
        Err(_) => Err(SerializeError::Deserialize(
            "panic during CBOR deserialization".into(),
        )),
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_payload_is_rejected_before_decode() {
        let bytes = vec![0u8; 16];
        let err = deserialize::<Vec<u8>>(&bytes, 8).unwrap_err();

        assert!(matches!(err, SerializeError::Deserialize(_)));
    }

    #[test]
    fn garbage_is_a_deserialize_error() {
        let err = deserialize::<String>(&[0xFF, 0x00, 0x13], 64).unwrap_err();

        assert!(matches!(err, SerializeError::Deserialize(_)));
    }
}
