//! Module: db::backend
//! Responsibility: the ordered key-value capability the engine runs against.
//! Does not own: durability, replication, conflict resolution, or retries.
//! Boundary: one `Backend` value is one transaction; every call may fail
//! with a backend error that the caller's transaction must retry in full.

mod memory;

pub use memory::MemoryBackend;

use crate::error::InternalError;

///
/// ScanEntry
///

pub type ScanEntry = (Vec<u8>, Vec<u8>);

///
/// Backend
///
/// Ordered byte key-value store under one transaction handle. Ordering is
/// byte-lexicographic and reads observe the transaction's own writes.
///

pub trait Backend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, InternalError>;

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), InternalError>;

    fn clear(&mut self, key: &[u8]) -> Result<(), InternalError>;

    /// Ordered entries in `[low, high)`; `high = None` scans to the end.
    fn scan(&self, low: &[u8], high: Option<&[u8]>) -> Result<Vec<ScanEntry>, InternalError>;

    /// Row-level lock taken before a physical row is mutated.
    /// Serializable backends need no lock.
    fn lock(&mut self, _key: &[u8]) -> Result<(), InternalError> {
        Ok(())
    }

    /// Clear every key in `[low, high)`.
    fn clear_range(&mut self, low: &[u8], high: Option<&[u8]>) -> Result<usize, InternalError> {
        let entries = self.scan(low, high)?;
        for (key, _) in &entries {
            self.clear(key)?;
        }

        Ok(entries.len())
    }
}
