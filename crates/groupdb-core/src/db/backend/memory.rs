use crate::{
    db::backend::{Backend, ScanEntry},
    error::InternalError,
};
use derive_more::{Deref, DerefMut};
use std::{collections::BTreeMap, ops::Bound};

///
/// MemoryBackend
///
/// Ordered in-memory adapter. Single-writer, hence serializable; the lock
/// hook stays a no-op.
///

#[derive(Clone, Debug, Default, Deref, DerefMut)]
pub struct MemoryBackend(BTreeMap<Vec<u8>, Vec<u8>>);

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, InternalError> {
        Ok(self.0.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<(), InternalError> {
        self.0.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn clear(&mut self, key: &[u8]) -> Result<(), InternalError> {
        self.0.remove(key);
        Ok(())
    }

    fn scan(&self, low: &[u8], high: Option<&[u8]>) -> Result<Vec<ScanEntry>, InternalError> {
        let upper = high.map_or(Bound::Unbounded, Bound::Excluded);
        let entries = self
            .0
            .range::<[u8], _>((Bound::Included(low), upper))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(entries)
    }
}

///
/// TESTS
///
