//! Row listeners: synchronous callbacks at fixed points of every mutation.
//! A listener error aborts the mutation in progress; undoing what was
//! already applied is the enclosing transaction's job.

use crate::{
    db::{data::Row, key::HKey},
    error::InternalError,
};

///
/// RowListener
///
/// Every hook defaults to a no-op so listeners implement only what they
/// observe.
///

pub trait RowListener {
    fn on_insert_pre(&self, _hkey: &HKey, _row: &Row) -> Result<(), InternalError> {
        Ok(())
    }

    fn on_insert_post(&self, _hkey: &HKey, _row: &Row) -> Result<(), InternalError> {
        Ok(())
    }

    fn on_delete_pre(&self, _hkey: &HKey, _row: &Row) -> Result<(), InternalError> {
        Ok(())
    }

    fn on_delete_post(&self, _hkey: &HKey, _row: &Row) -> Result<(), InternalError> {
        Ok(())
    }

    fn on_update_pre(&self, _hkey: &HKey, _old: &Row, _new: &Row) -> Result<(), InternalError> {
        Ok(())
    }

    fn on_update_post(&self, _hkey: &HKey, _old: &Row, _new: &Row) -> Result<(), InternalError> {
        Ok(())
    }
}
