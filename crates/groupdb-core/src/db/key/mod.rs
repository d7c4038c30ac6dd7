//! Module: db::key
//! Responsibility: order-preserving component codec and the hierarchical key.
//! Boundary: every physical key the engine writes is built from these parts.

mod hkey;
mod ordered;

pub use hkey::{HKey, HKeySegment};

pub(crate) use hkey::{descendant_bounds, prefix_successor};
pub(crate) use ordered::{decode_component, encode_component};
