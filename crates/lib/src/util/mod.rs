//! Shared utilities.
//!
//! Common utilities used across the crate including hashing and the insertion-ordered map
//! that backs element collections.

pub mod hash;
pub mod ordered;

#[cfg(test)]
pub mod testutil;
