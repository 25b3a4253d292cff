//! Algorithms over record lists.
//!
//! - [`uniquify`] resolves identity collisions by bumping a numeric field.
//! - [`intervals`] run-length encodes a per-record state into interval records.

pub mod error;
pub mod intervals;
pub mod uniquify;

pub use error::Error;
pub use uniquify::uniquify;
