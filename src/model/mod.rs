//! Validated records and the collection algebra built on them.
//!
//! - [`schema`] – Per-kind constraint declarations and their validation.
//! - [`value`] – Attribute values and their natural ordering.
//! - [`record`] – Schema-bound records: equality, weak ordering, matching, editing.
//! - [`list`] – Ordered homogeneous collections: filtering, binning, sorting, linking.
//! - [`input`] – The input shapes a record can be constructed from.
//! - [`ownership`] – Owner back-references and build-run identifiers.
//! - [`error`] – Errors raised by the layers above.
//!
//! Records never interpret their attribute values beyond comparison; the
//! meaning of an attribute belongs to whoever declares the schema.

pub mod error;
pub mod input;
pub mod list;
pub mod ownership;
pub mod record;
pub mod schema;
pub mod value;
