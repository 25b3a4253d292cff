//! TOML input and output.
//!
//! - [`catalog`] – Record kinds declared in TOML, including the built-in
//!   `state_interval` kind.
//! - [`records`] – Record lists read from and written to TOML arrays of tables.
//! - [`util`] – Conversion between TOML values and attribute values.

pub mod catalog;
pub mod error;
pub mod records;
pub mod util;

pub use catalog::{Catalog, KindSpec, default_catalog, load_catalog};
pub use error::Error;
pub use records::{parse_all, parse_records, read_records, to_toml_string, write_records};
