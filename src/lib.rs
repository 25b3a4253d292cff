//! Schema-validated records and the collection algebra molecular build
//! pipelines are written on top of.
//!
//! Every domain object of a build (atoms, residues, links, mutations,
//! segments) is a [`Record`] of some kind: an ordered attribute map checked
//! against the kind's [`Schema`]. Records of one kind gather in a
//! [`RecordList`], which offers filtering, extraction, three-way lookup,
//! binning, sorting and cross-linking. On top of these sit two algorithms:
//! [`ops::uniquify`] for identity collisions and [`ops::intervals`] for
//! run-length reduction into state intervals.
//!
//! # Features
//!
//! - **Constraint schemas**: Required and optional attributes, defaults,
//!   mutual exclusion, value domains and conditional dependencies
//! - **Weak ordering**: Attribute-wise comparison that tolerates
//!   incomparable records instead of inventing a total order
//! - **Ownership**: Aggregates claim their nested records, which can then
//!   find their owner by registered id
//! - **Lineage**: Clones keep a read-only reference to their origin
//! - **TOML I/O**: Kind catalogs and record lists in TOML
//!
//! # Quick Start
//!
//! ```
//! use rec_forge::{Lookup, Record, RecordList, Schema, Value};
//! use rec_forge::ops::uniquify;
//!
//! let residue = Schema::builder("residue")
//!     .required(["resname", "resseqnum", "chainID"])
//!     .optional(["insertion"])
//!     .default_value("insertion", "")
//!     .build()?;
//!
//! let mut list = RecordList::new(&residue);
//! for (name, seq) in [("ALA", 1), ("GLY", 1), ("SER", 2)] {
//!     list.push(Record::from_pairs(
//!         &residue,
//!         [
//!             ("resname", Value::from(name)),
//!             ("resseqnum", Value::Int(seq)),
//!             ("chainID", Value::from("A")),
//!         ],
//!     )?)?;
//! }
//!
//! // Two residues share sequence number 1.
//! assert!(list.get_by(&[("resseqnum", Value::Int(1))]).is_ambiguous());
//!
//! uniquify(&mut list, &["resseqnum"], &[])?;
//! assert_eq!(list.bin(&["resseqnum"]).len(), 3);
//!
//! // The bumped residue remembers where it came from.
//! let Lookup::Unique(gly) = list.get_by(&[("resname", Value::from("GLY"))]) else {
//!     unreachable!()
//! };
//! assert_eq!(gly.get("resseqnum"), Some(&Value::Int(2)));
//! assert_eq!(gly.stashed("resseqnum"), Some(&Value::Int(1)));
//! # Ok::<(), rec_forge::OpsError>(())
//! ```
//!
//! # Module Organization
//!
//! - [`model`]: Values, schemas, records, lists and ownership
//! - [`ops`]: Uniquification and interval reduction
//! - [`io`]: TOML kind catalogs and record files

pub mod io;
pub mod model;
pub mod ops;

pub use model::error::{Error as RecordError, Violation};
pub use model::input::{AttributeBag, RecordAdapter, RecordInput};
pub use model::list::{Lookup, RecordList};
pub use model::ownership::{BuildContext, OwnerRef, RecordId};
pub use model::record::Record;
pub use model::schema::{Dependency, Schema, SchemaBuilder, Trigger};
pub use model::value::{AttrMap, Value, attr_map};

pub use io::Error as IoError;
pub use ops::Error as OpsError;
pub use ops::intervals::StateInterval;
