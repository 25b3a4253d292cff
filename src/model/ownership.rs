//! Ownership back-references and record identifiers.
//!
//! Aggregates (a segment holding residues, a residue holding atoms) claim
//! the records nested in their attributes so that a contained record can
//! find the aggregate it belongs to. The back-reference is a plain handle,
//! [`OwnerRef`]: it grants lookup through [`Record::resolve`], never
//! ownership. Nested values are owned trees, so claiming always terminates.
//!
//! Identifiers are issued by an explicit [`BuildContext`], owned by whatever
//! drives a build run. The same ids back [`Value::Link`], the cross-list
//! handle written by [`RecordList::assign_by_match`]. Copies of a record
//! are never registered.

use super::error::Error;
use super::list::RecordList;
use super::record::Record;
use super::value::Value;
use std::fmt;
use tracing::trace;

/// Identifier issued by a [`BuildContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u64);

impl RecordId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Non-owning handle to the aggregate that claimed a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerRef {
    id: RecordId,
    kind: String,
}

impl OwnerRef {
    pub fn new(id: RecordId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
        }
    }

    #[inline]
    pub fn id(&self) -> RecordId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind, self.id)
    }
}

/// Issues monotonically increasing record identifiers for one build run.
///
/// Identifiers start at 1. [`BuildContext::reset`] starts a new run; ids
/// issued before a reset must not be mixed with ids issued after it.
#[derive(Debug, Default)]
pub struct BuildContext {
    issued: u64,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns an id to `record` unless it already has one, and returns it.
    pub fn register(&mut self, record: &mut Record) -> RecordId {
        if let Some(id) = record.id {
            return id;
        }
        self.issued += 1;
        let id = RecordId::new(self.issued);
        record.id = Some(id);
        id
    }

    /// Registers every element of `list`.
    pub fn register_all(&mut self, list: &mut RecordList) {
        for record in list.iter_mut() {
            self.register(record);
        }
    }

    /// Number of ids issued since the last reset.
    #[inline]
    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn reset(&mut self) {
        self.issued = 0;
    }
}

fn claim_value(value: &mut Value, owner: &OwnerRef) {
    match value {
        Value::Record(nested) if nested.kind.ownable() && !nested.claimed => {
            nested.claim_descendants(owner)
        }
        Value::List(list) if list.kind().ownable() => list.claim_descendants(owner),
        _ => {}
    }
}

impl Record {
    /// Sets `owner` on this record and on every ownable record nested in its
    /// attributes, recursively.
    ///
    /// The last claim wins, except that nested records marked with
    /// [`Record::set_claimed`] keep their current owner and are not
    /// descended into.
    pub fn claim_descendants(&mut self, owner: &OwnerRef) {
        self.owner = Some(owner.clone());
        for value in self.attrs.values_mut() {
            claim_value(value, owner);
        }
    }

    /// Handle to this record for use as an owner.
    ///
    /// # Errors
    ///
    /// [`Error::Unregistered`] if the record has no id.
    pub fn owner_ref(&self) -> Result<OwnerRef, Error> {
        self.id
            .map(|id| OwnerRef::new(id, self.kind.name()))
            .ok_or_else(|| Error::Unregistered(self.kind.name().to_string()))
    }

    /// Claims every nested record for this record. The record's own owner is
    /// left unchanged.
    pub fn adopt_descendants(&mut self) -> Result<(), Error> {
        let me = self.owner_ref()?;
        trace!(owner = %me, "adopting descendants");
        for value in self.attrs.values_mut() {
            claim_value(value, &me);
        }
        Ok(())
    }

    /// Finds the record with `id` in this record's tree, itself included.
    pub fn resolve(&self, id: RecordId) -> Option<&Record> {
        if self.id == Some(id) {
            return Some(self);
        }
        self.attrs.values().find_map(|value| match value {
            Value::Record(nested) => nested.resolve(id),
            Value::List(list) => list.resolve(id),
            _ => None,
        })
    }

    /// Follows the [`Value::Link`] stored under `attr` into `target`.
    ///
    /// `None` if the attribute is absent, is not a link, or names a record
    /// `target` does not hold.
    pub fn linked<'a>(&self, attr: &str, target: &'a RecordList) -> Option<&'a Record> {
        self.get(attr)?.as_link().and_then(|id| target.resolve(id))
    }
}

impl RecordList {
    /// Claims every unclaimed element for `owner`.
    pub fn claim_descendants(&mut self, owner: &OwnerRef) {
        for record in self.iter_mut().filter(|r| !r.claimed) {
            record.claim_descendants(owner);
        }
    }

    /// Finds the record with `id` among the elements and their trees.
    pub fn resolve(&self, id: RecordId) -> Option<&Record> {
        self.iter().find_map(|record| record.resolve(id))
    }
}
