//! Ordered, homogeneous record collections.
//!
//! Every query and mutation here is expressed through the comparison and
//! matching primitives of [`Record`]; the list never interprets attribute
//! values itself.

use super::error::Error;
use super::ownership::{BuildContext, RecordId};
use super::record::Record;
use super::schema::Schema;
use super::value::{Value, sort_key_cmp};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of a predicate lookup, distinguishing "not found" from "found
/// uniquely" from "ambiguous".
#[derive(Debug)]
pub enum Lookup<'a> {
    Missing,
    Unique(&'a Record),
    Ambiguous(Vec<&'a Record>),
}

impl<'a> Lookup<'a> {
    /// The match, if there is exactly one.
    pub fn unique(&self) -> Option<&'a Record> {
        match self {
            Lookup::Unique(r) => Some(*r),
            _ => None,
        }
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, Lookup::Missing)
    }

    #[inline]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Lookup::Ambiguous(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Lookup::Missing => 0,
            Lookup::Unique(_) => 1,
            Lookup::Ambiguous(all) => all.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_missing()
    }
}

/// Ordered records of a single kind.
///
/// Order is insertion order until [`RecordList::sort`] is called.
#[derive(Debug, Clone)]
pub struct RecordList {
    kind: Arc<Schema>,
    items: Vec<Record>,
}

impl RecordList {
    pub fn new(kind: &Arc<Schema>) -> Self {
        Self {
            kind: Arc::clone(kind),
            items: Vec::new(),
        }
    }

    /// Builds a list from records, checking that all are of `kind`.
    pub fn from_records(kind: &Arc<Schema>, records: Vec<Record>) -> Result<Self, Error> {
        let mut list = Self::new(kind);
        for record in records {
            list.push(record)?;
        }
        Ok(list)
    }

    /// Empty list of the same kind.
    fn empty_like(&self) -> Self {
        Self::new(&self.kind)
    }

    #[inline]
    pub fn kind(&self) -> &Arc<Schema> {
        &self.kind
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Record> {
        self.items.iter_mut()
    }

    #[inline]
    pub fn records(&self) -> &[Record] {
        &self.items
    }

    /// Mutable access to the elements. The slice cannot grow, so the list
    /// stays homogeneous.
    #[inline]
    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.items
    }

    #[inline]
    pub fn first(&self) -> Option<&Record> {
        self.items.first()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.items
    }

    /// Appends a record of this list's kind.
    ///
    /// # Errors
    ///
    /// [`Error::KindMismatch`] if the record is of another kind.
    pub fn push(&mut self, record: Record) -> Result<(), Error> {
        if record.kind_name() != self.kind.name() {
            return Err(Error::kind_mismatch(self.kind.name(), record.kind_name()));
        }
        self.items.push(record);
        Ok(())
    }

    pub fn extend(&mut self, other: RecordList) -> Result<(), Error> {
        for record in other.items {
            self.push(record)?;
        }
        Ok(())
    }

    /// Removes and returns the element at `index`.
    pub fn remove(&mut self, index: usize) -> Option<Record> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Position of this exact instance (identity, not equality).
    pub fn position_of(&self, record: &Record) -> Option<usize> {
        self.items.iter().position(|r| r.is_same_instance(record))
    }

    /// Removes the element registered under `id`, if there is one.
    pub fn remove_instance(&mut self, id: RecordId) -> Option<Record> {
        let index = self.items.iter().position(|r| r.id() == Some(id))?;
        self.remove(index)
    }

    /// Position of the first element equal to `record`.
    pub fn index_of(&self, record: &Record) -> Option<usize> {
        self.items.iter().position(|r| r.equals(record))
    }

    /// New list of the elements satisfying `pred`, in order.
    pub fn filter(&self, pred: impl Fn(&Record) -> bool) -> RecordList {
        Self {
            kind: Arc::clone(&self.kind),
            items: self.items.iter().filter(|r| pred(r)).cloned().collect(),
        }
    }

    /// Removes the elements satisfying `pred` and returns them, in order.
    pub fn extract(&mut self, mut pred: impl FnMut(&Record) -> bool) -> RecordList {
        let (taken, kept): (Vec<Record>, Vec<Record>) =
            std::mem::take(&mut self.items).into_iter().partition(|r| pred(r));
        self.items = kept;
        Self {
            kind: Arc::clone(&self.kind),
            items: taken,
        }
    }

    /// Three-way lookup by predicate.
    pub fn get(&self, pred: impl Fn(&Record) -> bool) -> Lookup<'_> {
        let mut hits: Vec<&Record> = self.items.iter().filter(|r| pred(r)).collect();
        match hits.len() {
            0 => Lookup::Missing,
            1 => Lookup::Unique(hits.remove(0)),
            _ => Lookup::Ambiguous(hits),
        }
    }

    /// Three-way lookup by exact attribute match.
    pub fn get_by(&self, fields: &[(&str, Value)]) -> Lookup<'_> {
        self.get(|r| r.matches(fields))
    }

    /// Groups elements by their [`Record::str_hash`] over `fields`.
    ///
    /// Bins appear in order of first occurrence and keep element order.
    pub fn bin(&self, fields: &[&str]) -> IndexMap<String, RecordList> {
        let mut bins: IndexMap<String, RecordList> = IndexMap::new();
        for record in &self.items {
            bins.entry(record.str_hash(Some(fields)))
                .or_insert_with(|| self.empty_like())
                .items
                .push(record.clone());
        }
        debug!(kind = self.kind.name(), records = self.len(), bins = bins.len(), "binned");
        bins
    }

    /// Bins holding more than one element.
    pub fn duplicates(&self, fields: &[&str]) -> IndexMap<String, RecordList> {
        let mut bins = self.bin(fields);
        bins.retain(|_, members| members.len() > 1);
        bins
    }

    /// Keeps the first element of every bin over `fields` (all non-ignored
    /// attributes when `None`) and returns the removed ones.
    pub fn remove_duplicates(&mut self, fields: Option<&[&str]>) -> RecordList {
        let mut seen = std::collections::HashSet::new();
        self.extract(|r| !seen.insert(r.str_hash(fields)))
    }

    /// Distinct values of `attr` in order of first occurrence.
    pub fn unique_values(&self, attr: &str) -> Vec<Value> {
        let mut out: Vec<Value> = Vec::new();
        for value in self.items.iter().filter_map(|r| r.get(attr)) {
            if !out.contains(value) {
                out.push(value.clone());
            }
        }
        out
    }

    /// Stable sort.
    ///
    /// With `by`, elements are ordered by the named attribute tuple using a
    /// total key order (absent values first). Without it, the weak natural
    /// ordering of [`Record::less_than`] is used through an insertion sort:
    /// an element only moves in front of elements it is strictly less than,
    /// so incomparable elements keep their relative order.
    pub fn sort(&mut self, by: Option<&[&str]>, reverse: bool) {
        match by {
            Some(fields) => {
                self.items.sort_by(|a, b| {
                    let ord = fields
                        .iter()
                        .map(|f| sort_key_cmp(a.get(f), b.get(f)))
                        .find(|o| o.is_ne())
                        .unwrap_or(Ordering::Equal);
                    if reverse { ord.reverse() } else { ord }
                });
            }
            None => {
                let items = std::mem::take(&mut self.items);
                let mut sorted: Vec<Record> = Vec::with_capacity(items.len());
                for item in items {
                    let mut pos = sorted.len();
                    while pos > 0 {
                        let before = &sorted[pos - 1];
                        let precedes = if reverse {
                            before.less_than(&item)
                        } else {
                            item.less_than(before)
                        };
                        if !precedes {
                            break;
                        }
                        pos -= 1;
                    }
                    sorted.insert(pos, item);
                }
                self.items = sorted;
            }
        }
    }

    /// Cross-links each element to its unique match in `other`.
    ///
    /// `attr_map` pairs an attribute of this list's elements with the
    /// attribute of `other` that must equal it. An element whose lookup is
    /// unique gets a [`Value::Link`] to the match under `dest_attr`; every
    /// other element (missing source attribute, no match, or an ambiguous
    /// match) is removed from the receiver and returned, in order.
    ///
    /// Matches are registered with `ctx` when they have no id yet. The link
    /// is a handle, not a copy: later edits to the match are seen through
    /// [`Record::linked`].
    pub fn assign_by_match(
        &mut self,
        dest_attr: &str,
        other: &mut RecordList,
        ctx: &mut BuildContext,
        attr_map: &[(&str, &str)],
    ) -> RecordList {
        let items = std::mem::take(&mut self.items);
        let mut unresolved = self.empty_like();
        for mut item in items {
            let query: Option<Vec<(&str, Value)>> = attr_map
                .iter()
                .map(|(mine, theirs)| item.get(mine).map(|v| (*theirs, v.clone())))
                .collect();
            let matched = query.and_then(|q| {
                let found = other.get_by(&q).unique()?;
                other.position_of(found)
            });
            match matched {
                Some(index) => {
                    let id = ctx.register(&mut other.items[index]);
                    item.put(dest_attr, Value::Link(id));
                    self.items.push(item);
                }
                None => unresolved.items.push(item),
            }
        }
        if !unresolved.is_empty() {
            warn!(
                kind = self.kind.name(),
                target = other.kind.name(),
                unresolved = unresolved.len(),
                "records without a unique match"
            );
        }
        unresolved
    }

    /// Element-wise lineage clone with the same overrides.
    pub fn clone_with(&self, overrides: &[(&str, Value)]) -> Result<RecordList, Error> {
        let items = self
            .items
            .iter()
            .map(|r| r.clone_with(overrides))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            kind: Arc::clone(&self.kind),
            items,
        })
    }

    /// [`Record::set`] on every element. Stops at the first failure.
    pub fn set_all(&mut self, fields: &[(&str, Value)], shallow: bool) -> Result<(), Error> {
        self.items.iter_mut().try_for_each(|r| r.set(fields, shallow))
    }

    /// [`Record::map_attr`] on every element; returns how many were mapped.
    pub fn map_attr(&mut self, dest: &str, src: &str, table: &[(Value, Value)]) -> Result<usize, Error> {
        let mut mapped = 0;
        for record in &mut self.items {
            if record.map_attr(dest, src, table)? {
                mapped += 1;
            }
        }
        Ok(mapped)
    }

    pub fn swap_attr(&mut self, a: &str, b: &str) -> Result<(), Error> {
        self.items.iter_mut().try_for_each(|r| r.swap_attr(a, b))
    }

    pub fn copy_attr(&mut self, dest: &str, src: &str) -> Result<(), Error> {
        self.items.iter_mut().try_for_each(|r| r.copy_attr(dest, src))
    }
}

impl<'a> IntoIterator for &'a RecordList {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for RecordList {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
