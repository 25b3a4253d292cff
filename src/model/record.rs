//! Schema-validated records.
//!
//! A [`Record`] is an ordered attribute map bound to the [`Schema`] of its
//! kind. It is checked once at construction; [`Record::set`] re-checks,
//! while single-attribute writes through [`Record::put`] do not.
//!
//! Besides its attributes a record carries a few side channels that never
//! take part in comparisons: a swap/copy `history`, a uniquification
//! `stash`, an ownership back-reference and a lineage reference.

use super::error::Error;
use super::input::{AttributeBag, RecordInput};
use super::ownership::{OwnerRef, RecordId};
use super::schema::Schema;
use super::value::{AttrMap, Value, attr_map};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
pub struct Record {
    pub(crate) kind: Arc<Schema>,
    pub(crate) attrs: AttrMap,
    history: AttrMap,
    stash: AttrMap,
    pub(crate) owner: Option<OwnerRef>,
    pub(crate) claimed: bool,
    origin: Option<Arc<Record>>,
    pub(crate) id: Option<RecordId>,
}

impl Record {
    /// Builds a record of `kind` from any supported input.
    ///
    /// Defaults declared by the schema are filled in for absent optional
    /// attributes before validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaViolation`] naming the first broken rule, or
    /// [`Error::Adapter`] when an adapter input fails.
    pub fn new<'a>(kind: &Arc<Schema>, input: impl Into<RecordInput<'a>>) -> Result<Self, Error> {
        let raw = input.into().into_attributes(kind)?;
        let attrs = kind.normalize(raw);
        kind.validate(&attrs)
            .map_err(|violation| Error::schema_violation(kind.name(), violation))?;
        trace!(kind = kind.name(), attributes = attrs.len(), "record validated");
        Ok(Self {
            kind: Arc::clone(kind),
            attrs,
            history: AttrMap::new(),
            stash: AttrMap::new(),
            owner: None,
            claimed: false,
            origin: None,
            id: None,
        })
    }

    /// Shorthand for [`Record::new`] with `(name, value)` pairs.
    pub fn from_pairs<K, V>(
        kind: &Arc<Schema>,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, Error>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self::new(kind, attr_map(pairs))
    }

    #[inline]
    pub fn kind(&self) -> &Arc<Schema> {
        &self.kind
    }

    #[inline]
    pub fn kind_name(&self) -> &str {
        self.kind.name()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    #[inline]
    pub fn attributes(&self) -> &AttrMap {
        &self.attrs
    }

    /// Values recorded by swap/copy before their first overwrite.
    #[inline]
    pub fn history(&self) -> &AttrMap {
        &self.history
    }

    /// Identity values recorded before uniquification changed them.
    #[inline]
    pub fn stash(&self) -> &AttrMap {
        &self.stash
    }

    pub fn stashed(&self, name: &str) -> Option<&Value> {
        self.stash.get(name)
    }

    #[inline]
    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    #[inline]
    pub fn owner(&self) -> Option<&OwnerRef> {
        self.owner.as_ref()
    }

    #[inline]
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Marks the record so that later claims by other owners skip it.
    pub fn set_claimed(&mut self, claimed: bool) {
        self.claimed = claimed;
    }

    /// The record this one was cloned from.
    pub fn origin(&self) -> Option<&Record> {
        self.origin.as_deref()
    }

    #[inline]
    pub fn is_clone(&self) -> bool {
        self.origin.is_some()
    }

    /// Walks the lineage chain from the direct origin back to the first record.
    pub fn ancestors(&self) -> impl Iterator<Item = &Record> {
        std::iter::successors(self.origin(), |r| r.origin())
    }

    pub fn same_kind(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.kind, &other.kind) || self.kind.name() == other.kind.name()
    }

    /// Identity test: the same instance in memory, or the same registered id
    /// within one kind. Copies are never registered, so a copy is a new
    /// instance.
    pub fn is_same_instance(&self, other: &Record) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b) && self.same_kind(other)
    }

    /// Attribute-wise equality over the schema-relevant attributes.
    ///
    /// Compares required attributes and optional attributes present on
    /// either side, skipping those the schema ignores for comparison.
    /// Ownership, lineage, history and stash never take part.
    pub fn equals(&self, other: &Record) -> bool {
        if self.is_same_instance(other) {
            return true;
        }
        self.same_kind(other)
            && self
                .kind
                .comparison_attrs(&self.attrs, &other.attrs)
                .into_iter()
                .all(|name| self.attrs.get(name) == other.attrs.get(name))
    }

    fn order_summary<'a>(&self, other: &Record, names: impl IntoIterator<Item = &'a str>) -> (bool, bool) {
        let mut all_le = true;
        let mut any_lt = false;
        for name in names {
            let (Some(a), Some(b)) = (self.attrs.get(name), other.attrs.get(name)) else {
                continue;
            };
            match a.natural_cmp(b) {
                Some(Ordering::Less) => any_lt = true,
                Some(Ordering::Greater) => all_le = false,
                _ => {}
            }
        }
        (all_le, any_lt)
    }

    /// Weak `<=`: every orderable compared attribute is `<=`.
    ///
    /// Attributes without a natural ordering are skipped, so two records
    /// sharing no orderable attribute are mutually `<=` (vacuously).
    pub fn less_or_equal(&self, other: &Record) -> bool {
        if !self.same_kind(other) {
            return false;
        }
        let names = self.kind.comparison_attrs(&self.attrs, &other.attrs);
        self.order_summary(other, names).0
    }

    /// Weak `<`: every orderable compared attribute is `<=` and at least one
    /// is strictly `<`.
    ///
    /// This is not a total order. A record sharing no orderable attribute
    /// with `other` is never less than it, and neither is `other` less than
    /// the record.
    pub fn less_than(&self, other: &Record) -> bool {
        if !self.same_kind(other) {
            return false;
        }
        let names = self.kind.comparison_attrs(&self.attrs, &other.attrs);
        let (le, lt) = self.order_summary(other, names);
        le && lt
    }

    /// [`Record::less_than`] restricted to `attrs`.
    pub fn weak_less_than(&self, other: &Record, attrs: &[&str]) -> bool {
        let (le, lt) = self.order_summary(other, attrs.iter().copied());
        le && lt
    }

    /// [`Record::less_or_equal`] restricted to `attrs`.
    pub fn weak_less_or_equal(&self, other: &Record, attrs: &[&str]) -> bool {
        self.order_summary(other, attrs.iter().copied()).0
    }

    /// Deterministic `name=value` key over `fields` (or every non-ignored
    /// attribute), names sorted and joined with `;`. Absent fields render as
    /// `name=?`.
    ///
    /// This is a bin key, not a cryptographic hash; see [`Record::digest`].
    pub fn str_hash(&self, fields: Option<&[&str]>) -> String {
        let mut names: Vec<&str> = match fields {
            Some(fields) => fields.to_vec(),
            None => self
                .attrs
                .keys()
                .map(String::as_str)
                .filter(|n| !self.kind.is_ignored(n))
                .collect(),
        };
        names.sort_unstable();
        names.dedup();
        names
            .into_iter()
            .map(|n| match self.attrs.get(n) {
                Some(v) => format!("{}={}", n, v),
                None => format!("{}=?", n),
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    /// SHA-256 fingerprint (lowercase hex) of [`Record::str_hash`].
    pub fn digest(&self, fields: Option<&[&str]>) -> String {
        hex::encode(Sha256::digest(self.str_hash(fields).as_bytes()))
    }

    /// Exact match: every `(name, value)` is present and equal.
    pub fn matches(&self, fields: &[(&str, Value)]) -> bool {
        fields
            .iter()
            .all(|(name, value)| self.attrs.get(*name) == Some(value))
    }

    /// Like [`Record::matches`], but each key only has to be a substring of
    /// some attribute name holding the value.
    pub fn wild_match(&self, fields: &[(&str, Value)]) -> bool {
        fields.iter().all(|(key, value)| {
            self.attrs
                .iter()
                .any(|(name, v)| name.contains(*key) && v == value)
        })
    }

    fn require(&self, name: &str) -> Result<&Value, Error> {
        self.attrs
            .get(name)
            .ok_or_else(|| Error::attribute_not_found(self.kind.name(), name))
    }

    fn require_accepted(&self, name: &str) -> Result<(), Error> {
        if self.kind.accepts(name) {
            Ok(())
        } else {
            Err(Error::attribute_not_found(self.kind.name(), name))
        }
    }

    fn remember(&mut self, name: &str, value: &Value) {
        self.history
            .entry(name.to_string())
            .or_insert_with(|| value.clone());
    }

    /// Sets `dest` to `table[src]`. Returns `false` when the value of `src`
    /// has no entry in the table.
    pub fn map_attr(&mut self, dest: &str, src: &str, table: &[(Value, Value)]) -> Result<bool, Error> {
        self.require_accepted(dest)?;
        let value = self.require(src)?;
        let Some((_, mapped)) = table.iter().find(|(from, _)| from == value) else {
            return Ok(false);
        };
        self.attrs.insert(dest.to_string(), mapped.clone());
        Ok(true)
    }

    /// Exchanges the values of `a` and `b`, remembering both prior values.
    pub fn swap_attr(&mut self, a: &str, b: &str) -> Result<(), Error> {
        let va = self.require(a)?.clone();
        let vb = self.require(b)?.clone();
        self.remember(a, &va);
        self.remember(b, &vb);
        self.attrs.insert(a.to_string(), vb);
        self.attrs.insert(b.to_string(), va);
        Ok(())
    }

    /// Copies `src` into `dest`, remembering the prior value of `dest`.
    pub fn copy_attr(&mut self, dest: &str, src: &str) -> Result<(), Error> {
        self.require_accepted(dest)?;
        let value = self.require(src)?.clone();
        if let Some(prior) = self.attrs.get(dest).cloned() {
            self.remember(dest, &prior);
        }
        self.attrs.insert(dest.to_string(), value);
        Ok(())
    }

    /// Writes one attribute directly, returning the previous value.
    ///
    /// The schema is not re-checked; use [`Record::set`] for validated writes.
    pub fn put(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.attrs.insert(name.into(), value.into())
    }

    /// Bulk assignment with schema re-validation.
    ///
    /// All `fields` are assigned on the receiver. Unless `shallow`, the same
    /// fields are also pushed into every nested record and record list,
    /// where fields the nested record does not already hold are skipped.
    ///
    /// The whole tree is checked before anything is written: if the
    /// receiver or any nested record would break its schema, the error is
    /// returned and no record is changed.
    pub fn set(&mut self, fields: &[(&str, Value)], shallow: bool) -> Result<(), Error> {
        let candidate = self.checked_candidate(fields)?;
        if !shallow {
            check_nested(&candidate, fields)?;
        }
        self.commit(fields);
        if !shallow {
            commit_nested(&mut self.attrs, fields);
        }
        Ok(())
    }

    /// The attributes after assigning `fields`, validated against the schema.
    fn checked_candidate(&self, fields: &[(&str, Value)]) -> Result<AttrMap, Error> {
        let mut candidate = self.attrs.clone();
        for (name, value) in fields {
            candidate.insert(name.to_string(), value.clone());
        }
        let candidate = self.kind.normalize(candidate);
        self.kind
            .validate(&candidate)
            .map_err(|violation| Error::schema_violation(self.kind.name(), violation))?;
        Ok(candidate)
    }

    /// Writes already validated `fields` in place, so nested records keep
    /// their registered ids.
    fn commit(&mut self, fields: &[(&str, Value)]) {
        if fields.is_empty() {
            return;
        }
        for (name, value) in fields {
            self.attrs.insert(name.to_string(), value.clone());
        }
        self.attrs = self.kind.normalize(std::mem::take(&mut self.attrs));
    }

    fn present_fields<'f>(&self, fields: &[(&'f str, Value)]) -> Vec<(&'f str, Value)> {
        fields
            .iter()
            .filter(|(name, _)| self.attrs.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Records the current values of `names` in the stash, keeping any value
    /// already stashed for a name.
    pub(crate) fn stash_attrs(&mut self, names: &[&str]) {
        for name in names {
            if let Some(value) = self.attrs.get(*name) {
                self.stash
                    .entry(name.to_string())
                    .or_insert_with(|| value.clone());
            }
        }
    }

    /// Lineage clone: copies the declared attributes, applies `overrides`,
    /// re-validates, and keeps a reference to `self` as the origin.
    ///
    /// The clone is unowned and unregistered; side channels are not copied.
    ///
    /// # Errors
    ///
    /// [`Error::NotCloneable`] if the kind does not allow cloning,
    /// [`Error::AttributeNotFound`] if an override names an attribute the
    /// kind does not declare, or a schema violation from the new values.
    pub fn clone_with(&self, overrides: &[(&str, Value)]) -> Result<Record, Error> {
        if !self.kind.cloneable() {
            return Err(Error::NotCloneable(self.kind.name().to_string()));
        }
        let mut attrs: AttrMap = if self.kind.is_open() {
            self.attrs.clone()
        } else {
            self.kind
                .declared()
                .filter_map(|n| self.attrs.get(n).map(|v| (n.to_string(), v.clone())))
                .collect()
        };
        for (name, value) in overrides {
            self.require_accepted(name)?;
            attrs.insert(name.to_string(), value.clone());
        }
        let mut derived = Record::new(&self.kind, attrs)?;
        derived.origin = Some(Arc::new(self.clone()));
        Ok(derived)
    }

    /// Renders the `attribute: value` text block.
    pub fn dump(&self) -> String {
        self.to_string()
    }

    fn write_block(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        for (name, value) in &self.attrs {
            match value {
                Value::Record(nested) => {
                    writeln!(f, "{}{}:", pad, name)?;
                    nested.write_block(f, depth + 1)?;
                }
                Value::List(list) => {
                    writeln!(f, "{}{}:", pad, name)?;
                    for nested in list.iter() {
                        writeln!(f, "{}  -", pad)?;
                        nested.write_block(f, depth + 2)?;
                    }
                }
                _ => writeln!(f, "{}{}: {}", pad, name, value)?,
            }
        }
        Ok(())
    }
}

fn nested_records(attrs: &AttrMap) -> impl Iterator<Item = &Record> {
    attrs.values().flat_map(|value| match value {
        Value::Record(nested) => std::slice::from_ref(&**nested),
        Value::List(list) => list.records(),
        _ => &[][..],
    })
}

fn check_nested(attrs: &AttrMap, fields: &[(&str, Value)]) -> Result<(), Error> {
    for nested in nested_records(attrs) {
        let present = nested.present_fields(fields);
        if present.is_empty() {
            check_nested(&nested.attrs, fields)?;
        } else {
            check_nested(&nested.checked_candidate(&present)?, fields)?;
        }
    }
    Ok(())
}

fn commit_nested(attrs: &mut AttrMap, fields: &[(&str, Value)]) {
    for value in attrs.values_mut() {
        let nested: &mut [Record] = match value {
            Value::Record(nested) => std::slice::from_mut(&mut **nested),
            Value::List(list) => list.records_mut(),
            _ => continue,
        };
        for record in nested {
            let present = record.present_fields(fields);
            record.commit(&present);
            commit_nested(&mut record.attrs, fields);
        }
    }
}

/// Copies everything except the registered id: a copy is a new instance
/// that a [`BuildContext`](super::ownership::BuildContext) has not seen.
impl Clone for Record {
    fn clone(&self) -> Self {
        Self {
            kind: Arc::clone(&self.kind),
            attrs: self.attrs.clone(),
            history: self.history.clone(),
            stash: self.stash.clone(),
            owner: self.owner.clone(),
            claimed: self.claimed,
            origin: self.origin.clone(),
            id: None,
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

/// The weak ordering as a partial order: `None` when neither record is
/// weakly less than the other and they are not equal.
impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.equals(other) {
            Some(Ordering::Equal)
        } else if self.less_than(other) {
            Some(Ordering::Less)
        } else if other.less_than(self) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_block(f, 0)
    }
}

impl AttributeBag for Record {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.attrs.get(name).cloned()
    }

    fn attribute_names(&self) -> Vec<String> {
        self.attrs.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::error::Violation;
    use crate::model::list::RecordList;
    use crate::model::ownership::BuildContext;
    use crate::model::schema::Trigger;

    fn residue() -> Arc<Schema> {
        Schema::builder("residue")
            .required(["resname", "resseqnum"])
            .optional(["chainID", "insertion", "protonation", "segname", "segtype", "atoms"])
            .default_value("insertion", "")
            .exclusive("segname", "segtype")
            .allowed("chainID", ["A", "B", "C"])
            .depends("resname", Trigger::Equals(Value::from("HIS")), ["protonation"])
            .ignore(["atoms"])
            .cloneable(true)
            .build()
            .unwrap()
    }

    fn res(name: &str, seq: i64) -> Record {
        Record::from_pairs(
            &residue(),
            [("resname", Value::from(name)), ("resseqnum", Value::Int(seq))],
        )
        .unwrap()
    }

    fn violation(err: Error) -> Violation {
        match err {
            Error::SchemaViolation { violation, .. } => violation,
            other => panic!("expected a schema violation, got {other:?}"),
        }
    }

    #[test]
    fn construction_applies_defaults_in_declaration_order() {
        let r = Record::from_pairs(
            &residue(),
            [("resseqnum", Value::Int(3)), ("resname", Value::from("GLY"))],
        )
        .unwrap();
        assert_eq!(r.get("insertion"), Some(&Value::from("")));
        assert_eq!(r.dump(), "resname: GLY\nresseqnum: 3\ninsertion: \n");
    }

    #[test]
    fn construction_rejects_each_kind_of_violation() {
        let schema = residue();
        let missing = Record::from_pairs(&schema, [("resname", "ALA")]).unwrap_err();
        assert_eq!(violation(missing), Violation::MissingRequired("resseqnum".into()));

        let exclusive = Record::from_pairs(
            &schema,
            [
                ("resname", Value::from("ALA")),
                ("resseqnum", Value::Int(1)),
                ("segname", Value::from("A")),
                ("segtype", Value::from("protein")),
            ],
        )
        .unwrap_err();
        assert!(matches!(violation(exclusive), Violation::MutuallyExclusive(..)));

        let domain = Record::from_pairs(
            &schema,
            [
                ("resname", Value::from("ALA")),
                ("resseqnum", Value::Int(1)),
                ("chainID", Value::from("Q")),
            ],
        )
        .unwrap_err();
        assert!(matches!(violation(domain), Violation::DisallowedValue { .. }));

        let dependency = Record::from_pairs(
            &schema,
            [("resname", Value::from("HIS")), ("resseqnum", Value::Int(1))],
        )
        .unwrap_err();
        assert!(matches!(violation(dependency), Violation::UnmetDependency { .. }));

        let unknown = Record::from_pairs(
            &schema,
            [
                ("resname", Value::from("ALA")),
                ("resseqnum", Value::Int(1)),
                ("occupancy", Value::Float(1.0)),
            ],
        )
        .unwrap_err();
        assert_eq!(violation(unknown), Violation::Undeclared("occupancy".into()));
    }

    #[test]
    fn construction_from_another_record_takes_declared_attributes() {
        let source_kind = Schema::builder("hetatm").build().unwrap();
        let source = Record::from_pairs(
            &source_kind,
            [
                ("resname", Value::from("HOH")),
                ("resseqnum", Value::Int(9)),
                ("x", Value::Float(1.0)),
            ],
        )
        .unwrap();
        let r = Record::new(&residue(), RecordInput::Bag(&source)).unwrap();
        assert_eq!(r.get("resname"), Some(&Value::from("HOH")));
        assert!(!r.has("x"));
    }

    #[test]
    fn equality_is_reflexive_symmetric_and_ignores_side_channels() {
        let a = res("ALA", 1);
        let mut b = res("ALA", 1);
        assert!(a.equals(&a));
        assert!(a.equals(&b) && b.equals(&a));

        b.put("atoms", Value::Int(12));
        b.stash_attrs(&["resseqnum"]);
        assert!(a.equals(&b) && b.equals(&a));

        b.put("chainID", "A");
        assert!(!a.equals(&b) && !b.equals(&a));
    }

    #[test]
    fn registered_ids_give_identity_within_a_kind() {
        let mut a = res("ALA", 1);
        let mut b = res("GLY", 2);
        a.id = Some(RecordId::new(4));
        b.id = Some(RecordId::new(4));
        assert!(a.is_same_instance(&b));
        assert!(a.equals(&b));

        let tag = Schema::builder("tag").required(["resname"]).build().unwrap();
        let mut other = Record::from_pairs(&tag, [("resname", "ALA")]).unwrap();
        other.id = Some(RecordId::new(4));
        assert!(!a.is_same_instance(&other));
        assert!(!a.equals(&other));
    }

    #[test]
    fn copies_are_new_instances() {
        let mut ctx = BuildContext::new();
        let mut list = RecordList::from_records(&residue(), vec![res("ALA", 1)]).unwrap();
        ctx.register_all(&mut list);
        let original = &list.records()[0];
        assert!(original.id().is_some());

        let mut copy = list.filter(|_| true).into_records().remove(0);
        assert_eq!(copy.id(), None);
        assert!(copy.equals(original));

        copy.set(&[("resname", Value::from("TRP")), ("resseqnum", Value::Int(99))], true)
            .unwrap();
        assert!(!copy.is_same_instance(original));
        assert!(!copy.equals(original));
        assert_eq!(original.get("resname"), Some(&Value::from("ALA")));
        assert_eq!(list.position_of(&copy), None);
        assert_eq!(original.clone().id(), None);
    }

    #[test]
    fn weak_ordering_is_consistent_with_equality() {
        let a = res("ALA", 1);
        let b = res("ALA", 2);
        let c = res("GLY", 1);
        assert!(a.less_than(&b));
        assert!(!b.less_than(&a));
        assert!(a.less_or_equal(&b) && !b.less_or_equal(&a));
        // ALA < GLY but 2 > 1: incomparable.
        assert!(!b.less_than(&c) && !c.less_than(&b));
        assert_eq!(b.partial_cmp(&c), None);

        for (x, y) in [(&a, &b), (&a, &c), (&b, &c), (&a, &a)] {
            let both = x.less_or_equal(y) && y.less_or_equal(x);
            assert_eq!(both, x.equals(y));
        }
    }

    #[test]
    fn record_without_orderable_attributes_is_never_less() {
        let kind = Schema::builder("holder").required(["payload"]).build().unwrap();
        let inner = res("ALA", 1);
        let a = Record::from_pairs(&kind, [("payload", inner.clone())]).unwrap();
        let b = Record::from_pairs(&kind, [("payload", res("GLY", 5))]).unwrap();
        assert!(!a.less_than(&b) && !b.less_than(&a));
        assert!(a.less_or_equal(&b) && b.less_or_equal(&a));
        assert!(!a.equals(&b));
    }

    #[test]
    fn weak_comparisons_use_only_named_attributes() {
        let a = res("GLY", 1);
        let b = res("ALA", 2);
        assert!(a.weak_less_than(&b, &["resseqnum"]));
        assert!(!a.weak_less_than(&b, &["resname"]));
        assert!(b.weak_less_or_equal(&a, &["resname"]));
    }

    #[test]
    fn str_hash_sorts_names_and_marks_absent_fields() {
        let r = res("ALA", 5);
        assert_eq!(r.str_hash(Some(&["resseqnum", "resname"])), "resname=ALA;resseqnum=5");
        assert_eq!(r.str_hash(Some(&["chainID"])), "chainID=?");
        assert_eq!(r.str_hash(None), "insertion=;resname=ALA;resseqnum=5");
        let d = r.digest(Some(&["resname"]));
        assert_eq!(d.len(), 64);
        assert_eq!(d, res("ALA", 9).digest(Some(&["resname"])));
    }

    #[test]
    fn exact_and_wild_matching() {
        let r = res("ALA", 5);
        assert!(r.matches(&[("resname", Value::from("ALA"))]));
        assert!(!r.matches(&[("resname", Value::from("GLY"))]));
        assert!(!r.matches(&[("chainID", Value::from("A"))]));
        assert!(r.wild_match(&[("seq", Value::Int(5))]));
        assert!(!r.wild_match(&[("seq", Value::Int(6))]));
    }

    #[test]
    fn swap_and_copy_remember_first_prior_value() {
        let kind = Schema::builder("link")
            .required(["chain1", "chain2"])
            .optional(["note"])
            .build()
            .unwrap();
        let mut r = Record::from_pairs(&kind, [("chain1", "A"), ("chain2", "B")]).unwrap();
        r.swap_attr("chain1", "chain2").unwrap();
        assert_eq!(r.get("chain1"), Some(&Value::from("B")));
        r.swap_attr("chain1", "chain2").unwrap();
        assert_eq!(r.history().get("chain1"), Some(&Value::from("A")));

        r.copy_attr("chain2", "chain1").unwrap();
        assert_eq!(r.get("chain2"), Some(&Value::from("A")));
        assert_eq!(r.history().get("chain2"), Some(&Value::from("B")));

        let err = r.swap_attr("chain1", "note").unwrap_err();
        assert!(matches!(err, Error::AttributeNotFound { .. }));
        let err = r.copy_attr("bogus", "chain1").unwrap_err();
        assert!(matches!(err, Error::AttributeNotFound { .. }));
    }

    #[test]
    fn map_attr_translates_through_table() {
        let mut r = res("HSD", 1);
        let table = [(Value::from("HSD"), Value::from("HIS"))];
        assert!(r.map_attr("resname", "resname", &table).unwrap());
        assert_eq!(r.get("resname"), Some(&Value::from("HIS")));
        assert!(!r.map_attr("resname", "resname", &table).unwrap());
        assert!(r.map_attr("resname", "chainID", &table).is_err());
    }

    #[test]
    fn set_validates_and_leaves_receiver_untouched_on_failure() {
        let mut r = res("ALA", 1);
        r.set(&[("chainID", Value::from("B"))], true).unwrap();
        assert_eq!(r.get("chainID"), Some(&Value::from("B")));

        let err = r.set(&[("chainID", Value::from("Z"))], true).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation { .. }));
        assert_eq!(r.get("chainID"), Some(&Value::from("B")));
    }

    #[test]
    fn deep_set_reaches_nested_records_that_hold_the_field() {
        let segment = Schema::builder("segment")
            .required(["segname"])
            .optional(["chainID", "residues"])
            .build()
            .unwrap();
        let mut with_chain = res("ALA", 1);
        with_chain.put("chainID", "A");
        let without_chain = res("GLY", 2);
        let residues = RecordList::from_records(&residue(), vec![with_chain, without_chain]).unwrap();
        let mut seg = Record::from_pairs(
            &segment,
            [("segname", Value::from("PROA")), ("residues", Value::List(residues))],
        )
        .unwrap();

        seg.set(&[("chainID", Value::from("C"))], false).unwrap();
        assert_eq!(seg.get("chainID"), Some(&Value::from("C")));
        let nested = seg.get("residues").and_then(Value::as_list).unwrap();
        assert_eq!(nested.records()[0].get("chainID"), Some(&Value::from("C")));
        assert!(!nested.records()[1].has("chainID"));
    }

    #[test]
    fn failing_deep_set_changes_nothing() {
        let segment = Schema::builder("segment")
            .required(["segname"])
            .optional(["chainID", "cap", "residues"])
            .build()
            .unwrap();
        let cap_kind = Schema::builder("cap").build().unwrap();
        let cap = Record::from_pairs(&cap_kind, [("chainID", "A")]).unwrap();
        let mut nested = res("ALA", 1);
        nested.put("chainID", "A");
        let residues = RecordList::from_records(&residue(), vec![nested]).unwrap();
        let mut seg = Record::from_pairs(
            &segment,
            [
                ("segname", Value::from("PROA")),
                ("chainID", Value::from("A")),
                ("cap", Value::from(cap)),
                ("residues", Value::List(residues)),
            ],
        )
        .unwrap();

        let err = seg.set(&[("chainID", Value::from("Z"))], false).unwrap_err();
        assert!(matches!(
            err,
            Error::SchemaViolation { ref kind, violation: Violation::DisallowedValue { .. } } if kind == "residue"
        ));
        assert_eq!(seg.get("chainID"), Some(&Value::from("A")));
        let cap = seg.get("cap").and_then(Value::as_record).unwrap();
        assert_eq!(cap.get("chainID"), Some(&Value::from("A")));
        let nested = seg.get("residues").and_then(Value::as_list).unwrap();
        assert_eq!(nested.records()[0].get("chainID"), Some(&Value::from("A")));

        // The same set without the nested residue's domain applies everywhere.
        seg.set(&[("chainID", Value::from("Z"))], true).unwrap();
        assert_eq!(seg.get("chainID"), Some(&Value::from("Z")));
        let cap = seg.get("cap").and_then(Value::as_record).unwrap();
        assert_eq!(cap.get("chainID"), Some(&Value::from("A")));
    }

    #[test]
    fn deep_set_keeps_nested_registrations() {
        let holder = Schema::builder("holder").build().unwrap();
        let mut ctx = BuildContext::new();
        let mut inner = res("ALA", 1);
        let id = ctx.register(&mut inner);
        let mut r = Record::from_pairs(
            &holder,
            [("name", Value::from("outer")), ("inner", Value::from(inner))],
        )
        .unwrap();
        r.set(&[("resseqnum", Value::Int(7))], false).unwrap();
        let inner = r.resolve(id).unwrap();
        assert_eq!(inner.get("resseqnum"), Some(&Value::Int(7)));
    }

    #[test]
    fn clone_with_keeps_lineage_and_applies_overrides() {
        let original = res("ALA", 1);
        let derived = original.clone_with(&[("resseqnum", Value::Int(2))]).unwrap();
        assert_eq!(derived.get("resseqnum"), Some(&Value::Int(2)));
        assert!(derived.is_clone());
        assert!(derived.origin().unwrap().equals(&original));

        let grandchild = derived.clone_with(&[]).unwrap();
        assert_eq!(grandchild.ancestors().count(), 2);

        let err = original.clone_with(&[("bogus", Value::Int(1))]).unwrap_err();
        assert!(matches!(err, Error::AttributeNotFound { .. }));

        let frozen = Schema::builder("frozen").required(["a"]).build().unwrap();
        let r = Record::from_pairs(&frozen, [("a", 1)]).unwrap();
        assert_eq!(r.clone_with(&[]).unwrap_err(), Error::NotCloneable("frozen".into()));
    }

    #[test]
    fn dump_indents_nested_records() {
        let holder = Schema::builder("holder")
            .required(["name", "inner"])
            .build()
            .unwrap();
        let r = Record::from_pairs(
            &holder,
            [("name", Value::from("outer")), ("inner", Value::from(res("ALA", 1)))],
        )
        .unwrap();
        assert_eq!(
            r.dump(),
            "name: outer\ninner:\n  resname: ALA\n  resseqnum: 1\n  insertion: \n"
        );
    }
}
