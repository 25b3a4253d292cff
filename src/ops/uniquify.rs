//! Identity-collision resolution.
//!
//! Records are binned by their identity fields. In every colliding bin the
//! first record keeps its identity; each later one stashes its identity
//! values and has its leading (numeric) identity field bumped until its key
//! is free. Bumping can push a record into another existing bin, so the list
//! is re-binned and the process repeats, up to [`MAX_PASSES`] times.

use super::error::Error;
use crate::model::list::RecordList;
use crate::model::value::Value;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// Upper bound on re-binning passes.
pub const MAX_PASSES: usize = 10;

/// Makes the identity key over `fields` unique across `list`, then forces
/// the `make_common` attributes of every element to the values of the first
/// element.
///
/// Every record whose identity changes keeps its original identity values in
/// its stash, as does every record whose make-common values change. A value
/// already stashed for an attribute is never overwritten.
///
/// A bumped record may land in a bin that is already occupied, which then
/// collides in the next pass. One duplicate ahead of a run of consecutive
/// values therefore needs one pass per value it shifts, so a duplicate in
/// front of more than [`MAX_PASSES`] consecutive values fails even though a
/// free key exists.
///
/// # Errors
///
/// - [`Error::NoIdentityFields`] if `fields` is empty.
/// - [`Error::OverlappingFields`] if an attribute is in both lists.
/// - [`Error::UniquificationExhausted`] if collisions remain after
///   [`MAX_PASSES`] passes, or a colliding record's leading identity field is
///   missing or not numeric. The list may have been partially modified.
pub fn uniquify(list: &mut RecordList, fields: &[&str], make_common: &[&str]) -> Result<(), Error> {
    let Some(&lead) = fields.first() else {
        return Err(Error::NoIdentityFields);
    };
    if let Some(shared) = make_common.iter().find(|c| fields.contains(*c)) {
        return Err(Error::OverlappingFields(shared.to_string()));
    }

    let mut passes = 0;
    loop {
        let groups = key_groups(list, fields);
        let collisions: usize = groups.values().filter(|g| g.len() > 1).map(Vec::len).sum();
        if collisions == 0 {
            break;
        }
        if passes == MAX_PASSES {
            return Err(Error::exhausted(fields, passes, collisions, "pass limit reached"));
        }
        passes += 1;

        let mut taken: HashSet<String> = HashSet::new();
        let mut moved = 0;
        for (key, members) in groups.iter().filter(|(_, g)| g.len() > 1) {
            for &index in &members[1..] {
                let record = &mut list.records_mut()[index];
                record.stash_attrs(fields);
                loop {
                    let current = record.get(lead).ok_or_else(|| {
                        Error::exhausted(fields, passes, collisions, format!("'{}' is missing", lead))
                    })?;
                    let next = bump(current).ok_or_else(|| {
                        Error::exhausted(
                            fields,
                            passes,
                            collisions,
                            format!("'{}' = {} cannot be incremented", lead, current),
                        )
                    })?;
                    record.put(lead, next);
                    let new_key = record.str_hash(Some(fields));
                    if new_key != *key && taken.insert(new_key) {
                        break;
                    }
                }
                moved += 1;
            }
        }
        debug!(pass = passes, moved, collisions, "uniquification pass");
    }

    if !make_common.is_empty() {
        force_common(list, make_common);
    }
    Ok(())
}

/// Element indices grouped by identity key, in first-seen order.
fn key_groups(list: &RecordList, fields: &[&str]) -> IndexMap<String, Vec<usize>> {
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (index, record) in list.iter().enumerate() {
        groups
            .entry(record.str_hash(Some(fields)))
            .or_default()
            .push(index);
    }
    groups
}

/// The next value of a numeric identity field; `None` if the value is not
/// numeric or does not grow (overflow, infinities, NaN).
fn bump(value: &Value) -> Option<Value> {
    let next = value.incremented()?;
    (next.natural_cmp(value) == Some(Ordering::Greater)).then_some(next)
}

fn force_common(list: &mut RecordList, make_common: &[&str]) {
    let Some(first) = list.first() else {
        return;
    };
    let common: Vec<(&str, Value)> = make_common
        .iter()
        .filter_map(|name| first.get(name).map(|v| (*name, v.clone())))
        .collect();

    let mut changed_records = 0;
    for record in list.iter_mut().skip(1) {
        let changed: Vec<&str> = common
            .iter()
            .filter(|(name, value)| record.get(name) != Some(value))
            .map(|(name, _)| *name)
            .collect();
        if changed.is_empty() {
            continue;
        }
        record.stash_attrs(&changed);
        for (name, value) in &common {
            record.put(*name, value.clone());
        }
        changed_records += 1;
    }
    debug!(fields = ?make_common, changed = changed_records, "made attributes common");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::Record;
    use crate::model::schema::Schema;
    use std::sync::Arc;

    fn residue() -> Arc<Schema> {
        Schema::builder("residue")
            .required(["resname", "resseqnum"])
            .optional(["chainID", "segname"])
            .build()
            .unwrap()
    }

    fn list_of(rows: &[(&str, i64, &str)]) -> RecordList {
        let kind = residue();
        let records = rows
            .iter()
            .map(|(name, seq, chain)| {
                Record::from_pairs(
                    &kind,
                    [
                        ("resname", Value::from(*name)),
                        ("resseqnum", Value::Int(*seq)),
                        ("chainID", Value::from(*chain)),
                    ],
                )
                .unwrap()
            })
            .collect();
        RecordList::from_records(&kind, records).unwrap()
    }

    fn seqs(list: &RecordList) -> Vec<i64> {
        list.iter()
            .filter_map(|r| r.get("resseqnum").and_then(Value::as_int))
            .collect()
    }

    fn stashed_seqs(list: &RecordList) -> Vec<Option<i64>> {
        list.iter()
            .map(|r| r.stashed("resseqnum").and_then(Value::as_int))
            .collect()
    }

    #[test]
    fn cascading_collision_is_resolved_across_passes() {
        let mut list = list_of(&[("ALA", 1, "A"), ("GLY", 1, "A"), ("SER", 2, "A")]);
        uniquify(&mut list, &["resseqnum"], &[]).unwrap();
        assert_eq!(seqs(&list), vec![1, 2, 3]);
        assert_eq!(stashed_seqs(&list), vec![None, Some(1), Some(2)]);
        assert_eq!(list.bin(&["resseqnum"]).len(), list.len());
    }

    #[test]
    fn identical_duplicates_are_separated() {
        let kind = Schema::builder("pair").required(["a", "b"]).build().unwrap();
        let records = [(1, 1), (1, 1), (2, 1)]
            .iter()
            .map(|(a, b)| Record::from_pairs(&kind, [("a", Value::Int(*a)), ("b", Value::Int(*b))]).unwrap())
            .collect();
        let mut list = RecordList::from_records(&kind, records).unwrap();
        assert!(list.records()[0].equals(&list.records()[1]));

        uniquify(&mut list, &["a"], &[]).unwrap();
        let a: Vec<i64> = list.iter().filter_map(|r| r.get("a").and_then(Value::as_int)).collect();
        assert_eq!(a, vec![1, 2, 3]);
        let stashed: Vec<Option<i64>> = list.iter().map(|r| r.stashed("a").and_then(Value::as_int)).collect();
        assert_eq!(stashed, vec![None, Some(1), Some(2)]);
        let bins = list.bin(&["a"]);
        assert_eq!(bins.len(), 3);
        assert!(bins.values().all(|members| members.len() == 1));
        assert!(list.iter().all(|r| r.get("b") == Some(&Value::Int(1))));
    }

    #[test]
    fn bin_members_skip_keys_taken_in_the_same_pass() {
        let mut list = list_of(&[("ALA", 1, "A"), ("GLY", 1, "A"), ("SER", 1, "A")]);
        uniquify(&mut list, &["resseqnum"], &[]).unwrap();
        assert_eq!(seqs(&list), vec![1, 2, 3]);
        assert_eq!(stashed_seqs(&list), vec![None, Some(1), Some(1)]);
    }

    #[test]
    fn only_the_leading_field_is_bumped() {
        let mut list = list_of(&[("ALA", 1, "A"), ("GLY", 1, "B"), ("SER", 1, "A")]);
        uniquify(&mut list, &["resseqnum", "chainID"], &[]).unwrap();
        assert_eq!(seqs(&list), vec![1, 1, 2]);
        assert_eq!(list.records()[2].get("chainID"), Some(&Value::from("A")));
        assert_eq!(list.bin(&["resseqnum", "chainID"]).len(), 3);
    }

    #[test]
    fn already_unique_list_is_untouched() {
        let mut list = list_of(&[("ALA", 4, "A"), ("GLY", 5, "A")]);
        uniquify(&mut list, &["resseqnum"], &[]).unwrap();
        assert_eq!(seqs(&list), vec![4, 5]);
        assert!(list.iter().all(|r| r.stash().is_empty()));
    }

    #[test]
    fn long_cascade_hits_the_pass_limit() {
        let mut short: Vec<(&str, i64, &str)> = vec![("ALA", 1, "A")];
        short.extend((1..=5).map(|n| ("GLY", n, "A")));
        let mut list = list_of(&short);
        uniquify(&mut list, &["resseqnum"], &[]).unwrap();
        assert_eq!(seqs(&list), vec![1, 2, 3, 4, 5, 6]);

        let mut long: Vec<(&str, i64, &str)> = vec![("ALA", 1, "A")];
        long.extend((1..=12).map(|n| ("GLY", n, "A")));
        let mut list = list_of(&long);
        let err = uniquify(&mut list, &["resseqnum"], &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::UniquificationExhausted { passes: MAX_PASSES, collisions: 2, .. }
        ));
    }

    #[test]
    fn non_numeric_leading_field_fails() {
        let mut list = list_of(&[("ALA", 1, "A"), ("ALA", 2, "A")]);
        let err = uniquify(&mut list, &["resname"], &[]).unwrap_err();
        match err {
            Error::UniquificationExhausted { reason, .. } => {
                assert_eq!(reason, "'resname' = ALA cannot be incremented")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn argument_checks() {
        let mut list = list_of(&[("ALA", 1, "A")]);
        assert_eq!(uniquify(&mut list, &[], &[]), Err(Error::NoIdentityFields));
        assert_eq!(
            uniquify(&mut list, &["resseqnum"], &["resseqnum"]),
            Err(Error::OverlappingFields("resseqnum".into()))
        );
    }

    #[test]
    fn make_common_forces_first_values_and_stashes_changes() {
        let mut list = list_of(&[("ALA", 1, "A"), ("GLY", 2, "B"), ("SER", 3, "A")]);
        uniquify(&mut list, &["resseqnum"], &["chainID"]).unwrap();
        assert!(list.iter().all(|r| r.get("chainID") == Some(&Value::from("A"))));
        assert_eq!(list.records()[1].stashed("chainID"), Some(&Value::from("B")));
        assert!(list.records()[2].stash().is_empty());
    }
}
