//! Run-length reduction of per-record states into intervals.
//!
//! The state of each record comes from a caller-supplied classifier and may
//! be any [`Value`]; consecutive records with equal states collapse into one
//! [`StateInterval`] with inclusive index bounds. A typical use turns a flat
//! residue list into resolved and missing runs.

use super::error::Error;
use crate::io::catalog::default_catalog;
use crate::model::list::RecordList;
use crate::model::record::Record;
use crate::model::schema::Schema;
use crate::model::value::Value;
use std::sync::Arc;

/// Name of the built-in interval kind.
pub const STATE_INTERVAL: &str = "state_interval";

/// The built-in `state_interval` kind from the default catalog.
pub fn state_interval_kind() -> &'static Arc<Schema> {
    default_catalog()
        .kind(STATE_INTERVAL)
        .expect("Embedded catalog lacks the state_interval kind. This is a library bug.")
}

/// Typed view of a `state_interval` record.
#[derive(Debug, Clone, PartialEq)]
pub struct StateInterval {
    pub state: Value,
    /// First index, inclusive.
    pub start: usize,
    /// Last index, inclusive.
    pub end: usize,
    pub buildable: Option<bool>,
}

impl StateInterval {
    pub fn new(state: impl Into<Value>, start: usize, end: usize) -> Self {
        Self {
            state: state.into(),
            start,
            end,
            buildable: None,
        }
    }

    /// Number of indices covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        (self.start..=self.end).contains(&index)
    }

    /// Record form, of the built-in `state_interval` kind.
    pub fn to_record(&self) -> Result<Record, Error> {
        let bounds = Value::Tuple(vec![Value::from(self.start), Value::from(self.end)]);
        let mut pairs = vec![("state", self.state.clone()), ("bounds", bounds)];
        if let Some(flag) = self.buildable {
            pairs.push(("buildable", Value::Bool(flag)));
        }
        Ok(Record::from_pairs(state_interval_kind(), pairs)?)
    }
}

fn index_of(value: &Value) -> Option<usize> {
    value.as_int().and_then(|n| usize::try_from(n).ok())
}

impl TryFrom<&Record> for StateInterval {
    type Error = Error;

    fn try_from(record: &Record) -> Result<Self, Error> {
        if record.kind_name() != STATE_INTERVAL {
            return Err(Error::malformed_interval(format!(
                "record is of kind '{}'",
                record.kind_name()
            )));
        }
        let state = record
            .get("state")
            .cloned()
            .ok_or_else(|| Error::malformed_interval("no state"))?;
        let (start, end) = match record.get("bounds").and_then(Value::as_tuple) {
            Some([a, b]) => match (index_of(a), index_of(b)) {
                (Some(start), Some(end)) => (start, end),
                _ => return Err(Error::malformed_interval("bounds are not indices")),
            },
            _ => return Err(Error::malformed_interval("bounds must be a pair")),
        };
        if end < start {
            return Err(Error::malformed_interval(format!(
                "end {} precedes start {}",
                end, start
            )));
        }
        let buildable = record.get("buildable").and_then(Value::as_bool);
        Ok(Self {
            state,
            start,
            end,
            buildable,
        })
    }
}

/// Maximal runs of equal consecutive states, in order.
pub fn runs<F>(list: &RecordList, state_of: F) -> Vec<StateInterval>
where
    F: Fn(&Record) -> Value,
{
    let mut out: Vec<StateInterval> = Vec::new();
    for (index, record) in list.iter().enumerate() {
        let state = state_of(record);
        if let Some(run) = out.last_mut() {
            if run.state == state {
                run.end = index;
                continue;
            }
        }
        out.push(StateInterval::new(state, index, index));
    }
    out
}

/// Reduces `list` to a list of `state_interval` records.
///
/// An empty input gives an empty output.
pub fn reduce<F>(list: &RecordList, state_of: F) -> Result<RecordList, Error>
where
    F: Fn(&Record) -> Value,
{
    let records = runs(list, state_of)
        .iter()
        .map(StateInterval::to_record)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RecordList::from_records(state_interval_kind(), records)?)
}

/// The per-index state sequence described by consecutive intervals.
///
/// # Errors
///
/// [`Error::MalformedInterval`] if an element is not a valid interval or the
/// intervals leave a gap or overlap.
pub fn expand_states(intervals: &RecordList) -> Result<Vec<Value>, Error> {
    let mut states = Vec::new();
    for record in intervals {
        let interval = StateInterval::try_from(record)?;
        if interval.start != states.len() {
            return Err(Error::malformed_interval(format!(
                "interval starts at {} but {} indices are covered",
                interval.start,
                states.len()
            )));
        }
        let len = interval.len();
        states.extend(std::iter::repeat_n(interval.state, len));
    }
    Ok(states)
}

/// Sets `buildable` on every interval to whether its state satisfies `pred`.
/// Returns the number of buildable intervals.
pub fn mark_buildable<P>(intervals: &mut RecordList, pred: P) -> Result<usize, Error>
where
    P: Fn(&Value) -> bool,
{
    let mut buildable = 0;
    for record in intervals.iter_mut() {
        let interval = StateInterval::try_from(&*record)?;
        let flag = pred(&interval.state);
        record.set(&[("buildable", Value::Bool(flag))], true)?;
        buildable += usize::from(flag);
    }
    Ok(buildable)
}
