use super::list::RecordList;
use super::ownership::RecordId;
use super::record::Record;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt;

/// Ordered attribute map backing every [`Record`].
pub type AttrMap = IndexMap<String, Value>;

/// Builds an [`AttrMap`] from `(name, value)` pairs, keeping their order.
pub fn attr_map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> AttrMap
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A single attribute value.
///
/// Scalars, strings and tuples of orderable values have a natural ordering.
/// Integers and floats compare with each other numerically. Nested records,
/// record lists and links compare for equality only.
///
/// A [`Value::Link`] refers to a registered record held elsewhere, usually
/// in another list; it is followed with [`Record::linked`].
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Tuple(Vec<Value>),
    Record(Box<Record>),
    List(RecordList),
    Link(RecordId),
}

impl Value {
    /// Natural ordering of two values, or `None` when the pair has none.
    ///
    /// Mismatched variants (other than int/float), nested records, lists and
    /// NaN floats are unordered.
    pub fn natural_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.natural_cmp(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }

    /// Whether this value can take part in an ordering comparison at all.
    pub fn is_orderable(&self) -> bool {
        match self {
            Value::Float(x) => !x.is_nan(),
            Value::Tuple(items) => items.iter().all(Value::is_orderable),
            Value::Record(_) | Value::List(_) | Value::Link(_) => false,
            _ => true,
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "str",
            Value::Tuple(_) => "tuple",
            Value::Record(_) => "record",
            Value::List(_) => "list",
            Value::Link(_) => "link",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&RecordList> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<RecordId> {
        match self {
            Value::Link(id) => Some(*id),
            _ => None,
        }
    }

    /// The value one unit above a numeric value.
    pub(crate) fn incremented(&self) -> Option<Value> {
        match self {
            Value::Int(n) => n.checked_add(1).map(Value::Int),
            Value::Float(x) => Some(Value::Float(x + 1.0)),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Char(_) => 3,
            Value::Str(_) => 4,
            Value::Tuple(_) => 5,
            Value::Record(_) => 6,
            Value::List(_) => 7,
            Value::Link(_) => 8,
        }
    }
}

/// Total order used for keyed sorting: absent values first, then by
/// variant rank, then by value. Floats use IEEE total ordering; nested
/// records and lists tie, links order by id.
pub(crate) fn sort_key_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let (a, b) = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(a), Some(b)) => (a, b),
    };
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let x = a.as_float().unwrap_or_default();
            let y = b.as_float().unwrap_or_default();
            x.total_cmp(&y)
        }
        (Value::Tuple(xs), Value::Tuple(ys)) => xs
            .iter()
            .zip(ys.iter())
            .map(|(x, y)| sort_key_cmp(Some(x), Some(y)))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| xs.len().cmp(&ys.len())),
        (Value::Record(_), Value::Record(_)) | (Value::List(_), Value::List(_)) => Ordering::Equal,
        (Value::Link(x), Value::Link(y)) => x.cmp(y),
        _ if a.rank() != b.rank() => a.rank().cmp(&b.rank()),
        _ => a.natural_cmp(b).unwrap_or(Ordering::Equal),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a.equals(b),
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Link(a), Value::Link(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Char(c) => write!(f, "{}", c),
            Value::Str(s) => write!(f, "{}", s),
            Value::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Value::Record(r) => write!(f, "<{} {}>", r.kind_name(), r.str_hash(None)),
            Value::List(l) => write!(f, "[{} x{}]", l.kind().name(), l.len()),
            Value::Link(id) => write!(f, "-> {}", id),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(Box::new(r))
    }
}

impl From<RecordList> for Value {
    fn from(l: RecordList) -> Self {
        Value::List(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values_compare_across_int_and_float() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_eq!(
            Value::Int(1).natural_cmp(&Value::Float(1.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Float(3.0).natural_cmp(&Value::Int(2)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn mismatched_variants_are_unordered() {
        assert_eq!(Value::from("A").natural_cmp(&Value::Int(1)), None);
        assert_eq!(Value::Float(f64::NAN).natural_cmp(&Value::Float(1.0)), None);
        assert!(!Value::Float(f64::NAN).is_orderable());
        assert_ne!(Value::from("1"), Value::Int(1));
    }

    #[test]
    fn tuples_order_lexicographically() {
        let a = Value::Tuple(vec![Value::Int(1), Value::Int(5)]);
        let b = Value::Tuple(vec![Value::Int(2), Value::Int(0)]);
        let c = Value::Tuple(vec![Value::Int(1)]);
        assert_eq!(a.natural_cmp(&b), Some(Ordering::Less));
        assert_eq!(c.natural_cmp(&a), Some(Ordering::Less));
        let mixed = Value::Tuple(vec![Value::from("x")]);
        assert_eq!(mixed.natural_cmp(&c), None);
    }

    #[test]
    fn display_forms_are_stable() {
        assert_eq!(Value::Int(-4).to_string(), "-4");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Char('A').to_string(), "A");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(
            Value::Tuple(vec![Value::Int(0), Value::Int(3)]).to_string(),
            "(0, 3)"
        );
        let link = Value::Link(RecordId::new(3));
        assert_eq!(link.to_string(), "-> #3");
        assert!(!link.is_orderable());
        assert_ne!(link, Value::Int(3));
    }

    #[test]
    fn increment_only_applies_to_numbers() {
        assert_eq!(Value::Int(1).incremented(), Some(Value::Int(2)));
        assert_eq!(Value::Float(0.5).incremented(), Some(Value::Float(1.5)));
        assert_eq!(Value::from("A").incremented(), None);
        assert_eq!(Value::Int(i64::MAX).incremented(), None);
    }

    #[test]
    fn sort_key_order_places_absent_first_and_is_total_over_floats() {
        let nan = Value::Float(f64::NAN);
        let one = Value::Float(1.0);
        assert_eq!(sort_key_cmp(None, Some(&one)), Ordering::Less);
        assert_eq!(sort_key_cmp(Some(&one), Some(&nan)), Ordering::Less);
        assert_eq!(
            sort_key_cmp(Some(&Value::Int(3)), Some(&Value::from("a"))),
            Ordering::Less
        );
    }

    #[test]
    fn attr_map_keeps_insertion_order() {
        let map = attr_map([("b", Value::Int(1)), ("a", Value::Int(2))]);
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
