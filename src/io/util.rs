//! Conversion between TOML values and attribute values.

use crate::model::list::RecordList;
use crate::model::ownership::RecordId;
use crate::model::record::Record;
use crate::model::value::Value;

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("inline tables cannot be read as attribute values")]
    UnsupportedTable,
    #[error("empty arrays have no attribute value")]
    EmptyArray,
    #[error("link to record {0} cannot be written; links only resolve in memory")]
    Link(RecordId),
}

/// Reads a TOML value as an attribute value.
///
/// Arrays become tuples and datetimes become strings. Tables are rejected:
/// a nested record needs a kind, which TOML does not carry.
pub fn from_toml(value: &toml::Value) -> Result<Value, ConversionError> {
    Ok(match value {
        toml::Value::String(s) => Value::Str(s.clone()),
        toml::Value::Integer(n) => Value::Int(*n),
        toml::Value::Float(x) => Value::Float(*x),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(d) => Value::Str(d.to_string()),
        toml::Value::Array(items) if items.is_empty() => return Err(ConversionError::EmptyArray),
        toml::Value::Array(items) => {
            Value::Tuple(items.iter().map(from_toml).collect::<Result<_, _>>()?)
        }
        toml::Value::Table(_) => return Err(ConversionError::UnsupportedTable),
    })
}

/// Writes an attribute value as TOML. Characters become one-character
/// strings, nested records become tables and lists arrays of tables.
/// Links have no file form and are rejected.
pub fn to_toml(value: &Value) -> Result<toml::Value, ConversionError> {
    Ok(match value {
        Value::Bool(b) => toml::Value::Boolean(*b),
        Value::Int(n) => toml::Value::Integer(*n),
        Value::Float(x) => toml::Value::Float(*x),
        Value::Char(c) => toml::Value::String(c.to_string()),
        Value::Str(s) => toml::Value::String(s.clone()),
        Value::Tuple(items) => {
            toml::Value::Array(items.iter().map(to_toml).collect::<Result<_, _>>()?)
        }
        Value::Record(record) => toml::Value::Table(record_table(record)?),
        Value::List(list) => list_array(list)?,
        Value::Link(id) => return Err(ConversionError::Link(*id)),
    })
}

pub fn record_table(record: &Record) -> Result<toml::Table, ConversionError> {
    record
        .attributes()
        .iter()
        .map(|(name, value)| to_toml(value).map(|v| (name.clone(), v)))
        .collect()
}

pub fn list_rows(list: &RecordList) -> Result<Vec<toml::Value>, ConversionError> {
    list.iter()
        .map(|r| record_table(r).map(toml::Value::Table))
        .collect()
}

pub fn list_array(list: &RecordList) -> Result<toml::Value, ConversionError> {
    list_rows(list).map(toml::Value::Array)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_and_arrays_convert() {
        let v: toml::Value = toml::from_str::<toml::Table>("x = [1, 2]").unwrap()["x"].clone();
        assert_eq!(
            from_toml(&v).unwrap(),
            Value::Tuple(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(to_toml(&Value::Char('A')).unwrap(), toml::Value::String("A".into()));
    }

    #[test]
    fn tables_and_empty_arrays_are_rejected() {
        let table = toml::Value::Table(toml::Table::new());
        assert!(matches!(from_toml(&table), Err(ConversionError::UnsupportedTable)));
        let empty = toml::Value::Array(Vec::new());
        assert!(matches!(from_toml(&empty), Err(ConversionError::EmptyArray)));
    }

    #[test]
    fn links_cannot_be_written() {
        let link = Value::Tuple(vec![Value::Int(1), Value::Link(RecordId::new(5))]);
        assert!(matches!(to_toml(&link), Err(ConversionError::Link(id)) if id.get() == 5));
    }
}
