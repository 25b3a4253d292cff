//! Record lists stored as TOML arrays of tables, one array per kind:
//!
//! ```toml
//! [[residue]]
//! resname = "ALA"
//! resseqnum = 1
//!
//! [[residue]]
//! resname = "GLY"
//! resseqnum = 2
//! ```
//!
//! Nested records are written as inline tables but cannot be read back, since
//! the file does not say which kind they are.

use super::catalog::Catalog;
use super::error::Error;
use super::util::{from_toml, list_rows};
use crate::model::error::Error as RecordError;
use crate::model::input::{RecordAdapter, RecordInput};
use crate::model::list::RecordList;
use crate::model::record::Record;
use crate::model::schema::Schema;
use crate::model::value::AttrMap;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::debug;

/// One array-of-tables entry, adapted for record construction.
pub struct TableRow<'a> {
    kind: &'a str,
    index: usize,
    table: &'a toml::Table,
}

impl<'a> TableRow<'a> {
    pub fn new(kind: &'a str, index: usize, table: &'a toml::Table) -> Self {
        Self { kind, index, table }
    }
}

impl RecordAdapter for TableRow<'_> {
    fn to_attributes(&self) -> Result<AttrMap, RecordError> {
        self.table
            .iter()
            .map(|(name, value)| {
                from_toml(value).map(|v| (name.clone(), v)).map_err(|e| {
                    RecordError::Adapter(format!(
                        "{} entry {}, attribute '{}': {}",
                        self.kind,
                        self.index + 1,
                        name,
                        e
                    ))
                })
            })
            .collect()
    }
}

fn rows<'a>(doc: &'a toml::Table, name: &str) -> Result<Vec<&'a toml::Table>, Error> {
    let Some(entries) = doc.get(name) else {
        return Ok(Vec::new());
    };
    let context = || format!("'{}' records", name);
    let array = entries
        .as_array()
        .ok_or_else(|| Error::parse(context(), "expected an array of tables"))?;
    array
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.as_table()
                .ok_or_else(|| Error::parse(context(), format!("entry {} is not a table", i + 1)))
        })
        .collect()
}

fn build_list(doc: &toml::Table, kind: &Arc<Schema>) -> Result<RecordList, Error> {
    let mut list = RecordList::new(kind);
    for (index, table) in rows(doc, kind.name())?.into_iter().enumerate() {
        let row = TableRow::new(kind.name(), index, table);
        list.push(Record::new(kind, RecordInput::Adapter(&row))?)?;
    }
    debug!(kind = kind.name(), records = list.len(), "records parsed");
    Ok(list)
}

/// Parses the records of `kind` from `text`. A document without an array
/// for the kind gives an empty list.
pub fn parse_records(text: &str, kind: &Arc<Schema>) -> Result<RecordList, Error> {
    let doc: toml::Table = toml::from_str(text)?;
    build_list(&doc, kind)
}

/// Parses every array in `text`, each of which must name a kind of `catalog`.
pub fn parse_all(text: &str, catalog: &Catalog) -> Result<Vec<RecordList>, Error> {
    let doc: toml::Table = toml::from_str(text)?;
    doc.keys()
        .map(|name| build_list(&doc, catalog.require(name)?))
        .collect()
}

pub fn read_records<R: BufRead>(mut reader: R, kind: &Arc<Schema>) -> Result<RecordList, Error> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_records(&text, kind)
}

/// Renders `lists` as one document. Lists of the same kind are concatenated.
///
/// # Errors
///
/// [`Error::Conversion`] if a record holds a link, which has no file form.
pub fn to_toml_string(lists: &[&RecordList]) -> Result<String, Error> {
    let mut doc = toml::Table::new();
    for list in lists {
        let name = list.kind().name();
        let rows = list_rows(list)?;
        match doc.get_mut(name) {
            Some(toml::Value::Array(existing)) => existing.extend(rows),
            _ => {
                doc.insert(name.to_string(), toml::Value::Array(rows));
            }
        }
    }
    Ok(toml::to_string(&doc)?)
}

pub fn write_records<W: Write>(mut writer: W, lists: &[&RecordList]) -> Result<(), Error> {
    writer.write_all(to_toml_string(lists)?.as_bytes())?;
    Ok(())
}
