//! Construction inputs for records.
//!
//! Every supported input shape is a variant of [`RecordInput`]; each variant
//! is turned into an [`AttrMap`] by its own conversion before the schema
//! check runs.

use super::error::Error;
use super::schema::Schema;
use super::value::{AttrMap, Value};

/// A generic attribute-bag-like object a record can be built from.
///
/// Only attributes the target schema declares are taken (all of them for
/// open schemas).
pub trait AttributeBag {
    fn attribute(&self, name: &str) -> Option<Value>;

    fn attribute_names(&self) -> Vec<String>;
}

/// Format-specific adapter supplied by a collaborator (a parsed file record,
/// a script directive, …) that knows how to produce a record's attributes.
pub trait RecordAdapter {
    fn to_attributes(&self) -> Result<AttrMap, Error>;
}

/// Supported construction inputs.
pub enum RecordInput<'a> {
    /// An explicit attribute map, taken verbatim.
    Attrs(AttrMap),
    /// Any attribute bag, including another record.
    Bag(&'a dyn AttributeBag),
    /// A collaborator-supplied adapter.
    Adapter(&'a dyn RecordAdapter),
}

impl RecordInput<'_> {
    pub(crate) fn into_attributes(self, schema: &Schema) -> Result<AttrMap, Error> {
        match self {
            RecordInput::Attrs(attrs) => Ok(attrs),
            RecordInput::Bag(bag) => Ok(from_bag(bag, schema)),
            RecordInput::Adapter(adapter) => adapter.to_attributes(),
        }
    }
}

impl From<AttrMap> for RecordInput<'_> {
    fn from(attrs: AttrMap) -> Self {
        RecordInput::Attrs(attrs)
    }
}

fn from_bag(bag: &dyn AttributeBag, schema: &Schema) -> AttrMap {
    if schema.is_open() {
        return bag
            .attribute_names()
            .into_iter()
            .filter_map(|name| bag.attribute(&name).map(|v| (name, v)))
            .collect();
    }
    schema
        .declared()
        .filter_map(|name| bag.attribute(name).map(|v| (name.to_string(), v)))
        .collect()
}

impl AttributeBag for AttrMap {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn attribute_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}
