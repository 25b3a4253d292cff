//! Record kinds declared in TOML.
//!
//! Each top-level table declares one kind:
//!
//! ```toml
//! [residue]
//! required = ["resname", "resseqnum"]
//! optional = ["chainID", "insertion", "protonation"]
//! defaults = { insertion = "" }
//! allowed = { chainID = ["A", "B"] }
//! mutually_exclusive = [["segname", "segtype"]]
//! dependencies = { resname = [{ when = "HIS", requires = ["protonation"] }] }
//! ignored = ["atoms"]
//! cloneable = true
//! ```
//!
//! A dependency without `when` (or with `when = "*"`) fires on any value.

use super::error::Error;
use super::util::from_toml;
use crate::model::schema::{Schema, Trigger};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::sync::{Arc, OnceLock};

const DEFAULT_KINDS_TOML: &str = include_str!("../../resources/default.kinds.toml");

static DEFAULT_CATALOG: OnceLock<Catalog> = OnceLock::new();

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KindSpec {
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub defaults: BTreeMap<String, toml::Value>,
    pub mutually_exclusive: Vec<(String, String)>,
    pub allowed: BTreeMap<String, Vec<toml::Value>>,
    pub dependencies: BTreeMap<String, Vec<DependencySpec>>,
    pub ignored: Vec<String>,
    pub cloneable: bool,
    pub ownable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencySpec {
    #[serde(default)]
    pub when: Option<toml::Value>,
    pub requires: Vec<String>,
}

impl DependencySpec {
    fn trigger(&self, kind: &str) -> Result<Trigger, Error> {
        match &self.when {
            None => Ok(Trigger::Any),
            Some(toml::Value::String(s)) if s == "*" => Ok(Trigger::Any),
            Some(value) => from_toml(value)
                .map(Trigger::Equals)
                .map_err(|e| Error::parse(format!("dependency trigger of kind '{}'", kind), e.to_string())),
        }
    }
}

impl KindSpec {
    /// Builds and validates the schema this spec declares under `name`.
    pub fn to_schema(&self, name: &str) -> Result<Arc<Schema>, Error> {
        let context = |what: &str| format!("{} of kind '{}'", what, name);

        let mut builder = Schema::builder(name)
            .required(&self.required)
            .optional(&self.optional)
            .ignore(&self.ignored)
            .cloneable(self.cloneable)
            .ownable(self.ownable);

        for (attr, value) in &self.defaults {
            let value = from_toml(value)
                .map_err(|e| Error::parse(context("default value"), e.to_string()))?;
            builder = builder.default_value(attr, value);
        }
        for (a, b) in &self.mutually_exclusive {
            builder = builder.exclusive(a, b);
        }
        for (attr, values) in &self.allowed {
            let values = values
                .iter()
                .map(from_toml)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| Error::parse(context("allowed values"), e.to_string()))?;
            builder = builder.allowed(attr, values);
        }
        for (attr, deps) in &self.dependencies {
            for dep in deps {
                builder = builder.depends(attr, dep.trigger(name)?, &dep.requires);
            }
        }

        Ok(builder.build()?)
    }
}

/// A named set of record kinds.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    kinds: BTreeMap<String, Arc<Schema>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates every kind declared in `text`.
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        let specs: BTreeMap<String, KindSpec> = toml::from_str(text)?;
        let kinds = specs
            .iter()
            .map(|(name, spec)| spec.to_schema(name).map(|schema| (name.clone(), schema)))
            .collect::<Result<_, _>>()?;
        Ok(Self { kinds })
    }

    pub fn read<R: Read>(mut reader: R) -> Result<Self, Error> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_toml(&text)
    }

    pub fn insert(&mut self, schema: Arc<Schema>) {
        self.kinds.insert(schema.name().to_string(), schema);
    }

    /// Adds every kind of `other`, replacing kinds with the same name.
    pub fn extend(&mut self, other: Catalog) {
        self.kinds.extend(other.kinds);
    }

    pub fn kind(&self, name: &str) -> Option<&Arc<Schema>> {
        self.kinds.get(name)
    }

    /// Like [`Catalog::kind`], failing with [`Error::UnknownKind`].
    pub fn require(&self, name: &str) -> Result<&Arc<Schema>, Error> {
        self.kind(name)
            .ok_or_else(|| Error::UnknownKind(name.to_string()))
    }

    /// Kind names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// The built-in catalog extended with the kinds of `custom_toml`, if any.
pub fn load_catalog(custom_toml: Option<&str>) -> Result<Catalog, Error> {
    let mut catalog = default_catalog().clone();
    if let Some(toml) = custom_toml {
        catalog.extend(Catalog::from_toml(toml)?);
    }
    Ok(catalog)
}

pub fn default_catalog() -> &'static Catalog {
    DEFAULT_CATALOG.get_or_init(|| {
        Catalog::from_toml(DEFAULT_KINDS_TOML)
            .expect("Failed to parse embedded default kinds. This is a library bug.")
    })
}
