//! Constraint schemas for record kinds.
//!
//! A [`Schema`] is declared once per record kind, usually through
//! [`Schema::builder`] or a TOML [`Catalog`](crate::io::catalog::Catalog), and
//! shared behind an [`Arc`] by every record of that kind. It carries no
//! behavior beyond checking an attribute map against its rules.

use super::error::{Error, Violation};
use super::value::{AttrMap, Value};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Condition under which a dependency fires.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Fires whenever the attribute is present, whatever its value.
    Any,
    /// Fires when the attribute equals this value.
    Equals(Value),
}

impl Trigger {
    pub fn fires(&self, value: &Value) -> bool {
        match self {
            Trigger::Any => true,
            Trigger::Equals(expected) => expected == value,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Any => write!(f, "*"),
            Trigger::Equals(v) => write!(f, "{}", v),
        }
    }
}

/// Attributes that must be present once an attribute matches a trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub trigger: Trigger,
    pub requires: Vec<String>,
}

/// Declarative rule set for one record kind.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    required: Vec<String>,
    optional: Vec<String>,
    defaults: AttrMap,
    exclusive: Vec<(String, String)>,
    allowed: IndexMap<String, Vec<Value>>,
    dependencies: IndexMap<String, Vec<Dependency>>,
    ignored: BTreeSet<String>,
    cloneable: bool,
    ownable: bool,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    #[inline]
    pub fn optional(&self) -> &[String] {
        &self.optional
    }

    #[inline]
    pub fn defaults(&self) -> &AttrMap {
        &self.defaults
    }

    #[inline]
    pub fn exclusive_pairs(&self) -> &[(String, String)] {
        &self.exclusive
    }

    pub fn allowed_values(&self, attribute: &str) -> Option<&[Value]> {
        self.allowed.get(attribute).map(Vec::as_slice)
    }

    pub fn dependencies(&self, attribute: &str) -> &[Dependency] {
        self.dependencies
            .get(attribute)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    #[inline]
    pub fn cloneable(&self) -> bool {
        self.cloneable
    }

    #[inline]
    pub fn ownable(&self) -> bool {
        self.ownable
    }

    /// An open schema declares no attributes and accepts any attribute verbatim.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.required.is_empty() && self.optional.is_empty()
    }

    pub fn declares(&self, attribute: &str) -> bool {
        self.required.iter().any(|n| n == attribute) || self.optional.iter().any(|n| n == attribute)
    }

    /// Whether `attribute` may be held by records of this kind.
    pub fn accepts(&self, attribute: &str) -> bool {
        self.is_open() || self.declares(attribute)
    }

    pub fn is_ignored(&self, attribute: &str) -> bool {
        self.ignored.contains(attribute)
    }

    /// Required then optional attribute names, in declaration order.
    pub fn declared(&self) -> impl Iterator<Item = &str> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .map(String::as_str)
    }

    fn position(&self, attribute: &str) -> usize {
        self.declared()
            .position(|n| n == attribute)
            .unwrap_or(usize::MAX)
    }

    fn exclusive_partner_present(&self, attribute: &str, attrs: &AttrMap) -> bool {
        self.exclusive.iter().any(|(a, b)| {
            (a == attribute && attrs.contains_key(b)) || (b == attribute && attrs.contains_key(a))
        })
    }

    /// Applies defaults and orders attributes by declaration.
    ///
    /// A default is skipped when its attribute's exclusive partner is present.
    pub(crate) fn normalize(&self, mut attrs: AttrMap) -> AttrMap {
        for (name, value) in &self.defaults {
            if !attrs.contains_key(name) && !self.exclusive_partner_present(name, &attrs) {
                attrs.insert(name.clone(), value.clone());
            }
        }
        attrs.sort_by(|a, _, b, _| self.position(a).cmp(&self.position(b)));
        attrs
    }

    /// Checks an attribute map against every rule of this schema.
    ///
    /// Rules are checked in a fixed order: undeclared attributes, required
    /// attributes, mutual exclusion, value domains, dependencies.
    pub fn validate(&self, attrs: &AttrMap) -> Result<(), Violation> {
        if !self.is_open() {
            if let Some(name) = attrs.keys().find(|n| !self.declares(n)) {
                return Err(Violation::Undeclared(name.clone()));
            }
        }

        if let Some(name) = self.required.iter().find(|n| !attrs.contains_key(*n)) {
            return Err(Violation::MissingRequired(name.clone()));
        }

        for (a, b) in &self.exclusive {
            if attrs.contains_key(a) && attrs.contains_key(b) {
                return Err(Violation::MutuallyExclusive(a.clone(), b.clone()));
            }
        }

        for (name, allowed) in &self.allowed {
            if let Some(value) = attrs.get(name) {
                if !allowed.contains(value) {
                    return Err(Violation::DisallowedValue {
                        attribute: name.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }

        for (name, deps) in &self.dependencies {
            let Some(value) = attrs.get(name) else {
                continue;
            };
            for dep in deps.iter().filter(|d| d.trigger.fires(value)) {
                if let Some(missing) = dep.requires.iter().find(|d| !attrs.contains_key(*d)) {
                    return Err(Violation::UnmetDependency {
                        attribute: name.clone(),
                        value: value.to_string(),
                        dependent: missing.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Attribute names compared by equality and ordering between two records
    /// of this kind: required attributes plus optional attributes present on
    /// either side, minus ignored ones. Open schemas compare every present
    /// attribute.
    pub(crate) fn comparison_attrs<'a>(&'a self, a: &'a AttrMap, b: &'a AttrMap) -> Vec<&'a str> {
        if self.is_open() {
            let mut names: Vec<&str> = a
                .keys()
                .chain(b.keys())
                .map(String::as_str)
                .filter(|n| !self.is_ignored(n))
                .collect();
            names.sort_unstable();
            names.dedup();
            return names;
        }
        self.required
            .iter()
            .map(String::as_str)
            .chain(
                self.optional
                    .iter()
                    .map(String::as_str)
                    .filter(|n| a.contains_key(*n) || b.contains_key(*n)),
            )
            .filter(|n| !self.is_ignored(n))
            .collect()
    }
}

/// Incremental builder for a [`Schema`].
///
/// # Examples
///
/// ```
/// use rec_forge::{Schema, Trigger, Value};
///
/// let residue = Schema::builder("residue")
///     .required(["resname", "resseqnum", "chainID"])
///     .optional(["insertion", "protonation"])
///     .default_value("insertion", "")
///     .depends("resname", Trigger::Equals(Value::from("HIS")), ["protonation"])
///     .cloneable(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(residue.required().len(), 3);
/// assert!(residue.declares("protonation"));
/// ```
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: Schema {
                name: name.into(),
                required: Vec::new(),
                optional: Vec::new(),
                defaults: AttrMap::new(),
                exclusive: Vec::new(),
                allowed: IndexMap::new(),
                dependencies: IndexMap::new(),
                ignored: BTreeSet::new(),
                cloneable: false,
                ownable: false,
            },
        }
    }

    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema.required.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn optional<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema.optional.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.schema.defaults.insert(name.into(), value.into());
        self
    }

    pub fn exclusive(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.schema.exclusive.push((a.into(), b.into()));
        self
    }

    pub fn allowed<I, V>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.schema
            .allowed
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn depends<I, S>(mut self, attribute: impl Into<String>, trigger: Trigger, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema
            .dependencies
            .entry(attribute.into())
            .or_default()
            .push(Dependency {
                trigger,
                requires: requires.into_iter().map(Into::into).collect(),
            });
        self
    }

    pub fn ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema.ignored.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn cloneable(mut self, cloneable: bool) -> Self {
        self.schema.cloneable = cloneable;
        self
    }

    pub fn ownable(mut self, ownable: bool) -> Self {
        self.schema.ownable = ownable;
        self
    }

    /// Checks the declaration for internal consistency and freezes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] when an attribute is both required and
    /// optional, a mutually-exclusive attribute is required, a default targets
    /// a non-optional attribute or lies outside its allowed set, or (for
    /// closed schemas) a rule names an undeclared attribute.
    pub fn build(self) -> Result<Arc<Schema>, Error> {
        let s = self.schema;
        let invalid = |detail: String| Error::invalid_schema(&s.name, detail);

        if let Some(dup) = s.required.iter().find(|n| s.optional.contains(*n)) {
            return Err(invalid(format!("'{}' is both required and optional", dup)));
        }

        for (a, b) in &s.exclusive {
            if let Some(req) = [a, b].into_iter().find(|n| s.required.contains(*n)) {
                return Err(invalid(format!(
                    "'{}' is required and cannot be mutually exclusive",
                    req
                )));
            }
        }

        if !s.is_open() {
            let mentioned = s
                .exclusive
                .iter()
                .flat_map(|(a, b)| [a, b])
                .chain(s.allowed.keys())
                .chain(s.dependencies.keys())
                .chain(s.dependencies.values().flatten().flat_map(|d| d.requires.iter()))
                .chain(s.ignored.iter())
                .chain(s.defaults.keys());
            for name in mentioned {
                if !s.declares(name) {
                    return Err(invalid(format!("rule names undeclared attribute '{}'", name)));
                }
            }
        }

        for (name, value) in &s.defaults {
            if s.required.contains(name) {
                return Err(invalid(format!("required attribute '{}' has a default", name)));
            }
            if let Some(allowed) = s.allowed.get(name) {
                if !allowed.contains(value) {
                    return Err(invalid(format!(
                        "default '{}' for '{}' is not an allowed value",
                        value, name
                    )));
                }
            }
        }

        Ok(Arc::new(s))
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::attr_map;

    fn residue() -> Arc<Schema> {
        Schema::builder("residue")
            .required(["resname", "resseqnum"])
            .optional(["chainID", "insertion", "atoms", "protonation", "segname", "segtype"])
            .default_value("insertion", "")
            .exclusive("segname", "segtype")
            .allowed("chainID", ["A", "B"])
            .depends("resname", Trigger::Equals(Value::from("HIS")), ["protonation"])
            .ignore(["atoms"])
            .build()
            .unwrap()
    }

    #[test]
    fn accepts_a_well_formed_map() {
        let s = residue();
        let attrs = s.normalize(attr_map([
            ("resseqnum", Value::Int(1)),
            ("resname", Value::from("ALA")),
        ]));
        assert!(s.validate(&attrs).is_ok());
        let keys: Vec<&str> = attrs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["resname", "resseqnum", "insertion"]);
    }

    #[test]
    fn reports_each_rule_by_name() {
        let s = residue();
        let missing = attr_map([("resname", "ALA")]);
        assert_eq!(
            s.validate(&missing),
            Err(Violation::MissingRequired("resseqnum".into()))
        );

        let both = attr_map([
            ("resname", Value::from("ALA")),
            ("resseqnum", Value::Int(1)),
            ("segname", Value::from("PROA")),
            ("segtype", Value::from("protein")),
        ]);
        assert!(matches!(s.validate(&both), Err(Violation::MutuallyExclusive(..))));

        let bad_chain = attr_map([
            ("resname", Value::from("ALA")),
            ("resseqnum", Value::Int(1)),
            ("chainID", Value::from("Z")),
        ]);
        assert!(matches!(
            s.validate(&bad_chain),
            Err(Violation::DisallowedValue { .. })
        ));

        let his = attr_map([("resname", Value::from("HIS")), ("resseqnum", Value::Int(1))]);
        assert!(matches!(
            s.validate(&his),
            Err(Violation::UnmetDependency { ref dependent, .. }) if dependent == "protonation"
        ));

        let extra = attr_map([
            ("resname", Value::from("ALA")),
            ("resseqnum", Value::Int(1)),
            ("color", Value::from("red")),
        ]);
        assert_eq!(s.validate(&extra), Err(Violation::Undeclared("color".into())));
    }

    #[test]
    fn wildcard_dependency_fires_on_any_value() {
        let s = Schema::builder("mutation")
            .required(["chainID"])
            .optional(["newresname", "resseqnum"])
            .depends("newresname", Trigger::Any, ["resseqnum"])
            .build()
            .unwrap();
        let attrs = attr_map([("chainID", "A"), ("newresname", "GLY")]);
        assert!(matches!(
            s.validate(&attrs),
            Err(Violation::UnmetDependency { .. })
        ));
    }

    #[test]
    fn default_is_skipped_when_exclusive_partner_present() {
        let s = Schema::builder("seg")
            .required(["name"])
            .optional(["chain", "auto"])
            .exclusive("chain", "auto")
            .default_value("auto", true)
            .build()
            .unwrap();
        let attrs = s.normalize(attr_map([
            ("name", Value::from("A")),
            ("chain", Value::from("B")),
        ]));
        assert!(!attrs.contains_key("auto"));
        assert!(s.validate(&attrs).is_ok());
    }

    #[test]
    fn open_schema_accepts_anything() {
        let s = Schema::builder("bag").build().unwrap();
        assert!(s.is_open());
        let attrs = attr_map([("whatever", 1), ("else", 2)]);
        assert!(s.validate(&attrs).is_ok());
    }

    #[test]
    fn rejects_inconsistent_declarations() {
        let required_exclusive = Schema::builder("x")
            .required(["a"])
            .optional(["b"])
            .exclusive("a", "b")
            .build();
        assert!(matches!(required_exclusive, Err(Error::InvalidSchema { .. })));

        let undeclared_rule = Schema::builder("x")
            .required(["a"])
            .allowed("c", [1])
            .build();
        assert!(matches!(undeclared_rule, Err(Error::InvalidSchema { .. })));

        let bad_default = Schema::builder("x")
            .required(["a"])
            .optional(["b"])
            .allowed("b", [1, 2])
            .default_value("b", 3)
            .build();
        assert!(matches!(bad_default, Err(Error::InvalidSchema { .. })));
    }

    #[test]
    fn comparison_attrs_skip_ignored_and_absent_optionals() {
        let s = residue();
        let a = attr_map([
            ("resname", Value::from("ALA")),
            ("resseqnum", Value::Int(1)),
            ("chainID", Value::from("A")),
            ("atoms", Value::Int(0)),
        ]);
        let b = attr_map([("resname", Value::from("ALA")), ("resseqnum", Value::Int(1))]);
        assert_eq!(s.comparison_attrs(&a, &b), vec!["resname", "resseqnum", "chainID"]);
    }
}
