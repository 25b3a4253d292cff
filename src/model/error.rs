//! Error types for record construction and attribute access.
//!
//! Schema failures carry a [`Violation`] naming the exact rule that was
//! broken. Ambiguous lookups are not errors; see
//! [`Lookup`](crate::Lookup).

use thiserror::Error;

/// The schema rule a set of attributes failed to satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// A required attribute is absent.
    #[error("missing required attribute '{0}'")]
    MissingRequired(String),

    /// Both halves of a mutually-exclusive pair are present.
    #[error("attributes '{0}' and '{1}' are mutually exclusive")]
    MutuallyExclusive(String, String),

    /// An attribute holds a value outside its allowed set.
    #[error("value '{value}' is not allowed for attribute '{attribute}'")]
    DisallowedValue {
        /// Restricted attribute.
        attribute: String,
        /// Textual form of the offending value.
        value: String,
    },

    /// An attribute's value triggers a dependency that is not present.
    #[error("attribute '{attribute}' = '{value}' requires attribute '{dependent}'")]
    UnmetDependency {
        /// Triggering attribute.
        attribute: String,
        /// Textual form of the triggering value.
        value: String,
        /// Missing dependent attribute.
        dependent: String,
    },

    /// The attribute is not declared by the schema.
    #[error("attribute '{0}' is not declared by the schema")]
    Undeclared(String),
}

/// Errors raised by records, record lists and schemas.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Construction or bulk assignment broke a schema rule.
    #[error("schema violation for kind '{kind}': {violation}")]
    SchemaViolation {
        /// Record kind.
        kind: String,
        /// The broken rule.
        violation: Violation,
    },

    /// A schema declaration is internally inconsistent.
    #[error("invalid schema '{kind}': {detail}")]
    InvalidSchema {
        /// Record kind.
        kind: String,
        /// Description of the problem.
        detail: String,
    },

    /// A named attribute does not exist on the record.
    #[error("record of kind '{kind}' has no attribute '{attribute}'")]
    AttributeNotFound {
        /// Record kind.
        kind: String,
        /// Missing attribute.
        attribute: String,
    },

    /// A record was offered to a list of another kind.
    #[error("expected a record of kind '{expected}', found '{found}'")]
    KindMismatch {
        /// Kind declared by the list.
        expected: String,
        /// Kind of the offered record.
        found: String,
    },

    /// Lineage cloning was requested on a kind that does not allow it.
    #[error("records of kind '{0}' cannot be cloned")]
    NotCloneable(String),

    /// An ownership handle was requested from a record without an id.
    #[error("record of kind '{0}' has not been registered with a build context")]
    Unregistered(String),

    /// A construction adapter could not produce an attribute map.
    #[error("construction adapter failed: {0}")]
    Adapter(String),
}

impl Error {
    pub fn schema_violation(kind: &str, violation: Violation) -> Self {
        Self::SchemaViolation {
            kind: kind.to_string(),
            violation,
        }
    }

    pub fn invalid_schema(kind: &str, detail: impl Into<String>) -> Self {
        Self::InvalidSchema {
            kind: kind.to_string(),
            detail: detail.into(),
        }
    }

    pub fn attribute_not_found(kind: &str, attribute: &str) -> Self {
        Self::AttributeNotFound {
            kind: kind.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn kind_mismatch(expected: &str, found: &str) -> Self {
        Self::KindMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_violation_message_names_kind_and_rule() {
        let err = Error::schema_violation("residue", Violation::MissingRequired("resname".into()));
        assert_eq!(
            err.to_string(),
            "schema violation for kind 'residue': missing required attribute 'resname'"
        );
    }

    #[test]
    fn dependency_violation_message_names_all_parts() {
        let v = Violation::UnmetDependency {
            attribute: "resname".into(),
            value: "HIS".into(),
            dependent: "protonation".into(),
        };
        assert_eq!(
            v.to_string(),
            "attribute 'resname' = 'HIS' requires attribute 'protonation'"
        );
    }
}
