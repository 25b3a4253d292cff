use std::io::{self, Write};

use anyhow::Error;
use rec_forge::{IoError, OpsError, RecordError, Violation};

use super::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    for cause in err.chain().skip(1) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
    }

    let hints = hints(err);
    if !hints.is_empty() {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

/// Hints for the first library error found in the chain.
fn hints(err: &Error) -> Vec<String> {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<IoError>() {
            return io_hints(e);
        }
        if let Some(e) = cause.downcast_ref::<OpsError>() {
            return ops_hints(e);
        }
        if let Some(e) = cause.downcast_ref::<RecordError>() {
            return record_hints(e);
        }
    }
    Vec::new()
}

fn io_hints(err: &IoError) -> Vec<String> {
    match err {
        IoError::Io { source } => match source.kind() {
            io::ErrorKind::NotFound => vec![
                "File or directory not found".into(),
                "Check the path spelling and ensure the file exists".into(),
            ],
            io::ErrorKind::PermissionDenied => vec!["Check file permissions with `ls -la`".into()],
            _ => vec!["Check file path, permissions, and disk space".into()],
        },
        IoError::Toml(_) => vec![
            "The file is not valid TOML".into(),
            "Check for missing quotes, brackets, or duplicate keys".into(),
        ],
        IoError::Serialize(_) => vec!["Some attribute values cannot be written as TOML".into()],
        IoError::Parse { .. } => vec![
            "Records are read from arrays of tables, one per kind: [[residue]]".into(),
        ],
        IoError::UnknownKind(name) => vec![
            format!("No kind named '{}' is declared", name),
            "Declare it in a catalog and pass it with --kinds".into(),
        ],
        IoError::Conversion(_) => vec![
            "Cross-list links exist only in memory and cannot be written".into(),
            "Write the linked list separately, or drop the link attribute first".into(),
        ],
        IoError::Record(e) => record_hints(e),
    }
}

fn record_hints(err: &RecordError) -> Vec<String> {
    match err {
        RecordError::SchemaViolation { violation, .. } => match violation {
            Violation::MissingRequired(attr) => vec![format!("Every record needs '{}'", attr)],
            Violation::MutuallyExclusive(a, b) => {
                vec![format!("Keep only one of '{}' and '{}'", a, b)]
            }
            Violation::DisallowedValue { attribute, .. } => {
                vec![format!("See the allowed values of '{}' in the catalog", attribute)]
            }
            Violation::UnmetDependency { dependent, .. } => {
                vec![format!("Add '{}' to the affected records", dependent)]
            }
            Violation::Undeclared(attr) => vec![
                format!("'{}' is not declared by the kind", attr),
                "Add it to the kind's optional attributes, or remove it".into(),
            ],
        },
        RecordError::InvalidSchema { .. } => {
            vec!["Fix the kind declaration in the catalog".into()]
        }
        RecordError::Adapter(_) => vec![
            "Nested tables cannot be read; flatten the attribute".into(),
        ],
        _ => Vec::new(),
    }
}

fn ops_hints(err: &OpsError) -> Vec<String> {
    match err {
        OpsError::UniquificationExhausted { .. } => vec![
            "The first identity field must be numeric (e.g. a sequence number)".into(),
            "Too many cascading collisions; check for large blocks of repeated keys".into(),
        ],
        OpsError::NoIdentityFields | OpsError::OverlappingFields(_) => {
            vec!["Pass identity attributes with -f and distinct attributes with -c".into()]
        }
        OpsError::Record(e) => record_hints(e),
        OpsError::MalformedInterval(_) => Vec::new(),
    }
}
