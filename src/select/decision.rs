// src/select/decision.rs

use std::fmt;

use crate::mapper::MappingError;

/// What the selector concluded about one source (or about the whole input).
///
/// The `Display` form is the diagnostic line logged for the decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    NoSources,
    MappingFailed {
        source: String,
        error: MappingError,
    },
    Skipped {
        source: String,
    },
    Added {
        source: String,
        target: String,
        target_exists: bool,
    },
    UpToDate {
        source: String,
        targets: Vec<String>,
    },
}

impl Decision {
    /// Name of the source this decision is about, if any.
    pub fn source(&self) -> Option<&str> {
        match self {
            Decision::NoSources => None,
            Decision::MappingFailed { source, .. }
            | Decision::Skipped { source }
            | Decision::Added { source, .. }
            | Decision::UpToDate { source, .. } => Some(source),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::NoSources => write!(f, "No sources found."),
            Decision::MappingFailed { source, error } => {
                write!(f, "Caught {error} mapping resource {source}")
            }
            Decision::Skipped { source } => {
                write!(f, "{source} skipped - don't know how to handle it")
            }
            Decision::Added {
                source,
                target,
                target_exists,
            } => {
                let why = if *target_exists {
                    "is outdated."
                } else {
                    "doesn't exist."
                };
                write!(f, "{source} added as {target} {why}")
            }
            Decision::UpToDate { source, targets } => {
                let verb = if targets.len() == 1 { "is" } else { "are" };
                write!(f, "{source} omitted as {} {verb} up to date.", targets.join(", "))
            }
        }
    }
}
