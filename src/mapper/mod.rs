// src/mapper/mod.rs

//! Source-name → target-name mapping.
//!
//! A mapper answers "which target names does this source produce?". The
//! answer distinguishes *unmapped* (`Ok(None)`) from a list of names. A
//! mapper may also fail for a particular name; callers treat that like an
//! unmapped source.

use std::fmt::Debug;

use serde::Deserialize;
use thiserror::Error;

pub mod composite;
pub mod glob;
pub mod regexp;
pub mod simple;

pub use composite::{ChainedMapper, CompositeMapper};
pub use glob::GlobMapper;
pub use regexp::RegexMapper;
pub use simple::{FlattenMapper, IdentityMapper, MergeMapper};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("pattern '{0}' contains more than one '*'")]
    MultipleWildcards(String),

    #[error("'{to}' refers to group {group} but '{from}' has only {available} group(s)")]
    MissingGroup {
        from: String,
        to: String,
        group: usize,
        available: usize,
    },
}

/// Maps one source name to zero or more target names.
pub trait NameMapper: Send + Sync + Debug {
    /// `Ok(None)` means "this mapper does not handle `name`".
    fn map_file_name(&self, name: &str) -> Result<Option<Vec<String>>, MappingError>;
}

impl<M: NameMapper + ?Sized> NameMapper for Box<M> {
    fn map_file_name(&self, name: &str) -> Result<Option<Vec<String>>, MappingError> {
        (**self).map_file_name(name)
    }
}

/// Rewrite forward slashes into the platform separator.
pub fn to_native_separators(name: &str) -> String {
    if std::path::MAIN_SEPARATOR == '/' {
        name.to_string()
    } else {
        name.replace('/', std::path::MAIN_SEPARATOR_STR)
    }
}

/// Rewrite platform separators into forward slashes.
pub fn to_forward_slashes(name: &str) -> String {
    if std::path::MAIN_SEPARATOR == '/' {
        name.to_string()
    } else {
        name.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

fn default_true() -> bool {
    true
}

/// Mapper description as written in the config file.
///
/// ```toml
/// mapper = { type = "glob", from = "*.txt", to = "*.bak" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MapperConfig {
    #[default]
    Identity,
    Flatten,
    Merge {
        to: String,
    },
    Glob {
        from: String,
        to: String,
        #[serde(default = "default_true")]
        case_sensitive: bool,
        #[serde(default)]
        handle_dirsep: bool,
    },
    Regex {
        from: String,
        to: String,
        #[serde(default = "default_true")]
        case_sensitive: bool,
        #[serde(default)]
        handle_dirsep: bool,
    },
    Composite {
        mappers: Vec<MapperConfig>,
    },
    Chained {
        mappers: Vec<MapperConfig>,
    },
}

impl MapperConfig {
    /// Validate and compile into a mapper.
    pub fn build(&self) -> Result<Box<dyn NameMapper>, MappingError> {
        Ok(match self {
            MapperConfig::Identity => Box::new(IdentityMapper),
            MapperConfig::Flatten => Box::new(FlattenMapper),
            MapperConfig::Merge { to } => Box::new(MergeMapper::new(to.clone())),
            MapperConfig::Glob {
                from,
                to,
                case_sensitive,
                handle_dirsep,
            } => {
                for pattern in [from, to] {
                    if pattern.matches('*').count() > 1 {
                        return Err(MappingError::MultipleWildcards(pattern.clone()));
                    }
                }
                let mut mapper = GlobMapper::new(from, to);
                mapper.set_case_sensitive(*case_sensitive);
                mapper.set_handle_dir_sep(*handle_dirsep);
                Box::new(mapper)
            }
            MapperConfig::Regex {
                from,
                to,
                case_sensitive,
                handle_dirsep,
            } => Box::new(RegexMapper::new(from, to, *case_sensitive, *handle_dirsep)?),
            MapperConfig::Composite { mappers } => {
                let children = mappers.iter().map(|m| m.build()).collect::<Result<_, _>>()?;
                Box::new(CompositeMapper::new(children))
            }
            MapperConfig::Chained { mappers } => {
                let stages = mappers.iter().map(|m| m.build()).collect::<Result<_, _>>()?;
                Box::new(ChainedMapper::new(stages))
            }
        })
    }

    /// Whether every name maps onto itself.
    pub fn is_identity(&self) -> bool {
        matches!(self, MapperConfig::Identity)
    }
}
