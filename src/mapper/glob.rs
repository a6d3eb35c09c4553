// src/mapper/glob.rs

use super::{MappingError, NameMapper};

/// A pattern split around its (last) `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Split {
    prefix: String,
    suffix: String,
    wildcard: bool,
}

impl Split {
    fn new(pattern: &str) -> Self {
        match pattern.rfind('*') {
            Some(index) => Self {
                prefix: pattern[..index].to_string(),
                suffix: pattern[index + 1..].to_string(),
                wildcard: true,
            },
            None => Self {
                prefix: pattern.to_string(),
                suffix: String::new(),
                wildcard: false,
            },
        }
    }
}

/// Maps names with a single-wildcard `from` pattern onto a `to` pattern.
///
/// `from = "*.java"`, `to = "*.class"` maps `a/B.java` to `a/B.class`. The
/// text matched by the wildcard (the *variable part*) is taken from the
/// original name, before any case or separator folding.
#[derive(Debug, Clone)]
pub struct GlobMapper {
    from: Option<Split>,
    to: Option<Split>,
    case_sensitive: bool,
    handle_dir_sep: bool,
}

impl Default for GlobMapper {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            case_sensitive: true,
            handle_dir_sep: false,
        }
    }
}

impl GlobMapper {
    pub fn new(from: &str, to: &str) -> Self {
        let mut mapper = Self::default();
        mapper.set_from(from);
        mapper.set_to(to);
        mapper
    }

    pub fn set_from(&mut self, pattern: &str) {
        self.from = Some(Split::new(pattern));
    }

    pub fn set_to(&mut self, pattern: &str) {
        self.to = Some(Split::new(pattern));
    }

    pub fn set_case_sensitive(&mut self, flag: bool) {
        self.case_sensitive = flag;
    }

    /// Treat `\` and `/` as the same character when matching.
    pub fn set_handle_dir_sep(&mut self, flag: bool) {
        self.handle_dir_sep = flag;
    }

    fn normalize(&self, s: &str) -> String {
        let mut s = if self.case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        };
        if self.handle_dir_sep {
            s = s.replace('\\', "/");
        }
        s
    }

    fn variable_part<'a>(&self, from: &Split, name: &'a str) -> Option<&'a str> {
        let end = name.len() - from.suffix.len();
        name.get(from.prefix.len()..end)
    }
}

impl NameMapper for GlobMapper {
    fn map_file_name(&self, name: &str) -> Result<Option<Vec<String>>, MappingError> {
        let (Some(from), Some(to)) = (&self.from, &self.to) else {
            return Ok(None);
        };

        if name.len() < from.prefix.len() + from.suffix.len() {
            return Ok(None);
        }

        let normalized = self.normalize(name);
        let matched = if from.wildcard {
            normalized.starts_with(&self.normalize(&from.prefix))
                && normalized.ends_with(&self.normalize(&from.suffix))
        } else {
            normalized == self.normalize(&from.prefix)
        };
        if !matched {
            return Ok(None);
        }

        let mapped = if to.wildcard {
            let Some(variable) = self.variable_part(from, name) else {
                return Ok(None);
            };
            format!("{}{}{}", to.prefix, variable, to.suffix)
        } else {
            to.prefix.clone()
        };
        Ok(Some(vec![mapped]))
    }
}
