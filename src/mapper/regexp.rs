// src/mapper/regexp.rs

use regex::{Captures, Regex, RegexBuilder};

use super::{MappingError, NameMapper};

/// Maps names matching a regular expression, substituting `\0`..`\9` in
/// the `to` pattern with the corresponding capture groups.
#[derive(Debug, Clone)]
pub struct RegexMapper {
    from: Regex,
    to: String,
    handle_dir_sep: bool,
}

impl RegexMapper {
    pub fn new(
        from: &str,
        to: &str,
        case_sensitive: bool,
        handle_dir_sep: bool,
    ) -> Result<Self, MappingError> {
        let regex = RegexBuilder::new(from)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| MappingError::InvalidRegex {
                pattern: from.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            from: regex,
            to: to.to_string(),
            handle_dir_sep,
        })
    }

    /// `\N` inserts group N, `\x` inserts `x`, a trailing `\` stays as is.
    fn replace_references(&self, caps: &Captures<'_>) -> Result<String, MappingError> {
        let mut out = String::with_capacity(self.to.len());
        let mut chars = self.to.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some(next) => match next.to_digit(10) {
                    Some(group) => {
                        let group = group as usize;
                        if group >= caps.len() {
                            return Err(MappingError::MissingGroup {
                                from: self.from.as_str().to_string(),
                                to: self.to.clone(),
                                group,
                                available: caps.len() - 1,
                            });
                        }
                        out.push_str(caps.get(group).map_or("", |m| m.as_str()));
                    }
                    None => out.push(next),
                },
                None => out.push('\\'),
            }
        }
        Ok(out)
    }
}

impl NameMapper for RegexMapper {
    fn map_file_name(&self, name: &str) -> Result<Option<Vec<String>>, MappingError> {
        let subject = if self.handle_dir_sep {
            name.replace('\\', "/")
        } else {
            name.to_string()
        };
        match self.from.captures(&subject) {
            Some(caps) => Ok(Some(vec![self.replace_references(&caps)?])),
            None => Ok(None),
        }
    }
}
