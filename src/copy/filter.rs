// src/copy/filter.rs

//! `@token@` substitution applied line by line while copying.

use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::errors::{Result, UptodateError};

pub const DEFAULT_TOKEN_START: &str = "@";
pub const DEFAULT_TOKEN_END: &str = "@";

/// A set of token → value replacements sharing one pair of delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    begin_token: String,
    end_token: String,
    filters: BTreeMap<String, String>,
    recurse: bool,
}

impl Default for FilterSet {
    fn default() -> Self {
        Self {
            begin_token: DEFAULT_TOKEN_START.to_string(),
            end_token: DEFAULT_TOKEN_END.to_string(),
            filters: BTreeMap::new(),
            recurse: true,
        }
    }
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiters(begin: &str, end: &str) -> Result<Self> {
        if begin.is_empty() {
            return Err(UptodateError::ConfigError(
                "beginToken must not be empty".to_string(),
            ));
        }
        if end.is_empty() {
            return Err(UptodateError::ConfigError(
                "endToken must not be empty".to_string(),
            ));
        }
        Ok(Self {
            begin_token: begin.to_string(),
            end_token: end.to_string(),
            ..Self::default()
        })
    }

    /// Whether values containing tokens are expanded in turn.
    pub fn set_recurse(&mut self, recurse: bool) {
        self.recurse = recurse;
    }

    pub fn add_filter(&mut self, token: impl Into<String>, value: impl Into<String>) {
        self.filters.insert(token.into(), value.into());
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    /// Replace every `begin token end` occurrence whose token is known.
    pub fn replace_tokens(&self, line: &str) -> String {
        self.replace_in(line, &mut Vec::new())
    }

    fn replace_in(&self, line: &str, passed: &mut Vec<String>) -> String {
        let begin = self.begin_token.as_str();
        let end = self.end_token.as_str();
        let Some(mut index) = line.find(begin) else {
            return line.to_string();
        };

        let mut out = String::with_capacity(line.len());
        let mut i = 0;
        loop {
            let token_start = index + begin.len();
            // can't have zero-length token
            let Some(first) = line[token_start..].chars().next() else {
                break;
            };
            let search_from = token_start + first.len_utf8();
            let Some(end_offset) = line[search_from..].find(end) else {
                break;
            };
            let end_index = search_from + end_offset;
            let token = &line[token_start..end_index];

            out.push_str(&line[i..index]);
            match self.filters.get(token) {
                Some(value) => {
                    let value = if self.recurse && value != token {
                        self.expand(value, token, passed)
                    } else {
                        value.clone()
                    };
                    trace!("Replacing: {begin}{token}{end} -> {value}");
                    out.push_str(&value);
                    i = end_index + end.len();
                }
                None => {
                    out.push_str(begin);
                    i = token_start;
                }
            }

            match line[i..].find(begin) {
                Some(offset) => index = i + offset,
                None => break,
            }
        }
        out.push_str(&line[i..]);
        out
    }

    fn expand(&self, value: &str, token: &str, passed: &mut Vec<String>) -> String {
        if passed.iter().any(|t| t == token) {
            warn!(
                "Infinite loop in tokens. Currently known tokens : {:?} Problem token : {}{}{}",
                passed, self.begin_token, token, self.end_token
            );
            return format!("{}{}{}", self.begin_token, token, self.end_token);
        }
        passed.push(token.to_string());
        let expanded = self.replace_in(value, passed);
        passed.pop();
        expanded
    }
}

/// Filter sets applied one after the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSetCollection {
    sets: Vec<FilterSet>,
}

impl FilterSetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, set: FilterSet) {
        self.sets.push(set);
    }

    pub fn has_filters(&self) -> bool {
        self.sets.iter().any(FilterSet::has_filters)
    }

    pub fn replace_tokens(&self, line: &str) -> String {
        self.sets
            .iter()
            .fold(line.to_string(), |acc, set| set.replace_tokens(&acc))
    }
}

impl From<FilterSet> for FilterSetCollection {
    fn from(set: FilterSet) -> Self {
        Self { sets: vec![set] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> FilterSet {
        let mut fs = FilterSet::new();
        for (k, v) in pairs {
            fs.add_filter(*k, *v);
        }
        fs
    }

    #[test]
    fn known_tokens_are_replaced_unknown_kept() {
        let fs = set(&[("VERSION", "1.2"), ("NAME", "demo")]);
        assert_eq!(
            fs.replace_tokens("@NAME@ v@VERSION@ @OTHER@ mail@example.com\n"),
            "demo v1.2 @OTHER@ mail@example.com\n"
        );
    }

    #[test]
    fn empty_token_is_never_matched() {
        let fs = set(&[("", "x"), ("A", "a")]);
        assert_eq!(fs.replace_tokens("@@A@"), "@a");
    }

    #[test]
    fn values_are_expanded_recursively() {
        let fs = set(&[("A", "<@B@>"), ("B", "b")]);
        assert_eq!(fs.replace_tokens("@A@"), "<b>");

        let mut flat = fs.clone();
        flat.set_recurse(false);
        assert_eq!(flat.replace_tokens("@A@"), "<@B@>");
    }

    #[test]
    fn cycles_stop_at_the_repeated_token() {
        let fs = set(&[("A", "@B@"), ("B", "@A@")]);
        assert_eq!(fs.replace_tokens("x @A@ y"), "x @A@ y");
    }

    #[test]
    fn custom_delimiters() {
        let mut fs = FilterSet::with_delimiters("${", "}").unwrap();
        fs.add_filter("home", "/root");
        assert_eq!(fs.replace_tokens("cd ${home}/bin"), "cd /root/bin");
        assert!(FilterSet::with_delimiters("", "}").is_err());
    }

    #[test]
    fn collection_applies_sets_in_order() {
        let mut c = FilterSetCollection::new();
        assert!(!c.has_filters());
        c.add(set(&[("A", "@B@")]));
        let mut second = set(&[("B", "done")]);
        second.set_recurse(false);
        c.add(second);
        assert!(c.has_filters());
        assert_eq!(c.replace_tokens("@A@"), "done");
    }

    #[test]
    fn multibyte_text_is_safe() {
        let fs = set(&[("é", "e")]);
        assert_eq!(fs.replace_tokens("@é@ – @"), "e – @");
    }
}
