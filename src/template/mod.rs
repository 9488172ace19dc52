//! Template system for glue-code synthesis
//!
//! Templates are literal code with `$KEY` placeholders and a single level of
//! `@IF(key) … @ELSE … @END` conditionals. Source text is parsed once into a
//! segment tree and expanded against a [`SubstitutionTable`].
//!
//! # Example
//!
//! ```rust
//! use bridgegen::template::{SubstitutionTable, Template};
//!
//! let tpl = Template::parse("demo", "call $NAME(); @IF(VOID)none@ELSE value@END").unwrap();
//! let table = SubstitutionTable::new().with("NAME", "foo").with("VOID", "Y");
//! assert_eq!(tpl.expand(&table).unwrap(), "call foo(); none");
//! ```

mod grammar;
pub mod lexer;
mod library;

pub use library::{TemplateKind, TemplateLibrary};

use thiserror::Error;

/// Errors raised while parsing or expanding templates
///
/// These indicate a defect in the template library or its caller, never a
/// problem in the user's declarations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// Malformed directive structure
    #[error("template '{template}' at offset {offset}: {message}")]
    Syntax {
        template: String,
        offset: usize,
        message: String,
    },

    /// A `$KEY` with no table entry
    #[error("template '{template}': no substitution for placeholder ${key}")]
    UnresolvedPlaceholder { template: String, key: String },

    /// An `@IF(key)` with no table entry
    #[error("template '{template}': no substitution for condition '{key}'")]
    UnresolvedCondition { template: String, key: String },
}

/// Non-conditional piece of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Literal(String),
    /// Identifier run that followed `$`; resolved by longest key prefix
    Placeholder(String),
}

/// Top-level piece of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(Fragment),
    Conditional {
        key: String,
        then_branch: Vec<Fragment>,
        else_branch: Vec<Fragment>,
    },
}

/// Ordered key/value pairs used for expansion
#[derive(Debug, Clone, Default)]
pub struct SubstitutionTable {
    entries: Vec<(String, String)>,
}

impl SubstitutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing an earlier value for the same key
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add a placeholder that expands to itself, left for the linker
    pub fn with_deferred(self, key: &str) -> Self {
        let value = format!("${}", key);
        self.with(key, value)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Longest key that is a prefix of `run`, with its value
    fn longest_prefix(&self, run: &str) -> Option<(&str, &str)> {
        self.entries
            .iter()
            .filter(|(k, _)| run.starts_with(k.as_str()))
            .max_by_key(|(k, _)| k.len())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A parsed template
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template source
    pub fn parse(name: &str, source: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            name: name.to_string(),
            segments: grammar::parse(name, source)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expand against a substitution table
    pub fn expand(&self, table: &SubstitutionTable) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Plain(fragment) => self.expand_fragment(fragment, table, &mut out)?,
                Segment::Conditional {
                    key,
                    then_branch,
                    else_branch,
                } => {
                    let value = table
                        .get(key)
                        .ok_or_else(|| TemplateError::UnresolvedCondition {
                            template: self.name.clone(),
                            key: key.clone(),
                        })?;
                    let branch = if value.is_empty() {
                        else_branch
                    } else {
                        then_branch
                    };
                    for fragment in branch {
                        self.expand_fragment(fragment, table, &mut out)?;
                    }
                }
            }
        }
        Ok(out)
    }

    fn expand_fragment(
        &self,
        fragment: &Fragment,
        table: &SubstitutionTable,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        match fragment {
            Fragment::Literal(text) => out.push_str(text),
            Fragment::Placeholder(run) => {
                let (key, value) =
                    table
                        .longest_prefix(run)
                        .ok_or_else(|| TemplateError::UnresolvedPlaceholder {
                            template: self.name.clone(),
                            key: run.clone(),
                        })?;
                out.push_str(value);
                out.push_str(&run[key.len()..]);
            }
        }
        Ok(())
    }
}

/// Parse and expand in one step
pub fn expand_str(name: &str, source: &str, table: &SubstitutionTable) -> Result<String, TemplateError> {
    Template::parse(name, source)?.expand(table)
}
