//! Deferred registration records
//!
//! Registration of template classes can only be completed once every
//! instantiation in the program is known, so each file contributes
//! [`LinkRecord`]s that a [`Linker`] aggregates later. Between processes the
//! records travel as one line each:
//!
//! ```text
//! +ClassName^<registration statement>
//! >ClassName^<template args>
//! @ClassName^<args>^BaseName^<base args>
//! ```

mod linker;

pub use linker::Linker;

use std::fmt;

use thiserror::Error;

use crate::template::TemplateError;

/// Errors that can occur while decoding or resolving link records
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
    /// Line that is not a valid directive
    #[error("malformed link directive at line {line}: '{text}'")]
    Malformed { line: usize, text: String },

    /// Instantiation of a class nothing registered
    #[error("instantiation of unknown class '{class}<{args}>'")]
    UnknownClass { class: String, args: String },

    /// Base class chain loops back onto itself
    #[error("circular base class dependency: {}", chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    /// Registration statement could not be re-expanded
    #[error("registration for '{class}': {source}")]
    Template {
        class: String,
        #[source]
        source: TemplateError,
    },
}

/// One deferred registration directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRecord {
    /// Registration statement for a class, possibly containing `$CT`/`$CL`/`$BT`
    Register { class: String, statement: String },
    /// Concrete instantiation of a class for a template argument list
    Instantiate { class: String, args: String },
    /// Instantiating `class<args>` requires `base<base_args>`
    DependsOn {
        class: String,
        args: String,
        base: String,
        base_args: String,
    },
}

impl LinkRecord {
    pub fn register(class: impl Into<String>, statement: impl Into<String>) -> Self {
        LinkRecord::Register {
            class: class.into(),
            statement: statement.into(),
        }
    }

    pub fn instantiate(class: impl Into<String>, args: impl Into<String>) -> Self {
        LinkRecord::Instantiate {
            class: class.into(),
            args: args.into(),
        }
    }

    pub fn depends_on(
        class: impl Into<String>,
        args: impl Into<String>,
        base: impl Into<String>,
        base_args: impl Into<String>,
    ) -> Self {
        LinkRecord::DependsOn {
            class: class.into(),
            args: args.into(),
            base: base.into(),
            base_args: base_args.into(),
        }
    }

    /// Encode as a single protocol line, without the trailing newline
    pub fn encode(&self) -> String {
        match self {
            LinkRecord::Register { class, statement } => format!("+{}^{}", class, statement),
            LinkRecord::Instantiate { class, args } => format!(">{}^{}", class, args),
            LinkRecord::DependsOn {
                class,
                args,
                base,
                base_args,
            } => format!("@{}^{}^{}^{}", class, args, base, base_args),
        }
    }

    /// Decode one protocol line; `line_no` is only used for the error
    pub fn decode(text: &str, line_no: usize) -> Result<Self, LinkError> {
        let malformed = || LinkError::Malformed {
            line: line_no,
            text: text.to_string(),
        };

        let mut chars = text.chars();
        let marker = chars.next().ok_or_else(malformed)?;
        let rest = chars.as_str();

        match marker {
            '+' => {
                let (class, statement) = rest.split_once('^').ok_or_else(malformed)?;
                if class.is_empty() {
                    return Err(malformed());
                }
                Ok(LinkRecord::register(class, statement))
            }
            '>' => {
                let (class, args) = rest.split_once('^').ok_or_else(malformed)?;
                if class.is_empty() || args.contains('^') {
                    return Err(malformed());
                }
                Ok(LinkRecord::instantiate(class, args))
            }
            '@' => {
                let parts: Vec<&str> = rest.split('^').collect();
                match parts.as_slice() {
                    [class, args, base, base_args] if !class.is_empty() && !base.is_empty() => {
                        Ok(LinkRecord::depends_on(*class, *args, *base, *base_args))
                    }
                    _ => Err(malformed()),
                }
            }
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for LinkRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Encode records as protocol text, one line each
pub fn encode_records(records: &[LinkRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.encode());
        out.push('\n');
    }
    out
}

/// Decode protocol text; blank lines are skipped
pub fn parse_link_text(text: &str) -> Result<Vec<LinkRecord>, LinkError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| LinkRecord::decode(line.trim_end_matches('\r'), i + 1))
        .collect()
}
