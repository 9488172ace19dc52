//! Usage errors raised while processing declarations

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::template::TemplateError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A fatal diagnostic for the file being generated
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GenerateError {
    /// Keyword option the declaration kind does not support
    #[error("line {line}: unknown keyword option '{option}'{}", supported_hint(.supported))]
    UnknownOption {
        line: usize,
        option: String,
        supported: &'static [&'static str],
    },

    #[error("line {line}: plugin functions can't be defined in headers")]
    PluginInHeader { line: usize },

    #[error("line {line}: variables can only be annotated inside classes")]
    VariableOutsideClass { line: usize },

    #[error("line {line}: classes can only be annotated in header files")]
    ClassOutsideHeader { line: usize },

    #[error("line {line}: instantiations are allowed in headers only")]
    InstantiationOutsideHeader { line: usize },

    #[error("line {line}: no constructor found in class '{class}'")]
    MissingConstructor { line: usize, class: String },

    /// Defect in the template library
    #[error("internal template error: {0}")]
    Template(#[from] TemplateError),
}

fn supported_hint(supported: &[&str]) -> String {
    if supported.is_empty() {
        " (no options are supported)".to_string()
    } else {
        format!(" (supported: {})", supported.join(", "))
    }
}

impl GenerateError {
    pub fn unknown_option(line: usize, option: impl Into<String>, supported: &'static [&'static str]) -> Self {
        Self::UnknownOption {
            line,
            option: option.into(),
            supported,
        }
    }

    pub fn missing_constructor(line: usize, class: impl Into<String>) -> Self {
        Self::MissingConstructor {
            line,
            class: class.into(),
        }
    }

    /// Source line of the offending declaration, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::UnknownOption { line, .. }
            | Self::PluginInHeader { line }
            | Self::VariableOutsideClass { line }
            | Self::ClassOutsideHeader { line }
            | Self::InstantiationOutsideHeader { line }
            | Self::MissingConstructor { line, .. } => Some(*line),
            Self::Template(_) => None,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let Some(line) = self.line() else {
            return self.to_string();
        };
        let span = line_span(source, line);

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(self.label())
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::UnknownOption { option, .. } => format!("option '{}' is not recognized here", option),
            Self::PluginInHeader { .. } => "free function annotated in a header".to_string(),
            Self::VariableOutsideClass { .. } => "variable has no enclosing class".to_string(),
            Self::ClassOutsideHeader { .. } => "class annotated outside a header".to_string(),
            Self::InstantiationOutsideHeader { .. } => "instantiation outside a header".to_string(),
            Self::MissingConstructor { class, .. } => format!("'{}' needs an annotated constructor", class),
            Self::Template(e) => e.to_string(),
        }
    }
}

/// Byte range of a 1-based line, clamped to the end of the source
fn line_span(source: &str, line: usize) -> Span {
    let mut start = 0;
    for (i, text) in source.split_inclusive('\n').enumerate() {
        if i + 1 == line {
            let trimmed = text.trim_end_matches(['\n', '\r']);
            return start..start + trimmed.len();
        }
        start += text.len();
    }
    source.len()..source.len()
}
