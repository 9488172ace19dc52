//! bridgegen - glue generator for scripting-host bindings
//!
//! This library turns annotated C++ declarations into wrapper functions,
//! property accessors and registration statements for an embedded scripting
//! host. Registration of template classes is deferred: each file emits link
//! records that the [`Linker`] resolves once all instantiations are known.
//!
//! # Example
//!
//! ```rust
//! use bridgegen::model::{Argument, Block, Declaration, Function, SourceFile, Type};
//! use bridgegen::{generate, GeneratorConfig};
//!
//! let func = Function::new("foo", Some(Type::new("void")))
//!     .with_argument(Argument::new("a", Type::new("int"), 0));
//! let file = SourceFile::new("plugin.cpp", false)
//!     .with_item(Block::new(1, Declaration::Function(func)));
//!
//! let sink = generate(&file, &GeneratorConfig::default()).unwrap();
//! assert!(sink.inplace.contains("_W_foo"));
//! ```

pub mod codegen;
pub mod config;
pub mod convert;
pub mod error;
pub mod link;
pub mod model;
pub mod template;

pub use codegen::{Generator, Sink};
pub use config::{ConfigError, GeneratorConfig, TypeTaxonomy};
pub use convert::{Convertible, TypeKind};
pub use error::GenerateError;
pub use link::{LinkError, LinkRecord, Linker};
pub use model::{ModelError, SourceFile};
pub use template::{SubstitutionTable, Template, TemplateError};

/// Generate glue for one file with the given configuration
pub fn generate(file: &SourceFile, config: &GeneratorConfig) -> Result<Sink, GenerateError> {
    Generator::new(config.clone())?.generate(file)
}

/// Resolve link protocol text gathered from any number of files into the
/// final registration statements, one per line
pub fn link(texts: &[&str]) -> Result<String, LinkError> {
    let mut linker = Linker::new();
    for text in texts {
        linker.add_link_text(text)?;
    }
    let mut out = String::new();
    for statement in linker.resolve()? {
        out.push_str(&statement);
        out.push('\n');
    }
    Ok(out)
}
