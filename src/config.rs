//! Generator configuration
//!
//! Holds the documentation-mode switch, the annotation keyword echoed in
//! documentation stubs, and the type taxonomy that decides how arguments are
//! marshaled. Can be loaded from a TOML file:
//!
//! ```toml
//! doc_mode = false
//! annotation = "SCRIPT"
//!
//! [types]
//! primitives = ["uint64_t"]
//! values = ["Vec3", "Vec3i"]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::convert::TypeKind;
use crate::model::Type;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

const DEFAULT_PRIMITIVES: &[&str] = &[
    "int",
    "unsigned",
    "unsigned int",
    "long",
    "unsigned long",
    "long long",
    "short",
    "size_t",
    "IndexInt",
    "bool",
    "float",
    "double",
    "Real",
    "char",
    "std::string",
    "string",
];

const DEFAULT_VALUES: &[&str] = &["Vec3", "Vec3i", "Vec4", "Vec4i"];

/// Which declared type names are primitives or copyable value types
///
/// Every other type is a handle managed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTaxonomy {
    pub primitives: BTreeSet<String>,
    pub values: BTreeSet<String>,
}

impl Default for TypeTaxonomy {
    fn default() -> Self {
        Self {
            primitives: DEFAULT_PRIMITIVES.iter().map(|s| s.to_string()).collect(),
            values: DEFAULT_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TypeTaxonomy {
    /// Classify a type by its name
    pub fn kind_of(&self, ty: &Type) -> TypeKind {
        if self.primitives.contains(&ty.name) {
            TypeKind::Primitive
        } else if self.values.contains(&ty.name) {
            TypeKind::Value
        } else {
            TypeKind::Handle
        }
    }
}

/// Configuration for code generation
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Emit documentation stubs instead of glue code
    pub doc_mode: bool,

    /// Annotation keyword written in front of documentation stubs
    pub annotation: String,

    /// Type classification for argument loading and conversions
    pub types: TypeTaxonomy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            doc_mode: false,
            annotation: "SCRIPT".to_string(),
            types: TypeTaxonomy::default(),
        }
    }
}

/// TOML structure for deserializing configurations
#[derive(Deserialize)]
struct TomlConfig {
    doc_mode: Option<bool>,
    annotation: Option<String>,
    types: Option<TomlTypes>,
}

#[derive(Deserialize)]
struct TomlTypes {
    #[serde(default)]
    primitives: Vec<String>,
    #[serde(default)]
    values: Vec<String>,
}

impl GeneratorConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable documentation mode
    pub fn with_doc_mode(mut self, doc_mode: bool) -> Self {
        self.doc_mode = doc_mode;
        self
    }

    /// Set the annotation keyword used in documentation stubs
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = annotation.into();
        self
    }

    /// Treat an additional type name as a primitive
    pub fn with_primitive_type(mut self, name: impl Into<String>) -> Self {
        self.types.primitives.insert(name.into());
        self
    }

    /// Treat an additional type name as a copyable value type
    pub fn with_value_type(mut self, name: impl Into<String>) -> Self {
        self.types.values.insert(name.into());
        self
    }

    /// Parse a configuration from TOML; listed types extend the defaults
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();
        if let Some(doc_mode) = parsed.doc_mode {
            config.doc_mode = doc_mode;
        }
        if let Some(annotation) = parsed.annotation {
            config.annotation = annotation;
        }
        if let Some(types) = parsed.types {
            config.types.primitives.extend(types.primitives);
            config.types.values.extend(types.values);
        }
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}
