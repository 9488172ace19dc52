//! Declaration model handed over by the scanner
//!
//! One [`SourceFile`] per scanned file: verbatim code interleaved with
//! annotated [`Block`]s. Class blocks carry their own body, so member
//! declarations arrive already nested under their owner.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a model file
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse model TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// A type as written in a declaration
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Type {
    pub name: String,
    #[serde(default, rename = "pointer")]
    pub is_pointer: bool,
    #[serde(default, rename = "ref")]
    pub is_ref: bool,
    #[serde(default, rename = "const")]
    pub is_const: bool,
    #[serde(default)]
    pub template_args: Vec<Type>,
}

impl Type {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_const(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn with_ref(mut self) -> Self {
        self.is_ref = true;
        self
    }

    pub fn with_pointer(mut self) -> Self {
        self.is_pointer = true;
        self
    }

    pub fn with_template_arg(mut self, arg: Type) -> Self {
        self.template_args.push(arg);
        self
    }

    /// Name including template arguments, without qualifiers
    pub fn base_text(&self) -> String {
        if self.template_args.is_empty() {
            self.name.clone()
        } else {
            format!("{}<{}>", self.name, self.list_text())
        }
    }

    /// Canonical textual form, e.g. `const Grid<Real>&`
    pub fn minimal(&self) -> String {
        let mut s = String::new();
        if self.is_const {
            s.push_str("const ");
        }
        s.push_str(&self.base_text());
        if self.is_pointer {
            s.push('*');
        }
        if self.is_ref {
            s.push('&');
        }
        s
    }

    /// Template arguments joined by `,`
    pub fn list_text(&self) -> String {
        self.template_args
            .iter()
            .map(Type::minimal)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn is_void(&self) -> bool {
        self.name == "void" && !self.is_pointer
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.minimal())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Argument {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    pub index: usize,
    #[serde(default)]
    pub default: Option<String>,
}

impl Argument {
    pub fn new(name: impl Into<String>, ty: Type, index: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            index,
            default: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Default value text; empty text counts as no default
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref().filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Function {
    pub name: String,
    /// Absent for constructors
    #[serde(default)]
    pub return_type: Option<Type>,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    /// Explicit argument list used to invoke the declaration
    #[serde(default)]
    pub call_string: Option<String>,
    /// Trailing qualifiers such as ` const`
    #[serde(default)]
    pub qualifiers: String,
    #[serde(default)]
    pub init_list: String,
    /// Code that followed the signature in the source
    #[serde(default)]
    pub body: String,
}

impl Function {
    pub fn new(name: impl Into<String>, return_type: Option<Type>) -> Self {
        Self {
            name: name.into(),
            return_type,
            ..Self::default()
        }
    }

    pub fn with_argument(mut self, arg: Argument) -> Self {
        self.arguments.push(arg);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.return_type.as_ref().map_or(true, |t| t.name.is_empty())
    }

    pub fn returns_void(&self) -> bool {
        self.return_type.as_ref().is_some_and(Type::is_void)
    }

    pub fn call_string(&self) -> String {
        match &self.call_string {
            Some(s) => s.clone(),
            None => self
                .arguments
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Minimal signature, e.g. `void foo(int a, float b = 2.0)`
    pub fn signature(&self) -> String {
        let args = self
            .arguments
            .iter()
            .map(|a| match a.default_value() {
                Some(v) => format!("{} {} = {}", a.ty.minimal(), a.name, v),
                None => format!("{} {}", a.ty.minimal(), a.name),
            })
            .collect::<Vec<_>>()
            .join(", ");
        match &self.return_type {
            Some(ret) if !self.is_constructor() => {
                format!("{} {}({}){}", ret.minimal(), self.name, args, self.qualifiers)
            }
            _ => format!("{}({}){}", self.name, args, self.qualifiers),
        }
    }
}

/// Member variable declaration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn declaration(&self) -> String {
        format!("{} {}", self.ty.minimal(), self.name)
    }
}

/// Base class descriptor
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct BaseClass {
    pub name: String,
    #[serde(default)]
    pub template_args: Vec<String>,
}

impl BaseClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template_args: Vec::new(),
        }
    }

    pub fn with_template_arg(mut self, arg: impl Into<String>) -> Self {
        self.template_args.push(arg.into());
        self
    }

    pub fn is_templated(&self) -> bool {
        !self.template_args.is_empty()
    }

    pub fn tpl_string(&self) -> String {
        self.template_args.join(",")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Class {
    pub name: String,
    #[serde(default)]
    pub template_params: Vec<String>,
    #[serde(default)]
    pub base: Option<BaseClass>,
    #[serde(default)]
    pub body: Vec<Item>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_template_param(mut self, param: impl Into<String>) -> Self {
        self.template_params.push(param.into());
        self
    }

    pub fn with_base(mut self, base: BaseClass) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.body.push(item);
        self
    }

    pub fn is_templated(&self) -> bool {
        !self.template_params.is_empty()
    }

    pub fn tpl_string(&self) -> String {
        self.template_params.join(",")
    }

    pub fn base_is_templated(&self) -> bool {
        self.base.as_ref().is_some_and(BaseClass::is_templated)
    }

    /// Opening signature, e.g. `template<class T> class Grid : public GridBase`
    pub fn signature(&self) -> String {
        let mut s = String::new();
        if self.is_templated() {
            let params = self
                .template_params
                .iter()
                .map(|p| format!("class {}", p))
                .collect::<Vec<_>>()
                .join(", ");
            s.push_str(&format!("template<{}> ", params));
        }
        s.push_str("class ");
        s.push_str(&self.name);
        if let Some(base) = &self.base {
            s.push_str(" : public ");
            s.push_str(&base.name);
            if base.is_templated() {
                s.push_str(&format!("<{}>", base.tpl_string()));
            }
        }
        s.push(' ');
        s
    }
}

/// Template alias to instantiate, e.g. `typedef Grid<Real> RealGrid`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Instantiation {
    pub alias: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

/// Keyword option from the annotation, e.g. `name="r"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockOption {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl BlockOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Function(Function),
    Variable(Variable),
    Class(Class),
    Instantiation(Instantiation),
}

/// One annotated declaration occurrence
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Block {
    pub line: usize,
    #[serde(default)]
    pub linebreaks: usize,
    #[serde(default)]
    pub options: Vec<BlockOption>,
    pub decl: Declaration,
}

impl Block {
    pub fn new(line: usize, decl: Declaration) -> Self {
        Self {
            line,
            linebreaks: 0,
            options: Vec::new(),
            decl,
        }
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(BlockOption::new(name, value));
        self
    }

    pub fn with_linebreaks(mut self, count: usize) -> Self {
        self.linebreaks = count;
        self
    }

    /// Newlines swallowed by the annotation, re-emitted to keep line numbers
    pub fn linebreak_text(&self) -> String {
        "\n".repeat(self.linebreaks)
    }
}

/// Source content between or around annotated declarations
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum Item {
    Code { text: String },
    Block(Block),
}

impl Item {
    pub fn code(text: impl Into<String>) -> Self {
        Item::Code { text: text.into() }
    }
}

impl From<Block> for Item {
    fn from(block: Block) -> Self {
        Item::Block(block)
    }
}

/// Scanned model of one source file
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct SourceFile {
    /// Path of the scanned file, used in diagnostics
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub header: bool,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, header: bool) -> Self {
        Self {
            path: path.into(),
            header,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: impl Into<Item>) -> Self {
        self.items.push(item.into());
        self
    }

    pub fn from_toml(content: &str) -> Result<Self, ModelError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}
