//! Aggregation of link records into concrete registrations

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::{parse_link_text, LinkError, LinkRecord};
use crate::template::{SubstitutionTable, Template};

/// Template parameters of a class and how they map onto its base's arguments
#[derive(Debug, Clone, PartialEq, Eq)]
struct Dependency {
    params: String,
    base: String,
    base_args: String,
}

/// Collects link records from any number of files and resolves them
#[derive(Debug, Default)]
pub struct Linker {
    registrations: HashMap<String, Vec<String>>,
    dependencies: HashMap<String, Vec<Dependency>>,
    instantiations: Vec<(String, String)>,
}

impl Linker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record; a statement or dependency already known for the class
    /// is ignored, so the same link text may be added more than once
    pub fn add_record(&mut self, record: LinkRecord) {
        match record {
            LinkRecord::Register { class, statement } => {
                let statements = self.registrations.entry(class).or_default();
                if !statements.contains(&statement) {
                    statements.push(statement);
                }
            }
            LinkRecord::Instantiate { class, args } => {
                self.instantiations.push((class, args));
            }
            LinkRecord::DependsOn {
                class,
                args,
                base,
                base_args,
            } => {
                let dependency = Dependency {
                    params: args,
                    base,
                    base_args,
                };
                let deps = self.dependencies.entry(class).or_default();
                if !deps.contains(&dependency) {
                    deps.push(dependency);
                }
            }
        }
    }

    pub fn add_records(&mut self, records: impl IntoIterator<Item = LinkRecord>) {
        for record in records {
            self.add_record(record);
        }
    }

    /// Decode protocol text and add its records
    pub fn add_link_text(&mut self, text: &str) -> Result<(), LinkError> {
        self.add_records(parse_link_text(text)?);
        Ok(())
    }

    /// Resolve every requested instantiation into registration statements
    ///
    /// Base class registrations precede those of the classes deriving from
    /// them; each `(class, args)` pair is emitted once.
    pub fn resolve(&self) -> Result<Vec<String>, LinkError> {
        let mut done = HashSet::new();
        let mut out = Vec::new();
        for (class, args) in &self.instantiations {
            let mut chain = Vec::new();
            self.resolve_one(class, args, &mut done, &mut chain, &mut out)?;
        }
        debug!(
            instantiations = done.len(),
            statements = out.len(),
            "resolved link records"
        );
        Ok(out)
    }

    fn resolve_one(
        &self,
        class: &str,
        args: &str,
        done: &mut HashSet<(String, String)>,
        chain: &mut Vec<String>,
        out: &mut Vec<String>,
    ) -> Result<(), LinkError> {
        let key = (class.to_string(), args.to_string());
        if done.contains(&key) {
            return Ok(());
        }
        let label = format!("{}<{}>", class, args);
        if chain.contains(&label) {
            chain.push(label);
            return Err(LinkError::CircularDependency {
                chain: chain.clone(),
            });
        }
        chain.push(label);

        let statements = self
            .registrations
            .get(class)
            .ok_or_else(|| LinkError::UnknownClass {
                class: class.to_string(),
                args: args.to_string(),
            })?;

        let mut base_args_text = String::new();
        if let Some(deps) = self.dependencies.get(class) {
            if deps.len() > 1 {
                warn!(class, count = deps.len(), "multiple base dependencies, using the first");
            }
            if let Some(dep) = deps.first() {
                let base_args = bind_params(&dep.params, args, &dep.base_args);
                self.resolve_one(&dep.base, &base_args, done, chain, out)?;
                base_args_text = base_args;
            }
        }

        let table = SubstitutionTable::new()
            .with("CT", args)
            .with("CL", mangle(args))
            .with("BT", base_args_text.as_str());
        for statement in statements {
            let expanded = Template::parse(class, statement)
                .and_then(|tpl| tpl.expand(&table))
                .map_err(|source| LinkError::Template {
                    class: class.to_string(),
                    source,
                })?;
            out.push(expanded);
        }

        chain.pop();
        done.insert(key);
        Ok(())
    }
}

/// Identifier-safe form of a template argument list, e.g. `Vec3,int` -> `Vec3_int`
pub fn mangle(args: &str) -> String {
    args.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn split_args(list: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in list.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Substitute concrete arguments for template parameters in `target`,
/// matching whole identifiers only
fn bind_params(params: &str, args: &str, target: &str) -> String {
    let bindings: HashMap<String, String> = split_args(params)
        .into_iter()
        .zip(split_args(args))
        .collect();

    let mut out = String::new();
    let mut ident = String::new();
    let flush = |ident: &mut String, out: &mut String| {
        if !ident.is_empty() {
            match bindings.get(ident.as_str()) {
                Some(value) => out.push_str(value),
                None => out.push_str(ident),
            }
            ident.clear();
        }
    };
    for c in target.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
            ident.push(c);
        } else {
            flush(&mut ident, &mut out);
            out.push(c);
        }
    }
    flush(&mut ident, &mut out);
    out
}
