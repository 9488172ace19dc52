//! Argument loader synthesis
//!
//! One statement per argument binds a local of the declared type from the
//! call's keyword or positional arguments, registering touched host references
//! with the enclosing `ArgLock _lock`.

use crate::config::TypeTaxonomy;
use crate::model::{Argument, Function};

/// Loader statement for a single argument
pub fn generate_loader(arg: &Argument, types: &TypeTaxonomy) -> String {
    let conversion = types.kind_of(&arg.ty).conversion();
    let deref = if conversion.needs_deref(&arg.ty) { "*" } else { "" };
    let load_type = conversion.load_type(&arg.ty);

    match arg.default_value() {
        None => format!(
            "{} {} = {}_args.get<{} >({},\"{}\",&_lock); ",
            arg.ty.minimal(),
            arg.name,
            deref,
            load_type,
            arg.index,
            arg.name
        ),
        Some(default) => format!(
            "{} {} = {}_args.getOpt<{} >({},\"{}\",{},&_lock); ",
            arg.ty.minimal(),
            arg.name,
            deref,
            load_type,
            arg.index,
            arg.name,
            default
        ),
    }
}

/// Loader statements for all arguments, in positional order
pub fn generate_loaders(func: &Function, types: &TypeTaxonomy) -> Vec<String> {
    let mut args: Vec<&Argument> = func.arguments.iter().collect();
    args.sort_by_key(|a| a.index);
    args.into_iter().map(|a| generate_loader(a, types)).collect()
}
