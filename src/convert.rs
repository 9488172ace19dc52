//! Conversion strategies between host values and native values
//!
//! The generated code calls `fromScript<T>` / `toScript` from the runtime
//! library. Which `T` to request, and whether the loaded value must be
//! dereferenced, depends on the kind of the declared type. Each kind has one
//! [`Convertible`] implementation chosen statically from the declaration model.

use crate::model::Type;

/// Classification of a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Scalars and strings
    Primitive,
    /// Small copyable types converted by value, e.g. vectors
    Value,
    /// Objects owned by the host and referenced rather than copied
    Handle,
}

impl TypeKind {
    pub fn conversion(self) -> &'static dyn Convertible {
        match self {
            TypeKind::Primitive | TypeKind::Value => &ByValueConversion,
            TypeKind::Handle => &HandleConversion,
        }
    }
}

/// How a type crosses the host boundary
pub trait Convertible {
    /// Type requested from the runtime when loading a value of `ty`
    fn load_type(&self, ty: &Type) -> String;

    /// Whether the loaded value is a pointer that must be dereferenced to bind `ty`
    fn needs_deref(&self, ty: &Type) -> bool;

    /// Expression converting a native value outward
    fn to_host(&self, expr: &str) -> String {
        format!("toScript({})", expr)
    }

    /// Expression converting a host value inward to a value of `ty`
    fn from_host(&self, ty: &Type, expr: &str) -> String {
        let deref = if self.needs_deref(ty) { "*" } else { "" };
        format!("{}fromScript<{} >({})", deref, self.load_type(ty), expr)
    }
}

/// Copy semantics for primitives and value types: const and reference are
/// dropped, pointers (e.g. `const char*`) keep their declared form.
pub struct ByValueConversion;

impl Convertible for ByValueConversion {
    fn load_type(&self, ty: &Type) -> String {
        if ty.is_pointer {
            let mut declared = ty.clone();
            declared.is_ref = false;
            declared.minimal()
        } else {
            ty.base_text()
        }
    }

    fn needs_deref(&self, _ty: &Type) -> bool {
        false
    }
}

/// The runtime only hands out non-owning pointers for handles, so a reference
/// is loaded as a pointer and dereferenced at the binding.
pub struct HandleConversion;

impl Convertible for HandleConversion {
    fn load_type(&self, ty: &Type) -> String {
        if ty.is_ref {
            format!("{}*", ty.base_text())
        } else {
            ty.minimal()
        }
    }

    fn needs_deref(&self, ty: &Type) -> bool {
        ty.is_ref
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_const_ref_loaded_by_value() {
        let ty = Type::new("Real").with_const().with_ref();
        let conv = TypeKind::Primitive.conversion();
        assert_eq!(conv.load_type(&ty), "Real");
        assert!(!conv.needs_deref(&ty));
    }

    #[test]
    fn test_primitive_pointer_kept() {
        let ty = Type::new("char").with_const().with_pointer();
        assert_eq!(TypeKind::Primitive.conversion().load_type(&ty), "const char*");
    }

    #[test]
    fn test_value_type_loaded_by_value() {
        let ty = Type::new("Vec3").with_const().with_ref();
        let conv = TypeKind::Value.conversion();
        assert_eq!(conv.load_type(&ty), "Vec3");
        assert_eq!(conv.from_host(&ty, "v"), "fromScript<Vec3 >(v)");
    }

    #[test]
    fn test_handle_reference_is_pointer_adapted() {
        let ty = Type::new("Grid")
            .with_template_arg(Type::new("Real"))
            .with_const()
            .with_ref();
        let conv = TypeKind::Handle.conversion();
        assert_eq!(conv.load_type(&ty), "Grid<Real>*");
        assert!(conv.needs_deref(&ty));
        assert_eq!(conv.from_host(&ty, "_val"), "*fromScript<Grid<Real>* >(_val)");
    }

    #[test]
    fn test_handle_pointer_uses_declared_form() {
        let ty = Type::new("FlagGrid").with_pointer();
        let conv = TypeKind::Handle.conversion();
        assert_eq!(conv.load_type(&ty), "FlagGrid*");
        assert!(!conv.needs_deref(&ty));
        assert_eq!(conv.to_host("_obj->flags"), "toScript(_obj->flags)");
    }
}
