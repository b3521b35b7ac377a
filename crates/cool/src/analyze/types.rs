//! Static types as the checker sees them.

use std::{fmt, rc::Rc};

use crate::symbols::{OBJECT, SymbolTable};

/// A static type in the judgment of the checker.
///
/// `SELF_TYPE` is a parameterized symbol `SelfTy(C)` where `C` is the class
/// whose feature is being checked. It is never the dynamic class of a runtime
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Ty {
    Class(Rc<str>),
    SelfTy(Rc<str>),
}

impl Ty {
    pub(crate) fn object() -> Self {
        Self::Class(Rc::from(OBJECT))
    }

    /// The class used for method and attribute lookup: `SELF_TYPE[C]`
    /// resolves as `C`.
    pub(crate) fn lookup_name(&self) -> &str {
        match self {
            Self::Class(name) | Self::SelfTy(name) => name,
        }
    }

    pub(crate) fn is_class_named(&self, name: &str) -> bool {
        matches!(self, Self::Class(class) if &**class == name)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(name) => f.write_str(name),
            Self::SelfTy(_) => f.write_str("SELF_TYPE"),
        }
    }
}

/// Conformance (`≤`) under the inheritance order.
///
/// Within a single judgment both `SelfTy` operands share the same enclosing
/// class, so `SELF_TYPE ≤ SELF_TYPE` always holds. A concrete class never
/// conforms to `SELF_TYPE`: the dynamic class of the receiver may be any
/// subclass.
pub(crate) fn conforms(table: &SymbolTable, sub: &Ty, sup: &Ty) -> bool {
    match (sub, sup) {
        (Ty::SelfTy(_), Ty::SelfTy(_)) => true,
        (Ty::SelfTy(class), Ty::Class(target)) => table.conforms(class, target),
        (Ty::Class(_), Ty::SelfTy(_)) => false,
        (Ty::Class(sub_class), Ty::Class(sup_class)) => table.conforms(sub_class, sup_class),
    }
}

/// Least upper bound, lifted over `SELF_TYPE`.
pub(crate) fn lub(table: &SymbolTable, a: &Ty, b: &Ty) -> Ty {
    match (a, b) {
        (Ty::SelfTy(class), Ty::SelfTy(_)) => Ty::SelfTy(Rc::clone(class)),
        _ => Ty::Class(table.lub(a.lookup_name(), b.lookup_name())),
    }
}
