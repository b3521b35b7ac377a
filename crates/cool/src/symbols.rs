//! Class symbols, the inheritance graph, and the pre-registered built-ins.
//!
//! All tables are `IndexMap`s: class registration order, attribute slot
//! layout, and method tables are iterated in source order by later stages.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::{
    ast::{Expr, ExprLoc},
    builtins::BuiltinMethod,
    diagnostics::Position,
};

pub(crate) const SELF_TYPE: &str = "SELF_TYPE";
pub(crate) const OBJECT: &str = "Object";
pub(crate) const IO: &str = "IO";
pub(crate) const INT: &str = "Int";
pub(crate) const STRING: &str = "String";
pub(crate) const BOOL: &str = "Bool";
pub(crate) const MAIN: &str = "Main";

/// True for the value classes that cannot be inherited from.
pub(crate) fn is_primitive(name: &str) -> bool {
    matches!(name, INT | STRING | BOOL)
}

/// True for any of the five pre-registered classes.
pub(crate) fn is_builtin_class(name: &str) -> bool {
    matches!(name, OBJECT | IO | INT | STRING | BOOL)
}

/// A formal parameter in a method signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FormalSig {
    pub name: Rc<str>,
    pub declared_type: Rc<str>,
}

#[derive(Debug, Clone)]
pub struct AttrSymbol {
    pub name: Rc<str>,
    pub declared_type: Rc<str>,
    pub initializer: Option<Rc<ExprLoc>>,
    pub source_order: u32,
    pub defining_class: Rc<str>,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct MethodSymbol {
    pub name: Rc<str>,
    pub formals: Vec<FormalSig>,
    pub return_type: Rc<str>,
    pub body: Rc<ExprLoc>,
    pub defining_class: Rc<str>,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct ClassSymbol {
    pub name: Rc<str>,
    /// None only for `Object`, the root of the lattice.
    pub parent_name: Option<Rc<str>>,
    pub attributes: IndexMap<Rc<str>, AttrSymbol>,
    pub methods: IndexMap<Rc<str>, MethodSymbol>,
    pub is_builtin: bool,
    pub position: Position,
}

impl ClassSymbol {
    pub(crate) fn new(name: Rc<str>, parent_name: Option<Rc<str>>, position: Position) -> Self {
        Self {
            name,
            parent_name,
            attributes: IndexMap::new(),
            methods: IndexMap::new(),
            is_builtin: false,
            position,
        }
    }
}

/// All classes of a program, keyed by name, in registration order
/// (built-ins first, then user classes in source order).
#[derive(Debug, Clone)]
pub struct SymbolTable {
    classes: IndexMap<Rc<str>, ClassSymbol>,
}

impl SymbolTable {
    /// A table holding only the five built-in classes.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut classes = IndexMap::new();
        for symbol in [
            object_class(),
            io_class(),
            builtin_leaf(INT),
            string_class(),
            builtin_leaf(BOOL),
        ] {
            classes.insert(Rc::clone(&symbol.name), symbol);
        }
        Self { classes }
    }

    pub(crate) fn insert(&mut self, symbol: ClassSymbol) {
        self.classes.insert(Rc::clone(&symbol.name), symbol);
    }

    #[must_use]
    pub(crate) fn get(&self, name: &str) -> Option<&ClassSymbol> {
        self.classes.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub(crate) fn classes(&self) -> impl Iterator<Item = &ClassSymbol> {
        self.classes.values()
    }

    /// The inheritance chain from `name` up to `Object`, inclusive,
    /// starting at `name` itself. Must only be called on a validated
    /// (cycle-free) table.
    #[must_use]
    pub fn ancestry(&self, name: &str) -> Vec<Rc<str>> {
        let mut chain = Vec::new();
        let mut current = self.classes.get(name);
        while let Some(symbol) = current {
            chain.push(Rc::clone(&symbol.name));
            current = symbol.parent_name.as_deref().and_then(|p| self.classes.get(p));
        }
        chain
    }

    /// Whether `sub` conforms to (`≤`) `sup` in the inheritance lattice.
    #[must_use]
    pub fn conforms(&self, sub: &str, sup: &str) -> bool {
        let mut current = Some(sub);
        while let Some(name) = current {
            if name == sup {
                return true;
            }
            current = self.classes.get(name).and_then(|c| c.parent_name.as_deref());
        }
        false
    }

    /// Least upper bound: the deepest class on both ancestor chains.
    #[must_use]
    pub fn lub(&self, a: &str, b: &str) -> Rc<str> {
        let chain_b = self.ancestry(b);
        for candidate in self.ancestry(a) {
            if chain_b.iter().any(|other| *other == candidate) {
                return candidate;
            }
        }
        Rc::from(OBJECT)
    }

    /// Number of parent links from `from` up to `to`; None when `to` is not
    /// an ancestor of `from`.
    #[must_use]
    pub(crate) fn distance_up(&self, from: &str, to: &str) -> Option<u32> {
        let mut distance = 0u32;
        let mut current = Some(from);
        while let Some(name) = current {
            if name == to {
                return Some(distance);
            }
            distance += 1;
            current = self.classes.get(name).and_then(|c| c.parent_name.as_deref());
        }
        None
    }

    /// Resolves a method in `class` or the nearest ancestor defining it.
    #[must_use]
    pub(crate) fn lookup_method(&self, class: &str, method: &str) -> Option<&MethodSymbol> {
        let mut current = Some(class);
        while let Some(name) = current {
            let symbol = self.classes.get(name)?;
            if let Some(found) = symbol.methods.get(method) {
                return Some(found);
            }
            current = symbol.parent_name.as_deref();
        }
        None
    }

    /// Resolves an attribute in `class` or the nearest ancestor defining it.
    #[must_use]
    pub(crate) fn lookup_attr(&self, class: &str, attr: &str) -> Option<&AttrSymbol> {
        let mut current = Some(class);
        while let Some(name) = current {
            let symbol = self.classes.get(name)?;
            if let Some(found) = symbol.attributes.get(attr) {
                return Some(found);
            }
            current = symbol.parent_name.as_deref();
        }
        None
    }

    /// Attribute slot layout for instances of `class`: the concatenation of
    /// each ancestor's attributes in declared order, from `Object` down.
    #[must_use]
    pub(crate) fn attr_layout(&self, class: &str) -> Vec<&AttrSymbol> {
        let mut chain = self.ancestry(class);
        chain.reverse();
        let mut layout = Vec::new();
        for name in &chain {
            if let Some(symbol) = self.classes.get(&**name) {
                let mut class_attrs: Vec<&AttrSymbol> = symbol.attributes.values().collect();
                class_attrs.sort_by_key(|attr| attr.source_order);
                layout.extend(class_attrs);
            }
        }
        layout
    }
}

fn synthetic_method(name: &str, formals: &[(&str, &str)], return_type: &str, tag: BuiltinMethod) -> MethodSymbol {
    MethodSymbol {
        name: Rc::from(name),
        formals: formals
            .iter()
            .map(|(formal_name, declared_type)| FormalSig {
                name: Rc::from(*formal_name),
                declared_type: Rc::from(*declared_type),
            })
            .collect(),
        return_type: Rc::from(return_type),
        body: Rc::new(ExprLoc::new(Position::none(), Expr::Builtin(tag))),
        defining_class: Rc::from(OBJECT),
        position: Position::none(),
    }
}

fn builtin_shell(name: &str, parent: Option<&str>, methods: Vec<MethodSymbol>) -> ClassSymbol {
    let class_name: Rc<str> = Rc::from(name);
    let mut table = IndexMap::new();
    for mut method in methods {
        method.defining_class = Rc::clone(&class_name);
        table.insert(Rc::clone(&method.name), method);
    }
    ClassSymbol {
        name: class_name,
        parent_name: parent.map(Rc::from),
        attributes: IndexMap::new(),
        methods: table,
        is_builtin: true,
        position: Position::none(),
    }
}

fn object_class() -> ClassSymbol {
    builtin_shell(OBJECT, None, vec![
        synthetic_method("abort", &[], OBJECT, BuiltinMethod::Abort),
        synthetic_method("type_name", &[], STRING, BuiltinMethod::TypeName),
        synthetic_method("copy", &[], SELF_TYPE, BuiltinMethod::Copy),
    ])
}

fn io_class() -> ClassSymbol {
    builtin_shell(IO, Some(OBJECT), vec![
        synthetic_method("out_string", &[("x", STRING)], SELF_TYPE, BuiltinMethod::OutString),
        synthetic_method("out_int", &[("x", INT)], SELF_TYPE, BuiltinMethod::OutInt),
        synthetic_method("in_string", &[], STRING, BuiltinMethod::InString),
        synthetic_method("in_int", &[], INT, BuiltinMethod::InInt),
    ])
}

fn string_class() -> ClassSymbol {
    builtin_shell(STRING, Some(OBJECT), vec![
        synthetic_method("length", &[], INT, BuiltinMethod::Length),
        synthetic_method("concat", &[("s", STRING)], STRING, BuiltinMethod::Concat),
        synthetic_method("substr", &[("i", INT), ("l", INT)], STRING, BuiltinMethod::Substr),
    ])
}

fn builtin_leaf(name: &str) -> ClassSymbol {
    builtin_shell(name, Some(OBJECT), Vec::new())
}
