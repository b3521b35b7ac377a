//! Phase 1: class registration and inheritance validation.

use std::rc::Rc;

use ahash::AHashSet;

use crate::{
    ast::{Class, Feature, Program},
    diagnostics::{Diagnostic, DiagnosticBag, DiagnosticCode, Position},
    symbols::{AttrSymbol, ClassSymbol, FormalSig, MAIN, MethodSymbol, OBJECT, SymbolTable, is_primitive},
};

/// Registers every user class, then validates parents and checks the
/// inheritance relation for cycles. Errors accumulate per class so one bad
/// class does not hide problems in the next.
pub(crate) fn run(program: &Program, table: &mut SymbolTable, bag: &mut DiagnosticBag) {
    for class in &program.classes {
        register_class(class, table, bag);
    }

    if !table.contains(MAIN) {
        bag.push(Diagnostic::error(
            DiagnosticCode::MissingMain,
            Position::none(),
            "program does not define a class Main",
        ));
    }

    check_parents(table, bag);
    detect_cycle(table, bag);
}

fn register_class(class: &Class, table: &mut SymbolTable, bag: &mut DiagnosticBag) {
    match table.get(&class.name) {
        Some(existing) if existing.is_builtin => {
            bag.push(Diagnostic::error(
                DiagnosticCode::RedefineBuiltin,
                class.position.clone(),
                format!("class {} redefines a built-in class", class.name),
            ));
            return;
        }
        Some(_) => {
            bag.push(Diagnostic::error(
                DiagnosticCode::DuplicateClass,
                class.position.clone(),
                format!("class {} is defined more than once", class.name),
            ));
            return;
        }
        None => {}
    }

    if let Some(parent) = &class.inherits_from
        && is_primitive(parent)
    {
        bag.push(Diagnostic::error(
            DiagnosticCode::InheritFromPrimitive,
            class.position.clone(),
            format!("class {} cannot inherit from primitive class {parent}", class.name),
        ));
        return;
    }

    let parent_name = class
        .inherits_from
        .clone()
        .unwrap_or_else(|| Rc::from(OBJECT));
    let mut symbol = ClassSymbol::new(Rc::clone(&class.name), Some(parent_name), class.position.clone());
    collect_features(class, &mut symbol, bag);
    table.insert(symbol);
}

/// Builds the attribute and method tables, rejecting duplicates declared in
/// the same class. Cross-class attribute duplicates need the validated
/// hierarchy and are checked in phase 2.
fn collect_features(class: &Class, symbol: &mut ClassSymbol, bag: &mut DiagnosticBag) {
    for feature in &class.features {
        match feature {
            Feature::Attribute(attr) => {
                if symbol.attributes.contains_key(&attr.name) {
                    bag.push(Diagnostic::error(
                        DiagnosticCode::DuplicateAttribute,
                        attr.position.clone(),
                        format!("attribute {} is defined more than once in class {}", attr.name, class.name),
                    ));
                    continue;
                }
                symbol.attributes.insert(Rc::clone(&attr.name), AttrSymbol {
                    name: Rc::clone(&attr.name),
                    declared_type: Rc::clone(&attr.declared_type),
                    initializer: attr.initializer.clone().map(Rc::new),
                    source_order: attr.source_order,
                    defining_class: Rc::clone(&class.name),
                    position: attr.position.clone(),
                });
            }
            Feature::Method(method) => {
                if symbol.methods.contains_key(&method.name) {
                    bag.push(Diagnostic::error(
                        DiagnosticCode::DuplicateMethod,
                        method.position.clone(),
                        format!("method {} is defined more than once in class {}", method.name, class.name),
                    ));
                    continue;
                }
                symbol.methods.insert(Rc::clone(&method.name), MethodSymbol {
                    name: Rc::clone(&method.name),
                    formals: method
                        .formals
                        .iter()
                        .map(|f| FormalSig {
                            name: Rc::clone(&f.name),
                            declared_type: Rc::clone(&f.declared_type),
                        })
                        .collect(),
                    return_type: Rc::clone(&method.return_type),
                    body: Rc::new(method.body.clone()),
                    defining_class: Rc::clone(&class.name),
                    position: method.position.clone(),
                });
            }
        }
    }
}

fn check_parents(table: &SymbolTable, bag: &mut DiagnosticBag) {
    for class in table.classes() {
        if class.is_builtin {
            continue;
        }
        if let Some(parent) = class.parent_name.as_deref()
            && !table.contains(parent)
        {
            bag.push(Diagnostic::error(
                DiagnosticCode::UndefinedParent,
                class.position.clone(),
                format!("class {} inherits from undefined class {parent}", class.name),
            ));
        }
    }
}

/// Walks the parent relation with a visited set and a recursion stack.
/// Reports the first cycle found as the chain from the re-encountered class
/// back to itself, then stops.
fn detect_cycle(table: &SymbolTable, bag: &mut DiagnosticBag) {
    let mut visited: AHashSet<Rc<str>> = AHashSet::new();
    let class_names: Vec<Rc<str>> = table.classes().map(|c| Rc::clone(&c.name)).collect();

    for start in class_names {
        if visited.contains(&start) {
            continue;
        }
        let mut stack: Vec<Rc<str>> = Vec::new();
        let mut on_stack: AHashSet<Rc<str>> = AHashSet::new();
        let mut current = Some(start);
        while let Some(name) = current {
            if visited.contains(&name) {
                break;
            }
            if on_stack.contains(&name) {
                report_cycle(table, &stack, &name, bag);
                return;
            }
            on_stack.insert(Rc::clone(&name));
            stack.push(Rc::clone(&name));
            current = table
                .get(&name)
                .and_then(|c| c.parent_name.clone());
        }
        visited.extend(stack);
    }
}

fn report_cycle(table: &SymbolTable, stack: &[Rc<str>], repeated: &Rc<str>, bag: &mut DiagnosticBag) {
    let from = stack
        .iter()
        .position(|name| name == repeated)
        .unwrap_or(0);
    let mut chain: Vec<&str> = stack[from..].iter().map(|name| &**name).collect();
    chain.push(repeated);
    let position = table
        .get(repeated)
        .map_or_else(Position::none, |c| c.position.clone());
    bag.push(Diagnostic::error(
        DiagnosticCode::InheritanceCycle,
        position,
        format!("inheritance cycle detected: {}", chain.join(" -> ")),
    ));
}
