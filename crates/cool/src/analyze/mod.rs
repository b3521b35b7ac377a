//! Semantic analysis: class registration, inheritance validation, and type
//! checking.
//!
//! Analysis runs in two phases and halts between them on error: phase 1
//! (`hierarchy`) registers classes and validates the inheritance graph,
//! phase 2 (`typecheck`) checks every feature and expression. Both phases
//! accumulate into the caller's [`DiagnosticBag`] rather than stopping at the
//! first failure within the phase.

mod hierarchy;
mod typecheck;
mod types;

use crate::{ast::Program, diagnostics::DiagnosticBag, symbols::SymbolTable};

/// Analyzes a program, producing a populated symbol table on success.
///
/// On failure the table is withheld and the bag carries the accumulated
/// errors. Analysis is pure: the same program always yields the same
/// diagnostics and the same table.
pub(crate) fn analyze(program: &Program, bag: &mut DiagnosticBag) -> Option<SymbolTable> {
    let mut table = SymbolTable::with_builtins();
    hierarchy::run(program, &mut table, bag);
    if bag.has_errors() {
        return None;
    }
    typecheck::run(&table, bag);
    if bag.has_errors() {
        return None;
    }
    Some(table)
}
