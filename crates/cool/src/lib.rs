//! A tree-walking interpreter for the Cool classroom language.
//!
//! The pipeline is parse → analyze → evaluate. [`Interpreter::new`] runs the
//! front half and returns diagnostics on failure; [`Interpreter::run`]
//! instantiates `Main` and dispatches `main()`. [`interpret`] does the whole
//! trip in one call, capturing program output.

mod analyze;
mod ast;
mod builtins;
mod diagnostics;
mod env;
mod eval;
mod exception;
mod io;
mod lexer;
mod parser;
mod resource;
mod run;
mod symbols;
mod value;

pub use crate::{
    diagnostics::{Diagnostic, DiagnosticBag, DiagnosticCode, Position, Severity},
    exception::{RunError, RunResult},
    io::{CollectStringOutput, EmptyInput, InputSource, LinesInput, NoOutput, OutputSink, StdInput, StdOutput},
    resource::{DEFAULT_MAX_RECURSION_DEPTH, ResourceLimits},
    run::{Interpreter, RunOutcome, interpret},
    symbols::SymbolTable,
    value::{Instance, Value, WrongValueKind},
};
