//! Source positions and the diagnostic model shared by every pipeline stage.

use std::{fmt, rc::Rc};

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// A location in Cool source text.
///
/// Lines and columns are 1-based. The zero line is reserved for the "no
/// position" sentinel used by synthetic diagnostics (for example the missing
/// `Main` class error, which has no single source location).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Source label, usually a file name. None for synthetic positions.
    pub file: Option<Rc<str>>,
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[must_use]
    pub fn new(file: Option<Rc<str>>, line: u32, column: u32) -> Self {
        Self { file, line, column }
    }

    /// The sentinel position for diagnostics with no source location.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{file}({},{})", self.line, self.column),
            None => write!(f, "({},{})", self.line, self.column),
        }
    }
}

/// How serious a diagnostic is.
///
/// Only `Error` and `Internal` fail a run; `Warning` and `Info` are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Internal,
}

/// Stable diagnostic identifiers.
///
/// Rendered as `COOL` plus four digits, grouped by pipeline stage:
/// 00xx parsing, 01xx inheritance, 02xx typing, 03xx runtime. The numbers are
/// part of the public contract and must never be reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Serialize, Deserialize)]
pub enum DiagnosticCode {
    // 00xx - parsing
    SyntaxError,
    UnterminatedString,
    UnterminatedComment,
    InvalidToken,

    // 01xx - class registration and inheritance
    DuplicateClass,
    RedefineBuiltin,
    InheritFromPrimitive,
    MissingMain,
    UndefinedParent,
    InheritanceCycle,

    // 02xx - type checking
    TypeMismatchInAttributeInit,
    UndefinedVariable,
    AssignToWrongType,
    UndefinedType,
    InvalidUnaryOperation,
    InvalidBinaryOperation,
    IfPredicateNotBool,
    WhilePredicateNotBool,
    LetBindingTypeMismatch,
    StaticDispatchTypeError,
    UndefinedMethod,
    WrongNumberOfArguments,
    ArgumentTypeMismatch,
    OverrideMismatch,
    MethodBodyTypeMismatch,
    AssignToSelf,
    DuplicateAttribute,
    DuplicateMethod,
    DuplicateFormal,
    CaseBranchDuplicateType,
    SelfTypeMisused,

    // 03xx - runtime
    DivisionByZero,
    SubstrOutOfRange,
    AbortCalled,
    DispatchOnVoid,
    CaseOnVoid,
    CaseNoBranchMatches,
    InternalInterpreterError,
    RuntimeError,
}

impl DiagnosticCode {
    /// The stable `COOLnnnn` identifier for this code.
    #[must_use]
    pub fn as_code(self) -> &'static str {
        match self {
            Self::SyntaxError => "COOL0001",
            Self::UnterminatedString => "COOL0002",
            Self::UnterminatedComment => "COOL0003",
            Self::InvalidToken => "COOL0004",

            Self::DuplicateClass => "COOL0101",
            Self::RedefineBuiltin => "COOL0102",
            Self::InheritFromPrimitive => "COOL0103",
            Self::MissingMain => "COOL0104",
            Self::UndefinedParent => "COOL0105",
            Self::InheritanceCycle => "COOL0106",

            Self::TypeMismatchInAttributeInit => "COOL0201",
            Self::UndefinedVariable => "COOL0202",
            Self::AssignToWrongType => "COOL0203",
            Self::UndefinedType => "COOL0204",
            Self::InvalidUnaryOperation => "COOL0205",
            Self::InvalidBinaryOperation => "COOL0206",
            Self::IfPredicateNotBool => "COOL0207",
            Self::WhilePredicateNotBool => "COOL0208",
            Self::LetBindingTypeMismatch => "COOL0209",
            Self::StaticDispatchTypeError => "COOL0210",
            Self::UndefinedMethod => "COOL0211",
            Self::WrongNumberOfArguments => "COOL0212",
            Self::ArgumentTypeMismatch => "COOL0213",
            Self::OverrideMismatch => "COOL0214",
            Self::MethodBodyTypeMismatch => "COOL0215",
            Self::AssignToSelf => "COOL0216",
            Self::DuplicateAttribute => "COOL0217",
            Self::DuplicateMethod => "COOL0218",
            Self::DuplicateFormal => "COOL0219",
            Self::CaseBranchDuplicateType => "COOL0220",
            Self::SelfTypeMisused => "COOL0221",

            Self::DivisionByZero => "COOL0301",
            Self::SubstrOutOfRange => "COOL0302",
            Self::AbortCalled => "COOL0303",
            Self::DispatchOnVoid => "COOL0304",
            Self::CaseOnVoid => "COOL0305",
            Self::CaseNoBranchMatches => "COOL0306",
            Self::InternalInterpreterError => "COOL0307",
            Self::RuntimeError => "COOL0308",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// A single report from the parser, the analyzer, or the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub position: Position,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(severity: Severity, code: DiagnosticCode, position: Position, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            position,
            message: message.into(),
        }
    }

    /// Shorthand for an `Error` severity diagnostic.
    #[must_use]
    pub fn error(code: DiagnosticCode, position: Position, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, position, message)
    }

    /// Shorthand for an `Internal` severity diagnostic (implementation bugs).
    #[must_use]
    pub fn internal(code: DiagnosticCode, position: Position, message: impl Into<String>) -> Self {
        Self::new(Severity::Internal, code, position, message)
    }
}

/// Canonical rendering: `<file>(<line>,<col>): <severity> <code>: <message>`.
///
/// The position prefix is dropped for synthetic diagnostics.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.position.is_none() {
            write!(f, "{} {}: {}", self.severity, self.code, self.message)
        } else {
            write!(f, "{}: {} {}: {}", self.position, self.severity, self.code, self.message)
        }
    }
}

/// Append-only ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticBag {
    entries: Vec<Diagnostic>,
}

impl DiagnosticBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// True iff any entry would fail the run (`Error` or `Internal`).
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| matches!(d.severity, Severity::Error | Severity::Internal))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// First entry carrying the given code, if any.
    #[must_use]
    pub fn find(&self, code: DiagnosticCode) -> Option<&Diagnostic> {
        self.entries.iter().find(|d| d.code == code)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl fmt::Display for DiagnosticBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.entries {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_rendering() {
        let d = Diagnostic::error(
            DiagnosticCode::DivisionByZero,
            Position::new(Some("main.cl".into()), 3, 14),
            "division by zero",
        );
        assert_eq!(d.to_string(), "main.cl(3,14): error COOL0301: division by zero");
    }

    #[test]
    fn synthetic_rendering_has_no_position() {
        let d = Diagnostic::error(DiagnosticCode::MissingMain, Position::none(), "class Main is missing");
        assert_eq!(d.to_string(), "error COOL0104: class Main is missing");
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::new(
            Severity::Warning,
            DiagnosticCode::SyntaxError,
            Position::none(),
            "just a warning",
        ));
        assert!(!bag.has_errors());
        bag.push(Diagnostic::internal(
            DiagnosticCode::InternalInterpreterError,
            Position::none(),
            "bug",
        ));
        assert!(bag.has_errors());
    }
}
