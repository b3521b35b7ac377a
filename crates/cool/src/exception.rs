//! Runtime faults as a single unwind mechanism.
//!
//! Every runtime error is a [`RunError`] threaded through [`RunResult`] with
//! `?`. It unwinds the recursive evaluation, is caught exactly once by the
//! façade, and becomes one diagnostic in the output bag.

use std::fmt;

use crate::diagnostics::{Diagnostic, DiagnosticCode, Position, Severity};

/// Result type alias for operations that can produce a runtime fault.
pub type RunResult<T> = Result<T, RunError>;

/// A run-terminating fault: its 03xx diagnostic code, a rendered message,
/// and the source position when one is known.
#[derive(Debug, Clone, PartialEq)]
pub struct RunError {
    pub code: DiagnosticCode,
    pub message: String,
    pub position: Option<Position>,
}

impl RunError {
    pub(crate) fn new(code: DiagnosticCode, message: impl Into<String>, position: Option<Position>) -> Self {
        Self {
            code,
            message: message.into(),
            position,
        }
    }

    pub(crate) fn division_by_zero(position: &Position) -> Self {
        Self::new(DiagnosticCode::DivisionByZero, "division by zero", Some(position.clone()))
    }

    pub(crate) fn substr_out_of_range(message: String, position: &Position) -> Self {
        Self::new(DiagnosticCode::SubstrOutOfRange, message, Some(position.clone()))
    }

    pub(crate) fn abort_called(class_name: &str) -> Self {
        Self::new(
            DiagnosticCode::AbortCalled,
            format!("abort called from class {class_name}"),
            None,
        )
    }

    pub(crate) fn dispatch_on_void(method: &str, position: &Position) -> Self {
        Self::new(
            DiagnosticCode::DispatchOnVoid,
            format!("dispatch of method {method} on void"),
            Some(position.clone()),
        )
    }

    pub(crate) fn case_on_void(position: &Position) -> Self {
        Self::new(DiagnosticCode::CaseOnVoid, "case on void", Some(position.clone()))
    }

    pub(crate) fn case_unmatched(class_name: &str, position: &Position) -> Self {
        Self::new(
            DiagnosticCode::CaseNoBranchMatches,
            format!("no case branch matches a value of class {class_name}"),
            Some(position.clone()),
        )
    }

    pub(crate) fn runtime(message: impl Into<String>, position: &Position) -> Self {
        Self::new(DiagnosticCode::RuntimeError, message, Some(position.clone()))
    }

    /// A fault the type checker should have made impossible.
    pub(crate) fn internal(message: impl Into<String>, position: &Position) -> Self {
        Self::new(DiagnosticCode::InternalInterpreterError, message, Some(position.clone()))
    }

    /// Converts the fault into the single diagnostic the façade reports.
    #[must_use]
    pub fn into_diagnostic(self) -> Diagnostic {
        let severity = if self.code == DiagnosticCode::InternalInterpreterError {
            Severity::Internal
        } else {
            Severity::Error
        };
        Diagnostic::new(severity, self.code, self.position.unwrap_or_default(), self.message)
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RunError {}
