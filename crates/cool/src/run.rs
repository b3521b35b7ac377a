//! Public interface for interpreting Cool programs.

use crate::{
    analyze,
    diagnostics::DiagnosticBag,
    eval::Machine,
    exception::{RunError, RunResult},
    io::{CollectStringOutput, InputSource, OutputSink},
    parser,
    resource::ResourceLimits,
    symbols::SymbolTable,
    value::Value,
};

/// A parsed and analyzed program, ready to run any number of times.
///
/// # Example
/// ```
/// use cool::{EmptyInput, Interpreter, CollectStringOutput, Value};
///
/// let interpreter = Interpreter::new("class Main { main(): Int { 20 + 22 }; };", "answer.cl").unwrap();
/// let mut output = CollectStringOutput::new();
/// let value = interpreter.run(&mut EmptyInput, &mut output).unwrap();
/// assert!(matches!(value, Value::Int(42)));
/// ```
#[derive(Debug, Clone)]
pub struct Interpreter {
    symbols: SymbolTable,
    limits: ResourceLimits,
}

impl Interpreter {
    /// Parses and analyzes `source`.
    ///
    /// # Errors
    /// Returns the diagnostic bag when parsing fails (00xx codes) or when
    /// semantic analysis fails (01xx/02xx codes). Parse failures abort the
    /// pipeline before analysis.
    pub fn new(source: &str, filename: &str) -> Result<Self, DiagnosticBag> {
        let mut bag = DiagnosticBag::new();
        let program = match parser::parse(source, filename) {
            Ok(program) => program,
            Err(error) => {
                bag.push(error.into_diagnostic());
                return Err(bag);
            }
        };
        match analyze::analyze(&program, &mut bag) {
            Some(symbols) => Ok(Self {
                symbols,
                limits: ResourceLimits::default(),
            }),
            None => Err(bag),
        }
    }

    /// Replaces the default execution limits.
    #[must_use]
    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The populated symbol table (inheritance queries, lub, conformance).
    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Instantiates `Main` and dispatches `main()` on it.
    ///
    /// The input source and output sink are owned exclusively by this call
    /// for its duration. Output written before a fault stays in the sink.
    pub fn run(&self, input: &mut dyn InputSource, output: &mut dyn OutputSink) -> RunResult<Value> {
        let mut machine = Machine::new(&self.symbols, input, output, self.limits);
        machine.run_main()
    }
}

/// The result of one end-to-end interpretation.
#[derive(Debug)]
pub struct RunOutcome {
    /// The value returned by `Main.main()`; None when the run failed.
    pub value: Option<Value>,
    /// Everything the program wrote, up to the point of failure if any.
    pub output: String,
    /// Parse, semantic, and runtime diagnostics, in order of occurrence.
    pub diagnostics: DiagnosticBag,
}

impl RunOutcome {
    /// True when no error-severity diagnostic was produced.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        !self.diagnostics.has_errors()
    }
}

/// Convenience entry point: parse, analyze, and evaluate in one call,
/// capturing output into the returned [`RunOutcome`].
pub fn interpret(source: &str, filename: &str, input: &mut dyn InputSource) -> RunOutcome {
    let interpreter = match Interpreter::new(source, filename) {
        Ok(interpreter) => interpreter,
        Err(diagnostics) => {
            return RunOutcome {
                value: None,
                output: String::new(),
                diagnostics,
            };
        }
    };
    let mut output = CollectStringOutput::new();
    let mut diagnostics = DiagnosticBag::new();
    let value = match interpreter.run(input, &mut output) {
        Ok(value) => Some(value),
        Err(error) => {
            diagnostics.push(RunError::into_diagnostic(error));
            None
        }
    };
    RunOutcome {
        value,
        output: output.into_output(),
        diagnostics,
    }
}
