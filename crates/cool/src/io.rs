//! Output sinks and input sources for the `IO` built-ins.
//!
//! The running interpreter owns both exclusively for the duration of one
//! `run` call. Output is a UTF-8 stream; input is line-oriented, each read
//! consuming up to one `\n`.

use std::{
    collections::VecDeque,
    io::{self, BufRead as _, Write as _},
};

/// Destination for everything `out_string`/`out_int` (and `abort`) write.
pub trait OutputSink {
    fn write_str(&mut self, s: &str);
}

/// Writes directly to the process stdout.
#[derive(Debug, Default)]
pub struct StdOutput;

impl OutputSink for StdOutput {
    fn write_str(&mut self, s: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(s.as_bytes());
        let _ = stdout.flush();
    }
}

/// Collects all output into a string; used by the façade and by tests.
#[derive(Debug, Default)]
pub struct CollectStringOutput(String);

impl CollectStringOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl OutputSink for CollectStringOutput {
    fn write_str(&mut self, s: &str) {
        self.0.push_str(s);
    }
}

/// Discards all output.
#[derive(Debug, Default)]
pub struct NoOutput;

impl OutputSink for NoOutput {
    fn write_str(&mut self, _s: &str) {}
}

/// Source for `in_string`/`in_int`. One call reads one line, consuming the
/// terminating `\n`; None signals end of input.
pub trait InputSource {
    fn read_line(&mut self) -> Option<String>;
}

/// Reads lines from the process stdin.
#[derive(Debug, Default)]
pub struct StdInput;

impl InputSource for StdInput {
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                }
                Some(line)
            }
        }
    }
}

/// Serves a preset sequence of lines; used by tests and embedding hosts.
#[derive(Debug, Default)]
pub struct LinesInput {
    lines: VecDeque<String>,
}

impl LinesInput {
    #[must_use]
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl InputSource for LinesInput {
    fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

/// Always at end of input.
#[derive(Debug, Default)]
pub struct EmptyInput;

impl InputSource for EmptyInput {
    fn read_line(&mut self) -> Option<String> {
        None
    }
}
