//! Execution limits.
//!
//! The evaluator is a synchronous recursive procedure; the only resource it
//! meters is call depth, so runaway user recursion is diagnosed instead of
//! exhausting the host stack. Programs with call chains at least 200 deep
//! must run to completion under the default limit.

/// Default bound on the Cool call depth.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

/// Limits applied to one `run` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    pub max_recursion_depth: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}
