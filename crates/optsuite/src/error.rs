//! Error kinds for the optimizer suite (spec.md §7).
//!
//! Mirrors `crates/compiler/src/codegen/error.rs`'s hand-rolled
//! `Display` + `std::error::Error` style rather than pulling in
//! `thiserror`/`anyhow` — neither appears anywhere in the workspace.

use std::fmt;

/// A configuration error, precondition violation, or analyzer
/// rejection, per spec.md §7.
#[derive(Debug)]
pub enum OptimizerError {
    /// An invalid recipe: unknown abbreviation, unbalanced or nested
    /// parentheses. Recoverable; names the offending character when one
    /// is implicated.
    Configuration {
        message: String,
        offending_char: Option<char>,
    },
    /// A pass's declared precondition was not met by its input — a
    /// driver/programming bug, not a recoverable condition. Debug builds
    /// additionally trip a `debug_assert!` before this variant is
    /// constructed (see `passes::context::Context::require`).
    PreconditionViolation {
        pass: &'static str,
        invariant: &'static str,
    },
    /// The external `Analyzer::analyze` rejected the optimized object;
    /// `diagnostics` carries its message verbatim.
    AnalyzerRejection { diagnostics: String },
}

impl fmt::Display for OptimizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerError::Configuration {
                message,
                offending_char,
            } => match offending_char {
                Some(c) => write!(f, "invalid recipe: {message} (at '{c}')"),
                None => write!(f, "invalid recipe: {message}"),
            },
            OptimizerError::PreconditionViolation { pass, invariant } => write!(
                f,
                "precondition violated before running pass '{pass}': {invariant}"
            ),
            OptimizerError::AnalyzerRejection { diagnostics } => {
                write!(f, "re-analysis after optimization failed: {diagnostics}")
            }
        }
    }
}

impl std::error::Error for OptimizerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_offending_char() {
        let err = OptimizerError::Configuration {
            message: "unknown abbreviation".to_string(),
            offending_char: Some('Z'),
        };
        assert!(err.to_string().contains('Z'));
    }

    #[test]
    fn precondition_violation_names_pass_and_invariant() {
        let err = OptimizerError::PreconditionViolation {
            pass: "FullInliner",
            invariant: "unique names",
        };
        let s = err.to_string();
        assert!(s.contains("FullInliner"));
        assert!(s.contains("unique names"));
    }
}
