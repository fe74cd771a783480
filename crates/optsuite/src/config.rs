//! Suite tuning knobs (`SPEC_FULL.md` §4), builder-style the way
//! `crates/compiler/src/config.rs`'s `CompilerConfig` is, with a serde
//! derive so an embedder can load these from the same `toml` files the
//! teacher's lint configuration uses.

use crate::recipe::{DebugMode, DEFAULT_LOOP_MAX_ITERATIONS};
use serde::{Deserialize, Serialize};

/// Default cap on `stack_compressor`'s outer iteration loop (spec.md
/// §4.4).
pub const DEFAULT_STACK_COMPRESSOR_MAX_ITERATIONS: usize = 16;

/// Tuning for a single `suite::optimize` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeOptions {
    /// Whether to run the stack-compressor feedback loop at all
    /// (spec.md §4.6 step 5's `optimizeStackAllocation` flag).
    pub optimize_stack_allocation: bool,

    /// Cap on `stack_compressor::compress`'s outer loop.
    pub stack_compressor_max_iterations: usize,

    /// Cap on a recipe's parenthesized fixed-point loop.
    pub recipe_loop_max_iterations: usize,

    /// How much the recipe driver narrates as it runs; never changes
    /// the resulting AST.
    pub debug_mode: DebugMode,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        OptimizeOptions {
            optimize_stack_allocation: true,
            stack_compressor_max_iterations: DEFAULT_STACK_COMPRESSOR_MAX_ITERATIONS,
            recipe_loop_max_iterations: DEFAULT_LOOP_MAX_ITERATIONS,
            debug_mode: DebugMode::None,
        }
    }
}

impl OptimizeOptions {
    pub fn new() -> Self {
        OptimizeOptions::default()
    }

    pub fn with_optimize_stack_allocation(mut self, enabled: bool) -> Self {
        self.optimize_stack_allocation = enabled;
        self
    }

    pub fn with_stack_compressor_max_iterations(mut self, max_iterations: usize) -> Self {
        self.stack_compressor_max_iterations = max_iterations;
        self
    }

    pub fn with_recipe_loop_max_iterations(mut self, max_iterations: usize) -> Self {
        self.recipe_loop_max_iterations = max_iterations;
        self
    }

    pub fn with_debug_mode(mut self, debug_mode: DebugMode) -> Self {
        self.debug_mode = debug_mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let opts = OptimizeOptions::new();
        assert!(opts.optimize_stack_allocation);
        assert_eq!(opts.stack_compressor_max_iterations, 16);
        assert_eq!(opts.debug_mode, DebugMode::None);
    }

    #[test]
    fn builder_overrides_defaults() {
        let opts = OptimizeOptions::new()
            .with_optimize_stack_allocation(false)
            .with_stack_compressor_max_iterations(4)
            .with_debug_mode(DebugMode::PrintStep);
        assert!(!opts.optimize_stack_allocation);
        assert_eq!(opts.stack_compressor_max_iterations, 4);
        assert_eq!(opts.debug_mode, DebugMode::PrintStep);
    }

    #[test]
    fn round_trips_through_json() {
        let opts = OptimizeOptions::new().with_stack_compressor_max_iterations(8);
        let json = serde_json::to_string(&opts).unwrap();
        let back: OptimizeOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(opts, back);
    }
}
