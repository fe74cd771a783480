//! The recipe interpreter (spec.md §4.5): parses a compact textual
//! program of single-character pass abbreviations, with at most one
//! level of parenthesized fixed-point grouping, and runs it against a
//! block.
//!
//! Parsing is fully validated up front — unknown abbreviation, nested
//! parentheses, unbalanced parentheses — before any pass runs, so a bad
//! recipe never leaves a partially-optimized block behind.

use crate::ast::Block;
use crate::ast_utils::copier::ASTCopier;
use crate::ast_utils::equality::syntactically_equal_block;
use crate::ast_utils::size::code_size;
use crate::error::OptimizerError;
use crate::passes::registry::catalog;
use crate::passes::Context;
use serde::{Deserialize, Serialize};

/// How much the driver narrates as it runs a recipe. Must never change
/// the resulting block, only what gets logged.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebugMode {
    #[default]
    None,
    PrintStep,
    PrintChanges,
}

/// A recipe compiled into its executable shape: a flat sequence of
/// single steps and fixed-point loops, in the order they run.
#[derive(Debug, Clone)]
pub struct Recipe {
    steps: Vec<Step>,
}

#[derive(Debug, Clone)]
enum Step {
    Single(char),
    Loop(Vec<char>),
}

/// Default cap on iterations of a recipe's parenthesized fixed-point
/// loop, used when a caller doesn't supply one of their own.
pub const DEFAULT_LOOP_MAX_ITERATIONS: usize = 100;

impl Recipe {
    /// Parses and validates `text`, rejecting an unknown abbreviation,
    /// nested parentheses, or an unbalanced paren before returning.
    /// Whitespace is ignored.
    pub fn parse(text: &str) -> Result<Recipe, OptimizerError> {
        let mut steps = Vec::new();
        let mut current_loop: Option<Vec<char>> = None;

        for c in text.chars() {
            if c.is_whitespace() {
                continue;
            }
            match c {
                '(' => {
                    if current_loop.is_some() {
                        return Err(OptimizerError::Configuration {
                            message: "nested parentheses are not allowed in a recipe".to_string(),
                            offending_char: Some(c),
                        });
                    }
                    current_loop = Some(Vec::new());
                }
                ')' => {
                    let Some(loop_body) = current_loop.take() else {
                        return Err(OptimizerError::Configuration {
                            message: "unbalanced ')' with no matching '('".to_string(),
                            offending_char: Some(c),
                        });
                    };
                    steps.push(Step::Loop(loop_body));
                }
                abbrev => {
                    if catalog().by_abbreviation(abbrev).is_none() {
                        return Err(OptimizerError::Configuration {
                            message: format!("unknown pass abbreviation '{abbrev}'"),
                            offending_char: Some(abbrev),
                        });
                    }
                    match &mut current_loop {
                        Some(body) => body.push(abbrev),
                        None => steps.push(Step::Single(abbrev)),
                    }
                }
            }
        }

        if current_loop.is_some() {
            return Err(OptimizerError::Configuration {
                message: "unbalanced '(' with no matching ')'".to_string(),
                offending_char: Some('('),
            });
        }

        Ok(Recipe { steps })
    }

    /// Runs the compiled recipe once against `block`, applying each
    /// parenthesized group as a fixed-point loop capped at
    /// `loop_max_iterations`.
    pub fn run(
        &self,
        ctx: &mut Context,
        mut block: Block,
        loop_max_iterations: usize,
        debug_mode: DebugMode,
    ) -> Result<Block, OptimizerError> {
        for step in &self.steps {
            block = match step {
                Step::Single(abbrev) => run_step(*abbrev, ctx, block, debug_mode)?,
                Step::Loop(body) => run_sequence_until_stable(body, ctx, block, loop_max_iterations, debug_mode)?,
            };
        }
        Ok(block)
    }
}

/// Parses and runs `text` in one call — the shape `suite::optimize`
/// uses for both the default and tail recipes.
pub fn run_recipe(
    text: &str,
    ctx: &mut Context,
    block: Block,
    loop_max_iterations: usize,
    debug_mode: DebugMode,
) -> Result<Block, OptimizerError> {
    Recipe::parse(text)?.run(ctx, block, loop_max_iterations, debug_mode)
}

/// Runs a flat sequence of abbreviations once, in order, with no
/// fixed-point looping. Exposed for callers wiring custom pipelines
/// around the catalog directly rather than through a parsed `Recipe`.
pub fn run_sequence(steps: &[char], ctx: &mut Context, mut block: Block, debug_mode: DebugMode) -> Result<Block, OptimizerError> {
    for &abbrev in steps {
        block = run_step(abbrev, ctx, block, debug_mode)?;
    }
    Ok(block)
}

/// Runs `steps` repeatedly until the code-size metric stops shrinking
/// or `max_rounds` is reached.
pub fn run_sequence_until_stable(
    steps: &[char],
    ctx: &mut Context,
    mut block: Block,
    max_rounds: usize,
    debug_mode: DebugMode,
) -> Result<Block, OptimizerError> {
    let mut code_size_seen = 0;
    for round in 0..max_rounds {
        let new_size = code_size(&block);
        if new_size == code_size_seen {
            tracing::debug!(round, size = new_size, "recipe loop reached a fixed point");
            break;
        }
        code_size_seen = new_size;
        block = run_sequence(steps, ctx, block, debug_mode)?;
    }
    Ok(block)
}

fn run_step(abbrev: char, ctx: &mut Context, block: Block, debug_mode: DebugMode) -> Result<Block, OptimizerError> {
    let pass = catalog()
        .by_abbreviation(abbrev)
        .expect("validated during Recipe::parse");

    match debug_mode {
        DebugMode::None => pass.run(ctx, block),
        DebugMode::PrintStep => {
            tracing::debug!(pass = pass.name(), "running step");
            pass.run(ctx, block)
        }
        DebugMode::PrintChanges => {
            let before = ASTCopier::copy_block(&block);
            let after = pass.run(ctx, block)?;
            if syntactically_equal_block(&before, &after) {
                tracing::debug!(pass = pass.name(), "no change");
            } else {
                tracing::debug!(pass = pass.name(), "changed");
            }
            Ok(after)
        }
    }
}
