//! The stack compressor (spec.md §4.4): a feedback pass invoked
//! outside the recipe driver. For each top-level function it estimates
//! a conservative stack-depth upper bound; while any function exceeds
//! the dialect's limit, it rematerializes the locally-declared
//! variable with the greatest live extent across that function
//! (reusing `expr_form::rematerialize_named`) and re-estimates, up to
//! a caller-supplied iteration cap.
//!
//! The depth estimate flattens all control flow into one sequential
//! position counter rather than modeling branches, so it over-counts
//! overlap between mutually exclusive arms — a conservative bound, not
//! an exact one, which is exactly what spec.md §4.4 asks for.

use crate::ast::{Block, Expression, Identifier, Statement};
use crate::ast_utils::equality::syntactically_equal_block;
use crate::dialect::Dialect;
use crate::error::OptimizerError;
use crate::passes::expr_form::rematerialize_named;
use std::collections::{HashMap, HashSet};

pub struct StackCompressor;

impl StackCompressor {
    /// Returns whether every function fits within the dialect's stack
    /// limit once this returns. A dialect that is not stack-like, or
    /// declares no limit, always fits trivially.
    pub fn compress(
        block: &mut Block,
        dialect: &dyn Dialect,
        max_iterations: usize,
    ) -> Result<bool, OptimizerError> {
        let Some(limit) = (dialect.is_stack_like().then(|| dialect.stack_limit()).flatten()) else {
            return Ok(true);
        };

        for iteration in 0..max_iterations {
            tracing::debug!(iteration, "stack compressor pass");
            let mut all_fit = true;
            let mut any_progress = false;
            let statements = std::mem::take(&mut block.statements);
            let mut rebuilt = Vec::with_capacity(statements.len());
            for stmt in statements {
                rebuilt.push(match stmt {
                    Statement::FunctionDefinition { name, parameters, returns, body, location }
                        if estimate_stack_depth(&body) > limit as usize =>
                    {
                        all_fit = false;
                        let (body, progressed) = relieve_one_function(body, dialect, limit as usize);
                        any_progress |= progressed;
                        Statement::FunctionDefinition { name, parameters, returns, body, location }
                    }
                    other => other,
                });
            }
            block.statements = rebuilt;
            if all_fit {
                return Ok(true);
            }
            if !any_progress {
                break;
            }
        }
        tracing::warn!("stack compressor iteration cap reached without every function fitting");
        Ok(false)
    }
}

/// Tries each locally-declared variable, ranked by live-extent length
/// descending, until one rematerialization actually changes the body;
/// reports whether it found one.
fn relieve_one_function(body: Block, dialect: &dyn Dialect, limit: usize) -> (Block, bool) {
    let _ = limit;
    let mut candidates = rank_candidates(&body);
    candidates.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, _extent) in candidates {
        let rewritten = rematerialize_named(body.clone(), dialect, &name);
        if !syntactically_equal_block(&rewritten, &body) {
            return (rewritten, true);
        }
    }
    (body, false)
}

fn rank_candidates(body: &Block) -> Vec<(Identifier, usize)> {
    let mut extents: HashMap<Identifier, (usize, usize)> = HashMap::new();
    let mut pos = 0usize;
    walk_for_extents(body, &mut pos, &mut extents);
    extents
        .into_iter()
        .map(|(name, (start, end))| (name, end - start))
        .collect()
}

fn estimate_stack_depth(body: &Block) -> usize {
    let mut extents: HashMap<Identifier, (usize, usize)> = HashMap::new();
    let mut pos = 0usize;
    walk_for_extents(body, &mut pos, &mut extents);
    max_overlap(&extents)
}

fn walk_for_extents(block: &Block, pos: &mut usize, extents: &mut HashMap<Identifier, (usize, usize)>) {
    for stmt in &block.statements {
        *pos += 1;
        let here = *pos;
        for read in direct_read_vars(stmt) {
            extents.entry(read).and_modify(|e| e.1 = e.1.max(here)).or_insert((here, here));
        }
        if let Statement::VariableDeclaration { targets, .. } = stmt {
            for t in targets {
                extents.entry(t.clone()).and_modify(|e| e.1 = e.1.max(here)).or_insert((here, here));
            }
        }
        match stmt {
            Statement::If { body, .. } => walk_for_extents(body, pos, extents),
            Statement::Switch { cases, .. } => {
                for c in cases {
                    walk_for_extents(c.body(), pos, extents);
                }
            }
            Statement::ForLoop { init, post, body, .. } => {
                walk_for_extents(init, pos, extents);
                walk_for_extents(post, pos, extents);
                walk_for_extents(body, pos, extents);
            }
            Statement::Block(b) => walk_for_extents(b, pos, extents),
            _ => {}
        }
    }
}

fn direct_read_vars(stmt: &Statement) -> HashSet<Identifier> {
    let mut out = HashSet::new();
    match stmt {
        Statement::ExpressionStatement(e) => free_vars_in_expr(e, &mut out),
        Statement::Assignment { value, .. } => free_vars_in_expr(value, &mut out),
        Statement::VariableDeclaration { value: Some(v), .. } => free_vars_in_expr(v, &mut out),
        Statement::If { cond, .. } => free_vars_in_expr(cond, &mut out),
        Statement::Switch { cond, .. } => free_vars_in_expr(cond, &mut out),
        Statement::ForLoop { cond, .. } => free_vars_in_expr(cond, &mut out),
        _ => {}
    }
    out
}

fn free_vars_in_expr(expr: &Expression, out: &mut HashSet<Identifier>) {
    match expr {
        Expression::Literal { .. } => {}
        Expression::Identifier { name, .. } => {
            out.insert(name.clone());
        }
        Expression::FunctionCall { args, .. } => {
            for a in args {
                free_vars_in_expr(a, out);
            }
        }
    }
}

fn max_overlap(extents: &HashMap<Identifier, (usize, usize)>) -> usize {
    let mut events: Vec<(usize, i64)> = Vec::with_capacity(extents.len() * 2);
    for (start, end) in extents.values() {
        events.push((*start, 1));
        events.push((*end + 1, -1));
    }
    events.sort_by_key(|(pos, _)| *pos);
    let mut depth = 0i64;
    let mut max_depth = 0i64;
    for (_, delta) in events {
        depth += delta;
        max_depth = max_depth.max(depth);
    }
    max_depth.max(0) as usize
}
