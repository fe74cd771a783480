//! Free-variable, assigned-variable, and declared-variable queries
//! (spec.md §4.2), used by `UnusedPruner`, `LoopInvariantCodeMotion`,
//! and `RedundantAssignEliminator`.

use crate::ast::{Block, Expression, Identifier, Statement, SwitchCase};
use std::collections::HashSet;

/// Every identifier read within `block` (read positions only — an
/// `Assignment`'s target is not itself a read of that name).
pub fn free_variables(block: &Block) -> HashSet<Identifier> {
    let mut out = HashSet::new();
    collect_free_vars_block(block, &mut out);
    out
}

fn collect_free_vars_expr(expr: &Expression, out: &mut HashSet<Identifier>) {
    match expr {
        Expression::Literal { .. } => {}
        Expression::Identifier { name, .. } => {
            out.insert(name.clone());
        }
        Expression::FunctionCall { args, .. } => {
            for a in args {
                collect_free_vars_expr(a, out);
            }
        }
    }
}

fn collect_free_vars_stmt(stmt: &Statement, out: &mut HashSet<Identifier>) {
    match stmt {
        Statement::ExpressionStatement(e) => collect_free_vars_expr(e, out),
        Statement::Assignment { value, .. } => collect_free_vars_expr(value, out),
        Statement::VariableDeclaration { value, .. } => {
            if let Some(v) = value {
                collect_free_vars_expr(v, out);
            }
        }
        Statement::If { cond, body, .. } => {
            collect_free_vars_expr(cond, out);
            collect_free_vars_block(body, out);
        }
        Statement::Switch { cond, cases, .. } => {
            collect_free_vars_expr(cond, out);
            for case in cases {
                if let SwitchCase::Case(lit, _) = case {
                    collect_free_vars_expr(lit, out);
                }
                collect_free_vars_block(case.body(), out);
            }
        }
        Statement::ForLoop { init, cond, post, body, .. } => {
            collect_free_vars_block(init, out);
            collect_free_vars_expr(cond, out);
            collect_free_vars_block(post, out);
            collect_free_vars_block(body, out);
        }
        Statement::Break(_) | Statement::Continue(_) | Statement::Leave(_) => {}
        Statement::FunctionDefinition { body, .. } => {
            // A nested function definition does not capture outer
            // locals (spec.md §3 invariant), so its body contributes
            // no free variables to the *enclosing* scope.
            let _ = body;
        }
        Statement::Block(b) => collect_free_vars_block(b, out),
    }
}

fn collect_free_vars_block(block: &Block, out: &mut HashSet<Identifier>) {
    for s in &block.statements {
        collect_free_vars_stmt(s, out);
    }
}

/// Every identifier that appears as an `Assignment` target anywhere
/// within `block` (not counting `VariableDeclaration`, which
/// introduces rather than reassigns a name).
pub fn assigned_variables(block: &Block) -> HashSet<Identifier> {
    let mut out = HashSet::new();
    collect_assigned_block(block, &mut out);
    out
}

fn collect_assigned_block(block: &Block, out: &mut HashSet<Identifier>) {
    for s in &block.statements {
        collect_assigned_stmt(s, out);
    }
}

fn collect_assigned_stmt(stmt: &Statement, out: &mut HashSet<Identifier>) {
    match stmt {
        Statement::Assignment { targets, .. } => {
            out.extend(targets.iter().cloned());
        }
        Statement::If { body, .. } => collect_assigned_block(body, out),
        Statement::Switch { cases, .. } => {
            for case in cases {
                collect_assigned_block(case.body(), out);
            }
        }
        Statement::ForLoop { init, post, body, .. } => {
            collect_assigned_block(init, out);
            collect_assigned_block(post, out);
            collect_assigned_block(body, out);
        }
        Statement::Block(b) => collect_assigned_block(b, out),
        _ => {}
    }
}

/// Every name a `VariableDeclaration` or `FunctionDefinition`
/// introduces directly within `block` (not recursing into nested
/// control flow), used by the `Disambiguator`'s first scope-collecting
/// pass.
pub fn declared_variables(block: &Block) -> HashSet<Identifier> {
    let mut out = HashSet::new();
    for s in &block.statements {
        match s {
            Statement::VariableDeclaration { targets, .. } => out.extend(targets.iter().cloned()),
            Statement::FunctionDefinition { name, .. } => {
                out.insert(name.clone());
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_variables_ignore_assignment_targets() {
        let block = Block::new(vec![Statement::Assignment {
            targets: vec![Identifier::new("x")],
            value: Expression::identifier("y"),
            location: Default::default(),
        }]);
        let free = free_variables(&block);
        assert!(free.contains(&Identifier::new("y")));
        assert!(!free.contains(&Identifier::new("x")));
    }

    #[test]
    fn nested_function_does_not_leak_free_vars() {
        let block = Block::new(vec![Statement::FunctionDefinition {
            name: Identifier::new("f"),
            parameters: vec![],
            returns: vec![],
            body: Block::new(vec![Statement::ExpressionStatement(Expression::identifier(
                "outer",
            ))]),
            location: Default::default(),
        }]);
        assert!(free_variables(&block).is_empty());
    }

    #[test]
    fn assigned_variables_found_inside_loop_body() {
        let block = Block::new(vec![Statement::ForLoop {
            init: Block::empty(),
            cond: Expression::number_literal("1"),
            post: Block::empty(),
            body: Block::new(vec![Statement::Assignment {
                targets: vec![Identifier::new("i")],
                value: Expression::number_literal("1"),
                location: Default::default(),
            }]),
            location: Default::default(),
        }]);
        assert!(assigned_variables(&block).contains(&Identifier::new("i")));
    }
}
