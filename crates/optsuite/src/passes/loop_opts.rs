//! Loop optimization (spec.md §4.3 "Loop"): hoisting a loop body's
//! invariant leading computations into the loop's init block.

use crate::ast::{Block, Statement};
use crate::ast_utils::rewrite::rewrite_block_flat_map;
use crate::ast_utils::vars::{assigned_variables, free_variables};
use crate::dialect::Dialect;
use crate::error::OptimizerError;
use crate::passes::{Context, Pass};
use crate::semantics::movable;
use std::collections::HashSet;

pub struct LoopInvariantCodeMotion;

impl Pass for LoopInvariantCodeMotion {
    fn name(&self) -> &'static str {
        "LoopInvariantCodeMotion"
    }
    fn abbreviation(&self) -> char {
        'M'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        Ok(rewrite_block_flat_map(block, &mut |s| hoist_invariants(s, ctx.dialect)))
    }
}

/// Only a leading run of the body qualifies: hoisting must not skip
/// past a statement that could itself observe or change loop state,
/// so the candidate prefix stops at the first statement that fails
/// the invariance test.
fn hoist_invariants(stmt: Statement, dialect: &dyn Dialect) -> Vec<Statement> {
    let Statement::ForLoop { init, cond, post, body, location } = stmt else {
        return vec![stmt];
    };

    let mut assigned_in_loop = assigned_variables(&body);
    assigned_in_loop.extend(assigned_variables(&post));

    let mut hoisted = Vec::new();
    let mut remaining = Vec::new();
    let mut still_leading = true;
    for s in body.statements {
        if still_leading {
            if is_invariant(&s, &assigned_in_loop, dialect) {
                hoisted.push(s);
                continue;
            }
            still_leading = false;
        }
        remaining.push(s);
    }

    if hoisted.is_empty() {
        return vec![Statement::ForLoop { init, cond, post, body: Block::new(remaining), location }];
    }
    let mut new_init = init.statements;
    new_init.extend(hoisted);
    vec![Statement::ForLoop {
        init: Block::new(new_init),
        cond,
        post,
        body: Block::new(remaining),
        location,
    }]
}

fn is_invariant(stmt: &Statement, assigned_in_loop: &HashSet<crate::ast::Identifier>, dialect: &dyn Dialect) -> bool {
    let (targets, value) = match stmt {
        Statement::VariableDeclaration { targets, value: Some(value), .. } => (targets, value),
        Statement::Assignment { targets, value, .. } => (targets, value),
        _ => return false,
    };
    if targets.len() != 1 || !movable(dialect, value) {
        return false;
    }
    let refs = free_variables(&Block::new(vec![Statement::ExpressionStatement(value.clone())]));
    refs.is_disjoint(assigned_in_loop) && !refs.contains(&targets[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, Identifier, SourceLocation};
    use crate::ast_utils::NameDispenser;
    use crate::demo_dialect::DemoStackDialect;

    fn ctx<'a>(
        dialect: &'a DemoStackDialect,
        dispenser: &'a mut NameDispenser,
        reserved: &'a HashSet<Identifier>,
    ) -> Context<'a> {
        Context::new(dialect, dispenser, reserved)
    }

    #[test]
    fn hoists_leading_invariant_declaration() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let block = Block::new(vec![Statement::ForLoop {
            init: Block::empty(),
            cond: Expression::identifier("cond"),
            post: Block::empty(),
            body: Block::new(vec![
                Statement::VariableDeclaration {
                    targets: vec![Identifier::new("k")],
                    value: Some(Expression::call(
                        "add",
                        vec![Expression::identifier("a"), Expression::identifier("b")],
                    )),
                    location: SourceLocation::NONE,
                },
                Statement::Assignment {
                    targets: vec![Identifier::new("sum")],
                    value: Expression::call(
                        "add",
                        vec![Expression::identifier("sum"), Expression::identifier("k")],
                    ),
                    location: SourceLocation::NONE,
                },
            ]),
            location: SourceLocation::NONE,
        }]);
        let out = LoopInvariantCodeMotion
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block)
            .unwrap();
        match &out.statements[0] {
            Statement::ForLoop { init, body, .. } => {
                assert_eq!(init.statements.len(), 1);
                assert_eq!(body.statements.len(), 1);
            }
            _ => panic!("expected for loop"),
        }
    }

    #[test]
    fn hoists_leading_invariant_assignment_to_existing_variable() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let block = Block::new(vec![Statement::ForLoop {
            init: Block::new(vec![Statement::VariableDeclaration {
                targets: vec![Identifier::new("k")],
                value: Some(Expression::number_literal("0")),
                location: SourceLocation::NONE,
            }]),
            cond: Expression::identifier("cond"),
            post: Block::empty(),
            body: Block::new(vec![
                Statement::Assignment {
                    targets: vec![Identifier::new("k")],
                    value: Expression::call(
                        "add",
                        vec![Expression::identifier("a"), Expression::identifier("b")],
                    ),
                    location: SourceLocation::NONE,
                },
                Statement::Assignment {
                    targets: vec![Identifier::new("sum")],
                    value: Expression::call(
                        "add",
                        vec![Expression::identifier("sum"), Expression::identifier("k")],
                    ),
                    location: SourceLocation::NONE,
                },
            ]),
            location: SourceLocation::NONE,
        }]);
        let out = LoopInvariantCodeMotion
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block)
            .unwrap();
        match &out.statements[0] {
            Statement::ForLoop { init, body, .. } => {
                assert_eq!(init.statements.len(), 2);
                assert_eq!(body.statements.len(), 1);
            }
            _ => panic!("expected for loop"),
        }
    }

    #[test]
    fn does_not_hoist_declaration_depending_on_loop_variable() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let block = Block::new(vec![Statement::ForLoop {
            init: Block::empty(),
            cond: Expression::identifier("cond"),
            post: Block::new(vec![Statement::Assignment {
                targets: vec![Identifier::new("i")],
                value: Expression::call("add", vec![Expression::identifier("i"), Expression::number_literal("1")]),
                location: SourceLocation::NONE,
            }]),
            body: Block::new(vec![Statement::VariableDeclaration {
                targets: vec![Identifier::new("k")],
                value: Some(Expression::identifier("i")),
                location: SourceLocation::NONE,
            }]),
            location: SourceLocation::NONE,
        }]);
        let out = LoopInvariantCodeMotion
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block)
            .unwrap();
        match &out.statements[0] {
            Statement::ForLoop { init, body, .. } => {
                assert!(init.is_empty());
                assert_eq!(body.statements.len(), 1);
            }
            _ => panic!("expected for loop"),
        }
    }
}
