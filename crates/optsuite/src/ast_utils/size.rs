//! A purely structural code-size metric (spec.md §4.2 CodeSize), used
//! by fixed-point termination (`recipe::run_sequence_until_stable`) and
//! the inliner's cost model.

use crate::ast::{Block, Expression, Statement, SwitchCase};

pub fn code_size_expr(expr: &Expression) -> usize {
    match expr {
        Expression::Literal { .. } | Expression::Identifier { .. } => 1,
        Expression::FunctionCall { args, .. } => {
            1 + args.iter().map(code_size_expr).sum::<usize>()
        }
    }
}

pub fn code_size_stmt(stmt: &Statement) -> usize {
    match stmt {
        Statement::ExpressionStatement(e) => code_size_expr(e),
        Statement::Assignment { targets, value, .. } => targets.len() + code_size_expr(value),
        Statement::VariableDeclaration { targets, value, .. } => {
            targets.len() + value.as_ref().map(code_size_expr).unwrap_or(0)
        }
        Statement::If { cond, body, .. } => 1 + code_size_expr(cond) + code_size(body),
        Statement::Switch { cond, cases, .. } => {
            1 + code_size_expr(cond)
                + cases
                    .iter()
                    .map(|c| {
                        let lit_size = match c {
                            SwitchCase::Case(lit, _) => code_size_expr(lit),
                            SwitchCase::Default(_) => 0,
                        };
                        lit_size + code_size(c.body())
                    })
                    .sum::<usize>()
        }
        Statement::ForLoop { init, cond, post, body, .. } => {
            1 + code_size(init) + code_size_expr(cond) + code_size(post) + code_size(body)
        }
        Statement::Break(_) | Statement::Continue(_) | Statement::Leave(_) => 1,
        Statement::FunctionDefinition { parameters, returns, body, .. } => {
            1 + parameters.len() + returns.len() + code_size(body)
        }
        Statement::Block(b) => code_size(b),
    }
}

pub fn code_size(block: &Block) -> usize {
    block.statements.iter().map(code_size_stmt).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Identifier;

    #[test]
    fn empty_block_has_zero_size() {
        assert_eq!(code_size(&Block::empty()), 0);
    }

    #[test]
    fn nested_calls_count_every_node() {
        let expr = Expression::call(
            "add",
            vec![Expression::number_literal("1"), Expression::number_literal("2")],
        );
        // call + two literals = 3
        assert_eq!(code_size_expr(&expr), 3);
    }

    #[test]
    fn for_loop_sums_all_components() {
        let stmt = Statement::ForLoop {
            init: Block::new(vec![Statement::VariableDeclaration {
                targets: vec![Identifier::new("i")],
                value: Some(Expression::number_literal("0")),
                location: Default::default(),
            }]),
            cond: Expression::number_literal("1"),
            post: Block::empty(),
            body: Block::empty(),
            location: Default::default(),
        };
        assert!(code_size_stmt(&stmt) > 1);
    }
}
