//! Structural equality modulo source locations (spec.md §4.2
//! SyntacticEquality), used by CSE, `EquivalentFunctionCombiner`, and
//! debug output.

use crate::ast::{Block, Expression, Statement, SwitchCase};

pub fn syntactically_equal_expr(a: &Expression, b: &Expression) -> bool {
    match (a, b) {
        (
            Expression::Literal { value: v1, kind: k1, .. },
            Expression::Literal { value: v2, kind: k2, .. },
        ) => v1 == v2 && k1 == k2,
        (Expression::Identifier { name: n1, .. }, Expression::Identifier { name: n2, .. }) => {
            n1 == n2
        }
        (
            Expression::FunctionCall { name: n1, args: a1, .. },
            Expression::FunctionCall { name: n2, args: a2, .. },
        ) => {
            n1 == n2
                && a1.len() == a2.len()
                && a1.iter().zip(a2.iter()).all(|(x, y)| syntactically_equal_expr(x, y))
        }
        _ => false,
    }
}

pub fn syntactically_equal_stmt(a: &Statement, b: &Statement) -> bool {
    match (a, b) {
        (Statement::ExpressionStatement(e1), Statement::ExpressionStatement(e2)) => {
            syntactically_equal_expr(e1, e2)
        }
        (
            Statement::Assignment { targets: t1, value: v1, .. },
            Statement::Assignment { targets: t2, value: v2, .. },
        ) => t1 == t2 && syntactically_equal_expr(v1, v2),
        (
            Statement::VariableDeclaration { targets: t1, value: v1, .. },
            Statement::VariableDeclaration { targets: t2, value: v2, .. },
        ) => {
            t1 == t2
                && match (v1, v2) {
                    (Some(x), Some(y)) => syntactically_equal_expr(x, y),
                    (None, None) => true,
                    _ => false,
                }
        }
        (
            Statement::If { cond: c1, body: b1, .. },
            Statement::If { cond: c2, body: b2, .. },
        ) => syntactically_equal_expr(c1, c2) && syntactically_equal_block(b1, b2),
        (
            Statement::Switch { cond: c1, cases: cs1, .. },
            Statement::Switch { cond: c2, cases: cs2, .. },
        ) => {
            syntactically_equal_expr(c1, c2)
                && cs1.len() == cs2.len()
                && cs1.iter().zip(cs2.iter()).all(|(x, y)| syntactically_equal_case(x, y))
        }
        (
            Statement::ForLoop { init: i1, cond: c1, post: p1, body: bd1, .. },
            Statement::ForLoop { init: i2, cond: c2, post: p2, body: bd2, .. },
        ) => {
            syntactically_equal_block(i1, i2)
                && syntactically_equal_expr(c1, c2)
                && syntactically_equal_block(p1, p2)
                && syntactically_equal_block(bd1, bd2)
        }
        (Statement::Break(_), Statement::Break(_)) => true,
        (Statement::Continue(_), Statement::Continue(_)) => true,
        (Statement::Leave(_), Statement::Leave(_)) => true,
        (
            Statement::FunctionDefinition {
                parameters: p1,
                returns: r1,
                body: b1,
                ..
            },
            Statement::FunctionDefinition {
                parameters: p2,
                returns: r2,
                body: b2,
                ..
            },
        ) => p1.len() == p2.len() && r1.len() == r2.len() && syntactically_equal_block(b1, b2),
        (Statement::Block(b1), Statement::Block(b2)) => syntactically_equal_block(b1, b2),
        _ => false,
    }
}

fn syntactically_equal_case(a: &SwitchCase, b: &SwitchCase) -> bool {
    match (a, b) {
        (SwitchCase::Case(l1, b1), SwitchCase::Case(l2, b2)) => {
            syntactically_equal_expr(l1, l2) && syntactically_equal_block(b1, b2)
        }
        (SwitchCase::Default(b1), SwitchCase::Default(b2)) => syntactically_equal_block(b1, b2),
        _ => false,
    }
}

pub fn syntactically_equal_block(a: &Block, b: &Block) -> bool {
    a.statements.len() == b.statements.len()
        && a.statements
            .iter()
            .zip(b.statements.iter())
            .all(|(x, y)| syntactically_equal_stmt(x, y))
}

/// Function-definition equality up to renaming of parameters and
/// return variables, used by `EquivalentFunctionCombiner` (spec.md
/// §4.3). Two functions are equivalent if their bodies are
/// syntactically equal after substituting each function's own
/// parameters/returns by positional placeholder names.
pub fn function_bodies_equal_modulo_renaming(a: &Statement, b: &Statement) -> bool {
    use crate::ast_utils::name_dispenser::canonicalize_function;
    match (a, b) {
        (
            Statement::FunctionDefinition { .. },
            Statement::FunctionDefinition { .. },
        ) => {
            let ca = canonicalize_function(a);
            let cb = canonicalize_function(b);
            match (&ca, &cb) {
                (
                    Statement::FunctionDefinition { body: b1, parameters: p1, returns: r1, .. },
                    Statement::FunctionDefinition { body: b2, parameters: p2, returns: r2, .. },
                ) => p1 == p2 && r1 == r2 && syntactically_equal_block(b1, b2),
                _ => unreachable!(),
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceLocation;

    #[test]
    fn locations_are_ignored() {
        let a = Expression::Literal {
            value: "1".into(),
            kind: crate::ast::LiteralKind::Number,
            location: SourceLocation::NONE,
        };
        let b = Expression::Literal {
            value: "1".into(),
            kind: crate::ast::LiteralKind::Number,
            location: SourceLocation {
                source_id: 1,
                start_offset: 2,
                end_offset: 3,
            },
        };
        assert!(syntactically_equal_expr(&a, &b));
    }

    #[test]
    fn different_calls_are_unequal() {
        let a = Expression::call("add", vec![Expression::number_literal("1")]);
        let b = Expression::call("sub", vec![Expression::number_literal("1")]);
        assert!(!syntactically_equal_expr(&a, &b));
    }
}
