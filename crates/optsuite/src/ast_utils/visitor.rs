//! Visitor skeletons parameterized by mutability (spec.md DESIGN NOTES).
//!
//! The source this crate is grounded on provides one base visitor
//! parameterized by constness; per spec.md's own advice this crate
//! instead exposes two small, composable traits and lets most passes
//! write their own exhaustive `match` over `Statement`/`Expression`
//! rather than route everything through a single mega-visitor. These
//! traits exist for passes that genuinely want a default "visit
//! everything, override a few cases" traversal (e.g. free-standing
//! read-only scans).

use crate::ast::{Block, Expression, Statement, SwitchCase};

/// A read-only visitor. Every method has a default no-op/recurse
/// implementation; override only the variants a given scan cares
/// about.
pub trait Visitor {
    fn visit_expression(&mut self, expr: &Expression) {
        walk_expression(self, expr);
    }

    fn visit_statement(&mut self, stmt: &Statement) {
        walk_statement(self, stmt);
    }

    fn visit_block(&mut self, block: &Block) {
        for s in &block.statements {
            self.visit_statement(s);
        }
    }
}

pub fn walk_expression<V: Visitor + ?Sized>(visitor: &mut V, expr: &Expression) {
    if let Expression::FunctionCall { args, .. } = expr {
        for a in args {
            visitor.visit_expression(a);
        }
    }
}

pub fn walk_statement<V: Visitor + ?Sized>(visitor: &mut V, stmt: &Statement) {
    match stmt {
        Statement::ExpressionStatement(e) => visitor.visit_expression(e),
        Statement::Assignment { value, .. } => visitor.visit_expression(value),
        Statement::VariableDeclaration { value, .. } => {
            if let Some(v) = value {
                visitor.visit_expression(v);
            }
        }
        Statement::If { cond, body, .. } => {
            visitor.visit_expression(cond);
            visitor.visit_block(body);
        }
        Statement::Switch { cond, cases, .. } => {
            visitor.visit_expression(cond);
            for case in cases {
                if let SwitchCase::Case(lit, _) = case {
                    visitor.visit_expression(lit);
                }
                visitor.visit_block(case.body());
            }
        }
        Statement::ForLoop { init, cond, post, body, .. } => {
            visitor.visit_block(init);
            visitor.visit_expression(cond);
            visitor.visit_block(post);
            visitor.visit_block(body);
        }
        Statement::Break(_) | Statement::Continue(_) | Statement::Leave(_) => {}
        Statement::FunctionDefinition { body, .. } => visitor.visit_block(body),
        Statement::Block(b) => visitor.visit_block(b),
    }
}

/// A rewriting visitor: each method takes ownership of the node and
/// returns its (possibly rewritten) replacement. The default
/// implementation rebuilds the node with its children rewritten,
/// unchanged otherwise.
pub trait MutVisitor {
    fn visit_expression(&mut self, expr: Expression) -> Expression {
        walk_expression_mut(self, expr)
    }

    fn visit_statement(&mut self, stmt: Statement) -> Statement {
        walk_statement_mut(self, stmt)
    }

    fn visit_block(&mut self, block: Block) -> Block {
        Block::new(
            block
                .statements
                .into_iter()
                .map(|s| self.visit_statement(s))
                .collect(),
        )
    }
}

pub fn walk_expression_mut<V: MutVisitor + ?Sized>(visitor: &mut V, expr: Expression) -> Expression {
    match expr {
        Expression::FunctionCall { name, args, location } => Expression::FunctionCall {
            name,
            args: args.into_iter().map(|a| visitor.visit_expression(a)).collect(),
            location,
        },
        other => other,
    }
}

pub fn walk_statement_mut<V: MutVisitor + ?Sized>(visitor: &mut V, stmt: Statement) -> Statement {
    match stmt {
        Statement::ExpressionStatement(e) => {
            Statement::ExpressionStatement(visitor.visit_expression(e))
        }
        Statement::Assignment { targets, value, location } => Statement::Assignment {
            targets,
            value: visitor.visit_expression(value),
            location,
        },
        Statement::VariableDeclaration { targets, value, location } => {
            Statement::VariableDeclaration {
                targets,
                value: value.map(|v| visitor.visit_expression(v)),
                location,
            }
        }
        Statement::If { cond, body, location } => Statement::If {
            cond: visitor.visit_expression(cond),
            body: visitor.visit_block(body),
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond: visitor.visit_expression(cond),
            cases: cases
                .into_iter()
                .map(|case| match case {
                    SwitchCase::Case(lit, body) => {
                        SwitchCase::Case(visitor.visit_expression(lit), visitor.visit_block(body))
                    }
                    SwitchCase::Default(body) => SwitchCase::Default(visitor.visit_block(body)),
                })
                .collect(),
            location,
        },
        Statement::ForLoop { init, cond, post, body, location } => Statement::ForLoop {
            init: visitor.visit_block(init),
            cond: visitor.visit_expression(cond),
            post: visitor.visit_block(post),
            body: visitor.visit_block(body),
            location,
        },
        Statement::Break(l) => Statement::Break(l),
        Statement::Continue(l) => Statement::Continue(l),
        Statement::Leave(l) => Statement::Leave(l),
        Statement::FunctionDefinition { name, parameters, returns, body, location } => {
            Statement::FunctionDefinition {
                name,
                parameters,
                returns,
                body: visitor.visit_block(body),
                location,
            }
        }
        Statement::Block(b) => Statement::Block(visitor.visit_block(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Identifier;

    struct CallCounter {
        count: usize,
    }

    impl Visitor for CallCounter {
        fn visit_expression(&mut self, expr: &Expression) {
            if matches!(expr, Expression::FunctionCall { .. }) {
                self.count += 1;
            }
            walk_expression(self, expr);
        }
    }

    #[test]
    fn visitor_counts_nested_calls() {
        let block = Block::new(vec![Statement::ExpressionStatement(Expression::call(
            "add",
            vec![Expression::call("mul", vec![Expression::number_literal("1")])],
        ))]);
        let mut counter = CallCounter { count: 0 };
        counter.visit_block(&block);
        assert_eq!(counter.count, 2);
    }

    struct LiteralBumper;
    impl MutVisitor for LiteralBumper {
        fn visit_expression(&mut self, expr: Expression) -> Expression {
            match expr {
                Expression::Literal { value, kind, location } if &*value == "1" => {
                    Expression::Literal { value: "2".into(), kind, location }
                }
                other => walk_expression_mut(self, other),
            }
        }
    }

    #[test]
    fn mut_visitor_rewrites_matching_literal() {
        let block = Block::new(vec![Statement::Assignment {
            targets: vec![Identifier::new("x")],
            value: Expression::number_literal("1"),
            location: Default::default(),
        }]);
        let rewritten = LiteralBumper.visit_block(block);
        match &rewritten.statements[0] {
            Statement::Assignment { value, .. } => {
                assert_eq!(value.as_literal().unwrap().0, "2");
            }
            _ => panic!("expected assignment"),
        }
    }
}
