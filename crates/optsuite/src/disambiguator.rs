//! The entry bookend (spec.md §4.1): renames every declared variable
//! and function so no two declarations share a name and no
//! declaration collides with the caller-supplied reserved set.
//!
//! A two-pass scope walk: the first pass collects every existing
//! declared name into the `NameDispenser`'s used-set (so generated
//! names never collide with a name that hasn't been visited yet), the
//! second pass emits a fresh name for each declaration and substitutes
//! every reference to it within the declaration's scope. Establishes
//! the unique-names invariant every downstream pass relies on.

use crate::ast::{Block, Expression, Identifier, Statement, SwitchCase};
use crate::ast_utils::NameDispenser;
use std::collections::HashMap;

pub struct Disambiguator;

impl Disambiguator {
    /// Rename `block` so no two declarations share a name and none
    /// collides with anything `dispenser` already knows about
    /// (externally used names union dialect-fixed names, per spec.md
    /// §4.6 step 1). Takes the same `NameDispenser` the rest of the
    /// suite run shares, rather than one scoped to just this pass, so
    /// later passes never hand out a name this one already used.
    pub fn run(block: Block, dispenser: &mut NameDispenser) -> Block {
        collect_names_block(&block, dispenser);
        disambiguate_block(block, dispenser, &HashMap::new())
    }
}

fn collect_names_block(block: &Block, dispenser: &mut NameDispenser) {
    for s in &block.statements {
        collect_names_stmt(s, dispenser);
    }
}

fn collect_names_stmt(stmt: &Statement, dispenser: &mut NameDispenser) {
    match stmt {
        Statement::VariableDeclaration { targets, .. } => {
            for t in targets {
                dispenser.reserve(t);
            }
        }
        Statement::FunctionDefinition {
            name,
            parameters,
            returns,
            body,
            ..
        } => {
            dispenser.reserve(name);
            for p in parameters {
                dispenser.reserve(p);
            }
            for r in returns {
                dispenser.reserve(r);
            }
            collect_names_block(body, dispenser);
        }
        Statement::If { body, .. } => collect_names_block(body, dispenser),
        Statement::Switch { cases, .. } => {
            for case in cases {
                collect_names_block(case.body(), dispenser);
            }
        }
        Statement::ForLoop { init, post, body, .. } => {
            collect_names_block(init, dispenser);
            collect_names_block(post, dispenser);
            collect_names_block(body, dispenser);
        }
        Statement::Block(b) => collect_names_block(b, dispenser),
        Statement::ExpressionStatement(_)
        | Statement::Assignment { .. }
        | Statement::Break(_)
        | Statement::Continue(_)
        | Statement::Leave(_) => {}
    }
}

/// Rename every declaration in `block` under the substitution already
/// accumulated in `active` from enclosing scopes, extending `active`
/// with this scope's own fresh names before recursing into children.
fn disambiguate_block(
    block: Block,
    dispenser: &mut NameDispenser,
    active: &HashMap<Identifier, Identifier>,
) -> Block {
    let mut active = active.clone();
    let mut out = Vec::with_capacity(block.statements.len());
    for stmt in block.statements {
        out.push(disambiguate_stmt(stmt, dispenser, &mut active));
    }
    Block::new(out)
}

fn disambiguate_stmt(
    stmt: Statement,
    dispenser: &mut NameDispenser,
    active: &mut HashMap<Identifier, Identifier>,
) -> Statement {
    match stmt {
        Statement::VariableDeclaration { targets, value, location } => {
            let value = value.map(|v| rename_expr(v, active));
            let targets = targets
                .into_iter()
                .map(|t| {
                    let fresh = dispenser.fresh(t.as_str());
                    active.insert(t, fresh.clone());
                    fresh
                })
                .collect();
            Statement::VariableDeclaration { targets, value, location }
        }
        Statement::FunctionDefinition {
            name,
            parameters,
            returns,
            body,
            location,
        } => {
            let fresh_name = dispenser.fresh(name.as_str());
            active.insert(name, fresh_name.clone());
            let mut inner = active.clone();
            let parameters: Vec<_> = parameters
                .into_iter()
                .map(|p| {
                    let fresh = dispenser.fresh(p.as_str());
                    inner.insert(p, fresh.clone());
                    fresh
                })
                .collect();
            let returns: Vec<_> = returns
                .into_iter()
                .map(|r| {
                    let fresh = dispenser.fresh(r.as_str());
                    inner.insert(r, fresh.clone());
                    fresh
                })
                .collect();
            let body = disambiguate_block(body, dispenser, &inner);
            Statement::FunctionDefinition {
                name: fresh_name,
                parameters,
                returns,
                body,
                location,
            }
        }
        Statement::ExpressionStatement(e) => Statement::ExpressionStatement(rename_expr(e, active)),
        Statement::Assignment { targets, value, location } => Statement::Assignment {
            targets: targets.into_iter().map(|t| substitute(t, active)).collect(),
            value: rename_expr(value, active),
            location,
        },
        Statement::If { cond, body, location } => Statement::If {
            cond: rename_expr(cond, active),
            body: disambiguate_block(body, dispenser, active),
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond: rename_expr(cond, active),
            cases: cases
                .into_iter()
                .map(|case| match case {
                    SwitchCase::Case(lit, body) => {
                        SwitchCase::Case(rename_expr(lit, active), disambiguate_block(body, dispenser, active))
                    }
                    SwitchCase::Default(body) => SwitchCase::Default(disambiguate_block(body, dispenser, active)),
                })
                .collect(),
            location,
        },
        Statement::ForLoop { init, cond, post, body, location } => {
            // The loop header's declarations are visible to `cond`,
            // `post`, and `body` alike, so thread one scope through
            // `init` statement by statement rather than going through
            // `disambiguate_block` (which would discard the scope it
            // builds up on return).
            let mut loop_scope = active.clone();
            let mut new_init = Vec::with_capacity(init.statements.len());
            for s in init.statements {
                new_init.push(disambiguate_stmt(s, dispenser, &mut loop_scope));
            }
            Statement::ForLoop {
                init: Block::new(new_init),
                cond: rename_expr(cond, &loop_scope),
                post: disambiguate_block(post, dispenser, &loop_scope),
                body: disambiguate_block(body, dispenser, &loop_scope),
                location,
            }
        }
        Statement::Break(l) => Statement::Break(l),
        Statement::Continue(l) => Statement::Continue(l),
        Statement::Leave(l) => Statement::Leave(l),
        Statement::Block(b) => Statement::Block(disambiguate_block(b, dispenser, active)),
    }
}

fn substitute(name: Identifier, active: &HashMap<Identifier, Identifier>) -> Identifier {
    active.get(&name).cloned().unwrap_or(name)
}

fn rename_expr(expr: Expression, active: &HashMap<Identifier, Identifier>) -> Expression {
    match expr {
        Expression::Literal { .. } => expr,
        Expression::Identifier { name, location } => Expression::Identifier {
            name: substitute(name, active),
            location,
        },
        Expression::FunctionCall { name, args, location } => Expression::FunctionCall {
            name,
            args: args.into_iter().map(|a| rename_expr(a, active)).collect(),
            location,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceLocation;
    use crate::ast_utils::vars::declared_variables;

    #[test]
    fn renames_duplicate_top_level_declarations() {
        let block = Block::new(vec![
            Statement::VariableDeclaration {
                targets: vec![Identifier::new("x")],
                value: Some(Expression::number_literal("1")),
                location: SourceLocation::NONE,
            },
            Statement::VariableDeclaration {
                targets: vec![Identifier::new("x")],
                value: Some(Expression::identifier("x")),
                location: SourceLocation::NONE,
            },
        ]);
        let out = Disambiguator::run(block, &mut NameDispenser::new(std::iter::empty()));
        let declared = declared_variables(&out);
        assert_eq!(declared.len(), 2);
        match &out.statements[1] {
            Statement::VariableDeclaration { value: Some(v), .. } => {
                let used = v.as_identifier().unwrap();
                assert!(declared.contains(used));
            }
            _ => panic!("expected declaration"),
        }
    }

    #[test]
    fn avoids_reserved_names() {
        let mut dispenser = NameDispenser::new([Identifier::new("x")]);
        let block = Block::new(vec![Statement::VariableDeclaration {
            targets: vec![Identifier::new("x")],
            value: Some(Expression::number_literal("1")),
            location: SourceLocation::NONE,
        }]);
        let out = Disambiguator::run(block, &mut dispenser);
        match &out.statements[0] {
            Statement::VariableDeclaration { targets, .. } => {
                assert_ne!(targets[0], Identifier::new("x"));
            }
            _ => panic!("expected declaration"),
        }
    }

    #[test]
    fn function_parameters_are_renamed_consistently_with_body() {
        let block = Block::new(vec![Statement::FunctionDefinition {
            name: Identifier::new("f"),
            parameters: vec![Identifier::new("a")],
            returns: vec![Identifier::new("r")],
            body: Block::new(vec![Statement::Assignment {
                targets: vec![Identifier::new("r")],
                value: Expression::identifier("a"),
                location: SourceLocation::NONE,
            }]),
            location: SourceLocation::NONE,
        }]);
        let out = Disambiguator::run(block, &mut NameDispenser::new(std::iter::empty()));
        match &out.statements[0] {
            Statement::FunctionDefinition { parameters, body, .. } => match &body.statements[0] {
                Statement::Assignment { value, .. } => {
                    assert_eq!(value.as_identifier().unwrap(), &parameters[0]);
                }
                _ => panic!("expected assignment"),
            },
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn loop_variable_visible_to_condition_and_post() {
        let block = Block::new(vec![Statement::ForLoop {
            init: Block::new(vec![Statement::VariableDeclaration {
                targets: vec![Identifier::new("i")],
                value: Some(Expression::number_literal("0")),
                location: SourceLocation::NONE,
            }]),
            cond: Expression::call(
                "lt",
                vec![Expression::identifier("i"), Expression::number_literal("10")],
            ),
            post: Block::new(vec![Statement::Assignment {
                targets: vec![Identifier::new("i")],
                value: Expression::call("add", vec![Expression::identifier("i"), Expression::number_literal("1")]),
                location: SourceLocation::NONE,
            }]),
            body: Block::empty(),
            location: SourceLocation::NONE,
        }]);
        let out = Disambiguator::run(block, &mut NameDispenser::new(std::iter::empty()));
        match &out.statements[0] {
            Statement::ForLoop { init, cond, post, .. } => {
                let declared = match &init.statements[0] {
                    Statement::VariableDeclaration { targets, .. } => targets[0].clone(),
                    _ => panic!("expected declaration"),
                };
                assert_eq!(cond.as_call().unwrap().1[0].as_identifier().unwrap(), &declared);
                match &post.statements[0] {
                    Statement::Assignment { targets, .. } => assert_eq!(targets[0], declared),
                    _ => panic!("expected assignment"),
                }
            }
            _ => panic!("expected for loop"),
        }
    }
}
