//! The exit bookend (spec.md §4.6 step 9): shortens every declared
//! name back toward something resembling its pre-disambiguation
//! spelling, independently within each top-level function body (and
//! within the leading non-function block). By the point this runs,
//! `FunctionHoister` has already guaranteed the top-level block is
//! flat — `[Block(main)] ++ [FunctionDefinition*]` — so no function's
//! renaming domain can observe another's.
//!
//! Reusing a short name across two different functions is exactly
//! what destroys the unique-names invariant; this pass must run last,
//! after every other pass that depends on that invariant.

use crate::ast::{Block, Expression, Identifier, Statement, SwitchCase};
use std::collections::{HashMap, HashSet};

pub struct VarNameCleaner;

impl VarNameCleaner {
    pub fn run(block: Block) -> Block {
        Block::new(block.statements.into_iter().map(clean_top_level_statement).collect())
    }
}

fn clean_top_level_statement(stmt: Statement) -> Statement {
    match stmt {
        Statement::FunctionDefinition {
            name,
            parameters,
            returns,
            body,
            location,
        } => {
            let mut domain = Domain::default();
            let parameters = domain.declare_all(parameters);
            let returns = domain.declare_all(returns);
            let body = domain.clean_block(body);
            Statement::FunctionDefinition { name, parameters, returns, body, location }
        }
        Statement::Block(inner) => Statement::Block(Domain::default().clean_block(inner)),
        other => other,
    }
}

/// One independent renaming domain: every name declared in it gets a
/// shortened spelling distinct from every other name in the same
/// domain, with no relation to names chosen in any other domain.
#[derive(Default)]
struct Domain {
    base_used: HashSet<String>,
    rename: HashMap<Identifier, Identifier>,
}

impl Domain {
    fn declare(&mut self, name: Identifier) -> Identifier {
        let base = strip_disambiguation_suffix(name.as_str()).to_string();
        let fresh = if self.base_used.insert(base.clone()) {
            Identifier::new(base)
        } else {
            let mut n: u64 = 1;
            loop {
                let candidate = format!("{base}_{n}");
                if self.base_used.insert(candidate.clone()) {
                    break Identifier::new(candidate);
                }
                n += 1;
            }
        };
        self.rename.insert(name, fresh.clone());
        fresh
    }

    fn declare_all(&mut self, names: Vec<Identifier>) -> Vec<Identifier> {
        names.into_iter().map(|n| self.declare(n)).collect()
    }

    fn substitute(&self, name: Identifier) -> Identifier {
        self.rename.get(&name).cloned().unwrap_or(name)
    }

    fn clean_block(&mut self, block: Block) -> Block {
        Block::new(block.statements.into_iter().map(|s| self.clean_stmt(s)).collect())
    }

    fn clean_stmt(&mut self, stmt: Statement) -> Statement {
        match stmt {
            Statement::VariableDeclaration { targets, value, location } => {
                let value = value.map(|v| self.clean_expr(v));
                let targets = self.declare_all(targets);
                Statement::VariableDeclaration { targets, value, location }
            }
            Statement::Assignment { targets, value, location } => Statement::Assignment {
                targets: targets.into_iter().map(|t| self.substitute(t)).collect(),
                value: self.clean_expr(value),
                location,
            },
            Statement::ExpressionStatement(e) => Statement::ExpressionStatement(self.clean_expr(e)),
            Statement::If { cond, body, location } => Statement::If {
                cond: self.clean_expr(cond),
                body: self.clean_block(body),
                location,
            },
            Statement::Switch { cond, cases, location } => Statement::Switch {
                cond: self.clean_expr(cond),
                cases: cases
                    .into_iter()
                    .map(|c| match c {
                        SwitchCase::Case(lit, body) => {
                            SwitchCase::Case(self.clean_expr(lit), self.clean_block(body))
                        }
                        SwitchCase::Default(body) => SwitchCase::Default(self.clean_block(body)),
                    })
                    .collect(),
                location,
            },
            Statement::ForLoop { init, cond, post, body, location } => {
                let init = self.clean_block(init);
                let cond = self.clean_expr(cond);
                let post = self.clean_block(post);
                let body = self.clean_block(body);
                Statement::ForLoop { init, cond, post, body, location }
            }
            Statement::Break(l) => Statement::Break(l),
            Statement::Continue(l) => Statement::Continue(l),
            Statement::Leave(l) => Statement::Leave(l),
            // Not expected once FunctionHoister has run, but handled
            // rather than assumed away: a stray nested definition gets
            // its own independent domain, same as a top-level one.
            Statement::FunctionDefinition { .. } => clean_top_level_statement(stmt),
            Statement::Block(b) => Statement::Block(self.clean_block(b)),
        }
    }

    fn clean_expr(&self, expr: Expression) -> Expression {
        match expr {
            Expression::Literal { .. } => expr,
            Expression::Identifier { name, location } => {
                Expression::Identifier { name: self.substitute(name), location }
            }
            Expression::FunctionCall { name, args, location } => Expression::FunctionCall {
                name,
                args: args.into_iter().map(|a| self.clean_expr(a)).collect(),
                location,
            },
        }
    }
}

/// Recover the name a `NameDispenser` generated this from, undoing its
/// `{base}_{counter}` convention. A trailing `_<digits>` is treated as
/// disambiguation noise and dropped; anything else (including a name
/// with no underscore at all) is returned unchanged.
fn strip_disambiguation_suffix(name: &str) -> &str {
    match name.rfind('_') {
        Some(idx) => {
            let (base, suffix) = name.split_at(idx);
            let suffix = &suffix[1..];
            if !base.is_empty() && !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
                base
            } else {
                name
            }
        }
        None => name,
    }
}
