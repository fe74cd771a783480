//! Fresh-name generation (spec.md §4.2 NameDispenser) and the
//! parameter/return canonicalization used by `EquivalentFunctionCombiner`.

use crate::ast::{Block, Identifier, Statement};
use std::collections::HashMap;
use std::collections::HashSet;

/// Given the union of all names currently in the AST plus a reserved
/// set, yields fresh names on demand. Shared across an entire suite
/// run (including the stack-compressor's iterations, per
/// `SPEC_FULL.md` §6) so no two passes ever hand out the same name.
#[derive(Debug, Clone)]
pub struct NameDispenser {
    used: HashSet<String>,
    counters: HashMap<String, u64>,
}

impl NameDispenser {
    pub fn new(used: impl IntoIterator<Item = Identifier>) -> Self {
        NameDispenser {
            used: used.into_iter().map(|i| i.as_str().to_string()).collect(),
            counters: HashMap::new(),
        }
    }

    /// Record a name as taken without generating it, e.g. one copied
    /// verbatim from an input program.
    pub fn reserve(&mut self, name: &Identifier) {
        self.used.insert(name.as_str().to_string());
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Yield a fresh name derived from `base`, guaranteed distinct from
    /// every name handed out or reserved so far.
    pub fn fresh(&mut self, base: &str) -> Identifier {
        let counter = self.counters.entry(base.to_string()).or_insert(0);
        loop {
            let candidate = format!("{base}_{counter}");
            *counter += 1;
            if !self.used.contains(&candidate) {
                self.used.insert(candidate.clone());
                return Identifier::new(candidate);
            }
        }
    }
}

/// Replace every parameter and return-variable occurrence of a
/// `FunctionDefinition` with positional placeholder names
/// (`__param0`, `__param1`, ... and `__ret0`, `__ret1`, ...), so two
/// functions that differ only in how they named their parameters
/// compare equal under `equality::function_bodies_equal_modulo_renaming`.
pub fn canonicalize_function(stmt: &Statement) -> Statement {
    let Statement::FunctionDefinition {
        name,
        parameters,
        returns,
        body,
        location,
    } = stmt
    else {
        return stmt.clone();
    };
    let mut rename: HashMap<Identifier, Identifier> = HashMap::new();
    let mut new_params = Vec::with_capacity(parameters.len());
    for (i, p) in parameters.iter().enumerate() {
        let fresh = Identifier::new(format!("__param{i}"));
        rename.insert(p.clone(), fresh.clone());
        new_params.push(fresh);
    }
    let mut new_returns = Vec::with_capacity(returns.len());
    for (i, r) in returns.iter().enumerate() {
        let fresh = Identifier::new(format!("__ret{i}"));
        rename.insert(r.clone(), fresh.clone());
        new_returns.push(fresh);
    }
    Statement::FunctionDefinition {
        name: name.clone(),
        parameters: new_params,
        returns: new_returns,
        body: rename_block(body, &rename),
        location: *location,
    }
}

/// Substitute every identifier occurrence named in `rename`, shared by
/// `canonicalize_function` and the inliner's capture-avoiding renaming.
pub(crate) fn rename_block(block: &Block, rename: &HashMap<Identifier, Identifier>) -> Block {
    Block::new(block.statements.iter().map(|s| rename_stmt(s, rename)).collect())
}

fn rename_expr(
    expr: &crate::ast::Expression,
    rename: &HashMap<Identifier, Identifier>,
) -> crate::ast::Expression {
    use crate::ast::Expression;
    match expr {
        Expression::Literal { .. } => expr.clone(),
        Expression::Identifier { name, location } => Expression::Identifier {
            name: rename.get(name).cloned().unwrap_or_else(|| name.clone()),
            location: *location,
        },
        Expression::FunctionCall { name, args, location } => Expression::FunctionCall {
            name: name.clone(),
            args: args.iter().map(|a| rename_expr(a, rename)).collect(),
            location: *location,
        },
    }
}

fn rename_targets(targets: &[Identifier], rename: &HashMap<Identifier, Identifier>) -> Vec<Identifier> {
    targets
        .iter()
        .map(|t| rename.get(t).cloned().unwrap_or_else(|| t.clone()))
        .collect()
}

pub(crate) fn rename_stmt(stmt: &Statement, rename: &HashMap<Identifier, Identifier>) -> Statement {
    use crate::ast::SwitchCase;
    match stmt {
        Statement::ExpressionStatement(e) => Statement::ExpressionStatement(rename_expr(e, rename)),
        Statement::Assignment { targets, value, location } => Statement::Assignment {
            targets: rename_targets(targets, rename),
            value: rename_expr(value, rename),
            location: *location,
        },
        Statement::VariableDeclaration { targets, value, location } => {
            Statement::VariableDeclaration {
                targets: rename_targets(targets, rename),
                value: value.as_ref().map(|v| rename_expr(v, rename)),
                location: *location,
            }
        }
        Statement::If { cond, body, location } => Statement::If {
            cond: rename_expr(cond, rename),
            body: rename_block(body, rename),
            location: *location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond: rename_expr(cond, rename),
            cases: cases
                .iter()
                .map(|c| match c {
                    SwitchCase::Case(lit, body) => {
                        SwitchCase::Case(rename_expr(lit, rename), rename_block(body, rename))
                    }
                    SwitchCase::Default(body) => SwitchCase::Default(rename_block(body, rename)),
                })
                .collect(),
            location: *location,
        },
        Statement::ForLoop { init, cond, post, body, location } => Statement::ForLoop {
            init: rename_block(init, rename),
            cond: rename_expr(cond, rename),
            post: rename_block(post, rename),
            body: rename_block(body, rename),
            location: *location,
        },
        Statement::Break(l) => Statement::Break(*l),
        Statement::Continue(l) => Statement::Continue(*l),
        Statement::Leave(l) => Statement::Leave(*l),
        // Nested function definitions do not capture outer locals
        // (spec.md §3 invariant), so no rename applies inside them.
        Statement::FunctionDefinition { .. } => stmt.clone(),
        Statement::Block(b) => Statement::Block(rename_block(b, rename)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_names_are_distinct() {
        let mut dispenser = NameDispenser::new([Identifier::new("x")]);
        let a = dispenser.fresh("x");
        let b = dispenser.fresh("x");
        assert_ne!(a, b);
        assert_ne!(a.as_str(), "x");
    }

    #[test]
    fn reserved_names_are_never_handed_out() {
        let mut dispenser = NameDispenser::new([Identifier::new("tmp_0")]);
        let fresh = dispenser.fresh("tmp");
        assert_ne!(fresh.as_str(), "tmp_0");
    }

    #[test]
    fn canonicalize_renames_params_and_returns() {
        let f = Statement::FunctionDefinition {
            name: Identifier::new("f"),
            parameters: vec![Identifier::new("a")],
            returns: vec![Identifier::new("r")],
            body: Block::new(vec![Statement::Assignment {
                targets: vec![Identifier::new("r")],
                value: crate::ast::Expression::identifier("a"),
                location: Default::default(),
            }]),
            location: Default::default(),
        };
        let canon = canonicalize_function(&f);
        if let Statement::FunctionDefinition { parameters, returns, .. } = canon {
            assert_eq!(parameters[0].as_str(), "__param0");
            assert_eq!(returns[0].as_str(), "__ret0");
        } else {
            panic!("expected function definition");
        }
    }
}
