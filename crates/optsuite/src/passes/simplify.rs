//! Simplification passes (spec.md §4.3 "Simplification"): peephole
//! rewriting, common subexpression elimination, memory/storage load
//! resolution, conditional setter folding, and dead-code removal.

use crate::ast::{Block, Expression, Identifier, SwitchCase, Statement};
use crate::ast_utils::equality::syntactically_equal_expr;
use crate::ast_utils::rewrite::rewrite_block_flat_map;
use crate::ast_utils::vars::free_variables;
use crate::ast_utils::visitor::{walk_expression_mut, MutVisitor};
use crate::dialect::Dialect;
use crate::error::OptimizerError;
use crate::passes::{Context, Pass};
use crate::semantics::{collect_effects_stmt, movable, side_effect_free};
use std::collections::HashMap;

pub struct ExpressionSimplifier;

impl Pass for ExpressionSimplifier {
    fn name(&self) -> &'static str {
        "ExpressionSimplifier"
    }
    fn abbreviation(&self) -> char {
        's'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        struct Simplifier<'a> {
            dialect: &'a dyn Dialect,
        }
        impl<'a> MutVisitor for Simplifier<'a> {
            fn visit_expression(&mut self, expr: Expression) -> Expression {
                let expr = walk_expression_mut(self, expr);
                let Expression::FunctionCall { name, args, location } = &expr else {
                    return expr;
                };
                if let Some(folded) = fold_constant(self.dialect, name.as_str(), args) {
                    return folded;
                }
                if let Some(simplified) = apply_identity(name.as_str(), args) {
                    return simplified;
                }
                let _ = location;
                expr
            }
        }
        Ok(Simplifier { dialect: ctx.dialect }.visit_block(block))
    }
}

fn fold_constant(dialect: &dyn Dialect, name: &str, args: &[Expression]) -> Option<Expression> {
    let literals: Vec<&str> = args
        .iter()
        .map(|a| a.as_literal().map(|(v, _)| v))
        .collect::<Option<Vec<_>>>()?;
    dialect.fold_constant(name, &literals).map(Expression::number_literal)
}

/// A small set of algebraic identities (spec.md §4.3: "algebraic
/// identities, strength reduction"), independent of any dialect.
fn apply_identity(name: &str, args: &[Expression]) -> Option<Expression> {
    match (name, args) {
        ("add" | "or" | "xor", [a, b]) if b.is_falsy_literal() => Some(a.clone()),
        ("add" | "or" | "xor", [a, b]) if a.is_falsy_literal() => Some(b.clone()),
        ("sub", [a, b]) if b.is_falsy_literal() => Some(a.clone()),
        ("mul" | "and", [a, b]) if matches!(b.as_literal(), Some(("1", _))) => Some(a.clone()),
        ("mul" | "and", [a, b]) if matches!(a.as_literal(), Some(("1", _))) => Some(b.clone()),
        ("mul", [_, b]) if b.is_falsy_literal() => Some(Expression::number_literal("0")),
        ("mul", [a, _]) if a.is_falsy_literal() => Some(Expression::number_literal("0")),
        ("and", [_, b]) if b.is_falsy_literal() => Some(Expression::number_literal("0")),
        ("and", [a, _]) if a.is_falsy_literal() => Some(Expression::number_literal("0")),
        _ => None,
    }
}

pub struct CommonSubexpressionEliminator;

impl Pass for CommonSubexpressionEliminator {
    fn name(&self) -> &'static str {
        "CommonSubexpressionEliminator"
    }
    fn abbreviation(&self) -> char {
        'c'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        Ok(cse_block(block, ctx.dialect))
    }
}

fn cse_recurse_children(stmt: Statement, dialect: &dyn Dialect) -> Statement {
    match stmt {
        Statement::If { cond, body, location } => Statement::If {
            cond,
            body: cse_block(body, dialect),
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond,
            cases: cases
                .into_iter()
                .map(|c| match c {
                    SwitchCase::Case(lit, body) => SwitchCase::Case(lit, cse_block(body, dialect)),
                    SwitchCase::Default(body) => SwitchCase::Default(cse_block(body, dialect)),
                })
                .collect(),
            location,
        },
        Statement::ForLoop { init, cond, post, body, location } => Statement::ForLoop {
            init: cse_block(init, dialect),
            cond,
            post: cse_block(post, dialect),
            body: cse_block(body, dialect),
            location,
        },
        Statement::FunctionDefinition { name, parameters, returns, body, location } => {
            Statement::FunctionDefinition {
                name,
                parameters,
                returns,
                body: cse_block(body, dialect),
                location,
            }
        }
        Statement::Block(b) => Statement::Block(cse_block(b, dialect)),
        other => other,
    }
}

/// Confined to a single basic block, per spec.md §4.3: each nested
/// control-flow body gets its own, independent available-expression
/// table.
fn cse_block(block: Block, dialect: &dyn Dialect) -> Block {
    let mut available: Vec<(Expression, Identifier)> = Vec::new();
    let mut out = Vec::with_capacity(block.statements.len());
    for stmt in block.statements {
        let stmt = cse_recurse_children(stmt, dialect);
        let stmt = match &stmt {
            Statement::VariableDeclaration { targets, value: Some(value), location }
                if targets.len() == 1 && movable(dialect, value) =>
            {
                available
                    .iter()
                    .find(|(e, _)| syntactically_equal_expr(e, value))
                    .map(|(_, prev)| Statement::VariableDeclaration {
                        targets: targets.clone(),
                        value: Some(Expression::identifier(prev.clone())),
                        location: *location,
                    })
                    .unwrap_or_else(|| stmt.clone())
            }
            _ => stmt,
        };

        let effects = collect_effects_stmt(dialect, &stmt);
        if effects.has_any_effect() {
            available.clear();
        }
        if let Statement::Assignment { targets, .. } = &stmt {
            available.retain(|(e, _)| {
                let refs = free_variables(&Block::new(vec![Statement::ExpressionStatement(e.clone())]));
                !targets.iter().any(|t| refs.contains(t))
            });
        }
        if let Statement::VariableDeclaration { targets, value: Some(value), .. } = &stmt {
            if targets.len() == 1 && movable(dialect, value) && value.as_identifier().is_none() {
                available.push((value.clone(), targets[0].clone()));
            }
        }
        out.push(stmt);
    }
    Block::new(out)
}

/// Load/store builtin names this crate's reference convention
/// recognizes for `LoadResolver` (`SPEC_FULL.md` §6, mirroring the
/// `ISZERO` convention used by the structural for-loop passes).
const CANDIDATE_LOADS: [&str; 2] = ["mload", "sload"];

fn build_store_map(dialect: &dyn Dialect) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for load in CANDIDATE_LOADS {
        if let Some((store, _is_storage)) = dialect.store_for_load(load) {
            map.insert(store.to_string(), load.to_string());
        }
    }
    map
}

pub struct LoadResolver;

impl Pass for LoadResolver {
    fn name(&self) -> &'static str {
        "LoadResolver"
    }
    fn abbreviation(&self) -> char {
        'L'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        let store_map = build_store_map(ctx.dialect);
        Ok(resolve_block(block, ctx.dialect, &store_map))
    }
}

struct LoadSubst<'a> {
    known: &'a [(String, Expression, Expression)],
}

impl<'a> MutVisitor for LoadSubst<'a> {
    fn visit_expression(&mut self, expr: Expression) -> Expression {
        let expr = walk_expression_mut(self, expr);
        if let Expression::FunctionCall { name, args, .. } = &expr {
            if args.len() == 1 {
                if let Some((_, _, value)) = self
                    .known
                    .iter()
                    .rev()
                    .find(|(load, key, _)| load == name.as_str() && syntactically_equal_expr(key, &args[0]))
                {
                    return value.clone();
                }
            }
        }
        expr
    }
}

fn resolve_recurse_children(stmt: Statement, dialect: &dyn Dialect, store_map: &HashMap<String, String>) -> Statement {
    match stmt {
        Statement::If { cond, body, location } => Statement::If {
            cond,
            body: resolve_block(body, dialect, store_map),
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond,
            cases: cases
                .into_iter()
                .map(|c| match c {
                    SwitchCase::Case(lit, body) => SwitchCase::Case(lit, resolve_block(body, dialect, store_map)),
                    SwitchCase::Default(body) => SwitchCase::Default(resolve_block(body, dialect, store_map)),
                })
                .collect(),
            location,
        },
        Statement::ForLoop { init, cond, post, body, location } => Statement::ForLoop {
            init: resolve_block(init, dialect, store_map),
            cond,
            post: resolve_block(post, dialect, store_map),
            body: resolve_block(body, dialect, store_map),
            location,
        },
        Statement::FunctionDefinition { name, parameters, returns, body, location } => {
            Statement::FunctionDefinition {
                name,
                parameters,
                returns,
                body: resolve_block(body, dialect, store_map),
                location,
            }
        }
        Statement::Block(b) => Statement::Block(resolve_block(b, dialect, store_map)),
        other => other,
    }
}

fn resolve_block(block: Block, dialect: &dyn Dialect, store_map: &HashMap<String, String>) -> Block {
    let mut known: Vec<(String, Expression, Expression)> = Vec::new();
    let mut out = Vec::with_capacity(block.statements.len());
    for stmt in block.statements {
        let stmt = resolve_recurse_children(stmt, dialect, store_map);

        // A load's own key is recorded before substitution runs on it, so
        // a second read of the same address can be forwarded to the first
        // read's target even with no intervening write.
        let read_key = match &stmt {
            Statement::VariableDeclaration { targets, value: Some(value), .. } if targets.len() == 1 => {
                match value {
                    Expression::FunctionCall { name, args, .. }
                        if args.len() == 1 && CANDIDATE_LOADS.contains(&name.as_str()) =>
                    {
                        Some((name.to_string(), args[0].clone(), targets[0].clone()))
                    }
                    _ => None,
                }
            }
            _ => None,
        };

        let stmt = LoadSubst { known: &known }.visit_statement(stmt);

        if let Statement::ExpressionStatement(Expression::FunctionCall { name, args, .. }) = &stmt {
            if let (Some(load_name), true) = (store_map.get(name.as_str()), args.len() == 2) {
                known.retain(|(l, k, _)| !(l == load_name && syntactically_equal_expr(k, &args[0])));
                known.push((load_name.clone(), args[0].clone(), args[1].clone()));
                out.push(stmt);
                continue;
            }
        }

        let effects = collect_effects_stmt(dialect, &stmt);
        if effects.invalidates_storage
            || effects.invalidates_memory
            || effects.writes_storage
            || effects.writes_memory
        {
            known.clear();
        }

        if let Some((load_name, key, target)) = read_key {
            known.retain(|(l, k, _)| !(l == &load_name && syntactically_equal_expr(k, &key)));
            known.push((load_name, key, Expression::identifier(target)));
        }

        out.push(stmt);
    }
    Block::new(out)
}

pub struct ConditionalSimplifier;

impl Pass for ConditionalSimplifier {
    fn name(&self) -> &'static str {
        "ConditionalSimplifier"
    }
    fn abbreviation(&self) -> char {
        'C'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        let Some(select) = ctx.dialect.select_builtin().map(str::to_string) else {
            return Ok(block);
        };
        Ok(Block::new(merge_guarded_setters(block.statements, &select)))
    }
}

fn single_assignment(body: &Block) -> Option<(&Identifier, &Expression)> {
    if body.statements.len() != 1 {
        return None;
    }
    match &body.statements[0] {
        Statement::Assignment { targets, value, .. } if targets.len() == 1 => Some((&targets[0], value)),
        _ => None,
    }
}

fn is_negation_of(a: &Expression, b: &Expression) -> bool {
    matches!(a.as_call(), Some((name, args)) if name.as_str() == "iszero" && args.len() == 1 && syntactically_equal_expr(&args[0], b))
}

/// Folds the pattern `if cond { v := a }` followed by
/// `if iszero(cond) { v := b }` into `v := select(cond, a, b)`.
fn merge_guarded_setters(statements: Vec<Statement>, select: &str) -> Vec<Statement> {
    let mut out = Vec::with_capacity(statements.len());
    let mut i = 0;
    while i < statements.len() {
        if i + 1 < statements.len() {
            if let (
                Statement::If { cond: c1, body: b1, location },
                Statement::If { cond: c2, body: b2, .. },
            ) = (&statements[i], &statements[i + 1])
            {
                if let (Some((v1, a)), Some((v2, b))) = (single_assignment(b1), single_assignment(b2)) {
                    if v1 == v2 && is_negation_of(c2, c1) {
                        out.push(Statement::Assignment {
                            targets: vec![v1.clone()],
                            value: Expression::call(select, vec![c1.clone(), a.clone(), b.clone()]),
                            location: *location,
                        });
                        i += 2;
                        continue;
                    }
                }
            }
        }
        out.push(statements[i].clone());
        i += 1;
    }
    out
}

pub struct ConditionalUnsimplifier;

impl Pass for ConditionalUnsimplifier {
    fn name(&self) -> &'static str {
        "ConditionalUnsimplifier"
    }
    fn abbreviation(&self) -> char {
        'U'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        let Some(select) = ctx.dialect.select_builtin() else {
            return Ok(block);
        };
        Ok(rewrite_block_flat_map(block, &mut |s| split_guarded_setter(s, select)))
    }
}

fn split_guarded_setter(stmt: Statement, select: &str) -> Vec<Statement> {
    let Statement::Assignment { targets, value, location } = &stmt else {
        return vec![stmt];
    };
    if targets.len() != 1 {
        return vec![stmt];
    }
    let Some((name, args)) = value.as_call() else {
        return vec![stmt];
    };
    if name.as_str() != select || args.len() != 3 {
        return vec![stmt];
    }
    let (cond, a, b) = (args[0].clone(), args[1].clone(), args[2].clone());
    let targets = targets.clone();
    let location = *location;

    let split = vec![
        Statement::If {
            cond: cond.clone(),
            body: Block::new(vec![Statement::Assignment {
                targets: targets.clone(),
                value: a,
                location,
            }]),
            location,
        },
        Statement::If {
            cond: Expression::call("iszero", vec![cond]),
            body: Block::new(vec![Statement::Assignment { targets, value: b, location }]),
            location,
        },
    ];

    // Only unsimplify when doing so actually shrinks the surrounding
    // code; a `select` call with two non-trivial arms is smaller than
    // duplicating the condition across two `If`s.
    let split_size: usize = split.iter().map(crate::ast_utils::size::code_size_stmt).sum();
    if split_size < crate::ast_utils::size::code_size_stmt(&stmt) {
        split
    } else {
        vec![stmt]
    }
}

pub struct ControlFlowSimplifier;

impl Pass for ControlFlowSimplifier {
    fn name(&self) -> &'static str {
        "ControlFlowSimplifier"
    }
    fn abbreviation(&self) -> char {
        'n'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        let block = rewrite_block_flat_map(block, &mut |s| simplify_branch(s, ctx.dialect));
        Ok(strip_trailing_terminators(block))
    }
}

fn simplify_branch(stmt: Statement, dialect: &dyn Dialect) -> Vec<Statement> {
    match stmt {
        Statement::If { cond, body, .. } if body.is_empty() => {
            if side_effect_free(dialect, &cond) {
                vec![]
            } else {
                vec![Statement::ExpressionStatement(cond)]
            }
        }
        Statement::If { cond, body, .. } if cond.is_falsy_literal() => {
            if side_effect_free(dialect, &cond) {
                vec![]
            } else {
                vec![Statement::ExpressionStatement(cond)]
            }
        }
        Statement::If { cond, body, .. } if cond.is_truthy_literal() => body.statements,
        Statement::Switch { cond, cases, .. } if cases.len() == 1 && cases[0].is_default() => {
            let body = match cases.into_iter().next().unwrap() {
                SwitchCase::Default(b) => b,
                _ => unreachable!(),
            };
            if side_effect_free(dialect, &cond) {
                body.statements
            } else {
                let mut out = vec![Statement::ExpressionStatement(cond)];
                out.extend(body.statements);
                out
            }
        }
        other => vec![other],
    }
}

fn strip_trailing_terminators(block: Block) -> Block {
    Block::new(block.statements.into_iter().map(strip_children).collect())
}

fn strip_children(stmt: Statement) -> Statement {
    match stmt {
        Statement::FunctionDefinition { name, parameters, returns, body, location } => {
            let mut body = strip_trailing_terminators(body);
            if matches!(body.statements.last(), Some(Statement::Leave(_))) {
                body.statements.pop();
            }
            Statement::FunctionDefinition { name, parameters, returns, body, location }
        }
        Statement::ForLoop { init, cond, post, body, location } => {
            let mut body = strip_trailing_terminators(body);
            if matches!(body.statements.last(), Some(Statement::Continue(_))) {
                body.statements.pop();
            }
            Statement::ForLoop {
                init: strip_trailing_terminators(init),
                cond,
                post: strip_trailing_terminators(post),
                body,
                location,
            }
        }
        Statement::If { cond, body, location } => Statement::If {
            cond,
            body: strip_trailing_terminators(body),
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond,
            cases: cases
                .into_iter()
                .map(|c| match c {
                    SwitchCase::Case(lit, body) => SwitchCase::Case(lit, strip_trailing_terminators(body)),
                    SwitchCase::Default(body) => SwitchCase::Default(strip_trailing_terminators(body)),
                })
                .collect(),
            location,
        },
        Statement::Block(b) => Statement::Block(strip_trailing_terminators(b)),
        other => other,
    }
}

pub struct StructuralSimplifier;

impl Pass for StructuralSimplifier {
    fn name(&self) -> &'static str {
        "StructuralSimplifier"
    }
    fn abbreviation(&self) -> char {
        't'
    }
    fn run(&self, _ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        Ok(rewrite_block_flat_map(block, &mut |s| match s {
            Statement::ForLoop { init, cond, .. } if cond.is_falsy_literal() => init.statements,
            other => vec![other],
        }))
    }
}

pub struct DeadCodeEliminator;

impl Pass for DeadCodeEliminator {
    fn name(&self) -> &'static str {
        "DeadCodeEliminator"
    }
    fn abbreviation(&self) -> char {
        'D'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        Ok(eliminate_dead(block, ctx.dialect))
    }
}

fn eliminate_dead_children(stmt: Statement, dialect: &dyn Dialect) -> Statement {
    match stmt {
        Statement::If { cond, body, location } => Statement::If {
            cond,
            body: eliminate_dead(body, dialect),
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond,
            cases: cases
                .into_iter()
                .map(|c| match c {
                    SwitchCase::Case(lit, body) => SwitchCase::Case(lit, eliminate_dead(body, dialect)),
                    SwitchCase::Default(body) => SwitchCase::Default(eliminate_dead(body, dialect)),
                })
                .collect(),
            location,
        },
        Statement::ForLoop { init, cond, post, body, location } => Statement::ForLoop {
            init: eliminate_dead(init, dialect),
            cond,
            post: eliminate_dead(post, dialect),
            body: eliminate_dead(body, dialect),
            location,
        },
        Statement::FunctionDefinition { name, parameters, returns, body, location } => {
            Statement::FunctionDefinition {
                name,
                parameters,
                returns,
                body: eliminate_dead(body, dialect),
                location,
            }
        }
        Statement::Block(b) => Statement::Block(eliminate_dead(b, dialect)),
        other => other,
    }
}

fn eliminate_dead(block: Block, dialect: &dyn Dialect) -> Block {
    let mut out = Vec::with_capacity(block.statements.len());
    for stmt in block.statements {
        let stmt = eliminate_dead_children(stmt, dialect);
        let terminates =
            stmt.is_unconditional_terminator() || collect_effects_stmt(dialect, &stmt).can_terminate;
        out.push(stmt);
        if terminates {
            break;
        }
    }
    Block::new(out)
}

pub struct UnusedPruner;

impl Pass for UnusedPruner {
    fn name(&self) -> &'static str {
        "UnusedPruner"
    }
    fn abbreviation(&self) -> char {
        'u'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        Ok(prune_block(block, ctx.dialect))
    }
}

fn prune_children(stmt: Statement, dialect: &dyn Dialect) -> Statement {
    match stmt {
        Statement::If { cond, body, location } => Statement::If {
            cond,
            body: prune_block(body, dialect),
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond,
            cases: cases
                .into_iter()
                .map(|c| match c {
                    SwitchCase::Case(lit, body) => SwitchCase::Case(lit, prune_block(body, dialect)),
                    SwitchCase::Default(body) => SwitchCase::Default(prune_block(body, dialect)),
                })
                .collect(),
            location,
        },
        Statement::ForLoop { init, cond, post, body, location } => Statement::ForLoop {
            init: prune_block(init, dialect),
            cond,
            post: prune_block(post, dialect),
            body: prune_block(body, dialect),
            location,
        },
        Statement::FunctionDefinition { name, parameters, returns, body, location } => {
            Statement::FunctionDefinition {
                name,
                parameters,
                returns,
                body: prune_block(body, dialect),
                location,
            }
        }
        Statement::Block(b) => Statement::Block(prune_block(b, dialect)),
        other => other,
    }
}

struct CallNameCollector {
    names: std::collections::HashSet<Identifier>,
}

impl crate::ast_utils::visitor::Visitor for CallNameCollector {
    fn visit_expression(&mut self, expr: &Expression) {
        if let Some((name, _)) = expr.as_call() {
            self.names.insert(name.clone());
        }
        crate::ast_utils::visitor::walk_expression(self, expr);
    }
}

fn called_names(statements: &[Statement]) -> std::collections::HashSet<Identifier> {
    let mut collector = CallNameCollector {
        names: std::collections::HashSet::new(),
    };
    for s in statements {
        crate::ast_utils::visitor::Visitor::visit_statement(&mut collector, s);
    }
    collector.names
}

fn prune_block(block: Block, dialect: &dyn Dialect) -> Block {
    let statements: Vec<Statement> = block
        .statements
        .into_iter()
        .map(|s| prune_children(s, dialect))
        .collect();

    let mut out = Vec::with_capacity(statements.len());
    for (i, stmt) in statements.iter().enumerate() {
        if let Statement::VariableDeclaration { targets, value, .. } = stmt {
            if targets.len() == 1 {
                let rest = Block::new(statements[i + 1..].to_vec());
                if !free_variables(&rest).contains(&targets[0]) {
                    match value {
                        Some(v) if !side_effect_free(dialect, v) => {
                            out.push(Statement::ExpressionStatement(v.clone()));
                        }
                        _ => {}
                    }
                    continue;
                }
            }
        }
        // FunctionDefinitions are visible throughout the block
        // regardless of declaration order, so "called" is checked
        // against every other statement, not just what follows.
        if let Statement::FunctionDefinition { name, .. } = stmt {
            let mut elsewhere: Vec<Statement> = statements[..i].to_vec();
            elsewhere.extend(statements[i + 1..].iter().cloned());
            if !called_names(&elsewhere).contains(name) {
                continue;
            }
        }
        out.push(stmt.clone());
    }
    Block::new(out)
}

pub struct RedundantAssignEliminator;

impl Pass for RedundantAssignEliminator {
    fn name(&self) -> &'static str {
        "RedundantAssignEliminator"
    }
    fn abbreviation(&self) -> char {
        'r'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        Ok(eliminate_redundant_assigns(block, ctx.dialect))
    }
}

fn redundant_assign_recurse_children(stmt: Statement, dialect: &dyn Dialect) -> Statement {
    match stmt {
        Statement::If { cond, body, location } => Statement::If {
            cond,
            body: eliminate_redundant_assigns(body, dialect),
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond,
            cases: cases
                .into_iter()
                .map(|c| match c {
                    SwitchCase::Case(lit, body) => SwitchCase::Case(lit, eliminate_redundant_assigns(body, dialect)),
                    SwitchCase::Default(body) => SwitchCase::Default(eliminate_redundant_assigns(body, dialect)),
                })
                .collect(),
            location,
        },
        Statement::ForLoop { init, cond, post, body, location } => Statement::ForLoop {
            init: eliminate_redundant_assigns(init, dialect),
            cond,
            post: eliminate_redundant_assigns(post, dialect),
            body: eliminate_redundant_assigns(body, dialect),
            location,
        },
        Statement::FunctionDefinition { name, parameters, returns, body, location } => {
            Statement::FunctionDefinition {
                name,
                parameters,
                returns,
                body: eliminate_redundant_assigns(body, dialect),
                location,
            }
        }
        Statement::Block(b) => Statement::Block(eliminate_redundant_assigns(b, dialect)),
        other => other,
    }
}

/// Scans the straight-line statements immediately following an
/// assignment to `target` and reports whether `target` is overwritten
/// again before ever being read, which makes the original assignment's
/// value dead. Stops at the first statement whose control flow can't be
/// linearized — an `If`/`Switch`/`ForLoop` only overwrites `target` on
/// some paths, not provably every path — so this only ever proves
/// deadness within a single straight-line block.
fn is_dead_store(target: &Identifier, rest: &[Statement]) -> bool {
    for stmt in rest {
        let reads = free_variables(&Block::new(vec![stmt.clone()])).contains(target);
        match stmt {
            Statement::Assignment { targets, .. } => {
                if reads {
                    return false;
                }
                if targets.iter().any(|t| t == target) {
                    return true;
                }
            }
            Statement::ExpressionStatement(_) | Statement::VariableDeclaration { .. } => {
                if reads {
                    return false;
                }
            }
            _ => return false,
        }
    }
    false
}

fn eliminate_redundant_assigns(block: Block, dialect: &dyn Dialect) -> Block {
    let statements: Vec<Statement> = block
        .statements
        .into_iter()
        .map(|s| redundant_assign_recurse_children(s, dialect))
        .collect();

    let mut out = Vec::with_capacity(statements.len());
    for (i, stmt) in statements.iter().enumerate() {
        if let Statement::Assignment { targets, value, .. } = stmt {
            if targets.len() == 1 {
                if value.as_identifier() == Some(&targets[0]) {
                    continue;
                }
                if is_dead_store(&targets[0], &statements[i + 1..]) {
                    if !side_effect_free(dialect, value) {
                        out.push(Statement::ExpressionStatement(value.clone()));
                    }
                    continue;
                }
            }
        }
        out.push(stmt.clone());
    }
    Block::new(out)
}
