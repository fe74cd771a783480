//! Expression form conversions (spec.md §4.3): flattening nested
//! expressions into single-assignment form and back, the SSA shim
//! transform and its inverse, and rematerialization of cheap or
//! literal-valued variables at their use sites.

use crate::ast::{Block, Expression, Identifier, Statement};
use crate::ast_utils::rewrite::rewrite_block_flat_map;
use crate::ast_utils::visitor::{walk_expression_mut, MutVisitor, Visitor};
use crate::ast_utils::size::code_size_expr;
use crate::ast_utils::vars::assigned_variables;
use crate::dialect::Dialect;
use crate::error::OptimizerError;
use crate::passes::{Context, Pass};
use crate::semantics::movable;
use std::collections::HashMap;

pub struct ExpressionSplitter;

impl Pass for ExpressionSplitter {
    fn name(&self) -> &'static str {
        "ExpressionSplitter"
    }
    fn abbreviation(&self) -> char {
        'x'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        Ok(rewrite_block_flat_map(block, &mut |s| {
            let mut out = Vec::new();
            let top = split_stmt_top(s, &mut out, ctx);
            out.push(top);
            out
        }))
    }
}

/// Recursively flattens `expr` so every `FunctionCall` argument is a
/// `Literal` or `Identifier`, pushing a `let tmp := ...` declaration for
/// each intermediate value into `out`.
fn split_expr(expr: Expression, out: &mut Vec<Statement>, ctx: &mut Context) -> Expression {
    match expr {
        Expression::Literal { .. } | Expression::Identifier { .. } => expr,
        Expression::FunctionCall { name, args, location } => {
            let args = args
                .into_iter()
                .map(|a| {
                    let split = split_expr(a, out, ctx);
                    if matches!(split, Expression::Literal { .. } | Expression::Identifier { .. }) {
                        split
                    } else {
                        let tmp = ctx.dispenser.fresh("_split");
                        out.push(Statement::VariableDeclaration {
                            targets: vec![tmp.clone()],
                            value: Some(split),
                            location,
                        });
                        Expression::identifier(tmp)
                    }
                })
                .collect();
            Expression::FunctionCall { name, args, location }
        }
    }
}

fn split_stmt_top(stmt: Statement, out: &mut Vec<Statement>, ctx: &mut Context) -> Statement {
    match stmt {
        Statement::ExpressionStatement(e) => Statement::ExpressionStatement(split_expr(e, out, ctx)),
        Statement::Assignment { targets, value, location } => Statement::Assignment {
            targets,
            value: split_expr(value, out, ctx),
            location,
        },
        Statement::VariableDeclaration { targets, value, location } => {
            Statement::VariableDeclaration {
                targets,
                value: value.map(|v| split_expr(v, out, ctx)),
                location,
            }
        }
        Statement::If { cond, body, location } => Statement::If {
            cond: split_expr(cond, out, ctx),
            body,
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond: split_expr(cond, out, ctx),
            cases,
            location,
        },
        Statement::ForLoop { init, cond, post, body, location } => Statement::ForLoop {
            init,
            cond: split_expr(cond, out, ctx),
            post,
            body,
            location,
        },
        other => other,
    }
}

/// Counts every read occurrence of each identifier across a tree
/// (assignment/declaration targets don't count), shared by
/// `ExpressionJoiner` and `SSAReverser` to prove a candidate is used
/// exactly once before folding it away.
fn identifier_use_counts(block: &Block) -> HashMap<Identifier, usize> {
    struct Counter {
        counts: HashMap<Identifier, usize>,
    }
    impl Visitor for Counter {
        fn visit_expression(&mut self, expr: &Expression) {
            if let Expression::Identifier { name, .. } = expr {
                *self.counts.entry(name.clone()).or_insert(0) += 1;
            }
            crate::ast_utils::visitor::walk_expression(self, expr);
        }
    }
    let mut counter = Counter { counts: HashMap::new() };
    counter.visit_block(block);
    counter.counts
}

fn count_identifier_in_expr(expr: &Expression, name: &Identifier, count: &mut usize) {
    match expr {
        Expression::Identifier { name: n, .. } if n == name => *count += 1,
        Expression::FunctionCall { args, .. } => {
            for a in args {
                count_identifier_in_expr(a, name, count);
            }
        }
        _ => {}
    }
}

fn count_uses_top(stmt: &Statement, name: &Identifier) -> usize {
    let mut count = 0;
    match stmt {
        Statement::ExpressionStatement(e) => count_identifier_in_expr(e, name, &mut count),
        Statement::Assignment { value, .. } => count_identifier_in_expr(value, name, &mut count),
        Statement::VariableDeclaration { value: Some(v), .. } => {
            count_identifier_in_expr(v, name, &mut count)
        }
        Statement::If { cond, .. } => count_identifier_in_expr(cond, name, &mut count),
        Statement::Switch { cond, .. } => count_identifier_in_expr(cond, name, &mut count),
        Statement::ForLoop { cond, .. } => count_identifier_in_expr(cond, name, &mut count),
        _ => {}
    }
    count
}

fn substitute_in_expr(expr: Expression, name: &Identifier, value: &Expression) -> Expression {
    match expr {
        Expression::Identifier { name: n, .. } if &n == name => value.clone(),
        Expression::FunctionCall { name: fname, args, location } => Expression::FunctionCall {
            name: fname,
            args: args.into_iter().map(|a| substitute_in_expr(a, name, value)).collect(),
            location,
        },
        other => other,
    }
}

fn substitute_top(stmt: Statement, name: &Identifier, value: &Expression) -> Statement {
    match stmt {
        Statement::ExpressionStatement(e) => {
            Statement::ExpressionStatement(substitute_in_expr(e, name, value))
        }
        Statement::Assignment { targets, value: v, location } => Statement::Assignment {
            targets,
            value: substitute_in_expr(v, name, value),
            location,
        },
        Statement::VariableDeclaration { targets, value: Some(v), location } => {
            Statement::VariableDeclaration {
                targets,
                value: Some(substitute_in_expr(v, name, value)),
                location,
            }
        }
        Statement::If { cond, body, location } => Statement::If {
            cond: substitute_in_expr(cond, name, value),
            body,
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond: substitute_in_expr(cond, name, value),
            cases,
            location,
        },
        Statement::ForLoop { init, cond, post, body, location } => Statement::ForLoop {
            init,
            cond: substitute_in_expr(cond, name, value),
            post,
            body,
            location,
        },
        other => other,
    }
}

fn recurse_children(stmt: Statement, f: &impl Fn(Vec<Statement>) -> Vec<Statement>) -> Statement {
    use crate::ast::SwitchCase;
    match stmt {
        Statement::If { cond, body, location } => Statement::If {
            cond,
            body: Block::new(f(body.statements)),
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond,
            cases: cases
                .into_iter()
                .map(|c| match c {
                    SwitchCase::Case(lit, body) => SwitchCase::Case(lit, Block::new(f(body.statements))),
                    SwitchCase::Default(body) => SwitchCase::Default(Block::new(f(body.statements))),
                })
                .collect(),
            location,
        },
        Statement::ForLoop { init, cond, post, body, location } => Statement::ForLoop {
            init: Block::new(f(init.statements)),
            cond,
            post: Block::new(f(post.statements)),
            body: Block::new(f(body.statements)),
            location,
        },
        Statement::FunctionDefinition { name, parameters, returns, body, location } => {
            Statement::FunctionDefinition {
                name,
                parameters,
                returns,
                body: Block::new(f(body.statements)),
                location,
            }
        }
        Statement::Block(b) => Statement::Block(Block::new(f(b.statements))),
        other => other,
    }
}

pub struct ExpressionJoiner;

impl Pass for ExpressionJoiner {
    fn name(&self) -> &'static str {
        "ExpressionJoiner"
    }
    fn abbreviation(&self) -> char {
        'j'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        let global_counts = identifier_use_counts(&block);
        Ok(join_block(block, ctx.dialect, &global_counts))
    }
}

fn join_block(block: Block, dialect: &dyn Dialect, counts: &HashMap<Identifier, usize>) -> Block {
    Block::new(join_statements(block.statements, dialect, counts))
}

fn join_statements(
    statements: Vec<Statement>,
    dialect: &dyn Dialect,
    counts: &HashMap<Identifier, usize>,
) -> Vec<Statement> {
    let statements: Vec<Statement> = statements
        .into_iter()
        .map(|s| recurse_children(s, &|children| join_statements(children, dialect, counts)))
        .collect();

    let mut out = Vec::with_capacity(statements.len());
    let mut i = 0;
    while i < statements.len() {
        let joined = if i + 1 < statements.len() {
            try_join_pair(&statements[i], &statements[i + 1], dialect, counts)
        } else {
            None
        };
        match joined {
            Some(merged) => {
                out.push(merged);
                i += 2;
            }
            None => {
                out.push(statements[i].clone());
                i += 1;
            }
        }
    }
    out
}

fn try_join_pair(
    decl: &Statement,
    next: &Statement,
    dialect: &dyn Dialect,
    counts: &HashMap<Identifier, usize>,
) -> Option<Statement> {
    let Statement::VariableDeclaration { targets, value: Some(value), .. } = decl else {
        return None;
    };
    if targets.len() != 1 || !movable(dialect, value) {
        return None;
    }
    let tmp = &targets[0];
    if counts.get(tmp).copied().unwrap_or(0) != 1 || count_uses_top(next, tmp) != 1 {
        return None;
    }
    Some(substitute_top(next.clone(), tmp, value))
}

pub struct SSATransform;

impl Pass for SSATransform {
    fn name(&self) -> &'static str {
        "SSATransform"
    }
    fn abbreviation(&self) -> char {
        'a'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        let mut counts: HashMap<Identifier, usize> = HashMap::new();
        count_assignment_targets(&block, &mut counts);
        Ok(rewrite_block_flat_map(block, &mut |s| match s {
            Statement::Assignment { targets, value, location }
                if targets.len() == 1 && counts.get(&targets[0]).copied().unwrap_or(0) > 1 =>
            {
                let fresh = ctx.dispenser.fresh(targets[0].as_str());
                vec![
                    Statement::VariableDeclaration {
                        targets: vec![fresh.clone()],
                        value: Some(value),
                        location,
                    },
                    Statement::Assignment {
                        targets,
                        value: Expression::identifier(fresh),
                        location,
                    },
                ]
            }
            other => vec![other],
        }))
    }
}

fn count_assignment_targets(block: &Block, counts: &mut HashMap<Identifier, usize>) {
    for s in &block.statements {
        match s {
            Statement::Assignment { targets, .. } => {
                for t in targets {
                    *counts.entry(t.clone()).or_insert(0) += 1;
                }
            }
            Statement::If { body, .. } => count_assignment_targets(body, counts),
            Statement::Switch { cases, .. } => {
                for c in cases {
                    count_assignment_targets(c.body(), counts);
                }
            }
            Statement::ForLoop { init, post, body, .. } => {
                count_assignment_targets(init, counts);
                count_assignment_targets(post, counts);
                count_assignment_targets(body, counts);
            }
            Statement::FunctionDefinition { body, .. } => count_assignment_targets(body, counts),
            Statement::Block(b) => count_assignment_targets(b, counts),
            _ => {}
        }
    }
}

pub struct SSAReverser;

impl Pass for SSAReverser {
    fn name(&self) -> &'static str {
        "SSAReverser"
    }
    fn abbreviation(&self) -> char {
        'V'
    }
    fn run(&self, _ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        let counts = identifier_use_counts(&block);
        Ok(reverse_block(block, &counts))
    }
}

fn reverse_block(block: Block, counts: &HashMap<Identifier, usize>) -> Block {
    Block::new(reverse_statements(block.statements, counts))
}

fn reverse_statements(statements: Vec<Statement>, counts: &HashMap<Identifier, usize>) -> Vec<Statement> {
    let statements: Vec<Statement> = statements
        .into_iter()
        .map(|s| recurse_children(s, &|children| reverse_statements(children, counts)))
        .collect();

    let mut out = Vec::with_capacity(statements.len());
    let mut i = 0;
    while i < statements.len() {
        let merged = if i + 1 < statements.len() {
            try_reverse_shim(&statements[i], &statements[i + 1], counts)
        } else {
            None
        };
        match merged {
            Some(stmt) => {
                out.push(stmt);
                i += 2;
            }
            None => {
                out.push(statements[i].clone());
                i += 1;
            }
        }
    }
    out
}

/// Recognizes `let x_i := E  x := x_i` and folds it back into
/// `x := E`, provided `x_i` is read nowhere else (the one shim use is
/// its only use).
fn try_reverse_shim(
    decl: &Statement,
    assign: &Statement,
    counts: &HashMap<Identifier, usize>,
) -> Option<Statement> {
    let Statement::VariableDeclaration { targets, value: Some(value), .. } = decl else {
        return None;
    };
    let Statement::Assignment { targets: outer_targets, value: outer_value, location } = assign else {
        return None;
    };
    if targets.len() != 1 {
        return None;
    }
    let shim_name = outer_value.as_identifier()?;
    if shim_name != &targets[0] {
        return None;
    }
    if counts.get(shim_name).copied().unwrap_or(0) != 1 {
        return None;
    }
    Some(Statement::Assignment {
        targets: outer_targets.clone(),
        value: value.clone(),
        location: *location,
    })
}

/// Collects every `let v := E` where `E` is movable, passes
/// `accept`, and `v` is never reassigned, for use by `Rematerialiser`/
/// `LiteralRematerialiser`.
fn collect_rematerializable(
    block: &Block,
    dialect: &dyn Dialect,
    reassigned: &std::collections::HashSet<Identifier>,
    accept: &impl Fn(&Expression) -> bool,
    out: &mut HashMap<Identifier, Expression>,
) {
    for s in &block.statements {
        match s {
            Statement::VariableDeclaration { targets, value: Some(value), .. }
                if targets.len() == 1
                    && !reassigned.contains(&targets[0])
                    && movable(dialect, value)
                    && accept(value) =>
            {
                out.insert(targets[0].clone(), value.clone());
            }
            _ => {}
        }
        match s {
            Statement::If { body, .. } => collect_rematerializable(body, dialect, reassigned, accept, out),
            Statement::Switch { cases, .. } => {
                for c in cases {
                    collect_rematerializable(c.body(), dialect, reassigned, accept, out);
                }
            }
            Statement::ForLoop { init, post, body, .. } => {
                collect_rematerializable(init, dialect, reassigned, accept, out);
                collect_rematerializable(post, dialect, reassigned, accept, out);
                collect_rematerializable(body, dialect, reassigned, accept, out);
            }
            Statement::FunctionDefinition { body, .. } => {
                collect_rematerializable(body, dialect, reassigned, accept, out)
            }
            Statement::Block(b) => collect_rematerializable(b, dialect, reassigned, accept, out),
            _ => {}
        }
    }
}

struct Rematerializer<'a> {
    defs: &'a HashMap<Identifier, Expression>,
}

impl<'a> MutVisitor for Rematerializer<'a> {
    fn visit_expression(&mut self, expr: Expression) -> Expression {
        match &expr {
            Expression::Identifier { name, .. } if self.defs.contains_key(name) => {
                self.defs[name].clone()
            }
            _ => walk_expression_mut(self, expr),
        }
    }
}

fn rematerialize(block: Block, dialect: &dyn Dialect, accept: impl Fn(&Expression) -> bool) -> Block {
    let reassigned = assigned_variables(&block);
    let mut defs = HashMap::new();
    collect_rematerializable(&block, dialect, &reassigned, &accept, &mut defs);
    if defs.is_empty() {
        return block;
    }
    Rematerializer { defs: &defs }.visit_block(block)
}

/// Rematerializes only the single named variable's definition at each
/// of its use sites, ignoring cost/literal acceptance entirely. Shared
/// with `stack_compressor`, which picks the one variable whose extent
/// crosses an over-deep region and reuses this rewrite rather than
/// duplicating it.
pub(crate) fn rematerialize_named(block: Block, dialect: &dyn Dialect, name: &Identifier) -> Block {
    let reassigned = assigned_variables(&block);
    if reassigned.contains(name) {
        return block;
    }
    let mut defs = HashMap::new();
    collect_rematerializable(&block, dialect, &reassigned, &|_| true, &mut defs);
    match defs.remove(name) {
        Some(expr) => {
            let mut single = HashMap::new();
            single.insert(name.clone(), expr);
            Rematerializer { defs: &single }.visit_block(block)
        }
        None => block,
    }
}

/// Threshold below which `Rematerialiser` considers recomputing an
/// expression cheaper than keeping it live as a stack/memory slot.
const SMALL_COST_THRESHOLD: usize = 3;

pub struct Rematerialiser;

impl Pass for Rematerialiser {
    fn name(&self) -> &'static str {
        "Rematerialiser"
    }
    fn abbreviation(&self) -> char {
        'm'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        Ok(rematerialize(block, ctx.dialect, |e| {
            code_size_expr(e) <= SMALL_COST_THRESHOLD
        }))
    }
}

pub struct LiteralRematerialiser;

impl Pass for LiteralRematerialiser {
    fn name(&self) -> &'static str {
        "LiteralRematerialiser"
    }
    fn abbreviation(&self) -> char {
        'T'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        Ok(rematerialize(block, ctx.dialect, |e| e.as_literal().is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceLocation;
    use crate::ast_utils::NameDispenser;
    use crate::demo_dialect::DemoStackDialect;
    use std::collections::HashSet;

    fn ctx<'a>(
        dialect: &'a DemoStackDialect,
        dispenser: &'a mut NameDispenser,
        reserved: &'a HashSet<Identifier>,
    ) -> Context<'a> {
        Context::new(dialect, dispenser, reserved)
    }

    #[test]
    fn splitter_flattens_nested_call() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let block = Block::new(vec![Statement::ExpressionStatement(Expression::call(
            "add",
            vec![
                Expression::call("mul", vec![Expression::number_literal("2"), Expression::number_literal("3")]),
                Expression::number_literal("1"),
            ],
        ))]);
        let out = ExpressionSplitter
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block)
            .unwrap();
        assert_eq!(out.statements.len(), 2);
        assert!(matches!(out.statements[0], Statement::VariableDeclaration { .. }));
        match &out.statements[1] {
            Statement::ExpressionStatement(e) => {
                let (_, args) = e.as_call().unwrap();
                assert!(matches!(args[0], Expression::Identifier { .. }));
            }
            _ => panic!("expected expression statement"),
        }
    }

    #[test]
    fn splitter_then_joiner_round_trip_is_equivalent_shape() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let block = Block::new(vec![Statement::ExpressionStatement(Expression::call(
            "add",
            vec![Expression::number_literal("1"), Expression::number_literal("2")],
        ))]);
        let split = ExpressionSplitter
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block.clone())
            .unwrap();
        let joined = ExpressionJoiner
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), split)
            .unwrap();
        assert!(crate::ast_utils::syntactically_equal_block(&block, &joined));
    }

    #[test]
    fn ssa_transform_rewrites_only_reassigned_variables() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let block = Block::new(vec![
            Statement::Assignment {
                targets: vec![Identifier::new("x")],
                value: Expression::number_literal("1"),
                location: SourceLocation::NONE,
            },
            Statement::Assignment {
                targets: vec![Identifier::new("x")],
                value: Expression::number_literal("2"),
                location: SourceLocation::NONE,
            },
        ]);
        let out = SSATransform
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block)
            .unwrap();
        assert_eq!(out.statements.len(), 4);
        assert!(matches!(out.statements[0], Statement::VariableDeclaration { .. }));
        assert!(matches!(out.statements[1], Statement::Assignment { .. }));
    }

    #[test]
    fn ssa_transform_then_reverser_restores_original() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let block = Block::new(vec![
            Statement::Assignment {
                targets: vec![Identifier::new("x")],
                value: Expression::number_literal("1"),
                location: SourceLocation::NONE,
            },
            Statement::Assignment {
                targets: vec![Identifier::new("x")],
                value: Expression::number_literal("2"),
                location: SourceLocation::NONE,
            },
        ]);
        let transformed = SSATransform
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block.clone())
            .unwrap();
        let reversed = SSAReverser
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), transformed)
            .unwrap();
        assert!(crate::ast_utils::syntactically_equal_block(&block, &reversed));
    }

    #[test]
    fn literal_rematerialiser_replaces_identifier_with_literal() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let block = Block::new(vec![
            Statement::VariableDeclaration {
                targets: vec![Identifier::new("k")],
                value: Some(Expression::number_literal("42")),
                location: SourceLocation::NONE,
            },
            Statement::ExpressionStatement(Expression::call("mstore", vec![
                Expression::number_literal("0"),
                Expression::identifier("k"),
            ])),
        ]);
        let out = LiteralRematerialiser
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block)
            .unwrap();
        match &out.statements[1] {
            Statement::ExpressionStatement(e) => {
                let (_, args) = e.as_call().unwrap();
                assert_eq!(args[1].as_literal().unwrap().0, "42");
            }
            _ => panic!("expected expression statement"),
        }
    }

    #[test]
    fn rematerialiser_skips_reassigned_variable() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let block = Block::new(vec![
            Statement::VariableDeclaration {
                targets: vec![Identifier::new("k")],
                value: Some(Expression::number_literal("1")),
                location: SourceLocation::NONE,
            },
            Statement::Assignment {
                targets: vec![Identifier::new("k")],
                value: Expression::number_literal("2"),
                location: SourceLocation::NONE,
            },
            Statement::ExpressionStatement(Expression::identifier("k")),
        ]);
        let out = LiteralRematerialiser
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block.clone())
            .unwrap();
        assert!(crate::ast_utils::syntactically_equal_block(&block, &out));
    }
}
