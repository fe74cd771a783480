//! Inlining passes (spec.md §4.3 "Inlining"): substituting a call
//! site's value or control flow with a capture-renamed copy of the
//! callee's body, and merging structurally identical functions.

use crate::ast::{Block, Expression, Identifier, SourceLocation, Statement, SwitchCase};
use crate::ast_utils::equality::function_bodies_equal_modulo_renaming;
use crate::ast_utils::name_dispenser::rename_block;
use crate::ast_utils::rewrite::rewrite_block_flat_map;
use crate::ast_utils::size::code_size;
use crate::ast_utils::visitor::{walk_expression, walk_expression_mut, MutVisitor, Visitor};
use crate::error::OptimizerError;
use crate::passes::{Context, Pass};
use std::collections::{HashMap, HashSet};

/// `FullInliner` only inlines a call site unconditionally once the
/// callee is at or under this size; larger callees are only inlined
/// when doing so removes their only remaining call site (spec.md
/// §4.3's inlining cost model, simplified per `DESIGN.md`).
const INLINE_SIZE_THRESHOLD: usize = 8;

fn count_call_sites(block: &Block, name: &Identifier) -> usize {
    struct Counter<'a> {
        name: &'a Identifier,
        count: usize,
    }
    impl<'a> Visitor for Counter<'a> {
        fn visit_expression(&mut self, expr: &Expression) {
            if let Some((n, _)) = expr.as_call() {
                if n == self.name {
                    self.count += 1;
                }
            }
            walk_expression(self, expr);
        }
    }
    let mut counter = Counter { name, count: 0 };
    counter.visit_block(block);
    counter.count
}

fn collect_functions(block: &Block) -> HashMap<Identifier, Statement> {
    let mut map = HashMap::new();
    collect_functions_into(block, &mut map);
    map
}

fn collect_functions_into(block: &Block, map: &mut HashMap<Identifier, Statement>) {
    for stmt in &block.statements {
        if let Statement::FunctionDefinition { name, .. } = stmt {
            map.insert(name.clone(), stmt.clone());
        }
        match stmt {
            Statement::If { body, .. } => collect_functions_into(body, map),
            Statement::Switch { cases, .. } => {
                for c in cases {
                    collect_functions_into(c.body(), map);
                }
            }
            Statement::ForLoop { init, post, body, .. } => {
                collect_functions_into(init, map);
                collect_functions_into(post, map);
                collect_functions_into(body, map);
            }
            Statement::FunctionDefinition { body, .. } => collect_functions_into(body, map),
            Statement::Block(b) => collect_functions_into(b, map),
            _ => {}
        }
    }
}

fn calls_itself(name: &Identifier, body: &Block) -> bool {
    struct Finder<'a> {
        name: &'a Identifier,
        found: bool,
    }
    impl<'a> Visitor for Finder<'a> {
        fn visit_expression(&mut self, expr: &Expression) {
            if let Some((n, _)) = expr.as_call() {
                if n == self.name {
                    self.found = true;
                }
            }
            walk_expression(self, expr);
        }
    }
    let mut finder = Finder { name, found: false };
    finder.visit_block(body);
    finder.found
}

fn is_straight_line(body: &Block) -> bool {
    body.statements.iter().all(|s| {
        matches!(
            s,
            Statement::ExpressionStatement(_) | Statement::Assignment { .. } | Statement::VariableDeclaration { .. }
        )
    })
}

pub struct ExpressionInliner;

impl Pass for ExpressionInliner {
    fn name(&self) -> &'static str {
        "ExpressionInliner"
    }
    fn abbreviation(&self) -> char {
        'e'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        let functions = collect_functions(&block);
        Ok(rewrite_block_flat_map(block, &mut |s| inline_expr_call(s, &functions, ctx)))
    }
}

fn try_inline_value(
    ctx: &mut Context,
    functions: &HashMap<Identifier, Statement>,
    name: &Identifier,
    args: &[Expression],
) -> Option<(Vec<Statement>, Identifier)> {
    let Statement::FunctionDefinition { parameters, returns, body, .. } = functions.get(name)? else {
        return None;
    };
    if returns.len() != 1 || parameters.len() != args.len() {
        return None;
    }
    if !is_straight_line(body) || calls_itself(name, body) {
        return None;
    }
    Some(bind_call(ctx, name, parameters, returns, body, args))
}

fn bind_call(
    ctx: &mut Context,
    callee: &Identifier,
    parameters: &[Identifier],
    returns: &[Identifier],
    body: &Block,
    args: &[Expression],
) -> (Vec<Statement>, Identifier) {
    let mut rename: HashMap<Identifier, Identifier> = HashMap::new();
    for p in parameters {
        rename.insert(p.clone(), ctx.dispenser.fresh(&format!("{}_{}", callee.as_str(), p.as_str())));
    }
    for r in returns {
        rename.insert(r.clone(), ctx.dispenser.fresh(&format!("{}_{}", callee.as_str(), r.as_str())));
    }
    for local in declared_locals_only(body) {
        rename
            .entry(local)
            .or_insert_with(|| ctx.dispenser.fresh(&format!("{}_local", callee.as_str())));
    }

    let mut out = Vec::new();
    for (p, a) in parameters.iter().zip(args.iter()) {
        out.push(Statement::VariableDeclaration {
            targets: vec![rename[p].clone()],
            value: Some(a.clone()),
            location: SourceLocation::NONE,
        });
    }
    for r in returns {
        out.push(Statement::VariableDeclaration {
            targets: vec![rename[r].clone()],
            value: None,
            location: SourceLocation::NONE,
        });
    }
    let renamed = rename_block(body, &rename);
    out.extend(renamed.statements);
    (out, rename[&returns[0]].clone())
}

fn declared_locals_only(body: &Block) -> HashSet<Identifier> {
    use crate::ast_utils::vars::declared_variables;
    declared_variables(body)
}

fn inline_expr_call(
    stmt: Statement,
    functions: &HashMap<Identifier, Statement>,
    ctx: &mut Context,
) -> Vec<Statement> {
    match stmt {
        Statement::ExpressionStatement(Expression::FunctionCall { name, args, location }) => {
            match try_inline_value(ctx, functions, &name, &args) {
                Some((mut bindings, ret)) => {
                    bindings.push(Statement::ExpressionStatement(Expression::identifier(ret)));
                    bindings
                }
                None => vec![Statement::ExpressionStatement(Expression::FunctionCall { name, args, location })],
            }
        }
        Statement::Assignment { targets, value: Expression::FunctionCall { name, args, location }, location: stmt_loc } => {
            match try_inline_value(ctx, functions, &name, &args) {
                Some((mut bindings, ret)) => {
                    bindings.push(Statement::Assignment {
                        targets,
                        value: Expression::identifier(ret),
                        location: stmt_loc,
                    });
                    bindings
                }
                None => vec![Statement::Assignment {
                    targets,
                    value: Expression::FunctionCall { name, args, location },
                    location: stmt_loc,
                }],
            }
        }
        Statement::VariableDeclaration { targets, value: Some(Expression::FunctionCall { name, args, location }), location: stmt_loc } => {
            match try_inline_value(ctx, functions, &name, &args) {
                Some((mut bindings, ret)) => {
                    bindings.push(Statement::VariableDeclaration {
                        targets,
                        value: Some(Expression::identifier(ret)),
                        location: stmt_loc,
                    });
                    bindings
                }
                None => vec![Statement::VariableDeclaration {
                    targets,
                    value: Some(Expression::FunctionCall { name, args, location }),
                    location: stmt_loc,
                }],
            }
        }
        other => vec![other],
    }
}

pub struct FullInliner;

impl Pass for FullInliner {
    fn name(&self) -> &'static str {
        "FullInliner"
    }
    fn abbreviation(&self) -> char {
        'i'
    }
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        let functions = collect_functions(&block);
        let call_counts: HashMap<Identifier, usize> = functions
            .keys()
            .map(|name| (name.clone(), count_call_sites(&block, name)))
            .collect();
        Ok(rewrite_block_flat_map(block, &mut |s| {
            inline_full_call(s, &functions, &call_counts, ctx)
        }))
    }
}

fn collect_all_declared(block: &Block) -> Vec<Identifier> {
    let mut out = Vec::new();
    collect_all_declared_into(block, &mut out);
    out
}

fn collect_all_declared_into(block: &Block, out: &mut Vec<Identifier>) {
    for stmt in &block.statements {
        match stmt {
            Statement::VariableDeclaration { targets, .. } => out.extend(targets.iter().cloned()),
            Statement::If { body, .. } => collect_all_declared_into(body, out),
            Statement::Switch { cases, .. } => {
                for c in cases {
                    collect_all_declared_into(c.body(), out);
                }
            }
            Statement::ForLoop { init, post, body, .. } => {
                collect_all_declared_into(init, out);
                collect_all_declared_into(post, out);
                collect_all_declared_into(body, out);
            }
            Statement::Block(b) => collect_all_declared_into(b, out),
            _ => {}
        }
    }
}

fn contains_leave(block: &Block) -> bool {
    block.statements.iter().any(|s| match s {
        Statement::Leave(_) => true,
        Statement::If { body, .. } => contains_leave(body),
        Statement::Switch { cases, .. } => cases.iter().any(|c| contains_leave(c.body())),
        Statement::ForLoop { init, post, body, .. } => {
            contains_leave(init) || contains_leave(post) || contains_leave(body)
        }
        Statement::Block(b) => contains_leave(b),
        _ => false,
    })
}

/// A `leave` nested inside a `ForLoop` cannot be rewritten to `break`
/// by the single-iteration wrapper below: `break` would only exit the
/// inner loop, not the synthetic function-body loop, changing control
/// flow. Functions shaped this way are left un-inlined.
fn has_leave_inside_nested_loop(block: &Block) -> bool {
    block.statements.iter().any(|s| match s {
        Statement::If { body, .. } => has_leave_inside_nested_loop(body),
        Statement::Switch { cases, .. } => cases.iter().any(|c| has_leave_inside_nested_loop(c.body())),
        Statement::ForLoop { init, post, body, .. } => {
            contains_leave(init) || contains_leave(post) || contains_leave(body)
        }
        Statement::Block(b) => has_leave_inside_nested_loop(b),
        _ => false,
    })
}

fn leave_to_break(block: Block) -> Block {
    Block::new(block.statements.into_iter().map(leave_to_break_stmt).collect())
}

fn leave_to_break_stmt(stmt: Statement) -> Statement {
    match stmt {
        Statement::Leave(loc) => Statement::Break(loc),
        Statement::If { cond, body, location } => Statement::If {
            cond,
            body: leave_to_break(body),
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond,
            cases: cases
                .into_iter()
                .map(|c| match c {
                    SwitchCase::Case(lit, body) => SwitchCase::Case(lit, leave_to_break(body)),
                    SwitchCase::Default(body) => SwitchCase::Default(leave_to_break(body)),
                })
                .collect(),
            location,
        },
        // Left untouched: callers reject inlining when a `leave` appears
        // inside a nested loop (`has_leave_inside_nested_loop`), so any
        // `ForLoop` reaching here carries no `leave` needing rewriting.
        Statement::ForLoop { init, cond, post, body, location } => {
            Statement::ForLoop { init, cond, post, body, location }
        }
        Statement::Block(b) => Statement::Block(leave_to_break(b)),
        other => other,
    }
}

/// Wraps a renamed callee body in a single-iteration loop so an early
/// `leave` can be expressed as `break` without restructuring the
/// surrounding statement list (spec.md §4.3 FullInliner grounding).
fn wrap_with_leave_as_break(body: &Block, rename: &HashMap<Identifier, Identifier>) -> Block {
    let renamed = rename_block(body, rename);
    let mut loop_body = leave_to_break(renamed);
    loop_body.statements.push(Statement::Break(SourceLocation::NONE));
    Block::new(vec![Statement::ForLoop {
        init: Block::empty(),
        cond: Expression::number_literal("1"),
        post: Block::empty(),
        body: loop_body,
        location: SourceLocation::NONE,
    }])
}

fn try_full_inline(
    ctx: &mut Context,
    functions: &HashMap<Identifier, Statement>,
    call_counts: &HashMap<Identifier, usize>,
    name: &Identifier,
    args: &[Expression],
) -> Option<(Vec<Statement>, Vec<Identifier>)> {
    let Statement::FunctionDefinition { parameters, returns, body, .. } = functions.get(name)? else {
        return None;
    };
    if parameters.len() != args.len() {
        return None;
    }
    if calls_itself(name, body) || has_leave_inside_nested_loop(body) {
        return None;
    }
    let call_sites = call_counts.get(name).copied().unwrap_or(0);
    if code_size(body) > INLINE_SIZE_THRESHOLD && call_sites > 1 {
        return None;
    }
    Some(bind_full_call(ctx, name, parameters, returns, body, args))
}

fn bind_full_call(
    ctx: &mut Context,
    callee: &Identifier,
    parameters: &[Identifier],
    returns: &[Identifier],
    body: &Block,
    args: &[Expression],
) -> (Vec<Statement>, Vec<Identifier>) {
    let mut rename: HashMap<Identifier, Identifier> = HashMap::new();
    for p in parameters {
        rename.insert(p.clone(), ctx.dispenser.fresh(&format!("{}_{}", callee.as_str(), p.as_str())));
    }
    for r in returns {
        rename.insert(r.clone(), ctx.dispenser.fresh(&format!("{}_{}", callee.as_str(), r.as_str())));
    }
    for local in collect_all_declared(body) {
        rename
            .entry(local)
            .or_insert_with(|| ctx.dispenser.fresh(&format!("{}_local", callee.as_str())));
    }

    let mut out = Vec::new();
    for (p, a) in parameters.iter().zip(args.iter()) {
        out.push(Statement::VariableDeclaration {
            targets: vec![rename[p].clone()],
            value: Some(a.clone()),
            location: SourceLocation::NONE,
        });
    }
    for r in returns {
        out.push(Statement::VariableDeclaration {
            targets: vec![rename[r].clone()],
            value: None,
            location: SourceLocation::NONE,
        });
    }
    out.push(Statement::Block(wrap_with_leave_as_break(body, &rename)));
    let rets = returns.iter().map(|r| rename[r].clone()).collect();
    (out, rets)
}

fn inline_full_call(
    stmt: Statement,
    functions: &HashMap<Identifier, Statement>,
    call_counts: &HashMap<Identifier, usize>,
    ctx: &mut Context,
) -> Vec<Statement> {
    match stmt {
        Statement::ExpressionStatement(Expression::FunctionCall { name, args, location }) => {
            match try_full_inline(ctx, functions, call_counts, &name, &args) {
                Some((bindings, _)) => bindings,
                None => vec![Statement::ExpressionStatement(Expression::FunctionCall { name, args, location })],
            }
        }
        Statement::Assignment { targets, value: Expression::FunctionCall { name, args, location }, location: stmt_loc } => {
            match try_full_inline(ctx, functions, call_counts, &name, &args) {
                Some((mut bindings, rets)) => {
                    for (t, r) in targets.iter().zip(rets.iter()) {
                        bindings.push(Statement::Assignment {
                            targets: vec![t.clone()],
                            value: Expression::identifier(r.clone()),
                            location: stmt_loc,
                        });
                    }
                    bindings
                }
                None => vec![Statement::Assignment {
                    targets,
                    value: Expression::FunctionCall { name, args, location },
                    location: stmt_loc,
                }],
            }
        }
        Statement::VariableDeclaration { targets, value: Some(Expression::FunctionCall { name, args, location }), location: stmt_loc } => {
            match try_full_inline(ctx, functions, call_counts, &name, &args) {
                Some((mut bindings, rets)) => {
                    for (t, r) in targets.iter().zip(rets.iter()) {
                        bindings.push(Statement::VariableDeclaration {
                            targets: vec![t.clone()],
                            value: Some(Expression::identifier(r.clone())),
                            location: stmt_loc,
                        });
                    }
                    bindings
                }
                None => vec![Statement::VariableDeclaration {
                    targets,
                    value: Some(Expression::FunctionCall { name, args, location }),
                    location: stmt_loc,
                }],
            }
        }
        other => vec![other],
    }
}

pub struct EquivalentFunctionCombiner;

impl Pass for EquivalentFunctionCombiner {
    fn name(&self) -> &'static str {
        "EquivalentFunctionCombiner"
    }
    fn abbreviation(&self) -> char {
        'v'
    }
    fn run(&self, _ctx: &mut Context, block: Block) -> Result<Block, OptimizerError> {
        let mut kept: Vec<Statement> = Vec::new();
        let mut redirect: HashMap<Identifier, Identifier> = HashMap::new();
        for stmt in &block.statements {
            let Statement::FunctionDefinition { name, .. } = stmt else { continue };
            match kept.iter().find(|k| function_bodies_equal_modulo_renaming(k, stmt)) {
                Some(Statement::FunctionDefinition { name: keeper, .. }) => {
                    redirect.insert(name.clone(), keeper.clone());
                }
                _ => kept.push(stmt.clone()),
            }
        }
        if redirect.is_empty() {
            return Ok(block);
        }
        let dropped: HashSet<Identifier> = redirect.keys().cloned().collect();
        let block = Block::new(
            block
                .statements
                .into_iter()
                .filter(|s| !matches!(s, Statement::FunctionDefinition { name, .. } if dropped.contains(name)))
                .collect(),
        );

        struct Redirector<'a> {
            redirect: &'a HashMap<Identifier, Identifier>,
        }
        impl<'a> MutVisitor for Redirector<'a> {
            fn visit_expression(&mut self, expr: Expression) -> Expression {
                let expr = walk_expression_mut(self, expr);
                if let Expression::FunctionCall { name, args, location } = &expr {
                    if let Some(new_name) = self.redirect.get(name) {
                        return Expression::FunctionCall {
                            name: new_name.clone(),
                            args: args.clone(),
                            location: *location,
                        };
                    }
                }
                expr
            }
        }
        Ok(Redirector { redirect: &redirect }.visit_block(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_utils::NameDispenser;
    use crate::demo_dialect::DemoStackDialect;

    fn ctx<'a>(
        dialect: &'a DemoStackDialect,
        dispenser: &'a mut NameDispenser,
        reserved: &'a HashSet<Identifier>,
    ) -> Context<'a> {
        Context::new(dialect, dispenser, reserved)
    }

    fn double_fn() -> Statement {
        Statement::FunctionDefinition {
            name: Identifier::new("double"),
            parameters: vec![Identifier::new("x")],
            returns: vec![Identifier::new("r")],
            body: Block::new(vec![Statement::Assignment {
                targets: vec![Identifier::new("r")],
                value: Expression::call("add", vec![Expression::identifier("x"), Expression::identifier("x")]),
                location: SourceLocation::NONE,
            }]),
            location: SourceLocation::NONE,
        }
    }

    #[test]
    fn expression_inliner_substitutes_trivial_call() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let block = Block::new(vec![
            double_fn(),
            Statement::VariableDeclaration {
                targets: vec![Identifier::new("a")],
                value: Some(Expression::call("double", vec![Expression::number_literal("5")])),
                location: SourceLocation::NONE,
            },
        ]);
        let out = ExpressionInliner
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block)
            .unwrap();
        let has_call = out.statements.iter().any(|s| {
            matches!(s, Statement::VariableDeclaration { value: Some(v), .. } if v.as_call().map(|(n,_)| n.as_str()) == Some("double"))
        });
        assert!(!has_call);
    }

    #[test]
    fn expression_inliner_skips_recursive_function() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let recursive = Statement::FunctionDefinition {
            name: Identifier::new("f"),
            parameters: vec![Identifier::new("x")],
            returns: vec![Identifier::new("r")],
            body: Block::new(vec![Statement::Assignment {
                targets: vec![Identifier::new("r")],
                value: Expression::call("f", vec![Expression::identifier("x")]),
                location: SourceLocation::NONE,
            }]),
            location: SourceLocation::NONE,
        };
        let block = Block::new(vec![
            recursive,
            Statement::VariableDeclaration {
                targets: vec![Identifier::new("a")],
                value: Some(Expression::call("f", vec![Expression::number_literal("1")])),
                location: SourceLocation::NONE,
            },
        ]);
        let out = ExpressionInliner
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block)
            .unwrap();
        assert!(out.statements.iter().any(|s| {
            matches!(s, Statement::VariableDeclaration { value: Some(v), .. } if v.as_call().is_some())
        }));
    }

    #[test]
    fn full_inliner_rewrites_leave_as_break_inside_synthetic_loop() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let callee = Statement::FunctionDefinition {
            name: Identifier::new("maybe"),
            parameters: vec![Identifier::new("x")],
            returns: vec![Identifier::new("r")],
            body: Block::new(vec![
                Statement::If {
                    cond: Expression::identifier("x"),
                    body: Block::new(vec![
                        Statement::Assignment {
                            targets: vec![Identifier::new("r")],
                            value: Expression::number_literal("1"),
                            location: SourceLocation::NONE,
                        },
                        Statement::Leave(SourceLocation::NONE),
                    ]),
                    location: SourceLocation::NONE,
                },
                Statement::Assignment {
                    targets: vec![Identifier::new("r")],
                    value: Expression::number_literal("0"),
                    location: SourceLocation::NONE,
                },
            ]),
            location: SourceLocation::NONE,
        };
        let block = Block::new(vec![
            callee,
            Statement::VariableDeclaration {
                targets: vec![Identifier::new("a")],
                value: Some(Expression::call("maybe", vec![Expression::identifier("flag")])),
                location: SourceLocation::NONE,
            },
        ]);
        let out = FullInliner
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block)
            .unwrap();
        let has_call = out.statements.iter().any(|s| {
            matches!(s, Statement::VariableDeclaration { value: Some(v), .. } if v.as_call().is_some())
        });
        assert!(!has_call);
        let has_loop = out
            .statements
            .iter()
            .any(|s| matches!(s, Statement::Block(b) if b.statements.iter().any(|s2| matches!(s2, Statement::ForLoop{..}))));
        assert!(has_loop);
    }

    #[test]
    fn full_inliner_skips_leave_inside_nested_loop() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let callee = Statement::FunctionDefinition {
            name: Identifier::new("f"),
            parameters: vec![],
            returns: vec![Identifier::new("r")],
            body: Block::new(vec![Statement::ForLoop {
                init: Block::empty(),
                cond: Expression::number_literal("1"),
                post: Block::empty(),
                body: Block::new(vec![Statement::Leave(SourceLocation::NONE)]),
                location: SourceLocation::NONE,
            }]),
            location: SourceLocation::NONE,
        };
        let block = Block::new(vec![
            callee,
            Statement::ExpressionStatement(Expression::call("f", vec![])),
        ]);
        let out = FullInliner
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block)
            .unwrap();
        assert!(out.statements.iter().any(|s| {
            matches!(s, Statement::ExpressionStatement(e) if e.as_call().is_some())
        }));
    }

    #[test]
    fn equivalent_function_combiner_merges_and_redirects_calls() {
        let dialect = DemoStackDialect::new();
        let mut dispenser = NameDispenser::new([]);
        let reserved = HashSet::new();
        let f = Statement::FunctionDefinition {
            name: Identifier::new("f"),
            parameters: vec![Identifier::new("a")],
            returns: vec![Identifier::new("r")],
            body: Block::new(vec![Statement::Assignment {
                targets: vec![Identifier::new("r")],
                value: Expression::identifier("a"),
                location: SourceLocation::NONE,
            }]),
            location: SourceLocation::NONE,
        };
        let g = Statement::FunctionDefinition {
            name: Identifier::new("g"),
            parameters: vec![Identifier::new("b")],
            returns: vec![Identifier::new("s")],
            body: Block::new(vec![Statement::Assignment {
                targets: vec![Identifier::new("s")],
                value: Expression::identifier("b"),
                location: SourceLocation::NONE,
            }]),
            location: SourceLocation::NONE,
        };
        let block = Block::new(vec![
            f,
            g,
            Statement::ExpressionStatement(Expression::call("g", vec![Expression::number_literal("1")])),
        ]);
        let out = EquivalentFunctionCombiner
            .run(&mut ctx(&dialect, &mut dispenser, &reserved), block)
            .unwrap();
        let function_count = out.statements.iter().filter(|s| s.is_function_definition()).count();
        assert_eq!(function_count, 1);
        assert!(out.statements.iter().any(|s| {
            matches!(s, Statement::ExpressionStatement(e) if e.as_call().map(|(n,_)| n.as_str()) == Some("f"))
        }));
    }
}
