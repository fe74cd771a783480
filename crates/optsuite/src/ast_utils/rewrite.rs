//! A small generic block rewriter shared by several passes that need
//! to expand one statement into zero or more replacements (hoisting a
//! statement out of a `ForLoop` init, flattening a nested `Block`,
//! dropping an unreachable statement, splitting an expression into a
//! declaration plus a use).

use crate::ast::{Block, Statement, SwitchCase};

/// Recurse into every nested block (`If`/`Switch`/`ForLoop`/
/// `FunctionDefinition` bodies, explicit `Block` wrappers) rewriting
/// children first (post-order), then apply `f` to each top-level
/// statement of `block` in turn, flattening the results.
pub fn rewrite_block_flat_map(
    block: Block,
    f: &mut impl FnMut(Statement) -> Vec<Statement>,
) -> Block {
    let mut out = Vec::with_capacity(block.statements.len());
    for stmt in block.statements {
        let recursed = recurse_into_children(stmt, f);
        out.extend(f(recursed));
    }
    Block::new(out)
}

fn recurse_into_children(
    stmt: Statement,
    f: &mut impl FnMut(Statement) -> Vec<Statement>,
) -> Statement {
    match stmt {
        Statement::If { cond, body, location } => Statement::If {
            cond,
            body: rewrite_block_flat_map(body, f),
            location,
        },
        Statement::Switch { cond, cases, location } => Statement::Switch {
            cond,
            cases: cases
                .into_iter()
                .map(|c| match c {
                    SwitchCase::Case(lit, body) => {
                        SwitchCase::Case(lit, rewrite_block_flat_map(body, f))
                    }
                    SwitchCase::Default(body) => SwitchCase::Default(rewrite_block_flat_map(body, f)),
                })
                .collect(),
            location,
        },
        Statement::ForLoop { init, cond, post, body, location } => Statement::ForLoop {
            init: rewrite_block_flat_map(init, f),
            cond,
            post: rewrite_block_flat_map(post, f),
            body: rewrite_block_flat_map(body, f),
            location,
        },
        Statement::FunctionDefinition { name, parameters, returns, body, location } => {
            Statement::FunctionDefinition {
                name,
                parameters,
                returns,
                body: rewrite_block_flat_map(body, f),
                location,
            }
        }
        Statement::Block(b) => Statement::Block(rewrite_block_flat_map(b, f)),
        other => other,
    }
}

/// Apply a 1-to-1 rewrite to every statement, post-order (a
/// convenience wrapper over `rewrite_block_flat_map` for the common
/// case where a pass never changes statement cardinality).
pub fn map_block(block: Block, f: &mut impl FnMut(Statement) -> Statement) -> Block {
    rewrite_block_flat_map(block, &mut |s| vec![f(s)])
}
