//! The semantics oracle (spec.md §4, component 3): `movable`,
//! `side_effect_free`, and effect-flag collection for expressions and
//! statements, driven entirely by a `Dialect`.

use crate::ast::{Block, Expression, Statement, SwitchCase};
use crate::dialect::Dialect;

/// An expression may be duplicated or reordered relative to any other
/// statement without changing observable behavior iff it has no side
/// effects and does not depend on side-effecting state (spec.md
/// GLOSSARY "Movable expression").
pub fn movable(dialect: &dyn Dialect, expr: &Expression) -> bool {
    match expr {
        Expression::Literal { .. } => true,
        Expression::Identifier { .. } => true,
        Expression::FunctionCall { name, args, .. } => {
            let Some(info) = dialect.builtin(name.as_str()) else {
                // A user-defined function call is never movable: the
                // optimizer core does not analyze callee bodies for
                // purity, only the dialect's built-ins.
                return false;
            };
            info.movable && args.iter().all(|a| movable(dialect, a))
        }
    }
}

/// No side effects at the top level of this expression (a strictly
/// weaker property than `movable`, which additionally requires
/// independence from side-effecting state read elsewhere).
pub fn side_effect_free(dialect: &dyn Dialect, expr: &Expression) -> bool {
    match expr {
        Expression::Literal { .. } | Expression::Identifier { .. } => true,
        Expression::FunctionCall { name, args, .. } => {
            let Some(info) = dialect.builtin(name.as_str()) else {
                return false;
            };
            info.side_effect_free && args.iter().all(|a| side_effect_free(dialect, a))
        }
    }
}

/// `{reads_storage, writes_storage, reads_memory, writes_memory,
/// invalidates_storage, invalidates_memory, can_terminate}` per
/// spec.md §4.2 SideEffectsCollector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectFlags {
    pub reads_storage: bool,
    pub writes_storage: bool,
    pub reads_memory: bool,
    pub writes_memory: bool,
    pub invalidates_storage: bool,
    pub invalidates_memory: bool,
    pub can_terminate: bool,
}

impl EffectFlags {
    pub fn merge(self, other: EffectFlags) -> EffectFlags {
        EffectFlags {
            reads_storage: self.reads_storage || other.reads_storage,
            writes_storage: self.writes_storage || other.writes_storage,
            reads_memory: self.reads_memory || other.reads_memory,
            writes_memory: self.writes_memory || other.writes_memory,
            invalidates_storage: self.invalidates_storage || other.invalidates_storage,
            invalidates_memory: self.invalidates_memory || other.invalidates_memory,
            can_terminate: self.can_terminate || other.can_terminate,
        }
    }

    pub fn has_any_effect(&self) -> bool {
        self.reads_storage
            || self.writes_storage
            || self.reads_memory
            || self.writes_memory
            || self.invalidates_storage
            || self.invalidates_memory
            || self.can_terminate
    }
}

pub fn invalidates_storage(dialect: &dyn Dialect, expr: &Expression) -> bool {
    collect_effects_expr(dialect, expr).invalidates_storage
}

pub fn invalidates_memory(dialect: &dyn Dialect, expr: &Expression) -> bool {
    collect_effects_expr(dialect, expr).invalidates_memory
}

pub fn collect_effects_expr(dialect: &dyn Dialect, expr: &Expression) -> EffectFlags {
    match expr {
        Expression::Literal { .. } | Expression::Identifier { .. } => EffectFlags::default(),
        Expression::FunctionCall { name, args, .. } => {
            let own = match dialect.builtin(name.as_str()) {
                Some(info) => EffectFlags {
                    reads_storage: info.reads_storage,
                    writes_storage: info.writes_storage,
                    reads_memory: info.reads_memory,
                    writes_memory: info.writes_memory,
                    invalidates_storage: info.invalidates_storage,
                    invalidates_memory: info.invalidates_memory,
                    can_terminate: info.can_terminate,
                },
                // An unknown (user-defined) callee is conservatively
                // assumed to touch everything it could read or write.
                // It is not assumed to be non-returning: only a
                // dialect-recognized terminator builtin, or an explicit
                // Break/Continue/Leave, ends a block's control flow.
                None => EffectFlags {
                    reads_storage: true,
                    writes_storage: true,
                    reads_memory: true,
                    writes_memory: true,
                    invalidates_storage: true,
                    invalidates_memory: true,
                    can_terminate: false,
                },
            };
            args.iter().fold(own, |acc, a| acc.merge(collect_effects_expr(dialect, a)))
        }
    }
}

pub fn collect_effects_stmt(dialect: &dyn Dialect, stmt: &Statement) -> EffectFlags {
    match stmt {
        Statement::ExpressionStatement(e) => collect_effects_expr(dialect, e),
        Statement::Assignment { value, .. } => collect_effects_expr(dialect, value),
        Statement::VariableDeclaration { value, .. } => value
            .as_ref()
            .map(|v| collect_effects_expr(dialect, v))
            .unwrap_or_default(),
        Statement::If { cond, body, .. } => {
            collect_effects_expr(dialect, cond).merge(collect_effects_block(dialect, body))
        }
        Statement::Switch { cond, cases, .. } => cases.iter().fold(
            collect_effects_expr(dialect, cond),
            |acc, case| {
                let case_cond = match case {
                    SwitchCase::Case(lit, _) => collect_effects_expr(dialect, lit),
                    SwitchCase::Default(_) => EffectFlags::default(),
                };
                acc.merge(case_cond)
                    .merge(collect_effects_block(dialect, case.body()))
            },
        ),
        Statement::ForLoop {
            init,
            cond,
            post,
            body,
            ..
        } => collect_effects_block(dialect, init)
            .merge(collect_effects_expr(dialect, cond))
            .merge(collect_effects_block(dialect, post))
            .merge(collect_effects_block(dialect, body)),
        Statement::Break(_) | Statement::Continue(_) => EffectFlags::default(),
        Statement::Leave(_) => EffectFlags {
            can_terminate: true,
            ..Default::default()
        },
        // A nested function's effects are not attributed to its
        // containing scope: it only has effects when called.
        Statement::FunctionDefinition { .. } => EffectFlags::default(),
        Statement::Block(b) => collect_effects_block(dialect, b),
    }
}

pub fn collect_effects_block(dialect: &dyn Dialect, block: &Block) -> EffectFlags {
    block
        .statements
        .iter()
        .fold(EffectFlags::default(), |acc, s| {
            acc.merge(collect_effects_stmt(dialect, s))
        })
}
