//! The dialect descriptor (spec.md §3) and built-in operation metadata.
//!
//! Grounded in `crates/compiler/src/config.rs`'s `ExternalBuiltin`: a
//! plain data record plus a trait boundary that lets a caller extend
//! the known operation set without touching this crate.

use crate::ast::{Identifier, LiteralKind};

/// Side-effect and movability metadata for one built-in operation.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinInfo {
    pub arity: usize,
    pub num_returns: usize,
    /// May be duplicated or reordered relative to any other statement.
    pub movable: bool,
    pub side_effect_free: bool,
    pub reads_storage: bool,
    pub writes_storage: bool,
    pub reads_memory: bool,
    pub writes_memory: bool,
    /// Invalidates previously known storage contents beyond the slot it
    /// writes (e.g. a call into unknown code).
    pub invalidates_storage: bool,
    pub invalidates_memory: bool,
    /// May end the current function/transaction (e.g. revert/stop),
    /// relevant to `DeadCodeEliminator` and `LoopInvariantCodeMotion`.
    pub can_terminate: bool,
}

impl BuiltinInfo {
    /// A pure, movable, side-effect-free operation of the given arity.
    pub const fn pure(arity: usize, num_returns: usize) -> Self {
        BuiltinInfo {
            arity,
            num_returns,
            movable: true,
            side_effect_free: true,
            reads_storage: false,
            writes_storage: false,
            reads_memory: false,
            writes_memory: false,
            invalidates_storage: false,
            invalidates_memory: false,
            can_terminate: false,
        }
    }
}

/// Describes the built-in operation set and naming constraints of the
/// IR target (spec.md §3).
pub trait Dialect {
    /// Look up a built-in by name; `None` means `name` refers to a
    /// user-defined function instead.
    fn builtin(&self, name: &str) -> Option<BuiltinInfo>;

    /// Names the optimizer must not introduce or reuse beyond what the
    /// caller supplies as `externally_used_names`.
    fn is_fixed_name(&self, name: &str) -> bool;

    /// Relative cost of materializing a literal, used by the inliner's
    /// cost model and `ConstantOptimiser`.
    fn literal_cost(&self, value: &str, kind: LiteralKind) -> u32 {
        let _ = kind;
        value.len() as u32
    }

    /// Whether the dialect targets a stack machine (affects the stack
    /// compressor and `ForLoopConditionIntoBody`/`OutOfBody`).
    fn is_stack_like(&self) -> bool;

    /// Whether the dialect targets a linear-memory model (affects the
    /// suite's leading-empty-block trim, spec.md §4.6 step 8).
    fn is_linear_memory_like(&self) -> bool;

    /// Maximum live stack depth a function may reach, for stack-like
    /// dialects. `None` means unconstrained.
    fn stack_limit(&self) -> Option<u32> {
        None
    }

    /// Evaluate a built-in call whose arguments are all numeric
    /// literals, for `ExpressionSimplifier`'s constant folding. `None`
    /// means the dialect has no folding rule for `name`.
    fn fold_constant(&self, name: &str, args: &[&str]) -> Option<String> {
        let _ = (name, args);
        None
    }

    /// The name of a ternary/select builtin `select(cond, a, b)` used
    /// by `ConditionalSimplifier`, if the dialect has one.
    fn select_builtin(&self) -> Option<&str> {
        None
    }

    /// Pairs a storage/memory "load" built-in with the "store" built-in
    /// that writes the same kind of location, for `LoadResolver`.
    /// Returns `(store_name, is_storage)` for a given load name.
    fn store_for_load(&self, load_name: &str) -> Option<(&str, bool)> {
        let _ = load_name;
        None
    }

    /// The complement/negation builtin used by `ConstantOptimiser`'s
    /// large-literal rewrite, e.g. `"not"`.
    fn complement_builtin(&self) -> Option<&str> {
        None
    }

    /// Every name `is_fixed_name` would accept, for seeding the
    /// disambiguator's reserved set (spec.md §4.6 step 1: `reserved =
    /// externallyUsedNames ∪ dialect.fixedNames`). Most dialects only
    /// need the membership check above; this defaults to empty.
    fn fixed_names(&self) -> Vec<Identifier> {
        Vec::new()
    }
}
