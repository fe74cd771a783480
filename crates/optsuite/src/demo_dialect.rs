//! A concrete, minimal stack-machine dialect used by this crate's own
//! tests and available to embedders as a starting point.
//!
//! Grounded in `crates/compiler/src/builtins.rs`, which ships a
//! concrete built-in table alongside the extensible
//! `ExternalBuiltin` mechanism rather than leaving every name
//! caller-supplied.

use crate::ast::LiteralKind;
use crate::dialect::{BuiltinInfo, Dialect};

/// A small EVM-shaped stack dialect: arithmetic/comparison/bitwise
/// builtins, `mstore`/`mload`, `sstore`/`sload`, and terminators
/// `stop`/`revert`/`return`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoStackDialect {
    /// When true, `is_linear_memory_like` also returns true, exercising
    /// the suite's leading-empty-block trim path (spec.md §4.6 step 8).
    pub linear_memory: bool,
    pub stack_limit: Option<u32>,
}

impl DemoStackDialect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_linear_memory(mut self) -> Self {
        self.linear_memory = true;
        self
    }

    pub fn with_stack_limit(mut self, limit: u32) -> Self {
        self.stack_limit = Some(limit);
        self
    }
}

impl Dialect for DemoStackDialect {
    fn builtin(&self, name: &str) -> Option<BuiltinInfo> {
        Some(match name {
            "add" | "sub" | "mul" | "div" | "mod" | "and" | "or" | "xor" | "lt" | "gt" | "eq" => {
                BuiltinInfo::pure(2, 1)
            }
            "not" | "iszero" => BuiltinInfo::pure(1, 1),
            "mload" => BuiltinInfo {
                movable: false,
                reads_memory: true,
                ..BuiltinInfo::pure(1, 1)
            },
            "sload" => BuiltinInfo {
                movable: false,
                reads_storage: true,
                ..BuiltinInfo::pure(1, 1)
            },
            "mstore" => BuiltinInfo {
                arity: 2,
                num_returns: 0,
                movable: false,
                side_effect_free: false,
                writes_memory: true,
                ..BuiltinInfo::pure(2, 0)
            },
            "sstore" => BuiltinInfo {
                arity: 2,
                num_returns: 0,
                movable: false,
                side_effect_free: false,
                writes_storage: true,
                ..BuiltinInfo::pure(2, 0)
            },
            "call" => BuiltinInfo {
                arity: 2,
                num_returns: 1,
                movable: false,
                side_effect_free: false,
                invalidates_storage: true,
                invalidates_memory: true,
                ..BuiltinInfo::pure(2, 1)
            },
            "stop" | "revert" | "return" => BuiltinInfo {
                arity: if name == "stop" { 0 } else { 2 },
                num_returns: 0,
                movable: false,
                side_effect_free: false,
                can_terminate: true,
                ..BuiltinInfo::pure(0, 0)
            },
            _ => return None,
        })
    }

    fn is_fixed_name(&self, name: &str) -> bool {
        self.builtin(name).is_some()
    }

    fn literal_cost(&self, value: &str, kind: LiteralKind) -> u32 {
        match kind {
            LiteralKind::Number => value.trim_start_matches('0').len().max(1) as u32,
            _ => value.len() as u32,
        }
    }

    fn is_stack_like(&self) -> bool {
        true
    }

    fn is_linear_memory_like(&self) -> bool {
        self.linear_memory
    }

    fn stack_limit(&self) -> Option<u32> {
        self.stack_limit
    }

    fn fold_constant(&self, name: &str, args: &[&str]) -> Option<String> {
        let parse = |s: &str| s.parse::<i128>().ok();
        match (name, args) {
            ("add", [a, b]) => Some((parse(a)? + parse(b)?).to_string()),
            ("sub", [a, b]) => Some((parse(a)? - parse(b)?).to_string()),
            ("mul", [a, b]) => Some((parse(a)? * parse(b)?).to_string()),
            ("div", [a, b]) if parse(b)? != 0 => Some((parse(a)? / parse(b)?).to_string()),
            ("and", [a, b]) => Some((parse(a)? & parse(b)?).to_string()),
            ("or", [a, b]) => Some((parse(a)? | parse(b)?).to_string()),
            ("xor", [a, b]) => Some((parse(a)? ^ parse(b)?).to_string()),
            ("lt", [a, b]) => Some(if parse(a)? < parse(b)? { "1" } else { "0" }.to_string()),
            ("gt", [a, b]) => Some(if parse(a)? > parse(b)? { "1" } else { "0" }.to_string()),
            ("eq", [a, b]) => Some(if parse(a)? == parse(b)? { "1" } else { "0" }.to_string()),
            ("iszero", [a]) => Some(if parse(a)? == 0 { "1" } else { "0" }.to_string()),
            ("not", [a]) => Some((!parse(a)?).to_string()),
            _ => None,
        }
    }

    fn select_builtin(&self) -> Option<&str> {
        Some("select")
    }

    fn store_for_load(&self, load_name: &str) -> Option<(&str, bool)> {
        match load_name {
            "mload" => Some(("mstore", false)),
            "sload" => Some(("sstore", true)),
            _ => None,
        }
    }

    fn complement_builtin(&self) -> Option<&str> {
        Some("not")
    }

    fn fixed_names(&self) -> Vec<crate::ast::Identifier> {
        [
            "add", "sub", "mul", "div", "mod", "and", "or", "xor", "lt", "gt", "eq", "not",
            "iszero", "mload", "sload", "mstore", "sstore", "call", "stop", "revert", "return",
            "select",
        ]
        .into_iter()
        .map(crate::ast::Identifier::new)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_builtins_are_pure() {
        let d = DemoStackDialect::new();
        let add = d.builtin("add").unwrap();
        assert!(add.movable);
        assert!(add.side_effect_free);
        assert_eq!(add.arity, 2);
    }

    fn n(v: &str) -> &str {
        v
    }

    #[test]
    fn folds_add() {
        let d = DemoStackDialect::new();
        assert_eq!(d.fold_constant("add", &[n("1"), n("2")]), Some("3".into()));
    }

    #[test]
    fn mstore_is_not_movable() {
        let d = DemoStackDialect::new();
        assert!(!d.builtin("mstore").unwrap().movable);
        assert!(d.builtin("mstore").unwrap().writes_memory);
    }
}
