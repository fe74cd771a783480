//! Per-run context threaded through every pass (spec.md §4.3: "The
//! Context carries the dialect, the name dispenser, and the reserved
//! set").

use crate::ast::Identifier;
use crate::ast_utils::NameDispenser;
use crate::dialect::Dialect;
use crate::error::OptimizerError;
use std::collections::HashSet;

pub struct Context<'a> {
    pub dialect: &'a dyn Dialect,
    pub dispenser: &'a mut NameDispenser,
    pub reserved: &'a HashSet<Identifier>,
}

impl<'a> Context<'a> {
    pub fn new(
        dialect: &'a dyn Dialect,
        dispenser: &'a mut NameDispenser,
        reserved: &'a HashSet<Identifier>,
    ) -> Self {
        Context { dialect, dispenser, reserved }
    }

    /// Check a pass's declared precondition; per spec.md §7, any
    /// violation is a driver/programming bug. Fires a `debug_assert!`
    /// in debug builds, then returns an `Err` in every build profile
    /// (see DESIGN.md "`PreconditionViolation` abort").
    pub fn require(
        &self,
        pass: &'static str,
        invariant: &'static str,
        holds: bool,
    ) -> Result<(), OptimizerError> {
        debug_assert!(holds, "precondition '{invariant}' violated before pass '{pass}'");
        if holds {
            Ok(())
        } else {
            Err(OptimizerError::PreconditionViolation { pass, invariant })
        }
    }
}
