//! The pass catalog (spec.md §4.3): ~28 independent rewrite passes,
//! each a pure function `(Context, Block) -> Block` with a declared
//! precondition and postcondition.

pub mod context;
pub mod expr_form;
pub mod inlining;
pub mod loop_opts;
pub mod registry;
pub mod simplify;
pub mod structural;

pub use context::Context;

use crate::ast::Block;
use crate::error::OptimizerError;

/// A single rewrite pass, identified by a stable name and a
/// single-character abbreviation (spec.md §6's authoritative table).
pub trait Pass: Send + Sync {
    fn name(&self) -> &'static str;
    fn abbreviation(&self) -> char;
    fn run(&self, ctx: &mut Context, block: Block) -> Result<Block, OptimizerError>;
}
