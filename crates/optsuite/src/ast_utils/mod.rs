//! Shared AST infrastructure (spec.md §4.2): deep copy, syntactic
//! equality, free/assigned-variable queries, a name generator, a code
//! size metric, and small composable walkers.

pub mod copier;
pub mod equality;
pub mod name_dispenser;
pub mod rewrite;
pub mod size;
pub mod vars;
pub mod visitor;

pub use copier::ASTCopier;
pub use equality::syntactically_equal_block;
pub use name_dispenser::NameDispenser;
pub use rewrite::{map_block, rewrite_block_flat_map};
pub use size::code_size;
pub use vars::{assigned_variables, declared_variables, free_variables};
