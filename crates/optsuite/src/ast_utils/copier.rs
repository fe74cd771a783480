//! Structural deep copy, used for diff-debugging (`recipe::DebugMode::PrintChanges`)
//! and by passes that must retain a pre-state snapshot.
//!
//! Since every AST node owns its data (no parent back-references, per
//! spec.md DESIGN NOTES "scope tracking"), `Clone` already produces an
//! independently owned, structurally identical copy; `ASTCopier` exists
//! as the named entry point spec.md calls for, rather than reinventing
//! traversal by hand.

use crate::ast::{Block, Object};

pub struct ASTCopier;

impl ASTCopier {
    pub fn copy_block(block: &Block) -> Block {
        block.clone()
    }

    pub fn copy_object(object: &Object) -> Object {
        object.clone()
    }
}
