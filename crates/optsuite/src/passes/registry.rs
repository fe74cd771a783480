//! The one-shot, immutable pass catalog (spec.md §6's authoritative
//! name/abbreviation table), built once and shared for the lifetime of
//! the process.

use crate::passes::{expr_form, inlining, loop_opts, simplify, structural, Pass};
use std::sync::OnceLock;

pub struct Catalog {
    passes: Vec<Box<dyn Pass>>,
}

impl Catalog {
    pub fn all(&self) -> impl Iterator<Item = &dyn Pass> {
        self.passes.iter().map(|p| p.as_ref())
    }

    pub fn by_abbreviation(&self, abbreviation: char) -> Option<&dyn Pass> {
        self.all().find(|p| p.abbreviation() == abbreviation)
    }

    pub fn by_name(&self, name: &str) -> Option<&dyn Pass> {
        self.all().find(|p| p.name() == name)
    }
}

static CATALOG: OnceLock<Catalog> = OnceLock::new();

pub fn catalog() -> &'static Catalog {
    CATALOG.get_or_init(|| Catalog {
        passes: vec![
            Box::new(structural::VarDeclInitializer),
            Box::new(structural::ForLoopInitRewriter),
            Box::new(structural::ForLoopConditionIntoBody),
            Box::new(structural::ForLoopConditionOutOfBody),
            Box::new(structural::BlockFlattener),
            Box::new(structural::FunctionGrouper),
            Box::new(structural::FunctionHoister),
            Box::new(structural::CircularReferencesPruner),
            Box::new(expr_form::ExpressionSplitter),
            Box::new(expr_form::ExpressionJoiner),
            Box::new(expr_form::SSATransform),
            Box::new(expr_form::SSAReverser),
            Box::new(expr_form::Rematerialiser),
            Box::new(expr_form::LiteralRematerialiser),
            Box::new(simplify::ExpressionSimplifier),
            Box::new(simplify::CommonSubexpressionEliminator),
            Box::new(simplify::LoadResolver),
            Box::new(simplify::ConditionalSimplifier),
            Box::new(simplify::ConditionalUnsimplifier),
            Box::new(simplify::ControlFlowSimplifier),
            Box::new(simplify::StructuralSimplifier),
            Box::new(simplify::DeadCodeEliminator),
            Box::new(simplify::UnusedPruner),
            Box::new(simplify::RedundantAssignEliminator),
            Box::new(inlining::ExpressionInliner),
            Box::new(inlining::FullInliner),
            Box::new(inlining::EquivalentFunctionCombiner),
            Box::new(loop_opts::LoopInvariantCodeMotion),
        ],
    })
}
