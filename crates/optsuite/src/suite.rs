//! The suite entry point (spec.md §4.6): orchestrates disambiguation,
//! the default recipe, the stack-compressor feedback loop, the
//! dialect-specific final passes, and the trailing name cleanup, in
//! the exact order spec.md §4.6 lists.

use crate::ast::{AnalysisInfo, Block, Identifier, Object, Statement};
use crate::ast_utils::size::code_size;
use crate::ast_utils::NameDispenser;
use crate::config::OptimizeOptions;
use crate::constant_optimiser::{ConstantOptimiser, GasMeter};
use crate::dialect::Dialect;
use crate::disambiguator::Disambiguator;
use crate::error::OptimizerError;
use crate::passes::Context;
use crate::recipe::run_recipe;
use crate::stack_compressor::StackCompressor;
use crate::varname_cleaner::VarNameCleaner;
use std::collections::HashSet;

/// Long fixed-point-laden recipe run immediately after disambiguation
/// (spec.md §6, authoritative literal).
const DEFAULT_RECIPE: &str =
    "dhfoDgvulfnTUtnIf(xarrscLM cCTUtTOntnfDIul Lcul Vcul jj eul xarulrul xarrcL gvif CTUcarrLsTOtfDncarrIulc)jmuljuljul VcTOcul jmul";

/// Short recipe run after the stack compressor (spec.md §6,
/// authoritative literal).
const TAIL_RECIPE: &str = "fDnTOc g";

/// Re-establishes `object.analysisInfo`, the external counterpart to
/// the surface parser's `parse`/`analyze` pair (spec.md §6 "Interfaces
/// consumed from external collaborators").
pub trait Analyzer {
    fn analyze(&self, object: &Object) -> AnalysisInfo;
}

/// Emits a non-fatal warning when the suite detects a condition worth
/// surfacing to the embedder but not worth aborting over — currently
/// only "the stack compressor gave up before every function fit".
pub trait ReportingHook {
    fn report(&self, message: &str);
}

/// Runs the full suite against `object.code` in place, per spec.md
/// §4.6's ten steps, and re-establishes `object.analysis_info` via
/// `analyzer`. Returns `Err(OptimizerError::AnalyzerRejection)` if the
/// re-analysis rejects the optimized object.
pub fn optimize(
    dialect: &dyn Dialect,
    gas_meter: Option<&dyn GasMeter>,
    analyzer: &dyn Analyzer,
    reporting_hook: &dyn ReportingHook,
    object: &mut Object,
    externally_used_names: &HashSet<Identifier>,
    options: &OptimizeOptions,
) -> Result<(), OptimizerError> {
    let size_before = code_size(&object.code);
    tracing::info!(size_before, "suite::optimize starting");

    // Step 1: reserved = externallyUsedNames ∪ dialect.fixedNames.
    let mut reserved: HashSet<Identifier> = externally_used_names.clone();
    reserved.extend(dialect.fixed_names());
    let mut dispenser = NameDispenser::new(reserved.iter().cloned());

    let code = std::mem::take(&mut object.code);

    // Step 2: disambiguate.
    let code = Disambiguator::run(code, &mut dispenser);

    let mut ctx = Context::new(dialect, &mut dispenser, &reserved);

    // Step 3: default recipe.
    let code = run_recipe(DEFAULT_RECIPE, &mut ctx, code, options.recipe_loop_max_iterations, options.debug_mode)?;

    // Step 4: run "g" (FunctionGrouper) once.
    let code = run_recipe("g", &mut ctx, code, options.recipe_loop_max_iterations, options.debug_mode)?;

    // Step 5: stack compressor, up to N iterations.
    let mut code = code;
    if options.optimize_stack_allocation {
        let fits = StackCompressor::compress(&mut code, dialect, options.stack_compressor_max_iterations)?;
        if !fits {
            reporting_hook.report("stack compressor could not fit every function within the dialect's stack limit");
        }
    }

    // Step 6: tail recipe.
    let code = run_recipe(TAIL_RECIPE, &mut ctx, code, options.recipe_loop_max_iterations, options.debug_mode)?;

    // Step 7: dialect-specific constant optimization.
    let code = match (dialect.is_stack_like(), gas_meter) {
        (true, Some(gas_meter)) => ConstantOptimiser::run(code, dialect, gas_meter),
        _ => code,
    };

    // Step 8: trim a leading empty block for linear-memory dialects.
    let code = if dialect.is_linear_memory_like() {
        trim_leading_empty_block(code)
    } else {
        code
    };

    // Step 9: final name cleanup, destroys the unique-names invariant.
    let code = VarNameCleaner::run(code);

    object.code = code;

    // Step 10: re-run analysis.
    let analysis = analyzer.analyze(object);
    let size_after = code_size(&object.code);
    if !analysis.is_valid {
        tracing::warn!(size_before, size_after, "re-analysis rejected optimized object");
        let diagnostics = analysis.diagnostics.unwrap_or_default();
        object.analysis_info = AnalysisInfo { is_valid: false, diagnostics: Some(diagnostics.clone()) };
        return Err(OptimizerError::AnalyzerRejection { diagnostics });
    }
    object.analysis_info = analysis;

    tracing::info!(size_before, size_after, "suite::optimize finished");
    Ok(())
}

/// Drops the leading `Block(main)` introduced by `FunctionHoister` when
/// it is empty, but only when more than one statement follows it
/// (spec.md §9's literal, ambiguous condition — see DESIGN.md).
fn trim_leading_empty_block(block: Block) -> Block {
    let leading_is_empty = matches!(
        block.statements.first(),
        Some(Statement::Block(inner)) if inner.is_empty()
    );
    if leading_is_empty && block.statements.len() > 2 {
        let mut statements = block.statements;
        statements.remove(0);
        Block::new(statements)
    } else {
        block
    }
}
