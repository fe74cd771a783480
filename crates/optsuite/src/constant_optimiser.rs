//! The dialect-specific final pass (spec.md §4.6 step 7): rewrites a
//! numeric literal to a cheaper equivalent representation when the
//! caller-supplied gas meter says doing so costs less, for dialects
//! that are stack-like and where a gas meter is actually available.
//!
//! The only alternate representation this crate knows is "materialize
//! the bitwise complement, then negate it" via
//! `Dialect::complement_builtin`; a full implementation would also
//! consider shift/product encodings, but those need an arbitrary
//! precision integer type this crate has no other use for.

use crate::ast::{Block, Expression, LiteralKind};
use crate::ast_utils::visitor::{walk_expression_mut, MutVisitor};
use crate::dialect::Dialect;

/// Cost estimates supplied by the embedder for a literal's
/// materialization, and the fixed overhead of wrapping a value in one
/// additional builtin call (spec.md §6 "gas-meter callable returning a
/// cost estimate for a literal or expression").
pub trait GasMeter {
    fn literal_cost(&self, value: &str, kind: LiteralKind) -> u64;

    fn call_overhead(&self) -> u64 {
        1
    }
}

pub struct ConstantOptimiser;

impl ConstantOptimiser {
    pub fn run(block: Block, dialect: &dyn Dialect, gas_meter: &dyn GasMeter) -> Block {
        let mut rewriter = Rewriter { dialect, gas_meter };
        rewriter.visit_block(block)
    }
}

struct Rewriter<'a> {
    dialect: &'a dyn Dialect,
    gas_meter: &'a dyn GasMeter,
}

impl<'a> MutVisitor for Rewriter<'a> {
    fn visit_expression(&mut self, expr: Expression) -> Expression {
        let expr = walk_expression_mut(self, expr);
        let Expression::Literal { value, kind: LiteralKind::Number, location } = &expr else {
            return expr;
        };
        let Some(complement_builtin) = self.dialect.complement_builtin() else {
            return expr;
        };
        let Ok(parsed) = value.parse::<i128>() else {
            return expr;
        };
        let direct_cost = self.gas_meter.literal_cost(value, LiteralKind::Number);
        let complement = (!parsed).to_string();
        let complement_cost =
            self.gas_meter.literal_cost(&complement, LiteralKind::Number) + self.gas_meter.call_overhead();
        if complement_cost < direct_cost {
            Expression::FunctionCall {
                name: complement_builtin.into(),
                args: vec![Expression::Literal {
                    value: complement.into(),
                    kind: LiteralKind::Number,
                    location: *location,
                }],
                location: *location,
            }
        } else {
            expr
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{SourceLocation, Statement};
    use crate::demo_dialect::DemoStackDialect;

    struct ByteLengthMeter;
    impl GasMeter for ByteLengthMeter {
        fn literal_cost(&self, value: &str, _kind: LiteralKind) -> u64 {
            value.trim_start_matches('-').len() as u64
        }
    }

    #[test]
    fn leaves_cheap_literal_untouched() {
        let dialect = DemoStackDialect::new();
        let block = Block::new(vec![Statement::ExpressionStatement(Expression::number_literal("3"))]);
        let out = ConstantOptimiser::run(block, &dialect, &ByteLengthMeter);
        match &out.statements[0] {
            Statement::ExpressionStatement(e) => assert_eq!(e.as_literal().unwrap().0, "3"),
            _ => panic!("expected expression statement"),
        }
    }

    #[test]
    fn rewrites_a_long_literal_into_its_complement() {
        let dialect = DemoStackDialect::new();
        // -2's complement is 1, far cheaper under a byte-length meter
        // than materializing "-2" directly plus the call overhead.
        let block = Block::new(vec![Statement::ExpressionStatement(Expression::Literal {
            value: "-2".into(),
            kind: LiteralKind::Number,
            location: SourceLocation::NONE,
        })]);
        let out = ConstantOptimiser::run(block, &dialect, &ByteLengthMeter);
        match &out.statements[0] {
            Statement::ExpressionStatement(e) => {
                let (name, args) = e.as_call().expect("expected a wrapped call");
                assert_eq!(name.as_str(), "not");
                assert_eq!(args[0].as_literal().unwrap().0, "1");
            }
            _ => panic!("expected expression statement"),
        }
    }
}
