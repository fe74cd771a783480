//! The IR data model: identifiers, source locations, expressions and
//! statements.
//!
//! The tree is a flat tagged sum (spec.md DESIGN NOTES: "tagged variants
//! for AST") rather than a trait-object hierarchy, so every pass matches
//! exhaustively and the compiler catches a missed variant at build time.

use std::fmt;
use std::rc::Rc;

/// A wrapper over an interned string; equality is by content.
///
/// Identifiers are cheap to clone (`Rc<str>` pointer clone) since passes
/// copy them constantly while rewriting the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Rc<str>);

impl Identifier {
    pub fn new(name: impl AsRef<str>) -> Self {
        Identifier(Rc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::new(s)
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Identifier(Rc::from(s.as_str()))
    }
}

impl std::borrow::Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// An opaque triple attached to every statement and expression purely
/// for diagnostics; never load-bearing for rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub source_id: u32,
    pub start_offset: u32,
    pub end_offset: u32,
}

impl SourceLocation {
    /// A location carrying no diagnostic information, used by passes
    /// that synthesize new nodes (fresh declarations, shims, hoisted
    /// statements) with no single originating span.
    pub const NONE: SourceLocation = SourceLocation {
        source_id: u32::MAX,
        start_offset: 0,
        end_offset: 0,
    };

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// Literal value kind, per spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    String,
    Boolean,
}

/// Expression sum type: literal, identifier reference, or call to a
/// built-in/user function.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal {
        value: Rc<str>,
        kind: LiteralKind,
        location: SourceLocation,
    },
    Identifier {
        name: Identifier,
        location: SourceLocation,
    },
    FunctionCall {
        name: Identifier,
        args: Vec<Expression>,
        location: SourceLocation,
    },
}

impl Expression {
    pub fn location(&self) -> SourceLocation {
        match self {
            Expression::Literal { location, .. }
            | Expression::Identifier { location, .. }
            | Expression::FunctionCall { location, .. } => *location,
        }
    }

    pub fn literal(value: impl AsRef<str>, kind: LiteralKind) -> Self {
        Expression::Literal {
            value: Rc::from(value.as_ref()),
            kind,
            location: SourceLocation::NONE,
        }
    }

    pub fn number_literal(value: impl AsRef<str>) -> Self {
        Self::literal(value, LiteralKind::Number)
    }

    pub fn identifier(name: impl Into<Identifier>) -> Self {
        Expression::Identifier {
            name: name.into(),
            location: SourceLocation::NONE,
        }
    }

    pub fn call(name: impl Into<Identifier>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.into(),
            args,
            location: SourceLocation::NONE,
        }
    }

    pub fn as_literal(&self) -> Option<(&str, LiteralKind)> {
        match self {
            Expression::Literal { value, kind, .. } => Some((value, *kind)),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Expression::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<(&Identifier, &[Expression])> {
        match self {
            Expression::FunctionCall { name, args, .. } => Some((name, args)),
            _ => None,
        }
    }

    /// True for literals whose textual value is a numeric zero or the
    /// boolean/string conventionally standing in for "false". Used by
    /// `ControlFlowSimplifier`/`StructuralSimplifier` constant folding
    /// of conditions without needing a dialect round-trip.
    pub fn is_falsy_literal(&self) -> bool {
        matches!(self.as_literal(), Some(("0", LiteralKind::Number)))
            || matches!(self.as_literal(), Some(("false", LiteralKind::Boolean)))
    }

    pub fn is_truthy_literal(&self) -> bool {
        match self.as_literal() {
            Some((v, LiteralKind::Number)) => v != "0",
            Some(("true", LiteralKind::Boolean)) => true,
            _ => false,
        }
    }
}

/// One case of a `Switch`: a literal-guarded case, or the default.
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchCase {
    Case(Expression, Block),
    Default(Block),
}

impl SwitchCase {
    pub fn body(&self) -> &Block {
        match self {
            SwitchCase::Case(_, body) | SwitchCase::Default(body) => body,
        }
    }

    pub fn body_mut(&mut self) -> &mut Block {
        match self {
            SwitchCase::Case(_, body) | SwitchCase::Default(body) => body,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, SwitchCase::Default(_))
    }
}

/// Statement sum type, per spec.md §3.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    ExpressionStatement(Expression),
    Assignment {
        targets: Vec<Identifier>,
        value: Expression,
        location: SourceLocation,
    },
    VariableDeclaration {
        targets: Vec<Identifier>,
        value: Option<Expression>,
        location: SourceLocation,
    },
    If {
        cond: Expression,
        body: Block,
        location: SourceLocation,
    },
    Switch {
        cond: Expression,
        cases: Vec<SwitchCase>,
        location: SourceLocation,
    },
    ForLoop {
        init: Block,
        cond: Expression,
        post: Block,
        body: Block,
        location: SourceLocation,
    },
    Break(SourceLocation),
    Continue(SourceLocation),
    Leave(SourceLocation),
    FunctionDefinition {
        name: Identifier,
        parameters: Vec<Identifier>,
        returns: Vec<Identifier>,
        body: Block,
        location: SourceLocation,
    },
    Block(Block),
}

impl Statement {
    pub fn location(&self) -> SourceLocation {
        match self {
            Statement::ExpressionStatement(e) => e.location(),
            Statement::Assignment { location, .. }
            | Statement::VariableDeclaration { location, .. }
            | Statement::If { location, .. }
            | Statement::Switch { location, .. }
            | Statement::ForLoop { location, .. }
            | Statement::Break(location)
            | Statement::Continue(location)
            | Statement::Leave(location)
            | Statement::FunctionDefinition { location, .. } => *location,
            Statement::Block(b) => b
                .statements
                .first()
                .map(Statement::location)
                .unwrap_or(SourceLocation::NONE),
        }
    }

    /// An unconditional terminator per spec.md §3's Break/Continue/Leave
    /// placement invariant: control never falls through past one within
    /// the same block.
    pub fn is_unconditional_terminator(&self) -> bool {
        matches!(
            self,
            Statement::Break(_) | Statement::Continue(_) | Statement::Leave(_)
        )
    }

    pub fn is_function_definition(&self) -> bool {
        matches!(self, Statement::FunctionDefinition { .. })
    }
}

/// An ordered sequence of statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Block { statements }
    }

    pub fn empty() -> Self {
        Block::default()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// Re-established at the end of a suite run; opaque to the optimizer
/// core, which only checks `is_valid` and forwards `diagnostics` when
/// re-analysis rejects the optimized object (spec.md §7 Analyzer
/// rejection).
#[derive(Debug, Clone, Default)]
pub struct AnalysisInfo {
    pub is_valid: bool,
    pub diagnostics: Option<String>,
}

/// `{code, analysisInfo, subObjects}` per spec.md §3. Only `code` is
/// rewritten by the core; `analysisInfo` is re-established by the
/// caller-supplied `Analyzer` at the end of `suite::optimize`.
#[derive(Debug, Clone, Default)]
pub struct Object {
    pub code: Block,
    pub analysis_info: AnalysisInfo,
    pub sub_objects: std::collections::BTreeMap<Identifier, Object>,
}

impl Object {
    pub fn new(code: Block) -> Self {
        Object {
            code,
            analysis_info: AnalysisInfo::default(),
            sub_objects: std::collections::BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_equality_is_by_content() {
        assert_eq!(Identifier::new("x"), Identifier::new("x"));
        assert_ne!(Identifier::new("x"), Identifier::new("y"));
    }

    #[test]
    fn falsy_and_truthy_literals() {
        assert!(Expression::number_literal("0").is_falsy_literal());
        assert!(!Expression::number_literal("0").is_truthy_literal());
        assert!(Expression::number_literal("1").is_truthy_literal());
        assert!(!Expression::number_literal("3").is_falsy_literal());
    }

    #[test]
    fn switch_case_accessors() {
        let case = SwitchCase::Case(Expression::number_literal("1"), Block::empty());
        assert!(!case.is_default());
        let default = SwitchCase::Default(Block::empty());
        assert!(default.is_default());
    }
}
