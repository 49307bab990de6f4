//! Numeric functions, expressions and constraints: a constraint
//! compares two function expressions with a binary comparator;
//! expressions are a small recursive tree of constants, function
//! applications and the four arithmetic operators.
//!
//! `NumericConstraint` exposes a single canonical identity accessor,
//! [`NumericConstraint::identity`], rather than two near-duplicate
//! ones.

use crate::indices::FunctionIndex;
use crate::term::Term;
use smallvec::SmallVec;
use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum NumericExpression {
    /// A constant, stored as its IEEE bit pattern so the type can
    /// derive `Eq`/`Hash` (PDDL numeric constants are otherwise
    /// arbitrary rationals; we evaluate through `f64`).
    Constant(u64),
    Function {
        function: FunctionIndex,
        terms: SmallVec<[Term; 4]>,
    },
    Binary(BinaryOp, Box<NumericExpression>, Box<NumericExpression>),
}

impl NumericExpression {
    pub fn constant(value: f64) -> Self {
        NumericExpression::Constant(value.to_bits())
    }

    pub fn binary(op: BinaryOp, lhs: NumericExpression, rhs: NumericExpression) -> Self {
        NumericExpression::Binary(op, Box::new(lhs), Box::new(rhs))
    }
}

/// Failure evaluating a numeric expression or applying a numeric
/// effect: division by zero, an
/// undefined function value, or mixing effect families on the same
/// function within one ground action.
#[derive(thiserror::Error, Debug, Clone, Eq, PartialEq)]
pub enum NumericError {
    #[error("division by zero evaluating numeric expression")]
    DivisionByZero,
    #[error("function value is undefined in this state")]
    UndefinedFunctionValue,
    #[error("numeric effect assigns to the same function twice with incompatible effect families")]
    ConflictingEffectFamilies,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Comparator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Neq,
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
            Comparator::Eq => "=",
            Comparator::Neq => "!=",
        };
        write!(f, "{s}")
    }
}

impl Comparator {
    pub fn evaluate(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparator::Gt => lhs > rhs,
            Comparator::Ge => lhs >= rhs,
            Comparator::Lt => lhs < rhs,
            Comparator::Le => lhs <= rhs,
            Comparator::Eq => lhs == rhs,
            Comparator::Neq => lhs != rhs,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct NumericConstraint {
    pub comparator: Comparator,
    pub lhs: NumericExpression,
    pub rhs: NumericExpression,
}

impl NumericConstraint {
    /// The canonical identity tuple used for interning/equality.
    pub fn identity(&self) -> (Comparator, &NumericExpression, &NumericExpression) {
        (self.comparator, &self.lhs, &self.rhs)
    }
}

/// Numeric effect forms: `f := e`, `f += e`, `f -= e`, `f *=
/// e`, `f /= e`, applied over a fluent or auxiliary function.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NumericEffectKind {
    Assign,
    Increase,
    Decrease,
    ScaleUp,
    ScaleDown,
}

impl NumericEffectKind {
    /// The family a kind belongs to: mixing `Assign` with any additive
    /// or multiplicative family on the same function within one ground
    /// action is a [`NumericError::ConflictingEffectFamilies`],
    /// detected at ground time.
    pub fn family(self) -> EffectFamily {
        match self {
            NumericEffectKind::Assign => EffectFamily::Assign,
            NumericEffectKind::Increase | NumericEffectKind::Decrease => EffectFamily::Additive,
            NumericEffectKind::ScaleUp | NumericEffectKind::ScaleDown => EffectFamily::Multiplicative,
        }
    }

    pub fn apply(self, current: f64, operand: f64) -> f64 {
        match self {
            NumericEffectKind::Assign => operand,
            NumericEffectKind::Increase => current + operand,
            NumericEffectKind::Decrease => current - operand,
            NumericEffectKind::ScaleUp => current * operand,
            NumericEffectKind::ScaleDown => current / operand,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum EffectFamily {
    Assign,
    Additive,
    Multiplicative,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct NumericEffect {
    pub kind: NumericEffectKind,
    pub function: FunctionIndex,
    pub function_terms: SmallVec<[Term; 4]>,
    pub operand: NumericExpression,
}
