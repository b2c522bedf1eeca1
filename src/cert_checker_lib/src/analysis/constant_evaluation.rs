//! Evaluation of integer constant expressions, e.g. the size argument of a `memcmp` call.

use crate::intermediate_representation::*;

/// A service that evaluates expressions to integer constants if possible.
pub trait ConstantEvaluator {
    /// Evaluate the expression to an unsigned integer constant.
    /// Returns `None` if the value of the expression is not a compile-time constant
    /// or if its computation overflows.
    fn evaluate(&self, expr: &Expression) -> Option<u64>;
}

/// Folds integer literals, `sizeof` expressions and arithmetic on them.
///
/// The result of `sizeof` is given in bytes.
/// Casts are assumed to preserve the value of their argument.
pub struct ConstantFolder<'a> {
    query: &'a dyn TypeLayoutQuery,
}

impl<'a> ConstantFolder<'a> {
    /// Create a new constant folder that uses the given layout information to evaluate `sizeof` expressions.
    pub fn new(query: &'a dyn TypeLayoutQuery) -> ConstantFolder<'a> {
        ConstantFolder { query }
    }
}

impl<'a> ConstantEvaluator for ConstantFolder<'a> {
    fn evaluate(&self, expr: &Expression) -> Option<u64> {
        match expr {
            Expression::IntLiteral(value) => Some(*value),
            Expression::SizeOf(ty) => self.query.type_size_bits(ty).map(|bits| bits / 8),
            Expression::Cast { arg, .. } | Expression::ImplicitCast { arg, .. } => {
                self.evaluate(arg)
            }
            Expression::BinOp { op, lhs, rhs } => {
                let lhs = self.evaluate(lhs)?;
                let rhs = self.evaluate(rhs)?;
                match op {
                    BinOpType::Add => lhs.checked_add(rhs),
                    BinOpType::Sub => lhs.checked_sub(rhs),
                    BinOpType::Mul => lhs.checked_mul(rhs),
                    BinOpType::Div => lhs.checked_div(rhs),
                }
            }
            _ => None,
        }
    }
}

impl ConstantEvaluator for Project {
    fn evaluate(&self, expr: &Expression) -> Option<u64> {
        ConstantFolder::new(self).evaluate(expr)
    }
}
