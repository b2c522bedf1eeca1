use super::{Type, Variable};
use crate::prelude::*;

/// An expression as it appears in the source code after semantic analysis by the compiler front-end.
///
/// Only the expression kinds relevant for the checks are represented faithfully.
/// All other expressions are represented by `Unknown` expressions
/// that only retain their static type.
///
/// Evaluating an expression is assumed to be side-effect-free
/// with the exception of `Call` and `New` expressions.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub enum Expression {
    /// An integer literal.
    IntLiteral(u64),
    /// A `sizeof` expression applied to the given type.
    SizeOf(Type),
    /// A reference to a local variable or function parameter.
    Var(Variable),
    /// Taking the address of the argument (`&arg`).
    AddressOf(Box<Expression>),
    /// Dereferencing the argument (`*arg`).
    Deref(Box<Expression>),
    /// A member access (`base.field`).
    Member {
        /// The expression denoting the record object.
        base: Box<Expression>,
        /// The name of the accessed field.
        field: String,
        /// The type of the accessed field.
        ty: Type,
    },
    /// A binary arithmetic operation.
    BinOp {
        /// The opcode of the operation
        op: BinOpType,
        /// The left hand side expression
        lhs: Box<Expression>,
        /// The right hand side expression
        rhs: Box<Expression>,
    },
    /// An explicit type conversion written in the source code
    /// (C-style cast or `static_cast`, `reinterpret_cast` and friends).
    Cast {
        /// The target type of the cast.
        ty: Type,
        /// The converted expression.
        arg: Box<Expression>,
    },
    /// A type conversion inserted by the compiler,
    /// e.g. array-to-pointer decay or the conversion of a derived-class pointer to a base-class pointer.
    ImplicitCast {
        /// The target type of the conversion.
        ty: Type,
        /// The converted expression.
        arg: Box<Expression>,
    },
    /// A call to a function given by its qualified name.
    Call {
        /// The qualified name of the called function as written in the source code.
        target: String,
        /// The arguments of the call.
        args: Vec<Expression>,
        /// The return type of the call.
        ty: Type,
    },
    /// A `new` or `new[]` expression.
    New {
        /// The allocated type. For array allocations this is the element type.
        ty: Type,
        /// The element count for array allocations, `None` for non-array allocations.
        array_size: Option<Box<Expression>>,
    },
    /// An expression not modelled by the intermediate representation.
    Unknown {
        /// A description of the expression
        description: String,
        /// The static type of the expression
        ty: Type,
    },
}

/// The opcodes of binary operations.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum BinOpType {
    Add,
    Sub,
    Mul,
    Div,
}

impl Expression {
    /// Return the static type of the expression if it can be determined.
    pub fn get_type(&self) -> Option<Type> {
        use Expression::*;
        match self {
            IntLiteral(_) => Some(Type::Builtin(super::BuiltinType::Int)),
            SizeOf(_) => Some(Type::Builtin(super::BuiltinType::Long)),
            Var(var) => Some(var.ty.clone()),
            AddressOf(arg) => Some(Type::Pointer(Box::new(arg.get_type()?))),
            Deref(arg) => arg.get_type()?.get_pointee_or_array_element_type().cloned(),
            BinOp { lhs, .. } => lhs.get_type(),
            Member { ty, .. }
            | Cast { ty, .. }
            | ImplicitCast { ty, .. }
            | Call { ty, .. }
            | Unknown { ty, .. } => Some(ty.clone()),
            New { ty, .. } => Some(Type::Pointer(Box::new(ty.clone()))),
        }
    }

    /// Strip all implicit conversions from the expression.
    pub fn ignore_implicit(&self) -> &Expression {
        let mut expr = self;
        while let Expression::ImplicitCast { arg, .. } = expr {
            expr = arg;
        }
        expr
    }

    /// Return the direct subexpressions of the expression.
    pub fn children(&self) -> Vec<&Expression> {
        use Expression::*;
        match self {
            IntLiteral(_) | SizeOf(_) | Var(_) | Unknown { .. } => Vec::new(),
            AddressOf(arg) | Deref(arg) | Cast { arg, .. } | ImplicitCast { arg, .. } => {
                vec![arg]
            }
            Member { base, .. } => vec![base],
            BinOp { lhs, rhs, .. } => vec![lhs, rhs],
            Call { args, .. } => args.iter().collect(),
            New { array_size, .. } => array_size.iter().map(|size| size.as_ref()).collect(),
        }
    }

    /// Return all `Call` expressions contained in the expression (including the expression itself)
    /// in pre-order, i.e. a call appears before the calls contained in its arguments.
    pub fn get_calls(&self) -> Vec<&Expression> {
        let mut calls = Vec::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            if matches!(expr, Expression::Call { .. }) {
                calls.push(expr);
            }
            // Push in reverse to visit the children from left to right.
            stack.extend(expr.children().into_iter().rev());
        }
        calls
    }
}
