use super::{Expression, Variable};
use crate::prelude::*;

/// A statement of a function body.
///
/// Statements are executed in order and do not affect the control flow.
/// Control flow is represented by the `Jmp` instructions at the end of each basic block.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub enum Stmt {
    /// The declaration of a local variable with an optional initializer.
    Declare {
        var: Variable,
        init: Option<Expression>,
    },
    /// The assignment of a value to a local variable.
    Assign { var: Variable, value: Expression },
    /// An expression evaluated for its side effects, e.g. a function call.
    Expr(Expression),
    /// A `delete` or `delete[]` expression.
    Delete {
        /// The pointer expression that is deleted.
        argument: Expression,
        /// Set to `true` for `delete[]`.
        array_form: bool,
    },
}

impl Stmt {
    /// Return the top-level expressions contained in the statement.
    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            Stmt::Declare { init, .. } => init.iter().collect(),
            Stmt::Assign { value, .. } => vec![value],
            Stmt::Expr(expr) => vec![expr],
            Stmt::Delete { argument, .. } => vec![argument],
        }
    }
}

/// A `Jmp` instruction affects the control flow of a function.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub enum Jmp {
    /// A direct jump to the targeted `Blk` term identifier.
    Branch(Tid),
    /// A direct jump that is only taken if the condition evaluates to true (i.e. not zero).
    CBranch {
        /// The term ID of the target block of the jump.
        target: Tid,
        /// The jump is only taken if this expression evaluates to `true`, (i.e. not zero).
        condition: Expression,
    },
    /// A return from the function with an optional return value.
    Return(Option<Expression>),
}

impl Jmp {
    /// Return the expressions evaluated when executing the jump.
    pub fn expressions(&self) -> Vec<&Expression> {
        match self {
            Jmp::Branch(_) => Vec::new(),
            Jmp::CBranch { condition, .. } => vec![condition],
            Jmp::Return(value) => value.iter().collect(),
        }
    }
}

/// A basic block is a sequence of `Stmt` instructions followed by up to two `Jmp` instructions.
///
/// - Zero `Jmp`s indicate that control flow ends at the block.
/// - If there is exactly one `Jmp`, it is required to be an unconditional jump or a return.
/// - For two jumps, the first one has to be a conditional jump,
/// where the second unconditional jump is only taken if the condition of the first jump evaluates to false.
///
/// Basic blocks are *single entry, single exit*, i.e. a basic block is only entered at the beginning
/// and is only exited by the jump instructions at the end of the block.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Blk {
    /// The `Stmt` instructions of the basic block in order of execution.
    pub stmts: Vec<Term<Stmt>>,
    /// The `Jmp` instructions of the basic block
    #[serde(default)]
    pub jmps: Vec<Term<Jmp>>,
}

/// A `Sub` or subroutine represents a function with a given name and a list of basic blocks belonging to it.
///
/// Subroutines are *single-entry*,
/// i.e. calling a subroutine will execute the first block in the list of basic blocks.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Sub {
    /// The qualified name of the function
    pub name: String,
    /// The parameters of the function.
    #[serde(default)]
    pub params: Vec<Variable>,
    /// The basic blocks belonging to the function.
    /// The first block is also the entry point of the function.
    pub blocks: Vec<Term<Blk>>,
}

/// The `Program` contains all function definitions of the translation unit.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Default)]
pub struct Program {
    /// The functions defined in the translation unit.
    pub subs: Vec<Term<Sub>>,
}
