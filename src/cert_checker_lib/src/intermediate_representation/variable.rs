use super::Type;
use crate::prelude::*;
use std::fmt::Display;

/// A variable represents a local variable or function parameter with a known name and static type.
///
/// Variable names are required to be unique inside a function.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct Variable {
    /// The name of the variable.
    pub name: String,
    /// The declared type of the variable.
    pub ty: Type,
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.name, self.ty)
    }
}
