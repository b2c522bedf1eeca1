//! This module defines the intermediate representation used to represent a translation unit
//! together with all record types and function bodies contained in it.
//!
//! The main data structure is the `Project` struct,
//! which contains all information exported by the compiler front-end.
//! To learn how record types are described,
//! you should first take a look at the `Type` and `Record` types
//! and then at the `Expression` and `Stmt` types,
//! which form the basis of the basic block `Blk` struct.

use crate::prelude::*;
use derive_more::*;

mod term;
pub use term::*;
mod types;
pub use types::*;
mod layout_query;
pub use layout_query::*;
mod variable;
pub use variable::*;
mod expression;
pub use expression::*;
mod stmt;
pub use stmt::*;
mod project;
pub use project::*;

#[cfg(test)]
mod builder;

/// An unsigned number of bytes.
///
/// Used to represent sizes of data types.
/// Can also be used for other byte-valued numbers, like offsets,
/// as long as the number is guaranteed to be non-negative.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Clone,
    Copy,
    Display,
    From,
    Into,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    AddAssign,
    SubAssign,
    Sum,
)]
#[serde(transparent)]
pub struct ByteSize(u64);

impl ByteSize {
    /// Create a new `ByteSize` object
    pub fn new(value: u64) -> ByteSize {
        ByteSize(value)
    }

    /// Convert to the equivalent size in bits (by multiplying with 8).
    pub fn as_bit_length(self) -> u64 {
        self.0 * 8
    }
}

/// Properties of C/C++ builtin data types such as their size.
///
/// The alignment of a builtin type is assumed to be equal to its size.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct DatatypeProperties {
    pub bool_size: ByteSize,
    pub char_size: ByteSize,
    pub double_size: ByteSize,
    pub float_size: ByteSize,
    pub integer_size: ByteSize,
    pub long_double_size: ByteSize,
    pub long_long_size: ByteSize,
    pub long_size: ByteSize,
    pub pointer_size: ByteSize,
    pub short_size: ByteSize,
}

impl Default for DatatypeProperties {
    /// Datatype sizes according to the x86-64 System V ABI
    fn default() -> Self {
        DatatypeProperties {
            bool_size: ByteSize::new(1),
            char_size: ByteSize::new(1),
            double_size: ByteSize::new(8),
            float_size: ByteSize::new(4),
            integer_size: ByteSize::new(4),
            long_double_size: ByteSize::new(16),
            long_long_size: ByteSize::new(8),
            long_size: ByteSize::new(8),
            pointer_size: ByteSize::new(8),
            short_size: ByteSize::new(2),
        }
    }
}

impl DatatypeProperties {
    /// Datatype sizes of a 32-bit ARM target.
    pub fn arm32() -> DatatypeProperties {
        DatatypeProperties {
            long_double_size: ByteSize::new(8),
            long_size: ByteSize::new(4),
            pointer_size: ByteSize::new(4),
            ..DatatypeProperties::default()
        }
    }

    /// Return the size of the given builtin type.
    pub fn get_size(&self, builtin: BuiltinType) -> ByteSize {
        use BuiltinType::*;
        match builtin {
            Bool => self.bool_size,
            Char => self.char_size,
            Short => self.short_size,
            Int => self.integer_size,
            Long => self.long_size,
            LongLong => self.long_long_size,
            Float => self.float_size,
            Double => self.double_size,
            LongDouble => self.long_double_size,
        }
    }
}
