use crate::prelude::*;
use std::fmt;

/// The builtin arithmetic types of C/C++.
/// Signedness is irrelevant for layout computations and thus not represented.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum BuiltinType {
    Bool,
    Char,
    Short,
    Int,
    Long,
    LongLong,
    Float,
    Double,
    LongDouble,
}

/// A (static) type as written in the source code.
///
/// Records and typedefs are referenced by their fully qualified name,
/// their definitions are contained in the [`Project`](super::Project).
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub enum Type {
    /// The `void` type.
    Void,
    /// A builtin arithmetic type.
    Builtin(BuiltinType),
    /// A pointer to the contained type.
    Pointer(Box<Type>),
    /// An array with a constant number of elements.
    Array {
        /// The type of the array elements.
        element: Box<Type>,
        /// The number of elements.
        count: u64,
    },
    /// A struct, class or union type given by its qualified name.
    Record(String),
    /// A typedef given by its qualified name.
    /// Use [`TypeLayoutQuery::canonical_type`](super::TypeLayoutQuery::canonical_type) to resolve it.
    Typedef(String),
}

impl Type {
    /// Return the pointee type for pointers or the element type for arrays.
    pub fn get_pointee_or_array_element_type(&self) -> Option<&Type> {
        match self {
            Type::Pointer(pointee) => Some(pointee),
            Type::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Strip all array dimensions and return the innermost element type.
    /// Returns `self` for non-array types.
    pub fn get_base_element_type(&self) -> &Type {
        let mut ty = self;
        while let Type::Array { element, .. } = ty {
            ty = element;
        }
        ty
    }

    /// Return the pointee type if `self` is a pointer type.
    pub fn get_pointee_type(&self) -> Option<&Type> {
        match self {
            Type::Pointer(pointee) => Some(pointee),
            _ => None,
        }
    }

    /// Return the name of the record if `self` is a record type.
    /// Note that typedefs are not resolved by this function.
    pub fn get_record_name(&self) -> Option<&str> {
        match self {
            Type::Record(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Builtin(builtin) => write!(f, "{builtin:?}"),
            Type::Pointer(pointee) => write!(f, "{pointee} *"),
            Type::Array { element, count } => write!(f, "{element}[{count}]"),
            Type::Record(name) | Type::Typedef(name) => write!(f, "{name}"),
        }
    }
}

/// The kind of a record type.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum RecordKind {
    Struct,
    Class,
    Union,
}

/// The access control of a data member or base class.
#[derive(
    Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Default,
)]
pub enum AccessSpecifier {
    #[default]
    Public,
    Protected,
    Private,
}

/// A data member of a record.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Field {
    /// The name of the field. `None` for unnamed bitfields.
    pub name: Option<String>,
    /// The declared type of the field.
    pub ty: Type,
    /// The declared width if the field is a bitfield.
    #[serde(default)]
    pub bit_width: Option<u64>,
    #[serde(default)]
    pub access: AccessSpecifier,
    /// Static data members are not part of the object representation.
    #[serde(default)]
    pub is_static: bool,
    /// Set for fields marked with `[[no_unique_address]]`.
    #[serde(default)]
    pub no_unique_address: bool,
}

impl Field {
    /// Returns true if the field is a bitfield.
    pub fn is_bitfield(&self) -> bool {
        self.bit_width.is_some()
    }

    /// Unnamed bitfields only influence the layout of the record.
    /// Their bits are padding bits.
    pub fn is_unnamed_bitfield(&self) -> bool {
        self.is_bitfield() && self.name.is_none()
    }
}

/// A (direct) base class of a record.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct BaseSpecifier {
    /// The qualified name of the base class.
    pub record: String,
    #[serde(default)]
    pub access: AccessSpecifier,
    #[serde(default)]
    pub is_virtual: bool,
}

/// The memory layout of a record type as computed by a compiler.
///
/// All values are given in bits.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct RecordLayoutInfo {
    /// The size of the record including trailing padding.
    pub size_bits: u64,
    /// The alignment of the record.
    pub align_bits: u64,
    /// The size of the record without trailing padding.
    pub data_size_bits: u64,
    /// The offset of each field in declaration order.
    /// Static fields have an offset of zero.
    pub field_offsets_bits: Vec<u64>,
    /// The offset of each direct base class in declaration order.
    pub base_offsets_bits: Vec<u64>,
}

/// The definition of a record, i.e. the record is a complete type.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct RecordDefinition {
    #[serde(default)]
    pub bases: Vec<BaseSpecifier>,
    pub fields: Vec<Field>,
    /// Whether the record declares or inherits virtual member functions.
    #[serde(default)]
    pub has_virtual_functions: bool,
    /// The maximal alignment of fields,
    /// set by `#pragma pack(N)` or `__attribute__((packed))` (which corresponds to `N = 1`).
    #[serde(default)]
    pub max_field_alignment: Option<ByteSize>,
    /// The layout of the record as dumped by the compiler.
    /// If not provided, it is computed during normalization of the project.
    #[serde(default)]
    pub layout: Option<RecordLayoutInfo>,
}

impl RecordDefinition {
    /// Iterate over the fields that are part of the object representation,
    /// i.e. over all non-static fields, together with their index.
    pub fn non_static_fields(&self) -> impl Iterator<Item = (usize, &Field)> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, field)| !field.is_static)
    }

    /// Returns true if the record has at least one data member
    /// that is not a static field or an unnamed bitfield.
    pub fn has_data_members(&self) -> bool {
        self.non_static_fields()
            .any(|(_, field)| !field.is_unnamed_bitfield())
    }
}

/// A struct, class or union type.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Record {
    /// The fully qualified name of the record.
    pub name: String,
    pub kind: RecordKind,
    /// The definition of the record. `None` if the record is only forward declared.
    pub definition: Option<RecordDefinition>,
}

impl Record {
    /// Returns true if the record is a union.
    pub fn is_union(&self) -> bool {
        self.kind == RecordKind::Union
    }

    /// Returns true if the record is a complete type, i.e. the definition is known.
    pub fn is_complete(&self) -> bool {
        self.definition.is_some()
    }
}
