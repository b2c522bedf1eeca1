use super::*;
use itertools::Itertools;
use std::collections::BTreeSet;

/// Type nesting deeper than this is considered malformed input.
/// It prevents infinite recursion on cyclic type definitions.
pub const MAX_TYPE_NESTING_DEPTH: usize = 64;

/// A query service for the layout of types.
///
/// Implementors only need to provide the lookup functions for records, typedefs and datatype properties.
/// All other queries are derived from them.
/// Queries involving records assume that the layouts of the records are already known,
/// see [`Project::normalize`] for how missing layouts get computed.
pub trait TypeLayoutQuery {
    /// Get the record with the given qualified name.
    fn get_record(&self, name: &str) -> Option<&Record>;

    /// Get the type aliased by the typedef with the given qualified name.
    fn get_typedef(&self, name: &str) -> Option<&Type>;

    /// Get the sizes of builtin types.
    fn get_datatype_properties(&self) -> &DatatypeProperties;

    /// Get the definition of the record with the given name.
    /// Returns `None` for unknown or incomplete records.
    fn get_record_definition(&self, name: &str) -> Option<&RecordDefinition> {
        self.get_record(name)?.definition.as_ref()
    }

    /// Get the layout of the record with the given name if it is known.
    fn get_record_layout(&self, name: &str) -> Option<&RecordLayoutInfo> {
        self.get_record_definition(name)?.layout.as_ref()
    }

    /// Resolve all typedefs contained in the given type.
    /// Typedefs that cannot be resolved are left unchanged.
    fn canonical_type(&self, ty: &Type) -> Type {
        canonical_type_impl(self, ty, 0)
    }

    /// Return the name of the record that the canonical type of `ty` denotes, if any.
    fn get_canonical_record_name(&self, ty: &Type) -> Option<String> {
        match self.canonical_type(ty) {
            Type::Record(name) => Some(name),
            _ => None,
        }
    }

    /// Get the size of the given type in bits.
    /// Returns `None` for `void`, unresolved typedefs and records with unknown layout.
    fn type_size_bits(&self, ty: &Type) -> Option<u64> {
        match self.canonical_type(ty) {
            Type::Void | Type::Typedef(_) => None,
            Type::Builtin(builtin) => {
                Some(self.get_datatype_properties().get_size(builtin).as_bit_length())
            }
            Type::Pointer(_) => Some(self.get_datatype_properties().pointer_size.as_bit_length()),
            Type::Array { element, count } => self.type_size_bits(&element)?.checked_mul(count),
            Type::Record(name) => Some(self.get_record_layout(&name)?.size_bits),
        }
    }

    /// Get the alignment of the given type in bits.
    fn type_align_bits(&self, ty: &Type) -> Option<u64> {
        match self.canonical_type(ty) {
            Type::Void | Type::Typedef(_) => None,
            Type::Builtin(builtin) => {
                Some(self.get_datatype_properties().get_size(builtin).as_bit_length())
            }
            Type::Pointer(_) => Some(self.get_datatype_properties().pointer_size.as_bit_length()),
            Type::Array { element, .. } => self.type_align_bits(&element),
            Type::Record(name) => Some(self.get_record_layout(&name)?.align_bits),
        }
    }

    /// Returns true if the record is an empty class,
    /// i.e. it has no non-static data members other than zero-width bitfields,
    /// no virtual functions, no virtual bases and only empty base classes.
    ///
    /// Unknown, incomplete and union records are never empty.
    fn is_empty_record(&self, name: &str) -> bool {
        is_empty_record_impl(self, name, 0)
    }

    /// Returns true if objects of the record need a virtual table pointer,
    /// i.e. if the record has virtual functions or (possibly indirect) virtual bases.
    fn is_dynamic_record(&self, name: &str) -> bool {
        is_dynamic_record_impl(self, name, 0)
    }

    /// Returns true if the record is a standard-layout type in the sense of the C++ standard.
    ///
    /// Unknown or incomplete records are treated as standard-layout,
    /// so that missing information never leads to a warning.
    fn is_standard_layout(&self, name: &str) -> bool {
        is_standard_layout_impl(self, name, 0)
    }
}

fn canonical_type_impl<Q: TypeLayoutQuery + ?Sized>(query: &Q, ty: &Type, depth: usize) -> Type {
    if depth > MAX_TYPE_NESTING_DEPTH {
        return ty.clone();
    }
    match ty {
        Type::Typedef(name) => match query.get_typedef(name) {
            Some(aliased) => canonical_type_impl(query, aliased, depth + 1),
            None => ty.clone(),
        },
        Type::Pointer(pointee) => {
            Type::Pointer(Box::new(canonical_type_impl(query, pointee, depth + 1)))
        }
        Type::Array { element, count } => Type::Array {
            element: Box::new(canonical_type_impl(query, element, depth + 1)),
            count: *count,
        },
        Type::Void | Type::Builtin(_) | Type::Record(_) => ty.clone(),
    }
}

/// Strip all array dimensions from the canonical type
/// and return the record name of the innermost element type, if it is a record.
fn innermost_record_name<Q: TypeLayoutQuery + ?Sized>(query: &Q, ty: &Type) -> Option<String> {
    match query.canonical_type(ty).get_base_element_type() {
        Type::Record(name) => Some(name.clone()),
        _ => None,
    }
}

fn is_empty_record_impl<Q: TypeLayoutQuery + ?Sized>(query: &Q, name: &str, depth: usize) -> bool {
    if depth > MAX_TYPE_NESTING_DEPTH {
        return false;
    }
    let Some(record) = query.get_record(name) else {
        return false;
    };
    let Some(definition) = &record.definition else {
        return false;
    };
    !record.is_union()
        && !definition.has_virtual_functions
        && definition
            .non_static_fields()
            .all(|(_, field)| field.bit_width == Some(0))
        && definition
            .bases
            .iter()
            .all(|base| !base.is_virtual && is_empty_record_impl(query, &base.record, depth + 1))
}

fn is_dynamic_record_impl<Q: TypeLayoutQuery + ?Sized>(
    query: &Q,
    name: &str,
    depth: usize,
) -> bool {
    if depth > MAX_TYPE_NESTING_DEPTH {
        return false;
    }
    let Some(definition) = query.get_record_definition(name) else {
        return false;
    };
    definition.has_virtual_functions
        || definition
            .bases
            .iter()
            .any(|base| base.is_virtual || is_dynamic_record_impl(query, &base.record, depth + 1))
}

/// Collect the names of all direct and indirect base classes, including duplicates.
fn collect_all_bases<Q: TypeLayoutQuery + ?Sized>(
    query: &Q,
    name: &str,
    depth: usize,
    bases: &mut Vec<String>,
) {
    if depth > MAX_TYPE_NESTING_DEPTH {
        return;
    }
    if let Some(definition) = query.get_record_definition(name) {
        for base in definition.bases.iter() {
            bases.push(base.record.clone());
            collect_all_bases(query, &base.record, depth + 1, bases);
        }
    }
}

fn is_standard_layout_impl<Q: TypeLayoutQuery + ?Sized>(
    query: &Q,
    name: &str,
    depth: usize,
) -> bool {
    if depth > MAX_TYPE_NESTING_DEPTH {
        return true;
    }
    let Some(definition) = query.get_record_definition(name) else {
        return true;
    };
    if query.is_dynamic_record(name) {
        return false;
    }
    let access_specifiers: BTreeSet<AccessSpecifier> = definition
        .non_static_fields()
        .filter(|(_, field)| !field.is_unnamed_bitfield())
        .map(|(_, field)| field.access)
        .collect();
    if access_specifiers.len() > 1 {
        return false;
    }
    for (_, field) in definition.non_static_fields() {
        if let Some(field_record) = innermost_record_name(query, &field.ty) {
            if !is_standard_layout_impl(query, &field_record, depth + 1) {
                return false;
            }
        }
    }
    if !definition
        .bases
        .iter()
        .all(|base| is_standard_layout_impl(query, &base.record, depth + 1))
    {
        return false;
    }
    let mut all_bases = Vec::new();
    collect_all_bases(query, name, depth, &mut all_bases);
    if !all_bases.iter().all_unique() {
        return false;
    }
    // All non-static data members have to be declared in the same class of the hierarchy.
    let classes_with_fields = std::iter::once(name)
        .chain(all_bases.iter().map(|base| base.as_str()))
        .filter(|class| {
            query
                .get_record_definition(class)
                .map(|def| def.non_static_fields().next().is_some())
                .unwrap_or(false)
        })
        .count();
    if classes_with_fields > 1 {
        return false;
    }
    if let Some((_, first_field)) = definition.non_static_fields().next() {
        if let Some(first_field_record) = innermost_record_name(query, &first_field.ty) {
            if all_bases.contains(&first_field_record) {
                return false;
            }
        }
    }
    true
}
