use super::*;

/// Round `value` up to the next multiple of `alignment`.
fn round_up(value: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    value.div_ceil(alignment) * alignment
}

impl Project {
    /// Compute the layout of the given record
    /// following the rules of the Itanium C++ ABI used by GCC and Clang on x86-64 and most other targets.
    ///
    /// The layout of all bases and fields of record type must already be known.
    ///
    /// Known deviations from the Itanium C++ ABI:
    /// - Tail padding of base classes is never reused.
    /// - Empty bases and empty `[[no_unique_address]]` fields are always placed at offset zero,
    /// even if another subobject of the same type already resides there.
    /// - Virtual bases that are inherited more than once are also allocated more than once.
    pub(super) fn compute_record_layout(&self, name: &str) -> Result<RecordLayoutInfo, Error> {
        let record = self
            .get_record(name)
            .ok_or_else(|| anyhow!("Unknown record"))?;
        let definition = record
            .definition
            .as_ref()
            .ok_or_else(|| anyhow!("Incomplete record"))?;
        let max_field_alignment = definition
            .max_field_alignment
            .map(|alignment| alignment.as_bit_length());
        let cap_alignment = |alignment: u64| match max_field_alignment {
            Some(max_alignment) => alignment.min(max_alignment),
            None => alignment,
        };
        let base_layout = |base: &BaseSpecifier| {
            self.get_record_layout(&base.record)
                .ok_or_else(|| anyhow!("Unknown layout of base class {}", base.record))
        };

        let mut offset: u64 = 0;
        let mut alignment: u64 = 8;
        let mut base_offsets = vec![0; definition.bases.len()];
        let mut field_offsets = vec![0; definition.fields.len()];

        // Dynamic classes share the virtual table pointer with their primary base
        // or need a new one at the start of the object.
        let mut primary_base = None;
        if self.is_dynamic_record(name) {
            primary_base = definition
                .bases
                .iter()
                .position(|base| !base.is_virtual && self.is_dynamic_record(&base.record));
            if let Some(index) = primary_base {
                let layout = base_layout(&definition.bases[index])?;
                offset = layout.size_bits;
                alignment = alignment.max(layout.align_bits);
            } else {
                let pointer_size = self.datatype_properties.pointer_size.as_bit_length();
                offset = pointer_size;
                alignment = alignment.max(pointer_size);
            }
        }

        for (index, base) in definition.bases.iter().enumerate() {
            if base.is_virtual || Some(index) == primary_base {
                continue;
            }
            let layout = base_layout(base)?;
            let base_alignment = cap_alignment(layout.align_bits);
            alignment = alignment.max(base_alignment);
            if self.is_empty_record(&base.record) {
                base_offsets[index] = 0;
            } else {
                offset = round_up(offset, base_alignment);
                base_offsets[index] = offset;
                offset += layout.size_bits;
            }
        }

        let mut union_size: u64 = 0;
        for (index, field) in definition.fields.iter().enumerate() {
            if field.is_static {
                continue;
            }
            let size = self
                .type_size_bits(&field.ty)
                .ok_or_else(|| anyhow!("Unknown size of field type {}", field.ty))?;
            let natural_alignment = self
                .type_align_bits(&field.ty)
                .ok_or_else(|| anyhow!("Unknown alignment of field type {}", field.ty))?;
            if record.is_union() {
                union_size = union_size.max(field.bit_width.unwrap_or(size));
                if !field.is_unnamed_bitfield() {
                    alignment = alignment.max(cap_alignment(natural_alignment));
                }
                continue;
            }
            match field.bit_width {
                Some(0) => {
                    offset = round_up(offset, natural_alignment);
                    field_offsets[index] = offset;
                }
                Some(width) => {
                    // Without packing, a bitfield never straddles an aligned unit of its declared type.
                    if max_field_alignment.is_none()
                        && width <= natural_alignment
                        && offset / natural_alignment != (offset + width - 1) / natural_alignment
                    {
                        offset = round_up(offset, natural_alignment);
                    }
                    field_offsets[index] = offset;
                    offset += width;
                    if !field.is_unnamed_bitfield() {
                        alignment = alignment.max(cap_alignment(natural_alignment));
                    }
                }
                None => {
                    let field_alignment = cap_alignment(natural_alignment);
                    alignment = alignment.max(field_alignment);
                    let is_empty_field = match self.get_canonical_record_name(&field.ty) {
                        Some(field_record) => self.is_empty_record(&field_record),
                        None => false,
                    };
                    if field.no_unique_address && is_empty_field {
                        field_offsets[index] = 0;
                    } else {
                        offset = round_up(offset, field_alignment);
                        field_offsets[index] = offset;
                        offset += size;
                    }
                }
            }
        }
        if record.is_union() {
            offset = union_size;
        }

        for (index, base) in definition.bases.iter().enumerate() {
            if !base.is_virtual {
                continue;
            }
            let layout = base_layout(base)?;
            let base_alignment = cap_alignment(layout.align_bits);
            alignment = alignment.max(base_alignment);
            offset = round_up(offset, base_alignment);
            base_offsets[index] = offset;
            if !self.is_empty_record(&base.record) {
                offset += layout.size_bits;
            }
        }

        let data_size_bits = round_up(offset, 8);
        // Every object occupies at least one byte.
        let size_bits = round_up(data_size_bits.max(8), alignment);
        Ok(RecordLayoutInfo {
            size_bits,
            align_bits: alignment,
            data_size_bits,
            field_offsets_bits: field_offsets,
            base_offsets_bits: base_offsets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(project: &Project, name: &str) -> RecordLayoutInfo {
        project.get_record_layout(name).unwrap().clone()
    }

    #[test]
    fn plain_structs() {
        let project = Project::mock(vec![
            Record::mock_struct(
                "Inner",
                vec![Field::new("c", Type::char()), Field::new("i", Type::int())],
            ),
            Record::mock_struct(
                "Trailing",
                vec![Field::new("i", Type::int()), Field::new("c", Type::char())],
            ),
            Record::mock_struct("Empty", Vec::new()),
            Record::mock_struct(
                "WithCharArray",
                vec![
                    Field::new("c", Type::char()),
                    Field::new("i", Type::int()),
                    Field::new("name", Type::array(Type::char(), 13)),
                ],
            ),
            Record::mock_struct(
                "WithArray",
                vec![
                    Field::new("c", Type::char()),
                    Field::new("arr", Type::array(Type::short(), 3)),
                ],
            ),
        ]);
        let inner = layout(&project, "Inner");
        assert_eq!(inner.field_offsets_bits, vec![0, 32]);
        assert_eq!(inner.size_bits, 64);
        let trailing = layout(&project, "Trailing");
        assert_eq!(trailing.field_offsets_bits, vec![0, 32]);
        assert_eq!(trailing.data_size_bits, 40);
        assert_eq!(trailing.size_bits, 64);
        assert_eq!(layout(&project, "Empty").size_bits, 8);
        let with_char_array = layout(&project, "WithCharArray");
        assert_eq!(with_char_array.field_offsets_bits, vec![0, 32, 64]);
        assert_eq!(with_char_array.size_bits, 24 * 8);
        let with_array = layout(&project, "WithArray");
        assert_eq!(with_array.field_offsets_bits, vec![0, 16]);
        assert_eq!(with_array.size_bits, 64);
        assert_eq!(with_array.align_bits, 16);
    }

    #[test]
    fn bitfields() {
        let project = Project::mock(vec![
            Record::mock_struct(
                "Straddle",
                vec![
                    Field::bitfield("x", Type::int(), 30),
                    Field::bitfield("y", Type::int(), 4),
                ],
            ),
            Record::mock_struct(
                "ZeroWidth",
                vec![
                    Field::bitfield("x", Type::int(), 2),
                    Field::unnamed_bitfield(Type::int(), 0),
                    Field::bitfield("y", Type::int(), 6),
                ],
            ),
            Record::mock_struct(
                "Unnamed",
                vec![
                    Field::bitfield("x", Type::char(), 2),
                    Field::unnamed_bitfield(Type::int(), 3),
                ],
            ),
        ]);
        let straddle = layout(&project, "Straddle");
        assert_eq!(straddle.field_offsets_bits, vec![0, 32]);
        assert_eq!(straddle.size_bits, 64);
        let zero_width = layout(&project, "ZeroWidth");
        assert_eq!(zero_width.field_offsets_bits, vec![0, 32, 32]);
        assert_eq!(zero_width.size_bits, 64);
        // Unnamed bitfields do not affect the alignment of the record.
        let unnamed = layout(&project, "Unnamed");
        assert_eq!(unnamed.field_offsets_bits, vec![0, 2]);
        assert_eq!(unnamed.align_bits, 8);
        assert_eq!(unnamed.size_bits, 8);
    }

    #[test]
    fn packed_records() {
        let project = Project::mock(vec![
            Record::mock_struct(
                "Packed",
                vec![Field::new("c", Type::char()), Field::new("i", Type::int())],
            )
            .packed(1),
            Record::mock_struct(
                "PackedBitfields",
                vec![
                    Field::bitfield("x", Type::int(), 30),
                    Field::bitfield("y", Type::int(), 4),
                ],
            )
            .packed(1),
        ]);
        let packed = layout(&project, "Packed");
        assert_eq!(packed.field_offsets_bits, vec![0, 8]);
        assert_eq!(packed.size_bits, 40);
        let packed_bitfields = layout(&project, "PackedBitfields");
        assert_eq!(packed_bitfields.field_offsets_bits, vec![0, 30]);
        assert_eq!(packed_bitfields.size_bits, 40);
    }

    #[test]
    fn unions() {
        let project = Project::mock(vec![
            Record::mock_union(
                "U",
                vec![Field::new("c", Type::char()), Field::new("s", Type::short())],
            ),
            Record::mock_struct(
                "S",
                vec![Field::new("u", Type::record("U")), Field::new("i", Type::int())],
            ),
        ]);
        let union = layout(&project, "U");
        assert_eq!(union.field_offsets_bits, vec![0, 0]);
        assert_eq!(union.size_bits, 16);
        assert_eq!(layout(&project, "S").field_offsets_bits, vec![0, 32]);
    }

    #[test]
    fn inheritance() {
        let project = Project::mock(vec![
            Record::mock_struct(
                "Base",
                vec![Field::new("c", Type::char()), Field::new("i", Type::int())],
            ),
            Record::mock_struct("Empty", Vec::new()),
            Record::mock_struct("Derived", vec![Field::new("d", Type::char())])
                .with_bases(&["Empty", "Base"]),
            Record::mock_class("Polymorphic", vec![Field::new("x", Type::int())]).polymorphic(),
            Record::mock_class("DerivedPolymorphic", vec![Field::new("y", Type::int())])
                .with_bases(&["Polymorphic"]),
            Record::mock_struct("VirtualDerived", vec![Field::new("z", Type::int())])
                .with_virtual_base("Base"),
            Record::mock_struct(
                "NoUniqueAddress",
                vec![
                    Field::new("e", Type::record("Empty")).with_no_unique_address(),
                    Field::new("c", Type::char()),
                ],
            ),
        ]);
        let derived = layout(&project, "Derived");
        assert_eq!(derived.base_offsets_bits, vec![0, 0]);
        assert_eq!(derived.field_offsets_bits, vec![64]);
        assert_eq!(derived.size_bits, 96);

        let polymorphic = layout(&project, "Polymorphic");
        assert_eq!(polymorphic.field_offsets_bits, vec![64]);
        assert_eq!(polymorphic.size_bits, 128);
        let derived_polymorphic = layout(&project, "DerivedPolymorphic");
        assert_eq!(derived_polymorphic.base_offsets_bits, vec![0]);
        assert_eq!(derived_polymorphic.field_offsets_bits, vec![128]);
        assert_eq!(derived_polymorphic.size_bits, 192);

        let virtual_derived = layout(&project, "VirtualDerived");
        assert_eq!(virtual_derived.field_offsets_bits, vec![64]);
        assert_eq!(virtual_derived.base_offsets_bits, vec![96]);
        assert_eq!(virtual_derived.size_bits, 192);

        let no_unique_address = layout(&project, "NoUniqueAddress");
        assert_eq!(no_unique_address.field_offsets_bits, vec![0, 0]);
        assert_eq!(no_unique_address.size_bits, 8);
    }
}
