//! This module computes which bits of a record type are part of its value representation
//! and which bits are padding.
//!
//! For each record the used bits of its object representation are collected as a sorted list of bit ranges.
//! A bit is contained in one of the ranges if and only if the bit is used to store data of a member (or base) of the record.
//! All other bits are padding bits, i.e. their value is indeterminate
//! and comparing them (e.g. with `memcmp`) yields unreliable results.
//!
//! The used bits are computed as follows:
//! - Base classes are placed recursively at their offsets.
//! Empty base classes contribute no bits.
//! - Record-typed fields are placed recursively at their offsets.
//! Union-typed fields are marked as fully used, since the active member is unknown.
//! - Arrays of records repeat the used bits of the element type for each element.
//! - Scalar fields (including arrays of scalars) mark their whole size, bitfields mark exactly their declared width.
//! - Unnamed bitfields and static fields contribute no bits.
//!
//! Questions about a prefix of a record only inspect the subobjects overlapping the prefix.
//! Complete results are cached per record, so that each record is analyzed only once.

use crate::intermediate_representation::*;
use crate::prelude::*;
use fnv::FnvHashMap;
use std::ops::Range;
use std::sync::{Arc, PoisonError, RwLock};

/// The used bits of a record.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct UsedBits {
    /// The size of the record in bits.
    total_size_bits: u64,
    /// Sorted, disjoint and non-adjacent ranges of bits that store data.
    used_ranges: Vec<Range<u64>>,
}

impl UsedBits {
    /// Create a new mask for a record of the given size where all bits are padding bits.
    pub fn new(total_size_bits: u64) -> UsedBits {
        UsedBits {
            total_size_bits,
            used_ranges: Vec::new(),
        }
    }

    /// The size of the record in bits.
    pub fn total_size_bits(&self) -> u64 {
        self.total_size_bits
    }

    /// Mark the bits `[start, start + length)` as used.
    /// Bits outside of the record are ignored.
    pub fn mark_range(&mut self, start: u64, length: u64) {
        let end = start.saturating_add(length).min(self.total_size_bits);
        if start >= end {
            return;
        }
        // Ranges overlapping or touching `start..end` are merged into one range.
        let first = self.used_ranges.partition_point(|range| range.end < start);
        let last = self.used_ranges.partition_point(|range| range.start <= end);
        let mut merged = start..end;
        if first < last {
            merged.start = merged.start.min(self.used_ranges[first].start);
            merged.end = merged.end.max(self.used_ranges[last - 1].end);
        }
        self.used_ranges.splice(first..last, std::iter::once(merged));
    }

    /// Mark the used bits of a subobject located at the given offset as used.
    pub fn mark_subobject(&mut self, subobject: &UsedBits, offset: u64) {
        for range in subobject.used_ranges.iter() {
            self.mark_range(offset.saturating_add(range.start), range.end - range.start);
        }
    }

    /// Returns true if the given bit stores data.
    pub fn is_used(&self, bit: u64) -> bool {
        let index = self.used_ranges.partition_point(|range| range.end <= bit);
        self.used_ranges
            .get(index)
            .map(|range| range.start <= bit)
            .unwrap_or(false)
    }

    /// Count the used bits in the range `[start, end)`.
    pub fn count_used_bits(&self, range: Range<u64>) -> u64 {
        self.used_ranges
            .iter()
            .map(|used| {
                used.end
                    .min(range.end)
                    .saturating_sub(used.start.max(range.start))
            })
            .sum()
    }

    /// Return the first padding bit among the first `compared_bits` bits of the object representation.
    ///
    /// If more bits are compared than the record has, the comparison is assumed to span an array of records.
    /// Since each array element has the same padding, only the bits of the first element are checked.
    pub fn first_padding_bit(&self, compared_bits: u64) -> Option<u64> {
        let end = compared_bits.min(self.total_size_bits);
        let first_unused = match self.used_ranges.first() {
            Some(range) if range.start == 0 => range.end,
            _ => 0,
        };
        (first_unused < end).then_some(first_unused)
    }

    /// Returns true if any of the first `compared_bits` bits of the object representation is a padding bit.
    pub fn has_padding_in_range(&self, compared_bits: u64) -> bool {
        self.first_padding_bit(compared_bits).is_some()
    }
}

/// Computes and caches the used bits of record types.
///
/// The analysis can be shared between threads.
pub struct PaddingAnalysis<'a> {
    query: &'a (dyn TypeLayoutQuery + Sync),
    cache: RwLock<FnvHashMap<String, Arc<UsedBits>>>,
}

impl<'a> PaddingAnalysis<'a> {
    /// Create a new padding analysis with an empty cache.
    pub fn new(query: &'a (dyn TypeLayoutQuery + Sync)) -> PaddingAnalysis<'a> {
        PaddingAnalysis {
            query,
            cache: RwLock::new(FnvHashMap::default()),
        }
    }

    /// Get the used bits of the record with the given name.
    ///
    /// Returns an error if the record or one of its subobjects is unknown, incomplete
    /// or has no known layout.
    pub fn compute_used_bits(&self, record_name: &str) -> Result<Arc<UsedBits>, Error> {
        self.compute_used_bits_with_limit(record_name, u64::MAX, 0)
    }

    /// Get the used bits among the first `prefix_bits` bits of the record with the given name.
    /// Bits after the prefix are not inspected and reported as padding.
    ///
    /// Only subobjects overlapping the prefix have to be known.
    pub fn compute_used_bits_in_prefix(
        &self,
        record_name: &str,
        prefix_bits: u64,
    ) -> Result<Arc<UsedBits>, Error> {
        self.compute_used_bits_with_limit(record_name, prefix_bits, 0)
    }

    /// Returns true if any of the first `compared_bits` bits of the given record is a padding bit.
    ///
    /// Unions never contain padding in this sense, since the active member is unknown.
    pub fn has_padding_in_range(&self, record_name: &str, compared_bits: u64) -> Result<bool, Error> {
        Ok(self.first_padding_bit(record_name, compared_bits)?.is_some())
    }

    /// Return the first padding bit among the first `compared_bits` bits of the given record.
    /// Always returns `None` for unions.
    pub fn first_padding_bit(&self, record_name: &str, compared_bits: u64) -> Result<Option<u64>, Error> {
        let record = self
            .query
            .get_record(record_name)
            .ok_or_else(|| anyhow!("Unknown record {record_name}"))?;
        if record.is_union() {
            return Ok(None);
        }
        Ok(self
            .compute_used_bits_in_prefix(record_name, compared_bits)?
            .first_padding_bit(compared_bits))
    }

    /// Compute the used bits of the record among its first `limit` bits.
    /// The result is cached if the limit covers the whole record.
    fn compute_used_bits_with_limit(
        &self,
        name: &str,
        limit: u64,
        depth: usize,
    ) -> Result<Arc<UsedBits>, Error> {
        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(cached.clone());
        }
        if depth > MAX_TYPE_NESTING_DEPTH {
            return Err(anyhow!("Type nesting too deep at record {name}"));
        }
        let record = self
            .query
            .get_record(name)
            .ok_or_else(|| anyhow!("Unknown record {name}"))?;
        let definition = record
            .definition
            .as_ref()
            .ok_or_else(|| anyhow!("Incomplete record {name}"))?;
        let layout = definition
            .layout
            .as_ref()
            .ok_or_else(|| anyhow!("Unknown layout of record {name}"))?;

        let mut used_bits = UsedBits::new(layout.size_bits);
        if record.is_union() {
            used_bits.mark_range(0, layout.size_bits);
        } else {
            let has_primary_base = definition
                .bases
                .iter()
                .any(|base| !base.is_virtual && self.query.is_dynamic_record(&base.record));
            if self.query.is_dynamic_record(name) && !has_primary_base {
                // The virtual table pointer
                let pointer_size = self
                    .query
                    .get_datatype_properties()
                    .pointer_size
                    .as_bit_length();
                used_bits.mark_range(0, pointer_size);
            }
            for (index, base) in definition.bases.iter().enumerate() {
                let offset = *layout
                    .base_offsets_bits
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing offset of base {} in record {name}", base.record))?;
                if offset >= limit {
                    continue;
                }
                let base_bits =
                    self.compute_used_bits_with_limit(&base.record, limit - offset, depth + 1)?;
                used_bits.mark_subobject(&base_bits, offset);
            }
            for (index, field) in definition.non_static_fields() {
                let offset = *layout
                    .field_offsets_bits
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing offset of field {index} in record {name}"))?;
                match field.bit_width {
                    Some(width) => {
                        if !field.is_unnamed_bitfield() {
                            used_bits.mark_range(offset, width);
                        }
                    }
                    None => self.mark_type(&mut used_bits, &field.ty, offset, limit, depth + 1)?,
                }
            }
        }

        let used_bits = Arc::new(used_bits);
        if limit >= layout.size_bits {
            self.cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(name.to_string(), used_bits.clone());
        }
        Ok(used_bits)
    }

    /// Mark the used bits of an object of the given type located at `offset`.
    /// Only bits before `limit` are marked reliably.
    fn mark_type(
        &self,
        used_bits: &mut UsedBits,
        ty: &Type,
        offset: u64,
        limit: u64,
        depth: usize,
    ) -> Result<(), Error> {
        if offset >= limit {
            return Ok(());
        }
        if depth > MAX_TYPE_NESTING_DEPTH {
            return Err(anyhow!("Type nesting too deep at type {ty}"));
        }
        let size = self
            .query
            .type_size_bits(ty)
            .ok_or_else(|| anyhow!("Unknown size of type {ty}"))?;
        match self.query.canonical_type(ty) {
            Type::Record(name) => {
                let is_union = self
                    .query
                    .get_record(&name)
                    .map(Record::is_union)
                    .unwrap_or(false);
                if is_union {
                    used_bits.mark_range(offset, size);
                } else {
                    let record_bits =
                        self.compute_used_bits_with_limit(&name, limit - offset, depth + 1)?;
                    used_bits.mark_subobject(&record_bits, offset);
                }
            }
            Type::Array { element, count } if contains_record(&element) => {
                let element_size = self
                    .query
                    .type_size_bits(&element)
                    .ok_or_else(|| anyhow!("Unknown size of type {element}"))?;
                if element_size == 0 {
                    return Ok(());
                }
                for index in 0..count {
                    let element_offset = offset + index * element_size;
                    if element_offset >= limit {
                        break;
                    }
                    self.mark_type(used_bits, &element, element_offset, limit, depth + 1)?;
                }
            }
            _ => used_bits.mark_range(offset, size),
        }
        Ok(())
    }
}

/// Returns true if the canonical type is a record or a (multi-dimensional) array of records.
fn contains_record(ty: &Type) -> bool {
    match ty {
        Type::Record(_) => true,
        Type::Array { element, .. } => contains_record(element),
        _ => false,
    }
}
