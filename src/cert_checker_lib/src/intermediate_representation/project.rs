use super::*;
use crate::utils::log::LogMessage;
use itertools::Itertools;
use std::collections::{BTreeMap, HashSet};

/// Contains the computation of record layouts that were not provided by the compiler front-end.
mod layout_computation;

/// The `Project` struct is the main data structure representing a translation unit.
///
/// It contains the function bodies of the translation unit
/// together with all record types and typedefs referenced in them
/// and information about the target architecture.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct Project {
    /// All function definitions of the translation unit are contained in the `program` term.
    pub program: Term<Program>,
    /// All known record types, indexed by their qualified name.
    #[serde(default)]
    pub records: BTreeMap<String, Record>,
    /// All known typedefs, mapping the qualified name of the typedef to the aliased type.
    #[serde(default)]
    pub typedefs: BTreeMap<String, Type>,
    /// Contains the properties of C data types. (e.g. size)
    #[serde(default)]
    pub datatype_properties: DatatypeProperties,
}

impl TypeLayoutQuery for Project {
    fn get_record(&self, name: &str) -> Option<&Record> {
        self.records.get(name)
    }

    fn get_typedef(&self, name: &str) -> Option<&Type> {
        self.typedefs.get(name)
    }

    fn get_datatype_properties(&self) -> &DatatypeProperties {
        &self.datatype_properties
    }
}

impl Project {
    /// Replace the `name` of records whose name differs from their key in the record map.
    #[must_use]
    fn fix_record_names(&mut self) -> Vec<LogMessage> {
        let mut logs = Vec::new();
        for (name, record) in self.records.iter_mut() {
            if record.name != *name {
                logs.push(
                    LogMessage::new_error(format!(
                        "Record {} is stored under the name {}",
                        record.name, name
                    ))
                    .source("Project normalization"),
                );
                record.name = name.clone();
            }
        }
        logs
    }

    /// Remove record layouts provided by the compiler front-end that are inconsistent with the record definition.
    /// Return an error message for each removed layout.
    ///
    /// A layout is inconsistent if
    /// - the number of field or base offsets differs from the number of fields or bases,
    /// - the alignment is not a positive multiple of 8 bits,
    /// - the size is smaller than the data size or not a multiple of the alignment,
    /// - an offset lies outside of the record,
    /// - or the offsets of the non-static fields of a struct or class do not follow declaration order.
    #[must_use]
    fn remove_inconsistent_layouts(&mut self) -> Vec<LogMessage> {
        let mut logs = Vec::new();
        for (name, record) in self.records.iter_mut() {
            let is_union = record.is_union();
            let Some(definition) = record.definition.as_mut() else {
                continue;
            };
            let Some(layout) = &definition.layout else {
                continue;
            };
            let field_offsets_in_order = || {
                definition
                    .non_static_fields()
                    .map(|(index, _)| layout.field_offsets_bits[index])
                    .tuple_windows()
                    .all(|(first, second)| first <= second)
            };
            let error = if layout.field_offsets_bits.len() != definition.fields.len()
                || layout.base_offsets_bits.len() != definition.bases.len()
            {
                Some("number of offsets does not match the definition")
            } else if layout.align_bits == 0 || layout.align_bits % 8 != 0 {
                Some("invalid alignment")
            } else if layout.size_bits < layout.data_size_bits
                || layout.size_bits % layout.align_bits != 0
            {
                Some("invalid size")
            } else if layout
                .field_offsets_bits
                .iter()
                .chain(layout.base_offsets_bits.iter())
                .any(|offset| *offset > layout.size_bits)
            {
                Some("offset outside of the record")
            } else if !is_union && !field_offsets_in_order() {
                Some("field offsets do not follow declaration order")
            } else {
                None
            };
            if let Some(error) = error {
                logs.push(
                    LogMessage::new_error(format!(
                        "Ignoring the provided layout of record {name}: {error}"
                    ))
                    .source("Project normalization"),
                );
                definition.layout = None;
            }
        }
        logs
    }

    /// Compute the layouts of all complete records for which no layout was provided.
    ///
    /// Since the layout of a record depends on the layouts of its bases and fields,
    /// layouts are computed in rounds until no further layout can be computed.
    /// Return an error message for each record whose layout could not be computed,
    /// e.g. because it contains a field of incomplete type.
    #[must_use]
    fn compute_missing_layouts(&mut self) -> Vec<LogMessage> {
        let mut last_errors: BTreeMap<String, Error> = BTreeMap::new();
        loop {
            let missing_layouts: Vec<String> = self
                .records
                .iter()
                .filter(|(_, record)| {
                    matches!(&record.definition, Some(definition) if definition.layout.is_none())
                })
                .map(|(name, _)| name.clone())
                .collect();
            let mut computed_layouts = Vec::new();
            last_errors.clear();
            for name in missing_layouts {
                match self.compute_record_layout(&name) {
                    Ok(layout) => computed_layouts.push((name, layout)),
                    Err(err) => {
                        last_errors.insert(name, err);
                    }
                }
            }
            if computed_layouts.is_empty() {
                break;
            }
            for (name, layout) in computed_layouts {
                if let Some(definition) = self
                    .records
                    .get_mut(&name)
                    .and_then(|record| record.definition.as_mut())
                {
                    definition.layout = Some(layout);
                }
            }
        }
        last_errors
            .into_iter()
            .map(|(name, err)| {
                LogMessage::new_error(format!("Could not compute the layout of record {name}: {err}"))
                    .source("Project normalization")
            })
            .collect()
    }

    /// Remove jumps to blocks that do not exist in the same function.
    /// Return an error message for each removed jump.
    #[must_use]
    fn remove_jumps_to_nonexisting_blocks(&mut self) -> Vec<LogMessage> {
        let mut logs = Vec::new();
        for sub in self.program.term.subs.iter_mut() {
            let known_blocks: HashSet<Tid> = sub
                .term
                .blocks
                .iter()
                .map(|block| block.tid.clone())
                .collect();
            for block in sub.term.blocks.iter_mut() {
                block.term.jmps.retain(|jmp| match &jmp.term {
                    Jmp::Branch(target) | Jmp::CBranch { target, .. }
                        if !known_blocks.contains(target) =>
                    {
                        logs.push(
                            LogMessage::new_error(format!(
                                "Jump target {} does not exist",
                                target
                            ))
                            .location(jmp.tid.clone())
                            .source("Project normalization"),
                        );
                        false
                    }
                    _ => true,
                });
            }
        }
        logs
    }

    /// Run some normalization passes over the project.
    ///
    /// Passes:
    /// - Make the names of records consistent with their keys in the record map.
    /// - Remove record layouts that are inconsistent with the record definitions.
    /// - Compute the layouts of all complete records for which no (consistent) layout was provided.
    /// - Remove jumps to nonexisting blocks.
    #[must_use]
    pub fn normalize(&mut self) -> Vec<LogMessage> {
        let mut logs = self.fix_record_names();
        logs.append(&mut self.remove_inconsistent_layouts());
        logs.append(&mut self.compute_missing_layouts());
        logs.append(&mut self.remove_jumps_to_nonexisting_blocks());
        logs
    }
}
