//! This module implements a check for EXP42-C: Do not compare padding data,
//! together with OOP57-CPP: Prefer special member functions and overloaded operators to C Standard Library functions.
//!
//! The values of padding bits and bytes of a struct are indeterminate.
//! Comparing the object representation of two structs with `memcmp` may thus
//! report two objects with equal members as different.
//! For C++ classes that are not standard-layout (e.g. classes with virtual functions)
//! the object representation additionally contains implementation details like virtual table pointers,
//! so a byte-wise comparison is never meaningful for them.
//!
//! See <https://wiki.sei.cmu.edu/confluence/display/c/EXP42-C.+Do+not+compare+padding+data>
//! and <https://wiki.sei.cmu.edu/confluence/display/cplusplus/OOP57-CPP.+Prefer+special+member+functions+and+overloaded+operators+to+C+Standard+Library+functions>
//! for detailed descriptions.
//!
//! ## How the check works
//!
//! For each call to a function listed in the symbols for EXP42 (configurable in config.json)
//! with exactly three arguments we look at the types of the first two arguments
//! before their implicit conversion to `const void *`.
//! If an argument points to (or is an array of) a record type then
//! - an OOP57 warning is generated if the record is not standard-layout,
//! - an EXP42 warning is generated if the number of compared bytes is a constant
//! and the compared bytes contain a padding bit of the record.
//!
//! The number of compared bytes is computed by constant folding of the third argument.
//! If more bytes than the size of the record are compared,
//! the comparison is assumed to span an array of records.
//! Since each array element has the same padding, only the first element is checked in this case.
//!
//! At most one warning is generated per call.
//!
//! ## False Positives
//!
//! - The padding may have been initialized explicitly, e.g. with `memset`, before the comparison.
//!
//! ## False Negatives
//!
//! - Comparisons where the compared size is not a compile time constant are only checked for non-standard-layout types.
//! - Pointers to records that were cast to another type (e.g. `void *` or `char *`) explicitly are not followed.
//! - Forward declared records cannot be checked.

use crate::analysis::constant_evaluation::ConstantEvaluator;
use crate::analysis::padding::PaddingAnalysis;
use crate::intermediate_representation::*;
use crate::prelude::*;
use crate::utils::log::{CheckWarning, LogMessage};
use crate::utils::symbol_utils::get_calls_to_symbols;
use crate::CheckModule;

/// The module name and version
pub static CHECK_MODULE: CheckModule = CheckModule {
    name: "EXP42",
    version: "0.1",
    run: check_cwe,
};

/// The name of warnings generated for comparisons of non-standard-layout types.
pub const NON_STANDARD_LAYOUT_WARNING_NAME: &str = "OOP57";

/// Function symbols read from *config.json*.
/// Calls to these functions are treated as byte-wise comparisons of their first two arguments.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone)]
pub struct Config {
    symbols: Vec<String>,
}

/// A byte-wise comparison found in the program.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ComparisonRequest {
    /// The types of the two compared operands, i.e. of the pointer arguments before their implicit conversions.
    /// The type is `void` if it could not be determined.
    pub operand_types: [Type; 2],
    /// The number of compared bits if it is a compile-time constant.
    pub compared_bits: Option<u64>,
}

impl ComparisonRequest {
    /// Build the request from a call with the argument list `(lhs, rhs, size_in_bytes)`.
    /// Returns `None` if the expression is not a call with three arguments.
    pub fn from_call(call: &Expression, evaluator: &dyn ConstantEvaluator) -> Option<ComparisonRequest> {
        let Expression::Call { args, .. } = call else {
            return None;
        };
        let [lhs, rhs, size] = args.as_slice() else {
            return None;
        };
        let operand_type = |arg: &Expression| arg.ignore_implicit().get_type().unwrap_or(Type::Void);
        Some(ComparisonRequest {
            operand_types: [operand_type(lhs), operand_type(rhs)],
            compared_bits: evaluator
                .evaluate(size)
                .and_then(|bytes| bytes.checked_mul(8)),
        })
    }
}

/// The finding for one operand of a comparison.
#[derive(Debug, PartialEq, Eq, Clone)]
enum Finding {
    NonStandardLayout { record: String },
    Padding { record: String, first_padding_bit: u64 },
}

/// Check the record pointed to by one operand of the comparison.
///
/// Returns `Ok(None)` if the operand does not point to a complete record
/// or if comparing it is safe.
fn check_operand(
    query: &dyn TypeLayoutQuery,
    padding: &PaddingAnalysis,
    operand_type: &Type,
    compared_bits: Option<u64>,
) -> Result<Option<Finding>, Error> {
    let operand_type = query.canonical_type(operand_type);
    // Pointers to arrays are not followed into the array.
    let compared_type = match &operand_type {
        Type::Pointer(pointee) => pointee.as_ref(),
        Type::Array { .. } => operand_type.get_base_element_type(),
        _ => return Ok(None),
    };
    let Some(record) = query.get_canonical_record_name(compared_type) else {
        return Ok(None);
    };
    if query.get_record_definition(&record).is_none() {
        return Ok(None);
    }
    if !query.is_standard_layout(&record) {
        return Ok(Some(Finding::NonStandardLayout { record }));
    }
    let Some(compared_bits) = compared_bits else {
        return Ok(None);
    };
    Ok(padding
        .first_padding_bit(&record, compared_bits)?
        .map(|first_padding_bit| Finding::Padding {
            record,
            first_padding_bit,
        }))
}

/// Check the given call to a comparison function.
///
/// The operands are checked in order and the first finding is reported.
/// Operands whose records could not be analyzed are skipped and a debug message is added to `logs`.
pub fn analyze_call(
    project: &Project,
    padding: &PaddingAnalysis,
    call_tid: &Tid,
    call: &Expression,
    logs: &mut Vec<LogMessage>,
) -> Option<CheckWarning> {
    let request = ComparisonRequest::from_call(call, project)?;
    for operand_type in request.operand_types.iter() {
        match check_operand(project, padding, operand_type, request.compared_bits) {
            Ok(Some(finding)) => return Some(generate_warning(call_tid, call, finding)),
            Ok(None) => (),
            Err(err) => logs.push(
                LogMessage::new_debug(format!("Could not check operand of type {operand_type}: {err}"))
                    .location(call_tid.clone())
                    .source(CHECK_MODULE.name),
            ),
        }
    }
    None
}

/// Generate the warning for a finding at the given call.
fn generate_warning(call_tid: &Tid, call: &Expression, finding: Finding) -> CheckWarning {
    let target = match call {
        Expression::Call { target, .. } => target.clone(),
        _ => String::new(),
    };
    let (name, description, record) = match finding {
        Finding::NonStandardLayout { record } => (
            NON_STANDARD_LAYOUT_WARNING_NAME,
            format!(
                "(Comparison of Non-Standard-Layout Type) comparing object representation of non-standard-layout type {} at {}; consider using a comparison operator instead",
                record, call_tid.address
            ),
            record,
        ),
        Finding::Padding {
            record,
            first_padding_bit,
        } => (
            CHECK_MODULE.name,
            format!(
                "(Comparison of Padding Data) comparing padding data in type {} (first padding byte at offset {}) at {}; consider comparing the fields manually",
                record,
                first_padding_bit / 8,
                call_tid.address
            ),
            record,
        ),
    };
    CheckWarning::new(name, CHECK_MODULE.version, description)
        .tids(vec![format!("{call_tid}")])
        .addresses(vec![call_tid.address.clone()])
        .symbols(vec![record, target])
}

/// Execute the check.
///
/// For each call to a function from the symbol list configured in the configuration file
/// we check whether the compared records contain padding in the compared range or are not standard-layout.
pub fn check_cwe(
    analysis_results: &AnalysisResults,
    check_params: &serde_json::Value,
) -> (Vec<LogMessage>, Vec<CheckWarning>) {
    let project = analysis_results.project;
    let config: Config = match serde_json::from_value(check_params.clone()) {
        Ok(config) => config,
        Err(err) => {
            let log = LogMessage::new_error(format!("Invalid configuration: {err}"))
                .source(CHECK_MODULE.name);
            return (vec![log], Vec::new());
        }
    };
    let local_padding_analysis;
    let padding = match analysis_results.padding_analysis {
        Some(padding) => padding,
        None => {
            local_padding_analysis = analysis_results.compute_padding_analysis();
            &local_padding_analysis
        }
    };

    let mut logs = Vec::new();
    let mut warnings = Vec::new();
    for sub in project.program.term.subs.iter() {
        for (tid, call) in get_calls_to_symbols(sub, &config.symbols) {
            warnings.extend(analyze_call(project, padding, tid, call, &mut logs));
        }
    }
    (logs, warnings)
}
