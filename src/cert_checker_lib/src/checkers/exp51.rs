//! This module implements a check for EXP51-CPP: Do not delete an array through a pointer of the incorrect type.
//!
//! Deleting an array with `delete[]` through a pointer whose static pointee type
//! differs from the dynamic type of the array elements is undefined behavior,
//! even if the static type is a base class of the element type.
//! In practice the destructors are called with wrong object offsets and the deallocation may be passed a wrong size.
//!
//! See <https://wiki.sei.cmu.edu/confluence/display/cplusplus/EXP51-CPP.+Do+not+delete+an+array+through+a+pointer+of+the+incorrect+type>
//! for a detailed description.
//!
//! ## How the check works
//!
//! Every path through each function is explored by the [path explorer](crate::analysis::symbolic_execution)
//! which tracks the memory regions allocated with `new[]` on the path together with the allocated element type.
//! When a `delete[]` statement is reached on a path and the deleted pointer points to such a region,
//! the static pointee type of the pointer is compared to the element type recorded at the allocation.
//! If both are (different) record types, a warning is generated.
//! The warning contains a note pointing to the allocation site on the path.
//!
//! Warnings generated on different paths for the same `delete[]` statement are reported only once.
//!
//! ## False Positives
//!
//! - Conditions of branches are not evaluated, so infeasible paths may be explored.
//!
//! ## False Negatives
//!
//! - Allocations are tracked only inside a function.
//! Arrays allocated in another function or passed as parameters are not checked.
//! - Pointers stored in memory (e.g. in struct members or arrays) are not tracked.
//! - Loops are only unrolled a bounded number of times and the number of explored paths per function is bounded
//! (configurable in config.json).

use crate::analysis::symbolic_execution::{
    visit_path_backwards, Config, ExplodedNode, PathChecker, PathExplorer, PathVisitor, RegionId,
    SymbolicState,
};
use crate::intermediate_representation::*;
use crate::prelude::*;
use crate::utils::log::{CheckWarning, LogMessage, LogThread, LogThreadMsg, PathNote};
use crate::CheckModule;

/// The module name and version
pub static CHECK_MODULE: CheckModule = CheckModule {
    name: "EXP51",
    version: "0.1",
    run: check_cwe,
};

/// A backward search for the allocation site of a region on a path.
///
/// Only the last allocation of the region on the path, i.e. the first one found by the backward walk, gets annotated.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AllocationSiteSearch {
    /// The allocation site of the region has not been visited yet.
    Searching(RegionId),
    /// The allocation site was already found.
    Found,
}

impl PathVisitor for AllocationSiteSearch {
    fn visit_node(self, node: &ExplodedNode) -> (Self, Option<PathNote>) {
        match self {
            AllocationSiteSearch::Searching(region)
                if node.allocated_region.as_ref() == Some(&region) =>
            {
                (
                    AllocationSiteSearch::Found,
                    Some(PathNote::new(&node.stmt.tid, "allocated here")),
                )
            }
            search => (search, None),
        }
    }
}

/// A path checker looking for `delete[]` statements on arrays whose element type
/// differs from the pointee type of the deleted pointer.
pub struct ArrayDeleteChecker<'a> {
    query: &'a dyn TypeLayoutQuery,
    /// Warnings are sent to the log collector.
    sender: crossbeam_channel::Sender<LogThreadMsg>,
}

impl<'a> ArrayDeleteChecker<'a> {
    /// Create a new checker that sends its warnings to the given sender.
    pub fn new(
        query: &'a dyn TypeLayoutQuery,
        sender: crossbeam_channel::Sender<LogThreadMsg>,
    ) -> ArrayDeleteChecker<'a> {
        ArrayDeleteChecker { query, sender }
    }

    /// Check a `delete[]` statement reached on the given path.
    ///
    /// Returns a warning if the deleted pointer points to an array allocated on the path
    /// whose element type is a record different from the static pointee type of the pointer.
    /// Returns `None` for non-array deletes and whenever one of the types is unknown or not a complete record.
    pub fn on_array_delete(
        &self,
        delete_stmt: &Term<Stmt>,
        state: &dyn SymbolicState,
        path: &[ExplodedNode],
    ) -> Option<CheckWarning> {
        let Stmt::Delete {
            argument,
            array_form: true,
        } = &delete_stmt.term
        else {
            return None;
        };
        let region = state.region_of(argument)?;
        let allocation = state.allocation(&region)?;
        if !allocation.array_form {
            return None;
        }
        let static_type = self.query.canonical_type(&argument.get_type()?);
        let static_record = self
            .query
            .get_canonical_record_name(static_type.get_pointee_type()?)?;
        let dynamic_record = self
            .query
            .get_canonical_record_name(&allocation.dynamic_type)?;
        if static_record == dynamic_record
            || self.query.get_record_definition(&static_record).is_none()
            || self.query.get_record_definition(&dynamic_record).is_none()
        {
            return None;
        }
        let notes = visit_path_backwards(path, AllocationSiteSearch::Searching(region));
        Some(
            CheckWarning::new(
                CHECK_MODULE.name,
                CHECK_MODULE.version,
                format!(
                    "(Deleting an array through a pointer to the incorrect type) deleting an array of {} through a pointer to {} at {}",
                    dynamic_record, static_record, delete_stmt.tid.address
                ),
            )
            .tids(vec![format!("{}", delete_stmt.tid)])
            .addresses(vec![delete_stmt.tid.address.clone()])
            .symbols(vec![dynamic_record, static_record])
            .notes(notes),
        )
    }
}

impl<'a> PathChecker for ArrayDeleteChecker<'a> {
    fn check_pre_stmt(&self, stmt: &Term<Stmt>, state: &dyn SymbolicState, path: &[ExplodedNode]) {
        if let Some(warning) = self.on_array_delete(stmt, state, path) {
            let _ = self.sender.send(warning.into());
        }
    }
}

/// Run the check for EXP51-CPP.
///
/// All paths through all functions are explored with the path exploration bounds given in the configuration.
/// Returns collected log messages and the deduplicated warnings.
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
    let log_thread = LogThread::spawn(LogThread::collect_and_deduplicate);
    let checker = ArrayDeleteChecker::new(project, log_thread.get_msg_sender());
    let mut explorer = PathExplorer::new(config);
    explorer.register_checker(&checker);
    for log in explorer.explore_program(&project.program) {
        let _ = checker.sender.send(log.into());
    }
    log_thread.collect()
}
