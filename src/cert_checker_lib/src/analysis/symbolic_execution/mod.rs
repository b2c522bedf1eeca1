//! A bounded path-sensitive exploration of function bodies.
//!
//! Each function is explored path by path in depth-first order.
//! On each path the statements are executed on a symbolic [`State`]
//! that tracks which variables point to memory regions allocated by `new` or `new[]` expressions on the path
//! together with the allocation identity of each region.
//! Registered [`PathChecker`]s are called before each statement is executed
//! and get access to the current state and to the path executed so far.
//!
//! The exploration is not sound:
//! Loops are unrolled at most `max_block_visits` times per path
//! and at most `max_paths` paths are explored per function.
//! Conditions of conditional jumps are ignored, i.e. both branches are always explored.
//! Calls are not followed and their return values are unknown.

use crate::analysis::graph::{get_sub_cfg, Graph};
use crate::intermediate_representation::*;
use crate::prelude::*;
use crate::utils::log::{LogMessage, PathNote};
use fnv::FnvHashMap;
use petgraph::graph::NodeIndex;
use std::fmt;

mod state;
pub use state::State;

/// A symbolic handle for a memory region allocated on a path.
///
/// The region is identified by its allocation site
/// and by the number of allocations at the same site that happened before on the same path.
#[derive(Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct RegionId {
    /// The term ID of the statement containing the allocating `new` expression.
    pub site: Tid,
    /// Disambiguates several allocations at the same site on one path, e.g. in loops.
    pub index: u64,
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.site, self.index)
    }
}

/// The identity of a memory region as recorded at its allocation.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct AllocationIdentity {
    pub region: RegionId,
    /// The type of the allocated object, i.e. the element type for array allocations.
    pub dynamic_type: Type,
    /// The term ID of the statement containing the allocation.
    pub allocation_site: Tid,
    /// `true` if the region was allocated by `new[]`.
    pub array_form: bool,
}

/// Queries on the symbolic state at a point on a path.
pub trait SymbolicState {
    /// Return the region the value of the expression points to
    /// or `None` if the value is unknown or does not point to a tracked region.
    fn region_of(&self, expr: &Expression) -> Option<RegionId>;

    /// Return the allocation identity of the given region.
    fn allocation(&self, region: &RegionId) -> Option<&AllocationIdentity>;
}

/// One executed statement on an explored path.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExplodedNode<'a> {
    /// The executed statement.
    pub stmt: &'a Term<Stmt>,
    /// The region allocated by the statement, if any.
    pub allocated_region: Option<RegionId>,
}

/// A check that is executed during path exploration.
pub trait PathChecker {
    /// Called before `stmt` is executed on a path.
    /// `path` contains the statements executed on the path before `stmt`.
    fn check_pre_stmt(&self, stmt: &Term<Stmt>, state: &dyn SymbolicState, path: &[ExplodedNode]);
}

/// A visitor that walks a path backwards, i.e. from the last executed statement towards the function start,
/// and may attach a note to each visited node.
///
/// Visitors are values that are consumed and returned on each step,
/// so that state transitions of the visitor are explicit.
pub trait PathVisitor: Sized {
    /// Visit the next node of the backward walk.
    /// Return the visitor for the remaining walk and an optional note for the node.
    fn visit_node(self, node: &ExplodedNode) -> (Self, Option<PathNote>);
}

/// Walk the path backwards with the given visitor and collect all notes generated by the visitor.
pub fn visit_path_backwards<V: PathVisitor>(path: &[ExplodedNode], visitor: V) -> Vec<PathNote> {
    let mut visitor = visitor;
    let mut notes = Vec::new();
    for node in path.iter().rev() {
        let (next_visitor, note) = visitor.visit_node(node);
        visitor = next_visitor;
        notes.extend(note);
    }
    notes
}

/// The configuration of the path exploration.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub struct Config {
    /// How often a single block may be visited on one path.
    pub max_block_visits: usize,
    /// The maximal number of paths explored per function.
    pub max_paths: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_block_visits: 2,
            max_paths: 1000,
        }
    }
}

/// A partially explored path.
struct PathPrefix<'a> {
    /// The block to execute next.
    node: NodeIndex,
    state: State,
    path: Vec<ExplodedNode<'a>>,
    block_visits: FnvHashMap<NodeIndex, usize>,
}

/// Explores the paths through function bodies and calls the registered checkers on each path.
pub struct PathExplorer<'a> {
    config: Config,
    checkers: Vec<&'a dyn PathChecker>,
}

impl<'a> PathExplorer<'a> {
    /// Create a new path explorer without registered checkers.
    pub fn new(config: Config) -> PathExplorer<'a> {
        PathExplorer {
            config,
            checkers: Vec::new(),
        }
    }

    /// Register a checker that gets called during path exploration.
    pub fn register_checker(&mut self, checker: &'a dyn PathChecker) {
        self.checkers.push(checker);
    }

    /// Explore all paths through all functions of the program.
    pub fn explore_program(&self, program: &Term<Program>) -> Vec<LogMessage> {
        program
            .term
            .subs
            .iter()
            .flat_map(|sub| self.explore_sub(sub))
            .collect()
    }

    /// Explore the paths through the given function.
    /// Return log messages generated during the exploration.
    pub fn explore_sub(&self, sub: &Term<Sub>) -> Vec<LogMessage> {
        let (graph, mut logs) = get_sub_cfg(sub);
        if graph.node_count() == 0 {
            return logs;
        }
        let mut worklist = vec![PathPrefix {
            node: NodeIndex::new(0),
            state: State::new(),
            path: Vec::new(),
            block_visits: FnvHashMap::default(),
        }];
        let mut finished_paths = 0;
        while let Some(prefix) = worklist.pop() {
            let successors = self.execute_block(&graph, prefix);
            if successors.is_empty() {
                finished_paths += 1;
                if finished_paths >= self.config.max_paths {
                    if !worklist.is_empty() {
                        logs.push(
                            LogMessage::new_debug(format!(
                                "Path limit of {} reached in function {}",
                                self.config.max_paths, sub.term.name
                            ))
                            .location(sub.tid.clone())
                            .source("Path exploration"),
                        );
                    }
                    break;
                }
            }
            worklist.extend(successors);
        }
        logs
    }

    /// Execute the block of the given path prefix
    /// and return the extended prefixes for all successor blocks that may still be visited on the path.
    fn execute_block<'b>(&self, graph: &Graph<'b>, prefix: PathPrefix<'b>) -> Vec<PathPrefix<'b>> {
        let PathPrefix {
            node,
            mut state,
            mut path,
            mut block_visits,
        } = prefix;
        *block_visits.entry(node).or_insert(0) += 1;
        let block: &'b Term<Blk> = graph[node];
        for stmt in block.term.stmts.iter() {
            for checker in self.checkers.iter() {
                checker.check_pre_stmt(stmt, &state, &path);
            }
            let allocated_region = state.execute(stmt);
            path.push(ExplodedNode {
                stmt,
                allocated_region,
            });
        }
        let successors: Vec<NodeIndex> = graph
            .neighbors(node)
            .filter(|successor| {
                block_visits.get(successor).copied().unwrap_or(0) < self.config.max_block_visits
            })
            .collect();
        successors
            .into_iter()
            .map(|successor| PathPrefix {
                node: successor,
                state: state.clone(),
                path: path.clone(),
                block_visits: block_visits.clone(),
            })
            .collect()
    }
}
