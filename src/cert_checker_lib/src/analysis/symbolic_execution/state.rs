use super::{AllocationIdentity, RegionId, SymbolicState};
use crate::intermediate_representation::*;
use fnv::FnvHashMap;
use std::collections::BTreeMap;

/// The symbolic state on one path through a function.
///
/// The state tracks which local variables point to the start of a memory region allocated on the path
/// and remembers the allocation identity of each such region.
/// Variables not tracked by the state point to unknown memory.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct State {
    /// Maps variable names to the regions they point to.
    bindings: FnvHashMap<String, RegionId>,
    /// The allocation identities of all regions allocated on the path.
    allocations: BTreeMap<RegionId, AllocationIdentity>,
    /// The number of allocations per allocation site on the path.
    allocation_counts: FnvHashMap<Tid, u64>,
}

impl State {
    /// Create an empty state, i.e. the state at the start of a function.
    /// Function parameters point to unknown memory.
    pub fn new() -> State {
        State::default()
    }

    /// Execute the given statement.
    /// Return the newly allocated region if the statement allocates memory.
    pub fn execute(&mut self, stmt: &Term<Stmt>) -> Option<RegionId> {
        match &stmt.term {
            Stmt::Declare { var, init: None } => {
                self.bindings.remove(&var.name);
                None
            }
            Stmt::Declare {
                var,
                init: Some(value),
            }
            | Stmt::Assign { var, value } => {
                let allocated_region = self.allocate(&stmt.tid, value);
                match allocated_region.clone().or_else(|| self.region_of(value)) {
                    Some(region) => {
                        self.bindings.insert(var.name.clone(), region);
                    }
                    None => {
                        self.bindings.remove(&var.name);
                    }
                }
                allocated_region
            }
            Stmt::Expr(expr) => self.allocate(&stmt.tid, expr),
            Stmt::Delete { .. } => None,
        }
    }

    /// If the expression (ignoring casts) is a `new` expression,
    /// create a new region with the allocation site `site` and return it.
    fn allocate(&mut self, site: &Tid, expr: &Expression) -> Option<RegionId> {
        match expr {
            Expression::Cast { arg, .. } | Expression::ImplicitCast { arg, .. } => {
                self.allocate(site, arg)
            }
            Expression::New { ty, array_size } => {
                let count = self.allocation_counts.entry(site.clone()).or_insert(0);
                let region = RegionId {
                    site: site.clone(),
                    index: *count,
                };
                *count += 1;
                self.allocations.insert(
                    region.clone(),
                    AllocationIdentity {
                        region: region.clone(),
                        dynamic_type: ty.clone(),
                        allocation_site: site.clone(),
                        array_form: array_size.is_some(),
                    },
                );
                Some(region)
            }
            _ => None,
        }
    }
}

impl SymbolicState for State {
    /// Casts preserve the region of their argument.
    /// Pointer arithmetic is assumed to stay inside the region of the left hand side.
    fn region_of(&self, expr: &Expression) -> Option<RegionId> {
        match expr {
            Expression::Var(var) => self.bindings.get(&var.name).cloned(),
            Expression::Cast { arg, .. } | Expression::ImplicitCast { arg, .. } => {
                self.region_of(arg)
            }
            Expression::BinOp {
                op: BinOpType::Add | BinOpType::Sub,
                lhs,
                ..
            } => self.region_of(lhs),
            _ => None,
        }
    }

    fn allocation(&self, region: &RegionId) -> Option<&AllocationIdentity> {
        self.allocations.get(region)
    }
}
