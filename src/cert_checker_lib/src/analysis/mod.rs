//! Modules necessary for graph-based and path-sensitive analyses,
//! as well as the layout analyses the checks depend on.

pub mod constant_evaluation;
pub mod graph;
pub mod padding;
pub mod symbolic_execution;
