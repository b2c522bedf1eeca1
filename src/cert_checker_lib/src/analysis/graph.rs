//! Generate intraprocedural control flow graphs out of function terms.
//!
//! Each basic block of the function is converted into exactly one node.
//! The node carries a pointer to its block, so that the statements of the block
//! can be executed when a path through the graph is explored.
//! Jumps between blocks are converted to edges.
//!
//! # General assumptions
//!
//! The graph construction algorithm assumes
//! that each basic block of the function ends with zero, one or two jump instructions.
//! In the case of two jump instructions the first one is a conditional jump
//! and the second one is an unconditional jump.
//! Blocks without jump instructions and blocks ending in a return are dead ends in the graph.
//!
//! The first block of the function is the entry block and always corresponds to the node with index zero.

use crate::intermediate_representation::*;
use crate::utils::log::LogMessage;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// The graph type of an intraprocedural control flow graph
pub type Graph<'a> = DiGraph<&'a Term<Blk>, Edge>;

/// The edge type of an intraprocedural control flow graph.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Edge {
    /// An unconditional jump.
    Branch,
    /// A conditional jump. The edge is only taken if the condition of the jump evaluates to `true`.
    ConditionalBranch,
}

/// Build the control flow graph of the given function.
///
/// Jumps to targets that are not blocks of the function are ignored
/// and an error message is generated for each of them.
pub fn get_sub_cfg(sub: &Term<Sub>) -> (Graph, Vec<LogMessage>) {
    let mut graph = Graph::new();
    let mut logs = Vec::new();
    let mut tid_to_node: HashMap<&Tid, NodeIndex> = HashMap::new();
    for block in sub.term.blocks.iter() {
        let node = graph.add_node(block);
        tid_to_node.insert(&block.tid, node);
    }
    for block in sub.term.blocks.iter() {
        let source = tid_to_node[&block.tid];
        for jmp in block.term.jmps.iter() {
            let (target, edge) = match &jmp.term {
                Jmp::Branch(target) => (target, Edge::Branch),
                Jmp::CBranch { target, .. } => (target, Edge::ConditionalBranch),
                Jmp::Return(_) => continue,
            };
            match tid_to_node.get(target) {
                Some(target_node) => {
                    graph.add_edge(source, *target_node, edge);
                }
                None => logs.push(
                    LogMessage::new_error(format!(
                        "Jump target {} does not exist in function {}",
                        target, sub.term.name
                    ))
                    .location(jmp.tid.clone())
                    .source("CFG construction"),
                ),
            }
        }
    }
    (graph, logs)
}
