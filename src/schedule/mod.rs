//! Build schedules
//!
//! A schedule is a directed graph over submodels, building steps and
//! placements. Edges point from a node to the nodes it requires:
//!
//! - a submodel requires its last building step
//! - a step requires the previous step and each of its placements
//! - a placement of a submodel requires that submodel
//!
//! Nodes live in an arena keyed by generated string ids
//! ([`DuplicateIds`]), with explicit successor and predecessor sets.
//! [`build_schedule`] expands every shared submodel into per-placement copies
//! so each node is required by at most one other node, and
//! [`extract_single_model`] cuts the closure of one root out of a schedule.

mod builder;
mod extract;
mod ids;
mod normalize;

use std::collections::VecDeque;
use std::fmt;

use indexmap::{IndexMap, IndexSet};

pub use builder::{build_assembly_graph, build_schedule, build_step_graph};
pub use extract::extract_single_model;
pub use ids::DuplicateIds;
pub use normalize::normalize;

/// Generated node id
pub type NodeId = String;

/// Payload of a schedule node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScheduleNode {
    /// A submodel as a whole
    Submodel {
        /// Model name
        name: String,
    },
    /// One building step of a submodel
    Step {
        /// Owning model
        model: String,
        /// 0-based step index
        index: usize,
    },
    /// One placement inside a building step
    Placement {
        /// Owning model
        model: String,
        /// 0-based step index
        step: usize,
        /// 0-based index within the step
        index: usize,
        /// Referenced part or submodel name
        target: String,
    },
}

impl ScheduleNode {
    /// Canonical name ids are minted from
    pub fn canonical_label(&self) -> String {
        match self {
            ScheduleNode::Submodel { name } => name.clone(),
            ScheduleNode::Step { model, index } => format!("{}#{}", model, index),
            ScheduleNode::Placement {
                model,
                step,
                target,
                ..
            } => format!("{}#{}:{}", model, step, target),
        }
    }

    /// The submodel name, for submodel nodes
    pub fn submodel_name(&self) -> Option<&str> {
        match self {
            ScheduleNode::Submodel { name } => Some(name),
            _ => None,
        }
    }

    /// The referenced name, for placement nodes
    pub fn placement_target(&self) -> Option<&str> {
        match self {
            ScheduleNode::Placement { target, .. } => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for ScheduleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleNode::Submodel { name } => write!(f, "submodel {}", name),
            ScheduleNode::Step { model, index } => write!(f, "step {} of {}", index, model),
            ScheduleNode::Placement {
                model,
                step,
                index,
                target,
            } => write!(f, "{} (placement {} of step {} in {})", target, index, step, model),
        }
    }
}

/// Directed graph over schedule nodes, stored as an arena keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleGraph {
    nodes: IndexMap<NodeId, ScheduleNode>,
    successors: IndexMap<NodeId, IndexSet<NodeId>>,
    predecessors: IndexMap<NodeId, IndexSet<NodeId>>,
}

impl ScheduleGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; returns `false` and leaves the graph unchanged if `id` exists
    pub fn add_node(&mut self, id: impl Into<NodeId>, node: ScheduleNode) -> bool {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.successors.insert(id.clone(), IndexSet::new());
        self.predecessors.insert(id.clone(), IndexSet::new());
        self.nodes.insert(id, node);
        true
    }

    /// Add an edge `from → to` ("`from` requires `to`")
    ///
    /// Returns `false` if either end is missing or the edge already exists.
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        if !self.contains(from) || !self.contains(to) {
            return false;
        }
        let added = self
            .successors
            .get_mut(from)
            .is_some_and(|s| s.insert(to.to_string()));
        if added {
            if let Some(p) = self.predecessors.get_mut(to) {
                p.insert(from.to_string());
            }
        }
        added
    }

    /// Remove an edge; returns whether it existed
    pub fn remove_edge(&mut self, from: &str, to: &str) -> bool {
        let removed = self
            .successors
            .get_mut(from)
            .is_some_and(|s| s.shift_remove(to));
        if removed {
            if let Some(p) = self.predecessors.get_mut(to) {
                p.shift_remove(from);
            }
        }
        removed
    }

    /// Whether `id` is a node
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Payload of a node
    pub fn node(&self, id: &str) -> Option<&ScheduleNode> {
        self.nodes.get(id)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &ScheduleNode)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }

    /// All edges as `(from, to)` pairs
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.successors
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (from.as_str(), to.as_str())))
    }

    /// Nodes `id` requires
    pub fn children(&self, id: &str) -> impl Iterator<Item = &str> {
        self.successors
            .get(id)
            .into_iter()
            .flat_map(|s| s.iter().map(String::as_str))
    }

    /// Nodes requiring `id`
    pub fn parents(&self, id: &str) -> impl Iterator<Item = &str> {
        self.predecessors
            .get(id)
            .into_iter()
            .flat_map(|s| s.iter().map(String::as_str))
    }

    /// Number of nodes requiring `id`
    pub fn in_degree(&self, id: &str) -> usize {
        self.predecessors.get(id).map_or(0, IndexSet::len)
    }

    /// Number of nodes `id` requires
    pub fn out_degree(&self, id: &str) -> usize {
        self.successors.get(id).map_or(0, IndexSet::len)
    }

    /// Nodes nothing requires
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .keys()
            .filter(|id| self.in_degree(id) == 0)
            .map(String::as_str)
    }

    /// Largest in-degree over all nodes
    pub fn max_in_degree(&self) -> usize {
        self.predecessors.values().map(IndexSet::len).max().unwrap_or(0)
    }

    /// Whether every node is required by at most one other node
    pub fn is_tree(&self) -> bool {
        self.max_in_degree() <= 1
    }

    /// Nodes reachable from `root` by following requirement edges, `root` first
    pub fn reachable(&self, root: &str) -> IndexSet<NodeId> {
        let mut seen = IndexSet::new();
        if !self.contains(root) {
            return seen;
        }
        let mut stack = vec![root.to_string()];
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            // Reverse keeps the visit order equal to the edge order
            for child in self.children(&id).collect::<Vec<_>>().into_iter().rev() {
                if !seen.contains(child) {
                    stack.push(child.to_string());
                }
            }
        }
        seen
    }

    /// Nodes ordered so every node comes after everything it requires
    ///
    /// Nodes on a cycle are omitted.
    pub fn build_order(&self) -> Vec<&str> {
        let mut remaining: IndexMap<&str, usize> = self
            .nodes
            .keys()
            .map(|id| (id.as_str(), self.out_degree(id)))
            .collect();
        let mut ready: VecDeque<&str> = remaining
            .iter()
            .filter(|&(_, &n)| n == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop_front() {
            order.push(id);
            for parent in self.parents(id) {
                if let Some(n) = remaining.get_mut(parent) {
                    *n -= 1;
                    if *n == 0 {
                        ready.push_back(parent);
                    }
                }
            }
        }
        order
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.successors.values().map(IndexSet::len).sum()
    }
}

/// A schedule graph together with the id generator that minted its ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    /// The graph
    pub graph: ScheduleGraph,
    /// Id generator; keep using it to add nodes
    pub ids: DuplicateIds,
}

impl Schedule {
    /// Create an empty schedule
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint an id for `node` and add it
    pub fn add(&mut self, node: ScheduleNode) -> NodeId {
        let id = self.ids.mint(&node.canonical_label());
        self.graph.add_node(id.clone(), node);
        id
    }

    /// Canonical name behind a node id
    pub fn canonical_name(&self, id: &str) -> Option<&str> {
        self.ids.canonical_name(id)
    }

    /// Ids of the nodes that trace back to `canonical`
    pub fn copies_of<'a>(&'a self, canonical: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.ids
            .ids_of(canonical)
            .filter(|id| self.graph.contains(id))
    }

    /// Ids of all submodel nodes
    pub fn submodels(&self) -> impl Iterator<Item = &str> {
        self.graph
            .nodes()
            .filter(|(_, node)| matches!(node, ScheduleNode::Submodel { .. }))
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submodel(name: &str) -> ScheduleNode {
        ScheduleNode::Submodel {
            name: name.to_string(),
        }
    }

    #[test]
    fn test_edges_and_degrees() {
        let mut graph = ScheduleGraph::new();
        graph.add_node("a", submodel("a"));
        graph.add_node("b", submodel("b"));
        graph.add_node("c", submodel("c"));
        assert!(graph.add_edge("a", "b"));
        assert!(graph.add_edge("c", "b"));
        assert!(!graph.add_edge("a", "b"));
        assert!(!graph.add_edge("a", "missing"));

        assert_eq!(graph.in_degree("b"), 2);
        assert_eq!(graph.out_degree("a"), 1);
        assert_eq!(graph.roots().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(!graph.is_tree());

        assert!(graph.remove_edge("c", "b"));
        assert!(graph.is_tree());
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.parents("b").collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_build_order_puts_requirements_first() {
        let mut graph = ScheduleGraph::new();
        for id in ["root", "mid", "leaf"] {
            graph.add_node(id, submodel(id));
        }
        graph.add_edge("root", "mid");
        graph.add_edge("mid", "leaf");
        graph.add_edge("root", "leaf");
        assert_eq!(graph.build_order(), vec!["leaf", "mid", "root"]);
    }

    #[test]
    fn test_build_order_omits_cycles() {
        let mut graph = ScheduleGraph::new();
        for id in ["a", "b", "c"] {
            graph.add_node(id, submodel(id));
        }
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");
        assert_eq!(graph.build_order(), vec!["c"]);
    }

    #[test]
    fn test_reachable() {
        let mut graph = ScheduleGraph::new();
        for id in ["a", "b", "c", "d"] {
            graph.add_node(id, submodel(id));
        }
        graph.add_edge("a", "b");
        graph.add_edge("a", "c");
        graph.add_edge("d", "a");
        let reached: Vec<_> = graph.reachable("a").into_iter().collect();
        assert_eq!(reached, vec!["a", "b", "c"]);
        assert!(graph.reachable("zzz").is_empty());
    }

    #[test]
    fn test_schedule_add_mints_ids() {
        let mut schedule = Schedule::new();
        let first = schedule.add(ScheduleNode::Placement {
            model: "m.ldr".into(),
            step: 0,
            index: 0,
            target: "3001.dat".into(),
        });
        let second = schedule.add(ScheduleNode::Placement {
            model: "m.ldr".into(),
            step: 0,
            index: 1,
            target: "3001.dat".into(),
        });
        assert_eq!(first, "m.ldr#0:3001.dat");
        assert_eq!(second, "m.ldr#0:3001.dat~1");
        assert_eq!(schedule.copies_of("m.ldr#0:3001.dat").count(), 2);
    }
}
