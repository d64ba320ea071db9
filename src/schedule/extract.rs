//! Single-model extraction

use crate::error::{Error, Result};

use super::{Schedule, ScheduleGraph};

/// Cut the closure of `root` out of `schedule`
///
/// `root` is usually a submodel name but may be any node id. The result keeps
/// the node ids of `schedule` and a copy of its id generator.
///
/// # Errors
///
/// [`Error::UnknownScheduleRoot`] when `root` is not a node of `schedule`.
pub fn extract_single_model(schedule: &Schedule, root: &str) -> Result<Schedule> {
    if !schedule.graph.contains(root) {
        return Err(Error::UnknownScheduleRoot(root.to_string()));
    }
    let keep = schedule.graph.reachable(root);

    let mut graph = ScheduleGraph::new();
    for (id, node) in schedule.graph.nodes() {
        if keep.contains(id) {
            graph.add_node(id, node.clone());
        }
    }
    for (from, to) in schedule.graph.edges() {
        if keep.contains(from) {
            graph.add_edge(from, to);
        }
    }

    tracing::debug!(root, nodes = graph.len(), "Extracted single model");
    Ok(Schedule {
        graph,
        ids: schedule.ids.clone(),
    })
}
