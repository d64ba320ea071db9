//! Diamond expansion
//!
//! A submodel placed from several places must not share its build subtree:
//! every placement carries its own transform. Normalization gives each
//! placement of a submodel a private copy of that submodel's subtree, so
//! afterwards every node is required by at most one other node. The
//! canonical submodel nodes stay in the graph as roots of their own.

use std::collections::{HashMap, VecDeque};

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};

use super::{NodeId, Schedule, ScheduleNode};

/// Expand shared submodels into per-placement copies
///
/// Submodels are processed dependencies first, so the subtree copied for a
/// placement is already a tree. Placements that already require a copy are
/// left alone, which makes a second call a no-op.
///
/// # Errors
///
/// [`Error::SubmodelCycle`] when submodels place each other cyclically,
/// including a submodel placing itself.
pub fn normalize(schedule: &mut Schedule) -> Result<()> {
    let canonical = canonical_submodels(schedule);
    let order = dependency_order(schedule, &canonical)?;

    let mut copies = 0;
    for model in &order {
        let canonical_id = &canonical[model];
        let placements: Vec<NodeId> = schedule
            .graph
            .nodes()
            .filter(|(_, node)| node.placement_target() == Some(model.as_str()))
            .map(|(id, _)| id.to_string())
            .filter(|id| !requires_copy_of(schedule, id, model, canonical_id))
            .collect();

        for placement in placements {
            let copy = duplicate_subtree(schedule, canonical_id);
            schedule.graph.remove_edge(&placement, canonical_id);
            schedule.graph.add_edge(&placement, &copy);
            copies += 1;
        }
    }

    tracing::debug!(submodels = order.len(), copies, "Normalized schedule");
    Ok(())
}

// Submodel name to the id of its canonical node. Copies carry the same
// payload but a suffixed id.
fn canonical_submodels(schedule: &Schedule) -> IndexMap<String, NodeId> {
    schedule
        .graph
        .nodes()
        .filter_map(|(id, node)| {
            let name = node.submodel_name()?;
            (schedule.canonical_name(id) == Some(id)).then(|| (name.to_string(), id.to_string()))
        })
        .collect()
}

fn requires_copy_of(schedule: &Schedule, placement: &str, model: &str, canonical_id: &str) -> bool {
    schedule.graph.children(placement).any(|child| {
        child != canonical_id
            && schedule.graph.node(child).and_then(ScheduleNode::submodel_name) == Some(model)
    })
}

// Kahn's algorithm over "is placed by" edges: a submodel comes before every
// submodel that places it.
fn dependency_order(
    schedule: &Schedule,
    canonical: &IndexMap<String, NodeId>,
) -> Result<Vec<String>> {
    let mut placed_by: IndexMap<&str, IndexSet<&str>> =
        canonical.keys().map(|name| (name.as_str(), IndexSet::new())).collect();
    let mut pending: HashMap<&str, usize> = canonical.keys().map(|name| (name.as_str(), 0)).collect();

    for (_, node) in schedule.graph.nodes() {
        let ScheduleNode::Placement { model, target, .. } = node else {
            continue;
        };
        if !canonical.contains_key(model.as_str()) {
            continue;
        }
        if let Some(users) = placed_by.get_mut(target.as_str()) {
            if users.insert(model.as_str()) {
                if let Some(n) = pending.get_mut(model.as_str()) {
                    *n += 1;
                }
            }
        }
    }

    let mut ready: VecDeque<&str> = canonical
        .keys()
        .map(String::as_str)
        .filter(|name| pending.get(name) == Some(&0))
        .collect();
    let mut order = Vec::with_capacity(canonical.len());
    while let Some(name) = ready.pop_front() {
        order.push(name.to_string());
        for &user in placed_by.get(name).into_iter().flatten() {
            if let Some(n) = pending.get_mut(user) {
                *n -= 1;
                if *n == 0 {
                    ready.push_back(user);
                }
            }
        }
    }

    if order.len() < canonical.len() {
        let cyclic: Vec<&str> = canonical
            .keys()
            .map(String::as_str)
            .filter(|name| !order.iter().any(|done| done == name))
            .collect();
        return Err(Error::SubmodelCycle(cyclic.join(", ")));
    }
    Ok(order)
}

// Copy every node reachable from `root` under fresh ids traced to the same
// canonical names. Returns the id of the copied root.
fn duplicate_subtree(schedule: &mut Schedule, root: &str) -> NodeId {
    let nodes = schedule.graph.reachable(root);
    let mut mapping: HashMap<&str, NodeId> = HashMap::with_capacity(nodes.len());

    for old in &nodes {
        let Some(node) = schedule.graph.node(old).cloned() else {
            continue;
        };
        let canonical = schedule
            .ids
            .canonical_name(old)
            .map_or_else(|| node.canonical_label(), str::to_string);
        let new = schedule.ids.mint(&canonical);
        schedule.graph.add_node(new.clone(), node);
        mapping.insert(old.as_str(), new);
    }

    for old in &nodes {
        let children: Vec<String> = schedule.graph.children(old).map(str::to_string).collect();
        for child in children {
            if let (Some(from), Some(to)) = (mapping.get(old.as_str()), mapping.get(child.as_str())) {
                schedule.graph.add_edge(from, to);
            }
        }
    }

    mapping
        .remove(root)
        .unwrap_or_else(|| root.to_string())
}
