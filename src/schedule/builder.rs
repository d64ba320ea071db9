//! Schedule construction from a model store

use std::collections::HashMap;

use crate::error::Result;
use crate::model::{ModelStore, NameKind, Placement};
use crate::resolver::normalize_name;

use super::{NodeId, Schedule, ScheduleNode, normalize};

// One node per submodel, keyed by normalized name; ids equal the model names
// unless a name collides with an earlier minted id.
fn add_submodels(schedule: &mut Schedule, store: &ModelStore) -> HashMap<String, NodeId> {
    store
        .models
        .values()
        .map(|plan| {
            let id = schedule.add(ScheduleNode::Submodel {
                name: plan.name.clone(),
            });
            (normalize_name(&plan.name), id)
        })
        .collect()
}

// Placement targets naming a submodel use that submodel's declared spelling.
fn target_name(store: &ModelStore, placement: &Placement) -> String {
    match store.model(&placement.name) {
        Some(plan) => plan.name.clone(),
        None => placement.name.clone(),
    }
}

/// Build the flat assembly graph
///
/// One node per submodel and one node per placement, with an edge from each
/// submodel to every placement in its steps. Steps are not represented.
pub fn build_assembly_graph(store: &ModelStore) -> Schedule {
    let mut schedule = Schedule::new();
    let model_ids = add_submodels(&mut schedule, store);

    for plan in store.models.values() {
        let model_id = &model_ids[&normalize_name(&plan.name)];
        for (step, building_step) in plan.steps.iter().enumerate() {
            for (index, placement) in building_step.placements.iter().enumerate() {
                let id = schedule.add(ScheduleNode::Placement {
                    model: plan.name.clone(),
                    step,
                    index,
                    target: target_name(store, placement),
                });
                schedule.graph.add_edge(model_id, &id);
            }
        }
    }

    tracing::debug!(
        nodes = schedule.graph.len(),
        edges = schedule.graph.edge_count(),
        "Built assembly graph"
    );
    schedule
}

/// Build the step-chained schedule graph, before diamond expansion
///
/// Each submodel requires its last step, each step requires the step before
/// it and all of its placements, and each placement of a submodel requires
/// that submodel's node. Shared submodels are still shared.
pub fn build_step_graph(store: &ModelStore) -> Schedule {
    let mut schedule = Schedule::new();
    let model_ids = add_submodels(&mut schedule, store);

    for plan in store.models.values() {
        let name = &plan.name;
        let mut previous: Option<NodeId> = None;
        for (step, building_step) in plan.steps.iter().enumerate() {
            let step_id = schedule.add(ScheduleNode::Step {
                model: name.clone(),
                index: step,
            });
            if let Some(prev) = &previous {
                schedule.graph.add_edge(&step_id, prev);
            }

            for (index, placement) in building_step.placements.iter().enumerate() {
                let id = schedule.add(ScheduleNode::Placement {
                    model: name.clone(),
                    step,
                    index,
                    target: target_name(store, placement),
                });
                schedule.graph.add_edge(&step_id, &id);
                match model_ids.get(&normalize_name(&placement.name)) {
                    Some(target) => {
                        schedule.graph.add_edge(&id, target);
                    }
                    None if NameKind::of(&placement.name) == Some(NameKind::Model) => {
                        tracing::warn!(
                            model = %name,
                            target = %placement.name,
                            "Placement of an undefined submodel"
                        );
                    }
                    None => {}
                }
            }
            previous = Some(step_id);
        }
        if let Some(last) = &previous {
            schedule.graph.add_edge(&model_ids[&normalize_name(name)], last);
        }
    }
    schedule
}

/// Build the normalized schedule of every submodel in `store`
///
/// # Errors
///
/// [`Error::SubmodelCycle`](crate::Error::SubmodelCycle) when submodels
/// place each other cyclically.
///
/// # Example
///
/// ```
/// use ldraw_plan::{build_schedule, parse};
///
/// # fn main() -> ldraw_plan::Result<()> {
/// let store = parse(
///     "0 FILE car.ldr\n\
///      1 16 -20 0 0 1 0 0 0 1 0 0 0 1 wheel.ldr\n\
///      1 16 20 0 0 1 0 0 0 1 0 0 0 1 wheel.ldr\n\
///      0 FILE wheel.ldr\n\
///      1 0 0 0 0 1 0 0 0 1 0 0 0 1 tyre.dat\n",
/// )?;
/// let schedule = build_schedule(&store)?;
/// assert!(schedule.graph.is_tree());
/// assert_eq!(schedule.copies_of("wheel.ldr").count(), 3);
/// # Ok(())
/// # }
/// ```
pub fn build_schedule(store: &ModelStore) -> Result<Schedule> {
    let mut schedule = build_step_graph(store);
    normalize(&mut schedule)?;
    tracing::debug!(
        nodes = schedule.graph.len(),
        roots = schedule.graph.roots().count(),
        "Built schedule"
    );
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const CAR: &str = "\
0 FILE car.ldr
1 16 0 0 0 1 0 0 0 1 0 0 0 1 chassis.dat
0 STEP
1 16 -20 0 0 1 0 0 0 1 0 0 0 1 wheel.ldr
1 16 20 0 0 1 0 0 0 1 0 0 0 1 wheel.ldr
0 FILE wheel.ldr
1 0 0 0 0 1 0 0 0 1 0 0 0 1 tyre.dat
";

    #[test]
    fn test_assembly_graph_edges_from_submodels() {
        let store = parse(CAR).unwrap();
        let schedule = build_assembly_graph(&store);
        assert_eq!(schedule.graph.out_degree("car.ldr"), 3);
        assert_eq!(schedule.graph.out_degree("wheel.ldr"), 1);
        assert_eq!(schedule.graph.len(), 2 + 4);
        assert!(schedule.graph.contains("car.ldr#1:wheel.ldr~1"));
    }

    #[test]
    fn test_step_graph_chains_steps() {
        let store = parse(CAR).unwrap();
        let schedule = build_step_graph(&store);
        let graph = &schedule.graph;

        assert_eq!(graph.children("car.ldr").collect::<Vec<_>>(), vec!["car.ldr#1"]);
        assert_eq!(
            graph.children("car.ldr#1").collect::<Vec<_>>(),
            vec!["car.ldr#0", "car.ldr#1:wheel.ldr", "car.ldr#1:wheel.ldr~1"]
        );
        assert_eq!(graph.children("car.ldr#0").collect::<Vec<_>>(), vec!["car.ldr#0:chassis.dat"]);
        // Shared before normalization
        assert_eq!(graph.in_degree("wheel.ldr"), 2);
    }

    #[test]
    fn test_build_schedule_is_tree() {
        let store = parse(CAR).unwrap();
        let schedule = build_schedule(&store).unwrap();
        assert!(schedule.graph.is_tree());
        assert_eq!(schedule.graph.in_degree("wheel.ldr"), 0);
    }

    #[test]
    fn test_placement_links_submodel_ignoring_case() {
        let source = "0 FILE main.ldr\n\
                      1 16 0 0 0 1 0 0 0 1 0 0 0 1 Sub.LDR\n\
                      0 FILE sub.ldr\n\
                      1 16 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat\n";
        let store = parse(source).unwrap();
        let schedule = build_step_graph(&store);
        assert_eq!(
            schedule.graph.children("main.ldr#0:sub.ldr").collect::<Vec<_>>(),
            vec!["sub.ldr"]
        );

        let schedule = build_schedule(&store).unwrap();
        let copy = schedule
            .graph
            .children("main.ldr#0:sub.ldr")
            .next()
            .unwrap()
            .to_string();
        assert_eq!(schedule.canonical_name(&copy), Some("sub.ldr"));
        assert_eq!(schedule.graph.out_degree(&copy), 1);
    }
}
