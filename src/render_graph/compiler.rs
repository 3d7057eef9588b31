//! Render graph compilation
//!
//! Builds the producer -> resource -> consumer edge list once, rejects
//! configuration errors, and sorts passes with Kahn's algorithm. Passes that
//! become ready at the same time run in ascending `(priority, registration
//! index)` order, which makes the result stable.

use crate::render_graph::error::{GraphError, GraphResult};
use crate::render_graph::pass::PassNode;
use crate::render_graph::resource::*;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Producer and consumers of one resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceEdges {
    pub producer: Option<usize>,
    pub consumers: Vec<usize>,
}

/// Output of [`compile`]
#[derive(Debug, Clone, Default)]
pub struct CompiledGraph {
    /// Node indices in execution order
    pub pass_order: Vec<usize>,
    pub edges: HashMap<ResourceId, ResourceEdges>,
    pub resource_lifetimes: HashMap<ResourceId, ResourceLifetime>,
}

impl CompiledGraph {
    pub fn producer_of(&self, resource: ResourceId) -> Option<usize> {
        self.edges.get(&resource).and_then(|e| e.producer)
    }

    pub fn consumers_of(&self, resource: ResourceId) -> &[usize] {
        self.edges
            .get(&resource)
            .map(|e| e.consumers.as_slice())
            .unwrap_or(&[])
    }

    pub fn lifetime(&self, resource: ResourceId) -> Option<ResourceLifetime> {
        self.resource_lifetimes.get(&resource).copied()
    }

    /// Position of node `index` in the execution order
    pub fn position_of(&self, index: usize) -> Option<usize> {
        self.pass_order.iter().position(|&i| i == index)
    }

    /// Resources written by some pass
    pub fn produced_resources(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.edges
            .iter()
            .filter(|(_, e)| e.producer.is_some())
            .map(|(&id, _)| id)
    }
}

/// Compile registered passes into an execution order
pub fn compile(nodes: &[PassNode], registry: &ResourceRegistry) -> GraphResult<CompiledGraph> {
    let resource_name = |id: ResourceId| registry.name(id).unwrap_or("<unnamed>").to_string();

    // Bipartite edge list
    let mut edges: HashMap<ResourceId, ResourceEdges> = HashMap::new();
    for (index, node) in nodes.iter().enumerate() {
        for output in &node.outputs {
            let entry = edges.entry(output.resource).or_default();
            match entry.producer {
                Some(first) if first != index => {
                    return Err(GraphError::MultipleProducers {
                        resource: resource_name(output.resource),
                        first: nodes[first].id().to_string(),
                        second: node.id().to_string(),
                    });
                }
                _ => entry.producer = Some(index),
            }
        }
    }
    for (index, node) in nodes.iter().enumerate() {
        for input in &node.inputs {
            let entry = edges.entry(input.resource).or_default();
            if !entry.consumers.contains(&index) {
                entry.consumers.push(index);
            }
        }
    }

    // Pass -> pass dependencies
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degree: Vec<usize> = vec![0; nodes.len()];
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut add_edge = |from: usize, to: usize| {
        if seen.insert((from, to)) {
            successors[from].push(to);
            in_degree[to] += 1;
        }
    };

    for resource_edges in edges.values() {
        let Some(producer) = resource_edges.producer else {
            continue;
        };
        for &consumer in &resource_edges.consumers {
            if consumer == producer {
                return Err(GraphError::CyclicDependency {
                    passes: vec![nodes[producer].id().to_string()],
                });
            }
            add_edge(producer, consumer);
        }
    }

    for (index, node) in nodes.iter().enumerate() {
        for referenced in &node.descriptor.run_after {
            let Some(before) = nodes.iter().position(|n| n.id() == referenced) else {
                return Err(GraphError::UnknownPassReference {
                    pass: node.id().to_string(),
                    referenced: referenced.clone(),
                });
            };
            if before == index {
                return Err(GraphError::CyclicDependency {
                    passes: vec![node.id().to_string()],
                });
            }
            add_edge(before, index);
        }
    }

    // Kahn's algorithm with a (priority, index) min-heap
    let mut ready: BinaryHeap<Reverse<(i32, usize)>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(index, _)| Reverse((nodes[index].descriptor.priority, index)))
        .collect();

    let mut pass_order = Vec::with_capacity(nodes.len());
    while let Some(Reverse((_, index))) = ready.pop() {
        pass_order.push(index);
        for &next in &successors[index] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse((nodes[next].descriptor.priority, next)));
            }
        }
    }

    if pass_order.len() < nodes.len() {
        let passes = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &degree)| degree > 0)
            .map(|(index, _)| nodes[index].id().to_string())
            .collect();
        return Err(GraphError::CyclicDependency { passes });
    }

    // Resource lifetimes
    let mut resource_lifetimes: HashMap<ResourceId, ResourceLifetime> = HashMap::new();
    for (order, &index) in pass_order.iter().enumerate() {
        let node = &nodes[index];
        let used = node
            .inputs
            .iter()
            .map(|i| i.resource)
            .chain(node.outputs.iter().map(|o| o.resource));
        for resource in used {
            let lifetime = resource_lifetimes.entry(resource).or_insert(ResourceLifetime {
                first_use: order,
                last_use: order,
            });
            lifetime.last_use = order;
        }
    }

    for (&resource, resource_edges) in &edges {
        if resource_edges.producer.is_none() {
            log::debug!(
                "Resource '{}' has no producer; it must be imported",
                resource_name(resource)
            );
        }
    }

    Ok(CompiledGraph {
        pass_order,
        edges,
        resource_lifetimes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_graph::pass::{InputDecl, PassDescriptor};

    fn nodes(descs: Vec<PassDescriptor>) -> (Vec<PassNode>, ResourceRegistry) {
        let mut registry = ResourceRegistry::new();
        let nodes = descs
            .into_iter()
            .map(|d| PassNode::new(d, &mut registry))
            .collect();
        (nodes, registry)
    }

    fn order_ids(nodes: &[PassNode], compiled: &CompiledGraph) -> Vec<String> {
        compiled
            .pass_order
            .iter()
            .map(|&i| nodes[i].id().to_string())
            .collect()
    }

    #[test]
    fn test_producers_before_consumers() {
        let (nodes, registry) = nodes(vec![
            PassDescriptor::new("composite").input("ao").input("depth"),
            PassDescriptor::new("ao").input("depth").output("ao"),
            PassDescriptor::new("depth").output("depth"),
        ]);
        let compiled = compile(&nodes, &registry).unwrap();
        assert_eq!(order_ids(&nodes, &compiled), vec!["depth", "ao", "composite"]);
    }

    #[test]
    fn test_priority_breaks_ties() {
        let (nodes, registry) = nodes(vec![
            PassDescriptor::new("overlay").priority(10000),
            PassDescriptor::new("b").output("b"),
            PassDescriptor::new("a").output("a").priority(-1),
            PassDescriptor::new("final").input("a").input("b"),
        ]);
        let compiled = compile(&nodes, &registry).unwrap();
        assert_eq!(order_ids(&nodes, &compiled), vec!["a", "b", "final", "overlay"]);
    }

    #[test]
    fn test_equal_priority_keeps_registration_order() {
        let (nodes, registry) = nodes(vec![
            PassDescriptor::new("x"),
            PassDescriptor::new("y"),
            PassDescriptor::new("z"),
        ]);
        let compiled = compile(&nodes, &registry).unwrap();
        assert_eq!(order_ids(&nodes, &compiled), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let (nodes, registry) = nodes(vec![
            PassDescriptor::new("a").input("b").output("a"),
            PassDescriptor::new("b").input("a").output("b"),
            PassDescriptor::new("c").output("c"),
        ]);
        match compile(&nodes, &registry) {
            Err(GraphError::CyclicDependency { passes }) => {
                assert_eq!(passes, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_read_is_cycle() {
        let (nodes, registry) = nodes(vec![PassDescriptor::new("feedback")
            .input("history")
            .output("history")]);
        assert!(matches!(
            compile(&nodes, &registry),
            Err(GraphError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_multiple_producers_rejected() {
        let (nodes, registry) = nodes(vec![
            PassDescriptor::new("first").output("color"),
            PassDescriptor::new("second").output("color").enabled(false),
        ]);
        assert_eq!(
            compile(&nodes, &registry).unwrap_err(),
            GraphError::MultipleProducers {
                resource: "color".into(),
                first: "first".into(),
                second: "second".into(),
            }
        );
    }

    #[test]
    fn test_run_after_adds_edge() {
        let (nodes, registry) = nodes(vec![
            PassDescriptor::new("late").run_after("early"),
            PassDescriptor::new("early").priority(5),
        ]);
        let compiled = compile(&nodes, &registry).unwrap();
        assert_eq!(order_ids(&nodes, &compiled), vec!["early", "late"]);
    }

    #[test]
    fn test_unknown_run_after_rejected() {
        let (nodes, registry) = nodes(vec![PassDescriptor::new("late").run_after("missing")]);
        assert_eq!(
            compile(&nodes, &registry).unwrap_err(),
            GraphError::UnknownPassReference {
                pass: "late".into(),
                referenced: "missing".into(),
            }
        );
    }

    #[test]
    fn test_edges_and_lifetimes() {
        let (nodes, registry) = nodes(vec![
            PassDescriptor::new("depth").output("depth"),
            PassDescriptor::new("ao").input("depth").output("ao"),
            PassDescriptor::new("composite")
                .input("ao")
                .input(InputDecl::new("depth").optional()),
        ]);
        let compiled = compile(&nodes, &registry).unwrap();
        let depth = registry.get("depth").unwrap();
        assert_eq!(compiled.producer_of(depth), Some(0));
        assert_eq!(compiled.consumers_of(depth), &[1, 2]);
        assert_eq!(
            compiled.lifetime(depth),
            Some(ResourceLifetime {
                first_use: 0,
                last_use: 2
            })
        );
        assert_eq!(compiled.position_of(2), Some(2));
    }

    #[test]
    fn test_unproduced_input_compiles() {
        let (nodes, registry) = nodes(vec![PassDescriptor::new("composite").input("imported")]);
        let compiled = compile(&nodes, &registry).unwrap();
        assert_eq!(compiled.pass_order, vec![0]);
    }
}
