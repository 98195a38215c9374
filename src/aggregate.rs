use std::collections::BTreeMap;

use itertools::Itertools;

use crate::config::UnassignedPolicy;
use crate::graph::CommunityGraph;
use crate::types::{Assignment, CommID, CommStructure, VertexId};

/// Turn the vertex -> community map into one vertex group per community.
/// Groups come out ordered by community label, members in vertex order.
pub fn invert_assignment<V: VertexId>(assignment: &Assignment<V>) -> CommStructure<V> {
    assignment
        .iter()
        .fold(BTreeMap::<CommID, Vec<V>>::new(), |mut acc, (vertex, comm_id)| {
            acc.entry(*comm_id).or_default().push(vertex.clone());
            acc
        })
        .into_values()
        .collect()
}

/// Vertices of `graph` that no community reached.
pub fn unassigned_vertices<G: CommunityGraph>(
    graph: &G,
    assignment: &Assignment<G::Vertex>,
) -> Vec<G::Vertex> {
    graph
        .vertices()
        .into_iter()
        .filter(|v| !assignment.contains_key(v))
        .sorted()
        .collect()
}

/// Final groups of a propagation run, unassigned vertices handled per `policy`.
pub fn collect_groups<G: CommunityGraph>(
    graph: &G,
    assignment: &Assignment<G::Vertex>,
    policy: UnassignedPolicy,
) -> CommStructure<G::Vertex> {
    let mut groups = invert_assignment(assignment);
    if policy == UnassignedPolicy::Singleton {
        groups.extend(
            unassigned_vertices(graph, assignment)
                .into_iter()
                .map(|v| vec![v]),
        );
    }
    groups
}

#[cfg(test)]
mod test_aggregate {
    use crate::aggregate::{collect_groups, invert_assignment, unassigned_vertices};
    use crate::config::UnassignedPolicy;
    use crate::graph::WeightedGraph;
    use crate::types::Assignment;

    #[test]
    fn test_invert() {
        let assignment: Assignment<u32> = [(4, 1), (1, 0), (2, 1), (3, 0), (9, 5)].into_iter().collect();
        let groups = invert_assignment(&assignment);
        assert_eq!(groups, vec![vec![1, 3], vec![2, 4], vec![9]]);
    }

    #[test]
    fn test_invert_empty() {
        let assignment = Assignment::<&str>::new();
        assert!(invert_assignment(&assignment).is_empty());
    }

    #[test]
    fn test_unassigned_policy() {
        let g = WeightedGraph::from_edges(vec![(0u32, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0)]).unwrap();
        let assignment: Assignment<u32> = [(1, 0), (2, 0)].into_iter().collect();
        assert_eq!(unassigned_vertices(&g, &assignment), vec![0, 3]);

        let kept = collect_groups(&g, &assignment, UnassignedPolicy::Singleton);
        assert_eq!(kept, vec![vec![1, 2], vec![0], vec![3]]);

        let dropped = collect_groups(&g, &assignment, UnassignedPolicy::Drop);
        assert_eq!(dropped, vec![vec![1, 2]]);
    }
}
