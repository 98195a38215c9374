use std::collections::{BTreeMap, BTreeSet};

use crate::graph::CommunityGraph;

/// Vertices around `vertex`, layer by layer.
/// `layers[i]` holds the vertices first reached at BFS level `i + 1`;
/// level 1 is the direct neighborhood. Edge weights are ignored.
/// Layers stop at the last level that reached a new vertex, so the result can
/// be shorter than `depth`.
pub fn neighbor_layers<G: CommunityGraph>(
    graph: &G,
    vertex: &G::Vertex,
    depth: usize,
) -> Vec<Vec<G::Vertex>> {
    let successors: BTreeMap<G::Vertex, Vec<G::Vertex>> =
        graph.bfs_successors(vertex, depth).into_iter().collect();

    let mut layers = Vec::new();
    let mut parents = vec![vertex.clone()];
    for _ in 0..depth {
        let layer: Vec<G::Vertex> = parents
            .iter()
            .filter_map(|parent| successors.get(parent))
            .flatten()
            .cloned()
            .collect();
        if layer.is_empty() {
            break;
        }
        layers.push(layer.clone());
        parents = layer;
    }
    layers
}

/// Every vertex within `depth` hops of `vertex`, the vertex itself excluded.
pub fn within_depth<G: CommunityGraph>(
    graph: &G,
    vertex: &G::Vertex,
    depth: usize,
) -> BTreeSet<G::Vertex> {
    neighbor_layers(graph, vertex, depth)
        .into_iter()
        .flatten()
        .collect()
}
