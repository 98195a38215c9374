use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::fmt::{Display, Formatter};

use anyhow::{ensure, Result};

use crate::types::{VInt, VertexId, Weight};

/// What the community engine needs to know about a graph.
/// Vertex enumeration must be deterministic so a fixed random sequence
/// always reproduces the same partition.
pub trait CommunityGraph {
    type Vertex: VertexId;

    /// All vertices, in a stable order.
    fn vertices(&self) -> Vec<Self::Vertex>;

    fn vertex_count(&self) -> usize;

    /// Number of incident edges. Unknown vertices have degree 0.
    fn degree(&self, vertex: &Self::Vertex) -> usize;

    /// Neighbors of a vertex together with the connecting edge weight.
    fn weighted_neighbors(&self, vertex: &Self::Vertex) -> Vec<(Self::Vertex, Weight)>;

    /// Connected components as vertex groups.
    fn connected_components(&self) -> Vec<Vec<Self::Vertex>>;

    /// Restrict the graph to the given vertices and the edges between them.
    fn induced_subgraph(&self, vertices: &[Self::Vertex]) -> Self
    where
        Self: Sized;

    /// An empty graph is not considered connected.
    fn is_connected(&self) -> bool {
        self.vertex_count() > 0 && self.connected_components().len() == 1
    }

    /// Breadth-first successors of `source`, at most `depth_limit` levels deep.
    /// Each entry is a parent together with the children first discovered from it,
    /// parents listed level by level.
    fn bfs_successors(
        &self,
        source: &Self::Vertex,
        depth_limit: usize,
    ) -> Vec<(Self::Vertex, Vec<Self::Vertex>)> {
        let mut visited = BTreeSet::new();
        visited.insert(source.clone());
        let mut frontier = vec![source.clone()];
        let mut successors = Vec::new();

        for _ in 0..depth_limit {
            let mut next_frontier = Vec::new();
            for parent in &frontier {
                let mut children = Vec::new();
                for (neighbor, _) in self.weighted_neighbors(parent) {
                    if visited.insert(neighbor.clone()) {
                        children.push(neighbor);
                    }
                }
                if !children.is_empty() {
                    next_frontier.extend(children.iter().cloned());
                    successors.push((parent.clone(), children));
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }
        successors
    }
}

/// In-memory undirected weighted graph backed by an ordered adjacency map.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedGraph<V: VertexId = VInt> {
    pub(crate) adj_map: BTreeMap<V, Vec<(V, Weight)>>,
    pub(crate) e_size: usize,
}

impl<V: VertexId> Default for WeightedGraph<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: VertexId> WeightedGraph<V> {
    pub fn new() -> Self {
        WeightedGraph {
            adj_map: BTreeMap::new(),
            e_size: 0,
        }
    }

    /// Build a graph from weighted edges. Fails on the first invalid edge.
    pub fn from_edges(edges_iter: impl IntoIterator<Item = (V, V, Weight)>) -> Result<Self> {
        let mut graph = Self::new();
        for (u, v, weight) in edges_iter {
            graph.add_edge(u, v, weight)?;
        }
        Ok(graph)
    }

    pub fn insert_vertex(&mut self, u: V) {
        self.adj_map.entry(u).or_default();
    }

    /// Insert an undirected edge. Adding an existing edge again overwrites its weight.
    pub fn add_edge(&mut self, u: V, v: V, weight: Weight) -> Result<()> {
        ensure!(
            weight.is_finite() && weight >= 0.0,
            "Edge ({:?}, {:?}) has invalid weight {}", u, v, weight
        );
        ensure!(u != v, "Self-loop on {:?} is not supported", u);

        if self.set_weight(&u, &v, weight) {
            self.set_weight(&v, &u, weight);
            return Ok(());
        }
        self.adj_map.entry(u.clone()).or_default().push((v.clone(), weight));
        self.adj_map.entry(v).or_default().push((u, weight));
        self.e_size += 1;
        Ok(())
    }

    // Overwrite the weight of an existing directed half-edge.
    fn set_weight(&mut self, u: &V, v: &V, weight: Weight) -> bool {
        match self.adj_map.get_mut(u) {
            Some(neighbors) => match neighbors.iter_mut().find(|(n, _)| n == v) {
                Some(entry) => {
                    entry.1 = weight;
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    pub fn edge_weight(&self, u: &V, v: &V) -> Option<Weight> {
        self.adj_map
            .get(u)?
            .iter()
            .find(|(n, _)| n == v)
            .map(|(_, weight)| *weight)
    }

    pub fn has_edge(&self, u: &V, v: &V) -> bool {
        self.edge_weight(u, v).is_some()
    }

    pub fn contains_vertex(&self, u: &V) -> bool {
        self.adj_map.contains_key(u)
    }

    pub fn edge_count(&self) -> usize {
        self.e_size
    }

    // Using bfs to walk through a connected component.
    fn bfs_component(&self, start_vertex: &V, visited: &mut BTreeSet<V>, result: &mut Vec<V>) {
        let mut queue = VecDeque::new();
        queue.push_back(start_vertex.clone());
        visited.insert(start_vertex.clone());

        while let Some(v) = queue.pop_front() {
            if let Some(neighbors) = self.adj_map.get(&v) {
                for (neighbor, _) in neighbors {
                    if visited.insert(neighbor.clone()) {
                        queue.push_back(neighbor.clone());
                    }
                }
            }
            result.push(v);
        }
    }
}

impl<V: VertexId> CommunityGraph for WeightedGraph<V> {
    type Vertex = V;

    fn vertices(&self) -> Vec<V> {
        self.adj_map.keys().cloned().collect()
    }

    fn vertex_count(&self) -> usize {
        self.adj_map.len()
    }

    fn degree(&self, vertex: &V) -> usize {
        self.adj_map.get(vertex).map_or(0, |neighbors| neighbors.len())
    }

    fn weighted_neighbors(&self, vertex: &V) -> Vec<(V, Weight)> {
        self.adj_map.get(vertex).cloned().unwrap_or_default()
    }

    fn connected_components(&self) -> Vec<Vec<V>> {
        let mut visited = BTreeSet::new();
        let mut components = vec![];
        for vertex in self.adj_map.keys() {
            if !visited.contains(vertex) {
                let mut component = Vec::new();
                self.bfs_component(vertex, &mut visited, &mut component);
                components.push(component);
            }
        }
        components
    }

    fn induced_subgraph(&self, vertices: &[V]) -> Self {
        let keep: BTreeSet<&V> = vertices
            .iter()
            .filter(|v| self.adj_map.contains_key(*v))
            .collect();
        let mut adj_map = BTreeMap::new();
        let mut half_edges = 0usize;
        for vertex in &keep {
            let neighbors: Vec<(V, Weight)> = self.adj_map[*vertex]
                .iter()
                .filter(|(n, _)| keep.contains(n))
                .cloned()
                .collect();
            half_edges += neighbors.len();
            adj_map.insert((*vertex).clone(), neighbors);
        }
        WeightedGraph {
            adj_map,
            e_size: half_edges / 2,
        }
    }
}

impl<V: VertexId> Display for WeightedGraph<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Weighted Graph ({} vertices, {} edges):", self.adj_map.len(), self.e_size)?;
        for (vertex, neighbors) in &self.adj_map {
            write!(f, "{:?} ->", vertex)?;
            for (neighbor, weight) in neighbors {
                write!(f, " {:?}({})", neighbor, weight)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
