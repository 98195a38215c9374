use std::collections::BTreeSet;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::comm_table::CommTable;
use crate::graph::CommunityGraph;
use crate::neighbor::within_depth;
use crate::types::Assignment;

/// Initial state of a propagation run: the core vertices, each holding its own community.
#[derive(Debug, Clone)]
pub struct SeedState<V> {
    pub assignment: Assignment<V>,
    pub comm_table: CommTable,
    /// Core vertices in selection order; the i-th one seeds community i.
    pub cores: Vec<V>,
}

impl<V> SeedState<V> {
    /// A state with no communities at all.
    pub fn empty() -> Self {
        SeedState {
            assignment: Assignment::new(),
            comm_table: CommTable::new(),
            cores: Vec::new(),
        }
    }
}

/// Pick the core vertices of `graph`.
///
/// Vertices are visited in random order. A vertex whose degree is strictly above
/// `alpha * max_degree` becomes a core unless it lies within `seed_depth` hops of
/// an earlier core. Every core starts its own community of size 1.
pub fn select_core_seeds<G, R>(
    graph: &G,
    alpha: f64,
    seed_depth: usize,
    rng: &mut R,
) -> SeedState<G::Vertex>
where
    G: CommunityGraph,
    R: Rng + ?Sized,
{
    let mut vertices = graph.vertices();
    vertices.shuffle(rng);

    let max_degree = vertices.iter().map(|v| graph.degree(v)).max().unwrap_or(0);
    let degree_thres = max_degree as f64 * alpha;

    let mut state = SeedState::empty();
    let mut suppressed = BTreeSet::new();
    for vertex in vertices {
        if suppressed.contains(&vertex) {
            continue;
        }
        if graph.degree(&vertex) as f64 > degree_thres {
            let comm_id = state.comm_table.allocate_comm();
            debug!("Vertex {:?} seeds community {}", vertex, comm_id);
            suppressed.extend(within_depth(graph, &vertex, seed_depth));
            state.assignment.insert(vertex.clone(), comm_id);
            state.cores.push(vertex);
        }
    }
    debug!(
        "Selected {} core vertices (max degree {}, threshold {})",
        state.cores.len(), max_degree, degree_thres
    );
    state
}
