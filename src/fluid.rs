//! Density-weighted fluid propagation.
//!
//! Every community floods the graph with a strength (density) inversely
//! proportional to its size. In each round every vertex looks at a random sample
//! of its neighbors, where an edge of weight `w` is kept with probability of
//! roughly `w`, and adopts the community scoring best among the sampled ones.
//! Vertices are updated one after another, so a change is seen by every vertex
//! visited later in the same round.

use std::collections::BTreeMap;

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::comm_table::CommTable;
use crate::config::{DecrementOrder, TIE_TOLERANCE};
use crate::graph::CommunityGraph;
use crate::seed::SeedState;
use crate::types::{Assignment, CommID, Weight};

/// Result of one propagation run.
#[derive(Debug, Clone)]
pub struct PropagationOutcome<V> {
    pub assignment: Assignment<V>,
    pub comm_table: CommTable,
    /// Number of rounds executed, the converged round included.
    pub rounds: usize,
    /// False when the round ceiling was hit while labels were still changing.
    pub converged: bool,
}

/// Chance, in percent, that an edge transmits influence in a round.
/// The weight is rounded to two decimals first, halves to even.
pub fn inclusion_percent(weight: Weight) -> f64 {
    (weight * 100.0).round_ties_even() / 100.0 * 100.0
}

/// Propagation state of one connected graph.
pub struct FluidEngine<'a, G: CommunityGraph> {
    graph: &'a G,
    assignment: Assignment<G::Vertex>,
    comm_table: CommTable,
    weight_update: f64,
    decrement: DecrementOrder,
}

impl<'a, G: CommunityGraph> FluidEngine<'a, G> {
    pub fn new(
        graph: &'a G,
        seeds: SeedState<G::Vertex>,
        weight_update: f64,
        decrement: DecrementOrder,
    ) -> Self {
        FluidEngine {
            graph,
            assignment: seeds.assignment,
            comm_table: seeds.comm_table,
            weight_update,
            decrement,
        }
    }

    pub fn assignment(&self) -> &Assignment<G::Vertex> {
        &self.assignment
    }

    pub fn comm_table(&self) -> &CommTable {
        &self.comm_table
    }

    /// Community of a vertex, `None` while no community has reached it.
    pub fn community_of(&self, vertex: &G::Vertex) -> Option<CommID> {
        self.assignment.get(vertex).copied()
    }

    /// One sweep over all vertices in random order.
    /// Returns whether any vertex changed its community.
    pub fn run_round<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let mut vertices = self.graph.vertices();
        vertices.shuffle(rng);

        let mut changed = false;
        for vertex in &vertices {
            if self.update_vertex(vertex, rng) {
                changed = true;
            }
        }
        changed
    }

    /// Run rounds until one changes nothing, or until `max_rounds` rounds ran.
    /// Returns the number of rounds executed and whether the run converged.
    pub fn run<R: Rng + ?Sized>(&mut self, max_rounds: usize, rng: &mut R) -> (usize, bool) {
        let mut rounds = 0usize;
        while rounds < max_rounds {
            rounds += 1;
            if !self.run_round(rng) {
                debug!(
                    "Converged after {} rounds with {} communities",
                    rounds, self.comm_table.len()
                );
                return (rounds, true);
            }
        }
        warn!(
            "Exiting by max rounds: no convergence after {} rounds, returning the current partition",
            max_rounds
        );
        (rounds, false)
    }

    pub fn into_outcome(self, rounds: usize, converged: bool) -> PropagationOutcome<G::Vertex> {
        PropagationOutcome {
            assignment: self.assignment,
            comm_table: self.comm_table,
            rounds,
            converged,
        }
    }

    // Updating rule of a single vertex. Returns true if its community changed.
    fn update_vertex<R: Rng + ?Sized>(&mut self, vertex: &G::Vertex, rng: &mut R) -> bool {
        let mut comm_scores = BTreeMap::<CommID, f64>::new();
        let mut weight_bonus = BTreeMap::<CommID, f64>::new();

        // Take the vertex's own community into account.
        let current = self.community_of(vertex);
        if let Some(comm_id) = current {
            if let Some(density) = self.comm_table.density(comm_id) {
                comm_scores.insert(comm_id, density);
            }
        }

        // Sample the neighbors.
        for (neighbor, weight) in self.graph.weighted_neighbors(vertex) {
            let percent = inclusion_percent(weight);
            let draw: u32 = rng.gen_range(1..=100);
            if f64::from(draw) >= percent {
                continue;
            }
            let Some(neighbor_comm) = self.community_of(&neighbor) else {
                continue;
            };
            let Some(density) = self.comm_table.density(neighbor_comm) else {
                continue;
            };
            *comm_scores.entry(neighbor_comm).or_insert(0.0) += density;
            *weight_bonus.entry(neighbor_comm).or_insert(0.0) += weight * self.weight_update;
        }

        if comm_scores.is_empty() {
            return false;
        }
        for (comm_id, bonus) in weight_bonus {
            *comm_scores.entry(comm_id).or_insert(0.0) += bonus;
        }

        let max_score = comm_scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
        let best_comms: Vec<CommID> = comm_scores
            .iter()
            .filter(|(_, &score)| max_score - score < TIE_TOLERANCE)
            .map(|(&comm_id, _)| comm_id)
            .collect();

        // The current community is kept whenever it is among the best.
        if let Some(comm_id) = current {
            if best_comms.contains(&comm_id) {
                return false;
            }
        }

        let Some(&new_comm) = best_comms.choose(rng) else {
            return false;
        };
        if let Some(old_comm) = current {
            match self.decrement {
                DecrementOrder::Reference => self.comm_table.refresh(old_comm),
                DecrementOrder::Corrected => self.comm_table.remove(old_comm),
            }
        }
        self.assignment.insert(vertex.clone(), new_comm);
        self.comm_table.seed(new_comm);
        true
    }
}

/// Flood `graph` from the given seeds until convergence or `max_rounds` rounds.
pub fn propagate<G, R>(
    graph: &G,
    seeds: SeedState<G::Vertex>,
    weight_update: f64,
    max_rounds: usize,
    decrement: DecrementOrder,
    rng: &mut R,
) -> PropagationOutcome<G::Vertex>
where
    G: CommunityGraph,
    R: Rng + ?Sized,
{
    let mut engine = FluidEngine::new(graph, seeds, weight_update, decrement);
    let (rounds, converged) = engine.run(max_rounds, rng);
    engine.into_outcome(rounds, converged)
}

#[cfg(test)]
mod test_fluid {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::comm_table::CommTable;
    use crate::config::DecrementOrder;
    use crate::fluid::{inclusion_percent, propagate, FluidEngine};
    use crate::graph::test_graph::two_cliques;
    use crate::graph::{CommunityGraph, WeightedGraph};
    use crate::seed::{select_core_seeds, SeedState};
    use crate::types::{Assignment, VInt};

    fn star(weight: f64) -> WeightedGraph {
        WeightedGraph::from_edges((1..8).map(|leaf| (0u32, leaf, weight))).unwrap()
    }

    /// Vertex 0 between vertex 1 (community 0) and vertex 2 (community 1).
    /// Weights above 1 are sampled in every round.
    /// With `shared`, vertex 0 also belongs to community 1, which then has the
    /// same total density as community 0.
    fn fork(heavy: f64, light: f64, shared: bool) -> (WeightedGraph, SeedState<VInt>) {
        let g = WeightedGraph::from_edges(vec![(0u32, 1, heavy), (0, 2, light)]).unwrap();
        let mut comm_table = CommTable::new();
        let left = comm_table.allocate_comm();
        let right = comm_table.allocate_comm();
        let mut assignment: Assignment<VInt> = [(1, left), (2, right)].into_iter().collect();
        if shared {
            assignment.insert(0, right);
            comm_table.seed(right);
        }
        let seeds = SeedState {
            assignment,
            comm_table,
            cores: vec![1, 2],
        };
        (g, seeds)
    }

    #[test]
    fn test_inclusion_percent() {
        assert_eq!(inclusion_percent(1.0), 100.0);
        assert_eq!(inclusion_percent(0.0), 0.0);
        assert_eq!(inclusion_percent(0.004), 0.0);
        assert_eq!(inclusion_percent(0.5), 50.0);
        assert!((inclusion_percent(0.257) - 26.0).abs() < 1e-9);
        assert!(inclusion_percent(2.5) >= 250.0);
    }

    #[test]
    fn test_inclusion_percent_rounds_halves_to_even() {
        for (weight, percent) in [(0.125, 12.0), (0.375, 38.0), (0.625, 62.0), (0.875, 88.0)] {
            assert!((inclusion_percent(weight) - percent).abs() < 1e-9, "weight {}", weight);
        }
    }

    #[test]
    fn test_weight_bonus_breaks_density_ties() {
        // Both communities contribute density 1.0, the bonus favors the heavy edge.
        for seed in 0..20 {
            let (g, seeds) = fork(3.0, 2.0, true);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut engine = FluidEngine::new(&g, seeds, 1.0, DecrementOrder::Reference);
            assert!(engine.update_vertex(&0, &mut rng));
            assert_eq!(engine.community_of(&0), Some(0));
            assert_eq!(engine.comm_table().size(0), Some(2));
        }
    }

    #[test]
    fn test_no_bonus_without_weight_update() {
        // Without the bonus the scores tie, and vertex 0 keeps its community.
        for seed in 0..20 {
            let (g, seeds) = fork(3.0, 2.0, true);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut engine = FluidEngine::new(&g, seeds, 0.0, DecrementOrder::Reference);
            assert!(!engine.update_vertex(&0, &mut rng));
            assert_eq!(engine.community_of(&0), Some(1));
        }
    }

    #[test]
    fn test_near_equal_scores_are_tied() {
        // Scores 4.00001 and 4.0 differ by less than the tolerance.
        for seed in 0..20 {
            let (g, seeds) = fork(3.00001, 3.0, true);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut engine = FluidEngine::new(&g, seeds, 1.0, DecrementOrder::Reference);
            assert!(!engine.update_vertex(&0, &mut rng));
            assert_eq!(engine.community_of(&0), Some(1));
        }

        // An unassigned vertex picks either tied community at random.
        let mut picked = [0usize; 2];
        for seed in 0..50 {
            let (g, seeds) = fork(2.00001, 2.0, false);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut engine = FluidEngine::new(&g, seeds, 1.0, DecrementOrder::Reference);
            assert!(engine.update_vertex(&0, &mut rng));
            let comm_id = engine.community_of(&0).unwrap();
            picked[comm_id as usize] += 1;
        }
        assert!(picked[0] > 0 && picked[1] > 0);

        // A gap above the tolerance always goes to the stronger community.
        for seed in 0..20 {
            let (g, seeds) = fork(2.001, 2.0, false);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut engine = FluidEngine::new(&g, seeds, 1.0, DecrementOrder::Reference);
            assert!(engine.update_vertex(&0, &mut rng));
            assert_eq!(engine.community_of(&0), Some(0));
        }
    }

    #[test]
    fn test_star_is_flooded_by_its_center() {
        let g = star(1.0);
        let mut rng = StdRng::seed_from_u64(5);
        let seeds = select_core_seeds(&g, 0.5, 1, &mut rng);
        let outcome = propagate(&g, seeds, 1.0, 100, DecrementOrder::Reference, &mut rng);
        assert!(outcome.converged);
        assert_eq!(outcome.assignment.len(), 8);
        assert!(outcome.assignment.values().all(|&c| c == 0));
        assert_eq!(outcome.comm_table.size(0), Some(8));
        assert_eq!(outcome.comm_table.density(0), Some(1.0 / 8.0));
    }

    #[test]
    fn test_light_edges_never_transmit() {
        // Weight 0.01 gives a 1% chance, and a draw in [1, 100] is never below 1.
        let g = star(0.01);
        let mut rng = StdRng::seed_from_u64(5);
        let seeds = select_core_seeds(&g, 0.5, 1, &mut rng);
        let outcome = propagate(&g, seeds, 1.0, 100, DecrementOrder::Reference, &mut rng);
        assert!(outcome.converged);
        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.assignment.len(), 1);
        assert_eq!(outcome.assignment.get(&0), Some(&0));
    }

    #[test]
    fn test_no_seeds_converges_immediately() {
        let g = WeightedGraph::from_edges((0..6u32).map(|v| (v, (v + 1) % 6, 1.0))).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let outcome = propagate(&g, SeedState::empty(), 1.0, 100, DecrementOrder::Reference, &mut rng);
        assert!(outcome.converged);
        assert_eq!(outcome.rounds, 1);
        assert!(outcome.assignment.is_empty());
        assert!(outcome.comm_table.is_empty());
    }

    #[test]
    fn test_round_ceiling_reports_no_convergence() {
        let g = star(1.0);
        let mut rng = StdRng::seed_from_u64(9);
        let seeds = select_core_seeds(&g, 0.5, 1, &mut rng);
        // The first round always moves at least one leaf.
        let outcome = propagate(&g, seeds, 1.0, 1, DecrementOrder::Reference, &mut rng);
        assert!(!outcome.converged);
        assert_eq!(outcome.rounds, 1);
        assert!(outcome.assignment.len() > 1);
    }

    #[test]
    fn test_density_invariant_between_rounds() {
        let g = two_cliques(1.0);
        for order in [DecrementOrder::Reference, DecrementOrder::Corrected] {
            for seed in 0..10 {
                let mut rng = StdRng::seed_from_u64(seed);
                let seeds = select_core_seeds(&g, 0.5, 1, &mut rng);
                let mut engine = FluidEngine::new(&g, seeds, 1.0, order);
                for _ in 0..30 {
                    let changed = engine.run_round(&mut rng);
                    assert!(engine.comm_table().check_invariant());
                    for comm_id in engine.assignment().values() {
                        assert!(engine.comm_table().contains(*comm_id));
                    }
                    if !changed {
                        break;
                    }
                }
            }
        }
    }

    #[test]
    fn test_converged_state_is_fixed_point() {
        let g = two_cliques(0.01);
        let mut rng = StdRng::seed_from_u64(21);
        let seeds = select_core_seeds(&g, 0.5, 1, &mut rng);
        let mut engine = FluidEngine::new(&g, seeds, 1.0, DecrementOrder::Reference);

        // Converge with every vertex reached.
        let mut rounds = 0;
        while engine.run_round(&mut rng) || engine.assignment().len() < g.vertex_count() {
            rounds += 1;
            assert!(rounds < 200);
        }

        let before = engine.assignment().clone();
        for _ in 0..10 {
            assert!(!engine.run_round(&mut rng));
        }
        assert_eq!(engine.assignment(), &before);
    }

    #[test]
    fn test_decrement_orders_compared() {
        // A heavy bridge lets the two clique communities compete.
        let g = two_cliques(1.0);
        let mut converged = [0usize; 2];
        for seed in 0..30 {
            for (i, order) in [DecrementOrder::Reference, DecrementOrder::Corrected].into_iter().enumerate() {
                let mut rng = StdRng::seed_from_u64(seed);
                let seeds = select_core_seeds(&g, 0.5, 1, &mut rng);
                let outcome = propagate(&g, seeds, 1.0, 100, order, &mut rng);
                if outcome.converged {
                    converged[i] += 1;
                }
                assert!(outcome.comm_table.check_invariant());
                let total_size: usize = outcome.comm_table.iter().map(|(_, meta)| meta.size).sum();
                match order {
                    // Sizes only ever grow under the reference order.
                    DecrementOrder::Reference => assert!(total_size >= outcome.assignment.len()),
                    DecrementOrder::Corrected => assert_eq!(total_size, outcome.assignment.len()),
                }
            }
        }
        println!("Converged runs: reference {}, corrected {}", converged[0], converged[1]);
        assert!(converged[0] > 0 && converged[1] > 0);
    }
}
