//! Entry points: run the seeding and propagation pipeline over a whole graph,
//! one connected component at a time.

use anyhow::Result;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::aggregate::collect_groups;
use crate::config::{FluidConfig, TRIVIAL_COMPONENT_SIZE};
use crate::fluid::propagate;
use crate::graph::CommunityGraph;
use crate::seed::select_core_seeds;
use crate::types::CommStructure;

/// How a single connected component was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentReport {
    pub vertex_count: usize,
    /// Number of core vertices that seeded a community.
    pub core_count: usize,
    /// Propagation rounds executed, 0 for trivial components.
    pub rounds: usize,
    pub converged: bool,
    /// The component was small enough to be emitted as a single group.
    pub trivial: bool,
}

impl ComponentReport {
    fn trivial(vertex_count: usize) -> Self {
        ComponentReport {
            vertex_count,
            core_count: 0,
            rounds: 0,
            converged: true,
            trivial: true,
        }
    }
}

/// Groups of a partitioning call together with the per-component reports.
#[derive(Debug, Clone, PartialEq)]
pub struct FluidPartition<V> {
    pub groups: CommStructure<V>,
    pub reports: Vec<ComponentReport>,
}

impl<V> FluidPartition<V> {
    fn empty() -> Self {
        FluidPartition {
            groups: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Whether every component converged before hitting the round ceiling.
    pub fn converged(&self) -> bool {
        self.reports.iter().all(|report| report.converged)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

// Seeding, propagation and aggregation on a single connected graph.
fn run_component<G, R>(
    graph: &G,
    config: &FluidConfig,
    rng: &mut R,
) -> (CommStructure<G::Vertex>, ComponentReport)
where
    G: CommunityGraph,
    R: Rng + ?Sized,
{
    let seeds = select_core_seeds(graph, config.alpha, config.seed_depth, rng);
    let core_count = seeds.cores.len();
    let outcome = propagate(
        graph,
        seeds,
        config.weight_update,
        config.max_rounds,
        config.decrement_order,
        rng,
    );
    let groups = collect_groups(graph, &outcome.assignment, config.unassigned_policy);
    debug!(
        "Component of {} vertices: {} cores, {} groups after {} rounds",
        graph.vertex_count(), core_count, groups.len(), outcome.rounds
    );
    let report = ComponentReport {
        vertex_count: graph.vertex_count(),
        core_count,
        rounds: outcome.rounds,
        converged: outcome.converged,
        trivial: false,
    };
    (groups, report)
}

/// Partition a graph the caller knows to be connected.
/// No component split happens, so a disconnected input is flooded as a whole
/// and components without a core stay unassigned.
pub fn partition_connected<G, R>(
    graph: &G,
    config: &FluidConfig,
    rng: &mut R,
) -> Result<CommStructure<G::Vertex>>
where
    G: CommunityGraph,
    R: Rng + ?Sized,
{
    config.validate()?;
    Ok(run_component(graph, config, rng).0)
}

/// Partition any graph, returning the groups and one report per component.
///
/// A connected graph is processed as a whole. Otherwise every connected
/// component with at most [`TRIVIAL_COMPONENT_SIZE`] vertices is emitted as a
/// single group, and larger ones are partitioned independently on their
/// induced subgraph.
pub fn partition_with_report<G, R>(
    graph: &G,
    config: &FluidConfig,
    rng: &mut R,
) -> Result<FluidPartition<G::Vertex>>
where
    G: CommunityGraph,
    R: Rng + ?Sized,
{
    config.validate()?;
    let mut result = FluidPartition::empty();
    if graph.vertex_count() == 0 {
        return Ok(result);
    }

    if graph.is_connected() {
        let (groups, report) = run_component(graph, config, rng);
        result.groups = groups;
        result.reports.push(report);
    } else {
        for component in graph.connected_components() {
            if component.len() <= TRIVIAL_COMPONENT_SIZE {
                result.reports.push(ComponentReport::trivial(component.len()));
                result.groups.push(component);
            } else {
                let subgraph = graph.induced_subgraph(&component);
                let (groups, report) = run_component(&subgraph, config, rng);
                result.groups.extend(groups);
                result.reports.push(report);
            }
        }
    }

    info!(
        "Partitioned {} vertices into {} groups over {} components",
        graph.vertex_count(), result.groups.len(), result.reports.len()
    );
    Ok(result)
}

/// Partition any graph into vertex groups. See [`partition_with_report`].
pub fn partition<G, R>(
    graph: &G,
    config: &FluidConfig,
    rng: &mut R,
) -> Result<CommStructure<G::Vertex>>
where
    G: CommunityGraph,
    R: Rng + ?Sized,
{
    Ok(partition_with_report(graph, config, rng)?.groups)
}

enum ComponentTask<V> {
    Trivial(Vec<V>),
    Propagate(Vec<V>, u64),
}

/// Like [`partition_with_report`], with components processed in parallel.
///
/// Each non-trivial component gets its own random generator, seeded from a
/// master generator in component order, so the result only depends on `seed`.
pub fn partition_parallel<G>(
    graph: &G,
    config: &FluidConfig,
    seed: u64,
) -> Result<FluidPartition<G::Vertex>>
where
    G: CommunityGraph + Sync,
    G::Vertex: Send + Sync,
{
    config.validate()?;
    let mut master_rng = StdRng::seed_from_u64(seed);
    if graph.vertex_count() == 0 {
        return Ok(FluidPartition::empty());
    }

    if graph.is_connected() {
        let mut rng = StdRng::seed_from_u64(master_rng.gen());
        let (groups, report) = run_component(graph, config, &mut rng);
        return Ok(FluidPartition {
            groups,
            reports: vec![report],
        });
    }

    let tasks: Vec<ComponentTask<G::Vertex>> = graph
        .connected_components()
        .into_iter()
        .map(|component| {
            if component.len() <= TRIVIAL_COMPONENT_SIZE {
                ComponentTask::Trivial(component)
            } else {
                ComponentTask::Propagate(component, master_rng.gen())
            }
        })
        .collect();

    let results: Vec<(CommStructure<G::Vertex>, ComponentReport)> = tasks
        .into_par_iter()
        .map(|task| match task {
            ComponentTask::Trivial(component) => {
                let report = ComponentReport::trivial(component.len());
                (vec![component], report)
            }
            ComponentTask::Propagate(component, component_seed) => {
                let subgraph = graph.induced_subgraph(&component);
                let mut rng = StdRng::seed_from_u64(component_seed);
                run_component(&subgraph, config, &mut rng)
            }
        })
        .collect();

    let mut result = FluidPartition::empty();
    for (groups, report) in results {
        result.groups.extend(groups);
        result.reports.push(report);
    }
    info!(
        "Partitioned {} vertices into {} groups over {} components in parallel",
        graph.vertex_count(), result.groups.len(), result.reports.len()
    );
    Ok(result)
}
