//! Weighted fluid communities.
//!
//! High-degree core vertices each seed a community, then communities compete to
//! flood the rest of an undirected weighted graph. A community's strength is its
//! density, which falls as it grows, and an edge only carries influence in a round
//! with a probability given by its weight. The number of communities is not fixed
//! up front: it is the number of cores that survive seeding.
//!
//! ```
//! use fluid_community::{partition, FluidConfig, WeightedGraph};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let graph = WeightedGraph::from_edges(vec![(0u32, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0)]).unwrap();
//! let mut rng = StdRng::seed_from_u64(42);
//! let groups = partition(&graph, &FluidConfig::new(0.5), &mut rng).unwrap();
//! assert_eq!(groups.iter().map(|g| g.len()).sum::<usize>(), 3);
//! ```

pub mod aggregate;
pub mod comm_table;
pub mod config;
pub mod fluid;
pub mod graph;
pub mod logger;
pub mod neighbor;
pub mod partition;
pub mod seed;
pub mod types;

pub use crate::aggregate::{collect_groups, invert_assignment};
pub use crate::comm_table::CommTable;
pub use crate::config::{DecrementOrder, FluidConfig, UnassignedPolicy};
pub use crate::fluid::{propagate, FluidEngine, PropagationOutcome};
pub use crate::graph::{CommunityGraph, WeightedGraph};
pub use crate::neighbor::{neighbor_layers, within_depth};
pub use crate::partition::{
    partition, partition_connected, partition_parallel, partition_with_report, ComponentReport,
    FluidPartition,
};
pub use crate::seed::{select_core_seeds, SeedState};
pub use crate::types::{Assignment, CommID, CommStructure, VInt, VertexId, Weight};
