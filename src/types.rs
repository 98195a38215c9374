use std::collections::BTreeMap;
use std::fmt::Debug;

/// Default vertex id type, matching the integer ids used by most graph inputs.
pub type VInt = u32;

/// Community label. Labels are handed out as 0, 1, 2, ... during seeding.
pub type CommID = u32;

/// Edge weight, expected to be a non-negative finite value.
pub type Weight = f64;

/// Anything that can identify a vertex.
/// Ordering is only needed to keep enumeration deterministic.
pub trait VertexId: Clone + Ord + Debug {}

impl<T: Clone + Ord + Debug> VertexId for T {}

/// Vertex -> community mapping. Unassigned vertices are simply absent.
pub type Assignment<V> = BTreeMap<V, CommID>;

/// The final output: disjoint vertex groups.
pub type CommStructure<V> = Vec<Vec<V>>;
