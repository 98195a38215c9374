// Community table: per-community member count and flooding density.
use std::collections::BTreeMap;

use crate::config::MAX_DENSITY;
use crate::types::CommID;

/// Bookkeeping of a single community.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommMeta {
    pub size: usize,
    pub density: f64,
}

impl CommMeta {
    fn with_size(size: usize) -> CommMeta {
        CommMeta {
            size,
            density: MAX_DENSITY / size as f64,
        }
    }
}

/// Size and density tables of the live communities, kept in lock-step so that
/// `density == MAX_DENSITY / size` holds for every entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommTable {
    comm_map: BTreeMap<CommID, CommMeta>,
    next_id: CommID,
}

impl CommTable {
    pub fn new() -> CommTable {
        Default::default()
    }

    /// Allocate a fresh community holding a single vertex.
    pub fn allocate_comm(&mut self) -> CommID {
        let comm_id = self.next_id;
        self.next_id += 1;
        self.comm_map.insert(comm_id, CommMeta::with_size(1));
        comm_id
    }

    /// Density of a community, `None` when it is not in the table.
    pub fn density(&self, comm_id: CommID) -> Option<f64> {
        self.comm_map.get(&comm_id).map(|meta| meta.density)
    }

    pub fn size(&self, comm_id: CommID) -> Option<usize> {
        self.comm_map.get(&comm_id).map(|meta| meta.size)
    }

    pub fn contains(&self, comm_id: CommID) -> bool {
        self.comm_map.contains_key(&comm_id)
    }

    pub fn len(&self) -> usize {
        self.comm_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comm_map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CommID, &CommMeta)> {
        self.comm_map.iter()
    }

    /// A vertex joined the community.
    pub fn seed(&mut self, comm_id: CommID) {
        let meta = self.comm_map.entry(comm_id).or_insert(CommMeta {
            size: 0,
            density: MAX_DENSITY,
        });
        *meta = CommMeta::with_size(meta.size + 1);
    }

    /// Refresh the density of a community a vertex is leaving, without
    /// touching its size.
    pub fn refresh(&mut self, comm_id: CommID) {
        if let Some(meta) = self.comm_map.get_mut(&comm_id) {
            *meta = CommMeta::with_size(meta.size);
        }
    }

    /// A vertex left the community. An emptied community is removed.
    pub fn remove(&mut self, comm_id: CommID) {
        if let Some(meta) = self.comm_map.get(&comm_id).copied() {
            if meta.size <= 1 {
                self.comm_map.remove(&comm_id);
            } else {
                self.comm_map.insert(comm_id, CommMeta::with_size(meta.size - 1));
            }
        }
    }

    /// Whether every entry satisfies `density == MAX_DENSITY / size`.
    pub fn check_invariant(&self) -> bool {
        self.comm_map.values().all(|meta| {
            meta.size > 0 && (meta.density - MAX_DENSITY / meta.size as f64).abs() < f64::EPSILON
        })
    }
}
