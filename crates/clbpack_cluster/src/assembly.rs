//! Turning per-block assignments into per-cluster contents.

use crate::error::PackError;
use clbpack_common::BlockId;
use clbpack_netlist::{ClusterAssignment, Netlist};
use serde::Serialize;

/// The blocks of each cluster, in block order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssembly {
    /// Slots per cluster.
    pub cluster_size: usize,
    /// Blocks of each cluster.
    pub contents: Vec<Vec<BlockId>>,
    /// Number of blocks in each cluster.
    pub occupancy: Vec<usize>,
}

impl ClusterAssembly {
    /// Number of clusters.
    pub fn num_clusters(&self) -> usize {
        self.contents.len()
    }

    /// Blocks of cluster `index`.
    pub fn blocks(&self, index: usize) -> &[BlockId] {
        &self.contents[index]
    }
}

/// Groups the netlist's logic blocks by cluster.
///
/// Every logic block must name one of the `num_clusters` clusters, no cluster
/// may exceed `cluster_size` blocks, and pads must stay unpacked.
pub fn assemble(
    netlist: &Netlist,
    num_clusters: usize,
    cluster_size: usize,
) -> Result<ClusterAssembly, PackError> {
    let mut contents: Vec<Vec<BlockId>> = vec![Vec::with_capacity(cluster_size); num_clusters];
    let mut occupancy = vec![0; num_clusters];

    for id in netlist.block_ids() {
        let block = netlist.block(id);
        let assignment = netlist.cluster_of(id);
        if !block.kind.is_clusterable() {
            if assignment != ClusterAssignment::Never {
                return Err(PackError::PadInCluster {
                    block: block.name.clone(),
                });
            }
            continue;
        }
        let Some(cluster) = assignment.cluster() else {
            return Err(PackError::Unassigned {
                block: block.name.clone(),
            });
        };
        let c = cluster.index();
        if c >= num_clusters {
            return Err(PackError::ClusterOutOfRange {
                block: block.name.clone(),
                cluster: c,
                num_clusters,
            });
        }
        occupancy[c] += 1;
        if occupancy[c] > cluster_size {
            return Err(PackError::OverCapacity {
                cluster: c,
                capacity: cluster_size,
            });
        }
        contents[c].push(id);
    }

    Ok(ClusterAssembly {
        cluster_size,
        contents,
        occupancy,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{build, id};
    use clbpack_common::ClusterId;

    const PAIR: &str = r#"{"blocks": [
        {"name": "a", "kind": "inpad", "output": "a"},
        {"name": "g", "kind": "lut", "output": "x", "inputs": ["a"]},
        {"name": "h", "kind": "lut", "output": "y", "inputs": ["x"]},
        {"name": "o", "kind": "outpad", "inputs": ["y"]}
    ]}"#;

    fn cluster(i: u32) -> ClusterAssignment {
        ClusterAssignment::Cluster(ClusterId::from_raw(i))
    }

    #[test]
    fn groups_blocks_by_cluster() {
        let mut nl = build(PAIR, 4);
        nl.set_cluster(id(&nl, "g"), cluster(1));
        nl.set_cluster(id(&nl, "h"), cluster(0));
        let assembly = assemble(&nl, 2, 1).unwrap();
        assert_eq!(assembly.num_clusters(), 2);
        assert_eq!(assembly.blocks(0), &[id(&nl, "h")]);
        assert_eq!(assembly.blocks(1), &[id(&nl, "g")]);
        assert_eq!(assembly.occupancy, vec![1, 1]);
    }

    #[test]
    fn unassigned_block() {
        let mut nl = build(PAIR, 4);
        nl.set_cluster(id(&nl, "g"), cluster(0));
        let err = assemble(&nl, 1, 2).unwrap_err();
        assert!(matches!(err, PackError::Unassigned { ref block } if block == "h"));
    }

    #[test]
    fn cluster_out_of_range() {
        let mut nl = build(PAIR, 4);
        nl.set_cluster(id(&nl, "g"), cluster(0));
        nl.set_cluster(id(&nl, "h"), cluster(3));
        let err = assemble(&nl, 1, 2).unwrap_err();
        assert!(matches!(err, PackError::ClusterOutOfRange { cluster: 3, .. }));
    }

    #[test]
    fn over_capacity() {
        let mut nl = build(PAIR, 4);
        nl.set_cluster(id(&nl, "g"), cluster(0));
        nl.set_cluster(id(&nl, "h"), cluster(0));
        let err = assemble(&nl, 1, 1).unwrap_err();
        assert!(matches!(err, PackError::OverCapacity { cluster: 0, capacity: 1 }));
    }

    #[test]
    fn pad_in_cluster() {
        let mut nl = build(PAIR, 4);
        nl.set_cluster(id(&nl, "g"), cluster(0));
        nl.set_cluster(id(&nl, "h"), cluster(0));
        nl.set_cluster(id(&nl, "a"), cluster(0));
        let err = assemble(&nl, 1, 4).unwrap_err();
        assert!(matches!(err, PackError::PadInCluster { ref block } if block == "a"));
    }
}
