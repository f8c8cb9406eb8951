//! Unclustered blocks bucketed by external input count.

use clbpack_common::BlockId;

/// What to do with clustered entries met during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// Drop them from the bucket.
    Remove,
    /// Keep them; a later rollback may free the block again.
    Leave,
}

/// Buckets `0..=K` of clusterable blocks keyed by external input count.
///
/// Entries are never added after construction. Clustered blocks linger until
/// a [`RemovalPolicy::Remove`] scan passes over them.
#[derive(Debug, Clone)]
pub struct FreeLists {
    buckets: Vec<Vec<BlockId>>,
}

impl FreeLists {
    /// Builds the buckets from `(block, ext_inputs)` pairs. Counts above
    /// `lut_size` are clamped into the last bucket.
    pub fn new(lut_size: usize, blocks: impl IntoIterator<Item = (BlockId, usize)>) -> Self {
        let mut buckets = vec![Vec::new(); lut_size + 1];
        for (block, ext) in blocks {
            buckets[ext.min(lut_size)].push(block);
        }
        Self { buckets }
    }

    /// Largest bucket index.
    pub fn max_ext_inputs(&self) -> usize {
        self.buckets.len() - 1
    }

    /// Entries in one bucket, stale ones included.
    pub fn bucket(&self, ext_inputs: usize) -> &[BlockId] {
        &self.buckets[ext_inputs]
    }

    /// Returns the first entry of bucket `ext_inputs` that is unclustered and
    /// accepted by `feasible`.
    ///
    /// Under [`RemovalPolicy::Remove`], clustered entries passed over are
    /// swap-removed, so bucket order is not stable.
    pub fn find(
        &mut self,
        ext_inputs: usize,
        policy: RemovalPolicy,
        is_unclustered: impl Fn(BlockId) -> bool,
        feasible: impl Fn(BlockId) -> bool,
    ) -> Option<BlockId> {
        let bucket = &mut self.buckets[ext_inputs];
        let mut i = 0;
        while i < bucket.len() {
            let block = bucket[i];
            if !is_unclustered(block) {
                if policy == RemovalPolicy::Remove {
                    bucket.swap_remove(i);
                    continue;
                }
            } else if feasible(block) {
                return Some(block);
            }
            i += 1;
        }
        None
    }
}
