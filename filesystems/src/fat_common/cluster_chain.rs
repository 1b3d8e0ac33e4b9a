// FAT Cluster Chain walking
// Follows next-cluster links through the cached FAT

use super::constants::FIRST_DATA_CLUSTER;
use super::fat_table::{is_end_of_chain, FatCache};
use rootfat_core::FatError;

/// Iterator over the clusters of one chain.
///
/// Stops at an end-of-chain marker or at a link below cluster 2. A chain
/// that visits more clusters than the volume holds must loop back on
/// itself and is reported as `CorruptChain`.
pub struct ClusterChain<'a> {
    fat: &'a FatCache,
    start: u16,
    next: Option<u16>,
    visited: usize,
    limit: usize,
}

impl<'a> ClusterChain<'a> {
    pub fn new(fat: &'a FatCache, start_cluster: u16) -> Self {
        Self {
            fat,
            start: start_cluster,
            next: Some(start_cluster),
            visited: 0,
            limit: fat.chain_limit(),
        }
    }
}

impl Iterator for ClusterChain<'_> {
    type Item = Result<u16, FatError>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if current < FIRST_DATA_CLUSTER || is_end_of_chain(current) {
            return None;
        }

        self.visited += 1;
        if self.visited > self.limit {
            self.next = None;
            return Some(Err(chain_too_long(self.start, self.limit)));
        }

        match self.fat.next_cluster(current) {
            Ok(next) => {
                self.next = Some(next);
                Some(Ok(current))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Error for a walk from `start` that went past `limit` clusters
pub(crate) fn chain_too_long(start: u16, limit: usize) -> FatError {
    FatError::CorruptChain(format!(
        "chain starting at cluster {} exceeds {} clusters",
        start, limit
    ))
}

/// Read a complete cluster chain
pub fn read_cluster_chain(
    fat: &FatCache,
    start_cluster: u16,
    max_clusters: Option<usize>,
) -> Result<Vec<u16>, FatError> {
    let max = max_clusters.unwrap_or(usize::MAX);
    ClusterChain::new(fat, start_cluster).take(max).collect()
}

/// Count clusters in a chain
pub fn count_clusters(fat: &FatCache, start_cluster: u16) -> Result<usize, FatError> {
    let mut count = 0;
    for cluster in ClusterChain::new(fat, start_cluster) {
        cluster?;
        count += 1;
    }
    Ok(count)
}
