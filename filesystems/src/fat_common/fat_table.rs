// In-memory FAT cache and next-cluster lookup for FAT12/FAT16

use super::boot_sector::{FatKind, VolumeGeometry};
use super::constants::*;
use byteorder::{ByteOrder, LittleEndian};
use log::{trace, warn};
use rootfat_core::{BlockDevice, FatError, SECTOR_SIZE};

/// True for every value the walker reports as the end of a chain.
///
/// Raw end markers span a range, so this tests membership rather than
/// equality with `END_OF_CHAIN`.
pub fn is_end_of_chain(value: u16) -> bool {
    value >= FAT16_EOC_MIN
}

/// The first sectors of the first FAT copy, held in memory
#[derive(Debug, Clone)]
pub struct FatCache {
    kind: FatKind,
    data: Vec<u8>,
    sectors_per_fat: u32,
    chain_limit: usize,
}

impl FatCache {
    /// A cache whose chains may be as long as the cached table allows.
    pub fn new(kind: FatKind, data: Vec<u8>, sectors_per_fat: u32) -> Self {
        let mut cache = Self {
            kind,
            data,
            sectors_per_fat,
            chain_limit: 0,
        };
        cache.chain_limit = cache.entry_capacity().saturating_sub(FIRST_DATA_CLUSTER as usize);
        cache
    }

    /// Bound chain walks by the number of data clusters on the volume.
    ///
    /// A zero count (a boot sector without a total sector count) keeps the
    /// bound derived from the cache size.
    pub fn with_cluster_count(mut self, cluster_count: u32) -> Self {
        if cluster_count > 0 {
            self.chain_limit = cluster_count as usize;
        }
        self
    }

    /// Read min(sectors_per_fat, capacity_sectors) sectors starting at the FAT region.
    pub fn load<D: BlockDevice>(
        device: &mut D,
        geometry: &VolumeGeometry,
        capacity_sectors: usize,
    ) -> Result<Self, FatError> {
        let sectors = (geometry.sectors_per_fat as usize).min(capacity_sectors);
        let mut data = vec![0u8; sectors * SECTOR_SIZE];

        if sectors > 0 {
            device.read_sectors(geometry.fat_region_start, &mut data, sectors as u32)?;
        }

        let cache = Self::new(geometry.kind, data, geometry.sectors_per_fat)
            .with_cluster_count(geometry.cluster_count);
        if cache.is_truncated() {
            warn!(
                "FAT has {} sectors but only {} are cached; clusters above {} are unreachable",
                geometry.sectors_per_fat,
                sectors,
                cache.entry_capacity().saturating_sub(1)
            );
        }
        Ok(cache)
    }

    pub fn kind(&self) -> FatKind {
        self.kind
    }

    pub fn cached_sectors(&self) -> usize {
        self.data.len() / SECTOR_SIZE
    }

    /// Whether part of the on-disk FAT was left out of the cache
    pub fn is_truncated(&self) -> bool {
        (self.sectors_per_fat as usize) > self.cached_sectors()
    }

    /// Number of complete FAT entries held in the cache
    pub fn entry_capacity(&self) -> usize {
        match self.kind {
            FatKind::Fat12 => self.data.len() * 2 / 3,
            FatKind::Fat16 => self.data.len() / 2,
        }
    }

    /// Longest chain a well-formed volume can hold. Walking more clusters
    /// than this means the chain loops.
    pub fn chain_limit(&self) -> usize {
        self.chain_limit
    }

    /// Raw table value for `cluster`, with no end-of-chain mapping.
    pub fn raw_entry(&self, cluster: u16) -> Result<u16, FatError> {
        match self.kind {
            FatKind::Fat16 => {
                let offset = cluster as usize * 2;
                let bytes = self
                    .data
                    .get(offset..offset + 2)
                    .ok_or(FatError::OutOfRange(cluster))?;
                Ok(LittleEndian::read_u16(bytes))
            }
            FatKind::Fat12 => {
                // 12-bit entries are packed two per three bytes
                let offset = cluster as usize + cluster as usize / 2;
                let bytes = self
                    .data
                    .get(offset..offset + 2)
                    .ok_or(FatError::OutOfRange(cluster))?;
                let value = if cluster & 1 == 1 {
                    (bytes[0] as u16 >> 4) | ((bytes[1] as u16) << 4)
                } else {
                    bytes[0] as u16 | ((bytes[1] as u16 & 0x0F) << 8)
                };
                Ok(value)
            }
        }
    }

    /// Next cluster in the chain, or `END_OF_CHAIN` when `cluster` is the last one.
    pub fn next_cluster(&self, cluster: u16) -> Result<u16, FatError> {
        let raw = self.raw_entry(cluster)?;
        let next = if raw >= self.kind.end_of_chain_min() {
            END_OF_CHAIN
        } else {
            raw
        };
        trace!("FAT[{}] = {:#x} -> {:#x}", cluster, raw, next);
        Ok(next)
    }
}
