// Test helpers: raw on-disk structures and synthetic FAT12/FAT16 images

use crate::fat_common::ShortName;
use rootfat_core::{MemoryBlockDevice, SECTOR_SIZE};

/// A 512-byte boot sector with the given BPB fields and a valid signature
pub fn boot_sector_bytes(
    fs_type: &[u8; 8],
    sectors_per_cluster: u8,
    reserved_sectors: u16,
    num_fats: u8,
    sectors_per_fat: u16,
    root_entries: u16,
    total_sectors: u32,
) -> Vec<u8> {
    let mut bs = vec![0u8; SECTOR_SIZE];
    bs[0..3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
    bs[0x03..0x0B].copy_from_slice(b"ROOTFAT ");
    bs[0x0B..0x0D].copy_from_slice(&512u16.to_le_bytes());
    bs[0x0D] = sectors_per_cluster;
    bs[0x0E..0x10].copy_from_slice(&reserved_sectors.to_le_bytes());
    bs[0x10] = num_fats;
    bs[0x11..0x13].copy_from_slice(&root_entries.to_le_bytes());
    if total_sectors <= 0xFFFF {
        bs[0x13..0x15].copy_from_slice(&(total_sectors as u16).to_le_bytes());
    } else {
        bs[0x20..0x24].copy_from_slice(&total_sectors.to_le_bytes());
    }
    bs[0x15] = 0xF8;
    bs[0x16..0x18].copy_from_slice(&sectors_per_fat.to_le_bytes());
    bs[0x26] = 0x29;
    bs[0x27..0x2B].copy_from_slice(&0x1234_5678u32.to_le_bytes());
    bs[0x2B..0x36].copy_from_slice(b"TESTVOLUME ");
    bs[0x36..0x3E].copy_from_slice(fs_type);
    bs[0x1FE] = 0x55;
    bs[0x1FF] = 0xAA;
    bs
}

/// One 32-byte directory slot
pub fn dir_entry_bytes(
    name: &[u8; 8],
    extension: &[u8; 3],
    attributes: u8,
    start_cluster: u16,
    file_size: u32,
) -> [u8; 32] {
    let mut slot = [0u8; 32];
    slot[0..8].copy_from_slice(name);
    slot[8..11].copy_from_slice(extension);
    slot[11] = attributes;
    slot[26..28].copy_from_slice(&start_cluster.to_le_bytes());
    slot[28..32].copy_from_slice(&file_size.to_le_bytes());
    slot
}

/// Pack 12-bit entries two per three bytes
pub fn pack_fat12(entries: &[u16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(entries.len() * 3 / 2 + 2);
    for pair in entries.chunks(2) {
        let a = pair[0] & 0x0FFF;
        let b = pair.get(1).copied().unwrap_or(0) & 0x0FFF;
        out.push((a & 0xFF) as u8);
        out.push(((a >> 8) as u8) | (((b & 0x0F) as u8) << 4));
        out.push((b >> 4) as u8);
    }
    out
}

pub fn pack_fat16(entries: &[u16]) -> Vec<u8> {
    entries.iter().flat_map(|e| e.to_le_bytes()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFatKind {
    Fat12,
    Fat16,
}

/// Builds a complete in-memory volume behind an optional partition offset
pub struct ImageBuilder {
    kind: TestFatKind,
    fs_type: [u8; 8],
    partition_start: u32,
    sectors_per_cluster: u8,
    reserved_sectors: u16,
    num_fats: u8,
    sectors_per_fat: u16,
    root_entries: u16,
    fat: Vec<u16>,
    root: Vec<[u8; 32]>,
    clusters: Vec<(u16, Vec<u8>)>,
}

impl ImageBuilder {
    pub fn fat16() -> Self {
        Self {
            kind: TestFatKind::Fat16,
            fs_type: *b"FAT16   ",
            partition_start: 2048,
            sectors_per_cluster: 1,
            reserved_sectors: 1,
            num_fats: 2,
            sectors_per_fat: 4,
            root_entries: 64,
            fat: vec![0xFFF8, 0xFFFF],
            root: Vec::new(),
            clusters: Vec::new(),
        }
    }

    pub fn fat12() -> Self {
        Self {
            kind: TestFatKind::Fat12,
            fs_type: *b"FAT12   ",
            partition_start: 2048,
            sectors_per_cluster: 2,
            reserved_sectors: 1,
            num_fats: 2,
            sectors_per_fat: 1,
            root_entries: 32,
            fat: vec![0xFF8, 0xFFF],
            root: Vec::new(),
            clusters: Vec::new(),
        }
    }

    pub fn fs_type(mut self, tag: &[u8; 8]) -> Self {
        self.fs_type = *tag;
        self
    }

    pub fn partition_start(mut self, sector: u32) -> Self {
        self.partition_start = sector;
        self
    }

    pub fn sectors_per_cluster(mut self, count: u8) -> Self {
        self.sectors_per_cluster = count;
        self
    }

    pub fn sectors_per_fat(mut self, count: u16) -> Self {
        self.sectors_per_fat = count;
        self
    }

    pub fn root_entries(mut self, count: u16) -> Self {
        self.root_entries = count;
        self
    }

    pub fn cluster_size(&self) -> usize {
        self.sectors_per_cluster as usize * SECTOR_SIZE
    }

    fn end_of_chain(&self) -> u16 {
        match self.kind {
            TestFatKind::Fat12 => 0xFFF,
            TestFatKind::Fat16 => 0xFFFF,
        }
    }

    pub fn fat_entry(mut self, cluster: u16, value: u16) -> Self {
        let index = cluster as usize;
        if self.fat.len() <= index {
            self.fat.resize(index + 1, 0);
        }
        self.fat[index] = value;
        self
    }

    /// Append a raw directory slot
    pub fn root_slot(mut self, slot: [u8; 32]) -> Self {
        self.root.push(slot);
        self
    }

    /// Store `data` in the given clusters, link them in order and add a root entry.
    pub fn file_in_chain(mut self, name: &str, data: &[u8], chain: &[u16]) -> Self {
        let short = ShortName::from_query(name);
        let first = chain.first().copied().unwrap_or(0);
        self.root.push(dir_entry_bytes(&short.name, &short.extension, 0x20, first, data.len() as u32));

        let cluster_size = self.cluster_size();
        for (i, &cluster) in chain.iter().enumerate() {
            let next = chain.get(i + 1).copied().unwrap_or_else(|| self.end_of_chain());
            self = self.fat_entry(cluster, next);

            let begin = (i * cluster_size).min(data.len());
            let end = ((i + 1) * cluster_size).min(data.len());
            self.clusters.push((cluster, data[begin..end].to_vec()));
        }
        self
    }

    /// Store `data` in consecutive clusters starting at `first_cluster`.
    pub fn file(self, name: &str, data: &[u8], first_cluster: u16) -> Self {
        let count = data.len().div_ceil(self.cluster_size()).max(1);
        let chain: Vec<u16> = (first_cluster..first_cluster + count as u16).collect();
        self.file_in_chain(name, data, &chain)
    }

    fn root_dir_sectors(&self) -> u32 {
        (self.root_entries as u32 * 32).div_ceil(SECTOR_SIZE as u32)
    }

    fn data_region_offset(&self) -> u32 {
        self.reserved_sectors as u32
            + self.num_fats as u32 * self.sectors_per_fat as u32
            + self.root_dir_sectors()
    }

    pub fn build(&self) -> Vec<u8> {
        let spc = self.sectors_per_cluster as u32;
        let highest_cluster = self.clusters.iter().map(|(c, _)| *c as u32).max().unwrap_or(2).max(2);
        let volume_sectors = self.data_region_offset() + (highest_cluster - 1) * spc + 1;

        let total_sectors = (self.partition_start + volume_sectors) as usize;
        let mut image = vec![0u8; total_sectors * SECTOR_SIZE];
        let sector_at = |s: u32| (self.partition_start + s) as usize * SECTOR_SIZE;

        let boot = boot_sector_bytes(
            &self.fs_type,
            self.sectors_per_cluster,
            self.reserved_sectors,
            self.num_fats,
            self.sectors_per_fat,
            self.root_entries,
            volume_sectors,
        );
        image[sector_at(0)..sector_at(0) + SECTOR_SIZE].copy_from_slice(&boot);

        let fat_bytes = match self.kind {
            TestFatKind::Fat12 => pack_fat12(&self.fat),
            TestFatKind::Fat16 => pack_fat16(&self.fat),
        };
        let fat_len = self.sectors_per_fat as usize * SECTOR_SIZE;
        assert!(fat_bytes.len() <= fat_len, "FAT entries do not fit in sectors_per_fat");
        for copy in 0..self.num_fats as u32 {
            let start = sector_at(self.reserved_sectors as u32 + copy * self.sectors_per_fat as u32);
            image[start..start + fat_bytes.len()].copy_from_slice(&fat_bytes);
        }

        assert!(self.root.len() <= self.root_entries as usize, "too many root entries");
        let root_start =
            sector_at(self.reserved_sectors as u32 + self.num_fats as u32 * self.sectors_per_fat as u32);
        for (i, slot) in self.root.iter().enumerate() {
            let offset = root_start + i * 32;
            image[offset..offset + 32].copy_from_slice(slot);
        }

        let data_start = sector_at(self.data_region_offset());
        for (cluster, bytes) in &self.clusters {
            let offset = data_start + (*cluster as usize - 2) * self.cluster_size();
            image[offset..offset + bytes.len()].copy_from_slice(bytes);
        }

        image
    }

    pub fn device(&self) -> MemoryBlockDevice {
        MemoryBlockDevice::new(self.build())
    }
}

/// `len` bytes of recognizable, non-repeating-per-cluster content
pub fn sample_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
