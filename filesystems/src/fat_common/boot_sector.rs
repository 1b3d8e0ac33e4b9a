// Boot sector parsing and volume geometry for FAT12/FAT16

use super::constants::*;
use byteorder::{ByteOrder, LittleEndian};
use rootfat_core::FatError;
use serde::Serialize;
use std::fmt;

/// FAT width of a mounted volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FatKind {
    Fat12,
    Fat16,
}

impl FatKind {
    /// Bits per FAT entry
    pub fn fat_bits(&self) -> u8 {
        match self {
            FatKind::Fat12 => 12,
            FatKind::Fat16 => 16,
        }
    }

    /// Smallest raw FAT value that marks the end of a chain
    pub fn end_of_chain_min(&self) -> u16 {
        match self {
            FatKind::Fat12 => FAT12_EOC_MIN,
            FatKind::Fat16 => FAT16_EOC_MIN,
        }
    }
}

impl fmt::Display for FatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatKind::Fat12 => write!(f, "FAT12"),
            FatKind::Fat16 => write!(f, "FAT16"),
        }
    }
}

/// Raw fields of a FAT12/FAT16 boot sector
#[derive(Debug, Clone)]
pub struct BootSector {
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_entries: u16,
    pub total_sectors_16: u16,
    pub media_descriptor: u8,
    pub sectors_per_fat: u16,
    pub total_sectors_32: u32,
    pub volume_id: u32,
    pub volume_label: [u8; 11],
    pub fs_type: [u8; 8],
    pub signature: u16,
}

impl BootSector {
    /// Decode the first 512 bytes of `sector`. No validation happens here.
    pub fn parse(sector: &[u8]) -> Result<Self, FatError> {
        if sector.len() < STANDARD_BYTES_PER_SECTOR as usize {
            return Err(FatError::UnsupportedGeometry(format!(
                "boot sector buffer is {} bytes",
                sector.len()
            )));
        }

        let mut oem_name = [0u8; 8];
        oem_name.copy_from_slice(&sector[BS_OEM_NAME..BS_OEM_NAME + 8]);
        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&sector[BS_VOL_LAB..BS_VOL_LAB + 11]);
        let mut fs_type = [0u8; 8];
        fs_type.copy_from_slice(&sector[BS_FIL_SYS_TYPE..BS_FIL_SYS_TYPE + 8]);

        Ok(Self {
            oem_name,
            bytes_per_sector: LittleEndian::read_u16(&sector[BPB_BYTES_PER_SEC..]),
            sectors_per_cluster: sector[BPB_SEC_PER_CLUS],
            reserved_sectors: LittleEndian::read_u16(&sector[BPB_RSVD_SEC_CNT..]),
            num_fats: sector[BPB_NUM_FATS],
            root_entries: LittleEndian::read_u16(&sector[BPB_ROOT_ENT_CNT..]),
            total_sectors_16: LittleEndian::read_u16(&sector[BPB_TOT_SEC16..]),
            media_descriptor: sector[BPB_MEDIA],
            sectors_per_fat: LittleEndian::read_u16(&sector[BPB_FAT_SZ16..]),
            total_sectors_32: LittleEndian::read_u32(&sector[BPB_TOT_SEC32..]),
            volume_id: LittleEndian::read_u32(&sector[BS_VOL_ID..]),
            volume_label,
            fs_type,
            signature: LittleEndian::read_u16(&sector[BOOT_SIGNATURE_OFFSET..]),
        })
    }

    pub fn validate_signature(&self) -> Result<(), FatError> {
        if self.signature != BOOT_SIGNATURE {
            return Err(FatError::InvalidSignature(self.signature));
        }
        Ok(())
    }

    /// Match the first five bytes of the type tag. FAT16 is tried first.
    pub fn detect_kind(&self) -> Result<FatKind, FatError> {
        let tag = &self.fs_type[..FS_TYPE_TAG_LEN];
        if tag == FS_TYPE_FAT16 {
            Ok(FatKind::Fat16)
        } else if tag == FS_TYPE_FAT12 {
            Ok(FatKind::Fat12)
        } else {
            Err(FatError::UnsupportedFilesystem(format!(
                "type tag {:?}",
                String::from_utf8_lossy(&self.fs_type)
            )))
        }
    }

    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_16 != 0 {
            self.total_sectors_16 as u32
        } else {
            self.total_sectors_32
        }
    }
}

/// Layout of a mounted volume, in absolute sectors
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeGeometry {
    pub kind: FatKind,
    pub bytes_per_sector: u32,
    pub sectors_per_cluster: u32,
    pub reserved_sectors: u32,
    pub num_fats: u32,
    pub sectors_per_fat: u32,
    pub max_root_entries: u32,
    pub boot_signature: u16,
    pub total_sectors: u32,

    pub partition_start: u32,
    pub fat_region_start: u32,
    pub root_dir_start: u32,
    pub root_dir_sectors: u32,
    pub data_region_start: u32,
    pub cluster_count: u32,

    pub oem_name: String,
    pub volume_id: u32,
    pub volume_label: String,
}

fn add_sectors(a: u32, b: u32, what: &str) -> Result<u32, FatError> {
    a.checked_add(b)
        .ok_or_else(|| FatError::UnsupportedGeometry(format!("{} overflows the sector range", what)))
}

pub(crate) fn trim_padded(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(|c: char| c == ' ' || c == '\0')
        .to_string()
}

impl VolumeGeometry {
    /// Validate `bs` and derive every region offset relative to `partition_start`.
    pub fn from_boot_sector(bs: &BootSector, partition_start: u32) -> Result<Self, FatError> {
        bs.validate_signature()?;
        let kind = bs.detect_kind()?;

        if bs.bytes_per_sector != STANDARD_BYTES_PER_SECTOR {
            return Err(FatError::UnsupportedGeometry(format!(
                "{} bytes per sector (only {} is supported)",
                bs.bytes_per_sector, STANDARD_BYTES_PER_SECTOR
            )));
        }
        if bs.sectors_per_cluster == 0 {
            return Err(FatError::UnsupportedGeometry("zero sectors per cluster".to_string()));
        }
        if bs.num_fats == 0 {
            return Err(FatError::UnsupportedGeometry("no FAT copies".to_string()));
        }

        let bytes_per_sector = bs.bytes_per_sector as u32;
        let sectors_per_cluster = bs.sectors_per_cluster as u32;
        let reserved_sectors = bs.reserved_sectors as u32;
        let num_fats = bs.num_fats as u32;
        let sectors_per_fat = bs.sectors_per_fat as u32;
        let max_root_entries = bs.root_entries as u32;

        let fat_region_start = add_sectors(partition_start, reserved_sectors, "FAT region")?;
        let root_dir_start = add_sectors(fat_region_start, num_fats * sectors_per_fat, "root directory")?;
        let root_dir_sectors =
            (max_root_entries * DIR_ENTRY_SIZE as u32 + bytes_per_sector - 1) / bytes_per_sector;
        let data_region_start = add_sectors(root_dir_start, root_dir_sectors, "data region")?;

        let total_sectors = bs.total_sectors();
        let data_sectors = total_sectors.saturating_sub(data_region_start - partition_start);
        let cluster_count = data_sectors / sectors_per_cluster;

        Ok(Self {
            kind,
            bytes_per_sector,
            sectors_per_cluster,
            reserved_sectors,
            num_fats,
            sectors_per_fat,
            max_root_entries,
            boot_signature: bs.signature,
            total_sectors,
            partition_start,
            fat_region_start,
            root_dir_start,
            root_dir_sectors,
            data_region_start,
            cluster_count,
            oem_name: trim_padded(&bs.oem_name),
            volume_id: bs.volume_id,
            volume_label: trim_padded(&bs.volume_label),
        })
    }

    pub fn bytes_per_cluster(&self) -> usize {
        (self.sectors_per_cluster * self.bytes_per_sector) as usize
    }

    pub fn entries_per_sector(&self) -> usize {
        self.bytes_per_sector as usize / DIR_ENTRY_SIZE
    }

    /// First absolute sector of a data cluster.
    ///
    /// Clusters below 2 and sectors past the 32-bit range are `OutOfRange`.
    pub fn cluster_to_sector(&self, cluster: u16) -> Result<u32, FatError> {
        let index = (cluster as u32)
            .checked_sub(FIRST_DATA_CLUSTER as u32)
            .ok_or(FatError::OutOfRange(cluster))?;
        index
            .checked_mul(self.sectors_per_cluster)
            .and_then(|offset| self.data_region_start.checked_add(offset))
            .ok_or(FatError::OutOfRange(cluster))
    }
}
