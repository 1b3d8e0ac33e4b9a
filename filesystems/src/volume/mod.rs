// Mounted FAT12/FAT16 volume
//
// A `FatVolume` owns the block device, the geometry derived from the boot
// sector, the FAT cache and the open-file table. Every operation goes
// through it, so several volumes can coexist.

pub mod handles;
pub mod stream;

pub use handles::{OpenFile, OpenFileTable};
pub use stream::FileStream;

use crate::fat_common::{
    chain_too_long, classify_slot, is_end_of_chain, BootSector, ClusterChain, DirSlot,
    DirectoryEntry, EntryInfo, FatCache, ShortName, VolumeGeometry, DIR_ENTRY_SIZE,
    FIRST_DATA_CLUSTER,
};
use log::{debug, info, trace, warn};
use rootfat_core::{BlockDevice, Device, FatError, MountOptions, SECTOR_SIZE};
use serde::Serialize;
use std::ops::ControlFlow;

/// Summary of a mounted volume
#[derive(Debug, Clone, Serialize)]
pub struct VolumeInfo {
    pub device: Device,
    pub geometry: VolumeGeometry,
    pub label: Option<String>,
    pub fat_cached_sectors: usize,
    pub fat_truncated: bool,
    pub open_files: usize,
}

pub struct FatVolume<D: BlockDevice> {
    device: D,
    geometry: VolumeGeometry,
    fat: FatCache,
    files: OpenFileTable,
}

impl<D: BlockDevice> FatVolume<D> {
    /// Read the boot sector at `options.partition_start`, derive the volume
    /// layout and load the FAT cache.
    pub fn mount(mut device: D, options: &MountOptions) -> Result<Self, FatError> {
        options.validate()?;

        info!(
            "Mounting FAT volume on {} at sector {}",
            device.device().name,
            options.partition_start
        );

        let mut sector = vec![0u8; SECTOR_SIZE];
        device.read_sectors(options.partition_start, &mut sector, 1)?;
        let boot_sector = BootSector::parse(&sector)?;

        debug!("fs_type bytes: {:02x?}", boot_sector.fs_type);
        debug!("Boot signature: {:#06x}", boot_sector.signature);

        let geometry = VolumeGeometry::from_boot_sector(&boot_sector, options.partition_start)?;

        let fat = FatCache::load(&mut device, &geometry, options.fat_cache_sectors)?;
        if fat.is_truncated() && options.strict_fat_cache {
            return Err(FatError::FatCacheTruncated {
                sectors_per_fat: geometry.sectors_per_fat,
                capacity: options.fat_cache_sectors,
            });
        }

        info!("{} filesystem details:", geometry.kind);
        info!("  Bytes per sector: {}", geometry.bytes_per_sector);
        info!("  Sectors per cluster: {}", geometry.sectors_per_cluster);
        info!("  Reserved sectors: {}", geometry.reserved_sectors);
        info!("  Number of FATs: {}", geometry.num_fats);
        info!("  Sectors per FAT: {}", geometry.sectors_per_fat);
        info!("  Root directory at sector: {}", geometry.root_dir_start);
        info!("  Data region starts at sector: {}", geometry.data_region_start);

        Ok(Self {
            device,
            geometry,
            fat,
            files: OpenFileTable::new(options.max_open_files),
        })
    }

    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    pub fn fat(&self) -> &FatCache {
        &self.fat
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn open_files(&self) -> &OpenFileTable {
        &self.files
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// Walk root-directory slots in on-disk order, one sector at a time.
    ///
    /// Stops with `Some` when `visit` breaks, and with `None` at the first
    /// end-of-directory slot or after the last root sector.
    fn scan_root<T, F>(&mut self, mut visit: F) -> Result<Option<T>, FatError>
    where
        F: FnMut(usize, DirSlot) -> ControlFlow<T>,
    {
        let mut buffer = vec![0u8; SECTOR_SIZE];
        let entries_per_sector = self.geometry.entries_per_sector();

        trace!(
            "Scanning {} root sectors starting at sector {}",
            self.geometry.root_dir_sectors,
            self.geometry.root_dir_start
        );

        for sector in 0..self.geometry.root_dir_sectors {
            self.device
                .read_sectors(self.geometry.root_dir_start + sector, &mut buffer, 1)?;

            for slot_index in 0..entries_per_sector {
                let index = sector as usize * entries_per_sector + slot_index;
                let offset = slot_index * DIR_ENTRY_SIZE;
                let mut raw = [0u8; DIR_ENTRY_SIZE];
                raw.copy_from_slice(&buffer[offset..offset + DIR_ENTRY_SIZE]);
                let slot = classify_slot(&raw);
                trace!("  Entry {}: {:?}", index, slot);

                if slot == DirSlot::End {
                    return Ok(None);
                }
                if let ControlFlow::Break(found) = visit(index, slot) {
                    return Ok(Some(found));
                }
            }
        }

        Ok(None)
    }

    /// Resolve `filename` in the root directory and register it in the
    /// open-file table. The first matching entry wins.
    pub fn open(&mut self, filename: &str) -> Result<usize, FatError> {
        let query = ShortName::from_query(filename);
        debug!(
            "Looking for '{}' . '{}'",
            String::from_utf8_lossy(&query.name),
            String::from_utf8_lossy(&query.extension)
        );

        let found = self.scan_root(|index, slot| match slot {
            DirSlot::Entry(entry) if entry.short_name == query => {
                debug!("Found {} at entry {}: cluster {}, {} bytes", entry.name(), index, entry.start_cluster, entry.file_size);
                ControlFlow::Break(entry)
            }
            _ => ControlFlow::Continue(()),
        })?;

        let entry = found.ok_or_else(|| FatError::NotFound(filename.to_string()))?;
        self.files.insert(entry)
    }

    /// Every live short-name entry of the root directory, in on-disk order
    pub fn list_root(&mut self) -> Result<Vec<DirectoryEntry>, FatError> {
        let mut entries = Vec::new();
        self.scan_root::<(), _>(|_, slot| {
            if let DirSlot::Entry(entry) = slot {
                entries.push(entry);
            }
            ControlFlow::Continue(())
        })?;
        Ok(entries)
    }

    /// Volume label from the root directory, else from the boot sector.
    pub fn volume_label(&mut self) -> Result<Option<String>, FatError> {
        let from_root = self.scan_root(|_, slot| match slot {
            DirSlot::VolumeLabel(entry) => {
                let mut raw = entry.short_name.name.to_vec();
                raw.extend_from_slice(&entry.short_name.extension);
                ControlFlow::Break(String::from_utf8_lossy(&raw).trim_end().to_string())
            }
            _ => ControlFlow::Continue(()),
        })?;

        let label = from_root.or_else(|| {
            let bpb = self.geometry.volume_label.clone();
            (!bpb.is_empty() && bpb != "NO NAME").then_some(bpb)
        });
        Ok(label)
    }

    pub fn info(&mut self) -> Result<VolumeInfo, FatError> {
        let label = self.volume_label()?;
        Ok(VolumeInfo {
            device: self.device.device().clone(),
            geometry: self.geometry.clone(),
            label,
            fat_cached_sectors: self.fat.cached_sectors(),
            fat_truncated: self.fat.is_truncated(),
            open_files: self.files.len(),
        })
    }

    /// Directory entry behind an open descriptor
    pub fn stat(&self, descriptor: usize) -> Result<&DirectoryEntry, FatError> {
        Ok(&self.files.get(descriptor)?.entry)
    }

    pub fn entry_info(&self, descriptor: usize) -> Result<EntryInfo, FatError> {
        Ok(self.stat(descriptor)?.info())
    }

    /// Copy one whole cluster into `buf`, which must be one cluster long.
    pub(crate) fn read_cluster(&mut self, cluster: u16, buf: &mut [u8]) -> Result<(), FatError> {
        let sector = self.geometry.cluster_to_sector(cluster)?;
        trace!("Reading cluster {} at sector {}", cluster, sector);
        self.device
            .read_sectors(sector, buf, self.geometry.sectors_per_cluster)
    }

    /// Read the file from its first byte into `buf`.
    ///
    /// The budget is `buf.len()`, clamped to the recorded file size. Every
    /// call starts over at the entry's start cluster; there is no cursor.
    /// Fewer bytes than the budget come back when the cluster chain ends
    /// early, which is logged but is not an error. A chain that loops fails
    /// with `CorruptChain`. Use [`FatVolume::stream`]
    /// for sequential reads that continue where the last one stopped.
    pub fn read_whole_file(&mut self, descriptor: usize, buf: &mut [u8]) -> Result<usize, FatError> {
        let (start_cluster, file_size) = {
            let file = self.files.get(descriptor)?;
            (file.entry.start_cluster, file.entry.file_size)
        };

        let budget = buf.len().min(file_size as usize);
        debug!("Reading {} bytes from fd {} (size: {})", budget, descriptor, file_size);

        let cluster_size = self.geometry.bytes_per_cluster();
        let chain_limit = self.fat.chain_limit();
        let mut cluster_buf = vec![0u8; cluster_size];
        let mut bytes_read = 0;
        let mut visited = 0;
        let mut cluster = start_cluster;

        while bytes_read < budget && !is_end_of_chain(cluster) && cluster >= FIRST_DATA_CLUSTER {
            visited += 1;
            if visited > chain_limit {
                return Err(chain_too_long(start_cluster, chain_limit));
            }
            self.read_cluster(cluster, &mut cluster_buf)?;

            let count = (budget - bytes_read).min(cluster_size);
            buf[bytes_read..bytes_read + count].copy_from_slice(&cluster_buf[..count]);
            bytes_read += count;

            if bytes_read < budget {
                cluster = self.fat.next_cluster(cluster)?;
            }
        }

        if bytes_read < budget {
            warn!(
                "Short read on fd {}: cluster chain ended after {} of {} bytes",
                descriptor, bytes_read, budget
            );
        }
        Ok(bytes_read)
    }

    /// The whole file as recorded in its directory entry, or as much of it
    /// as the cluster chain holds.
    pub fn read_to_vec(&mut self, descriptor: usize) -> Result<Vec<u8>, FatError> {
        let (start_cluster, file_size) = {
            let entry = self.stat(descriptor)?;
            (entry.start_cluster, entry.file_size as usize)
        };

        // Size the buffer by what the chain holds, not by the recorded size
        let cluster_size = self.geometry.bytes_per_cluster();
        let mut chain_len = 0;
        for cluster in ClusterChain::new(&self.fat, start_cluster).take(file_size.div_ceil(cluster_size)) {
            cluster?;
            chain_len += 1;
        }

        let size = file_size.min(chain_len * cluster_size);
        if size < file_size {
            warn!(
                "fd {} records {} bytes but its cluster chain holds {}",
                descriptor, file_size, size
            );
        }
        let mut data = vec![0u8; size];
        let read = self.read_whole_file(descriptor, &mut data)?;
        data.truncate(read);
        Ok(data)
    }

    /// A sequential reader over an open file, starting at byte 0.
    pub fn stream(&mut self, descriptor: usize) -> Result<FileStream<'_, D>, FatError> {
        FileStream::new(self, descriptor)
    }
}
