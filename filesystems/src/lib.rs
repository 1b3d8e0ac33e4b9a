// FAT12/FAT16 volume driver: mount a volume from a block device, resolve
// 8.3 names in the root directory and read files through their cluster chains.

pub mod fat_common;
pub mod volume;

#[cfg(test)]
pub mod test_helpers;

pub use fat_common::{DirectoryEntry, EntryInfo, FatCache, FatKind, ShortName, VolumeGeometry};
pub use volume::{FatVolume, FileStream, OpenFile, OpenFileTable, VolumeInfo};
