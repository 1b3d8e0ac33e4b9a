// FAT12/FAT16 on-disk structures and table access shared by the volume layer

pub mod boot_sector;
pub mod cluster_chain;
pub mod constants;
pub mod directory;
pub mod fat_table;
pub mod timestamps;

pub use boot_sector::{BootSector, FatKind, VolumeGeometry};
pub use cluster_chain::{count_clusters, read_cluster_chain, ClusterChain};
pub(crate) use cluster_chain::chain_too_long;
pub use constants::*;
pub use directory::{classify_slot, DirSlot, DirectoryEntry, EntryInfo, ShortName};
pub use fat_table::{is_end_of_chain, FatCache};
pub use timestamps::fat_datetime;
