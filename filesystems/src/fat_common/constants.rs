// FAT12/FAT16 on-disk constants

// Boot sector offsets
pub const BS_OEM_NAME: usize = 0x03;
pub const BPB_BYTES_PER_SEC: usize = 0x0B;
pub const BPB_SEC_PER_CLUS: usize = 0x0D;
pub const BPB_RSVD_SEC_CNT: usize = 0x0E;
pub const BPB_NUM_FATS: usize = 0x10;
pub const BPB_ROOT_ENT_CNT: usize = 0x11;
pub const BPB_TOT_SEC16: usize = 0x13;
pub const BPB_MEDIA: usize = 0x15;
pub const BPB_FAT_SZ16: usize = 0x16;
pub const BPB_TOT_SEC32: usize = 0x20;

// Extended BPB offsets shared by FAT12 and FAT16
pub const BS_VOL_ID: usize = 0x27;
pub const BS_VOL_LAB: usize = 0x2B;
pub const BS_FIL_SYS_TYPE: usize = 0x36;

// Boot sector signature, stored as 0x55 0xAA
pub const BOOT_SIGNATURE: u16 = 0xAA55;
pub const BOOT_SIGNATURE_OFFSET: usize = 0x1FE;

// Only the first five bytes of the type tag are compared
pub const FS_TYPE_TAG_LEN: usize = 5;
pub const FS_TYPE_FAT12: &[u8; 5] = b"FAT12";
pub const FS_TYPE_FAT16: &[u8; 5] = b"FAT16";

// FAT entry values
pub const FAT12_EOC_MIN: u16 = 0x0FF8;
pub const FAT16_EOC_MIN: u16 = 0xFFF8;
/// Value reported by the chain walker for every end-of-chain marker.
pub const END_OF_CHAIN: u16 = 0xFFFF;
/// Clusters 0 and 1 are reserved; data clusters start at 2.
pub const FIRST_DATA_CLUSTER: u16 = 2;

// Directory entries
pub const DIR_ENTRY_SIZE: usize = 32;
pub const DIR_NAME_LEN: usize = 8;
pub const DIR_EXT_LEN: usize = 3;
pub const DIR_ATTR_OFFSET: usize = 0x0B;
pub const DIR_WRT_TIME_OFFSET: usize = 0x16;
pub const DIR_WRT_DATE_OFFSET: usize = 0x18;
pub const DIR_FST_CLUS_OFFSET: usize = 0x1A;
pub const DIR_FILE_SIZE_OFFSET: usize = 0x1C;

pub const DIR_ENTRY_END: u8 = 0x00;
pub const DIR_ENTRY_DELETED: u8 = 0xE5;
/// A live entry whose name really starts with 0xE5 stores 0x05 instead.
pub const DIR_ENTRY_KANJI_E5: u8 = 0x05;

// Attribute bits
pub const ATTR_READ_ONLY: u8 = 0x01;
pub const ATTR_HIDDEN: u8 = 0x02;
pub const ATTR_SYSTEM: u8 = 0x04;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
pub const ATTR_LONG_NAME: u8 = ATTR_READ_ONLY | ATTR_HIDDEN | ATTR_SYSTEM | ATTR_VOLUME_ID;

// Standard values
pub const STANDARD_BYTES_PER_SECTOR: u16 = 512;
