// Short-name directory entries of the FAT root directory

use super::boot_sector::trim_padded;
use super::constants::*;
use super::timestamps::fat_datetime;
use byteorder::{ByteOrder, LittleEndian};
use chrono::NaiveDateTime;
use serde::Serialize;
use static_assertions::const_assert_eq;

// Directory slots never straddle a sector
const_assert_eq!(STANDARD_BYTES_PER_SECTOR as usize % DIR_ENTRY_SIZE, 0);
const_assert_eq!(DIR_NAME_LEN + DIR_EXT_LEN, 11);

/// Space-padded, uppercase 8.3 name as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortName {
    pub name: [u8; DIR_NAME_LEN],
    pub extension: [u8; DIR_EXT_LEN],
}

impl ShortName {
    /// Normalize a "NAME.EXT" query.
    ///
    /// The text is split at the first '.', ASCII letters are uppercased and
    /// each part is left-justified into its field. Parts longer than their
    /// field are cut off without error, so "LONGFILENAME.TEXT" looks up
    /// "LONGFILE.TEX".
    pub fn from_query(filename: &str) -> Self {
        let (stem, ext) = match filename.split_once('.') {
            Some((stem, ext)) => (stem, ext),
            None => (filename, ""),
        };

        Self {
            name: Self::pad_field(stem),
            extension: Self::pad_field(ext),
        }
    }

    fn pad_field<const N: usize>(part: &str) -> [u8; N] {
        let mut field = [b' '; N];
        for (slot, byte) in field.iter_mut().zip(part.bytes()) {
            *slot = byte.to_ascii_uppercase();
        }
        field
    }

    /// "NAME.EXT" with padding removed
    pub fn display(&self) -> String {
        let mut name = String::new();
        for (i, &b) in self.name.iter().enumerate() {
            if b == b' ' {
                break;
            }
            // 0x05 in the first byte stands for a real 0xE5
            if i == 0 && b == DIR_ENTRY_KANJI_E5 {
                name.push(0xE5 as char);
            } else {
                name.push(b as char);
            }
        }

        let ext = trim_padded(&self.extension);
        if !ext.is_empty() {
            name.push('.');
            name.push_str(&ext);
        }
        name
    }
}

/// Copy of one 32-byte directory slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub short_name: ShortName,
    pub attributes: u8,
    pub write_time: u16,
    pub write_date: u16,
    pub start_cluster: u16,
    pub file_size: u32,
}

impl DirectoryEntry {
    /// Decode one on-disk slot
    pub fn parse(slot: &[u8; DIR_ENTRY_SIZE]) -> Self {
        let mut name = [0u8; DIR_NAME_LEN];
        name.copy_from_slice(&slot[..DIR_NAME_LEN]);
        let mut extension = [0u8; DIR_EXT_LEN];
        extension.copy_from_slice(&slot[DIR_NAME_LEN..DIR_NAME_LEN + DIR_EXT_LEN]);

        Self {
            short_name: ShortName { name, extension },
            attributes: slot[DIR_ATTR_OFFSET],
            write_time: LittleEndian::read_u16(&slot[DIR_WRT_TIME_OFFSET..]),
            write_date: LittleEndian::read_u16(&slot[DIR_WRT_DATE_OFFSET..]),
            start_cluster: LittleEndian::read_u16(&slot[DIR_FST_CLUS_OFFSET..]),
            file_size: LittleEndian::read_u32(&slot[DIR_FILE_SIZE_OFFSET..]),
        }
    }

    pub fn name(&self) -> String {
        self.short_name.display()
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & ATTR_DIRECTORY != 0
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes & ATTR_VOLUME_ID != 0
    }

    pub fn is_long_name(&self) -> bool {
        self.attributes & ATTR_LONG_NAME == ATTR_LONG_NAME
    }

    pub fn modified(&self) -> Option<NaiveDateTime> {
        fat_datetime(self.write_date, self.write_time)
    }

    pub fn info(&self) -> EntryInfo {
        EntryInfo {
            name: self.name(),
            is_directory: self.is_directory(),
            size: self.file_size,
            start_cluster: self.start_cluster,
            attributes: self.attributes,
            modified: self.modified(),
        }
    }
}

/// Serializable view of a directory entry for listings
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub name: String,
    pub is_directory: bool,
    pub size: u32,
    pub start_cluster: u16,
    pub attributes: u8,
    pub modified: Option<NaiveDateTime>,
}

/// What a single directory slot holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirSlot {
    /// First byte 0x00: nothing live follows anywhere in the directory
    End,
    Deleted,
    LongName,
    VolumeLabel(DirectoryEntry),
    Entry(DirectoryEntry),
}

/// Classify a slot in scan order: terminator, deleted, long name, volume label.
pub fn classify_slot(slot: &[u8; DIR_ENTRY_SIZE]) -> DirSlot {
    match slot[0] {
        DIR_ENTRY_END => DirSlot::End,
        DIR_ENTRY_DELETED => DirSlot::Deleted,
        _ => {
            let entry = DirectoryEntry::parse(slot);
            if entry.is_long_name() {
                DirSlot::LongName
            } else if entry.is_volume_label() {
                DirSlot::VolumeLabel(entry)
            } else {
                DirSlot::Entry(entry)
            }
        }
    }
}
