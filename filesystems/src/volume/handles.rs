// Fixed-capacity open-file table
//
// Descriptors are indices into the table, handed out in increasing order.
// Slots are never reclaimed: there is no close, so a descriptor stays valid
// for the lifetime of the mount.

use crate::fat_common::DirectoryEntry;
use log::debug;
use rootfat_core::FatError;

/// A resolved root-directory file
#[derive(Debug, Clone)]
pub struct OpenFile {
    pub descriptor: usize,
    pub entry: DirectoryEntry,
    /// Seeded with the entry's start cluster. Whole-file reads always restart
    /// from `entry.start_cluster` and never move this.
    pub current_cluster: u16,
}

#[derive(Debug)]
pub struct OpenFileTable {
    files: Vec<OpenFile>,
    capacity: usize,
}

impl OpenFileTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            files: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.files.len() >= self.capacity
    }

    /// Register `entry` and return its descriptor.
    pub fn insert(&mut self, entry: DirectoryEntry) -> Result<usize, FatError> {
        if self.is_full() {
            return Err(FatError::TooManyOpenFiles(self.capacity));
        }

        let descriptor = self.files.len();
        debug!("fd {} -> {} (cluster {})", descriptor, entry.name(), entry.start_cluster);
        self.files.push(OpenFile {
            descriptor,
            current_cluster: entry.start_cluster,
            entry,
        });
        Ok(descriptor)
    }

    pub fn get(&self, descriptor: usize) -> Result<&OpenFile, FatError> {
        self.files
            .get(descriptor)
            .ok_or(FatError::InvalidDescriptor(descriptor))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpenFile> {
        self.files.iter()
    }
}
