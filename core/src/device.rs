use crate::FatError;
use log::trace;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Fixed sector size of the block-device contract.
pub const SECTOR_SIZE: usize = 512;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub device_type: DeviceType,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceType {
    ImageFile,
    Memory,
}

impl Device {
    pub fn sector_count(&self) -> u64 {
        self.size / SECTOR_SIZE as u64
    }
}

/// Synchronous sector-addressed read primitive.
///
/// `read_sectors` blocks until `count` consecutive sectors starting at the
/// absolute sector `start` have been copied into `buf`, or fails. `buf` must
/// be exactly `count * SECTOR_SIZE` bytes long.
pub trait BlockDevice {
    fn read_sectors(&mut self, start: u32, buf: &mut [u8], count: u32) -> Result<(), FatError>;

    /// Describe the backing store.
    fn device(&self) -> &Device;
}

fn check_buffer(buf: &[u8], count: u32) -> Result<(), FatError> {
    let expected = count as usize * SECTOR_SIZE;
    if buf.len() != expected {
        return Err(FatError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("buffer is {} bytes, {} sectors need {}", buf.len(), count, expected),
        )));
    }
    Ok(())
}

/// Block device backed by a raw disk image on the host filesystem.
pub struct FileBlockDevice {
    file: File,
    device: Device,
}

impl FileBlockDevice {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FatError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        let device = Device {
            id: path.to_string_lossy().to_string(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "image".to_string()),
            size,
            device_type: DeviceType::ImageFile,
            path: Some(path.to_path_buf()),
        };

        Ok(Self { file, device })
    }
}

impl BlockDevice for FileBlockDevice {
    fn read_sectors(&mut self, start: u32, buf: &mut [u8], count: u32) -> Result<(), FatError> {
        check_buffer(buf, count)?;

        let offset = start as u64 * SECTOR_SIZE as u64;
        trace!("Reading {} sectors at sector {} (offset {:#x})", count, start, offset);

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

/// Block device over an in-memory image. Reads past the end fail like a
/// short read on a real disk.
pub struct MemoryBlockDevice {
    data: Vec<u8>,
    device: Device,
    reads: u64,
}

impl MemoryBlockDevice {
    pub fn new(data: Vec<u8>) -> Self {
        let device = Device {
            id: "memory".to_string(),
            name: "In-memory image".to_string(),
            size: data.len() as u64,
            device_type: DeviceType::Memory,
            path: None,
        };
        Self { data, device, reads: 0 }
    }

    /// Number of sectors served so far.
    pub fn sectors_read(&self) -> u64 {
        self.reads
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl BlockDevice for MemoryBlockDevice {
    fn read_sectors(&mut self, start: u32, buf: &mut [u8], count: u32) -> Result<(), FatError> {
        check_buffer(buf, count)?;

        let begin = start as usize * SECTOR_SIZE;
        let end = begin + buf.len();
        if end > self.data.len() {
            return Err(FatError::IoError(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("sector {} is beyond the end of the image", start as usize + count as usize - 1),
            )));
        }

        buf.copy_from_slice(&self.data[begin..end]);
        self.reads += count as u64;
        Ok(())
    }

    fn device(&self) -> &Device {
        &self.device
    }
}
