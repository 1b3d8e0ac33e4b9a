pub mod config;
pub mod device;
pub mod error;

pub use config::MountOptions;
pub use device::{BlockDevice, Device, DeviceType, FileBlockDevice, MemoryBlockDevice, SECTOR_SIZE};
pub use error::FatError;
