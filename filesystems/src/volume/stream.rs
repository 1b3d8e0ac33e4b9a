// Sequential reader layered over the whole-file read path

use super::FatVolume;
use crate::fat_common::{chain_too_long, is_end_of_chain, FIRST_DATA_CLUSTER};
use log::warn;
use rootfat_core::{BlockDevice, FatError};
use std::io::{self, Read};

/// Cursor over an open file that keeps its place in the cluster chain.
///
/// Each `read` continues where the previous one stopped, loading one
/// cluster at a time. Reads end at the recorded file size or where the
/// chain ends, whichever comes first. A looping chain surfaces as an
/// `io::Error` wrapping `FatError::CorruptChain`.
pub struct FileStream<'v, D: BlockDevice> {
    volume: &'v mut FatVolume<D>,
    descriptor: usize,
    size: u64,
    position: u64,
    start_cluster: u16,
    cluster: u16,
    clusters_visited: usize,
    offset_in_cluster: usize,
    cluster_buf: Vec<u8>,
    loaded: bool,
}

impl<'v, D: BlockDevice> FileStream<'v, D> {
    pub(crate) fn new(volume: &'v mut FatVolume<D>, descriptor: usize) -> Result<Self, FatError> {
        let entry = volume.stat(descriptor)?;
        let size = entry.file_size as u64;
        let cluster = entry.start_cluster;
        let cluster_size = volume.geometry().bytes_per_cluster();

        Ok(Self {
            volume,
            descriptor,
            size,
            position: 0,
            start_cluster: cluster,
            cluster,
            clusters_visited: 0,
            offset_in_cluster: 0,
            cluster_buf: vec![0u8; cluster_size],
            loaded: false,
        })
    }

    pub fn descriptor(&self) -> usize {
        self.descriptor
    }

    /// Bytes consumed so far
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    fn chain_ended(&self) -> bool {
        is_end_of_chain(self.cluster) || self.cluster < FIRST_DATA_CLUSTER
    }
}

impl<D: BlockDevice> Read for FileStream<'_, D> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let remaining = self.size - self.position;
        if out.is_empty() || remaining == 0 {
            return Ok(0);
        }

        let cluster_size = self.cluster_buf.len();
        if self.offset_in_cluster == cluster_size {
            self.cluster = self.volume.fat.next_cluster(self.cluster)?;
            self.offset_in_cluster = 0;
            self.loaded = false;
        }

        if self.chain_ended() {
            warn!(
                "Cluster chain of fd {} ended at byte {} of {}",
                self.descriptor, self.position, self.size
            );
            return Ok(0);
        }

        if !self.loaded {
            let limit = self.volume.fat.chain_limit();
            self.clusters_visited += 1;
            if self.clusters_visited > limit {
                return Err(chain_too_long(self.start_cluster, limit).into());
            }
            self.volume.read_cluster(self.cluster, &mut self.cluster_buf)?;
            self.loaded = true;
        }

        let available = cluster_size - self.offset_in_cluster;
        let count = out.len().min(available).min(remaining as usize);
        out[..count].copy_from_slice(&self.cluster_buf[self.offset_in_cluster..self.offset_in_cluster + count]);

        self.offset_in_cluster += count;
        self.position += count as u64;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::{dir_entry_bytes, sample_data, ImageBuilder};
    use crate::FatVolume;
    use rootfat_core::{FatError, MountOptions};
    use std::io::Read;

    #[test]
    fn test_stream_continues_between_reads() {
        let builder = ImageBuilder::fat16().file("test.txt", b"0123456789abcdef", 2);
        let mut volume = FatVolume::mount(builder.device(), &MountOptions::default()).unwrap();
        let fd = volume.open("test.txt").unwrap();

        let mut stream = volume.stream(fd).unwrap();
        let mut first = [0u8; 5];
        let mut second = [0u8; 5];
        stream.read_exact(&mut first).unwrap();
        stream.read_exact(&mut second).unwrap();

        assert_eq!(&first, b"01234");
        assert_eq!(&second, b"56789");
        assert_eq!(stream.position(), 10);
    }

    #[test]
    fn test_stream_crosses_clusters() {
        let data = sample_data(2 * 1024 + 300);
        let builder = ImageBuilder::fat12().file_in_chain("big.bin", &data, &[6, 2, 9]);
        let mut volume = FatVolume::mount(builder.device(), &MountOptions::default()).unwrap();
        let fd = volume.open("big.bin").unwrap();

        let mut out = Vec::new();
        let mut stream = volume.stream(fd).unwrap();
        let mut chunk = [0u8; 700];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }

        assert_eq!(out, data);
        // The whole-file path is unaffected by the stream's progress
        let mut head = [0u8; 4];
        assert_eq!(volume.read_whole_file(fd, &mut head).unwrap(), 4);
        assert_eq!(&head, &data[..4]);
    }

    #[test]
    fn test_stream_reports_looping_chain() {
        let builder = ImageBuilder::fat16()
            .fat_entry(2, 3)
            .fat_entry(3, 2)
            .root_slot(dir_entry_bytes(b"LOOP    ", b"BIN", 0x20, 2, 4000));
        let mut volume = FatVolume::mount(builder.device(), &MountOptions::default()).unwrap();
        let fd = volume.open("loop.bin").unwrap();

        let mut out = Vec::new();
        let err = volume.stream(fd).unwrap().read_to_end(&mut out).unwrap_err();
        let inner = err.get_ref().and_then(|e| e.downcast_ref::<FatError>());
        assert!(matches!(inner, Some(FatError::CorruptChain(_))));
        // Both clusters were delivered before the loop was detected
        assert_eq!(out.len(), 1024);
    }

    #[test]
    fn test_stream_stops_at_chain_end() {
        let builder = ImageBuilder::fat16()
            .fat_entry(2, 0xFFFF)
            .root_slot(dir_entry_bytes(b"LIAR    ", b"BIN", 0x20, 2, 5000));
        let mut volume = FatVolume::mount(builder.device(), &MountOptions::default()).unwrap();
        let fd = volume.open("liar.bin").unwrap();

        let mut out = Vec::new();
        let read = volume.stream(fd).unwrap().read_to_end(&mut out).unwrap();
        assert_eq!(read, 512);
    }
}
