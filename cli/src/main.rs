use anyhow::Context;
use clap::{Parser, Subcommand};
use log::debug;
use rootfat_core::{FileBlockDevice, MountOptions};
use rootfat_filesystems::FatVolume;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rootfat")]
#[command(about = "Read files from the root directory of a FAT12/FAT16 disk image", long_about = None)]
struct Cli {
    /// Mount options as JSON; command-line flags override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Sector where the FAT partition starts
    #[arg(short, long, global = true)]
    partition_start: Option<u32>,

    /// Number of FAT sectors kept in memory
    #[arg(long, global = true)]
    fat_cache_sectors: Option<usize>,

    /// Mount even when the FAT does not fit in the cache
    #[arg(long, global = true)]
    lenient: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the volume geometry
    Info {
        /// Disk image
        image: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List the root directory
    Ls {
        /// Disk image
        image: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print a file from the root directory
    Cat {
        /// Disk image
        image: PathBuf,
        /// 8.3 file name, e.g. TEST.TXT
        name: String,
        /// Read at most this many bytes
        #[arg(short, long)]
        max_bytes: Option<usize>,
    },
}

impl Cli {
    fn mount_options(&self) -> anyhow::Result<MountOptions> {
        let mut options = match &self.config {
            Some(path) => MountOptions::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => MountOptions::default(),
        };

        if let Some(start) = self.partition_start {
            options.partition_start = start;
        }
        if let Some(sectors) = self.fat_cache_sectors {
            options.fat_cache_sectors = sectors;
        }
        if self.lenient {
            options.strict_fat_cache = false;
        }

        options.validate()?;
        Ok(options)
    }
}

fn mount(image: &Path, options: &MountOptions) -> anyhow::Result<FatVolume<FileBlockDevice>> {
    let device = FileBlockDevice::open(image)
        .with_context(|| format!("Cannot open image {}", image.display()))?;
    let volume = FatVolume::mount(device, options)
        .with_context(|| format!("Cannot mount {}", image.display()))?;
    Ok(volume)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let options = cli.mount_options()?;
    debug!("Mount options: {:?}", options);

    match &cli.command {
        Commands::Info { image, json } => {
            let mut volume = mount(image, &options)?;
            let info = volume.info()?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                let geo = &info.geometry;
                println!("Image: {}", info.device.id);
                println!("  Size: {} sectors", info.device.sector_count());
                println!("  Filesystem: {}", geo.kind);
                println!("  Label: {}", info.label.as_deref().unwrap_or("(none)"));
                println!("  OEM name: {}", geo.oem_name);
                println!("  Volume ID: {:08X}", geo.volume_id);
                println!("  Bytes per sector: {}", geo.bytes_per_sector);
                println!("  Sectors per cluster: {}", geo.sectors_per_cluster);
                println!("  Reserved sectors: {}", geo.reserved_sectors);
                println!("  FAT copies: {} x {} sectors", geo.num_fats, geo.sectors_per_fat);
                println!("  FAT region: sector {}", geo.fat_region_start);
                println!("  Root directory: sector {} ({} sectors, {} entries)", geo.root_dir_start, geo.root_dir_sectors, geo.max_root_entries);
                println!("  Data region: sector {}", geo.data_region_start);
                println!("  Clusters: {}", geo.cluster_count);
                if info.fat_truncated {
                    println!("  ⚠️  Only {} of {} FAT sectors cached", info.fat_cached_sectors, geo.sectors_per_fat);
                }
            }
        }
        Commands::Ls { image, json } => {
            let mut volume = mount(image, &options)?;
            let entries: Vec<_> = volume.list_root()?.iter().map(|e| e.info()).collect();

            if *json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("Root directory is empty.");
            } else {
                for entry in &entries {
                    let modified = entry
                        .modified
                        .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    let kind = if entry.is_directory { "<DIR>" } else { "" };
                    println!(
                        "{:<12} {:>5} {:>10} {:>16}  cluster {}",
                        entry.name, kind, entry.size, modified, entry.start_cluster
                    );
                }
            }
        }
        Commands::Cat { image, name, max_bytes } => {
            let mut volume = mount(image, &options)?;
            let fd = volume
                .open(name)
                .with_context(|| format!("Cannot open {}", name))?;

            let data = match max_bytes {
                Some(limit) => {
                    let mut buf = vec![0u8; *limit];
                    let read = volume.read_whole_file(fd, &mut buf)?;
                    buf.truncate(read);
                    buf
                }
                None => volume.read_to_vec(fd)?,
            };

            let size = volume.stat(fd)?.file_size as usize;
            if data.len() < size.min(max_bytes.unwrap_or(usize::MAX)) {
                eprintln!("Warning: read {} bytes, file claims {}", data.len(), size);
            }

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            out.write_all(&data)?;
            out.flush()?;
        }
    }

    Ok(())
}
