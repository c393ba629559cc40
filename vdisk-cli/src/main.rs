mod cli;

use std::error::Error;
use std::fs;
use std::path::Path;

use clap::Parser;
use fat::volume::data::RootDir;
use fat::volume::fat::FatArea;
use fat::volume::reserved::Bpb;
use fat::Layout;
use vdisk::control::{ControlCode, DiskGeometry, LengthInformation, PartitionInformation};
use vdisk::{FormatType, VdiskError, VolumeConfig, VolumeHandle, VolumeRegistry};

use self::cli::{Cli, Command};

const MOUNT_NAME: &str = "Z:";

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let registry = VolumeRegistry::new();
    match cli.command {
        Command::Create {
            path,
            size,
            no_format,
        } => create(&registry, &path, size, no_format)?,
        Command::Inspect { path } => inspect(&registry, &path)?,
        Command::Selftest { size } => selftest(&registry, size)?,
    }
    registry.shutdown_all()?;

    Ok(())
}

fn device_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned())
}

fn create(registry: &VolumeRegistry, path: &Path, size: u64, no_format: bool) -> Result<(), VdiskError> {
    let format = if no_format {
        FormatType::None
    } else {
        FormatType::Fat16
    };
    let volume = registry.create(
        VolumeConfig::file(device_name(path), MOUNT_NAME, path, size).with_format(format),
    )?;

    println!("image={path:?}\nsize={}\nformat={:?}", volume.size(), volume.format());
    print_geometry(&volume)
}

fn inspect(registry: &VolumeRegistry, path: &Path) -> Result<(), Box<dyn Error>> {
    let len = fs::metadata(path)
        .map_err(|source| VdiskError::BackingStoreOpenFailed {
            path: path.to_owned(),
            source,
        })?
        .len();
    let size = len / u64::from(vdisk::config::SECTOR_BYTES) * u64::from(vdisk::config::SECTOR_BYTES);
    let volume = registry.create(
        VolumeConfig::file(device_name(path), MOUNT_NAME, path, size).with_format(FormatType::None),
    )?;
    println!("image={path:?}\nsize={}", volume.size());

    let boot = volume.read(0, fat::SECTOR_BYTES as u32)?;
    match fat::probe(&boot) {
        Some(bpb) => {
            println!(
                "boot sector: oem={:?} fs_type={:?} label={:?} volume_id={:#010x}",
                String::from_utf8_lossy(&bpb.oem_name),
                bpb.fs_type(),
                bpb.volume_label(),
                bpb.volume_id,
            );
            println!(
                "  bytes/sector={} sectors/cluster={} reserved={} fats={} root_entries={}",
                bpb.bytes_per_sector,
                bpb.sectors_per_cluster,
                bpb.reserved_sectors,
                bpb.fat_count,
                bpb.root_entries,
            );
            println!(
                "  total_sectors={} media={:#04x} fat_sectors={} sectors/track={} heads={}",
                bpb.total_sectors(),
                bpb.media,
                bpb.fat_sectors,
                bpb.sectors_per_track,
                bpb.heads,
            );
            print_areas(&volume, &bpb)?;
        }
        None => println!("boot sector: not recognizable"),
    }

    print_geometry(&volume)?;
    Ok(())
}

/// 只有与本工具格式化结果布局一致的卷才检查FAT并列出根目录
fn print_areas(volume: &VolumeHandle, bpb: &Bpb) -> Result<(), Box<dyn Error>> {
    let size = u64::from(bpb.total_sectors()) * fat::SECTOR_BYTES as u64;
    let layout = match Layout::new(size) {
        Ok(layout) if layout.fat_sectors() == bpb.fat_sectors => layout,
        _ => {
            println!("  layout: unknown");
            return Ok(());
        }
    };
    let head = volume.read(0, layout.data_area().offset() as u32)?;

    if FatArea::new(&layout).has_reserved_entries(&head, bpb.media) {
        println!("  fat: reserved entries ok");
    } else {
        log::warn!("FAT reserved entries do not match media {:#04x}", bpb.media);
        println!("  fat: reserved entries damaged");
    }
    for entry in RootDir::new(&layout).entries(&head)? {
        println!(
            "  root entry: name={:?} attr={:?} cluster={} size={}",
            String::from_utf8_lossy(&entry.raw_name()),
            entry.attr(),
            entry.first_cluster(),
            entry.file_size(),
        );
    }
    println!(
        "  data area at sector {}, {} clusters",
        u32::from(layout.data_area()),
        layout.clusters()
    );
    Ok(())
}

fn print_geometry(volume: &VolumeHandle) -> Result<(), VdiskError> {
    let mut out = [0u8; PartitionInformation::SIZE];

    let len = volume.control(ControlCode::DiskGetDriveGeometry as u32, &mut out)?;
    let geometry = DiskGeometry::decode(&out[..len])?;
    println!(
        "geometry: cylinders={} media_type={} tracks/cylinder={} sectors/track={} bytes/sector={}",
        geometry.cylinders,
        geometry.media_type,
        geometry.tracks_per_cylinder,
        geometry.sectors_per_track,
        geometry.bytes_per_sector,
    );

    let len = volume.control(ControlCode::DiskGetPartitionInfo as u32, &mut out)?;
    let partition = PartitionInformation::decode(&out[..len])?;
    println!(
        "partition: offset={} length={} number={} type={:#04x}",
        partition.starting_offset,
        partition.partition_length,
        partition.partition_number,
        partition.partition_type,
    );

    let len = volume.control(ControlCode::DiskGetLengthInfo as u32, &mut out)?;
    println!("length: {}", LengthInformation::decode(&out[..len])?.length);

    Ok(())
}

fn selftest(registry: &VolumeRegistry, size: u64) -> Result<(), Box<dyn Error>> {
    let volume = registry.create(VolumeConfig::memory("selftest", MOUNT_NAME, size))?;
    let size = volume.size() as u32;
    let pattern: Vec<u8> = (0..4096u32).map(|i| (i * 7 + 3) as u8).collect();

    for offset in [0, 4096 + 123, size / 2, size - pattern.len() as u32] {
        volume.write(offset, &pattern)?;
        let back = volume.read(offset, pattern.len() as u32)?;
        if back != pattern {
            return Err(format!("round trip mismatch at offset {offset}").into());
        }
        log::info!("round trip at {offset} ok");
    }

    println!("selftest: ok ({size} bytes)");
    Ok(())
}
