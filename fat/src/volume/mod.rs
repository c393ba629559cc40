//! 卷的布局
//!
//! 保留区 | FAT区 | 根目录(FAT12/16) | 数据区
//!
//! 所有区域的位置只取决于卷大小与下面这些固定参数。

pub mod data;
pub mod fat;
pub mod reserved;

use crate::{ClusterId, FormatError, SectorId, SECTOR_BYTES};

/// 保留区只有启动扇区
pub const RESERVED_SECTORS: u16 = 1;

/// 只放一张FAT，不做冗余备份
pub const FAT_COUNT: u8 = 1;

/// 每簇16个扇区，即8KiB
pub const CLUSTER_SECTORS: u8 = 16;

/// 根目录项数，会向上取整到整扇区
pub const ROOT_ENTRIES: u16 = 224;

/// 一个扇区能容纳的目录项数
pub const DIR_ENTRIES_PER_SECTOR: u16 = (SECTOR_BYTES / 32) as u16;

/// 由卷大小推导出的FAT16布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    total_sectors: u32,
    fat_sectors: u16,
    root_entries: u16,
}

impl Layout {
    pub fn new(disk_size: u64) -> Result<Self, FormatError> {
        let too_small = FormatError::TooSmall { size: disk_size };
        let total_sectors =
            u32::try_from(disk_size / SECTOR_BYTES as u64).map_err(|_| too_many(u32::MAX))?;
        let root_entries = ROOT_ENTRIES.next_multiple_of(DIR_ENTRIES_PER_SECTOR);
        let fat_sectors = fat_sectors(total_sectors, root_entries);

        let data_area = u32::from(RESERVED_SECTORS)
            + u32::from(FAT_COUNT) * fat_sectors
            + u32::from(root_entries / DIR_ENTRIES_PER_SECTOR);
        if total_sectors < data_area + u32::from(CLUSTER_SECTORS) {
            return Err(too_small);
        }

        let clusters = (total_sectors - data_area) / u32::from(CLUSTER_SECTORS);
        if clusters > ClusterId::MAX_COUNT {
            return Err(too_many(clusters));
        }

        Ok(Self {
            total_sectors,
            fat_sectors: u16::try_from(fat_sectors).map_err(|_| too_many(clusters))?,
            root_entries,
        })
    }

    pub const fn total_sectors(&self) -> u32 {
        self.total_sectors
    }

    /// FAT占用的扇区数
    pub const fn fat_sectors(&self) -> u16 {
        self.fat_sectors
    }

    pub const fn root_entries(&self) -> u16 {
        self.root_entries
    }

    pub const fn root_dir_sectors(&self) -> u32 {
        (self.root_entries / DIR_ENTRIES_PER_SECTOR) as u32
    }

    /// FAT区紧跟在保留区之后
    pub const fn fat_area(&self) -> SectorId {
        SectorId::new(RESERVED_SECTORS as u32)
    }

    pub fn root_dir_area(&self) -> SectorId {
        self.fat_area() + u32::from(FAT_COUNT) * u32::from(self.fat_sectors)
    }

    pub fn data_area(&self) -> SectorId {
        self.root_dir_area() + self.root_dir_sectors()
    }

    /// 数据区实际容纳的簇数
    pub fn clusters(&self) -> u32 {
        (self.total_sectors - u32::from(self.data_area())) / u32::from(CLUSTER_SECTORS)
    }
}

/// 计算FAT占用的扇区数。
///
/// 沿用老式格式化工具的两轮近似：先按全部扇区估算簇数，
/// 再把第一轮得到的FAT扇区数加回簇数重算一次。只算两轮。
pub fn fat_sectors(total_sectors: u32, root_entries: u16) -> u32 {
    let entry_bytes = core::mem::size_of::<u16>() as u32;
    let root_sectors = u32::from(root_entries / DIR_ENTRIES_PER_SECTOR);

    let mut fat_entries = total_sectors.saturating_sub(u32::from(RESERVED_SECTORS) + root_sectors)
        / u32::from(CLUSTER_SECTORS)
        + u32::from(u16::from(ClusterId::MIN));
    let mut fat_sectors = (fat_entries * entry_bytes).div_ceil(SECTOR_BYTES as u32);

    fat_entries += fat_sectors;
    fat_sectors = (fat_entries * entry_bytes).div_ceil(SECTOR_BYTES as u32);

    fat_sectors
}

fn too_many(clusters: u32) -> FormatError {
    FormatError::TooManyClusters {
        clusters,
        max: ClusterId::MAX_COUNT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn layout_8mib() {
        let layout = Layout::new(8 * MIB).unwrap();
        assert_eq!(16384, layout.total_sectors());
        assert_eq!(5, layout.fat_sectors());
        assert_eq!(224, layout.root_entries());
        assert_eq!(SectorId::new(1), layout.fat_area());
        assert_eq!(SectorId::new(6), layout.root_dir_area());
        assert_eq!(SectorId::new(20), layout.data_area());
        assert_eq!((16384 - 20) / 16, layout.clusters());
    }

    #[test]
    fn layout_16mib() {
        let layout = Layout::new(16 * MIB).unwrap();
        assert_eq!(32768, layout.total_sectors());
        assert_eq!(9, layout.fat_sectors());
        assert_eq!(SectorId::new(10), layout.root_dir_area());
        assert_eq!(SectorId::new(24), layout.data_area());
    }

    #[test]
    fn exactly_two_passes() {
        // 第一轮: (32768 - 1 - 14) / 16 + 2 = 2049 项 => 9 扇区
        // 第二轮: 2049 + 9 = 2058 项 => 9 扇区
        assert_eq!(9, fat_sectors(32768, 224));
        // 第一轮: 256 项 => 1 扇区；第二轮: 257 项 => 2 扇区
        assert_eq!(2, fat_sectors(15 + 254 * 16, 224));
    }

    #[test]
    fn limits() {
        assert!(matches!(
            Layout::new(8 * 1024),
            Err(FormatError::TooSmall { .. })
        ));
        assert!(Layout::new(512 * MIB).is_ok());
        assert!(matches!(
            Layout::new(1024 * MIB),
            Err(FormatError::TooManyClusters { .. })
        ));
    }
}
