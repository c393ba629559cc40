//! 柱面/磁道/扇区描述。基本是历史遗留，但存储栈的兼容检查需要它。

use crate::config::{SECTOR_BYTES, SECTORS_PER_TRACK, TRACKS_PER_CYLINDER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MediaType {
    FixedMedia = 12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub cylinders: u64,
    pub media_type: MediaType,
    pub tracks_per_cylinder: u32,
    pub sectors_per_track: u32,
    pub bytes_per_sector: u32,
}

impl Geometry {
    pub fn from_size(size: u64) -> Self {
        Self {
            cylinders: size
                / u64::from(SECTOR_BYTES)
                / u64::from(SECTORS_PER_TRACK)
                / u64::from(TRACKS_PER_CYLINDER),
            media_type: MediaType::FixedMedia,
            tracks_per_cylinder: TRACKS_PER_CYLINDER,
            sectors_per_track: SECTORS_PER_TRACK,
            bytes_per_sector: SECTOR_BYTES,
        }
    }

    /// 几何描述能覆盖的扇区数
    pub fn sectors(&self) -> u64 {
        self.cylinders * u64::from(self.tracks_per_cylinder) * u64::from(self.sectors_per_track)
    }
}
