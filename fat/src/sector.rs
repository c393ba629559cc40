//! 扇区编号

use derive_more::{Add, From, Into};

/// 每个扇区的字节数，FAT16卷恒为512
pub const SECTOR_BYTES: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Add, From, Into)]
#[repr(transparent)]
pub struct SectorId(u32);

impl core::ops::Add<u32> for SectorId {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        self + Self(rhs)
    }
}

impl SectorId {
    pub const BOOT: Self = Self(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// 扇区在镜像中的字节偏移
    pub const fn offset(self) -> usize {
        self.0 as usize * SECTOR_BYTES
    }

    /// 扇区在镜像中占据的字节范围
    pub const fn bytes(self) -> core::ops::Range<usize> {
        self.offset()..self.offset() + SECTOR_BYTES
    }
}
