//! 短目录项（8.3格式），FAT16 根目录里的唯一格式

use std::io::Cursor;

use binrw::{BinRead, BinResult, BinWrite};
use enumflags2::{BitFlags, bitflags};

#[derive(Debug, Clone, Default, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct DirEntry {
    /// @0 主文件名，空格填充
    name: [u8; 8],

    /// @8 扩展名，空格填充
    ext: [u8; 3],

    /// @11
    attr: u8,

    /// @12 Reserved, must be 0
    _ntres: u8,

    /// @13 Count of tenths of a second.
    /// Range: [0, 199]
    crt_time_tenth: u8,

    /// @14 Creation time, granularity is 2 seconds
    crt_time: u16,

    /// @16 Creation date
    crt_date: u16,

    /// @18 Last access date
    lst_acc_date: u16,

    /// @20 High word of first data cluster number
    /// for file/directory described by this entry, always 0 on FAT16
    fst_clus_hi: u16,

    /// @22 Last modification time
    wrt_time: u16,

    /// @24 Last modification date
    wrt_date: u16,

    /// @26 Low word of first data cluster number
    /// for file/directory described by this entry
    fst_clus_lo: u16,

    /// @28 Quantity containing size in bytes
    /// of file/directory described by this entry
    file_size: u32,
}

impl DirEntry {
    pub const SIZE: usize = 32;

    /// 首字节为0表示此项及其后全部空闲
    pub const FREE_TAIL: u8 = 0x00;

    pub const BLANK_NAME: [u8; 11] = [b' '; 11];

    /// 卷标项：名字字段即卷标，不指向任何簇
    pub fn volume_label(label: [u8; 11]) -> Self {
        let mut dirent = Self::default();
        dirent.name.copy_from_slice(&label[..8]);
        dirent.ext.copy_from_slice(&label[8..]);
        dirent.attr = BitFlags::from(AttrFlag::VolumeID).bits();
        dirent
    }

    pub fn decode(raw: &[u8]) -> BinResult<Self> {
        Self::read(&mut Cursor::new(raw))
    }

    pub fn encode(&self, raw: &mut [u8]) -> BinResult<()> {
        self.write(&mut Cursor::new(raw))
    }

    pub fn attr(&self) -> BitFlags<AttrFlag> {
        BitFlags::from_bits_truncate(self.attr)
    }

    /// 原始的11字节名字
    pub fn raw_name(&self) -> [u8; 11] {
        let mut raw = [0; 11];
        raw[..8].copy_from_slice(&self.name);
        raw[8..].copy_from_slice(&self.ext);
        raw
    }

    pub const fn first_cluster(&self) -> u16 {
        self.fst_clus_lo
    }

    pub const fn file_size(&self) -> u32 {
        self.file_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[bitflags]
#[repr(u8)]
pub enum AttrFlag {
    ReadOnly = 0b0000_0001,
    Hidden = 0b0000_0010,
    /// The corresponding file is tagged as a component of the operating system
    System = 0b0000_0100,
    /// The corresponding entry contains the volume label
    VolumeID = 0b0000_1000,
    Directory = 0b0001_0000,
    /// Indicates that properties of the associated file have been modified
    Archive = 0b0010_0000,
}
