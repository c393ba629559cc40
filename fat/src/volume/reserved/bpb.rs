use std::io::Cursor;

use binrw::{BinRead, BinResult, BinWrite};

use crate::volume::{CLUSTER_SECTORS, FAT_COUNT, Layout, RESERVED_SECTORS};
use crate::SECTOR_BYTES;

/// BIOS Parameter Block BIOS参数块
///
/// 位于保留区的第一扇区，该扇区又名启动扇区。
/// 所有多字节字段均为小端序，偏移量以字节计。
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct Bpb {
    /// @0 跳转至启动代码的指令，文件系统识别器会检查它
    pub jmp_boot: [u8; 3],

    /// @3 一般用于记录什么系统格式化此卷
    pub oem_name: [u8; 8],

    /// @11 一个扇区的字节量
    pub bytes_per_sector: u16,

    /// @13 一个簇的扇区数
    pub sectors_per_cluster: u8,

    /// @14 保留区的扇区数
    pub reserved_sectors: u16,

    /// @16 此卷的文件分配表(FAT)数量
    pub fat_count: u8,

    /// @17 根目录项数
    pub root_entries: u16,

    /// @19 扇区总数，放不下时为0并改用`huge_sectors`
    pub total_sectors16: u16,

    /// @21 物理媒介的类型
    pub media: u8,

    /// @22 一张FAT占用的扇区数
    pub fat_sectors: u16,

    /// @24 中断0x13模式下，轨道的扇区数
    pub sectors_per_track: u16,

    /// @26 中断0x13模式下，头数量
    pub heads: u16,

    /// @28 中断0x13模式下使用
    pub hidden_sectors: u32,

    /// @32 扇区总数超过16位时使用
    pub huge_sectors: u32,

    /// @36 中断0x13驱动号
    pub drive_number: u8,

    /// @37
    _reserved1: u8,

    /// @38 为0x29时，表示接下来的三个字段有效
    pub boot_signature: u8,

    /// @39
    pub volume_id: u32,

    /// @43 卷标签
    /// NOTE: 若不设卷标签，则值为"NO NAME    "
    pub volume_label: [u8; 11],

    /// @54 文件系统类型：FAT12/FAT16/FAT32
    ///
    /// 只用来做告示，不应信赖此字段。
    pub fs_type: [u8; 8],

    /// @510 [0x55, 0xAA]，之前的启动代码区全填0x00
    #[brw(pad_before = 448)]
    pub signature: [u8; 2],
}

/// 媒体描述符，虚拟卷总是固定磁盘
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Media {
    Fixed = 0xF8,
}

/// 扩展引导签名，留空表示卷标等字段只供参考
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BootSignature {
    Unset = 0x00,
}

impl Bpb {
    pub const JMP_BOOT: [u8; 3] = [0xEB, 0x3C, 0x90];
    pub const OEM_NAME: [u8; 8] = *b"VDISK   ";
    pub const VOLUME_ID: u32 = 0xC0FF_FFEE;
    pub const VOLUME_LABEL: [u8; 11] = *b"NO NAME    ";
    pub const FS_TYPE: [u8; 8] = *b"FAT16   ";
    pub const SIGNATURE: [u8; 2] = [0x55, 0xAA];
    pub const SECTORS_PER_TRACK: u16 = 32;
    pub const HEADS: u16 = 2;

    pub fn new(layout: &Layout) -> Self {
        let total = layout.total_sectors();
        let (total_sectors16, huge_sectors) = match u16::try_from(total) {
            Ok(total) => (total, 0),
            Err(_) => (0, total),
        };

        Self {
            jmp_boot: Self::JMP_BOOT,
            oem_name: Self::OEM_NAME,
            bytes_per_sector: SECTOR_BYTES as u16,
            sectors_per_cluster: CLUSTER_SECTORS,
            reserved_sectors: RESERVED_SECTORS,
            fat_count: FAT_COUNT,
            root_entries: layout.root_entries(),
            total_sectors16,
            media: Media::Fixed as u8,
            fat_sectors: layout.fat_sectors(),
            sectors_per_track: Self::SECTORS_PER_TRACK,
            heads: Self::HEADS,
            hidden_sectors: 0,
            huge_sectors,
            drive_number: 0,
            _reserved1: 0,
            boot_signature: BootSignature::Unset as u8,
            volume_id: Self::VOLUME_ID,
            volume_label: Self::VOLUME_LABEL,
            fs_type: Self::FS_TYPE,
            signature: Self::SIGNATURE,
        }
    }

    pub fn decode(sector: &[u8]) -> BinResult<Self> {
        Self::read(&mut Cursor::new(sector))
    }

    pub fn encode(&self, sector: &mut [u8]) -> BinResult<()> {
        self.write(&mut Cursor::new(sector))
    }

    pub const fn total_sectors(&self) -> u32 {
        if self.total_sectors16 > 0 {
            self.total_sectors16 as u32
        } else {
            self.huge_sectors
        }
    }

    /// 文件系统识别器的启发式检查：跳转指令、扇区大小与结尾签名
    pub fn is_recognizable(&self) -> bool {
        let jump = matches!(self.jmp_boot, [0xEB, _, 0x90] | [0xE9, _, _]);
        let sector = self.bytes_per_sector.is_power_of_two()
            && (512..=4096).contains(&self.bytes_per_sector);
        jump && sector && self.signature == Self::SIGNATURE
    }

    pub fn fs_type(&self) -> &str {
        core::str::from_utf8(&self.fs_type)
            .unwrap_or_default()
            .trim_end()
    }

    pub fn volume_label(&self) -> &str {
        core::str::from_utf8(&self.volume_label)
            .unwrap_or_default()
            .trim_end()
    }
}
