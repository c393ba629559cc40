mod dir_entry;

use core::ops::Range;

pub use self::dir_entry::*;
use crate::volume::Layout;
use crate::SectorId;

/// FAT16 的根目录固定在FAT区与数据区之间，不属于任何簇
#[derive(Debug)]
pub struct RootDir {
    range: Range<SectorId>,
    entries: u16,
}

impl RootDir {
    pub fn new(layout: &Layout) -> Self {
        let start = layout.root_dir_area();
        Self {
            range: start..start + layout.root_dir_sectors(),
            entries: layout.root_entries(),
        }
    }

    pub fn sectors(&self) -> Range<SectorId> {
        self.range.clone()
    }

    /// 首项写成空白的卷标项，让目录在语法上合法但不含文件
    pub fn init(&self, image: &mut [u8]) -> binrw::BinResult<()> {
        DirEntry::volume_label(DirEntry::BLANK_NAME).encode(&mut image[self.entry_bytes(0)])
    }

    /// 按顺序解码目录项，遇到空闲尾项即停止
    pub fn entries(&self, image: &[u8]) -> binrw::BinResult<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for nth in 0..usize::from(self.entries) {
            let raw = &image[self.entry_bytes(nth)];
            if raw[0] == DirEntry::FREE_TAIL {
                break;
            }
            entries.push(DirEntry::decode(raw)?);
        }
        Ok(entries)
    }

    fn entry_bytes(&self, nth: usize) -> Range<usize> {
        let start = self.range.start.offset() + nth * DirEntry::SIZE;
        start..start + DirEntry::SIZE
    }
}
