use core::mem;
use core::ops::Range;

use crate::volume::{FAT_COUNT, Layout};
use crate::{ClusterId, SectorId};

/// FAT区：每个簇占一个16位小端表项
#[derive(Debug)]
pub struct FatArea {
    range: Range<SectorId>,
}

impl FatArea {
    pub fn new(layout: &Layout) -> Self {
        let start = layout.fat_area();
        let end = start + u32::from(FAT_COUNT) * u32::from(layout.fat_sectors());
        Self {
            range: Range { start, end },
        }
    }

    pub fn sectors(&self) -> Range<SectorId> {
        self.range.clone()
    }

    /// 可容纳的表项数
    pub fn capacity(&self) -> usize {
        (self.range.end.offset() - self.range.start.offset()) / mem::size_of::<u16>()
    }

    /// 写入两个保留表项：第0项带媒体描述符，第1项全为1
    pub fn init(&self, image: &mut [u8], media: u8) {
        self.set(image, ClusterId::FREE, ClusterId::media_marker(media));
        self.set(image, ClusterId::new(1), ClusterId::EOF);
    }

    /// 读取`id`对应的表项
    pub fn get(&self, image: &[u8], id: ClusterId) -> ClusterId {
        let pos = self.entry_pos(id);
        ClusterId::new(u16::from_le_bytes([image[pos], image[pos + 1]]))
    }

    /// 两个保留表项是否与`init`写入的一致
    pub fn has_reserved_entries(&self, image: &[u8], media: u8) -> bool {
        self.get(image, ClusterId::FREE) == ClusterId::media_marker(media)
            && self.get(image, ClusterId::new(1)) == ClusterId::EOF
    }

    pub fn set(&self, image: &mut [u8], id: ClusterId, value: ClusterId) {
        let pos = self.entry_pos(id);
        image[pos..pos + 2].copy_from_slice(&u16::from(value).to_le_bytes());
    }
}

impl FatArea {
    /// 返回表项在镜像中的字节偏移
    fn entry_pos(&self, id: ClusterId) -> usize {
        let index = usize::from(u16::from(id));
        assert!(index < self.capacity(), "cluster {id:?} is outside of the FAT");
        self.range.start.offset() + index * mem::size_of::<u16>()
    }
}
