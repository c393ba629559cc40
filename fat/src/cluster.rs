/// FAT16 的簇编号，同时也是FAT表项的取值
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ClusterId(u16);

impl From<u16> for ClusterId {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<ClusterId> for u16 {
    fn from(id: ClusterId) -> Self {
        id.0
    }
}

impl ClusterId {
    pub const FREE: Self = Self(0);

    /// 最小的可用簇号
    pub const MIN: Self = Self(2);

    /// FAT16 可寻址的最大数据簇数量，再多就该是FAT32了
    pub const MAX_COUNT: u32 = 65524;

    pub const EOF: Self = Self(0xFFFF);

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// 第0项：低字节为媒体描述符，其余位全为1
    pub const fn media_marker(media: u8) -> Self {
        Self(0xFF00 | media as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_marker() {
        assert_eq!(0xFFF8, u16::from(ClusterId::media_marker(0xF8)));
        assert_eq!(0xFFF0, u16::from(ClusterId::media_marker(0xF0)));
        assert_eq!(ClusterId::MIN, ClusterId::from(2));
    }
}
