//! # 块设备接口层
//!
//! 块设备是以**块**（扇区）为单位存储数据的设备；
//! [`BlockDevice`] 是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 与内核里的版本不同，这里的读写都会失败：
//! 虚拟卷可能已经关闭，块号也可能越界。

use core::any::Any;

use thiserror::Error;

/// 标准扇区大小，数据按此大小的整数倍读写
pub const SECTOR_SIZE: usize = 512;

pub type BlockResult<T> = Result<T, BlockError>;

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("block {block_id} is out of range ({blocks} blocks)")]
    OutOfRange { block_id: usize, blocks: usize },

    #[error("buffer of {len} bytes is not a multiple of the block size")]
    Misaligned { len: usize },

    #[error("device error: {0}")]
    Device(String),
}

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any {
    /// 设备的块数
    fn blocks(&self) -> usize;

    /// 从`block_id`起读取`buf.len() / SECTOR_SIZE`个块
    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> BlockResult<()>;

    /// 从`block_id`起写入`buf.len() / SECTOR_SIZE`个块
    fn write_block(&self, block_id: usize, buf: &[u8]) -> BlockResult<()>;

    /// 检查一次块访问是否落在设备内，返回涉及的块数
    fn check_access(&self, block_id: usize, len: usize) -> BlockResult<usize> {
        if len % SECTOR_SIZE != 0 {
            return Err(BlockError::Misaligned { len });
        }
        let count = len / SECTOR_SIZE;
        let blocks = self.blocks();
        match block_id.checked_add(count) {
            Some(end) if end <= blocks => Ok(count),
            _ => Err(BlockError::OutOfRange { block_id, blocks }),
        }
    }
}
