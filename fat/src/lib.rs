//! FAT16 卷的磁盘布局与格式化
//!
//! 只处理一块已经映射好的内存镜像，不关心镜像来自内存还是文件。

mod cluster;
mod error;
mod format;
mod sector;
pub mod volume;

pub use self::{
    cluster::ClusterId,
    error::FormatError,
    format::{format, probe},
    sector::{SectorId, SECTOR_BYTES},
    volume::Layout,
};
