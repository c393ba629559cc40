//! 卷的固定参数与创建配置

use std::path::PathBuf;
use std::str::FromStr;

use crate::{VdiskError, VdiskResult};

/// 扇区字节数
pub const SECTOR_BYTES: u32 = 512;
/// 每磁道扇区数，沿用 Ramdisk 的取值以兼容存储栈
pub const SECTORS_PER_TRACK: u32 = 32;
/// 每柱面磁道数
pub const TRACKS_PER_CYLINDER: u32 = 2;

/// 卷的最小容量，8MiB
pub const MIN_VOLUME_SIZE: u64 = 8 * 1024 * 1024;
/// 读写请求的偏移量是32位的，卷不能更大
pub const MAX_VOLUME_SIZE: u64 = u32::MAX as u64 / SECTOR_BYTES as u64 * SECTOR_BYTES as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatType {
    #[default]
    Fat16,
    /// 保持镜像原样
    None,
}

impl TryFrom<u32> for FormatType {
    type Error = VdiskError;

    /// 旧接口用文件系统的位数表示类型，0表示不格式化
    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            16 => Ok(Self::Fat16),
            0 => Ok(Self::None),
            32 => Err(VdiskError::UnsupportedFormat("FAT32".into())),
            raw => Err(VdiskError::UnsupportedFormat(format!("filesystem type {raw}"))),
        }
    }
}

impl FromStr for FormatType {
    type Err = VdiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fat16" => Ok(Self::Fat16),
            "none" => Ok(Self::None),
            other => Err(VdiskError::UnsupportedFormat(other.to_owned())),
        }
    }
}

/// 关闭卷时如何处理仍在队列里的请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// 正在执行的请求照常完成，其余请求以 [`VdiskError::ShuttingDown`] 结束
    #[default]
    Reject,
    /// 先执行完队列里的全部请求再退出
    Drain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeConfig {
    /// 设备名，如 `\Device\Ramdisk`
    pub device_name: String,
    /// 挂载名（盘符链接），如 `Z:`
    pub mount_name: String,
    /// 为空时创建纯内存卷
    pub backing: Option<PathBuf>,
    /// 字节数，512的整数倍且不小于8MiB
    pub size: u64,
    pub format: FormatType,
    pub shutdown_policy: ShutdownPolicy,
}

impl VolumeConfig {
    pub fn memory(device_name: impl Into<String>, mount_name: impl Into<String>, size: u64) -> Self {
        Self {
            device_name: device_name.into(),
            mount_name: mount_name.into(),
            backing: None,
            size,
            format: FormatType::default(),
            shutdown_policy: ShutdownPolicy::default(),
        }
    }

    pub fn file(
        device_name: impl Into<String>,
        mount_name: impl Into<String>,
        path: impl Into<PathBuf>,
        size: u64,
    ) -> Self {
        Self {
            backing: Some(path.into()),
            ..Self::memory(device_name, mount_name, size)
        }
    }

    pub fn with_format(mut self, format: FormatType) -> Self {
        self.format = format;
        self
    }

    pub fn with_shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown_policy = policy;
        self
    }

    /// 校验配置，返回32位的卷大小
    pub fn validate(&self) -> VdiskResult<u32> {
        if self.device_name.is_empty() || self.mount_name.is_empty() {
            return Err(VdiskError::Configuration(
                "device name and mount name must not be empty".into(),
            ));
        }
        if self.size % u64::from(SECTOR_BYTES) != 0 {
            return Err(VdiskError::Configuration(format!(
                "size {} is not a multiple of {SECTOR_BYTES}",
                self.size
            )));
        }
        if !(MIN_VOLUME_SIZE..=MAX_VOLUME_SIZE).contains(&self.size) {
            return Err(VdiskError::Configuration(format!(
                "size {} is outside [{MIN_VOLUME_SIZE}, {MAX_VOLUME_SIZE}]",
                self.size
            )));
        }
        u32::try_from(self.size).map_err(|_| VdiskError::Configuration("size overflows u32".into()))
    }
}
