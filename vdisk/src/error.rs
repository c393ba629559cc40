//! 引擎的错误类型

use std::io;
use std::path::PathBuf;

use fat::FormatError;
use thiserror::Error;

pub type VdiskResult<T> = Result<T, VdiskError>;

/// 所有错误都直接交给最近的调用者，引擎内部不做任何重试。
#[derive(Debug, Error)]
pub enum VdiskError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("volume not found: {0}")]
    NotFound(String),

    #[error("failed to open backing store {path:?}: {source}")]
    BackingStoreOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to map backing store: {0}")]
    MappingFailed(#[source] io::Error),

    #[error("failed to flush backing store: {0}")]
    FlushFailed(#[source] io::Error),

    #[error("failed to spawn volume worker: {0}")]
    WorkerSpawnFailed(#[source] io::Error),

    #[error("output buffer too small: need {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unsupported device-control request {0:#010x}")]
    UnsupportedRequest(u32),

    #[error("request at {offset} of {length} bytes exceeds volume size {size}")]
    Bounds { offset: u64, length: u64, size: u64 },

    #[error("volume is shutting down")]
    ShuttingDown,

    #[error("volume worker exited unexpectedly")]
    WorkerGone,

    #[error("failed to encode on-disk structure: {0}")]
    Encoding(#[from] binrw::Error),
}

impl VdiskError {
    /// 配置有误，换一份配置重新创建
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::UnsupportedFormat(_) | Self::NotFound(_)
        )
    }

    /// 后备存储或线程资源申请失败，调用者可自行重试创建
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            Self::BackingStoreOpenFailed { .. }
                | Self::MappingFailed(_)
                | Self::FlushFailed(_)
                | Self::WorkerSpawnFailed(_)
        )
    }

    /// 设备控制请求本身有误，只影响这一次查询
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::BufferTooSmall { .. } | Self::InvalidParameter(_) | Self::UnsupportedRequest(_)
        )
    }
}

impl From<FormatError> for VdiskError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::Encode(err) => Self::Encoding(err),
            err => Self::UnsupportedFormat(err.to_string()),
        }
    }
}

impl From<VdiskError> for block_dev::BlockError {
    fn from(err: VdiskError) -> Self {
        match err {
            VdiskError::Bounds { offset, size, .. } => block_dev::BlockError::OutOfRange {
                block_id: (offset / u64::from(crate::config::SECTOR_BYTES)) as usize,
                blocks: (size / u64::from(crate::config::SECTOR_BYTES)) as usize,
            },
            err => block_dev::BlockError::Device(err.to_string()),
        }
    }
}
