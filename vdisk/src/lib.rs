//! 虚拟块设备引擎
//!
//! 一块卷的生命周期：
//!
//! 1. [`VolumeRegistry::create`] 校验配置，打开（或新建）后备存储并映射进内存，
//!    需要时格式化为 FAT16，最后启动该卷专属的工作线程；
//! 2. 读写请求经 [`Volume::submit`] 入队后立即返回 [`Submission::Pending`]，
//!    由工作线程按到达顺序完成拷贝并回调完成通知；
//! 3. 设备控制查询（几何、分区、长度）由 [`Volume::control`] 直接应答，不经过队列；
//! 4. 关闭时先停下工作线程，再刷写、解除映射、关闭文件。

mod backing;
pub mod config;
pub mod control;
mod error;
pub mod geometry;
mod queue;
mod registry;
mod sync;
mod volume;
mod worker;

pub use self::{
    backing::BackingKind,
    config::{FormatType, ShutdownPolicy, VolumeConfig},
    error::{VdiskError, VdiskResult},
    geometry::Geometry,
    queue::{Completion, CompletionSink, Request, RequestKind, Submission},
    registry::VolumeRegistry,
    volume::{Volume, VolumeHandle},
};
