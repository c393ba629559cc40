//! 一块虚拟卷
//!
//! 卷对外只暴露提交请求与设备控制两种入口，镜像本身由工作线程独占。

use std::sync::mpsc;
use std::sync::Arc;

use block_dev::{BlockDevice, BlockResult, SECTOR_SIZE};
use spin::Mutex;

use crate::backing::{Backing, BackingKind, ProvisionalFile};
use crate::config::{FormatType, ShutdownPolicy, VolumeConfig};
use crate::queue::{Completion, CompletionSink, PendingRequest, Request, RequestQueue, Submission};
use crate::worker::Worker;
use crate::{control, Geometry, VdiskError, VdiskResult};

pub type VolumeHandle = Arc<Volume>;

#[derive(Debug)]
pub struct Volume {
    device_name: String,
    mount_name: String,
    backing_kind: BackingKind,
    size: u32,
    geometry: Geometry,
    /// 实际生效的格式，已有数据的后备文件总是`None`
    format: FormatType,
    policy: ShutdownPolicy,
    queue: Arc<RequestQueue>,
    /// 关闭后为空
    worker: Mutex<Option<Worker>>,
}

impl Volume {
    /// 建立后备存储、按需格式化并启动工作线程。
    ///
    /// 任何一步失败时，已经打开的文件和映射都随之释放，本次新建的文件也会删除。
    pub(crate) fn create(config: &VolumeConfig) -> VdiskResult<Self> {
        let size = config.validate()?;
        let mut format = config.format;

        // 先确认布局可行，免得为一个注定失败的卷创建文件
        if format == FormatType::Fat16 {
            fat::Layout::new(u64::from(size))?;
        }

        // 先于后备存储声明，出错时先解除映射再删除新建的文件
        let mut provisional = ProvisionalFile::default();
        let (mut backing, backing_kind) = match &config.backing {
            Some(path) => {
                let (backing, existed, created) = Backing::open(path, u64::from(size))?;
                provisional = created;
                if existed && format != FormatType::None {
                    log::warn!(
                        "{}: backing file {} already holds data, not formatting",
                        config.device_name,
                        path.display()
                    );
                    format = FormatType::None;
                }
                (backing, BackingKind::File(path.clone()))
            }
            None => (Backing::memory(size as usize)?, BackingKind::Memory),
        };

        match format {
            FormatType::Fat16 => {
                fat::format(backing.image_mut())?;
            }
            FormatType::None if backing.kind_is_file() => match fat::probe(backing.image()) {
                Some(bpb) => log::info!(
                    "{}: found {} volume {:?}",
                    config.device_name,
                    bpb.fs_type(),
                    bpb.volume_label()
                ),
                None => log::info!("{}: no recognizable boot sector", config.device_name),
            },
            FormatType::None => {}
        }

        let geometry = Geometry::from_size(u64::from(size));
        let queue = Arc::new(RequestQueue::new());
        let worker = Worker::spawn(
            &config.device_name,
            Arc::clone(&queue),
            backing,
            config.shutdown_policy,
        )?;
        provisional.keep();

        log::info!(
            "{} ({}): created {size} bytes, {:?}, {format:?}, {} cylinders",
            config.device_name,
            config.mount_name,
            backing_kind,
            geometry.cylinders,
        );

        Ok(Self {
            device_name: config.device_name.clone(),
            mount_name: config.mount_name.clone(),
            backing_kind,
            size,
            geometry,
            format,
            policy: config.shutdown_policy,
            queue,
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn mount_name(&self) -> &str {
        &self.mount_name
    }

    pub fn backing_kind(&self) -> &BackingKind {
        &self.backing_kind
    }

    /// 卷的字节数
    pub fn size(&self) -> u64 {
        u64::from(self.size)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn format(&self) -> FormatType {
        self.format
    }

    pub fn shutdown_policy(&self) -> ShutdownPolicy {
        self.policy
    }

    /// 队列中尚未执行的请求数
    pub fn queued_requests(&self) -> usize {
        self.queue.len()
    }

    pub fn is_running(&self) -> bool {
        !self.queue.is_terminated()
    }

    /// 提交一个读写请求，立即返回。
    ///
    /// 越界或卷已关闭时请求不会入队，`sink`也不会被调用；
    /// 否则`sink`恰好被调用一次。
    pub fn submit(
        &self,
        request: Request,
        sink: impl FnOnce(VdiskResult<Completion>) + Send + 'static,
    ) -> VdiskResult<Submission> {
        request.range(self.size())?;
        let sink: CompletionSink = Box::new(sink);
        self.queue
            .enqueue(PendingRequest::new(request, sink))
            .map_err(|_| VdiskError::ShuttingDown)?;
        Ok(Submission::Pending)
    }

    /// 提交并等待完成
    fn submit_wait(&self, request: Request) -> VdiskResult<Completion> {
        let (tx, rx) = mpsc::sync_channel(1);
        self.submit(request, move |result| {
            // 等待者已经离开时结果无人接收，丢弃即可
            let _ = tx.send(result);
        })?;
        rx.recv().map_err(|_| VdiskError::WorkerGone)?
    }

    pub fn read(&self, offset: u32, length: u32) -> VdiskResult<Vec<u8>> {
        Ok(self.submit_wait(Request::read(offset, length))?.buffer)
    }

    /// 读满`buf`，返回传输的字节数
    pub fn read_into(&self, offset: u32, buf: &mut [u8]) -> VdiskResult<u32> {
        let done = self.submit_wait(Request::read_into(offset, vec![0; buf.len()]))?;
        buf.copy_from_slice(&done.buffer);
        Ok(done.transferred)
    }

    pub fn write(&self, offset: u32, data: &[u8]) -> VdiskResult<u32> {
        Ok(self.submit_wait(Request::write(offset, data))?.transferred)
    }

    /// 应答设备控制查询，返回写入`output`的字节数
    pub fn control(&self, code: u32, output: &mut [u8]) -> VdiskResult<usize> {
        control::respond(&self.geometry, self.size(), code, output)
    }

    /// 停止工作线程并释放后备存储，重复调用无副作用
    pub fn shutdown(&self) -> VdiskResult<()> {
        let Some(worker) = self.worker.lock().take() else {
            return Ok(());
        };

        let backing = worker.stop()?;
        let flushed = backing.flush();
        drop(backing);
        flushed?;

        log::info!("{}: shut down ({:?})", self.device_name, self.policy);
        Ok(())
    }
}

impl Drop for Volume {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            log::warn!("{}: shutdown failed: {err}", self.device_name);
        }
    }
}

impl BlockDevice for Volume {
    fn blocks(&self) -> usize {
        self.size as usize / SECTOR_SIZE
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) -> BlockResult<()> {
        self.check_access(block_id, buf.len())?;
        self.read_into((block_id * SECTOR_SIZE) as u32, buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) -> BlockResult<()> {
        self.check_access(block_id, buf.len())?;
        self.write((block_id * SECTOR_SIZE) as u32, buf)?;
        Ok(())
    }
}
