//! 每个卷专属的工作线程
//!
//! 提交请求的上下文不允许阻塞，真正可能耗时的拷贝（缺页、大块传输）
//! 都放到这里执行。工作线程独占后备存储，是唯一会触碰镜像内存的线程，
//! 所以除了队列锁之外不需要再给镜像加锁。

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::backing::Backing;
use crate::config::ShutdownPolicy;
use crate::queue::{Completion, PendingRequest, Request, RequestKind, RequestQueue};
use crate::{VdiskError, VdiskResult};

pub(crate) struct Worker {
    handle: JoinHandle<Backing>,
    queue: Arc<RequestQueue>,
}

impl Worker {
    pub fn spawn(
        name: &str,
        queue: Arc<RequestQueue>,
        backing: Backing,
        policy: ShutdownPolicy,
    ) -> VdiskResult<Self> {
        let handle = {
            let queue = Arc::clone(&queue);
            thread::Builder::new()
                .name(format!("vdisk-{name}"))
                .spawn(move || run(&queue, backing, policy))
                .map_err(VdiskError::WorkerSpawnFailed)?
        };
        Ok(Self { handle, queue })
    }

    /// 通知工作线程退出并等待，交还后备存储
    pub fn stop(self) -> VdiskResult<Backing> {
        self.queue.terminate();
        self.handle.join().map_err(|_| VdiskError::WorkerGone)
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("thread", &self.handle.thread().name())
            .finish_non_exhaustive()
    }
}

fn run(queue: &RequestQueue, mut backing: Backing, policy: ShutdownPolicy) -> Backing {
    queue.register_worker();
    log::trace!("worker started");

    loop {
        queue.wait();
        // 终止标志只在两次出队之间检查，正在执行的请求总会完成
        if queue.is_terminated() {
            break;
        }
        let Some(pending) = queue.pop() else {
            continue;
        };
        execute(backing.image_mut(), pending);
    }

    let mut leftover = 0;
    while let Some(pending) = queue.pop() {
        leftover += 1;
        match policy {
            ShutdownPolicy::Drain => execute(backing.image_mut(), pending),
            ShutdownPolicy::Reject => pending.reject(VdiskError::ShuttingDown),
        }
    }
    log::trace!("worker exiting, {leftover} queued request(s) handled by {policy:?}");

    backing
}

fn execute(image: &mut [u8], pending: PendingRequest) {
    log::debug!("execute {pending:?}");
    pending.complete_with(|request| transfer(image, request));
}

/// 在镜像与请求缓冲区之间拷贝数据
pub(crate) fn transfer(image: &mut [u8], request: Request) -> VdiskResult<Completion> {
    let range = request.range(image.len() as u64)?;
    let (kind, offset) = (request.kind(), request.offset());
    let mut buffer = request.into_buffer();

    let region = &mut image[range];
    match kind {
        RequestKind::Read => buffer.copy_from_slice(region),
        RequestKind::Write => region.copy_from_slice(&buffer),
    }

    Ok(Completion {
        kind,
        offset,
        transferred: buffer.len() as u32,
        buffer,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_copies_both_ways() {
        let mut image = vec![0u8; 4096];

        let done = transfer(&mut image, Request::write(100, vec![7; 10])).unwrap();
        assert_eq!(10, done.transferred);
        assert_eq!(RequestKind::Write, done.kind);
        assert_eq!(&[7u8; 10], &image[100..110]);

        let done = transfer(&mut image, Request::read(98, 14)).unwrap();
        assert_eq!(
            vec![0u8, 0, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 0, 0],
            done.buffer
        );
    }

    #[test]
    fn transfer_checks_bounds() {
        let mut image = vec![0u8; 4096];
        assert!(matches!(
            transfer(&mut image, Request::write(4090, vec![1; 7])),
            Err(VdiskError::Bounds {
                offset: 4090,
                length: 7,
                size: 4096
            })
        ));
        assert!(image.iter().all(|&b| b == 0));
    }
}
