//! 读写请求与每个卷的请求队列
//!
//! 请求的所有权是线性转移的：提交者 → 队列 → 工作线程 → 完成回调，
//! 任一时刻只有一个持有者。缓冲区随请求一起流转，最后交还给回调。

use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{self, AtomicBool};

use spin::Mutex;

use crate::sync::Semaphore;
use crate::{VdiskError, VdiskResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    kind: RequestKind,
    offset: u32,
    buffer: Vec<u8>,
}

impl Request {
    /// 从`offset`读取`length`字节，结果放在完成通知的缓冲区里
    pub fn read(offset: u32, length: u32) -> Self {
        Self {
            kind: RequestKind::Read,
            offset,
            buffer: vec![0; length as usize],
        }
    }

    /// 读入调用者提供的缓冲区，读取长度即缓冲区长度
    pub fn read_into(offset: u32, buffer: Vec<u8>) -> Self {
        Self {
            kind: RequestKind::Read,
            offset,
            buffer,
        }
    }

    pub fn write(offset: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: RequestKind::Write,
            offset,
            buffer: data.into(),
        }
    }

    pub const fn kind(&self) -> RequestKind {
        self.kind
    }

    pub const fn offset(&self) -> u32 {
        self.offset
    }

    pub fn length(&self) -> usize {
        self.buffer.len()
    }

    /// 请求在镜像中覆盖的字节范围，超出卷大小则报错
    pub fn range(&self, size: u64) -> VdiskResult<Range<usize>> {
        let offset = u64::from(self.offset);
        let length = self.buffer.len() as u64;
        let bounds = VdiskError::Bounds {
            offset,
            length,
            size,
        };

        if length > u64::from(u32::MAX) {
            return Err(bounds);
        }
        match offset.checked_add(length) {
            Some(end) if end <= size => Ok(offset as usize..end as usize),
            _ => Err(bounds),
        }
    }

    pub(crate) fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }
}

/// 一次完成的传输
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub kind: RequestKind,
    pub offset: u32,
    /// 读请求里是读出的数据，写请求里是原样交还的数据
    pub buffer: Vec<u8>,
    pub transferred: u32,
}

/// 完成通知，由工作线程在传输结束后调用一次
pub type CompletionSink = Box<dyn FnOnce(VdiskResult<Completion>) + Send + 'static>;

/// 提交成功只意味着请求已入队，真正的结果经由完成通知送达
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Pending,
}

pub(crate) struct PendingRequest {
    request: Request,
    sink: CompletionSink,
}

impl PendingRequest {
    pub fn new(request: Request, sink: CompletionSink) -> Self {
        Self { request, sink }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn complete_with(self, f: impl FnOnce(Request) -> VdiskResult<Completion>) {
        let Self { request, sink } = self;
        deliver(sink, f(request));
    }

    pub fn reject(self, err: VdiskError) {
        deliver(self.sink, Err(err));
    }
}

/// 回调跑在工作线程上，它的 panic 就地吞掉，工作线程继续服务后面的请求
fn deliver(sink: CompletionSink, result: VdiskResult<Completion>) {
    if panic::catch_unwind(AssertUnwindSafe(move || sink(result))).is_err() {
        log::error!("completion callback panicked");
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("kind", &self.request.kind)
            .field("offset", &self.request.offset)
            .field("length", &self.request.length())
            .finish_non_exhaustive()
    }
}

/// 严格先进先出的请求队列。
///
/// 链表由自旋锁保护，入队只做一次短暂的加锁追加，再给信号量加一；
/// 信号量的计数即队列深度，工作线程在其上等待。
#[derive(Debug)]
pub(crate) struct RequestQueue {
    list: Mutex<VecDeque<PendingRequest>>,
    depth: Semaphore,
    terminated: AtomicBool,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self {
            list: Mutex::new(VecDeque::new()),
            depth: Semaphore::new(0),
            terminated: AtomicBool::new(false),
        }
    }

    /// 追加到队尾并唤醒工作线程，从不阻塞。
    ///
    /// 队列已终止时原样退回请求。
    pub fn enqueue(&self, pending: PendingRequest) -> Result<(), PendingRequest> {
        {
            let mut list = self.list.lock();
            if self.is_terminated() {
                return Err(pending);
            }
            list.push_back(pending);
        }
        self.depth.up();
        Ok(())
    }

    pub fn pop(&self) -> Option<PendingRequest> {
        self.list.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.list.lock().len()
    }

    /// 等待队列中出现新请求或终止信号
    pub fn wait(&self) {
        self.depth.down();
    }

    /// 只能由工作线程调用
    pub fn register_worker(&self) {
        self.depth.register_current();
    }

    /// 置终止标志并唤醒工作线程。
    ///
    /// 标志在队列锁内设置，此后的入队必然被拒绝，
    /// 工作线程收尾时看到的就是全部遗留请求。
    pub fn terminate(&self) {
        {
            let _list = self.list.lock();
            self.terminated.store(true, atomic::Ordering::Release);
        }
        self.depth.up();
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(atomic::Ordering::Acquire)
    }
}
