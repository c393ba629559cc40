use std::sync::atomic::{self, AtomicUsize};
use std::thread::{self, Thread};

use spin::Once;

/// 只有一个等待者的计数信号量。
///
/// `up` 不加锁也不睡眠，可以在任何提交上下文里调用；
/// `down` 在许可用光时挂起登记过的等待者线程，直到下一次 `up`。
#[derive(Debug)]
pub struct Semaphore {
    permits: AtomicUsize,
    waiter: Once<Thread>,
}

impl Semaphore {
    pub const fn new(permits: usize) -> Self {
        Self {
            permits: AtomicUsize::new(permits),
            waiter: Once::new(),
        }
    }

    /// 把当前线程登记为唯一的等待者，必须在第一次 `down` 前调用
    pub fn register_current(&self) {
        self.waiter.call_once(thread::current);
    }

    /// Verhogen 增加
    pub fn up(&self) {
        self.permits.fetch_add(1, atomic::Ordering::Release);
        // 等待者尚未登记时无需唤醒，它登记后会先看到许可
        if let Some(waiter) = self.waiter.get() {
            waiter.unpark();
        }
    }

    /// Proberen 尝试
    pub fn down(&self) {
        debug_assert_eq!(
            self.waiter.get().map(Thread::id),
            Some(thread::current().id()),
            "only the registered waiter may wait on the semaphore"
        );

        let mut permits = self.permits.load(atomic::Ordering::Acquire);
        loop {
            // park 可能被虚假唤醒，醒来后重新检查
            if permits == 0 {
                thread::park();
                permits = self.permits.load(atomic::Ordering::Acquire);
                continue;
            }

            match self.permits.compare_exchange_weak(
                permits,
                permits - 1,
                atomic::Ordering::AcqRel,
                atomic::Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(current) => permits = current,
            }
        }
    }

    pub fn permits(&self) -> usize {
        self.permits.load(atomic::Ordering::Acquire)
    }
}
