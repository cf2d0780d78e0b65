//! 同一时刻最多一个实例的定时任务。
//!
//! 每次 `start` 都会分配新的标记并取消旧任务；任务自行结束时只有标记仍然匹配才会
//! 清空槽位，这样被取代的任务无法影响新任务。

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::debug;

struct Running {
    tag: u64,
    handle: JoinHandle<()>,
}

pub(crate) struct TimerSlot {
    name: &'static str,
    next_tag: AtomicU64,
    current: Mutex<Option<Running>>,
}

impl TimerSlot {
    pub(crate) fn new(name: &'static str) -> Self {
        Self { name, next_tag: AtomicU64::new(0), current: Mutex::new(None) }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Running>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 取消旧任务并启动新任务，返回新任务的标记
    pub(crate) fn start<F, Fut>(&self, make: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let tag = self.next_tag.fetch_add(1, Ordering::SeqCst) + 1;
        let mut current = self.lock();
        if let Some(old) = current.take() {
            old.handle.abort();
            debug!("{} 定时器 #{} 已被 #{} 取代", self.name, old.tag, tag);
        }
        let handle = tokio::spawn(make(tag));
        *current = Some(Running { tag, handle });
        tag
    }

    /// 取消当前任务，返回是否确有任务在运行
    pub(crate) fn stop(&self) -> bool {
        match self.lock().take() {
            Some(running) => {
                running.handle.abort();
                debug!("{} 定时器 #{} 已停止", self.name, running.tag);
                true
            }
            None => false,
        }
    }

    /// 由任务自身调用：标记匹配时清空槽位（不取消自己），否则说明已被取代
    pub(crate) fn release(&self, tag: u64) -> bool {
        let mut current = self.lock();
        match current.as_ref() {
            Some(running) if running.tag == tag => {
                *current = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.lock().as_ref().is_some_and(|r| !r.handle.is_finished())
    }
}
